//! Well-known mimetype families and the converters between them.
//!
//! | Module      | Family                                            |
//! |-------------|---------------------------------------------------|
//! | `resolvers` | `application/x.jupyter.resolve[; mimetype=…]`     |
//! | `files`     | `application/x.jupyter.file; mimeType=…`          |
//! | `folders`   | `application/x.jupyter.folder`, nested datasets   |
//! | `urls`      | `application/x.jupyter.url; mimeType=…`           |
//! | `text`      | `text/plain; mimeType=…`                          |
//! | `views`     | `application/x.jupyter.viewer; label=…`, labels   |
//!
//! [`standard_converters`] bundles the ones that need no configuration.
//!
//! A typical chain for a local CSV file:
//!
//! ```text
//! file:///data/people.csv
//!   application/x.jupyter.resolve                           (0)
//!   application/x.jupyter.resolve; mimetype=text/csv        (1)  resolve_extension_converter
//!   application/x.jupyter.file; mimeType=text/csv           (2)  resolve_file_converter
//!   text/plain; mimeType=text/csv                           (3)  file_text_converter
//!   text/csv                                                (4)  text_mime_converter
//!   application/x.jupyter.viewer; label=Print               (4)  text_print_viewer_converter
//! ```

pub mod files;
pub mod folders;
pub mod resolvers;
pub mod text;
pub mod urls;
pub mod views;

pub use files::{
    FILE_DATA_TYPE, create_file_url, file_text_converter, file_url_converter,
    resolve_file_converter,
};
pub use folders::{
    FOLDER_DATA_TYPE, NESTED_DATA_TYPE, create_folder_url, folder_converter,
    folder_datasets_converter, local_folder_converter,
};
pub use resolvers::{
    RESOLVE_DATA_TYPE, RESOLVE_MIMETYPE_DATA_TYPE, create_resolve_dataset,
    resolve_extension_converter, resolve_scheme_converter,
};
pub use text::{TEXT_DATA_TYPE, text_mime_converter};
pub use urls::{URL_DATA_TYPE, resolve_url_converter};
pub use views::{
    LABEL_DATA_TYPE, PRINT_LABEL, VIEWER_DATA_TYPE, View, text_print_viewer_converter,
    url_label_converter,
};

use crate::{
    convert::Converter,
    stream::{ErrorPolicy, Observer},
};
use tokio::runtime::Handle;

/// File, folder, URL, label and print-viewer converters, in registration
/// order.
///
/// Extension and text-mimetype converters depend on configuration and are
/// added separately.
pub fn standard_converters(
    handle: Handle,
    policy: ErrorPolicy,
    print_sink: Observer<String>,
) -> Vec<Converter> {
    vec![
        resolve_file_converter(),
        file_text_converter(handle.clone(), policy),
        local_folder_converter(handle),
        folder_datasets_converter(),
        resolve_url_converter(),
        url_label_converter(),
        text_print_viewer_converter(print_sink),
    ]
}
