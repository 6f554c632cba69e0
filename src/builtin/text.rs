//! Text content tagged with the mimetype it encodes.

use crate::{
    convert::{Converter, Output, create_converter},
    data::{DataTypeNoArgs, DataTypeStringArg},
    stream::ValueStream,
};

/// Text whose content has the argument mimetype, e.g. CSV read from a file.
pub static TEXT_DATA_TYPE: DataTypeStringArg<ValueStream<String>> =
    DataTypeStringArg::new("text/plain", "mimeType");

/// Expose `text/plain; mimeType={mime_type}` as `{mime_type}` itself.
pub fn text_mime_converter(mime_type: impl Into<String>) -> Converter {
    let mime_type = mime_type.into();
    let target = DataTypeNoArgs::<ValueStream<String>>::owned(mime_type.clone());
    create_converter(&TEXT_DATA_TYPE, target, move |args| {
        Ok(if args.arg == mime_type {
            Output::value(args.data)
        } else {
            Output::none()
        })
    })
}
