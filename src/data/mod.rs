//! Dataset model and mimetype codecs.
//!
//! A dataset maps mimetypes to `(cost, data)` pairs for one URL. The cost is
//! the number of conversion steps from the URL's origin data, so lower is
//! more direct.
//!
//! # Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │ Datasets                                                             │
//! │  "file:///notes.csv" ─► Dataset                                      │
//! │                          "application/x.jupyter.resolve"  ─► (0, ()) │
//! │                          "text/plain; mimeType=text/csv"  ─► (2, ..) │
//! │                          "text/csv"                       ─► (3, ..) │
//! │  "mem://greeting"    ─► Dataset                                      │
//! │                          "text/plain"                     ─► (0, ..) │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A [`DataType`] is a typed codec over one family of mimetypes: it parses a
//! mimetype into an argument, builds mimetypes back, and picks its entries out
//! of a dataset.

mod dataset;
mod datatype;

pub use dataset::{
    Cost, Data, DataValue, Dataset, Datasets, IntoData, MimeType, Url, create_dataset,
    create_datasets, get_data, merge_dataset, merge_datasets,
};
pub use datatype::{DataType, DataTypeNoArgs, DataTypeStringArg};
