//! The resolve family: the seed of every resolution.
//!
//! Every URL starts out with a single `application/x.jupyter.resolve` entry
//! at cost 0. Resolvers look at the URL and declare which mimetype its
//! content has, as `application/x.jupyter.resolve; mimetype=…`.

use crate::{
    convert::{Converter, Output, create_converter},
    data::{DataType, DataTypeNoArgs, DataTypeStringArg, Dataset},
};

pub const RESOLVE_MIME_TYPE: &str = "application/x.jupyter.resolve";

pub static RESOLVE_DATA_TYPE: DataTypeNoArgs<()> = DataTypeNoArgs::new(RESOLVE_MIME_TYPE);

/// The URL's content is known to have the argument mimetype.
pub static RESOLVE_MIMETYPE_DATA_TYPE: DataTypeStringArg<()> =
    DataTypeStringArg::new(RESOLVE_MIME_TYPE, "mimetype");

/// Seed dataset a resolution starts from.
pub fn create_resolve_dataset() -> Dataset {
    RESOLVE_DATA_TYPE.create_dataset(&(), ())
}

/// Declare `mime_type` for URLs whose path ends with `extension`.
///
/// URLs carrying a fragment are left alone, since they address a part of
/// the file.
pub fn resolve_extension_converter(extension: impl Into<String>, mime_type: impl Into<String>) -> Converter {
    let extension = extension.into();
    let mime_type = mime_type.into();
    create_converter(&RESOLVE_DATA_TYPE, &RESOLVE_MIMETYPE_DATA_TYPE, move |args| {
        let matches = args
            .parsed_url()
            .is_some_and(|url| url.path().ends_with(&extension) && url.fragment().is_none());
        Ok(if matches {
            Output::typed(mime_type.clone(), ())
        } else {
            Output::none()
        })
    })
}

/// Declare `mime_type` for every URL with the given scheme (without `:`).
pub fn resolve_scheme_converter(scheme: impl Into<String>, mime_type: impl Into<String>) -> Converter {
    let scheme = scheme.into();
    let mime_type = mime_type.into();
    create_converter(&RESOLVE_DATA_TYPE, &RESOLVE_MIMETYPE_DATA_TYPE, move |args| {
        let matches = args.parsed_url().is_some_and(|url| url.scheme() == scheme);
        Ok(if matches {
            Output::typed(mime_type.clone(), ())
        } else {
            Output::none()
        })
    })
}
