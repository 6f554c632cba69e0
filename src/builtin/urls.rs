//! Remote resources addressed by http(s) URLs.
//!
//! Only the address is recorded; fetching is left to whoever consumes the
//! entry.

use super::resolvers::RESOLVE_MIMETYPE_DATA_TYPE;
use crate::{
    convert::{Converter, Output, create_converter},
    data::DataTypeStringArg,
    stream::ValueStream,
};

/// A URL to fetch, whose response has the argument mimetype.
pub static URL_DATA_TYPE: DataTypeStringArg<ValueStream<String>> =
    DataTypeStringArg::new("application/x.jupyter.url", "mimeType");

/// http and https URLs with a declared mimetype become fetchable URLs.
pub fn resolve_url_converter() -> Converter {
    create_converter(&RESOLVE_MIMETYPE_DATA_TYPE, &URL_DATA_TYPE, |args| {
        let remote = args
            .parsed_url()
            .is_some_and(|url| matches!(url.scheme(), "http" | "https"));
        Ok(if remote {
            Output::typed(args.arg, ValueStream::just(args.url.to_owned()))
        } else {
            Output::none()
        })
    })
}
