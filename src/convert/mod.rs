//! Converters and the resolution engine.
//!
//! A [`Converter`] looks at one `(url, mimetype, cost, data)` entry and
//! proposes new entries. The resolution engine applies a converter
//! repeatedly, starting from a seed dataset, until nothing cheaper can be
//! found.
//!
//! ```text
//!   seed ──► work list ──pop──► converter ──► results ──┐
//!                ▲                                      │
//!                └──────────── push ◀───────────────────┘
//! ```

mod resolve;
mod typed;

pub use resolve::{apply_converter, apply_converter_limited};
pub use typed::{ConvertArgs, Output, create_converter, create_converter_with};

use crate::data::{Cost, Data, DataValue, IntoData, MimeType};
use anyhow::Result;
use std::{fmt, sync::Arc};

/// One dataset entry handed to a converter.
#[derive(Debug, Clone, Copy)]
pub struct ConvertInput<'a> {
    pub url: &'a str,
    pub mime_type: &'a str,
    pub cost: Cost,
    pub data: &'a Data,
}

/// A proposed dataset entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub mime_type: MimeType,
    pub cost: Cost,
    pub data: Data,
}

impl Conversion {
    pub fn new(mime_type: impl Into<MimeType>, cost: Cost, data: impl IntoData) -> Self {
        Self {
            mime_type: mime_type.into(),
            cost,
            data: data.into_data(),
        }
    }

    pub fn into_value(self) -> (MimeType, DataValue) {
        (
            self.mime_type,
            DataValue {
                cost: self.cost,
                data: self.data,
            },
        )
    }
}

type ConvertFn = dyn Fn(&ConvertInput<'_>) -> Result<Vec<Conversion>> + Send + Sync;

/// Proposes new dataset entries from an existing one.
///
/// Returning `Err` aborts the resolution that invoked the converter.
/// Identity is by allocation: clones compare equal, separately built
/// converters never do.
#[derive(Clone)]
pub struct Converter {
    convert: Arc<ConvertFn>,
}

impl Converter {
    pub fn new(
        convert: impl Fn(&ConvertInput<'_>) -> Result<Vec<Conversion>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            convert: Arc::new(convert),
        }
    }

    /// A converter that never proposes anything.
    pub fn noop() -> Self {
        Self::new(|_| Ok(Vec::new()))
    }

    #[inline]
    pub fn convert(&self, input: &ConvertInput<'_>) -> Result<Vec<Conversion>> {
        (self.convert)(input)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.convert, &other.convert)
    }
}

impl PartialEq for Converter {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Converter({:p})", Arc::as_ptr(&self.convert).cast::<()>())
    }
}

/// Run every converter on the input and concatenate their proposals in
/// order. The first error aborts the whole call.
pub fn combine_many_converters(converters: impl IntoIterator<Item = Converter>) -> Converter {
    let converters: Vec<Converter> = converters.into_iter().collect();
    Converter::new(move |input| {
        let mut results = Vec::new();
        for converter in &converters {
            results.extend(converter.convert(input)?);
        }
        Ok(results)
    })
}
