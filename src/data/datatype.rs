//! Typed codecs over families of mimetypes.
//!
//! | Codec                  | Mimetype form             | Argument  |
//! |------------------------|---------------------------|-----------|
//! | [`DataTypeNoArgs`]     | `{mime}`                  | `()`      |
//! | [`DataTypeStringArg`]  | `{base}; {key}={value}`   | `String`  |
//!
//! Both can be built in `const` context, so well-known codecs live in
//! `static`s.

use super::dataset::{Data, DataValue, Dataset, Datasets, IntoData, MimeType, Url};
use indexmap::IndexMap;
use std::{borrow::Cow, fmt, hash::Hash, marker::PhantomData};

/// A codec between mimetypes and a typed argument, plus the payload type
/// stored under those mimetypes.
pub trait DataType {
    type Arg: Clone + Eq + Hash;
    type Value: IntoData + Clone + Send + Sync + 'static;

    /// Decode a mimetype, or `None` when it is not in this family.
    fn parse_mime_type(&self, mime_type: &str) -> Option<Self::Arg>;

    fn create_mime_type(&self, arg: &Self::Arg) -> MimeType;

    /// Entries of `dataset` in this family whose payload has the value type.
    ///
    /// An entry whose mimetype parses but whose payload has another Rust
    /// type is left out. This is a query over whatever a dataset holds.
    /// Converters built with [`create_converter`] treat the same mismatch as
    /// an error instead, since it means a codec was registered with the
    /// wrong payload type.
    ///
    /// [`create_converter`]: crate::convert::create_converter
    fn filter_dataset(&self, dataset: &Dataset) -> IndexMap<Self::Arg, Self::Value> {
        dataset
            .iter()
            .filter_map(|(mime_type, value)| {
                let arg = self.parse_mime_type(mime_type)?;
                Some((arg, value.data.get::<Self::Value>()?))
            })
            .collect()
    }

    /// Single-entry dataset at cost 0.
    fn create_dataset(&self, arg: &Self::Arg, value: Self::Value) -> Dataset {
        let mut dataset = Dataset::new();
        dataset.insert(self.create_mime_type(arg), DataValue::new(0, value));
        dataset
    }

    fn create_datasets(&self, url: impl Into<Url>, arg: &Self::Arg, value: Self::Value) -> Datasets
    where
        Self: Sized,
    {
        let mut datasets = Datasets::new();
        datasets.insert(url, self.create_dataset(arg, value));
        datasets
    }
}

impl<D: DataType + ?Sized> DataType for &D {
    type Arg = D::Arg;
    type Value = D::Value;

    fn parse_mime_type(&self, mime_type: &str) -> Option<Self::Arg> {
        (**self).parse_mime_type(mime_type)
    }

    fn create_mime_type(&self, arg: &Self::Arg) -> MimeType {
        (**self).create_mime_type(arg)
    }
}

// ============================================================================
// No-argument codec
// ============================================================================

/// Codec for exactly one mimetype.
pub struct DataTypeNoArgs<T> {
    mime_type: Cow<'static, str>,
    _value: PhantomData<fn() -> T>,
}

impl<T> DataTypeNoArgs<T> {
    pub const fn new(mime_type: &'static str) -> Self {
        Self {
            mime_type: Cow::Borrowed(mime_type),
            _value: PhantomData,
        }
    }

    pub fn owned(mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: Cow::Owned(mime_type.into()),
            _value: PhantomData,
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

impl<T: IntoData + Clone + Send + Sync + 'static> DataTypeNoArgs<T> {
    /// The payload stored under this mimetype, if any.
    pub fn get_dataset(&self, dataset: &Dataset) -> Option<T> {
        dataset.data(&self.mime_type).and_then(Data::get::<T>)
    }
}

impl<T: IntoData + Clone + Send + Sync + 'static> DataType for DataTypeNoArgs<T> {
    type Arg = ();
    type Value = T;

    fn parse_mime_type(&self, mime_type: &str) -> Option<()> {
        (mime_type == self.mime_type).then_some(())
    }

    fn create_mime_type(&self, _: &()) -> MimeType {
        self.mime_type.to_string()
    }
}

impl<T> fmt::Debug for DataTypeNoArgs<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DataTypeNoArgs").field(&self.mime_type).finish()
    }
}

// ============================================================================
// String-argument codec
// ============================================================================

/// Codec for `{base}; {key}={value}` mimetypes.
///
/// The value is everything after the `=`, taken verbatim.
pub struct DataTypeStringArg<T> {
    base: Cow<'static, str>,
    key: Cow<'static, str>,
    _value: PhantomData<fn() -> T>,
}

impl<T> DataTypeStringArg<T> {
    pub const fn new(base: &'static str, key: &'static str) -> Self {
        Self {
            base: Cow::Borrowed(base),
            key: Cow::Borrowed(key),
            _value: PhantomData,
        }
    }

    pub fn owned(base: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            base: Cow::Owned(base.into()),
            key: Cow::Owned(key.into()),
            _value: PhantomData,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<T: IntoData + Clone + Send + Sync + 'static> DataType for DataTypeStringArg<T> {
    type Arg = String;
    type Value = T;

    fn parse_mime_type(&self, mime_type: &str) -> Option<String> {
        let value = mime_type
            .strip_prefix(&*self.base)?
            .strip_prefix("; ")?
            .strip_prefix(&*self.key)?
            .strip_prefix('=')?;
        Some(value.to_owned())
    }

    fn create_mime_type(&self, arg: &String) -> MimeType {
        format!("{}; {}={arg}", self.base, self.key)
    }
}

impl<T> fmt::Debug for DataTypeStringArg<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataTypeStringArg({}; {}=…)", self.base, self.key)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::ValueStream;

    static LABEL: DataTypeNoArgs<String> = DataTypeNoArgs::new("application/x.label");
    static TEXT: DataTypeStringArg<ValueStream<String>> =
        DataTypeStringArg::new("text/plain", "mimeType");
    static MARKER: DataTypeNoArgs<()> = DataTypeNoArgs::new("application/x.marker");
    static MARKER_ARG: DataTypeStringArg<()> =
        DataTypeStringArg::new("application/x.marker", "mimetype");

    #[test]
    fn test_string_arg_round_trip() {
        for arg in ["text/csv", "", "a=b; c=d", "application/vnd.dataresource+json"] {
            let mime_type = TEXT.create_mime_type(&arg.to_string());
            assert_eq!(TEXT.parse_mime_type(&mime_type).as_deref(), Some(arg));
        }
        assert_eq!(
            TEXT.create_mime_type(&"text/csv".into()),
            "text/plain; mimeType=text/csv"
        );
    }

    #[test]
    fn test_string_arg_rejects_other_families() {
        assert_eq!(TEXT.parse_mime_type("text/plain"), None);
        assert_eq!(TEXT.parse_mime_type("text/plain; charset=utf-8"), None);
        assert_eq!(TEXT.parse_mime_type("text/plainer; mimeType=x"), None);
        assert_eq!(TEXT.parse_mime_type("text/plain;mimeType=x"), None);
    }

    #[test]
    fn test_no_args_matches_exactly() {
        assert_eq!(LABEL.parse_mime_type("application/x.label"), Some(()));
        assert_eq!(LABEL.parse_mime_type("application/x.label; x=1"), None);
        assert_eq!(LABEL.create_mime_type(&()), "application/x.label");
    }

    #[test]
    fn test_shared_base_codecs_do_not_collide() {
        let plain = MARKER.create_mime_type(&());
        let with_arg = MARKER_ARG.create_mime_type(&"text/csv".into());
        assert_eq!(MARKER_ARG.parse_mime_type(&plain), None);
        assert_eq!(MARKER.parse_mime_type(&with_arg), None);
    }

    #[test]
    fn test_filter_dataset_by_family_and_type() {
        let mut dataset = TEXT.create_dataset(&"text/csv".into(), ValueStream::just("a,b".into()));
        dataset.merge_from(&TEXT.create_dataset(&"text/markdown".into(), ValueStream::just("# x".into())));
        dataset.insert("text/plain", DataValue::new(0, "raw".to_string()));

        let found = TEXT.filter_dataset(&dataset);
        assert_eq!(
            found.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["text/csv", "text/markdown"]
        );
        assert_eq!(found["text/csv"].current(), Some(Ok("a,b".to_string())));
    }

    #[test]
    fn test_filter_dataset_skips_mismatched_payload() {
        let mut dataset = TEXT.create_dataset(&"text/csv".into(), ValueStream::just("a,b".into()));
        // Right family, wrong payload type
        dataset.insert("text/plain; mimeType=text/html", DataValue::new(0, 5u32));
        dataset.insert("text/plain; mimeType=text/markdown", DataValue::new(0, "# x".to_string()));

        let found = TEXT.filter_dataset(&dataset);
        assert_eq!(found.keys().map(String::as_str).collect::<Vec<_>>(), vec!["text/csv"]);
        assert_eq!(TEXT.parse_mime_type("text/plain; mimeType=text/html").as_deref(), Some("text/html"));
    }

    #[test]
    fn test_get_dataset() {
        let datasets = LABEL.create_datasets("mem://x", &(), "Notes".to_string());
        let dataset = datasets.get("mem://x").unwrap();
        assert_eq!(LABEL.get_dataset(dataset).as_deref(), Some("Notes"));
        assert_eq!(LABEL.get_dataset(&Dataset::new()), None);
    }

    #[test]
    fn test_codec_by_reference() {
        let by_ref = &TEXT;
        assert_eq!(
            by_ref.parse_mime_type("text/plain; mimeType=a/b").as_deref(),
            Some("a/b")
        );
    }
}
