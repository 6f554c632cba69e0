//! Datasets and their cost-minimal merge.

use crate::stream::{ErrorPolicy, ValueStream};
use indexmap::IndexMap;
use std::{
    any::{Any, type_name},
    collections::{BTreeMap, BTreeSet},
    fmt,
    path::PathBuf,
    sync::Arc,
};

pub type Url = String;
pub type MimeType = String;

/// Number of conversion steps from a URL's origin data.
pub type Cost = u32;

// ============================================================================
// Data
// ============================================================================

/// Type-erased, cheaply cloneable payload.
///
/// Equality is identity: two `Data` are equal when they share one allocation.
#[derive(Clone)]
pub struct Data {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Data {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Payload of the resolve seed, which carries no information.
    pub fn unit() -> Self {
        Self::new(())
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Clone the payload out if it has type `T`.
    pub fn get<T: Any + Clone>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }

    /// Rust type name of the payload, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl PartialEq for Data {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Data<{}>", self.type_name)
    }
}

/// Conversion into a dataset payload.
///
/// Value streams are wrapped in a cached stream on the way in, so every
/// consumer of the entry shares one upstream run.
pub trait IntoData: Sized {
    fn into_data(self) -> Data;

    /// Like [`into_data`](Self::into_data), with an explicit error policy for
    /// streams.
    fn into_data_with(self, _policy: ErrorPolicy) -> Data {
        self.into_data()
    }
}

impl IntoData for Data {
    fn into_data(self) -> Data {
        self
    }
}

impl<T: Clone + Send + Sync + 'static> IntoData for ValueStream<T> {
    fn into_data(self) -> Data {
        self.into_data_with(ErrorPolicy::default())
    }

    fn into_data_with(self, policy: ErrorPolicy) -> Data {
        Data::new(self.cached_with(policy))
    }
}

macro_rules! plain_data {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoData for $ty {
                fn into_data(self) -> Data {
                    Data::new(self)
                }
            }
        )*
    };
}

plain_data!((), bool, char, String, PathBuf, i32, i64, u32, u64, usize, f32, f64);

impl<T: ?Sized + Send + Sync + 'static> IntoData for Arc<T> {
    fn into_data(self) -> Data {
        Data::new(self)
    }
}

impl<T: Send + Sync + 'static> IntoData for Vec<T> {
    fn into_data(self) -> Data {
        Data::new(self)
    }
}

impl<T: Send + Sync + 'static> IntoData for BTreeSet<T> {
    fn into_data(self) -> Data {
        Data::new(self)
    }
}

impl<K: Send + Sync + 'static, V: Send + Sync + 'static> IntoData for BTreeMap<K, V> {
    fn into_data(self) -> Data {
        Data::new(self)
    }
}

// ============================================================================
// Dataset
// ============================================================================

/// Cost-annotated payload stored under one mimetype.
#[derive(Debug, Clone, PartialEq)]
pub struct DataValue {
    pub cost: Cost,
    pub data: Data,
}

impl DataValue {
    pub fn new(cost: Cost, data: impl IntoData) -> Self {
        Self {
            cost,
            data: data.into_data(),
        }
    }
}

/// Mimetype → cost-annotated data, for a single URL.
///
/// Iteration follows insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    entries: IndexMap<MimeType, DataValue>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single entry at cost 0.
    pub fn single(mime_type: impl Into<MimeType>, data: impl IntoData) -> Self {
        let mut dataset = Self::new();
        dataset.insert(mime_type, DataValue::new(0, data));
        dataset
    }

    pub fn get(&self, mime_type: &str) -> Option<&DataValue> {
        self.entries.get(mime_type)
    }

    pub fn data(&self, mime_type: &str) -> Option<&Data> {
        self.get(mime_type).map(|value| &value.data)
    }

    pub fn contains(&self, mime_type: &str) -> bool {
        self.entries.contains_key(mime_type)
    }

    /// Store `value` unconditionally, returning the replaced entry.
    pub fn insert(&mut self, mime_type: impl Into<MimeType>, value: DataValue) -> Option<DataValue> {
        self.entries.insert(mime_type.into(), value)
    }

    /// Store `value` if the mimetype is absent or held at a strictly higher
    /// cost. Returns whether the entry was taken.
    pub fn offer(&mut self, mime_type: &str, value: &DataValue) -> bool {
        match self.entries.get_mut(mime_type) {
            Some(current) if current.cost <= value.cost => false,
            Some(current) => {
                *current = value.clone();
                true
            }
            None => {
                self.entries.insert(mime_type.to_owned(), value.clone());
                true
            }
        }
    }

    /// Fold `other` in, keeping the cheapest entry per mimetype.
    ///
    /// On equal cost the entry already present wins.
    pub fn merge_from(&mut self, other: &Dataset) {
        for (mime_type, value) in other.iter() {
            self.offer(mime_type, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DataValue)> {
        self.entries.iter().map(|(mime_type, value)| (mime_type.as_str(), value))
    }

    pub fn mime_types(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(MimeType, DataValue)> for Dataset {
    fn from_iter<I: IntoIterator<Item = (MimeType, DataValue)>>(iter: I) -> Self {
        let mut dataset = Self::new();
        for (mime_type, value) in iter {
            dataset.offer(&mime_type, &value);
        }
        dataset
    }
}

// ============================================================================
// Datasets
// ============================================================================

/// URL → dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Datasets {
    entries: IndexMap<Url, Dataset>,
}

impl Datasets {
    pub fn new() -> Self {
        Self::default()
    }

    /// One URL with a single entry at cost 0.
    pub fn single(url: impl Into<Url>, mime_type: impl Into<MimeType>, data: impl IntoData) -> Self {
        let mut datasets = Self::new();
        datasets.insert(url, Dataset::single(mime_type, data));
        datasets
    }

    pub fn get(&self, url: &str) -> Option<&Dataset> {
        self.entries.get(url)
    }

    pub fn insert(&mut self, url: impl Into<Url>, dataset: Dataset) -> Option<Dataset> {
        self.entries.insert(url.into(), dataset)
    }

    /// Fold `other` in, merging the datasets of shared URLs.
    pub fn merge_from(&mut self, other: &Datasets) {
        for (url, dataset) in &other.entries {
            match self.entries.get_mut(url) {
                Some(current) => current.merge_from(dataset),
                None => {
                    self.entries.insert(url.clone(), dataset.clone());
                }
            }
        }
    }

    /// Data stored for `url` under `mime_type`, if any.
    pub fn data(&self, url: &str, mime_type: &str) -> Option<&Data> {
        self.get(url)?.data(mime_type)
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Mimetypes known for `url`; empty when the URL is absent.
    pub fn mime_types(&self, url: &str) -> Vec<&str> {
        self.get(url)
            .map(|dataset| dataset.mime_types().collect())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Dataset)> {
        self.entries.iter().map(|(url, dataset)| (url.as_str(), dataset))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Free-standing operations
// ============================================================================

pub fn create_dataset(mime_type: impl Into<MimeType>, data: impl IntoData) -> Dataset {
    Dataset::single(mime_type, data)
}

pub fn create_datasets(
    url: impl Into<Url>,
    mime_type: impl Into<MimeType>,
    data: impl IntoData,
) -> Datasets {
    Datasets::single(url, mime_type, data)
}

/// Cost-minimal union of datasets. Earlier arguments win ties.
pub fn merge_dataset<'a>(datasets: impl IntoIterator<Item = &'a Dataset>) -> Dataset {
    let mut merged = Dataset::new();
    for dataset in datasets {
        merged.merge_from(dataset);
    }
    merged
}

pub fn merge_datasets<'a>(datasets: impl IntoIterator<Item = &'a Datasets>) -> Datasets {
    let mut merged = Datasets::new();
    for datasets in datasets {
        merged.merge_from(datasets);
    }
    merged
}

pub fn get_data<'a>(datasets: &'a Datasets, url: &str, mime_type: &str) -> Option<&'a Data> {
    datasets.data(url, mime_type)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn value(cost: Cost, text: &str) -> DataValue {
        DataValue::new(cost, text.to_string())
    }

    fn text(dataset: &Dataset, mime_type: &str) -> Option<String> {
        dataset.data(mime_type)?.get::<String>()
    }

    // ------------------------------------------------------------------------
    // Data
    // ------------------------------------------------------------------------

    #[test]
    fn test_data_downcast() {
        let data = Data::new(5u32);
        assert!(data.is::<u32>());
        assert_eq!(data.get::<u32>(), Some(5));
        assert_eq!(data.get::<String>(), None);
        assert_eq!(data.type_name(), "u32");
    }

    #[test]
    fn test_data_equality_is_identity() {
        let data = Data::new("x".to_string());
        assert_eq!(data, data.clone());
        assert_ne!(data, Data::new("x".to_string()));
    }

    #[test]
    fn test_stream_payload_is_cached() {
        let data = ValueStream::just(1u8).into_data();
        let stream = data.get::<ValueStream<u8>>().unwrap();
        assert!(stream.is_cached());
    }

    #[test]
    fn test_plain_payload_ignores_error_policy() {
        let data = vec![1u8, 2].into_data_with(ErrorPolicy::Retry);
        assert_eq!(data.get::<Vec<u8>>(), Some(vec![1, 2]));

        let data = ValueStream::just(1u8).into_data_with(ErrorPolicy::Retry);
        assert!(data.get::<ValueStream<u8>>().unwrap().is_cached());
    }

    // ------------------------------------------------------------------------
    // Merge
    // ------------------------------------------------------------------------

    #[test]
    fn test_merge_keeps_cheapest() {
        let mut a = Dataset::new();
        a.insert("text/csv", value(3, "slow"));
        a.insert("text/plain", value(1, "a-plain"));
        let mut b = Dataset::new();
        b.insert("text/csv", value(1, "fast"));
        b.insert("text/plain", value(2, "b-plain"));

        let merged = merge_dataset([&a, &b]);
        assert_eq!(text(&merged, "text/csv").as_deref(), Some("fast"));
        assert_eq!(merged.get("text/csv").map(|v| v.cost), Some(1));
        assert_eq!(text(&merged, "text/plain").as_deref(), Some("a-plain"));
    }

    #[test]
    fn test_merge_tie_keeps_first() {
        let first = create_dataset("text/plain", "first".to_string());
        let second = create_dataset("text/plain", "second".to_string());
        let merged = merge_dataset([&first, &second]);
        assert_eq!(text(&merged, "text/plain").as_deref(), Some("first"));
    }

    #[test]
    fn test_merge_idempotent() {
        let mut dataset = Dataset::new();
        dataset.insert("a", value(0, "x"));
        dataset.insert("b", value(4, "y"));
        assert_eq!(merge_dataset([&dataset, &dataset]), dataset);
        assert_eq!(merge_dataset([&dataset]), dataset);
    }

    #[test]
    fn test_merge_cost_is_minimum_of_inputs() {
        let inputs: Vec<Dataset> = (0..4)
            .map(|i| {
                let mut d = Dataset::new();
                d.insert("m", value(10 - i * 2, "v"));
                if i % 2 == 0 {
                    d.insert("odd-only", value(i + 1, "w"));
                }
                d
            })
            .collect();
        let merged = merge_dataset(&inputs);
        for mime_type in ["m", "odd-only"] {
            let expected = inputs
                .iter()
                .filter_map(|d| d.get(mime_type).map(|v| v.cost))
                .min();
            assert_eq!(merged.get(mime_type).map(|v| v.cost), expected);
        }
    }

    #[test]
    fn test_offer_rejects_equal_cost() {
        let mut dataset = Dataset::new();
        dataset.insert("a", DataValue::new(2, 1u32));
        assert!(dataset.offer("a", &DataValue::new(1, 2u32)));
        assert!(!dataset.offer("a", &DataValue::new(1, 3u32)));
        assert!(!dataset.offer("a", &DataValue::new(5, 4u32)));
        assert_eq!(dataset.data("a").and_then(|d| d.get::<u32>()), Some(2));
    }

    #[test]
    fn test_merge_datasets_two_levels() {
        let a = create_datasets("u1", "text/plain", "one".to_string());
        let mut b = create_datasets("u2", "text/plain", "two".to_string());
        b.merge_from(&create_datasets("u1", "text/csv", "a,b".to_string()));

        let merged = merge_datasets([&a, &b]);
        assert_eq!(merged.urls().collect::<Vec<_>>(), vec!["u1", "u2"]);
        assert_eq!(merged.mime_types("u1"), vec!["text/plain", "text/csv"]);
        assert!(get_data(&merged, "u2", "text/plain").is_some());
    }

    #[test]
    fn test_get_data_absent() {
        let datasets = create_datasets("u", "text/plain", ());
        assert!(get_data(&datasets, "missing", "text/plain").is_none());
        assert!(get_data(&datasets, "u", "text/csv").is_none());
        assert!(datasets.mime_types("missing").is_empty());
    }
}
