//! Memoizing registry of converters and resolved URLs.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                              Registry                                │
//! │                                                                      │
//! │  converters (ArcSwap)      memo (RwLock)             urls (Publisher)│
//! │  ┌───────────────────┐     ┌──────────────────────┐  ┌─────────────┐ │
//! │  │ [c1, c2, c3, ...] │     │ url ─► Arc<Dataset>  │  │ {url, ...}  │ │
//! │  └─────────┬─────────┘     └──────────▲───────────┘  └──────▲──────┘ │
//! │            │ snapshot                 │ insert              │ publish│
//! │            ▼                          │                     │        │
//! │  get_url ─► combine ─► apply_converter(resolve seed) ───────┘        │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Resolution runs on a snapshot of the converter set with no lock held, so
//! converters may call back into the registry.
//!
//! # Staleness
//!
//! With [`StalePolicy::Keep`] a URL resolved before a converter was added
//! keeps its old dataset until [`Registry::invalidate`] or
//! [`Registry::clear`]. [`StalePolicy::Invalidate`] drops the whole memo on
//! every converter change instead.

use crate::{
    builtin::{RESOLVE_DATA_TYPE, VIEWER_DATA_TYPE, create_resolve_dataset},
    convert::{Conversion, Converter, apply_converter_limited, combine_many_converters},
    data::{DataType, Dataset, Datasets, Url},
    error::RegistryError,
    log,
    stream::{Publisher, Subscription, ValueStream},
};
use arc_swap::ArcSwap;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

/// What happens to memoized datasets when the converter set changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StalePolicy {
    /// Keep memoized datasets; new converters only affect new resolutions.
    #[default]
    Keep,
    /// Drop every memoized dataset.
    Invalidate,
}

/// Registry tuning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryOptions {
    pub stale: StalePolicy,
    /// Converter calls allowed per resolution; unlimited when `None`.
    pub max_steps: Option<usize>,
    /// Log every resolution.
    pub verbose: bool,
}

/// Converter set, memo cache and observable URL set.
///
/// # Thread Safety
///
/// - converter set: copy-on-write behind `ArcSwap`, lock-free to read
/// - memo cache: `RwLock`, never held while converters run
/// - URL set: [`Publisher`], observers run outside its lock
///
/// Two threads resolving the same URL at once both compute it; the first
/// stored dataset is the one both get back.
#[derive(Default)]
pub struct Registry {
    converters: ArcSwap<Vec<Converter>>,
    /// Bumped on every converter change.
    epoch: AtomicU64,
    memo: RwLock<FxHashMap<Url, Arc<Dataset>>>,
    urls: Publisher<BTreeSet<Url>>,
    options: RegistryOptions,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RegistryOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> RegistryOptions {
        self.options
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Resolved dataset for `url`, computed on first request.
    ///
    /// A converter error aborts the resolution and nothing is memoized.
    pub fn get_url(&self, url: &str) -> Result<Arc<Dataset>, RegistryError> {
        if let Some(dataset) = self.memo.read().get(url) {
            return Ok(Arc::clone(dataset));
        }

        let epoch = self.epoch.load(Ordering::Acquire);
        let converters = self.converters.load_full();
        let converter = combine_many_converters(converters.iter().cloned());
        let resolved = apply_converter_limited(
            url,
            &create_resolve_dataset(),
            &converter,
            self.options.max_steps,
        )?;

        let dataset = {
            let mut memo = self.memo.write();
            let outdated = self.options.stale == StalePolicy::Invalidate
                && self.epoch.load(Ordering::Acquire) != epoch;
            if outdated {
                // Computed from a converter set that has since changed
                Arc::new(resolved)
            } else {
                Arc::clone(memo.entry(url.to_owned()).or_insert_with(|| Arc::new(resolved)))
            }
        };
        self.inject_url(url);

        if self.options.verbose {
            log!("registry"; "resolved `{url}` into {} mimetypes", dataset.len());
        }
        Ok(dataset)
    }

    pub fn is_resolved(&self, url: &str) -> bool {
        self.memo.read().contains_key(url)
    }

    /// Forget the memoized dataset of `url`. The URL stays known.
    pub fn invalidate(&self, url: &str) -> bool {
        self.memo.write().remove(url).is_some()
    }

    /// Forget every memoized dataset.
    pub fn clear(&self) {
        self.memo.write().clear();
    }

    // ========================================================================
    // Converters
    // ========================================================================

    /// Register a converter. Returns `false` if it was already registered.
    pub fn add_converter(&self, converter: Converter) -> bool {
        let mut added = false;
        self.converters.rcu(|current| {
            added = !current.iter().any(|known| known.ptr_eq(&converter));
            let mut next = Vec::clone(current);
            if added {
                next.push(converter.clone());
            }
            next
        });
        if added {
            self.converters_changed();
        }
        added
    }

    pub fn add_converters(&self, converters: impl IntoIterator<Item = Converter>) {
        for converter in converters {
            self.add_converter(converter);
        }
    }

    /// Unregister a converter. Returns whether it was registered.
    pub fn remove_converter(&self, converter: &Converter) -> bool {
        let mut removed = false;
        self.converters.rcu(|current| {
            let next: Vec<Converter> = current
                .iter()
                .filter(|known| !known.ptr_eq(converter))
                .cloned()
                .collect();
            removed = next.len() != current.len();
            next
        });
        if removed {
            self.converters_changed();
        }
        removed
    }

    pub fn converter_count(&self) -> usize {
        self.converters.load().len()
    }

    fn converters_changed(&self) {
        // Bumped before clearing, so a resolution racing the clear sees it
        self.epoch.fetch_add(1, Ordering::AcqRel);
        if self.options.stale == StalePolicy::Invalidate {
            self.clear();
        }
    }

    /// Make `datasets` part of every later resolution of their URLs.
    ///
    /// Registers a converter that answers the resolve seed of each URL with
    /// that URL's entries, at their original cost. The URLs are published
    /// right away. Returns the converter so the source can be removed again.
    pub fn add_datasets(&self, datasets: Datasets) -> Converter {
        for url in datasets.urls() {
            self.inject_url(url);
        }

        let datasets = Arc::new(datasets);
        let converter = Converter::new(move |input| {
            if RESOLVE_DATA_TYPE.parse_mime_type(input.mime_type).is_none() {
                return Ok(Vec::new());
            }
            let Some(dataset) = datasets.get(input.url) else {
                return Ok(Vec::new());
            };
            Ok(dataset
                .iter()
                .map(|(mime_type, value)| Conversion {
                    mime_type: mime_type.to_owned(),
                    cost: value.cost,
                    data: value.data.clone(),
                })
                .collect())
        });
        self.add_converter(converter.clone());
        converter
    }

    // ========================================================================
    // URLs
    // ========================================================================

    /// Publish `url` as known without resolving it.
    ///
    /// Returns `false` if it was already known.
    pub fn inject_url(&self, url: &str) -> bool {
        self.urls.update(|urls| {
            if urls.contains(url) {
                false
            } else {
                urls.insert(url.to_owned())
            }
        })
    }

    pub fn urls(&self) -> BTreeSet<Url> {
        self.urls.get()
    }

    /// The known URL set, now and after every change.
    pub fn urls_stream(&self) -> ValueStream<BTreeSet<Url>> {
        self.urls.stream()
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Labels of the viewers available for `url`.
    pub fn labels(&self, url: &str) -> Result<Vec<String>, RegistryError> {
        let dataset = self.get_url(url)?;
        Ok(VIEWER_DATA_TYPE.filter_dataset(&dataset).into_keys().collect())
    }

    /// Open the viewer labelled `label` for `url`.
    pub fn view(&self, url: &str, label: &str) -> Result<Subscription, RegistryError> {
        let dataset = self.get_url(url)?;
        let viewers = VIEWER_DATA_TYPE.filter_dataset(&dataset);
        let view = viewers.get(label).ok_or_else(|| RegistryError::NoViewer {
            url: url.to_owned(),
            label: label.to_owned(),
        })?;

        if self.options.verbose {
            log!("view"; "opening `{label}` for `{url}`");
        }
        view.open().map_err(|source| RegistryError::View {
            url: url.to_owned(),
            label: label.to_owned(),
            source,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
