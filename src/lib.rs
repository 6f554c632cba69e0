//! Reactive data registry.
//!
//! Resolve a URL into every mimetype reachable through the registered
//! converters, each at the cheapest number of conversion steps.
//!
//! # Architecture
//!
//! ```text
//!                 ┌────────────── Registry ───────────────┐
//!  get_url(url) ─►│ memo hit? ──yes──► Arc<Dataset>       │
//!                 │    │ no                               │
//!                 │    ▼                                  │
//!                 │ resolve seed ─► apply_converter ─► memo
//!                 └──────────┬────────────────────────────┘
//!                            │ combined converter set
//!          ┌─────────────────┼──────────────────┐
//!          ▼                 ▼                  ▼
//!     builtin::*       add_datasets()      config converters
//! ```
//!
//! | Module     | Purpose                                              |
//! |------------|------------------------------------------------------|
//! | `stream`   | Push-based value streams and the shared cache        |
//! | `data`     | Datasets, type-erased payloads, mimetype codecs      |
//! | `convert`  | Converter protocol, typed builders, resolution       |
//! | `builtin`  | Resolvers, files, URLs, text, viewers and labels     |
//! | `registry` | Memoized resolution, URL set, views                  |
//! | `config`   | `dataregistry.toml` loading                          |
//!
//! # Example
//!
//! ```ignore
//! let registry = Registry::new();
//! registry.add_datasets(Datasets::single("mem://a", "text/csv", ValueStream::just("x,y".to_string())));
//! let dataset = registry.get_url("mem://a")?;
//! assert!(dataset.contains("text/csv"));
//! ```

pub mod builtin;
pub mod config;
pub mod convert;
pub mod data;
pub mod error;
pub mod logger;
pub mod registry;
pub mod stream;

pub use convert::{Converter, apply_converter, combine_many_converters, create_converter};
pub use data::{DataType, Dataset, Datasets};
pub use error::{RegistryError, StreamError};
pub use registry::{Registry, RegistryOptions, StalePolicy};
pub use stream::{ErrorPolicy, Observer, Subscription, ValueStream};
