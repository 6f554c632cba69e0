//! Folders and the datasets nested inside them.
//!
//! ```text
//! file:///data/
//!   application/x.jupyter.resolve      (0)
//!   application/x.jupyter.folder       (1)  {"people.csv", "raw/"}
//!   application/x.jupyter.datasets     (2)  {file:///data/people.csv, file:///data/raw/}
//! ```
//!
//! Entry names ending with `/` are folders themselves, so their URLs resolve
//! to folders again.

use super::resolvers::RESOLVE_DATA_TYPE;
use crate::{
    convert::{Converter, Output, create_converter},
    data::{DataTypeNoArgs, Url},
    error::StreamError,
    stream::ValueStream,
};
use anyhow::{Context, Result};
use std::{
    collections::BTreeSet,
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::runtime::Handle;

/// Names of the entries of a folder, relative to it.
pub static FOLDER_DATA_TYPE: DataTypeNoArgs<ValueStream<BTreeSet<String>>> =
    DataTypeNoArgs::new("application/x.jupyter.folder");

/// URLs of the datasets contained in this one.
pub static NESTED_DATA_TYPE: DataTypeNoArgs<ValueStream<BTreeSet<Url>>> =
    DataTypeNoArgs::new("application/x.jupyter.datasets");

/// `file:` URL of a folder, with the trailing slash folder converters expect.
pub fn create_folder_url(path: &Path) -> Option<Url> {
    url::Url::from_directory_path(path).ok().map(String::from)
}

/// `file:` URLs ending with `/` become folders listed by `contents`.
///
/// The listing runs on `handle` once the folder is first observed.
pub fn folder_converter<F, Fut>(handle: Handle, contents: F) -> Converter
where
    F: Fn(PathBuf) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<BTreeSet<String>>> + Send + 'static,
{
    let contents = Arc::new(contents);
    create_converter(&RESOLVE_DATA_TYPE, &FOLDER_DATA_TYPE, move |args| {
        let Some(path) = args
            .parsed_url()
            .filter(|url| url.scheme() == "file" && url.path().ends_with('/'))
            .and_then(|url| url.to_file_path().ok())
        else {
            return Ok(Output::none());
        };

        let contents = Arc::clone(&contents);
        let listing = ValueStream::spawn(handle.clone(), move || {
            let pending = contents(path.clone());
            async move { pending.await.map_err(StreamError::from) }
        });
        Ok(Output::value(listing))
    })
}

/// [`folder_converter`] over the local filesystem.
pub fn local_folder_converter(handle: Handle) -> Converter {
    folder_converter(handle, list_folder)
}

async fn list_folder(path: PathBuf) -> Result<BTreeSet<String>> {
    let mut entries = tokio::fs::read_dir(&path)
        .await
        .with_context(|| format!("failed to list `{}`", path.display()))?;

    let mut names = BTreeSet::new();
    while let Some(entry) = entries.next_entry().await? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await?.is_dir() {
            name.push('/');
        }
        names.insert(name);
    }
    Ok(names)
}

/// Folder entries become the URLs of the datasets nested in the folder.
pub fn folder_datasets_converter() -> Converter {
    create_converter(&FOLDER_DATA_TYPE, &NESTED_DATA_TYPE, |args| {
        let Some(base) = args.parsed_url() else {
            return Ok(Output::none());
        };
        let children = args.data.map(move |names| {
            names
                .iter()
                .filter_map(|name| child_url(&base, name))
                .collect::<BTreeSet<_>>()
        });
        Ok(Output::value(children))
    })
}

/// `name` resolved under the folder `base`, one path segment per `/`.
fn child_url(base: &url::Url, name: &str) -> Option<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend(name.trim_start_matches('/').split('/'));
    Some(url.into())
}
