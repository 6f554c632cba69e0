//! Local files.

use super::{resolvers::RESOLVE_MIMETYPE_DATA_TYPE, text::TEXT_DATA_TYPE, urls::URL_DATA_TYPE};
use crate::{
    convert::{Converter, Output, create_converter, create_converter_with},
    data::{DataTypeStringArg, Url},
    error::StreamError,
    stream::{ErrorPolicy, ValueStream},
};
use anyhow::{Context, Result};
use std::{
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::runtime::Handle;

/// A file on disk whose content has the argument mimetype.
pub static FILE_DATA_TYPE: DataTypeStringArg<PathBuf> =
    DataTypeStringArg::new("application/x.jupyter.file", "mimeType");

/// `file:` URL for an absolute path.
pub fn create_file_url(path: &Path) -> Option<Url> {
    url::Url::from_file_path(path).ok().map(String::from)
}

/// `file:` URLs with a declared mimetype become files of that mimetype.
pub fn resolve_file_converter() -> Converter {
    create_converter(&RESOLVE_MIMETYPE_DATA_TYPE, &FILE_DATA_TYPE, |args| {
        let Some(url) = args.parsed_url().filter(|url| url.scheme() == "file") else {
            return Ok(Output::none());
        };
        let path = url
            .to_file_path()
            .map_err(|()| anyhow::anyhow!("`{}` has no local path", args.url))?;
        Ok(Output::typed(args.arg, path))
    })
}

/// Read a file's content as text, on the given runtime.
///
/// The read starts when the text is first observed and is shared by every
/// observer. With [`ErrorPolicy::Retry`] a failed read is attempted again by
/// the next observer.
pub fn file_text_converter(handle: Handle, policy: ErrorPolicy) -> Converter {
    create_converter_with(policy, &FILE_DATA_TYPE, &TEXT_DATA_TYPE, move |args| {
        let path = args.data;
        let text = ValueStream::spawn(handle.clone(), move || {
            let path = path.clone();
            async move {
                tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("failed to read `{}`", path.display()))
                    .map_err(StreamError::from)
            }
        });
        Ok(Output::typed(args.arg, text))
    })
}

/// Files become URLs they can be downloaded from, as computed by
/// `download_url` on `handle`.
pub fn file_url_converter<F, Fut>(handle: Handle, download_url: F) -> Converter
where
    F: Fn(PathBuf) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Url>> + Send + 'static,
{
    let download_url = Arc::new(download_url);
    create_converter(&FILE_DATA_TYPE, &URL_DATA_TYPE, move |args| {
        let path = args.data;
        let download_url = Arc::clone(&download_url);
        let url = ValueStream::spawn(handle.clone(), move || {
            let pending = download_url(path.clone());
            async move { pending.await.map_err(StreamError::from) }
        });
        Ok(Output::typed(args.arg, url))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        builtin::{create_resolve_dataset, resolve_extension_converter},
        convert::{apply_converter, combine_many_converters},
        data::DataType,
    };
    use std::fs;
    use tempfile::TempDir;

    fn converters() -> Converter {
        combine_many_converters([
            resolve_extension_converter(".csv", "text/csv"),
            resolve_file_converter(),
            file_text_converter(Handle::current(), ErrorPolicy::Terminal),
        ])
    }

    #[test]
    fn test_create_file_url() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a b.csv");
        let url = create_file_url(&path).unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("a%20b.csv"));
        assert!(create_file_url(Path::new("relative.csv")).is_none());
    }

    #[tokio::test]
    async fn test_file_resolves_to_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("people.csv");
        fs::write(&path, "name\nada\n").unwrap();
        let url = create_file_url(&path).unwrap();

        let dataset = apply_converter(&url, &create_resolve_dataset(), &converters()).unwrap();

        let files = FILE_DATA_TYPE.filter_dataset(&dataset);
        assert_eq!(files.get("text/csv"), Some(&path));

        let texts = TEXT_DATA_TYPE.filter_dataset(&dataset);
        let text = texts.get("text/csv").unwrap();
        assert_eq!(text.first().await.unwrap(), "name\nada\n");
        assert_eq!(dataset.get("text/plain; mimeType=text/csv").map(|v| v.cost), Some(3));
    }

    #[tokio::test]
    async fn test_missing_file_errors_in_stream() {
        let dir = TempDir::new().unwrap();
        let url = create_file_url(&dir.path().join("gone.csv")).unwrap();

        // Resolution is lazy, so a missing file only fails when read
        let dataset = apply_converter(&url, &create_resolve_dataset(), &converters()).unwrap();
        let text = TEXT_DATA_TYPE.filter_dataset(&dataset).swap_remove("text/csv").unwrap();
        let err = text.first().await.unwrap_err();
        assert!(err.message().contains("gone.csv"));
    }

    #[tokio::test]
    async fn test_retry_rereads_after_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("late.csv");
        let url = create_file_url(&path).unwrap();
        let converter = combine_many_converters([
            resolve_extension_converter(".csv", "text/csv"),
            resolve_file_converter(),
            file_text_converter(Handle::current(), ErrorPolicy::Retry),
        ]);

        let dataset = apply_converter(&url, &create_resolve_dataset(), &converter).unwrap();
        let text = TEXT_DATA_TYPE.filter_dataset(&dataset).swap_remove("text/csv").unwrap();
        assert!(text.first().await.is_err());

        fs::write(&path, "late").unwrap();
        assert_eq!(text.first().await.unwrap(), "late");
    }

    #[tokio::test]
    async fn test_file_url_converter() {
        let converter = combine_many_converters([
            resolve_extension_converter(".csv", "text/csv"),
            resolve_file_converter(),
            file_url_converter(Handle::current(), |path: PathBuf| async move {
                let name = path.file_name().context("no file name")?;
                Ok(format!("https://files.example.com/{}", name.to_string_lossy()))
            }),
        ]);

        let dataset =
            apply_converter("file:///data/people.csv", &create_resolve_dataset(), &converter)
                .unwrap();
        let urls = URL_DATA_TYPE.filter_dataset(&dataset);
        let download = urls.get("text/csv").unwrap();
        assert_eq!(
            download.first().await.unwrap(),
            "https://files.example.com/people.csv"
        );
        assert_eq!(
            dataset.get("application/x.jupyter.url; mimeType=text/csv").map(|v| v.cost),
            Some(3)
        );
    }

    #[test]
    fn test_non_file_urls_are_ignored() {
        let converter = resolve_file_converter();
        let seed = RESOLVE_MIMETYPE_DATA_TYPE.create_dataset(&"text/csv".into(), ());
        let dataset = apply_converter("https://example.com/a.csv", &seed, &converter).unwrap();
        assert!(FILE_DATA_TYPE.filter_dataset(&dataset).is_empty());
    }
}
