//! Viewers and display labels.
//!
//! A viewer is a [`View`] stored under `application/x.jupyter.viewer;
//! label=…`. Opening it attaches whatever it displays and returns the
//! subscription that keeps it attached.

use super::{resolvers::RESOLVE_DATA_TYPE, text::TEXT_DATA_TYPE};
use crate::{
    convert::{Converter, Output, create_converter},
    data::{Data, DataTypeNoArgs, DataTypeStringArg, IntoData},
    stream::{Observer, Subscription, ValueStream},
};
use anyhow::Result;
use std::{fmt, sync::Arc};

/// Viewer labelled with the argument.
pub static VIEWER_DATA_TYPE: DataTypeStringArg<View> =
    DataTypeStringArg::new("application/x.jupyter.viewer", "label");

/// Human readable name of a URL.
pub static LABEL_DATA_TYPE: DataTypeNoArgs<ValueStream<String>> =
    DataTypeNoArgs::new("application/x.jupyterlab.label");

/// Label of the viewer added by [`text_print_viewer_converter`].
pub const PRINT_LABEL: &str = "Print";

type OpenFn = dyn Fn() -> Result<Subscription> + Send + Sync;

/// Openable view of a dataset entry.
#[derive(Clone)]
pub struct View {
    open: Arc<OpenFn>,
}

impl View {
    pub fn new(open: impl Fn() -> Result<Subscription> + Send + Sync + 'static) -> Self {
        Self { open: Arc::new(open) }
    }

    /// Attach the view. Dropping the subscription closes it.
    pub fn open(&self) -> Result<Subscription> {
        (self.open)()
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("View")
    }
}

impl IntoData for View {
    fn into_data(self) -> Data {
        Data::new(self)
    }
}

/// Offer a [`PRINT_LABEL`] viewer for every text entry, forwarding the text
/// to `sink` when opened.
pub fn text_print_viewer_converter(sink: Observer<String>) -> Converter {
    create_converter(&TEXT_DATA_TYPE, &VIEWER_DATA_TYPE, move |args| {
        let sink = sink.clone();
        let text = args.data;
        let view = View::new(move || Ok(text.subscribe(sink.clone())));
        Ok(Output::typed(PRINT_LABEL.to_string(), view))
    })
}

/// Label every URL with the last segment of its path, or the URL itself.
pub fn url_label_converter() -> Converter {
    create_converter(&RESOLVE_DATA_TYPE, &LABEL_DATA_TYPE, |args| {
        let label = args
            .parsed_url()
            .and_then(|url| {
                url.path_segments()?
                    .filter(|segment| !segment.is_empty())
                    .next_back()
                    .map(str::to_owned)
            })
            .unwrap_or_else(|| args.url.to_owned());
        Ok(Output::value(ValueStream::just(label)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        builtin::create_resolve_dataset,
        convert::apply_converter,
        data::{DataType, Dataset},
        stream::Notification,
    };
    use parking_lot::Mutex;

    fn label_of(url: &str) -> Option<String> {
        let dataset = apply_converter(url, &create_resolve_dataset(), &url_label_converter()).unwrap();
        LABEL_DATA_TYPE.get_dataset(&dataset)?.current()?.ok()
    }

    #[test]
    fn test_url_labels() {
        assert_eq!(label_of("file:///data/people.csv").as_deref(), Some("people.csv"));
        assert_eq!(label_of("https://example.com/dir/").as_deref(), Some("dir"));
        assert_eq!(label_of("mem://greeting").as_deref(), Some("mem://greeting"));
    }

    #[test]
    fn test_print_viewer_forwards_text() {
        let printed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&printed);
        let converter = text_print_viewer_converter(Observer::new(move |n| {
            if let Notification::Next(text) = n {
                sink.lock().push(text);
            }
        }));

        let seed: Dataset =
            TEXT_DATA_TYPE.create_dataset(&"text/csv".into(), ValueStream::just("a,b".into()));
        let dataset = apply_converter("mem://t", &seed, &converter).unwrap();
        let viewers = VIEWER_DATA_TYPE.filter_dataset(&dataset);
        let view = viewers.get(PRINT_LABEL).unwrap();

        assert!(printed.lock().is_empty(), "nothing is shown before opening");
        let _open = view.open().unwrap();
        assert_eq!(*printed.lock(), vec!["a,b".to_string()]);
    }
}
