//! Building converters from a pair of typed codecs.
//!
//! [`create_converter`] takes care of the bookkeeping every converter needs:
//! it skips mimetypes outside the `from` family, hands the callback typed
//! arguments, encodes results with the `to` codec at `cost + 1`, and caches
//! stream payloads.

use super::{Conversion, Converter};
use crate::{
    data::{Cost, DataType, IntoData},
    stream::ErrorPolicy,
};
use anyhow::{Result, bail};

/// Typed view of the entry being converted.
#[derive(Debug, Clone)]
pub struct ConvertArgs<'a, A, V> {
    pub url: &'a str,
    /// Argument decoded from the source mimetype.
    pub arg: A,
    pub data: V,
    pub cost: Cost,
}

impl<A, V> ConvertArgs<'_, A, V> {
    /// The URL parsed, or `None` when it is not a valid absolute URL.
    pub fn parsed_url(&self) -> Option<url::Url> {
        url::Url::parse(self.url).ok()
    }
}

/// What a typed converter callback returns.
#[derive(Debug, Clone)]
pub enum Output<A, V> {
    /// Not applicable to this input.
    None,
    One(A, V),
    Many(Vec<(A, V)>),
}

impl<A, V> Output<A, V> {
    pub fn none() -> Self {
        Self::None
    }

    pub fn typed(arg: A, data: V) -> Self {
        Self::One(arg, data)
    }

    pub fn many(items: impl IntoIterator<Item = (A, V)>) -> Self {
        Self::Many(items.into_iter().collect())
    }

    fn into_vec(self) -> Vec<(A, V)> {
        match self {
            Self::None => Vec::new(),
            Self::One(arg, data) => vec![(arg, data)],
            Self::Many(items) => items,
        }
    }
}

impl<V> Output<(), V> {
    /// Single result for a codec without argument.
    pub fn value(data: V) -> Self {
        Self::One((), data)
    }
}

impl<A, V> From<Option<(A, V)>> for Output<A, V> {
    fn from(item: Option<(A, V)>) -> Self {
        item.map_or(Self::None, |(arg, data)| Self::One(arg, data))
    }
}

/// Converter from the `from` family to the `to` family.
///
/// Stream results are cached with the default [`ErrorPolicy`].
pub fn create_converter<F, T, C>(from: F, to: T, convert: C) -> Converter
where
    F: DataType + Send + Sync + 'static,
    T: DataType + Send + Sync + 'static,
    C: Fn(ConvertArgs<'_, F::Arg, F::Value>) -> Result<Output<T::Arg, T::Value>>
        + Send
        + Sync
        + 'static,
{
    create_converter_with(ErrorPolicy::default(), from, to, convert)
}

/// [`create_converter`] with an explicit error policy for cached results.
///
/// A payload under a `from` mimetype that does not have the `from` value type
/// is reported as an error.
pub fn create_converter_with<F, T, C>(policy: ErrorPolicy, from: F, to: T, convert: C) -> Converter
where
    F: DataType + Send + Sync + 'static,
    T: DataType + Send + Sync + 'static,
    C: Fn(ConvertArgs<'_, F::Arg, F::Value>) -> Result<Output<T::Arg, T::Value>>
        + Send
        + Sync
        + 'static,
{
    Converter::new(move |input| {
        let Some(arg) = from.parse_mime_type(input.mime_type) else {
            return Ok(Vec::new());
        };
        let Some(data) = input.data.get::<F::Value>() else {
            bail!(
                "`{}` holds {}, expected {}",
                input.mime_type,
                input.data.type_name(),
                std::any::type_name::<F::Value>()
            );
        };

        let output = convert(ConvertArgs {
            url: input.url,
            arg,
            data,
            cost: input.cost,
        })?;

        let cost = input.cost.saturating_add(1);
        Ok(output
            .into_vec()
            .into_iter()
            .map(|(arg, value)| Conversion {
                mime_type: to.create_mime_type(&arg),
                cost,
                data: value.into_data_with(policy),
            })
            .collect())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        convert::ConvertInput,
        data::{Data, DataTypeNoArgs, DataTypeStringArg},
        stream::{StreamStatus, ValueStream},
        error::StreamError,
    };
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    static NOTE: DataTypeNoArgs<String> = DataTypeNoArgs::new("application/x.note");
    static TEXT: DataTypeStringArg<ValueStream<String>> =
        DataTypeStringArg::new("text/plain", "mimeType");
    static WORDS: DataTypeNoArgs<ValueStream<usize>> = DataTypeNoArgs::new("application/x.words");

    fn run(converter: &Converter, mime_type: &str, cost: Cost, data: Data) -> Result<Vec<Conversion>> {
        converter.convert(&ConvertInput {
            url: "mem://note",
            mime_type,
            cost,
            data: &data,
        })
    }

    #[test]
    fn test_foreign_mimetype_is_skipped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let converter = create_converter(&NOTE, &TEXT, move |args| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Output::typed("text/markdown".into(), ValueStream::just(args.data)))
        });

        let results = run(&converter, "text/csv", 0, Data::new("x".to_string())).unwrap();
        assert!(results.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_result_is_encoded_at_next_cost() {
        let converter = create_converter(&NOTE, &TEXT, |args| {
            assert_eq!(args.url, "mem://note");
            Ok(Output::typed("text/markdown".into(), ValueStream::just(args.data)))
        });

        let results = run(&converter, "application/x.note", 4, Data::new("# hi".to_string())).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].mime_type, "text/plain; mimeType=text/markdown");
        assert_eq!(results[0].cost, 5);

        let stream = results[0].data.get::<ValueStream<String>>().unwrap();
        assert!(stream.is_cached());
        assert_eq!(stream.current(), Some(Ok("# hi".to_string())));
    }

    #[test]
    fn test_output_shapes() {
        let converter = create_converter(&TEXT, &NOTE, |args| {
            Ok(match args.arg.as_str() {
                "none" => Output::none(),
                "one" => Output::value("1".to_string()),
                _ => Output::many([((), "a".to_string()), ((), "b".to_string())]),
            })
        });
        let text = || Data::new(ValueStream::just(String::new()));

        assert!(run(&converter, "text/plain; mimeType=none", 0, text()).unwrap().is_empty());
        assert_eq!(run(&converter, "text/plain; mimeType=one", 0, text()).unwrap().len(), 1);
        let many = run(&converter, "text/plain; mimeType=many", 0, text()).unwrap();
        assert_eq!(many.len(), 2);
        assert!(many.iter().all(|c| c.mime_type == "application/x.note"));
    }

    #[test]
    fn test_stream_result_runs_once_across_readers() {
        let parses = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&parses);
        let converter = create_converter(&TEXT, &WORDS, move |args| {
            let counter = Arc::clone(&counter);
            Ok(Output::value(args.data.map(move |text| {
                counter.fetch_add(1, Ordering::SeqCst);
                text.split_whitespace().count()
            })))
        });

        let source = Data::new(ValueStream::just("one two three".to_string()));
        let results = run(&converter, "text/plain; mimeType=text/x-words", 0, source).unwrap();
        let words = results[0].data.get::<ValueStream<usize>>().unwrap();

        assert_eq!(words.current(), Some(Ok(3)));
        assert_eq!(words.current(), Some(Ok(3)));
        assert_eq!(parses.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_retry_policy_is_applied_to_results() {
        let converter = create_converter_with(ErrorPolicy::Retry, &NOTE, &WORDS, |_| {
            Ok(Output::value(ValueStream::failed(StreamError::msg("offline"))))
        });
        let results = run(&converter, "application/x.note", 0, Data::new(String::new())).unwrap();
        let words = results[0].data.get::<ValueStream<usize>>().unwrap();

        assert!(words.current().is_some_and(|r| r.is_err()));
        // The failure is visible until the next observer restarts the run
        assert!(matches!(words.status(), Some(StreamStatus::Failed(_))));
        assert!(words.current().is_some_and(|r| r.is_err()));
    }

    #[test]
    fn test_payload_type_mismatch_is_an_error() {
        let converter = create_converter(&NOTE, &TEXT, |_| Ok(Output::none()));
        let err = run(&converter, "application/x.note", 0, Data::new(7u32)).unwrap_err();
        assert!(err.to_string().contains("u32"));
    }

    #[test]
    fn test_callback_error_propagates() {
        let converter = create_converter(&NOTE, &TEXT, |args| {
            bail!("unsupported note `{}`", args.data)
        });
        let err = run(&converter, "application/x.note", 0, Data::new("x".to_string())).unwrap_err();
        assert_eq!(err.to_string(), "unsupported note `x`");
    }

    #[test]
    fn test_parsed_url() {
        let args = ConvertArgs { url: "file:///tmp/a.csv", arg: (), data: (), cost: 0 };
        assert_eq!(args.parsed_url().map(|u| u.scheme().to_string()).as_deref(), Some("file"));
        let args = ConvertArgs { url: "not a url", arg: (), data: (), cost: 0 };
        assert!(args.parsed_url().is_none());
    }
}
