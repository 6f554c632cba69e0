//! Terminal logging with colored module prefixes.
//!
//! ```ignore
//! log!("registry"; "resolved `{}` into {} mimetypes", url, count);
//! log!("error"; "{:#}", err);
//! ```
//!
//! Single-line messages are cut to the terminal width. Messages logged under
//! the `error` module go to stderr, everything else to stdout.

use colored::{ColoredString, Colorize};
use crossterm::terminal::size;
use std::{
    io::{self, Write},
    sync::OnceLock,
};

/// Columns assumed when the terminal cannot be queried (e.g. piped output).
const FALLBACK_WIDTH: usize = 120;

/// `[`, `]` and the space before the message.
const PREFIX_DECORATION: usize = 3;

/// Columns taken by `"[module] "`.
#[inline]
const fn prefix_width(module_len: usize) -> usize {
    module_len + PREFIX_DECORATION
}

/// Terminal width, queried once per process.
fn terminal_width() -> usize {
    static WIDTH: OnceLock<usize> = OnceLock::new();
    *WIDTH.get_or_init(|| size().map_or(FALLBACK_WIDTH, |(columns, _)| columns as usize))
}

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("view"; "opening `{}` for `{}`", label, url);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Print `message` under a `[module]` prefix.
pub fn log(module: &str, message: &str) {
    let is_error = module.eq_ignore_ascii_case("error");
    let prefix = colorize_prefix(module);
    let message = fit_message(message, module.len(), terminal_width());

    let result = if is_error {
        write_line(&mut io::stderr().lock(), &prefix, message)
    } else {
        write_line(&mut io::stdout().lock(), &prefix, message)
    };
    // Nowhere left to report a broken terminal
    result.ok();
}

fn write_line(out: &mut impl Write, prefix: &ColoredString, message: &str) -> io::Result<()> {
    writeln!(out, "{prefix} {message}")?;
    out.flush()
}

/// Cut a single-line message to what fits next to the prefix.
/// Multi-line messages are kept whole.
fn fit_message(message: &str, module_len: usize, width: usize) -> &str {
    if message.contains('\n') {
        return message;
    }
    truncate_str(message, width.saturating_sub(prefix_width(module_len)))
}

/// Registry activity in blue, views in green, errors in red.
fn colorize_prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "registry" => prefix.bright_blue().bold(),
        "view" => prefix.bright_green().bold(),
        "error" => prefix.bright_red().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Longest prefix of `s` that is at most `max_len` bytes and ends on a char
/// boundary.
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let end = s
        .char_indices()
        .map(|(start, c)| start + c.len_utf8())
        .take_while(|&end| end <= max_len)
        .last()
        .unwrap_or(0);
    &s[..end]
}
