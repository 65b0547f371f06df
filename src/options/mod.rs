//! Grid configuration from query strings.
//!
//! Parses strings like `rows=3&cols=4&gap=12&w=1200&h=900&bg=ivory` into
//! [`GridOptions`], then applies them onto a [`GridSpec`](crate::GridSpec),
//! clamping out-of-range values instead of rejecting them.
//!
//! # Example
//!
//! ```
//! use zengrid::{GridSpec, options};
//!
//! let result = options::parse("rows=3&cols=12&gap=8&w=900&h=600");
//! assert!(result.warnings.is_empty());
//!
//! let (spec, clamped) = result.options.apply(&GridSpec::default());
//! assert_eq!((spec.rows, spec.cols), (3, 10));
//! assert_eq!(clamped.len(), 1);
//! ```

mod color;
mod grid_options;
mod parse;

pub use color::parse_color;
pub use grid_options::{GridOptions, Limits};

use alloc::string::String;
use alloc::vec::Vec;

/// Result of parsing a configuration query string.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed options.
    pub options: GridOptions,
    /// Non-fatal parse warnings.
    pub warnings: Vec<ParseWarning>,
}

/// Non-fatal warning from parsing or applying options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    /// A key appeared more than once (last value wins).
    DuplicateKey { key: String, value: String },
    /// A key was not recognized.
    KeyNotRecognized { key: String, value: String },
    /// A key was recognized but its value could not be parsed.
    ValueInvalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
    /// A value was outside its allowed range and was clamped.
    ValueClamped {
        key: &'static str,
        requested: i64,
        applied: i64,
    },
}

/// Parse a configuration query string (with or without leading `?`).
pub fn parse(query: &str) -> ParseResult {
    let (options, warnings) = parse::parse_query(query);
    ParseResult { options, warnings }
}
