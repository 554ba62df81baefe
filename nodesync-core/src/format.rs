//! Formatter trait definition
//!
//! Backward conversion produces token text separated by single spaces, which is valid
//! but rarely pretty. A [`Formatter`] takes that raw text and returns the text handed
//! to the user. Formatting is optional and never changes the token sequence.

use crate::error::FormatError;

/// Post-processing step applied to emitted text
///
/// # Examples
///
/// ```ignore
/// struct Upper;
///
/// impl Formatter for Upper {
///     fn name(&self) -> &str {
///         "upper"
///     }
///
///     fn format(&self, source: &str) -> Result<String, FormatError> {
///         Ok(source.to_uppercase())
///     }
/// }
/// ```
pub trait Formatter: Send + Sync {
    /// The name this formatter is registered under (e.g., "none", "whitespace")
    fn name(&self) -> &str;

    /// Optional description of this formatter
    fn description(&self) -> &str {
        ""
    }

    /// Format emitted text
    fn format(&self, source: &str) -> Result<String, FormatError>;
}

/// Returns the text unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoneFormatter;

impl Formatter for NoneFormatter {
    fn name(&self) -> &str {
        "none"
    }

    fn description(&self) -> &str {
        "Raw emitted text, one space after every token"
    }

    fn format(&self, source: &str) -> Result<String, FormatError> {
        Ok(source.to_string())
    }
}

/// Collapses whitespace runs, drops the space before `,` and `;`, and trims.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhitespaceFormatter;

impl Formatter for WhitespaceFormatter {
    fn name(&self) -> &str {
        "whitespace"
    }

    fn description(&self) -> &str {
        "Single spaces between tokens, none before separators"
    }

    fn format(&self, source: &str) -> Result<String, FormatError> {
        let collapsed = source.split_whitespace().collect::<Vec<_>>().join(" ");
        Ok(collapsed.replace(" ,", ",").replace(" ;", ";"))
    }
}
