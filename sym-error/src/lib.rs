//! Contains the common [`ErrorKind`] trait used by all errors to display user-facing error
//! messages.
//!
//! Errors produced by the analyzer crates have no source file to point into. Instead, an
//! [`Error`] carries the rendered text of the expression(s) it is about, and its spans index into
//! that text, so [`ariadne`] can still underline the offending operands.

// lets `#[derive(ErrorKind)]` refer to `sym_error::EXPR` from this crate's own tests
#[cfg(test)]
extern crate self as sym_error;

use ariadne::{Color, Report, Source};
use std::{any::Any, fmt::{self, Debug, Display}, ops::Range};

/// The color to use to highlight expressions.
pub const EXPR: Color = Color::RGB(52, 235, 152);

/// Represents any kind of error that can occur during some operation.
pub trait ErrorKind: Debug + Send + Sync {
    /// Returns `self` as [`Any`], so callers can inspect the concrete error kind.
    fn as_any(&self) -> &dyn Any;

    /// The one-line message describing the error.
    fn message(&self) -> String;

    /// The label texts, one per span of the error.
    fn labels(&self) -> Vec<String>;

    /// Optional help text describing how to fix the error.
    fn help(&self) -> Option<String>;

    /// Builds the report for this error.
    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<(&'a str, Range<usize>)>;
}

/// An error associated with regions of a rendered expression that can be highlighted.
#[derive(Debug)]
pub struct Error {
    /// The rendered expression text that [`Error::spans`] point into. May be empty.
    pub src: String,

    /// The regions of [`Error::src`] that this error originated from.
    pub spans: Vec<Range<usize>>,

    /// The kind of error that occurred.
    pub kind: Box<dyn ErrorKind>,
}

impl Error {
    /// Creates a new error with no source text.
    pub fn new(kind: impl ErrorKind + 'static) -> Self {
        Self { src: String::new(), spans: Vec::new(), kind: Box::new(kind) }
    }

    /// Creates a new error pointing into the given source text.
    pub fn with_source(
        src: impl Into<String>,
        spans: Vec<Range<usize>>,
        kind: impl ErrorKind + 'static,
    ) -> Self {
        Self { src: src.into(), spans, kind: Box::new(kind) }
    }

    /// Returns true if the error is of the given kind.
    pub fn is<T: ErrorKind + 'static>(&self) -> bool {
        self.kind.as_any().is::<T>()
    }

    /// Returns the error kind if it is of the given type.
    pub fn downcast_ref<T: ErrorKind + 'static>(&self) -> Option<&T> {
        self.kind.as_any().downcast_ref::<T>()
    }

    /// Build a report from this error kind.
    pub fn build_report<'a>(&self, src_id: &'a str) -> Report<(&'a str, Range<usize>)> {
        self.kind.build_report(src_id, &self.spans)
    }

    /// Writes the report for this error, rendered against its own source text.
    pub fn write_report<W: std::io::Write>(&self, src_id: &str, w: W) -> std::io::Result<()> {
        self.build_report(src_id).write((src_id, Source::from(&self.src)), w)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.message())?;
        if !self.src.is_empty() {
            write!(f, " (in `{}`)", self.src)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}
