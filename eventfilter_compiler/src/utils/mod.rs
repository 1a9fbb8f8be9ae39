//! Shared utilities for the compiler passes
//!
//! Source positions and spans used by the matcher, the error types and the
//! logging system.

pub mod span;

pub use span::{Position, SourceMap, Span};
