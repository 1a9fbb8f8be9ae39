//! Matcher Engine
//!
//! Ordered-choice, backtracking recursive descent support for the filter
//! grammar: cursor and checkpoints, terminals, text capture, optional
//! whitespace/comments, a sticky halt flag and a nesting depth guard.

pub mod engine;

pub use engine::{
    is_identifier_continue, is_identifier_start, Checkpoint, FarthestFailure, Halt, Matcher,
};
