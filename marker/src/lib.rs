//! Output comparison and grading-artifact generation.
//!
//! Everything downstream of running a submission lives here: whitespace
//! normalization of captured output, the unified diff against the
//! reference answer, and the per-student artifact files the human
//! grader reviews.

pub mod artifacts;
pub mod diff;
pub mod error;
pub mod normalizer;
