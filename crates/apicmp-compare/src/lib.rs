//! Response comparison for the API comparator
//!
//! - [`validate`] checks one response against its declared expectation.
//! - [`structural`] diffs two JSON bodies, ignoring array order and any
//!   paths named by [`IgnoreRules`].
//! - [`visual`] renders a side-by-side line and character diff of two texts,
//!   built on the alignment primitive in [`matcher`].

mod error;
pub mod matcher;
pub mod path;
pub mod structural;
pub mod validate;
pub mod value;
pub mod visual;

pub use error::{CompareError, CompareResult};
pub use matcher::{OpTag, Opcode, SequenceMatcher};
pub use path::{IgnoreRule, IgnoreRules, JsonPath, PathSegment};
pub use structural::{
    compare_bodies, compare_body_pair, diff, BodyComparison, BodyDifferences, DiffEntry, DiffKind,
    PairwiseDiff, StructuralDiffReport,
};
pub use validate::{evaluate, ValidationOutcome};
pub use visual::{format_body, render, ChangeTag, DiffLine, Span, VisualDiffDocument};
