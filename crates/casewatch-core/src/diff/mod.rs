//! Change detection.
//!
//! ## Entry point
//!
//! ```ignore
//! use casewatch_core::diff::ChangeDetector;
//!
//! let events = ChangeDetector::default().detect(&record_id, previous.as_ref(), &snapshot);
//! ```
//!
//! ## Guarantees
//!
//! - **Determinism**: identical inputs produce identical event sequences.
//! - **Cosmetic noise suppression**: section text is compared as visible lines,
//!   so markup-only edits never produce added/removed lines.
//! - **Local failure**: a section that cannot be compared degrades to one
//!   event; the rest of the record is still compared.

pub mod engine;
pub mod normalize;
pub mod text;

pub use engine::ChangeDetector;
pub use text::{compare_section, diff_lines, diff_text, render_line};
