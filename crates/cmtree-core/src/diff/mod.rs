//! Change-set computation
//!
//! Turns a live tree, optionally against a reference tree, into an ordered
//! [`Changeset`] of full object states tagged create, update or delete.
//!
//! ## Modes
//!
//! - **Snapshot**: everything is a create, tombstones are deletes.
//! - **Coarse**: only objects new relative to the reference, plus tombstones.
//!   In-place edits are not detected.
//! - **Fine**: coarse plus field-by-field comparison of objects present on
//!   both sides; any difference yields an update carrying the final state.

pub mod engine;
pub mod human_summary;
pub mod model;

pub use engine::{coarse_diff, compute_changeset, fine_diff, objects_differ, snapshot};
pub use human_summary::render_summary;
pub use model::{ChangeEntry, Changeset, DiffMode};
