//! Rulebook default-value application
//!
//! When an object is created, the rule table is consulted for the values it
//! should start with. [`resolver::resolve`] picks exactly one rule entry in
//! a fixed priority order; [`apply::apply_defaults`] writes it through the normal
//! tree operations. Nothing here can block a creation: misses and rejected
//! values become diagnostics.

pub mod apply;
pub mod resolver;
pub mod table;

pub use apply::{apply_defaults, RulebookOutcome};
pub use resolver::{resolve, Resolved, ResolutionStep, RuleQuery};
pub use table::{RuleObject, RuleTable, RuleValue, DEFAULT_SELECTOR};
