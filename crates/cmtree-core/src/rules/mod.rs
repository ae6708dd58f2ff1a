pub mod invariants;
pub mod required;
pub mod validation;

pub use required::{find_missing_required, MissingRequired};
pub use validation::validate_tree;
