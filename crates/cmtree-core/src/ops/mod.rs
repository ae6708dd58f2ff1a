pub mod object_ops;
pub mod store;

pub use store::ConfigTree;
