pub mod list_value;
pub mod managed_object;
pub mod path;

pub use list_value::{ListKey, ListValue, Record};
pub use managed_object::{ManagedObject, OperationTag};
pub use path::{DistName, PathSegment};
