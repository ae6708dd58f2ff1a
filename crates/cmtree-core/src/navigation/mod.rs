//! Navigation state machine
//!
//! Turns command lines into tree operations: [`command`] tokenizes and
//! classifies, [`session`] dispatches against the store, the rulebook and
//! the template expander.

pub mod command;
pub mod context;
pub mod script;
pub mod session;
pub mod template;

pub use command::{quote_token, tokenize, Command, Query};
pub use context::NavigationContext;
pub use script::{parse_script, ScriptInput, BODY_MARKER, HEADER_MARKER};
pub use session::{LineFailure, LineOrigin, RunReport, Session, Step};
pub use template::{NoTemplates, StaticTemplates, TemplateExpander};
