//! Serialized forms of a change-set
//!
//! - [`xml`]: the canonical document consumed by the transport layer, and
//!   its reader for baselines.
//! - [`script`]: the equivalent command script, replayable through a session.
//! - [`digest`]: SHA-256 identity of a rendered document.

pub mod digest;
pub mod script;
pub mod xml;

pub use digest::document_digest;
pub use script::render_script;
pub use xml::{parse_document, render_changeset, render_document, DocumentHeader};
