//! Infrastructure adapters for external collaborators.

pub mod source;

pub use source::{DocumentSource, InMemoryDocumentSource, SourceRecord};
