//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from
//! infrastructure. They contain no implementation details and use only
//! domain types.
//!
//! # Design Rules
//!
//! - No filesystem or HTTP-client types in any signature
//! - The completion backend is a black box behind [`CompletionPort`]
//! - Document storage is a black box behind [`DocumentStore`]

pub mod completion;
pub mod document_store;

pub use completion::{
    BackendError, CompletionPort, CompletionReply, CompletionRequest, ProviderMessage, TokenUsage,
};
pub use document_store::{DocumentStore, Fingerprint, LoadedDocument, StoreDocument, StoreError};
