//! JSON-file implementation of the modelmux document store.

#![deny(unused_crate_dependencies)]

mod json_store;

pub use json_store::JsonDocumentStore;
