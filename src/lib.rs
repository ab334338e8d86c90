//! # directkv
//!
//! A type-preserving decorator over a byte-oriented key-value store.
//!
//! Store clients speak in raw bytes; applications speak in native values.
//! This crate sits between the two: strings pass through as UTF-8, everything
//! else is serialized through a version-tagged binary format, and reads
//! reverse the process with a hint-driven fallback chain that always produces
//! *some* value — string, deserialized object, or raw bytes — never an error.
//!
//! ## Quick Start
//!
//! ```
//! use directkv::prelude::*;
//!
//! let client = DirectClient::new(MemoryStore::new());
//!
//! // Any value goes in; the codec picks the byte form.
//! client.set("name", "Alice")?;
//! client.set("age", 30i64)?;
//!
//! // Strings come back as strings, everything else as its original type.
//! assert_eq!(client.get("name", DecodeHint::TextFirst)?, Some(Value::String("Alice".into())));
//! assert_eq!(client.get("age", DecodeHint::BinaryFirst)?, Some(Value::Int(30)));
//! assert_eq!(client.get("missing", DecodeHint::TextFirst)?, None);
//! # Ok::<(), directkv::Error>(())
//! ```
//!
//! ## Layers
//!
//! - [`codec`] - the encode/decode policy and its ambiguity-resolution chain
//! - [`Value`] - the closed sum type of storable values
//! - [`DirectClient`] - the decorator exposing the full operation surface
//! - [`RawStore`] / [`MemoryStore`] - the byte-level store seam and the
//!   in-process implementation
//! - [`Tensor`] - the packed codec for rectangular numeric arrays (explicit
//!   opt-in path)
//!
//! The store behind [`RawStore`] owns all networking, pooling, and retry
//! concerns; this crate performs no I/O of its own and holds no state beyond
//! what its store holds.

#![warn(missing_docs)]

mod client;
pub mod codec;
mod error;
mod store;
mod tensor;
mod value;

pub mod prelude;

// Re-export main entry points
pub use client::DirectClient;
pub use codec::DecodeHint;
pub use error::{Error, Result};
pub use store::{MemoryStore, RawStore, SetOptions};
pub use tensor::{Element, ElementType, Tensor};
pub use value::Value;
