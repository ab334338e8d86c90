//! Convenient imports for directkv.
//!
//! Re-exports the types most call sites need:
//!
//! ```
//! use directkv::prelude::*;
//!
//! let client = DirectClient::new(MemoryStore::new());
//! client.set("key", "value").unwrap();
//! ```

// Main entry point
pub use crate::client::DirectClient;

// Error handling
pub use crate::error::{Error, Result};

// Codec types
pub use crate::codec::DecodeHint;
pub use crate::value::Value;

// Store seam
pub use crate::store::{MemoryStore, RawStore, SetOptions};

// Tensor codec
pub use crate::tensor::{ElementType, Tensor};
