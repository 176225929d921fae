//! Migration signature rendering and parsing.
//!
//! Content created by the importer starts with a short preamble naming the
//! original author and timestamp. Rendering and parsing both derive from a
//! single compiled template, so the two directions stay in sync.

mod codec;
mod error;

pub use codec::{truncate_to_seconds, MigrationSignature, SignatureCodec};
pub use error::SignatureError;
