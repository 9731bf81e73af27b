//! rmarsh — a pure-Rust reader for the Ruby Marshal 4.8 binary format.
//!
//! Decodes the tagged, self-referential streaming encoding produced by
//! Ruby's `Marshal.dump` into an in-memory value graph, without running a
//! Ruby interpreter. The write path is intentionally absent.
//!
//! # Architecture
//!
//! - **`cursor`** — Sequential byte reader with offset tracking
//! - **`fixnum`** — The variable-length signed integer codec
//! - **`tag`** — The closed tag-byte set
//! - **`decode`** — Tag dispatcher, symbol/object tables, `Decoder`
//! - **`types`** — The decoded value model (scalars, strings, symbols,
//!   arrays, hashes, generic and custom objects)
//! - **`registry`** — Pluggable decoders for `u`-tagged user-defined classes
//! - **`rmxp`** — RPG Maker XP value types (feature-gated)
//!
//! # Example
//!
//! ```
//! use rmarsh::{decode, Registry};
//!
//! // Marshal.dump([5, 10])
//! let registry = Registry::new();
//! let value = decode(b"\x04\x08[\x07i\x01\x05i\x01\x0a", &registry)?;
//! let array = value.as_array().unwrap().borrow();
//! assert_eq!(array.elements[0].as_int(), Some(5));
//! assert_eq!(array.elements[1].as_int(), Some(10));
//! # Ok::<(), rmarsh::MarshalError>(())
//! ```

pub mod cursor;
pub mod decode;
pub mod error;
pub mod fixnum;
pub mod registry;
pub mod tag;
pub mod types;

#[cfg(feature = "rmxp")]
pub mod rmxp;

pub use decode::{decode, Decoder, DEFAULT_MAX_DEPTH};
pub use error::{MarshalError, TagByte};
pub use registry::Registry;
pub use types::{
    CustomObject, CustomValue, Fields, RubyArray, RubyHash, RubyObject, RubyString, Symbol, Value,
};
