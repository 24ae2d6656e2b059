//! Protocol module implements the binary representation of mount specs.
//!
//! This module contains two components:
//!
//! - `message`: Self-describing structured message format with structs,
//!   arrays, length-prefixed strings and NUL-terminated C-strings, written by
//!   `MessageWriter` and read back through `MessageIter`.
//!
//! - `spec_wire`: Encoding of a `MountSpec` as
//!   `(path: cstring, items: array<struct<key: string, value: cstring>>)`.

pub mod message;
mod spec_wire;
