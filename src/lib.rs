//! Mount specifications for virtual file system daemons
//!
//! A mount specification identifies a network or removable file system
//! mount by a set of `key=value` parameters tagged with a mount type, plus
//! the path prefix the mount serves:
//!
//! ```text
//! type=ftp,host=example.com,user=alice,__mount_prefix=/pub
//! ```
//!
//! This library provides the specification value and everything needed to
//! pass it between the processes of a virtual file system: interning of
//! equal specs into one shared instance, routing of paths to mounted specs,
//! and two encodings.
//!
//! ## Main Components
//!
//! - `spec`: The [`MountSpec`] value with its key-sorted parameters, equality,
//!   compatibility hash and prefix matching.
//!
//! - `registry`: Process-wide interning of specs into canonical, reference
//!   counted [`SpecRef`] instances that leave the registry with their last
//!   reference.
//!
//! - `protocol`: The structured binary message format and the mount spec
//!   encoding used over it.
//!
//! - `text`: Percent-escaped text encoding used for persistence and debug
//!   output.
//!
//! - `path_util`: Lexical path canonicalization and prefix matching.
//!
//! - `location`, `mount_table`: Locations inside a mount and the daemon-side
//!   table routing requests to mounts.
//!
//! - `daemon_args`: Command line of a backend daemon.
//!
//! ## Usage
//!
//! Build a [`MountSpec`], intern it with [`MountSpec::into_canonical`], and
//! send it with [`MountSpec::to_wire`] or [`MountSpec::to_text`].

pub mod daemon_args;
pub mod error;
pub mod location;
pub mod mount_table;
pub mod path_util;
pub mod protocol;
pub mod registry;
pub mod spec;
pub mod store;
pub mod text;

pub use error::SpecError;
pub use location::MountLocation;
pub use mount_table::MountTable;
pub use protocol::message;
pub use registry::{SpecRef, SpecRegistry};
pub use spec::MountSpec;
pub use store::{KeyValueItem, KeyValueStore};
