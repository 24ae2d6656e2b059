//! Mount spec encoding for the structured message format.
//!
//! A spec travels as one struct:
//!
//! ```text
//! (path: cstring, items: array<struct<key: string, value: cstring>>)
//! ```
//!
//! The decoder is strict about the outer layout and lenient about single
//! entries: an entry that cannot be read is skipped and the rest of the
//! array is still consumed, so peers that add fields to an entry or send a
//! damaged entry do not lose the whole spec.

use tracing::{error, trace, warn};

use crate::error::SpecError;
use crate::protocol::message::{ArgType, MessageIter, MessageWriter};
use crate::spec::MountSpec;
use crate::store::{until_nul, KeyValueItem, KeyValueStore};

impl MountSpec {
    /// Appends the spec to `dest`, announcing `path` instead of the mount
    /// prefix when given. Like every other string in a spec, `path` ends at
    /// its first NUL byte.
    ///
    /// Appending to an in-memory message only fails when the message can no
    /// longer grow; the process is aborted in that case.
    pub fn to_wire(&self, dest: &mut MessageWriter, path: Option<&str>) {
        let path = path.map_or(self.mount_prefix(), until_nul);
        if let Err(e) = self.write_wire(dest, path) {
            error!("Unable to append mount spec to message: {:?}", e);
            std::process::abort();
        }
    }

    fn write_wire(&self, dest: &mut MessageWriter, path: &str) -> std::io::Result<()> {
        dest.append_struct(|fields| {
            fields.append_cstring(path)?;
            fields.append_array(ArgType::Struct, |entries| {
                for item in self.iter() {
                    entries.append_struct(|entry| {
                        entry.append_string(&item.key)?;
                        entry.append_cstring(&item.value)
                    })?;
                }
                Ok(())
            })
        })
    }

    /// Reads a spec from the current element of `src` and moves past it.
    ///
    /// `src` is left where it was when the element is not a mount spec.
    pub fn from_wire(src: &mut MessageIter<'_>) -> Result<MountSpec, SpecError> {
        if src.arg_type() != ArgType::Struct {
            return Err(SpecError::MalformedMessage("expected a mount spec struct"));
        }
        let mut fields = src.recurse()?;

        let mount_prefix = fields
            .read_cstring()
            .map_err(|_| SpecError::MalformedMessage("expected a mount path"))?;

        if fields.arg_type() != ArgType::Array || fields.element_type() != ArgType::Struct {
            return Err(SpecError::MalformedMessage("expected an array of mount spec items"));
        }

        let mut entries = fields.recurse()?;
        let mut items = Vec::new();
        while entries.arg_type() == ArgType::Struct {
            match read_item(&entries) {
                Ok(item) => items.push(item),
                Err(e) => warn!("Skipping malformed mount spec item: {}", e),
            }
            entries.advance();
        }
        trace!("decoded {} mount spec items", items.len());

        src.advance();
        Ok(MountSpec::from_data(KeyValueStore::from_iter(items), Some(mount_prefix)))
    }
}

fn read_item(entries: &MessageIter<'_>) -> std::io::Result<KeyValueItem> {
    let mut entry = entries.recurse()?;
    let key = entry.read_string()?;
    let value = entry.read_cstring()?;
    Ok(KeyValueItem::new(key, value))
}
