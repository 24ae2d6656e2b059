//! Structured message format used to pass values between processes.
//!
//! A message is a sequence of self-describing elements. Each element starts
//! with a one-byte type code, followed by its payload:
//!
//! ```text
//! string   's' len:u32 bytes[len]
//! cstring  'z' bytes 0x00
//! struct   'r' len:u32 fields[len bytes]
//! array    'a' element_type:u8 len:u32 elements[len bytes]
//! ```
//!
//! Integers are big endian, as in XDR, and no alignment padding is used.
//! Standard strings carry an explicit length while C-strings are only NUL
//! terminated; neither may contain a NUL byte. Containers carry the byte
//! length of their body, so a reader can skip an element without parsing
//! it and never reads past the end of the enclosing container.
//!
//! [`MessageWriter`] builds messages, [`MessageIter`] walks them the way a
//! D-Bus message iterator does: inspect the current element with
//! [`MessageIter::arg_type`], read it or [`MessageIter::recurse`] into it,
//! then [`MessageIter::advance`].

use std::io::Write;
use std::ops::Range;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive, ToPrimitive};

mod utils;

use utils::{invalid_data, write_len, NUL};

/// Messages use big endian encoding.
pub type MessageEndian = BigEndian;

/// Type code of a message element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u8)]
pub enum ArgType {
    /// End of container, or an element that cannot be read
    Invalid = 0,
    /// Length-prefixed UTF-8 string
    String = b's',
    /// NUL-terminated UTF-8 string
    CString = b'z',
    /// Fixed sequence of fields
    Struct = b'r',
    /// Sequence of elements of one type
    Array = b'a',
}

impl ArgType {
    fn code(self) -> u8 {
        self.to_u8().unwrap_or(0)
    }

    fn from_code(code: u8) -> Option<ArgType> {
        ArgType::from_u8(code).filter(|arg_type| *arg_type != ArgType::Invalid)
    }
}

/// Builder for an outgoing message.
#[derive(Debug, Default, Clone)]
pub struct MessageWriter {
    buf: Vec<u8>,
}

impl MessageWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a length-prefixed string.
    pub fn append_string(&mut self, value: &str) -> std::io::Result<()> {
        check_no_nul(value)?;
        self.buf.write_u8(ArgType::String.code())?;
        write_len(value.len(), &mut self.buf)?;
        self.buf.write_all(value.as_bytes())
    }

    /// Appends a NUL-terminated string.
    pub fn append_cstring(&mut self, value: &str) -> std::io::Result<()> {
        check_no_nul(value)?;
        self.buf.write_u8(ArgType::CString.code())?;
        self.buf.write_all(value.as_bytes())?;
        self.buf.write_u8(NUL)
    }

    /// Appends a struct whose fields are written by `fields`.
    pub fn append_struct<F>(&mut self, fields: F) -> std::io::Result<()>
    where
        F: FnOnce(&mut MessageWriter) -> std::io::Result<()>,
    {
        let mut body = MessageWriter::new();
        fields(&mut body)?;

        self.buf.write_u8(ArgType::Struct.code())?;
        write_len(body.buf.len(), &mut self.buf)?;
        self.buf.write_all(&body.buf)
    }

    /// Appends an array whose elements, all of type `element`, are written by
    /// `elements`.
    pub fn append_array<F>(&mut self, element: ArgType, elements: F) -> std::io::Result<()>
    where
        F: FnOnce(&mut MessageWriter) -> std::io::Result<()>,
    {
        if element == ArgType::Invalid {
            return Err(invalid_data("invalid array element type"));
        }
        let mut body = MessageWriter::new();
        elements(&mut body)?;

        let mut check = MessageIter::new(&body.buf);
        while check.position() < body.buf.len() {
            if check.arg_type() != element {
                return Err(invalid_data("array element of unexpected type"));
            }
            check.advance();
        }

        self.buf.write_u8(ArgType::Array.code())?;
        self.buf.write_u8(element.code())?;
        write_len(body.buf.len(), &mut self.buf)?;
        self.buf.write_all(&body.buf)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Iterator positioned on the first element written.
    pub fn iter(&self) -> MessageIter<'_> {
        MessageIter::new(&self.buf)
    }
}

/// Location and shape of the element under the iterator.
struct Element {
    arg_type: ArgType,
    element_type: ArgType,
    body: Range<usize>,
    end: usize,
}

/// Read cursor over the elements of one container.
#[derive(Copy, Clone, Debug)]
pub struct MessageIter<'a> {
    data: &'a [u8],
    pos: usize,
    /// Declared element type when iterating an array body
    expect: Option<ArgType>,
}

impl<'a> MessageIter<'a> {
    /// Iterator over the top-level elements of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0, expect: None }
    }

    /// Type of the current element.
    ///
    /// [`ArgType::Invalid`] at the end of the container and for elements
    /// that are truncated, carry an unknown type code or do not match the
    /// element type of the enclosing array.
    pub fn arg_type(&self) -> ArgType {
        match self.element() {
            Ok(element) => element.arg_type,
            Err(_) => ArgType::Invalid,
        }
    }

    /// Declared element type of the current element if it is an array.
    pub fn element_type(&self) -> ArgType {
        match self.element() {
            Ok(element) => element.element_type,
            Err(_) => ArgType::Invalid,
        }
    }

    /// Iterator over the body of the current struct or array.
    pub fn recurse(&self) -> std::io::Result<MessageIter<'a>> {
        let element = self.element()?;
        let expect = match element.arg_type {
            ArgType::Struct => None,
            ArgType::Array => Some(element.element_type),
            _ => return Err(invalid_data("element is not a container")),
        };
        Ok(MessageIter { data: &self.data[element.body], pos: 0, expect })
    }

    /// Moves past the current element.
    ///
    /// Returns `true` if another readable element follows. An unreadable
    /// element ends the container.
    pub fn advance(&mut self) -> bool {
        self.pos = match self.element() {
            Ok(element) => element.end,
            Err(_) => self.data.len(),
        };
        self.arg_type() != ArgType::Invalid
    }

    /// Reads the current element as a standard string and moves past it.
    pub fn read_string(&mut self) -> std::io::Result<String> {
        self.read_text(ArgType::String)
    }

    /// Reads the current element as a C-string and moves past it.
    pub fn read_cstring(&mut self) -> std::io::Result<String> {
        self.read_text(ArgType::CString)
    }

    /// Byte offset of the current element within its container.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn read_text(&mut self, arg_type: ArgType) -> std::io::Result<String> {
        let element = self.element()?;
        if element.arg_type != arg_type {
            return Err(invalid_data("unexpected element type"));
        }
        let text = std::str::from_utf8(&self.data[element.body])
            .map_err(|_| invalid_data("string is not valid UTF-8"))?
            .to_string();
        self.pos = element.end;
        Ok(text)
    }

    fn element(&self) -> std::io::Result<Element> {
        let start = self.pos;
        let mut src = self
            .data
            .get(start..)
            .filter(|rest| !rest.is_empty())
            .ok_or_else(|| invalid_data("end of container"))?;

        let arg_type = ArgType::from_code(src.read_u8()?)
            .ok_or_else(|| invalid_data("unknown type code"))?;
        if self.expect.is_some_and(|expect| expect != arg_type) {
            return Err(invalid_data("array element of unexpected type"));
        }

        let mut header_len = 1;
        let mut element_type = ArgType::Invalid;
        match arg_type {
            ArgType::CString => {
                let len = src
                    .iter()
                    .position(|byte| *byte == NUL)
                    .ok_or_else(|| invalid_data("unterminated C-string"))?;
                let body = start + header_len..start + header_len + len;
                let end = body.end + 1;
                return Ok(Element { arg_type, element_type, body, end });
            }
            ArgType::Array => {
                element_type = ArgType::from_code(src.read_u8()?)
                    .ok_or_else(|| invalid_data("unknown array element type"))?;
                header_len += 1;
            }
            _ => {}
        }

        let len = src.read_u32::<MessageEndian>()?.to_usize().unwrap_or(usize::MAX);
        header_len += 4;
        if len > src.len() {
            return Err(invalid_data("element overruns its container"));
        }
        let body = start + header_len..start + header_len + len;
        let end = body.end;
        Ok(Element { arg_type, element_type, body, end })
    }
}

fn check_no_nul(value: &str) -> std::io::Result<()> {
    if value.as_bytes().contains(&NUL) {
        return Err(invalid_data("string contains a NUL byte"));
    }
    Ok(())
}
