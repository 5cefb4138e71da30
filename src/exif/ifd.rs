use std::collections::BTreeMap;

use super::text::TextEncoding;
use super::tiff::ByteOrder;
use crate::error::{EncodingError, Result};

/// Size of one directory entry: tag, type, count, value/offset.
pub const ENTRY_LEN: usize = 12;

/// TIFF field types this writer knows how to size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagFormat {
    Byte,
    Ascii,
    Short,
    Long,
    Rational,
    Undefined,
}

impl TagFormat {
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::Byte),
            2 => Some(Self::Ascii),
            3 => Some(Self::Short),
            4 => Some(Self::Long),
            5 => Some(Self::Rational),
            7 => Some(Self::Undefined),
            _ => None,
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Self::Byte => 1,
            Self::Ascii => 2,
            Self::Short => 3,
            Self::Long => 4,
            Self::Rational => 5,
            Self::Undefined => 7,
        }
    }

    /// Bytes per component.
    pub fn unit_size(self) -> usize {
        match self {
            Self::Byte | Self::Ascii | Self::Undefined => 1,
            Self::Short => 2,
            Self::Long => 4,
            Self::Rational => 8,
        }
    }
}

/// A tag's declared type code and its encoded value bytes.
///
/// Multi-byte components must already be in the byte order of the payload
/// the value is written into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagValue {
    pub format: u16,
    pub bytes: Vec<u8>,
}

impl TagValue {
    pub fn new(format: TagFormat, bytes: Vec<u8>) -> Self {
        Self { format: format.code(), bytes }
    }

    /// A NUL-terminated `ASCII` value.
    pub fn ascii(text: Option<&str>) -> Self {
        Self::new(TagFormat::Ascii, TextEncoding::Ascii.encode(text))
    }

    /// A UCS-2LE string stored as a `BYTE` array (XP* tags).
    pub fn ucs2(text: Option<&str>) -> Self {
        Self::new(TagFormat::Byte, TextEncoding::Ucs2Le.encode(text))
    }
}

/// One Image File Directory, keyed (and therefore ordered) by tag id.
#[derive(Debug, Clone, Default)]
pub struct Ifd {
    entries: BTreeMap<u16, TagValue>,
}

impl Ifd {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a tag, returning the value it replaced.
    pub fn insert(&mut self, tag: u16, value: TagValue) -> Option<TagValue> {
        self.entries.insert(tag, value)
    }

    pub fn get(&self, tag: u16) -> Option<&TagValue> {
        self.entries.get(&tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First pass: lay out the entry table and the out-of-line value region.
    ///
    /// Offsets of out-of-line values stay as placeholders until
    /// [`BuiltIfd::finish`] learns where the directory lands in the payload.
    pub fn build(&self, order: ByteOrder) -> Result<BuiltIfd> {
        let count = u16::try_from(self.entries.len())
            .map_err(|_| EncodingError::TooManyEntries(self.entries.len()))?;

        let mut table = Vec::with_capacity(2 + self.entries.len() * ENTRY_LEN + 4);
        table.extend_from_slice(&order.u16_bytes(count));

        let mut region = Vec::new();
        let mut patches = Vec::new();

        for (&tag, value) in &self.entries {
            let format = TagFormat::from_code(value.format).ok_or(EncodingError::UnknownFormat {
                tag,
                format: value.format,
            })?;
            let unit = format.unit_size();
            if value.bytes.len() % unit != 0 {
                return Err(EncodingError::MisalignedValue {
                    tag,
                    len: value.bytes.len(),
                    unit,
                }
                .into());
            }
            let components =
                u32::try_from(value.bytes.len() / unit).map_err(|_| EncodingError::OffsetOverflow)?;

            table.extend_from_slice(&order.u16_bytes(tag));
            table.extend_from_slice(&order.u16_bytes(format.code()));
            table.extend_from_slice(&order.u32_bytes(components));

            if value.bytes.len() <= 4 {
                let mut inline = [0u8; 4];
                inline[..value.bytes.len()].copy_from_slice(&value.bytes);
                table.extend_from_slice(&inline);
            } else {
                patches.push(Patch {
                    slot: table.len(),
                    relative: region.len(),
                });
                table.extend_from_slice(&[0u8; 4]);
                region.extend_from_slice(&value.bytes);
                // Keep the next value on a word boundary.
                if region.len() % 2 != 0 {
                    region.push(0);
                }
            }
        }

        // Next-IFD offset, filled in by `finish`.
        table.extend_from_slice(&[0u8; 4]);

        Ok(BuiltIfd {
            table,
            region,
            patches,
            order,
        })
    }
}

/// Position of an unresolved value offset within the entry table.
#[derive(Debug, Clone, Copy)]
struct Patch {
    slot: usize,
    relative: usize,
}

/// A directory whose layout is fixed but whose absolute offsets are not yet known.
#[derive(Debug, Clone)]
pub struct BuiltIfd {
    table: Vec<u8>,
    region: Vec<u8>,
    patches: Vec<Patch>,
    order: ByteOrder,
}

impl BuiltIfd {
    /// Serialized size of the entry table plus value region.
    pub fn len(&self) -> usize {
        self.table.len() + self.region.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Second pass: resolve offsets given this directory's position (`base`,
    /// relative to the TIFF header) and the offset of the next directory
    /// (`0` for the last one).
    pub fn finish(mut self, base: usize, next: u32) -> Result<Vec<u8>> {
        let region_base = base
            .checked_add(self.table.len())
            .ok_or(EncodingError::OffsetOverflow)?;

        for patch in &self.patches {
            let offset = region_base
                .checked_add(patch.relative)
                .and_then(|o| u32::try_from(o).ok())
                .ok_or(EncodingError::OffsetOverflow)?;
            self.table[patch.slot..patch.slot + 4].copy_from_slice(&self.order.u32_bytes(offset));
        }

        let next_slot = self.table.len() - 4;
        self.table[next_slot..].copy_from_slice(&self.order.u32_bytes(next));

        self.table.extend_from_slice(&self.region);
        Ok(self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn entry(bytes: &[u8], index: usize) -> &[u8] {
        &bytes[2 + index * ENTRY_LEN..2 + (index + 1) * ENTRY_LEN]
    }

    #[test]
    fn entries_sorted_by_tag() {
        let mut ifd = Ifd::new();
        ifd.insert(0x9C9E, TagValue::ucs2(Some("k")));
        ifd.insert(0x010E, TagValue::ascii(Some("d")));
        ifd.insert(0x9C9B, TagValue::ucs2(Some("t")));

        let bytes = ifd.build(ByteOrder::Little).unwrap().finish(8, 0).unwrap();
        assert_eq!(&bytes[..2], &[3, 0]);
        let tags: Vec<u16> = (0..3)
            .map(|i| u16::from_le_bytes([entry(&bytes, i)[0], entry(&bytes, i)[1]]))
            .collect();
        assert_eq!(tags, [0x010E, 0x9C9B, 0x9C9E]);
    }

    #[test]
    fn short_values_are_inline_and_padded() {
        let mut ifd = Ifd::new();
        ifd.insert(0x010E, TagValue::ascii(Some("D")));

        let bytes = ifd.build(ByteOrder::Little).unwrap().finish(8, 0).unwrap();
        assert_eq!(bytes.len(), 2 + ENTRY_LEN + 4);
        assert_eq!(
            entry(&bytes, 0),
            [0x0E, 0x01, 2, 0, 2, 0, 0, 0, b'D', 0, 0, 0]
        );
    }

    #[test]
    fn long_values_are_patched_to_absolute_offsets() {
        let mut ifd = Ifd::new();
        ifd.insert(0x010E, TagValue::ascii(Some("hello")));
        ifd.insert(0x9C9B, TagValue::ucs2(Some("abc")));

        let built = ifd.build(ByteOrder::Little).unwrap();
        let bytes = built.finish(8, 0).unwrap();

        let table_len = 2 + 2 * ENTRY_LEN + 4;
        let first = u32::from_le_bytes(entry(&bytes, 0)[8..12].try_into().unwrap()) as usize;
        assert_eq!(first, 8 + table_len);
        // "hello\0" is 6 bytes, already even.
        let second = u32::from_le_bytes(entry(&bytes, 1)[8..12].try_into().unwrap()) as usize;
        assert_eq!(second, first + 6);
        assert_eq!(&bytes[first - 8..first - 8 + 6], b"hello\0");
        assert_eq!(&bytes[second - 8..second - 8 + 8], &[b'a', 0, b'b', 0, b'c', 0, 0, 0]);
    }

    #[test]
    fn odd_values_are_word_aligned() {
        let mut ifd = Ifd::new();
        ifd.insert(0x010E, TagValue::ascii(Some("odd!")));
        ifd.insert(0x9C9B, TagValue::ucs2(Some("xyz")));

        let bytes = ifd.build(ByteOrder::Big).unwrap().finish(8, 0).unwrap();
        let first = u32::from_be_bytes(entry(&bytes, 0)[8..12].try_into().unwrap());
        let second = u32::from_be_bytes(entry(&bytes, 1)[8..12].try_into().unwrap());
        assert_eq!(second - first, 6);
        assert_eq!(second % 2, 0);
    }

    #[test]
    fn next_offset_written() {
        let ifd = Ifd::new();
        let bytes = ifd.build(ByteOrder::Big).unwrap().finish(8, 0x1234).unwrap();
        assert_eq!(bytes, [0, 0, 0, 0, 0x12, 0x34]);
    }

    #[test]
    fn unknown_format_rejected() {
        let mut ifd = Ifd::new();
        ifd.insert(0x010E, TagValue { format: 42, bytes: vec![1, 2] });

        let err = ifd.build(ByteOrder::Little).unwrap_err();
        assert_eq!(
            err,
            Error::Encoding(EncodingError::UnknownFormat { tag: 0x010E, format: 42 })
        );
    }

    #[test]
    fn partial_components_rejected() {
        let mut ifd = Ifd::new();
        ifd.insert(0x0100, TagValue::new(TagFormat::Long, vec![1, 2, 3]));

        assert!(matches!(
            ifd.build(ByteOrder::Little),
            Err(Error::Encoding(EncodingError::MisalignedValue { tag: 0x0100, len: 3, unit: 4 }))
        ));
    }

    #[test]
    fn count_is_components_not_bytes() {
        let mut ifd = Ifd::new();
        ifd.insert(0x0100, TagValue::new(TagFormat::Short, vec![0, 1, 0, 2]));

        let bytes = ifd.build(ByteOrder::Big).unwrap().finish(8, 0).unwrap();
        assert_eq!(&entry(&bytes, 0)[4..8], &[0, 0, 0, 2]);
        assert_eq!(&entry(&bytes, 0)[8..12], &[0, 1, 0, 2]);
    }
}
