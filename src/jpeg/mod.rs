//! JPEG marker-level structure: scanning segments and splicing in EXIF.

mod scan;
mod splice;

pub use scan::JpegScan;
pub use splice::{exif_segment, replace_exif};

use std::borrow::Cow;

use crate::error::{Error, MAX_SEGMENT_LENGTH, Result};

/// Marker codes (the byte after `0xFF`).
pub mod marker {
    pub const TEM: u8 = 0x01;
    pub const RST0: u8 = 0xD0;
    pub const RST7: u8 = 0xD7;
    pub const SOI: u8 = 0xD8;
    pub const EOI: u8 = 0xD9;
    pub const SOS: u8 = 0xDA;
    pub const APP0: u8 = 0xE0;
    pub const APP1: u8 = 0xE1;
}

/// Identifier at the start of an EXIF APP1 payload.
pub const EXIF_ID: &[u8; 6] = b"Exif\0\0";

/// Markers that carry no length field or payload.
pub fn is_standalone(code: u8) -> bool {
    matches!(code, marker::TEM | marker::RST0..=marker::RST7 | marker::SOI | marker::EOI)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    App0,
    /// APP1 whose payload starts with [`EXIF_ID`].
    Exif,
    /// Any other APP1 (XMP, for instance).
    App1,
    Other,
    Standalone,
}

/// One marker segment, kept as its exact bytes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    marker: u8,
    bytes: Cow<'a, [u8]>,
    /// Offset of the payload within `bytes` (marker, fill bytes and length field precede it).
    header_len: usize,
}

impl<'a> Segment<'a> {
    /// Build a payload-bearing segment. Fails if the length field would overflow.
    pub fn new(marker: u8, contents: &[u8]) -> Result<Segment<'static>> {
        let length = 2 + contents.len();
        if length > MAX_SEGMENT_LENGTH {
            return Err(Error::SegmentTooLarge { length });
        }
        let mut bytes = Vec::with_capacity(2 + length);
        bytes.extend_from_slice(&[0xFF, marker]);
        bytes.extend_from_slice(&(length as u16).to_be_bytes());
        bytes.extend_from_slice(contents);
        Ok(Segment {
            marker,
            bytes: Cow::Owned(bytes),
            header_len: 4,
        })
    }

    pub(crate) fn borrowed(marker: u8, bytes: &'a [u8], header_len: usize) -> Self {
        Self {
            marker,
            bytes: Cow::Borrowed(bytes),
            header_len,
        }
    }

    pub fn marker(&self) -> u8 {
        self.marker
    }

    /// Payload after the length field; `None` for standalone markers.
    pub fn contents(&self) -> Option<&[u8]> {
        if is_standalone(self.marker) {
            None
        } else {
            Some(&self.bytes[self.header_len..])
        }
    }

    /// The segment exactly as it is serialized.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn kind(&self) -> SegmentKind {
        match (self.marker, self.contents()) {
            (_, None) => SegmentKind::Standalone,
            (marker::APP0, _) => SegmentKind::App0,
            (marker::APP1, Some(c)) if c.starts_with(EXIF_ID) => SegmentKind::Exif,
            (marker::APP1, _) => SegmentKind::App1,
            _ => SegmentKind::Other,
        }
    }
}
