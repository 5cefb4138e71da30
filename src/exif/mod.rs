//! EXIF payload construction and decoding.
//!
//! - [`TextEncoding`] — ASCII and UCS-2LE value encodings
//! - [`Ifd`] — one Image File Directory, serialized in two passes
//! - [`assemble`] — TIFF header plus a chain of IFDs
//! - [`read_text_tags`] — read the embedded text tags back out of a JPEG

mod ifd;
mod reader;
mod text;
mod tiff;

pub use ifd::{BuiltIfd, Ifd, TagFormat, TagValue};
pub use reader::{EmbeddedText, read_payload_text, read_text_tags};
pub use text::TextEncoding;
pub use tiff::{ByteOrder, TIFF_HEADER_LEN, assemble, parse_header};

use crate::error::Result;
use crate::pipeline::Metadata;

// IFD0 tag ids
pub const TAG_IMAGE_DESCRIPTION: u16 = 0x010E;
pub const TAG_XP_TITLE: u16 = 0x9C9B;
pub const TAG_XP_KEYWORDS: u16 = 0x9C9E;

/// Build the IFD0 carrying description, title and keywords.
pub fn build_ifd0(meta: &Metadata) -> Ifd {
    let mut ifd0 = Ifd::new();
    ifd0.insert(TAG_IMAGE_DESCRIPTION, TagValue::ascii(meta.description.as_deref()));
    ifd0.insert(TAG_XP_TITLE, TagValue::ucs2(meta.title.as_deref()));
    ifd0.insert(TAG_XP_KEYWORDS, TagValue::ucs2(meta.keywords.as_deref()));
    ifd0
}

/// Build the complete TIFF payload for `meta` (no `Exif\0\0` prefix).
pub fn build_payload(meta: &Metadata, order: ByteOrder) -> Result<Vec<u8>> {
    assemble(&[build_ifd0(meta)], order)
}
