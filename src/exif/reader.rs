use serde::Serialize;

use super::ifd::{ENTRY_LEN, TagFormat};
use super::text::TextEncoding;
use super::tiff::{ByteOrder, parse_header};
use super::{TAG_IMAGE_DESCRIPTION, TAG_XP_KEYWORDS, TAG_XP_TITLE};
use crate::error::{FormatError, Result};
use crate::jpeg::JpegScan;

/// Text tags found in a JPEG's EXIF IFD0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmbeddedText {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
}

/// Read ImageDescription, XPTitle and XPKeywords back out of a JPEG.
///
/// Returns `Ok(None)` when the image has no EXIF APP1 segment.
pub fn read_text_tags(jpeg: &[u8]) -> Result<Option<EmbeddedText>> {
    let scan = JpegScan::parse(jpeg, false)?;
    match scan.exif_payload() {
        Some(payload) => read_payload_text(payload).map(Some),
        None => {
            log::debug!("No EXIF APP1 segment found");
            Ok(None)
        }
    }
}

/// Decode the text tags from a raw TIFF payload (the bytes after `Exif\0\0`).
pub fn read_payload_text(payload: &[u8]) -> Result<EmbeddedText> {
    let (order, ifd0) = parse_header(payload)?;
    let count = order
        .read_u16(payload, ifd0)
        .ok_or(FormatError::InvalidTiff("IFD0 offset out of bounds"))? as usize;
    let start = ifd0 + 2;
    if start + count * ENTRY_LEN + 4 > payload.len() {
        return Err(FormatError::InvalidTiff("IFD0 entries extend beyond TIFF data").into());
    }

    let mut text = EmbeddedText::default();
    for i in 0..count {
        let entry = start + i * ENTRY_LEN;
        let tag = order.read_u16(payload, entry).unwrap_or_default();
        let encoding = match tag {
            TAG_IMAGE_DESCRIPTION => TextEncoding::Ascii,
            TAG_XP_TITLE | TAG_XP_KEYWORDS => TextEncoding::Ucs2Le,
            _ => continue,
        };
        let Some(bytes) = entry_value(payload, entry, order)? else {
            log::debug!("Skipping tag 0x{tag:04X} with unexpected type");
            continue;
        };
        let value = Some(encoding.decode(bytes));
        match tag {
            TAG_IMAGE_DESCRIPTION => text.description = value,
            TAG_XP_TITLE => text.title = value,
            _ => text.keywords = value,
        }
    }
    Ok(text)
}

/// Value bytes of a BYTE/ASCII/UNDEFINED entry, inline or out-of-line.
fn entry_value(payload: &[u8], entry: usize, order: ByteOrder) -> Result<Option<&[u8]>> {
    let format = order.read_u16(payload, entry + 2).and_then(TagFormat::from_code);
    if format.map(TagFormat::unit_size) != Some(1) {
        return Ok(None);
    }
    let count = order.read_u32(payload, entry + 4).unwrap_or_default() as usize;
    let (offset, len) = if count <= 4 {
        (entry + 8, count)
    } else {
        let offset = order.read_u32(payload, entry + 8).unwrap_or_default() as usize;
        (offset, count)
    };
    payload
        .get(offset..offset.saturating_add(len))
        .map(Some)
        .ok_or_else(|| FormatError::InvalidTiff("tag value out of bounds").into())
}
