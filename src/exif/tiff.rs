use serde::{Deserialize, Serialize};

use super::ifd::Ifd;
use crate::error::{EncodingError, FormatError, Result};

/// Byte-order mark, magic number and offset of the first IFD.
pub const TIFF_HEADER_LEN: usize = 8;

const TIFF_MAGIC: u16 = 0x002A;

/// Byte order declared in the TIFF header and used for every field after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// `II`
    #[default]
    Little,
    /// `MM`
    Big,
}

impl ByteOrder {
    pub fn mark(self) -> [u8; 2] {
        match self {
            Self::Little => *b"II",
            Self::Big => *b"MM",
        }
    }

    pub fn from_mark(mark: &[u8]) -> Option<Self> {
        match mark {
            b"II" => Some(Self::Little),
            b"MM" => Some(Self::Big),
            _ => None,
        }
    }

    pub fn u16_bytes(self, val: u16) -> [u8; 2] {
        match self {
            Self::Little => val.to_le_bytes(),
            Self::Big => val.to_be_bytes(),
        }
    }

    pub fn u32_bytes(self, val: u32) -> [u8; 4] {
        match self {
            Self::Little => val.to_le_bytes(),
            Self::Big => val.to_be_bytes(),
        }
    }

    pub fn read_u16(self, data: &[u8], offset: usize) -> Option<u16> {
        let b: [u8; 2] = data.get(offset..offset.checked_add(2)?)?.try_into().ok()?;
        Some(match self {
            Self::Little => u16::from_le_bytes(b),
            Self::Big => u16::from_be_bytes(b),
        })
    }

    pub fn read_u32(self, data: &[u8], offset: usize) -> Option<u32> {
        let b: [u8; 4] = data.get(offset..offset.checked_add(4)?)?.try_into().ok()?;
        Some(match self {
            Self::Little => u32::from_le_bytes(b),
            Self::Big => u32::from_be_bytes(b),
        })
    }
}

/// Assemble a TIFF header followed by `ifds`, chained through their
/// next-IFD offsets. The first directory sits directly after the header.
pub fn assemble(ifds: &[Ifd], order: ByteOrder) -> Result<Vec<u8>> {
    if ifds.is_empty() {
        return Err(EncodingError::NoDirectories.into());
    }

    let built = ifds
        .iter()
        .map(|ifd| ifd.build(order))
        .collect::<Result<Vec<_>>>()?;

    let mut starts = Vec::with_capacity(built.len());
    let mut pos = TIFF_HEADER_LEN;
    for ifd in &built {
        starts.push(pos);
        pos = pos.checked_add(ifd.len()).ok_or(EncodingError::OffsetOverflow)?;
    }
    let to_u32 = |v: usize| u32::try_from(v).map_err(|_| EncodingError::OffsetOverflow);

    let mut payload = Vec::with_capacity(pos);
    payload.extend_from_slice(&order.mark());
    payload.extend_from_slice(&order.u16_bytes(TIFF_MAGIC));
    payload.extend_from_slice(&order.u32_bytes(to_u32(starts[0])?));

    for (i, ifd) in built.into_iter().enumerate() {
        let next = match starts.get(i + 1) {
            Some(&s) => to_u32(s)?,
            None => 0,
        };
        payload.extend(ifd.finish(starts[i], next)?);
    }

    log::debug!("Assembled {}-byte TIFF payload with {} IFD(s)", payload.len(), starts.len());
    Ok(payload)
}

/// Validate a TIFF header, returning its byte order and the first IFD offset.
pub fn parse_header(payload: &[u8]) -> Result<(ByteOrder, usize)> {
    if payload.len() < TIFF_HEADER_LEN {
        return Err(FormatError::InvalidTiff("header too short").into());
    }
    let order =
        ByteOrder::from_mark(&payload[0..2]).ok_or(FormatError::InvalidTiff("bad byte order"))?;
    if order.read_u16(payload, 2) != Some(TIFF_MAGIC) {
        return Err(FormatError::InvalidTiff("bad magic").into());
    }
    let first = order
        .read_u32(payload, 4)
        .ok_or(FormatError::InvalidTiff("header too short"))?;
    Ok((order, first as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::exif::ifd::TagValue;

    #[test]
    fn little_endian_header() {
        let payload = assemble(&[Ifd::new()], ByteOrder::Little).unwrap();
        assert_eq!(&payload[..8], b"II\x2A\x00\x08\x00\x00\x00");
        // Empty IFD0: count, then next-IFD offset of zero.
        assert_eq!(&payload[8..], &[0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn big_endian_header() {
        let payload = assemble(&[Ifd::new()], ByteOrder::Big).unwrap();
        assert_eq!(&payload[..8], b"MM\x00\x2A\x00\x00\x00\x08");
        assert_eq!(parse_header(&payload).unwrap(), (ByteOrder::Big, 8));
    }

    #[test]
    fn directories_are_chained() {
        let mut ifd0 = Ifd::new();
        ifd0.insert(0x010E, TagValue::ascii(Some("a description")));
        let mut ifd1 = Ifd::new();
        ifd1.insert(0x0103, TagValue::new(crate::exif::ifd::TagFormat::Short, vec![6, 0]));

        let payload = assemble(&[ifd0, ifd1], ByteOrder::Little).unwrap();
        let order = ByteOrder::Little;

        let count0 = order.read_u16(&payload, 8).unwrap() as usize;
        let next = order.read_u32(&payload, 8 + 2 + count0 * 12).unwrap() as usize;
        assert_eq!(next % 2, 0);
        assert_eq!(order.read_u16(&payload, next), Some(1));
        assert_eq!(order.read_u16(&payload, next + 2), Some(0x0103));
        // Last directory terminates the chain.
        assert_eq!(order.read_u32(&payload, next + 2 + 12), Some(0));
    }

    #[test]
    fn no_directories_rejected() {
        assert_eq!(
            assemble(&[], ByteOrder::Little),
            Err(Error::Encoding(EncodingError::NoDirectories))
        );
    }

    #[test]
    fn rejects_bad_header() {
        assert!(parse_header(b"XX\x2A\x00\x08\x00\x00\x00").is_err());
        assert!(parse_header(b"II\x2B\x00\x08\x00\x00\x00").is_err());
        assert!(parse_header(b"II").is_err());
    }
}
