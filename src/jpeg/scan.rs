use super::{EXIF_ID, Segment, SegmentKind, is_standalone, marker};
use crate::error::{FormatError, Result};

/// A JPEG split into the marker segments that precede the scan data.
///
/// Everything from the SOS marker on (scan header, entropy-coded data, EOI
/// and any trailing bytes) is kept verbatim as the `tail`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegScan<'a> {
    segments: Vec<Segment<'a>>,
    tail: &'a [u8],
}

impl<'a> JpegScan<'a> {
    /// Walk the marker sequence of `data`.
    ///
    /// With `strict`, a stream that ends before any scan data or EOI marker is
    /// rejected instead of being accepted as-is.
    pub fn parse(data: &'a [u8], strict: bool) -> Result<Self> {
        if !data.starts_with(&[0xFF, marker::SOI]) {
            return Err(FormatError::NotJpeg.into());
        }

        let mut segments = Vec::new();
        let mut pos = 2;
        let tail = loop {
            if pos == data.len() {
                break &data[pos..];
            }
            if data[pos] != 0xFF {
                return Err(FormatError::MissingMarker { offset: pos }.into());
            }

            // Any number of 0xFF fill bytes may precede the marker code.
            let mut code_pos = pos + 1;
            while data.get(code_pos) == Some(&0xFF) {
                code_pos += 1;
            }
            let Some(&code) = data.get(code_pos) else {
                return Err(FormatError::Truncated { offset: pos }.into());
            };
            let header_end = code_pos + 1;

            match code {
                marker::EOI | marker::SOS => {
                    if code == marker::SOS {
                        segment_end(data, pos, header_end)?;
                    }
                    break &data[pos..];
                }
                0x00 | marker::SOI => {
                    return Err(FormatError::UnexpectedMarker { marker: code, offset: pos }.into());
                }
                c if is_standalone(c) => {
                    segments.push(Segment::borrowed(c, &data[pos..header_end], header_end - pos));
                    pos = header_end;
                }
                c => {
                    let end = segment_end(data, pos, header_end)?;
                    let segment = Segment::borrowed(c, &data[pos..end], header_end + 2 - pos);
                    log::debug!(
                        "Marker 0xFF{c:02X} at offset {pos}, {} bytes ({:?})",
                        end - pos,
                        segment.kind()
                    );
                    segments.push(segment);
                    pos = end;
                }
            }
        };

        if strict && !tail.windows(2).any(|w| *w == [0xFF, marker::EOI]) {
            return Err(FormatError::MissingEoi.into());
        }

        Ok(Self { segments, tail })
    }

    pub(crate) fn from_parts(segments: Vec<Segment<'a>>, tail: &'a [u8]) -> Self {
        Self { segments, tail }
    }

    /// Segments between SOI and the scan data, in stream order.
    pub fn segments(&self) -> &[Segment<'a>] {
        &self.segments
    }

    pub(crate) fn into_parts(self) -> (Vec<Segment<'a>>, &'a [u8]) {
        (self.segments, self.tail)
    }

    /// Bytes from the SOS (or EOI) marker to the end of the stream.
    pub fn tail(&self) -> &'a [u8] {
        self.tail
    }

    /// Index of the first EXIF APP1 segment.
    pub fn exif_index(&self) -> Option<usize> {
        self.segments.iter().position(|s| s.kind() == SegmentKind::Exif)
    }

    pub fn exif_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| s.kind() == SegmentKind::Exif)
            .count()
    }

    /// The TIFF payload of the first EXIF APP1 segment, without `Exif\0\0`.
    pub fn exif_payload(&self) -> Option<&[u8]> {
        let segment = &self.segments[self.exif_index()?];
        segment.contents().map(|c| &c[EXIF_ID.len()..])
    }

    /// Where a new APP1 segment belongs: after the APP0 segments that
    /// directly follow SOI, so JFIF stays first.
    pub fn insertion_index(&self) -> usize {
        self.segments
            .iter()
            .take_while(|s| s.kind() == SegmentKind::App0)
            .count()
    }

    /// Serialize back to a byte stream.
    pub fn to_bytes(&self) -> Vec<u8> {
        let len = 2
            + self.segments.iter().map(|s| s.as_bytes().len()).sum::<usize>()
            + self.tail.len();
        let mut out = Vec::with_capacity(len);
        out.extend_from_slice(&[0xFF, marker::SOI]);
        for segment in &self.segments {
            out.extend_from_slice(segment.as_bytes());
        }
        out.extend_from_slice(self.tail);
        out
    }
}

/// End offset of the length-prefixed segment whose marker starts at `pos`.
fn segment_end(data: &[u8], pos: usize, length_at: usize) -> Result<usize> {
    let Some(length) = data.get(length_at..length_at + 2) else {
        return Err(FormatError::Truncated { offset: pos }.into());
    };
    let length = u16::from_be_bytes([length[0], length[1]]);
    if length < 2 {
        return Err(FormatError::InvalidLength { offset: pos, length }.into());
    }
    let end = length_at + length as usize;
    if end > data.len() {
        return Err(FormatError::Truncated { offset: pos }.into());
    }
    Ok(end)
}
