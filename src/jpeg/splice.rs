use super::{EXIF_ID, JpegScan, Segment, SegmentKind, marker};
use crate::error::Result;

/// Wrap a TIFF payload as an APP1 segment: `Exif\0\0` followed by the payload.
///
/// Fails with [`Error::SegmentTooLarge`](crate::Error::SegmentTooLarge) when
/// the length field (`2 + 6 + payload`) would exceed 65535.
pub fn exif_segment(payload: &[u8]) -> Result<Segment<'static>> {
    let mut contents = Vec::with_capacity(EXIF_ID.len() + payload.len());
    contents.extend_from_slice(EXIF_ID);
    contents.extend_from_slice(payload);
    Segment::new(marker::APP1, &contents)
}

impl<'a> JpegScan<'a> {
    /// Drop every EXIF APP1 segment and insert `exif` at the insertion point.
    pub fn with_exif(self, exif: Segment<'a>) -> JpegScan<'a> {
        let (segments, tail) = self.into_parts();
        let removed = segments.len();
        let segments: Vec<Segment<'a>> = segments
            .into_iter()
            .filter(|s| s.kind() != SegmentKind::Exif)
            .collect();
        let removed = removed - segments.len();
        if removed > 0 {
            log::debug!("Removed {removed} existing EXIF segment(s)");
        }

        let scan = JpegScan::from_parts(segments, tail);
        let at = scan.insertion_index();
        let (mut segments, tail) = scan.into_parts();
        segments.insert(at, exif);
        JpegScan::from_parts(segments, tail)
    }
}

/// Replace the EXIF metadata of a scanned JPEG with `payload`, returning the
/// new byte stream. The scan data and all other segments are copied unchanged.
pub fn replace_exif(scan: JpegScan<'_>, payload: &[u8]) -> Result<Vec<u8>> {
    let segment = exif_segment(payload)?;
    Ok(scan.with_exif(segment).to_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, MAX_SEGMENT_LENGTH};

    const APP0: &[u8] = b"\xFF\xE0\x00\x07JFIF\x00";
    const SOF0: &[u8] = b"\xFF\xC0\x00\x0B\x08\x00\x01\x00\x01\x01\x01\x11\x00";
    const SCAN: &[u8] = b"\xFF\xDA\x00\x08\x01\x01\x00\x00\x3F\x00\xAB\xCD\xFF\xD9";

    fn jpeg(parts: &[&[u8]]) -> Vec<u8> {
        let mut out = vec![0xFF, 0xD8];
        for p in parts {
            out.extend_from_slice(p);
        }
        out
    }

    #[test]
    fn inserts_after_app0() {
        let data = jpeg(&[APP0, SOF0, SCAN]);
        let out = replace_exif(JpegScan::parse(&data, true).unwrap(), b"PAYLOAD").unwrap();

        let expected = jpeg(&[APP0, b"\xFF\xE1\x00\x0FExif\x00\x00PAYLOAD", SOF0, SCAN]);
        assert_eq!(out, expected);
    }

    #[test]
    fn replaces_existing_exif() {
        let old = b"\xFF\xE1\x00\x0BExif\x00\x00OLD";
        let xmp = b"\xFF\xE1\x00\x06http";
        let data = jpeg(&[APP0, old, xmp, old, SOF0, SCAN]);
        let out = replace_exif(JpegScan::parse(&data, true).unwrap(), b"NEW").unwrap();

        let rescanned = JpegScan::parse(&out, true).unwrap();
        assert_eq!(rescanned.exif_count(), 1);
        assert_eq!(rescanned.exif_payload(), Some(&b"NEW"[..]));
        assert_eq!(out, jpeg(&[APP0, b"\xFF\xE1\x00\x0BExif\x00\x00NEW", xmp, SOF0, SCAN]));
    }

    #[test]
    fn inserts_after_soi_without_app0() {
        let data = jpeg(&[SOF0, SCAN]);
        let out = replace_exif(JpegScan::parse(&data, false).unwrap(), b"X").unwrap();
        assert_eq!(&out[2..4], &[0xFF, 0xE1]);
        assert!(out.ends_with(&jpeg(&[SOF0, SCAN])[2..]));
    }

    #[test]
    fn segment_size_limit() {
        let max_payload = MAX_SEGMENT_LENGTH - 2 - EXIF_ID.len();
        assert!(exif_segment(&vec![0; max_payload]).is_ok());
        assert_eq!(
            exif_segment(&vec![0; max_payload + 1]),
            Err(Error::SegmentTooLarge { length: MAX_SEGMENT_LENGTH + 1 })
        );
    }
}
