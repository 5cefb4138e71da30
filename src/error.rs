use thiserror::Error;

/// Maximum value of a JPEG segment length field.
pub const MAX_SEGMENT_LENGTH: usize = u16::MAX as usize;

/// The input is not a structurally valid JPEG (or EXIF block, for the reader).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("not a JPEG (missing SOI marker)")]
    NotJpeg,
    #[error("truncated stream at offset {offset}")]
    Truncated { offset: usize },
    #[error("expected a marker at offset {offset}")]
    MissingMarker { offset: usize },
    #[error("unexpected marker 0x{marker:02X} at offset {offset}")]
    UnexpectedMarker { marker: u8, offset: usize },
    #[error("invalid segment length {length} at offset {offset}")]
    InvalidLength { offset: usize, length: u16 },
    #[error("truncated stream (no scan data or EOI marker)")]
    MissingEoi,
    #[error("invalid TIFF data: {0}")]
    InvalidTiff(&'static str),
}

/// A value could not be encoded into its declared tag type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("tag 0x{tag:04X} has unrecognized type code {format}")]
    UnknownFormat { tag: u16, format: u16 },
    #[error("tag 0x{tag:04X}: {len} bytes is not a whole number of {unit}-byte components")]
    MisalignedValue { tag: u16, len: usize, unit: usize },
    #[error("directory holds {0} entries, more than a TIFF directory can count")]
    TooManyEntries(usize),
    #[error("EXIF payload offset exceeds the 32-bit range")]
    OffsetOverflow,
    #[error("an EXIF payload needs at least one directory")]
    NoDirectories,
}

/// Errors produced while building or embedding EXIF metadata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("format error: {0}")]
    Format(#[from] FormatError),
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),
    #[error("EXIF segment length {length} exceeds the 65535-byte limit")]
    SegmentTooLarge { length: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_cause() {
        let err = Error::from(FormatError::NotJpeg);
        assert_eq!(err.to_string(), "format error: not a JPEG (missing SOI marker)");

        let err = Error::SegmentTooLarge { length: 70000 };
        assert!(err.to_string().contains("70000"));
        assert!(err.to_string().contains("65535"));

        let err = Error::from(EncodingError::UnknownFormat { tag: 0x010E, format: 99 });
        assert!(err.to_string().contains("0x010E"));
    }
}
