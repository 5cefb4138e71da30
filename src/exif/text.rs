/// How a text value is laid out in a tag's value bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Single-byte characters followed by one NUL (TIFF `ASCII`).
    ///
    /// Bytes are passed through unchanged; non-ASCII input is not rejected.
    Ascii,
    /// 16-bit code units, low byte first, followed by a two-byte NUL.
    /// Used for the Windows `XP*` tags.
    Ucs2Le,
}

impl TextEncoding {
    /// Encode `text` (`None` is treated as the empty string).
    pub fn encode(self, text: Option<&str>) -> Vec<u8> {
        let text = text.unwrap_or_default();
        match self {
            Self::Ascii => {
                let mut bytes = Vec::with_capacity(text.len() + 1);
                bytes.extend_from_slice(text.as_bytes());
                bytes.push(0);
                bytes
            }
            Self::Ucs2Le => encode_ucs2le(text),
        }
    }

    /// Decode value bytes written by [`encode`](Self::encode), dropping the terminator.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Ascii => {
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                String::from_utf8_lossy(&bytes[..end]).into_owned()
            }
            Self::Ucs2Le => {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|c| u16::from_le_bytes([c[0], c[1]]))
                    .take_while(|&u| u != 0)
                    .collect();
                String::from_utf16_lossy(&units)
            }
        }
    }
}

/// Encode a string as UTF-16LE code units plus a null terminator.
///
/// Characters outside the BMP come out as their surrogate pair.
fn encode_ucs2le(s: &str) -> Vec<u8> {
    let mut bytes: Vec<u8> = s
        .encode_utf16()
        .flat_map(|c| c.to_le_bytes())
        .collect();
    bytes.push(0);
    bytes.push(0);
    bytes
}
