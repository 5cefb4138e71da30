use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

const JPEG_PREFIXES: &[&str] = &["data:image/jpeg;base64,", "data:image/jpg;base64,"];
const OUTPUT_PREFIX: &str = "data:image/jpeg;base64,";
const MIN_BASE64_LEN: usize = 100;

/// A JPEG received as base64 text, optionally as a `data:` URI.
#[derive(Debug)]
pub struct Base64Jpeg {
    pub bytes: Vec<u8>,
    pub had_prefix: bool,
}

impl Base64Jpeg {
    pub fn decode(input: &str) -> Result<Self> {
        let input = input.trim();
        let (raw, had_prefix) = match JPEG_PREFIXES.iter().find_map(|p| input.strip_prefix(p)) {
            Some(raw) => (raw, true),
            None if input.starts_with("data:image/") => {
                let shown: String = input.chars().take(30).collect();
                bail!("Only JPEG images are supported. Received: {shown}");
            }
            None => (input, false),
        };

        if raw.len() < MIN_BASE64_LEN {
            bail!("Image data is empty or too short. Length: {}", raw.len());
        }

        let bytes = STANDARD.decode(raw).context("Image data is not valid base64")?;
        Ok(Self { bytes, had_prefix })
    }

    /// Encode `bytes` in the same form the input arrived in.
    pub fn encode_like(&self, bytes: &[u8]) -> String {
        let body = STANDARD.encode(bytes);
        if self.had_prefix {
            format!("{OUTPUT_PREFIX}{body}")
        } else {
            body
        }
    }
}
