use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{Config, EmbedOptions, OutputConfig};
use crate::error::Result;
use crate::exif;
use crate::jpeg::{JpegScan, replace_exif};

/// The text fields written into the image. `None` is written as an empty string.
///
/// - `title` — XPTitle (UCS-2LE)
/// - `description` — ImageDescription (ASCII)
/// - `keywords` — XPKeywords (UCS-2LE), passed through as given
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
}

impl Metadata {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        keywords: impl Into<String>,
    ) -> Self {
        Self {
            title: Some(title.into()),
            description: Some(description.into()),
            keywords: Some(keywords.into()),
        }
    }
}

/// Builds the EXIF block for a [`Metadata`] and splices it into JPEG bytes.
///
/// Holds no state besides its options; one instance can serve any number of
/// threads.
///
/// # Example
///
/// ```rust
/// use exif_embed::pipeline::{Embedder, Metadata};
///
/// # fn run(jpeg: &[u8]) -> exif_embed::Result<()> {
/// let meta = Metadata::new("Sunset", "Sunset over the bay", "sunset, bay, sea");
/// let output = Embedder::default().embed(jpeg, &meta)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Embedder {
    options: EmbedOptions,
}

impl Embedder {
    pub fn new(options: EmbedOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> EmbedOptions {
        self.options
    }

    /// The TIFF payload that [`embed`](Self::embed) would write.
    pub fn build_payload(&self, meta: &Metadata) -> Result<Vec<u8>> {
        exif::build_payload(meta, self.options.byte_order)
    }

    /// Return a copy of `jpeg` whose only EXIF APP1 segment carries `meta`.
    ///
    /// Either a complete stream is returned or the first error, unchanged.
    pub fn embed(&self, jpeg: &[u8], meta: &Metadata) -> Result<Vec<u8>> {
        let payload = self.build_payload(meta)?;
        let scan = JpegScan::parse(jpeg, self.options.strict)?;
        let replaced = scan.exif_count();
        let output = replace_exif(scan, &payload)?;
        log::debug!(
            "Embedded {}-byte EXIF payload ({} replaced), {} -> {} bytes",
            payload.len(),
            replaced,
            jpeg.len(),
            output.len()
        );
        Ok(output)
    }
}

/// Embed `meta` into `jpeg` with default options (little-endian, lenient scan).
pub fn embed(jpeg: &[u8], meta: &Metadata) -> Result<Vec<u8>> {
    Embedder::default().embed(jpeg, meta)
}

/// The result of processing a single file.
#[derive(Debug, Default, Serialize)]
pub struct ProcessResult {
    pub path: PathBuf,
    /// Where the output was (or, in a dry run, would have been) written.
    pub output_path: Option<PathBuf>,
    pub backup_path: Option<PathBuf>,
    /// Number of EXIF segments the input already carried.
    pub replaced_exif: usize,
    pub input_len: usize,
    pub output_len: usize,
    pub error: Option<String>,
}

impl ProcessResult {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            ..Default::default()
        }
    }
}

/// Embed `meta` into the JPEG at `path`, writing to `output` or back in place.
///
/// Errors are recorded in the returned [`ProcessResult`] rather than returned,
/// so a batch can carry on past a bad file.
pub fn process_file(
    path: &Path,
    output: Option<&Path>,
    meta: &Metadata,
    config: &Config,
) -> ProcessResult {
    let mut result = ProcessResult::new(path);
    if let Err(e) = try_process_file(&mut result, output, meta, config) {
        result.error = Some(format!("{e:#}"));
    }
    result
}

fn try_process_file(
    result: &mut ProcessResult,
    output: Option<&Path>,
    meta: &Metadata,
    config: &Config,
) -> anyhow::Result<()> {
    let path = result.path.clone();
    let bytes = std::fs::read(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    result.input_len = bytes.len();
    result.replaced_exif = JpegScan::parse(&bytes, false)
        .map(|s| s.exif_count())
        .unwrap_or_default();

    let embedded = Embedder::new(config.embed)
        .embed(&bytes, meta)
        .with_context(|| format!("Failed to embed metadata into {}", path.display()))?;
    result.output_len = embedded.len();

    let target = output.unwrap_or(path.as_path());
    result.backup_path = write_output(target, &embedded, &config.output)?;
    result.output_path = Some(target.to_path_buf());
    Ok(())
}

/// Write `bytes` to `target`, backing up an existing file first if configured.
///
/// Returns the backup path, if one was made. Does nothing in a dry run.
pub fn write_output(
    target: &Path,
    bytes: &[u8],
    output: &OutputConfig,
) -> anyhow::Result<Option<PathBuf>> {
    if output.dry_run {
        log::info!("Dry run: would write {} bytes to {}", bytes.len(), target.display());
        return Ok(None);
    }

    let mut backup = None;
    if output.backup_originals && target.exists() {
        let mut name = target.as_os_str().to_owned();
        name.push(".bak");
        let backup_path = PathBuf::from(name);
        std::fs::copy(target, &backup_path)
            .with_context(|| format!("Failed to create backup {}", backup_path.display()))?;
        log::debug!("Backup written to {}", backup_path.display());
        backup = Some(backup_path);
    }

    std::fs::write(target, bytes)
        .with_context(|| format!("Failed to write {}", target.display()))?;
    log::info!("Wrote {} bytes to {}", bytes.len(), target.display());
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, FormatError};
    use crate::exif::{ByteOrder, read_text_tags};

    const JPEG: &[u8] = b"\xFF\xD8\
        \xFF\xE0\x00\x10JFIF\x00\x01\x01\x00\x00\x01\x00\x01\x00\x00\
        \xFF\xC0\x00\x0B\x08\x00\x01\x00\x01\x01\x01\x11\x00\
        \xFF\xDA\x00\x08\x01\x01\x00\x00\x3F\x00\x12\x34\xFF\xD9";

    #[test]
    fn missing_fields_are_empty_strings() {
        let out = embed(JPEG, &Metadata::default()).unwrap();
        let text = read_text_tags(&out).unwrap().unwrap();
        assert_eq!(text.title.as_deref(), Some(""));
        assert_eq!(text.description.as_deref(), Some(""));
        assert_eq!(text.keywords.as_deref(), Some(""));
    }

    #[test]
    fn big_endian_option() {
        let embedder = Embedder::new(EmbedOptions {
            byte_order: ByteOrder::Big,
            strict: true,
        });
        let out = embedder.embed(JPEG, &Metadata::new("T", "D", "K")).unwrap();
        let scan = JpegScan::parse(&out, true).unwrap();
        assert!(scan.exif_payload().unwrap().starts_with(b"MM"));
        assert_eq!(read_text_tags(&out).unwrap().unwrap().keywords.as_deref(), Some("K"));
    }

    #[test]
    fn strict_scan_rejects_unterminated_stream() {
        let truncated = &JPEG[..JPEG.len() - 14];
        let meta = Metadata::default();
        assert!(embed(truncated, &meta).is_ok());

        let strict = Embedder::new(EmbedOptions { strict: true, ..Default::default() });
        assert_eq!(
            strict.embed(truncated, &meta),
            Err(Error::Format(FormatError::MissingEoi))
        );
    }

    #[test]
    fn process_file_in_place_with_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, JPEG).unwrap();

        let result = process_file(&path, None, &Metadata::new("T", "D", "K,L"), &Config::default());
        assert!(result.error.is_none(), "{:?}", result.error);
        assert_eq!(result.replaced_exif, 0);
        assert_eq!(result.output_path.as_deref(), Some(path.as_path()));

        let backup = result.backup_path.unwrap();
        assert_eq!(std::fs::read(&backup).unwrap(), JPEG);
        let written = std::fs::read(&path).unwrap();
        assert_eq!(written.len(), result.output_len);
        assert_eq!(read_text_tags(&written).unwrap().unwrap().title.as_deref(), Some("T"));
    }

    #[test]
    fn process_file_dry_run_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, JPEG).unwrap();

        let mut config = Config::default();
        config.output.dry_run = true;
        let result = process_file(&path, None, &Metadata::default(), &config);
        assert!(result.error.is_none());
        assert!(result.output_len > JPEG.len());
        assert_eq!(std::fs::read(&path).unwrap(), JPEG);
    }

    #[test]
    fn process_file_reports_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.png");
        std::fs::write(&path, b"\x89PNG\r\n\x1a\n").unwrap();

        let result = process_file(&path, None, &Metadata::default(), &Config::default());
        let error = result.error.unwrap();
        assert!(error.contains("not a JPEG"), "{error}");
    }
}
