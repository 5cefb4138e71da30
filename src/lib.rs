//! # exif-embed
//!
//! Write a title, description and keywords into a JPEG as an EXIF APP1
//! segment, leaving every other segment and the compressed image data
//! byte-for-byte unchanged.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use exif_embed::pipeline::{embed, Metadata};
//!
//! fn main() -> anyhow::Result<()> {
//!     let jpeg = std::fs::read("photo.jpg")?;
//!     let meta = Metadata::new("Harbour", "Boats in the harbour at dawn", "boats, harbour, dawn");
//!
//!     let output = embed(&jpeg, &meta)?;
//!     std::fs::write("photo.jpg", output)?;
//!     Ok(())
//! }
//! ```
//!
//! ## What gets written
//!
//! A single IFD0 with three entries, no EXIF/GPS/Interop sub-IFDs and no thumbnail:
//!
//! | Tag | Id | Type | Encoding |
//! |-----|----|------|----------|
//! | ImageDescription | `0x010E` | ASCII | bytes + NUL |
//! | XPTitle | `0x9C9B` | BYTE | UCS-2LE + `0x0000` |
//! | XPKeywords | `0x9C9E` | BYTE | UCS-2LE + `0x0000` |
//!
//! Any EXIF APP1 segment already in the file is replaced. The new segment goes
//! right after SOI, or after the JFIF APP0 segment when there is one.
//!
//! ## Lower-Level Usage
//!
//! ```rust
//! use exif_embed::exif::{ByteOrder, Ifd, TagValue, assemble, read_payload_text};
//! use exif_embed::jpeg::exif_segment;
//!
//! # fn main() -> exif_embed::Result<()> {
//! let mut ifd0 = Ifd::new();
//! ifd0.insert(0x010E, TagValue::ascii(Some("A description")));
//! ifd0.insert(0x9C9B, TagValue::ucs2(Some("A title")));
//!
//! let payload = assemble(&[ifd0], ByteOrder::Little)?;
//! let segment = exif_segment(&payload)?;
//! assert_eq!(&segment.as_bytes()[..2], &[0xFF, 0xE1]);
//!
//! let text = read_payload_text(&payload)?;
//! assert_eq!(text.title.as_deref(), Some("A title"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`exif`] — text encodings, IFD building, TIFF assembly and reading
//! - [`jpeg`] — marker scanning and EXIF segment splicing
//! - [`pipeline`] — the embed operation and file-level processing
//! - [`config`] — configuration types and loading/saving

pub mod config;
pub mod error;
pub mod exif;
pub mod jpeg;
pub mod pipeline;

pub use error::{EncodingError, Error, FormatError, Result};
pub use pipeline::{Embedder, Metadata, embed};
