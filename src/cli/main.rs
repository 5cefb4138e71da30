mod data_uri;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use data_uri::Base64Jpeg;
use exif_embed::config::Config;
use exif_embed::exif::{ByteOrder, read_text_tags};
use exif_embed::jpeg::JpegScan;
use exif_embed::pipeline::{self, Embedder, Metadata, ProcessResult};

#[derive(Parser, Debug)]
#[command(
    name = "exif-embed",
    version,
    about = "Embed title, description and keywords into JPEG files as EXIF metadata"
)]
struct Cli {
    /// JPEG files to process
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Title (written as XPTitle)
    #[arg(short, long)]
    title: Option<String>,

    /// Description (written as ImageDescription)
    #[arg(short, long)]
    description: Option<String>,

    /// Keywords (written as XPKeywords)
    #[arg(short, long)]
    keywords: Option<String>,

    /// Write the result here instead of modifying the input (single input only)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Inputs are base64 text, optionally a data:image/jpeg;base64 URI
    #[arg(long)]
    base64: bool,

    /// Print the embedded title, description and keywords instead of writing
    #[arg(long)]
    show: bool,

    /// Preview changes without writing to files
    #[arg(long)]
    dry_run: bool,

    /// Reject files without scan data or an EOI marker
    #[arg(long)]
    strict: bool,

    /// Write a big-endian (MM) TIFF header
    #[arg(long)]
    big_endian: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    // Load config, then let flags override it
    let mut config = Config::load(cli.config.as_deref())?;
    if cli.dry_run {
        config.output.dry_run = true;
    }
    if cli.strict {
        config.embed.strict = true;
    }
    if cli.big_endian {
        config.embed.byte_order = ByteOrder::Big;
    }

    if cli.paths.is_empty() {
        anyhow::bail!("No input files specified. Use --help for usage.");
    }
    if cli.output.is_some() && cli.paths.len() > 1 {
        anyhow::bail!("--output can only be used with a single input file.");
    }

    if cli.show {
        return show(&cli);
    }

    let meta = Metadata {
        title: cli.title.clone(),
        description: cli.description.clone(),
        keywords: cli.keywords.clone(),
    };
    if config.output.dry_run {
        log::info!("DRY RUN — no files will be modified");
    }

    let mut results = Vec::new();
    let total = cli.paths.len();

    for (i, path) in cli.paths.iter().enumerate() {
        log::info!("[{}/{}] Processing: {}", i + 1, total, path.display());

        let output = cli.output.as_deref();
        let result = if cli.base64 {
            process_base64(path, output, &meta, &config)
        } else {
            pipeline::process_file(path, output, &meta, &config)
        };

        if let Some(ref err) = result.error {
            log::error!("  Error: {err}");
        } else {
            if result.replaced_exif > 0 {
                log::info!("  Replaced existing EXIF segment");
            }
            log::info!("  {} -> {} bytes", result.input_len, result.output_len);
            if let Some(ref backup) = result.backup_path {
                log::info!("  Backup: {}", backup.display());
            }
        }

        results.push(result);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    log::info!(
        "Done: {} succeeded, {failed} failed out of {total} files",
        total - failed
    );

    Ok(())
}

/// Read inputs and print the text tags they carry.
fn show(cli: &Cli) -> Result<()> {
    let mut shown = Vec::new();
    for path in &cli.paths {
        let bytes = read_input(path, cli.base64)?;
        let text = read_text_tags(&bytes)
            .with_context(|| format!("Failed to read EXIF from {}", path.display()))?;

        if cli.json {
            shown.push(serde_json::json!({
                "path": path.display().to_string(),
                "exif": text,
            }));
            continue;
        }

        println!("{}", path.display());
        match text {
            Some(text) => {
                println!("  Title:       {}", text.title.unwrap_or_default());
                println!("  Description: {}", text.description.unwrap_or_default());
                println!("  Keywords:    {}", text.keywords.unwrap_or_default());
            }
            None => println!("  (no EXIF segment)"),
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
    }
    Ok(())
}

fn read_input(path: &Path, base64: bool) -> Result<Vec<u8>> {
    if base64 {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Base64Jpeg::decode(&text)?.bytes)
    } else {
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
    }
}

/// Same as [`pipeline::process_file`], for inputs holding base64 text.
fn process_base64(
    path: &Path,
    output: Option<&Path>,
    meta: &Metadata,
    config: &Config,
) -> ProcessResult {
    let mut result = ProcessResult::new(path);
    if let Err(e) = try_process_base64(&mut result, output, meta, config) {
        result.error = Some(format!("{e:#}"));
    }
    result
}

fn try_process_base64(
    result: &mut ProcessResult,
    output: Option<&Path>,
    meta: &Metadata,
    config: &Config,
) -> Result<()> {
    let path = result.path.clone();
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let input = Base64Jpeg::decode(&text)?;
    result.input_len = input.bytes.len();
    result.replaced_exif = JpegScan::parse(&input.bytes, false)
        .map(|s| s.exif_count())
        .unwrap_or_default();

    let embedded = Embedder::new(config.embed)
        .embed(&input.bytes, meta)
        .with_context(|| format!("Failed to embed metadata into {}", path.display()))?;
    result.output_len = embedded.len();

    let target = output.unwrap_or(path.as_path());
    let encoded = input.encode_like(&embedded);
    result.backup_path = pipeline::write_output(target, encoded.as_bytes(), &config.output)?;
    result.output_path = Some(target.to_path_buf());
    Ok(())
}
