//! `borshgen` command-line wrapper.
//!
//! Points the generator at a file or a directory tree. Generation is best
//! effort per file: a file with no eligible records logs a warning and the
//! walk continues; any other failure stops it.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use borshgen_codegen::generate_file;
use borshgen_parse::{GeneratorOptions, source::is_sibling_source};

/// Generates compact binary codecs for annotated record structs.
#[derive(Debug, Parser)]
#[command(name = "borshgen", version, about)]
struct Cli {
    /// Input file, or a directory to walk recursively.
    input: PathBuf,

    /// Primary field tag name.
    #[arg(long = "tag", default_value = "bin")]
    tag: String,

    /// Fallback field tag name.
    #[arg(long = "fallback", default_value = "serde")]
    fallback: String,

    /// Ignore sentinel for the chosen tag's first token.
    #[arg(long = "ignore", default_value = "-")]
    ignore: String,

    /// Digest-relevance tag name.
    #[arg(long = "encode-tag", default_value = "enc")]
    encode_tag: String,

    /// Disable pooled scratch buffers in generated serializers.
    #[arg(long = "no-pool")]
    no_pool: bool,

    /// Advisory cap on string/byte payload length.
    #[arg(long = "max-string", default_value_t = 65535)]
    max_string: usize,
}

impl Cli {
    fn options(&self) -> GeneratorOptions {
        GeneratorOptions {
            primary_tag: self.tag.clone(),
            fallback_tag: self.fallback.clone(),
            ignore_sentinel: if self.ignore.is_empty() {
                "-".to_string()
            } else {
                self.ignore.clone()
            },
            encode_tag: self.encode_tag.clone(),
            use_pooling: !self.no_pool,
            max_string_len: self.max_string,
            ..GeneratorOptions::default()
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let options = cli.options();
    info!(
        tag = %options.primary_tag,
        fallback = %options.fallback_tag,
        ignore = %options.ignore_sentinel,
        encode_tag = %options.encode_tag,
        pooling = options.use_pooling,
        max_string = options.max_string_len,
        "configuration"
    );

    match run(&cli.input, &options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "generation failed");
            ExitCode::FAILURE
        }
    }
}

fn run(input: &Path, options: &GeneratorOptions) -> anyhow::Result<()> {
    let meta = std::fs::metadata(input)
        .with_context(|| format!("failed to stat {}", input.display()))?;
    if meta.is_dir() {
        walk_directory(input, options)
    } else {
        generate_one(input, options).map(|_| ())
    }
}

fn walk_directory(root: &Path, options: &GeneratorOptions) -> anyhow::Result<()> {
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !is_sibling_source(path) {
            continue;
        }
        generate_one(path, options)?;
    }
    Ok(())
}

/// Generates one file. The "no eligible records" case is a warning and
/// reports success so directory walks continue.
fn generate_one(path: &Path, options: &GeneratorOptions) -> anyhow::Result<bool> {
    info!(file = %path.display(), "processing");
    match generate_file(path, options) {
        Ok(artifacts) => {
            info!(artifact = %artifacts.record_file.display(), "wrote artifact");
            Ok(true)
        }
        Err(e) if e.is_no_records() => {
            warn!(file = %path.display(), "no eligible records, skipping");
            Ok(false)
        }
        Err(e) => Err(e).with_context(|| format!("generating {}", path.display())),
    }
}
