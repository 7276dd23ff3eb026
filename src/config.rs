use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::data::loader::LoadOptions;

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "rusty-sieve.json";

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(name = "rusty-sieve", version, about = "Filter tabular data by column values")]
pub struct Cli {
    /// File to open at start-up (.csv, .tsv, .json, .parquet, ...)
    pub path: Option<PathBuf>,

    /// JSON config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Field delimiter for delimited text (single character, `\t` for tab)
    #[arg(short, long)]
    pub delimiter: Option<String>,

    /// Treat the first line as data instead of column names
    #[arg(long)]
    pub no_headers: bool,

    /// Rows per table page
    #[arg(long)]
    pub page_size: Option<usize>,
}

// ---------------------------------------------------------------------------
// Viewer configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// `None` = pick from extension / first line.
    pub delimiter: Option<char>,
    pub has_headers: bool,
    pub trim: bool,
    pub page_size: usize,
    pub page_size_options: Vec<usize>,
    /// Column used for colouring when it exists in the loaded data.
    pub color_column: Option<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_headers: true,
            trim: false,
            page_size: 20,
            page_size_options: vec![20, 50, 100],
            color_column: None,
        }
    }
}

impl ViewerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: ViewerConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validated()
    }

    /// Resolve the effective configuration: explicit `--config`, else the
    /// default file if present, else defaults; CLI flags override.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    log::info!("Using config {DEFAULT_CONFIG_FILE}");
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };

        if let Some(d) = &cli.delimiter {
            config.delimiter = Some(parse_delimiter(d)?);
        }
        if cli.no_headers {
            config.has_headers = false;
        }
        if let Some(n) = cli.page_size {
            config.page_size = n;
        }
        config.validated()
    }

    fn validated(mut self) -> Result<Self> {
        if let Some(d) = self.delimiter {
            if !d.is_ascii() {
                bail!("delimiter {d:?} must be a single ASCII character");
            }
        }
        if self.page_size == 0 {
            bail!("page_size must be at least 1");
        }
        self.page_size_options.retain(|&n| n > 0);
        if !self.page_size_options.contains(&self.page_size) {
            self.page_size_options.push(self.page_size);
            self.page_size_options.sort_unstable();
        }
        Ok(self)
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            delimiter: self.delimiter.map(|c| c as u8),
            has_headers: self.has_headers,
            trim: self.trim,
        }
    }
}

fn parse_delimiter(raw: &str) -> Result<char> {
    if raw == "\\t" || raw == "tab" {
        return Ok('\t');
    }
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => bail!("delimiter must be a single character, got {raw:?}"),
    }
}
