//! cardport driver binary.
//!
//! Reads one `.vcf` file and writes its contents to stdout as JSON lines:
//! one array of storage rows per imported contact, or with `--raw` one
//! object per parsed entry.
//!
//! Settings come from `cardport.toml` (or the path given with `--config`),
//! then `CARDPORT_*` environment variables, then command-line flags.
//!
//! ```text
//! cardport contacts.vcf --type v21-japanese
//! ```

mod output;

use std::{
  fs::File,
  io::{self, BufReader},
  path::PathBuf,
};

use anyhow::Context as _;
use cardport_vcard::{
  ContactMapper, EntryCommitter, ParseOptions, VCardParser, VCardType,
};
use clap::Parser;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::output::JsonLines;

#[derive(Parser)]
#[command(author, version, about = "Import vCard files as contact rows")]
struct Cli {
  /// The `.vcf` file to read.
  file: PathBuf,

  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "cardport.toml")]
  config: PathBuf,

  /// vCard type: v21-generic, v21-japanese, v21-japanese-utf8, v30-generic.
  #[arg(short = 't', long = "type")]
  vcard_type: Option<VCardType>,

  /// Charset for lines without a CHARSET parameter.
  #[arg(long)]
  charset: Option<String>,

  /// Let a VERSION property pick the escaping rules for its entry.
  #[arg(long)]
  strict_version: bool,

  /// Print parsed entries instead of contact rows.
  #[arg(long)]
  raw: bool,
}

/// File and environment settings. Flags override each field.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CliConfig {
  vcard_type:     VCardType,
  charset:        Option<String>,
  strict_version: bool,
  raw:            bool,
}

impl CliConfig {
  fn load(path: PathBuf) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("CARDPORT").try_parsing(true))
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise CliConfig")
  }

  fn apply(mut self, cli: &Cli) -> Self {
    if let Some(vcard_type) = cli.vcard_type {
      self.vcard_type = vcard_type;
    }
    if let Some(charset) = &cli.charset {
      self.charset = Some(charset.clone());
    }
    self.strict_version |= cli.strict_version;
    self.raw |= cli.raw;
    self
  }

  fn parse_options(&self) -> ParseOptions {
    ParseOptions {
      vcard_type:     self.vcard_type,
      charset:        self.charset.clone(),
      strict_version: self.strict_version,
    }
  }
}

fn main() -> anyhow::Result<()> {
  // Logs go to stderr so stdout stays machine-readable.
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = CliConfig::load(cli.config.clone())?.apply(&cli);
  let options = settings.parse_options();

  let file = File::open(&cli.file)
    .with_context(|| format!("failed to open {:?}", cli.file))?;
  let input = BufReader::new(file);
  let stdout = io::stdout().lock();

  if settings.raw {
    let nodes = cardport_vcard::read_nodes(input, &options)
      .with_context(|| format!("failed to parse {:?}", cli.file))?;
    let mut sink = JsonLines::new(stdout);
    for node in &nodes {
      sink.write_line(node).context("failed to write entry")?;
    }
    let lines = sink.lines();
    sink.into_inner().context("failed to flush stdout")?;
    tracing::info!(entries = lines, "parsed");
    return Ok(());
  }

  let mut committer = EntryCommitter::new(
    ContactMapper::new(options.vcard_type),
    JsonLines::new(stdout),
  );
  let summary = VCardParser::new(options)
    .parse(input, &mut committer)
    .with_context(|| format!("failed to parse {:?}", cli.file))?;
  let committed = committer.committed();
  committer
    .finish()
    .context("failed to write contact rows")?
    .into_inner()
    .context("failed to flush stdout")?;

  if summary.is_empty() {
    tracing::warn!(file = ?cli.file, "no vCard entries found");
  }
  tracing::info!(entries = summary.entries, committed, "imported");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn flags_override_file_settings() {
    let cli = Cli::parse_from(["cardport", "in.vcf", "--type", "v30-generic", "--raw"]);
    let file = CliConfig {
      vcard_type: VCardType::V21Japanese,
      charset: Some("UTF-8".into()),
      ..CliConfig::default()
    };
    let settings = file.apply(&cli);
    assert_eq!(settings.vcard_type, VCardType::V30Generic);
    assert_eq!(settings.charset.as_deref(), Some("UTF-8"));
    assert!(settings.raw);
    assert!(!settings.strict_version);
  }

  #[test]
  fn config_file_accepts_flag_spelling() {
    let toml = "vcard_type = \"v21-japanese\"\nstrict_version = true\n";
    let settings: CliConfig = config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();
    assert_eq!(settings.vcard_type, VCardType::V21Japanese);
    assert!(settings.strict_version);
    assert!(!settings.raw);
  }

  #[test]
  fn missing_config_file_uses_defaults() {
    let settings = CliConfig::load(PathBuf::from("does-not-exist.toml")).unwrap();
    assert_eq!(settings.parse_options(), ParseOptions::default());
  }
}
