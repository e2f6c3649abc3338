//! Parser configuration: the vCard type selector and per-parse options.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Escaping grammar used by the property line parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
  V21,
  V30,
}

impl Dialect {
  /// The dialect named by a `VERSION` property value, if any.
  pub fn from_version(version: &str) -> Option<Self> {
    match version.trim() {
      "2.1" => Some(Self::V21),
      "3.0" => Some(Self::V30),
      _ => None,
    }
  }
}

/// The vCard type/version selector.
///
/// Chooses the escaping dialect, the charset used when neither the line nor
/// the caller declares one, and the locale behaviour of the contact mapper.
///
/// Serializes as `snake_case`; the `Display` spelling is also accepted when
/// deserializing.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum VCardType {
  #[default]
  #[serde(alias = "v21-generic")]
  V21Generic,
  /// vCard 2.1 as emitted by Japanese mobile phones (Shift_JIS).
  #[serde(alias = "v21-japanese")]
  V21Japanese,
  #[serde(alias = "v21-japanese-utf8")]
  V21JapaneseUtf8,
  #[serde(alias = "v30-generic")]
  V30Generic,
}

impl VCardType {
  pub const ALL: [Self; 4] = [
    Self::V21Generic,
    Self::V21Japanese,
    Self::V21JapaneseUtf8,
    Self::V30Generic,
  ];

  pub fn dialect(self) -> Dialect {
    match self {
      Self::V30Generic => Dialect::V30,
      _ => Dialect::V21,
    }
  }

  pub fn default_charset(self) -> &'static str {
    match self {
      Self::V21Generic => "ISO-8859-1",
      Self::V21Japanese => "SHIFT_JIS",
      Self::V21JapaneseUtf8 | Self::V30Generic => "UTF-8",
    }
  }

  pub fn is_japanese(self) -> bool {
    matches!(self, Self::V21Japanese | Self::V21JapaneseUtf8)
  }

  fn as_str(self) -> &'static str {
    match self {
      Self::V21Generic => "v21-generic",
      Self::V21Japanese => "v21-japanese",
      Self::V21JapaneseUtf8 => "v21-japanese-utf8",
      Self::V30Generic => "v30-generic",
    }
  }
}

impl fmt::Display for VCardType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for VCardType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
    Self::ALL
      .into_iter()
      .find(|t| t.as_str() == wanted)
      .ok_or_else(|| Error::UnknownVCardType(s.to_string()))
  }
}

/// Options for one parse call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
  pub vcard_type:     VCardType,
  /// Stream-level charset. Overridden per line by a `CHARSET` parameter.
  pub charset:        Option<String>,
  /// Let a `VERSION` property switch the escaping dialect for the rest of
  /// its entry.
  pub strict_version: bool,
}

impl ParseOptions {
  pub fn new(vcard_type: VCardType) -> Self {
    Self {
      vcard_type,
      ..Self::default()
    }
  }

  pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
    self.charset = Some(charset.into());
    self
  }

  pub fn with_strict_version(mut self, strict: bool) -> Self {
    self.strict_version = strict;
    self
  }

  /// The charset applied to lines without a `CHARSET` parameter.
  pub fn stream_charset(&self) -> &str {
    self
      .charset
      .as_deref()
      .filter(|c| !c.trim().is_empty())
      .unwrap_or(self.vcard_type.default_charset())
  }
}
