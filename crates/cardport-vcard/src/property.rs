//! Content-line parsing: one [`LogicalLine`] → one [`PropertyNode`].
//!
//! Pipeline for the value part:
//!   raw bytes
//!     └─ transfer decoding (QUOTED-PRINTABLE / BASE64)
//!          └─ charset decoding (line CHARSET, else stream charset)
//!               └─ unescape, or split + unescape for structured names

use std::{
  borrow::Cow,
  collections::{BTreeMap, BTreeSet},
};

use serde::Serialize;

use crate::{
  decode,
  error::{Error, Result},
  options::Dialect,
  unfold::LogicalLine,
};

/// Properties whose value is split into positional slots on unescaped `;`.
pub const STRUCTURED_PROPERTIES: &[&str] = &["N", "ADR", "ORG"];

/// Bare 2.1 parameter tokens that name a transfer encoding.
const BARE_ENCODINGS: &[&str] = &["QUOTED-PRINTABLE", "BASE64", "B", "7BIT", "8BIT"];

// ─── Public types ────────────────────────────────────────────────────────────

/// A decoded property value. Exactly one representation is ever populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PropertyValue {
  Text(String),
  /// Ordered slots of a structured property, empty slots preserved.
  Structured(Vec<String>),
  /// Payload of a `BASE64`/`B` encoded property.
  Binary(#[serde(with = "cardport_core::base64_bytes")] Vec<u8>),
}

/// One parsed property line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyNode {
  /// Group labels before the name (`item1.TEL` → `{"item1"}`).
  pub group:       BTreeSet<String>,
  /// Upper-cased property name.
  pub name:        String,
  /// Non-`TYPE` parameters, upper-cased keys; the last duplicate wins.
  pub params:      BTreeMap<String, String>,
  /// `TYPE=` values and bare tokens, case as written.
  pub type_params: BTreeSet<String>,
  pub value:       PropertyValue,
}

impl PropertyNode {
  /// The textual value. A structured value renders as its slots joined on
  /// `;` with `\` and `;` re-escaped, so splitting it again yields the same
  /// slots. `None` for binary values.
  pub fn value(&self) -> Option<Cow<'_, str>> {
    match &self.value {
      PropertyValue::Text(text) => Some(Cow::Borrowed(text)),
      PropertyValue::Structured(slots) => Some(Cow::Owned(decode::join_structured(slots))),
      PropertyValue::Binary(_) => None,
    }
  }

  /// The structured slots, or an empty slice.
  pub fn value_list(&self) -> &[String] {
    match &self.value {
      PropertyValue::Structured(slots) => slots,
      _ => &[],
    }
  }

  pub fn byte_value(&self) -> Option<&[u8]> {
    match &self.value {
      PropertyValue::Binary(bytes) => Some(bytes),
      _ => None,
    }
  }

  pub fn param(&self, key: &str) -> Option<&str> {
    self.params.get(key).map(String::as_str)
  }

  /// Case-insensitive `TYPE` token lookup.
  pub fn has_type(&self, token: &str) -> bool {
    self.type_params.iter().any(|t| t.eq_ignore_ascii_case(token))
  }

  /// Marked preferred by a `PREF` token or a `PREF=` parameter.
  pub fn is_pref(&self) -> bool {
    self.has_type("PREF") || self.params.contains_key("PREF")
  }
}

/// All properties of one `BEGIN:VCARD … END:VCARD` block, in stream order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VNode {
  pub properties: Vec<PropertyNode>,
}

impl VNode {
  pub fn iter(&self) -> std::slice::Iter<'_, PropertyNode> {
    self.properties.iter()
  }

  pub fn named<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Iterator<Item = &'a PropertyNode> + 'a {
    self.properties.iter().filter(move |p| p.name == name)
  }
}

impl<'a> IntoIterator for &'a VNode {
  type Item = &'a PropertyNode;
  type IntoIter = std::slice::Iter<'a, PropertyNode>;

  fn into_iter(self) -> Self::IntoIter { self.properties.iter() }
}

// ─── Parser ──────────────────────────────────────────────────────────────────

/// Parses content lines under a fixed dialect and stream charset.
#[derive(Debug, Clone, Copy)]
pub struct PropertyParser<'a> {
  dialect: Dialect,
  charset: &'a str,
}

impl<'a> PropertyParser<'a> {
  pub fn new(dialect: Dialect, charset: &'a str) -> Self {
    Self { dialect, charset }
  }

  pub fn dialect(&self) -> Dialect { self.dialect }

  pub fn with_dialect(self, dialect: Dialect) -> Self {
    Self { dialect, ..self }
  }

  pub fn parse(&self, line: &LogicalLine) -> Result<PropertyNode> {
    let format_error = || Error::PropertyFormat {
      line:    line.number,
      content: String::from_utf8_lossy(&line.bytes).into_owned(),
    };

    let colon = find_value_colon(&line.bytes).ok_or_else(format_error)?;
    let head = decode::latin1(&line.bytes[..colon]);
    let raw_value = &line.bytes[colon + 1..];

    let tokens = split_semicolons_respecting_quotes(&head);
    let mut segments: Vec<&str> = tokens[0].trim().split('.').collect();
    let name = segments.pop().unwrap_or_default().trim().to_uppercase();
    if name.is_empty() {
      return Err(format_error());
    }
    let group = segments
      .into_iter()
      .filter(|g| !g.is_empty())
      .map(str::to_string)
      .collect();

    let mut params = BTreeMap::new();
    let mut type_params = BTreeSet::new();
    for token in &tokens[1..] {
      if let Some((key, value)) = token.split_once('=') {
        let key = key.trim().to_uppercase();
        let value = value.trim().trim_matches('"');
        if key == "TYPE" {
          type_params.extend(
            value
              .split(',')
              .map(str::trim)
              .filter(|t| !t.is_empty())
              .map(str::to_string),
          );
        } else {
          params.insert(key, value.to_string());
        }
      } else {
        let token = token.trim();
        if token.is_empty() {
          continue;
        }
        if let Some(encoding) = BARE_ENCODINGS
          .iter()
          .find(|e| e.eq_ignore_ascii_case(token))
        {
          params
            .entry("ENCODING".to_string())
            .or_insert_with(|| encoding.to_string());
        }
        type_params.insert(token.to_string());
      }
    }

    let value = self.decode_value(&name, &params, raw_value)?;
    Ok(PropertyNode {
      group,
      name,
      params,
      type_params,
      value,
    })
  }

  fn decode_value(
    &self,
    name: &str,
    params: &BTreeMap<String, String>,
    raw: &[u8],
  ) -> Result<PropertyValue> {
    let encoding = params.get("ENCODING").map(|e| e.to_ascii_uppercase());
    let bytes: Cow<'_, [u8]> = match encoding.as_deref() {
      None | Some("7BIT" | "8BIT") => Cow::Borrowed(raw),
      Some("QUOTED-PRINTABLE") => Cow::Owned(decode::decode_quoted_printable(raw)?),
      Some("BASE64" | "B") => {
        return Ok(PropertyValue::Binary(decode::decode_base64(raw)?));
      }
      Some(_) => {
        let declared = params.get("ENCODING").cloned().unwrap_or_default();
        return Err(Error::UnsupportedEncoding(declared));
      }
    };

    let charset = params.get("CHARSET").map_or(self.charset, String::as_str);
    let text = decode::decode_charset(&bytes, charset)?;

    if STRUCTURED_PROPERTIES.contains(&name) {
      let mut slots = decode::split_structured(&text, self.dialect);
      if slots.len() > 1 {
        return Ok(PropertyValue::Structured(slots));
      }
      return Ok(PropertyValue::Text(slots.pop().unwrap_or_default()));
    }
    Ok(PropertyValue::Text(decode::unescape(&text, self.dialect)))
  }
}

// ─── Low-level helpers ───────────────────────────────────────────────────────

/// The first `:` outside double quotes and not preceded by a backslash.
fn find_value_colon(bytes: &[u8]) -> Option<usize> {
  let mut in_quotes = false;
  for (i, &b) in bytes.iter().enumerate() {
    match b {
      b'"' => in_quotes = !in_quotes,
      b':' if !in_quotes && (i == 0 || bytes[i - 1] != b'\\') => {
        return Some(i);
      }
      _ => {}
    }
  }
  None
}

/// Split on `;` while respecting double-quoted strings.
fn split_semicolons_respecting_quotes(s: &str) -> Vec<&str> {
  let mut result = Vec::new();
  let mut start = 0usize;
  let mut in_quotes = false;
  for (i, c) in s.char_indices() {
    match c {
      '"' => in_quotes = !in_quotes,
      ';' if !in_quotes => {
        result.push(&s[start..i]);
        start = i + 1;
      }
      _ => {}
    }
  }
  result.push(&s[start..]);
  result
}
