//! Stateless value decoders: transfer encodings, charsets and the two
//! backslash-escaping grammars.

use base64::{
  Engine as _,
  alphabet,
  engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use encoding_rs::Encoding;

use crate::{
  error::{Error, Result},
  options::Dialect,
};

/// Standard alphabet, padding optional, stray trailing bits tolerated.
const LENIENT_B64: GeneralPurpose = GeneralPurpose::new(
  &alphabet::STANDARD,
  GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true),
);

// ─── Transfer encodings ──────────────────────────────────────────────────────

/// RFC 2045 quoted-printable. Soft line breaks (`=` followed by CRLF, LF or
/// CR) are removed, as is a dangling `=` at the very end of the input.
pub fn decode_quoted_printable(input: &[u8]) -> Result<Vec<u8>> {
  let mut out = Vec::with_capacity(input.len());
  let mut i = 0;
  while i < input.len() {
    if input[i] != b'=' {
      out.push(input[i]);
      i += 1;
      continue;
    }
    match input.get(i + 1..i + 3) {
      _ if i + 1 == input.len() => i += 1,
      Some([b'\r', b'\n']) => i += 3,
      _ if matches!(input.get(i + 1), Some(b'\r' | b'\n')) => i += 2,
      Some(&[hi, lo]) => {
        let (Some(hi), Some(lo)) = (hex_value(hi), hex_value(lo)) else {
          return Err(Error::QuotedPrintable { position: i });
        };
        out.push((hi << 4) | lo);
        i += 3;
      }
      _ => return Err(Error::QuotedPrintable { position: i }),
    }
  }
  Ok(out)
}

fn hex_value(b: u8) -> Option<u8> {
  (b as char).to_digit(16).map(|d| d as u8)
}

/// Base64 with every ASCII whitespace byte ignored.
pub fn decode_base64(input: &[u8]) -> Result<Vec<u8>> {
  let compact: Vec<u8> = input
    .iter()
    .copied()
    .filter(|b| !b.is_ascii_whitespace())
    .collect();
  Ok(LENIENT_B64.decode(compact)?)
}

// ─── Charsets ────────────────────────────────────────────────────────────────

/// Decode `bytes` with the charset named by `label` (WHATWG labels, matched
/// case-insensitively). Malformed sequences become U+FFFD.
pub fn decode_charset(bytes: &[u8], label: &str) -> Result<String> {
  let encoding = Encoding::for_label(label.trim().as_bytes())
    .ok_or_else(|| Error::UnsupportedCharset(label.to_string()))?;
  let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
  if had_errors {
    tracing::warn!(
      charset = encoding.name(),
      "malformed byte sequence replaced while decoding value"
    );
  }
  Ok(text.into_owned())
}

/// Header bytes are ASCII in practice; map each byte to the code point of the
/// same value so nothing is ever rejected.
pub(crate) fn latin1(bytes: &[u8]) -> String {
  bytes.iter().map(|&b| b as char).collect()
}

// ─── Escaping ────────────────────────────────────────────────────────────────

/// Unescape a scalar value.
///
/// vCard 2.1 has no scalar escapes, so the value is returned verbatim. vCard
/// 3.0 maps `\n`/`\N` to a newline and `\x` to `x`.
pub fn unescape(value: &str, dialect: Dialect) -> String {
  match dialect {
    Dialect::V21 => value.to_string(),
    Dialect::V30 => {
      let mut out = String::with_capacity(value.len());
      let mut chars = value.chars();
      while let Some(c) = chars.next() {
        if c != '\\' {
          out.push(c);
          continue;
        }
        match chars.next() {
          Some('n' | 'N') => out.push('\n'),
          Some(other) => out.push(other),
          None => out.push('\\'),
        }
      }
      out
    }
  }
}

/// Split a structured value on unescaped `;`, unescaping each slot.
///
/// Empty slots are preserved. Under vCard 2.1 only `\\`, `\;`, `\:` and `\,`
/// are escapes and any other backslash is literal; under vCard 3.0 the scalar
/// rules of [`unescape`] apply.
pub fn split_structured(value: &str, dialect: Dialect) -> Vec<String> {
  let mut slots = Vec::new();
  let mut current = String::new();
  let mut chars = value.chars().peekable();
  while let Some(c) = chars.next() {
    match c {
      ';' => slots.push(std::mem::take(&mut current)),
      '\\' => match (dialect, chars.peek().copied()) {
        (Dialect::V21, Some(next @ ('\\' | ';' | ':' | ','))) => {
          current.push(next);
          chars.next();
        }
        (Dialect::V21, _) | (Dialect::V30, None) => current.push('\\'),
        (Dialect::V30, Some('n' | 'N')) => {
          current.push('\n');
          chars.next();
        }
        (Dialect::V30, Some(next)) => {
          current.push(next);
          chars.next();
        }
      },
      _ => current.push(c),
    }
  }
  slots.push(current);
  slots
}

/// Render slots as one structured value that [`split_structured`] turns back
/// into the same slots under either dialect: `\` and `;` are escaped.
pub fn join_structured(slots: &[String]) -> String {
  let mut out = String::new();
  for (i, slot) in slots.iter().enumerate() {
    if i > 0 {
      out.push(';');
    }
    for c in slot.chars() {
      if matches!(c, '\\' | ';') {
        out.push('\\');
      }
      out.push(c);
    }
  }
  out
}
