//! Telephone classification and locale-specific number grouping.

use cardport_core::contact::PhoneType;

use super::types::labels;
use crate::{VCardType, property::PropertyNode};

// ─── Classification ──────────────────────────────────────────────────────────

/// Tokens that name a phone type on their own.
fn explicit_type(token: &str) -> Option<PhoneType> {
  Some(match token {
    "CELL" => PhoneType::Mobile,
    "PAGER" => PhoneType::Pager,
    "CALLBACK" => PhoneType::Callback,
    "CAR" => PhoneType::Car,
    "ISDN" => PhoneType::Isdn,
    "RADIO" => PhoneType::Radio,
    "TLX" | "TELEX" => PhoneType::Telex,
    "TTY-TDD" => PhoneType::TtyTdd,
    "ASSISTANT" => PhoneType::Assistant,
    "MSG" | "MMS" => PhoneType::Mms,
    "OTHER" => PhoneType::Other,
    _ => return None,
  })
}

/// Classify a `TEL` occurrence by its type tokens.
///
/// Precedence: an explicit type, then fax (work fax when `WORK` is also
/// present), then `HOME`/`WORK`, then the first unknown token as a custom
/// label. `VOICE` is not in the table and so becomes a custom label unless
/// something stronger is present. With no tokens at all the type is home.
pub(super) fn phone_type(property: &PropertyNode) -> PhoneType {
  let (mut fax, mut home, mut work) = (false, false, false);
  let mut explicit = None;
  let mut custom = None;
  for token in labels(property) {
    match token.to_ascii_uppercase().as_str() {
      "FAX" => fax = true,
      "HOME" => home = true,
      "WORK" => work = true,
      upper => match explicit_type(upper) {
        Some(t) => {
          explicit.get_or_insert(t);
        }
        None => {
          custom.get_or_insert(token);
        }
      },
    }
  }

  match explicit {
    Some(t) => t,
    None if fax && work => PhoneType::FaxWork,
    None if fax => PhoneType::FaxHome,
    None if home => PhoneType::Home,
    None if work => PhoneType::Work,
    None => custom.map_or(PhoneType::Home, |c| PhoneType::Custom(c.to_string())),
  }
}

// ─── Formatting ──────────────────────────────────────────────────────────────

/// Digit grouping applied to phone numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhoneFormat {
  /// North American Numbering Plan: `XXX-XXX-XXXX`.
  #[default]
  Nanp,
  /// Japanese area-code aware grouping.
  Japan,
}

impl PhoneFormat {
  pub fn for_type(vcard_type: VCardType) -> Self {
    if vcard_type.is_japanese() {
      Self::Japan
    } else {
      Self::Nanp
    }
  }

  /// Regroup the leading dialable part of `number`. Whatever follows it (an
  /// extension, a comment) is appended unchanged. Numbers of a length the
  /// plan does not know are returned as given.
  pub fn format(self, number: &str) -> String {
    let end = number.find(|c: char| !is_dial_char(c)).unwrap_or(number.len());
    let dialable = number[..end].trim_end();
    let rest = &number[dialable.len()..];

    let digits: String = dialable.chars().filter(char::is_ascii_digit).collect();
    let international = dialable.trim_start().starts_with('+');
    let grouped = match self {
      Self::Nanp => nanp(&digits, international),
      Self::Japan => japan(&digits, international),
    };
    match grouped {
      Some(grouped) => format!("{grouped}{rest}"),
      None => number.to_string(),
    }
  }
}

fn is_dial_char(c: char) -> bool {
  c.is_ascii_digit() || matches!(c, '+' | '(' | ')' | '-' | '.' | ' ')
}

fn nanp(digits: &str, international: bool) -> Option<String> {
  let groups: &[usize] = match (international, digits.len()) {
    (true, 11) if digits.starts_with('1') => {
      return Some(format!("+{}", group(digits, &[1, 3, 3, 4])));
    }
    (false, 7) => &[3, 4],
    (false, 10) => &[3, 3, 4],
    (false, 11) if digits.starts_with('1') => &[1, 3, 3, 4],
    _ => return None,
  };
  Some(group(digits, groups))
}

fn japan(digits: &str, international: bool) -> Option<String> {
  if international {
    return None;
  }
  let starts = |prefixes: &[&str]| prefixes.iter().any(|p| digits.starts_with(p));
  let groups: &[usize] = match digits.len() {
    10 if starts(&["03", "06"]) => &[2, 4, 4],
    10 if starts(&["0120", "0570"]) => &[4, 3, 3],
    10 if digits.starts_with('0') => &[3, 3, 4],
    11 if digits.starts_with("0800") => &[4, 3, 4],
    11 if starts(&["050", "070", "080", "090"]) => &[3, 4, 4],
    _ => return None,
  };
  Some(group(digits, groups))
}

/// `digits` is ASCII and `sizes` sums to its length.
fn group(digits: &str, sizes: &[usize]) -> String {
  let mut out = String::with_capacity(digits.len() + sizes.len());
  let mut start = 0;
  for &size in sizes {
    if start > 0 {
      out.push('-');
    }
    out.push_str(&digits[start..start + size]);
    start += size;
  }
  out
}
