//! The entry parser: recognises `BEGIN:VCARD` / `END:VCARD` boundaries and
//! feeds each property of each entry to an [`EntryBuilder`].

use std::io::{BufReader, Read};

use tracing::instrument;

use crate::{
  builder::EntryBuilder,
  error::{Error, Result},
  options::{Dialect, ParseOptions},
  property::PropertyParser,
  unfold::{LineUnfolder, LogicalLine},
};

/// Outcome of a successful parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseSummary {
  /// Complete entries delivered to the builder.
  pub entries: usize,
  /// Logical lines read, blank ones included.
  pub lines:   usize,
}

impl ParseSummary {
  /// True when the stream held no complete entry. Not an error.
  pub fn is_empty(&self) -> bool { self.entries == 0 }
}

#[derive(Debug, Clone, Copy)]
enum State {
  Idle,
  InEntry {
    /// Physical line of the `BEGIN:VCARD`.
    opened_at: usize,
    dialect:   Dialect,
  },
}

enum Boundary {
  Begin,
  End,
}

fn boundary(line: &LogicalLine) -> Option<Boundary> {
  let text = line.bytes.trim_ascii();
  if text.eq_ignore_ascii_case(b"BEGIN:VCARD") {
    Some(Boundary::Begin)
  } else if text.eq_ignore_ascii_case(b"END:VCARD") {
    Some(Boundary::End)
  } else {
    None
  }
}

/// A reusable, stateless parser; every call to [`parse`] owns its own
/// position and state.
///
/// [`parse`]: VCardParser::parse
#[derive(Debug, Clone, Default)]
pub struct VCardParser {
  options: ParseOptions,
}

impl VCardParser {
  pub fn new(options: ParseOptions) -> Self { Self { options } }

  pub fn options(&self) -> &ParseOptions { &self.options }

  /// Parse every entry in `input`, emitting events to `builder`.
  ///
  /// Any error aborts the whole parse. `input` is dropped on every exit path.
  #[instrument(
    skip_all,
    fields(vcard_type = %self.options.vcard_type, charset = self.options.stream_charset())
  )]
  pub fn parse<R, B>(&self, input: R, builder: &mut B) -> Result<ParseSummary>
  where
    R: Read,
    B: EntryBuilder + ?Sized,
  {
    let base_dialect = self.options.vcard_type.dialect();
    let base = PropertyParser::new(base_dialect, self.options.stream_charset());
    let mut lines = LineUnfolder::new(BufReader::new(input));
    let mut state = State::Idle;
    let mut summary = ParseSummary::default();

    while let Some(line) = lines.next_line()? {
      summary.lines += 1;
      if line.is_blank() {
        continue;
      }
      state = match (state, boundary(&line)) {
        (State::Idle, Some(Boundary::Begin)) => {
          tracing::debug!(entry = summary.entries + 1, line = line.number, "entry start");
          builder.on_entry_start();
          State::InEntry {
            opened_at: line.number,
            dialect:   base_dialect,
          }
        }
        (State::InEntry { .. }, Some(Boundary::Begin)) => {
          return Err(Error::UnexpectedBegin { line: line.number });
        }
        (State::InEntry { .. }, Some(Boundary::End)) => {
          builder.on_entry_end();
          summary.entries += 1;
          tracing::debug!(entry = summary.entries, line = line.number, "entry end");
          State::Idle
        }
        (State::Idle, Some(Boundary::End)) => {
          return Err(Error::UnexpectedEnd { line: line.number });
        }
        (State::Idle, None) => {
          tracing::trace!(line = line.number, "ignoring line outside of an entry");
          State::Idle
        }
        (State::InEntry { opened_at, dialect }, None) => {
          let node = base.with_dialect(dialect).parse(&line)?;
          let dialect = match node.value().as_deref() {
            Some(version) if self.options.strict_version && node.name == "VERSION" => {
              Dialect::from_version(version).unwrap_or(dialect)
            }
            _ => dialect,
          };
          builder.on_property(&node);
          State::InEntry { opened_at, dialect }
        }
      };
    }

    if let State::InEntry { opened_at, .. } = state {
      return Err(Error::UnterminatedEntry { line: opened_at });
    }
    tracing::debug!(entries = summary.entries, lines = summary.lines, "parse finished");
    Ok(summary)
  }

  /// [`parse`](Self::parse) over an in-memory buffer.
  pub fn parse_bytes<B>(&self, input: &[u8], builder: &mut B) -> Result<ParseSummary>
  where
    B: EntryBuilder + ?Sized,
  {
    self.parse(input, builder)
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::{VCardType, builder::VNodeBuilder, property::PropertyValue};

  fn parse_with(options: ParseOptions, input: &str) -> Result<(ParseSummary, VNodeBuilder)> {
    let mut builder = VNodeBuilder::new();
    let summary = VCardParser::new(options).parse_bytes(input.as_bytes(), &mut builder)?;
    Ok((summary, builder))
  }

  fn parse(input: &str) -> Result<(ParseSummary, VNodeBuilder)> {
    parse_with(ParseOptions::default(), input)
  }

  // ── Boundaries ────────────────────────────────────────────────────────────

  #[test]
  fn counts_entries_in_stream_order() {
    let input = "BEGIN:VCARD\r\nFN:one\r\nEND:VCARD\r\n\
                 begin:vcard\r\nFN:two\r\nend:vcard\r\n";
    let (summary, builder) = parse(input).unwrap();
    assert_eq!(summary.entries, 2);
    let names: Vec<_> = builder
      .nodes()
      .iter()
      .map(|n| n.properties[0].value().unwrap().into_owned())
      .collect();
    assert_eq!(names, ["one", "two"]);
  }

  #[test]
  fn garbage_outside_entries_is_ignored() {
    let input = "\r\nsome preamble\r\nBEGIN:VCARD\r\nFN:x\r\nEND:VCARD\r\ntrailer\r\n";
    let (summary, builder) = parse(input).unwrap();
    assert_eq!(summary.entries, 1);
    assert_eq!(builder.nodes()[0].properties.len(), 1);
  }

  #[test]
  fn empty_stream_is_not_an_error() {
    let (summary, builder) = parse("").unwrap();
    assert!(summary.is_empty());
    assert!(builder.nodes().is_empty());
    let (summary, _) = parse("no cards here\r\n").unwrap();
    assert!(summary.is_empty());
    assert_eq!(summary.lines, 1);
  }

  #[test]
  fn blank_lines_inside_entry_are_skipped() {
    let (_, builder) = parse("BEGIN:VCARD\r\n\r\n  \r\nFN:x\r\nEND:VCARD\r\n").unwrap();
    assert_eq!(builder.nodes()[0].properties.len(), 1);
  }

  #[test]
  fn nested_begin_is_rejected() {
    let err = parse("BEGIN:VCARD\r\nBEGIN:VCARD\r\n").unwrap_err();
    assert!(matches!(err, Error::UnexpectedBegin { line: 2 }));
  }

  #[test]
  fn stray_end_is_rejected() {
    let err = parse("FN:x\r\nEND:VCARD\r\n").unwrap_err();
    assert!(matches!(err, Error::UnexpectedEnd { line: 2 }));
  }

  #[test]
  fn unterminated_entry_reports_its_begin_line() {
    let err = parse("\r\nBEGIN:VCARD\r\nFN:x\r\n").unwrap_err();
    assert!(matches!(err, Error::UnterminatedEntry { line: 2 }));
    assert_eq!(err.kind(), crate::ErrorKind::MalformedStream);
  }

  #[test]
  fn bad_property_aborts_the_parse() {
    let err = parse("BEGIN:VCARD\r\nFN:ok\r\nnot a property\r\nEND:VCARD\r\n").unwrap_err();
    assert!(matches!(err, Error::PropertyFormat { line: 3, .. }));
  }

  #[test]
  fn bad_line_outside_entry_is_harmless() {
    let (summary, _) = parse("not a property\r\nBEGIN:VCARD\r\nEND:VCARD\r\n").unwrap();
    assert_eq!(summary.entries, 1);
  }

  // ── Dialect selection ─────────────────────────────────────────────────────

  const MIXED: &str = "BEGIN:VCARD\r\nNOTE:a\\nb\r\nVERSION:3.0\r\nNOTE:c\\nd\r\nEND:VCARD\r\n\
                       BEGIN:VCARD\r\nNOTE:e\\nf\r\nEND:VCARD\r\n";

  fn notes(builder: &VNodeBuilder) -> Vec<String> {
    builder
      .nodes()
      .iter()
      .flat_map(|n| n.named("NOTE"))
      .map(|p| p.value().unwrap().into_owned())
      .collect()
  }

  #[test]
  fn version_is_ignored_without_strict_mode() {
    let (_, builder) = parse(MIXED).unwrap();
    assert_eq!(notes(&builder), ["a\\nb", "c\\nd", "e\\nf"]);
  }

  #[test]
  fn strict_version_switches_only_later_lines_of_the_entry() {
    let options = ParseOptions::default().with_strict_version(true);
    let (_, builder) = parse_with(options, MIXED).unwrap();
    assert_eq!(notes(&builder), ["a\\nb", "c\nd", "e\\nf"]);
  }

  #[test]
  fn v30_type_unescapes_from_the_start() {
    let options = ParseOptions::new(VCardType::V30Generic);
    let (_, builder) = parse_with(options, MIXED).unwrap();
    assert_eq!(notes(&builder), ["a\nb", "c\nd", "e\nf"]);
  }

  #[test]
  fn structured_values_reach_the_builder() {
    let (_, builder) = parse("BEGIN:VCARD\r\nN:Ando;Roid;\r\nEND:VCARD\r\n").unwrap();
    assert_eq!(
      builder.nodes()[0].properties[0].value,
      PropertyValue::Structured(vec!["Ando".into(), "Roid".into(), String::new()])
    );
  }
}
