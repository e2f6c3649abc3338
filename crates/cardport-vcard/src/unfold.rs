//! Physical lines → logical (unfolded) lines.
//!
//! Three continuation rules are applied, in order:
//!
//! 1. A line whose head declares quoted-printable and that ends in `=` is
//!    continued by the next physical line verbatim, joined with CRLF so the
//!    decoder sees a proper soft break.
//! 2. A physical line starting with a space or tab continues the previous
//!    logical line; the one whitespace character is dropped.
//! 3. A line whose head declares BASE64 swallows following physical lines that
//!    have no `:` (vCard 2.1 photo layout). One blank line ends the payload and
//!    is consumed.

use std::io::BufRead;

use crate::error::{Error, Result};

/// One unfolded content line, still undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
  /// 1-based number of the physical line this logical line started on.
  pub number: usize,
  pub bytes:  Vec<u8>,
}

impl LogicalLine {
  pub fn is_blank(&self) -> bool { self.bytes.trim_ascii().is_empty() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Payload {
  Text,
  QuotedPrintable,
  Base64,
}

/// Lazily unfolds a byte stream. Accepts CRLF, LF and bare CR terminators.
pub struct LineUnfolder<R> {
  reader:   R,
  consumed: usize,
  pending:  Option<(usize, Vec<u8>)>,
}

impl<R: BufRead> LineUnfolder<R> {
  pub fn new(reader: R) -> Self {
    Self {
      reader,
      consumed: 0,
      pending: None,
    }
  }

  /// The next logical line, or `None` at end of stream.
  pub fn next_line(&mut self) -> Result<Option<LogicalLine>> {
    let (number, mut bytes) = match self.pending.take() {
      Some(line) => line,
      None => match self.read_physical()? {
        Some(line) => line,
        None => return Ok(None),
      },
    };
    if matches!(bytes.first(), Some(b' ' | b'\t')) {
      return Err(Error::OrphanContinuation { line: number });
    }

    let mut payload = payload_of(&bytes);
    loop {
      if payload == Some(Payload::QuotedPrintable) && bytes.ends_with(b"=") {
        let Some((_, next)) = self.read_physical()? else { break };
        bytes.extend_from_slice(b"\r\n");
        bytes.extend_from_slice(&next);
        continue;
      }
      let Some((next_number, next)) = self.read_physical()? else { break };
      if matches!(next.first(), Some(b' ' | b'\t')) {
        bytes.extend_from_slice(&next[1..]);
        if payload.is_none() {
          payload = payload_of(&bytes);
        }
        continue;
      }
      if payload == Some(Payload::Base64) && !next.contains(&b':') {
        let chunk = next.trim_ascii();
        if chunk.is_empty() {
          break;
        }
        bytes.extend_from_slice(chunk);
        continue;
      }
      self.pending = Some((next_number, next));
      break;
    }

    Ok(Some(LogicalLine { number, bytes }))
  }

  /// One physical line with its terminator stripped, numbered from 1.
  fn read_physical(&mut self) -> Result<Option<(usize, Vec<u8>)>> {
    let mut line = Vec::new();
    let mut saw_any = false;
    loop {
      let buf = self.reader.fill_buf()?;
      if buf.is_empty() {
        if !saw_any {
          return Ok(None);
        }
        break;
      }
      saw_any = true;
      match buf.iter().position(|&b| b == b'\r' || b == b'\n') {
        Some(pos) => {
          let terminator = buf[pos];
          line.extend_from_slice(&buf[..pos]);
          self.reader.consume(pos + 1);
          if terminator == b'\r' && self.reader.fill_buf()?.first() == Some(&b'\n')
          {
            self.reader.consume(1);
          }
          break;
        }
        None => {
          let len = buf.len();
          line.extend_from_slice(buf);
          self.reader.consume(len);
        }
      }
    }
    self.consumed += 1;
    Ok(Some((self.consumed, line)))
  }
}

impl<R: BufRead> Iterator for LineUnfolder<R> {
  type Item = Result<LogicalLine>;

  fn next(&mut self) -> Option<Self::Item> { self.next_line().transpose() }
}

/// The transfer encoding declared in the head of `line`, or `None` while the
/// head is still incomplete (no `:` seen yet).
fn payload_of(line: &[u8]) -> Option<Payload> {
  let colon = line.iter().position(|&b| b == b':')?;
  let mut payload = Payload::Text;
  for token in line[..colon].split(|&b| b == b';').skip(1) {
    let value = match token.iter().position(|&b| b == b'=') {
      Some(eq) if token[..eq].trim_ascii().eq_ignore_ascii_case(b"ENCODING") => {
        &token[eq + 1..]
      }
      Some(_) => continue,
      None => token,
    };
    let value = value.trim_ascii();
    if value.eq_ignore_ascii_case(b"QUOTED-PRINTABLE") {
      payload = Payload::QuotedPrintable;
    } else if value.eq_ignore_ascii_case(b"BASE64")
      || value.eq_ignore_ascii_case(b"B")
    {
      payload = Payload::Base64;
    }
  }
  Some(payload)
}
