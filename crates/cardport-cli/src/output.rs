//! JSON-lines sinks for the driver.

use std::io::{self, Write};

use cardport_core::commit::{CommitAdapter, DataRow};
use serde::Serialize;

/// A [`CommitAdapter`] that writes each batch as one JSON array per line.
pub struct JsonLines<W: Write> {
  out:   W,
  lines: usize,
}

impl<W: Write> JsonLines<W> {
  pub fn new(out: W) -> Self { Self { out, lines: 0 } }

  pub fn lines(&self) -> usize { self.lines }

  /// Write any serializable value as one line.
  pub fn write_line<T: Serialize + ?Sized>(&mut self, value: &T) -> io::Result<()> {
    serde_json::to_writer(&mut self.out, value)?;
    self.out.write_all(b"\n")?;
    self.lines += 1;
    Ok(())
  }

  pub fn into_inner(mut self) -> io::Result<W> {
    self.out.flush()?;
    Ok(self.out)
  }
}

impl<W: Write> CommitAdapter for JsonLines<W> {
  type Error = io::Error;

  fn commit(&mut self, rows: Vec<DataRow>) -> Result<(), Self::Error> {
    self.write_line(&rows)
  }
}
