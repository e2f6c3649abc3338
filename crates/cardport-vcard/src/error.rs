//! Error types for the cardport-vcard parser.

use thiserror::Error;

/// Coarse classification of an [`Error`], for callers that only need to know
/// which layer rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Broken stream structure: folding or `BEGIN`/`END` nesting.
  MalformedStream,
  /// A content line with no value separator.
  PropertyFormat,
  /// A declared charset or transfer encoding could not be applied.
  Encoding,
  Io,
  /// Invalid parser configuration.
  Config,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("line {line}: continuation line with no preceding line")]
  OrphanContinuation { line: usize },

  #[error("line {line}: BEGIN:VCARD inside an open entry")]
  UnexpectedBegin { line: usize },

  #[error("line {line}: END:VCARD outside of an entry")]
  UnexpectedEnd { line: usize },

  #[error("entry opened at line {line} is never closed")]
  UnterminatedEntry { line: usize },

  #[error("line {line}: no value separator in {content:?}")]
  PropertyFormat { line: usize, content: String },

  #[error("unsupported charset: {0}")]
  UnsupportedCharset(String),

  #[error("unsupported transfer encoding: {0}")]
  UnsupportedEncoding(String),

  #[error("invalid quoted-printable sequence at byte {position}")]
  QuotedPrintable { position: usize },

  #[error("invalid base64 payload: {0}")]
  Base64(#[from] base64::DecodeError),

  #[error("unknown vCard type: {0:?}")]
  UnknownVCardType(String),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::OrphanContinuation { .. }
      | Self::UnexpectedBegin { .. }
      | Self::UnexpectedEnd { .. }
      | Self::UnterminatedEntry { .. } => ErrorKind::MalformedStream,
      Self::PropertyFormat { .. } => ErrorKind::PropertyFormat,
      Self::UnsupportedCharset(_)
      | Self::UnsupportedEncoding(_)
      | Self::QuotedPrintable { .. }
      | Self::Base64(_) => ErrorKind::Encoding,
      Self::UnknownVCardType(_) => ErrorKind::Config,
      Self::Io(_) => ErrorKind::Io,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
