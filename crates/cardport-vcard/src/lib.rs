//! vCard 2.1 / 3.0 ingestion for cardport.
//!
//! Parses a byte stream holding any number of vCard entries into
//! [`PropertyNode`]s, groups them per entry, and maps each entry onto a
//! [`cardport_core::contact::Contact`]. Pure synchronous; the only I/O is the
//! caller's [`std::io::Read`].
//!
//! # Quick start
//!
//! ```no_run
//! use cardport_vcard::{ParseOptions, VCardType, parse_contacts};
//!
//! let input = b"BEGIN:VCARD\r\nVERSION:2.1\r\nN:Ando;Roid;\r\nEND:VCARD\r\n";
//! let contacts = parse_contacts(input, &ParseOptions::new(VCardType::V21Generic)).unwrap();
//! println!("{:?}", contacts[0].display_name());
//! ```
//!
//! Several [`EntryBuilder`]s can observe one pass through a [`BuilderSet`]:
//!
//! ```no_run
//! use cardport_vcard::{
//!   BuilderSet, ContactBuilder, ContactMapper, ParseOptions, VCardParser,
//!   VCardType, VNodeBuilder,
//! };
//!
//! let options = ParseOptions::new(VCardType::V21Japanese);
//! let mut raw = VNodeBuilder::new();
//! let mut contacts = ContactBuilder::new(ContactMapper::new(options.vcard_type));
//! let mut set = BuilderSet::new().with(&mut raw).with(&mut contacts);
//! VCardParser::new(options).parse(std::io::stdin(), &mut set).unwrap();
//! ```

pub mod builder;
pub mod decode;
pub mod error;
pub mod mapper;
pub mod options;
pub mod parser;
pub mod property;
pub mod unfold;

use std::io::Read;

pub use builder::{
  BuilderSet, ContactBuilder, EntryBuilder, EntryCommitter, VNodeBuilder,
};
use cardport_core::contact::Contact;
pub use error::{Error, ErrorKind, Result};
pub use mapper::ContactMapper;
pub use options::{Dialect, ParseOptions, VCardType};
pub use parser::{ParseSummary, VCardParser};
pub use property::{PropertyNode, PropertyValue, VNode};

// ─── Public API ──────────────────────────────────────────────────────────────

/// Parse every entry in `input` into raw property lists, in stream order.
pub fn parse_nodes(input: &[u8], options: &ParseOptions) -> Result<Vec<VNode>> {
  read_nodes(input, options)
}

/// [`parse_nodes`] over any reader.
pub fn read_nodes<R: Read>(input: R, options: &ParseOptions) -> Result<Vec<VNode>> {
  let mut builder = VNodeBuilder::new();
  VCardParser::new(options.clone()).parse(input, &mut builder)?;
  Ok(builder.into_nodes())
}

/// Parse and map every entry in `input`, in stream order.
///
/// Entries that map to nothing are still returned (as empty contacts) so the
/// result lines up one-to-one with the entries in the stream.
pub fn parse_contacts(input: &[u8], options: &ParseOptions) -> Result<Vec<Contact>> {
  let mut builder = ContactBuilder::new(ContactMapper::new(options.vcard_type));
  VCardParser::new(options.clone()).parse_bytes(input, &mut builder)?;
  Ok(builder.into_contacts())
}
