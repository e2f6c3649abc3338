//! The commit boundary between the importer and a storage backend.
//!
//! A [`Contact`] is flattened into one batch of [`DataRow`]s; each row is one
//! typed field group tagged with a discriminator. Rows inside a batch belong
//! to the same raw contact, so a backend can resolve "which contact owns this
//! phone" purely by batch membership.

use std::convert::Infallible;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  contact::{
    Contact, Email, Event, GroupMembership, Im, Organization, Phone, Photo,
    PostalAddress, StructuredName, Website,
  },
};

// ─── DataRow ─────────────────────────────────────────────────────────────────

/// One storage record. The variant name is the `kind` discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum DataRow {
  StructuredName(StructuredName),
  Nickname(String),
  Phone(Phone),
  Email(Email),
  PostalAddress(PostalAddress),
  Organization(Organization),
  Im(Im),
  Note(String),
  Website(Website),
  Event(Event),
  Photo(Photo),
  GroupMembership(GroupMembership),
}

/// Every discriminator a [`DataRow`] can carry, in batch order.
pub const DATA_ROW_KINDS: &[&str] = &[
  "structured_name",
  "nickname",
  "phone",
  "email",
  "postal_address",
  "organization",
  "im",
  "note",
  "website",
  "event",
  "photo",
  "group_membership",
];

impl DataRow {
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn discriminant(&self) -> &'static str {
    match self {
      Self::StructuredName(_) => "structured_name",
      Self::Nickname(_) => "nickname",
      Self::Phone(_) => "phone",
      Self::Email(_) => "email",
      Self::PostalAddress(_) => "postal_address",
      Self::Organization(_) => "organization",
      Self::Im(_) => "im",
      Self::Note(_) => "note",
      Self::Website(_) => "website",
      Self::Event(_) => "event",
      Self::Photo(_) => "photo",
      Self::GroupMembership(_) => "group_membership",
    }
  }

  /// The payload without the `kind` tag.
  pub fn to_json(&self) -> Result<serde_json::Value> {
    let full = serde_json::to_value(self)?;
    Ok(full.get("data").cloned().unwrap_or(serde_json::Value::Null))
  }

  /// Rebuild a row from a stored discriminator and payload.
  pub fn from_parts(kind: &str, data: serde_json::Value) -> Result<Self> {
    if !DATA_ROW_KINDS.contains(&kind) {
      return Err(Error::UnknownRowKind(kind.to_string()));
    }
    let wrapped = serde_json::json!({ "kind": kind, "data": data });
    Ok(serde_json::from_value(wrapped)?)
  }
}

impl Contact {
  /// Flatten into one ordered commit batch. An empty contact yields an empty
  /// batch.
  pub fn rows(&self) -> Vec<DataRow> {
    let mut rows = Vec::new();
    if let Some(name) = &self.name
      && !name.is_empty()
    {
      rows.push(DataRow::StructuredName(name.clone()));
    }
    rows.extend(self.nicknames.iter().cloned().map(DataRow::Nickname));
    rows.extend(self.phones.iter().cloned().map(DataRow::Phone));
    rows.extend(self.emails.iter().cloned().map(DataRow::Email));
    rows.extend(self.addresses.iter().cloned().map(DataRow::PostalAddress));
    rows.extend(self.organizations.iter().cloned().map(DataRow::Organization));
    rows.extend(self.ims.iter().cloned().map(DataRow::Im));
    rows.extend(self.notes.iter().cloned().map(DataRow::Note));
    rows.extend(self.websites.iter().cloned().map(DataRow::Website));
    rows.extend(self.events.iter().cloned().map(DataRow::Event));
    rows.extend(self.photos.iter().cloned().map(DataRow::Photo));
    rows.extend(self.groups.iter().cloned().map(DataRow::GroupMembership));
    rows
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A storage backend that persists one contact per [`commit`] call.
///
/// Transactional policy (all-or-nothing batches, retries) belongs to the
/// implementor.
///
/// [`commit`]: CommitAdapter::commit
pub trait CommitAdapter {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist the rows of a single contact. Never called with an empty batch.
  fn commit(&mut self, rows: Vec<DataRow>) -> Result<(), Self::Error>;
}

impl<C: CommitAdapter + ?Sized> CommitAdapter for &mut C {
  type Error = C::Error;

  fn commit(&mut self, rows: Vec<DataRow>) -> Result<(), Self::Error> {
    (**self).commit(rows)
  }
}

/// Keeps every committed batch in memory.
#[derive(Debug, Default)]
pub struct MemoryCommitter {
  batches: Vec<Vec<DataRow>>,
}

impl MemoryCommitter {
  pub fn new() -> Self { Self::default() }

  pub fn batches(&self) -> &[Vec<DataRow>] { &self.batches }

  pub fn into_batches(self) -> Vec<Vec<DataRow>> { self.batches }

  /// All committed rows of one kind, across batches.
  pub fn rows_of_kind<'a>(
    &'a self,
    kind: &'a str,
  ) -> impl Iterator<Item = &'a DataRow> + 'a {
    self
      .batches
      .iter()
      .flatten()
      .filter(move |row| row.discriminant() == kind)
  }
}

impl CommitAdapter for MemoryCommitter {
  type Error = Infallible;

  fn commit(&mut self, rows: Vec<DataRow>) -> Result<(), Self::Error> {
    self.batches.push(rows);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::contact::{EventType, PhoneType};

  fn sample_contact() -> Contact {
    Contact {
      name: Some(StructuredName {
        family: Some("Ando".to_string()),
        given: Some("Roid".to_string()),
        display_name: Some("Roid Ando".to_string()),
        ..Default::default()
      }),
      phones: vec![Phone {
        number:     "030-000-0000".to_string(),
        phone_type: PhoneType::Custom("VOICE".to_string()),
        primary:    true,
      }],
      notes: vec!["hello".to_string()],
      events: vec![Event {
        start_date: "19800101".to_string(),
        event_type: EventType::Birthday,
      }],
      photos: vec![Photo {
        bytes:   vec![0xff, 0xd8, 0xff],
        primary: true,
      }],
      ..Default::default()
    }
  }

  #[test]
  fn rows_follow_group_order() {
    let kinds: Vec<_> = sample_contact()
      .rows()
      .iter()
      .map(DataRow::discriminant)
      .collect();
    assert_eq!(kinds, vec!["structured_name", "phone", "note", "event", "photo"]);
  }

  #[test]
  fn empty_contact_yields_no_rows() {
    assert!(Contact::default().rows().is_empty());
    let blank_name = Contact {
      name: Some(StructuredName::default()),
      ..Default::default()
    };
    assert!(blank_name.rows().is_empty());
  }

  #[test]
  fn discriminants_are_listed() {
    for row in sample_contact().rows() {
      assert!(DATA_ROW_KINDS.contains(&row.discriminant()));
    }
  }

  #[test]
  fn to_json_and_from_parts_agree() {
    for row in sample_contact().rows() {
      let data = row.to_json().unwrap();
      let back = DataRow::from_parts(row.discriminant(), data).unwrap();
      assert_eq!(back, row);
    }
  }

  #[test]
  fn photo_payload_is_base64() {
    let row = DataRow::Photo(Photo {
      bytes:   vec![0xff, 0xd8, 0xff],
      primary: false,
    });
    let data = row.to_json().unwrap();
    assert_eq!(data["bytes"], "/9j/");
  }

  #[test]
  fn from_parts_rejects_unknown_kind() {
    let err = DataRow::from_parts("relation", serde_json::Value::Null)
      .unwrap_err();
    assert!(matches!(err, Error::UnknownRowKind(k) if k == "relation"));
  }

  #[test]
  fn memory_committer_keeps_batches() {
    let mut committer = MemoryCommitter::new();
    committer.commit(sample_contact().rows()).unwrap();
    committer.commit(vec![DataRow::Note("second".into())]).unwrap();
    assert_eq!(committer.batches().len(), 2);
    assert_eq!(committer.rows_of_kind("note").count(), 2);
    assert_eq!(committer.rows_of_kind("phone").count(), 1);
  }
}
