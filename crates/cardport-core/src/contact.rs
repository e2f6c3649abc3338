//! The normalized contact record.
//!
//! A [`Contact`] is not one flat struct but a bundle of independently
//! zero-or-many field groups. Every string field is `Option` and the mapper
//! never stores an empty string; a group whose fields are all unset is never
//! constructed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ─── Labels ──────────────────────────────────────────────────────────────────

/// Classification of a telephone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhoneType {
  Home,
  Mobile,
  Work,
  FaxWork,
  FaxHome,
  Pager,
  Callback,
  Car,
  Isdn,
  Radio,
  Telex,
  TtyTdd,
  Assistant,
  Mms,
  Other,
  /// A `TYPE` token outside the fixed table, kept as written.
  Custom(String),
}

/// Classification of an email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailType {
  Home,
  Work,
  Mobile,
  Other,
  Custom(String),
}

/// Classification of a postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostalType {
  Home,
  Work,
  Other,
  Custom(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationType {
  #[default]
  Work,
  Other,
}

/// Instant-messaging network of an [`Im`] entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImProtocol {
  Aim,
  Msn,
  Yahoo,
  Skype,
  Qq,
  GoogleTalk,
  Icq,
  Jabber,
  /// An `IMPP` URI scheme with no dedicated variant.
  Custom(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebsiteType {
  #[default]
  Homepage,
  Blog,
  Profile,
  Home,
  Work,
  Ftp,
  Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
  Birthday,
  Anniversary,
}

// ─── Field groups ────────────────────────────────────────────────────────────

/// Structured and display name (vCard `N`, `FN`, `SOUND;X-IRMC-N`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredName {
  pub family:          Option<String>,
  pub given:           Option<String>,
  pub middle:          Option<String>,
  pub prefix:          Option<String>,
  pub suffix:          Option<String>,
  pub phonetic_family: Option<String>,
  pub phonetic_given:  Option<String>,
  pub phonetic_middle: Option<String>,
  /// `FN` verbatim, or a name composed from the other fields.
  pub display_name:    Option<String>,
}

impl StructuredName {
  pub fn is_empty(&self) -> bool { *self == Self::default() }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phone {
  /// Number after locale-specific grouping.
  pub number:     String,
  pub phone_type: PhoneType,
  pub primary:    bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
  pub address:    String,
  pub email_type: EmailType,
  pub primary:    bool,
}

/// A postal address (vCard `ADR`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
  pub pobox:             Option<String>,
  /// The vCard "extended address" slot.
  pub neighborhood:      Option<String>,
  pub street:            Option<String>,
  pub city:              Option<String>,
  pub region:            Option<String>,
  pub postcode:          Option<String>,
  pub country:           Option<String>,
  pub formatted_address: Option<String>,
  pub postal_type:       PostalType,
  pub primary:           bool,
}

/// One organization record built by pairing `ORG` with `TITLE`/`ROLE`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
  pub company:    Option<String>,
  /// Every `ORG` segment after the first, joined with single spaces.
  pub department: Option<String>,
  pub title:      Option<String>,
  pub role:       Option<String>,
  pub org_type:   OrganizationType,
  pub primary:    bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Im {
  pub handle:   String,
  pub protocol: ImProtocol,
  pub primary:  bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Website {
  pub url:          String,
  pub website_type: WebsiteType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
  /// The date exactly as it appeared in the vCard.
  pub start_date: String,
  pub event_type: EventType,
}

impl Event {
  /// Best-effort calendar date for `YYYYMMDD` and `YYYY-MM-DD` values.
  pub fn date(&self) -> Option<NaiveDate> {
    let raw = self.start_date.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
      .or_else(|_| NaiveDate::parse_from_str(raw, "%Y%m%d"))
      .ok()
  }
}

/// Raw image bytes. No image-format metadata is retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
  #[serde(with = "crate::base64_bytes")]
  pub bytes:   Vec<u8>,
  pub primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
  pub title: String,
}

// ─── Contact ─────────────────────────────────────────────────────────────────

/// Everything the mapper extracted from one vCard entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
  pub name:          Option<StructuredName>,
  pub nicknames:     Vec<String>,
  pub phones:        Vec<Phone>,
  pub emails:        Vec<Email>,
  pub addresses:     Vec<PostalAddress>,
  pub organizations: Vec<Organization>,
  pub ims:           Vec<Im>,
  pub notes:         Vec<String>,
  pub websites:      Vec<Website>,
  pub events:        Vec<Event>,
  pub photos:        Vec<Photo>,
  pub groups:        Vec<GroupMembership>,
}

impl Contact {
  /// True when the entry produced no field group at all.
  pub fn is_empty(&self) -> bool { *self == Self::default() }

  /// The display name, if one was present or could be derived.
  pub fn display_name(&self) -> Option<&str> {
    self.name.as_ref()?.display_name.as_deref()
  }

  pub fn primary_phone(&self) -> Option<&Phone> {
    self.phones.iter().find(|p| p.primary)
  }

  pub fn primary_email(&self) -> Option<&Email> {
    self.emails.iter().find(|e| e.primary)
  }
}
