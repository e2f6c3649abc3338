//! TYPE-token tables for the non-phone fields, and small value helpers.

use cardport_core::contact::{EmailType, ImProtocol, PostalType, WebsiteType};

use crate::property::PropertyNode;

/// Tokens that never classify a value: the preference marker and the bare
/// 2.1 transfer-encoding shorthands.
const NEUTRAL_TOKENS: &[&str] =
  &["PREF", "QUOTED-PRINTABLE", "BASE64", "B", "7BIT", "8BIT"];

/// Postal tokens that describe delivery rather than the kind of address.
const DELIVERY_TOKENS: &[&str] = &["DOM", "INTL", "POSTAL", "PARCEL"];

/// `Some(value)` unless it is empty or only whitespace. The value itself is
/// kept as written.
pub(super) fn non_empty(value: &str) -> Option<String> {
  (!value.trim().is_empty()).then(|| value.to_string())
}

/// Like [`non_empty`], but the stored value is trimmed.
pub(super) fn trimmed(value: &str) -> Option<String> {
  non_empty(value.trim())
}

fn is_one_of(token: &str, table: &[&str]) -> bool {
  table.iter().any(|t| t.eq_ignore_ascii_case(token))
}

/// The classifying type tokens of `property`, in sorted order.
pub(super) fn labels(property: &PropertyNode) -> impl Iterator<Item = &str> {
  property
    .type_params
    .iter()
    .map(String::as_str)
    .filter(|t| !is_one_of(t, NEUTRAL_TOKENS))
}

pub(super) fn email_type(property: &PropertyNode) -> EmailType {
  if property.has_type("CELL") {
    EmailType::Mobile
  } else if property.has_type("HOME") {
    EmailType::Home
  } else if property.has_type("WORK") {
    EmailType::Work
  } else if property.has_type("OTHER") {
    EmailType::Other
  } else {
    labels(property)
      .next()
      .map_or(EmailType::Other, |t| EmailType::Custom(t.to_string()))
  }
}

pub(super) fn postal_type(property: &PropertyNode) -> PostalType {
  if property.has_type("HOME") {
    PostalType::Home
  } else if property.has_type("WORK") {
    PostalType::Work
  } else if property.has_type("OTHER") {
    PostalType::Other
  } else {
    labels(property)
      .find(|t| !is_one_of(t, DELIVERY_TOKENS))
      .map_or(PostalType::Home, |t| PostalType::Custom(t.to_string()))
  }
}

pub(super) fn website_type(property: &PropertyNode) -> WebsiteType {
  labels(property)
    .find_map(|t| match t.to_ascii_uppercase().as_str() {
      "BLOG" => Some(WebsiteType::Blog),
      "PROFILE" => Some(WebsiteType::Profile),
      "HOME" => Some(WebsiteType::Home),
      "WORK" => Some(WebsiteType::Work),
      "FTP" => Some(WebsiteType::Ftp),
      "OTHER" => Some(WebsiteType::Other),
      _ => None,
    })
    .unwrap_or_default()
}

/// The network carried by a dedicated `X-` IM property.
pub(super) fn im_property(name: &str) -> Option<ImProtocol> {
  Some(match name {
    "X-AIM" => ImProtocol::Aim,
    "X-MSN" => ImProtocol::Msn,
    "X-YAHOO" => ImProtocol::Yahoo,
    "X-ICQ" => ImProtocol::Icq,
    "X-JABBER" => ImProtocol::Jabber,
    "X-SKYPE-USERNAME" => ImProtocol::Skype,
    "X-GOOGLE-TALK" => ImProtocol::GoogleTalk,
    "X-QQ" => ImProtocol::Qq,
    _ => return None,
  })
}

/// The network named by an `IMPP` URI scheme.
pub(super) fn im_scheme(scheme: &str) -> ImProtocol {
  match scheme.trim().to_ascii_lowercase().as_str() {
    "aim" => ImProtocol::Aim,
    "msn" | "msnim" => ImProtocol::Msn,
    "ymsgr" | "yahoo" => ImProtocol::Yahoo,
    "icq" => ImProtocol::Icq,
    "xmpp" | "jabber" => ImProtocol::Jabber,
    "skype" | "callto" => ImProtocol::Skype,
    "gtalk" => ImProtocol::GoogleTalk,
    "qq" => ImProtocol::Qq,
    other => ImProtocol::Custom(other.to_string()),
  }
}
