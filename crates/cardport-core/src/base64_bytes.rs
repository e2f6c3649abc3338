//! Serde adapter that renders binary payloads as standard base64 strings.
//!
//! Use with `#[serde(with = "cardport_core::base64_bytes")]`.

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

pub fn serialize<S: Serializer>(
  bytes: &[u8],
  serializer: S,
) -> Result<S::Ok, S::Error> {
  serializer.serialize_str(&B64.encode(bytes))
}

pub fn deserialize<'de, D: Deserializer<'de>>(
  deserializer: D,
) -> Result<Vec<u8>, D::Error> {
  let encoded = String::deserialize(deserializer)?;
  B64.decode(encoded.as_bytes()).map_err(D::Error::custom)
}
