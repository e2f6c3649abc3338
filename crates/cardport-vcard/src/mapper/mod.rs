//! [`VNode`] → [`Contact`].
//!
//! The mapper is a pure function of one entry's property list. Properties it
//! does not know are skipped; values that are empty after decoding are never
//! stored. Nothing here can fail.

mod name;
mod phone;
mod types;

use cardport_core::contact::{
  Contact, Email, Event, EventType, GroupMembership, Im, ImProtocol,
  Organization, Phone, Photo, PostalAddress, Website,
};
pub use name::NameOrder;
pub use phone::PhoneFormat;
use types::{non_empty, trimmed};

use crate::{
  VCardType,
  property::{PropertyNode, PropertyValue, VNode},
};

/// Maps finished entries to contacts under the locale rules of one
/// [`VCardType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContactMapper {
  vcard_type:   VCardType,
  phone_format: PhoneFormat,
}

impl ContactMapper {
  pub fn new(vcard_type: VCardType) -> Self {
    Self {
      vcard_type,
      phone_format: PhoneFormat::for_type(vcard_type),
    }
  }

  pub fn vcard_type(&self) -> VCardType { self.vcard_type }

  pub fn map(&self, node: &VNode) -> Contact {
    let mut draft = Draft {
      mapper:  *self,
      name:    name::NameAccum::default(),
      contact: Contact::default(),
    };
    for property in node {
      draft.apply(property);
    }
    draft.finish()
  }
}

// ─── Value access ────────────────────────────────────────────────────────────

fn text(property: &PropertyNode) -> Option<&str> {
  match &property.value {
    PropertyValue::Text(text) => Some(text),
    _ => None,
  }
}

/// Positional slots; a scalar value is a single slot.
fn slots(property: &PropertyNode) -> Vec<&str> {
  match &property.value {
    PropertyValue::Structured(slots) => slots.iter().map(String::as_str).collect(),
    PropertyValue::Text(text) => vec![text.as_str()],
    PropertyValue::Binary(_) => Vec::new(),
  }
}

/// Comma-separated list values (`NICKNAME`, `CATEGORIES`).
fn list(property: &PropertyNode) -> impl Iterator<Item = String> + '_ {
  text(property)
    .into_iter()
    .flat_map(|v| v.split(','))
    .filter_map(trimmed)
}

// ─── Accumulation ────────────────────────────────────────────────────────────

struct Draft {
  mapper:  ContactMapper,
  name:    name::NameAccum,
  contact: Contact,
}

impl Draft {
  fn apply(&mut self, p: &PropertyNode) {
    match p.name.as_str() {
      "N" => self.name.structured(&slots(p)),
      "FN" => {
        if let Some(v) = text(p) {
          self.name.formatted(v);
        }
      }
      "SOUND" if p.has_type("X-IRMC-N") => {
        if let Some(v) = text(p) {
          self.name.sound(v);
        }
      }
      "X-PHONETIC-FIRST-NAME" => self.name.phonetic_given(text(p).unwrap_or_default()),
      "X-PHONETIC-MIDDLE-NAME" => self.name.phonetic_middle(text(p).unwrap_or_default()),
      "X-PHONETIC-LAST-NAME" => self.name.phonetic_family(text(p).unwrap_or_default()),
      "NICKNAME" => self.contact.nicknames.extend(list(p)),

      "TEL" => self.phone(p),
      "EMAIL" => self.email(p),
      "ADR" => self.address(p),

      "ORG" => self.organization(p),
      "TITLE" => self.org_slot(p, |o| &mut o.title),
      "ROLE" => self.org_slot(p, |o| &mut o.role),

      "NOTE" => {
        if let Some(note) = text(p).and_then(non_empty) {
          self.contact.notes.push(note);
        }
      }
      "URL" => {
        if let Some(url) = text(p).and_then(trimmed) {
          self.contact.websites.push(Website {
            url,
            website_type: types::website_type(p),
          });
        }
      }
      "BDAY" => self.event(p, EventType::Birthday),
      "ANNIVERSARY" | "X-ANNIVERSARY" => self.event(p, EventType::Anniversary),
      "PHOTO" => self.photo(p),
      "CATEGORIES" => {
        let groups = list(p).map(|title| GroupMembership { title });
        self.contact.groups.extend(groups);
      }
      "IMPP" => self.impp(p),
      other => match types::im_property(other) {
        Some(protocol) => self.im(p, protocol, text(p)),
        None => tracing::trace!(property = other, "property not mapped"),
      },
    }
  }

  fn phone(&mut self, p: &PropertyNode) {
    let Some(number) = text(p).and_then(trimmed) else { return };
    self.contact.phones.push(Phone {
      number:     self.mapper.phone_format.format(&number),
      phone_type: phone::phone_type(p),
      primary:    p.is_pref(),
    });
  }

  fn email(&mut self, p: &PropertyNode) {
    let Some(address) = text(p).and_then(trimmed) else { return };
    self.contact.emails.push(Email {
      address,
      email_type: types::email_type(p),
      primary: p.is_pref(),
    });
  }

  /// `ADR`: pobox;extended;street;city;region;postcode;country.
  fn address(&mut self, p: &PropertyNode) {
    let slots = slots(p);
    let [pobox, neighborhood, street, city, region, postcode, country] =
      std::array::from_fn(|i| slots.get(i).and_then(|s| non_empty(s)));

    let mut parts: Vec<&str> = [
      &pobox,
      &neighborhood,
      &street,
      &city,
      &region,
      &postcode,
      &country,
    ]
    .into_iter()
    .flatten()
    .map(String::as_str)
    .collect();
    if parts.is_empty() {
      return;
    }
    if self.mapper.vcard_type.is_japanese() {
      parts.reverse();
    }
    let formatted_address = Some(parts.join(" "));

    self.contact.addresses.push(PostalAddress {
      pobox,
      neighborhood,
      street,
      city,
      region,
      postcode,
      country,
      formatted_address,
      postal_type: types::postal_type(p),
      primary: p.is_pref(),
    });
  }

  /// `ORG` fills the first organization that has neither company nor
  /// department yet (one opened by an earlier `TITLE`), else opens a new one.
  fn organization(&mut self, p: &PropertyNode) {
    let slots = slots(p);
    let company = slots.first().and_then(|s| non_empty(s));
    let rest: Vec<&str> = slots
      .iter()
      .skip(1)
      .copied()
      .filter(|s| !s.trim().is_empty())
      .collect();
    let department = (!rest.is_empty()).then(|| rest.join(" "));
    if company.is_none() && department.is_none() {
      return;
    }

    let primary = p.is_pref();
    let open = self
      .contact
      .organizations
      .iter_mut()
      .find(|o| o.company.is_none() && o.department.is_none());
    match open {
      Some(org) => {
        org.company = company;
        org.department = department;
        org.primary |= primary;
      }
      None => self.contact.organizations.push(Organization {
        company,
        department,
        primary,
        ..Organization::default()
      }),
    }
  }

  /// `TITLE`/`ROLE` fill the first organization whose slot is still empty,
  /// else open a new organization holding only that slot.
  fn org_slot(
    &mut self,
    p: &PropertyNode,
    slot: fn(&mut Organization) -> &mut Option<String>,
  ) {
    let Some(value) = text(p).and_then(non_empty) else { return };
    for org in &mut self.contact.organizations {
      let field = slot(org);
      if field.is_none() {
        *field = Some(value);
        return;
      }
    }
    let mut org = Organization::default();
    *slot(&mut org) = Some(value);
    self.contact.organizations.push(org);
  }

  fn event(&mut self, p: &PropertyNode, event_type: EventType) {
    if let Some(start_date) = text(p).and_then(non_empty) {
      self.contact.events.push(Event {
        start_date,
        event_type,
      });
    }
  }

  fn photo(&mut self, p: &PropertyNode) {
    match p.byte_value() {
      Some(bytes) if !bytes.is_empty() => {
        let primary = self.contact.photos.is_empty();
        self.contact.photos.push(Photo {
          bytes: bytes.to_vec(),
          primary,
        });
      }
      _ => tracing::debug!("PHOTO without an inline binary payload skipped"),
    }
  }

  /// `IMPP:scheme:handle`.
  fn impp(&mut self, p: &PropertyNode) {
    match text(p).and_then(|v| v.split_once(':')) {
      Some((scheme, handle)) => self.im(p, types::im_scheme(scheme), Some(handle)),
      None => tracing::debug!("IMPP value without a URI scheme skipped"),
    }
  }

  fn im(&mut self, p: &PropertyNode, protocol: ImProtocol, handle: Option<&str>) {
    if let Some(handle) = handle.and_then(trimmed) {
      self.contact.ims.push(Im {
        handle,
        protocol,
        primary: p.is_pref(),
      });
    }
  }

  fn finish(mut self) -> Contact {
    let name = self.name.finish(self.mapper.vcard_type, || {
      fallback_display_name(&self.contact)
    });
    self.contact.name = name;
    self.contact
  }
}

/// Display name for an entry with no name properties at all.
fn fallback_display_name(contact: &Contact) -> Option<String> {
  contact
    .emails
    .first()
    .map(|e| e.address.clone())
    .or_else(|| contact.phones.first().map(|p| p.number.clone()))
    .or_else(|| {
      contact
        .addresses
        .first()
        .and_then(|a| a.formatted_address.clone())
    })
}

#[cfg(test)]
mod tests {
  use cardport_core::contact::{
    EmailType, OrganizationType, PhoneType, PostalType, WebsiteType,
  };
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::{
    options::Dialect,
    property::PropertyParser,
    unfold::LogicalLine,
  };

  fn entry(lines: &[&str]) -> VNode {
    let parser = PropertyParser::new(Dialect::V21, "UTF-8");
    let properties = lines
      .iter()
      .enumerate()
      .map(|(i, l)| {
        parser
          .parse(&LogicalLine {
            number: i + 1,
            bytes:  l.as_bytes().to_vec(),
          })
          .unwrap()
      })
      .collect();
    VNode { properties }
  }

  fn generic(lines: &[&str]) -> Contact {
    ContactMapper::new(VCardType::V21Generic).map(&entry(lines))
  }

  fn japanese(lines: &[&str]) -> Contact {
    ContactMapper::new(VCardType::V21Japanese).map(&entry(lines))
  }

  // ── Names ─────────────────────────────────────────────────────────────────

  #[test]
  fn fn_wins_over_n() {
    let c = generic(&["FN:Joe Due", "N:Gump;Forrest;Hoge;Pos;Tao"]);
    let name = c.name.unwrap();
    assert_eq!(name.display_name.as_deref(), Some("Joe Due"));
    assert_eq!(name.family.as_deref(), Some("Gump"));
    assert_eq!(name.suffix.as_deref(), Some("Tao"));
  }

  #[test]
  fn ascii_n_composes_given_first_in_every_mode() {
    for t in VCardType::ALL {
      let c = ContactMapper::new(t).map(&entry(&["N:Ando;Roid;"]));
      assert_eq!(c.display_name(), Some("Roid Ando"), "{t}");
    }
  }

  #[test]
  fn japanese_mode_flips_non_ascii_names() {
    let lines = ["N:安藤;ロイド;;;"];
    assert_eq!(japanese(&lines).display_name(), Some("安藤 ロイド"));
    assert_eq!(generic(&lines).display_name(), Some("ロイド 安藤"));
  }

  #[test]
  fn sound_is_split_into_phonetic_name() {
    let c = generic(&["N:安藤;ロイド1;;;", "SOUND;X-IRMC-N:ｱﾝﾄﾞｳ;ﾛｲﾄﾞ1;;;"]);
    let name = c.name.unwrap();
    assert_eq!(name.phonetic_family.as_deref(), Some("ｱﾝﾄﾞｳ"));
    assert_eq!(name.phonetic_given.as_deref(), Some("ﾛｲﾄﾞ1"));
  }

  #[test]
  fn sound_without_irmc_type_is_ignored() {
    assert!(generic(&["SOUND:beep.wav"]).is_empty());
  }

  #[test]
  fn display_name_falls_back_to_email() {
    let c = generic(&["TEL:1", "EMAIL:a@example.com"]);
    assert_eq!(c.display_name(), Some("a@example.com"));
    let name = c.name.unwrap();
    assert_eq!(name.family, None);
  }

  #[test]
  fn nicknames_split_on_commas() {
    let c = generic(&["NICKNAME:Bob, Bobby,,"]);
    assert_eq!(c.nicknames, ["Bob", "Bobby"]);
  }

  // ── Phones and emails ─────────────────────────────────────────────────────

  #[test]
  fn pref_marks_each_occurrence_primary() {
    let c = generic(&[
      "TEL;HOME:1",
      "TEL;WORK;PREF:2",
      "TEL;ISDN:3",
      "EMAIL;PREF;HOME:test@example.com",
      "EMAIL;CELL;PREF:test2@examination.com",
    ]);
    let phones: Vec<_> = c
      .phones
      .iter()
      .map(|p| (p.number.as_str(), &p.phone_type, p.primary))
      .collect();
    assert_eq!(phones, [
      ("1", &PhoneType::Home, false),
      ("2", &PhoneType::Work, true),
      ("3", &PhoneType::Isdn, false),
    ]);
    let emails: Vec<_> = c.emails.iter().map(|e| (&e.email_type, e.primary)).collect();
    assert_eq!(emails, [(&EmailType::Home, true), (&EmailType::Mobile, true)]);
    assert_eq!(c.primary_phone().map(|p| p.number.as_str()), Some("2"));
  }

  #[test]
  fn pref_parameter_also_marks_primary() {
    let c = generic(&["EMAIL;PREF=1:a@example.com"]);
    assert!(c.emails[0].primary);
  }

  #[test]
  fn phone_format_follows_vcard_type() {
    let lines = ["TEL;PREF;VOICE:0300000000"];
    assert_eq!(generic(&lines).phones[0].number, "030-000-0000");
    let c = japanese(&lines);
    assert_eq!(c.phones[0], Phone {
      number:     "03-0000-0000".to_string(),
      phone_type: PhoneType::Custom("VOICE".to_string()),
      primary:    true,
    });
  }

  #[test]
  fn blank_values_are_dropped() {
    let c = generic(&[
      "TEL: ", "EMAIL:", "NOTE:  ", "URL:", "BDAY:", "ORG:;;", "ADR:;;;;;;",
    ]);
    assert!(c.is_empty());
  }

  // ── Addresses ─────────────────────────────────────────────────────────────

  #[test]
  fn address_slots_and_formatted_address() {
    let c = generic(&["ADR;WORK;PARCEL:;;100 Waters Edge;Baytown;LA;30314;USA"]);
    let adr = &c.addresses[0];
    assert_eq!(adr.street.as_deref(), Some("100 Waters Edge"));
    assert_eq!(adr.pobox, None);
    assert_eq!(adr.postal_type, PostalType::Work);
    assert_eq!(
      adr.formatted_address.as_deref(),
      Some("100 Waters Edge Baytown LA 30314 USA")
    );
  }

  #[test]
  fn japanese_formatted_address_is_reversed() {
    let lines = ["ADR;HOME:;渋谷区桜丘町26-1;;;;150-8512;"];
    let adr = &japanese(&lines).addresses[0];
    assert_eq!(adr.formatted_address.as_deref(), Some("150-8512 渋谷区桜丘町26-1"));
    assert_eq!(adr.neighborhood.as_deref(), Some("渋谷区桜丘町26-1"));
    let adr = &generic(&lines).addresses[0];
    assert_eq!(adr.formatted_address.as_deref(), Some("渋谷区桜丘町26-1 150-8512"));
  }

  #[test]
  fn short_address_is_padded() {
    let c = generic(&["ADR:;;Main St"]);
    assert_eq!(c.addresses[0].street.as_deref(), Some("Main St"));
    assert_eq!(c.addresses[0].country, None);
    assert_eq!(c.addresses[0].postal_type, PostalType::Home);
  }

  // ── Organizations ─────────────────────────────────────────────────────────

  #[test]
  fn org_then_title_pair_up() {
    let c = generic(&[
      "ORG:Company;Organization;Devision;Room;Sheet No.",
      "TITLE:Excellent Janitor",
    ]);
    assert_eq!(c.organizations, [Organization {
      company: Some("Company".into()),
      department: Some("Organization Devision Room Sheet No.".into()),
      title: Some("Excellent Janitor".into()),
      ..Organization::default()
    }]);
    assert_eq!(c.organizations[0].org_type, OrganizationType::Work);
  }

  #[test]
  fn title_before_org_still_pairs() {
    let c = generic(&["TITLE:Cool Title", "ORG:Marverous;Perfect;Great;Good;Bad;Poor"]);
    assert_eq!(c.organizations.len(), 1);
    assert_eq!(c.organizations[0].company.as_deref(), Some("Marverous"));
    assert_eq!(c.organizations[0].title.as_deref(), Some("Cool Title"));
  }

  #[test]
  fn repeated_pairs_stay_in_declaration_order() {
    let c = generic(&[
      "ORG:Company",
      "TITLE:Engineer",
      "ORG:Mystery",
      "TITLE:Blogger",
      "ROLE:Reviewer",
    ]);
    let orgs: Vec<_> = c
      .organizations
      .iter()
      .map(|o| (o.company.as_deref(), o.title.as_deref(), o.role.as_deref()))
      .collect();
    assert_eq!(orgs, [
      (Some("Company"), Some("Engineer"), Some("Reviewer")),
      (Some("Mystery"), Some("Blogger"), None),
    ]);
  }

  #[test]
  fn unmatched_title_keeps_its_own_organization() {
    let c = generic(&["ORG:A", "TITLE:One", "TITLE:Two"]);
    assert_eq!(c.organizations.len(), 2);
    assert_eq!(c.organizations[1].company, None);
    assert_eq!(c.organizations[1].title.as_deref(), Some("Two"));
  }

  #[test]
  fn department_keeps_slot_whitespace() {
    let c = generic(&["ORG:Open;Handset; Alliance"]);
    assert_eq!(c.organizations[0].department.as_deref(), Some("Handset  Alliance"));
  }

  // ── Everything else ───────────────────────────────────────────────────────

  #[test]
  fn one_to_one_fields() {
    let c = generic(&[
      "NOTE:first",
      "NOTE:second",
      "URL;BLOG:https://blog.example.com/ ",
      "BDAY:19800101",
      "X-ANNIVERSARY:2001-06-30",
      "CATEGORIES:Friends,Work",
    ]);
    assert_eq!(c.notes, ["first", "second"]);
    assert_eq!(c.websites, [Website {
      url:          "https://blog.example.com/".into(),
      website_type: WebsiteType::Blog,
    }]);
    assert_eq!(c.events[0].start_date, "19800101");
    assert_eq!(c.events[0].event_type, EventType::Birthday);
    assert_eq!(c.events[1].event_type, EventType::Anniversary);
    assert!(c.events[1].date().is_some());
    let groups: Vec<_> = c.groups.iter().map(|g| g.title.as_str()).collect();
    assert_eq!(groups, ["Friends", "Work"]);
  }

  #[test]
  fn instant_messaging() {
    let c = generic(&[
      "X-AIM:aimuser",
      "X-SKYPE-USERNAME;PREF: skyper ",
      "IMPP:xmpp:alice@example.org",
      "IMPP:matrix:@bob:example.org",
      "IMPP:no-scheme",
    ]);
    let ims: Vec<_> = c
      .ims
      .iter()
      .map(|i| (&i.protocol, i.handle.as_str(), i.primary))
      .collect();
    assert_eq!(ims, [
      (&ImProtocol::Aim, "aimuser", false),
      (&ImProtocol::Skype, "skyper", true),
      (&ImProtocol::Jabber, "alice@example.org", false),
      (&ImProtocol::Custom("matrix".into()), "@bob:example.org", false),
    ]);
  }

  #[test]
  fn first_photo_is_primary() {
    let c = generic(&[
      "PHOTO;ENCODING=BASE64;TYPE=JPEG:/9j/4AAQ",
      "PHOTO;VALUE=URL:http://example.com/a.jpg",
      "PHOTO;ENCODING=B:YWI=",
    ]);
    assert_eq!(c.photos.len(), 2);
    assert_eq!(c.photos[0].bytes, [0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10]);
    assert!(c.photos[0].primary);
    assert!(!c.photos[1].primary);
  }

  #[test]
  fn bare_b_token_photo_is_kept() {
    let c = generic(&["PHOTO;JPEG;B:YWI="]);
    assert_eq!(c.photos, [Photo {
      bytes:   b"ab".to_vec(),
      primary: true,
    }]);
  }

  #[test]
  fn unknown_properties_are_skipped() {
    let c = generic(&["X-CLASS:PUBLIC", "GEO:35.6,139.6", "REV:20080424T195243Z"]);
    assert!(c.is_empty());
  }

  #[test]
  fn mapping_is_idempotent() {
    let node = entry(&["FN:x", "TEL;CELL:5551212", "ORG:A;B"]);
    let mapper = ContactMapper::new(VCardType::V21Generic);
    assert_eq!(mapper.map(&node), mapper.map(&node));
  }
}
