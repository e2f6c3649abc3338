//! Name accumulation and display-name composition.

use cardport_core::contact::StructuredName;

use super::types::non_empty;
use crate::VCardType;

/// Order in which name parts are joined into a display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameOrder {
  /// prefix given middle family suffix
  Western,
  /// prefix family middle given suffix
  Japanese,
}

impl NameOrder {
  /// Japanese order applies only under a Japanese selector and only when
  /// one of `parts` holds something other than printable ASCII
  /// (U+0020..=U+007E). Everything else stays western.
  pub fn select(vcard_type: VCardType, parts: &[Option<&str>]) -> Self {
    let needs_flip = parts.iter().flatten().any(|p| !is_printable_ascii(p));
    if vcard_type.is_japanese() && needs_flip {
      Self::Japanese
    } else {
      Self::Western
    }
  }

  /// Join the present parts with single spaces; `None` when nothing is set.
  pub fn compose(
    self,
    prefix: Option<&str>,
    given: Option<&str>,
    middle: Option<&str>,
    family: Option<&str>,
    suffix: Option<&str>,
  ) -> Option<String> {
    let ordered = match self {
      Self::Western => [prefix, given, middle, family, suffix],
      Self::Japanese => [prefix, family, middle, given, suffix],
    };
    let parts: Vec<&str> = ordered.into_iter().flatten().collect();
    (!parts.is_empty()).then(|| parts.join(" "))
  }
}

fn is_printable_ascii(s: &str) -> bool {
  s.chars().all(|c| (' '..='~').contains(&c))
}

/// Collects the name-related properties of one entry.
///
/// The first `N` and the first `FN` win; later occurrences are ignored.
#[derive(Debug, Default)]
pub(super) struct NameAccum {
  family:          Option<String>,
  given:           Option<String>,
  middle:          Option<String>,
  prefix:          Option<String>,
  suffix:          Option<String>,
  phonetic_family: Option<String>,
  phonetic_given:  Option<String>,
  phonetic_middle: Option<String>,
  formatted:       Option<String>,
  seen_n:          bool,
}

impl NameAccum {
  /// `N`: family;given;middle;prefix;suffix. Missing slots are empty.
  pub fn structured(&mut self, slots: &[&str]) {
    if self.seen_n {
      return;
    }
    self.seen_n = true;
    let slot = |i: usize| slots.get(i).and_then(|s| non_empty(s));
    self.family = slot(0);
    self.given = slot(1);
    self.middle = slot(2);
    self.prefix = slot(3);
    self.suffix = slot(4);
  }

  pub fn formatted(&mut self, value: &str) {
    if self.formatted.is_none() {
      self.formatted = non_empty(value);
    }
  }

  /// `SOUND;X-IRMC-N`: the value is split here, not by the line parser.
  /// Slots already set by an `X-PHONETIC-*` property are kept.
  pub fn sound(&mut self, value: &str) {
    let mut slots = value.split(';');
    for field in [
      &mut self.phonetic_family,
      &mut self.phonetic_given,
      &mut self.phonetic_middle,
    ] {
      let next = slots.next().and_then(non_empty);
      if field.is_none() {
        *field = next;
      }
    }
  }

  pub fn phonetic_given(&mut self, value: &str) {
    self.phonetic_given = non_empty(value).or(self.phonetic_given.take());
  }

  pub fn phonetic_middle(&mut self, value: &str) {
    self.phonetic_middle = non_empty(value).or(self.phonetic_middle.take());
  }

  pub fn phonetic_family(&mut self, value: &str) {
    self.phonetic_family = non_empty(value).or(self.phonetic_family.take());
  }

  /// Build the name group. The display name is `FN`, else the composed
  /// name, else the composed phonetic name, else `fallback`.
  pub fn finish(
    self,
    vcard_type: VCardType,
    fallback: impl FnOnce() -> Option<String>,
  ) -> Option<StructuredName> {
    let (family, given, middle) = (
      self.family.as_deref(),
      self.given.as_deref(),
      self.middle.as_deref(),
    );
    let composed = || {
      NameOrder::select(vcard_type, &[family, middle, given]).compose(
        self.prefix.as_deref(),
        given,
        middle,
        family,
        self.suffix.as_deref(),
      )
    };
    let (p_family, p_given, p_middle) = (
      self.phonetic_family.as_deref(),
      self.phonetic_given.as_deref(),
      self.phonetic_middle.as_deref(),
    );
    let phonetic = || {
      NameOrder::select(vcard_type, &[p_family, p_middle, p_given])
        .compose(None, p_given, p_middle, p_family, None)
    };
    let display_name = self
      .formatted
      .clone()
      .or_else(composed)
      .or_else(phonetic)
      .or_else(fallback);

    let name = StructuredName {
      family: self.family,
      given: self.given,
      middle: self.middle,
      prefix: self.prefix,
      suffix: self.suffix,
      phonetic_family: self.phonetic_family,
      phonetic_given: self.phonetic_given,
      phonetic_middle: self.phonetic_middle,
      display_name,
    };
    (!name.is_empty()).then_some(name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn western_order_skips_missing_parts() {
    let name = NameOrder::Western.compose(Some("Pos"), Some("Forrest"), None, Some("Gump"), Some("Tao"));
    assert_eq!(name.as_deref(), Some("Pos Forrest Gump Tao"));
    assert_eq!(NameOrder::Western.compose(None, None, None, None, None), None);
  }

  #[test]
  fn ascii_never_flips() {
    let parts = [Some("Ando"), None, Some("Roid")];
    for t in VCardType::ALL {
      assert_eq!(NameOrder::select(t, &parts), NameOrder::Western);
    }
  }

  #[test]
  fn non_ascii_flips_only_for_japanese_types() {
    let parts = [Some("安藤"), None, Some("ロイド")];
    assert_eq!(NameOrder::select(VCardType::V21Japanese, &parts), NameOrder::Japanese);
    assert_eq!(NameOrder::select(VCardType::V21JapaneseUtf8, &parts), NameOrder::Japanese);
    assert_eq!(NameOrder::select(VCardType::V21Generic, &parts), NameOrder::Western);
    // Latin-1 letters are not printable ASCII either.
    assert_eq!(
      NameOrder::select(VCardType::V21Japanese, &[Some("Müller")]),
      NameOrder::Japanese
    );
  }

  #[test]
  fn formatted_beats_structured() {
    let mut acc = NameAccum::default();
    acc.structured(&["Gump", "Forrest", "Hoge", "Pos", "Tao"]);
    acc.formatted("Joe Due");
    let name = acc.finish(VCardType::V21Generic, || None).unwrap();
    assert_eq!(name.display_name.as_deref(), Some("Joe Due"));
    assert_eq!(name.middle.as_deref(), Some("Hoge"));
  }

  #[test]
  fn first_n_wins() {
    let mut acc = NameAccum::default();
    acc.structured(&["Ando", "Roid"]);
    acc.structured(&["Other", "Person"]);
    let name = acc.finish(VCardType::V21Generic, || None).unwrap();
    assert_eq!(name.display_name.as_deref(), Some("Roid Ando"));
  }

  #[test]
  fn sound_fills_phonetic_slots() {
    let mut acc = NameAccum::default();
    acc.phonetic_given("Explicit");
    acc.sound("ｱﾝﾄﾞｳ;ﾛｲﾄﾞ1;;;");
    let name = acc.finish(VCardType::V21Generic, || None).unwrap();
    assert_eq!(name.phonetic_family.as_deref(), Some("ｱﾝﾄﾞｳ"));
    assert_eq!(name.phonetic_given.as_deref(), Some("Explicit"));
    assert_eq!(name.phonetic_middle, None);
    // No N or FN: the phonetic name becomes the display name.
    assert_eq!(name.display_name.as_deref(), Some("Explicit ｱﾝﾄﾞｳ"));
  }

  #[test]
  fn fallback_only_when_nothing_else() {
    let acc = NameAccum::default();
    let name = acc.finish(VCardType::V21Generic, || Some("a@example.com".into()));
    assert_eq!(name.unwrap().display_name.as_deref(), Some("a@example.com"));
    assert_eq!(NameAccum::default().finish(VCardType::V21Generic, || None), None);
  }
}
