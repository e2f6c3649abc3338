//! The callback protocol the entry parser emits through, and the stock
//! builders.

use cardport_core::{
  commit::CommitAdapter,
  contact::Contact,
};

use crate::{
  mapper::ContactMapper,
  property::{PropertyNode, VNode},
};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Receives parse events for every entry, in stream order.
///
/// Each callback runs to completion before the parser reads the next line.
pub trait EntryBuilder {
  /// A `BEGIN:VCARD` line was accepted.
  fn on_entry_start(&mut self) {}

  fn on_property(&mut self, property: &PropertyNode);

  /// The matching `END:VCARD` line was accepted.
  fn on_entry_end(&mut self) {}
}

impl<B: EntryBuilder + ?Sized> EntryBuilder for &mut B {
  fn on_entry_start(&mut self) { (**self).on_entry_start() }

  fn on_property(&mut self, property: &PropertyNode) {
    (**self).on_property(property)
  }

  fn on_entry_end(&mut self) { (**self).on_entry_end() }
}

impl<B: EntryBuilder + ?Sized> EntryBuilder for Box<B> {
  fn on_entry_start(&mut self) { (**self).on_entry_start() }

  fn on_property(&mut self, property: &PropertyNode) {
    (**self).on_property(property)
  }

  fn on_entry_end(&mut self) { (**self).on_entry_end() }
}

// ─── Fan-out ─────────────────────────────────────────────────────────────────

/// Forwards every event to each registered builder, in registration order.
#[derive(Default)]
pub struct BuilderSet<'a> {
  builders: Vec<&'a mut dyn EntryBuilder>,
}

impl<'a> BuilderSet<'a> {
  pub fn new() -> Self { Self::default() }

  pub fn push(&mut self, builder: &'a mut dyn EntryBuilder) {
    self.builders.push(builder);
  }

  pub fn with(mut self, builder: &'a mut dyn EntryBuilder) -> Self {
    self.push(builder);
    self
  }

  pub fn len(&self) -> usize { self.builders.len() }

  pub fn is_empty(&self) -> bool { self.builders.is_empty() }
}

impl EntryBuilder for BuilderSet<'_> {
  fn on_entry_start(&mut self) {
    for builder in &mut self.builders {
      builder.on_entry_start();
    }
  }

  fn on_property(&mut self, property: &PropertyNode) {
    for builder in &mut self.builders {
      builder.on_property(property);
    }
  }

  fn on_entry_end(&mut self) {
    for builder in &mut self.builders {
      builder.on_entry_end();
    }
  }
}

// ─── Raw capture ─────────────────────────────────────────────────────────────

/// Collects every entry as an uninterpreted [`VNode`].
#[derive(Debug, Default)]
pub struct VNodeBuilder {
  nodes:   Vec<VNode>,
  current: Option<VNode>,
}

impl VNodeBuilder {
  pub fn new() -> Self { Self::default() }

  pub fn nodes(&self) -> &[VNode] { &self.nodes }

  pub fn into_nodes(self) -> Vec<VNode> { self.nodes }
}

impl EntryBuilder for VNodeBuilder {
  fn on_entry_start(&mut self) { self.current = Some(VNode::default()); }

  fn on_property(&mut self, property: &PropertyNode) {
    if let Some(node) = self.current.as_mut() {
      node.properties.push(property.clone());
    }
  }

  fn on_entry_end(&mut self) {
    if let Some(node) = self.current.take() {
      self.nodes.push(node);
    }
  }
}

// ─── Semantic mapping ────────────────────────────────────────────────────────

/// Maps every entry to a [`Contact`] as soon as it ends.
#[derive(Debug)]
pub struct ContactBuilder {
  mapper:   ContactMapper,
  raw:      VNodeBuilder,
  contacts: Vec<Contact>,
}

impl ContactBuilder {
  pub fn new(mapper: ContactMapper) -> Self {
    Self {
      mapper,
      raw: VNodeBuilder::default(),
      contacts: Vec::new(),
    }
  }

  pub fn contacts(&self) -> &[Contact] { &self.contacts }

  pub fn into_contacts(self) -> Vec<Contact> { self.contacts }
}

impl EntryBuilder for ContactBuilder {
  fn on_entry_start(&mut self) { self.raw.on_entry_start(); }

  fn on_property(&mut self, property: &PropertyNode) {
    self.raw.on_property(property);
  }

  fn on_entry_end(&mut self) {
    self.raw.on_entry_end();
    if let Some(node) = self.raw.nodes.pop() {
      self.contacts.push(self.mapper.map(&node));
    }
  }
}

// ─── Commit ──────────────────────────────────────────────────────────────────

/// Maps each entry and hands its rows to a [`CommitAdapter`] as one batch.
///
/// Entries that map to an empty contact are not committed. After the first
/// commit failure no further entries are committed; the error is reported by
/// [`EntryCommitter::finish`].
pub struct EntryCommitter<C: CommitAdapter> {
  mapper:    ContactMapper,
  adapter:   C,
  raw:       VNodeBuilder,
  committed: usize,
  error:     Option<C::Error>,
}

impl<C: CommitAdapter> EntryCommitter<C> {
  pub fn new(mapper: ContactMapper, adapter: C) -> Self {
    Self {
      mapper,
      adapter,
      raw: VNodeBuilder::default(),
      committed: 0,
      error: None,
    }
  }

  /// Number of batches accepted by the adapter so far.
  pub fn committed(&self) -> usize { self.committed }

  /// The adapter back, or the first commit error.
  pub fn finish(self) -> Result<C, C::Error> {
    match self.error {
      Some(err) => Err(err),
      None => Ok(self.adapter),
    }
  }
}

impl<C: CommitAdapter> EntryBuilder for EntryCommitter<C> {
  fn on_entry_start(&mut self) { self.raw.on_entry_start(); }

  fn on_property(&mut self, property: &PropertyNode) {
    self.raw.on_property(property);
  }

  fn on_entry_end(&mut self) {
    self.raw.on_entry_end();
    let Some(node) = self.raw.nodes.pop() else { return };
    if self.error.is_some() {
      return;
    }
    let contact = self.mapper.map(&node);
    if contact.is_empty() {
      tracing::debug!("entry mapped to an empty contact; nothing to commit");
      return;
    }
    match self.adapter.commit(contact.rows()) {
      Ok(()) => self.committed += 1,
      Err(err) => {
        tracing::warn!(error = %err, "commit failed; later entries skipped");
        self.error = Some(err);
      }
    }
  }
}
