//! The Observer Bus (spec §4.9): a per-document registry of callbacks for
//! four mutation events, delivered synchronously, in registration order, on
//! the thread that performed the mutation.
//!
//! Grounded on the single in-process event bus design note of spec §9:
//! "The Range subsystem registers exactly once per document; further
//! observers chain in registration order." The Range & Registry component
//! (`range.rs`) is exactly such a built-in subscriber — it registers itself
//! against the same bus a caller's own observers use.

use std::cell::RefCell;

use crate::arena::NodeId;

/// A `childList` mutation: exactly what spec §4.2's insertion/removal/
/// replacement algorithms fire.
#[derive(Debug, Clone)]
pub struct ChildListChange {
  pub target: NodeId,
  pub added: Vec<NodeId>,
  pub removed: Vec<NodeId>,
  pub previous_sibling: Option<NodeId>,
  pub next_sibling: Option<NodeId>,
}

/// An `attribute` mutation (spec §4.4).
#[derive(Debug, Clone)]
pub struct AttributeChange {
  pub target: NodeId,
  pub local_name: String,
  pub namespace: Option<String>,
  pub old_value: String,
}

/// A generic `characterData` mutation — fired for completeness by higher
/// layers that want a value-level notification distinct from the
/// offset-precise `replaceData` event below. The core itself only ever
/// fires the `replaceData` form for actual edits (spec §4.8: "the core
/// fires exactly one per character-data edit ... for range updates").
#[derive(Debug, Clone)]
pub struct CharacterDataChange {
  pub target: NodeId,
  pub old_value: String,
}

/// A `replaceData` mutation (spec §4.3/§4.8), fired *before* the buffer is
/// mutated so the Range subsystem (and any other observer) can read the
/// pre-change state if needed.
#[derive(Debug, Clone, Copy)]
pub struct ReplaceDataChange {
  pub target: NodeId,
  pub offset: usize,
  pub count: usize,
  pub data_length: usize,
}

pub type ChildListCallback = Box<dyn Fn(&ChildListChange)>;
pub type AttributeCallback = Box<dyn Fn(&AttributeChange)>;
pub type CharacterDataCallback = Box<dyn Fn(&CharacterDataChange)>;
pub type ReplaceDataCallback = Box<dyn Fn(ReplaceDataChange)>;

#[derive(Default)]
pub struct ObserverBus {
  child_list: RefCell<Vec<ChildListCallback>>,
  attribute: RefCell<Vec<AttributeCallback>>,
  character_data: RefCell<Vec<CharacterDataCallback>>,
  replace_data: RefCell<Vec<ReplaceDataCallback>>,
}

impl ObserverBus {
  pub fn on_child_list(&self, f: ChildListCallback) {
    self.child_list.borrow_mut().push(f);
  }

  pub fn on_attribute(&self, f: AttributeCallback) {
    self.attribute.borrow_mut().push(f);
  }

  pub fn on_character_data(&self, f: CharacterDataCallback) {
    self.character_data.borrow_mut().push(f);
  }

  pub fn on_replace_data(&self, f: ReplaceDataCallback) {
    self.replace_data.borrow_mut().push(f);
  }

  pub fn notify_child_list(&self, change: ChildListChange) {
    for cb in self.child_list.borrow().iter() {
      cb(&change);
    }
  }

  pub fn notify_attribute(&self, change: AttributeChange) {
    for cb in self.attribute.borrow().iter() {
      cb(&change);
    }
  }

  pub fn notify_character_data(&self, change: CharacterDataChange) {
    for cb in self.character_data.borrow().iter() {
      cb(&change);
    }
  }

  pub fn notify_replace_data(&self, change: ReplaceDataChange) {
    for cb in self.replace_data.borrow().iter() {
      cb(change);
    }
  }

  /// Total number of registered callbacks across all four event kinds;
  /// mostly useful for tests and diagnostics.
  pub fn len(&self) -> usize {
    self.child_list.borrow().len()
      + self.attribute.borrow().len()
      + self.character_data.borrow().len()
      + self.replace_data.borrow().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Clear all registered callbacks; called when a document is destroyed
  /// (spec §5: "destroying a document MUST clear both" registries).
  pub fn clear(&self) {
    self.child_list.borrow_mut().clear();
    self.attribute.borrow_mut().clear();
    self.character_data.borrow_mut().clear();
    self.replace_data.borrow_mut().clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::Cell;
  use std::rc::Rc;

  #[test]
  fn delivers_in_registration_order() {
    let bus = ObserverBus::default();
    let order = Rc::new(RefCell::new(Vec::new()));
    let o1 = order.clone();
    bus.on_attribute(Box::new(move |_| o1.borrow_mut().push(1)));
    let o2 = order.clone();
    bus.on_attribute(Box::new(move |_| o2.borrow_mut().push(2)));
    bus.notify_attribute(AttributeChange {
      target: dummy_id(),
      local_name: "id".into(),
      namespace: None,
      old_value: String::new(),
    });
    assert_eq!(*order.borrow(), vec![1, 2]);
  }

  #[test]
  fn clear_removes_every_kind() {
    let bus = ObserverBus::default();
    let count = Rc::new(Cell::new(0));
    let c = count.clone();
    bus.on_child_list(Box::new(move |_| c.set(c.get() + 1)));
    bus.clear();
    bus.notify_child_list(ChildListChange {
      target: dummy_id(),
      added: vec![],
      removed: vec![],
      previous_sibling: None,
      next_sibling: None,
    });
    assert_eq!(count.get(), 0);
  }

  fn dummy_id() -> NodeId {
    let mut arena: crate::arena::Arena<()> = crate::arena::Arena::new();
    arena.insert(())
  }
}
