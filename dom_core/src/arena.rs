//! The node pool. Grounded on the arena-and-index strategy the teacher's
//! `rcdom` approximates with `Rc`/`Weak` and the `generational-arena-dom`
//! reference implementation makes explicit: a document owns a flat pool of
//! node records, and every tree field (parent, siblings, first/last child)
//! is an index into that pool rather than a pointer. This sidesteps the
//! `Rc`/`Weak` cycle-management cost entirely: cloning, adopting, and
//! destroying a subtree are index rewrites, not reference-count traffic.
//!
//! Slots are generation-tagged so a stale [`NodeId`] obtained before a slot
//! was freed and reused is detectable rather than silently aliasing an
//! unrelated node.

use std::fmt;

/// An index into a [`Arena`], tagged with the generation of the slot it
/// names. Two `NodeId`s with the same index but different generations never
/// compare equal and never resolve to the same node.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
  index: u32,
  generation: u32,
}

impl fmt::Debug for NodeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "NodeId({}#{})", self.index, self.generation)
  }
}

enum Slot<T> {
  Occupied { generation: u32, value: T },
  Free { generation: u32, next_free: Option<u32> },
}

/// A generational pool of `T` values addressed by [`NodeId`].
pub struct Arena<T> {
  slots: Vec<Slot<T>>,
  free_head: Option<u32>,
  len: usize,
}

impl<T> Default for Arena<T> {
  fn default() -> Self {
    Arena {
      slots: Vec::new(),
      free_head: None,
      len: 0,
    }
  }
}

impl<T> Arena<T> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of live (non-freed) slots.
  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// Insert a value, returning a stable id for it.
  pub fn insert(&mut self, value: T) -> NodeId {
    if let Some(index) = self.free_head {
      let slot = &mut self.slots[index as usize];
      let generation = match *slot {
        Slot::Free { generation, next_free } => {
          self.free_head = next_free;
          generation.wrapping_add(1)
        }
        Slot::Occupied { .. } => unreachable!("free list pointed at occupied slot"),
      };
      *slot = Slot::Occupied { generation, value };
      self.len += 1;
      NodeId { index, generation }
    } else {
      let index = self.slots.len() as u32;
      self.slots.push(Slot::Occupied {
        generation: 0,
        value,
      });
      self.len += 1;
      NodeId {
        index,
        generation: 0,
      }
    }
  }

  /// Remove the value named by `id`, if `id` still names a live slot.
  pub fn remove(&mut self, id: NodeId) -> Option<T> {
    let slot = self.slots.get_mut(id.index as usize)?;
    match slot {
      Slot::Occupied { generation, .. } if *generation == id.generation => {
        let Slot::Occupied { value, .. } = std::mem::replace(
          slot,
          Slot::Free {
            generation: id.generation,
            next_free: self.free_head,
          },
        ) else {
          unreachable!()
        };
        self.free_head = Some(id.index);
        self.len -= 1;
        Some(value)
      }
      _ => None,
    }
  }

  pub fn get(&self, id: NodeId) -> Option<&T> {
    match self.slots.get(id.index as usize)? {
      Slot::Occupied { generation, value } if *generation == id.generation => Some(value),
      _ => None,
    }
  }

  pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
    match self.slots.get_mut(id.index as usize)? {
      Slot::Occupied { generation, value } if *generation == id.generation => Some(value),
      _ => None,
    }
  }

  pub fn contains(&self, id: NodeId) -> bool {
    self.get(id).is_some()
  }
}

impl<T> std::ops::Index<NodeId> for Arena<T> {
  type Output = T;
  fn index(&self, id: NodeId) -> &T {
    self.get(id).expect("stale or foreign NodeId")
  }
}

impl<T> std::ops::IndexMut<NodeId> for Arena<T> {
  fn index_mut(&mut self, id: NodeId) -> &mut T {
    self.get_mut(id).expect("stale or foreign NodeId")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reused_slot_gets_new_generation() {
    let mut arena: Arena<&'static str> = Arena::new();
    let a = arena.insert("a");
    arena.remove(a);
    let b = arena.insert("b");
    assert_eq!(arena.get(a), None);
    assert_eq!(arena.get(b), Some(&"b"));
  }

  #[test]
  fn len_tracks_live_slots() {
    let mut arena: Arena<i32> = Arena::new();
    let a = arena.insert(1);
    let _b = arena.insert(2);
    assert_eq!(arena.len(), 2);
    arena.remove(a);
    assert_eq!(arena.len(), 1);
  }
}
