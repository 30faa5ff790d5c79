//! Range & Registry (spec §4.8): live boundary points that track tree and
//! character-data mutations, plus the static, non-tracking `StaticRange`.
//!
//! Grounded on the teacher's `rcdom`/`wire` pattern of a central registry
//! the tree-mutation code notifies (here, the Observer Bus of spec §4.9),
//! combined with the "document registry of live views" idiom from
//! `niklak-dom_query`'s `Document` (other_examples): `RangeRegistry` holds
//! `Weak` handles so a dropped `Range` unregisters itself for free, with no
//! explicit `detach()` call required.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::arena::NodeId;
use crate::document::Document;
use crate::error::{DomError, DomResult};
use crate::node::Node;
use crate::observer::{ChildListChange, ReplaceDataChange};

/// A boundary point: a container node plus an offset into it. For a
/// character-data container the offset is a UTF-8 byte offset into its
/// buffer; for any other container it's a child index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryPoint {
  pub container: NodeId,
  pub offset: usize,
}

struct RangeData {
  doc: Rc<Document>,
  start: BoundaryPoint,
  end: BoundaryPoint,
}

/// A live range (spec §4.8): registers itself with its document's
/// [`RangeRegistry`] on construction and updates its boundary points as
/// the document mutates, for as long as it (or a clone of the handle)
/// stays alive.
#[derive(Clone)]
pub struct Range {
  data: Rc<RefCell<RangeData>>,
}

impl Range {
  /// `document.createRange()`, collapsed to `(root, 0)`.
  pub fn new(doc: &Rc<Document>) -> Range {
    let root = doc.root_id();
    let point = BoundaryPoint { container: root, offset: 0 };
    let data = Rc::new(RefCell::new(RangeData {
      doc: doc.clone(),
      start: point,
      end: point,
    }));
    doc.ranges().register(Rc::downgrade(&data));
    Range { data }
  }

  pub fn start(&self) -> BoundaryPoint {
    self.data.borrow().start
  }

  pub fn end(&self) -> BoundaryPoint {
    self.data.borrow().end
  }

  pub fn collapsed(&self) -> bool {
    let d = self.data.borrow();
    d.start == d.end
  }

  /// `setStart(node, offset)` (spec §4.8): if the new start sorts after
  /// the current end, the end point collapses to match (matches the
  /// DOM's "if boundary-point <start> is after <end>, set end to start").
  pub fn set_start(&self, container: &Node, offset: usize) -> DomResult<()> {
    validate_offset(container, offset)?;
    let mut d = self.data.borrow_mut();
    d.start = BoundaryPoint { container: container.id(), offset };
    if boundary_after(&d.start, &d.end, &d.doc) {
      d.end = d.start;
    }
    Ok(())
  }

  pub fn set_end(&self, container: &Node, offset: usize) -> DomResult<()> {
    validate_offset(container, offset)?;
    let mut d = self.data.borrow_mut();
    d.end = BoundaryPoint { container: container.id(), offset };
    if boundary_after(&d.start, &d.end, &d.doc) {
      d.start = d.end;
    }
    Ok(())
  }

  pub fn collapse(&self, to_start: bool) {
    let mut d = self.data.borrow_mut();
    if to_start {
      d.end = d.start;
    } else {
      d.start = d.end;
    }
  }
}

/// `document.createRange()` but never updated by subsequent mutations
/// (spec §4.8): a plain value snapshot of two boundary points, with no
/// registry interaction at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticRange {
  pub start: BoundaryPoint,
  pub end: BoundaryPoint,
}

impl StaticRange {
  pub fn new(start: BoundaryPoint, end: BoundaryPoint) -> StaticRange {
    StaticRange { start, end }
  }
}

fn validate_offset(container: &Node, offset: usize) -> DomResult<()> {
  let limit = if container.is_character_data() {
    container.length().unwrap_or(0)
  } else {
    container.child_count()
  };
  if offset > limit {
    return Err(DomError::index_size(format!(
      "offset {offset} exceeds boundary limit {limit}"
    )));
  }
  Ok(())
}

/// True if `a` sorts strictly after `b` in document order (same-document
/// boundary points only — cross-document comparison is not meaningful and
/// treated as "not after").
fn boundary_after(a: &BoundaryPoint, b: &BoundaryPoint, doc: &Document) -> bool {
  if a.container == b.container {
    return a.offset > b.offset;
  }
  let na = doc.node(a.container);
  let nb = doc.node(b.container);
  na.compare_document_position(&nb) & 0x02 != 0 // PRECEDING: b precedes a => a is after b
}

/// Per-document registry of live [`Range`]s (spec §4.8/§4.9): holds weak
/// handles so a dropped `Range` is simply skipped on the next mutation
/// rather than requiring explicit unregistration.
#[derive(Default)]
pub struct RangeRegistry {
  entries: RefCell<Vec<Weak<RefCell<RangeData>>>>,
}

impl RangeRegistry {
  fn register(&self, entry: Weak<RefCell<RangeData>>) {
    self.entries.borrow_mut().push(entry);
  }

  /// Number of still-live ranges; also prunes dead entries as a side
  /// effect, matching how the update passes below keep the list tidy
  /// without a separate GC pass.
  pub fn len(&self) -> usize {
    let mut entries = self.entries.borrow_mut();
    entries.retain(|w| w.strong_count() > 0);
    entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn clear(&self) {
    self.entries.borrow_mut().clear();
  }

  /// Boundary-point update on a `childList` mutation (spec §4.8): a
  /// boundary whose container is the mutation's target and whose offset
  /// falls after the removed run shifts by `added.len() - removed.len()`;
  /// a boundary whose container is one of the *removed* nodes (or a
  /// descendant of one) re-anchors to `(target, index-of-that-removed-
  /// root-among-target's-children)`.
  pub fn handle_child_list(&self, change: &ChildListChange) {
    let mut entries = self.entries.borrow_mut();
    entries.retain(|w| w.strong_count() > 0);
    for weak in entries.iter() {
      let Some(rc) = weak.upgrade() else { continue };
      let mut data = rc.borrow_mut();
      let doc = data.doc.clone();
      update_point_for_child_list(&mut data.start, change, &doc);
      update_point_for_child_list(&mut data.end, change, &doc);
    }
  }

  /// Boundary-point update on a character-data edit (spec §4.8): a
  /// boundary in the edited node past the edit's start offset shifts;
  /// one inside the replaced span clamps to the start of the
  /// replacement.
  pub fn handle_replace_data(&self, change: &ReplaceDataChange) {
    let mut entries = self.entries.borrow_mut();
    entries.retain(|w| w.strong_count() > 0);
    for weak in entries.iter() {
      let Some(rc) = weak.upgrade() else { continue };
      let mut data = rc.borrow_mut();
      update_point_for_replace_data(&mut data.start, change);
      update_point_for_replace_data(&mut data.end, change);
    }
  }
}

fn update_point_for_child_list(point: &mut BoundaryPoint, change: &ChildListChange, doc: &Document) {
  if point.container == change.target {
    // Apply removals first, then additions (spec §4.8) — and an addition
    // only shifts boundaries strictly after the insertion point, not every
    // boundary in the container.
    let removed_before = count_removed_before_offset(point.offset, change, doc);
    let offset_after_removals = (point.offset as isize - removed_before as isize).max(0) as usize;
    let new_index = previous_sibling_index(change, doc);
    let shift = if offset_after_removals > new_index { change.added.len() } else { 0 };
    point.offset = offset_after_removals + shift;
    return;
  }
  // If the boundary's container is (a descendant of) a removed node,
  // re-anchor to just before that removed node's former position.
  if let Some(removed_index) = change.removed.iter().position(|&r| {
    let removed_node = doc.node(r);
    removed_node.id() == point.container || removed_node.contains(&doc.node(point.container))
  }) {
    let index_among_removed_prefix = change
      .removed
      .iter()
      .take(removed_index)
      .count();
    let base = previous_sibling_index(change, doc);
    point.container = change.target;
    point.offset = base + index_among_removed_prefix;
  }
}

fn previous_sibling_index(change: &ChildListChange, doc: &Document) -> usize {
  match change.previous_sibling {
    Some(id) => doc.node(id).index() + 1,
    None => 0,
  }
}

/// Count how many of `change.removed` sat at a child index strictly
/// before `offset` (i.e. the boundary needs to shift left past them).
/// Uses `previous_sibling`/`next_sibling` position rather than re-deriving
/// indices, since removed nodes are already detached by the time
/// notifications fire — the only positional evidence left is
/// `previous_sibling`/`next_sibling` captured at removal time.
fn count_removed_before_offset(offset: usize, change: &ChildListChange, doc: &Document) -> usize {
  let base = previous_sibling_index(change, doc);
  change.removed.iter().enumerate().filter(|(i, _)| base + i < offset).count()
}

fn update_point_for_replace_data(point: &mut BoundaryPoint, change: &ReplaceDataChange) {
  if point.container != change.target {
    return;
  }
  let edit_end = change.offset + change.count;
  if point.offset <= change.offset {
    // unaffected
  } else if point.offset > edit_end {
    point.offset = point.offset - change.count + change.data_length;
  } else {
    // inside the replaced span: clamp to the start of the replacement
    point.offset = change.offset;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::document::Document;

  #[test]
  fn range_drops_from_registry_when_dropped() {
    let doc = Document::new_html_document(None);
    {
      let _r = Range::new(&doc);
      assert_eq!(doc.ranges().len(), 1);
    }
    assert_eq!(doc.ranges().len(), 0);
  }

  #[test]
  fn child_list_shifts_boundary_after_insertion_point() {
    let doc = Document::new_html_document(None);
    let div = doc.create_element("div").unwrap();
    doc.root_element().unwrap().append_child(&div).unwrap();
    let a = doc.create_element("a").unwrap();
    let b = doc.create_element("b").unwrap();
    div.append_child(&a).unwrap();
    div.append_child(&b).unwrap();

    let range = Range::new(&doc);
    range.set_start(&div, 2).unwrap();
    range.set_end(&div, 2).unwrap();

    let c = doc.create_element("c").unwrap();
    div.insert_before(&c, Some(&a)).unwrap();

    assert_eq!(range.start().offset, 3);
    assert_eq!(range.end().offset, 3);
  }

  #[test]
  fn boundary_at_or_before_insertion_point_does_not_shift() {
    let doc = Document::new_html_document(None);
    let div = doc.create_element("div").unwrap();
    doc.root_element().unwrap().append_child(&div).unwrap();

    let range = Range::new(&doc);
    range.set_start(&div, 0).unwrap();
    range.set_end(&div, 0).unwrap();

    let x = doc.create_element("x").unwrap();
    div.append_child(&x).unwrap();

    assert_eq!(range.start().offset, 0);
    assert_eq!(range.end().offset, 0);
  }

  #[test]
  fn replace_data_shifts_boundary_past_edit() {
    let doc = Document::new_html_document(None);
    let t = doc.create_text_node("hello world");
    let range = Range::new(&doc);
    range.set_start(&t, 8).unwrap();
    range.set_end(&t, 8).unwrap();
    t.replace_data(0, 5, "hi").unwrap();
    assert_eq!(range.start().offset, 5);
  }
}
