//! Tree Mutations (spec §4.2): pre-insertion validation, adopt, insert,
//! remove, replace, and the DOM-spec "viable sibling" convenience
//! operations (`before`/`after`/`replaceWith`/`remove`).
//!
//! Every public entry point here is all-or-nothing (spec §7): validation
//! runs to completion before any arena field is written, so a returned
//! `DomError` means the tree is exactly as it was and no observer fired.

use std::rc::Rc;

use crate::arena::NodeId;
use crate::document::Document;
use crate::error::{DomError, DomResult};
use crate::node::{Node, NodeData, NodeKind};
use crate::observer::ChildListChange;

/// `insertBefore(newChild, refChild)` (spec §4.2).
pub fn insert_before(parent: &Node, new_child: &Node, ref_child: Option<&Node>) -> DomResult<Node> {
  validate_insert(parent, new_child, ref_child, None)?;
  do_insert(parent, new_child, ref_child)
}

/// `appendChild(newChild)` = `insertBefore(newChild, null)`.
pub fn append_child(parent: &Node, new_child: &Node) -> DomResult<Node> {
  insert_before(parent, new_child, None)
}

/// `removeChild(child)` (spec §4.2).
pub fn remove_child(parent: &Node, child: &Node) -> DomResult<Node> {
  let actual_parent = child
    .parent()
    .ok_or_else(|| DomError::not_found("child has no parent"))?;
  if actual_parent.id() != parent.id() {
    return Err(DomError::not_found("child is not a child of parent"));
  }
  let previous_sibling = child.previous_sibling();
  let next_sibling = child.next_sibling();
  do_remove(child);
  fire_child_list(
    parent,
    &[],
    &[child.id()],
    previous_sibling.as_ref().map(Node::id),
    next_sibling.as_ref().map(Node::id),
  );
  Ok(child.clone())
}

/// `replaceChild(newChild, oldChild)` (spec §4.2): validation runs once up
/// front against the hypothetical post-replace state; observers see a
/// single combined `childList` notification (open question (c) of spec §9
/// resolved in favor of the spec's stated "atomic" intent — see
/// DESIGN.md).
pub fn replace_child(parent: &Node, new_child: &Node, old_child: &Node) -> DomResult<Node> {
  let actual_parent = old_child
    .parent()
    .ok_or_else(|| DomError::not_found("oldChild has no parent"))?;
  if actual_parent.id() != parent.id() {
    return Err(DomError::not_found("oldChild is not a child of parent"));
  }
  validate_insert(parent, new_child, Some(old_child), Some(old_child.id()))?;

  let previous_sibling = old_child.previous_sibling();
  let next_sibling = old_child.next_sibling();

  // Detach oldChild from the chain first (no notification yet — this is
  // part of one atomic replace), freeing up the slot so newChild's
  // insertion point computation below doesn't see it.
  splice_out(&parent.owner_document(), old_child.id());

  let adopted = adopt_into(&parent.owner_document(), new_child);
  let set = expand_fragment(&adopted);
  if set.is_empty() {
    fire_child_list(parent, &[], &[old_child.id()], previous_sibling.as_ref().map(Node::id), next_sibling.as_ref().map(Node::id));
    return Ok(old_child.clone());
  }

  link_nodes(
    &parent.owner_document(),
    parent.id(),
    previous_sibling.as_ref().map(Node::id),
    next_sibling.as_ref().map(Node::id),
    &set.iter().map(Node::id).collect::<Vec<_>>(),
  );

  fire_child_list(
    parent,
    &set.iter().map(Node::id).collect::<Vec<_>>(),
    &[old_child.id()],
    previous_sibling.as_ref().map(Node::id),
    next_sibling.as_ref().map(Node::id),
  );
  Ok(old_child.clone())
}

/// `replaceChildren(...nodes)` (spec §4.2): validates the hypothetical
/// tree first, then removes all existing children, then inserts the
/// coerced fragment. Non-node string arguments are coerced to Text nodes.
pub fn replace_children(parent: &Node, nodes: &[Node]) -> DomResult<()> {
  let fragment = parent.owner_document().create_document_fragment();
  for n in nodes {
    append_child(&fragment, n)?;
  }
  // Validate as if the existing children were entirely replaced by the
  // fragment's contents.
  validate_replace_all(parent, &fragment)?;

  let existing = parent.children();
  for child in &existing {
    do_remove(child);
  }
  if !existing.is_empty() {
    fire_child_list(parent, &[], &existing.iter().map(Node::id).collect::<Vec<_>>(), None, None);
  }

  let set = expand_fragment(&fragment);
  if !set.is_empty() {
    link_nodes(&parent.owner_document(), parent.id(), None, None, &set.iter().map(Node::id).collect::<Vec<_>>());
    fire_child_list(parent, &set.iter().map(Node::id).collect::<Vec<_>>(), &[], None, None);
  }
  Ok(())
}

/// `textContent` setter (spec §4.1): remove all children, then append a
/// single Text node iff `value` is non-empty.
pub fn replace_children_with_text(node: &Node, value: &str) {
  let existing = node.children();
  for child in &existing {
    do_remove(child);
  }
  if !existing.is_empty() {
    fire_child_list(node, &[], &existing.iter().map(Node::id).collect::<Vec<_>>(), None, None);
  }
  if !value.is_empty() {
    let text = node.owner_document().create_text_node(value);
    link_nodes(&node.owner_document(), node.id(), None, None, &[text.id()]);
    fire_child_list(node, &[text.id()], &[], None, None);
  }
}

// -- convenience tree-position operations (spec §4.2) -------------------

impl Node {
  pub fn insert_before(&self, new_child: &Node, ref_child: Option<&Node>) -> DomResult<Node> {
    insert_before(self, new_child, ref_child)
  }

  pub fn append_child(&self, new_child: &Node) -> DomResult<Node> {
    append_child(self, new_child)
  }

  pub fn remove_child(&self, child: &Node) -> DomResult<Node> {
    remove_child(self, child)
  }

  pub fn replace_child(&self, new_child: &Node, old_child: &Node) -> DomResult<Node> {
    replace_child(self, new_child, old_child)
  }

  pub fn replace_children(&self, nodes: &[Node]) -> DomResult<()> {
    replace_children(self, nodes)
  }

  /// `remove()`: detach `self` from its parent, if any. A no-op if
  /// already detached.
  pub fn remove(&self) -> DomResult<()> {
    if let Some(parent) = self.parent() {
      remove_child(&parent, self)?;
    }
    Ok(())
  }

  /// `before(...nodes)`: insert `nodes` as the immediate previous
  /// siblings of `self`, using the "viable sibling" rule — the nearest
  /// preceding sibling of `self` that is not itself among `nodes`.
  pub fn before(&self, nodes: &[Node]) -> DomResult<()> {
    let parent = match self.parent() {
      Some(p) => p,
      None => return Ok(()),
    };
    let viable = viable_preceding_sibling(self, nodes);
    let fragment = coerce_fragment(&parent, nodes)?;
    insert_before(&parent, &fragment, viable.as_ref())?;
    Ok(())
  }

  /// `after(...nodes)`: symmetric to [`Node::before`].
  pub fn after(&self, nodes: &[Node]) -> DomResult<()> {
    let parent = match self.parent() {
      Some(p) => p,
      None => return Ok(()),
    };
    let viable = viable_following_sibling(self, nodes);
    let fragment = coerce_fragment(&parent, nodes)?;
    insert_before(&parent, &fragment, viable.as_ref())?;
    Ok(())
  }

  /// `replaceWith(...nodes)`.
  pub fn replace_with(&self, nodes: &[Node]) -> DomResult<()> {
    let parent = match self.parent() {
      Some(p) => p,
      None => return Ok(()),
    };
    let viable = viable_following_sibling(self, nodes);
    let fragment = coerce_fragment(&parent, nodes)?;
    if viable.as_ref().is_some_and(|v| v.id() == self.id()) {
      // self was in `nodes` and is its own viable next sibling —
      // degrades to appendChild-like insertion before self is gone.
      insert_before(&parent, &fragment, Some(self))?;
      self.remove()?;
    } else {
      self.remove()?;
      insert_before(&parent, &fragment, viable.as_ref())?;
    }
    Ok(())
  }
}

fn coerce_fragment(parent: &Node, nodes: &[Node]) -> DomResult<Node> {
  let doc = parent.owner_document();
  let fragment = doc.create_document_fragment();
  for n in nodes {
    append_child(&fragment, n)?;
  }
  Ok(fragment)
}

fn viable_preceding_sibling(node: &Node, set: &[Node]) -> Option<Node> {
  let mut cur = node.previous_sibling();
  while let Some(c) = cur {
    if !set.iter().any(|n| n.id() == c.id()) {
      return Some(c);
    }
    cur = c.previous_sibling();
  }
  None
}

fn viable_following_sibling(node: &Node, set: &[Node]) -> Option<Node> {
  let mut cur = node.next_sibling();
  while let Some(c) = cur {
    if !set.iter().any(|n| n.id() == c.id()) {
      return Some(c);
    }
    cur = c.next_sibling();
  }
  None
}

// -- validation (V1-V5, I3, I4) ------------------------------------------

fn validate_insert(
  parent: &Node,
  new_child: &Node,
  ref_child: Option<&Node>,
  exclude_from_existing: Option<NodeId>,
) -> DomResult<()> {
  // V1
  if !node_accepts_children(parent) {
    return Err(DomError::hierarchy_request(format!(
      "{:?} nodes cannot have children",
      parent.kind()
    )));
  }
  // V2
  if new_child.contains(parent) {
    return Err(DomError::hierarchy_request(
      "newChild is an inclusive ancestor of parent",
    ));
  }
  // V3
  if let Some(rc) = ref_child {
    match rc.parent() {
      Some(p) if p.id() == parent.id() => {}
      _ => return Err(DomError::not_found("refChild is not a child of parent")),
    }
  }
  match new_child.kind() {
    NodeKind::Document | NodeKind::Attribute => {
      return Err(DomError::hierarchy_request(format!(
        "{:?} cannot be inserted into a tree",
        new_child.kind()
      )));
    }
    _ => {}
  }
  if parent.kind() == NodeKind::Document {
    validate_document_insert(parent, new_child, ref_child, exclude_from_existing)?;
  } else if new_child.kind() == NodeKind::DocumentType {
    return Err(DomError::hierarchy_request(
      "DocumentType can only be a child of a Document",
    ));
  }
  Ok(())
}

/// Validates the hypothetical state after replacing every existing child
/// of `parent` with `fragment`'s children (used by `replaceChildren`).
fn validate_replace_all(parent: &Node, fragment: &Node) -> DomResult<()> {
  if parent.kind() != NodeKind::Document {
    return Ok(());
  }
  let incoming = fragment.children();
  let elems = incoming.iter().filter(|n| n.is_element()).count();
  let doctypes = incoming.iter().filter(|n| n.kind() == NodeKind::DocumentType).count();
  if elems > 1 {
    return Err(DomError::hierarchy_request("document may contain at most one element child"));
  }
  if doctypes > 1 {
    return Err(DomError::hierarchy_request("document may contain at most one doctype child"));
  }
  if doctypes == 1 && elems == 1 {
    let doctype_first = incoming
      .iter()
      .position(|n| n.kind() == NodeKind::DocumentType)
      .unwrap()
      < incoming.iter().position(|n| n.is_element()).unwrap();
    if !doctype_first {
      return Err(DomError::hierarchy_request("doctype must precede the document element"));
    }
  }
  for n in &incoming {
    if n.kind() == NodeKind::Text {
      return Err(DomError::hierarchy_request("Document cannot have a Text child"));
    }
  }
  Ok(())
}

fn node_accepts_children(node: &Node) -> bool {
  matches!(node.kind(), NodeKind::Document | NodeKind::Element | NodeKind::DocumentFragment)
}

/// I3: at most one DocumentType (preceding the Element), zero or more
/// Comments/PIs, and at most one Element.
fn validate_document_insert(
  parent: &Node,
  new_child: &Node,
  ref_child: Option<&Node>,
  exclude: Option<NodeId>,
) -> DomResult<()> {
  let mut existing = parent.children();
  if let Some(id) = exclude {
    existing.retain(|n| n.id() != id);
  }
  // A move within the same parent (e.g. reordering the document element)
  // must not double-count `new_child` against itself.
  existing.retain(|n| n.id() != new_child.id());
  let ref_index = match ref_child {
    Some(rc) => existing.iter().position(|n| n.id() == rc.id()).unwrap_or(existing.len()),
    None => existing.len(),
  };

  let incoming: Vec<Node> = if new_child.kind() == NodeKind::DocumentFragment {
    new_child.children()
  } else {
    vec![new_child.clone()]
  };

  for n in &incoming {
    if n.kind() == NodeKind::Text {
      return Err(DomError::hierarchy_request("Document cannot have a Text child"));
    }
  }

  let existing_elems = existing.iter().filter(|n| n.is_element()).count();
  let existing_doctypes = existing.iter().filter(|n| n.kind() == NodeKind::DocumentType).count();
  let incoming_elems = incoming.iter().filter(|n| n.is_element()).count();
  let incoming_doctypes = incoming.iter().filter(|n| n.kind() == NodeKind::DocumentType).count();

  if incoming_elems + existing_elems > 1 {
    return Err(DomError::hierarchy_request("document may contain at most one element child"));
  }
  if incoming_doctypes + existing_doctypes > 1 {
    return Err(DomError::hierarchy_request("document may contain at most one doctype child"));
  }
  if incoming_doctypes > 0 && existing.iter().take(ref_index).any(|n| n.is_element()) {
    return Err(DomError::hierarchy_request("doctype must precede the document element"));
  }
  if incoming_elems > 0 && existing.iter().skip(ref_index).any(|n| n.kind() == NodeKind::DocumentType) {
    return Err(DomError::hierarchy_request("document element must follow any doctype"));
  }
  Ok(())
}

// -- adoption -------------------------------------------------------------

/// Adopt `node` into `target`'s ownership: detach it from any current
/// parent (same-document move or cross-document adopt both start here),
/// then — if `node`'s arena is not `target` — migrate the whole subtree
/// into `target`'s arena and free the original slots.
pub(crate) fn adopt_into(target: &Rc<Document>, node: &Node) -> Node {
  if let Some(parent) = node.parent() {
    // Capture the sibling links before `do_remove` nulls them out (spec
    // I7) — reading them afterwards would always report `None`.
    let previous_sibling = node.previous_sibling().map(|n| n.id());
    let next_sibling = node.next_sibling().map(|n| n.id());
    do_remove(node);
    fire_child_list(&parent, &[], &[node.id()], previous_sibling, next_sibling);
  }
  if Rc::ptr_eq(&node.doc, target) {
    return node.clone();
  }
  let new_id = migrate_subtree(target, node);
  node.doc.free_subtree(node.id);
  target.node(new_id)
}

fn migrate_subtree(target: &Rc<Document>, node: &Node) -> NodeId {
  let data = clone_payload_detached(node);
  let new_id = target.alloc(data);
  for child in node.children() {
    let child_new_id = migrate_subtree(target, &child);
    link_nodes(target, new_id, None, None, &[child_new_id]);
  }
  new_id
}

/// Clone the kind-specific payload of `node` with no parent/sibling
/// links — used by both cross-document adopt and `cloneNode`. Shadow-root
/// and template-contents associations are not preserved across a
/// cross-document adopt (spec §1: shadow DOM/template upgrade algorithms
/// are out of scope); this is logged, not silently dropped.
fn clone_payload_detached(node: &Node) -> NodeData {
  match node.kind() {
    NodeKind::Element => {
      let (name, local_name, attrs) = node
        .with_element(|e| {
          let attrs: Vec<_> = e
            .attributes
            .borrow()
            .iter()
            .map(|(n, v)| (n.clone(), v.to_string()))
            .collect();
          (e.name.clone(), e.local_name.clone(), attrs)
        })
        .expect("kind() reported Element");
      let mut store = crate::attr::AttributeStore::new();
      for (n, v) in attrs {
        let ns_owned = if n.ns.is_empty() { None } else { Some(n.ns.to_string()) };
        store.add_if_missing(ns_owned.as_deref(), n, v);
      }
      if node.with_element(|e| e.template_contents.is_some()).unwrap_or(false)
        || node.with_element(|e| e.shadow_root.is_some()).unwrap_or(false)
      {
        log::warn!("cross-document adopt dropped shadow-root/template-contents association");
      }
      NodeData::Element(crate::node::ElementData {
        name,
        local_name,
        attributes: std::cell::RefCell::new(store),
        template_contents: None,
        shadow_root: None,
        geometry: std::cell::RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
      })
    }
    NodeKind::Text => NodeData::Text(crate::node::CharacterBuffer::new(node.text_content())),
    NodeKind::Comment => NodeData::Comment(crate::node::CharacterBuffer::new(node.text_content())),
    NodeKind::CDATASection => NodeData::CDATASection(crate::node::CharacterBuffer::new(node.text_content())),
    NodeKind::ProcessingInstruction => {
      let (target_name, data) = node
        .doc
        .with_node(node.id, |n| match &n.data {
          NodeData::ProcessingInstruction(p) => (p.target.clone(), p.buffer.data.borrow().clone()),
          _ => unreachable!(),
        });
      NodeData::ProcessingInstruction(crate::node::ProcessingInstructionData {
        target: target_name,
        buffer: crate::node::CharacterBuffer::new(data),
      })
    }
    NodeKind::DocumentType => node.doc.with_node(node.id, |n| match &n.data {
      NodeData::DocumentType(d) => NodeData::DocumentType(crate::node::DocumentTypeData {
        name: d.name.clone(),
        public_id: d.public_id.clone(),
        system_id: d.system_id.clone(),
      }),
      _ => unreachable!(),
    }),
    NodeKind::DocumentFragment => NodeData::DocumentFragment(crate::node::DocumentFragmentData { host: None }),
    NodeKind::Document | NodeKind::Attribute => {
      unreachable!("Document/Attribute nodes are never adopted or cloned via this path")
    }
  }
}

// -- low-level arena splicing ---------------------------------------------

/// Insert the ordered `nodes` as a contiguous run between `prev` and
/// `next` (either may be `None` to mean "at an end of `parent`'s child
/// list").
fn link_nodes(doc: &Document, parent_id: NodeId, prev: Option<NodeId>, next: Option<NodeId>, nodes: &[NodeId]) {
  if nodes.is_empty() {
    return;
  }
  for (i, &id) in nodes.iter().enumerate() {
    let p = if i == 0 { prev } else { Some(nodes[i - 1]) };
    let n = if i == nodes.len() - 1 { next } else { Some(nodes[i + 1]) };
    doc.with_node_mut(id, |rec| {
      rec.parent = Some(parent_id);
      rec.previous_sibling = p;
      rec.next_sibling = n;
    });
  }
  match prev {
    Some(p) => doc.with_node_mut(p, |rec| rec.next_sibling = Some(nodes[0])),
    None => doc.with_node_mut(parent_id, |rec| rec.first_child = Some(nodes[0])),
  }
  match next {
    Some(n) => doc.with_node_mut(n, |rec| rec.previous_sibling = Some(*nodes.last().unwrap())),
    None => doc.with_node_mut(parent_id, |rec| rec.last_child = Some(*nodes.last().unwrap())),
  }
}

/// Splice `id` out of its parent's child chain, leaving its own
/// parent/sibling fields untouched (the caller clears them separately via
/// [`splice_out`]).
fn unlink_from_parent(doc: &Document, id: NodeId) {
  let (parent_id, prev, next) = doc.with_node(id, |rec| (rec.parent, rec.previous_sibling, rec.next_sibling));
  let Some(parent_id) = parent_id else { return };
  match prev {
    Some(p) => doc.with_node_mut(p, |rec| rec.next_sibling = next),
    None => doc.with_node_mut(parent_id, |rec| rec.first_child = next),
  }
  match next {
    Some(n) => doc.with_node_mut(n, |rec| rec.previous_sibling = prev),
    None => doc.with_node_mut(parent_id, |rec| rec.last_child = prev),
  }
}

/// Detach `id` entirely: unlink from its parent chain and null out its
/// own parent/sibling fields (spec I7: a detached node has null
/// parent/siblings).
fn splice_out(doc: &Document, id: NodeId) {
  unlink_from_parent(doc, id);
  doc.with_node_mut(id, |rec| {
    rec.parent = None;
    rec.previous_sibling = None;
    rec.next_sibling = None;
  });
}

fn do_remove(node: &Node) {
  splice_out(&node.owner_document(), node.id());
}

/// If `node` is a `DocumentFragment`, returns its children (detached from
/// the fragment, left-to-right) — otherwise `vec![node.clone()]`.
fn expand_fragment(node: &Node) -> Vec<Node> {
  if node.kind() == NodeKind::DocumentFragment {
    let kids = node.children();
    for k in &kids {
      splice_out(&node.owner_document(), k.id());
    }
    kids
  } else {
    vec![node.clone()]
  }
}

fn do_insert(parent: &Node, new_child: &Node, ref_child: Option<&Node>) -> DomResult<Node> {
  let doc = parent.owner_document();
  let adopted = adopt_into(&doc, new_child);

  let previous_sibling = match ref_child {
    Some(rc) => rc.previous_sibling(),
    None => parent.last_child(),
  };
  let next_sibling_id = ref_child.map(Node::id);

  let set = expand_fragment(&adopted);
  if set.is_empty() {
    return Ok(new_child.clone());
  }

  link_nodes(
    &doc,
    parent.id(),
    previous_sibling.as_ref().map(Node::id),
    next_sibling_id,
    &set.iter().map(Node::id).collect::<Vec<_>>(),
  );

  fire_child_list(
    parent,
    &set.iter().map(Node::id).collect::<Vec<_>>(),
    &[],
    previous_sibling.as_ref().map(Node::id),
    next_sibling_id,
  );

  log::debug!(
    "insert: target={:?} added={} ",
    parent.id(),
    set.len()
  );

  Ok(new_child.clone())
}

fn fire_child_list(parent: &Node, added: &[NodeId], removed: &[NodeId], previous_sibling: Option<NodeId>, next_sibling: Option<NodeId>) {
  let change = ChildListChange {
    target: parent.id(),
    added: added.to_vec(),
    removed: removed.to_vec(),
    previous_sibling,
    next_sibling,
  };
  let doc = parent.owner_document();
  doc.ranges().handle_child_list(&change);
  doc.observers().notify_child_list(change);
  if !removed.is_empty() {
    log::debug!("remove: target={:?} removed={}", parent.id(), removed.len());
  }
}

// -- normalize / clone ----------------------------------------------------

/// `normalize()` (spec §4.1): merge runs of adjacent Text-kind siblings,
/// dropping zero-length Text nodes. CDATA/Comment/PI/Element terminate a
/// run without merging across them.
pub(crate) fn normalize_subtree(root: &Node) {
  let mut run_start: Option<Node> = None;
  let mut cursor = root.first_child();
  while let Some(node) = cursor {
    let next = node.next_sibling();
    if node.kind() == NodeKind::Text {
      match &run_start {
        None => run_start = Some(node.clone()),
        Some(first) => {
          let appended = node.text_content();
          first.append_data(&appended).expect("appendData on Text cannot fail");
          do_remove(&node);
          fire_child_list(root, &[], &[node.id()], first.previous_sibling().map(|n| n.id()), first.next_sibling().map(|n| n.id()));
        }
      }
    } else {
      run_start = None;
      if node.kind() == NodeKind::Element {
        normalize_subtree(&node);
      }
    }
    cursor = next;
  }
  // Drop zero-length Text nodes left over (including a solitary one).
  let mut cursor = root.first_child();
  while let Some(node) = cursor {
    let next = node.next_sibling();
    if node.kind() == NodeKind::Text && node.text_content().is_empty() {
      let prev = node.previous_sibling().map(|n| n.id());
      let nxt = node.next_sibling().map(|n| n.id());
      do_remove(&node);
      fire_child_list(root, &[], &[node.id()], prev, nxt);
    }
    cursor = next;
  }
}

/// `cloneNode(deep)` (spec §4.1): copies the kind-specific payload
/// (attributes for Element), then recursively clones children iff
/// `deep`. The clone has no parent; its owner document is that of the
/// source.
pub(crate) fn clone_node(source: &Node, deep: bool) -> Node {
  let doc = source.owner_document();
  let data = clone_payload_detached(source);
  let new_id = doc.alloc(data);
  let clone = doc.node(new_id);
  if deep {
    for child in source.children() {
      let child_clone = clone_node(&child, true);
      link_nodes(&doc, new_id, clone.last_child().map(|n| n.id()), None, &[child_clone.id()]);
    }
  }
  clone
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::document::Document;

  #[test]
  fn append_child_updates_sibling_links() {
    let doc = Document::new_html_document(None);
    let div = doc.create_element("div").unwrap();
    doc.root_element().unwrap().append_child(&div).unwrap();
    let a = doc.create_element("a").unwrap();
    let b = doc.create_element("b").unwrap();
    div.append_child(&a).unwrap();
    div.append_child(&b).unwrap();
    assert_eq!(div.first_child().unwrap().id(), a.id());
    assert_eq!(div.last_child().unwrap().id(), b.id());
    assert_eq!(a.next_sibling().unwrap().id(), b.id());
    assert_eq!(b.previous_sibling().unwrap().id(), a.id());
  }

  #[test]
  fn appending_element_as_second_document_child_is_rejected() {
    let doc = Document::new_html_document(None);
    let extra = doc.create_element("div").unwrap();
    let err = doc.root_node().append_child(&extra).unwrap_err();
    assert_eq!(err.name(), "HierarchyRequestError");
  }

  #[test]
  fn insert_ancestor_into_descendant_is_rejected() {
    let doc = Document::new_html_document(None);
    let div = doc.create_element("div").unwrap();
    doc.root_element().unwrap().append_child(&div).unwrap();
    let span = doc.create_element("span").unwrap();
    div.append_child(&span).unwrap();
    let err = span.append_child(&div).unwrap_err();
    assert_eq!(err.name(), "HierarchyRequestError");
  }

  #[test]
  fn remove_then_reinsert_elsewhere_moves_node() {
    let doc = Document::new_html_document(None);
    let div = doc.create_element("div").unwrap();
    doc.root_element().unwrap().append_child(&div).unwrap();
    let a = doc.create_element("a").unwrap();
    div.append_child(&a).unwrap();
    let span = doc.create_element("span").unwrap();
    doc.root_element().unwrap().append_child(&span).unwrap();
    span.append_child(&a).unwrap();
    assert_eq!(div.child_count(), 0);
    assert_eq!(a.parent().unwrap().id(), span.id());
  }

  #[test]
  fn moving_a_non_first_child_reports_its_real_former_siblings() {
    // Regression: `adopt_into` used to read the detached node's sibling
    // links *after* `do_remove` had already nulled them, so the removal
    // notification always reported `previousSibling=None` — corrupting any
    // range boundary anchored past the moved node's former position.
    let doc = Document::new_html_document(None);
    let div = doc.create_element("div").unwrap();
    doc.root_element().unwrap().append_child(&div).unwrap();
    let a = doc.create_element("a").unwrap();
    let b = doc.create_element("b").unwrap();
    let c = doc.create_element("c").unwrap();
    div.append_child(&a).unwrap();
    div.append_child(&b).unwrap();
    div.append_child(&c).unwrap();

    let range = crate::range::Range::new(&doc);
    range.set_start(&div, 1).unwrap();
    range.set_end(&div, 1).unwrap();

    let span = doc.create_element("span").unwrap();
    doc.root_element().unwrap().append_child(&span).unwrap();
    span.append_child(&b).unwrap();

    assert_eq!(range.start().offset, 1);
    assert_eq!(range.end().offset, 1);
  }

  #[test]
  fn normalize_merges_adjacent_text_and_drops_empty() {
    let doc = Document::new_html_document(None);
    let div = doc.create_element("div").unwrap();
    doc.root_element().unwrap().append_child(&div).unwrap();
    div.append_child(&doc.create_text_node("a")).unwrap();
    div.append_child(&doc.create_text_node("")).unwrap();
    div.append_child(&doc.create_text_node("b")).unwrap();
    div.normalize();
    assert_eq!(div.child_count(), 1);
    assert_eq!(div.first_child().unwrap().text_content(), "ab");
  }

  #[test]
  fn clone_deep_copies_attributes_and_children() {
    let doc = Document::new_html_document(None);
    let div = doc.create_element("div").unwrap();
    div.set_attribute("id", "x").unwrap();
    let span = doc.create_element("span").unwrap();
    div.append_child(&span).unwrap();
    let clone = div.clone_node(true);
    assert!(clone.parent().is_none());
    assert_eq!(clone.get_attribute("id").as_deref(), Some("x"));
    assert_eq!(clone.child_count(), 1);
    assert_eq!(clone.first_child().unwrap().node_name(), "SPAN");
  }

  #[test]
  fn replace_child_fires_single_notification() {
    let doc = Document::new_html_document(None);
    let div = doc.create_element("div").unwrap();
    doc.root_element().unwrap().append_child(&div).unwrap();
    let a = doc.create_element("a").unwrap();
    div.append_child(&a).unwrap();
    let count = std::rc::Rc::new(std::cell::Cell::new(0));
    let c = count.clone();
    doc.observers().on_child_list(Box::new(move |_| c.set(c.get() + 1)));
    let b = doc.create_element("b").unwrap();
    div.replace_child(&b, &a).unwrap();
    assert_eq!(count.get(), 1);
    assert_eq!(div.first_child().unwrap().id(), b.id());
  }
}
