//! Live Views (spec §4.6): `HtmlCollection` (Element-only, live) and
//! `NodeListView` (live-over-direct-children, or a static snapshot), plus
//! the element-tree convenience accessors and `getElementById` search that
//! ride the same non-caching traversal (spec §9: "Live views: do not
//! cache — every query re-walks the tree").

use crate::node::{Node, NodeKind};

fn is_ascii_ws(c: char) -> bool {
  matches!(c, ' ' | '\t' | '\n' | '\x0C' | '\r')
}

#[derive(Debug, Clone)]
enum ElementFilter {
  Any,
  TagName(String),
  ClassNames(Vec<String>),
  NamespaceLocalName { ns: Option<String>, local: String },
}

impl ElementFilter {
  fn matches(&self, el: &Node) -> bool {
    match self {
      ElementFilter::Any => true,
      ElementFilter::TagName(name) => {
        if name == "*" {
          return true;
        }
        let html_doc = el.owner_document().content_type().is_html();
        let tag = el.node_name();
        if html_doc {
          tag.eq_ignore_ascii_case(name)
        } else {
          tag == *name
        }
      }
      ElementFilter::ClassNames(classes) => {
        let attr = el.class_name();
        let tokens: Vec<&str> = attr.split(is_ascii_ws).filter(|s| !s.is_empty()).collect();
        !classes.is_empty() && classes.iter().all(|c| tokens.iter().any(|t| t == c))
      }
      ElementFilter::NamespaceLocalName { ns, local } => {
        let ns_ok = match ns.as_deref() {
          Some("*") => true,
          Some(n) => el.namespace_uri().as_deref() == Some(n),
          None => el.namespace_uri().is_none(),
        };
        let local_ok = local == "*" || el.local_name().as_deref() == Some(local.as_str());
        ns_ok && local_ok
      }
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
  Descendants,
  DirectChildren,
}

/// `HTMLCollection` (spec §4.6): a live, Element-only collection,
/// recomputed from scratch on every call.
#[derive(Clone)]
pub struct HtmlCollection {
  root: Node,
  scope: Scope,
  filter: ElementFilter,
}

impl HtmlCollection {
  fn collect(&self) -> Vec<Node> {
    match self.scope {
      Scope::DirectChildren => self
        .root
        .children()
        .into_iter()
        .filter(|n| n.is_element() && self.filter.matches(n))
        .collect(),
      Scope::Descendants => {
        let mut out = Vec::new();
        collect_descendant_elements(&self.root, &self.filter, &mut out);
        out
      }
    }
  }

  pub fn length(&self) -> usize {
    self.collect().len()
  }

  pub fn item(&self, index: usize) -> Option<Node> {
    self.collect().into_iter().nth(index)
  }

  pub fn to_vec(&self) -> Vec<Node> {
    self.collect()
  }
}

fn collect_descendant_elements(root: &Node, filter: &ElementFilter, out: &mut Vec<Node>) {
  for child in root.children() {
    if child.is_element() {
      if filter.matches(&child) {
        out.push(child.clone());
      }
      collect_descendant_elements(&child, filter, out);
    } else if child.kind() == NodeKind::DocumentFragment {
      collect_descendant_elements(&child, filter, out);
    }
  }
}

/// `NodeList` (spec §4.6): either live over a node's direct children
/// (`childNodes`), or a static, immutable snapshot (`querySelectorAll`).
#[derive(Clone)]
pub enum NodeListView {
  Live(Node),
  Static(Vec<Node>),
}

impl NodeListView {
  pub fn length(&self) -> usize {
    match self {
      NodeListView::Live(root) => root.child_count(),
      NodeListView::Static(v) => v.len(),
    }
  }

  pub fn item(&self, index: usize) -> Option<Node> {
    match self {
      NodeListView::Live(root) => root.children().into_iter().nth(index),
      NodeListView::Static(v) => v.get(index).cloned(),
    }
  }

  pub fn to_vec(&self) -> Vec<Node> {
    match self {
      NodeListView::Live(root) => root.children(),
      NodeListView::Static(v) => v.clone(),
    }
  }
}

impl Node {
  /// `childNodes` (spec §4.6): live, every direct child regardless of
  /// kind.
  pub fn child_nodes(&self) -> NodeListView {
    NodeListView::Live(self.clone())
  }

  pub fn get_elements_by_tag_name(&self, name: &str) -> HtmlCollection {
    HtmlCollection {
      root: self.clone(),
      scope: Scope::Descendants,
      filter: ElementFilter::TagName(name.to_string()),
    }
  }

  pub fn get_elements_by_tag_name_ns(&self, ns: Option<&str>, local_name: &str) -> HtmlCollection {
    HtmlCollection {
      root: self.clone(),
      scope: Scope::Descendants,
      filter: ElementFilter::NamespaceLocalName {
        ns: ns.map(str::to_string),
        local: local_name.to_string(),
      },
    }
  }

  pub fn get_elements_by_class_name(&self, names: &str) -> HtmlCollection {
    let classes = names.split(is_ascii_ws).filter(|s| !s.is_empty()).map(str::to_string).collect();
    HtmlCollection {
      root: self.clone(),
      scope: Scope::Descendants,
      filter: ElementFilter::ClassNames(classes),
    }
  }

  /// `children` (SPEC_FULL §B.2): direct Element-kind children only, as a
  /// live `HTMLCollection`.
  pub fn children_collection(&self) -> HtmlCollection {
    HtmlCollection {
      root: self.clone(),
      scope: Scope::DirectChildren,
      filter: ElementFilter::Any,
    }
  }

  pub fn first_element_child(&self) -> Option<Node> {
    self.children().into_iter().find(|n| n.is_element())
  }

  pub fn last_element_child(&self) -> Option<Node> {
    self.children().into_iter().rev().find(|n| n.is_element())
  }

  pub fn next_element_sibling(&self) -> Option<Node> {
    let mut cur = self.next_sibling();
    while let Some(n) = cur {
      if n.is_element() {
        return Some(n);
      }
      cur = n.next_sibling();
    }
    None
  }

  pub fn previous_element_sibling(&self) -> Option<Node> {
    let mut cur = self.previous_sibling();
    while let Some(n) = cur {
      if n.is_element() {
        return Some(n);
      }
      cur = n.previous_sibling();
    }
    None
  }

  pub fn child_element_count(&self) -> usize {
    self.children().into_iter().filter(|n| n.is_element()).count()
  }

  /// `getElementById` (SPEC_FULL §B.3): a live, depth-first, document-order
  /// search keyed on the `id` attribute. Usable from a `Document`'s root
  /// node, a `DocumentFragment`, or any other node as a convenience.
  pub fn get_element_by_id(&self, id: &str) -> Option<Node> {
    if id.is_empty() {
      return None;
    }
    find_by_id(self, id)
  }
}

fn find_by_id(root: &Node, id: &str) -> Option<Node> {
  for child in root.children() {
    if child.is_element() && child.id_attribute() == id {
      return Some(child);
    }
    if let Some(found) = find_by_id(&child, id) {
      return Some(found);
    }
  }
  None
}
