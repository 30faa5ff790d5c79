//! `Document`: owner of the node arena (spec §3/§9 "arena-and-index"), the
//! per-document Observer Bus and Range Registry (spec §4.8/§4.9), and the
//! factory operations that create detached nodes (spec §3 "Lifecycle").

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use html5ever::QualName;

use crate::arena::{Arena, NodeId};
use crate::attr::AttributeStore;
use crate::error::{DomError, DomResult};
use crate::layout::ElementGeometry;
use crate::node::{
  CharacterBuffer, CompatMode, ContentType, DocumentData, DocumentFragmentData,
  DocumentTypeData, ElementData, Node, NodeData, NodeRecord, ProcessingInstructionData,
};
use crate::observer::ObserverBus;
use crate::qualname;
use crate::range::RangeRegistry;

pub struct Document {
  self_weak: RefCell<Weak<Document>>,
  arena: RefCell<Arena<NodeRecord>>,
  root: NodeId,
  observers: ObserverBus,
  ranges: RangeRegistry,
  ns_prefix_counter: Cell<u32>,
}

impl Document {
  /// `DOMImplementation.createDocument` (spec §6): content type is
  /// derived from the namespace URI.
  pub fn new_document(namespace: Option<&str>, qualified_name: Option<&str>) -> DomResult<Rc<Document>> {
    let content_type = ContentType::from_namespace(namespace.unwrap_or(""));
    let doc = Document::new_empty(content_type);
    if let Some(qname) = qualified_name {
      if !qname.is_empty() {
        let el = doc.create_element_ns_detached(namespace, qname)?;
        doc.root_node().append_child(&el)?;
      }
    }
    Ok(doc)
  }

  /// `DOMImplementation.createHTMLDocument(title?)` (spec §6): materializes
  /// `<!DOCTYPE html><html><head>[<title>?]</head><body></body></html>`.
  /// The title element exists iff `title` is `Some`, distinguishing
  /// "title present but empty" from "no title element at all".
  pub fn new_html_document(title: Option<&str>) -> Rc<Document> {
    let doc = Document::new_empty(ContentType::Html);
    let root = doc.root_node();

    let doctype = doc.alloc(NodeData::DocumentType(DocumentTypeData {
      name: "html".to_string(),
      public_id: String::new(),
      system_id: String::new(),
    }));
    root.append_child(&doc.node(doctype)).expect("doctype insertion cannot fail");

    let html = doc.create_element("html").expect("html is a valid name");
    root.append_child(&html).expect("single element child cannot fail");

    let head = doc.create_element("head").expect("head is a valid name");
    html.append_child(&head).expect("head insertion cannot fail");

    if let Some(title_text) = title {
      let title_el = doc.create_element("title").expect("title is a valid name");
      let text = doc.create_text_node(title_text);
      title_el.append_child(&text).expect("text insertion cannot fail");
      head.append_child(&title_el).expect("title insertion cannot fail");
    }

    let body = doc.create_element("body").expect("body is a valid name");
    html.append_child(&body).expect("body insertion cannot fail");

    doc
  }

  /// An empty, rootless-element HTML document for a parser collaborator to
  /// hydrate via [`crate::parser::DocumentSink`] (spec §6).
  pub fn new_empty_for_parsing() -> Rc<Document> {
    Document::new_empty(ContentType::Html)
  }

  /// As [`Document::new_empty_for_parsing`], but for the XML parser
  /// collaborator, whose documents are never HTML.
  pub fn new_empty_xml_for_parsing() -> Rc<Document> {
    Document::new_empty(ContentType::Xml)
  }

  fn new_empty(content_type: ContentType) -> Rc<Document> {
    Rc::new_cyclic(|weak| {
      let mut arena = Arena::new();
      let root = arena.insert(NodeRecord::new(NodeData::Document(DocumentData {
        content_type,
        url: RefCell::new("about:blank".to_string()),
        character_set: RefCell::new("UTF-8".to_string()),
        compat_mode: Cell::new(CompatMode::NoQuirks),
      })));
      Document {
        self_weak: RefCell::new(weak.clone()),
        arena: RefCell::new(arena),
        root,
        observers: ObserverBus::default(),
        ranges: RangeRegistry::default(),
        ns_prefix_counter: Cell::new(0),
      }
    })
  }

  fn self_rc(&self) -> Rc<Document> {
    self.self_weak
      .borrow()
      .upgrade()
      .expect("Document outlived its own Rc — internal invariant violation")
  }

  pub fn node(&self, id: NodeId) -> Node {
    Node { doc: self.self_rc(), id }
  }

  /// Handle to the `Document` node itself (the arena root).
  pub fn root_node(&self) -> Node {
    self.node(self.root)
  }

  pub fn root_id(&self) -> NodeId {
    self.root
  }

  /// The document element (spec I3): the sole Element child of the
  /// Document node, if any.
  pub fn root_element(&self) -> Option<Node> {
    self.root_node().children().into_iter().find(|n| n.is_element())
  }

  pub fn doctype(&self) -> Option<Node> {
    self.root_node()
      .children()
      .into_iter()
      .find(|n| n.kind() == crate::node::NodeKind::DocumentType)
  }

  pub fn content_type(&self) -> ContentType {
    self.with_node(self.root, |n| match &n.data {
      NodeData::Document(d) => d.content_type,
      _ => unreachable!("document root is always a Document node"),
    })
  }

  pub fn url(&self) -> String {
    self.with_node(self.root, |n| match &n.data {
      NodeData::Document(d) => d.url.borrow().clone(),
      _ => unreachable!(),
    })
  }

  pub fn set_url(&self, url: impl Into<String>) {
    self.with_node(self.root, |n| match &n.data {
      NodeData::Document(d) => *d.url.borrow_mut() = url.into(),
      _ => unreachable!(),
    })
  }

  pub fn character_set(&self) -> String {
    self.with_node(self.root, |n| match &n.data {
      NodeData::Document(d) => d.character_set.borrow().clone(),
      _ => unreachable!(),
    })
  }

  pub fn compat_mode(&self) -> CompatMode {
    self.with_node(self.root, |n| match &n.data {
      NodeData::Document(d) => d.compat_mode.get(),
      _ => unreachable!(),
    })
  }

  pub fn set_compat_mode(&self, mode: CompatMode) {
    self.with_node(self.root, |n| match &n.data {
      NodeData::Document(d) => d.compat_mode.set(mode),
      _ => unreachable!(),
    })
  }

  pub fn observers(&self) -> &ObserverBus {
    &self.observers
  }

  pub fn ranges(&self) -> &RangeRegistry {
    &self.ranges
  }

  pub fn implementation(&self) -> crate::implementation::DomImplementation {
    crate::implementation::DomImplementation::new(self.self_rc())
  }

  /// Generates the next `nsN` prefix for the XML serializer's namespace
  /// map (spec §4.10).
  pub fn next_ns_prefix(&self) -> String {
    let n = self.ns_prefix_counter.get();
    self.ns_prefix_counter.set(n + 1);
    format!("ns{n}")
  }

  // -- arena plumbing -----------------------------------------------

  pub(crate) fn with_node<T>(&self, id: NodeId, f: impl FnOnce(&NodeRecord) -> T) -> T {
    let arena = self.arena.borrow();
    let rec = arena.get(id).expect("stale or foreign NodeId");
    f(rec)
  }

  pub(crate) fn with_node_mut<T>(&self, id: NodeId, f: impl FnOnce(&mut NodeRecord) -> T) -> T {
    let mut arena = self.arena.borrow_mut();
    let rec = arena.get_mut(id).expect("stale or foreign NodeId");
    f(rec)
  }

  pub(crate) fn alloc(&self, data: NodeData) -> NodeId {
    self.arena.borrow_mut().insert(NodeRecord::new(data))
  }

  /// Recursively free a detached subtree's arena slots. Only called once
  /// a subtree has been fully migrated elsewhere (cross-document adopt)
  /// or is provably unreachable; ordinary `removeChild` leaves the
  /// detached node allocated (spec I7: a detached node stays valid, with
  /// null parent/siblings).
  pub(crate) fn free_subtree(&self, id: NodeId) {
    let children: Vec<NodeId> = {
      let mut cur = self.with_node(id, |n| n.first_child);
      let mut out = Vec::new();
      while let Some(c) = cur {
        out.push(c);
        cur = self.with_node(c, |n| n.next_sibling);
      }
      out
    };
    for c in children {
      self.free_subtree(c);
    }
    self.arena.borrow_mut().remove(id);
  }

  // -- factory operations (spec §3 "Lifecycle") ----------------------

  pub fn create_element(&self, local_name: &str) -> DomResult<Node> {
    qualname::validate_name_production(local_name)?;
    let html_ns = self.content_type().is_html();
    let stored_local = if html_ns {
      local_name.to_ascii_lowercase()
    } else {
      local_name.to_string()
    };
    let ns = if html_ns { Some(crate::qualname::HTML_NS) } else { None };
    let name = qualname::qualname(ns, None, &stored_local);
    let id = self.alloc(NodeData::Element(ElementData {
      name,
      local_name: stored_local,
      attributes: RefCell::new(AttributeStore::new()),
      template_contents: None,
      shadow_root: None,
      geometry: RefCell::new(None),
      mathml_annotation_xml_integration_point: false,
    }));
    Ok(self.node(id))
  }

  pub fn create_element_ns(&self, namespace: Option<&str>, qualified_name: &str) -> DomResult<Node> {
    self.create_element_ns_detached(namespace, qualified_name)
  }

  fn create_element_ns_detached(&self, namespace: Option<&str>, qualified_name: &str) -> DomResult<Node> {
    let name = qualname::validate_and_extract(namespace, qualified_name)?;
    let html_ns = name.ns == html5ever::ns!(html) && self.content_type().is_html();
    let local_name = if html_ns {
      name.local.to_ascii_lowercase()
    } else {
      name.local.to_string()
    };
    let id = self.alloc(NodeData::Element(ElementData {
      name,
      local_name,
      attributes: RefCell::new(AttributeStore::new()),
      template_contents: None,
      shadow_root: None,
      geometry: RefCell::new(None),
      mathml_annotation_xml_integration_point: false,
    }));
    Ok(self.node(id))
  }

  pub fn create_text_node(&self, data: &str) -> Node {
    let id = self.alloc(NodeData::Text(CharacterBuffer::new(data)));
    self.node(id)
  }

  pub fn create_comment(&self, data: &str) -> Node {
    let id = self.alloc(NodeData::Comment(CharacterBuffer::new(data)));
    self.node(id)
  }

  /// `createCDATASection` (spec §6): fails with `NotSupportedError` for
  /// HTML documents (I8).
  pub fn create_cdata_section(&self, data: &str) -> DomResult<Node> {
    if !self.content_type().allows_cdata() {
      return Err(DomError::not_supported(
        "createCDATASection is not supported in HTML documents",
      ));
    }
    let id = self.alloc(NodeData::CDATASection(CharacterBuffer::new(data)));
    Ok(self.node(id))
  }

  pub fn create_processing_instruction(&self, target: &str, data: &str) -> DomResult<Node> {
    qualname::validate_name_production(target)?;
    let id = self.alloc(NodeData::ProcessingInstruction(ProcessingInstructionData {
      target: target.to_string(),
      buffer: CharacterBuffer::new(data),
    }));
    Ok(self.node(id))
  }

  pub fn create_document_fragment(&self) -> Node {
    let id = self.alloc(NodeData::DocumentFragment(DocumentFragmentData { host: None }));
    self.node(id)
  }

  pub(crate) fn create_qualname_element(&self, name: QualName) -> Node {
    let html_ns = name.ns == html5ever::ns!(html) && self.content_type().is_html();
    let local_name = if html_ns {
      name.local.to_ascii_lowercase()
    } else {
      name.local.to_string()
    };
    let id = self.alloc(NodeData::Element(ElementData {
      name,
      local_name,
      attributes: RefCell::new(AttributeStore::new()),
      template_contents: None,
      shadow_root: None,
      geometry: RefCell::new(None),
      mathml_annotation_xml_integration_point: false,
    }));
    self.node(id)
  }
}

impl Node {
  pub fn geometry(&self) -> Option<ElementGeometry> {
    self.with_element(|e| *e.geometry.borrow()).flatten()
  }

  pub fn set_geometry(&self, geometry: ElementGeometry) {
    self.with_element(|e| *e.geometry.borrow_mut() = Some(geometry));
  }

  /// `scrollTop` setter (spec §6): clamps negatives to zero, writes
  /// through, triggers no layout.
  pub fn set_scroll_top(&self, value: f64) {
    self.with_element(|e| {
      let mut g = e.geometry.borrow_mut();
      let geo = g.get_or_insert_with(ElementGeometry::default);
      geo.scroll_top = crate::layout::clamp_scroll_offset(value);
    });
  }

  pub fn set_scroll_left(&self, value: f64) {
    self.with_element(|e| {
      let mut g = e.geometry.borrow_mut();
      let geo = g.get_or_insert_with(ElementGeometry::default);
      geo.scroll_left = crate::layout::clamp_scroll_offset(value);
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn html_document_skeleton_has_no_title_by_default() {
    let doc = Document::new_html_document(None);
    let html = doc.root_element().unwrap();
    let head = html.first_child().unwrap();
    assert_eq!(head.node_name(), "HEAD");
    assert_eq!(head.child_count(), 0);
  }

  #[test]
  fn html_document_skeleton_with_title() {
    let doc = Document::new_html_document(Some("Hi"));
    let html = doc.root_element().unwrap();
    let head = html.first_child().unwrap();
    let title = head.first_child().unwrap();
    assert_eq!(title.node_name(), "TITLE");
    assert_eq!(title.text_content(), "Hi");
  }

  #[test]
  fn cdata_rejected_in_html_documents() {
    let doc = Document::new_html_document(None);
    assert!(doc.create_cdata_section("x").is_err());
  }

  #[test]
  fn content_type_derived_from_namespace() {
    let svg_doc = Document::new_document(Some(crate::qualname::SVG_NS), Some("svg")).unwrap();
    assert_eq!(svg_doc.content_type().as_str(), "image/svg+xml");
  }
}
