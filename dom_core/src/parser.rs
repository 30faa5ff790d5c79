//! Parser collaborator seam (spec §6/SPEC_FULL §A.6): `Document` as an
//! `html5ever`/`xml5ever` `TreeSink` implementor, so an unmodified tokenizer
//! and tree builder can hydrate a tree through the public mutation
//! primitives (§4.2) instead of a bespoke parser living inside this crate.
//! Grounded directly on the teacher's own `rcdom.rs` `TreeSink` impl, kept
//! method-for-method, generalized from its `Rc<Node>` tree onto this crate's
//! arena-and-index `Node`/`Document`.

use std::borrow::Cow;
use std::rc::Rc;

use html5ever::tendril::TendrilSink;
use html5ever::tendril::StrTendril;
use html5ever::{driver, ExpandedName, QualName};
use markup5ever::interface::{ElementFlags, NodeOrText};
use markup5ever::interface::QuirksMode as ServoQuirksMode;
use markup5ever::interface::TreeSink;
use markup5ever::Attribute;

use crate::document::Document;
use crate::node::{Node, NodeKind};
use crate::quirks_mode::QuirksMode;

/// A `TreeSink::Handle`: the node it stands for, plus (for elements) the
/// `QualName` the tree builder is allowed to ask for back via `elem_name`.
///
/// `Document`'s arena is `RefCell`-guarded, so an `&'a Handle` alone cannot
/// hand back an `&'a QualName` the way the teacher's un-guarded `Rc<Node>`
/// does; caching an owned `Rc<QualName>` at creation time sidesteps that
/// without cloning the name on every `elem_name` call.
#[derive(Clone)]
pub struct SinkHandle {
  node: Node,
  name: Option<Rc<QualName>>,
}

impl SinkHandle {
  fn plain(node: Node) -> Self {
    SinkHandle { node, name: None }
  }

  /// The underlying tree node, once parsing is complete.
  pub fn node(&self) -> &Node {
    &self.node
  }
}

fn attr_namespace(attr: &Attribute) -> Option<String> {
  if attr.name.ns.is_empty() {
    None
  } else {
    Some(attr.name.ns.to_string())
  }
}

/// The `TreeSink` collaborator itself: a thin wrapper around the `Document`
/// being built, exactly as the teacher's `RcDom` wraps its own root `Handle`.
pub struct DocumentSink {
  doc: Rc<Document>,
}

impl DocumentSink {
  pub fn new(doc: Rc<Document>) -> Self {
    DocumentSink { doc }
  }

  /// The document under construction, available mid-parse (the tree
  /// builder mutates it through the `TreeSink` methods below as tokens
  /// arrive).
  pub fn document(&self) -> &Rc<Document> {
    &self.doc
  }
}

impl TreeSink for DocumentSink {
  type Output = Rc<Document>;
  type Handle = SinkHandle;
  type ElemName<'a>
    = ExpandedName<'a>
  where
    Self: 'a;

  fn finish(self) -> Rc<Document> {
    self.doc
  }

  fn parse_error(&self, msg: Cow<'static, str>) {
    log::debug!("parse error: {msg}");
  }

  fn get_document(&self) -> SinkHandle {
    SinkHandle::plain(self.doc.root_node())
  }

  fn get_template_contents(&self, target: &SinkHandle) -> SinkHandle {
    let frag_id = target
      .node
      .with_element(|e| e.template_contents)
      .flatten()
      .expect("get_template_contents called on a non-template element");
    SinkHandle::plain(self.doc.node(frag_id))
  }

  fn set_quirks_mode(&self, mode: ServoQuirksMode) {
    self.doc.set_compat_mode(QuirksMode::from(mode).into());
  }

  fn same_node(&self, x: &SinkHandle, y: &SinkHandle) -> bool {
    x.node == y.node
  }

  fn elem_name<'a>(&'a self, target: &'a SinkHandle) -> ExpandedName<'a> {
    target
      .name
      .as_ref()
      .expect("elem_name called on a non-element handle")
      .expanded()
  }

  fn create_element(&self, name: QualName, attrs: Vec<Attribute>, flags: ElementFlags) -> SinkHandle {
    let node = self.doc.create_qualname_element(name.clone());
    node.with_element_mut(|e| {
      for attr in attrs {
        let ns = attr_namespace(&attr);
        e.attributes.borrow_mut().add_if_missing(ns.as_deref(), attr.name, attr.value.to_string());
      }
      if flags.template {
        let contents = self.doc.create_document_fragment();
        e.template_contents = Some(contents.id());
      }
      e.mathml_annotation_xml_integration_point = flags.mathml_annotation_xml_integration_point;
    });
    SinkHandle { node, name: Some(Rc::new(name)) }
  }

  fn create_comment(&self, text: StrTendril) -> SinkHandle {
    SinkHandle::plain(self.doc.create_comment(&text))
  }

  fn create_pi(&self, target: StrTendril, data: StrTendril) -> SinkHandle {
    let node = self
      .doc
      .create_processing_instruction(&target, &data)
      .expect("parser-supplied processing instruction target is a valid Name");
    SinkHandle::plain(node)
  }

  fn append(&self, parent: &SinkHandle, child: NodeOrText<SinkHandle>) {
    if let NodeOrText::AppendText(ref text) = child {
      if let Some(last) = parent.node.last_child() {
        if last.kind() == NodeKind::Text && last.append_data(text).is_ok() {
          return;
        }
      }
    }
    let node = match child {
      NodeOrText::AppendText(text) => self.doc.create_text_node(&text),
      NodeOrText::AppendNode(h) => h.node,
    };
    parent.node.append_child(&node).expect("tree builder maintains hierarchy invariants");
  }

  fn append_before_sibling(&self, sibling: &SinkHandle, new_node: NodeOrText<SinkHandle>) {
    if let NodeOrText::AppendText(ref text) = new_node {
      if let Some(prev) = sibling.node.previous_sibling() {
        if prev.kind() == NodeKind::Text && prev.append_data(text).is_ok() {
          return;
        }
      }
    }
    let node = match new_node {
      NodeOrText::AppendText(text) => self.doc.create_text_node(&text),
      NodeOrText::AppendNode(h) => h.node,
    };
    sibling.node.before(&[node]).expect("tree builder maintains hierarchy invariants");
  }

  fn append_based_on_parent_node(
    &self,
    element: &SinkHandle,
    prev_element: &SinkHandle,
    child: NodeOrText<SinkHandle>,
  ) {
    if element.node.parent().is_some() {
      self.append_before_sibling(element, child);
    } else {
      self.append(prev_element, child);
    }
  }

  fn append_doctype_to_document(&self, name: StrTendril, public_id: StrTendril, system_id: StrTendril) {
    let id = self.doc.alloc(crate::node::NodeData::DocumentType(crate::node::DocumentTypeData {
      name: name.to_string(),
      public_id: public_id.to_string(),
      system_id: system_id.to_string(),
    }));
    self.doc
      .root_node()
      .append_child(&self.doc.node(id))
      .expect("tree builder inserts at most one doctype, before the document element");
  }

  fn add_attrs_if_missing(&self, target: &SinkHandle, attrs: Vec<Attribute>) {
    target.node.with_element_mut(|e| {
      for attr in attrs {
        let ns = attr_namespace(&attr);
        e.attributes.borrow_mut().add_if_missing(ns.as_deref(), attr.name, attr.value.to_string());
      }
    });
  }

  fn remove_from_parent(&self, target: &SinkHandle) {
    target.node.remove().expect("detaching a node cannot fail");
  }

  fn reparent_children(&self, node: &SinkHandle, new_parent: &SinkHandle) {
    for child in node.node.children() {
      new_parent.node.append_child(&child).expect("tree builder maintains hierarchy invariants");
    }
  }

  fn is_mathml_annotation_xml_integration_point(&self, target: &SinkHandle) -> bool {
    target.node.with_element(|e| e.mathml_annotation_xml_integration_point).unwrap_or(false)
  }
}

/// Parse a complete HTML document (spec §6's "HTML parser collaborator").
pub fn parse_html_document(input: &str) -> Rc<Document> {
  let doc = Document::new_empty_for_parsing();
  let sink = DocumentSink::new(doc);
  driver::parse_document(sink, driver::ParseOpts::default()).one(input)
}

/// Parse an HTML fragment into a `DocumentFragment` owned by `context`'s
/// document, using `context` as the fragment parsing algorithm's context
/// element (spec §6).
pub fn parse_html_fragment(context: &Node, input: &str) -> Node {
  let doc = context.owner_document();
  let fragment = doc.create_document_fragment();
  let sink = DocumentSink::new(doc.clone());
  let context_name = context
    .with_element(|e| e.name.clone())
    .unwrap_or_else(|| crate::qualname::qualname(Some(crate::qualname::HTML_NS), None, "body"));
  let parsed_root = driver::parse_fragment(
    sink,
    driver::ParseOpts::default(),
    context_name,
    vec![],
    false,
  )
  .one(input);
  for child in parsed_root.root_node().children() {
    fragment.append_child(&child).expect("fragment children reparent cleanly");
  }
  fragment
}

#[cfg(feature = "xml")]
/// Parse a complete XML document (spec §6's "XML parser collaborator").
pub fn parse_xml_document(input: &str) -> Rc<Document> {
  let doc = Document::new_empty_xml_for_parsing();
  let sink = DocumentSink::new(doc);
  xml5ever::driver::parse_document(sink, xml5ever::driver::XmlParseOpts::default()).one(input)
}
