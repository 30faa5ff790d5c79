//! `DOMImplementation` (spec §6/SPEC_FULL §B.1): the document-construction
//! factory, kept as a thin facade over `Document`'s own constructors so
//! callers that only hold a `DomImplementation` handle can still build
//! documents and doctypes.

use std::rc::Rc;

use crate::document::Document;
use crate::error::DomResult;
use crate::node::{Node, NodeData};
use crate::qualname;

pub struct DomImplementation {
  doc: Rc<Document>,
}

impl DomImplementation {
  pub(crate) fn new(doc: Rc<Document>) -> Self {
    DomImplementation { doc }
  }

  /// `createDocument(namespace, qualifiedName, doctype?)` (spec §6): builds
  /// a fresh document (discarding `self.doc`, which only exists to anchor
  /// the `ns0` prefix counter and observer bus a caller may already be
  /// watching) and, if a doctype node is supplied, inserts it before the
  /// document element.
  pub fn create_document(
    &self,
    namespace: Option<&str>,
    qualified_name: Option<&str>,
    doctype: Option<&Node>,
  ) -> DomResult<Rc<Document>> {
    let doc = Document::new_document(namespace, qualified_name)?;
    if let Some(dt) = doctype {
      let adopted = crate::mutation::adopt_into(&doc, dt);
      let root = doc.root_node();
      let before = root.children().into_iter().find(|n| n.is_element());
      root.insert_before(&adopted, before.as_ref())?;
    }
    Ok(doc)
  }

  /// `createHTMLDocument(title?)` (spec §6).
  pub fn create_html_document(&self, title: Option<&str>) -> Rc<Document> {
    Document::new_html_document(title)
  }

  /// `createDocumentType(name, publicId, systemId)` (spec §6): the
  /// resulting node is detached — owned by this implementation's document
  /// until the caller inserts it somewhere (typically via
  /// [`DomImplementation::create_document`]).
  pub fn create_document_type(&self, name: &str, public_id: &str, system_id: &str) -> DomResult<Node> {
    qualname::validate_name_production(name)?;
    let id = self.doc.alloc(NodeData::DocumentType(crate::node::DocumentTypeData {
      name: name.to_string(),
      public_id: public_id.to_string(),
      system_id: system_id.to_string(),
    }));
    Ok(self.doc.node(id))
  }
}

#[cfg(test)]
mod tests {
  use crate::document::Document;

  #[test]
  fn create_html_document_has_skeleton() {
    let doc = Document::new_html_document(None);
    let imp = doc.implementation();
    let html = imp.create_html_document(Some("Hi"));
    assert_eq!(html.root_element().unwrap().node_name(), "HTML");
  }

  #[test]
  fn create_document_type_is_detached() {
    let doc = Document::new_html_document(None);
    let imp = doc.implementation();
    let dt = imp
      .create_document_type("svg:svg", "-//W3C//DTD SVG 1.1//EN", "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd")
      .unwrap();
    assert!(dt.parent().is_none());
    assert_eq!(dt.doctype_public_id(), "-//W3C//DTD SVG 1.1//EN");
  }

  #[test]
  fn create_document_inserts_doctype_before_document_element() {
    let doc = Document::new_html_document(None);
    let imp = doc.implementation();
    let dt = imp.create_document_type("html", "", "").unwrap();
    let new_doc = imp.create_document(None, Some("root"), Some(&dt)).unwrap();
    let root = new_doc.root_node();
    let kinds: Vec<_> = root.children().iter().map(|n| n.kind()).collect();
    assert_eq!(kinds, vec![crate::node::NodeKind::DocumentType, crate::node::NodeKind::Element]);
  }
}
