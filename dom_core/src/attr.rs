//! The Attribute Store (spec §4.4): per-element ordered sequence of
//! attribute records keyed by `(namespaceURI, localName)`, plus the
//! element-facing get/set/remove/toggle operations and their notification
//! fan-out.

use html5ever::QualName;

use crate::document::Document;
use crate::error::{DomError, DomResult};
use crate::node::Node;
use crate::observer::AttributeChange;
use crate::qualname::{self, qualified_name_string, validate_and_extract, XMLNS_NS};

struct AttrEntry {
  name: QualName,
  value: String,
}

/// An ordered, namespace-aware attribute map (spec I5: unique per
/// `(namespace, localName)`).
#[derive(Default)]
pub struct AttributeStore {
  entries: Vec<AttrEntry>,
}

impl AttributeStore {
  pub fn new() -> Self {
    AttributeStore::default()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Iterate in insertion order, as `(QualName, value)`.
  pub fn iter(&self) -> impl Iterator<Item = (&QualName, &str)> {
    self.entries.iter().map(|e| (&e.name, e.value.as_str()))
  }

  fn position_ns(&self, ns: Option<&str>, local: &str) -> Option<usize> {
    self.entries.iter().position(|e| {
      let entry_ns = if e.name.ns.is_empty() {
        None
      } else {
        Some(&*e.name.ns)
      };
      entry_ns == ns && &*e.name.local == local
    })
  }

  /// Find by non-namespaced name, applying HTML case-insensitivity if
  /// `html_insensitive` is set (element is HTML-namespace in an HTML
  /// document).
  fn position_simple(&self, name: &str, html_insensitive: bool) -> Option<usize> {
    let key = if html_insensitive {
      name.to_ascii_lowercase()
    } else {
      name.to_string()
    };
    self.entries.iter().position(|e| {
      if !e.name.ns.is_empty() {
        return false;
      }
      let qname = qualified_name_string(&e.name);
      if html_insensitive {
        qname.eq_ignore_ascii_case(&key)
      } else {
        qname == key
      }
    })
  }

  pub fn get_value(&self, name: &str, html_insensitive: bool) -> Option<&str> {
    self.position_simple(name, html_insensitive)
      .map(|i| self.entries[i].value.as_str())
  }

  pub fn get_value_ns(&self, ns: Option<&str>, local: &str) -> Option<&str> {
    self.position_ns(ns, local).map(|i| self.entries[i].value.as_str())
  }

  pub fn has(&self, name: &str, html_insensitive: bool) -> bool {
    self.position_simple(name, html_insensitive).is_some()
  }

  pub fn has_ns(&self, ns: Option<&str>, local: &str) -> bool {
    self.position_ns(ns, local).is_some()
  }

  /// `set(name, value)` — the non-namespaced setter. Returns the previous
  /// value (empty string for brand-new attributes, per spec §4.4).
  pub fn set(&mut self, name: &str, value: &str, html_insensitive: bool) -> DomResult<String> {
    qualname::validate_name_production(name)?;
    let stored_name = if html_insensitive {
      name.to_ascii_lowercase()
    } else {
      name.to_string()
    };
    match self.position_simple(name, html_insensitive) {
      Some(i) => {
        let old = std::mem::replace(&mut self.entries[i].value, value.to_string());
        Ok(old)
      }
      None => {
        self.entries.push(AttrEntry {
          name: qualname::qualname(None, None, &stored_name),
          value: value.to_string(),
        });
        Ok(String::new())
      }
    }
  }

  /// `setNS(ns, qualifiedName, value)` (spec §4.4): validates the
  /// qualified name, preserves the stored prefix when updating an
  /// existing `(ns, localName)` pair.
  pub fn set_ns(&mut self, ns: Option<&str>, qualified_name: &str, value: &str) -> DomResult<String> {
    let name = validate_and_extract(ns, qualified_name)?;
    match self.position_ns(ns, &name.local) {
      Some(i) => {
        let old = std::mem::replace(&mut self.entries[i].value, value.to_string());
        Ok(old)
      }
      None => {
        self.entries.push(AttrEntry {
          name,
          value: value.to_string(),
        });
        Ok(String::new())
      }
    }
  }

  pub fn remove(&mut self, name: &str, html_insensitive: bool) -> Option<(QualName, String)> {
    let i = self.position_simple(name, html_insensitive)?;
    let entry = self.entries.remove(i);
    Some((entry.name, entry.value))
  }

  pub fn remove_ns(&mut self, ns: Option<&str>, local: &str) -> Option<(QualName, String)> {
    let i = self.position_ns(ns, local)?;
    let entry = self.entries.remove(i);
    Some((entry.name, entry.value))
  }

  /// `add_attrs_if_missing`, used by the HTML tree-builder collaborator
  /// (spec §6): append each attribute whose `(ns, localName)` is not
  /// already present, silently dropping the rest.
  pub(crate) fn add_if_missing(&mut self, ns: Option<&str>, name: QualName, value: String) {
    if self.position_ns(ns, &name.local).is_none() {
      self.entries.push(AttrEntry { name, value });
    }
  }
}

/// True when non-namespaced attribute lookups on `element` should
/// ASCII-lowercase the input name (spec §4.4 "Case handling"): the element
/// is in the HTML namespace and its owner document is an HTML document.
pub(crate) fn html_insensitive_lookup(node: &Node) -> bool {
  let doc_is_html = node.owner_document().content_type().is_html();
  let el_is_html = node
    .with_element(|e| e.name.ns == html5ever::ns!(html))
    .unwrap_or(false);
  doc_is_html && el_is_html
}

impl Node {
  /// `getValue(name)` / Element.getAttribute.
  pub fn get_attribute(&self, name: &str) -> Option<String> {
    let insensitive = html_insensitive_lookup(self);
    self.with_element(|e| {
      e.attributes
        .borrow()
        .get_value(name, insensitive)
        .map(|s| s.to_string())
    })
    .flatten()
  }

  pub fn get_attribute_ns(&self, ns: Option<&str>, local_name: &str) -> Option<String> {
    self.with_element(|e| {
      e.attributes
        .borrow()
        .get_value_ns(ns, local_name)
        .map(|s| s.to_string())
    })
    .flatten()
  }

  pub fn has_attribute(&self, name: &str) -> bool {
    let insensitive = html_insensitive_lookup(self);
    self.with_element(|e| e.attributes.borrow().has(name, insensitive))
      .unwrap_or(false)
  }

  pub fn has_attribute_ns(&self, ns: Option<&str>, local_name: &str) -> bool {
    self.with_element(|e| e.attributes.borrow().has_ns(ns, local_name))
      .unwrap_or(false)
  }

  /// `set(name, value)`: fires an `attribute` notification after the
  /// store is updated, with `oldValue` = "" for brand-new attributes.
  pub fn set_attribute(&self, name: &str, value: &str) -> DomResult<()> {
    let insensitive = html_insensitive_lookup(self);
    let old = self
      .with_element_mut(|e| e.attributes.borrow_mut().set(name, value, insensitive))
      .ok_or_else(|| DomError::invalid_character("setAttribute called on a non-element node"))??;
    self.owner_document().observers().notify_attribute(AttributeChange {
      target: self.id(),
      local_name: if insensitive { name.to_ascii_lowercase() } else { name.to_string() },
      namespace: None,
      old_value: old,
    });
    Ok(())
  }

  pub fn set_attribute_ns(&self, ns: Option<&str>, qualified_name: &str, value: &str) -> DomResult<()> {
    let old = self
      .with_element_mut(|e| e.attributes.borrow_mut().set_ns(ns, qualified_name, value))
      .ok_or_else(|| DomError::invalid_character("setAttributeNS called on a non-element node"))??;
    let (_, local) = qualname::split_qualified_name(qualified_name)?;
    self.owner_document().observers().notify_attribute(AttributeChange {
      target: self.id(),
      local_name: local.to_string(),
      namespace: ns.map(|s| s.to_string()),
      old_value: old,
    });
    Ok(())
  }

  pub fn remove_attribute(&self, name: &str) {
    let insensitive = html_insensitive_lookup(self);
    let removed = self.with_element_mut(|e| e.attributes.borrow_mut().remove(name, insensitive)).flatten();
    if let Some((qname, old)) = removed {
      self.owner_document().observers().notify_attribute(AttributeChange {
        target: self.id(),
        local_name: qname.local.to_string(),
        namespace: if qname.ns.is_empty() { None } else { Some(qname.ns.to_string()) },
        old_value: old,
      });
    }
  }

  pub fn remove_attribute_ns(&self, ns: Option<&str>, local_name: &str) {
    let removed = self.with_element_mut(|e| e.attributes.borrow_mut().remove_ns(ns, local_name)).flatten();
    if let Some((qname, old)) = removed {
      self.owner_document().observers().notify_attribute(AttributeChange {
        target: self.id(),
        local_name: qname.local.to_string(),
        namespace: ns.map(|s| s.to_string()),
        old_value: old,
      });
    }
  }

  /// `toggle(name, force?)`: returns whether the attribute is present
  /// after the call.
  pub fn toggle_attribute(&self, name: &str, force: Option<bool>) -> DomResult<bool> {
    let present = self.has_attribute(name);
    let should_be_present = force.unwrap_or(!present);
    if should_be_present && !present {
      self.set_attribute(name, "")?;
      Ok(true)
    } else if !should_be_present && present {
      self.remove_attribute(name);
      Ok(false)
    } else {
      Ok(present)
    }
  }

  /// `id` / `className` are thin attribute-store accessors (SPEC_FULL §B.2).
  pub fn id_attribute(&self) -> String {
    self.get_attribute("id").unwrap_or_default()
  }

  pub fn set_id_attribute(&self, value: &str) -> DomResult<()> {
    self.set_attribute("id", value)
  }

  pub fn class_name(&self) -> String {
    self.get_attribute("class").unwrap_or_default()
  }

  pub fn set_class_name(&self, value: &str) -> DomResult<()> {
    self.set_attribute("class", value)
  }

  /// Attributes never bind to the XMLNS namespace without an explicit
  /// `xmlns`/`xmlns:*` name — a convenience check used by the XML
  /// serializer (spec §4.10) when deciding whether to treat an attribute
  /// as a namespace declaration.
  pub(crate) fn attribute_is_xmlns_declaration(name: &QualName) -> bool {
    &*name.ns == XMLNS_NS
  }

  /// `(qualifiedName, value)` pairs in insertion order, for the HTML
  /// serializer (spec §4.10) which only cares about the printable name.
  pub(crate) fn attribute_pairs(&self) -> Vec<(String, String)> {
    self.with_element(|e| {
      e.attributes
        .borrow()
        .iter()
        .map(|(n, v)| (qualified_name_string(n), v.to_string()))
        .collect()
    })
    .unwrap_or_default()
  }

  /// `(localName, namespaceURI, value)` triples in insertion order, for
  /// the XML serializer (spec §4.10), which needs the namespace to decide
  /// whether a fresh prefix declaration is required.
  pub(crate) fn attribute_triples(&self) -> Vec<(String, Option<String>, String)> {
    self.with_element(|e| {
      e.attributes
        .borrow()
        .iter()
        .map(|(n, v)| {
          let ns = if n.ns.is_empty() { None } else { Some(n.ns.to_string()) };
          (n.local.to_string(), ns, v.to_string())
        })
        .collect()
    })
    .unwrap_or_default()
  }
}
