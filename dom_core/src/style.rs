//! The style declaration (spec §4.5, second half): an ordered property map
//! parsed on demand from the `style` attribute, with `!important` support
//! and camelCase/kebab-case property-name conversion.
//!
//! Mutations reserialize straight back to the `style` attribute through a
//! dedicated write path (`Node::set_style_attribute_raw`, below) rather
//! than `Node::set_attribute`, so a `setProperty` call doesn't re-enter the
//! generic attribute-setter pipeline just to write back a string it itself
//! just parsed from.

use crate::error::DomResult;
use crate::node::Node;
use crate::observer::AttributeChange;

struct Property {
  name: String,
  value: String,
  important: bool,
}

/// `CSSStyleDeclaration` (spec §4.5): backed entirely by the `style`
/// attribute string — no cached parse survives between calls.
pub struct StyleDeclaration {
  element: Node,
}

impl StyleDeclaration {
  pub fn new(element: Node) -> Self {
    StyleDeclaration { element }
  }

  fn properties(&self) -> Vec<Property> {
    let raw = self.element.get_attribute("style").unwrap_or_default();
    parse_style(&raw)
  }

  fn write(&self, props: &[Property]) -> DomResult<()> {
    self.element.set_style_attribute_raw(&serialize_style(props))
  }

  pub fn length(&self) -> usize {
    self.properties().len()
  }

  pub fn item(&self, index: usize) -> Option<String> {
    self.properties().into_iter().nth(index).map(|p| p.name)
  }

  pub fn get_property_value(&self, property: &str) -> String {
    let key = normalize_property_name(property);
    self.properties()
      .into_iter()
      .find(|p| p.name == key)
      .map(|p| p.value)
      .unwrap_or_default()
  }

  pub fn get_property_priority(&self, property: &str) -> String {
    let key = normalize_property_name(property);
    if self.properties().into_iter().any(|p| p.name == key && p.important) {
      "important".to_string()
    } else {
      String::new()
    }
  }

  /// `setProperty(property, value, priority?)`: an empty `value` removes
  /// the property entirely, matching `removeProperty`.
  pub fn set_property(&self, property: &str, value: &str, priority: Option<&str>) -> DomResult<()> {
    let key = normalize_property_name(property);
    let mut props = self.properties();
    if value.is_empty() {
      props.retain(|p| p.name != key);
    } else {
      let important = priority.is_some_and(|p| p.eq_ignore_ascii_case("important"));
      match props.iter_mut().find(|p| p.name == key) {
        Some(p) => {
          p.value = value.to_string();
          p.important = important;
        }
        None => props.push(Property {
          name: key,
          value: value.to_string(),
          important,
        }),
      }
    }
    self.write(&props)
  }

  /// `removeProperty(property)`: returns the value the property had
  /// before removal (empty string if it was not set).
  pub fn remove_property(&self, property: &str) -> String {
    let key = normalize_property_name(property);
    let mut props = self.properties();
    let removed = props
      .iter()
      .find(|p| p.name == key)
      .map(|p| p.value.clone())
      .unwrap_or_default();
    props.retain(|p| p.name != key);
    let _ = self.write(&props);
    removed
  }

  pub fn css_text(&self) -> String {
    serialize_style(&self.properties())
  }

  pub fn set_css_text(&self, text: &str) -> DomResult<()> {
    self.write(&parse_style(text))
  }
}

fn serialize_style(props: &[Property]) -> String {
  props
    .iter()
    .map(|p| {
      if p.important {
        format!("{}: {} !important;", p.name, p.value)
      } else {
        format!("{}: {};", p.name, p.value)
      }
    })
    .collect::<Vec<_>>()
    .join(" ")
}

/// Later declarations of the same property override earlier ones, matching
/// how a browser's style-attribute parser folds duplicate declarations.
fn parse_style(raw: &str) -> Vec<Property> {
  let mut out: Vec<Property> = Vec::new();
  for decl in raw.split(';') {
    let decl = decl.trim();
    if decl.is_empty() {
      continue;
    }
    let Some((name, value)) = decl.split_once(':') else {
      continue;
    };
    let name = normalize_property_name(name.trim());
    if name.is_empty() {
      continue;
    }
    let mut value = value.trim();
    let mut important = false;
    let lower = value.to_ascii_lowercase();
    if let Some(cut) = lower.strip_suffix("!important") {
      value = value[..cut.len()].trim_end();
      important = true;
    }
    if value.is_empty() {
      continue;
    }
    out.retain(|p| p.name != name);
    out.push(Property {
      name,
      value: value.to_string(),
      important,
    });
  }
  out
}

/// camelCase -> kebab-case, with the vendor-prefix special case (spec
/// §4.5): `backgroundColor` -> `background-color`; `WebkitTransform` ->
/// `-webkit-transform`. A name already containing a hyphen is assumed to
/// already be kebab-case and is only lowercased.
fn normalize_property_name(name: &str) -> String {
  if name.contains('-') {
    return name.to_ascii_lowercase();
  }
  let mut out = String::with_capacity(name.len() + 4);
  if name.starts_with("Webkit") || name.starts_with("Moz") || name.starts_with("Ms") || name.starts_with("O") {
    // Only treat a leading uppercase run as a vendor prefix when the
    // rest of the name is itself camelCase (i.e. has an interior
    // uppercase letter) — otherwise a plain capitalized word like
    // "Opacity" would wrongly gain a leading hyphen.
    if name.chars().skip(1).any(|c| c.is_ascii_uppercase()) {
      out.push('-');
    }
  }
  for c in name.chars() {
    if c.is_ascii_uppercase() {
      if !out.is_empty() && !out.ends_with('-') {
        out.push('-');
      }
      out.push(c.to_ascii_lowercase());
    } else {
      out.push(c);
    }
  }
  out
}

impl Node {
  pub fn style(&self) -> StyleDeclaration {
    StyleDeclaration::new(self.clone())
  }

  /// Writes the `style` attribute directly and fires a single `attribute`
  /// notification, bypassing `set_attribute`'s generic lookup/validation
  /// (the name is always the literal `"style"`, already known-valid).
  fn set_style_attribute_raw(&self, value: &str) -> DomResult<()> {
    let old = self
      .with_element_mut(|e| e.attributes.borrow_mut().set("style", value, false))
      .ok_or_else(|| crate::error::DomError::invalid_character("style accessed on a non-element node"))??;
    self.owner_document().observers().notify_attribute(AttributeChange {
      target: self.id(),
      local_name: "style".to_string(),
      namespace: None,
      old_value: old,
    });
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use crate::document::Document;

  #[test]
  fn set_property_then_get_round_trips() {
    let doc = Document::new_html_document(None);
    let div = doc.create_element("div").unwrap();
    div.style().set_property("color", "red", None).unwrap();
    assert_eq!(div.style().get_property_value("color"), "red");
    assert_eq!(div.get_attribute("style").unwrap(), "color: red;");
  }

  #[test]
  fn camel_case_property_name_normalizes() {
    let doc = Document::new_html_document(None);
    let div = doc.create_element("div").unwrap();
    div.style().set_property("backgroundColor", "blue", None).unwrap();
    assert_eq!(div.style().get_property_value("background-color"), "blue");
  }

  #[test]
  fn vendor_prefix_normalizes() {
    let doc = Document::new_html_document(None);
    let div = doc.create_element("div").unwrap();
    div.style().set_property("WebkitTransform", "none", None).unwrap();
    assert_eq!(div.get_attribute("style").unwrap(), "-webkit-transform: none;");
  }

  #[test]
  fn important_priority_round_trips() {
    let doc = Document::new_html_document(None);
    let div = doc.create_element("div").unwrap();
    div.style().set_property("color", "red", Some("important")).unwrap();
    assert_eq!(div.style().get_property_priority("color"), "important");
    assert_eq!(div.get_attribute("style").unwrap(), "color: red !important;");
  }

  #[test]
  fn setting_empty_value_removes_property() {
    let doc = Document::new_html_document(None);
    let div = doc.create_element("div").unwrap();
    div.style().set_property("color", "red", None).unwrap();
    div.style().set_property("color", "", None).unwrap();
    assert_eq!(div.style().length(), 0);
    assert_eq!(div.get_attribute("style").unwrap(), "");
  }

  #[test]
  fn remove_property_returns_prior_value() {
    let doc = Document::new_html_document(None);
    let div = doc.create_element("div").unwrap();
    div.style().set_property("color", "red", None).unwrap();
    assert_eq!(div.style().remove_property("color"), "red");
    assert_eq!(div.style().remove_property("color"), "");
  }
}
