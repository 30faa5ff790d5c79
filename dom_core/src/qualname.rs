//! Thin helpers around `html5ever`'s interned name types, carried forward
//! from the teacher almost unchanged: `QualName` (namespace + optional
//! prefix + local name) is the one type every external collaborator (§6)
//! hands the core across its `TreeSink` boundary, so the node tree stores
//! names in exactly that shape rather than re-inventing interning.

use html5ever::{ns, Namespace, Prefix, QualName};

use crate::error::{DomError, DomResult};

pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
pub const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";
pub const HTML_NS: &str = "http://www.w3.org/1999/xhtml";
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Build a `QualName` from an already-split `(namespace, prefix, local)`.
pub fn qualname(ns: Option<&str>, prefix: Option<&str>, local: &str) -> QualName {
  QualName::new(
    prefix.map(Prefix::from),
    ns.map(Namespace::from).unwrap_or(ns!()),
    local.into(),
  )
}

/// Compose a qualified name string ("prefix:local", or "local" with no
/// prefix) from a `QualName`, matching the GLOSSARY's "Qualified name"
/// definition.
pub fn qualified_name_string(name: &QualName) -> String {
  match &name.prefix {
    Some(prefix) => format!("{}:{}", prefix, name.local),
    None => name.local.to_string(),
  }
}

/// Parse a qualified name string into `(prefix, localName)`, per the
/// "namespace validation" algorithm of the DOM spec, called from
/// `setAttributeNS`/`createElementNS` (§4.4).
///
/// Rejects empty qualified names and names whose `:` placement is invalid
/// (leading/trailing colon, more than one colon, empty prefix or local
/// part).
pub fn split_qualified_name(qualified_name: &str) -> DomResult<(Option<&str>, &str)> {
  if qualified_name.is_empty() {
    return Err(DomError::invalid_character("qualified name must not be empty"));
  }
  validate_name_production(qualified_name)?;

  match qualified_name.find(':') {
    None => Ok((None, qualified_name)),
    Some(i) => {
      let (prefix, rest) = qualified_name.split_at(i);
      let local = &rest[1..];
      if prefix.is_empty() || local.is_empty() || local.contains(':') {
        return Err(DomError::Namespace(format!(
          "malformed qualified name {qualified_name:?}"
        )));
      }
      Ok((Some(prefix), local))
    }
  }
}

/// `validate and extract` (DOM "Namespaces" §5.3): check the `(prefix,
/// localName)` pair resulting from [`split_qualified_name`] against the
/// supplied namespace, enforcing the `xml`/`xmlns` bindings.
pub fn validate_and_extract(
  namespace: Option<&str>,
  qualified_name: &str,
) -> DomResult<QualName> {
  let (prefix, local) = split_qualified_name(qualified_name)?;

  if prefix.is_some() && namespace.is_none() {
    return Err(DomError::namespace(format!(
      "prefix {:?} requires a non-null namespace",
      prefix.unwrap()
    )));
  }
  if prefix == Some("xml") && namespace != Some(XML_NS) {
    return Err(DomError::namespace("prefix \"xml\" must bind to the XML namespace"));
  }
  if (qualified_name == "xmlns" || prefix == Some("xmlns")) && namespace != Some(XMLNS_NS) {
    return Err(DomError::namespace(
      "the \"xmlns\" name/prefix must bind to the XMLNS namespace",
    ));
  }
  if namespace == Some(XMLNS_NS) && qualified_name != "xmlns" && prefix != Some("xmlns") {
    return Err(DomError::namespace(
      "the XMLNS namespace may only bind to \"xmlns\" or an \"xmlns:*\" prefix",
    ));
  }

  Ok(qualname(namespace, prefix, local))
}

/// A conservative approximation of the XML `Name` production: non-empty,
/// first character is alphabetic/`_`/`:`, remaining characters are
/// alphanumeric/`_`/`-`/`.`/`:`. Good enough to reject whitespace and the
/// usual mistakes (`"foo bar"`, `"<tag>"`) without pulling in a full XML
/// Name-character table.
pub fn validate_name_production(name: &str) -> DomResult<()> {
  let mut chars = name.chars();
  let first = chars
    .next()
    .ok_or_else(|| DomError::invalid_character("name must not be empty"))?;
  if !(first.is_alphabetic() || first == '_' || first == ':') {
    return Err(DomError::invalid_character(format!(
      "{name:?} does not start with a valid name character"
    )));
  }
  for c in chars {
    if !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')) {
      return Err(DomError::invalid_character(format!(
        "{name:?} contains invalid character {c:?}"
      )));
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn splits_simple_qualified_name() {
    assert_eq!(split_qualified_name("svg").unwrap(), (None, "svg"));
    assert_eq!(
      split_qualified_name("xlink:href").unwrap(),
      (Some("xlink"), "href")
    );
  }

  #[test]
  fn rejects_malformed_qualified_names() {
    assert!(split_qualified_name("").is_err());
    assert!(split_qualified_name(":local").is_err());
    assert!(split_qualified_name("prefix:").is_err());
    assert!(split_qualified_name("a:b:c").is_err());
  }

  #[test]
  fn enforces_xml_prefix_binding() {
    assert!(validate_and_extract(Some("http://example.com"), "xml:lang").is_err());
    assert!(validate_and_extract(Some(XML_NS), "xml:lang").is_ok());
  }

  #[test]
  fn requires_namespace_for_prefixed_names() {
    assert!(validate_and_extract(None, "xlink:href").is_err());
  }
}
