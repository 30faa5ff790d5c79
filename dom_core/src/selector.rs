//! Selector Matching (spec §4.7): a Level-3 subset of CSS simple/compound
//! selectors, no combinators — matching walks a single node's own tag,
//! id, classes and attributes rather than relating it to siblings or
//! ancestors by a combinator.
//!
//! Grounded on the attribute-filter matching already built for
//! `collections.rs`'s `HTMLCollection` (same case-folding rules reused
//! here via `ElementFilter`-style logic) and on `niklak-dom_query`'s
//! (other_examples) selector-string-to-matcher split: parse once into a
//! small AST, then match repeatedly without re-parsing per node.

use crate::collections::NodeListView;
use crate::error::{DomError, DomResult};
use crate::node::Node;

#[derive(Debug, Clone)]
enum AttrOp {
  Present,
  Equals(String),
  Includes(String),
  DashMatch(String),
  Prefix(String),
  Suffix(String),
  Substring(String),
}

#[derive(Debug, Clone)]
enum SimpleSelector {
  Universal,
  Type(String),
  Id(String),
  Class(String),
  Attr(String, AttrOp),
}

#[derive(Debug, Clone)]
struct CompoundSelector(Vec<SimpleSelector>);

#[derive(Debug, Clone)]
struct SelectorList(Vec<CompoundSelector>);

fn is_ident_char(c: char) -> bool {
  c.is_alphanumeric() || matches!(c, '-' | '_')
}

/// Splits `selectors` on top-level commas and parses each compound
/// selector. Combinators (whitespace, `>`, `+`, `~`) between simple
/// selectors are rejected as `SyntaxError` — this subset matches a single
/// node against its own tag/id/classes/attributes only (spec §4.7's
/// Non-goals exclude descendant/combinator matching).
fn parse_selector_list(selectors: &str) -> DomResult<SelectorList> {
  let mut list = Vec::new();
  for part in selectors.split(',') {
    let trimmed = part.trim();
    if trimmed.is_empty() {
      return Err(DomError::syntax("empty selector in selector list"));
    }
    list.push(parse_compound(trimmed)?);
  }
  if list.is_empty() {
    return Err(DomError::syntax("empty selector list"));
  }
  Ok(SelectorList(list))
}

fn parse_compound(selector: &str) -> DomResult<CompoundSelector> {
  let mut simples = Vec::new();
  let chars: Vec<char> = selector.chars().collect();
  let mut i = 0;
  while i < chars.len() {
    let c = chars[i];
    match c {
      c if c.is_whitespace() => {
        return Err(DomError::syntax(format!(
          "combinator selectors are not supported: {selector:?}"
        )));
      }
      '>' | '+' | '~' => {
        return Err(DomError::syntax(format!(
          "combinator {c:?} is not supported: {selector:?}"
        )));
      }
      '*' => {
        simples.push(SimpleSelector::Universal);
        i += 1;
      }
      '#' => {
        let (name, next) = read_ident(&chars, i + 1)?;
        simples.push(SimpleSelector::Id(name));
        i = next;
      }
      '.' => {
        let (name, next) = read_ident(&chars, i + 1)?;
        simples.push(SimpleSelector::Class(name));
        i = next;
      }
      '[' => {
        let (sel, next) = parse_attr_selector(&chars, i)?;
        simples.push(sel);
        i = next;
      }
      c if c.is_alphabetic() || c == '_' || c == '-' => {
        let (name, next) = read_ident(&chars, i)?;
        simples.push(SimpleSelector::Type(name));
        i = next;
      }
      _ => {
        return Err(DomError::syntax(format!(
          "unexpected character {c:?} in selector {selector:?}"
        )));
      }
    }
  }
  if simples.is_empty() {
    return Err(DomError::syntax("empty compound selector"));
  }
  Ok(CompoundSelector(simples))
}

fn read_ident(chars: &[char], start: usize) -> DomResult<(String, usize)> {
  let mut end = start;
  while end < chars.len() && is_ident_char(chars[end]) {
    end += 1;
  }
  if end == start {
    return Err(DomError::syntax("expected an identifier"));
  }
  Ok((chars[start..end].iter().collect(), end))
}

fn parse_attr_selector(chars: &[char], start: usize) -> DomResult<(SimpleSelector, usize)> {
  debug_assert_eq!(chars[start], '[');
  let close = chars[start..]
    .iter()
    .position(|&c| c == ']')
    .ok_or_else(|| DomError::syntax("unterminated attribute selector"))?
    + start;
  let inner: String = chars[start + 1..close].iter().collect();
  let inner = inner.trim();

  for (token, build) in [
    ("~=", AttrOp::Includes as fn(String) -> AttrOp),
    ("|=", AttrOp::DashMatch as fn(String) -> AttrOp),
    ("^=", AttrOp::Prefix as fn(String) -> AttrOp),
    ("$=", AttrOp::Suffix as fn(String) -> AttrOp),
    ("*=", AttrOp::Substring as fn(String) -> AttrOp),
  ] {
    if let Some(idx) = inner.find(token) {
      let name = inner[..idx].trim().to_string();
      let value = unquote(inner[idx + token.len()..].trim());
      if name.is_empty() {
        return Err(DomError::syntax("attribute selector is missing a name"));
      }
      return Ok((SimpleSelector::Attr(name, build(value)), close + 1));
    }
  }
  if let Some(idx) = inner.find('=') {
    let name = inner[..idx].trim().to_string();
    let value = unquote(inner[idx + 1..].trim());
    if name.is_empty() {
      return Err(DomError::syntax("attribute selector is missing a name"));
    }
    return Ok((SimpleSelector::Attr(name, AttrOp::Equals(value)), close + 1));
  }
  if inner.is_empty() {
    return Err(DomError::syntax("empty attribute selector"));
  }
  Ok((SimpleSelector::Attr(inner.to_string(), AttrOp::Present), close + 1))
}

fn unquote(s: &str) -> String {
  let bytes = s.as_bytes();
  if bytes.len() >= 2 && ((bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"') || (bytes[0] == b'\'' && bytes[bytes.len() - 1] == b'\'')) {
    s[1..s.len() - 1].to_string()
  } else {
    s.to_string()
  }
}

/// True when tag-name comparisons on `el` should be ASCII-case-insensitive
/// (same rule as `collections.rs`'s `ElementFilter::TagName`: HTML-namespace
/// elements in an HTML document).
fn html_case_insensitive(el: &Node) -> bool {
  el.owner_document().content_type().is_html()
}

fn simple_matches(sel: &SimpleSelector, el: &Node) -> bool {
  match sel {
    SimpleSelector::Universal => true,
    SimpleSelector::Type(name) => {
      if html_case_insensitive(el) {
        el.local_name().as_deref().unwrap_or_default().eq_ignore_ascii_case(name)
      } else {
        el.local_name().as_deref() == Some(name.as_str())
      }
    }
    SimpleSelector::Id(id) => &el.id_attribute() == id,
    SimpleSelector::Class(class) => el
      .class_name()
      .split(|c: char| c.is_ascii_whitespace())
      .any(|t| t == class),
    SimpleSelector::Attr(name, op) => match el.get_attribute(name) {
      None => false,
      Some(value) => match op {
        AttrOp::Present => true,
        AttrOp::Equals(v) => &value == v,
        AttrOp::Includes(v) => value.split_ascii_whitespace().any(|t| t == v),
        AttrOp::DashMatch(v) => &value == v || value.starts_with(&format!("{v}-")),
        AttrOp::Prefix(v) => !v.is_empty() && value.starts_with(v.as_str()),
        AttrOp::Suffix(v) => !v.is_empty() && value.ends_with(v.as_str()),
        AttrOp::Substring(v) => !v.is_empty() && value.contains(v.as_str()),
      },
    },
  }
}

fn compound_matches(compound: &CompoundSelector, el: &Node) -> bool {
  compound.0.iter().all(|s| simple_matches(s, el))
}

fn list_matches(list: &SelectorList, el: &Node) -> bool {
  list.0.iter().any(|c| compound_matches(c, el))
}

impl Node {
  /// `matches(selectors)` (spec §4.7): only meaningful for Element nodes.
  pub fn matches(&self, selectors: &str) -> DomResult<bool> {
    if !self.is_element() {
      return Ok(false);
    }
    let list = parse_selector_list(selectors)?;
    Ok(list_matches(&list, self))
  }

  /// `closest(selectors)` (spec §4.7): `self` and its ancestors, nearest
  /// first.
  pub fn closest(&self, selectors: &str) -> DomResult<Option<Node>> {
    let list = parse_selector_list(selectors)?;
    let mut cur = Some(self.clone());
    while let Some(n) = cur {
      if n.is_element() && list_matches(&list, &n) {
        return Ok(Some(n));
      }
      cur = n.parent();
    }
    Ok(None)
  }

  /// `querySelector(selectors)` (spec §4.7): first descendant Element, in
  /// document order, that matches.
  pub fn query_selector(&self, selectors: &str) -> DomResult<Option<Node>> {
    let list = parse_selector_list(selectors)?;
    Ok(find_first(self, &list))
  }

  /// `querySelectorAll(selectors)` (spec §4.7): every matching descendant,
  /// as a *static* snapshot (not a live `NodeListView::Live`).
  pub fn query_selector_all(&self, selectors: &str) -> DomResult<NodeListView> {
    let list = parse_selector_list(selectors)?;
    let mut out = Vec::new();
    collect_matches(self, &list, &mut out);
    Ok(NodeListView::Static(out))
  }
}

fn find_first(root: &Node, list: &SelectorList) -> Option<Node> {
  for child in root.children() {
    if child.is_element() && list_matches(list, &child) {
      return Some(child);
    }
    if let Some(found) = find_first(&child, list) {
      return Some(found);
    }
  }
  None
}

fn collect_matches(root: &Node, list: &SelectorList, out: &mut Vec<Node>) {
  for child in root.children() {
    if child.is_element() {
      if list_matches(list, &child) {
        out.push(child.clone());
      }
      collect_matches(&child, list, out);
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::document::Document;

  #[test]
  fn type_selector_is_case_insensitive_in_html() {
    let doc = Document::new_html_document(None);
    let div = doc.create_element("div").unwrap();
    assert!(div.matches("DIV").unwrap());
    assert!(div.matches("div").unwrap());
  }

  #[test]
  fn id_and_class_and_attribute_selectors() {
    let doc = Document::new_html_document(None);
    let el = doc.create_element("a").unwrap();
    el.set_id_attribute("main").unwrap();
    el.set_class_name("btn primary").unwrap();
    el.set_attribute("href", "https://example.com/page").unwrap();
    assert!(el.matches("#main").unwrap());
    assert!(el.matches(".primary").unwrap());
    assert!(el.matches("a.btn#main").unwrap());
    assert!(el.matches("[href^=https]").unwrap());
    assert!(el.matches("[href$=page]").unwrap());
    assert!(el.matches("[href*=example]").unwrap());
    assert!(!el.matches("[href*=nope]").unwrap());
  }

  #[test]
  fn combinator_selectors_are_rejected_as_syntax_error() {
    let doc = Document::new_html_document(None);
    let div = doc.create_element("div").unwrap();
    let err = div.matches("div > span").unwrap_err();
    assert_eq!(err.name(), "SyntaxError");
  }

  #[test]
  fn closest_walks_ancestors() {
    let doc = Document::new_html_document(None);
    let outer = doc.create_element("section").unwrap();
    outer.set_class_name("wrap").unwrap();
    let inner = doc.create_element("span").unwrap();
    outer.append_child(&inner).unwrap();
    doc.root_element().unwrap().append_child(&outer).unwrap();
    assert_eq!(inner.closest(".wrap").unwrap().unwrap().id(), outer.id());
    assert!(inner.closest(".missing").unwrap().is_none());
  }

  #[test]
  fn query_selector_all_returns_static_snapshot() {
    let doc = Document::new_html_document(None);
    let body = doc.root_element().unwrap().last_child().unwrap();
    let p1 = doc.create_element("p").unwrap();
    body.append_child(&p1).unwrap();
    let found = body.query_selector_all("p").unwrap();
    assert_eq!(found.length(), 1);
    let p2 = doc.create_element("p").unwrap();
    body.append_child(&p2).unwrap();
    assert_eq!(found.length(), 1);
  }

  #[test]
  fn selector_list_matches_any_branch() {
    let doc = Document::new_html_document(None);
    let span = doc.create_element("span").unwrap();
    assert!(span.matches("div, span, a").unwrap());
  }
}
