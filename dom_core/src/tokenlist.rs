//! The class-token list (spec §4.5, first half): a live view over an
//! element's `class` attribute, re-tokenized on every read rather than
//! cached (spec §9 "Live views: do not cache").
//!
//! Grounded on the Attribute Store's own "re-derive, don't cache" style
//! (`attr.rs`'s `get_attribute`/`set_attribute`) — `TokenList` is built
//! entirely out of the existing `class_name`/`set_class_name` accessors, so
//! every mutation still goes through the normal attribute-change
//! notification path.

use crate::error::{DomError, DomResult};
use crate::node::Node;

fn is_ascii_ws(c: char) -> bool {
  matches!(c, ' ' | '\t' | '\n' | '\x0C' | '\r')
}

fn validate_token(token: &str) -> DomResult<()> {
  if token.is_empty() {
    return Err(DomError::syntax("token must not be empty"));
  }
  if token.chars().any(is_ascii_ws) {
    return Err(DomError::invalid_character(format!(
      "token {token:?} must not contain ASCII whitespace"
    )));
  }
  Ok(())
}

/// `DOMTokenList` (spec §4.5): a live, order-preserving, deduplicated view
/// over a whitespace-separated attribute value.
pub struct TokenList {
  element: Node,
}

impl TokenList {
  pub fn new(element: Node) -> Self {
    TokenList { element }
  }

  /// Re-parses the backing attribute: split on ASCII whitespace, drop
  /// empty runs, keep first occurrence order.
  fn tokens(&self) -> Vec<String> {
    let value = self.element.class_name();
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for tok in value.split(is_ascii_ws).filter(|s| !s.is_empty()) {
      if seen.insert(tok) {
        out.push(tok.to_string());
      }
    }
    out
  }

  fn write(&self, tokens: &[String]) -> DomResult<()> {
    self.element.set_attribute("class", &tokens.join(" "))
  }

  pub fn length(&self) -> usize {
    self.tokens().len()
  }

  pub fn item(&self, index: usize) -> Option<String> {
    self.tokens().into_iter().nth(index)
  }

  /// `contains(token)`: an invalid token is simply never present, it does
  /// not raise.
  pub fn contains(&self, token: &str) -> bool {
    if validate_token(token).is_err() {
      return false;
    }
    self.tokens().iter().any(|t| t == token)
  }

  pub fn add(&self, tokens: &[&str]) -> DomResult<()> {
    for t in tokens {
      validate_token(t)?;
    }
    let mut cur = self.tokens();
    for t in tokens {
      if !cur.iter().any(|c| c == t) {
        cur.push(t.to_string());
      }
    }
    self.write(&cur)
  }

  pub fn remove(&self, tokens: &[&str]) -> DomResult<()> {
    for t in tokens {
      validate_token(t)?;
    }
    let cur: Vec<String> = self
      .tokens()
      .into_iter()
      .filter(|c| !tokens.contains(&c.as_str()))
      .collect();
    self.write(&cur)
  }

  /// `toggle(token, force?)`: returns whether the token is present in the
  /// list after the call.
  pub fn toggle(&self, token: &str, force: Option<bool>) -> DomResult<bool> {
    validate_token(token)?;
    let mut cur = self.tokens();
    let present = cur.iter().any(|c| c == token);
    let should_be_present = force.unwrap_or(!present);
    if should_be_present == present {
      return Ok(present);
    }
    if should_be_present {
      cur.push(token.to_string());
    } else {
      cur.retain(|c| c != token);
    }
    self.write(&cur)?;
    Ok(should_be_present)
  }

  /// `replace(old, new)`: returns whether `old` was present (and thus
  /// replaced).
  pub fn replace(&self, old: &str, new: &str) -> DomResult<bool> {
    validate_token(old)?;
    validate_token(new)?;
    let mut cur = self.tokens();
    let Some(pos) = cur.iter().position(|c| c == old) else {
      return Ok(false);
    };
    cur[pos] = new.to_string();
    let mut seen = std::collections::HashSet::new();
    cur.retain(|c| seen.insert(c.clone()));
    self.write(&cur)?;
    Ok(true)
  }

  pub fn value(&self) -> String {
    self.element.class_name()
  }
}

impl Node {
  pub fn class_list(&self) -> TokenList {
    TokenList::new(self.clone())
  }
}

#[cfg(test)]
mod tests {
  use crate::document::Document;

  #[test]
  fn add_dedupes_and_preserves_order() {
    let doc = Document::new_html_document(None);
    let div = doc.create_element("div").unwrap();
    div.set_class_name("a b").unwrap();
    div.class_list().add(&["b", "c"]).unwrap();
    assert_eq!(div.class_name(), "a b c");
  }

  #[test]
  fn toggle_without_force_flips_presence() {
    let doc = Document::new_html_document(None);
    let div = doc.create_element("div").unwrap();
    assert!(div.class_list().toggle("hidden", None).unwrap());
    assert_eq!(div.class_name(), "hidden");
    assert!(!div.class_list().toggle("hidden", None).unwrap());
    assert_eq!(div.class_name(), "");
  }

  #[test]
  fn empty_token_is_syntax_error() {
    let doc = Document::new_html_document(None);
    let div = doc.create_element("div").unwrap();
    let err = div.class_list().add(&[""]).unwrap_err();
    assert_eq!(err.name(), "SyntaxError");
  }

  #[test]
  fn whitespace_token_is_invalid_character_error() {
    let doc = Document::new_html_document(None);
    let div = doc.create_element("div").unwrap();
    let err = div.class_list().add(&["a b"]).unwrap_err();
    assert_eq!(err.name(), "InvalidCharacterError");
  }

  #[test]
  fn contains_is_false_for_invalid_token_without_erroring() {
    let doc = Document::new_html_document(None);
    let div = doc.create_element("div").unwrap();
    assert!(!div.class_list().contains("a b"));
    assert!(!div.class_list().contains(""));
  }

  #[test]
  fn replace_keeps_position_and_dedupes() {
    let doc = Document::new_html_document(None);
    let div = doc.create_element("div").unwrap();
    div.set_class_name("a b c").unwrap();
    assert!(div.class_list().replace("b", "a").unwrap());
    assert_eq!(div.class_name(), "a c");
  }
}
