//! Character Data operations (spec §4.3): the `data`/`length` accessors and
//! the five CharacterData editing primitives shared by Text, Comment,
//! CDATASection and ProcessingInstruction.
//!
//! Offsets are UTF-8 byte offsets throughout (see `node.rs`'s
//! `CharacterBuffer` doc comment). Every mutator validates the offset
//! against the buffer's current length *and* that it falls on a char
//! boundary before touching the buffer, so a bad offset never produces a
//! panic — it comes back as `IndexSizeError`.

use crate::error::{DomError, DomResult};
use crate::node::Node;
use crate::observer::ReplaceDataChange;

impl Node {
  /// `data` getter: the character-data buffer's full contents, or `None`
  /// for a node with no buffer (anything other than
  /// Text/Comment/CDATASection/ProcessingInstruction).
  pub fn data(&self) -> Option<String> {
    self.doc
      .with_node(self.id, |n| n.data.character_buffer().map(|b| b.data.borrow().clone()))
  }

  /// `data` setter: equivalent to `replaceData(0, length, value)`.
  pub fn set_data(&self, value: &str) -> DomResult<()> {
    let len = self.length().ok_or_else(not_character_data)?;
    self.replace_data(0, len, value)
  }

  /// `length` (spec §4.3): the buffer's length in the same unit as every
  /// other offset in this module — UTF-8 bytes.
  pub fn length(&self) -> Option<usize> {
    self.doc
      .with_node(self.id, |n| n.data.character_buffer().map(|b| b.data.borrow().len()))
  }

  pub fn substring_data(&self, offset: usize, count: usize) -> DomResult<String> {
    let len = self.length().ok_or_else(not_character_data)?;
    check_offset(offset, len)?;
    let end = offset.saturating_add(count).min(len);
    self.with_buffer(|s| check_boundary(s, offset).and(check_boundary(s, end)))
      .expect("length() returned Some so character_buffer() is present")?;
    Ok(self
      .with_buffer(|s| s[offset..end].to_string())
      .expect("length() returned Some so character_buffer() is present"))
  }

  pub fn append_data(&self, data: &str) -> DomResult<()> {
    let len = self.length().ok_or_else(not_character_data)?;
    self.replace_data(len, 0, data)
  }

  pub fn insert_data(&self, offset: usize, data: &str) -> DomResult<()> {
    self.replace_data(offset, 0, data)
  }

  pub fn delete_data(&self, offset: usize, count: usize) -> DomResult<()> {
    self.replace_data(offset, count, "")
  }

  /// `replaceData(offset, count, data)` (spec §4.3/§4.8): fires the
  /// `ReplaceDataChange` notification (consumed by the Range Registry and
  /// any other observer) *before* the buffer is mutated, per spec §4.8's
  /// "before" requirement — a live Range can only see the pre-edit
  /// offsets if it is notified first.
  pub fn replace_data(&self, offset: usize, count: usize, data: &str) -> DomResult<()> {
    let len = self.length().ok_or_else(not_character_data)?;
    check_offset(offset, len)?;
    let end = offset.saturating_add(count).min(len);
    self.with_buffer(|s| check_boundary(s, offset).and(check_boundary(s, end)))
      .expect("length() returned Some so character_buffer() is present")?;

    let old_value = self
      .with_buffer(|s| s.to_string())
      .expect("length() returned Some so character_buffer() is present");

    let change = ReplaceDataChange {
      target: self.id(),
      offset,
      count: end - offset,
      data_length: data.len(),
    };
    let doc = self.owner_document();
    doc.ranges().handle_replace_data(&change);
    doc.observers().notify_replace_data(change);

    self.with_buffer_mut(|s| {
      s.replace_range(offset..end, data);
    });

    doc.observers().notify_character_data(crate::observer::CharacterDataChange {
      target: self.id(),
      old_value,
    });
    log::debug!("replaceData: target={:?} offset={offset} count={count}", self.id());
    Ok(())
  }

  /// `splitText(offset)` (spec §4.3): truncates `self` to `[0, offset)`
  /// and returns a new, identically-kinded sibling node holding
  /// `[offset, length)`, inserted immediately after `self`. Only valid
  /// for Text nodes (CDATASection/Comment/PI have no spec-defined split).
  pub fn split_text(&self, offset: usize) -> DomResult<Node> {
    if self.kind() != crate::node::NodeKind::Text {
      return Err(DomError::index_size("splitText is only defined for Text nodes"));
    }
    let len = self.length().ok_or_else(not_character_data)?;
    check_offset(offset, len)?;
    self.with_buffer(|s| check_boundary(s, offset))
      .expect("length() returned Some so character_buffer() is present")?;

    let tail = self.substring_data(offset, len - offset)?;
    self.replace_data(offset, len - offset, "")?;

    let new_node = self.owner_document().create_text_node(&tail);
    if let Some(parent) = self.parent() {
      parent.insert_before(&new_node, self.next_sibling().as_ref())?;
    }
    Ok(new_node)
  }

  fn with_buffer<T>(&self, f: impl FnOnce(&str) -> T) -> Option<T> {
    self.doc
      .with_node(self.id, |n| n.data.character_buffer().map(|b| f(&b.data.borrow())))
  }

  fn with_buffer_mut<T>(&self, f: impl FnOnce(&mut String) -> T) -> Option<T> {
    self.doc
      .with_node(self.id, |n| n.data.character_buffer().map(|b| f(&mut b.data.borrow_mut())))
  }
}

fn not_character_data() -> DomError {
  DomError::index_size("operation requires a CharacterData node")
}

fn check_offset(offset: usize, len: usize) -> DomResult<()> {
  if offset > len {
    return Err(DomError::index_size(format!(
      "offset {offset} is out of range for data of length {len}"
    )));
  }
  Ok(())
}

/// A byte offset that doesn't fall on a UTF-8 char boundary would panic on
/// slicing; surface it as `IndexSizeError` instead.
fn check_boundary(s: &str, offset: usize) -> DomResult<()> {
  if s.is_char_boundary(offset) {
    Ok(())
  } else {
    Err(DomError::index_size(format!(
      "offset {offset} does not fall on a UTF-8 character boundary"
    )))
  }
}

#[cfg(test)]
mod tests {
  use crate::document::Document;

  #[test]
  fn append_insert_delete_roundtrip() {
    let doc = Document::new_html_document(None);
    let t = doc.create_text_node("hello");
    t.append_data(" world").unwrap();
    assert_eq!(t.data().unwrap(), "hello world");
    t.insert_data(5, ",").unwrap();
    assert_eq!(t.data().unwrap(), "hello, world");
    t.delete_data(5, 1).unwrap();
    assert_eq!(t.data().unwrap(), "hello world");
  }

  #[test]
  fn replace_data_out_of_range_is_index_size_error() {
    let doc = Document::new_html_document(None);
    let t = doc.create_text_node("abc");
    let err = t.replace_data(10, 0, "x").unwrap_err();
    assert_eq!(err.name(), "IndexSizeError");
  }

  #[test]
  fn split_text_produces_sibling_with_tail() {
    let doc = Document::new_html_document(None);
    let div = doc.create_element("div").unwrap();
    doc.root_element().unwrap().append_child(&div).unwrap();
    let t = doc.create_text_node("helloworld");
    div.append_child(&t).unwrap();
    let tail = t.split_text(5).unwrap();
    assert_eq!(t.data().unwrap(), "hello");
    assert_eq!(tail.data().unwrap(), "world");
    assert_eq!(t.next_sibling().unwrap().id(), tail.id());
  }

  #[test]
  fn replace_data_notifies_before_mutation() {
    let doc = Document::new_html_document(None);
    let t = doc.create_text_node("abc");
    let seen = std::rc::Rc::new(std::cell::RefCell::new(String::new()));
    let s = seen.clone();
    doc.observers().on_replace_data(Box::new(move |_| {
      *s.borrow_mut() = "fired".to_string();
    }));
    t.replace_data(1, 1, "X").unwrap();
    assert_eq!(*seen.borrow(), "fired");
    assert_eq!(t.data().unwrap(), "aXc");
  }
}
