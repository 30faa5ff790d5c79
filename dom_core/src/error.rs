//! The error taxonomy of the core (spec §7).
//!
//! Every mutation primitive is all-or-nothing: validation runs to completion
//! before any state change, so a `DomError` returned from any function in
//! this crate implies the tree, attribute store, or character-data buffer it
//! was called against is unchanged and no observer fired.

use std::fmt;

/// A DOM exception, carrying the same stable name WHATWG's `DOMException`
/// would use plus a human-readable message.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DomError {
  /// A structural invariant (I3/I4) or pre-insertion validation rule
  /// (V1/V2/V4/V5) was violated.
  #[error("HierarchyRequestError: {0}")]
  HierarchyRequest(String),

  /// `refChild` is not a child of the given parent.
  #[error("NotFoundError: {0}")]
  NotFound(String),

  /// A name or token failed its grammar (element/attribute names, class
  /// tokens containing ASCII whitespace).
  #[error("InvalidCharacterError: {0}")]
  InvalidCharacter(String),

  /// An `Attr` is already owned by a different element.
  #[error("InUseAttributeError: {0}")]
  InUseAttribute(String),

  /// An invalid `(namespace, qualifiedName)` binding was requested.
  #[error("NamespaceError: {0}")]
  Namespace(String),

  /// The operation is forbidden in the document's current mode (e.g.
  /// creating a CDATASection in an HTML document).
  #[error("NotSupportedError: {0}")]
  NotSupported(String),

  /// A malformed selector, or an empty token passed to a class-list
  /// mutator.
  #[error("SyntaxError: {0}")]
  Syntax(String),

  /// The serializer refused to emit data containing a forbidden
  /// substring.
  #[error("InvalidStateError: {0}")]
  InvalidState(String),

  /// An out-of-range offset was passed to a character-data operation that
  /// enforces bounds checking.
  #[error("IndexSizeError: {0}")]
  IndexSize(String),
}

impl DomError {
  /// The stable DOM exception name, independent of the message text.
  pub fn name(&self) -> &'static str {
    match self {
      DomError::HierarchyRequest(_) => "HierarchyRequestError",
      DomError::NotFound(_) => "NotFoundError",
      DomError::InvalidCharacter(_) => "InvalidCharacterError",
      DomError::InUseAttribute(_) => "InUseAttributeError",
      DomError::Namespace(_) => "NamespaceError",
      DomError::NotSupported(_) => "NotSupportedError",
      DomError::Syntax(_) => "SyntaxError",
      DomError::InvalidState(_) => "InvalidStateError",
      DomError::IndexSize(_) => "IndexSizeError",
    }
  }

  pub(crate) fn hierarchy_request(msg: impl fmt::Display) -> Self {
    DomError::HierarchyRequest(msg.to_string())
  }

  pub(crate) fn not_found(msg: impl fmt::Display) -> Self {
    DomError::NotFound(msg.to_string())
  }

  pub(crate) fn invalid_character(msg: impl fmt::Display) -> Self {
    DomError::InvalidCharacter(msg.to_string())
  }

  pub(crate) fn in_use_attribute(msg: impl fmt::Display) -> Self {
    DomError::InUseAttribute(msg.to_string())
  }

  pub(crate) fn namespace(msg: impl fmt::Display) -> Self {
    DomError::Namespace(msg.to_string())
  }

  pub(crate) fn not_supported(msg: impl fmt::Display) -> Self {
    DomError::NotSupported(msg.to_string())
  }

  pub(crate) fn syntax(msg: impl fmt::Display) -> Self {
    DomError::Syntax(msg.to_string())
  }

  pub(crate) fn invalid_state(msg: impl fmt::Display) -> Self {
    DomError::InvalidState(msg.to_string())
  }

  pub(crate) fn index_size(msg: impl fmt::Display) -> Self {
    DomError::IndexSize(msg.to_string())
  }
}

/// The result type used throughout the core.
pub type DomResult<T> = Result<T, DomError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn name_is_stable_independent_of_message() {
    let e = DomError::hierarchy_request("newChild is an ancestor of parent");
    assert_eq!(e.name(), "HierarchyRequestError");
  }
}
