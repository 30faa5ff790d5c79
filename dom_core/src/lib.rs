//! `dom_core`: an in-memory document object model core — a heterogeneous
//! node tree, tree-mutation algorithms, live views, and live ranges, built
//! on an arena-and-index tree (spec §9's "cyclic graph" design note) and
//! wired to `html5ever`/`xml5ever` at the `TreeSink` seam (spec §6).
//!
//! This crate implements the core described in `spec.md`: the node kernel,
//! tree mutations, character data, attribute store, token/style lists, live
//! views, a reduced CSS selector grammar, live ranges, an observer bus, and
//! HTML/XML serialization. It does not include an HTML/XML tokenizer, a CSS
//! cascade, layout, or any scripting/event-loop integration — those are
//! external collaborators (§6).

pub mod arena;
pub mod node;
pub mod document;
pub mod mutation;
pub mod character_data;
pub mod attr;
pub mod tokenlist;
pub mod style;
pub mod collections;
pub mod selector;
pub mod range;
pub mod observer;
pub mod serializer;
pub mod error;
pub mod qualname;
pub mod quirks_mode;
pub mod implementation;
pub mod layout;
pub mod parser;

pub use document::Document;
pub use error::{DomError, DomResult};
pub use implementation::DomImplementation;
pub use node::{Node, NodeKind};
pub use quirks_mode::QuirksMode;
pub use range::{Range, StaticRange};
