//! End-to-end scenarios (S1-S6) and cross-module properties (P1-P9).
//!
//! Each scenario test is named after the literal input/output pair it
//! checks; each property test exercises the invariant across a handful of
//! representative operation sequences rather than an exhaustive search.

use dom_core::{Document, Node, NodeKind, QuirksMode};
use dom_core::range::Range;

fn html_doc() -> std::rc::Rc<Document> {
  Document::new_html_document(None)
}

fn body_of(doc: &std::rc::Rc<Document>) -> Node {
  doc.root_element().unwrap().last_child().unwrap()
}

// S1: <div id="x"><p>hi</p></div>; getElementById("x") returns the div;
// div.firstElementChild.tagName == "P".
#[test]
fn s1_get_element_by_id_and_first_element_child() {
  let doc = html_doc();
  let body = body_of(&doc);

  let div = doc.create_element("div").unwrap();
  div.set_id_attribute("x").unwrap();
  let p = doc.create_element("p").unwrap();
  let text = doc.create_text_node("hi");
  p.append_child(&text).unwrap();
  div.append_child(&p).unwrap();
  body.append_child(&div).unwrap();

  let found = doc.root_node().get_element_by_id("x").unwrap();
  assert_eq!(found.id(), div.id());
  assert_eq!(div.first_element_child().unwrap().node_name(), "P");
}

// S2: <div class="a b a c b a"></div>; classList.length == 3; item(0,1,2)
// == "a","b","c"; classList.contains(" ") == false.
#[test]
fn s2_class_list_dedupes_and_rejects_whitespace_token() {
  let doc = html_doc();
  let div = doc.create_element("div").unwrap();
  div.set_class_name("a b a c b a").unwrap();

  let list = div.class_list();
  assert_eq!(list.length(), 3);
  assert_eq!(list.item(0).as_deref(), Some("a"));
  assert_eq!(list.item(1).as_deref(), Some("b"));
  assert_eq!(list.item(2).as_deref(), Some("c"));
  assert!(!list.contains(" "));
}

// S3: text "Hello World"; range (text,3,text,8); text.replaceData(2,4,"XYZ").
// offset..offset+count ("llo ") is replaced by "XYZ", giving "HeXYZWorld"
// (length 10); range becomes (text,2,text,7) per the §4.8 offset-arithmetic
// rules, independent of the replacement's own length.
#[test]
fn s3_replace_data_shifts_range_per_offset_rules() {
  let doc = html_doc();
  let text = doc.create_text_node("Hello World");
  doc.root_element().unwrap().append_child(&text).unwrap();

  let range = Range::new(&doc);
  range.set_start(&text, 3).unwrap();
  range.set_end(&text, 8).unwrap();
  assert_eq!(text.substring_data(3, 5).unwrap(), "lo Wo");

  text.replace_data(2, 4, "XYZ").unwrap();

  assert_eq!(text.data().unwrap(), "HeXYZWorld");
  assert_eq!(text.length().unwrap(), 10);
  assert_eq!(range.start().container, text.id());
  assert_eq!(range.start().offset, 2);
  assert_eq!(range.end().container, text.id());
  assert_eq!(range.end().offset, 7);
}

// S4: parent has children [A,B,C]. Active range (parent,1,parent,3). Remove
// B -> range (parent,1,parent,2). Then remove C -> range (parent,1,parent,1).
#[test]
fn s4_child_removal_shifts_and_collapses_range() {
  let doc = html_doc();
  let parent = doc.create_element("div").unwrap();
  doc.root_element().unwrap().append_child(&parent).unwrap();
  let a = doc.create_element("a").unwrap();
  let b = doc.create_element("b").unwrap();
  let c = doc.create_element("c").unwrap();
  parent.append_child(&a).unwrap();
  parent.append_child(&b).unwrap();
  parent.append_child(&c).unwrap();

  let range = Range::new(&doc);
  range.set_start(&parent, 1).unwrap();
  range.set_end(&parent, 3).unwrap();

  parent.remove_child(&b).unwrap();
  assert_eq!(range.start().offset, 1);
  assert_eq!(range.end().offset, 2);

  parent.remove_child(&c).unwrap();
  assert_eq!(range.start().offset, 1);
  assert_eq!(range.end().offset, 1);
  assert!(range.collapsed());
}

// S5: Document already has a DOCTYPE and an <html> document element.
// appendChild(document, otherElement) fails with HierarchyRequestError; the
// tree is unchanged; no observer fires.
#[test]
fn s5_second_document_element_is_rejected_and_fires_nothing() {
  let doc = html_doc();
  let root = doc.root_node();
  let children_before: Vec<_> = root.children().iter().map(|n| n.id()).collect();

  let fired = std::rc::Rc::new(std::cell::Cell::new(false));
  let f = fired.clone();
  doc.observers().on_child_list(Box::new(move |_| f.set(true)));

  let other = doc.create_element("section").unwrap();
  let err = root.append_child(&other).unwrap_err();
  assert_eq!(err.name(), "HierarchyRequestError");

  let children_after: Vec<_> = root.children().iter().map(|n| n.id()).collect();
  assert_eq!(children_before, children_after);
  assert!(!fired.get());
}

// S6: serialize `<p xmlns="...">&lt;x&gt;</p>` via the XML serializer;
// the HTML serializer of the same subtree does not re-declare xmlns.
#[test]
fn s6_xml_serializer_declares_namespace_html_serializer_does_not() {
  const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";
  let doc = Document::new_document(Some(XHTML_NS), Some("p")).unwrap();
  let p = doc.root_element().unwrap();
  let text = doc.create_text_node("<x>");
  p.append_child(&text).unwrap();

  let xml = dom_core::serializer::serialize_xml(&p).unwrap();
  assert_eq!(xml, format!("<p xmlns=\"{XHTML_NS}\">&lt;x&gt;</p>"));

  let html = dom_core::serializer::serialize_html(&p);
  assert_eq!(html, "<p>&lt;x&gt;</p>");
}

// P1: after a successful mutation sequence the tree still satisfies I1
// (sibling-link consistency) and I3 (at most one document element).
#[test]
fn p1_invariants_hold_after_a_mutation_sequence() {
  let doc = html_doc();
  let body = body_of(&doc);
  let a = doc.create_element("a").unwrap();
  let b = doc.create_element("b").unwrap();
  let c = doc.create_element("c").unwrap();
  body.append_child(&a).unwrap();
  body.append_child(&b).unwrap();
  body.insert_before(&c, Some(&b)).unwrap();
  body.remove_child(&a).unwrap();

  let kids = body.children();
  assert_eq!(kids.iter().map(|n| n.node_name()).collect::<Vec<_>>(), vec!["C", "B"]);
  assert_eq!(body.first_child().unwrap().id(), kids[0].id());
  assert_eq!(body.last_child().unwrap().id(), kids[1].id());
  assert_eq!(kids[0].next_sibling().unwrap().id(), kids[1].id());
  assert_eq!(kids[1].previous_sibling().unwrap().id(), kids[0].id());
  assert!(kids[0].parent().unwrap().id() == body.id());

  let root = doc.root_node();
  let element_children = root.children().into_iter().filter(|n| n.is_element()).count();
  assert_eq!(element_children, 1);
}

// P2: cloneNode(true) then serializing yields the same bytes as serializing
// the original, for both the HTML and the XML serializers.
#[test]
fn p2_deep_clone_serializes_identically() {
  let doc = html_doc();
  let div = doc.create_element("div").unwrap();
  div.set_attribute("data-x", "1").unwrap();
  let span = doc.create_element("span").unwrap();
  let text = doc.create_text_node("hi & bye");
  span.append_child(&text).unwrap();
  div.append_child(&span).unwrap();
  body_of(&doc).append_child(&div).unwrap();

  let clone = div.clone_node(true);
  assert_ne!(clone.id(), div.id());
  assert_eq!(dom_core::serializer::serialize_html(&div), dom_core::serializer::serialize_html(&clone));

  let xdoc = Document::new_document(None, Some("root")).unwrap();
  let root = xdoc.root_element().unwrap();
  let child = xdoc.create_element("child").unwrap();
  child.set_attribute("a", "1").unwrap();
  root.append_child(&child).unwrap();
  let xclone = root.clone_node(true);
  assert_eq!(
    dom_core::serializer::serialize_xml(&root).unwrap(),
    dom_core::serializer::serialize_xml(&xclone).unwrap()
  );
}

// P3: for a replaceData edit and a live range, the updated boundary points
// satisfy the exact offset arithmetic of spec section 4.8 for a boundary
// that sits before, inside, and after the edited span.
#[test]
fn p3_replace_data_offset_arithmetic_is_exact() {
  let doc = html_doc();
  let text = doc.create_text_node("0123456789");
  let before = Range::new(&doc);
  before.set_start(&text, 1).unwrap();
  before.set_end(&text, 1).unwrap();
  let inside = Range::new(&doc);
  inside.set_start(&text, 4).unwrap();
  inside.set_end(&text, 4).unwrap();
  let after = Range::new(&doc);
  after.set_start(&text, 9).unwrap();
  after.set_end(&text, 9).unwrap();

  // Replace [3,6) ("345") with "XY" (2 chars).
  text.replace_data(3, 3, "XY").unwrap();

  assert_eq!(before.start().offset, 1); // untouched, strictly before the edit
  assert_eq!(inside.start().offset, 3); // inside the replaced span, clamps to start
  assert_eq!(after.start().offset, 9 - 3 + 2); // shifts by (new len - old len)
}

// P4: a static NodeList returned by querySelectorAll at time t reports the
// same length and items at t + any later mutations.
#[test]
fn p4_static_node_list_does_not_see_later_mutations() {
  let doc = html_doc();
  let body = body_of(&doc);
  let p1 = doc.create_element("p").unwrap();
  body.append_child(&p1).unwrap();

  let snapshot = body.query_selector_all("p").unwrap();
  assert_eq!(snapshot.length(), 1);
  assert_eq!(snapshot.item(0).unwrap().id(), p1.id());

  let p2 = doc.create_element("p").unwrap();
  body.append_child(&p2).unwrap();
  p1.remove().unwrap();

  assert_eq!(snapshot.length(), 1);
  assert_eq!(snapshot.item(0).unwrap().id(), p1.id());
}

// P5: a live HTMLCollection reports exactly the set of elements in its
// subtree satisfying its filter at query time, in document order, with no
// duplicates.
#[test]
fn p5_live_collection_reflects_tree_state_at_query_time() {
  let doc = html_doc();
  let body = body_of(&doc);
  let a1 = doc.create_element("p").unwrap();
  let a2 = doc.create_element("p").unwrap();
  body.append_child(&a1).unwrap();
  body.append_child(&a2).unwrap();

  let collection = body.get_elements_by_tag_name("p");
  assert_eq!(collection.length(), 2);
  assert_eq!(collection.item(0).unwrap().id(), a1.id());
  assert_eq!(collection.item(1).unwrap().id(), a2.id());

  a1.remove().unwrap();
  assert_eq!(collection.length(), 1);
  assert_eq!(collection.item(0).unwrap().id(), a2.id());

  let a3 = doc.create_element("p").unwrap();
  body.append_child(&a3).unwrap();
  assert_eq!(collection.length(), 2);
  assert_eq!(collection.item(1).unwrap().id(), a3.id());
}

// P6: attribute-store lookups are invariant under attribute insertion order
// for the same (namespace, localName).
#[test]
fn p6_attribute_lookup_is_invariant_under_insertion_order() {
  let doc = html_doc();
  let a = doc.create_element("a").unwrap();
  a.set_attribute("href", "1").unwrap();
  a.set_attribute("title", "2").unwrap();
  assert_eq!(a.get_attribute("href").as_deref(), Some("1"));

  let b = doc.create_element("a").unwrap();
  b.set_attribute("title", "2").unwrap();
  b.set_attribute("href", "1").unwrap();
  assert_eq!(b.get_attribute("href").as_deref(), Some("1"));
  assert_eq!(b.get_attribute("title").as_deref(), Some("2"));
}

// P7: normalize() is idempotent.
#[test]
fn p7_normalize_is_idempotent() {
  let doc = html_doc();
  let div = doc.create_element("div").unwrap();
  body_of(&doc).append_child(&div).unwrap();
  div.append_child(&doc.create_text_node("a")).unwrap();
  div.append_child(&doc.create_text_node("b")).unwrap();
  div.append_child(&doc.create_comment("c")).unwrap();
  div.append_child(&doc.create_text_node("")).unwrap();
  div.append_child(&doc.create_text_node("d")).unwrap();

  div.normalize();
  let once: Vec<_> = div.children().iter().map(|n| (n.kind(), n.text_content())).collect();
  div.normalize();
  let twice: Vec<_> = div.children().iter().map(|n| (n.kind(), n.text_content())).collect();
  assert_eq!(once, twice);
  assert_eq!(once.iter().filter(|(k, _)| *k == NodeKind::Text).count(), 2);
}

// P8: toggleAttribute(name) twice is a no-op.
#[test]
fn p8_toggle_attribute_twice_is_a_no_op() {
  let doc = html_doc();
  let div = doc.create_element("div").unwrap();
  assert!(!div.has_attribute("hidden"));
  div.toggle_attribute("hidden", None).unwrap();
  div.toggle_attribute("hidden", None).unwrap();
  assert!(!div.has_attribute("hidden"));

  div.set_attribute("hidden", "").unwrap();
  div.toggle_attribute("hidden", None).unwrap();
  div.toggle_attribute("hidden", None).unwrap();
  assert!(div.has_attribute("hidden"));
}

// P9: setProperty(p, v) then removeProperty(p) restores the style attribute
// to its prior serialization.
#[test]
fn p9_set_then_remove_property_restores_prior_style() {
  let doc = html_doc();
  let div = doc.create_element("div").unwrap();
  let style = div.style();
  style.set_property("color", "red", None).unwrap();
  style.set_property("font-weight", "bold", None).unwrap();
  let before = div.get_attribute("style").unwrap();

  style.set_property("margin-top", "4px", None).unwrap();
  assert_ne!(div.get_attribute("style").unwrap(), before);
  style.remove_property("margin-top");

  assert_eq!(div.get_attribute("style").unwrap(), before);
}

// Quirks-mode string parsing is case-insensitive and defaults to no-quirks
// for anything unrecognized.
#[test]
fn quirks_mode_parses_from_strings() {
  let quirks: QuirksMode = "QUIRKS".into();
  assert!(quirks.is_quirks());
  let limited: QuirksMode = "limited-quirks".into();
  assert!(limited.is_limited_quirks());
  let other: QuirksMode = "nonsense".into();
  assert!(other.is_no_quirks());
}
