#![forbid(unsafe_code)]

//! Integration tests for step discovery from markup and option handling.
//!
//! # Invariants tested
//!
//! 1. Markup steps are registered in document order, before explicit steps.
//! 2. Missing target, offset, padding and controls are filled from markup
//!    attributes, then from global options; explicit values always win.
//! 3. Target lookup honors the scope selector.
//! 4. Structural mask properties override user mask styles.
//! 5. A failed construction leaves no mask behind and restores the styles it
//!    applied.

use std::rc::Rc;

use guide_core::{
    Attachments, AttrNameMap, Control, Guide, GuideConfig, GuideError, GuideOptions, MemoryPage,
    NodeId, Offset, Page, PartialSides, RawStep, Rect, Sides, StyleMap, StyleValue,
};
use pretty_assertions::assert_eq;

fn page_and_root() -> (MemoryPage, NodeId) {
    let page = MemoryPage::new(800.0, 600.0);
    let root = page.append(page.body(), Rect::default(), &[("id", "guide")]);
    (page, root)
}

fn build(page: &MemoryPage, root: NodeId, config: GuideConfig<NodeId>) -> Guide<MemoryPage> {
    Guide::new(page.clone(), root, config).expect("guide builds")
}

fn names(guide: &Guide<MemoryPage>) -> Vec<String> {
    guide.steps().map(|s| s.name.clone()).collect()
}

#[test]
fn markup_steps_precede_explicit_steps() {
    let (page, root) = page_and_root();
    let wrapper = page.append(root, Rect::default(), &[]);
    page.append(wrapper, Rect::default(), &[("data-content", "first")]);
    page.append(root, Rect::default(), &[("data-content", "second")]);
    page.append(root, Rect::default(), &[("data-content", "")]);
    let extra = page.append(root, Rect::default(), &[]);

    let guide = build(
        &page,
        root,
        GuideConfig::default().step(RawStep::new(extra).name("extra")),
    );
    assert_eq!(names(&guide), ["first", "second", "extra"]);
}

#[test]
fn unnamed_explicit_steps_get_generated_names() {
    let (page, root) = page_and_root();
    let a = page.append(root, Rect::default(), &[]);
    let b = page.append(root, Rect::default(), &[]);
    let guide = build(
        &page,
        root,
        GuideConfig::default()
            .step(RawStep::new(a))
            .step(RawStep::new(b).name("")),
    );
    assert_eq!(names(&guide), ["guide_0", "guide_1"]);
}

#[test]
fn target_found_by_name_and_explicit_target_wins() {
    let (page, root) = page_and_root();
    let body = page.body();
    let tagged = page.append(body, Rect::default(), &[("data-guide-target", "a")]);
    let other = page.append(body, Rect::default(), &[]);
    page.append(root, Rect::default(), &[("data-content", "a")]);
    let b_content = page.append(root, Rect::default(), &[]);

    let guide = build(
        &page,
        root,
        GuideConfig::default().step(RawStep::new(b_content).name("b").target(other)),
    );
    assert_eq!(guide.step("a").and_then(|s| s.target), Some(tagged));
    assert_eq!(guide.step("b").and_then(|s| s.target), Some(other));
}

#[test]
fn scope_restricts_target_lookup() {
    let (page, root) = page_and_root();
    let body = page.body();
    let area = page.append(body, Rect::default(), &[("class", "tour-area")]);
    page.append(body, Rect::default(), &[("data-guide-target", "outside")]);
    let inside = page.append(area, Rect::default(), &[("data-guide-target", "inside")]);
    page.append(root, Rect::default(), &[("data-content", "outside")]);
    page.append(root, Rect::default(), &[("data-content", "inside")]);

    let guide = build(
        &page,
        root,
        GuideConfig::new(GuideOptions::default().scope(".tour-area")),
    );
    assert_eq!(guide.step("outside").map(|s| s.has_target()), Some(false));
    assert_eq!(guide.step("inside").and_then(|s| s.target), Some(inside));
}

#[test]
fn data_attributes_override_globals() {
    let (page, root) = page_and_root();
    page.append(
        page.body(),
        Rect::default(),
        &[("data-guide-target", "a"), ("data-padding-top", "0"), ("data-padding-left", "4px")],
    );
    page.append(
        root,
        Rect::default(),
        &[("data-content", "a"), ("data-offset-left", "3")],
    );

    let guide = build(
        &page,
        root,
        GuideConfig::new(GuideOptions::default().padding(8.0).offset(12.0)),
    );
    let step = guide.step("a").expect("step a");
    assert_eq!(step.padding, Sides::new(0.0, 8.0, 8.0, 4.0));
    assert_eq!(step.offset, Offset::new(3.0, 12.0));
}

#[test]
fn explicit_values_beat_data_attributes() {
    let (page, root) = page_and_root();
    let target = page.append(
        page.body(),
        Rect::default(),
        &[("data-padding-top", "1"), ("data-padding-bottom", "2")],
    );
    let content = page.append(root, Rect::default(), &[("data-offset-top", "7")]);

    let raw = RawStep::new(content)
        .name("a")
        .target(target)
        .padding(PartialSides {
            top: Some(20.0),
            ..PartialSides::default()
        })
        .offset(Offset::new(1.0, 2.0));
    let guide = build(&page, root, GuideConfig::default().step(raw));
    let step = guide.step("a").expect("step a");
    assert_eq!(step.padding, Sides::new(20.0, 10.0, 2.0, 10.0));
    assert_eq!(step.offset, Offset::new(1.0, 2.0));
}

#[test]
fn first_control_per_role_is_used() {
    let (page, root) = page_and_root();
    let content = page.append(root, Rect::default(), &[("data-content", "a")]);
    let next = page.append(content, Rect::default(), &[("data-role", "next")]);
    page.append(content, Rect::default(), &[("data-role", "next")]);
    let close = page.append(content, Rect::default(), &[("data-role", "close")]);

    let guide = build(&page, root, GuideConfig::default());
    let step = guide.step("a").expect("step a");
    assert_eq!(step.control(Control::Next), Some(&next));
    assert_eq!(step.control(Control::Close), Some(&close));
    assert_eq!(step.control(Control::Back), None);
    // Two window listeners plus next and close.
    assert_eq!(page.listener_count(), 4);
}

#[test]
fn custom_attribute_names() {
    let (page, root) = page_and_root();
    let target = page.append(page.body(), Rect::default(), &[("data-anchor", "a")]);
    let content = page.append(root, Rect::default(), &[("data-tour", "a")]);
    let next = page.append(content, Rect::default(), &[("data-act", "next")]);
    page.append(root, Rect::default(), &[("data-content", "ignored")]);

    let map = AttrNameMap {
        target: "anchor".into(),
        content: "tour".into(),
        role: "act".into(),
    };
    let guide = build(
        &page,
        root,
        GuideConfig::new(GuideOptions::default().attr_name_map(map)),
    );
    assert_eq!(names(&guide), ["a"]);
    let step = guide.step("a").expect("step a");
    assert_eq!(step.target, Some(target));
    assert_eq!(step.control(Control::Next), Some(&next));
}

#[test]
fn duplicate_markup_names_fail_without_leaving_a_mask() {
    let (page, root) = page_and_root();
    page.append(root, Rect::default(), &[("data-content", "a")]);
    page.append(root, Rect::default(), &[("data-content", "a")]);

    let err = Guide::new(page.clone(), root, GuideConfig::default()).unwrap_err();
    assert_eq!(err, GuideError::DuplicateStep("a".into()));
    assert!(page.select(".guide-mask").is_empty());
    assert_eq!(page.listener_count(), 0);
}

#[test]
fn failed_construction_restores_root_and_content_styles() {
    let (page, root) = page_and_root();
    let first = page.append(root, Rect::default(), &[("data-content", "a")]);
    page.append(root, Rect::default(), &[("data-content", "b")]);
    let explicit = page.append(root, Rect::default(), &[]);

    let config = GuideConfig::default().step(RawStep::new(explicit).name("b"));
    let err = Guide::new(page.clone(), root, config).unwrap_err();
    assert_eq!(err, GuideError::DuplicateStep("b".into()));

    assert_eq!(page.style(root, "display"), None);
    assert!(page.is_displayed(root));
    for property in ["display", "position", "z-index"] {
        assert_eq!(page.style(first, property), None, "{property}");
    }
}

#[test]
fn mask_gets_user_and_structural_style() {
    let (page, root) = page_and_root();
    let user = StyleMap::new()
        .with("background-color", "red")
        .with("position", "absolute");
    let guide = build(
        &page,
        root,
        GuideConfig::new(GuideOptions::default().mask_style(&user)),
    );
    let mask = *guide.mask();

    assert_eq!(page.select(".guide-mask"), vec![mask]);
    assert_eq!(page.children(root).last(), Some(&mask));
    assert_eq!(page.style(mask, "position"), Some(StyleValue::from("fixed")));
    assert_eq!(page.style(mask, "border-style"), Some(StyleValue::from("solid")));
    assert_eq!(
        page.style(mask, "background-color"),
        Some(StyleValue::from("red"))
    );
    assert_eq!(
        page.style(mask, "border-color"),
        Some(StyleValue::from("rgba(0, 0, 0, 0.7)"))
    );
}

#[test]
fn json_options_flow_into_content_style() {
    let (page, root) = page_and_root();
    let content = page.append(root, Rect::default(), &[("data-content", "a")]);
    let options = GuideOptions::from_json(r#"{"maskStyle": {"zIndex": 40}, "padding": "6"}"#)
        .expect("valid options");

    let guide = build(&page, root, GuideConfig::new(options));
    assert_eq!(page.style_number(content, "z-index"), Some(41.0));
    assert_eq!(guide.step("a").map(|s| s.padding), Some(Sides::all(6.0)));
    assert_eq!(
        page.style(*guide.mask(), "border-color"),
        Some(StyleValue::from("rgba(0, 0, 0, 0.7)"))
    );
}

#[test]
fn attach_returns_existing_guide_for_same_root() {
    let (page, root) = page_and_root();
    page.append(root, Rect::default(), &[("data-content", "a")]);
    let mut table = Attachments::new();

    let first = table
        .attach(page.clone(), root, GuideConfig::default())
        .expect("first attach");
    let again = table
        .attach(page.clone(), root, GuideConfig::default())
        .expect("second attach");
    assert!(Rc::ptr_eq(&first, &again));
    assert_eq!(page.select(".guide-mask").len(), 1);
    assert_eq!(table.len(), 1);

    first.borrow_mut().dispose();
    let fresh = table
        .attach(page.clone(), root, GuideConfig::default())
        .expect("attach after dispose");
    assert!(!Rc::ptr_eq(&first, &fresh));
    assert_eq!(table.len(), 1);
}

#[test]
fn detach_forgets_without_disposing() {
    let (page, root) = page_and_root();
    let mut table = Attachments::new();
    let guide = table
        .attach(page.clone(), root, GuideConfig::default())
        .expect("attach");
    let detached = table.detach(&root).expect("attached");
    assert!(Rc::ptr_eq(&guide, &detached));
    assert!(table.is_empty());
    assert!(!guide.borrow().is_disposed());
}
