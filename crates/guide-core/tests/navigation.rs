#![forbid(unsafe_code)]

//! Integration tests for tour navigation over an in-memory page.
//!
//! # Invariants tested
//!
//! 1. `next()` visits every step once; past the end it is a no-op.
//! 2. `back()` at the first step is a no-op.
//! 3. `hide()`/`show()` never move the current step.
//! 4. Navigation runs before-hook, `on_leave`, repaint, `on_enter`,
//!    after-hook, in that order, with exactly one repaint.
//! 5. Commands issued from hooks run after the active transition.
//! 6. `dispose()` drops every listener; later events never repaint.

use std::cell::RefCell;
use std::rc::Rc;

use guide_core::{
    Guide, GuideConfig, GuideError, GuideEvent, GuideOptions, Hooks, MemoryPage, NodeId, Page,
    RawStep, Rect, Sides, StyleValue, Trigger, Viewport,
};
use pretty_assertions::assert_eq;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Fixture {
    page: MemoryPage,
    root: NodeId,
    targets: Vec<NodeId>,
    contents: Vec<NodeId>,
}

impl Fixture {
    /// `n` steps named `s0..`, each with a target and back/next/close
    /// controls inside its content.
    fn new(n: usize) -> Self {
        let page = MemoryPage::new(800.0, 600.0);
        let body = page.body();
        let root = page.append(body, Rect::default(), &[("id", "guide")]);
        let mut targets = Vec::new();
        let mut contents = Vec::new();
        for i in 0..n {
            let name = format!("s{i}");
            targets.push(page.append(
                body,
                Rect::new(100.0, 50.0 + 100.0 * i as f64, 40.0, 20.0),
                &[("data-guide-target", name.as_str())],
            ));
            let content = page.append(
                root,
                Rect::new(0.0, 0.0, 200.0, 100.0),
                &[("data-content", name.as_str())],
            );
            for role in ["back", "next", "close"] {
                page.append_tag(content, "button", Rect::default(), &[("data-role", role)]);
            }
            contents.push(content);
        }
        Self {
            page,
            root,
            targets,
            contents,
        }
    }

    fn guide(&self, config: GuideConfig<NodeId>) -> Guide<MemoryPage> {
        Guide::new(self.page.clone(), self.root, config).expect("guide builds")
    }

    fn control(&self, step: usize, role: &str) -> NodeId {
        self.page
            .find_tagged(&self.contents[step], "data-role", Some(role))
            .into_iter()
            .next()
            .expect("control present")
    }
}

fn deliver(guide: &mut Guide<MemoryPage>, events: Vec<GuideEvent>) {
    for event in events {
        guide.handle_event(event);
    }
}

type Log = Rc<RefCell<Vec<String>>>;

fn push(log: &Log, entry: impl Into<String>) {
    log.borrow_mut().push(entry.into());
}

fn recording_hooks(log: &Log) -> Hooks<NodeId> {
    let (a, b, c, d, e, f) = (
        Rc::clone(log),
        Rc::clone(log),
        Rc::clone(log),
        Rc::clone(log),
        Rc::clone(log),
        Rc::clone(log),
    );
    Hooks::default()
        .on_init(move |_| push(&a, "init"))
        .before_next(move |from, to, _| {
            let from = from.map_or("-", |s| s.name.as_str());
            push(&b, format!("before_next {from}->{}", to.name));
        })
        .after_next(move |from, to, _| {
            let from = from.map_or("-", |s| s.name.as_str());
            push(&c, format!("after_next {from}->{}", to.name));
        })
        .before_back(move |from, to, _| {
            let from = from.map_or("-", |s| s.name.as_str());
            push(&d, format!("before_back {from}->{}", to.name));
        })
        .on_show(move |_| push(&e, "show"))
        .on_hide(move |_| push(&f, "hide"))
}

fn with_step_callbacks(raw: RawStep<NodeId>, log: &Log) -> RawStep<NodeId> {
    let (enter, leave) = (Rc::clone(log), Rc::clone(log));
    raw.on_enter(move |s, _| push(&enter, format!("enter {}", s.name)))
        .on_leave(move |s, _| push(&leave, format!("leave {}", s.name)))
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

#[test]
fn next_visits_every_step_then_stops() {
    let fx = Fixture::new(4);
    let mut guide = fx.guide(GuideConfig::default());

    let mut visited = vec![guide.current_index()];
    for _ in 0..4 {
        guide.next();
        visited.push(guide.current_index());
    }
    assert_eq!(visited, [Some(0), Some(1), Some(2), Some(3), Some(3)]);
    assert_eq!(guide.current_step().map(|s| s.name.as_str()), Some("s3"));
}

#[test]
fn back_is_noop_at_first_step() {
    let fx = Fixture::new(3);
    let mut guide = fx.guide(GuideConfig::default());
    let repaints = guide.repaint_count();

    guide.back();
    assert_eq!(guide.current_index(), Some(0));
    assert_eq!(guide.repaint_count(), repaints);

    guide.next();
    guide.next();
    guide.back();
    assert_eq!(guide.current_index(), Some(1));
}

#[test]
fn hide_then_show_keeps_position() {
    let fx = Fixture::new(3);
    let mut guide = fx.guide(GuideConfig::default());
    guide.next();

    guide.hide();
    assert!(!guide.is_visible());
    assert!(!fx.page.is_displayed(fx.root));
    assert_eq!(guide.current_index(), Some(1));

    guide.show();
    assert!(guide.is_visible());
    assert!(fx.page.is_displayed(fx.root));
    assert_eq!(guide.current_index(), Some(1));
}

#[test]
fn empty_guide_has_no_current_step() {
    let fx = Fixture::new(0);
    let mut guide = fx.guide(GuideConfig::default());
    assert_eq!(guide.current_index(), None);
    guide.next();
    guide.back();
    guide.repaint();
    assert_eq!(guide.current_index(), None);
    assert_eq!(guide.repaint_count(), 0);
    assert!(guide.is_visible());
}

#[test]
fn show_after_inited_false_starts_hidden_on_first_step() {
    let fx = Fixture::new(2);
    let guide = fx.guide(GuideConfig::new(
        GuideOptions::default().show_after_inited(false),
    ));
    assert!(!guide.is_visible());
    assert!(!fx.page.is_displayed(fx.root));
    assert_eq!(guide.current_index(), Some(0));
}

#[test]
fn only_current_content_is_displayed() {
    let fx = Fixture::new(3);
    let mut guide = fx.guide(GuideConfig::default());
    guide.next();
    let shown: Vec<bool> = fx
        .contents
        .iter()
        .map(|c| fx.page.is_displayed(*c))
        .collect();
    assert_eq!(shown, [false, true, false]);
}

// ---------------------------------------------------------------------------
// Hook ordering
// ---------------------------------------------------------------------------

#[test]
fn two_step_walk_runs_hooks_in_order() {
    let fx = Fixture::new(0);
    let body = fx.page.body();
    let log: Log = Rc::default();
    let mut config = GuideConfig::default().hooks(recording_hooks(&log));
    for name in ["a", "b"] {
        fx.page
            .append(body, Rect::new(10.0, 10.0, 10.0, 10.0), &[("data-guide-target", name)]);
        let content = fx.page.append(fx.root, Rect::new(0.0, 0.0, 50.0, 50.0), &[]);
        config = config.step(with_step_callbacks(RawStep::new(content).name(name), &log));
    }

    let mut guide = fx.guide(config);
    assert!(guide.is_visible());
    assert_eq!(guide.current_index(), Some(0));
    assert_eq!(
        *log.borrow(),
        [
            "before_next -->a",
            "enter a",
            "after_next -->a",
            "show",
            "init"
        ]
    );

    log.borrow_mut().clear();
    let repaints = guide.repaint_count();
    guide.next();
    assert_eq!(guide.current_index(), Some(1));
    assert_eq!(guide.repaint_count(), repaints + 1);
    assert_eq!(
        *log.borrow(),
        ["before_next a->b", "leave a", "enter b", "after_next a->b"]
    );

    log.borrow_mut().clear();
    guide.back();
    assert_eq!(*log.borrow(), ["before_back b->a", "leave b", "enter a"]);
}

#[test]
fn noop_navigation_fires_no_hooks() {
    let fx = Fixture::new(1);
    let log: Log = Rc::default();
    let mut guide = fx.guide(GuideConfig::default().hooks(recording_hooks(&log)));
    log.borrow_mut().clear();
    guide.next();
    guide.back();
    assert!(log.borrow().is_empty());
}

#[test]
fn hook_commands_run_after_transition() {
    let fx = Fixture::new(0);
    let log: Log = Rc::default();
    let content_a = fx.page.append(fx.root, Rect::default(), &[]);
    let content_b = fx.page.append(fx.root, Rect::default(), &[]);
    let enter_log = Rc::clone(&log);
    let config = GuideConfig::default()
        .hooks(recording_hooks(&log))
        .step(
            RawStep::new(content_a)
                .name("a")
                .on_enter(move |s, cx| {
                    push(&enter_log, format!("enter {}", s.name));
                    cx.next();
                }),
        )
        .step(with_step_callbacks(RawStep::new(content_b).name("b"), &log));

    let guide = fx.guide(config);
    assert_eq!(guide.current_index(), Some(1));
    assert_eq!(
        *log.borrow(),
        [
            "before_next -->a",
            "enter a",
            "after_next -->a",
            "before_next a->b",
            "enter b",
            "after_next a->b",
            "show",
            "init"
        ]
    );
}

#[test]
fn hook_context_reports_state() {
    let fx = Fixture::new(2);
    let seen: Rc<RefCell<Vec<(Option<usize>, bool, usize)>>> = Rc::default();
    let record = Rc::clone(&seen);
    let hooks = Hooks::default().on_hide(move |cx| {
        record
            .borrow_mut()
            .push((cx.current_index(), cx.is_visible(), cx.step_count()));
    });
    let mut guide = fx.guide(GuideConfig::default().hooks(hooks));
    guide.next();
    guide.hide();
    assert_eq!(*seen.borrow(), [(Some(1), false, 2)]);
}

// ---------------------------------------------------------------------------
// Controls and window events
// ---------------------------------------------------------------------------

#[test]
fn controls_drive_navigation() {
    let fx = Fixture::new(3);
    let mut guide = fx.guide(GuideConfig::default());

    deliver(&mut guide, fx.page.click(fx.control(0, "next")));
    assert_eq!(guide.current_index(), Some(1));
    deliver(&mut guide, fx.page.click(fx.control(1, "next")));
    assert_eq!(guide.current_index(), Some(2));
    deliver(&mut guide, fx.page.click(fx.control(2, "back")));
    assert_eq!(guide.current_index(), Some(1));
    deliver(&mut guide, fx.page.click(fx.control(1, "close")));
    assert!(!guide.is_visible());
    assert_eq!(guide.current_index(), Some(1));
}

#[test]
fn scroll_and_resize_repaint() {
    let fx = Fixture::new(1);
    let mut guide = fx.guide(GuideConfig::new(GuideOptions::default().padding(5.0)));
    let mask = *guide.mask();
    let repaints = guide.repaint_count();

    fx.page.scroll_to(0.0, 30.0);
    deliver(&mut guide, fx.page.fire(&Trigger::WindowScroll));
    assert_eq!(guide.repaint_count(), repaints + 1);
    assert_eq!(fx.page.style_number(mask, "border-top-width"), Some(15.0));

    fx.page.resize(1000.0, 600.0);
    deliver(&mut guide, fx.page.fire(&Trigger::WindowResize));
    assert_eq!(guide.repaint_count(), repaints + 2);
    assert_eq!(fx.page.style_number(mask, "border-right-width"), Some(855.0));
}

// ---------------------------------------------------------------------------
// Geometry through the controller
// ---------------------------------------------------------------------------

#[test]
fn highlight_reference_geometry() {
    let fx = Fixture::new(1);
    let guide = fx.guide(GuideConfig::new(GuideOptions::default().padding(5.0)));
    let mask = *guide.mask();
    let border = |side: &str| fx.page.style_number(mask, &format!("border-{side}-width"));

    assert_eq!(border("top"), Some(45.0));
    assert_eq!(border("left"), Some(95.0));
    assert_eq!(border("right"), Some(655.0));
    assert_eq!(border("bottom"), Some(525.0));
    assert_eq!(fx.page.style_number(mask, "width"), Some(50.0));
    assert_eq!(fx.page.style_number(mask, "height"), Some(30.0));

    let content = fx.contents[0];
    assert_eq!(fx.page.style_number(content, "left"), Some(105.0));
    assert_eq!(fx.page.style_number(content, "top"), Some(55.0));
    assert_eq!(
        fx.page.style(content, "position"),
        Some(StyleValue::from("absolute"))
    );
}

#[test]
fn targetless_step_is_centered() {
    let fx = Fixture::new(0);
    let content = fx
        .page
        .append(fx.root, Rect::new(0.0, 0.0, 200.0, 100.0), &[("data-content", "intro")]);
    let guide = fx.guide(GuideConfig::default());
    let mask = *guide.mask();

    assert!(guide.current_step().is_some_and(|s| !s.has_target()));
    assert_eq!(fx.page.style_number(mask, "border-top-width"), Some(250.0));
    assert_eq!(fx.page.style_number(mask, "border-left-width"), Some(300.0));
    assert_eq!(fx.page.style_number(content, "left"), Some(300.0));
    assert_eq!(fx.page.style_number(content, "top"), Some(250.0));
    assert_eq!(
        fx.page.style(content, "position"),
        Some(StyleValue::from("fixed"))
    );
}

#[test]
fn layout_matches_applied_styles() {
    let fx = Fixture::new(2);
    fx.page.set_viewport(Viewport::new(0.0, 100.0, 800.0, 600.0));
    let mut guide = fx.guide(GuideConfig::default());
    guide.next();
    let paint = guide.layout().expect("current step");
    let mask = *guide.mask();
    assert_eq!(
        fx.page.style_number(mask, "border-top-width"),
        Some(paint.mask.border.top)
    );
    assert_eq!(
        fx.page.style_number(fx.contents[1], "top"),
        Some(paint.content.top)
    );
}

// ---------------------------------------------------------------------------
// Mutation
// ---------------------------------------------------------------------------

#[test]
fn removing_earlier_step_keeps_current() {
    let fx = Fixture::new(3);
    let mut guide = fx.guide(GuideConfig::default());
    guide.next();
    guide.next();
    guide.remove_step("s0");
    assert_eq!(guide.current_index(), Some(1));
    assert_eq!(guide.current_step().map(|s| s.name.as_str()), Some("s2"));
}

#[test]
fn removing_current_step_moves_on_and_repaints() {
    let fx = Fixture::new(3);
    let mut guide = fx.guide(GuideConfig::default());
    let repaints = guide.repaint_count();

    guide.remove_step("s0");
    assert_eq!(guide.current_step().map(|s| s.name.as_str()), Some("s1"));
    assert_eq!(guide.repaint_count(), repaints + 1);
    assert!(!fx.page.is_displayed(fx.contents[0]));
    assert!(fx.page.is_displayed(fx.contents[1]));

    guide.next();
    guide.remove_step("s2");
    assert_eq!(guide.current_step().map(|s| s.name.as_str()), Some("s1"));

    guide.remove_step("s1");
    assert_eq!(guide.current_index(), None);
    assert_eq!(guide.step_count(), 0);
}

#[test]
fn removing_unknown_step_is_noop() {
    let fx = Fixture::new(2);
    let mut guide = fx.guide(GuideConfig::default());
    let repaints = guide.repaint_count();
    guide.remove_step("nope");
    assert_eq!(guide.step_count(), 2);
    assert_eq!(guide.repaint_count(), repaints);
}

#[test]
fn removed_step_controls_are_unbound() {
    let fx = Fixture::new(2);
    let mut guide = fx.guide(GuideConfig::default());
    assert_eq!(fx.page.listener_count(), 2 + 2 * 3);

    guide.remove_step("s1");
    assert_eq!(fx.page.listener_count(), 2 + 3);
    assert!(fx.page.click(fx.control(1, "next")).is_empty());
}

#[test]
fn on_remove_step_sees_the_step() {
    let fx = Fixture::new(2);
    let removed: Log = Rc::default();
    let record = Rc::clone(&removed);
    let hooks = Hooks::default().on_remove_step(move |s, _| push(&record, s.name.clone()));
    let mut guide = fx.guide(GuideConfig::default().hooks(hooks));
    guide.remove_step("s1");
    guide.remove_step("s1");
    assert_eq!(*removed.borrow(), ["s1"]);
}

#[test]
fn added_step_is_navigable_and_wired() {
    let fx = Fixture::new(1);
    let mut guide = fx.guide(GuideConfig::default());
    let listeners = fx.page.listener_count();

    let content = fx.page.append(fx.root, Rect::new(0.0, 0.0, 80.0, 40.0), &[]);
    let back = fx
        .page
        .append_tag(content, "button", Rect::default(), &[("data-role", "back")]);
    guide
        .add_step(RawStep::new(content).name("late"))
        .expect("step added");

    assert_eq!(guide.step_count(), 2);
    assert_eq!(fx.page.listener_count(), listeners + 1);
    assert!(!fx.page.is_displayed(content));

    guide.next();
    assert_eq!(guide.current_step().map(|s| s.name.as_str()), Some("late"));
    deliver(&mut guide, fx.page.click(back));
    assert_eq!(guide.current_index(), Some(0));
}

#[test]
fn add_step_rejects_duplicates() {
    let fx = Fixture::new(1);
    let mut guide = fx.guide(GuideConfig::default());
    let content = fx.page.append(fx.root, Rect::default(), &[]);
    assert_eq!(
        guide.add_step(RawStep::new(content).name("s0")),
        Err(GuideError::DuplicateStep("s0".into()))
    );
    assert_eq!(guide.step_count(), 1);
}

#[test]
fn on_add_step_can_edit_the_step() {
    let fx = Fixture::new(2);
    let hooks = Hooks::default().on_add_step(|s, _| {
        if s.name == "s1" {
            s.padding = Sides::all(0.0);
        }
    });
    let guide = fx.guide(GuideConfig::default().hooks(hooks));
    assert_eq!(guide.step("s0").map(|s| s.padding), Some(Sides::all(10.0)));
    assert_eq!(guide.step("s1").map(|s| s.padding), Some(Sides::all(0.0)));
}

// ---------------------------------------------------------------------------
// Dispose
// ---------------------------------------------------------------------------

#[test]
fn dispose_detaches_everything() {
    let fx = Fixture::new(2);
    let disposed: Log = Rc::default();
    let record = Rc::clone(&disposed);
    let hooks = Hooks::default().on_dispose(move |_| push(&record, "dispose"));
    let mut guide = fx.guide(GuideConfig::default().hooks(hooks));
    assert_eq!(fx.page.window_listener_count(), 2);

    guide.dispose();
    assert!(guide.is_disposed());
    assert_eq!(fx.page.window_listener_count(), 0);
    assert_eq!(fx.page.listener_count(), 0);
    assert!(!fx.page.is_connected(fx.root));
    assert!(fx.page.select(".guide-mask").is_empty());

    let repaints = guide.repaint_count();
    fx.page.resize(1024.0, 768.0);
    assert!(fx.page.fire(&Trigger::WindowResize).is_empty());
    guide.handle_event(GuideEvent::Resized);
    guide.handle_event(GuideEvent::Scrolled);
    assert_eq!(guide.repaint_count(), repaints);

    guide.next();
    guide.dispose();
    assert_eq!(guide.current_index(), Some(0));
    assert_eq!(*disposed.borrow(), ["dispose"]);
}

#[test]
fn add_step_after_dispose_fails() {
    let fx = Fixture::new(1);
    let mut guide = fx.guide(GuideConfig::default());
    guide.dispose();
    let content = fx.page.append(fx.page.body(), Rect::default(), &[]);
    assert_eq!(
        guide.add_step(RawStep::new(content)),
        Err(GuideError::Disposed)
    );
}

#[test]
fn targets_stay_in_document() {
    let fx = Fixture::new(2);
    let mut guide = fx.guide(GuideConfig::default());
    guide.dispose();
    assert!(fx.targets.iter().all(|t| fx.page.is_connected(*t)));
}
