#![forbid(unsafe_code)]

//! `wasm-bindgen` exports: `attach` and [`GuideHandle`].
//!
//! Only compiled on `wasm32` targets.

use std::cell::RefCell;
use std::rc::Rc;

use guide_core::{
    Attachments, Control, GuideConfig, GuideCx, GuideError, GuideEvent, GuideOptions, Hooks, Page,
    RawStep, Step,
};
use js_sys::{Array, Function, Object, Reflect};
use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Element;

use crate::descriptor::{HookKind, OPTION_KEYS, STEPS_KEY, StepFields};
use crate::dispatch::{Dispatcher, HandleCall, WeakDispatcher};
use crate::dom::{Deliver, DomPage};

thread_local! {
    static ATTACHED: RefCell<Attachments<DomPage>> = RefCell::new(Attachments::new());
    static DISPATCHERS: RefCell<Vec<Dispatcher<DomPage>>> = const { RefCell::new(Vec::new()) };
}

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = if let Some(loc) = info.location() {
                format!(
                    "panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                )
            } else {
                format!("panic: {info}")
            };
            console_error(&msg);
        }));
    });
}

fn set_js(obj: &Object, key: &str, value: JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(key), &value);
}

fn get_js(obj: &JsValue, key: &str) -> JsValue {
    Reflect::get(obj, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

fn js_error(err: impl core::fmt::Display) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

/// Serialize a plain script value; `undefined` and unserializable values
/// become `null`.
fn to_json(value: &JsValue) -> Result<Value, GuideError> {
    if value.is_undefined() || value.is_null() {
        return Ok(Value::Null);
    }
    let Some(text) = js_sys::JSON::stringify(value)
        .ok()
        .and_then(|s| s.as_string())
    else {
        return Ok(Value::Null);
    };
    Ok(serde_json::from_str(&text)?)
}

fn parse_options(options: &JsValue) -> Result<GuideOptions, GuideError> {
    if !options.is_object() {
        return GuideOptions::from_value(&Value::Null);
    }
    let plain = Object::new();
    for key in OPTION_KEYS {
        let value = get_js(options, key);
        if !value.is_undefined() {
            set_js(&plain, key, value);
        }
    }
    GuideOptions::from_value(&to_json(&plain.into())?)
}

/// An element given directly or as a selector string.
fn element_ref(page: &DomPage, value: &JsValue) -> Option<Element> {
    if let Some(el) = value.dyn_ref::<Element>() {
        return Some(el.clone());
    }
    let selector = value.as_string()?;
    page.select(&selector).into_iter().next()
}

fn function_ref(value: &JsValue) -> Option<Function> {
    value.dyn_ref::<Function>().cloned()
}

fn report(kind: &str, result: Result<JsValue, JsValue>) {
    if let Err(err) = result {
        tracing::warn!(hook = kind, error = ?err, "script hook threw");
        console_error(&format!("guide hook `{kind}` threw: {err:?}"));
    }
}

fn handle_value(dispatcher: &Dispatcher<DomPage>) -> JsValue {
    GuideHandle {
        dispatcher: dispatcher.clone(),
    }
    .into()
}

/// Handle for a script callback, or `None` once every handle has been
/// dropped.
fn live_handle(dispatcher: &WeakDispatcher<DomPage>) -> Option<JsValue> {
    dispatcher.upgrade().as_ref().map(handle_value)
}

fn name_value(step: Option<&Step<Element>>) -> JsValue {
    step.map_or(JsValue::NULL, |s| JsValue::from_str(&s.name))
}

/// Wrap a script `onEnter`/`onLeave` function, called as `(name, handle)`.
fn step_callback(
    kind: &'static str,
    f: Function,
    dispatcher: WeakDispatcher<DomPage>,
) -> impl Fn(&Step<Element>, &mut GuideCx) + 'static {
    move |step, _| {
        let Some(handle) = live_handle(&dispatcher) else {
            return;
        };
        let name = JsValue::from_str(&step.name);
        report(kind, f.call2(&JsValue::NULL, &name, &handle));
    }
}

/// Script view of a resolved step handed to `onAddStep`.
fn step_object(step: &Step<Element>) -> Object {
    let obj = Object::new();
    set_js(&obj, "name", JsValue::from_str(&step.name));
    set_js(&obj, "content", step.content.clone().into());
    set_js(
        &obj,
        "target",
        step.target.clone().map_or(JsValue::NULL, Into::into),
    );
    obj
}

/// Build a raw step from a script descriptor.
fn step_from_js(
    page: &DomPage,
    descriptor: &JsValue,
    dispatcher: &WeakDispatcher<DomPage>,
) -> Result<RawStep<Element>, GuideError> {
    let plain = Object::new();
    for key in ["name", "offset", "padding"] {
        let value = get_js(descriptor, key);
        if !value.is_undefined() {
            set_js(&plain, key, value);
        }
    }
    let fields = StepFields::from_value(&to_json(&plain.into())?)?;
    let label = fields.name.clone().unwrap_or_else(|| "<unnamed>".to_owned());
    let content = element_ref(page, &get_js(descriptor, "content"))
        .ok_or(GuideError::MissingContent(label))?;

    let mut raw = RawStep::new(content);
    raw.name = fields.name;
    raw.offset = fields.offset;
    raw.padding = fields.padding;
    raw.target = element_ref(page, &get_js(descriptor, "target"));
    for control in Control::ALL {
        if let Some(el) = element_ref(page, &get_js(descriptor, control.role())) {
            raw = raw.control(control, el);
        }
    }
    if let Some(f) = function_ref(&get_js(descriptor, "onEnter")) {
        raw = raw.on_enter(step_callback("onEnter", f, dispatcher.clone()));
    }
    if let Some(f) = function_ref(&get_js(descriptor, "onLeave")) {
        raw = raw.on_leave(step_callback("onLeave", f, dispatcher.clone()));
    }
    Ok(raw)
}

fn hooks_from_js(options: &JsValue, dispatcher: &WeakDispatcher<DomPage>) -> Hooks<Element> {
    let mut hooks = Hooks::default();
    if !options.is_object() {
        return hooks;
    }
    for kind in HookKind::ALL {
        let Some(f) = function_ref(&get_js(options, kind.js_name())) else {
            continue;
        };
        let d = dispatcher.clone();
        let name = kind.js_name();

        if kind.is_transition() {
            let hook = move |from: Option<&Step<Element>>,
                             to: &Step<Element>,
                             _: &mut GuideCx| {
                let Some(handle) = live_handle(&d) else {
                    return;
                };
                let (from, to) = (name_value(from), name_value(Some(to)));
                report(name, f.call3(&JsValue::NULL, &from, &to, &handle));
            };
            hooks = match kind {
                HookKind::BeforeNext => hooks.before_next(hook),
                HookKind::AfterNext => hooks.after_next(hook),
                HookKind::BeforeBack => hooks.before_back(hook),
                _ => hooks.after_back(hook),
            };
            continue;
        }

        hooks = match kind {
            // Called with a step object; `onEnter`/`onLeave` functions set on
            // it are installed on the step.
            HookKind::AddStep => hooks.on_add_step(move |step, _| {
                let Some(handle) = live_handle(&d) else {
                    return;
                };
                let obj = step_object(step);
                report(name, f.call2(&JsValue::NULL, &obj, &handle));
                if let Some(enter) = function_ref(&get_js(&obj, "onEnter")) {
                    step.set_on_enter(step_callback("onEnter", enter, d.clone()));
                }
                if let Some(leave) = function_ref(&get_js(&obj, "onLeave")) {
                    step.set_on_leave(step_callback("onLeave", leave, d.clone()));
                }
            }),
            HookKind::RemoveStep => hooks.on_remove_step(move |step, _| {
                let Some(handle) = live_handle(&d) else {
                    return;
                };
                let step = name_value(Some(step));
                report(name, f.call2(&JsValue::NULL, &step, &handle));
            }),
            _ => {
                let hook = move |_: &mut GuideCx| {
                    let Some(handle) = live_handle(&d) else {
                        return;
                    };
                    report(name, f.call1(&JsValue::NULL, &handle));
                };
                match kind {
                    HookKind::Init => hooks.on_init(hook),
                    HookKind::Show => hooks.on_show(hook),
                    HookKind::Hide => hooks.on_hide(hook),
                    _ => hooks.on_dispose(hook),
                }
            }
        };
    }
    hooks
}

fn existing_dispatcher(root: &Element) -> Option<Dispatcher<DomPage>> {
    let shared = ATTACHED.with(|table| {
        let mut table = table.try_borrow_mut().ok()?;
        table.prune();
        table.get(root)
    })?;
    DISPATCHERS.with(|list| {
        list.borrow()
            .iter()
            .find(|d| d.routes_to(&shared))
            .cloned()
    })
}

#[wasm_bindgen(start)]
pub fn wasm_start() {
    install_panic_hook();
}

/// Attach a guide to `root`, or return the handle of the guide already
/// attached to it.
///
/// `options` accepts the plain option keys, hook functions and a `steps`
/// array of descriptors `{content, target?, name?, offset?, padding?, back?,
/// next?, close?, onEnter?, onLeave?}`, where element fields take an element
/// or a selector string. `onAddStep` receives `{name, content, target}` and
/// may set `onEnter`/`onLeave` on it.
#[wasm_bindgen]
pub fn attach(root: Element, options: JsValue) -> Result<GuideHandle, JsValue> {
    install_panic_hook();
    if let Some(dispatcher) = existing_dispatcher(&root) {
        tracing::debug!("guide already attached; returning existing handle");
        return Ok(GuideHandle { dispatcher });
    }

    let parsed = parse_options(&options).map_err(js_error)?;
    let dispatcher = Dispatcher::<DomPage>::new();
    let weak = dispatcher.downgrade();
    let deliver: Deliver = {
        let d = weak.clone();
        Rc::new(move |event: GuideEvent| {
            let Some(d) = d.upgrade() else {
                return;
            };
            if let Err(err) = d.call(HandleCall::Event(event)) {
                tracing::warn!(error = %err, "event delivery failed");
            }
        })
    };
    let page = DomPage::new(deliver)?;

    let mut config = GuideConfig::new(parsed).hooks(hooks_from_js(&options, &weak));
    let steps = get_js(&options, STEPS_KEY);
    if let Some(steps) = steps.dyn_ref::<Array>() {
        for descriptor in steps.iter() {
            let raw = step_from_js(&page, &descriptor, &weak).map_err(js_error)?;
            config = config.step(raw);
        }
    }

    let shared = ATTACHED.with(|table| {
        let mut table = table
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("attach called from inside a guide hook"))?;
        table.attach(page, root, config).map_err(js_error)
    })?;
    dispatcher.bind(shared);
    forget_disposed();
    DISPATCHERS.with(|list| list.borrow_mut().push(dispatcher.clone()));
    Ok(GuideHandle { dispatcher })
}

/// Release the tables' hold on disposed guides. Once script handles are
/// gone too, nothing keeps them alive.
fn forget_disposed() {
    DISPATCHERS.with(|list| {
        if let Ok(mut list) = list.try_borrow_mut() {
            list.retain(|d| !d.snapshot().disposed);
        }
    });
    ATTACHED.with(|table| {
        if let Ok(mut table) = table.try_borrow_mut() {
            table.prune();
        }
    });
}

/// Script handle to an attached guide.
///
/// Methods called from inside the guide's own hooks are queued and run once
/// the active call returns.
#[wasm_bindgen]
pub struct GuideHandle {
    dispatcher: Dispatcher<DomPage>,
}

#[wasm_bindgen]
impl GuideHandle {
    fn run(&self, call: HandleCall<Element>) -> Result<(), JsValue> {
        self.dispatcher.call(call).map_err(js_error)
    }

    /// Reveal the guide.
    pub fn show(&self) -> Result<(), JsValue> {
        self.run(HandleCall::Show)
    }

    /// Conceal the guide, keeping the current step.
    pub fn hide(&self) -> Result<(), JsValue> {
        self.run(HandleCall::Hide)
    }

    pub fn next(&self) -> Result<(), JsValue> {
        self.run(HandleCall::Next)
    }

    pub fn back(&self) -> Result<(), JsValue> {
        self.run(HandleCall::Back)
    }

    /// Recompute the layout of the current step.
    pub fn repaint(&self) -> Result<(), JsValue> {
        self.run(HandleCall::Repaint)
    }

    /// Append a step from a descriptor (see `attach`).
    #[wasm_bindgen(js_name = addStep)]
    pub fn add_step(&self, descriptor: JsValue) -> Result<(), JsValue> {
        let raw = {
            let Some(guide) = self.dispatcher.guide() else {
                return Err(js_error(GuideError::Disposed));
            };
            let Ok(guide) = guide.try_borrow() else {
                return Err(JsValue::from_str("addStep called from inside a guide hook"));
            };
            step_from_js(guide.page(), &descriptor, &self.dispatcher.downgrade())
                .map_err(js_error)?
        };
        self.run(HandleCall::AddStep(raw))
    }

    /// Remove the step called `name`; unknown names are ignored.
    #[wasm_bindgen(js_name = removeStep)]
    pub fn remove_step(&self, name: String) -> Result<(), JsValue> {
        self.run(HandleCall::RemoveStep(name))
    }

    /// Detach listeners and remove the guide root from the document.
    pub fn dispose(&self) -> Result<(), JsValue> {
        self.run(HandleCall::Dispose)?;
        forget_disposed();
        Ok(())
    }

    #[wasm_bindgen(js_name = isVisible)]
    pub fn is_visible(&self) -> bool {
        self.dispatcher.snapshot().visible
    }

    #[wasm_bindgen(js_name = isDisposed)]
    pub fn is_disposed(&self) -> bool {
        self.dispatcher.snapshot().disposed
    }

    /// Index of the current step, or `undefined` before the first step.
    #[wasm_bindgen(js_name = currentIndex)]
    pub fn current_index(&self) -> Option<u32> {
        self.dispatcher
            .snapshot()
            .current
            .and_then(|i| u32::try_from(i).ok())
    }

    #[wasm_bindgen(js_name = stepCount)]
    pub fn step_count(&self) -> u32 {
        u32::try_from(self.dispatcher.snapshot().step_count).unwrap_or(u32::MAX)
    }

    /// `{ current, visible, stepCount, disposed }`.
    pub fn state(&self) -> JsValue {
        let snapshot = self.dispatcher.snapshot();
        let obj = Object::new();
        match snapshot.current {
            Some(i) => set_js(&obj, "current", JsValue::from_f64(i as f64)),
            None => set_js(&obj, "current", JsValue::NULL),
        }
        set_js(&obj, "visible", snapshot.visible.into());
        set_js(&obj, "stepCount", JsValue::from_f64(snapshot.step_count as f64));
        set_js(&obj, "disposed", snapshot.disposed.into());
        obj.into()
    }
}
