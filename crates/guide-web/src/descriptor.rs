#![forbid(unsafe_code)]

//! Script-facing option and step descriptor shapes.
//!
//! A script passes one options object carrying plain values, DOM elements and
//! functions side by side. The binding layer splits it: plain values are
//! serialized and parsed here, elements and functions are read directly.

use guide_core::options::{parse_partial_offset, parse_partial_sides};
use guide_core::{GuideError, PartialOffset, PartialSides};
use serde_json::Value;

/// Option keys forwarded to [`guide_core::GuideOptions::from_value`].
pub const OPTION_KEYS: [&str; 7] = [
    "scope",
    "showAfterInited",
    "padding",
    "offset",
    "maskStyle",
    "attrNameMap",
    "attrDataMap",
];

/// Key holding the explicit step descriptors.
pub const STEPS_KEY: &str = "steps";

/// Hook functions recognized on the options object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Init,
    AddStep,
    RemoveStep,
    BeforeNext,
    AfterNext,
    BeforeBack,
    AfterBack,
    Show,
    Hide,
    Dispose,
}

impl HookKind {
    pub const ALL: [HookKind; 10] = [
        HookKind::Init,
        HookKind::AddStep,
        HookKind::RemoveStep,
        HookKind::BeforeNext,
        HookKind::AfterNext,
        HookKind::BeforeBack,
        HookKind::AfterBack,
        HookKind::Show,
        HookKind::Hide,
        HookKind::Dispose,
    ];

    /// Property name on the options object.
    #[must_use]
    pub const fn js_name(self) -> &'static str {
        match self {
            Self::Init => "onInit",
            Self::AddStep => "onAddStep",
            Self::RemoveStep => "onRemoveStep",
            Self::BeforeNext => "beforeNext",
            Self::AfterNext => "afterNext",
            Self::BeforeBack => "beforeBack",
            Self::AfterBack => "afterBack",
            Self::Show => "onShow",
            Self::Hide => "onHide",
            Self::Dispose => "onDispose",
        }
    }

    /// Whether the hook is called with `(from, to, handle)`.
    #[must_use]
    pub const fn is_transition(self) -> bool {
        matches!(
            self,
            Self::BeforeNext | Self::AfterNext | Self::BeforeBack | Self::AfterBack
        )
    }
}

/// Plain-valued part of a step descriptor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StepFields {
    pub name: Option<String>,
    pub offset: Option<PartialOffset>,
    pub padding: Option<PartialSides>,
}

impl StepFields {
    /// Parse `{name?, offset?, padding?}`; other keys are ignored.
    pub fn from_value(value: &Value) -> Result<Self, GuideError> {
        let Value::Object(map) = value else {
            return match value {
                Value::Null => Ok(Self::default()),
                other => Err(GuideError::invalid(
                    "steps",
                    format!("expected a step object, got {other}"),
                )),
            };
        };
        let name = match map.get("name") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(other) => {
                return Err(GuideError::invalid(
                    "name",
                    format!("expected a string, got {other}"),
                ));
            }
        };
        let offset = match map.get("offset") {
            None | Some(Value::Null) => None,
            Some(v) => Some(parse_partial_offset(v)?),
        };
        let padding = match map.get("padding") {
            None | Some(Value::Null) => None,
            Some(v) => Some(parse_partial_sides(v)?),
        };
        Ok(Self {
            name,
            offset,
            padding,
        })
    }
}
