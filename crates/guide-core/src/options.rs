#![forbid(unsafe_code)]

//! Guide options.
//!
//! Options arrive either from Rust (builder methods on [`GuideOptions`]) or as
//! a JSON object from a script host. JSON input is merged over
//! [`GuideOptions::default_json`] with the fill-if-absent merge before each
//! field is validated, so partial objects such as `{"maskStyle": {"zIndex":
//! 5}}` keep the remaining defaults.
//!
//! Recognized keys (camelCase): `scope`, `showAfterInited`, `padding`,
//! `offset`, `maskStyle`, `attrNameMap` (alias `attrDataMap`). Unknown keys
//! are ignored so hosts can carry `steps` and hook functions in the same
//! object.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::GuideError;
use crate::geometry::{Offset, Sides};
use crate::merge::{self, FillDefaults};
use crate::step::{PartialOffset, PartialSides};
use crate::style::{StyleMap, StyleValue};

/// Default highlight padding around each target.
pub const DEFAULT_PADDING: f64 = 10.0;
/// Default content offset from the highlighted region.
pub const DEFAULT_OFFSET: f64 = 10.0;
/// Default mask stacking order.
pub const DEFAULT_MASK_Z_INDEX: f64 = 999.0;
/// Default mask color.
pub const DEFAULT_MASK_COLOR: &str = "rgba(0, 0, 0, 0.7)";

/// Names of the `data-*` attributes used for markup discovery.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AttrNameMap {
    /// Marks a target element; value is the step name.
    pub target: String,
    /// Marks a content element; value is the step name.
    pub content: String,
    /// Marks a control inside content; value is `back`, `next` or `close`.
    pub role: String,
}

impl Default for AttrNameMap {
    fn default() -> Self {
        Self {
            target: "guide-target".to_owned(),
            content: "content".to_owned(),
            role: "role".to_owned(),
        }
    }
}

impl AttrNameMap {
    /// Full attribute name for targets (`data-guide-target`).
    #[must_use]
    pub fn target_attr(&self) -> String {
        format!("data-{}", self.target)
    }

    /// Full attribute name for content (`data-content`).
    #[must_use]
    pub fn content_attr(&self) -> String {
        format!("data-{}", self.content)
    }

    /// Full attribute name for control roles (`data-role`).
    #[must_use]
    pub fn role_attr(&self) -> String {
        format!("data-{}", self.role)
    }
}

/// Normalized guide options.
#[derive(Debug, Clone, PartialEq)]
pub struct GuideOptions {
    /// Selector restricting target lookup; `None` searches the whole body.
    pub scope: Option<String>,
    /// Show the guide once construction finishes.
    pub show_after_inited: bool,
    /// Default highlight padding per step.
    pub padding: Sides,
    /// Default content offset per step.
    pub offset: Offset,
    /// User mask style; structural mask properties are applied on top.
    pub mask_style: StyleMap,
    /// Markup attribute names.
    pub attr_name_map: AttrNameMap,
}

impl Default for GuideOptions {
    fn default() -> Self {
        Self {
            scope: None,
            show_after_inited: true,
            padding: Sides::all(DEFAULT_PADDING),
            offset: Offset::all(DEFAULT_OFFSET),
            mask_style: default_mask_style(),
            attr_name_map: AttrNameMap::default(),
        }
    }
}

fn default_mask_style() -> StyleMap {
    StyleMap::new()
        .with("border-color", DEFAULT_MASK_COLOR)
        .with("z-index", DEFAULT_MASK_Z_INDEX)
}

impl GuideOptions {
    /// Default options as a JSON object, the base of every JSON merge.
    #[must_use]
    pub fn default_json() -> Value {
        json!({
            "scope": null,
            "showAfterInited": true,
            "padding": DEFAULT_PADDING,
            "offset": DEFAULT_OFFSET,
            "maskStyle": {
                "border-color": DEFAULT_MASK_COLOR,
                "z-index": DEFAULT_MASK_Z_INDEX,
            },
            "attrNameMap": {
                "target": "guide-target",
                "content": "content",
                "role": "role",
            },
        })
    }

    /// Parse options from JSON text.
    pub fn from_json(text: &str) -> Result<Self, GuideError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Parse options from a JSON value (`null` means all defaults).
    pub fn from_value(value: &Value) -> Result<Self, GuideError> {
        let value = match value {
            Value::Null => Value::Object(Default::default()),
            Value::Object(map) => {
                let mut map = map.clone();
                if !map.contains_key("attrNameMap") {
                    if let Some(legacy) = map.remove("attrDataMap") {
                        map.insert("attrNameMap".to_owned(), legacy);
                    }
                }
                Value::Object(map)
            }
            _ => return Err(GuideError::invalid("options", "expected an object")),
        };
        let merged = merge::fill_defaults(&value, &Self::default_json(), merge::is_absent);
        let field = |name: &str| merged.get(name).cloned().unwrap_or(Value::Null);

        let scope = match field("scope") {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s),
            other => {
                return Err(GuideError::invalid(
                    "scope",
                    expected("a selector string", &other),
                ));
            }
        };
        let show_after_inited = match field("showAfterInited") {
            Value::Bool(b) => b,
            other => {
                return Err(GuideError::invalid(
                    "showAfterInited",
                    expected("a boolean", &other),
                ));
            }
        };
        let padding = parse_sides(&field("padding"), Sides::all(DEFAULT_PADDING))?;
        let offset = parse_offset(&field("offset"), Offset::all(DEFAULT_OFFSET))?;
        // Normalize user keys before overlaying, so `z-index` and `zIndex`
        // name the same property.
        let mut mask_style = default_mask_style();
        match value.get("maskStyle") {
            None | Some(Value::Null) => {}
            Some(user) => {
                let user = StyleMap::deserialize(user.clone())
                    .map_err(|e| GuideError::invalid("maskStyle", e.to_string()))?;
                mask_style.extend(&user);
            }
        }
        let attr_name_map = AttrNameMap::deserialize(field("attrNameMap"))
            .map_err(|e| GuideError::invalid("attrNameMap", e.to_string()))?;
        for (name, value) in [
            ("target", &attr_name_map.target),
            ("content", &attr_name_map.content),
            ("role", &attr_name_map.role),
        ] {
            if value.trim().is_empty() {
                return Err(GuideError::invalid(
                    "attrNameMap",
                    format!("`{name}` must not be empty"),
                ));
            }
        }

        Ok(Self {
            scope,
            show_after_inited,
            padding,
            offset,
            mask_style,
            attr_name_map,
        })
    }

    /// Set the lookup scope selector.
    #[must_use]
    pub fn scope(mut self, selector: impl Into<String>) -> Self {
        self.scope = Some(selector.into());
        self
    }

    /// Set whether to show after construction.
    #[must_use]
    pub fn show_after_inited(mut self, show: bool) -> Self {
        self.show_after_inited = show;
        self
    }

    /// Set default padding; a scalar broadcasts to every side.
    #[must_use]
    pub fn padding(mut self, padding: impl Into<Sides>) -> Self {
        self.padding = padding.into();
        self
    }

    /// Set default content offset; a scalar broadcasts to both axes.
    #[must_use]
    pub fn offset(mut self, offset: impl Into<Offset>) -> Self {
        self.offset = offset.into();
        self
    }

    /// Merge extra properties onto the mask style.
    #[must_use]
    pub fn mask_style(mut self, style: &StyleMap) -> Self {
        self.mask_style.extend(style);
        self
    }

    /// Replace the markup attribute names.
    #[must_use]
    pub fn attr_name_map(mut self, map: AttrNameMap) -> Self {
        self.attr_name_map = map;
        self
    }

    /// Mask stacking order, when the mask style carries a numeric one.
    #[must_use]
    pub fn mask_z_index(&self) -> Option<f64> {
        self.mask_style.get("z-index").and_then(StyleValue::as_number)
    }
}

fn expected(what: &str, got: &Value) -> String {
    format!("expected {what}, got {got}")
}

/// Numbers and numeric strings (`"12"`, `"12px"`).
fn parse_length(field: &'static str, value: &Value) -> Result<f64, GuideError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| GuideError::invalid(field, "number out of range")),
        Value::String(s) => StyleValue::Text(s.clone())
            .as_number()
            .ok_or_else(|| GuideError::invalid(field, expected("a numeric string", value))),
        other => Err(GuideError::invalid(field, expected("a number", other))),
    }
}

fn parse_sides(value: &Value, fallback: Sides) -> Result<Sides, GuideError> {
    Ok(parse_partial_sides(value)?.fill(&fallback))
}

fn parse_offset(value: &Value, fallback: Offset) -> Result<Offset, GuideError> {
    Ok(parse_partial_offset(value)?.fill(&fallback))
}

/// Padding from JSON: `null`, a length broadcast to every side, or an object
/// whose missing sides stay unset.
pub fn parse_partial_sides(value: &Value) -> Result<PartialSides, GuideError> {
    match value {
        Value::Null => Ok(PartialSides::default()),
        Value::Object(map) => {
            let side = |name: &str| match map.get(name) {
                None | Some(Value::Null) => Ok(None),
                Some(v) => parse_length("padding", v).map(Some),
            };
            Ok(PartialSides {
                top: side("top")?,
                right: side("right")?,
                bottom: side("bottom")?,
                left: side("left")?,
            })
        }
        other => parse_length("padding", other).map(PartialSides::from),
    }
}

/// Offset from JSON: `null`, a length broadcast to both axes, or an object
/// whose missing axes stay unset.
pub fn parse_partial_offset(value: &Value) -> Result<PartialOffset, GuideError> {
    match value {
        Value::Null => Ok(PartialOffset::default()),
        Value::Object(map) => {
            let axis = |name: &str| match map.get(name) {
                None | Some(Value::Null) => Ok(None),
                Some(v) => parse_length("offset", v).map(Some),
            };
            Ok(PartialOffset {
                left: axis("left")?,
                top: axis("top")?,
            })
        }
        other => parse_length("offset", other).map(PartialOffset::from),
    }
}
