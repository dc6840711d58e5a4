#![forbid(unsafe_code)]

//! Style property maps handed to the host page.
//!
//! Property names are kebab-case CSS names. Numeric values are rendered with
//! a `px` suffix unless the property is unitless.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer};

/// CSS properties that take a bare number.
const UNITLESS: &[&str] = &[
    "flex-grow",
    "flex-shrink",
    "font-weight",
    "line-height",
    "opacity",
    "order",
    "z-index",
    "zoom",
];

/// A single style value.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    /// Numeric value; pixels unless the property is unitless.
    Number(f64),
    /// Verbatim CSS text.
    Text(String),
}

impl StyleValue {
    /// Numeric view of the value, parsing text when possible.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().trim_end_matches("px").trim().parse().ok(),
        }
    }

    /// Render for `property` as CSS text.
    #[must_use]
    pub fn to_css(&self, property: &str) -> String {
        match self {
            Self::Number(n) if UNITLESS.contains(&property) => format_number(*n),
            Self::Number(n) => format!("{}px", format_number(*n)),
            Self::Text(s) => s.clone(),
        }
    }
}

impl From<f64> for StyleValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for StyleValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for StyleValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for StyleValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl<'de> Deserialize<'de> for StyleValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self::Number(n),
            Raw::Text(s) => Self::Text(s),
        })
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Convert a camelCase property name (`borderTopWidth`) to kebab-case.
///
/// Names already in kebab-case pass through unchanged.
#[must_use]
pub fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Ordered property map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleMap {
    props: BTreeMap<String, StyleValue>,
}

impl StyleMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, property: &str, value: impl Into<StyleValue>) -> Self {
        self.set(property, value);
        self
    }

    /// Insert or replace a property. The name is normalized to kebab-case.
    pub fn set(&mut self, property: &str, value: impl Into<StyleValue>) {
        self.props.insert(kebab_case(property), value.into());
    }

    /// Look up a property.
    #[must_use]
    pub fn get(&self, property: &str) -> Option<&StyleValue> {
        self.props.get(&kebab_case(property))
    }

    /// Remove a property, returning its value.
    pub fn remove(&mut self, property: &str) -> Option<StyleValue> {
        self.props.remove(&kebab_case(property))
    }

    /// Overlay `other` onto `self`; properties in `other` win.
    pub fn extend(&mut self, other: &StyleMap) {
        for (k, v) in &other.props {
            self.props.insert(k.clone(), v.clone());
        }
    }

    /// Iterate properties in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleValue)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate `(property, css text)` pairs.
    pub fn css_pairs(&self) -> impl Iterator<Item = (&str, String)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v.to_css(k)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.props.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}

impl fmt::Display for StyleMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, css) in self.css_pairs() {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            write!(f, "{k}: {css};")?;
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for StyleMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, StyleValue>::deserialize(deserializer)?;
        let mut map = StyleMap::new();
        for (k, v) in raw {
            map.set(&k, v);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::{StyleMap, StyleValue, kebab_case};

    #[test]
    fn kebab_case_conversion() {
        assert_eq!(kebab_case("borderTopWidth"), "border-top-width");
        assert_eq!(kebab_case("zIndex"), "z-index");
        assert_eq!(kebab_case("border-color"), "border-color");
        assert_eq!(kebab_case("top"), "top");
    }

    #[test]
    fn numbers_render_with_units() {
        assert_eq!(StyleValue::Number(45.0).to_css("top"), "45px");
        assert_eq!(StyleValue::Number(2.5).to_css("left"), "2.5px");
        assert_eq!(StyleValue::Number(999.0).to_css("z-index"), "999");
        assert_eq!(StyleValue::from("block").to_css("display"), "block");
    }

    #[test]
    fn as_number_parses_text() {
        assert_eq!(StyleValue::from("12px").as_number(), Some(12.0));
        assert_eq!(StyleValue::from(" 7 ").as_number(), Some(7.0));
        assert_eq!(StyleValue::from("auto").as_number(), None);
    }

    #[test]
    fn extend_overrides_and_normalizes() {
        let mut base = StyleMap::new().with("zIndex", 5).with("position", "absolute");
        let overlay = StyleMap::new().with("position", "fixed");
        base.extend(&overlay);
        assert_eq!(base.get("z-index"), Some(&StyleValue::Number(5.0)));
        assert_eq!(base.get("position"), Some(&StyleValue::from("fixed")));
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn display_is_sorted_css() {
        let style = StyleMap::new().with("top", 1.0).with("display", "none");
        assert_eq!(style.to_string(), "display: none; top: 1px;");
    }

    #[test]
    fn deserialize_normalizes_keys() {
        let style: StyleMap =
            serde_json::from_str(r#"{"borderColor":"red","zIndex":10}"#).expect("valid style");
        assert_eq!(style.get("border-color"), Some(&StyleValue::from("red")));
        assert_eq!(style.get("z-index"), Some(&StyleValue::Number(10.0)));
    }
}
