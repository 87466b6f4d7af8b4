//! Style values and ordered style maps.
//!
//! A style map is an insertion-ordered `property -> value` table. Values are either
//! numbers or strings; the string `"*"` ([`AUTO_STYLE`]) is a sentinel telling the
//! player to read the value from the element's computed style at play time.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Sentinel value resolved outside the compiler (computed style at play time).
pub const AUTO_STYLE: &str = "*";

/// Reserved key carrying a keyframe's fractional position.
pub const OFFSET_KEY: &str = "offset";

/// Reserved key carrying the easing of the segment that starts at a keyframe.
pub const EASING_KEY: &str = "easing";

/// A single CSS property value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleValue {
    Number(f64),
    Text(String),
}

impl StyleValue {
    /// The `AUTO` sentinel.
    pub fn auto() -> Self {
        StyleValue::Text(AUTO_STYLE.to_string())
    }

    #[inline]
    pub fn is_auto(&self) -> bool {
        matches!(self, StyleValue::Text(s) if s == AUTO_STYLE)
    }

    /// Numeric view of the value; numeric strings (`"0.5"`) are accepted.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            StyleValue::Number(n) => Some(*n),
            StyleValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StyleValue::Text(s) => Some(s.as_str()),
            StyleValue::Number(_) => None,
        }
    }
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            StyleValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for StyleValue {
    fn from(n: f64) -> Self {
        StyleValue::Number(n)
    }
}

impl From<i32> for StyleValue {
    fn from(n: i32) -> Self {
        StyleValue::Number(n as f64)
    }
}

impl From<&str> for StyleValue {
    fn from(s: &str) -> Self {
        StyleValue::Text(s.to_string())
    }
}

impl From<String> for StyleValue {
    fn from(s: String) -> Self {
        StyleValue::Text(s)
    }
}

/// Ordered property map used for style declarations, keyframes and state snapshots.
pub type StyleMap = IndexMap<String, StyleValue>;

/// Build a [`StyleMap`] from `(property, value)` pairs, keeping their order.
pub fn style_map<I, K, V>(entries: I) -> StyleMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<StyleValue>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Copy every entry of `src` into `dst`, overwriting existing properties.
pub fn copy_styles(src: &StyleMap, dst: &mut StyleMap) {
    for (prop, value) in src {
        dst.insert(prop.clone(), value.clone());
    }
}

/// Merge a list of style maps left to right; later maps win.
pub fn normalize_styles(maps: &[StyleMap]) -> StyleMap {
    let mut out = StyleMap::new();
    for map in maps {
        copy_styles(map, &mut out);
    }
    out
}

/// Read the reserved `offset` entry of a style map, if it holds a number.
pub fn style_offset(map: &StyleMap) -> Option<f64> {
    map.get(OFFSET_KEY).and_then(StyleValue::as_number)
}
