//! `{{ name }}` placeholder interpolation for reusable animations.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::style::StyleValue;

static PARAM_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*(.+?)\s*\}\}").expect("param regex should compile"));

/// Named values substituted into timing strings and text style values.
pub type AnimationParams = IndexMap<String, StyleValue>;

/// True when `value` contains at least one placeholder.
pub fn has_params(value: &str) -> bool {
    PARAM_REGEX.is_match(value)
}

/// Replace every placeholder in `value`. Unknown names record an error and the
/// placeholder text is left untouched.
pub fn interpolate_params(value: &str, params: &AnimationParams, errors: &mut Vec<String>) -> String {
    PARAM_REGEX
        .replace_all(value, |caps: &Captures<'_>| {
            let name = &caps[1];
            match params.get(name) {
                Some(v) => v.to_string(),
                None => {
                    errors.push(format!(
                        "Please provide a value for the animation param {name}"
                    ));
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

/// Interpolate a style value. A text value that is exactly one placeholder takes
/// the parameter's own value, so numeric params stay numeric.
pub fn interpolate_style_value(
    value: &StyleValue,
    params: &AnimationParams,
    errors: &mut Vec<String>,
) -> StyleValue {
    let StyleValue::Text(text) = value else {
        return value.clone();
    };
    if !has_params(text) {
        return value.clone();
    }
    if let Some(caps) = PARAM_REGEX.captures(text.trim()) {
        if caps[0].len() == text.trim().len() {
            if let Some(v) = params.get(&caps[1]) {
                return v.clone();
            }
        }
    }
    StyleValue::Text(interpolate_params(text, params, errors))
}

/// Overlay `overrides` on `base`.
pub fn merge_params(base: &AnimationParams, overrides: &AnimationParams) -> AnimationParams {
    let mut out = base.clone();
    for (k, v) in overrides {
        out.insert(k.clone(), v.clone());
    }
    out
}
