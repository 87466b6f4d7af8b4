//! Timing expressions for `animate()` steps.
//!
//! Grammar: `<num><unit> [<num><unit>] [<easing>]` where `unit` is `s` or `ms`
//! (missing unit means milliseconds) and `easing` is a keyword (`ease-out`) or a
//! function (`cubic-bezier(0.1, 0.7, 1.0, 0.1)`). Numbers are milliseconds.
//!
//! Parsing never fails hard: malformed input records a message in the caller's
//! error sink and degrades to zero timings.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::params::{has_params, interpolate_params, AnimationParams};

static TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(-?[\.\d]+)(m?s)?(?:\s+(-?[\.\d]+)(m?s)?)?(?:\s+([-a-z]+(?:\(.+?\))?))?$")
        .expect("timing regex should compile")
});

const ONE_SECOND_MS: f64 = 1000.0;

/// Resolved timings, always in milliseconds.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimateTimings {
    pub duration: f64,
    pub delay: f64,
    #[serde(default)]
    pub easing: Option<String>,
}

impl AnimateTimings {
    pub fn new(duration: f64, delay: f64, easing: Option<String>) -> Self {
        Self {
            duration,
            delay,
            easing,
        }
    }

    /// Time consumed by the step (delay plus duration).
    #[inline]
    pub fn total(&self) -> f64 {
        self.duration + self.delay
    }
}

/// Timing argument of an `animate()` step as authored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timing {
    /// Duration in milliseconds.
    Millis(f64),
    /// Timing string such as `"1s 100ms ease-out"`.
    Expr(String),
    /// Already-resolved timings.
    Resolved(AnimateTimings),
}

impl From<f64> for Timing {
    fn from(ms: f64) -> Self {
        Timing::Millis(ms)
    }
}

impl From<i32> for Timing {
    fn from(ms: i32) -> Self {
        Timing::Millis(ms as f64)
    }
}

impl From<&str> for Timing {
    fn from(s: &str) -> Self {
        Timing::Expr(s.to_string())
    }
}

impl From<String> for Timing {
    fn from(s: String) -> Self {
        Timing::Expr(s)
    }
}

impl From<AnimateTimings> for Timing {
    fn from(t: AnimateTimings) -> Self {
        Timing::Resolved(t)
    }
}

/// Resolve any authored timing into milliseconds.
pub fn parse_time_expression(exp: &Timing, errors: &mut Vec<String>) -> AnimateTimings {
    match exp {
        Timing::Millis(ms) => {
            let mut timings = AnimateTimings::new(*ms, 0.0, None);
            check_non_negative(&mut timings, errors);
            timings
        }
        Timing::Expr(s) => parse_time_str(s, errors),
        Timing::Resolved(t) => {
            let mut timings = t.clone();
            check_non_negative(&mut timings, errors);
            timings
        }
    }
}

/// Resolve a timing, filling `{{ name }}` placeholders from `params` first.
///
/// A missing param is reported once and the step degrades to zero timings; the
/// unfilled string is not parsed again.
pub fn resolve_timings(exp: &Timing, params: &AnimationParams, errors: &mut Vec<String>) -> AnimateTimings {
    match exp {
        Timing::Expr(s) if has_params(s) => {
            let before = errors.len();
            let filled = interpolate_params(s, params, errors);
            if errors.len() > before {
                return AnimateTimings::default();
            }
            parse_time_str(&filled, errors)
        }
        other => parse_time_expression(other, errors),
    }
}

/// Parse a timing string. Unmatched input records one error and yields `{0, 0, None}`.
pub fn parse_time_str(exp: &str, errors: &mut Vec<String>) -> AnimateTimings {
    let trimmed = exp.trim();
    let Some(caps) = TIMING_REGEX.captures(trimmed) else {
        errors.push(format!("The provided timing value \"{exp}\" is invalid."));
        return AnimateTimings::default();
    };

    let Some(duration) = caps
        .get(1)
        .and_then(|m| to_millis(m.as_str(), caps.get(2).map(|u| u.as_str())))
    else {
        errors.push(format!("The provided timing value \"{exp}\" is invalid."));
        return AnimateTimings::default();
    };

    let delay = match caps.get(3) {
        Some(m) => match to_millis(m.as_str(), caps.get(4).map(|u| u.as_str())) {
            Some(d) => d,
            None => {
                errors.push(format!("The provided timing value \"{exp}\" is invalid."));
                return AnimateTimings::default();
            }
        },
        None => 0.0,
    };

    let easing = caps.get(5).map(|m| m.as_str().to_string());
    let mut timings = AnimateTimings::new(duration, delay, easing);
    check_non_negative(&mut timings, errors);
    timings
}

fn to_millis(value: &str, unit: Option<&str>) -> Option<f64> {
    let n: f64 = value.parse().ok()?;
    if !n.is_finite() {
        return None;
    }
    let ms = match unit {
        Some(u) if u.eq_ignore_ascii_case("s") => n * ONE_SECOND_MS,
        _ => n,
    };
    Some(ms.floor())
}

fn check_non_negative(timings: &mut AnimateTimings, errors: &mut Vec<String>) {
    if timings.duration < 0.0 {
        errors.push("Duration values below 0 are not allowed for this animation step.".into());
        timings.duration = 0.0;
    }
    if timings.delay < 0.0 {
        errors.push("Delay values below 0 are not allowed for this animation step.".into());
        timings.delay = 0.0;
    }
}
