//! State-change matcher grammar: `"a => b"`, `"a <=> b"`, `*`, aliases, comma lists.

use once_cell::sync::Lazy;
use regex::Regex;

/// Wildcard state name.
pub const ANY_STATE: &str = "*";
/// State of an element that is not attached.
pub const VOID_STATE: &str = "void";

static TRANSITION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\*|[-\w]+)\s*(<?[=-]>)\s*(\*|[-\w]+)$").expect("transition regex should compile")
});

const TRUE_STATES: [&str; 2] = ["true", "1"];
const FALSE_STATES: [&str; 2] = ["false", "0"];

/// One compiled alternative of a transition expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransitionMatcher {
    States { from: String, to: String },
    /// `:increment`: numeric state went up.
    Increment,
    /// `:decrement`: numeric state went down.
    Decrement,
}

impl TransitionMatcher {
    pub fn matches(&self, from_state: &str, to_state: &str) -> bool {
        match self {
            TransitionMatcher::States { from, to } => {
                state_matches(from, from_state) && state_matches(to, to_state)
            }
            TransitionMatcher::Increment => numeric_change(from_state, to_state)
                .map(|(a, b)| b > a)
                .unwrap_or(false),
            TransitionMatcher::Decrement => numeric_change(from_state, to_state)
                .map(|(a, b)| b < a)
                .unwrap_or(false),
        }
    }
}

fn state_matches(pattern: &str, state: &str) -> bool {
    if pattern == ANY_STATE || pattern == state {
        return true;
    }
    // "true"/"1" and "false"/"0" name the same boolean state.
    (TRUE_STATES.contains(&pattern) && TRUE_STATES.contains(&state))
        || (FALSE_STATES.contains(&pattern) && FALSE_STATES.contains(&state))
}

fn numeric_change(from: &str, to: &str) -> Option<(f64, f64)> {
    Some((from.trim().parse().ok()?, to.trim().parse().ok()?))
}

/// Compile `expr` into matchers; unsupported pieces record an error and are skipped.
pub fn parse_transition_expr(expr: &str, errors: &mut Vec<String>) -> Vec<TransitionMatcher> {
    let mut matchers = Vec::new();
    for part in expr.split(',') {
        parse_inner(part.trim(), &mut matchers, errors);
    }
    matchers
}

fn parse_inner(part: &str, matchers: &mut Vec<TransitionMatcher>, errors: &mut Vec<String>) {
    let expanded;
    let mut source = part;
    if part.starts_with(':') {
        match part {
            ":enter" => expanded = "void => *",
            ":leave" => expanded = "* => void",
            ":increment" => {
                matchers.push(TransitionMatcher::Increment);
                return;
            }
            ":decrement" => {
                matchers.push(TransitionMatcher::Decrement);
                return;
            }
            alias => {
                errors.push(format!(
                    "The transition alias value \"{alias}\" is not supported"
                ));
                expanded = "* => *";
            }
        }
        source = expanded;
    }

    let Some(caps) = TRANSITION_REGEX.captures(source) else {
        errors.push(format!(
            "The provided transition expression \"{source}\" is not supported"
        ));
        return;
    };
    let from = caps[1].to_string();
    let separator = &caps[2];
    let to = caps[3].to_string();

    let bidirectional = separator.starts_with('<') && !(from == ANY_STATE && to == ANY_STATE);
    if bidirectional {
        matchers.push(TransitionMatcher::States {
            from: from.clone(),
            to: to.clone(),
        });
        matchers.push(TransitionMatcher::States { from: to, to: from });
    } else {
        matchers.push(TransitionMatcher::States { from, to });
    }
}
