//! Animation description tree and the DSL factories that build it.
//!
//! The tree is a closed, `type`-tagged union. It is built once (in code through the
//! factories below, or from JSON through serde) and never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::params::AnimationParams;
use crate::style::{normalize_styles, style_offset, StyleMap};
use crate::timing::Timing;

/// Options shared by reusable animations and transitions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationOptions {
    #[serde(default)]
    pub params: AnimationParams,
}

impl AnimationOptions {
    pub fn with_params(params: AnimationParams) -> Self {
        Self { params }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateNode {
    /// One state name, or several separated by commas (`"open, expanded"`).
    pub name: String,
    pub styles: StyleNode,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionNode {
    /// Matcher expression such as `"open => closed"`, `"* <=> void"` or `":enter"`.
    pub expr: String,
    pub animation: Box<AnimationNode>,
    #[serde(default)]
    pub options: AnimationOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceNode {
    pub steps: Vec<AnimationNode>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupNode {
    pub steps: Vec<AnimationNode>,
}

/// Payload of an `animate()` step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AnimateStyles {
    Style(StyleNode),
    Keyframes(KeyframesNode),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimateNode {
    pub timings: Timing,
    /// `None` animates towards whatever styles follow (an "empty step").
    #[serde(default)]
    pub styles: Option<AnimateStyles>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyframesNode {
    pub steps: Vec<StyleNode>,
}

impl KeyframesNode {
    /// Offset of every step. Declared offsets are used (clamped to `[0, 1]`) only when
    /// every step declares one; otherwise offsets are generated evenly.
    pub fn resolved_offsets(&self) -> Vec<f64> {
        let declared: Vec<Option<f64>> = self.steps.iter().map(StyleNode::keyframe_offset).collect();
        if !declared.is_empty() && declared.iter().all(Option::is_some) {
            return declared
                .iter()
                .flatten()
                .map(|o| o.clamp(0.0, 1.0))
                .collect();
        }
        generated_offsets(self.steps.len())
    }
}

/// `i / (n - 1)` for each step, the last pinned to 1. A single step sits at 1.
pub fn generated_offsets(count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![1.0],
        n => {
            let max = (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { 1.0 } else { i as f64 / max })
                .collect()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleNode {
    pub styles: Vec<StyleMap>,
    #[serde(default)]
    pub offset: Option<f64>,
}

impl StyleNode {
    /// All declared maps merged into one, `offset` included.
    pub fn merged(&self) -> StyleMap {
        normalize_styles(&self.styles)
    }

    /// Keyframe offset, from the dedicated field or an `offset` style entry.
    pub fn keyframe_offset(&self) -> Option<f64> {
        self.offset.or_else(|| style_offset(&self.merged()))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggerNode {
    pub name: String,
    pub definitions: Vec<AnimationNode>,
}

/// A reusable animation (`animation(...)`) with default params.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceNode {
    pub animation: Box<AnimationNode>,
    #[serde(default)]
    pub options: AnimationOptions,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimateChildNode {
    #[serde(default)]
    pub options: AnimationOptions,
}

/// Invocation of a reusable animation (`use_animation(...)`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimateRefNode {
    pub animation: ReferenceNode,
    #[serde(default)]
    pub options: AnimationOptions,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryNode {
    pub selector: String,
    pub animation: Box<AnimationNode>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StaggerNode {
    pub timings: Timing,
    pub animation: Box<AnimationNode>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AnimationNode {
    State(StateNode),
    Transition(TransitionNode),
    Sequence(SequenceNode),
    Group(GroupNode),
    Animate(AnimateNode),
    Keyframes(KeyframesNode),
    Style(StyleNode),
    Trigger(TriggerNode),
    Reference(ReferenceNode),
    AnimateChild(AnimateChildNode),
    AnimateRef(AnimateRefNode),
    Query(QueryNode),
    Stagger(StaggerNode),
}

/// Discriminant of [`AnimationNode`], used for look-ahead rules.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    State,
    Transition,
    Sequence,
    Group,
    Animate,
    Keyframes,
    Style,
    Trigger,
    Reference,
    AnimateChild,
    AnimateRef,
    Query,
    Stagger,
}

impl AnimationNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            AnimationNode::State(_) => NodeKind::State,
            AnimationNode::Transition(_) => NodeKind::Transition,
            AnimationNode::Sequence(_) => NodeKind::Sequence,
            AnimationNode::Group(_) => NodeKind::Group,
            AnimationNode::Animate(_) => NodeKind::Animate,
            AnimationNode::Keyframes(_) => NodeKind::Keyframes,
            AnimationNode::Style(_) => NodeKind::Style,
            AnimationNode::Trigger(_) => NodeKind::Trigger,
            AnimationNode::Reference(_) => NodeKind::Reference,
            AnimationNode::AnimateChild(_) => NodeKind::AnimateChild,
            AnimationNode::AnimateRef(_) => NodeKind::AnimateRef,
            AnimationNode::Query(_) => NodeKind::Query,
            AnimationNode::Stagger(_) => NodeKind::Stagger,
        }
    }
}

impl From<StyleNode> for AnimationNode {
    fn from(node: StyleNode) -> Self {
        AnimationNode::Style(node)
    }
}

impl From<KeyframesNode> for AnimationNode {
    fn from(node: KeyframesNode) -> Self {
        AnimationNode::Keyframes(node)
    }
}

impl From<StyleNode> for AnimateStyles {
    fn from(node: StyleNode) -> Self {
        AnimateStyles::Style(node)
    }
}

impl From<KeyframesNode> for AnimateStyles {
    fn from(node: KeyframesNode) -> Self {
        AnimateStyles::Keyframes(node)
    }
}

// ----- DSL factories -----

/// Wrap a list of steps; a single non-list node is used as-is by callers.
pub fn sequence(steps: Vec<AnimationNode>) -> AnimationNode {
    AnimationNode::Sequence(SequenceNode { steps })
}

pub fn group(steps: Vec<AnimationNode>) -> AnimationNode {
    AnimationNode::Group(GroupNode { steps })
}

pub fn animate(timings: impl Into<Timing>, styles: impl Into<AnimateStyles>) -> AnimationNode {
    AnimationNode::Animate(AnimateNode {
        timings: timings.into(),
        styles: Some(styles.into()),
    })
}

/// `animate()` without target styles.
pub fn animate_empty(timings: impl Into<Timing>) -> AnimationNode {
    AnimationNode::Animate(AnimateNode {
        timings: timings.into(),
        styles: None,
    })
}

/// A style declaration. An `offset` entry is lifted into [`StyleNode::offset`].
pub fn style(styles: StyleMap) -> StyleNode {
    style_list(vec![styles])
}

pub fn style_list(styles: Vec<StyleMap>) -> StyleNode {
    let offset = styles.iter().rev().find_map(style_offset);
    StyleNode { styles, offset }
}

pub fn keyframes(steps: Vec<StyleNode>) -> KeyframesNode {
    KeyframesNode { steps }
}

pub fn state(name: impl Into<String>, styles: StyleNode) -> AnimationNode {
    AnimationNode::State(StateNode {
        name: name.into(),
        styles,
    })
}

pub fn transition(expr: impl Into<String>, animation: AnimationNode) -> AnimationNode {
    transition_with_options(expr, animation, AnimationOptions::default())
}

pub fn transition_with_options(
    expr: impl Into<String>,
    animation: AnimationNode,
    options: AnimationOptions,
) -> AnimationNode {
    AnimationNode::Transition(TransitionNode {
        expr: expr.into(),
        animation: Box::new(animation),
        options,
    })
}

pub fn trigger(name: impl Into<String>, definitions: Vec<AnimationNode>) -> AnimationNode {
    AnimationNode::Trigger(TriggerNode {
        name: name.into(),
        definitions,
    })
}

/// Declare a reusable animation with default params.
pub fn animation(steps: AnimationNode, params: AnimationParams) -> ReferenceNode {
    ReferenceNode {
        animation: Box::new(steps),
        options: AnimationOptions::with_params(params),
    }
}

/// Invoke a reusable animation, overriding some of its params.
pub fn use_animation(reference: ReferenceNode, params: AnimationParams) -> AnimationNode {
    AnimationNode::AnimateRef(AnimateRefNode {
        animation: reference,
        options: AnimationOptions::with_params(params),
    })
}

pub fn animate_child() -> AnimationNode {
    AnimationNode::AnimateChild(AnimateChildNode::default())
}

pub fn query(selector: impl Into<String>, animation: AnimationNode) -> AnimationNode {
    AnimationNode::Query(QueryNode {
        selector: selector.into(),
        animation: Box::new(animation),
        optional: false,
        limit: None,
    })
}

pub fn stagger(timings: impl Into<Timing>, animation: AnimationNode) -> AnimationNode {
    AnimationNode::Stagger(StaggerNode {
        timings: timings.into(),
        animation: Box::new(animation),
    })
}
