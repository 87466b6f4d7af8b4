//! Output contracts of the compiler.
//!
//! Instructions are plain data: the player adapter turns each timeline instruction
//! into one keyframe animation on the element.

use serde::{Deserialize, Serialize};

use crate::style::{StyleMap, StyleValue, OFFSET_KEY};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstructionKind {
    TimelineAnimation,
    TransitionAnimation,
}

/// One playable, fully time-resolved keyframe list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationTimelineInstruction {
    #[serde(rename = "type")]
    pub kind: InstructionKind,
    /// Each keyframe carries an `offset` entry; offsets ascend from 0 to 1.
    pub keyframes: Vec<StyleMap>,
    /// Milliseconds.
    pub duration: f64,
    /// Milliseconds from the start of the whole animation.
    pub delay: f64,
    pub easing: Option<String>,
}

impl AnimationTimelineInstruction {
    pub fn new(keyframes: Vec<StyleMap>, duration: f64, delay: f64, easing: Option<String>) -> Self {
        Self {
            kind: InstructionKind::TimelineAnimation,
            keyframes,
            duration,
            delay,
            easing,
        }
    }

    /// Placeholder emitted when nothing was animated.
    pub fn noop() -> Self {
        Self::new(Vec::new(), 0.0, 0.0, None)
    }

    #[inline]
    pub fn is_noop(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Absolute end time (delay plus duration).
    #[inline]
    pub fn end_time(&self) -> f64 {
        self.delay + self.duration
    }

    /// Offsets of every keyframe, in order.
    pub fn offsets(&self) -> Vec<f64> {
        self.keyframes
            .iter()
            .map(|kf| {
                kf.get(OFFSET_KEY)
                    .and_then(StyleValue::as_number)
                    .unwrap_or(0.0)
            })
            .collect()
    }
}

/// Result of matching a trigger's state change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationTransitionInstruction {
    #[serde(rename = "type")]
    pub kind: InstructionKind,
    pub trigger_name: String,
    pub is_removal_transition: bool,
    pub from_state: String,
    pub from_styles: StyleMap,
    pub to_state: String,
    pub to_styles: StyleMap,
    pub timelines: Vec<AnimationTimelineInstruction>,
}

impl AnimationTransitionInstruction {
    /// Time until the last timeline finishes.
    pub fn total_time(&self) -> f64 {
        self.timelines
            .iter()
            .map(AnimationTimelineInstruction::end_time)
            .fold(0.0, f64::max)
    }
}
