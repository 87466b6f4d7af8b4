//! Keyline Animation Core
//!
//! Compiles declarative animation trees (states, transitions, sequences, groups,
//! timed `animate()` steps, keyframe sequences and raw style writes) into flat
//! keyframe instructions for a style-interpolation backend.
//!
//! Flow: build a tree with the DSL factories in [`ast`] (or load it with
//! [`parse_animation_json`]) → [`Animation::new`] validates it → [`Animation::build_timelines`]
//! emits [`AnimationTimelineInstruction`]s. Triggers ([`build_trigger`]) pick a transition
//! for a state change and compile it between the two states' styles.

pub mod animation;
pub mod ast;
pub mod config;
pub mod error;
pub mod instruction;
pub mod params;
pub mod style;
pub mod timeline;
pub mod timing;
pub mod transition_expr;
pub mod trigger;
pub mod validator;

// Re-exports for consumers (player adapters)
pub use animation::{parse_animation_json, Animation};
pub use ast::{
    animate, animate_child, animate_empty, animation, group, keyframes, query, sequence, stagger,
    state, style, style_list, transition, transition_with_options, trigger, use_animation,
    AnimationNode, AnimationOptions, NodeKind,
};
pub use config::Config;
pub use error::AnimationError;
pub use instruction::{AnimationTimelineInstruction, AnimationTransitionInstruction, InstructionKind};
pub use params::AnimationParams;
pub use style::{style_map, StyleMap, StyleValue, AUTO_STYLE};
pub use timeline::{build_animation_keyframes, TimelineCompiler};
pub use timing::{parse_time_expression, resolve_timings, AnimateTimings, Timing};
pub use transition_expr::{parse_transition_expr, TransitionMatcher};
pub use trigger::{build_trigger, build_trigger_from_node, AnimationTransitionFactory, AnimationTrigger};
pub use validator::{validate_animation_sequence, validate_with_params};
