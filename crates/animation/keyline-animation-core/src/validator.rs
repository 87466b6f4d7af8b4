//! Static checks over an animation tree.
//!
//! The validator walks the same node kinds as the compiler with a plain clock and no
//! timeline output. It records, per property, the time window in which the property is
//! animated so that parallel branches touching the same property can be reported.

use hashbrown::HashMap;

use crate::ast::{AnimateStyles, AnimationNode, KeyframesNode, StyleNode};
use crate::params::{interpolate_style_value, merge_params, AnimationParams};
use crate::style::{EASING_KEY, OFFSET_KEY};
use crate::timing::{resolve_timings, AnimateTimings};

/// Validate `ast`, returning every problem found (empty when valid).
pub fn validate_animation_sequence(ast: &AnimationNode) -> Vec<String> {
    validate_with_params(ast, &AnimationParams::new())
}

/// Validate `ast` with a parameter scope for `{{ name }}` placeholders.
pub fn validate_with_params(ast: &AnimationNode, params: &AnimationParams) -> Vec<String> {
    let mut errors = Vec::new();
    let mut validator = Validator::new(&mut errors, params.clone());
    validator.visit(ast);
    if !errors.is_empty() {
        log::debug!("validation found {} error(s)", errors.len());
    }
    errors
}

/// Span `[start, end)` in which a property is animated; `start == end` is a point.
#[derive(Copy, Clone, Debug, PartialEq)]
struct StyleWindow {
    start: f64,
    end: f64,
}

impl StyleWindow {
    fn is_point(&self) -> bool {
        self.start == self.end
    }

    fn overlaps(&self, other: &StyleWindow) -> bool {
        match (self.is_point(), other.is_point()) {
            (true, true) => false,
            (true, false) => other.start < self.start && self.start < other.end,
            (false, true) => self.start < other.start && other.start < self.end,
            (false, false) => self.start < other.end && other.start < self.end,
        }
    }
}

struct Validator<'a> {
    errors: &'a mut Vec<String>,
    current_time: f64,
    timings: Option<AnimateTimings>,
    windows: HashMap<String, StyleWindow>,
    params: AnimationParams,
}

impl<'a> Validator<'a> {
    fn new(errors: &'a mut Vec<String>, params: AnimationParams) -> Self {
        Self {
            errors,
            current_time: 0.0,
            timings: None,
            windows: HashMap::new(),
            params,
        }
    }

    fn visit(&mut self, node: &AnimationNode) {
        match node {
            AnimationNode::Sequence(seq) => {
                for step in &seq.steps {
                    self.visit(step);
                }
            }
            AnimationNode::Group(group) => {
                let start = self.current_time;
                let mut furthest = start;
                for step in &group.steps {
                    self.current_time = start;
                    self.visit(step);
                    furthest = furthest.max(self.current_time);
                }
                self.current_time = furthest;
            }
            AnimationNode::Animate(anim) => {
                let timings = resolve_timings(&anim.timings, &self.params, self.errors);
                self.timings = Some(timings.clone());
                match &anim.styles {
                    Some(AnimateStyles::Keyframes(frames)) => {
                        self.visit_keyframes(frames, &timings);
                    }
                    Some(AnimateStyles::Style(style)) => {
                        self.current_time += timings.total();
                        self.visit_style(style);
                    }
                    None => self.current_time += timings.total(),
                }
                self.timings = None;
            }
            AnimationNode::Style(style) => self.visit_style(style),
            AnimationNode::Keyframes(_) => self
                .errors
                .push("keyframes() must be placed inside of a call to animate()".to_string()),
            AnimationNode::Reference(reference) => {
                let scope = merge_params(&reference.options.params, &self.params);
                self.visit_scoped(&reference.animation, scope);
            }
            AnimationNode::AnimateRef(anim_ref) => {
                let defaults = merge_params(&anim_ref.animation.options.params, &self.params);
                let scope = merge_params(&defaults, &anim_ref.options.params);
                self.visit_scoped(&anim_ref.animation.animation, scope);
            }
            AnimationNode::Trigger(trigger) => {
                for definition in &trigger.definitions {
                    self.visit(definition);
                }
            }
            AnimationNode::Transition(transition) => {
                // Each transition runs on its own clock.
                let saved_time = std::mem::replace(&mut self.current_time, 0.0);
                let saved_windows = std::mem::take(&mut self.windows);
                let scope = merge_params(&transition.options.params, &self.params);
                self.visit_scoped(&transition.animation, scope);
                self.current_time = saved_time;
                self.windows = saved_windows;
            }
            AnimationNode::State(_) => {}
            AnimationNode::Query(query) => self.errors.push(format!(
                "query(\"{}\") needs an element-aware animation driver and cannot run on a single element",
                query.selector
            )),
            AnimationNode::Stagger(_) => self.errors.push(
                "stagger() needs an element-aware animation driver and cannot run on a single element"
                    .to_string(),
            ),
            AnimationNode::AnimateChild(_) => self.errors.push(
                "animateChild() needs an element-aware animation driver and cannot run on a single element"
                    .to_string(),
            ),
        }
    }

    fn visit_scoped(&mut self, node: &AnimationNode, scope: AnimationParams) {
        let saved = std::mem::replace(&mut self.params, scope);
        self.visit(node);
        self.params = saved;
    }

    fn visit_style(&mut self, style: &StyleNode) {
        let (start, end) = match &self.timings {
            Some(t) => (self.current_time - t.total(), self.current_time),
            None => (self.current_time, self.current_time),
        };
        self.check_style(style, StyleWindow { start, end });
    }

    fn visit_keyframes(&mut self, frames: &KeyframesNode, timings: &AnimateTimings) {
        let declared: Vec<f64> = frames
            .steps
            .iter()
            .filter_map(StyleNode::keyframe_offset)
            .collect();
        if !declared.is_empty() && declared.len() < frames.steps.len() {
            self.errors.push(
                "Not all style() steps within the declared keyframes() contain offsets".to_string(),
            );
        }
        if declared.iter().any(|o| !(0.0..=1.0).contains(o)) {
            self.errors
                .push("Please ensure that all keyframe offsets are between 0 and 1".to_string());
        }
        if declared.windows(2).any(|pair| pair[1] < pair[0]) {
            self.errors
                .push("Please ensure that all keyframe offsets are in order".to_string());
        }

        let start = self.current_time + timings.delay;
        let mut previous = start;
        for (step, offset) in frames.steps.iter().zip(frames.resolved_offsets()) {
            let at = (start + offset * timings.duration).max(previous);
            self.check_style(step, StyleWindow { start: previous, end: at });
            previous = at;
        }
        self.current_time += timings.total();
    }

    fn check_style(&mut self, style: &StyleNode, window: StyleWindow) {
        for (prop, value) in style.merged() {
            if prop == OFFSET_KEY {
                continue;
            }
            // Surfaces missing params; the value itself is not needed here.
            interpolate_style_value(&value, &self.params, self.errors);
            if prop == EASING_KEY {
                continue;
            }
            match self.windows.get_mut(&prop) {
                Some(existing) => {
                    if *existing != window && existing.overlaps(&window) {
                        self.errors.push(format!(
                            "The CSS property \"{prop}\" that exists between the times of \"{}ms\" and \"{}ms\" is also being animated in a parallel animation between the times of \"{}ms\" and \"{}ms\"",
                            existing.start, existing.end, window.start, window.end
                        ));
                        continue;
                    }
                    existing.start = existing.start.min(window.start);
                    existing.end = existing.end.max(window.end);
                }
                None => {
                    self.windows.insert(prop, window);
                }
            }
        }
    }
}
