//! Timeline compiler: walks an animation tree and emits keyframe instructions.
//!
//! Clock rules:
//! - A sequence shares one clock across its children.
//! - A group forks one timeline per child from the group's entry time and continues on
//!   a fresh timeline at the furthest child end.
//! - `animate()` advances by its delay (with a snapshot) and then its duration.
//! - Keyframe sequences run on their own fork; the parent resumes after the duration.

pub mod builder;

use std::mem;

use crate::ast::{AnimateStyles, AnimationNode, GroupNode, KeyframesNode, NodeKind, SequenceNode, StyleNode};
use crate::config::Config;
use crate::instruction::AnimationTimelineInstruction;
use crate::params::{interpolate_style_value, merge_params, AnimationParams};
use crate::style::{StyleMap, StyleValue, EASING_KEY, OFFSET_KEY};
use crate::timing::{resolve_timings, AnimateTimings, Timing};

pub use builder::{StyleAtTime, TimelineArena, TimelineBuilder, TimelineId};

/// Compiles animation trees into [`AnimationTimelineInstruction`]s.
#[derive(Clone, Debug, Default)]
pub struct TimelineCompiler {
    cfg: Config,
}

impl TimelineCompiler {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Compile `ast` starting from `starting_styles` and landing on `final_styles`.
    ///
    /// Always returns at least one instruction. Recoverable problems are pushed into
    /// `errors`; the walk never stops early.
    pub fn build_keyframes(
        &self,
        ast: &AnimationNode,
        starting_styles: &StyleMap,
        final_styles: &StyleMap,
        errors: &mut Vec<String>,
    ) -> Vec<AnimationTimelineInstruction> {
        self.build_keyframes_with_params(
            ast,
            starting_styles,
            final_styles,
            &AnimationParams::new(),
            errors,
        )
    }

    /// Same as [`Self::build_keyframes`] with a parameter scope for `{{ name }}` placeholders.
    pub fn build_keyframes_with_params(
        &self,
        ast: &AnimationNode,
        starting_styles: &StyleMap,
        final_styles: &StyleMap,
        params: &AnimationParams,
        errors: &mut Vec<String>,
    ) -> Vec<AnimationTimelineInstruction> {
        let errors_before = errors.len();
        let mut walk = Walk {
            cfg: &self.cfg,
            arena: TimelineArena::new(),
            errors,
        };

        let root = walk.arena.create(0.0);
        walk.arena.set_styles(root, starting_styles, None, false);
        let mut ctx = Context::new(root, params.clone());
        walk.visit(ast, &mut ctx);

        let mut final_styles = final_styles.clone();
        let current = walk.arena.get(ctx.current);
        let missing: Vec<String> = current
            .written_properties()
            .filter(|prop| {
                !current.final_keyframe().contains_key(*prop) && !final_styles.contains_key(*prop)
            })
            .cloned()
            .collect();
        for prop in missing {
            final_styles.insert(prop, StyleValue::auto());
        }
        if !final_styles.is_empty() {
            walk.arena.apply_final_styles(ctx.current, &final_styles);
        }

        let mut instructions: Vec<AnimationTimelineInstruction> = walk
            .arena
            .iter()
            .filter(|tl| tl.has_styling())
            .map(TimelineBuilder::build_instruction)
            .collect();
        if instructions.is_empty() {
            instructions.push(AnimationTimelineInstruction::noop());
        }

        let recorded = walk.errors.len() - errors_before;
        if recorded > 0 {
            log::warn!("timeline compile recorded {recorded} error(s)");
        }
        log::debug!(
            "compiled {} timeline(s) from {} builder(s), total {}ms",
            instructions.len(),
            walk.arena.len(),
            instructions
                .iter()
                .map(AnimationTimelineInstruction::end_time)
                .fold(0.0, f64::max)
        );
        instructions
    }
}

/// Compile with the default [`Config`].
pub fn build_animation_keyframes(
    ast: &AnimationNode,
    starting_styles: &StyleMap,
    final_styles: &StyleMap,
    errors: &mut Vec<String>,
) -> Vec<AnimationTimelineInstruction> {
    TimelineCompiler::default().build_keyframes(ast, starting_styles, final_styles, errors)
}

/// Cursor of one walk branch.
#[derive(Debug)]
struct Context {
    current: TimelineId,
    timings: Option<AnimateTimings>,
    previous_node: Option<NodeKind>,
    sub_context_count: usize,
    params: AnimationParams,
}

impl Context {
    fn new(current: TimelineId, params: AnimationParams) -> Self {
        Self {
            current,
            timings: None,
            previous_node: None,
            sub_context_count: 0,
            params,
        }
    }
}

/// Per-call state: the arena and the shared errors sink.
struct Walk<'a> {
    cfg: &'a Config,
    arena: TimelineArena,
    errors: &'a mut Vec<String>,
}

impl Walk<'_> {
    fn visit(&mut self, node: &AnimationNode, ctx: &mut Context) {
        match node {
            AnimationNode::Sequence(seq) => self.visit_sequence(seq, ctx),
            AnimationNode::Group(group) => self.visit_group(group, ctx),
            AnimationNode::Animate(anim) => {
                let timings = self.resolve_timings(&anim.timings, ctx);
                self.visit_animate(timings, anim.styles.as_ref(), ctx);
            }
            AnimationNode::Style(style) => self.visit_style(style, ctx),
            AnimationNode::Reference(reference) => {
                let scope = merge_params(&reference.options.params, &ctx.params);
                self.visit_scoped(&reference.animation, scope, ctx);
            }
            AnimationNode::AnimateRef(anim_ref) => {
                let defaults = merge_params(&anim_ref.animation.options.params, &ctx.params);
                let scope = merge_params(&defaults, &anim_ref.options.params);
                self.visit_scoped(&anim_ref.animation.animation, scope, ctx);
            }
            // Keyframes only mean something inside `animate()`; the validator flags strays.
            AnimationNode::Keyframes(_)
            | AnimationNode::State(_)
            | AnimationNode::Transition(_)
            | AnimationNode::Trigger(_)
            | AnimationNode::Query(_)
            | AnimationNode::Stagger(_)
            | AnimationNode::AnimateChild(_) => {
                log::trace!("timeline compiler skips {:?} node", node.kind());
            }
        }
        ctx.previous_node = Some(node.kind());
    }

    fn visit_scoped(&mut self, node: &AnimationNode, scope: AnimationParams, ctx: &mut Context) {
        let saved = mem::replace(&mut ctx.params, scope);
        self.visit(node, ctx);
        ctx.params = saved;
    }

    fn visit_sequence(&mut self, seq: &SequenceNode, ctx: &mut Context) {
        let sub_contexts_before = ctx.sub_context_count;
        if ctx.previous_node == Some(NodeKind::Style) {
            let tl = self.arena.get_mut(ctx.current);
            tl.forward_frame(self.cfg.frame_ms);
            tl.snapshot_current_styles();
            ctx.previous_node = None;
        }
        for step in &seq.steps {
            self.visit(step, ctx);
        }
        if ctx.sub_context_count > sub_contexts_before {
            self.transform_into_new_timeline(ctx, None);
        }
    }

    fn visit_group(&mut self, group: &GroupNode, ctx: &mut Context) {
        let start = self.arena.get(ctx.current).current_time();
        let mut furthest = start;
        let mut forks = Vec::with_capacity(group.steps.len());
        for step in &group.steps {
            let mut inner = self.sub_context(ctx);
            self.visit(step, &mut inner);
            furthest = furthest.max(self.arena.get(inner.current).current_time());
            forks.push(inner.current);
        }
        for fork in forks {
            self.arena.merge_collected_styles(ctx.current, fork);
        }
        self.transform_into_new_timeline(ctx, Some(furthest));
    }

    fn visit_animate(&mut self, timings: AnimateTimings, styles: Option<&AnimateStyles>, ctx: &mut Context) {
        ctx.timings = Some(timings.clone());
        if timings.delay > 0.0 {
            let tl = self.arena.get_mut(ctx.current);
            tl.forward_time(tl.duration + timings.delay);
            tl.snapshot_current_styles();
        }

        match styles {
            Some(AnimateStyles::Keyframes(frames)) => self.visit_keyframes(frames, &timings, ctx),
            Some(AnimateStyles::Style(style)) => {
                let tl = self.arena.get_mut(ctx.current);
                tl.forward_time(tl.duration + timings.duration);
                self.visit_style(style, ctx);
            }
            None => {
                let tl = self.arena.get_mut(ctx.current);
                tl.forward_time(tl.duration + timings.duration);
                self.arena
                    .set_styles(ctx.current, &StyleMap::new(), timings.easing.as_deref(), true);
            }
        }
        ctx.timings = None;
    }

    fn visit_style(&mut self, style: &StyleNode, ctx: &mut Context) {
        if ctx.timings.is_none() && ctx.previous_node == Some(NodeKind::Animate) {
            self.arena.get_mut(ctx.current).forward_frame(self.cfg.frame_ms);
        }
        let (styles, own_easing) = self.normalize_style(style, &ctx.params);
        let easing = ctx
            .timings
            .as_ref()
            .and_then(|t| t.easing.clone())
            .or(own_easing);
        self.arena
            .set_styles(ctx.current, &styles, easing.as_deref(), false);
    }

    fn visit_keyframes(&mut self, frames: &KeyframesNode, timings: &AnimateTimings, ctx: &mut Context) {
        let start = self.arena.get(ctx.current).current_time();
        let duration = timings.duration;
        let inner = self.sub_context(ctx);
        self.arena.get_mut(inner.current).easing = timings.easing.clone();

        for (step, offset) in frames.steps.iter().zip(frames.resolved_offsets()) {
            self.arena
                .get_mut(inner.current)
                .forward_time(offset * duration);
            let (styles, step_easing) = self.normalize_style(step, &inner.params);
            self.arena
                .set_styles(inner.current, &styles, step_easing.as_deref(), false);
        }

        self.arena.merge_collected_styles(ctx.current, inner.current);
        self.transform_into_new_timeline(ctx, Some(start + duration));
    }

    /// Flatten a style node: strip `offset`, pull out `easing`, fill placeholders.
    fn normalize_style(&mut self, style: &StyleNode, params: &AnimationParams) -> (StyleMap, Option<String>) {
        let mut out = StyleMap::new();
        let mut easing = None;
        for (prop, value) in style.merged() {
            if prop == OFFSET_KEY {
                continue;
            }
            let value = interpolate_style_value(&value, params, self.errors);
            if prop == EASING_KEY {
                easing = Some(value.to_string());
                continue;
            }
            out.insert(prop, value);
        }
        (out, easing)
    }

    fn resolve_timings(&mut self, timing: &Timing, ctx: &Context) -> AnimateTimings {
        resolve_timings(timing, &ctx.params, self.errors)
    }

    /// Child context on a fork that inherits the parent's styles.
    fn sub_context(&mut self, ctx: &mut Context) -> Context {
        ctx.sub_context_count += 1;
        let current = self.arena.fork(ctx.current, None, true);
        Context {
            current,
            timings: ctx.timings.clone(),
            previous_node: ctx.previous_node,
            sub_context_count: 0,
            params: ctx.params.clone(),
        }
    }

    /// Continue on a blank timeline starting at `time` (default: the cursor).
    fn transform_into_new_timeline(&mut self, ctx: &mut Context, time: Option<f64>) {
        ctx.current = self.arena.fork(ctx.current, time, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{animate, animate_empty, group, keyframes, sequence, style};
    use crate::style::style_map;

    fn compile(ast: &AnimationNode, start: StyleMap, end: StyleMap) -> Vec<AnimationTimelineInstruction> {
        let mut errors = Vec::new();
        let out = build_animation_keyframes(ast, &start, &end, &mut errors);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        out
    }

    #[test]
    fn empty_tree_yields_one_noop() {
        let out = compile(&sequence(vec![]), StyleMap::new(), StyleMap::new());
        assert_eq!(out.len(), 1);
        assert!(out[0].is_noop());
    }

    #[test]
    fn delay_offsets_the_first_keyframe() {
        let ast = animate("1s 500ms", style(style_map([("opacity", 1.0)])));
        let out = compile(&ast, style_map([("opacity", 0.0)]), StyleMap::new());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].duration, 1500.0);
        assert_eq!(out[0].offsets(), vec![0.0, 500.0 / 1500.0, 1.0]);
        assert_eq!(out[0].keyframes[1].get("opacity"), Some(&StyleValue::Number(0.0)));
    }

    #[test]
    fn empty_step_lands_on_final_styles() {
        let ast = animate_empty(300);
        let out = compile(
            &ast,
            style_map([("height", "200px")]),
            style_map([("height", "100px")]),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].keyframes[0].get("height"), Some(&StyleValue::from("200px")));
        assert_eq!(out[0].keyframes[1].get("height"), Some(&StyleValue::from("100px")));
    }

    #[test]
    fn keyframes_run_on_their_own_timeline_with_the_animate_easing() {
        let ast = sequence(vec![
            animate(
                "1s ease-in",
                keyframes(vec![
                    style(style_map([("opacity", 0.0)])),
                    style(style_map([("opacity", 0.5)])),
                    style(style_map([("opacity", 1.0)])),
                ]),
            ),
            animate(500, style(style_map([("width", "10px")]))),
        ]);
        let out = compile(&ast, StyleMap::new(), StyleMap::new());
        assert_eq!(out[0].easing.as_deref(), Some("ease-in"));
        assert_eq!(out[0].offsets(), vec![0.0, 0.5, 1.0]);
        let last = out.last().expect("instruction");
        assert_eq!(last.delay, 1000.0);
        assert_eq!(last.duration, 500.0);
    }

    #[test]
    fn group_children_start_together() {
        let ast = sequence(vec![
            animate(100, style(style_map([("width", "5px")]))),
            group(vec![
                animate(100, style(style_map([("opacity", 1.0)]))),
                animate(300, style(style_map([("height", "5px")]))),
            ]),
            animate(50, style(style_map([("width", "0px")]))),
        ]);
        let out = compile(&ast, StyleMap::new(), StyleMap::new());
        let delays: Vec<f64> = out.iter().map(|i| i.delay).collect();
        assert_eq!(delays, vec![0.0, 100.0, 100.0, 400.0]);
    }

    #[test]
    fn params_fill_timings_and_styles() {
        let mut params = AnimationParams::new();
        params.insert("time".into(), StyleValue::from("250ms"));
        params.insert("to".into(), StyleValue::Number(0.4));
        let ast = animate("{{ time }}", style(style_map([("opacity", "{{ to }}")])));
        let mut errors = Vec::new();
        let out = TimelineCompiler::default().build_keyframes_with_params(
            &ast,
            &StyleMap::new(),
            &StyleMap::new(),
            &params,
            &mut errors,
        );
        assert!(errors.is_empty());
        assert_eq!(out[0].duration, 250.0);
        assert_eq!(out[0].keyframes[1].get("opacity"), Some(&StyleValue::Number(0.4)));
    }
}
