//! Timeline builders: per-span keyframe accumulators owned by an arena.
//!
//! Model:
//! - A builder covers one continuous span with an absolute `start_time` and a local
//!   cursor (`duration`). Keyframes are keyed by local time.
//! - Every builder keeps the styles it has written, the styles it inherited when it
//!   was forked, and a backfill table. The backfill captures, on the first write of a
//!   property, the value that property had before the write (inherited → global →
//!   `AUTO`), so keyframes recorded earlier in the span still resolve.
//! - The global table is owned by the arena and shared by every builder of a compile.
//!   Group branches are forked from the same parent but backfill through this table,
//!   so a later sibling sees what an earlier sibling wrote: two coincident `color`
//!   branches emit `* → red` and then `red → blue`.
//! - Emitted keyframes are the keyframe's own entries overlaid on the backfill.

use indexmap::IndexMap;

use crate::instruction::AnimationTimelineInstruction;
use crate::style::{StyleMap, StyleValue, EASING_KEY, OFFSET_KEY};

/// Dense handle of a builder inside a [`TimelineArena`] (creation order).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TimelineId(pub usize);

/// Last value written for a property and when (absolute ms).
#[derive(Clone, Debug, PartialEq)]
pub struct StyleAtTime {
    pub time: f64,
    pub value: StyleValue,
}

#[derive(Clone, Debug)]
struct Keyframe {
    time: f64,
    styles: StyleMap,
}

#[derive(Clone, Debug)]
pub struct TimelineBuilder {
    pub start_time: f64,
    /// Local cursor; also the time of the current keyframe.
    pub duration: f64,
    /// Easing for the whole span (set for keyframe sequences).
    pub easing: Option<String>,
    keyframes: Vec<Keyframe>,
    current: usize,
    previous: Option<usize>,
    written: StyleMap,
    inherited: StyleMap,
    backfill: StyleMap,
    summary: IndexMap<String, StyleAtTime>,
    final_styles_applied: bool,
}

impl TimelineBuilder {
    fn new(start_time: f64, inherited: StyleMap) -> Self {
        Self {
            start_time,
            duration: 0.0,
            easing: None,
            keyframes: vec![Keyframe {
                time: 0.0,
                styles: StyleMap::new(),
            }],
            current: 0,
            previous: None,
            written: StyleMap::new(),
            inherited,
            backfill: StyleMap::new(),
            summary: IndexMap::new(),
            final_styles_applied: false,
        }
    }

    /// Absolute time of the cursor.
    #[inline]
    pub fn current_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// True when the span holds an actual animation worth emitting.
    pub fn has_styling(&self) -> bool {
        self.keyframes.len() > 1 || (self.final_styles_applied && self.duration == 0.0)
    }

    pub fn keyframe_count(&self) -> usize {
        self.keyframes.len()
    }

    /// Styles this builder knows about: inherited ones overlaid by its own writes.
    pub fn effective_styles(&self) -> StyleMap {
        let mut out = self.inherited.clone();
        for (prop, value) in &self.written {
            out.insert(prop.clone(), value.clone());
        }
        out
    }

    /// Properties this builder has written (including merged-in ones).
    pub fn written_properties(&self) -> impl Iterator<Item = &String> {
        self.written.keys()
    }

    /// Own entries of the keyframe under the cursor.
    pub fn final_keyframe(&self) -> &StyleMap {
        &self.keyframes[self.current].styles
    }

    pub fn forward_frame(&mut self, frame_ms: f64) {
        self.duration += frame_ms;
        self.load_keyframe();
    }

    pub fn forward_time(&mut self, time: f64) {
        self.duration = time.max(0.0);
        self.load_keyframe();
    }

    /// Carry every written style into the current keyframe.
    pub fn snapshot_current_styles(&mut self) {
        let current = &mut self.keyframes[self.current].styles;
        for (prop, value) in &self.written {
            current.insert(prop.clone(), value.clone());
        }
    }

    fn load_keyframe(&mut self) {
        self.previous = Some(self.current);
        let found = self
            .keyframes
            .iter()
            .position(|kf| kf.time == self.duration);
        self.current = match found {
            Some(idx) => idx,
            None => {
                self.keyframes.push(Keyframe {
                    time: self.duration,
                    styles: StyleMap::new(),
                });
                self.keyframes.len() - 1
            }
        };
    }

    /// Attach an easing to the keyframe that starts the segment being animated.
    fn set_segment_easing(&mut self, easing: &str) {
        let idx = self.previous.unwrap_or(self.current);
        self.keyframes[idx]
            .styles
            .insert(EASING_KEY.to_string(), StyleValue::from(easing));
    }

    fn resolve(&self, keyframe: &Keyframe) -> StyleMap {
        let mut out = keyframe.styles.clone();
        for (prop, value) in &self.backfill {
            if !out.contains_key(prop) {
                out.insert(prop.clone(), value.clone());
            }
        }
        out
    }

    /// Freeze the builder into an instruction with normalized offsets.
    pub fn build_instruction(&self) -> AnimationTimelineInstruction {
        let mut frames: Vec<&Keyframe> = self.keyframes.iter().collect();
        frames.sort_by(|a, b| a.time.total_cmp(&b.time));
        let total = frames.last().map(|kf| kf.time).unwrap_or(0.0).max(0.0);

        let mut keyframes = Vec::with_capacity(frames.len().max(2));
        if total == 0.0 {
            // Zero-length span: pin the final styles at both ends.
            let target = self.resolve(&self.keyframes[self.current]);
            for offset in [0.0, 1.0] {
                let mut kf = target.clone();
                kf.insert(OFFSET_KEY.to_string(), StyleValue::Number(offset));
                keyframes.push(kf);
            }
        } else {
            for frame in frames {
                let mut kf = self.resolve(frame);
                kf.insert(
                    OFFSET_KEY.to_string(),
                    StyleValue::Number(frame.time / total),
                );
                keyframes.push(kf);
            }
        }

        AnimationTimelineInstruction::new(keyframes, total, self.start_time, self.easing.clone())
    }
}

/// Owner of every builder created during one compile, plus the shared global table.
#[derive(Debug, Default)]
pub struct TimelineArena {
    timelines: Vec<TimelineBuilder>,
    global: StyleMap,
}

impl TimelineArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a blank builder starting at `start_time`.
    pub fn create(&mut self, start_time: f64) -> TimelineId {
        self.push(TimelineBuilder::new(start_time, StyleMap::new()))
    }

    /// Fork `parent`. The fork starts at `start_time` (default: the parent's cursor)
    /// and, with `inherit`, snapshots the parent's known styles for its backfill.
    pub fn fork(&mut self, parent: TimelineId, start_time: Option<f64>, inherit: bool) -> TimelineId {
        let p = &self.timelines[parent.0];
        let start = start_time.unwrap_or_else(|| p.current_time());
        let inherited = if inherit {
            p.effective_styles()
        } else {
            StyleMap::new()
        };
        log::trace!(
            "fork timeline {} -> {} at {}ms (inherit: {})",
            parent.0,
            self.timelines.len(),
            start,
            inherit
        );
        self.push(TimelineBuilder::new(start, inherited))
    }

    fn push(&mut self, builder: TimelineBuilder) -> TimelineId {
        self.timelines.push(builder);
        TimelineId(self.timelines.len() - 1)
    }

    #[inline]
    pub fn get(&self, id: TimelineId) -> &TimelineBuilder {
        &self.timelines[id.0]
    }

    #[inline]
    pub fn get_mut(&mut self, id: TimelineId) -> &mut TimelineBuilder {
        &mut self.timelines[id.0]
    }

    pub fn global_styles(&self) -> &StyleMap {
        &self.global
    }

    pub fn len(&self) -> usize {
        self.timelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timelines.is_empty()
    }

    /// Builders in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &TimelineBuilder> {
        self.timelines.iter()
    }

    /// Write `styles` into the current keyframe of `id`.
    ///
    /// `easing` lands on the keyframe that opened the segment. An empty step marks
    /// every globally known property as `AUTO` instead of writing `styles`.
    pub fn set_styles(
        &mut self,
        id: TimelineId,
        styles: &StyleMap,
        easing: Option<&str>,
        treat_as_empty_step: bool,
    ) {
        let global = &mut self.global;
        let tl = &mut self.timelines[id.0];
        if let Some(easing) = easing {
            tl.set_segment_easing(easing);
        }

        if treat_as_empty_step {
            for (prop, value) in global.iter() {
                if !tl.written.contains_key(prop) && !tl.backfill.contains_key(prop) {
                    let fill = tl.inherited.get(prop).unwrap_or(value).clone();
                    tl.backfill.insert(prop.clone(), fill);
                }
                tl.keyframes[tl.current]
                    .styles
                    .insert(prop.clone(), StyleValue::auto());
            }
            return;
        }

        let time = tl.current_time();
        for (prop, value) in styles {
            if prop == OFFSET_KEY {
                continue;
            }
            tl.keyframes[tl.current]
                .styles
                .insert(prop.clone(), value.clone());
            if !tl.written.contains_key(prop) && !tl.backfill.contains_key(prop) {
                let fill = tl
                    .inherited
                    .get(prop)
                    .or_else(|| global.get(prop))
                    .cloned()
                    .unwrap_or_else(StyleValue::auto);
                tl.backfill.insert(prop.clone(), fill);
            }
            tl.written.insert(prop.clone(), value.clone());
            global.insert(prop.clone(), value.clone());
            tl.summary.insert(
                prop.clone(),
                StyleAtTime {
                    time,
                    value: value.clone(),
                },
            );
        }

        let current = &mut tl.keyframes[tl.current].styles;
        for (prop, value) in &tl.written {
            if !current.contains_key(prop) {
                current.insert(prop.clone(), value.clone());
            }
        }
    }

    /// Apply the caller's destination styles to the cursor's timeline.
    pub fn apply_final_styles(&mut self, id: TimelineId, styles: &StyleMap) {
        self.set_styles(id, styles, None, false);
        self.timelines[id.0].final_styles_applied = true;
    }

    /// Fold the style summary of `from` into `into`, last writer by time.
    ///
    /// An entry from `from` replaces the parent's only when it was written strictly
    /// later; on exact ties the value already recorded (the earlier-visited fork) stays.
    pub fn merge_collected_styles(&mut self, into: TimelineId, from: TimelineId) {
        let updates: Vec<(String, StyleAtTime)> = {
            let parent = &self.timelines[into.0];
            self.timelines[from.0]
                .summary
                .iter()
                .filter(|(prop, incoming)| match parent.summary.get(*prop) {
                    Some(existing) => incoming.time > existing.time,
                    None => true,
                })
                .map(|(prop, at)| (prop.clone(), at.clone()))
                .collect()
        };
        log::trace!(
            "merge timeline {} into {}: {} propert(ies)",
            from.0,
            into.0,
            updates.len()
        );
        let tl = &mut self.timelines[into.0];
        for (prop, at) in updates {
            tl.written.insert(prop.clone(), at.value.clone());
            self.global.insert(prop.clone(), at.value.clone());
            tl.summary.insert(prop, at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::style_map;

    #[test]
    fn first_write_backfills_auto_for_unknown_properties() {
        let mut arena = TimelineArena::new();
        let root = arena.create(0.0);
        arena.get_mut(root).forward_time(100.0);
        arena.set_styles(root, &style_map([("width", "10px")]), None, false);
        assert_eq!(arena.get(root).keyframe_count(), 2);
        let inst = arena.get(root).build_instruction();
        assert_eq!(inst.keyframes.len(), 2);
        assert_eq!(inst.keyframes[0].get("width"), Some(&StyleValue::auto()));
        assert_eq!(inst.keyframes[1].get("width"), Some(&StyleValue::from("10px")));
    }

    #[test]
    fn forks_backfill_from_inherited_then_global() {
        let mut arena = TimelineArena::new();
        let root = arena.create(0.0);
        arena.set_styles(root, &style_map([("opacity", 0.0)]), None, false);

        let fork = arena.fork(root, None, true);
        // A sibling changes the global value after the fork was taken.
        let other = arena.fork(root, None, false);
        arena.get_mut(other).forward_time(10.0);
        arena.set_styles(other, &style_map([("opacity", 0.5)]), None, false);

        arena.get_mut(fork).forward_time(100.0);
        arena.set_styles(fork, &style_map([("opacity", 1.0)]), None, false);
        let inst = arena.get(fork).build_instruction();
        assert_eq!(inst.keyframes[0].get("opacity"), Some(&StyleValue::Number(0.0)));

        // Global now holds the fork's write.
        let blank = arena.fork(root, None, false);
        arena.get_mut(blank).forward_time(100.0);
        arena.set_styles(blank, &style_map([("opacity", 0.25)]), None, false);
        let inst = arena.get(blank).build_instruction();
        assert_eq!(inst.keyframes[0].get("opacity"), Some(&StyleValue::Number(1.0)));
    }

    #[test]
    fn merge_keeps_latest_write_and_first_on_ties() {
        let mut arena = TimelineArena::new();
        let root = arena.create(0.0);
        let a = arena.fork(root, None, true);
        let b = arena.fork(root, None, true);
        arena.get_mut(a).forward_time(100.0);
        arena.set_styles(a, &style_map([("color", "red")]), None, false);
        arena.get_mut(b).forward_time(100.0);
        arena.set_styles(b, &style_map([("color", "blue")]), None, false);

        arena.merge_collected_styles(root, a);
        arena.merge_collected_styles(root, b);
        assert_eq!(
            arena.global_styles().get("color"),
            Some(&StyleValue::from("red"))
        );
        assert_eq!(
            arena.get(root).effective_styles().get("color"),
            Some(&StyleValue::from("red"))
        );

        let c = arena.fork(root, None, true);
        arena.get_mut(c).forward_time(150.0);
        arena.set_styles(c, &style_map([("color", "green")]), None, false);
        arena.merge_collected_styles(root, c);
        assert_eq!(
            arena.get(root).effective_styles().get("color"),
            Some(&StyleValue::from("green"))
        );
    }

    #[test]
    fn zero_length_span_emits_two_identical_keyframes() {
        let mut arena = TimelineArena::new();
        let root = arena.create(0.0);
        arena.apply_final_styles(root, &style_map([("height", "100px")]));
        let tl = arena.get(root);
        assert!(tl.has_styling());
        let inst = tl.build_instruction();
        assert_eq!(inst.duration, 0.0);
        assert_eq!(inst.offsets(), vec![0.0, 1.0]);
        assert_eq!(inst.keyframes[0].get("height"), inst.keyframes[1].get("height"));
    }

    #[test]
    fn easing_lands_on_segment_start() {
        let mut arena = TimelineArena::new();
        let root = arena.create(0.0);
        arena.get_mut(root).forward_time(200.0);
        arena.set_styles(root, &style_map([("opacity", 1.0)]), Some("ease-in"), false);
        let inst = arena.get(root).build_instruction();
        assert_eq!(inst.keyframes[0].get("easing"), Some(&StyleValue::from("ease-in")));
        assert!(inst.keyframes[1].get("easing").is_none());
    }
}
