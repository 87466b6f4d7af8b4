//! Trigger glue: named states plus ordered transitions, matched on a state change.

use hashbrown::HashMap;

use crate::ast::AnimationNode;
use crate::config::Config;
use crate::error::AnimationError;
use crate::instruction::{AnimationTransitionInstruction, InstructionKind};
use crate::params::{merge_params, AnimationParams};
use crate::style::{StyleMap, OFFSET_KEY};
use crate::timeline::TimelineCompiler;
use crate::transition_expr::{parse_transition_expr, TransitionMatcher, ANY_STATE, VOID_STATE};
use crate::validator::validate_with_params;

/// One `transition()` of a trigger with its compiled matchers.
#[derive(Clone, Debug)]
pub struct AnimationTransitionFactory {
    pub expr: String,
    matchers: Vec<TransitionMatcher>,
    animation: AnimationNode,
    params: AnimationParams,
}

impl AnimationTransitionFactory {
    pub fn matches(&self, from_state: &str, to_state: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(from_state, to_state))
    }

    pub fn animation(&self) -> &AnimationNode {
        &self.animation
    }
}

#[derive(Clone, Debug)]
pub struct AnimationTrigger {
    pub name: String,
    states: HashMap<String, StyleMap>,
    transitions: Vec<AnimationTransitionFactory>,
    compiler: TimelineCompiler,
}

impl AnimationTrigger {
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.compiler = TimelineCompiler::new(cfg);
        self
    }

    /// Styles declared for `state`, if any.
    pub fn state_styles(&self, state: &str) -> Option<&StyleMap> {
        self.states.get(state)
    }

    pub fn transitions(&self) -> &[AnimationTransitionFactory] {
        &self.transitions
    }

    /// Resolve a state's styles, falling back to the `*` state and then to nothing.
    fn resolve_styles(&self, state: &str) -> StyleMap {
        self.states
            .get(state)
            .or_else(|| self.states.get(ANY_STATE))
            .cloned()
            .unwrap_or_default()
    }

    /// Compile the first transition (in declaration order) matching `from => to`.
    ///
    /// `Ok(None)` when no transition matches. Problems recorded while compiling the
    /// matched transition fail the call as [`AnimationError::TriggerParse`].
    pub fn match_transition(
        &self,
        from_state: &str,
        to_state: &str,
    ) -> Result<Option<AnimationTransitionInstruction>, AnimationError> {
        self.match_transition_with_params(from_state, to_state, &AnimationParams::new())
    }

    /// Like [`Self::match_transition`], overriding the transition's default params.
    pub fn match_transition_with_params(
        &self,
        from_state: &str,
        to_state: &str,
        params: &AnimationParams,
    ) -> Result<Option<AnimationTransitionInstruction>, AnimationError> {
        let Some(factory) = self
            .transitions
            .iter()
            .find(|t| t.matches(from_state, to_state))
        else {
            log::warn!(
                "trigger {}: no transition matches {} => {}",
                self.name,
                from_state,
                to_state
            );
            return Ok(None);
        };

        let from_styles = self.resolve_styles(from_state);
        let to_styles = self.resolve_styles(to_state);
        let params = merge_params(&factory.params, params);
        let mut errors = Vec::new();
        let timelines = self.compiler.build_keyframes_with_params(
            &factory.animation,
            &from_styles,
            &to_styles,
            &params,
            &mut errors,
        );
        if !errors.is_empty() {
            return Err(AnimationError::TriggerParse {
                trigger: self.name.clone(),
                errors,
            });
        }
        log::debug!(
            "trigger {}: {} => {} matched \"{}\" ({} timeline(s))",
            self.name,
            from_state,
            to_state,
            factory.expr,
            timelines.len()
        );

        Ok(Some(AnimationTransitionInstruction {
            kind: InstructionKind::TransitionAnimation,
            trigger_name: self.name.clone(),
            is_removal_transition: to_state == VOID_STATE,
            from_state: from_state.to_string(),
            from_styles,
            to_state: to_state.to_string(),
            to_styles,
            timelines,
        }))
    }
}

/// Build a trigger from its `state()`/`transition()` definitions.
///
/// Every transition's animation is validated up front; all problems are returned
/// together as [`AnimationError::TriggerParse`].
pub fn build_trigger(name: &str, definitions: &[AnimationNode]) -> Result<AnimationTrigger, AnimationError> {
    let mut errors = Vec::new();
    let mut states = HashMap::new();
    let mut transitions = Vec::new();

    for definition in definitions {
        match definition {
            AnimationNode::State(state) => {
                let mut styles = state.styles.merged();
                styles.shift_remove(OFFSET_KEY);
                for state_name in state.name.split(',') {
                    states.insert(state_name.trim().to_string(), styles.clone());
                }
            }
            AnimationNode::Transition(transition) => {
                let matchers = parse_transition_expr(&transition.expr, &mut errors);
                errors.extend(validate_with_params(
                    &transition.animation,
                    &transition.options.params,
                ));
                transitions.push(AnimationTransitionFactory {
                    expr: transition.expr.clone(),
                    matchers,
                    animation: (*transition.animation).clone(),
                    params: transition.options.params.clone(),
                });
            }
            other => errors.push(format!(
                "only state() and transition() definitions can sit inside of a trigger(), got {:?}",
                other.kind()
            )),
        }
    }

    if !errors.is_empty() {
        return Err(AnimationError::TriggerParse {
            trigger: name.to_string(),
            errors,
        });
    }
    log::debug!(
        "trigger {name}: {} state(s), {} transition(s)",
        states.len(),
        transitions.len()
    );
    Ok(AnimationTrigger {
        name: name.to_string(),
        states,
        transitions,
        compiler: TimelineCompiler::default(),
    })
}

/// Build a trigger from a `trigger()` node.
pub fn build_trigger_from_node(node: &AnimationNode) -> Result<AnimationTrigger, AnimationError> {
    match node {
        AnimationNode::Trigger(trigger) => build_trigger(&trigger.name, &trigger.definitions),
        other => Err(AnimationError::UnexpectedNode {
            kind: format!("{:?}", other.kind()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        animate, animate_empty, sequence, state, style, transition, transition_with_options,
        AnimationOptions,
    };
    use crate::style::{style_map, StyleValue};

    fn open_close() -> Vec<AnimationNode> {
        vec![
            state("open, expanded", style(style_map([("height", "200px")]))),
            state("closed", style(style_map([("height", "100px")]))),
            transition("open => closed", animate_empty("1s")),
            transition("* => *", animate_empty(500)),
        ]
    }

    #[test]
    fn first_declared_match_wins() {
        let trigger = build_trigger("openClose", &open_close()).expect("trigger");
        let inst = trigger.match_transition("open", "closed").expect("compile").expect("match");
        assert_eq!(inst.timelines[0].duration, 1000.0);
        assert_eq!(inst.from_styles.get("height"), Some(&StyleValue::from("200px")));
        assert_eq!(inst.to_styles.get("height"), Some(&StyleValue::from("100px")));

        let inst = trigger.match_transition("closed", "expanded").expect("compile").expect("match");
        assert_eq!(inst.timelines[0].duration, 500.0);
        assert!(!inst.is_removal_transition);
    }

    #[test]
    fn unknown_states_fall_back_to_wildcard_then_empty() {
        let mut defs = open_close();
        defs.push(state("*", style(style_map([("opacity", 1.0)]))));
        let trigger = build_trigger("t", &defs).expect("trigger");
        let inst = trigger.match_transition("open", "void").expect("compile").expect("match");
        assert!(inst.is_removal_transition);
        assert_eq!(inst.to_styles.get("opacity"), Some(&StyleValue::Number(1.0)));

        let bare = build_trigger("t", &open_close()).expect("trigger");
        assert!(bare
            .match_transition("open", "void")
            .expect("compile")
            .expect("match")
            .to_styles
            .is_empty());
    }

    #[test]
    fn no_match_is_none() {
        let defs = vec![transition("a => b", animate(100, style(style_map([("x", 1.0)]))))];
        let trigger = build_trigger("t", &defs).expect("trigger");
        assert!(trigger.match_transition("b", "a").expect("compile").is_none());
    }

    #[test]
    fn invalid_transitions_fail_the_whole_trigger() {
        let defs = vec![
            transition("a ~ b", sequence(vec![])),
            transition("* => *", animate("nope", style(style_map([("x", 1.0)])))),
        ];
        let err = build_trigger("broken", &defs).expect_err("should fail");
        assert_eq!(err.messages().len(), 2);
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn runtime_params_that_break_timings_fail_the_match() {
        let mut defaults = AnimationParams::new();
        defaults.insert("time".into(), "300ms".into());
        let defs = vec![transition_with_options(
            "* => *",
            animate("{{ time }}", style(style_map([("opacity", 1.0)]))),
            AnimationOptions::with_params(defaults),
        )];
        let trigger = build_trigger("fade", &defs).expect("trigger");
        let inst = trigger
            .match_transition("a", "b")
            .expect("compile")
            .expect("match");
        assert_eq!(inst.timelines[0].duration, 300.0);

        let mut overrides = AnimationParams::new();
        overrides.insert("time".into(), "later".into());
        let err = trigger
            .match_transition_with_params("a", "b", &overrides)
            .expect_err("bad timing");
        assert!(matches!(err, AnimationError::TriggerParse { .. }));
        assert_eq!(err.messages(), vec!["The provided timing value \"later\" is invalid.".to_string()]);
    }

    #[test]
    fn only_trigger_nodes_build_triggers() {
        let err = build_trigger_from_node(&sequence(vec![])).expect_err("not a trigger");
        assert!(matches!(err, AnimationError::UnexpectedNode { .. }));
    }
}
