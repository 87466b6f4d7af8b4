//! Validated animation wrapper and JSON loading.

use crate::ast::{sequence, AnimationNode};
use crate::config::Config;
use crate::error::AnimationError;
use crate::instruction::AnimationTimelineInstruction;
use crate::params::{merge_params, AnimationParams};
use crate::style::StyleMap;
use crate::timeline::TimelineCompiler;
use crate::validator::validate_with_params;

/// An animation tree that passed validation and can be compiled repeatedly.
#[derive(Clone, Debug)]
pub struct Animation {
    ast: AnimationNode,
    params: AnimationParams,
    compiler: TimelineCompiler,
}

impl Animation {
    /// Validate `ast`. Every problem found is returned in one [`AnimationError::Validation`].
    pub fn new(ast: AnimationNode) -> Result<Self, AnimationError> {
        Self::new_with_params(ast, &AnimationParams::new())
    }

    /// Validate `ast` against `params` and keep them as the default scope for builds.
    pub fn new_with_params(ast: AnimationNode, params: &AnimationParams) -> Result<Self, AnimationError> {
        let errors = validate_with_params(&ast, params);
        if !errors.is_empty() {
            return Err(AnimationError::Validation(errors));
        }
        Ok(Self {
            ast,
            params: params.clone(),
            compiler: TimelineCompiler::default(),
        })
    }

    /// Wrap a list of steps in a sequence and validate it.
    pub fn from_steps(steps: Vec<AnimationNode>) -> Result<Self, AnimationError> {
        Self::new(sequence(steps))
    }

    pub fn with_config(mut self, cfg: Config) -> Self {
        self.compiler = TimelineCompiler::new(cfg);
        self
    }

    pub fn ast(&self) -> &AnimationNode {
        &self.ast
    }

    /// Params the animation was validated with.
    pub fn params(&self) -> &AnimationParams {
        &self.params
    }

    /// Compile from `starting_styles` to `destination_styles` with the default params.
    pub fn build_timelines(
        &self,
        starting_styles: &StyleMap,
        destination_styles: &StyleMap,
    ) -> Result<Vec<AnimationTimelineInstruction>, AnimationError> {
        self.build_timelines_with_params(starting_styles, destination_styles, &AnimationParams::new())
    }

    /// Compile with `params` layered over the defaults. Any problem recorded during the
    /// walk (a missing param, a timing that no longer parses) fails the build.
    pub fn build_timelines_with_params(
        &self,
        starting_styles: &StyleMap,
        destination_styles: &StyleMap,
        params: &AnimationParams,
    ) -> Result<Vec<AnimationTimelineInstruction>, AnimationError> {
        let params = merge_params(&self.params, params);
        let mut errors = Vec::new();
        let timelines = self.compiler.build_keyframes_with_params(
            &self.ast,
            starting_styles,
            destination_styles,
            &params,
            &mut errors,
        );
        if !errors.is_empty() {
            return Err(AnimationError::Validation(errors));
        }
        Ok(timelines)
    }
}

/// Parse an animation tree from its JSON form.
pub fn parse_animation_json(json: &str) -> Result<AnimationNode, AnimationError> {
    Ok(serde_json::from_str(json)?)
}
