//! Ordered token transformation stages.

use crate::alert::AlertTransform;
use crate::container::ContainerTransform;
use crate::token::{Token, is_balanced};

/// A rewrite pass over the token sequence.
///
/// Implementations must leave the sequence balanced: every open token they
/// introduce or keep has its matching close.
pub trait Transform: Send + Sync {
    /// Stage name used in logs and ordering checks.
    fn name(&self) -> &'static str;

    /// Rewrite `tokens` in place.
    fn apply(&self, tokens: &mut Vec<Token<'_>>);
}

/// Transformation stages applied in order.
pub struct Pipeline {
    stages: Vec<Box<dyn Transform>>,
}

impl Pipeline {
    /// Empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Containers first: their marker lines have to be split out of
    /// paragraphs before alert markers can be seen at a paragraph start.
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .with_stage(ContainerTransform)
            .with_stage(AlertTransform)
    }

    /// Append a stage.
    #[must_use]
    pub fn with_stage<T: Transform + 'static>(mut self, stage: T) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Names of the stages in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Run every stage over `tokens`.
    pub fn run(&self, tokens: &mut Vec<Token<'_>>) {
        for stage in &self.stages {
            stage.apply(tokens);
            debug_assert!(
                is_balanced(tokens),
                "stage `{}` left unbalanced tokens",
                stage.name()
            );
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}
