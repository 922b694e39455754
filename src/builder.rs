use std::sync::Arc;

use crate::{
    Config, Engine, Result,
    workflow::expression::{Evaluator, TemplateEvaluator},
};

pub struct EngineBuilder {
    config: Config,
    evaluator: Arc<dyn Evaluator>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            config: Config::default(),
            evaluator: Arc::new(TemplateEvaluator),
        }
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(
        mut self,
        config: Config,
    ) -> Self {
        self.config = config;
        self
    }

    /// Replace the default template evaluator.
    pub fn evaluator(
        mut self,
        evaluator: impl Evaluator + 'static,
    ) -> Self {
        self.evaluator = Arc::new(evaluator);
        self
    }

    pub fn build(self) -> Result<Engine> {
        Engine::new(self.config, self.evaluator)
    }
}
