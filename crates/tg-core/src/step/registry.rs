use std::collections::HashMap;

use crate::error::ConfigurationError;
use crate::step::{StepDefinition, StepId};

/// Ordered, immutable catalogue of step definitions.
///
/// 有序且不可变的步骤目录。
#[derive(Debug, Clone, Default)]
pub struct StepRegistry {
    steps: Vec<StepDefinition>,
    index: HashMap<StepId, usize>,
}

impl StepRegistry {
    /// Build the registry, rejecting duplicate ids.
    pub fn new(steps: Vec<StepDefinition>) -> Result<Self, ConfigurationError> {
        let mut index = HashMap::with_capacity(steps.len());
        for (position, step) in steps.iter().enumerate() {
            if index.insert(step.id.clone(), position).is_some() {
                tracing::warn!(step_id = %step.id, "duplicate step id in catalogue");
                return Err(ConfigurationError::DuplicateStepId(step.id.clone()));
            }
        }
        tracing::debug!(steps = steps.len(), "step registry built");
        Ok(Self { steps, index })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&StepDefinition> {
        self.index.get(id).map(|&position| &self.steps[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn at(&self, position: usize) -> Option<&StepDefinition> {
        self.steps.get(position)
    }

    pub fn first(&self) -> Option<&StepDefinition> {
        self.steps.first()
    }

    /// Registration-order successor of `id`.
    pub fn successor(&self, id: &str) -> Option<&StepDefinition> {
        self.index_of(id).and_then(|position| self.steps.get(position + 1))
    }

    /// Registration-order predecessor of `id`.
    pub fn predecessor(&self, id: &str) -> Option<&StepDefinition> {
        match self.index_of(id) {
            Some(position) if position > 0 => self.steps.get(position - 1),
            _ => None,
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|step| step.id.as_str())
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
