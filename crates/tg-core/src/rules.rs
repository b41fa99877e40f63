//! Statically registered rule table.
//!
//! Steps reference executable behavior by id; the host registers the
//! functions here once at startup. [`TourRules::verify`] fails fast when a
//! step names a rule that was never registered.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::context::TourContext;
use crate::error::ConfigurationError;
use crate::ports::{DocumentPort, ElementHandle};
use crate::step::{NextStep, StepDefinition, StepId, StepRegistry};

pub type BranchRule = Arc<dyn Fn(&TourContext) -> Option<StepId> + Send + Sync>;
pub type Predicate = Arc<dyn Fn(&TourContext) -> bool + Send + Sync>;
pub type Hook = Arc<dyn Fn(&HookEvent<'_>) -> anyhow::Result<()> + Send + Sync>;
pub type Resolver = Arc<dyn Fn(&dyn DocumentPort) -> Option<ElementHandle> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Branch,
    Validator,
    CompletionCheck,
    Hook,
    Resolver,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuleKind::Branch => "branch",
            RuleKind::Validator => "validator",
            RuleKind::CompletionCheck => "completion check",
            RuleKind::Hook => "hook",
            RuleKind::Resolver => "resolver",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    Enter,
    Exit,
    Complete,
}

/// What a lifecycle hook is told when it fires.
#[derive(Debug)]
pub struct HookEvent<'a> {
    pub step: &'a StepDefinition,
    pub phase: HookPhase,
    pub context: &'a TourContext,
}

/// Function table keyed by rule id.
///
/// 以规则 id 为键的函数表。
#[derive(Clone, Default)]
pub struct TourRules {
    branches: HashMap<String, BranchRule>,
    validators: HashMap<String, Predicate>,
    completion_checks: HashMap<String, Predicate>,
    hooks: HashMap<String, Hook>,
    resolvers: HashMap<String, Resolver>,
}

impl TourRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn branch<F>(mut self, id: impl Into<String>, rule: F) -> Self
    where
        F: Fn(&TourContext) -> Option<StepId> + Send + Sync + 'static,
    {
        self.branches.insert(id.into(), Arc::new(rule));
        self
    }

    pub fn validator<F>(mut self, id: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&TourContext) -> bool + Send + Sync + 'static,
    {
        self.validators.insert(id.into(), Arc::new(predicate));
        self
    }

    pub fn completion_check<F>(mut self, id: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&TourContext) -> bool + Send + Sync + 'static,
    {
        self.completion_checks.insert(id.into(), Arc::new(predicate));
        self
    }

    pub fn hook<F>(mut self, id: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&HookEvent<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.hooks.insert(id.into(), Arc::new(hook));
        self
    }

    pub fn resolver<F>(mut self, id: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(&dyn DocumentPort) -> Option<ElementHandle> + Send + Sync + 'static,
    {
        self.resolvers.insert(id.into(), Arc::new(resolver));
        self
    }

    pub fn get_branch(&self, id: &str) -> Option<&BranchRule> {
        self.branches.get(id)
    }

    pub fn get_validator(&self, id: &str) -> Option<&Predicate> {
        self.validators.get(id)
    }

    pub fn get_completion_check(&self, id: &str) -> Option<&Predicate> {
        self.completion_checks.get(id)
    }

    pub fn get_hook(&self, id: &str) -> Option<&Hook> {
        self.hooks.get(id)
    }

    pub fn get_resolver(&self, id: &str) -> Option<&Resolver> {
        self.resolvers.get(id)
    }

    fn contains(&self, kind: RuleKind, id: &str) -> bool {
        match kind {
            RuleKind::Branch => self.branches.contains_key(id),
            RuleKind::Validator => self.validators.contains_key(id),
            RuleKind::CompletionCheck => self.completion_checks.contains_key(id),
            RuleKind::Hook => self.hooks.contains_key(id),
            RuleKind::Resolver => self.resolvers.contains_key(id),
        }
    }

    /// Check that every rule id and fixed next-step id in `registry` resolves.
    pub fn verify(&self, registry: &StepRegistry) -> Result<(), ConfigurationError> {
        for step in registry.steps() {
            for (kind, rule) in step.rule_refs() {
                if !self.contains(kind, rule) {
                    return Err(ConfigurationError::UnknownRule {
                        step: step.id.clone(),
                        kind,
                        rule: rule.to_string(),
                    });
                }
            }
            if let Some(NextStep::Fixed { id }) = &step.next_step {
                if !registry.contains(id) {
                    return Err(ConfigurationError::UnknownNextStep {
                        step: step.id.clone(),
                        next: id.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for TourRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TourRules")
            .field("branches", &self.branches.keys().collect::<Vec<_>>())
            .field("validators", &self.validators.keys().collect::<Vec<_>>())
            .field(
                "completion_checks",
                &self.completion_checks.keys().collect::<Vec<_>>(),
            )
            .field("hooks", &self.hooks.keys().collect::<Vec<_>>())
            .field("resolvers", &self.resolvers.keys().collect::<Vec<_>>())
            .finish()
    }
}
