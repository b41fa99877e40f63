use serde::{Deserialize, Serialize};

use crate::gating::GatingMode;
use crate::session::UserLevel;

pub type StepId = String;

/// How a step finds the element it anchors to.
///
/// 步骤锚定元素的定位方式。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetLocator {
    /// CSS-style selector handed to the document port.
    Selector(String),
    /// Rule id of a registered resolver function.
    Resolver(String),
}

/// Where the renderer should place the tooltip relative to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Top,
    Bottom,
    Left,
    Right,
    Center,
    #[default]
    Auto,
}

/// Branching instruction evaluated when leaving a step.
///
/// 离开步骤时计算的分支指令。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NextStep {
    /// Always continue with the given step.
    Fixed { id: StepId },
    /// Ask a registered branch rule, which sees the current [`crate::TourContext`].
    Computed { rule: String },
}

/// Immutable definition of a single tour step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepDefinition {
    pub id: StepId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub detailed_content: Option<String>,
    #[serde(default)]
    pub expert_tip: Option<String>,

    #[serde(default)]
    pub target: Option<TargetLocator>,
    #[serde(default)]
    pub placement: Placement,
    #[serde(default)]
    pub highlight_padding: u32,

    #[serde(default)]
    pub required_action: bool,
    /// Validator rule id consulted by strict gating.
    #[serde(default)]
    pub validate: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
    /// Advisory completion check rule id. Never blocks advancement.
    #[serde(default)]
    pub check_completion: Option<String>,
    /// Overrides the engine-wide gating mode for this step.
    #[serde(default)]
    pub gating: Option<GatingMode>,

    #[serde(default)]
    pub skippable: bool,

    #[serde(default)]
    pub on_enter: Option<String>,
    #[serde(default)]
    pub on_exit: Option<String>,
    #[serde(default)]
    pub on_complete: Option<String>,

    #[serde(default)]
    pub next_step: Option<NextStep>,
}

/// Copy selected for a given detail level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCopy<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub extra: Option<&'a str>,
}

impl StepDefinition {
    pub fn new(id: impl Into<StepId>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            detailed_content: None,
            expert_tip: None,
            target: None,
            placement: Placement::default(),
            highlight_padding: 0,
            required_action: false,
            validate: None,
            hint: None,
            check_completion: None,
            gating: None,
            skippable: false,
            on_enter: None,
            on_exit: None,
            on_complete: None,
            next_step: None,
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.target = Some(TargetLocator::Selector(selector.into()));
        self
    }

    pub fn with_resolver(mut self, rule: impl Into<String>) -> Self {
        self.target = Some(TargetLocator::Resolver(rule.into()));
        self
    }

    pub fn requiring(mut self, validator: impl Into<String>) -> Self {
        self.required_action = true;
        self.validate = Some(validator.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_completion_check(mut self, rule: impl Into<String>) -> Self {
        self.check_completion = Some(rule.into());
        self
    }

    pub fn with_gating(mut self, mode: GatingMode) -> Self {
        self.gating = Some(mode);
        self
    }

    pub fn skippable(mut self) -> Self {
        self.skippable = true;
        self
    }

    pub fn on_enter(mut self, hook: impl Into<String>) -> Self {
        self.on_enter = Some(hook.into());
        self
    }

    pub fn on_exit(mut self, hook: impl Into<String>) -> Self {
        self.on_exit = Some(hook.into());
        self
    }

    pub fn on_complete(mut self, hook: impl Into<String>) -> Self {
        self.on_complete = Some(hook.into());
        self
    }

    pub fn then(mut self, id: impl Into<StepId>) -> Self {
        self.next_step = Some(NextStep::Fixed { id: id.into() });
        self
    }

    pub fn branch(mut self, rule: impl Into<String>) -> Self {
        self.next_step = Some(NextStep::Computed { rule: rule.into() });
        self
    }

    /// Pick the copy a renderer should display for `level`.
    ///
    /// Beginners get the detailed explanation, experts get the tip; both fall
    /// back to the plain content when the extra copy is missing.
    pub fn copy_for(&self, level: UserLevel) -> StepCopy<'_> {
        let extra = match level {
            UserLevel::Beginner => self.detailed_content.as_deref(),
            UserLevel::Intermediate => None,
            UserLevel::Expert => self.expert_tip.as_deref(),
        };
        StepCopy {
            title: &self.title,
            body: &self.content,
            extra,
        }
    }

    /// Rule ids referenced by this step, paired with the table they must live in.
    pub(crate) fn rule_refs(&self) -> Vec<(crate::rules::RuleKind, &str)> {
        use crate::rules::RuleKind;

        let mut refs = Vec::new();
        if let Some(TargetLocator::Resolver(rule)) = &self.target {
            refs.push((RuleKind::Resolver, rule.as_str()));
        }
        if let Some(rule) = &self.validate {
            refs.push((RuleKind::Validator, rule.as_str()));
        }
        if let Some(rule) = &self.check_completion {
            refs.push((RuleKind::CompletionCheck, rule.as_str()));
        }
        for hook in [&self.on_enter, &self.on_exit, &self.on_complete]
            .into_iter()
            .flatten()
        {
            refs.push((RuleKind::Hook, hook.as_str()));
        }
        if let Some(NextStep::Computed { rule }) = &self.next_step {
            refs.push((RuleKind::Branch, rule.as_str()));
        }
        refs
    }
}
