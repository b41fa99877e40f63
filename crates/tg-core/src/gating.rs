//! Advancement gating.
//!
//! Defines the pure decision of whether `next()` may leave a step.

use serde::{Deserialize, Serialize};

use crate::step::StepDefinition;

/// How validators influence advancement.
///
/// 校验器对前进的影响方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatingMode {
    /// A failing validator on a required-action step blocks `next()`.
    #[default]
    Strict,
    /// Validators are advisory only.
    Lenient,
}

/// Outcome of gating a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Advance without remarks.
    Pass,
    /// Advance, but the completion check did not hold.
    PassWithAdvisory { hint: Option<String> },
    /// Stay on the step; the renderer should nudge the user.
    Reject { hint: Option<String> },
}

impl GateDecision {
    pub fn allows_advance(&self) -> bool {
        !matches!(self, GateDecision::Reject { .. })
    }
}

/// Decide whether `step` may be left.
///
/// `validate` and `check_completion` are the evaluated rule results, `None`
/// when the step does not reference the rule.
pub fn decide(
    step: &StepDefinition,
    default_mode: GatingMode,
    validate: Option<bool>,
    check_completion: Option<bool>,
) -> GateDecision {
    let mode = step.gating.unwrap_or(default_mode);

    if mode == GatingMode::Strict && step.required_action && validate == Some(false) {
        return GateDecision::Reject {
            hint: step.hint.clone(),
        };
    }

    let advisory_failed = match mode {
        GatingMode::Strict => check_completion == Some(false),
        GatingMode::Lenient => check_completion == Some(false) || validate == Some(false),
    };
    if advisory_failed && step.hint.is_some() {
        return GateDecision::PassWithAdvisory {
            hint: step.hint.clone(),
        };
    }

    GateDecision::Pass
}
