use thiserror::Error;

use crate::rules::RuleKind;

/// Configuration mistakes. The only errors the engine surfaces to callers.
///
/// 配置错误：引擎唯一向调用方暴露的错误。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("duplicate step id: {0}")]
    DuplicateStepId(String),

    #[error("no steps registered")]
    EmptyRegistry,

    #[error("unknown step id: {0}")]
    UnknownStep(String),

    #[error("step {step} points to unknown next step {next}")]
    UnknownNextStep { step: String, next: String },

    #[error("step {step} references unregistered {kind} rule {rule}")]
    UnknownRule {
        step: String,
        kind: RuleKind,
        rule: String,
    },
}
