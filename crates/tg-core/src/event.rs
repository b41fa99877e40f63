use serde::{Deserialize, Serialize};

use crate::session::TourState;
use crate::step::StepId;

/// Events broadcast to renderers.
///
/// 广播给渲染层的事件。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TourEvent {
    /// Snapshot after a committed transition.
    StateChanged(TourState),
    /// Strict gating rejected `next()`. Renderers show transient feedback.
    Nudge {
        step_id: StepId,
        hint: Option<String>,
    },
    /// Lenient gating advanced past an unmet completion check.
    Advisory {
        step_id: StepId,
        hint: Option<String>,
    },
}

impl TourEvent {
    pub fn state(&self) -> Option<&TourState> {
        match self {
            TourEvent::StateChanged(state) => Some(state),
            _ => None,
        }
    }
}
