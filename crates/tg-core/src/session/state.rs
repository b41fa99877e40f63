use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::step::{StepId, StepRegistry};

/// Schema version embedded in the storage key. Bump on incompatible layout changes.
pub const SESSION_SCHEMA_VERSION: u32 = 1;

/// Detail level of the tour copy.
///
/// 引导文案的详细程度。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserLevel {
    #[default]
    Beginner,
    Intermediate,
    Expert,
}

impl fmt::Display for UserLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UserLevel::Beginner => "beginner",
            UserLevel::Intermediate => "intermediate",
            UserLevel::Expert => "expert",
        };
        f.write_str(name)
    }
}

impl FromStr for UserLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(UserLevel::Beginner),
            "intermediate" => Ok(UserLevel::Intermediate),
            "expert" => Ok(UserLevel::Expert),
            other => Err(format!("unknown user level: {other}")),
        }
    }
}

/// Mutable tour session state.
///
/// The serde layout is the persisted record:
/// `{ currentStepId, completedSteps, skippedSteps, startedAt, lastActiveAt, userLevel, isActive }`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourState {
    pub current_step_id: Option<StepId>,
    #[serde(rename = "completedSteps")]
    pub completed_step_ids: BTreeSet<StepId>,
    #[serde(rename = "skippedSteps")]
    pub skipped_step_ids: BTreeSet<StepId>,
    pub started_at: Option<i64>,
    pub last_active_at: Option<i64>,
    pub user_level: UserLevel,
    pub is_active: bool,
}

impl TourState {
    /// Idle means no step is being shown.
    pub fn is_idle(&self) -> bool {
        !self.is_active
    }

    /// Drop every id the registry does not know about.
    ///
    /// Returns the ids that were removed.
    pub fn retain_registered(&mut self, registry: &StepRegistry) -> Vec<StepId> {
        let mut dropped = Vec::new();

        if let Some(current) = &self.current_step_id {
            if !registry.contains(current) {
                dropped.push(current.clone());
                self.current_step_id = None;
            }
        }
        for set in [&mut self.completed_step_ids, &mut self.skipped_step_ids] {
            set.retain(|id| {
                let known = registry.contains(id);
                if !known {
                    dropped.push(id.clone());
                }
                known
            });
        }

        dropped
    }
}
