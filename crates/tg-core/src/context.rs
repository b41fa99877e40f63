//! Ambient facts visible to branch rules and validators.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::session::{TourState, UserLevel};
use crate::step::StepId;

/// Facts owned by the host application.
///
/// 宿主应用提供的环境事实。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostFacts {
    pub is_wallet_connected: bool,
    pub current_route: Option<String>,
    pub form_data: BTreeMap<String, serde_json::Value>,
}

/// Read-only view handed to rules.
#[derive(Debug, Clone, PartialEq)]
pub struct TourContext {
    pub is_wallet_connected: bool,
    pub current_route: Option<String>,
    pub form_data: BTreeMap<String, serde_json::Value>,
    pub completed_steps: BTreeSet<StepId>,
    pub skipped_steps: BTreeSet<StepId>,
    pub user_level: UserLevel,
}

impl TourContext {
    pub fn new(facts: &HostFacts, state: &TourState) -> Self {
        Self {
            is_wallet_connected: facts.is_wallet_connected,
            current_route: facts.current_route.clone(),
            form_data: facts.form_data.clone(),
            completed_steps: state.completed_step_ids.clone(),
            skipped_steps: state.skipped_step_ids.clone(),
            user_level: state.user_level,
        }
    }

    pub fn form_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.form_data.get(key)
    }

    /// True when the form field exists and is not blank.
    pub fn has_form_value(&self, key: &str) -> bool {
        match self.form_data.get(key) {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    pub fn on_route(&self, route: &str) -> bool {
        self.current_route.as_deref() == Some(route)
    }
}
