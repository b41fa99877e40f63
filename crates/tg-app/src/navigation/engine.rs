//! Tour navigation engine.
//!
//! Owns the [`TourState`] and is the only place it is mutated. Every
//! committed transition is persisted and then broadcast as one unit; commands
//! queued by listeners run after the broadcast finishes.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use tg_core::gating::{self, GateDecision, GatingMode};
use tg_core::ports::ElementHandle;
use tg_core::rules::{HookEvent, HookPhase};
use tg_core::{
    ConfigurationError, HostFacts, NextStep, StepDefinition, StepId, StepRegistry, TourContext,
    TourEvent, TourRules, TourState, UserLevel,
};

use crate::navigation::command::{CommandQueue, TourCommand, TourCommandSender};
use crate::notification::{NotificationBus, Subscription};
use crate::session_store::SessionStore;
use crate::target::TargetResolver;
use crate::watcher_binding::WatcherBinding;

/// The tour state machine.
///
/// 引导流程状态机。
pub struct NavigationEngine {
    registry: Arc<StepRegistry>,
    rules: Arc<TourRules>,
    store: SessionStore,
    bus: NotificationBus,
    targets: Option<TargetResolver>,
    watcher: Option<WatcherBinding>,
    gating: GatingMode,
    facts: HostFacts,
    state: TourState,
    commands: CommandQueue,
}

impl NavigationEngine {
    /// Assemble an engine from verified parts. Use
    /// [`crate::builder::TourEngineBuilder`] from host code.
    pub(crate) fn from_parts(
        registry: Arc<StepRegistry>,
        rules: Arc<TourRules>,
        store: SessionStore,
        targets: Option<TargetResolver>,
        watcher: Option<WatcherBinding>,
        gating: GatingMode,
    ) -> Self {
        let state = store.load(&registry);
        info!(
            steps = registry.len(),
            gating = ?gating,
            restored_step = ?state.current_step_id,
            "tour engine ready"
        );
        Self {
            registry,
            rules,
            store,
            bus: NotificationBus::new(),
            targets,
            watcher,
            gating,
            facts: HostFacts::default(),
            state,
            commands: CommandQueue::new(),
        }
    }

    // ---------------------------------------------------------------------
    // Transitions
    // ---------------------------------------------------------------------

    /// Activate the tour at `step_id`, or at the first registered step.
    pub fn start(&mut self, step_id: Option<&str>) -> Result<(), ConfigurationError> {
        let result = self.apply_start(step_id.map(str::to_owned));
        self.drain_commands();
        result
    }

    /// Re-activate at the restored step, or at the first step.
    pub fn resume(&mut self) -> Result<(), ConfigurationError> {
        let restored = self.state.current_step_id.clone();
        self.start(restored.as_deref())
    }

    /// Leave the current step. Returns false when gating rejected the move
    /// or there is no active step.
    pub fn next(&mut self) -> bool {
        let advanced = self.apply_next();
        self.drain_commands();
        advanced
    }

    pub fn previous(&mut self) {
        self.apply_previous();
        self.drain_commands();
    }

    pub fn skip(&mut self) {
        self.apply_skip();
        self.drain_commands();
    }

    pub fn finish(&mut self) {
        self.finish_session(true);
        self.drain_commands();
    }

    pub fn reset(&mut self) {
        self.apply_reset();
        self.drain_commands();
    }

    /// Jump to `step_id`. Unknown ids are ignored.
    pub fn go_to_step(&mut self, step_id: &str) {
        self.apply_go_to_step(step_id);
        self.drain_commands();
    }

    pub fn set_user_level(&mut self, level: UserLevel) {
        self.apply_set_user_level(level);
        self.drain_commands();
    }

    /// Apply a single command and everything it queues.
    pub fn dispatch(&mut self, command: TourCommand) {
        self.apply(command);
        self.drain_commands();
    }

    fn apply(&mut self, command: TourCommand) {
        debug!(?command, "applying tour command");
        match command {
            TourCommand::Start(step_id) => {
                if let Err(err) = self.apply_start(step_id) {
                    warn!(error = %err, "queued start rejected");
                }
            }
            TourCommand::Next => {
                self.apply_next();
            }
            TourCommand::Previous => self.apply_previous(),
            TourCommand::Skip => self.apply_skip(),
            TourCommand::Finish => self.finish_session(true),
            TourCommand::Reset => self.apply_reset(),
            TourCommand::GoToStep(step_id) => self.apply_go_to_step(&step_id),
            TourCommand::SetUserLevel(level) => self.apply_set_user_level(level),
        }
    }

    fn drain_commands(&mut self) {
        while let Some(command) = self.commands.pop() {
            self.apply(command);
        }
    }

    fn apply_start(&mut self, step_id: Option<StepId>) -> Result<(), ConfigurationError> {
        let registry = Arc::clone(&self.registry);
        let Some(first) = registry.first() else {
            warn!("tour start requested with no registered steps");
            return Err(ConfigurationError::EmptyRegistry);
        };

        let step = match step_id {
            Some(id) => match registry.get(&id) {
                Some(step) => step,
                None => {
                    warn!(step_id = %id, "tour start requested at unknown step");
                    return Err(ConfigurationError::UnknownStep(id));
                }
            },
            None => first,
        };

        let now = self.store.now_ms();
        self.state.is_active = true;
        self.state.current_step_id = Some(step.id.clone());
        self.state.started_at.get_or_insert(now);
        self.state.last_active_at = Some(now);
        info!(step_id = %step.id, "tour started");

        self.fire_hook(step, HookPhase::Enter);
        self.commit();
        Ok(())
    }

    fn apply_next(&mut self) -> bool {
        let registry = Arc::clone(&self.registry);
        let Some(step) = self.active_step_in(&registry) else {
            debug!("next ignored: tour is not active");
            return false;
        };

        let context = self.context();
        let validate = step
            .validate
            .as_deref()
            .and_then(|rule| self.rules.get_validator(rule))
            .map(|predicate| predicate(&context));
        let check_completion = step
            .check_completion
            .as_deref()
            .and_then(|rule| self.rules.get_completion_check(rule))
            .map(|predicate| predicate(&context));

        match gating::decide(step, self.gating, validate, check_completion) {
            GateDecision::Reject { hint } => {
                info!(step_id = %step.id, "advance rejected: required action not completed");
                self.bus.notify(&TourEvent::Nudge {
                    step_id: step.id.clone(),
                    hint,
                });
                return false;
            }
            GateDecision::PassWithAdvisory { hint } => {
                debug!(step_id = %step.id, "advancing past unmet completion check");
                self.bus.notify(&TourEvent::Advisory {
                    step_id: step.id.clone(),
                    hint,
                });
            }
            GateDecision::Pass => {}
        }

        self.state.completed_step_ids.insert(step.id.clone());
        self.fire_hook(step, HookPhase::Exit);
        self.fire_hook(step, HookPhase::Complete);
        self.advance_from(step);
        true
    }

    fn apply_previous(&mut self) {
        let registry = Arc::clone(&self.registry);
        let Some(step) = self.active_step_in(&registry) else {
            debug!("previous ignored: tour is not active");
            return;
        };
        let Some(prior) = registry.predecessor(&step.id) else {
            debug!(step_id = %step.id, "previous ignored at first step");
            return;
        };

        self.state.current_step_id = Some(prior.id.clone());
        self.state.last_active_at = Some(self.store.now_ms());
        info!(from = %step.id, to = %prior.id, "tour moved back");

        self.fire_hook(prior, HookPhase::Enter);
        self.commit();
    }

    fn apply_skip(&mut self) {
        let registry = Arc::clone(&self.registry);
        let Some(step) = self.active_step_in(&registry) else {
            debug!("skip ignored: tour is not active");
            return;
        };
        if !step.skippable {
            debug!(step_id = %step.id, "skip ignored: step is not skippable");
            return;
        }

        self.state.skipped_step_ids.insert(step.id.clone());
        info!(step_id = %step.id, "tour step skipped");
        self.fire_hook(step, HookPhase::Exit);
        self.advance_from(step);
    }

    /// Shared tail of `next` and `skip`: move to the following step or finish.
    fn advance_from(&mut self, step: &StepDefinition) {
        let registry = Arc::clone(&self.registry);
        let Some(next_id) = self.resolve_next(step) else {
            self.finish_session(false);
            return;
        };
        let Some(next) = registry.get(&next_id) else {
            self.finish_session(false);
            return;
        };

        self.state.current_step_id = Some(next.id.clone());
        self.state.last_active_at = Some(self.store.now_ms());
        info!(from = %step.id, to = %next.id, "tour advanced");

        self.fire_hook(next, HookPhase::Enter);
        self.commit();
    }

    fn resolve_next(&self, step: &StepDefinition) -> Option<StepId> {
        let in_order = || self.registry.successor(&step.id).map(|s| s.id.clone());

        match &step.next_step {
            None => in_order(),
            Some(NextStep::Fixed { id }) if self.registry.contains(id) => Some(id.clone()),
            Some(NextStep::Fixed { id }) => {
                warn!(step_id = %step.id, next = %id, "fixed next step not registered, using registration order");
                in_order()
            }
            Some(NextStep::Computed { rule }) => {
                let Some(branch) = self.rules.get_branch(rule) else {
                    warn!(step_id = %step.id, rule = %rule, "branch rule not registered, using registration order");
                    return in_order();
                };
                match branch(&self.context()) {
                    Some(id) if self.registry.contains(&id) => Some(id),
                    Some(id) => {
                        warn!(step_id = %step.id, next = %id, "branch rule returned unknown step, using registration order");
                        in_order()
                    }
                    None => None,
                }
            }
        }
    }

    fn finish_session(&mut self, fire_exit: bool) {
        if !self.state.is_active && self.state.current_step_id.is_none() {
            debug!("finish ignored: tour already idle");
            return;
        }

        if fire_exit && self.state.is_active {
            let registry = Arc::clone(&self.registry);
            if let Some(step) = self.active_step_in(&registry) {
                self.fire_hook(step, HookPhase::Exit);
            }
        }

        self.state.is_active = false;
        self.state.current_step_id = None;
        self.state.last_active_at = Some(self.store.now_ms());
        info!(
            completed = self.state.completed_step_ids.len(),
            skipped = self.state.skipped_step_ids.len(),
            "tour finished"
        );
        self.commit();
    }

    fn apply_reset(&mut self) {
        self.state = TourState::default();
        info!("tour reset");
        self.commit();
    }

    fn apply_go_to_step(&mut self, step_id: &str) {
        let registry = Arc::clone(&self.registry);
        let Some(step) = registry.get(step_id) else {
            debug!(step_id = %step_id, "go_to_step ignored: unknown step");
            return;
        };

        let now = self.store.now_ms();
        self.state.is_active = true;
        self.state.current_step_id = Some(step.id.clone());
        self.state.started_at.get_or_insert(now);
        self.state.last_active_at = Some(now);
        info!(step_id = %step.id, "tour jumped to step");

        self.fire_hook(step, HookPhase::Enter);
        self.commit();
    }

    fn apply_set_user_level(&mut self, level: UserLevel) {
        self.state.user_level = level;
        info!(level = %level, "tour user level changed");
        self.commit();
    }

    /// Persist, then broadcast. Always the last step of a transition.
    fn commit(&mut self) {
        self.store.save(&self.state);
        if let (Some(watcher), Some(targets)) = (self.watcher.as_mut(), self.targets.as_ref()) {
            watcher.sync(&self.state, &self.registry, targets);
        }
        self.bus.notify(&TourEvent::StateChanged(self.state.clone()));
    }

    fn fire_hook(&self, step: &StepDefinition, phase: HookPhase) {
        let hook_id = match phase {
            HookPhase::Enter => step.on_enter.as_deref(),
            HookPhase::Exit => step.on_exit.as_deref(),
            HookPhase::Complete => step.on_complete.as_deref(),
        };
        let Some(hook_id) = hook_id else {
            return;
        };
        let Some(hook) = self.rules.get_hook(hook_id) else {
            warn!(step_id = %step.id, hook = %hook_id, "lifecycle hook not registered");
            return;
        };

        let context = self.context();
        let event = HookEvent {
            step,
            phase,
            context: &context,
        };
        match panic::catch_unwind(AssertUnwindSafe(|| hook(&event))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(step_id = %step.id, hook = %hook_id, error = %err, "lifecycle hook failed");
            }
            Err(_) => {
                error!(step_id = %step.id, hook = %hook_id, "lifecycle hook panicked");
            }
        }
    }

    fn active_step_in<'r>(&self, registry: &'r StepRegistry) -> Option<&'r StepDefinition> {
        if !self.state.is_active {
            return None;
        }
        self.state
            .current_step_id
            .as_deref()
            .and_then(|id| registry.get(id))
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Copy of the current state.
    pub fn state(&self) -> TourState {
        self.state.clone()
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active
    }

    pub fn current_step(&self) -> Option<&StepDefinition> {
        self.state
            .current_step_id
            .as_deref()
            .and_then(|id| self.registry.get(id))
    }

    pub fn current_step_index(&self) -> Option<usize> {
        self.state
            .current_step_id
            .as_deref()
            .and_then(|id| self.registry.index_of(id))
    }

    pub fn total_steps(&self) -> usize {
        self.registry.len()
    }

    /// Position-based progress in percent: `(index + 1) / total * 100`, 0 with
    /// no current step.
    pub fn progress(&self) -> f64 {
        let total = self.total_steps();
        match self.current_step_index() {
            Some(index) if total > 0 => (index + 1) as f64 / total as f64 * 100.0,
            _ => 0.0,
        }
    }

    pub fn steps(&self) -> &StepRegistry {
        &self.registry
    }

    pub fn gating_mode(&self) -> GatingMode {
        self.gating
    }

    pub fn context(&self) -> TourContext {
        TourContext::new(&self.facts, &self.state)
    }

    /// Resolve the current step's anchor and scroll it into view if needed.
    pub fn current_target_element(&self) -> Option<ElementHandle> {
        let targets = self.targets.as_ref()?;
        let step = self.current_step()?;
        let element = targets.resolve(step)?;
        targets.ensure_visible(&element);
        Some(element)
    }

    // ---------------------------------------------------------------------
    // Host facts, subscriptions, teardown
    // ---------------------------------------------------------------------

    pub fn facts(&self) -> &HostFacts {
        &self.facts
    }

    pub fn set_wallet_connected(&mut self, connected: bool) {
        self.facts.is_wallet_connected = connected;
    }

    pub fn set_route(&mut self, route: Option<String>) {
        self.facts.current_route = route;
    }

    pub fn set_form_value(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.facts.form_data.insert(key.into(), value);
    }

    pub fn update_facts(&mut self, update: impl FnOnce(&mut HostFacts)) {
        update(&mut self.facts);
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&TourEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.bus.subscribe(listener)
    }

    pub fn command_sender(&self) -> TourCommandSender {
        self.commands.sender()
    }

    /// Detach from the host UI: drop listeners, queued commands, the watcher
    /// and the catalogue. Persisted storage is left as is.
    pub fn teardown(&mut self) {
        self.bus.clear();
        let dropped = self.commands.clear();
        if let Some(watcher) = self.watcher.as_mut() {
            watcher.stop();
        }
        self.registry = Arc::new(StepRegistry::empty());
        info!(dropped_commands = dropped, "tour engine torn down");
    }
}
