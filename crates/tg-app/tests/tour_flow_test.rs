use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use tg_app::{NavigationEngine, TourCommand, TourEngineBuilder};
use tg_core::ports::{
    ClockPort, DocumentPort, ElementHandle, KeyValueStorePort, Rect, ScrollOptions, TargetProbe,
    TargetWatcherError, TargetWatcherPort, Viewport,
};
use tg_core::{GatingMode, StepDefinition, TourConfig, TourEvent, TourRules, TourState, UserLevel};
use tg_infra::InMemoryKeyValueStore;

const HOUR_MS: i64 = 60 * 60 * 1000;
const KEY: &str = "guided_tour.session.v1";

struct TestClock(AtomicI64);

impl TestClock {
    fn at(now: i64) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(now)))
    }

    fn advance(&self, ms: i64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl ClockPort for TestClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

struct Harness {
    storage: Arc<InMemoryKeyValueStore>,
    clock: Arc<TestClock>,
}

impl Harness {
    fn new() -> Self {
        Self {
            storage: Arc::new(InMemoryKeyValueStore::new()),
            clock: TestClock::at(1_750_000_000_000),
        }
    }

    fn engine(&self, steps: Vec<StepDefinition>, rules: TourRules) -> NavigationEngine {
        self.engine_with_config(steps, rules, TourConfig::default())
    }

    fn engine_with_config(
        &self,
        steps: Vec<StepDefinition>,
        rules: TourRules,
        config: TourConfig,
    ) -> NavigationEngine {
        TourEngineBuilder::new(steps, self.storage.clone(), self.clock.clone())
            .rules(rules)
            .config(config)
            .build()
            .expect("build engine")
    }

    fn stored(&self) -> Option<String> {
        self.storage.get(KEY).expect("read storage")
    }
}

fn steps(ids: &[&str]) -> Vec<StepDefinition> {
    ids.iter()
        .map(|id| StepDefinition::new(*id, id.to_uppercase(), format!("About {id}")))
        .collect()
}

fn ids(list: &[&str]) -> std::collections::BTreeSet<String> {
    list.iter().map(|id| id.to_string()).collect()
}

#[test]
fn linear_tour_runs_to_completion() {
    let harness = Harness::new();
    let mut engine = harness.engine(steps(&["a", "b", "c"]), TourRules::new());

    assert_eq!(engine.total_steps(), 3);
    engine.start(None).expect("start");
    assert_eq!(engine.state().current_step_id.as_deref(), Some("a"));
    assert!(engine.is_active());

    assert!(engine.next());
    assert_eq!(engine.state().current_step_id.as_deref(), Some("b"));
    assert!(engine.next());
    assert_eq!(engine.state().current_step_id.as_deref(), Some("c"));
    assert!(engine.next());

    let state = engine.state();
    assert_eq!(state.current_step_id, None);
    assert!(!state.is_active);
    assert_eq!(state.completed_step_ids, ids(&["a", "b", "c"]));
}

#[test]
fn strict_gating_blocks_until_validator_holds() {
    let harness = Harness::new();
    let wallet_ready = Arc::new(AtomicBool::new(false));
    let flag = wallet_ready.clone();
    let rules = TourRules::new().validator("wallet-ready", move |_| flag.load(Ordering::SeqCst));
    let mut catalogue = steps(&["a", "b", "c"]);
    catalogue[1] = StepDefinition::new("b", "B", "Connect")
        .requiring("wallet-ready")
        .with_hint("Connect a wallet first");
    let mut engine = harness.engine(catalogue, rules);

    let nudges = Arc::new(Mutex::new(Vec::new()));
    let sink = nudges.clone();
    engine.subscribe(move |event| {
        if let TourEvent::Nudge { step_id, hint } = event {
            sink.lock().unwrap().push((step_id.clone(), hint.clone()));
        }
        Ok(())
    });

    engine.start(None).expect("start");
    assert!(engine.next());
    assert!(!engine.next());
    assert_eq!(engine.state().current_step_id.as_deref(), Some("b"));
    assert_eq!(
        *nudges.lock().unwrap(),
        vec![("b".to_string(), Some("Connect a wallet first".to_string()))]
    );

    wallet_ready.store(true, Ordering::SeqCst);
    assert!(engine.next());
    assert_eq!(engine.state().current_step_id.as_deref(), Some("c"));
}

#[test]
fn lenient_gating_advances_with_advisory() {
    let harness = Harness::new();
    let rules = TourRules::new()
        .validator("never", |_| false)
        .completion_check("has-name", |ctx| ctx.has_form_value("name"));
    let catalogue = vec![
        StepDefinition::new("a", "A", "a")
            .requiring("never")
            .with_completion_check("has-name")
            .with_hint("Fill in the name"),
        StepDefinition::new("b", "B", "b"),
    ];
    let config = TourConfig {
        gating_mode: GatingMode::Lenient,
        ..TourConfig::default()
    };
    let mut engine = harness.engine_with_config(catalogue, rules, config);

    let advisories = Arc::new(Mutex::new(0));
    let counter = advisories.clone();
    engine.subscribe(move |event| {
        if matches!(event, TourEvent::Advisory { .. }) {
            *counter.lock().unwrap() += 1;
        }
        Ok(())
    });

    engine.start(None).expect("start");
    assert!(engine.next());

    assert_eq!(engine.state().current_step_id.as_deref(), Some("b"));
    assert_eq!(*advisories.lock().unwrap(), 1);
}

#[test]
fn per_step_gating_overrides_engine_default() {
    let harness = Harness::new();
    let rules = TourRules::new().validator("never", |_| false);
    let catalogue = vec![
        StepDefinition::new("a", "A", "a")
            .requiring("never")
            .with_gating(GatingMode::Lenient),
        StepDefinition::new("b", "B", "b"),
    ];
    let mut engine = harness.engine(catalogue, rules);

    engine.start(None).expect("start");

    assert!(engine.next());
    assert_eq!(engine.state().current_step_id.as_deref(), Some("b"));
}

#[test]
fn skip_records_step_and_advances() {
    let harness = Harness::new();
    let mut catalogue = steps(&["a", "b", "c"]);
    catalogue[0] = StepDefinition::new("a", "A", "a").skippable();
    let mut engine = harness.engine(catalogue, TourRules::new());

    engine.start(None).expect("start");
    engine.skip();

    let state = engine.state();
    assert_eq!(state.skipped_step_ids, ids(&["a"]));
    assert!(state.completed_step_ids.is_empty());
    assert_eq!(state.current_step_id.as_deref(), Some("b"));

    engine.skip();
    assert_eq!(engine.state().current_step_id.as_deref(), Some("b"));
}

#[test]
fn computed_branch_overrides_registration_order() {
    let harness = Harness::new();
    let rules = TourRules::new().branch("wallet-route", |ctx| {
        Some(if ctx.is_wallet_connected { "c" } else { "d" }.to_string())
    });
    let mut catalogue = steps(&["a", "b", "c", "d"]);
    catalogue[0] = StepDefinition::new("a", "A", "a").branch("wallet-route");
    let mut engine = harness.engine(catalogue.clone(), rules.clone());

    engine.start(None).expect("start");
    assert!(engine.next());
    assert_eq!(engine.state().current_step_id.as_deref(), Some("d"));

    let mut connected = harness.engine(catalogue, rules);
    connected.set_wallet_connected(true);
    connected.start(None).expect("start");
    assert!(connected.next());
    assert_eq!(connected.state().current_step_id.as_deref(), Some("c"));
}

#[test]
fn fixed_next_step_jumps_ahead() {
    let harness = Harness::new();
    let mut catalogue = steps(&["a", "b", "c"]);
    catalogue[0] = StepDefinition::new("a", "A", "a").then("c");
    let mut engine = harness.engine(catalogue, TourRules::new());

    engine.start(None).expect("start");
    engine.next();

    assert_eq!(engine.state().current_step_id.as_deref(), Some("c"));
}

#[test]
fn previous_at_first_step_is_a_no_op() {
    let harness = Harness::new();
    let mut engine = harness.engine(steps(&["a", "b"]), TourRules::new());
    engine.start(None).expect("start");
    let before = engine.state();

    engine.previous();

    assert_eq!(engine.state(), before);

    engine.next();
    engine.previous();
    assert_eq!(engine.state().current_step_id.as_deref(), Some("a"));
}

#[test]
fn go_to_unknown_step_leaves_state_unchanged() {
    let harness = Harness::new();
    let mut engine = harness.engine(steps(&["a", "b", "c"]), TourRules::new());
    engine.start(None).expect("start");
    let before = engine.state();

    engine.go_to_step("nonexistent");

    assert_eq!(engine.state(), before);

    engine.go_to_step("c");
    assert_eq!(engine.state().current_step_id.as_deref(), Some("c"));
}

#[test]
fn progress_is_monotonic_and_reaches_full() {
    let harness = Harness::new();
    let mut engine = harness.engine(steps(&["a", "b", "c", "d"]), TourRules::new());
    assert_eq!(engine.progress(), 0.0);

    engine.start(None).expect("start");
    let mut last = engine.progress();
    for _ in 0..3 {
        engine.next();
        let current = engine.progress();
        assert!(current >= last);
        last = current;
    }

    assert_eq!(last, 100.0);
    assert_eq!(engine.current_step_index(), Some(3));
}

#[test]
fn start_on_empty_catalogue_is_rejected() {
    let harness = Harness::new();
    let mut engine = harness.engine(Vec::new(), TourRules::new());

    assert!(engine.start(None).is_err());
    assert!(!engine.is_active());
}

#[test]
fn session_round_trips_through_storage_as_inactive() {
    let harness = Harness::new();
    let mut catalogue = steps(&["a", "b", "c"]);
    catalogue[1] = StepDefinition::new("b", "B", "b").skippable();
    let mut engine = harness.engine(catalogue.clone(), TourRules::new());

    engine.start(None).expect("start");
    engine.next();
    engine.skip();
    engine.set_user_level(UserLevel::Intermediate);
    drop(engine);

    let mut restored = harness.engine(catalogue, TourRules::new());
    let state = restored.state();
    assert!(!state.is_active);
    assert_eq!(state.current_step_id.as_deref(), Some("c"));
    assert_eq!(state.completed_step_ids, ids(&["a"]));
    assert_eq!(state.skipped_step_ids, ids(&["b"]));
    assert_eq!(state.user_level, UserLevel::Intermediate);

    restored.resume().expect("resume");
    assert!(restored.is_active());
    assert_eq!(restored.state().current_step_id.as_deref(), Some("c"));
}

#[test]
fn stale_session_is_discarded_but_left_in_storage() {
    let harness = Harness::new();
    let now = harness.clock.now_ms();
    let stale = TourState {
        current_step_id: Some("b".into()),
        completed_step_ids: ids(&["a"]),
        started_at: Some(now - 26 * HOUR_MS),
        last_active_at: Some(now - 25 * HOUR_MS),
        is_active: true,
        ..TourState::default()
    };
    let raw = serde_json::to_string(&stale).unwrap();
    harness.storage.set(KEY, &raw).unwrap();

    let engine = harness.engine(steps(&["a", "b", "c"]), TourRules::new());

    assert_eq!(engine.state().current_step_id, None);
    assert_eq!(engine.state(), TourState::default());
    assert_eq!(harness.stored().as_deref(), Some(raw.as_str()));
}

#[test]
fn session_just_inside_ttl_is_kept() {
    let harness = Harness::new();
    let mut engine = harness.engine(steps(&["a", "b"]), TourRules::new());
    engine.start(None).expect("start");
    drop(engine);

    harness.clock.advance(23 * HOUR_MS);
    let engine = harness.engine(steps(&["a", "b"]), TourRules::new());

    assert_eq!(engine.state().current_step_id.as_deref(), Some("a"));
}

#[test]
fn reset_persists_default_state() {
    let harness = Harness::new();
    let mut engine = harness.engine(steps(&["a", "b"]), TourRules::new());
    engine.start(None).expect("start");
    engine.next();

    engine.reset();

    let stored: TourState = serde_json::from_str(&harness.stored().unwrap()).unwrap();
    assert_eq!(stored, TourState::default());
    assert_eq!(engine.state(), TourState::default());
}

#[test]
fn persisted_record_uses_camel_case_layout() {
    let harness = Harness::new();
    let mut engine = harness.engine(steps(&["a", "b"]), TourRules::new());
    engine.start(None).expect("start");

    let raw: serde_json::Value = serde_json::from_str(&harness.stored().unwrap()).unwrap();

    for field in [
        "currentStepId",
        "completedSteps",
        "skippedSteps",
        "startedAt",
        "lastActiveAt",
        "userLevel",
        "isActive",
    ] {
        assert!(raw.get(field).is_some(), "missing {field}");
    }
    assert_eq!(raw["userLevel"], "beginner");
}

#[test]
fn listener_sees_state_already_persisted() {
    let harness = Harness::new();
    let mut engine = harness.engine(steps(&["a", "b"]), TourRules::new());
    let storage = harness.storage.clone();
    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = observed.clone();
    engine.subscribe(move |event| {
        if let Some(state) = event.state() {
            let persisted: TourState = serde_json::from_str(
                &storage.get(KEY)?.ok_or_else(|| anyhow::anyhow!("nothing persisted"))?,
            )?;
            sink.lock().unwrap().push(persisted == *state);
        }
        Ok(())
    });

    engine.start(None).expect("start");
    engine.next();

    assert_eq!(*observed.lock().unwrap(), vec![true, true]);
}

#[test]
fn failing_listener_does_not_starve_later_listener() {
    let harness = Harness::new();
    let mut engine = harness.engine(steps(&["a", "b"]), TourRules::new());
    engine.subscribe(|_| Err(anyhow::anyhow!("renderer gone")));
    engine.subscribe(|_| panic!("renderer crashed"));
    let received = Arc::new(Mutex::new(0));
    let counter = received.clone();
    engine.subscribe(move |_| {
        *counter.lock().unwrap() += 1;
        Ok(())
    });

    engine.start(None).expect("start");

    assert_eq!(*received.lock().unwrap(), 1);
    assert!(engine.is_active());
}

#[test]
fn unsubscribed_listener_hears_nothing_more() {
    let harness = Harness::new();
    let mut engine = harness.engine(steps(&["a", "b"]), TourRules::new());
    let received = Arc::new(Mutex::new(0));
    let counter = received.clone();
    let subscription = engine.subscribe(move |_| {
        *counter.lock().unwrap() += 1;
        Ok(())
    });

    engine.start(None).expect("start");
    subscription.unsubscribe();
    engine.next();

    assert_eq!(*received.lock().unwrap(), 1);
}

#[test]
fn commands_queued_by_listeners_run_after_notification() {
    let harness = Harness::new();
    let mut engine = harness.engine(steps(&["a", "b", "c"]), TourRules::new());
    let sender = engine.command_sender();
    let order = Arc::new(Mutex::new(Vec::new()));

    let log = order.clone();
    engine.subscribe(move |event| {
        if let Some(state) = event.state() {
            log.lock().unwrap().push(format!("first:{:?}", state.current_step_id));
            if state.current_step_id.as_deref() == Some("a") {
                sender.send(TourCommand::Next);
            }
        }
        Ok(())
    });
    let log = order.clone();
    engine.subscribe(move |event| {
        if let Some(state) = event.state() {
            log.lock().unwrap().push(format!("second:{:?}", state.current_step_id));
        }
        Ok(())
    });

    engine.start(None).expect("start");

    assert_eq!(engine.state().current_step_id.as_deref(), Some("b"));
    assert_eq!(
        *order.lock().unwrap(),
        vec![
            "first:Some(\"a\")",
            "second:Some(\"a\")",
            "first:Some(\"b\")",
            "second:Some(\"b\")",
        ]
    );
}

#[test]
fn lifecycle_hooks_fire_in_order() {
    let harness = Harness::new();
    let trail = Arc::new(Mutex::new(Vec::new()));
    let sink = trail.clone();
    let rules = TourRules::new().hook("trace", move |event| {
        sink.lock()
            .unwrap()
            .push(format!("{:?}:{}", event.phase, event.step.id));
        Ok(())
    });
    let catalogue = vec![
        StepDefinition::new("a", "A", "a")
            .on_enter("trace")
            .on_exit("trace")
            .on_complete("trace"),
        StepDefinition::new("b", "B", "b").on_enter("trace"),
    ];
    let mut engine = harness.engine(catalogue, rules);

    engine.start(None).expect("start");
    engine.next();

    assert_eq!(
        *trail.lock().unwrap(),
        vec!["Enter:a", "Exit:a", "Complete:a", "Enter:b"]
    );
}

#[derive(Default)]
struct RecordingWatcher {
    running: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl RecordingWatcher {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl TargetWatcherPort for RecordingWatcher {
    fn watch(&self, step_id: &str, _probe: TargetProbe) -> Result<(), TargetWatcherError> {
        self.calls.lock().unwrap().push(format!("watch:{step_id}"));
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        self.calls.lock().unwrap().push("stop".into());
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

struct BlankPage;

impl DocumentPort for BlankPage {
    fn query_selector(&self, _selector: &str) -> Option<ElementHandle> {
        None
    }

    fn bounding_rect(&self, _element: &ElementHandle) -> Option<Rect> {
        None
    }

    fn viewport(&self) -> Viewport {
        Viewport {
            width: 1280.0,
            height: 800.0,
        }
    }

    fn scroll_into_view(&self, _element: &ElementHandle, _options: ScrollOptions) {}
}

fn watched_engine(harness: &Harness, watcher: Arc<RecordingWatcher>) -> NavigationEngine {
    let catalogue = vec![
        StepDefinition::new("a", "A", "a").with_selector("#a"),
        StepDefinition::new("b", "B", "b").with_selector("#b"),
    ];
    TourEngineBuilder::new(catalogue, harness.storage.clone(), harness.clock.clone())
        .document(Arc::new(BlankPage))
        .watcher(watcher)
        .build()
        .expect("build engine")
}

#[test]
fn watcher_follows_session_and_stops_on_finish() {
    let harness = Harness::new();
    let watcher = Arc::new(RecordingWatcher::default());
    let mut engine = watched_engine(&harness, watcher.clone());
    assert!(!watcher.is_running());

    engine.start(None).expect("start");
    assert!(watcher.is_running());

    engine.next();
    engine.finish();

    assert!(!watcher.is_running());
    assert_eq!(watcher.calls(), vec!["watch:a", "watch:b", "stop"]);
}

#[test]
fn teardown_stops_running_watcher() {
    let harness = Harness::new();
    let watcher = Arc::new(RecordingWatcher::default());
    let mut engine = watched_engine(&harness, watcher.clone());

    engine.start(None).expect("start");
    engine.teardown();

    assert!(!watcher.is_running());
    assert_eq!(watcher.calls(), vec!["watch:a", "stop"]);
}
