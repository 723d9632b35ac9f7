//! End-to-end scenarios driving whole machines through the runner.
//!
//! Most scenarios tick by hand against a manual clock; the threaded ones use
//! a short tick period and the system clock.

use hsm_engine::builder::{MachineBuilder, TransitionBuilder};
use hsm_engine::core::{Construct, Event, ManualClock, State, StateKind, StateResult};
use hsm_engine::error::HsmError;
use hsm_engine::leaf_state;
use hsm_engine::machine::{MachineDefinition, MachineRef};
use hsm_engine::runner::{Completion, RootRunner, RunnerConfig};
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn setup_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Counts how often the counting state has been entered.
#[derive(Default)]
struct Counters {
    counting_entries: AtomicUsize,
}

#[derive(Default)]
struct Resting;

impl State<Counters> for Resting {}

struct Counting {
    loops: u32,
    machine: MachineRef<Counters>,
}

impl State<Counters> for Counting {
    fn enter(&mut self) -> StateResult {
        self.machine
            .context()
            .counting_entries
            .fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn step(&mut self, _event: Option<&Event>) -> StateResult {
        self.loops += 1;
        Ok(())
    }
}

impl Construct<Counters> for Counting {
    type Config = ();

    fn construct(machine: &MachineRef<Counters>, _config: ()) -> Self {
        Counting {
            loops: 0,
            machine: machine.clone(),
        }
    }
}

leaf_state!(Resting);

fn counting_machine(rest: Duration) -> Arc<MachineDefinition<Counters>> {
    MachineBuilder::new("Counter")
        .initial::<Resting>()
        .transition_with(TransitionBuilder::new().from::<Resting>().to::<Counting>().after(rest))
        .and_then(|b| b.transition_with(TransitionBuilder::new().from::<Counting>().to::<Resting>().on("wah")))
        .and_then(|b| {
            b.transition_with(
                TransitionBuilder::new()
                    .from::<Counting>()
                    .to_final()
                    .when_state::<Counting, _>("counts exceeded", |c| c.loops > 42),
            )
        })
        .unwrap()
        .build()
        .unwrap()
}

#[test]
fn timeout_event_and_counter_scenario_by_hand() {
    setup_tracing();
    let clock = Arc::new(ManualClock::new());
    let mut runner = RootRunner::with_clock(
        counting_machine(Duration::from_secs(5)),
        Counters::default(),
        RunnerConfig::default(),
        clock.clone(),
    )
    .unwrap();

    // queued while resting: dequeued and discarded without effect
    runner.send(Event::new("wah"));
    assert_eq!(runner.tick().unwrap(), None);
    assert_eq!(runner.core().current_kind(), StateKind::of::<Resting>());

    clock.advance(Duration::from_millis(4_999));
    runner.tick().unwrap();
    assert_eq!(runner.core().current_kind(), StateKind::of::<Resting>());

    clock.advance(Duration::from_millis(1));
    runner.tick().unwrap();
    assert_eq!(runner.core().current_kind(), StateKind::of::<Counting>());

    runner.send(Event::new("wah"));
    runner.tick().unwrap();
    assert_eq!(runner.core().current_kind(), StateKind::of::<Resting>());

    clock.advance(Duration::from_secs(5));
    runner.tick().unwrap();
    assert_eq!(runner.core().current_as::<Counting>().unwrap().loops, 1);

    let mut extra = 0;
    let completion = loop {
        extra += 1;
        if let Some(completion) = runner.tick().unwrap() {
            break completion;
        }
        assert!(extra < 100, "counter never finished");
    };

    assert_eq!(completion, Completion::Finished);
    assert_eq!(extra, 43);
    assert_eq!(
        runner.core().history().get_path(),
        vec!["Resting", "Counting", "Resting", "Counting", "Final"]
    );
    assert_eq!(runner.core().machine().context().counting_entries.load(Ordering::SeqCst), 2);
}

fn wait_for(mut check: impl FnMut() -> bool, limit: Duration) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    false
}

#[test]
fn timeout_event_and_counter_scenario_on_a_thread() {
    setup_tracing();
    let config = RunnerConfig::default()
        .with_tick_period(Duration::from_millis(5))
        .with_thread_name("counter-test");
    let runner = RootRunner::new(counting_machine(Duration::from_millis(20)), Counters::default(), config).unwrap();
    let shared = runner.core().machine().shared_context();
    let handle = runner.start().unwrap();
    assert_eq!(handle.name(), "counter-test");

    assert!(wait_for(
        || shared.counting_entries.load(Ordering::SeqCst) == 1,
        Duration::from_secs(5)
    ));
    handle.send(Event::new("wah"));

    let report = handle.join().unwrap();
    assert_eq!(report.completion, Completion::Finished);
    assert_eq!(
        report.machine.history().get_path(),
        vec!["Resting", "Counting", "Resting", "Counting", "Final"]
    );
    assert_eq!(report.ticks, report.machine.ticks());
}

// Hierarchy

#[derive(Default)]
struct Patrol;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApproachConfig {
    speed: f64,
}

struct Approach {
    speed: f64,
}

impl State for Patrol {}
impl State for Approach {}

impl Construct for Approach {
    type Config = ApproachConfig;

    fn construct(_machine: &MachineRef, config: ApproachConfig) -> Self {
        Approach { speed: config.speed }
    }
}

leaf_state!(Patrol);

fn docking() -> Arc<MachineDefinition> {
    MachineBuilder::new("Docking")
        .initial::<Approach>()
        .transition_with(TransitionBuilder::new().from::<Approach>().to_final().on("contact"))
        .and_then(|b| {
            b.transition_with(TransitionBuilder::new().from::<Approach>().to_failed().on("bumped"))
        })
        .unwrap()
        .build()
        .unwrap()
}

fn robot() -> Arc<MachineDefinition> {
    let docking = docking();
    MachineBuilder::new("Robot")
        .initial::<Patrol>()
        .transition_with(
            TransitionBuilder::new()
                .from::<Patrol>()
                .to_machine(Arc::clone(&docking))
                .on("dock")
                .param("speed", 0.25),
        )
        .and_then(|b| {
            b.transition_with(
                TransitionBuilder::new()
                    .from_machine(&docking)
                    .to_final()
                    .on_child_finished(),
            )
        })
        .and_then(|b| {
            b.transition_with(
                TransitionBuilder::new()
                    .from_machine(&docking)
                    .to_failed()
                    .on_child_failed(),
            )
        })
        .unwrap()
        .build()
        .unwrap()
}

#[test]
fn parent_reacts_on_the_tick_after_child_finishes() {
    setup_tracing();
    let mut runner = RootRunner::new(robot(), (), RunnerConfig::default()).unwrap();

    runner.tick().unwrap();
    runner.send(Event::new("dock"));
    runner.tick().unwrap();
    assert_eq!(runner.core().current_path(), vec!["Docking", "Approach"]);

    let docking = runner.core().current_state().as_machine().unwrap();
    assert_eq!(docking.machine().path(), "Robot/Docking");
    assert_eq!(docking.current_as::<Approach>().unwrap().speed, 0.25);

    runner.send(Event::new("contact"));
    assert_eq!(runner.tick().unwrap(), None);
    assert_eq!(runner.core().current_path(), vec!["Docking", "Final"]);

    assert_eq!(runner.tick().unwrap(), Some(Completion::Finished));
    assert_eq!(runner.core().ticks(), 4);
}

#[test]
fn child_failure_surfaces_as_failed_completion() {
    setup_tracing();
    let config = RunnerConfig::default().with_tick_period(Duration::from_millis(2));
    let runner = RootRunner::new(robot(), (), config).unwrap();
    runner.send(Event::new("dock"));
    runner.send(Event::new("bumped"));

    let report = runner.start().unwrap().join().unwrap();
    assert_eq!(report.completion, Completion::Failed);
    assert_eq!(report.machine.history().get_path(), vec!["Patrol", "Docking", "Failed"]);
}

#[test]
fn completion_ripples_up_one_level_per_tick() {
    setup_tracing();
    let inner = docking();
    let middle = MachineBuilder::new("Service")
        .initial_machine(Arc::clone(&inner))
        .transition_with(TransitionBuilder::new().from_machine(&inner).to_final().on_child_finished())
        .unwrap()
        .build()
        .unwrap();
    let root = MachineBuilder::new("Depot")
        .initial_machine(Arc::clone(&middle))
        .transition_with(TransitionBuilder::new().from_machine(&middle).to_final().on_child_finished())
        .unwrap()
        .build()
        .unwrap();

    let mut runner = RootRunner::new(root, (), RunnerConfig::default()).unwrap();
    runner.send(Event::new("contact"));

    assert_eq!(runner.tick().unwrap(), None);
    assert_eq!(runner.core().current_path(), vec!["Service", "Docking", "Final"]);

    assert_eq!(runner.tick().unwrap(), None);
    assert_eq!(runner.core().current_path(), vec!["Service", "Final"]);

    assert_eq!(runner.tick().unwrap(), Some(Completion::Finished));
    assert_eq!(runner.core().current_path(), vec!["Final"]);
    assert_eq!(runner.core().ticks(), 3);
}

#[test]
fn machines_sharing_a_name_are_distinct_kinds() {
    setup_tracing();
    let docking_a = docking();
    let docking_b = MachineBuilder::<()>::new("Docking")
        .initial::<Patrol>()
        .build()
        .unwrap();
    assert_ne!(docking_a.kind(), docking_b.kind());

    let definition = MachineBuilder::new("Robot")
        .initial::<Patrol>()
        .transition_with(
            TransitionBuilder::new()
                .from::<Patrol>()
                .to_machine(Arc::clone(&docking_a))
                .on("dock"),
        )
        .and_then(|b| {
            b.transition_with(
                TransitionBuilder::new()
                    .from_machine(&docking_b)
                    .to_failed()
                    .on("abort"),
            )
        })
        .unwrap()
        .build()
        .unwrap();

    let mut runner = RootRunner::new(definition, (), RunnerConfig::default()).unwrap();
    runner.send(Event::new("dock"));
    runner.send(Event::new("abort"));

    assert_eq!(runner.tick().unwrap(), None);
    assert_eq!(runner.tick().unwrap(), None);
    assert_eq!(runner.core().current_kind(), docking_a.kind());
    assert_eq!(runner.core().current_path(), vec!["Docking", "Approach"]);
}

#[test]
fn child_condition_on_a_leaf_is_an_error() {
    setup_tracing();
    let definition = MachineBuilder::<()>::new("Misdeclared")
        .initial::<Patrol>()
        .transition_with(TransitionBuilder::new().from::<Patrol>().to_final().on_child_finished())
        .unwrap()
        .build()
        .unwrap();

    let mut runner = RootRunner::new(Arc::clone(&definition), (), RunnerConfig::default()).unwrap();
    match runner.tick() {
        Err(HsmError::NotAMachine { state, .. }) => assert_eq!(state, "Patrol"),
        other => panic!("expected NotAMachine, got {other:?}"),
    }

    let handle = RootRunner::new(definition, (), RunnerConfig::default())
        .unwrap()
        .start()
        .unwrap();
    assert!(matches!(handle.join(), Err(HsmError::NotAMachine { .. })));
}

// Run loop control

#[derive(Default)]
struct Greeter;

#[derive(Default)]
struct Stuck;

struct Greeting {
    machine: MachineRef,
}

impl State for Greeter {}
impl State for Stuck {}

impl State for Greeting {
    fn enter(&mut self) -> StateResult {
        self.machine.send(Event::new("hello"));
        Ok(())
    }
}

impl Construct for Greeting {
    type Config = ();

    fn construct(machine: &MachineRef, _config: ()) -> Self {
        Greeting {
            machine: machine.clone(),
        }
    }
}

leaf_state!(Greeter, Stuck);

#[test]
fn states_can_post_events_to_their_own_machine() {
    let definition = MachineBuilder::<()>::new("Polite")
        .initial::<Greeting>()
        .transition_with(TransitionBuilder::new().from::<Greeting>().to::<Greeter>().on("hello"))
        .unwrap()
        .build()
        .unwrap();
    let mut runner = RootRunner::new(definition, (), RunnerConfig::default()).unwrap();

    runner.tick().unwrap();
    assert_eq!(runner.core().current_kind(), StateKind::of::<Greeter>());
}

#[test]
fn stop_and_join() {
    setup_tracing();
    let definition = MachineBuilder::<()>::new("Forever")
        .initial::<Stuck>()
        .build()
        .unwrap();
    let config = RunnerConfig::default().with_tick_period(Duration::from_millis(1));
    let handle = RootRunner::new(definition, (), config).unwrap().start().unwrap();

    thread::sleep(Duration::from_millis(20));
    assert!(!handle.is_finished());
    handle.stop();

    let report = handle.join().unwrap();
    assert_eq!(report.completion, Completion::Stopped);
    assert!(report.ticks > 0);
    assert_eq!(report.machine.current_kind(), StateKind::of::<Stuck>());
}

#[derive(Default)]
struct Faulty;

impl State for Faulty {
    fn step(&mut self, _event: Option<&Event>) -> StateResult {
        Err(HsmError::behavior("Faulty", "sensor offline"))
    }
}

#[derive(Default)]
struct Exploding;

impl State for Exploding {
    fn step(&mut self, _event: Option<&Event>) -> StateResult {
        panic!("actuator driver crashed");
    }
}

leaf_state!(Faulty, Exploding);

#[test]
fn failing_hook_aborts_the_run() {
    let definition = MachineBuilder::<()>::new("Sensors")
        .initial::<Faulty>()
        .build()
        .unwrap();
    let result = RootRunner::new(definition, (), RunnerConfig::default())
        .unwrap()
        .run();

    match result {
        Err(HsmError::Behavior { state, message }) => {
            assert_eq!(state, "Faulty");
            assert_eq!(message, "sensor offline");
        }
        other => panic!("expected behavior error, got {other:?}"),
    }
}

#[test]
fn panicking_run_loop_is_reported_at_join() {
    let definition = MachineBuilder::<()>::new("Actuator")
        .initial::<Exploding>()
        .build()
        .unwrap();
    let handle = RootRunner::new(definition, (), RunnerConfig::default())
        .unwrap()
        .start()
        .unwrap();

    match handle.join() {
        Err(HsmError::Panicked { machine }) => assert_eq!(machine, "Actuator"),
        other => panic!("expected panic report, got {other:?}"),
    }
}

#[test]
fn bad_params_are_rejected_at_construction() {
    let definition = MachineBuilder::<()>::new("Docking")
        .initial::<Approach>()
        .initial_params(hsm_engine::core::Params::new().literal("speed", "fast"))
        .build()
        .unwrap();

    let err = RootRunner::new(definition, (), RunnerConfig::default()).unwrap_err();
    assert!(matches!(err, HsmError::InvalidParams { ref state, .. } if state == "Approach"));
}
