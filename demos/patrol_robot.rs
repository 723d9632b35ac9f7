//! Patrol Robot
//!
//! A robot patrols until its battery runs low, then hands control to a nested
//! docking machine. When docking finishes it goes back to patrolling, and a
//! shutdown command ends the run.
//!
//! Key concepts:
//! - A nested machine used as a single state
//! - Timeout, event, and state-aware guards
//! - Construction parameters handed to the nested machine's initial state
//! - Events posted from another thread
//! - DOT export of the transition graph
//!
//! Run with: cargo run --example patrol_robot
//! Set RUST_LOG=debug to see every state change.

use hsm_engine::builder::{BuildError, MachineBuilder, TransitionBuilder};
use hsm_engine::core::{Construct, Event, State, StateResult};
use hsm_engine::graph::TransitionGraph;
use hsm_engine::machine::{MachineDefinition, MachineRef};
use hsm_engine::runner::{RootRunner, RunnerConfig};
use hsm_engine::leaf_state;
use serde::Deserialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Shared by every state of the robot.
struct Robot {
    battery: AtomicU32,
}

struct Patrolling {
    machine: MachineRef<Robot>,
}

impl State<Robot> for Patrolling {
    fn step(&mut self, _event: Option<&Event>) -> StateResult {
        let battery = &self.machine.context().battery;
        let left = battery.load(Ordering::SeqCst).saturating_sub(2);
        battery.store(left, Ordering::SeqCst);
        println!("  patrolling, battery {left}%");
        if left <= 20 {
            self.machine.send(Event::new("battery_low"));
        }
        Ok(())
    }
}

impl Construct<Robot> for Patrolling {
    type Config = ();

    fn construct(machine: &MachineRef<Robot>, _config: ()) -> Self {
        Patrolling {
            machine: machine.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApproachConfig {
    speed: f64,
}

struct Approach {
    speed: f64,
    distance: f64,
}

impl State<Robot> for Approach {
    fn enter(&mut self) -> StateResult {
        println!("  approaching dock at {} m/s", self.speed);
        Ok(())
    }

    fn step(&mut self, _event: Option<&Event>) -> StateResult {
        self.distance = (self.distance - self.speed).max(0.0);
        Ok(())
    }
}

impl Construct<Robot> for Approach {
    type Config = ApproachConfig;

    fn construct(_machine: &MachineRef<Robot>, config: ApproachConfig) -> Self {
        Approach {
            speed: config.speed,
            distance: 1.0,
        }
    }
}

struct Charging {
    machine: MachineRef<Robot>,
}

impl State<Robot> for Charging {
    fn step(&mut self, _event: Option<&Event>) -> StateResult {
        let battery = &self.machine.context().battery;
        let level = (battery.load(Ordering::SeqCst) + 20).min(100);
        battery.store(level, Ordering::SeqCst);
        println!("  charging, battery {level}%");
        Ok(())
    }
}

impl Construct<Robot> for Charging {
    type Config = ();

    fn construct(machine: &MachineRef<Robot>, _config: ()) -> Self {
        Charging {
            machine: machine.clone(),
        }
    }
}

#[derive(Default)]
struct Parked;

impl State<Robot> for Parked {}

leaf_state!(Parked);

impl Charging {
    fn is_full(&self) -> bool {
        self.machine.context().battery.load(Ordering::SeqCst) >= 100
    }
}

fn build() -> Result<Arc<MachineDefinition<Robot>>, BuildError> {
    let docking = MachineBuilder::new("Docking")
        .initial::<Approach>()
        .transition_with(
            TransitionBuilder::new()
                .from::<Approach>()
                .to::<Charging>()
                .when_state::<Approach, _>("at dock", |a| a.distance <= 0.0),
        )?
        .transition_with(
            TransitionBuilder::new()
                .from::<Charging>()
                .to_final()
                .when_state::<Charging, _>("charged", Charging::is_full),
        )?
        .transition_with(
            TransitionBuilder::new()
                .from::<Approach>()
                .to_failed()
                .after(Duration::from_secs(2)),
        )?
        .build()?;

    MachineBuilder::new("Robot")
        .initial::<Patrolling>()
        .transition_with(
            TransitionBuilder::new()
                .from::<Patrolling>()
                .to_machine(Arc::clone(&docking))
                .on("battery_low")
                .param("speed", 0.25),
        )?
        .transition_with(
            TransitionBuilder::new()
                .from_machine(&docking)
                .to::<Patrolling>()
                .on_child_finished(),
        )?
        .transition_with(
            TransitionBuilder::new()
                .from_machine(&docking)
                .to_failed()
                .on_child_failed(),
        )?
        .transition_with(TransitionBuilder::new().from::<Patrolling>().to::<Parked>().on("shutdown"))?
        .transition_with(
            TransitionBuilder::new()
                .from::<Parked>()
                .to_final()
                .after(Duration::from_millis(200)),
        )?
        .build()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    println!("=== Patrol Robot ===\n");

    let definition = build()?;

    println!("Transition graph:\n");
    println!("{}", TransitionGraph::from_definition(&definition).to_dot());

    let config = RunnerConfig::default().with_tick_period(Duration::from_millis(50));
    let context = Robot {
        battery: AtomicU32::new(30),
    };
    let runner = RootRunner::new(definition, context, config)?;
    let handle = runner.start()?;

    let commands = handle.sender();
    let operator = thread::spawn(move || {
        thread::sleep(Duration::from_millis(1_500));
        println!("  operator: shutdown");
        commands.send(Event::new("shutdown"));
    });

    let report = handle.join()?;
    operator.join().map_err(|_| "operator thread panicked")?;

    println!("\nRun {} ended: {:?} after {} ticks", report.run_id, report.completion, report.ticks);
    println!("Path: {}", report.machine.history().get_path().join(" -> "));

    println!("\n=== Example Complete ===");
    Ok(())
}
