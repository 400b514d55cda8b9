//! Traffic Light State Machine
//!
//! This example demonstrates a cyclic machine mixing command-triggered and
//! automatic transitions.
//!
//! Key concepts:
//! - `walk` and `stop` commands drive the light
//! - `Yellow -> Red` is automatic, so `stop` lands on `Red` in one call
//! - An enter hook counts completed cycles in the context
//!
//! Run with: cargo run --example traffic_light

use serde_json::{json, Map, Value};
use waypoint::prelude::*;

state_enum! {
    enum TrafficLight {
        Red,
        Yellow,
        Green,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Traffic Light State Machine ===\n");

    let definition = StateMachineBuilder::new()
        .initial(TrafficLight::Red)
        .command(TrafficLight::Red, TrafficLight::Green, "walk")
        .command(TrafficLight::Green, TrafficLight::Yellow, "stop")
        .automatic(TrafficLight::Yellow, TrafficLight::Red)
        .effect(
            Effect::on(EffectCondition::enter(TrafficLight::Red)).action(|context, _| {
                let cycles = context.get("cycles").and_then(Value::as_i64).unwrap_or(0);
                Action::from(assign(json!({ "cycles": cycles + 1 })))
            }),
        )
        .build()?;

    let mut runtime = definition.run(Map::new(), ActorRegistry::new())?;
    runtime.start().await?;
    println!("Started at {:?}", runtime.state());

    for _ in 0..3 {
        runtime.execute(Command::new("walk")).await?;
        println!("  walk -> {:?}", runtime.state());
        runtime.execute(Command::new("stop")).await?;
        println!("  stop -> {:?} (via Yellow)", runtime.state());
    }

    println!("\nCycles completed: {}", runtime.context()["cycles"]);
    println!("Acceptable commands: {:?}", runtime.get_acceptable_commands());

    let path: Vec<&str> = runtime.history().path().into_iter().map(State::name).collect();
    println!("Path: {}", path.join(" -> "));

    println!("\n=== Example Complete ===");
    Ok(())
}
