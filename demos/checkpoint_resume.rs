//! Checkpoint and Resume
//!
//! This example suspends a document review workflow to a JSON snapshot on
//! disk and resumes it in a fresh runtime.
//!
//! Key concepts:
//! - Snapshots carry context, state, status and history
//! - Atomic writes to prevent corruption
//! - Actors are supplied again on restore, they are never persisted
//! - A failing command leaves the runtime untouched
//!
//! Run with: cargo run --example checkpoint_resume

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use waypoint::prelude::*;

state_enum! {
    enum Review {
        Draft,
        InReview,
        Approved,
        Published,
    }
}

fn definition() -> Result<StateMachineDefinition<Review>, BuildError> {
    StateMachineBuilder::new()
        .initial(Review::Draft)
        .command(Review::Draft, Review::InReview, "submit")
        .command(Review::InReview, Review::Draft, "reject")
        .command(Review::InReview, Review::Approved, "approve")
        .automatic(Review::Approved, Review::Published)
        .final_state(Review::Published)
        .actor("publish")
        .effect(
            Effect::on(EffectCondition::transition(Review::InReview, Review::Approved))
                .when(|_, command| command.get("reviewer").is_some())
                .action(|_, command| {
                    let reviewer = command.get("reviewer").cloned().unwrap_or(Value::Null);
                    Action::from(assign(json!({ "approved_by": reviewer })))
                }),
        )
        .effect(
            Effect::on(EffectCondition::enter(Review::Published)).action(|context, _| {
                let title = context.get("title").cloned().unwrap_or(Value::Null);
                Action::from(invoke("publish", vec![title]))
                    .then(Action::assign_with(|url| json!({ "url": url })))
            }),
        )
        .build()
}

fn actors() -> ActorRegistry {
    ActorRegistry::new().register("publish", |params: Vec<Value>| {
        let slug = params
            .first()
            .and_then(Value::as_str)
            .unwrap_or("untitled")
            .to_lowercase()
            .replace(' ', "-");
        Ok(json!(format!("https://docs.example.com/{slug}")))
    })
}

fn save(path: &Path, snapshot: &Snapshot<Review>) -> Result<(), Box<dyn std::error::Error>> {
    // Atomic write: write to temp file, then rename
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, snapshot.to_json_pretty()?)?;
    fs::rename(&temp_path, path)?;
    println!("  [Checkpoint] Saved to {}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Checkpoint and Resume ===\n");

    let dir = std::env::temp_dir().join("waypoint-checkpoints");
    fs::create_dir_all(&dir)?;
    let path: PathBuf = dir.join("review.json");

    let definition = definition()?;

    println!("Phase 1: draft and submit");
    let context = json!({ "title": "Quarterly Report" })
        .as_object()
        .cloned()
        .unwrap_or_default();
    let mut runtime = definition.run(context, actors())?;
    runtime.start().await?;
    runtime.execute(Command::new("submit")).await?;
    println!("  State: {:?}", runtime.state());

    match runtime.execute(Command::new("approve")).await {
        Ok(()) => println!("  Approved without a reviewer?"),
        Err(err) => println!("  Approval refused: {err}"),
    }
    println!("  State after refusal: {:?}", runtime.state());

    save(&path, &runtime.get_snapshot()?)?;
    drop(runtime);

    println!("\nPhase 2: resume from checkpoint");
    let json = fs::read_to_string(&path)?;
    let snapshot = Snapshot::<Review>::from_json(&json)?;
    let mut resumed = definition.restore_runtime(snapshot, actors())?;
    println!("  Resumed at {:?} ({})", resumed.state(), resumed.status());

    resumed
        .execute(Command::new("approve").with("reviewer", json!("dana")))
        .await?;
    println!("  State: {:?} ({})", resumed.state(), resumed.status());
    println!("  Context: {}", Value::Object(resumed.context()));

    let commands: Vec<&str> = resumed.history().commands().into_iter().map(Command::name).collect();
    println!("  Commands: {:?}", commands);

    fs::remove_file(&path).ok();
    println!("\n=== Example Complete ===");
    Ok(())
}
