//! `kindred` command-line front end.
//!
//! Each invocation is one app launch: restore the session, resume the wizard,
//! run one command, print the result as JSON on stdout.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use kd_app::StepError;
use kd_core::onboarding::{FieldMap, FieldValue};
use kd_core::{UserId, WizardState};

use crate::bootstrap::AppRuntime;

#[derive(Parser)]
#[command(name = "kindred")]
#[command(about = "Drive the Kindred onboarding wizard from the terminal", long_about = None)]
pub struct Cli {
    /// Config file (defaults to $KINDRED_CONFIG, then kindred.toml in the data dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the signed-in user, wizard state and current draft
    Status,
    /// Submit answers for the active step, e.g. `name=Alex interests=hiking,jazz`
    Continue {
        #[arg(value_parser = parse_field_arg, required = true)]
        fields: Vec<(String, FieldValue)>,
    },
    /// Go back one step
    Back,
    /// Sign in as a user; progress is then saved to their profile record
    SignIn { user_id: String },
    /// Sign out; further progress stays on this device
    SignOut,
    /// Throw away the draft (or dispose of a completed wizard)
    Reset,
}

#[derive(Serialize)]
struct StatusReport {
    user_id: Option<UserId>,
    state: WizardState,
    current_step: u32,
    total_steps: u32,
    screen: Option<String>,
    fields: FieldMap,
}

#[derive(Serialize)]
struct ErrorReport {
    error: String,
    retryable: bool,
}

/// Parse `key=value`. Values become booleans, integers or comma-separated
/// lists where they look like one; everything else is text.
pub fn parse_field_arg(arg: &str) -> Result<(String, FieldValue)> {
    let (key, raw) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got `{arg}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("field name is empty in `{arg}`"));
    }
    Ok((key.to_string(), parse_value(raw.trim())))
}

fn parse_value(raw: &str) -> FieldValue {
    if raw.contains(',') {
        return FieldValue::List(
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(parse_value)
                .collect(),
        );
    }
    match raw {
        "true" => FieldValue::Bool(true),
        "false" => FieldValue::Bool(false),
        _ => raw
            .parse::<i64>()
            .map(FieldValue::Integer)
            .unwrap_or_else(|_| FieldValue::Text(raw.to_string())),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to encode output")?
    );
    Ok(())
}

async fn status(runtime: &AppRuntime) -> Result<()> {
    use kd_app::IdentityProvider;

    let controller = &runtime.controller;
    let draft = controller.draft_store().snapshot().await;
    print_json(&StatusReport {
        user_id: runtime.session.current_identity().await,
        state: controller.state().await,
        current_step: draft.current_step(),
        total_steps: draft.total_steps(),
        screen: controller.active_step().await.map(|step| step.name),
        fields: draft.fields().clone(),
    })
}

fn step_error(err: StepError) -> Result<()> {
    print_json(&ErrorReport {
        retryable: err.is_retryable(),
        error: err.to_string(),
    })?;
    Err(err.into())
}

async fn reset_wizard(runtime: &AppRuntime) -> Result<(), StepError> {
    let controller = &runtime.controller;
    if controller.state().await.is_completed() {
        controller.finish().await
    } else {
        controller.abandon().await
    }
}

/// Run one command against a started runtime.
pub async fn run(runtime: &AppRuntime, command: Commands) -> Result<()> {
    let controller = &runtime.controller;
    match command {
        Commands::Status => status(runtime).await,
        Commands::Continue { fields } => {
            let fields: FieldMap = fields.into_iter().collect();
            match controller.continue_step(fields).await {
                Ok(outcome) => print_json(&outcome),
                Err(err) => step_error(err),
            }
        }
        Commands::Back => match controller.back().await {
            Ok(_) => status(runtime).await,
            Err(err) => step_error(err),
        },
        Commands::SignIn { user_id } => {
            runtime.session.sign_in(UserId::new(user_id)).await?;
            status(runtime).await
        }
        Commands::SignOut => {
            runtime.session.sign_out().await?;
            match reset_wizard(runtime).await {
                Ok(()) => status(runtime).await,
                Err(err) => step_error(err),
            }
        }
        Commands::Reset => match reset_wizard(runtime).await {
            Ok(()) => status(runtime).await,
            Err(err) => step_error(err),
        },
    }
}
