//! Runs the canonical lost-update demonstration against the configured store
//! with real wall-clock think times.
//!
//! The final story goes to stdout; narration and the report go to stderr.

use std::process::ExitCode;

use lostupdate::{RaceOrchestrator, Scenario, StoreConfig, TokioTimeProvider, CONTAINER};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = match StoreConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::from(2);
        }
    };
    tracing::info!(?config, "store configured");

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let store = config.open(CONTAINER);
    let orchestrator = RaceOrchestrator::new(store, TokioTimeProvider::new(), Scenario::new());
    let local = tokio::task::LocalSet::new();

    match local.block_on(&runtime, orchestrator.run()) {
        Ok(report) => {
            eprint!("{report}");
            println!("{}", report.final_value);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("race aborted: {e}");
            ExitCode::FAILURE
        }
    }
}
