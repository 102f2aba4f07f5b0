//! Health triage CLI
//!
//! # Usage
//!
//! ```bash
//! health-triage serve --config triage.toml
//! health-triage analyze --input vitals.json
//! health-triage predict --input vitals.json --model-dir models --format json
//! health-triage rules
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success - all parameters normal (or server stopped cleanly)
//! - 1: At least one parameter out of range
//! - 3: Invalid input or arguments
//! - 4: File not found or inaccessible
//! - 5: Model artifacts unavailable
//! - 10: Internal error

use clap::Parser;
use health_triage_api::{run_cli, TriageCli};

#[tokio::main]
async fn main() {
    let cli = TriageCli::parse();

    let exit_code = run_cli(cli).await;
    std::process::exit(exit_code.into());
}
