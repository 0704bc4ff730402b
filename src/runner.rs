//! Batch runner: provisions every configured host in order
//!
//! Each host runs inside its own result boundary, so a host that fails does
//! not stop the hosts after it. The outcomes are collected into a
//! [`RunReport`] for the end-of-run summary.

use tracing::{error, info};

use crate::config::Config;
use crate::orchestrator::{HostOrchestrator, HostOutcome};
use crate::ssh::{CapabilityProbe, Transport};

/// Outcomes of every host, in configuration order
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<HostOutcome>,
}

impl RunReport {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(HostOutcome::succeeded)
    }

    pub fn failed(&self) -> impl Iterator<Item = &HostOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.succeeded())
    }

    /// Print one line per host to stdout
    pub fn print_summary(&self) {
        println!();
        println!("Summary:");
        for outcome in &self.outcomes {
            println!("  {}", outcome);
        }
    }
}

/// Provision all hosts of `config` one after another
pub async fn run(
    config: &Config,
    transport: &dyn Transport,
    probe: &dyn CapabilityProbe,
) -> RunReport {
    println!("SSH Bot");

    let orchestrator = HostOrchestrator::new(transport, probe);
    let mut report = RunReport::default();

    for host in &config.hosts {
        let outcome = orchestrator.run(host).await;

        if let Some(ref e) = outcome.error {
            error!("Error on '{}': {}", outcome.hostname, e);
            println!("Error on '{}': {}", outcome.hostname, e);
        }

        report.outcomes.push(outcome);
    }

    info!(
        "Finished {} host(s), {} failed",
        report.outcomes.len(),
        report.failed().count()
    );

    report
}
