//! `triage run`: one-shot triage of a ticket file.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tt_domain::config::Config;
use tt_domain::ticket::Ticket;

use crate::bootstrap;

/// Triage the ticket at `path` and print the JSON result to stdout.
pub async fn run(config: Arc<Config>, path: &Path, verbose: bool) -> anyhow::Result<()> {
    let ticket = read_ticket(path)?;
    let state = bootstrap::build_app_state(config)?;

    let outcome = state
        .orchestrator
        .triage(&ticket)
        .await
        .with_context(|| format!("triaging ticket {}", ticket.ticket_id))?;

    let output = if verbose {
        serde_json::to_string_pretty(&outcome)?
    } else {
        serde_json::to_string_pretty(&outcome.result)?
    };
    println!("{output}");
    Ok(())
}

fn read_ticket(path: &Path) -> anyhow::Result<Ticket> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading ticket from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?
    };
    parse_ticket(&raw)
}

fn parse_ticket(raw: &str) -> anyhow::Result<Ticket> {
    let ticket: Ticket = serde_json::from_str(raw).context("parsing ticket JSON")?;
    if ticket.ticket_id.trim().is_empty() || ticket.customer_id.trim().is_empty() {
        anyhow::bail!("ticket_id and customer_id are required");
    }
    Ok(ticket)
}
