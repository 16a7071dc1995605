use anyhow::{Context, Result};
use chrono::Local;
use lettre::Transport;
use reqwest::blocking::Client;
use std::time::{Duration, Instant};
use tracing::info;

use crate::{config::Config, fetch, format, mail, utils};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched_rows: usize,
    pub written_rows: usize,
    pub attachment_bytes: usize,
    pub csv_name: String,
}

/// Fetches, formats and mails one report using real HTTP and SMTP clients.
pub fn run(config: &Config) -> Result<RunSummary> {
    let client = Client::builder()
        .timeout(None::<Duration>)
        .build()
        .context("Failed to build HTTP client")?;
    let transport = mail::smtp_transport(&config.mail)?;

    generate_and_send(&client, &transport, config)
}

pub fn generate_and_send<T>(client: &Client, transport: &T, config: &Config) -> Result<RunSummary>
where
    T: Transport,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    let total_start_time = Instant::now();
    info!(
        action = "start",
        component = "report_run",
        report = %config.request.report_name,
        date_range = %config.request.date_range,
        "Starting report run"
    );

    let rows = fetch::fetch_report(client, &config.api, &config.request)?;
    let report = format::format_report(&rows, config.output.header_override.as_deref())?;

    let generated_at = Local::now();
    let message = mail::build_message(
        &config.mail,
        &config.request,
        &config.output.csv_name,
        &report.csv,
        &generated_at,
    )?;
    mail::send_report(transport, &message)?;

    info!(
        action = "complete",
        component = "report_run",
        recipients = %utils::join_recipients(&config.mail.to),
        duration_ms = total_start_time.elapsed().as_millis(),
        "Report run completed"
    );

    Ok(RunSummary {
        fetched_rows: rows.len(),
        written_rows: report.rows.len(),
        attachment_bytes: report.csv.len(),
        csv_name: config.output.csv_name.clone(),
    })
}
