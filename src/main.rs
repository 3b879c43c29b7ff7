//! sitecache - offline cache worker for the portfolio site.
//!
//! Maintains the site's versioned cache generations, routes requests
//! through per-resource caching strategies, and replays queued
//! contact-form submissions when connectivity returns.

mod clients;
mod config;
mod fetch;
mod install;
mod lifecycle;
mod notify;
mod offline;
mod policy;
mod store;
mod strategy;
mod sync;
#[cfg(test)]
mod testutil;
mod worker;

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::Config;
use fetch::{FetchRequest, HttpFetcher};
use install::{Capabilities, InstallMonitor};
use policy::Destination;
use worker::{EventOutcome, Worker, WorkerEvent};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Set up logging with environment-based filter
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    info!("sitecache starting");

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("status");

    let config = Config::load()?;
    let capabilities = Capabilities::probe();
    let fetcher = Arc::new(HttpFetcher::new().context("Failed to build HTTP client")?);
    let mut worker = Worker::new(
        config.clone(),
        config.bucket_root()?,
        config.queue_dir()?,
        fetcher,
    )?;

    match command {
        "install" => {
            worker.handle_event(WorkerEvent::Install).await?;
            println!("Install complete: static assets cached.");
        }
        "activate" => {
            worker.handle_event(WorkerEvent::Activate).await?;
            println!("Activation complete: old cache generations removed.");
        }
        "fetch" => {
            let url = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("Usage: sitecache fetch <url> [destination]"))?;
            let destination =
                Destination::parse(args.get(3).map(String::as_str).unwrap_or("document"));
            let event = WorkerEvent::Fetch(FetchRequest::get(url, destination));
            if let EventOutcome::Served(served) = worker.handle_event(event).await? {
                println!(
                    "{} {} ({}, {} bytes, {})",
                    served.response.status,
                    url,
                    served.response.content_type().unwrap_or("unknown type"),
                    served.response.body.len(),
                    served.source.as_str()
                );
            }
        }
        "sync" => {
            if !capabilities.background_sync {
                eprintln!("Note: background sync capability is off; draining queue manually.");
            }
            let event = WorkerEvent::Sync {
                tag: sync::CONTACT_SYNC_TAG.to_string(),
            };
            if let EventOutcome::Synced(outcome) = worker.handle_event(event).await? {
                println!(
                    "Sync complete: {} delivered, {} still queued.",
                    outcome.delivered, outcome.failed
                );
            }
        }
        "queue" => {
            let payload = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("Usage: sitecache queue <json>"))?;
            let data: serde_json::Value =
                serde_json::from_str(payload).context("Payload must be valid JSON")?;
            worker.enqueue_submission(data)?;
            println!("Submission queued for the next sync.");
        }
        "push" => {
            let event = WorkerEvent::Push {
                payload: args.get(2).cloned(),
            };
            if let EventOutcome::Notified(notification) = worker.handle_event(event).await? {
                println!("{}: {}", notification.title, notification.body);
                for action in &notification.actions {
                    println!("  [{}] {}", action.action, action.title);
                }
            }
        }
        "click" => {
            let action = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("Usage: sitecache click <action>"))?;
            let event = WorkerEvent::NotificationClick {
                action: action.clone(),
            };
            if let EventOutcome::Clicked(outcome) = worker.handle_event(event).await? {
                match outcome {
                    notify::ClickOutcome::Open(path) => println!("Opening {}", path),
                    notify::ClickOutcome::Dismissed => println!("Notification dismissed."),
                }
            }
        }
        "status" => {
            print_status(&worker, capabilities)?;
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
        }
    }

    Ok(())
}

fn print_status(worker: &Worker, capabilities: Capabilities) -> Result<()> {
    let status = worker.status()?;
    for bucket in &status.buckets {
        println!(
            "{}: {} entries, updated {}",
            bucket.name,
            bucket.entries,
            bucket.age.as_deref().unwrap_or("never")
        );
    }
    println!("Pending submissions: {}", status.pending_submissions);
    match status.phase {
        Some(phase) => println!("Worker phase: {:?}", phase),
        None => println!("Worker phase: idle"),
    }

    let monitor = InstallMonitor::new(capabilities);
    let state = monitor.state();
    println!(
        "Install state: supported={} installable={} installed={}",
        state.supported, state.installable, state.installed
    );
    Ok(())
}

fn print_usage() {
    eprintln!(
        "Usage: sitecache <install|activate|fetch <url> [destination]|sync|queue <json>|push [text]|click <action>|status>"
    );
}
