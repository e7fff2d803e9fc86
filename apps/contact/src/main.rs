use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Result};
use clap::Parser;
use client_core::{SubmissionController, SubmissionEvent, SubmitError};
use relay_integration::{DeliveryGateway, RelayGateway, SimulatedGateway};
use shared::domain::{SubmissionRequest, SubmissionStatus, ValidationResult};
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, Settings};

/// Send a portfolio contact message through the email relay.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    email: String,
    #[arg(long, default_value = "")]
    subject: String,
    #[arg(long, default_value = "")]
    message: String,
    #[arg(long, default_value = "contact.toml")]
    config: PathBuf,
    /// Use the simulated relay even when credentials are configured.
    #[arg(long)]
    demo: bool,
    /// Stay until the status banner auto-resets to idle.
    #[arg(long)]
    wait_reset: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let settings = load_settings(&args.config)?;
    let gateway = select_gateway(&settings, args.demo)?;
    let controller = SubmissionController::new(gateway, settings.recipient());

    let request = SubmissionRequest::new(args.name, args.email, args.subject, args.message);
    if let ValidationResult::Invalid(errors) = controller.check(&request) {
        for (field, message) in errors.messages() {
            eprintln!("{field}: {message}");
        }
        bail!("contact form has {} invalid field(s)", errors.len());
    }

    let mut events = controller.subscribe_events();
    info!(to = %controller.recipient().email, "contact: submitting message");
    let outcome = controller.submit(request).await;
    print_pending_events(&mut events);

    if args.wait_reset {
        wait_for_idle(&mut events).await;
    }

    match outcome {
        Ok(receipt) => {
            info!(attempt_id = %receipt.attempt_id, "contact: relay receipt {}", receipt.response_text);
            Ok(())
        }
        Err(SubmitError::Delivery(err)) => bail!("contact: delivery failed: {err}"),
        Err(err) => Err(err.into()),
    }
}

fn select_gateway(settings: &Settings, demo: bool) -> Result<Arc<dyn DeliveryGateway>> {
    if demo {
        info!("contact: demo mode, using simulated relay");
        return Ok(Arc::new(SimulatedGateway::new(settings.demo_delay())));
    }

    match settings.relay_config()? {
        Some(config) => {
            info!(endpoint = %config.endpoint, "contact: using email relay");
            Ok(Arc::new(RelayGateway::new(config)?))
        }
        None => {
            warn!("contact: relay credentials not configured, using simulated relay");
            Ok(Arc::new(SimulatedGateway::new(settings.demo_delay())))
        }
    }
}

fn print_pending_events(events: &mut broadcast::Receiver<SubmissionEvent>) {
    while let Ok(event) = events.try_recv() {
        if let SubmissionEvent::StatusChanged(status) = event {
            println!("{}", describe(&status));
        }
    }
}

async fn wait_for_idle(events: &mut broadcast::Receiver<SubmissionEvent>) {
    while let Ok(event) = events.recv().await {
        if let SubmissionEvent::StatusChanged(status) = event {
            println!("{}", describe(&status));
            if status == SubmissionStatus::Idle {
                break;
            }
        }
    }
}

fn describe(status: &SubmissionStatus) -> String {
    match status {
        SubmissionStatus::Idle => "Ready".to_string(),
        SubmissionStatus::Pending => "Sending...".to_string(),
        SubmissionStatus::Succeeded => {
            "Message sent successfully! I'll get back to you within 24 hours.".to_string()
        }
        SubmissionStatus::Failed { reason } => format!("Failed to send message: {reason}"),
    }
}
