use anyhow::{bail, Result};
use clap::Parser;
use client_core::{
    ControllerEvent, FormField, HttpRegistrationClient, NoticeLevel, SubmissionController,
    SubmissionStatus,
};
use shared::domain::Interest;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Submit an event registration from the terminal")]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    server_url: String,
    #[arg(long)]
    full_name: String,
    #[arg(long)]
    whatsapp_number: String,
    #[arg(long)]
    email: String,
    /// One of: vip_table, general, group, corporate, sponsor, list_event.
    #[arg(long)]
    interest: Interest,
    #[arg(long)]
    message: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
    let args = Args::parse();

    let transport = HttpRegistrationClient::new(&args.server_url)?;
    let mut controller = SubmissionController::new();
    for (field, value) in [
        (FormField::FullName, args.full_name),
        (FormField::WhatsappNumber, args.whatsapp_number),
        (FormField::Email, args.email),
        (FormField::Interest, args.interest.code().to_string()),
        (FormField::Message, args.message.unwrap_or_default()),
    ] {
        controller.set_field(field, value)?;
    }

    tracing::info!(endpoint = %transport.endpoint(), "submitting registration");
    let mut events = controller.subscribe_events();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                ControllerEvent::StatusChanged(status) => println!("[{}]", status.button_label()),
                ControllerEvent::Notice(notice) => match notice.level {
                    NoticeLevel::Success => println!("ok: {}", notice.message),
                    NoticeLevel::Error => eprintln!("error: {}", notice.message),
                },
            }
        }
    });

    let status = controller.submit(&transport).await;

    for (field, message) in controller.errors().iter() {
        eprintln!("  {}: {message}", field.name());
    }
    if let Some(view) = controller.success_view() {
        println!("{}", view.greeting);
        println!("{}", view.detail);
    }

    drop(controller);
    let _ = printer.await;

    if status != SubmissionStatus::Success {
        bail!("registration was not completed");
    }
    Ok(())
}
