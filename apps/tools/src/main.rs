use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shared::domain::Interest;
use storage::Storage;

#[derive(Parser, Debug)]
struct Cli {
    /// Falls back to `DATABASE_URL` when omitted.
    #[arg(long)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Most recent registrations first.
    List {
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long)]
        json: bool,
    },
    Count,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let database_url = cli
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .filter(|url| !url.trim().is_empty())
        .context("pass --database-url or set DATABASE_URL")?;
    let storage = Storage::new(&database_url).await?;

    match cli.command {
        Command::List { limit, json } => {
            let records = storage.list_registrations(limit).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                for record in &records {
                    println!(
                        "{}  {}  {} <{}>  {}  {}",
                        record.created_at.format("%Y-%m-%d %H:%M:%S"),
                        record.id,
                        record.full_name,
                        record.email,
                        record.whatsapp_number,
                        Interest::label_for_code(&record.interest),
                    );
                }
                if records.is_empty() {
                    println!("no registrations yet");
                }
            }
        }
        Command::Count => {
            println!("{}", storage.count_registrations().await?);
        }
    }

    storage.close().await;
    Ok(())
}
