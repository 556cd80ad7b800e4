//! Secret Santa CLI client - interactive UI and one-shot commands

mod client;
mod messages;
mod tui;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::client::SantaClient;

#[derive(Parser)]
#[command(name = "santa-cli")]
#[command(about = "Terminal client for the Secret Santa server")]
#[command(version)]
struct Cli {
    /// Server URL
    #[arg(
        short,
        long,
        env = "SANTA_SERVER",
        default_value = "ws://localhost:3000/ws",
        value_parser = parse_server_url
    )]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive UI
    Ui,

    /// Register a participant
    Add {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Contact address
        #[arg(short, long)]
        email: String,
    },

    /// Remove a participant by id
    Remove {
        /// Participant ID
        id: Uuid,
    },

    /// List participants
    List,

    /// Draw Secret Santa assignments
    Assign,

    /// Show the current assignments
    Assignments,

    /// Show who a participant buys for
    Lookup {
        /// Giver's participant ID
        giver: Uuid,
    },
}

fn parse_server_url(s: &str) -> Result<String, String> {
    let url = url::Url::parse(s).map_err(|e| e.to_string())?;
    match url.scheme() {
        "ws" | "wss" => Ok(url.to_string()),
        other => Err(format!("unsupported scheme '{}', expected ws or wss", other)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; the UI owns stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "santa_cli=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let mut client = SantaClient::connect(&cli.server).await?;

    match cli.command {
        Commands::Ui => tui::run(client).await,
        Commands::Add { name, email } => run_add(&mut client, &name, &email).await,
        Commands::Remove { id } => run_remove(&mut client, id).await,
        Commands::List => run_list(&mut client).await,
        Commands::Assign => run_assign(&mut client).await,
        Commands::Assignments => run_assignments(&mut client).await,
        Commands::Lookup { giver } => run_lookup(&mut client, giver).await,
    }
}

async fn run_add(client: &mut SantaClient, name: &str, email: &str) -> Result<()> {
    match client.add_participant(name, email).await? {
        Some(participant) => println!(
            "Added {} <{}> ({})",
            participant.name, participant.email, participant.id
        ),
        None => println!("Name and email must not be empty; nothing added."),
    }
    Ok(())
}

async fn run_remove(client: &mut SantaClient, id: Uuid) -> Result<()> {
    match client.remove_participant(id).await? {
        Some(invalidated) => println!(
            "Removed {} ({} assignment{} invalidated)",
            id,
            invalidated.len(),
            if invalidated.len() == 1 { "" } else { "s" }
        ),
        None => println!("No participant with id {}.", id),
    }
    Ok(())
}

async fn run_list(client: &mut SantaClient) -> Result<()> {
    let participants = client.list_participants().await?;

    if participants.is_empty() {
        println!("No participants yet.");
    } else {
        println!("Participants ({}):", participants.len());
        println!("{:─<60}", "");
        for p in participants {
            println!(
                "  {} - {} <{}> (joined: {})",
                p.id,
                p.name,
                p.email,
                p.joined_at.format("%Y-%m-%d %H:%M")
            );
        }
    }

    Ok(())
}

async fn run_assign(client: &mut SantaClient) -> Result<()> {
    let (assignments, _) = client.assign().await?;
    println!(
        "Assigned Secret Santas for {} participants. Use `lookup <id>` to reveal one.",
        assignments.len()
    );
    Ok(())
}

async fn run_assignments(client: &mut SantaClient) -> Result<()> {
    let participants = client.list_participants().await?;
    let (assignments, drawn_at) = client.assignments().await?;

    if assignments.is_empty() {
        println!("No assignments yet.");
        return Ok(());
    }

    let names: HashMap<Uuid, String> = participants.into_iter().map(|p| (p.id, p.name)).collect();
    let name_of = |id: Uuid| names.get(&id).cloned().unwrap_or_else(|| "?".to_string());

    if let Some(drawn_at) = drawn_at {
        println!("Drawn at {}", drawn_at.format("%Y-%m-%d %H:%M"));
    }
    println!("{:─<60}", "");
    for a in assignments {
        println!("  {} -> {}", name_of(a.giver_id), name_of(a.receiver_id));
    }

    Ok(())
}

async fn run_lookup(client: &mut SantaClient, giver: Uuid) -> Result<()> {
    let receiver = client
        .lookup_receiver(giver)
        .await?
        .ok_or_else(|| anyhow!("No assignment for participant {}", giver))?;

    println!("You are Secret Santa for: {} <{}>", receiver.name, receiver.email);
    Ok(())
}
