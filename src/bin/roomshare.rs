use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use roomshare::auth::Session;
use roomshare::events::EventInput;
use roomshare::notify::LogNotifier;
use roomshare::Roomshare;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "roomshare")]
#[command(about = "Manage roommates, balances, reminders and household events")]
struct Cli {
    /// Account email used to sign in
    #[arg(long, env = "ROOMSHARE_EMAIL", global = true)]
    email: Option<String>,

    /// Account password used to sign in
    #[arg(long, env = "ROOMSHARE_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,

    /// Reuse an existing access token instead of signing in
    #[arg(long, env = "ROOMSHARE_ACCESS_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the signed-in account
    Whoami,
    /// Roommate list operations
    Roommates {
        #[command(subcommand)]
        action: RoommateAction,
    },
    /// Email a payment reminder to a roommate
    Remind {
        /// Roommate row id
        id: Uuid,
    },
    /// Household events
    Events {
        #[command(subcommand)]
        action: EventAction,
    },
}

#[derive(Subcommand)]
enum RoommateAction {
    /// List your roommates and balances
    List,
    /// Add the registered user with this email as a roommate
    Add { email: String },
    /// Remove one roommate by row id
    Remove { id: Uuid },
    /// Remove all of your roommates
    Clear {
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum EventAction {
    /// List events, earliest first
    List,
    /// Create an event, or edit one with --id
    Add {
        name: String,

        /// Event date (e.g. "2026-03-20" or "03/20/2026")
        #[arg(short, long)]
        date: String,

        /// chore, bill, social, maintenance or other
        #[arg(short = 't', long = "type", default_value = "other")]
        event_type: String,

        #[arg(short, long, default_value = "")]
        notes: String,

        /// Id of an existing event to update
        #[arg(long)]
        id: Option<Uuid>,
    },
}

async fn sign_in(client: &Roomshare, cli: &Cli) -> Result<()> {
    if let Some(token) = &cli.token {
        let session = Session::from_access_token(token).context("invalid access token")?;
        if session.is_expired() {
            bail!("access token has expired");
        }
        client.auth().set_session(session);
        return Ok(());
    }
    match (&cli.email, &cli.password) {
        (Some(email), Some(password)) => {
            client
                .auth()
                .sign_in_with_password(email, password)
                .await
                .context("sign in failed")?;
            Ok(())
        }
        _ => bail!("provide --token, or --email and --password"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "roomshare=info");
    }
    pretty_env_logger::init();

    let cli = Cli::parse();
    let client = Roomshare::from_env().context("failed to configure client")?;
    sign_in(&client, &cli).await?;

    let notifier = Arc::new(LogNotifier);
    let roommates = client.roommates(notifier.clone());

    let ok = match &cli.command {
        Commands::Whoami => {
            let user = client.auth().get_user().await?;
            println!(
                "{}  {}  {}",
                user.id,
                user.email.as_deref().unwrap_or("-"),
                user.full_name().unwrap_or("-")
            );
            true
        }
        Commands::Roommates { action } => match action {
            RoommateAction::List => {
                let list = roommates.try_fetch_roommates().await?;
                if list.is_empty() {
                    println!("No roommates yet.");
                }
                for r in list {
                    println!("{}  {:<24} {:<32} {:>10.2}", r.id, r.name, r.email, r.balance);
                }
                true
            }
            RoommateAction::Add { email } => roommates.add_roommate(email).await,
            RoommateAction::Remove { id } => roommates.delete_roommate(*id).await,
            RoommateAction::Clear { yes } => {
                if !yes {
                    bail!("refusing to remove every roommate without --yes");
                }
                roommates.delete_all_my_roommates().await
            }
        },
        Commands::Remind { id } => {
            let list = roommates.try_fetch_roommates().await?;
            let Some(roommate) = list.into_iter().find(|r| r.id == *id) else {
                bail!("no roommate with id {}", id);
            };
            roommates.send_payment_reminder(&roommate).await
        }
        Commands::Events { action } => {
            let form = client.events(notifier);
            match action {
                EventAction::List => {
                    for e in form.try_fetch_events().await? {
                        println!("{}  {}  {:<12} {}", e.id, e.date, e.event_type, e.name);
                    }
                    true
                }
                EventAction::Add {
                    name,
                    date,
                    event_type,
                    notes,
                    id,
                } => {
                    let existing = match id {
                        Some(id) => {
                            let events = form.try_fetch_events().await?;
                            match events.into_iter().find(|e| e.id == *id) {
                                Some(event) => Some(event),
                                None => bail!("no event with id {}", id),
                            }
                        }
                        None => None,
                    };
                    let input = EventInput {
                        name: name.clone(),
                        date: date.clone(),
                        notes: notes.clone(),
                        event_type: event_type.clone(),
                    };
                    form.submit(&input, existing.as_ref()).await.is_some()
                }
            }
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
