//! Interactive CLI client for the Stationhub messaging hubs.
//!
//! Connects to one of the platform hubs and sends messages from stdin.
//! Displays a prompt, sends each line on Enter, and prints incoming
//! messages, history replays, and notifications as they arrive.
//! Disconnects recover automatically through the reconnect policy.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin stationhub-client -- --hub public --name Alice --token dev
//! cargo run --bin stationhub-client -- --hub train --room 5 -n Bob -t dev
//! ```

use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::{broadcast, mpsc};

use stationhub_client::formatter::MessageFormatter;
use stationhub_client::{ClientEvent, HubClient, HubProfile, RoomKey, StaticTokenProvider};
use stationhub_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "stationhub-client")]
#[command(about = "CLI client for the Stationhub real-time messaging hubs", long_about = None)]
struct Args {
    /// Hub to connect to: train, public, delivery, or notifications
    #[arg(short = 'H', long, default_value = "public")]
    hub: String,

    /// Room id (train id or delivery chat id) for the train/delivery hubs
    #[arg(short = 'r', long)]
    room: Option<i64>,

    /// Display name attached to outbound messages
    #[arg(short = 'n', long)]
    name: String,

    /// Access token for the hub connection
    #[arg(short = 't', long)]
    token: String,

    /// Base hub URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/hubs")]
    url: String,
}

/// Redisplay the prompt after printing incoming output
fn redisplay_prompt(name: &str) {
    print!("{}> ", name);
    std::io::stdout().flush().ok();
}

fn resolve_hub(args: &Args) -> Result<(HubProfile, RoomKey), String> {
    match args.hub.as_str() {
        "public" => Ok((HubProfile::public_chat(), RoomKey::Global)),
        "notifications" => Ok((HubProfile::notifications(), RoomKey::Global)),
        "train" => {
            let id = args.room.ok_or("--room is required for the train hub")?;
            Ok((HubProfile::train_chat(), RoomKey::Train(id)))
        }
        "delivery" => {
            let id = args.room.ok_or("--room is required for the delivery hub")?;
            Ok((HubProfile::delivery_chat(), RoomKey::Chat(id)))
        }
        other => Err(format!(
            "unknown hub '{}'; expected train, public, delivery, or notifications",
            other
        )),
    }
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let (profile, room) = match resolve_hub(&args) {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    let client = HubClient::builder(profile, args.url.clone())
        .token_provider(Arc::new(StaticTokenProvider::with_token(args.token.clone())))
        .sender_name(args.name.clone())
        .spawn();

    if let Err(e) = client.connect(room).await {
        tracing::error!("Failed to connect: {}", e);
        std::process::exit(1);
    }

    println!(
        "\nYou are '{}' on the {} hub. Type messages and press Enter to send. Press Ctrl+C to exit.\n",
        args.name, args.hub
    );

    // Print incoming events as they arrive
    let mut events = client.subscribe();
    let name_for_events = args.name.clone();
    let mut event_task = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ClientEvent::Message(message)) => {
                    print!("{}", MessageFormatter::format_message(&message));
                    redisplay_prompt(&name_for_events);
                }
                Ok(ClientEvent::History(messages)) => {
                    print!("{}", MessageFormatter::format_history(&messages));
                    redisplay_prompt(&name_for_events);
                }
                Ok(ClientEvent::Notification { name, payload }) => {
                    print!("{}", MessageFormatter::format_notification(&name, &payload));
                    redisplay_prompt(&name_for_events);
                }
                Ok(ClientEvent::ConnectionLimited { reason }) => {
                    print!("{}", MessageFormatter::format_connection_limited(&reason));
                    redisplay_prompt(&name_for_events);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Display fell behind; skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Rustyline is synchronous; run it on a blocking thread and forward
    // lines over a channel.
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    let prompt_name = args.name.clone();
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", prompt_name);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    let send_client = client.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(line) = input_rx.recv().await {
            if let Err(e) = send_client.send_message(line).await {
                tracing::warn!("Failed to send message: {}", e);
            }
        }
    });

    tokio::select! {
        _ = &mut event_task => {
            send_task.abort();
        }
        _ = &mut send_task => {
            event_task.abort();
        }
        _ = tokio::signal::ctrl_c() => {
            event_task.abort();
            send_task.abort();
        }
    }

    if let Err(e) = client.disconnect().await {
        tracing::debug!("Disconnect failed: {}", e);
    }
}
