use clap::{Parser, Subcommand};
use signsos_capture::{
    ApiClient, LogPresenter, Notifier, PredictionService, Presenter, ReplaySource, Session,
};
use signsos_landmarks::ONE_HAND_LEN;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "signsos-capture")]
#[command(about = "Streams hand landmarks to the SignSOS prediction server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Prediction server base URL
    #[arg(long, env = "SIGNSOS_SERVER_URL", default_value = "http://127.0.0.1:8000")]
    server: String,

    /// Request timeout in milliseconds
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Check server liveness once
    Health,

    /// Send one zeroed single-hand capture and print the reply
    Probe,

    /// Run the capture loop
    Run {
        /// JSON-lines file of recorded captures
        #[arg(long, value_name = "FILE")]
        replay: PathBuf,

        /// Restart the replay when it ends
        #[arg(long = "loop")]
        looping: bool,

        /// Minimum time between prediction requests in milliseconds
        #[arg(long, default_value_t = 250)]
        interval_ms: u64,

        /// Frame period in milliseconds
        #[arg(long, default_value_t = 33)]
        tick_ms: u64,

        /// Forward confident labels to this audio backend URL
        #[arg(long, env = "SIGNSOS_NOTIFY_URL")]
        notify_url: Option<String>,

        /// Minimum confidence before a label is forwarded
        #[arg(long, default_value_t = 0.85)]
        notify_threshold: f32,

        /// User id sent with forwarded labels
        #[arg(long, default_value = "demo-user")]
        user_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let timeout = Duration::from_millis(cli.timeout_ms);
    let client = ApiClient::new(&cli.server, timeout)?;

    match cli.command {
        Command::Health => {
            let health = client.health().await?;
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
        Command::Probe => {
            let prediction = client.predict(vec![0.0; ONE_HAND_LEN]).await?;
            println!("{} ({:.1}%)", prediction.label, prediction.confidence * 100.0);
            let mut scores: Vec<_> = prediction.scores.into_iter().collect();
            scores.sort_by(|a, b| b.1.total_cmp(&a.1));
            for (label, score) in scores {
                println!("  {label:<12} {score:.4}");
            }
        }
        Command::Run {
            replay,
            looping,
            interval_ms,
            tick_ms,
            notify_url,
            notify_threshold,
            user_id,
        } => {
            let source = ReplaySource::open(&replay, looping)?;
            tracing::info!(
                path = %replay.display(),
                frames = source.len(),
                server = %client.base_url(),
                "Starting capture loop"
            );

            let mut session = Session::new(
                source,
                Arc::new(client),
                Duration::from_millis(interval_ms),
            );
            if let Some(url) = notify_url {
                let notifier = Notifier::new(url, user_id, notify_threshold, timeout)?;
                session = session.with_notifier(Arc::new(notifier));
            }

            session.check_health().await;
            tracing::info!("Type h + Enter to re-check the server, q + Enter to quit");

            let mut presenter = LogPresenter::default();
            let mut ticker = tokio::time::interval(Duration::from_millis(tick_ms.max(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut stdin = BufReader::new(tokio::io::stdin()).lines();
            let mut stdin_open = true;

            loop {
                tokio::select! {
                    now = ticker.tick() => {
                        match session.tick(now).await? {
                            Some(view) => presenter.render(&view),
                            None => {
                                tracing::info!("Replay finished");
                                break;
                            }
                        }
                    }
                    line = stdin.next_line(), if stdin_open => {
                        match line? {
                            Some(line) => match line.trim() {
                                "h" => session.request_health_check(),
                                "q" => break,
                                _ => {}
                            },
                            None => stdin_open = false,
                        }
                    }
                }
            }

            session.settle().await;
        }
    }

    Ok(())
}
