//! cambiatus-client: the member dashboard as a line-oriented process.
//!
//! Commands are read from stdin, one per line. Every processed message
//! prints the current dashboard view to stdout as one JSON line; logs go to
//! stderr.

use std::io::Write as _;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};

use cambiatus_client::balance::BalanceClient;
use cambiatus_client::commands::{self, Command};
use cambiatus_client::events::{self, EventBus};
use cambiatus_client::graphql::GraphQlClient;
use cambiatus_client::signer::SignerBridge;
use cambiatus_client::{ClientConfig, LiveServices, Runtime};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = ClientConfig::load()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("cambiatus={}", config.advanced.log_level).parse()?),
        )
        .init();

    info!("Cambiatus client starting");

    // 2. Build context and services
    let ctx = config.context()?;
    let http = reqwest::Client::new();
    let services = Arc::new(LiveServices::new(
        GraphQlClient::new(http.clone(), config.api.graphql_url.clone()),
        BalanceClient::new(http, config.api.balance_url.clone()),
        SignerBridge::new(config.signer_socket()),
    ));

    // 3. Create event bus and print views as they are published
    let event_bus = EventBus::new(config.advanced.event_buffer);
    let mut event_rx = event_bus.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(event) => {
                    let line = match event.event_type.as_str() {
                        events::VIEW_UPDATED => event.payload.to_string(),
                        events::COPY_TO_CLIPBOARD => {
                            serde_json::json!({ "clipboard": event.payload["text"] }).to_string()
                        }
                        _ => continue,
                    };
                    let mut stdout = std::io::stdout().lock();
                    if writeln!(stdout, "{line}").is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "view printer lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // 4. Create shutdown and input channels
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let (input_tx, input_rx) = mpsc::unbounded_channel();

    // 5. Read commands from stdin
    let stdin_shutdown = shutdown_tx.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    error!("stdin error: {}", e);
                    break;
                }
            };
            match commands::parse(&line) {
                Ok(Command::Apply(msgs)) => {
                    for msg in msgs {
                        if input_tx.send(msg).is_err() {
                            return;
                        }
                    }
                }
                Ok(Command::Quit) => break,
                Err(commands::CommandError::Empty) => {}
                Err(e) => warn!("{}", e),
            }
        }
        let _ = stdin_shutdown.send(());
    });

    // 6. Start the runtime
    let (mut runtime, effects) = Runtime::new(ctx, services, event_bus);
    runtime.start(effects);

    // 7. Run until shutdown
    tokio::select! {
        result = runtime.run(input_rx, shutdown_rx) => {
            if let Err(e) = result {
                error!("runtime error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    printer.abort();
    info!("Cambiatus client stopped");
    Ok(())
}
