use std::{io, sync::Arc};

use anyhow::Result;
use billing_client::HttpApiClient;
use billing_dashboard::{
    config::AppConfig,
    dashboard::Dashboard,
    metrics_server,
    observability,
    runtime::{self, Services},
    terminal::{parse_command, Input, LiveInstance, TerminalCalendar, TerminalFrontend, HELP},
    Event,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tokio_stream::wrappers::ReceiverStream;

const INPUT_CAPACITY: usize = 16;

/// Read commands from stdin until EOF or `quit`.
fn spawn_input_reader(live: LiveInstance) -> mpsc::Receiver<Event> {
    let (tx, rx) = mpsc::channel(INPUT_CAPACITY);

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "failed to read stdin");
                    break;
                }
            };

            match parse_command(&line, live.get()) {
                Ok(Some(Input::Event(event))) => {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                Ok(Some(Input::Help)) => println!("{HELP}"),
                Ok(Some(Input::Quit)) => break,
                Ok(None) => {}
                Err(e) => eprintln!("{e}"),
            }
        }
    });

    rx
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let api = Arc::new(HttpApiClient::new(cfg.api.base_url.clone(), cfg.credentials())?);
    api.login().await?;
    tracing::info!(base_url = %api.base_url(), "billing dashboard started");

    let live = LiveInstance::default();
    let dashboard = Dashboard::new(
        TerminalFrontend::new(io::stdout()),
        TerminalCalendar::new(io::stdout(), live.clone()),
        cfg.billing.currency_label.clone(),
    );

    println!("{HELP}");
    let inputs = ReceiverStream::new(spawn_input_reader(live));
    runtime::run(dashboard, Services::new(api), inputs).await?;

    Ok(())
}
