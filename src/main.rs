use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};

use solarmon::config::Settings;
use solarmon::controller::{RenogyController, RtuTransport};
use solarmon::sinks::{self, CsvLogSink, SmsAlertSink, StateSink, TerminalSink};
use solarmon::sms::{SmsGateway, SmsRequester, TermuxGateway};

/// Monitors a solar charge controller and reports over CSV, terminal and SMS.
#[derive(Parser, Debug)]
#[command(name = "solarmon", version, about)]
struct Args {
    /// CSV file the controller state is appended to
    csv_path: PathBuf,

    /// Phone numbers that receive periodic SMS alerts
    alert_numbers: Vec<String>,

    /// Optional TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port of the charge controller
    #[arg(long)]
    port: Option<String>,

    /// Serial baud rate
    #[arg(long)]
    baud: Option<u32>,

    /// Seconds between controller polls
    #[arg(long)]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };

    if let Some(port) = &args.port {
        settings.serial.port = port.clone();
    }
    if let Some(baud) = args.baud {
        settings.serial.baud_rate = baud;
    }
    if let Some(secs) = args.interval {
        settings.update_interval_seconds = secs;
    }

    run(settings, args).await
}

async fn run(settings: Settings, args: Args) -> Result<()> {
    info!("🌞 solarmon {} starting", solarmon::VERSION);

    let gateway: Arc<dyn SmsGateway> = Arc::new(TermuxGateway::new());

    let csv_sink = CsvLogSink::new(&args.csv_path)
        .with_context(|| format!("failed to open CSV log {}", args.csv_path.display()))?;

    let mut sinks: Vec<Box<dyn StateSink>> = vec![Box::new(csv_sink), Box::new(TerminalSink)];

    if !args.alert_numbers.is_empty() {
        info!("📨 SMS alerts to {}", args.alert_numbers.join(","));
        sinks.push(Box::new(SmsAlertSink::new(
            gateway.clone(),
            args.alert_numbers.clone(),
            Duration::from_secs(settings.sms.alert_interval_minutes * 60),
        )));
    }

    let transport =
        RtuTransport::connect(&settings.serial).context("failed to connect to charge controller")?;
    let mut controller = RenogyController::new(transport);

    let mut requester = SmsRequester::spawn(gateway, settings.sms.clone());

    let mut ticker = interval(Duration::from_secs(settings.update_interval_seconds));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        "⏱️  Polling every {}s, logging to {}",
        settings.update_interval_seconds,
        args.csv_path.display()
    );

    // One event at a time: a poll cycle, a pending stats request, or Ctrl-C.
    // update() blocks the loop for at most the transport timeout.
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = controller.update().await {
                    warn!("failed to update controller state: {}", e);
                    continue;
                }
                let state = controller.state();
                sinks::deliver_all(&mut sinks, &state).await;
            }
            respond = requester.recv() => {
                match respond {
                    Some(respond) => respond(controller.state()).await,
                    None => {
                        warn!("sms requester channel closed");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("🛑 Shutting down");
                break;
            }
        }
    }

    sinks::close_all(&mut sinks).await;
    if let Err(e) = controller.close().await {
        warn!("failed to close controller transport: {}", e);
    }

    Ok(())
}
