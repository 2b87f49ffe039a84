use chrono::{Duration as ChronoDuration, Local, NaiveDateTime};
use log::warn;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use super::gateway::{SmsGateway, SmsMessage};
use crate::config::settings::SmsSettings;
use crate::controller::state::ControllerState;

/// One-shot respond callback handed from the bridge to the scheduler.
/// Captures the matched requester numbers; the scheduler supplies the
/// snapshot at invocation time.
pub type RespondFn =
    Box<dyn FnOnce(ControllerState) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

/// Background bridge that watches the SMS inbox for stats requests.
///
/// Runs for the process lifetime; there is no cancellation. At most one
/// respond callback is pending at a time, later offers are dropped until the
/// scheduler drains the channel.
pub struct SmsRequester {
    rx: mpsc::Receiver<RespondFn>,
}

impl SmsRequester {
    pub fn spawn(gateway: Arc<dyn SmsGateway>, settings: SmsSettings) -> Self {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(run_loop(gateway, settings, tx));
        Self { rx }
    }

    /// Waits for the next pending respond callback.
    pub async fn recv(&mut self) -> Option<RespondFn> {
        self.rx.recv().await
    }
}

async fn run_loop(gateway: Arc<dyn SmsGateway>, settings: SmsSettings, tx: mpsc::Sender<RespondFn>) {
    let mut ticker = interval(Duration::from_secs(settings.lookup_interval_seconds));
    // list_recent can block past the tick, don't burst afterwards
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let lookback = ChronoDuration::seconds(settings.lookback_seconds as i64);

    loop {
        ticker.tick().await;

        let messages = match gateway.list_recent().await {
            Ok(messages) => messages,
            Err(e) => {
                warn!("failed to list inbound SMS: {}", e);
                continue;
            }
        };

        let numbers = match_requesters(&messages, Local::now().naive_local(), lookback, &settings.trigger);
        if numbers.is_empty() {
            continue;
        }

        offer(&tx, make_respond(gateway.clone(), numbers));
    }
}

/// Distinct numbers that asked for stats within the lookback window.
/// Overlapping requests collapse into one batched response.
fn match_requesters(
    messages: &[SmsMessage],
    now: NaiveDateTime,
    lookback: ChronoDuration,
    trigger: &str,
) -> Vec<String> {
    let mut numbers: Vec<String> = Vec::new();
    for msg in messages {
        if now - msg.received_at <= lookback
            && msg.body.contains(trigger)
            && !numbers.contains(&msg.number)
        {
            numbers.push(msg.number.clone());
        }
    }
    numbers
}

/// Non-blocking handoff to the scheduler. A full channel means the scheduler
/// has not drained the previous callback yet; the offer is dropped.
fn offer(tx: &mpsc::Sender<RespondFn>, respond: RespondFn) {
    match tx.try_send(respond) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!("detected a slow reader for sms requester notification");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            warn!("sms requester channel closed, dropping stats request");
        }
    }
}

fn make_respond(gateway: Arc<dyn SmsGateway>, numbers: Vec<String>) -> RespondFn {
    Box::new(move |state: ControllerState| {
        Box::pin(async move {
            if let Err(e) = gateway.send(&numbers, &state.to_string()).await {
                warn!(
                    "failed to answer stats request from {}: {}",
                    numbers.join(","),
                    e
                );
            }
        })
    })
}
