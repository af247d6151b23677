use std::{
    sync::{Arc, Mutex as StdMutex},
    time::Duration,
};

use log::trace;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use super::{RevealSnapshot, RevealStatus, RevealStream, TickOutcome};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

struct Schedule {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

impl Schedule {
    fn stop(self) {
        self.cancel_token.cancel();
        self.handle.abort();
    }
}

/// Holds the running schedule. Dropping the last controller handle stops it.
#[derive(Default)]
struct TickerSlot {
    current: StdMutex<Option<Schedule>>,
}

impl TickerSlot {
    fn replace(&self, next: Option<Schedule>) {
        let mut guard = match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = std::mem::replace(&mut *guard, next) {
            previous.stop();
        }
    }
}

impl Drop for TickerSlot {
    fn drop(&mut self) {
        self.replace(None);
    }
}

/// Paces the display of an already complete text, one character per tick.
///
/// At most one schedule is alive per controller: `start` and `cancel` stop the
/// previous one, and ticks carry a generation number that is checked under the
/// state lock, so a tick that slipped past cancellation changes nothing.
#[derive(Clone)]
pub struct RevealController {
    name: Arc<str>,
    state: Arc<Mutex<RevealStream>>,
    ticker: Arc<TickerSlot>,
    updates: Arc<watch::Sender<RevealSnapshot>>,
}

impl RevealController {
    pub fn new(name: &str) -> Self {
        let (updates, _) = watch::channel(RevealSnapshot::default());
        Self {
            name: Arc::from(name),
            state: Arc::new(Mutex::new(RevealStream::new())),
            ticker: Arc::new(TickerSlot::default()),
            updates: Arc::new(updates),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Restarts the reveal with `final_text`. Whatever was being revealed
    /// before is dropped and the prefix is empty when this returns.
    pub async fn start(&self, final_text: impl Into<String>, cadence: Duration) -> RevealSnapshot {
        let final_text = final_text.into();

        // The schedule is swapped under the state lock so the running ticker
        // always belongs to the newest generation.
        let mut stream = self.state.lock().await;
        let generation = stream.begin(final_text, cadence);
        let snapshot = stream.snapshot();
        self.updates.send_replace(snapshot.clone());

        if snapshot.status == RevealStatus::Complete {
            self.ticker.replace(None);
            return snapshot;
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(reveal_loop(
            self.name.clone(),
            self.state.clone(),
            self.updates.clone(),
            generation,
            cadence,
            cancel_token.clone(),
        ));
        self.ticker.replace(Some(Schedule {
            handle,
            cancel_token,
        }));
        drop(stream);

        log_info!(
            "{} reveal started: {} chars every {:?}",
            self.name,
            snapshot.total_chars,
            cadence
        );
        snapshot
    }

    pub async fn cancel(&self) {
        let mut stream = self.state.lock().await;
        stream.cancel();
        self.updates.send_replace(stream.snapshot());
        self.ticker.replace(None);
    }

    pub async fn current_prefix(&self) -> String {
        self.state.lock().await.prefix().to_string()
    }

    pub async fn is_complete(&self) -> bool {
        self.state.lock().await.is_complete()
    }

    pub async fn status(&self) -> RevealStatus {
        self.state.lock().await.status
    }

    pub async fn snapshot(&self) -> RevealSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Receives a snapshot after every change.
    pub fn subscribe(&self) -> watch::Receiver<RevealSnapshot> {
        self.updates.subscribe()
    }
}

async fn reveal_loop(
    name: Arc<str>,
    state: Arc<Mutex<RevealStream>>,
    updates: Arc<watch::Sender<RevealSnapshot>>,
    generation: u64,
    cadence: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = time::interval_at(Instant::now() + cadence, cadence);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                break;
            }
            _ = ticker.tick() => {
                let mut stream = state.lock().await;
                match stream.advance(generation) {
                    TickOutcome::Advanced => {
                        updates.send_replace(stream.snapshot());
                    }
                    TickOutcome::Completed => {
                        updates.send_replace(stream.snapshot());
                        log_info!("{name} reveal complete");
                        break;
                    }
                    TickOutcome::Stale => {
                        trace!("{name} dropped stale reveal tick (generation {generation})");
                        break;
                    }
                }
            }
        }
    }
}
