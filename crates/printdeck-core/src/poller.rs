// ── Status poller ──
//
// Follows the registry's active printer and reads its status on a fixed
// cadence. One poll cycle is live at a time; switching printers cancels the
// old cycle and any read that resolves for a printer that is no longer
// active is dropped.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use printdeck_api::DeviceConnector;

use crate::error::CoreError;
use crate::model::{LiveStatus, ProfileId};
use crate::registry::{Registry, RegistryState};
use crate::stream::StatusStream;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1500);
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

// ── PollState ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling { device_id: ProfileId },
}

// ── StatusPoller ─────────────────────────────────────────────────

/// Recurring status reads against the active printer.
///
/// Cheaply cloneable via `Arc`. Call [`start()`](Self::start) from within a
/// tokio runtime; [`stop()`](Self::stop) cancels everything and waits for
/// the background tasks.
#[derive(Clone)]
pub struct StatusPoller {
    inner: Arc<PollerInner>,
}

struct PollerInner {
    registry: Registry,
    connector: DeviceConnector,
    interval: Duration,
    status: watch::Sender<Arc<LiveStatus>>,
    state: watch::Sender<PollState>,
    cycle: Mutex<Option<PollCycle>>,
    supervisor: Mutex<Option<Supervisor>>,
}

/// The live poll loop for one printer.
struct PollCycle {
    target: ProfileId,
    cancel: CancellationToken,
    in_flight: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

struct Supervisor {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl StatusPoller {
    pub fn new(registry: Registry, connector: DeviceConnector, interval: Duration) -> Self {
        let (status, _) = watch::channel(Arc::new(LiveStatus::default()));
        let (state, _) = watch::channel(PollState::Idle);
        Self {
            inner: Arc::new(PollerInner {
                registry,
                connector,
                interval: interval.max(MIN_POLL_INTERVAL),
                status,
                state,
                cycle: Mutex::new(None),
                supervisor: Mutex::new(None),
            }),
        }
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Begin following the active printer. Idempotent.
    pub fn start(&self) {
        let mut supervisor = lock(&self.inner.supervisor);
        if supervisor.is_some() {
            return;
        }
        let cancel = CancellationToken::new();
        let registry_rx = self.inner.registry.subscribe();
        let handle = tokio::spawn(supervise(self.clone(), registry_rx, cancel.clone()));
        *supervisor = Some(Supervisor { cancel, handle });
        info!(interval = ?self.inner.interval, "status poller started");
    }

    /// Stop polling and wait for the background tasks to exit.
    /// Reads already in flight finish on their own and are discarded.
    pub async fn stop(&self) {
        let supervisor = lock(&self.inner.supervisor).take();
        if let Some(supervisor) = supervisor {
            supervisor.cancel.cancel();
            let _ = supervisor.handle.await;
            info!("status poller stopped");
        }
    }

    // ── Observation ──────────────────────────────────────────────

    pub fn state(&self) -> PollState {
        self.inner.state.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<PollState> {
        self.inner.state.subscribe()
    }

    /// Latest status snapshot.
    pub fn status(&self) -> Arc<LiveStatus> {
        self.inner.status.borrow().clone()
    }

    pub fn subscribe(&self) -> StatusStream {
        StatusStream::new(self.inner.status.subscribe())
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Read the active printer's status now, outside the regular cadence.
    ///
    /// Counts as an in-flight read for the live cycle, so a tick that fires
    /// meanwhile is skipped. Failures are logged, never returned.
    pub async fn refresh_now(&self) {
        let Some(target) = self.inner.registry.active_id() else {
            debug!("no active printer, skipping refresh");
            return;
        };

        let (cancel, guard) = {
            let cycle = lock(&self.inner.cycle);
            match cycle.as_ref().filter(|c| c.target == target) {
                Some(c) => (c.cancel.clone(), Some(InFlight::acquire(&c.in_flight))),
                None => (CancellationToken::new(), None),
            }
        };

        self.read(&target, &cancel).await;
        drop(guard);
    }

    /// Fetch printer and job status concurrently and fold whatever parsed
    /// into the live status.
    async fn read(&self, target: &ProfileId, cancel: &CancellationToken) {
        let Some(profile) = self.inner.registry.get(target) else {
            return;
        };
        let client = match profile.connect(&self.inner.connector) {
            Ok(client) => client,
            Err(e) => {
                report(target, "printer", &e);
                return;
            }
        };

        let (printer, job) = tokio::join!(client.printer_status(), client.job_status());

        if cancel.is_cancelled() || self.inner.registry.active_id().as_ref() != Some(target) {
            debug!(device = %target, "discarding status read for inactive printer");
            return;
        }

        let printer = printer
            .map_err(|e| report(target, "printer", &CoreError::from(e)))
            .ok();
        let job = job
            .map_err(|e| report(target, "job", &CoreError::from(e)))
            .ok();
        if printer.is_none() && job.is_none() {
            return;
        }

        let now = Utc::now();
        let registry = &self.inner.registry;
        self.inner.status.send_if_modified(|status| {
            // Re-checked under the status lock: a switch may have landed
            // since the check above.
            if registry.active_id().as_ref() != Some(target) {
                return false;
            }
            let status = Arc::make_mut(status);
            if status.device_id.as_ref() != Some(target) {
                *status = LiveStatus::for_device(Some(target.clone()));
            }
            if let Some(printer) = printer {
                status.printer = Some(printer);
                status.printer_updated_at = Some(now);
            }
            if let Some(job) = job {
                status.job = Some(job);
                status.job_updated_at = Some(now);
            }
            true
        });
    }

    // ── Cycle management ─────────────────────────────────────────

    /// Make the live cycle match `active`: cancel a cycle for any other
    /// printer, reset the exposed status, and start a fresh cycle.
    fn follow(&self, active: Option<ProfileId>) {
        let mut cycle = lock(&self.inner.cycle);
        if cycle.as_ref().map(|c| &c.target) == active.as_ref() {
            return;
        }
        if let Some(old) = cycle.take() {
            old.cancel.cancel();
            debug!(device = %old.target, "poll cycle cancelled");
        }

        self.inner
            .status
            .send_replace(Arc::new(LiveStatus::for_device(active.clone())));

        match active {
            Some(target) => {
                let cancel = CancellationToken::new();
                let in_flight = Arc::new(AtomicUsize::new(0));
                let handle = tokio::spawn(run_cycle(
                    self.clone(),
                    target.clone(),
                    cancel.clone(),
                    Arc::clone(&in_flight),
                ));
                info!(device = %target, "polling printer");
                self.inner.state.send_replace(PollState::Polling {
                    device_id: target.clone(),
                });
                *cycle = Some(PollCycle {
                    target,
                    cancel,
                    in_flight,
                    handle,
                });
            }
            None => {
                info!("no active printer, polling idle");
                self.inner.state.send_replace(PollState::Idle);
            }
        }
    }

    /// Cancel the live cycle, returning its task handle.
    fn end_cycle(&self) -> Option<JoinHandle<()>> {
        let cycle = lock(&self.inner.cycle).take()?;
        cycle.cancel.cancel();
        self.inner.state.send_replace(PollState::Idle);
        Some(cycle.handle)
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Track the registry's active id and keep one cycle pointed at it.
async fn supervise(
    poller: StatusPoller,
    mut registry_rx: watch::Receiver<RegistryState>,
    cancel: CancellationToken,
) {
    loop {
        let active = registry_rx
            .borrow_and_update()
            .active()
            .map(|p| p.id.clone());
        poller.follow(active);

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = registry_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    if let Some(handle) = poller.end_cycle() {
        let _ = handle.await;
    }
}

/// Tick at the poller's cadence, starting immediately. Each tick spawns a
/// read unless one is still in flight.
async fn run_cycle(
    poller: StatusPoller,
    target: ProfileId,
    cancel: CancellationToken,
    in_flight: Arc<AtomicUsize>,
) {
    let mut ticker = tokio::time::interval(poller.inner.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if let Some(guard) = InFlight::try_acquire(&in_flight) {
                    let poller = poller.clone();
                    let target = target.clone();
                    let cancel = cancel.clone();
                    tokio::spawn(async move {
                        poller.read(&target, &cancel).await;
                        drop(guard);
                    });
                } else {
                    debug!(device = %target, "read still in flight, skipping tick");
                }
            }
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Holds one slot of a cycle's in-flight counter until dropped.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    /// Claim the counter only if nothing is in flight.
    fn try_acquire(counter: &Arc<AtomicUsize>) -> Option<Self> {
        counter
            .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(counter)))
    }

    fn acquire(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

fn report(target: &ProfileId, half: &str, err: &CoreError) {
    warn!(
        device = %target,
        kind = ?err.failure_kind(),
        error = %err,
        "{half} status read failed"
    );
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn in_flight_counter() {
        let counter = Arc::new(AtomicUsize::new(0));
        let first = InFlight::try_acquire(&counter);
        assert!(first.is_some());
        assert!(InFlight::try_acquire(&counter).is_none());

        let refresh = InFlight::acquire(&counter);
        drop(first);
        assert!(InFlight::try_acquire(&counter).is_none());
        drop(refresh);
        assert!(InFlight::try_acquire(&counter).is_some());
    }

    #[test]
    fn interval_has_a_floor() {
        let connector = DeviceConnector::new(&printdeck_api::TransportConfig::default()).unwrap();
        let poller = StatusPoller::new(Registry::in_memory(), connector, Duration::ZERO);
        assert_eq!(poller.interval(), MIN_POLL_INTERVAL);
        assert_eq!(poller.state(), PollState::Idle);
    }
}
