//! Fixed-cadence control loop.
//!
//! Each iteration, in order: pending end-stop edge, queued inbound commands
//! and parameter updates, then one hardware tick. Notifications go out
//! best-effort; a slow consumer never stalls the loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};

use crate::builder::Shade;
use crate::command::{Inbound, Notification};
use crate::error::Result;

/// Where inbound commands come from.
pub trait CommandSource {
    /// Next inbound item due at or before `now_ms`, without blocking.
    fn poll(&mut self, now_ms: u64) -> Option<Inbound>;
}

impl CommandSource for Receiver<Inbound> {
    fn poll(&mut self, _now_ms: u64) -> Option<Inbound> {
        match self.try_recv() {
            Ok(inbound) => Some(inbound),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

/// A source with nothing to say.
impl CommandSource for () {
    fn poll(&mut self, _now_ms: u64) -> Option<Inbound> {
        None
    }
}

/// Where notifications go.
pub trait NotificationSink {
    fn publish(&mut self, notification: Notification);
}

impl NotificationSink for Sender<Notification> {
    fn publish(&mut self, notification: Notification) {
        match self.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(n)) => {
                tracing::trace!(topic = n.topic(), "notification channel full; dropped");
            }
            Err(TrySendError::Disconnected(n)) => {
                tracing::trace!(topic = n.topic(), "notification channel closed; dropped");
            }
        }
    }
}

impl NotificationSink for Vec<Notification> {
    fn publish(&mut self, notification: Notification) {
        self.push(notification);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RunParams {
    pub tick_ms: u64,
    /// Stop after this many ticks; `None` runs until shutdown.
    pub max_ticks: Option<u64>,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            tick_ms: 10,
            max_ticks: None,
        }
    }
}

/// Counters reported when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunStats {
    pub ticks: u64,
    pub commands: u64,
    pub notifications: u64,
    pub end_stops: u64,
    pub final_position: f64,
}

fn publish_all(sink: &mut impl NotificationSink, stats: &mut RunStats, batch: Vec<Notification>) {
    for n in batch {
        stats.notifications += 1;
        sink.publish(n);
    }
}

/// Run the shade until `shutdown` is set or `max_ticks` is reached.
///
/// The shade is brought online first and always taken offline on exit, also
/// when a hardware write fails.
pub fn run(
    shade: &mut Shade,
    source: &mut impl CommandSource,
    sink: &mut impl NotificationSink,
    params: RunParams,
    shutdown: &AtomicBool,
) -> Result<RunStats> {
    let result = run_inner(shade, source, sink, params, shutdown);
    match shade.shutdown() {
        Ok(batch) => {
            for n in batch {
                sink.publish(n);
            }
        }
        Err(e) => tracing::warn!(error = %e, "shutdown failed"),
    }
    let mut stats = result?;
    stats.final_position = shade.controller().state().position;
    tracing::info!(
        ticks = stats.ticks,
        commands = stats.commands,
        position = stats.final_position,
        "runner stopped"
    );
    Ok(stats)
}

fn run_inner(
    shade: &mut Shade,
    source: &mut impl CommandSource,
    sink: &mut impl NotificationSink,
    params: RunParams,
    shutdown: &AtomicBool,
) -> Result<RunStats> {
    let mut stats = RunStats::default();
    let period = Duration::from_micros(crate::util::period_us(params.tick_ms));
    let clock = shade.clock().clone();

    publish_all(sink, &mut stats, shade.start()?);
    tracing::info!(tick_ms = params.tick_ms, "runner started");

    loop {
        if shutdown.load(Ordering::Acquire) {
            tracing::info!("shutdown requested");
            break;
        }
        if params.max_ticks.is_some_and(|max| stats.ticks >= max) {
            break;
        }
        let started = clock.now();

        if let Some(batch) = shade.poll_end_stop()? {
            stats.end_stops += 1;
            publish_all(sink, &mut stats, batch);
        }

        let now = shade.now_ms();
        while let Some(inbound) = source.poll(now) {
            stats.commands += 1;
            publish_all(sink, &mut stats, shade.handle(inbound)?);
        }

        publish_all(sink, &mut stats, shade.tick()?);
        stats.ticks += 1;

        let spent = clock.now().saturating_duration_since(started);
        clock.sleep(period.saturating_sub(spent));
    }
    Ok(stats)
}
