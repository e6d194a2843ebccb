//! Replay a trace against a fresh host binding.
//!
//! The driver loop mirrors what the JavaScript shim does in a browser: wait
//! for whichever comes first, the next recorded event or the binding's next
//! timer deadline, feed it in and write out the resulting actions.
//!
//! The same loop runs against [`stayframe_harness::SimEnv`] (sleeps advance a
//! virtual clock, so the replay finishes instantly) and [`crate::SystemEnv`]
//! (sleeps take wall-clock time).

use std::{io::Write, time::Duration};

use serde::Serialize;
use stayframe_core::Environment;
use stayframe_host::{EmbedBinding, HostAction, HostEvent};

use crate::{
    CliError,
    trace::{RecordedEvent, Trace},
};

/// Timer ticks processed after the last event before giving up.
pub const MAX_DRAIN_TICKS: usize = 64;

/// One line of replay output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplayLine<'a> {
    at_ms: u64,
    host: &'a HostAction,
}

/// Final binding state after a replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Recorded events fed to the binding.
    pub events: usize,
    /// Timer ticks the replay generated.
    pub ticks: usize,
    /// Actions written.
    pub actions: usize,
    /// Height the binding last applied.
    pub height: u32,
    /// Minimum height for the final viewport.
    pub min_height: u32,
    /// Whether the height was stable at the end.
    pub stable: bool,
}

struct Replay<'w, E: Environment, W: Write> {
    env: E,
    start: E::Instant,
    binding: EmbedBinding<E>,
    out: &'w mut W,
    ticks: usize,
    actions: usize,
}

/// Replay `trace` in `env`, writing one JSON line per host action to `out`.
///
/// Each line is `{"atMs": <ms since attach>, "host": <action>}`.
pub async fn replay<E: Environment, W: Write>(
    env: E,
    trace: &Trace,
    out: &mut W,
) -> Result<ReplaySummary, CliError> {
    trace.validate()?;

    let start = env.now();
    let (binding, attach) = EmbedBinding::new(env.clone(), &trace.config, trace.viewport_width)?;
    let mut replay = Replay { env, start, binding, out, ticks: 0, actions: 0 };
    replay.emit(&attach)?;

    for (index, entry) in trace.events.iter().enumerate() {
        let at = start + Duration::from_millis(entry.at_ms);
        replay.run_timers_until(at).await?;
        replay.sleep_until(at).await;

        tracing::debug!(index, at_ms = entry.at_ms, event = ?entry.event, "replaying event");
        let actions = replay.apply(index, &entry.event)?;
        replay.emit(&actions)?;
    }

    replay.drain().await?;
    replay.out.flush()?;

    let summary = ReplaySummary {
        events: trace.events.len(),
        ticks: replay.ticks,
        actions: replay.actions,
        height: replay.binding.height(),
        min_height: replay.binding.min_height(),
        stable: replay.binding.is_stable(),
    };
    Ok(summary)
}

impl<E: Environment, W: Write> Replay<'_, E, W> {
    fn apply(&mut self, index: usize, event: &RecordedEvent) -> Result<Vec<HostAction>, CliError> {
        if let Some(host_event) = event.host_event(index)? {
            return Ok(self.binding.handle(host_event));
        }

        let actions = match event {
            RecordedEvent::Key { key } => self.binding.key_down(key),
            RecordedEvent::UpdateHeight { height } => self.binding.update_height(*height),
            RecordedEvent::RequestHeight => self.binding.request_height(),
            RecordedEvent::Reload => self.binding.reload(),
            RecordedEvent::Debug { enabled } => self.binding.set_debug_mode(*enabled),
            RecordedEvent::ResetStability => self.binding.reset_stability(),
            _ => Vec::new(),
        };
        Ok(actions)
    }

    /// Fire every timer due at or before `until`, in deadline order.
    async fn run_timers_until(&mut self, until: E::Instant) -> Result<(), CliError> {
        while let Some(deadline) = self.binding.next_deadline() {
            if deadline > until {
                break;
            }
            self.tick_at(deadline).await?;
        }
        Ok(())
    }

    /// Let outstanding timers run out after the last event.
    async fn drain(&mut self) -> Result<(), CliError> {
        for _ in 0..MAX_DRAIN_TICKS {
            let Some(deadline) = self.binding.next_deadline() else {
                return Ok(());
            };
            self.tick_at(deadline).await?;
        }
        tracing::warn!(limit = MAX_DRAIN_TICKS, "timers still pending after replay, stopping");
        Ok(())
    }

    async fn tick_at(&mut self, deadline: E::Instant) -> Result<(), CliError> {
        self.sleep_until(deadline).await;
        self.ticks += 1;
        let actions = self.binding.handle(HostEvent::Tick);
        self.emit(&actions)
    }

    async fn sleep_until(&self, at: E::Instant) {
        let now = self.env.now();
        if at > now {
            self.env.sleep(at - now).await;
        }
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from((self.env.now() - self.start).as_millis()).unwrap_or(u64::MAX)
    }

    fn emit(&mut self, actions: &[HostAction]) -> Result<(), CliError> {
        let at_ms = self.elapsed_ms();
        for host in actions {
            serde_json::to_writer(&mut *self.out, &ReplayLine { at_ms, host })
                .map_err(std::io::Error::from)?;
            self.out.write_all(b"\n")?;
        }
        self.actions += actions.len();
        Ok(())
    }
}
