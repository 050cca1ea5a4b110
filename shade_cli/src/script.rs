//! Timed command scripts for simulated runs.
//!
//! One entry per line: `<at_ms> <topic> [payload]`. Besides the wire
//! commands, `param <key> <value>` updates a parameter and the `sim.*`
//! topics poke the simulated plant:
//!
//! ```text
//! # raise the shade, then let someone walk in
//! 0     move 40
//! 1500  sim.presence on
//! 4000  sim.distance 520
//! 6000  sim.endstop
//! ```

use std::collections::VecDeque;

use eyre::{Result, eyre};
use shade_core::{Command, CommandSource, EndStopLatch, Inbound};
use shade_hardware::{SimulatedDistance, SimulatedPresence};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Inbound(Inbound),
    Presence(bool),
    Distance(i32),
    EndStop,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub at_ms: u64,
    pub action: Action,
}

fn parse_action(topic: &str, payload: &str) -> Option<Action> {
    match topic {
        "param" => {
            let (key, value) = payload.split_once(char::is_whitespace)?;
            Some(Action::Inbound(Inbound::Param {
                key: key.to_string(),
                value: value.trim().to_string(),
            }))
        }
        "sim.presence" => match payload {
            "on" => Some(Action::Presence(true)),
            "off" => Some(Action::Presence(false)),
            _ => None,
        },
        "sim.distance" => payload.parse().ok().map(Action::Distance),
        "sim.endstop" => Some(Action::EndStop),
        _ => Command::decode(topic, payload).map(|c| Action::Inbound(c.into())),
    }
}

/// Parse a script; entries come back ordered by time, file order kept on ties.
pub fn parse(text: &str) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let lineno = idx + 1;
        let mut parts = line.splitn(3, char::is_whitespace);
        let at_ms = parts
            .next()
            .and_then(|t| t.parse::<u64>().ok())
            .ok_or_else(|| eyre!("script line {lineno}: expected a time in ms"))?;
        let topic = parts
            .next()
            .ok_or_else(|| eyre!("script line {lineno}: missing topic"))?;
        let payload = parts.next().unwrap_or("").trim();
        let action = parse_action(topic, payload)
            .ok_or_else(|| eyre!("script line {lineno}: cannot use {topic:?} {payload:?}"))?;
        entries.push(Entry { at_ms, action });
    }
    entries.sort_by_key(|e| e.at_ms);
    Ok(entries)
}

/// Handles the script pokes when running on the simulated plant.
#[derive(Debug, Clone, Default)]
pub struct SimHandles {
    pub presence: Option<SimulatedPresence>,
    pub distance: Option<SimulatedDistance>,
    pub end_stop: Option<EndStopLatch>,
}

/// Feeds script entries to the runner as their time comes up.
#[derive(Debug)]
pub struct ScriptSource {
    pending: VecDeque<Entry>,
    sim: SimHandles,
}

impl ScriptSource {
    pub fn new(entries: Vec<Entry>, sim: SimHandles) -> Self {
        Self {
            pending: entries.into(),
            sim,
        }
    }

    /// Time of the last entry, 0 for an empty script.
    pub fn last_at_ms(&self) -> u64 {
        self.pending.back().map_or(0, |e| e.at_ms)
    }

    fn poke(&self, action: &Action) {
        let sim = &self.sim;
        match action {
            Action::Presence(on) => {
                if let Some(p) = &sim.presence {
                    p.set_present(*on);
                    return;
                }
            }
            Action::Distance(d) => {
                if let Some(s) = &sim.distance {
                    s.set(*d);
                    return;
                }
            }
            Action::EndStop => {
                if let Some(l) = &sim.end_stop {
                    l.trigger();
                    return;
                }
            }
            Action::Inbound(_) => return,
        }
        tracing::warn!(?action, "no simulated device for script entry");
    }
}

impl CommandSource for ScriptSource {
    fn poll(&mut self, now_ms: u64) -> Option<Inbound> {
        while self.pending.front().is_some_and(|e| e.at_ms <= now_ms) {
            let entry = self.pending.pop_front()?;
            match entry.action {
                Action::Inbound(inbound) => {
                    tracing::debug!(at_ms = entry.at_ms, now_ms, ?inbound, "script");
                    return Some(inbound);
                }
                action => self.poke(&action),
            }
        }
        None
    }
}
