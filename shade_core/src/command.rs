//! Remote commands in, change notifications out.
//!
//! Payloads are decoded once at the boundary into [`Command`]; the controller
//! matches on the enum and never sees raw text.

use std::fmt;

use shade_traits::Rgbw;

/// Direction of a manual `turn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// A decoded remote command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Short white flash so an operator can find the device.
    Ping,
    /// Flash at the configured flash intensity.
    Flash { duration_ms: u64 },
    /// Flash an explicit color.
    FlashColor { color: Rgbw, duration_ms: u64 },
    /// Manual drive at the manual duty until `stop`, `move` or `reset`.
    Turn(Direction),
    /// Seek to an absolute target.
    Move(f64),
    /// Halt and hold the current position.
    Stop,
    /// Recalibrate position to the given value.
    Reset(f64),
    /// Random steady color.
    Disco,
}

impl Command {
    /// Decode a topic and its payload.
    ///
    /// Returns `None` for unknown topics and for payloads that cannot carry
    /// their command (`move`/`reset` without a number, `turn` without a
    /// known direction). Numeric fields of `flash` and `flash-color` default
    /// to 0 when missing or malformed.
    pub fn decode(topic: &str, payload: &str) -> Option<Self> {
        let payload = payload.trim();
        let cmd = match topic {
            "ping" => Self::Ping,
            "flash" => Self::Flash {
                duration_ms: parse_ms(payload.split_whitespace().next()),
            },
            "flash-color" => {
                let fields = leading_ints::<5>(payload);
                Self::FlashColor {
                    color: Rgbw::new(fields[0], fields[1], fields[2], fields[3]),
                    duration_ms: u64::try_from(fields[4]).unwrap_or(0),
                }
            }
            "turn" => match payload {
                "up" => Self::Turn(Direction::Up),
                "down" => Self::Turn(Direction::Down),
                other => {
                    tracing::debug!(direction = other, "ignoring turn with unknown direction");
                    return None;
                }
            },
            "move" => Self::Move(parse_finite(topic, payload)?),
            "stop" => Self::Stop,
            "reset" => Self::Reset(parse_finite(topic, payload)?),
            "disco" => Self::Disco,
            other => {
                tracing::debug!(topic = other, "ignoring unknown topic");
                return None;
            }
        };
        Some(cmd)
    }

    /// Wire name of the command's topic.
    pub fn topic(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Flash { .. } => "flash",
            Self::FlashColor { .. } => "flash-color",
            Self::Turn(_) => "turn",
            Self::Move(_) => "move",
            Self::Stop => "stop",
            Self::Reset(_) => "reset",
            Self::Disco => "disco",
        }
    }
}

fn parse_ms(field: Option<&str>) -> u64 {
    field
        .and_then(|s| s.parse::<i64>().ok())
        .and_then(|v| u64::try_from(v).ok())
        .unwrap_or(0)
}

/// Parse up to `N` whitespace-separated integers, stopping at the first
/// malformed one; everything after it stays 0.
fn leading_ints<const N: usize>(payload: &str) -> [i32; N] {
    let mut out = [0; N];
    for (slot, field) in out.iter_mut().zip(payload.split_whitespace()) {
        match field.parse::<i32>() {
            Ok(v) => *slot = v,
            Err(_) => break,
        }
    }
    out
}

fn parse_finite(topic: &str, payload: &str) -> Option<f64> {
    match payload.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            tracing::debug!(topic, payload, "ignoring command with malformed number");
            None
        }
    }
}

/// Value carried by a parameter write-back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Double(f64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Double(d) => write!(f, "{d}"),
        }
    }
}

/// Change notification for the pub/sub layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notification {
    Motion(bool),
    Position(f64),
    Distance(i32),
    /// Request to persist a parameter (`automate`, `saved-position`).
    Param {
        key: &'static str,
        value: ParamValue,
    },
}

impl Notification {
    pub fn topic(&self) -> &'static str {
        match self {
            Self::Motion(_) => "motion",
            Self::Position(_) => "position",
            Self::Distance(_) => "distance",
            Self::Param { key, .. } => key,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Motion(m) => write!(f, "motion {m}"),
            Self::Position(p) => write!(f, "position {p}"),
            Self::Distance(d) => write!(f, "distance {d}"),
            Self::Param { key, value } => write!(f, "{key} {value}"),
        }
    }
}

/// Anything the runner feeds the controller between ticks.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Command(Command),
    /// Live parameter update, by its wire name.
    Param { key: String, value: String },
}

impl From<Command> for Inbound {
    fn from(c: Command) -> Self {
        Self::Command(c)
    }
}
