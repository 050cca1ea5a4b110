//! Test and helper doubles for shade_core.
//!
//! All doubles share their state through `Arc<Mutex<..>>` handles so a test
//! can keep a clone after moving the double into a `Shade`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use shade_traits::{DistanceSensor, Encoder, HwResult, Light, MotionSensor, Motor, Rgbw};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Motor that records every duty it was asked for.
#[derive(Debug, Clone, Default)]
pub struct SpyMotor {
    duties: Arc<Mutex<Vec<i32>>>,
    fail: Arc<Mutex<bool>>,
}

impl SpyMotor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duties(&self) -> Vec<i32> {
        lock(&self.duties).clone()
    }

    pub fn last(&self) -> Option<i32> {
        lock(&self.duties).last().copied()
    }

    /// Make every following write fail.
    pub fn fail_writes(&self, fail: bool) {
        *lock(&self.fail) = fail;
    }
}

impl Motor for SpyMotor {
    fn set_duty(&mut self, duty: i32) -> HwResult<()> {
        if *lock(&self.fail) {
            return Err(Box::new(std::io::Error::other("motor driver offline")));
        }
        lock(&self.duties).push(duty);
        Ok(())
    }
}

/// Encoder fed by the test; each read drains what was queued.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEncoder {
    pending: Arc<Mutex<f64>>,
}

impl ScriptedEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, rotation: f64) {
        *lock(&self.pending) += rotation;
    }
}

impl Encoder for ScriptedEncoder {
    fn take_rotation(&mut self) -> HwResult<f64> {
        Ok(std::mem::take(&mut *lock(&self.pending)))
    }
}

/// Sensor that replays queued readings, then repeats a steady value.
///
/// A queued `None` becomes a read error.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSensor {
    queue: Arc<Mutex<VecDeque<Option<i32>>>>,
    steady: Arc<Mutex<i32>>,
}

impl ScriptedSensor {
    pub fn new(steady: i32) -> Self {
        let s = Self::default();
        s.set_steady(steady);
        s
    }

    pub fn set_steady(&self, value: i32) {
        *lock(&self.steady) = value;
    }

    pub fn push(&self, reading: Option<i32>) {
        lock(&self.queue).push_back(reading);
    }

    fn next(&self) -> HwResult<i32> {
        match lock(&self.queue).pop_front() {
            Some(Some(v)) => Ok(v),
            Some(None) => Err(Box::new(std::io::Error::other("sensor read failed"))),
            None => Ok(*lock(&self.steady)),
        }
    }
}

impl MotionSensor for ScriptedSensor {
    fn read(&mut self) -> HwResult<i32> {
        self.next()
    }
}

impl DistanceSensor for ScriptedSensor {
    fn read(&mut self) -> HwResult<i32> {
        self.next()
    }
}

/// Light that records every color it showed.
#[derive(Debug, Clone, Default)]
pub struct SpyLight {
    colors: Arc<Mutex<Vec<Rgbw>>>,
}

impl SpyLight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn colors(&self) -> Vec<Rgbw> {
        lock(&self.colors).clone()
    }

    pub fn last(&self) -> Option<Rgbw> {
        lock(&self.colors).last().copied()
    }
}

impl Light for SpyLight {
    fn set(&mut self, color: Rgbw) -> HwResult<()> {
        lock(&self.colors).push(color);
        Ok(())
    }
}
