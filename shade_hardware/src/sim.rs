//! Simulated plant and sensors.
//!
//! `SimulatedPlant` models the winding shaft: the drive sets a duty, time
//! passes on the shared clock, and the encoder reports the rotations that
//! duty produced since the last read. Sensors are scripted through cheap
//! cloneable handles.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use shade_traits::{
    Clock, DistanceSensor, Encoder, HwResult, Light, MotionSensor, Motor, Rgbw,
};

/// Largest duty the simulated driver accepts.
const FULL_DUTY: f64 = 1023.0;

#[derive(Debug)]
struct Shaft {
    duty: i32,
    last_update: Instant,
    /// Rotations produced but not yet read by the encoder.
    pending: f64,
    /// Rotations produced since the plant was created.
    total: f64,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared shaft state behind the simulated drive and encoder.
#[derive(Clone)]
pub struct SimulatedPlant {
    shaft: Arc<Mutex<Shaft>>,
    clock: Arc<dyn Clock + Send + Sync>,
    revs_per_sec: f64,
    invert: bool,
}

impl core::fmt::Debug for SimulatedPlant {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimulatedPlant")
            .field("revs_per_sec", &self.revs_per_sec)
            .field("invert", &self.invert)
            .field("duty", &self.duty())
            .finish()
    }
}

impl SimulatedPlant {
    /// `revs_per_sec` is the shaft speed at full duty. With `invert`, the
    /// encoder reports rotations with the opposite sign, matching an encoder
    /// mounted the other way round.
    pub fn new(clock: Arc<dyn Clock + Send + Sync>, revs_per_sec: f64, invert: bool) -> Self {
        let now = clock.now();
        Self {
            shaft: Arc::new(Mutex::new(Shaft {
                duty: 0,
                last_update: now,
                pending: 0.0,
                total: 0.0,
            })),
            clock,
            revs_per_sec,
            invert,
        }
    }

    pub fn drive(&self) -> SimulatedDrive {
        SimulatedDrive {
            plant: self.clone(),
        }
    }

    pub fn encoder(&self) -> SimulatedEncoder {
        SimulatedEncoder {
            plant: self.clone(),
        }
    }

    /// Duty currently applied.
    pub fn duty(&self) -> i32 {
        lock(&self.shaft).duty
    }

    /// Shaft rotations since creation, positive is raising.
    pub fn total_rotations(&self) -> f64 {
        let mut shaft = lock(&self.shaft);
        self.integrate(&mut shaft);
        shaft.total
    }

    fn integrate(&self, shaft: &mut Shaft) {
        let now = self.clock.now();
        let dt = now.saturating_duration_since(shaft.last_update).as_secs_f64();
        shaft.last_update = now;
        if shaft.duty == 0 || dt == 0.0 {
            return;
        }
        let rotation = f64::from(shaft.duty) / FULL_DUTY * self.revs_per_sec * dt;
        shaft.pending += rotation;
        shaft.total += rotation;
    }
}

/// Motor side of the plant.
#[derive(Debug, Clone)]
pub struct SimulatedDrive {
    plant: SimulatedPlant,
}

impl Motor for SimulatedDrive {
    fn set_duty(&mut self, duty: i32) -> HwResult<()> {
        let mut shaft = lock(&self.plant.shaft);
        self.plant.integrate(&mut shaft);
        if shaft.duty != duty {
            tracing::trace!(from = shaft.duty, to = duty, "sim drive duty");
        }
        shaft.duty = duty.clamp(-(FULL_DUTY as i32), FULL_DUTY as i32);
        Ok(())
    }
}

/// Encoder side of the plant.
#[derive(Debug, Clone)]
pub struct SimulatedEncoder {
    plant: SimulatedPlant,
}

impl Encoder for SimulatedEncoder {
    fn take_rotation(&mut self) -> HwResult<f64> {
        let mut shaft = lock(&self.plant.shaft);
        self.plant.integrate(&mut shaft);
        let rotation = std::mem::take(&mut shaft.pending);
        Ok(if self.plant.invert {
            -rotation
        } else {
            rotation
        })
    }
}

/// PIR sensor that reports `level` while presence is on.
#[derive(Debug, Clone)]
pub struct SimulatedPresence {
    present: Arc<AtomicBool>,
    level: i32,
}

impl SimulatedPresence {
    pub fn new(level: i32) -> Self {
        Self {
            present: Arc::new(AtomicBool::new(false)),
            level,
        }
    }

    pub fn set_present(&self, present: bool) {
        self.present.store(present, Ordering::Release);
    }

    pub fn is_present(&self) -> bool {
        self.present.load(Ordering::Acquire)
    }
}

impl MotionSensor for SimulatedPresence {
    fn read(&mut self) -> HwResult<i32> {
        Ok(if self.is_present() { self.level } else { 0 })
    }
}

/// Distance sensor returning whatever was last set.
#[derive(Debug, Clone)]
pub struct SimulatedDistance {
    value: Arc<AtomicI32>,
}

impl SimulatedDistance {
    pub fn new(initial: i32) -> Self {
        Self {
            value: Arc::new(AtomicI32::new(initial)),
        }
    }

    pub fn set(&self, value: i32) {
        self.value.store(value, Ordering::Release);
    }
}

impl DistanceSensor for SimulatedDistance {
    fn read(&mut self) -> HwResult<i32> {
        Ok(self.value.load(Ordering::Acquire))
    }
}

/// Status light that remembers the color it shows.
#[derive(Debug, Clone, Default)]
pub struct SimulatedLight {
    color: Arc<Mutex<Rgbw>>,
}

impl SimulatedLight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(&self) -> Rgbw {
        *lock(&self.color)
    }
}

impl Light for SimulatedLight {
    fn set(&mut self, color: Rgbw) -> HwResult<()> {
        tracing::trace!(%color, "sim light");
        *lock(&self.color) = color;
        Ok(())
    }
}
