//! Raspberry Pi GPIO drivers (rppal).

use rppal::gpio::{InputPin, Level, OutputPin, Trigger};
use shade_traits::{Encoder, HwResult, MotionSensor, Motor};

use crate::error::{HwError, Result};
use crate::quadrature::QuadratureDecoder;

pub use rppal::gpio::Gpio;

/// Open the GPIO peripheral.
pub fn open() -> Result<Gpio> {
    Ok(Gpio::new()?)
}

/// Software PWM frequency for the H-bridge inputs.
pub const PWM_HZ: f64 = 1_000.0;

/// H-bridge with one PWM input per direction.
pub struct GpioMotor {
    up: OutputPin,
    down: OutputPin,
    duty: i32,
}

impl GpioMotor {
    pub fn new(gpio: &Gpio, up_pin: u8, down_pin: u8) -> Result<Self> {
        let mut up = gpio.get(up_pin)?.into_output();
        let mut down = gpio.get(down_pin)?.into_output();
        up.set_low();
        down.set_low();
        Ok(Self { up, down, duty: 0 })
    }

    fn drive(active: &mut OutputPin, idle: &mut OutputPin, duty: i32) -> Result<()> {
        idle.clear_pwm().map_err(|e| HwError::Pwm(e.to_string()))?;
        idle.set_low();
        let cycle = f64::from(duty.unsigned_abs().min(1023)) / 1023.0;
        active
            .set_pwm_frequency(PWM_HZ, cycle)
            .map_err(|e| HwError::Pwm(e.to_string()))
    }
}

impl Motor for GpioMotor {
    fn set_duty(&mut self, duty: i32) -> HwResult<()> {
        if duty == self.duty {
            return Ok(());
        }
        match duty.signum() {
            1 => Self::drive(&mut self.up, &mut self.down, duty)?,
            -1 => Self::drive(&mut self.down, &mut self.up, duty)?,
            _ => {
                for pin in [&mut self.up, &mut self.down] {
                    pin.clear_pwm().map_err(|e| HwError::Pwm(e.to_string()))?;
                    pin.set_low();
                }
            }
        }
        tracing::debug!(duty, "motor duty");
        self.duty = duty;
        Ok(())
    }
}

/// Quadrature encoder decoded on channel A edges.
///
/// The interrupt thread feeds a [`QuadratureDecoder`]; `take_rotation` drains it.
pub struct GpioEncoder {
    _a: InputPin,
    decoder: QuadratureDecoder,
}

impl GpioEncoder {
    pub fn new(gpio: &Gpio, a_pin: u8, b_pin: u8, pulses_per_rev: u32) -> Result<Self> {
        let mut a = gpio.get(a_pin)?.into_input_pullup();
        let b = gpio.get(b_pin)?.into_input_pullup();
        let decoder = QuadratureDecoder::new(pulses_per_rev);
        let irq = decoder.clone();
        a.set_async_interrupt(Trigger::Both, move |level: Level| {
            irq.edge(level == Level::High, b.is_high());
        })?;
        Ok(Self { _a: a, decoder })
    }
}

impl Encoder for GpioEncoder {
    fn take_rotation(&mut self) -> HwResult<f64> {
        self.decoder.take_rotation()
    }
}

/// Digital PIR output read as a full-scale sample.
pub struct GpioPresence {
    pin: InputPin,
}

impl GpioPresence {
    pub fn new(gpio: &Gpio, pin: u8) -> Result<Self> {
        Ok(Self {
            pin: gpio.get(pin)?.into_input_pulldown(),
        })
    }
}

impl MotionSensor for GpioPresence {
    fn read(&mut self) -> HwResult<i32> {
        Ok(if self.pin.is_high() { 1023 } else { 0 })
    }
}

/// End-stop switch (active low) calling `on_trigger` on each press.
pub struct GpioEndStop {
    _pin: InputPin,
}

impl GpioEndStop {
    pub fn new<F>(gpio: &Gpio, pin: u8, mut on_trigger: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let mut input = gpio.get(pin)?.into_input_pullup();
        input.set_async_interrupt(Trigger::FallingEdge, move |_level: Level| on_trigger())?;
        Ok(Self { _pin: input })
    }
}
