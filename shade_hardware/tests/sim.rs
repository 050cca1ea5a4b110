use std::sync::Arc;
use std::time::Duration;

use rstest::rstest;
use shade_hardware::{SimulatedDistance, SimulatedLight, SimulatedPlant};
use shade_traits::{DistanceSensor, Encoder, Light, ManualClock, Motor, Rgbw};

#[rstest]
#[case(1023, 1.0, 2.0)]
#[case(512, 1.0, 1.0009775171065494)]
#[case(-1023, 0.5, -1.0)]
#[case(0, 3.0, 0.0)]
fn rotation_scales_with_duty_and_time(
    #[case] duty: i32,
    #[case] secs: f64,
    #[case] expected: f64,
) {
    let clock = ManualClock::new();
    let plant = SimulatedPlant::new(Arc::new(clock.clone()), 2.0, false);
    let mut drive = plant.drive();
    let mut encoder = plant.encoder();
    drive.set_duty(duty).unwrap();
    clock.advance(Duration::from_secs_f64(secs));
    let got = encoder.take_rotation().unwrap();
    assert!((got - expected).abs() < 1e-6, "got {got}, want {expected}");
}

#[rstest]
fn duty_is_clamped_to_driver_range() {
    let clock = ManualClock::new();
    let plant = SimulatedPlant::new(Arc::new(clock), 1.0, false);
    let mut drive = plant.drive();
    drive.set_duty(5000).unwrap();
    assert_eq!(plant.duty(), 1023);
    drive.stop().unwrap();
    assert_eq!(plant.duty(), 0);
}

#[rstest]
fn handles_share_sensor_state() {
    let mut sensor = SimulatedDistance::new(400);
    let handle = sensor.clone();
    handle.set(480);
    assert_eq!(sensor.read().unwrap(), 480);

    let mut light = SimulatedLight::new();
    let view = light.clone();
    light.set(Rgbw::white(512)).unwrap();
    assert_eq!(view.color(), Rgbw::white(512));
}
