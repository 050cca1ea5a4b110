#![no_main]
use libfuzzer_sys::fuzz_target;
use shade_core::{Command, Controller, Settings};

fuzz_target!(|input: (&str, &str, u64)| {
    // Arbitrary wire input must never panic the controller or leave a
    // non-finite target behind.
    let (topic, payload, now_ms) = input;
    let mut ctl = Controller::new(Settings::default()).with_seed(1);
    if let Some(cmd) = Command::decode(topic, payload) {
        let _ = ctl.handle(cmd, now_ms);
    }
    let _ = ctl.update_param(topic, payload);
    let _ = ctl.tick(shade_core::TickInput {
        now_ms,
        ..Default::default()
    });
    assert!(ctl.state().target.is_finite());
});
