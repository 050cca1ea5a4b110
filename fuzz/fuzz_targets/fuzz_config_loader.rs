#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not. A config that
    // validates must also survive the conversion into controller settings.
    if let Ok(cfg) = shade_config::load_toml(data)
        && cfg.validate().is_ok()
    {
        let settings = shade_core::Settings::from(&cfg);
        assert_eq!(settings, settings.clone().sanitized());
    }
});
