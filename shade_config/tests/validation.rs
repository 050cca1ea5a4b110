use std::fs;

use shade_config::{CalibrationPolicyKind, load_path, load_toml};
use rstest::rstest;
use tempfile::tempdir;

const FULL: &str = r#"
[automation]
enabled = true
idle_height = 90.0
rise_height = 140.0
max_height = 180.0
disable_on_move = false

[encoder]
winding_length = 7.5
invert = false

[control]
precision = 1.0
report_threshold = 1.0
speed_map_range = 20.0
min_up_speed = 350
max_up_speed = 950
min_down_speed = 350
max_down_speed = 500

[motion]
sensitivity = 300
interval_ms = 2000

[distance]
midpoint = 420
band = 40
step = 0.25

[light]
idle = 127
flash = 1023

[calibration]
policy = "hold"

[runner]
tick_ms = 20
"#;

#[test]
fn accepts_full_document() {
    let cfg = load_toml(FULL).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert!(cfg.automation.enabled);
    assert!(!cfg.automation.disable_on_move);
    assert!(cfg.automation.disable_on_stop, "unset keys keep defaults");
    let d = cfg.distance.expect("distance section present");
    assert_eq!(d.midpoint, 420);
    assert_eq!(d.report_threshold, 10);
    assert_eq!(cfg.calibration.policy, CalibrationPolicyKind::Hold);
    assert_eq!(cfg.runner.tick_ms, 20);
}

#[rstest]
#[case("[encoder]\nwinding_length = 0.0", "winding_length must be > 0")]
#[case("[automation]\nrise_height = 300.0\nmax_height = 200.0", "rise_height must be <=")]
#[case("[automation]\nidle_height = -1.0", "idle_height must be a finite value")]
#[case("[control]\nmin_up_speed = 900\nmax_up_speed = 400", "min_up_speed must be <=")]
#[case("[control]\nmax_down_speed = 2000", "max_down_speed must be in")]
#[case("[control]\nmanual_duty = 0", "manual_duty must be in")]
#[case("[control]\nprecision = -0.5", "precision must be >= 0")]
#[case("[motion]\ninterval_ms = 0", "interval_ms must be >= 1")]
#[case("[distance]\nstep = 0.0", "distance.step must be > 0")]
#[case("[light]\nidle = 4096", "light.idle must be in")]
#[case("[runner]\ntick_ms = 0", "tick_ms must be >= 1")]
#[case("[logging]\nrotation = \"weekly\"", "logging.rotation must be one of")]
fn rejects_out_of_range(#[case] toml: &str, #[case] expected: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    assert!(
        format!("{err}").contains(expected),
        "error {err} does not mention {expected:?}"
    );
}

#[test]
fn rejects_unknown_policy_at_parse_time() {
    let err = load_toml("[calibration]\npolicy = \"bounce\"").expect_err("unknown variant");
    assert!(format!("{err}").contains("bounce"));
}

#[test]
fn load_path_reads_and_validates() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("good.toml");
    fs::write(&good, FULL).unwrap();
    let cfg = load_path(&good).expect("valid file loads");
    assert_eq!(cfg.light.idle, 127);

    let bad = dir.path().join("bad.toml");
    fs::write(&bad, "[runner]\ntick_ms = 0\n").unwrap();
    let err = load_path(&bad).expect_err("invalid file rejected");
    assert!(format!("{err}").contains("tick_ms"));

    let missing = dir.path().join("missing.toml");
    let err = load_path(&missing).expect_err("missing file rejected");
    assert!(format!("{err}").contains("read config"));
}
