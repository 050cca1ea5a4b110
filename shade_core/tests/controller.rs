use rstest::{fixture, rstest};
use shade_core::{
    AuthorityMode, AutomationPolicy, Command, ControlState, Controller, Direction, DistanceAssist,
    Heights, MotionSettings, Notification, ParamValue, ResetTo, Settings, TickInput,
};
use shade_traits::Rgbw;

#[fixture]
fn settings() -> Settings {
    Settings {
        invert_encoder: false,
        heights: Heights {
            idle: 100.0,
            rise: 150.0,
            max: 200.0,
        },
        motion: MotionSettings {
            sensitivity: 300,
            hold_ms: 2000,
            position_scaled: false,
        },
        ..Settings::default()
    }
}

fn at(now_ms: u64) -> TickInput {
    TickInput {
        now_ms,
        ..TickInput::default()
    }
}

fn automated(settings: Settings) -> Settings {
    Settings {
        automate: true,
        ..settings
    }
}

#[rstest]
fn winding_scales_encoder_delta(settings: Settings) {
    let mut c = Controller::new(settings);
    c.tick(TickInput {
        rotation: 2.0,
        ..at(0)
    });
    assert_eq!(c.state().position, 15.0);
}

#[rstest]
fn inverted_encoder_counts_down(settings: Settings) {
    let mut c = Controller::new(Settings {
        invert_encoder: true,
        ..settings
    });
    c.tick(TickInput {
        rotation: 2.0,
        ..at(0)
    });
    assert_eq!(c.state().position, -15.0);
}

#[rstest]
fn single_trigger_reports_both_edges_once(settings: Settings) {
    let mut c = Controller::new(settings);
    let fx = c.tick(TickInput {
        motion_sample: 500,
        ..at(0)
    });
    assert_eq!(fx.notifications, vec![Notification::Motion(true)]);

    let mut falls = 0;
    for t in (10..=3000).step_by(10) {
        let fx = c.tick(at(t));
        assert_eq!(c.occupied(), t < 2000, "occupancy at {t}");
        falls += fx
            .notifications
            .iter()
            .filter(|n| **n == Notification::Motion(false))
            .count();
        if t == 2000 {
            assert_eq!(fx.notifications, vec![Notification::Motion(false)]);
        }
    }
    assert_eq!(falls, 1);
}

#[rstest]
fn threshold_uses_position_after_encoder_step(settings: Settings) {
    let mut c = Controller::new(Settings {
        motion: MotionSettings {
            position_scaled: true,
            ..settings.motion
        },
        ..settings
    });
    // 20 rotations lift the shade to rise height, where the threshold is 300.
    let fx = c.tick(TickInput {
        rotation: 20.0,
        motion_sample: 200,
        ..at(0)
    });
    assert!(!c.occupied());
    assert!(!fx.notifications.contains(&Notification::Motion(true)));
    // Near the bottom the same sample is enough.
    c.handle(Command::Reset(0.0), 10);
    let fx = c.tick(TickInput {
        motion_sample: 200,
        ..at(20)
    });
    assert!(fx.notifications.contains(&Notification::Motion(true)));
}

#[rstest]
fn automation_follows_occupancy(settings: Settings) {
    let mut c = Controller::new(automated(settings));
    assert_eq!(c.mode(), AuthorityMode::Automated);
    let fx = c.tick(at(0));
    assert_eq!(c.state().target, 100.0);
    assert_eq!(fx.duty, Some(950));

    c.tick(TickInput {
        motion_sample: 900,
        ..at(10)
    });
    assert_eq!(c.state().target, 150.0);
}

#[rstest]
fn turn_up_then_stop_mid_automation(settings: Settings) {
    let mut c = Controller::new(automated(settings));
    c.tick(at(0));
    assert_eq!(c.control_state(), ControlState::Seeking);

    let fx = c.handle(Command::Turn(Direction::Up), 5);
    assert_eq!(fx.duty, Some(512));
    assert_eq!(c.control_state(), ControlState::ManualOverride);
    assert_eq!(c.mode(), AuthorityMode::Manual);

    // Manual ticks leave the motor alone but still integrate and report.
    let fx = c.tick(TickInput {
        rotation: 1.0,
        ..at(10)
    });
    assert_eq!(fx.duty, None);
    assert_eq!(fx.notifications, vec![Notification::Position(7.5)]);

    let fx = c.handle(Command::Stop, 15);
    assert_eq!(fx.duty, Some(0));
    assert_eq!(c.state().target, c.state().position);
    assert_eq!(c.control_state(), ControlState::Idle);
    assert!(!c.settings().automate);
    assert_eq!(
        fx.notifications,
        vec![Notification::Param {
            key: "automate",
            value: ParamValue::Bool(false),
        }]
    );

    let fx = c.tick(at(20));
    assert_eq!(fx.duty, Some(0));
    assert_eq!(c.mode(), AuthorityMode::RemoteTarget);
}

#[rstest]
fn turn_down_uses_negative_manual_duty(settings: Settings) {
    let mut c = Controller::new(Settings {
        manual_duty: 300,
        ..settings
    });
    assert_eq!(c.handle(Command::Turn(Direction::Down), 0).duty, Some(-300));
}

#[rstest]
fn move_disables_automation_by_default(settings: Settings) {
    let mut c = Controller::new(automated(settings));
    let fx = c.handle(Command::Move(40.0), 0);
    assert!(!c.settings().automate);
    assert_eq!(fx.notifications.len(), 1);
    c.tick(at(10));
    assert_eq!(c.state().target, 40.0);
}

#[rstest]
fn pending_move_releases_back_to_automation(settings: Settings) {
    let mut c = Controller::new(Settings {
        policy: AutomationPolicy {
            disable_on_move: false,
            disable_on_stop: true,
        },
        ..automated(settings)
    });
    let fx = c.handle(Command::Move(50.0), 0);
    assert!(fx.notifications.is_empty());
    assert!(c.settings().automate);
    assert_eq!(c.mode(), AuthorityMode::RemoteTarget);

    let fx = c.tick(at(10));
    assert_eq!(c.state().target, 50.0);
    assert!(fx.duty.unwrap() > 0);

    let fx = c.tick(TickInput {
        rotation: 50.0 / 7.5,
        ..at(20)
    });
    assert_eq!(fx.duty, Some(0));
    assert_eq!(c.mode(), AuthorityMode::Automated);

    c.tick(at(30));
    assert_eq!(c.state().target, 100.0);
}

#[rstest]
fn stop_keeps_automation_when_allowed(settings: Settings) {
    let mut c = Controller::new(Settings {
        policy: AutomationPolicy {
            disable_on_move: true,
            disable_on_stop: false,
        },
        ..automated(settings)
    });
    let fx = c.handle(Command::Stop, 0);
    assert!(fx.notifications.is_empty());
    assert!(c.settings().automate);
    c.tick(at(10));
    assert_eq!(c.state().target, 100.0);
}

#[rstest]
fn reset_recalibrates_and_requests_persistence(settings: Settings) {
    let mut c = Controller::new(settings);
    c.handle(Command::Turn(Direction::Up), 0);
    let fx = c.handle(Command::Reset(12.5), 5);
    assert_eq!(c.state().position, 12.5);
    assert_eq!(c.state().target, 12.5);
    assert_eq!(c.mode(), AuthorityMode::RemoteTarget);
    assert_eq!(
        fx.notifications,
        vec![Notification::Param {
            key: "saved-position",
            value: ParamValue::Double(12.5),
        }]
    );
    let fx = c.tick(at(10));
    assert_eq!(fx.notifications, vec![Notification::Position(12.5)]);
    assert_eq!(fx.duty, Some(0));
}

#[rstest]
fn position_reports_only_past_threshold(settings: Settings) {
    let mut c = Controller::new(settings);
    // 0.1 rotation = 0.75 units, below the 1.0 threshold
    let fx = c.tick(TickInput {
        rotation: 0.1,
        ..at(0)
    });
    assert!(fx.notifications.is_empty());
    let fx = c.tick(TickInput {
        rotation: 0.1,
        ..at(10)
    });
    assert_eq!(fx.notifications, vec![Notification::Position(1.5)]);
    assert_eq!(c.state().sent_position, 1.5);
}

#[rstest]
fn distance_reports_past_threshold(settings: Settings) {
    let mut c = Controller::new(Settings {
        distance: Some(DistanceAssist::default()),
        ..settings
    });
    let d = |c: &mut Controller, t, v| {
        c.tick(TickInput {
            distance: Some(v),
            ..at(t)
        })
        .notifications
    };
    assert_eq!(d(&mut c, 0, 400), vec![Notification::Distance(400)]);
    assert!(d(&mut c, 10, 405).is_empty());
    assert!(d(&mut c, 20, 410).is_empty());
    assert_eq!(d(&mut c, 30, 411), vec![Notification::Distance(411)]);
}

#[rstest]
fn distance_assist_nudges_target(settings: Settings) {
    let mut c = Controller::new(Settings {
        distance: Some(DistanceAssist::default()),
        ..automated(settings)
    });
    let occupied_far = |t| TickInput {
        motion_sample: 900,
        distance: Some(300),
        ..at(t)
    };
    c.tick(occupied_far(0));
    assert_eq!(c.state().target, 150.0);
    c.tick(occupied_far(10));
    assert_eq!(c.state().target, 150.5);
    for t in 2..200 {
        c.tick(occupied_far(t * 10));
    }
    assert_eq!(c.state().target, 200.0);
}

#[rstest]
fn flash_overlay_expires(settings: Settings) {
    let mut c = Controller::new(settings);
    c.on_online();
    let fx = c.handle(Command::Flash { duration_ms: 300 }, 1000);
    assert_eq!(fx.light, Some(Rgbw::mono(1023)));
    assert_eq!(c.tick(at(1299)).light, None);
    assert_eq!(c.tick(at(1300)).light, Some(Rgbw::mono(127)));
    assert_eq!(c.light(), Rgbw::mono(127));
}

#[rstest]
fn ping_flashes_white(settings: Settings) {
    let mut c = Controller::new(settings);
    let fx = c.handle(Command::Ping, 0);
    assert_eq!(fx.light, Some(Rgbw::white(512)));
    assert_eq!(c.tick(at(100)).light, Some(Rgbw::OFF));
}

#[rstest]
fn disco_sets_steady_color(settings: Settings) {
    let mut c = Controller::new(settings).with_seed(42);
    let color = c.handle(Command::Disco, 0).light.expect("disco shows a color");
    assert_eq!(c.light(), color);
    // a later flash returns to the disco color
    c.handle(
        Command::FlashColor {
            color: Rgbw::new(1, 2, 3, 4),
            duration_ms: 10,
        },
        0,
    );
    assert_eq!(c.tick(at(10)).light, Some(color));
}

#[rstest]
fn online_holds_position_and_offline_goes_dark(settings: Settings) {
    let mut c = Controller::new(Settings {
        initial_position: 20.0,
        ..settings
    });
    c.handle(Command::Move(80.0), 0);
    let fx = c.on_online();
    assert_eq!(fx.duty, Some(0));
    assert_eq!(fx.light, Some(Rgbw::mono(127)));
    assert_eq!(c.state().target, 20.0);

    let fx = c.on_offline();
    assert_eq!(fx.duty, Some(0));
    assert_eq!(fx.light, Some(Rgbw::OFF));
}

#[rstest]
fn end_stop_default_only_logs(settings: Settings) {
    let mut c = Controller::new(settings);
    c.handle(Command::Turn(Direction::Up), 0);
    let fx = c.on_end_stop(10);
    assert_eq!(fx, shade_core::Effects::default());
    assert_eq!(c.control_state(), ControlState::ManualOverride);
}

#[rstest]
fn end_stop_reset_policy_recalibrates(settings: Settings) {
    let mut c = Controller::with_calibration(
        Settings {
            initial_position: 30.0,
            ..settings
        },
        Box::new(ResetTo(0.0)),
    );
    c.handle(Command::Turn(Direction::Down), 0);
    let fx = c.on_end_stop(10);
    assert_eq!(fx.duty, Some(0));
    assert_eq!(c.state().position, 0.0);
    assert_eq!(c.state().target, 0.0);
    assert_eq!(c.control_state(), ControlState::Idle);
    assert_eq!(
        fx.notifications,
        vec![Notification::Param {
            key: "saved-position",
            value: ParamValue::Double(0.0),
        }]
    );
}

#[rstest]
fn enabling_automation_by_param(settings: Settings) {
    let mut c = Controller::new(settings);
    c.update_param("automate", "true").unwrap();
    c.tick(at(0));
    assert_eq!(c.state().target, 100.0);
    assert!(c.update_param("rise-height", "oops").is_err());
    assert!(c.update_param("bogus", "1").is_err());
}

/// Drive the controller against an ideal plant: rotation follows duty.
fn settle(c: &mut Controller, from_ms: u64, ticks: u64) -> i32 {
    let mut duty = 0;
    for i in 0..ticks {
        let fx = c.tick(TickInput {
            rotation: f64::from(duty) / 1023.0 * 0.02,
            ..at(from_ms + i * 10)
        });
        if let Some(d) = fx.duty {
            duty = d;
        }
    }
    duty
}

#[rstest]
#[case("winding-length", "-7.5")]
#[case("winding-length", "0")]
#[case("pir-interval", "0")]
#[case("pir-interval", "-4")]
fn unusable_params_are_rejected_and_moves_still_settle(
    settings: Settings,
    #[case] key: &str,
    #[case] value: &str,
) {
    let mut c = Controller::new(settings);
    let before = c.settings().clone();
    assert!(c.update_param(key, value).is_err());
    assert_eq!(c.settings(), &before);

    c.handle(Command::Move(20.0), 0);
    let duty = settle(&mut c, 10, 2_000);
    assert_eq!(duty, 0);
    assert!((c.state().position - 20.0).abs() <= 1.0, "{:?}", c.state());
}

#[rstest]
fn occupancy_still_holds_after_rejected_interval(settings: Settings) {
    let mut c = Controller::new(settings);
    assert!(c.update_param("pir-interval", "0").is_err());
    c.tick(TickInput {
        motion_sample: 500,
        ..at(0)
    });
    c.tick(at(1000));
    assert!(c.occupied());
}

#[rstest]
fn max_height_round_trip_restores_rise_target(settings: Settings) {
    let mut c = Controller::new(automated(settings));
    let occupied = |t| TickInput {
        motion_sample: 500,
        ..at(t)
    };
    c.update_param("max-height", "120").unwrap();
    c.tick(occupied(0));
    assert_eq!(c.state().target, 120.0);

    c.update_param("max-height", "200").unwrap();
    c.tick(occupied(10));
    assert_eq!(c.state().target, 150.0);
    assert_eq!(c.settings().heights.rise, 150.0);
}

#[rstest]
fn max_speed_round_trip_restores_min_speed(settings: Settings) {
    let mut c = Controller::new(settings);
    c.update_param("max-up-speed", "100").unwrap();
    assert_eq!(c.settings().speed().min_up, 100);
    c.update_param("max-up-speed", "950").unwrap();
    assert_eq!(c.settings().speed().min_up, 350);
    assert_eq!(c.settings().speed().max_up, 950);
}

#[rstest]
fn rejected_update_in_a_sequence_keeps_earlier_ones(settings: Settings) {
    let mut c = Controller::new(settings);
    c.update_param("winding-length", "5").unwrap();
    c.update_param("max-height", "180").unwrap();
    assert!(c.update_param("winding-length", "-5").is_err());
    assert!(c.update_param("pir-interval", "0").is_err());
    assert_eq!(c.settings().winding_length, 5.0);
    assert_eq!(c.settings().heights.max, 180.0);
    assert_eq!(c.settings().motion.hold_ms, 2000);
}
