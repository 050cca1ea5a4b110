use proptest::prelude::*;
use shade_core::motion::update;
use shade_core::{
    AuthorityMode, Controller, DistanceAssist, Heights, MotionState, Settings, SpeedProfile,
    TickInput, map_speed, resolve,
};

prop_compose! {
    fn profile_strategy()(
        min_up in 0i32..=1023,
        max_up in 0i32..=1023,
        min_down in 0i32..=1023,
        max_down in 0i32..=1023,
        range in 0.0f64..100.0,
    ) -> SpeedProfile {
        SpeedProfile {
            min_up,
            max_up,
            min_down,
            max_down,
            distance_norm_range: range,
        }
        .sanitized()
    }
}

prop_compose! {
    fn heights_strategy()(
        idle in 0.0f64..400.0,
        rise in 0.0f64..400.0,
        max in 0.0f64..400.0,
    ) -> Heights {
        Heights { idle, rise, max }.sanitized()
    }
}

proptest! {
    #[test]
    fn zero_sum_rotations_return_to_start(
        start in -500.0f64..500.0,
        deltas in proptest::collection::vec(-5.0f64..5.0, 1..100),
    ) {
        let mut c = Controller::new(Settings {
            initial_position: start,
            ..Settings::default()
        });
        let sum: f64 = deltas.iter().sum();
        for (i, d) in deltas.iter().chain(std::iter::once(&-sum)).enumerate() {
            c.tick(TickInput {
                now_ms: i as u64 * 10,
                rotation: *d,
                ..TickInput::default()
            });
        }
        prop_assert!((c.state().position - start).abs() < 1e-6);
    }

    #[test]
    fn speed_is_monotonic_per_direction(
        p in profile_strategy(),
        precision in 0.0f64..5.0,
        a in 0.0f64..200.0,
        b in 0.0f64..200.0,
    ) {
        let (near, far) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(map_speed(0.0, near, precision, &p) <= map_speed(0.0, far, precision, &p));
        prop_assert!(map_speed(0.0, -near, precision, &p) >= map_speed(0.0, -far, precision, &p));
    }

    #[test]
    fn speed_saturates_at_range(p in profile_strategy(), extra in 0.0f64..100.0) {
        let d = p.distance_norm_range + extra + 1.0;
        prop_assert_eq!(map_speed(0.0, d, 1.0, &p), p.max_up);
        prop_assert_eq!(map_speed(0.0, -d, 1.0, &p), -p.max_down);
    }

    #[test]
    fn dead_band_is_exactly_zero(
        p in profile_strategy(),
        precision in 0.0f64..10.0,
        frac in -1.0f64..=1.0,
    ) {
        let delta = frac * (precision / 2.0);
        prop_assert_eq!(map_speed(0.0, delta, precision, &p), 0);
    }

    #[test]
    fn automated_target_stays_in_bounds(
        h in heights_strategy(),
        motion in any::<bool>(),
        current in -1000.0f64..1000.0,
        distance in proptest::option::of(any::<i32>()),
        assisted in any::<bool>(),
    ) {
        let assist = DistanceAssist::default();
        let t = resolve(
            AuthorityMode::Automated,
            motion,
            h,
            current,
            distance,
            assisted.then_some(&assist),
        );
        prop_assert!(t >= h.idle.min(h.rise), "target {} below bounds {:?}", t, h);
        prop_assert!(t <= h.max, "target {} above max {:?}", t, h);
    }

    #[test]
    fn single_trigger_holds_for_exactly_the_window(
        t0 in 0u64..10_000,
        hold in 1u64..5_000,
        step in 1u64..50,
    ) {
        let (mut s, changed) = update(900, t0, 300, hold, MotionState::default());
        prop_assert!(changed && s.debounced);
        let mut edges = 0;
        let mut now = t0;
        while now < t0 + hold + 3 * step {
            now += step;
            let (next, changed) = update(0, now, 300, hold, s);
            s = next;
            edges += usize::from(changed);
            prop_assert_eq!(s.debounced, now < t0 + hold);
        }
        prop_assert_eq!(edges, 1);
    }

    #[test]
    fn bound_round_trip_restores_dependent_values(
        rise in 0.0f64..400.0,
        max in 0.0f64..400.0,
        lowered in 0.0f64..400.0,
        min_up in 0i32..=1023,
        max_up in 0i32..=1023,
        slowed in 0i32..=1023,
    ) {
        let mut s = Settings::default();
        s.apply_param("rise-height", &rise.to_string()).unwrap();
        s.apply_param("max-height", &max.to_string()).unwrap();
        s.apply_param("min-up-speed", &min_up.to_string()).unwrap();
        s.apply_param("max-up-speed", &max_up.to_string()).unwrap();
        let (heights, speed) = (s.heights(), s.speed());

        s.apply_param("max-height", &lowered.to_string()).unwrap();
        s.apply_param("max-up-speed", &slowed.to_string()).unwrap();
        prop_assert!(s.heights().rise <= s.heights().max);
        prop_assert!(s.speed().min_up <= s.speed().max_up);

        s.apply_param("max-height", &max.to_string()).unwrap();
        s.apply_param("max-up-speed", &max_up.to_string()).unwrap();
        prop_assert_eq!(s.heights(), heights);
        prop_assert_eq!(s.speed(), speed);
    }
}
