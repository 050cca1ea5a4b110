//! Shade assembly and the `run` / `self-check` commands.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use eyre::{Result, WrapErr};
use serde_json::json;
use shade_core::{
    CalibrationPolicy, EndStopLatch, Notification, NotificationSink, ParamValue, RunParams,
    RunStats, Settings, Shade,
};
use shade_traits::{Clock, ManualClock, MonotonicClock};

use crate::script::{ScriptSource, SimHandles};

/// Ticks to keep running after the last script entry.
const SCRIPT_TAIL_MS: u64 = 2_000;
/// Ticks for a simulated run without script or `--ticks`.
const DEFAULT_SIM_TICKS: u64 = 500;

/// Options of the `run` subcommand.
#[derive(Debug, Clone, Default)]
pub struct RunOpts<'a> {
    pub ticks: Option<u64>,
    pub script: Option<&'a Path>,
    pub realtime: bool,
    pub seed: Option<u64>,
    pub json: bool,
}

/// A shade plus whatever has to stay alive next to it.
struct Assembled {
    shade: Shade,
    sim: SimHandles,
    #[cfg(all(feature = "hardware", target_os = "linux"))]
    _end_stop: Option<shade_hardware::gpio::GpioEndStop>,
}

fn settings_and_policy(cfg: &shade_config::Config) -> (Settings, Box<dyn CalibrationPolicy>) {
    (Settings::from(cfg), (&cfg.calibration).into())
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn assemble(
    cfg: &shade_config::Config,
    clock: Arc<dyn Clock + Send + Sync>,
    seed: Option<u64>,
) -> Result<Assembled> {
    use shade_hardware::{SimulatedDistance, SimulatedLight, SimulatedPlant, SimulatedPresence};

    let (settings, policy) = settings_and_policy(cfg);
    let plant = SimulatedPlant::new(Arc::clone(&clock), cfg.sim.revs_per_sec, cfg.encoder.invert);
    let presence = SimulatedPresence::new(cfg.sim.presence_level);
    let latch = EndStopLatch::new();

    let mut builder = Shade::builder()
        .with_encoder(plant.encoder())
        .with_motor(plant.drive())
        .with_motion_sensor(presence.clone())
        .with_light(SimulatedLight::new())
        .with_settings(settings)
        .with_calibration(policy)
        .with_end_stop(latch.clone())
        .with_clock(clock);
    let distance = if cfg.distance.is_some() {
        let sensor = SimulatedDistance::new(cfg.sim.distance);
        builder = builder.with_distance_sensor(sensor.clone());
        Some(sensor)
    } else {
        None
    };
    if let Some(seed) = seed {
        builder = builder.with_seed(seed);
    }
    tracing::info!(
        revs_per_sec = cfg.sim.revs_per_sec,
        distance = distance.is_some(),
        "simulated plant"
    );

    Ok(Assembled {
        shade: builder.build()?,
        sim: SimHandles {
            presence: Some(presence),
            distance,
            end_stop: Some(latch),
        },
    })
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn assemble(
    cfg: &shade_config::Config,
    clock: Arc<dyn Clock + Send + Sync>,
    seed: Option<u64>,
) -> Result<Assembled> {
    use shade_hardware::gpio::{self, GpioEncoder, GpioEndStop, GpioMotor, GpioPresence};

    let pins = cfg
        .pins
        .as_ref()
        .ok_or_else(|| eyre::eyre!("hardware backend needs a [pins] section"))?;
    let gpio = gpio::open().wrap_err("open gpio")?;
    let (settings, policy) = settings_and_policy(cfg);
    let latch = EndStopLatch::new();

    let motor =
        GpioMotor::new(&gpio, pins.motor_up, pins.motor_down).wrap_err("open gpio motor")?;
    let encoder = GpioEncoder::new(
        &gpio,
        pins.encoder_a,
        pins.encoder_b,
        cfg.encoder.pulses_per_rev,
    )
    .wrap_err("open gpio encoder")?;
    let pir = GpioPresence::new(&gpio, pins.pir).wrap_err("open gpio pir")?;
    let end_stop = match pins.end_stop {
        Some(pin) => {
            let irq = latch.clone();
            let stop = GpioEndStop::new(&gpio, pin, move || irq.trigger())
                .wrap_err("open gpio end stop")?;
            Some(stop)
        }
        None => None,
    };

    let mut builder = Shade::builder()
        .with_encoder(encoder)
        .with_motor(motor)
        .with_motion_sensor(pir)
        .with_settings(settings)
        .with_calibration(policy)
        .with_end_stop(latch)
        .with_clock(clock);
    if let Some(seed) = seed {
        builder = builder.with_seed(seed);
    }
    tracing::info!(?pins, "gpio backend");

    Ok(Assembled {
        shade: builder.build()?,
        sim: SimHandles::default(),
        _end_stop: end_stop,
    })
}

/// Prints notifications to stdout, one per line.
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    pub json: bool,
}

pub fn notification_json(n: &Notification) -> serde_json::Value {
    let value = match n {
        Notification::Motion(m) => json!(m),
        Notification::Position(p) => json!(p),
        Notification::Distance(d) => json!(d),
        Notification::Param {
            value: ParamValue::Bool(b),
            ..
        } => json!(b),
        Notification::Param {
            value: ParamValue::Double(v),
            ..
        } => json!(v),
    };
    json!({ "topic": n.topic(), "value": value })
}

impl NotificationSink for Printer {
    fn publish(&mut self, n: Notification) {
        let mut out = std::io::stdout().lock();
        // A closed stdout must not take the control loop down.
        let _ = if self.json {
            writeln!(out, "{}", notification_json(&n))
        } else {
            writeln!(out, "{n}")
        };
    }
}

fn print_summary(stats: &RunStats, json: bool) {
    if json {
        println!(
            "{}",
            json!({
                "summary": {
                    "ticks": stats.ticks,
                    "commands": stats.commands,
                    "notifications": stats.notifications,
                    "end_stops": stats.end_stops,
                    "final_position": stats.final_position,
                }
            })
        );
    } else {
        println!(
            "done: ticks={} commands={} notifications={} end_stops={} position={:.2}",
            stats.ticks,
            stats.commands,
            stats.notifications,
            stats.end_stops,
            stats.final_position
        );
    }
}

/// Execute `run`.
pub fn run_shade(
    cfg: &shade_config::Config,
    opts: &RunOpts<'_>,
    shutdown: &AtomicBool,
) -> Result<RunStats> {
    let clock: Arc<dyn Clock + Send + Sync> = if opts.realtime {
        Arc::new(MonotonicClock::new())
    } else {
        Arc::new(ManualClock::new())
    };
    // Keep the whole assembly alive: it owns the end-stop interrupt on hardware.
    let mut parts = assemble(cfg, clock, opts.seed)?;
    let sim = std::mem::take(&mut parts.sim);
    let shade = &mut parts.shade;

    let entries = match opts.script {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("read script {}", path.display()))?;
            crate::script::parse(&text)?
        }
        None => Vec::new(),
    };
    let mut source = ScriptSource::new(entries, sim);

    let tick_ms = cfg.runner.tick_ms.max(1);
    let max_ticks = opts.ticks.or_else(|| {
        if opts.realtime {
            None
        } else if opts.script.is_some() {
            Some((source.last_at_ms() + SCRIPT_TAIL_MS).div_ceil(tick_ms))
        } else {
            Some(DEFAULT_SIM_TICKS)
        }
    });
    let params = RunParams { tick_ms, max_ticks };
    tracing::info!(tick_ms, ?max_ticks, realtime = opts.realtime, "run");

    let stats = if opts.realtime {
        // Slow terminals must not stall the loop: print from a separate thread.
        let capacity = cfg.runner.notify_capacity.max(1);
        let (tx, rx) = crossbeam_channel::bounded::<Notification>(capacity);
        let mut printer = Printer { json: opts.json };
        let handle = std::thread::spawn(move || {
            for n in rx {
                printer.publish(n);
            }
        });
        let mut sink = tx;
        let stats = shade_core::run(shade, &mut source, &mut sink, params, shutdown);
        drop(sink);
        if handle.join().is_err() {
            tracing::warn!("printer thread panicked");
        }
        stats?
    } else {
        shade_core::run(
            shade,
            &mut source,
            &mut Printer { json: opts.json },
            params,
            shutdown,
        )?
    };
    print_summary(&stats, opts.json);
    Ok(stats)
}

/// Execute `self-check`: assemble the backend, run one tick, then take it offline.
pub fn self_check(cfg: &shade_config::Config, json: bool) -> Result<()> {
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(ManualClock::new());
    let mut parts = assemble(cfg, clock, None)?;
    parts.shade.start()?;
    let stepped = parts.shade.step();
    parts.shade.shutdown()?;
    stepped?;
    if json {
        println!("{}", json!({ "status": "ok" }));
    } else {
        println!("ok");
    }
    Ok(())
}
