use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use shade_core::{Controller, DistanceAssist, Settings, TickInput};

// Encoder and PIR trace: slow sine travel with a presence pulse every 5 s
fn synth_inputs(n: usize) -> Vec<TickInput> {
    (0..n)
        .map(|i| {
            let t = i as f64 / 100.0;
            TickInput {
                now_ms: i as u64 * 10,
                rotation: (t * 0.5).sin() * 0.02,
                motion_sample: if i % 500 < 20 { 900 } else { 50 },
                distance: Some(380 + ((i % 97) as i32)),
            }
        })
        .collect()
}

fn settings(assist: bool) -> Settings {
    Settings {
        automate: true,
        distance: assist.then(DistanceAssist::default),
        ..Settings::default()
    }
}

pub fn bench_tick(c: &mut Criterion) {
    let mut g = c.benchmark_group("controller_tick");
    // Allow quick tweaking without CLI flags (Criterion 0.5):
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p shade_core --bench tick
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(std::time::Duration::from_millis(ms_u64));
    }

    let inputs = synth_inputs(10_000);
    for (name, assist) in [("occupancy", false), ("distance_assist", true)] {
        g.bench_function(name, |b| {
            b.iter_batched(
                || Controller::new(settings(assist)).with_seed(1),
                |mut ctl| {
                    for input in &inputs {
                        black_box(ctl.tick(black_box(*input)));
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    g.finish();
}

criterion_group!(tick, bench_tick);
criterion_main!(tick);
