use criterion::{black_box, criterion_group, criterion_main, Criterion};
use resolver_core::score::{DetectorConfig, ScoreConfig, ScoreResolver};
use resolver_core::types::{Measurement, Momentum, SurfaceId, TrackCandidate, TrackStateRef};
use resolver_core::GreedyResolver;
use std::collections::HashMap;

const VOLUME: u64 = 16;
const HITS_PER_TRACK: usize = 10;

/// `n` candidates, each stepping through its own block of measurements but
/// borrowing two hits from the previous candidate, so neighbours always share.
fn make_event(n: usize) -> (Vec<TrackCandidate>, Vec<Measurement>) {
    let stride = HITS_PER_TRACK - 2;
    let n_measurements = n * stride + 2;
    let measurements = (0..n_measurements)
        .map(|m| Measurement {
            surface: SurfaceId::new(VOLUME, m as u64),
        })
        .collect();

    let ndf = (2 * HITS_PER_TRACK - 5) as u32;
    let tracks = (0..n)
        .map(|i| {
            let first = i * stride;
            TrackCandidate {
                states: (first..first + HITS_PER_TRACK)
                    .map(|m| TrackStateRef::Hit {
                        surface: SurfaceId::new(VOLUME, m as u64),
                        measurement: m,
                    })
                    .collect(),
                chi2: ndf as f64 * (0.8 + (i % 7) as f64 * 0.3),
                ndf,
                momentum: Momentum::new(0.5, 1.0, 0.5),
            }
        })
        .collect();
    (tracks, measurements)
}

fn score_config() -> ScoreConfig {
    ScoreConfig {
        volume_map: HashMap::from([(VOLUME, 0)]),
        detector_configs: vec![DetectorConfig::default()],
        n_hits_min: 7,
        ..ScoreConfig::default()
    }
}

fn bench_resolvers(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    for n in [100, 500, 2000] {
        let (tracks, measurements) = make_event(n);

        let greedy = GreedyResolver::default();
        group.bench_function(format!("greedy_{n}_tracks"), |b| {
            b.iter(|| black_box(greedy.resolve(&tracks, &measurements).unwrap()));
        });

        let score = ScoreResolver::new(score_config());
        group.bench_function(format!("score_{n}_tracks"), |b| {
            b.iter(|| black_box(score.solve(&tracks, &measurements).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolvers);
criterion_main!(benches);
