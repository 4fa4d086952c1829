use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use pbp_features::pipeline::{self, PipelineOptions};
use pbp_features::sequencer::{sequence_game, split_games};
use pbp_features::synthetic::SyntheticSeason;
use pbp_features::tendency::compute_tendencies;
use pbp_features::weather::parse_weather;

fn sample_season() -> Vec<pbp_features::play::PlayRecord> {
    SyntheticSeason {
        weeks: 17,
        plays_per_game: 160,
        ..SyntheticSeason::default()
    }
    .generate()
}

fn bench_sequence_games(c: &mut Criterion) {
    let plays = sample_season();
    c.bench_function("sequence_games", |b| {
        b.iter(|| {
            let games = split_games(black_box(&plays)).unwrap();
            let total: usize = games.iter().map(|g| sequence_game(g).len()).sum();
            black_box(total);
        })
    });
}

fn bench_tendencies(c: &mut Criterion) {
    let plays = sample_season();
    c.bench_function("compute_tendencies", |b| {
        b.iter(|| {
            let (tendencies, warnings) = compute_tendencies(black_box(&plays));
            black_box((tendencies.offense_proe.len(), warnings.len()));
        })
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let plays = sample_season();
    let serial = PipelineOptions {
        threads: Some(1),
        ..PipelineOptions::default()
    };
    let parallel = PipelineOptions::default();

    c.bench_function("pipeline_serial", |b| {
        b.iter(|| {
            let out = pipeline::run(black_box(&plays), None, &serial).unwrap();
            black_box(out.digest);
        })
    });
    c.bench_function("pipeline_parallel", |b| {
        b.iter(|| {
            let out = pipeline::run(black_box(&plays), None, &parallel).unwrap();
            black_box(out.digest);
        })
    });
}

fn bench_weather_parse(c: &mut Criterion) {
    c.bench_function("weather_parse", |b| {
        b.iter(|| {
            let report = parse_weather(black_box(
                "Cloudy Temp: 45° F, Humidity: 71%, Wind: From SW 10 mph",
            ));
            black_box(report.wind_speed);
        })
    });
}

criterion_group!(
    perf,
    bench_sequence_games,
    bench_tendencies,
    bench_full_pipeline,
    bench_weather_parse
);
criterion_main!(perf);
