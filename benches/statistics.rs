use chrono::{Duration, NaiveDate};
use chrono_tz::UTC;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use wrf_eval::{
    all_stations_stats, global_stats, prepare_evaluation, StationCode, StationTable,
    StationTables,
};

fn synthetic_tables(stations: u32, hours: i64, offset: f64) -> StationTables {
    let start = NaiveDate::from_ymd_opt(2018, 6, 20)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let times: Vec<_> = (0..hours).map(|h| start + Duration::hours(h)).collect();
    (0..stations)
        .map(|code| {
            let o3 = (0..hours)
                .map(|h| (h % 7 != 0).then(|| (h % 24) as f64 * 3.0 + code as f64 + offset))
                .collect();
            let wd = (0..hours)
                .map(|h| Some(((h * 37 + code as i64 * 11) % 360) as f64 + offset))
                .collect();
            let table = StationTable::from_columns(
                StationCode(code),
                format!("station {code}"),
                UTC,
                &times,
                vec![("o3".to_string(), o3), ("wd".to_string(), wd)],
            )
            .unwrap();
            (StationCode(code), table)
        })
        .collect()
}

fn bench_statistics(c: &mut Criterion) {
    let simulated = synthetic_tables(40, 24 * 31, 5.0);
    let observed = synthetic_tables(40, 24 * 31, 0.0);
    let spin_up_end = NaiveDate::from_ymd_opt(2018, 6, 22).unwrap();
    let evaluation = prepare_evaluation(&simulated, &observed, spin_up_end).unwrap();

    c.bench_function("prepare_evaluation", |b| {
        b.iter(|| prepare_evaluation(black_box(&simulated), black_box(&observed), spin_up_end))
    });
    c.bench_function("all_stations_stats", |b| {
        b.iter(|| all_stations_stats(black_box(&evaluation), None, true))
    });
    c.bench_function("global_stats", |b| {
        b.iter(|| global_stats(black_box(&evaluation), None))
    });
}

criterion_group!(benches, bench_statistics);
criterion_main!(benches);
