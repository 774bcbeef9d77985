//! Benchmarks for two-pass coordinate indexing and full parsing.
//!
//! Run with: cargo bench --bench coordinate_indexing

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::fmt::Write as _;
use std::path::Path;
use tempfile::TempDir;

use echoview_processor::EchoviewParser;
use echoview_processor::app::services::coordinate_indexer::CoordinateIndexer;
use echoview_processor::app::services::echoview_parser::ParserOptions;

const MAPPING: &str = "\
TIME,Ping_date,,DT
DEPTH,Layer_depth_min,,N
LATITUDE,Latitude,TIME,N
LONGITUDE,Longitude,TIME,N
SV,Sv_mean,TIME DEPTH,N,SV > -70 and not isnan(SV)
NASC,NASC,TIME DEPTH,N
";

/// Synthetic export with `pings` x `layers` rows
fn write_export(dir: &Path, pings: usize, layers: usize) -> std::path::PathBuf {
    let mut content =
        String::from("Ping_date,Ping_time,Layer_depth_min,Latitude,Longitude,Sv_mean,NASC\n");

    for ping in 0..pings {
        let (hour, minute, second) = (ping / 3600 % 24, ping / 60 % 60, ping % 60);
        let latitude = -43.0 - ping as f64 * 0.001;
        let longitude = 147.0 + ping as f64 * 0.001;
        for layer in 0..layers {
            let _ = writeln!(
                content,
                "20210305,{:02}:{:02}:{:02}.00,{},{:.4},{:.4},{:.2},{:.1}",
                hour,
                minute,
                second,
                layer * 5,
                latitude,
                longitude,
                -60.0 - (ping + layer) as f64 % 30.0,
                (ping * layer) as f64 % 100.0
            );
        }
    }

    let path = dir.join(format!("export_{}x{}.csv", pings, layers));
    std::fs::write(&path, content).unwrap();
    path
}

fn create_parser(dir: &Path) -> EchoviewParser {
    let mapping = dir.join("echoview_fieldmap.txt");
    std::fs::write(&mapping, MAPPING).unwrap();
    EchoviewParser::from_mapping_file(&mapping, ParserOptions::default()).unwrap()
}

// =============================================================================
// INDEXING BENCHMARKS
// =============================================================================

fn bench_coordinate_indexing(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let parser = create_parser(dir.path());
    let mut group = c.benchmark_group("coordinate_indexing");

    for (pings, layers) in [(100, 10), (1000, 20), (5000, 50)] {
        let csv = write_export(dir.path(), pings, layers);
        group.throughput(Throughput::Elements((pings * layers) as u64));

        group.bench_with_input(
            BenchmarkId::new("two_pass", format!("{}x{}", pings, layers)),
            &csv,
            |b, csv| {
                b.iter(|| {
                    let layout = parser.resolve(csv).unwrap();
                    CoordinateIndexer::new(black_box(csv), layout).run().unwrap()
                })
            },
        );
    }

    group.finish();
}

// =============================================================================
// FULL PIPELINE BENCHMARKS
// =============================================================================

fn bench_parse_file(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let parser = create_parser(dir.path());
    let csv = write_export(dir.path(), 1000, 20);

    let mut group = c.benchmark_group("parse_file");
    group.throughput(Throughput::Elements(20_000));
    group.bench_function("collapse_qc_bounds_1000x20", |b| {
        b.iter(|| parser.parse_file(black_box(&csv)).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_coordinate_indexing, bench_parse_file);
criterion_main!(benches);
