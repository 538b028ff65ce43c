//! Benchmarks for the serialization engine.
//!
//! Benchmarks cover:
//! - Pretty JSON re-serialization
//! - CSV inference over single objects, arrays, and the NYTimes record list
//! - Rendered appends to the output file

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use api_poller::core::Sink;
use api_poller::infra::FileSink;
use api_poller::render::{OutputFormat, Renderer};

// ============================================================================
// Payloads
// ============================================================================

fn catfact() -> String {
    r#"{"fact":"A cat's hearing is better than a dog's, and it can hear high-frequency sounds","length":79}"#
        .to_string()
}

fn weather() -> String {
    r#"{"request":{"type":"City","query":"Tokyo, Japan","language":"en","unit":"m"},
        "location":{"name":"Tokyo","country":"Japan","region":"Tokyo","lat":"35.690","lon":"139.692"},
        "current":{"observation_time":"08:15 AM","temperature":21,"weather_descriptions":["Partly cloudy"],"wind_speed":11,"humidity":64}}"#
        .to_string()
}

fn nytimes(records: usize) -> String {
    let results: Vec<serde_json::Value> = (0..records)
        .map(|i| {
            serde_json::json!({
                "id": i,
                "url": format!("https://www.nytimes.com/2024/05/01/world/story-{i}.html"),
                "section": "World",
                "byline": "By A Reporter",
                "title": format!("Story number {i}, with \"quotes\""),
                "abstract": "A short abstract, with a comma.",
                "published_date": "2024-05-01",
                "media": [{"type": "image", "caption": ""}]
            })
        })
        .collect();
    serde_json::json!({"status": "OK", "num_results": records, "results": results}).to_string()
}

fn object_array(records: usize) -> String {
    let items: Vec<serde_json::Value> = (0..records)
        .map(|i| serde_json::json!({"id": i, "name": format!("Item {i}"), "score": i as f64 * 0.5}))
        .collect();
    serde_json::Value::Array(items).to_string()
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_pretty_json(c: &mut Criterion) {
    let renderer = Renderer::with_default_layouts(OutputFormat::PrettyJson);
    let mut group = c.benchmark_group("render_pretty_json");

    for (name, payload) in [("catfact", catfact()), ("weather", weather())] {
        group.throughput(Throughput::Bytes(payload.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &payload, |b, payload| {
            b.iter(|| renderer.render("Any", black_box(payload)).unwrap());
        });
    }
    group.finish();
}

fn bench_csv_object(c: &mut Criterion) {
    let renderer = Renderer::with_default_layouts(OutputFormat::Csv);
    let mut group = c.benchmark_group("render_csv_object");

    for (name, payload) in [("catfact", catfact()), ("weather", weather())] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &payload, |b, payload| {
            b.iter(|| renderer.render("Weather", black_box(payload)).unwrap());
        });
    }
    group.finish();
}

fn bench_csv_records(c: &mut Criterion) {
    let renderer = Renderer::with_default_layouts(OutputFormat::Csv);
    let mut group = c.benchmark_group("render_csv_records");

    for size in [20u64, 200, 2000] {
        group.throughput(Throughput::Elements(size));

        let payload = nytimes(size as usize);
        group.bench_with_input(BenchmarkId::new("nytimes", size), &payload, |b, payload| {
            b.iter(|| renderer.render("NYTimes", black_box(payload)).unwrap());
        });

        let payload = object_array(size as usize);
        group.bench_with_input(BenchmarkId::new("array", size), &payload, |b, payload| {
            b.iter(|| renderer.render("Items", black_box(payload)).unwrap());
        });
    }
    group.finish();
}

fn bench_file_append(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let sink = FileSink::in_dir(
        dir.path(),
        "bench",
        Renderer::with_default_layouts(OutputFormat::Csv),
    )
    .unwrap();
    let payload = nytimes(20);

    c.bench_function("file_sink_write_nytimes_20", |b| {
        b.iter(|| sink.write("NYTimes", black_box(&payload)).unwrap());
    });
}

criterion_group!(
    render_benches,
    bench_pretty_json,
    bench_csv_object,
    bench_csv_records
);

criterion_group!(sink_benches, bench_file_append);

criterion_main!(render_benches, sink_benches);
