use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pixml::pixml::{extract, to_string, validate, MemorySource, PiXmlWriterConfig, SeriesReader};

/// Generate a synthetic PI-XML document
fn generate_test_document(num_series: usize, events_per_series: usize) -> String {
    let mut content = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<TimeSeries xmlns="http://www.wldelft.nl/fews/PI" version="1.2">
  <timeZone>1.0</timeZone>"#,
    );

    for s in 0..num_series {
        content.push_str(&format!(
            r#"
  <series>
    <header>
      <type>instantaneous</type>
      <locationId>LOC{:04}</locationId>
      <parameterId>H.meting</parameterId>
      <timeStep unit="second" multiplier="900"/>
      <startDate date="2020-01-01" time="00:00:00"/>
      <endDate date="2020-12-31" time="23:45:00"/>
      <missVal>-999.0</missVal>
      <stationName>Station {}</stationName>
      <units>m</units>
    </header>"#,
            s, s
        ));

        for e in 0..events_per_series {
            let minutes = e * 15;
            let day = 1 + (minutes / 1440) % 28;
            let hour = (minutes / 60) % 24;
            let minute = minutes % 60;
            let value = if e % 97 == 0 {
                "-999.0".to_string()
            } else {
                format!("{:.3}", (e as f64 * 0.01).sin())
            };
            content.push_str(&format!(
                r#"
    <event date="2020-01-{:02}" time="{:02}:{:02}:00" value="{}" flag="0"/>"#,
                day, hour, minute, value
            ));
        }
        content.push_str("\n  </series>");
    }

    content.push_str("\n</TimeSeries>\n");
    content
}

/// Benchmark the duplicate validation pass alone
fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");

    for num_series in [10, 100, 1000] {
        let source = MemorySource::new("bench", generate_test_document(num_series, 100));
        group.throughput(Throughput::Bytes(source.len() as u64));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}series", num_series)),
            &source,
            |b, source| {
                b.iter(|| validate(source).expect("validation failed"));
            },
        );
    }

    group.finish();
}

/// Benchmark full extraction at several chunk sizes
fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract");
    let num_series = 100;
    let events_per_series = 1000;
    let source = MemorySource::new("bench", generate_test_document(num_series, events_per_series));
    group.throughput(Throughput::Elements((num_series * events_per_series) as u64));

    for chunk_size in [1_000, 10_000, 250_000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("chunk{}", chunk_size)),
            &chunk_size,
            |b, &chunk_size| {
                b.iter(|| {
                    let rows: usize = extract(&source, chunk_size)
                        .expect("extract failed")
                        .map(|batch| batch.expect("batch failed").len())
                        .sum();
                    assert_eq!(rows, num_series * events_per_series);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark serializing series back to PI-XML
fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");
    let source = MemorySource::new("bench", generate_test_document(100, 1000));
    let series: Vec<_> = SeriesReader::new(source)
        .series()
        .expect("read failed")
        .collect::<Result<_, _>>()
        .expect("series failed");
    let config = PiXmlWriterConfig::compact();

    group.throughput(Throughput::Elements(100 * 1000));
    group.bench_function("100series_1000events", |b| {
        b.iter(|| to_string(&series, &config).expect("serialize failed"));
    });

    group.finish();
}

criterion_group!(benches, bench_validate, bench_extract, bench_serialize);
criterion_main!(benches);
