//! Integration tests for pixml
//!
//! These tests drive the full pipeline over files on disk: validation,
//! extraction, serialization and the Parquet sink.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::reader::{FileReader, SerializedFileReader};
use pixml::model::{Batch, SeriesKey, TimezoneOffset};
use pixml::pixml::{
    extract, resolve_timezone, validate, BulkReader, MemorySource, PiXmlError, PiXmlWriter,
    PiXmlWriterConfig, SeriesReader,
};
use pixml::schema::{KEY_SERIES, KEY_SOURCE_FILE, KEY_TIMEZONE};
use pixml::writer::{BatchWriter, WriterConfig};
use tempfile::tempdir;

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2021, 6, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Build a document with one series per entry of `sizes`; event `i` of
/// series `s` has value `s * 1000 + i`, one minute apart.
fn build_document(timezone: Option<&str>, sizes: &[usize]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<TimeSeries xmlns="http://www.wldelft.nl/fews/PI" version="1.2">
"#,
    );
    if let Some(tz) = timezone {
        xml.push_str(&format!("  <timeZone>{}</timeZone>\n", tz));
    }
    for (s, &n) in sizes.iter().enumerate() {
        xml.push_str(&format!(
            r#"  <series>
    <header>
      <type>instantaneous</type>
      <locationId>L{s}</locationId>
      <parameterId>WATHTE</parameterId>
      <timeStep unit="minute"/>
      <missVal>-999</missVal>
      <stationName>Location {s}</stationName>
      <units>cm</units>
    </header>
"#
        ));
        for i in 0..n {
            let ts = start() + TimeDelta::minutes(i as i64);
            xml.push_str(&format!(
                "    <event date=\"{}\" time=\"{}\" value=\"{}\" flag=\"0\"/>\n",
                ts.format("%Y-%m-%d"),
                ts.format("%H:%M:%S"),
                s * 1000 + i
            ));
        }
        xml.push_str("  </series>\n");
    }
    xml.push_str("</TimeSeries>\n");
    xml
}

fn write_document(dir: &Path, name: &str, xml: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, xml).unwrap();
    path
}

fn values_by_location(batches: &[Batch]) -> BTreeMap<String, Vec<f64>> {
    let mut out: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for batch in batches {
        for (key, row) in batch.data.rows() {
            out.entry(key.location_code.clone())
                .or_default()
                .push(row.value);
        }
    }
    out
}

/// Extract a file, write it to Parquet and check the footer
#[test]
fn test_file_to_parquet() {
    let dir = tempdir().unwrap();
    let input = write_document(dir.path(), "export.xml", &build_document(Some("1.0"), &[5, 0, 3]));
    let output = dir.path().join("export.pixml.parquet");

    let batches = BulkReader::new(input.clone())
        .with_chunk_size(4)
        .batches()
        .unwrap();
    let timezone = batches.timezone();
    assert_eq!(timezone.minutes(), Some(60));

    let mut writer = BatchWriter::new_file(&output, timezone, WriterConfig::default())
        .unwrap()
        .with_source_file("export.xml");
    writer.write_all(batches).unwrap();
    let stats = writer.finish().unwrap();

    assert_eq!(stats.rows_written, 8);
    assert_eq!(stats.series_written, 3);
    assert_eq!(stats.batches_written, 2);

    let reader = SerializedFileReader::new(File::open(&output).unwrap()).unwrap();
    let file_metadata = reader.metadata().file_metadata();
    assert_eq!(file_metadata.num_rows(), 8);

    let kv = file_metadata.key_value_metadata().unwrap();
    let get = |key: &str| {
        kv.iter()
            .find(|entry| entry.key == key)
            .and_then(|entry| entry.value.clone())
    };
    assert_eq!(get(KEY_TIMEZONE).as_deref(), Some("+01:00"));
    assert_eq!(get(KEY_SOURCE_FILE).as_deref(), Some("export.xml"));
    let series: Vec<serde_json::Value> = serde_json::from_str(&get(KEY_SERIES).unwrap()).unwrap();
    let locations: Vec<&str> = series
        .iter()
        .map(|s| s["location_code"].as_str().unwrap())
        .collect();
    assert_eq!(locations, vec!["L0", "L1", "L2"]);

    let rows: usize = ParquetRecordBatchReaderBuilder::try_new(File::open(&output).unwrap())
        .unwrap()
        .build()
        .unwrap()
        .map(|batch| batch.unwrap().num_rows())
        .sum();
    assert_eq!(rows, 8);
}

/// Duplicate series in a file are rejected before any batch
#[test]
fn test_file_with_duplicates_fails_fast() {
    let dir = tempdir().unwrap();
    let mut xml = build_document(None, &[2, 2]);
    xml = xml.replace("<locationId>L1</locationId>", "<locationId>L0</locationId>");
    let input = write_document(dir.path(), "dup.xml", &xml);

    match validate(input.as_path()) {
        Err(PiXmlError::DuplicateSeries {
            location_code,
            origin,
            ..
        }) => {
            assert_eq!(location_code, "L0");
            assert!(origin.ends_with("dup.xml"));
        }
        other => panic!("expected duplicate error, got {:?}", other),
    }
    assert!(extract(input.as_path(), 10).is_err());
    assert!(SeriesReader::new(input).series().is_err());
}

/// A document without a timeZone element yields naive batches
#[test]
fn test_timezone_tri_state() {
    let naive = MemorySource::from(build_document(None, &[1]));
    let utc = MemorySource::from(build_document(Some("0.0"), &[1]));
    let india = MemorySource::from(build_document(Some("5.5"), &[1]));

    assert_eq!(resolve_timezone(&naive).unwrap(), TimezoneOffset::NAIVE);
    assert_eq!(resolve_timezone(&utc).unwrap(), TimezoneOffset::UTC);
    assert_eq!(resolve_timezone(&india).unwrap().minutes(), Some(330));

    for (source, expected) in [(&naive, None), (&utc, Some(0)), (&india, Some(330))] {
        let batches: Vec<Batch> = extract(source, 10)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert!(batches.iter().all(|b| b.timezone.minutes() == expected));
    }
}

/// Rewrite a file into UTC and read it back
#[test]
fn test_rewrite_file_into_utc() {
    let dir = tempdir().unwrap();
    let input = write_document(dir.path(), "cet.xml", &build_document(Some("1.0"), &[3, 0, 2]));
    let output = dir.path().join("utc.xml");

    let batches = BulkReader::new(input).with_chunk_size(2).batches().unwrap();
    let config = PiXmlWriterConfig::default().with_timezone(TimezoneOffset::UTC);
    let mut writer = PiXmlWriter::new(BufWriter::new(File::create(&output).unwrap()), &config).unwrap();
    writer.write_batches(batches).unwrap();
    let (inner, stats) = writer.finish().unwrap();
    drop(inner);

    assert_eq!(stats.series_written, 3);
    assert_eq!(stats.events_written, 5);

    let written = fs::read_to_string(&output).unwrap();
    assert!(written.contains("<timeZone>0.0</timeZone>"));

    let series: Vec<_> = SeriesReader::new(output)
        .series()
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(series.len(), 3);
    assert!(series[1].is_empty());
    assert_eq!(series[0].timezone, TimezoneOffset::UTC);
    assert_eq!(series[0].events[0].timestamp, start() - TimeDelta::hours(1));
    assert_eq!(series[2].events[1].value, 2001.0);
    assert_eq!(series[2].header.location_name, "Location 2");
}

/// A document of only empty series still reports every header
#[test]
fn test_only_empty_series() {
    let source = MemorySource::from(build_document(None, &[0, 0, 0]));
    let batches: Vec<Batch> = extract(&source, 5)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(batches.len(), 1);
    assert!(batches[0].is_empty());
    assert_eq!(batches[0].metadata.len(), 3);

    let xml = {
        let mut writer = PiXmlWriter::new(Vec::new(), &PiXmlWriterConfig::compact()).unwrap();
        writer.write_batches(batches.into_iter().map(Ok)).unwrap();
        String::from_utf8(writer.finish().unwrap().0).unwrap()
    };
    assert_eq!(xml.matches("<series>").count(), 3);
    assert!(!xml.contains("<event"));
    assert!(!xml.contains("startDate"));
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Every event arrives exactly once, in document order, in full
        /// chunks followed by at most one partial chunk
        #[test]
        fn test_chunking_completeness(
            sizes in prop::collection::vec(0usize..12, 0..8),
            chunk_size in 1usize..20,
        ) {
            let source = MemorySource::from(build_document(Some("0.0"), &sizes));
            let batches: Vec<Batch> = extract(&source, chunk_size)
                .unwrap()
                .collect::<Result<_, _>>()
                .unwrap();

            let total: usize = sizes.iter().sum();
            prop_assert_eq!(batches.iter().map(Batch::len).sum::<usize>(), total);

            if let Some((last, full)) = batches.split_last() {
                prop_assert!(full.iter().all(|b| b.len() == chunk_size));
                prop_assert!(last.len() <= chunk_size);
            }
            for (i, batch) in batches.iter().enumerate() {
                prop_assert_eq!(batch.index, i);
                for (key, _) in batch.data.rows() {
                    prop_assert!(batch.header(key).is_some());
                }
            }

            let by_location = values_by_location(&batches);
            for (s, &n) in sizes.iter().enumerate() {
                let expected: Vec<f64> = (0..n).map(|i| (s * 1000 + i) as f64).collect();
                let actual = by_location.get(&format!("L{}", s)).cloned().unwrap_or_default();
                prop_assert_eq!(actual, expected);
            }

            let reported: BTreeSet<SeriesKey> = batches
                .iter()
                .flat_map(|b| b.metadata.iter().map(|h| h.key()))
                .collect();
            prop_assert_eq!(reported.len(), sizes.len());
        }
    }
}
