use super::parse::{parse_event, parse_series_header};
use super::*;
use crate::model::{EventRow, SeriesHeader, SeriesIdentity, TimezoneOffset};
use chrono::NaiveDate;

const HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TimeSeries xmlns="http://www.wldelft.nl/fews/PI" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" version="1.2">"#;

fn series_xml(location: &str, parameter: &str, events: usize) -> String {
    let mut xml = format!(
        r#"<series>
  <header>
    <type>instantaneous</type>
    <locationId>{location}</locationId>
    <parameterId>{parameter}</parameterId>
    <timeStep unit="second" multiplier="900"/>
    <missVal>-999</missVal>
    <stationName>Station {location}</stationName>
    <lat>52.1</lat>
    <lon>4.3</lon>
    <units>m</units>
  </header>
"#
    );
    for i in 0..events {
        xml.push_str(&format!(
            "  <event date=\"2020-01-01\" time=\"{:02}:00:00\" value=\"{}.5\" flag=\"0\"/>\n",
            i % 24,
            i
        ));
    }
    xml.push_str("</series>\n");
    xml
}

fn document(timezone: Option<&str>, series: &[String]) -> MemorySource {
    let mut xml = HEAD.to_string();
    if let Some(tz) = timezone {
        xml.push_str(&format!("<timeZone>{}</timeZone>\n", tz));
    }
    for s in series {
        xml.push_str(s);
    }
    xml.push_str("</TimeSeries>\n");
    MemorySource::from(xml)
}

fn collect(source: &MemorySource, chunk_size: usize) -> Vec<crate::model::Batch> {
    extract(source, chunk_size)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn names(batch: &crate::model::Batch) -> Vec<String> {
    batch
        .metadata
        .iter()
        .map(|h| h.location_code.clone())
        .collect()
}

// ---------------------------------------------------------------------------
// Pruner
// ---------------------------------------------------------------------------

#[test]
fn test_pruner_preserves_order() {
    let xml = "<a><b>1</b><c>2</c><b>3</b></a>";
    let nodes: Vec<PrunedNode> = Pruner::new(xml.as_bytes(), &["b", "c"])
        .collect::<Result<_, _>>()
        .unwrap();

    let seen: Vec<(&str, &str)> = nodes
        .iter()
        .map(|n| (n.element.name.as_str(), n.element.text.as_str()))
        .collect();
    assert_eq!(seen, vec![("b", "1"), ("c", "2"), ("b", "3")]);
    assert!(nodes.iter().all(|n| n.event == NodeEvent::End && n.depth == 1));
}

#[test]
fn test_pruner_detaches_consumed_siblings() {
    let xml = "<a><b/><d/><b/><e/></a>";
    let nodes: Vec<PrunedNode> = Pruner::new(xml.as_bytes(), &["a", "b"])
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(nodes.len(), 3);
    let root = &nodes[2].element;
    assert_eq!(root.name, "a");
    let children: Vec<&str> = root.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(children, vec!["e"]);
}

#[test]
fn test_pruner_keeps_subtree_of_yielded_element() {
    let xml = r#"<root><skip><x>ignored</x></skip><keep id="k"><x>1</x><y><z>2</z></y></keep></root>"#;
    let nodes: Vec<PrunedNode> = Pruner::new(xml.as_bytes(), &["keep"])
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(nodes.len(), 1);
    let keep = &nodes[0].element;
    assert_eq!(keep.attr("id"), Some("k"));
    assert_eq!(keep.child_text("x"), Some("1"));
    assert_eq!(keep.child("y").and_then(|y| y.child_text("z")), Some("2"));
}

#[test]
fn test_pruner_start_and_end_events() {
    let xml = r#"<a x="1"><b/></a>"#;
    let nodes: Vec<PrunedNode> = Pruner::new(xml.as_bytes(), &["a"])
        .with_events(true, true)
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].event, NodeEvent::Start);
    assert_eq!(nodes[0].element.attr("x"), Some("1"));
    assert!(nodes[0].element.children.is_empty());
    assert_eq!(nodes[1].event, NodeEvent::End);
    assert_eq!(nodes[1].element.children.len(), 1);
    assert_eq!(nodes[1].depth, 0);
}

#[test]
fn test_pruner_unescapes_text_and_attributes() {
    let xml = r#"<a t="x &amp; y">&lt;ok&gt;</a>"#;
    let node = Pruner::new(xml.as_bytes(), &["a"]).next().unwrap().unwrap();
    assert_eq!(node.element.attr("t"), Some("x & y"));
    assert_eq!(node.element.text, "<ok>");
}

#[test]
fn test_pruner_strips_namespace_prefixes() {
    let xml = r#"<pi:a xmlns:pi="urn:x" pi:k="v"><pi:b>t</pi:b></pi:a>"#;
    let node = Pruner::new(xml.as_bytes(), &["a"]).next().unwrap().unwrap();
    assert_eq!(node.element.name, "a");
    assert_eq!(node.element.attributes, vec![("k".to_string(), "v".to_string())]);
    assert_eq!(node.element.child_text("b"), Some("t"));
}

#[test]
fn test_pruner_mismatched_tags_fail_and_fuse() {
    let xml = "<a><b></a>";
    let mut pruner = Pruner::new(xml.as_bytes(), &[]);
    let results: Vec<_> = pruner.by_ref().collect();
    assert!(results.last().map_or(false, |r| r.is_err()));
    assert!(pruner.next().is_none());
}

#[test]
fn test_pruner_unclosed_document_fails() {
    let xml = "<a><b/>";
    let results: Vec<_> = Pruner::new(xml.as_bytes(), &["b"]).collect();
    match results.last() {
        Some(Err(PiXmlError::InvalidStructure(message))) => {
            assert!(message.contains("<a>"));
            assert!(message.contains("at byte 7"));
        }
        other => panic!("expected unclosed document error, got {:?}", other),
    }
}

#[test]
fn test_pruner_byte_position_advances() {
    let xml = "<a><b>1</b><b>2</b></a>";
    let mut pruner = Pruner::new(xml.as_bytes(), &["b"]);
    assert_eq!(pruner.byte_position(), 0);
    pruner.next_node().unwrap();
    let first = pruner.byte_position();
    assert_eq!(first, 11);
    pruner.next_node().unwrap();
    assert_eq!(pruner.byte_position(), 19);
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[test]
fn test_parse_value_against_sentinel() {
    assert!(parse_value(Some("-999"), "-999").is_nan());
    assert_eq!(parse_value(Some("-999.0"), "-999"), -999.0);
    assert_eq!(parse_value(Some("1.25"), "-999"), 1.25);
    assert!(parse_value(None, "-999").is_nan());
    assert!(parse_value(Some("n/a"), "-999").is_nan());
    assert!(parse_value(Some(""), "-999").is_nan());
}

#[test]
fn test_parse_flag() {
    assert_eq!(parse_flag("2"), Some(2));
    assert_eq!(parse_flag(" 9 "), Some(9));
    assert_eq!(parse_flag("2.0"), Some(2));
    assert_eq!(parse_flag("2.5"), None);
    assert_eq!(parse_flag("good"), None);
}

#[test]
fn test_parse_timezone_values() {
    assert_eq!(parse_timezone("").unwrap(), TimezoneOffset::UTC);
    assert_eq!(parse_timezone("1.0").unwrap().minutes(), Some(60));
    assert_eq!(parse_timezone("-3.5").unwrap().minutes(), Some(-210));
    assert_eq!(parse_timezone("5.75").unwrap().minutes(), Some(345));
    assert!(matches!(
        parse_timezone("CET"),
        Err(PiXmlError::InvalidTimezone(_))
    ));
    assert!(parse_timezone("25").is_err());
    assert!(parse_timezone("24").is_err());
    assert!(parse_timezone("-24.0").is_err());
    assert_eq!(parse_timezone("23.75").unwrap().minutes(), Some(1425));
}

#[test]
fn test_parse_timestamp_with_fraction() {
    let ts = parse_timestamp("2021-06-30", "23:59:59.250").unwrap();
    let expected = NaiveDate::from_ymd_opt(2021, 6, 30)
        .unwrap()
        .and_hms_milli_opt(23, 59, 59, 250)
        .unwrap();
    assert_eq!(ts, expected);
    assert!(parse_timestamp("2021-13-01", "00:00:00").is_none());
    assert!(parse_timestamp("2021-01-01", "").is_none());
}

#[test]
fn test_parse_series_header_fields() {
    let xml = series_xml("L1", "H.meting", 0)
        .replace("</series>", "<comment>checked</comment></series>");
    let node = Pruner::new(xml.as_bytes(), &["series"]).next().unwrap().unwrap();
    let header = parse_series_header(&node.element, "#1").unwrap();

    assert_eq!(header.location_code, "L1");
    assert_eq!(header.code(), "H.meting::second::1::900");
    assert_eq!(header.unit.as_deref(), Some("m"));
    assert_eq!(header.location_name, "Station L1");
    assert_eq!(header.missing_value, "-999");
    assert_eq!(header.comment.as_deref(), Some("checked"));
    assert_eq!(header.series_type.as_deref(), Some("instantaneous"));
    assert!((header.lat - 52.1).abs() < 1e-9);
}

#[test]
fn test_parse_series_header_defaults() {
    let xml = r#"<series><header>
        <locationId>L</locationId><parameterId>P</parameterId><timeStep unit="day"/>
    </header></series>"#;
    let node = Pruner::new(xml.as_bytes(), &["series"]).next().unwrap().unwrap();
    let header = parse_series_header(&node.element, "#1").unwrap();

    assert_eq!(header.missing_value, "NaN");
    assert!(header.lat.is_nan() && header.lon.is_nan());
    assert_eq!(header.location_name, "");
    assert!(header.unit.is_none());
    assert!(header.comment.is_none());
}

#[test]
fn test_parse_series_header_missing_time_step() {
    let xml = "<series><header><locationId>L</locationId><parameterId>P</parameterId></header></series>";
    let node = Pruner::new(xml.as_bytes(), &["series"]).next().unwrap().unwrap();
    let err = parse_series_header(&node.element, "#4").unwrap_err();
    match err {
        PiXmlError::MalformedHeader { series, reason } => {
            assert_eq!(series, "#4");
            assert!(reason.contains("timeStep"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_parse_event_optional_attributes() {
    let header = SeriesHeader::new(SeriesIdentity::new("P", "hour"), "L").with_missing_value("-1");
    let xml = r#"<event date="2020-02-29" time="12:00:00" value="-1" user="jdoe" flagSource="MAN"/>"#;
    let node = Pruner::new(xml.as_bytes(), &["event"]).next().unwrap().unwrap();
    let row = parse_event(&node.element, &header).unwrap();

    assert!(row.value.is_nan());
    assert_eq!(row.flag, None);
    assert_eq!(row.flag_source.as_deref(), Some("MAN"));
    assert_eq!(row.comment, None);
    assert_eq!(row.user.as_deref(), Some("jdoe"));
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn test_validate_distinct_series() {
    let source = document(None, &[series_xml("A", "P", 2), series_xml("B", "P", 1)]);
    let summary = validate(&source).unwrap();
    assert_eq!(summary.series_count, 2);
}

#[test]
fn test_validate_rejects_duplicate() {
    let source = MemorySource::new(
        "dup.xml",
        format!(
            "{}{}{}{}</TimeSeries>",
            HEAD,
            series_xml("A", "P", 1),
            series_xml("B", "P", 1),
            series_xml("A", "P", 0)
        ),
    );
    match validate(&source).unwrap_err() {
        PiXmlError::DuplicateSeries {
            code,
            location_code,
            origin,
        } => {
            assert_eq!(code, "P::second::1::900");
            assert_eq!(location_code, "A");
            assert_eq!(origin, "dup.xml");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_validate_time_step_participates_in_key() {
    let xml = format!(
        r#"{HEAD}
<series><header><locationId>A</locationId><parameterId>P</parameterId><timeStep unit="second" multiplier="900"/></header></series>
<series><header><locationId>A</locationId><parameterId>P</parameterId><timeStep unit="second" multiplier="3600"/></header></series>
</TimeSeries>"#
    );
    assert!(validate(&MemorySource::from(xml)).is_ok());
}

#[test]
fn test_validate_default_divider_matches_explicit_one() {
    let xml = format!(
        r#"{HEAD}
<series><header><locationId>A</locationId><parameterId>P</parameterId><timeStep unit="day"/></header></series>
<series><header><locationId>A</locationId><parameterId>P</parameterId><timeStep unit="day" divider="1" multiplier="1"/></header></series>
</TimeSeries>"#
    );
    assert!(matches!(
        validate(&MemorySource::from(xml)),
        Err(PiXmlError::DuplicateSeries { .. })
    ));
}

#[test]
fn test_validate_malformed_header() {
    let xml = format!(
        r#"{HEAD}<series><header><parameterId>P</parameterId><timeStep unit="day"/></header></series></TimeSeries>"#
    );
    assert!(matches!(
        validate(&MemorySource::from(xml)),
        Err(PiXmlError::MalformedHeader { .. })
    ));
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

#[test]
fn test_extract_carry_over_metadata() {
    let source = document(
        None,
        &[
            series_xml("A", "P", 3),
            series_xml("B", "P", 0),
            series_xml("C", "P", 4),
        ],
    );
    let batches = collect(&source, 2);

    let lengths: Vec<usize> = batches.iter().map(|b| b.len()).collect();
    assert_eq!(lengths, vec![2, 2, 2, 1]);
    assert_eq!(names(&batches[0]), vec!["A"]);
    assert_eq!(names(&batches[1]), vec!["A", "B", "C"]);
    assert_eq!(names(&batches[2]), vec!["C"]);
    assert_eq!(names(&batches[3]), vec!["C"]);

    let indices: Vec<usize> = batches.iter().map(|b| b.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
}

#[test]
fn test_extract_reproduces_source_order() {
    let source = document(None, &[series_xml("A", "P", 5), series_xml("B", "Q", 6)]);
    for chunk_size in 1..=12 {
        let batches = collect(&source, chunk_size);
        let rows: Vec<(String, f64)> = batches
            .iter()
            .flat_map(|b| {
                b.data
                    .rows()
                    .map(|(k, r)| (k.location_code.clone(), r.value))
                    .collect::<Vec<_>>()
            })
            .collect();

        assert_eq!(rows.len(), 11, "chunk size {chunk_size}");
        assert_eq!(rows[0], ("A".to_string(), 0.5));
        assert_eq!(rows[4], ("A".to_string(), 4.5));
        assert_eq!(rows[5], ("B".to_string(), 0.5));
        assert_eq!(rows[10], ("B".to_string(), 5.5));
        assert!(batches[..batches.len() - 1]
            .iter()
            .all(|b| b.len() == chunk_size));
    }
}

#[test]
fn test_extract_exact_division_has_no_trailing_batch() {
    let source = document(None, &[series_xml("A", "P", 4)]);
    let batches = collect(&source, 2);
    assert_eq!(batches.len(), 2);
    assert!(batches.iter().all(|b| b.len() == 2));
}

#[test]
fn test_extract_chunk_larger_than_document() {
    let source = document(None, &[series_xml("A", "P", 3), series_xml("B", "P", 0)]);
    let batches = collect(&source, 1000);
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 3);
    assert_eq!(names(&batches[0]), vec!["A", "B"]);
}

#[test]
fn test_extract_only_empty_series() {
    let source = document(None, &[series_xml("A", "P", 0), series_xml("B", "P", 0)]);
    let batches = collect(&source, 10);
    assert_eq!(batches.len(), 1);
    assert!(batches[0].is_empty());
    assert_eq!(names(&batches[0]), vec!["A", "B"]);
}

#[test]
fn test_extract_no_series() {
    let source = document(Some("0.0"), &[]);
    assert!(collect(&source, 10).is_empty());
}

#[test]
fn test_extract_rejects_zero_chunk_size() {
    let source = document(None, &[series_xml("A", "P", 1)]);
    assert!(matches!(
        extract(&source, 0),
        Err(PiXmlError::InvalidChunkSize)
    ));
}

#[test]
fn test_extract_config_presets() {
    assert_eq!(ExtractConfig::default().chunk_size, DEFAULT_CHUNK_SIZE);
    assert!(ExtractConfig::small().chunk_size < ExtractConfig::bulk().chunk_size);
    assert!(ExtractConfig::with_chunk_size(0).check().is_err());

    let config: ExtractConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, ExtractConfig::default());

    let source = document(None, &[series_xml("A", "P", 3)]);
    let reader = BulkReader::with_config(source, ExtractConfig::small()).with_chunk_size(2);
    assert_eq!(reader.config().chunk_size, 2);
    let lengths: Vec<usize> = reader.batches().unwrap().map(|b| b.unwrap().len()).collect();
    assert_eq!(lengths, vec![2, 1]);
}

#[test]
fn test_extract_rejects_duplicates_before_data() {
    let source = document(None, &[series_xml("A", "P", 1), series_xml("A", "P", 1)]);
    assert!(matches!(
        BulkReader::new(source).with_chunk_size(1).batches(),
        Err(PiXmlError::DuplicateSeries { .. })
    ));
}

#[test]
fn test_extract_sentinel_and_attributes() {
    let xml = format!(
        r#"{HEAD}
<series>
  <header><locationId>L</locationId><parameterId>P</parameterId><timeStep unit="hour"/><missVal>-999</missVal></header>
  <event date="2020-01-01" time="00:00:00" value="-999" flag="3" comment="frozen"/>
  <event date="2020-01-01" time="01:00:00" value="garbage" flag="x"/>
  <event date="2020-01-01" time="02:00:00"/>
  <event date="2020-01-01" time="03:00:00" value="0.125" user="ops"/>
  <comment>series note</comment>
</series>
</TimeSeries>"#
    );
    let batches = collect(&MemorySource::from(xml), 100);
    let batch = &batches[0];
    let data = &batch.data;

    assert!(data.value[0].is_nan());
    assert!(data.value[1].is_nan());
    assert!(data.value[2].is_nan());
    assert_eq!(data.value[3], 0.125);
    assert_eq!(data.flag, vec![Some(3), None, None, None]);
    assert_eq!(data.comment[0].as_deref(), Some("frozen"));
    assert_eq!(data.user[3].as_deref(), Some("ops"));
    assert!(data.user[0].is_none());
    assert_eq!(batch.metadata[0].comment.as_deref(), Some("series note"));
}

#[test]
fn test_extract_stamps_timezone() {
    let source = document(Some("1.0"), &[series_xml("A", "P", 3)]);
    let batches = collect(&source, 2);
    assert!(batches
        .iter()
        .all(|b| b.timezone == TimezoneOffset::from_minutes(60)));

    let naive = document(None, &[series_xml("A", "P", 3)]);
    assert!(collect(&naive, 2).iter().all(|b| b.timezone.is_naive()));

    let empty = document(Some(""), &[series_xml("A", "P", 1)]);
    assert_eq!(collect(&empty, 2)[0].timezone, TimezoneOffset::UTC);
}

#[test]
fn test_extract_timezone_known_before_first_batch() {
    let source = document(Some("1.0"), &[series_xml("A", "P", 3)]);
    let mut batches = extract(&source, 2).unwrap();
    assert_eq!(batches.timezone().minutes(), Some(60));
    let first = batches.next().unwrap().unwrap();
    assert_eq!(first.timezone, batches.timezone());

    let utc = extract(&document(Some(""), &[series_xml("A", "P", 1)]), 2).unwrap();
    assert_eq!(utc.timezone(), TimezoneOffset::UTC);
    let naive = extract(&document(None, &[series_xml("A", "P", 1)]), 2).unwrap();
    assert!(naive.timezone().is_naive());
}

#[test]
fn test_extract_ignores_late_timezone() {
    let xml = format!(
        "{}{}<timeZone>2.0</timeZone></TimeSeries>",
        HEAD,
        series_xml("A", "P", 1)
    );
    let batches = collect(&MemorySource::from(xml), 10);
    assert!(batches[0].timezone.is_naive());
}

#[test]
fn test_extract_invalid_timestamp_fuses() {
    let xml = format!(
        r#"{HEAD}
<series>
  <header><locationId>L</locationId><parameterId>P</parameterId><timeStep unit="hour"/></header>
  <event date="2020-01-01" time="00:00:00" value="1"/>
  <event date="2020-01-01" time="01:00:00" value="2"/>
  <event date="01/01/2020" time="02:00:00" value="3"/>
</series>
</TimeSeries>"#
    );
    let mut batches = extract(&MemorySource::from(xml), 1).unwrap();
    assert!(batches.next().unwrap().is_ok());
    assert!(matches!(
        batches.next(),
        Some(Err(PiXmlError::InvalidTimestamp { .. }))
    ));
    assert!(batches.next().is_none());
}

#[test]
fn test_extract_counters() {
    let source = document(None, &[series_xml("A", "P", 3), series_xml("B", "P", 2)]);
    let mut batches = extract(&source, 2).unwrap();
    let total: usize = batches.by_ref().map(|b| b.unwrap().len()).sum();
    assert_eq!(total, 5);
    assert_eq!(batches.rows_emitted(), 5);
    assert_eq!(batches.series_count(), 2);
}

// ---------------------------------------------------------------------------
// Timezone resolver and series reader
// ---------------------------------------------------------------------------

#[test]
fn test_resolve_timezone_tri_state() {
    let empty = document(Some(""), &[series_xml("A", "P", 1)]);
    assert_eq!(resolve_timezone(&empty).unwrap(), TimezoneOffset::UTC);

    let numeric = document(Some("-2.5"), &[series_xml("A", "P", 1)]);
    assert_eq!(resolve_timezone(&numeric).unwrap().minutes(), Some(-150));

    let absent = document(None, &[series_xml("A", "P", 1)]);
    assert!(resolve_timezone(&absent).unwrap().is_naive());
}

#[test]
fn test_resolve_timezone_stops_at_first_series() {
    let xml = format!(
        "{}{}<timeZone>3.0</timeZone></TimeSeries>",
        HEAD,
        series_xml("A", "P", 1)
    );
    assert!(resolve_timezone(&MemorySource::from(xml)).unwrap().is_naive());
}

#[test]
fn test_series_reader() {
    let source = document(Some("0.0"), &[series_xml("A", "P", 2), series_xml("B", "P", 0)]);
    let series: Vec<Series> = SeriesReader::new(source)
        .series()
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(series.len(), 2);
    assert_eq!(series[0].len(), 2);
    assert!(series[1].is_empty());
    assert_eq!(series[1].header.location_code, "B");
    assert_eq!(series[0].timezone, TimezoneOffset::UTC);
}

// ---------------------------------------------------------------------------
// Serializer
// ---------------------------------------------------------------------------

fn ts(h: u32, m: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 3, 1)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn sample_header() -> SeriesHeader {
    SeriesHeader::new(SeriesIdentity::new("Q.meting", "minute").with_multiplier(15), "KST01")
        .with_unit("m3/s")
        .with_location_name("Kasteel")
        .with_coordinates(51.9, 5.1)
        .with_missing_value("-999")
        .with_comment("validated")
}

#[test]
fn test_writer_root_and_timezone_placement() {
    let config = PiXmlWriterConfig::default().with_timezone(TimezoneOffset::from_minutes(60));
    let mut writer = PiXmlWriter::new(Vec::new(), &config).unwrap();
    writer
        .write_series(&sample_header(), &[EventRow::new(ts(0, 0), 1.0)], TimezoneOffset::from_minutes(60))
        .unwrap();
    let (bytes, stats) = writer.finish().unwrap();
    let xml = String::from_utf8(bytes).unwrap();

    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains(r#"xmlns="http://www.wldelft.nl/fews/PI""#));
    assert!(xml.contains(r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#));
    assert!(xml.contains(
        r#"xsi:schemaLocation="http://www.wldelft.nl/fews/PI http://fews.wldelft.nl/schemas/version1.0/pi-schemas/pi_timeseries.xsd""#
    ));
    assert!(xml.contains(r#"version="1.2""#));

    let tz = xml.find("<timeZone>1.0</timeZone>").unwrap();
    let series = xml.find("<series>").unwrap();
    assert!(tz < series);
    assert_eq!(stats.series_written, 1);
    assert_eq!(stats.events_written, 1);
}

#[test]
fn test_writer_header_and_events() {
    let rows = vec![
        EventRow::new(ts(0, 0), 1.5).with_flag(0),
        EventRow::new(ts(0, 15), f64::NAN).with_user("ops"),
        EventRow::new(ts(0, 30), 2.0).with_comment("a < b"),
    ];
    let mut writer = PiXmlWriter::new(Vec::new(), &PiXmlWriterConfig::compact()).unwrap();
    writer
        .write_series(&sample_header(), &rows, TimezoneOffset::NAIVE)
        .unwrap();
    let (bytes, stats) = writer.finish().unwrap();
    let xml = String::from_utf8(bytes).unwrap();

    assert!(xml.contains(r#"<timeStep unit="minute" multiplier="15"/>"#));
    assert!(xml.contains(r#"<startDate date="2020-03-01" time="00:00:00"/>"#));
    assert!(xml.contains(r#"<endDate date="2020-03-01" time="00:30:00"/>"#));
    assert!(xml.contains("<missVal>-999</missVal>"));
    assert!(xml.contains("<type>instantaneous</type>"));
    assert!(xml.contains(r#"<event date="2020-03-01" time="00:00:00" value="1.5" flag="0"/>"#));
    assert!(xml.contains(r#"value="-999" user="ops""#));
    assert!(xml.contains(r#"comment="a &lt; b""#));
    assert!(!xml.contains("<timeZone>"));

    let last_event = xml.rfind("<event").unwrap();
    let comment = xml.find("<comment>validated</comment>").unwrap();
    assert!(last_event < comment);
    assert_eq!(stats.missing_values, 1);
}

#[test]
fn test_writer_empty_series_has_no_dates() {
    let mut writer = PiXmlWriter::new(Vec::new(), &PiXmlWriterConfig::compact()).unwrap();
    writer
        .write_series(&sample_header(), &[], TimezoneOffset::NAIVE)
        .unwrap();
    let (bytes, _) = writer.finish().unwrap();
    let xml = String::from_utf8(bytes).unwrap();
    assert!(xml.contains("<series>"));
    assert!(!xml.contains("startDate"));
    assert!(!xml.contains("<event"));
}

#[test]
fn test_writer_malformed_header_writes_nothing() {
    let mut writer = PiXmlWriter::new(Vec::new(), &PiXmlWriterConfig::compact()).unwrap();
    let header = SeriesHeader::new(SeriesIdentity::new("", "minute"), "L");
    let err = writer
        .write_series(&header, &[EventRow::new(ts(1, 0), 1.0)], TimezoneOffset::NAIVE)
        .unwrap_err();
    assert!(matches!(err, PiXmlError::MalformedHeader { .. }));

    let (bytes, stats) = writer.finish().unwrap();
    let xml = String::from_utf8(bytes).unwrap();
    assert!(!xml.contains("<series"));
    assert_eq!(stats.series_written, 0);
}

#[test]
fn test_writer_converts_offsets() {
    let config = PiXmlWriterConfig::compact().with_timezone(TimezoneOffset::from_minutes(60));
    let mut writer = PiXmlWriter::new(Vec::new(), &config).unwrap();
    writer
        .write_series(&sample_header(), &[EventRow::new(ts(23, 30), 1.0)], TimezoneOffset::UTC)
        .unwrap();
    let (bytes, _) = writer.finish().unwrap();
    let xml = String::from_utf8(bytes).unwrap();
    assert!(xml.contains(r#"<event date="2020-03-02" time="00:30:00" value="1"/>"#));
}

#[test]
fn test_write_then_extract_round_trip() {
    let rows = vec![
        EventRow::new(ts(0, 0), 0.1).with_flag(2).with_flag_source("AUTO"),
        EventRow::new(ts(0, 15), f64::NAN),
        EventRow::new(ts(0, 30), -12345.678901234).with_user("jdoe").with_comment("note"),
    ];
    let series = Series {
        header: sample_header(),
        events: rows.clone(),
        timezone: TimezoneOffset::from_minutes(-180),
    };
    let config = PiXmlWriterConfig::default().with_timezone(TimezoneOffset::from_minutes(-180));
    let xml = to_string([&series], &config).unwrap();

    let batches = collect(&MemorySource::from(xml), 2);
    assert_eq!(batches.iter().map(|b| b.len()).sum::<usize>(), 3);
    assert_eq!(batches[0].timezone.minutes(), Some(-180));

    let back: Vec<EventRow> = batches.iter().flat_map(|b| b.data.rows().map(|(_, r)| r)).collect();
    for (original, read) in rows.iter().zip(&back) {
        assert_eq!(original.timestamp, read.timestamp);
        assert_eq!(original.value.is_nan(), read.value.is_nan());
        if !original.value.is_nan() {
            assert_eq!(original.value, read.value);
        }
        assert_eq!(original.flag, read.flag);
        assert_eq!(original.flag_source, read.flag_source);
        assert_eq!(original.comment, read.comment);
        assert_eq!(original.user, read.user);
    }

    let header = &batches[0].metadata[0];
    let expected = sample_header();
    assert_eq!(header.key(), expected.key());
    assert_eq!(header.unit, expected.unit);
    assert_eq!(header.location_name, expected.location_name);
    assert_eq!((header.lat, header.lon), (51.9, 5.1));
    assert_eq!(header.missing_value, "-999");
    assert_eq!(header.comment.as_deref(), Some("validated"));
}

#[test]
fn test_write_value_equal_to_sentinel_survives() {
    let rows = vec![
        EventRow::new(ts(0, 0), -999.0),
        EventRow::new(ts(0, 15), f64::NAN),
    ];
    let series = Series {
        header: sample_header(),
        events: rows,
        timezone: TimezoneOffset::NAIVE,
    };
    let xml = to_string([&series], &PiXmlWriterConfig::compact()).unwrap();
    assert!(xml.contains(r#"time="00:00:00" value="-999.0""#));
    assert!(xml.contains(r#"time="00:15:00" value="-999""#));

    let batches = collect(&MemorySource::from(xml), 10);
    let values: Vec<f64> = batches[0].data.rows().map(|(_, r)| r.value).collect();
    assert_eq!(values[0], -999.0);
    assert!(values[1].is_nan());
}

#[test]
fn test_write_batches_matches_series_output() {
    let source = document(
        Some("0.0"),
        &[
            series_xml("A", "P", 5),
            series_xml("B", "P", 0),
            series_xml("C", "P", 3),
        ],
    );
    let config = PiXmlWriterConfig::default().with_timezone(TimezoneOffset::UTC);

    let mut from_batches = PiXmlWriter::new(Vec::new(), &config).unwrap();
    from_batches.write_batches(extract(&source, 2).unwrap()).unwrap();
    let (batched, stats) = from_batches.finish().unwrap();

    let series: Vec<Series> = SeriesReader::new(source)
        .series()
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    let direct = to_string(&series, &config).unwrap();

    assert_eq!(String::from_utf8(batched).unwrap(), direct);
    assert_eq!(stats.series_written, 3);
    assert_eq!(stats.events_written, 8);
}
