use anyhow::{Context, Result};
use std::path::PathBuf;

use pixml::pixml::{resolve_timezone, SeriesReader};

/// Display the series of a PI-XML document
pub fn run(input: PathBuf) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("File does not exist: {}", input.display());
    }

    let timezone = resolve_timezone(input.as_path()).context("Failed to read timeZone")?;
    let reader = SeriesReader::new(input.clone());
    let series = reader
        .series()
        .with_context(|| format!("Failed to read {}", input.display()))?;

    println!("PI-XML File Information");
    println!("=======================");
    println!("File: {}", input.display());
    println!("Timezone: {}", timezone);
    println!();

    println!("Series:");
    let mut series_count = 0usize;
    let mut event_count = 0usize;
    for series in series {
        let series = series.context("Failed to read series")?;
        let header = &series.header;
        let range = match (series.events.first(), series.events.last()) {
            (Some(first), Some(last)) => format!("{} .. {}", first.timestamp, last.timestamp),
            _ => "no events".to_string(),
        };
        println!(
            "  {:4}. {} @ {} ({}): {} events, {}",
            series_count + 1,
            header.code(),
            header.location_code,
            header.unit.as_deref().unwrap_or("-"),
            series.len(),
            range
        );
        series_count += 1;
        event_count += series.len();
    }
    println!();

    println!("Totals:");
    println!("  Series: {}", series_count);
    println!("  Events: {}", event_count);

    Ok(())
}
