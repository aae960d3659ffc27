use anyhow::Result;
use log::info;
use std::path::PathBuf;

/// Check a PI-XML document for duplicate series
pub fn run(input: PathBuf) -> Result<()> {
    use pixml::pixml::{resolve_timezone, validate};

    info!("pixml Validator");
    info!("===============");
    info!("File: {}", input.display());

    let summary = match validate(input.as_path()) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Validation error: {}", e);
            std::process::exit(1);
        }
    };

    match resolve_timezone(input.as_path()) {
        Ok(timezone) => {
            println!("OK: {} distinct series", summary.series_count);
            println!("Timezone: {}", timezone);
            Ok(())
        }
        Err(e) => {
            eprintln!("Validation error: {}", e);
            std::process::exit(1);
        }
    }
}
