use std::collections::HashSet;

use log::info;

use super::parse::parse_key;
use super::pruner::Pruner;
use super::source::XmlSource;
use super::{tags, PiXmlError};
use crate::model::SeriesKey;

/// Outcome of a successful [`validate`] pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    /// Number of series headers seen
    pub series_count: usize,
}

/// Check that no two series of a document share identity and location.
///
/// Streams only the `header` elements of a fresh reading of `source`, so the
/// cost is one pass over the document with memory proportional to the number
/// of distinct series. Fails on the first repeated key.
pub fn validate<S: XmlSource + ?Sized>(source: &S) -> Result<ValidationSummary, PiXmlError> {
    let mut seen: HashSet<SeriesKey> = HashSet::new();

    for node in Pruner::new(source.open()?, &[tags::HEADER]) {
        let node = node?;
        let position = format!("#{}", seen.len() + 1);
        let key = parse_key(&node.element, &position)?;

        if seen.contains(&key) {
            return Err(PiXmlError::DuplicateSeries {
                code: key.code(),
                location_code: key.location_code,
                origin: source.describe(),
            });
        }
        seen.insert(key);
    }

    info!("{}: {} series, no duplicates", source.describe(), seen.len());
    Ok(ValidationSummary {
        series_count: seen.len(),
    })
}
