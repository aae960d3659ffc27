use log::debug;

use super::parse::parse_timezone;
use super::pruner::{NodeEvent, Pruner};
use super::source::XmlSource;
use super::{tags, PiXmlError};
use crate::model::TimezoneOffset;

/// Resolve the document-level fixed offset of a PI-XML source.
///
/// Only a `timeZone` element directly under the root counts, and the scan
/// stops at the first series since the schema places the element before
/// them. Returns [`TimezoneOffset::NAIVE`] when there is none; an empty
/// element means UTC.
pub fn resolve_timezone<S: XmlSource + ?Sized>(source: &S) -> Result<TimezoneOffset, PiXmlError> {
    let pruner = Pruner::new(source.open()?, &[tags::TIME_ZONE, tags::SERIES]).with_events(true, true);

    for node in pruner {
        let node = node?;
        match (node.event, node.element.name.as_str()) {
            (NodeEvent::Start, tags::SERIES) => break,
            (NodeEvent::End, tags::TIME_ZONE) if node.depth == 1 => {
                let offset = parse_timezone(&node.element.text)?;
                debug!("{}: timeZone resolves to {}", source.describe(), offset);
                return Ok(offset);
            }
            _ => {}
        }
    }

    debug!("{}: no timeZone element", source.describe());
    Ok(TimezoneOffset::NAIVE)
}
