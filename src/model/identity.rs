use std::fmt;

use serde::Serialize;

/// Identity of a time series independent of its location.
///
/// The textual form (see [`SeriesIdentity::code`]) is
/// `parameterId::unit::divider::multiplier`, the series code used by
/// downstream stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SeriesIdentity {
    /// `parameterId` element of the header
    pub parameter_id: String,
    /// `unit` attribute of the `timeStep` element
    pub timestep_unit: String,
    /// `divider` attribute of the `timeStep` element (default 1)
    pub divider: u32,
    /// `multiplier` attribute of the `timeStep` element (default 1)
    pub multiplier: u32,
}

impl SeriesIdentity {
    /// Create an identity with the default divider and multiplier of 1
    pub fn new(parameter_id: impl Into<String>, timestep_unit: impl Into<String>) -> Self {
        Self {
            parameter_id: parameter_id.into(),
            timestep_unit: timestep_unit.into(),
            divider: 1,
            multiplier: 1,
        }
    }

    /// Set the time step divider
    pub fn with_divider(mut self, divider: u32) -> Self {
        self.divider = divider;
        self
    }

    /// Set the time step multiplier
    pub fn with_multiplier(mut self, multiplier: u32) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Series code, e.g. `H.meting::second::1::900`
    pub fn code(&self) -> String {
        self.to_string()
    }

    /// Describe the first structural problem with this identity, if any
    pub fn problem(&self) -> Option<&'static str> {
        if self.parameter_id.trim().is_empty() {
            Some("parameterId is empty")
        } else if self.timestep_unit.trim().is_empty() {
            Some("timeStep unit is empty")
        } else if self.divider == 0 {
            Some("timeStep divider must be at least 1")
        } else if self.multiplier == 0 {
            Some("timeStep multiplier must be at least 1")
        } else {
            None
        }
    }
}

impl fmt::Display for SeriesIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{}::{}::{}",
            self.parameter_id, self.timestep_unit, self.divider, self.multiplier
        )
    }
}

/// Composite key of a series: identity plus location code.
///
/// Unique across a whole PI-XML document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SeriesKey {
    /// Parameter and time step identity
    pub identity: SeriesIdentity,
    /// `locationId` element of the header
    pub location_code: String,
}

impl SeriesKey {
    /// Create a key from its parts
    pub fn new(identity: SeriesIdentity, location_code: impl Into<String>) -> Self {
        Self {
            identity,
            location_code: location_code.into(),
        }
    }

    /// Series code of the identity part
    pub fn code(&self) -> String {
        self.identity.code()
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.identity, self.location_code)
    }
}
