use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// RollState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollState {
    #[serde(alias = "unmark")]
    Unmarked,
    Present,
    Absent,
    Late,
}

impl RollState {
    pub fn as_str(self) -> &'static str {
        match self {
            RollState::Unmarked => "unmarked",
            RollState::Present => "present",
            RollState::Absent => "absent",
            RollState::Late => "late",
        }
    }
}

impl fmt::Display for RollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RollState {
    type Err = crate::error::RollcallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unmarked" | "unmark" => Ok(RollState::Unmarked),
            "present" => Ok(RollState::Present),
            "absent" => Ok(RollState::Absent),
            "late" => Ok(RollState::Late),
            _ => Err(crate::error::RollcallError::InvalidRollState(s.to_string())),
        }
    }
}

/// Split a comma-separated state list into its trimmed, non-empty parts.
///
/// Unknown values are kept; they simply match no recorded state.
pub fn split_states(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a comma-separated state list, requiring at least one entry and every
/// entry to be a known roll state. Returns the canonical comma-joined form.
pub fn normalize_states(raw: &str) -> crate::Result<String> {
    let parts = split_states(raw);
    if parts.is_empty() {
        return Err(crate::RollcallError::InvalidField {
            field: "roll_states",
            reason: "must name at least one roll state".into(),
        });
    }
    let mut out: Vec<&'static str> = Vec::with_capacity(parts.len());
    for part in &parts {
        let state: RollState = part.parse()?;
        if !out.contains(&state.as_str()) {
            out.push(state.as_str());
        }
    }
    Ok(out.join(","))
}

// ---------------------------------------------------------------------------
// Comparator
// ---------------------------------------------------------------------------

/// Threshold comparison applied to a student's incident count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">")]
    GreaterThan,
}

impl Comparator {
    pub fn as_str(self) -> &'static str {
        match self {
            Comparator::LessThan => "<",
            Comparator::GreaterThan => ">",
        }
    }

    pub fn holds(self, count: i64, threshold: i64) -> bool {
        match self {
            Comparator::LessThan => count < threshold,
            Comparator::GreaterThan => count > threshold,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Comparator {
    type Err = crate::error::RollcallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<" => Ok(Comparator::LessThan),
            ">" => Ok(Comparator::GreaterThan),
            _ => Err(crate::error::RollcallError::InvalidComparator(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Input helpers
// ---------------------------------------------------------------------------

/// Unwrap a required input field.
pub(crate) fn required<T>(value: Option<T>, field: &'static str) -> crate::Result<T> {
    value.ok_or(crate::RollcallError::MissingField(field))
}

/// Unwrap a required text field, treating blank text as missing.
pub(crate) fn required_text(value: Option<String>, field: &'static str) -> crate::Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(crate::RollcallError::MissingField(field)),
    }
}

pub(crate) fn non_negative(value: i64, field: &'static str) -> crate::Result<i64> {
    if value < 0 {
        return Err(crate::RollcallError::InvalidField {
            field,
            reason: format!("must be non-negative, got {value}"),
        });
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
