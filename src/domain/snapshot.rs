// Dashboard snapshot domain model
use super::number::Measure;
use super::widget::Widget;
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Semantic version of the snapshot schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaVersion {
    raw: String,
    major: u64,
    minor: u64,
    patch: u64,
}

impl SchemaVersion {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let (rest, build) = match raw.split_once('+') {
            Some((rest, build)) => (rest, Some(build)),
            None => (raw, None),
        };
        let (core, pre_release) = match rest.split_once('-') {
            Some((core, pre_release)) => (core, Some(pre_release)),
            None => (rest, None),
        };
        if let Some(pre_release) = pre_release {
            check_identifiers(raw, "pre-release", pre_release, true)?;
        }
        if let Some(build) = build {
            check_identifiers(raw, "build", build, false)?;
        }

        let parts: Vec<&str> = core.split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(format!("{raw:?} is not MAJOR.MINOR.PATCH"));
        };

        let number = |part: &str| -> Result<u64, String> {
            let leading_zero = part.len() > 1 && part.starts_with('0');
            if part.is_empty() || leading_zero || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(format!("{raw:?} has an invalid version component {part:?}"));
            }
            part.parse::<u64>().map_err(|e| format!("{raw:?}: {e}"))
        };

        Ok(Self {
            raw: raw.to_string(),
            major: number(*major)?,
            minor: number(*minor)?,
            patch: number(*patch)?,
        })
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Dot-separated, non-empty `[0-9A-Za-z-]` identifiers. Numeric pre-release
/// identifiers may not carry leading zeros.
fn check_identifiers(raw: &str, label: &str, identifiers: &str, numeric_strict: bool) -> Result<(), String> {
    for identifier in identifiers.split('.') {
        if identifier.is_empty() {
            return Err(format!("{raw:?} has an empty {label} identifier"));
        }
        if !identifier.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
            return Err(format!("{raw:?} has an invalid {label} identifier {identifier:?}"));
        }
        let numeric = identifier.bytes().all(|b| b.is_ascii_digit());
        if numeric_strict && numeric && identifier.len() > 1 && identifier.starts_with('0') {
            return Err(format!("{raw:?} has a leading zero in {label} identifier {identifier:?}"));
        }
    }
    Ok(())
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for SchemaVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// Save timestamp, kept in the exact textual form it was written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedAt {
    raw: String,
    instant: DateTime<FixedOffset>,
}

impl SavedAt {
    pub fn parse(raw: &str) -> Result<Self, chrono::ParseError> {
        let instant = DateTime::parse_from_rfc3339(raw)?;
        Ok(Self {
            raw: raw.to_string(),
            instant,
        })
    }

    pub fn from_utc(instant: DateTime<Utc>) -> Self {
        Self {
            raw: instant.to_rfc3339_opts(SecondsFormat::Millis, true),
            instant: instant.fixed_offset(),
        }
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant.with_timezone(&Utc)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Serialize for SavedAt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    pub total_widgets: u64,
    pub total_columns: u64,
    pub average_height: Measure,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SnapshotMetadata {
    /// Summary of a widget list: count, summed grid width and mean height in rows.
    pub fn summarize(widgets: &[Widget]) -> Self {
        let total_columns = widgets.iter().map(|w| u64::from(w.size)).sum();
        let average_height = if widgets.is_empty() {
            Measure::from(0u64)
        } else {
            let rows: u32 = widgets.iter().map(|w| w.height.rows()).sum();
            let mean = f64::from(rows) / widgets.len() as f64;
            Measure::from_f64(mean).unwrap_or_else(|| Measure::from(0u64))
        };

        Self {
            total_widgets: widgets.len() as u64,
            total_columns,
            average_height,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub version: SchemaVersion,
    pub saved_at: SavedAt,
    pub dashboard_title: String,
    pub widgets: Vec<Widget>,
    pub metadata: SnapshotMetadata,
}

impl DashboardSnapshot {
    /// Widgets in display order. Ties keep their array position.
    pub fn widgets_in_order(&self) -> Vec<&Widget> {
        let mut ordered: Vec<&Widget> = self.widgets.iter().collect();
        ordered.sort_by_key(|w| w.order);
        ordered
    }

    pub fn widget(&self, id: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id == id)
    }

    /// Builds the successor snapshot; the receiver is left untouched.
    pub fn revised(&self, widgets: Vec<Widget>, saved_at: DateTime<Utc>) -> DashboardSnapshot {
        let mut metadata = SnapshotMetadata::summarize(&widgets);
        metadata.extra = self.metadata.extra.clone();

        DashboardSnapshot {
            version: self.version.clone(),
            saved_at: SavedAt::from_utc(saved_at),
            dashboard_title: self.dashboard_title.clone(),
            widgets,
            metadata,
        }
    }
}
