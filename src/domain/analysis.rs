// Analysis payload domain models (chart and table widgets)
use super::number::Measure;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Query parameters the analysis was run with (`data.data`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landscape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison_period: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporal_resolution: Option<String>,
    /// Producer-specific parameters kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisData {
    #[serde(rename = "data")]
    pub parameters: QueryParameters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<AnalysisResults>,
}

impl AnalysisData {
    pub fn collections(&self) -> &[FeatureCollection] {
        self.results
            .as_ref()
            .map(|r| r.collections())
            .unwrap_or_default()
    }
}

/// How `results` was laid out in the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsLayout {
    Single,
    Sequence,
}

/// Analysis results normalized to an ordered sequence of collections.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResults {
    collections: Vec<FeatureCollection>,
    layout: ResultsLayout,
}

impl AnalysisResults {
    pub fn single(collection: FeatureCollection) -> Self {
        Self {
            collections: vec![collection],
            layout: ResultsLayout::Single,
        }
    }

    pub fn sequence(collections: Vec<FeatureCollection>) -> Self {
        Self {
            collections,
            layout: ResultsLayout::Sequence,
        }
    }

    pub fn collections(&self) -> &[FeatureCollection] {
        &self.collections
    }

    pub fn layout(&self) -> ResultsLayout {
        self.layout
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

impl Serialize for AnalysisResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match (self.layout, self.collections.as_slice()) {
            (ResultsLayout::Single, [collection]) => collection.serialize(serializer),
            _ => self.collections.serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<Feature>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeatureCollection {
    pub fn features(&self) -> &[Feature] {
        self.features.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureId {
    Text(String),
    Number(Measure),
}

impl FeatureId {
    /// Key used for uniqueness checks; text and numeric ids never collide.
    pub fn identity_key(&self) -> String {
        match self {
            FeatureId::Text(text) => format!("text:{text}"),
            FeatureId::Number(measure) => {
                let number = measure.as_number();
                match (number.as_u64(), number.as_i64()) {
                    (Some(value), _) => format!("number:{value}"),
                    (None, Some(value)) => format!("number:{value}"),
                    (None, None) => format!("number:{}", measure.value()),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Feature {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatureId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub type Position = Vec<Measure>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}


/// Summary statistics for one variable; `None` fields were `null` in the source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatRecord {
    pub max: Option<Measure>,
    pub min: Option<Measure>,
    pub mean: Option<Measure>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StatRecord {
    /// Checks `min <= mean <= max` over whichever values are present.
    pub fn is_ordered(&self) -> bool {
        let ordered = |low: &Option<Measure>, high: &Option<Measure>| match (low, high) {
            (Some(low), Some(high)) => low.value() <= high.value(),
            _ => true,
        };
        ordered(&self.min, &self.mean) && ordered(&self.mean, &self.max) && ordered(&self.min, &self.max)
    }
}

pub type VariableStatistics = BTreeMap<String, Option<StatRecord>>;
pub type LocationStatistics = BTreeMap<String, VariableStatistics>;

/// Statistics keyed by year, then location, then variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Statistics {
    by_year: BTreeMap<String, LocationStatistics>,
}

impl Statistics {
    pub fn new(by_year: BTreeMap<String, LocationStatistics>) -> Self {
        Self { by_year }
    }

    pub fn get(&self, year: &str, location: &str, variable: &str) -> Option<&StatRecord> {
        self.by_year
            .get(year)?
            .get(location)?
            .get(variable)?
            .as_ref()
    }

    /// Every `(year, location, variable, record)` entry in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &str, Option<&StatRecord>)> {
        self.by_year.iter().flat_map(|(year, locations)| {
            locations.iter().flat_map(move |(location, variables)| {
                variables.iter().map(move |(variable, record)| {
                    (year.as_str(), location.as_str(), variable.as_str(), record.as_ref())
                })
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(min: f64, mean: f64, max: f64) -> StatRecord {
        StatRecord {
            max: Measure::from_f64(max),
            min: Measure::from_f64(min),
            mean: Measure::from_f64(mean),
            extra: Map::new(),
        }
    }

    #[test]
    fn test_stat_record_ordering() {
        assert!(record(0.1, 0.4, 0.8).is_ordered());
        assert!(record(0.5, 0.5, 0.5).is_ordered());
        assert!(!record(0.1, 0.9, 0.8).is_ordered());
        assert!(!record(0.9, 0.4, 0.8).is_ordered());

        let partial = StatRecord {
            max: None,
            ..record(0.1, 0.4, 0.8)
        };
        assert!(partial.is_ordered());
        assert_eq!(
            serde_json::to_value(&partial).unwrap(),
            json!({"max": null, "min": 0.1, "mean": 0.4})
        );
    }

    #[test]
    fn test_statistics_entries() {
        let mut variables = VariableStatistics::new();
        variables.insert("NDVI".to_string(), Some(record(0.2, 0.4, 0.7)));
        variables.insert("SOC change kg/m2".to_string(), None);
        let mut locations = LocationStatistics::new();
        locations.insert("Chiawa".to_string(), variables);
        let mut by_year = BTreeMap::new();
        by_year.insert("2021".to_string(), locations);
        let statistics = Statistics::new(by_year);

        let entries: Vec<_> = statistics.entries().map(|(y, l, v, r)| (y, l, v, r.is_some())).collect();
        assert_eq!(
            entries,
            vec![
                ("2021", "Chiawa", "NDVI", true),
                ("2021", "Chiawa", "SOC change kg/m2", false),
            ]
        );
        assert!(statistics.get("2021", "Chiawa", "NDVI").is_some());
        assert!(statistics.get("2022", "Chiawa", "NDVI").is_none());
    }

    #[test]
    fn test_single_results_keep_their_layout() {
        let collection = FeatureCollection {
            tag: Some("FeatureCollection".to_string()),
            ..FeatureCollection::default()
        };
        let single = AnalysisResults::single(collection.clone());
        assert_eq!(single.len(), 1);
        assert_eq!(
            serde_json::to_value(&single).unwrap(),
            json!({"type": "FeatureCollection"})
        );

        let sequence = AnalysisResults::sequence(vec![collection]);
        assert_eq!(
            serde_json::to_value(&sequence).unwrap(),
            json!([{"type": "FeatureCollection"}])
        );
    }

    #[test]
    fn test_geometry_encodes_as_geojson() {
        let point = Geometry::Point {
            coordinates: vec![Measure::from_f64(28.05).unwrap(), Measure::from_f64(-15.62).unwrap()],
        };
        assert_eq!(
            serde_json::to_value(&point).unwrap(),
            json!({"type": "Point", "coordinates": [28.05, -15.62]})
        );
    }
}
