// Chart and table payloads: query parameters, feature collections and statistics
use super::error::{ValidationError, ValidationResult};
use super::fields::{
    array, measure, nullable_measure, object, optional, remaining, required, string, type_tag,
};
use super::path::FieldPath;
use crate::domain::analysis::{
    AnalysisData, AnalysisResults, Feature, FeatureCollection, FeatureId, Geometry,
    LocationStatistics, Position, QueryParameters, StatRecord, Statistics, VariableStatistics,
};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

const PARAMETER_FIELDS: [&str; 7] = [
    "period",
    "variable",
    "landscape",
    "locations",
    "analysisType",
    "comparisonPeriod",
    "temporalResolution",
];
const COLLECTION_FIELDS: [&str; 3] = ["type", "features", "statistics"];
const FEATURE_FIELDS: [&str; 4] = ["type", "id", "geometry", "properties"];
const STAT_FIELDS: [&str; 3] = ["max", "min", "mean"];

pub fn decode_analysis_data(value: &Value, path: &FieldPath) -> ValidationResult<AnalysisData> {
    let map = object(value, path)?;
    let parameters = decode_parameters(required(map, "data", path)?, &path.key("data"))?;
    let results = optional(map, "results")
        .map(|value| decode_results(value, &path.key("results")))
        .transpose()?;

    Ok(AnalysisData { parameters, results })
}

fn decode_parameters(value: &Value, path: &FieldPath) -> ValidationResult<QueryParameters> {
    let map = object(value, path)?;
    let text = |key: &str| -> ValidationResult<Option<String>> {
        optional(map, key)
            .map(|value| string(value, &path.key(key)))
            .transpose()
    };

    Ok(QueryParameters {
        period: optional(map, "period").cloned(),
        variable: text("variable")?,
        landscape: text("landscape")?,
        locations: optional(map, "locations").cloned(),
        analysis_type: text("analysisType")?,
        comparison_period: optional(map, "comparisonPeriod").cloned(),
        temporal_resolution: text("temporalResolution")?,
        extra: remaining(map, &PARAMETER_FIELDS),
    })
}

/// A lone collection and a sequence of collections both normalize to a sequence.
fn decode_results(value: &Value, path: &FieldPath) -> ValidationResult<AnalysisResults> {
    match value {
        Value::Array(items) => {
            let collections = items
                .iter()
                .enumerate()
                .map(|(index, item)| decode_collection(item, &path.index(index)))
                .collect::<ValidationResult<Vec<_>>>()?;
            Ok(AnalysisResults::sequence(collections))
        }
        other => decode_collection(other, path).map(AnalysisResults::single),
    }
}

fn decode_collection(value: &Value, path: &FieldPath) -> ValidationResult<FeatureCollection> {
    let map = object(value, path)?;
    let tag = type_tag(map, "FeatureCollection", path)?;

    let features = optional(map, "features")
        .map(|value| decode_features(value, &path.key("features")))
        .transpose()?;

    let statistics = optional(map, "statistics")
        .map(|value| decode_statistics(value, &path.key("statistics")))
        .transpose()?;

    Ok(FeatureCollection {
        tag,
        features,
        statistics,
        extra: remaining(map, &COLLECTION_FIELDS),
    })
}

fn decode_features(value: &Value, path: &FieldPath) -> ValidationResult<Vec<Feature>> {
    let items = array(value, path)?;
    let mut seen_ids = HashSet::new();
    let mut features = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let feature_path = path.index(index);
        let feature = decode_feature(item, &feature_path)?;
        if let Some(id) = &feature.id {
            if !seen_ids.insert(id.identity_key()) {
                return Err(ValidationError::schema(
                    &feature_path.key("id"),
                    "duplicate feature id within collection",
                ));
            }
        }
        features.push(feature);
    }

    Ok(features)
}

fn decode_feature(value: &Value, path: &FieldPath) -> ValidationResult<Feature> {
    let map = object(value, path)?;
    let tag = type_tag(map, "Feature", path)?;

    let id = optional(map, "id")
        .map(|value| {
            let id_path = path.key("id");
            match value {
                Value::String(text) => Ok(FeatureId::Text(text.clone())),
                Value::Number(_) => measure(value, &id_path).map(FeatureId::Number),
                _ => Err(ValidationError::schema(&id_path, "feature id must be a string or a number")),
            }
        })
        .transpose()?;

    let geometry = optional(map, "geometry")
        .map(|value| decode_geometry(value, &path.key("geometry")))
        .transpose()?;

    let properties = optional(map, "properties")
        .map(|value| object(value, &path.key("properties")).cloned())
        .transpose()?;

    Ok(Feature {
        tag,
        id,
        geometry,
        properties,
        extra: remaining(map, &FEATURE_FIELDS),
    })
}

fn decode_geometry(value: &Value, path: &FieldPath) -> ValidationResult<Geometry> {
    let map = object(value, path)?;
    let kind_path = path.key("type");
    let kind = string(required(map, "type", path)?, &kind_path)?;

    if kind == "GeometryCollection" {
        let geometries_path = path.key("geometries");
        let geometries = array(required(map, "geometries", path)?, &geometries_path)?
            .iter()
            .enumerate()
            .map(|(index, item)| decode_geometry(item, &geometries_path.index(index)))
            .collect::<ValidationResult<Vec<_>>>()?;
        return Ok(Geometry::GeometryCollection { geometries });
    }

    let coordinates_path = path.key("coordinates");
    let coordinates = required(map, "coordinates", path)?;
    let geometry = match kind.as_str() {
        "Point" => Geometry::Point {
            coordinates: decode_position(coordinates, &coordinates_path)?,
        },
        "MultiPoint" => Geometry::MultiPoint {
            coordinates: decode_positions(coordinates, &coordinates_path)?,
        },
        "LineString" => Geometry::LineString {
            coordinates: decode_positions(coordinates, &coordinates_path)?,
        },
        "MultiLineString" => Geometry::MultiLineString {
            coordinates: decode_nested(coordinates, &coordinates_path, decode_positions)?,
        },
        "Polygon" => Geometry::Polygon {
            coordinates: decode_nested(coordinates, &coordinates_path, decode_positions)?,
        },
        "MultiPolygon" => Geometry::MultiPolygon {
            coordinates: decode_nested(coordinates, &coordinates_path, |value, path| {
                decode_nested(value, path, decode_positions)
            })?,
        },
        other => {
            return Err(ValidationError::schema(
                &kind_path,
                format!("unsupported geometry type {other:?}"),
            ));
        }
    };

    Ok(geometry)
}

fn decode_position(value: &Value, path: &FieldPath) -> ValidationResult<Position> {
    let items = array(value, path)?;
    if !(2..=3).contains(&items.len()) {
        return Err(ValidationError::schema(
            path,
            format!("a position needs 2 or 3 coordinates, found {}", items.len()),
        ));
    }
    items
        .iter()
        .enumerate()
        .map(|(index, item)| measure(item, &path.index(index)))
        .collect()
}

fn decode_positions(value: &Value, path: &FieldPath) -> ValidationResult<Vec<Position>> {
    decode_nested(value, path, decode_position)
}

fn decode_nested<T>(
    value: &Value,
    path: &FieldPath,
    decode: impl Fn(&Value, &FieldPath) -> ValidationResult<T>,
) -> ValidationResult<Vec<T>> {
    array(value, path)?
        .iter()
        .enumerate()
        .map(|(index, item)| decode(item, &path.index(index)))
        .collect()
}

/// year -> location -> variable -> `{max, min, mean}` or `null`.
fn decode_statistics(value: &Value, path: &FieldPath) -> ValidationResult<Statistics> {
    let mut by_year = BTreeMap::new();

    for (year, locations) in object(value, path)? {
        let year_path = path.key(year);
        let mut by_location = LocationStatistics::new();

        for (location, variables) in object(locations, &year_path)? {
            let location_path = year_path.key(location);
            let mut by_variable = VariableStatistics::new();

            for (variable, record) in object(variables, &location_path)? {
                let record_path = location_path.key(variable);
                let record = match record {
                    Value::Null => None,
                    other => Some(decode_stat_record(other, &record_path)?),
                };
                by_variable.insert(variable.clone(), record);
            }

            by_location.insert(location.clone(), by_variable);
        }

        by_year.insert(year.clone(), by_location);
    }

    Ok(Statistics::new(by_year))
}

fn decode_stat_record(value: &Value, path: &FieldPath) -> ValidationResult<StatRecord> {
    let map: &Map<String, Value> = object(value, path)?;
    let record = StatRecord {
        max: nullable_measure(map.get("max"), &path.key("max"))?,
        min: nullable_measure(map.get("min"), &path.key("min"))?,
        mean: nullable_measure(map.get("mean"), &path.key("mean"))?,
        extra: remaining(map, &STAT_FIELDS),
    };

    if !record.is_ordered() {
        return Err(ValidationError::schema(path, "statistics must satisfy min <= mean <= max"));
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::ResultsLayout;
    use serde_json::json;

    fn results_path() -> FieldPath {
        FieldPath::root().key("widgets").index(0).key("data").key("results")
    }

    #[test]
    fn test_single_results_normalize_to_sequence() {
        let payload = json!({
            "data": {"variable": "NDVI", "landscape": "Kafue", "temporalResolution": "annual"},
            "results": {
                "type": "FeatureCollection",
                "statistics": {"2022": {"Chiawa": {"NDVI": {"max": 0.81, "min": 0.12, "mean": 0.44}}}}
            }
        });
        let decoded = decode_analysis_data(&payload, &FieldPath::root()).unwrap();
        let results = decoded.results.as_ref().unwrap();
        assert_eq!(results.layout(), ResultsLayout::Single);
        assert_eq!(decoded.collections().len(), 1);
        assert_eq!(decoded.parameters.variable.as_deref(), Some("NDVI"));
        assert_eq!(serde_json::to_value(&decoded).unwrap(), payload);
    }

    #[test]
    fn test_heterogeneous_sequence() {
        let results = json!([
            {"statistics": {"2021": {"Chiawa": {"NDVI": {"max": 1, "min": 0, "mean": 0.5}, "SOC change kg/m2": null}}}},
            {"type": "FeatureCollection", "features": [
                {"type": "Feature", "id": 1, "geometry": {"type": "Point", "coordinates": [28.05, -15.62]}, "properties": {"NDVI": 0.41, "month": null}},
                {"type": "Feature", "id": "site-2", "geometry": null, "properties": {"NDVI": 0.38}}
            ]}
        ]);
        let decoded = decode_results(&results, &results_path()).unwrap();
        assert_eq!(decoded.len(), 2);
        let statistics = decoded.collections()[0].statistics.as_ref().unwrap();
        assert!(statistics.get("2021", "Chiawa", "SOC change kg/m2").is_none());
        assert_eq!(decoded.collections()[1].features().len(), 2);
        assert_eq!(serde_json::to_value(&decoded).unwrap()[0], results[0]);
    }

    #[test]
    fn test_unordered_statistics_rejected() {
        let results = json!({"statistics": {"2021": {"Chiawa": {"NDVI": {"max": 0.3, "min": 0.1, "mean": 0.6}}}}});
        let err = decode_results(&results, &results_path()).unwrap_err();
        assert_eq!(
            err.path().to_string(),
            r#"widgets[0].data.results.statistics["2021"].Chiawa.NDVI"#
        );
    }

    #[test]
    fn test_non_numeric_statistic_rejected() {
        let results = json!({"statistics": {"2021": {"Chiawa": {"NDVI": {"max": "high", "min": 0.1, "mean": 0.2}}}}});
        let err = decode_results(&results, &results_path()).unwrap_err();
        assert_eq!(
            err.path().to_string(),
            r#"widgets[0].data.results.statistics["2021"].Chiawa.NDVI.max"#
        );
    }

    #[test]
    fn test_duplicate_feature_ids_rejected() {
        let results = json!({"features": [
            {"type": "Feature", "id": "site-1", "properties": {}},
            {"type": "Feature", "id": "site-1", "properties": {}}
        ]});
        let err = decode_results(&results, &results_path()).unwrap_err();
        assert_eq!(err.path().to_string(), "widgets[0].data.results.features[1].id");
    }

    #[test]
    fn test_large_integer_feature_ids_stay_distinct() {
        let results = json!({"features": [
            {"type": "Feature", "id": 9007199254740993u64},
            {"type": "Feature", "id": 9007199254740992u64}
        ]});
        let decoded = decode_results(&results, &results_path()).unwrap();
        assert_eq!(decoded.collections()[0].features().len(), 2);
        assert_eq!(serde_json::to_value(&decoded).unwrap(), results);

        let repeated = json!({"features": [
            {"type": "Feature", "id": 9007199254740993u64},
            {"type": "Feature", "id": 9007199254740993u64}
        ]});
        let err = decode_results(&repeated, &results_path()).unwrap_err();
        assert_eq!(err.path().to_string(), "widgets[0].data.results.features[1].id");
    }

    #[test]
    fn test_geometry_validation() {
        let polygon = json!({"type": "Polygon", "coordinates": [[[27.0, -16.0], [28.0, -16.0], [28.0, -15.0], [27.0, -16.0]]]});
        assert!(matches!(
            decode_geometry(&polygon, &FieldPath::root()).unwrap(),
            Geometry::Polygon { .. }
        ));

        let short = json!({"type": "Point", "coordinates": [27.0]});
        let err = decode_geometry(&short, &FieldPath::root().key("geometry")).unwrap_err();
        assert_eq!(err.path().to_string(), "geometry.coordinates");

        let unknown = json!({"type": "Circle", "coordinates": [27.0, -16.0]});
        let err = decode_geometry(&unknown, &FieldPath::root().key("geometry")).unwrap_err();
        assert_eq!(err.path().to_string(), "geometry.type");
    }

    #[test]
    fn test_wrong_collection_tag_rejected() {
        let results = json!({"type": "Feature"});
        let err = decode_results(&results, &results_path()).unwrap_err();
        assert_eq!(err.path().to_string(), "widgets[0].data.results.type");
    }
}
