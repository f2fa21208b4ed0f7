// Widget domain model
use super::analysis::AnalysisData;
use super::raster::RasterTile;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Chart,
    Table,
    Map,
}

impl WidgetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetKind::Chart => "chart",
            WidgetKind::Table => "table",
            WidgetKind::Map => "map",
        }
    }
}

impl FromStr for WidgetKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chart" => Ok(WidgetKind::Chart),
            "table" => Ok(WidgetKind::Table),
            "map" => Ok(WidgetKind::Map),
            _ => Err(()),
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetHeight {
    Small,
    Medium,
    Large,
}

impl WidgetHeight {
    /// Grid rows occupied by the widget.
    pub fn rows(&self) -> u32 {
        match self {
            WidgetHeight::Small => 1,
            WidgetHeight::Medium => 2,
            WidgetHeight::Large => 3,
        }
    }
}

impl FromStr for WidgetHeight {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(WidgetHeight::Small),
            "medium" => Ok(WidgetHeight::Medium),
            "large" => Ok(WidgetHeight::Large),
            other => Err(format!(
                "unknown height {other:?} (expected small, medium or large)"
            )),
        }
    }
}

/// Type-specific payload, one variant per widget kind.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetPayload {
    Chart(Option<AnalysisData>),
    Table(Option<AnalysisData>),
    Map(Option<RasterTile>),
}

impl WidgetPayload {
    pub fn empty(kind: WidgetKind) -> Self {
        match kind {
            WidgetKind::Chart => WidgetPayload::Chart(None),
            WidgetKind::Table => WidgetPayload::Table(None),
            WidgetKind::Map => WidgetPayload::Map(None),
        }
    }

    pub fn kind(&self) -> WidgetKind {
        match self {
            WidgetPayload::Chart(_) => WidgetKind::Chart,
            WidgetPayload::Table(_) => WidgetKind::Table,
            WidgetPayload::Map(_) => WidgetKind::Map,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            WidgetPayload::Chart(data) | WidgetPayload::Table(data) => data.is_none(),
            WidgetPayload::Map(tile) => tile.is_none(),
        }
    }

    pub fn analysis(&self) -> Option<&AnalysisData> {
        match self {
            WidgetPayload::Chart(data) | WidgetPayload::Table(data) => data.as_ref(),
            WidgetPayload::Map(_) => None,
        }
    }

    pub fn raster(&self) -> Option<&RasterTile> {
        match self {
            WidgetPayload::Map(tile) => tile.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub id: String,
    pub order: i64,
    pub title: String,
    /// Width in grid columns.
    pub size: u32,
    pub height: WidgetHeight,
    pub config: Map<String, Value>,
    pub has_data: bool,
    pub payload: WidgetPayload,
}

impl Widget {
    pub fn kind(&self) -> WidgetKind {
        self.payload.kind()
    }

    pub fn chart_type(&self) -> Option<&str> {
        self.config.get("chartType").and_then(Value::as_str)
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum PayloadDocument<'a> {
    Analysis(&'a AnalysisData),
    Raster(&'a RasterTile),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WidgetDocument<'a> {
    id: &'a str,
    order: i64,
    #[serde(rename = "type")]
    kind: WidgetKind,
    title: &'a str,
    size: u32,
    height: WidgetHeight,
    config: &'a Map<String, Value>,
    has_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<PayloadDocument<'a>>,
}

impl Serialize for Widget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let data = match &self.payload {
            WidgetPayload::Chart(data) | WidgetPayload::Table(data) => {
                data.as_ref().map(PayloadDocument::Analysis)
            }
            WidgetPayload::Map(tile) => tile.as_ref().map(PayloadDocument::Raster),
        };
        WidgetDocument {
            id: &self.id,
            order: self.order,
            kind: self.kind(),
            title: &self.title,
            size: self.size,
            height: self.height,
            config: &self.config,
            has_data: self.has_data,
            data,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_widget_serializes_type_tag() {
        let mut config = Map::new();
        config.insert("chartType".to_string(), json!("bar"));
        let widget = Widget {
            id: "widget-3".to_string(),
            order: 3,
            title: "NDVI trend".to_string(),
            size: 6,
            height: WidgetHeight::Medium,
            config,
            has_data: false,
            payload: WidgetPayload::empty(WidgetKind::Chart),
        };

        assert_eq!(widget.chart_type(), Some("bar"));
        assert_eq!(
            serde_json::to_value(&widget).unwrap(),
            json!({
                "id": "widget-3",
                "order": 3,
                "type": "chart",
                "title": "NDVI trend",
                "size": 6,
                "height": "medium",
                "config": {"chartType": "bar"},
                "hasData": false
            })
        );
    }

    #[test]
    fn test_kind_and_height_parsing() {
        assert_eq!("map".parse::<WidgetKind>(), Ok(WidgetKind::Map));
        assert!("heatmap".parse::<WidgetKind>().is_err());
        assert_eq!("large".parse::<WidgetHeight>().map(|h| h.rows()), Ok(3));
    }
}
