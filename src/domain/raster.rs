// Raster tile reference domain model (map widget payload)
use super::number::Measure;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use url::Url;
use uuid::Uuid;

const COG_SCHEME_PREFIX: &str = "cog://";
const SERVE_COG_SEGMENTS: [&str; 2] = ["api", "serve-cog"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TileStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TileStatus::Pending => "PENDING",
            TileStatus::Processing => "PROCESSING",
            TileStatus::Completed => "COMPLETED",
            TileStatus::Failed => "FAILED",
        }
    }
}

impl FromStr for TileStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TileStatus::Pending),
            "PROCESSING" => Ok(TileStatus::Processing),
            "COMPLETED" => Ok(TileStatus::Completed),
            "FAILED" => Ok(TileStatus::Failed),
            other => Err(format!(
                "unknown tile status {other:?} (expected PENDING, PROCESSING, COMPLETED or FAILED)"
            )),
        }
    }
}

impl fmt::Display for TileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BoundsError {
    #[error("minLon {min} must be less than maxLon {max}")]
    Longitude { min: f64, max: f64 },
    #[error("minLat {min} must be less than maxLat {max}")]
    Latitude { min: f64, max: f64 },
}

/// Geographic extent `[minLon, minLat, maxLon, maxLat]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    min_lon: Measure,
    min_lat: Measure,
    max_lon: Measure,
    max_lat: Measure,
}

impl BoundingBox {
    pub fn new(
        min_lon: Measure,
        min_lat: Measure,
        max_lon: Measure,
        max_lat: Measure,
    ) -> Result<Self, BoundsError> {
        if min_lon.value() >= max_lon.value() {
            return Err(BoundsError::Longitude {
                min: min_lon.value(),
                max: max_lon.value(),
            });
        }
        if min_lat.value() >= max_lat.value() {
            return Err(BoundsError::Latitude {
                min: min_lat.value(),
                max: max_lat.value(),
            });
        }
        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }

    pub fn min_lon(&self) -> f64 {
        self.min_lon.value()
    }

    pub fn min_lat(&self) -> f64 {
        self.min_lat.value()
    }

    pub fn max_lon(&self) -> f64 {
        self.max_lon.value()
    }

    pub fn max_lat(&self) -> f64 {
        self.max_lat.value()
    }
}

impl Serialize for BoundingBox {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [&self.min_lon, &self.min_lat, &self.max_lon, &self.max_lat].serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CogUrlError {
    #[error("tile url must start with cog://")]
    MissingScheme,
    #[error("tile url origin is not a valid http url: {0}")]
    InvalidOrigin(String),
    #[error("tile url origin must use http or https, found {0}")]
    UnsupportedScheme(String),
    #[error("tile url path must be /api/serve-cog/<uuid>/, found {0}")]
    UnexpectedPath(String),
}

/// Tile-service reference of the form `cog://<http-origin>/api/serve-cog/<uuid>/`.
#[derive(Debug, Clone, PartialEq)]
pub struct CogUrl {
    raw: String,
    endpoint: Url,
    asset_id: Uuid,
}

impl CogUrl {
    pub fn parse(raw: &str) -> Result<Self, CogUrlError> {
        let rest = raw
            .strip_prefix(COG_SCHEME_PREFIX)
            .ok_or(CogUrlError::MissingScheme)?;
        let endpoint = Url::parse(rest).map_err(|e| CogUrlError::InvalidOrigin(e.to_string()))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(CogUrlError::UnsupportedScheme(endpoint.scheme().to_string()));
        }

        let segments: Vec<&str> = endpoint
            .path_segments()
            .map(|s| s.filter(|segment| !segment.is_empty()).collect())
            .unwrap_or_default();
        let asset_id = match segments.as_slice() {
            [api, serve, id] if [*api, *serve] == SERVE_COG_SEGMENTS => Uuid::parse_str(id).ok(),
            _ => None,
        }
        .ok_or_else(|| CogUrlError::UnexpectedPath(endpoint.path().to_string()))?;

        Ok(Self {
            raw: raw.to_string(),
            endpoint,
            asset_id,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The plain http(s) endpoint the tile server answers on.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn origin(&self) -> String {
        self.endpoint.origin().ascii_serialization()
    }

    pub fn asset_id(&self) -> Uuid {
        self.asset_id
    }
}

impl Serialize for CogUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RasterTile {
    pub id: String,
    pub name: String,
    /// File size in bytes.
    pub size: u64,
    pub status: TileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<CogUrl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoundingBox>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RasterTile {
    /// A tile can be drawn once processing completed and both the endpoint and extent are known.
    pub fn is_renderable(&self) -> bool {
        self.status == TileStatus::Completed && self.url.is_some() && self.bounds.is_some()
    }
}
