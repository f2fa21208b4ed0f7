// Map widget payload: raster tile reference
use super::error::{ValidationError, ValidationResult};
use super::fields::{
    array, measure, non_empty_string, object, optional, remaining, required, string, unsigned,
};
use super::path::FieldPath;
use crate::domain::raster::{BoundingBox, CogUrl, RasterTile, TileStatus};
use serde_json::Value;

const KNOWN_FIELDS: [&str; 7] = ["id", "name", "size", "status", "analysis", "url", "bounds"];

pub fn decode_raster_tile(value: &Value, path: &FieldPath) -> ValidationResult<RasterTile> {
    let map = object(value, path)?;

    let id = non_empty_string(required(map, "id", path)?, &path.key("id"))?;
    let name = string(required(map, "name", path)?, &path.key("name"))?;
    let size = unsigned(required(map, "size", path)?, &path.key("size"))?;

    let status_path = path.key("status");
    let status = string(required(map, "status", path)?, &status_path)?
        .parse::<TileStatus>()
        .map_err(|reason| ValidationError::schema(&status_path, reason))?;

    let analysis = optional(map, "analysis")
        .map(|value| object(value, &path.key("analysis")).cloned())
        .transpose()?;

    let url = optional(map, "url")
        .map(|value| {
            let url_path = path.key("url");
            let raw = string(value, &url_path)?;
            CogUrl::parse(&raw).map_err(|e| ValidationError::schema(&url_path, e.to_string()))
        })
        .transpose()?;

    let bounds = optional(map, "bounds")
        .map(|value| decode_bounds(value, &path.key("bounds")))
        .transpose()?;

    Ok(RasterTile {
        id,
        name,
        size,
        status,
        analysis,
        url,
        bounds,
        extra: remaining(map, &KNOWN_FIELDS),
    })
}

/// `[minLon, minLat, maxLon, maxLat]`; anything but exactly four finite numbers is refused.
fn decode_bounds(value: &Value, path: &FieldPath) -> ValidationResult<BoundingBox> {
    let items = array(value, path)?;
    let [min_lon, min_lat, max_lon, max_lat] = items.as_slice() else {
        return Err(ValidationError::schema(
            path,
            format!("expected 4 elements [minLon, minLat, maxLon, maxLat], found {}", items.len()),
        ));
    };

    BoundingBox::new(
        measure(min_lon, &path.index(0))?,
        measure(min_lat, &path.index(1))?,
        measure(max_lon, &path.index(2))?,
        measure(max_lat, &path.index(3))?,
    )
    .map_err(|e| ValidationError::schema(path, e.to_string()))
}
