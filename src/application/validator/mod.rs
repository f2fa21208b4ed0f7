// Snapshot validator - untyped document in, typed snapshot (or the first failing path) out
mod analysis;
mod error;
mod fields;
mod path;
mod raster;

pub use error::{ValidationError, ValidationResult};
pub use path::FieldPath;

use crate::application::render_plan::RenderPlan;
use crate::domain::snapshot::{DashboardSnapshot, SavedAt, SchemaVersion, SnapshotMetadata};
use crate::domain::widget::{Widget, WidgetHeight, WidgetKind, WidgetPayload};
use crate::infrastructure::config::ValidationSettings;
use fields::{
    array, boolean, integer, is_empty_payload, measure, non_empty_string, object, optional,
    remaining, required, string, unsigned,
};
use serde_json::Value;
use std::collections::HashMap;

const METADATA_FIELDS: [&str; 3] = ["totalWidgets", "totalColumns", "averageHeight"];

/// A snapshot that passed validation, with its display sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSnapshot {
    pub snapshot: DashboardSnapshot,
    pub render_plan: RenderPlan,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotValidator {
    settings: ValidationSettings,
}

impl SnapshotValidator {
    pub fn new(settings: ValidationSettings) -> Self {
        Self { settings }
    }

    /// Validates a whole document. Fields are visited in document order, so the
    /// error names the first failing path; nothing is accepted partially.
    pub fn validate(&self, document: &Value) -> ValidationResult<ValidatedSnapshot> {
        let root = FieldPath::root();
        let map = object(document, &root)?;

        let version_path = root.key("version");
        let version = SchemaVersion::parse(&string(required(map, "version", &root)?, &version_path)?)
            .map_err(|reason| ValidationError::schema(&version_path, reason))?;

        let saved_at_path = root.key("savedAt");
        let saved_at = SavedAt::parse(&string(required(map, "savedAt", &root)?, &saved_at_path)?)
            .map_err(|e| ValidationError::schema(&saved_at_path, format!("not an ISO-8601 timestamp: {e}")))?;

        let dashboard_title = string(
            required(map, "dashboardTitle", &root)?,
            &root.key("dashboardTitle"),
        )?;

        let widgets = self.decode_widgets(required(map, "widgets", &root)?, &root.key("widgets"))?;

        let metadata_path = root.key("metadata");
        let metadata = decode_metadata(required(map, "metadata", &root)?, &metadata_path)?;
        self.check_metadata_drift(&metadata, widgets.len(), &metadata_path)?;

        let snapshot = DashboardSnapshot {
            version,
            saved_at,
            dashboard_title,
            widgets,
            metadata,
        };
        let render_plan = RenderPlan::for_snapshot(&snapshot);

        tracing::debug!(
            "Validated snapshot {:?}: {} widgets, {} renderable",
            snapshot.dashboard_title,
            snapshot.widgets.len(),
            render_plan.renderable().count()
        );

        Ok(ValidatedSnapshot {
            snapshot,
            render_plan,
        })
    }

    fn decode_widgets(&self, value: &Value, path: &FieldPath) -> ValidationResult<Vec<Widget>> {
        let items = array(value, path)?;
        let mut widgets: Vec<Widget> = Vec::with_capacity(items.len());
        let mut ids: HashMap<String, usize> = HashMap::new();
        let mut orders: HashMap<i64, usize> = HashMap::new();

        for (index, item) in items.iter().enumerate() {
            let widget_path = path.index(index);
            let widget = decode_widget(item, &widget_path)?;

            if let Some(first) = ids.insert(widget.id.clone(), index) {
                return Err(ValidationError::schema(
                    &widget_path.key("id"),
                    format!("widget id {:?} is already used by {}", widget.id, path.index(first)),
                ));
            }
            if let Some(first) = orders.insert(widget.order, index) {
                return Err(ValidationError::InconsistentOrder {
                    path: widget_path.key("order"),
                    reason: format!("order {} is already used by {}", widget.order, path.index(first)),
                });
            }

            widgets.push(widget);
        }

        if self.settings.require_contiguous_order {
            check_contiguous(&widgets, path)?;
        }

        Ok(widgets)
    }

    fn check_metadata_drift(
        &self,
        metadata: &SnapshotMetadata,
        widget_count: usize,
        path: &FieldPath,
    ) -> ValidationResult<()> {
        if metadata.total_widgets == widget_count as u64 {
            return Ok(());
        }
        if self.settings.reject_metadata_drift {
            return Err(ValidationError::schema(
                &path.key("totalWidgets"),
                format!(
                    "totalWidgets is {} but the snapshot holds {} widgets",
                    metadata.total_widgets, widget_count
                ),
            ));
        }
        tracing::warn!(
            "Snapshot metadata reports {} widgets, found {}",
            metadata.total_widgets,
            widget_count
        );
        Ok(())
    }
}

fn check_contiguous(widgets: &[Widget], path: &FieldPath) -> ValidationResult<()> {
    let mut by_order: Vec<(i64, usize)> = widgets
        .iter()
        .enumerate()
        .map(|(index, widget)| (widget.order, index))
        .collect();
    by_order.sort_unstable();

    for pair in by_order.windows(2) {
        let [(previous, _), (next, index)] = pair else {
            continue;
        };
        if *next != previous + 1 {
            return Err(ValidationError::InconsistentOrder {
                path: path.index(*index).key("order"),
                reason: format!("order jumps from {previous} to {next}"),
            });
        }
    }
    Ok(())
}

fn decode_widget(value: &Value, path: &FieldPath) -> ValidationResult<Widget> {
    let map = object(value, path)?;

    let id = non_empty_string(required(map, "id", path)?, &path.key("id"))?;
    let order = integer(required(map, "order", path)?, &path.key("order"))?;

    let kind_path = path.key("type");
    let found = string(required(map, "type", path)?, &kind_path)?;
    let kind = found
        .parse::<WidgetKind>()
        .map_err(|_| ValidationError::UnknownWidgetType {
            path: kind_path,
            found,
        })?;

    let title = string(required(map, "title", path)?, &path.key("title"))?;

    let size_path = path.key("size");
    let size = unsigned(required(map, "size", path)?, &size_path)?;
    let size = u32::try_from(size)
        .ok()
        .filter(|size| *size >= 1)
        .ok_or_else(|| ValidationError::schema(&size_path, "grid width must be at least 1 column"))?;

    let height_path = path.key("height");
    let height = string(required(map, "height", path)?, &height_path)?
        .parse::<WidgetHeight>()
        .map_err(|reason| ValidationError::schema(&height_path, reason))?;

    let config = optional(map, "config")
        .map(|value| object(value, &path.key("config")).cloned())
        .transpose()?
        .unwrap_or_default();

    let has_data = boolean(required(map, "hasData", path)?, &path.key("hasData"))?;
    let payload = decode_payload(kind, has_data, map.get("data"), &path.key("data"))?;

    Ok(Widget {
        id,
        order,
        title,
        size,
        height,
        config,
        has_data,
        payload,
    })
}

fn decode_payload(
    kind: WidgetKind,
    has_data: bool,
    data: Option<&Value>,
    path: &FieldPath,
) -> ValidationResult<WidgetPayload> {
    let data = data.filter(|value| !is_empty_payload(value));
    let Some(data) = data else {
        return Ok(WidgetPayload::empty(kind));
    };
    if !has_data {
        return Err(ValidationError::schema(
            path,
            "hasData is false but the widget carries a payload",
        ));
    }

    let payload = match kind {
        WidgetKind::Chart => WidgetPayload::Chart(Some(analysis::decode_analysis_data(data, path)?)),
        WidgetKind::Table => WidgetPayload::Table(Some(analysis::decode_analysis_data(data, path)?)),
        WidgetKind::Map => WidgetPayload::Map(Some(raster::decode_raster_tile(data, path)?)),
    };
    Ok(payload)
}

fn decode_metadata(value: &Value, path: &FieldPath) -> ValidationResult<SnapshotMetadata> {
    let map = object(value, path)?;
    Ok(SnapshotMetadata {
        total_widgets: unsigned(required(map, "totalWidgets", path)?, &path.key("totalWidgets"))?,
        total_columns: unsigned(required(map, "totalColumns", path)?, &path.key("totalColumns"))?,
        average_height: measure(required(map, "averageHeight", path)?, &path.key("averageHeight"))?,
        extra: remaining(map, &METADATA_FIELDS),
    })
}
