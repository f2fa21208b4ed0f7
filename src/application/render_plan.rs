// Render plan - display sequence and renderability of a validated snapshot
use crate::domain::raster::TileStatus;
use crate::domain::snapshot::DashboardSnapshot;
use crate::domain::widget::{Widget, WidgetKind, WidgetPayload};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renderability {
    Ready,
    /// `hasData` is false or the payload is empty.
    NoData,
    Pending(TileStatus),
    Failed,
    /// Completed tile lacking its url or bounds.
    MissingTileReference,
}

impl Renderability {
    pub fn of(widget: &Widget) -> Self {
        if !widget.has_data {
            return Renderability::NoData;
        }
        match &widget.payload {
            WidgetPayload::Chart(None) | WidgetPayload::Table(None) | WidgetPayload::Map(None) => {
                Renderability::NoData
            }
            WidgetPayload::Chart(Some(_)) | WidgetPayload::Table(Some(_)) => Renderability::Ready,
            WidgetPayload::Map(Some(tile)) => match tile.status {
                TileStatus::Failed => Renderability::Failed,
                TileStatus::Pending | TileStatus::Processing => Renderability::Pending(tile.status),
                TileStatus::Completed if tile.is_renderable() => Renderability::Ready,
                TileStatus::Completed => Renderability::MissingTileReference,
            },
        }
    }

    pub fn is_renderable(&self) -> bool {
        matches!(self, Renderability::Ready)
    }
}

impl fmt::Display for Renderability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Renderability::Ready => f.write_str("ready"),
            Renderability::NoData => f.write_str("no data"),
            Renderability::Pending(status) => write!(f, "pending ({status})"),
            Renderability::Failed => f.write_str("failed"),
            Renderability::MissingTileReference => f.write_str("missing tile reference"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderStep {
    pub widget_id: String,
    pub order: i64,
    pub kind: WidgetKind,
    /// Position of the widget in the document's `widgets` array.
    pub position: usize,
    pub renderability: Renderability,
}

/// Widgets in `order` sequence, ready for dispatch by kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderPlan {
    steps: Vec<RenderStep>,
}

impl RenderPlan {
    pub fn for_snapshot(snapshot: &DashboardSnapshot) -> Self {
        let mut steps: Vec<RenderStep> = snapshot
            .widgets
            .iter()
            .enumerate()
            .map(|(position, widget)| RenderStep {
                widget_id: widget.id.clone(),
                order: widget.order,
                kind: widget.kind(),
                position,
                renderability: Renderability::of(widget),
            })
            .collect();
        steps.sort_by_key(|step| step.order);
        Self { steps }
    }

    pub fn steps(&self) -> &[RenderStep] {
        &self.steps
    }

    pub fn orders(&self) -> Vec<i64> {
        self.steps.iter().map(|step| step.order).collect()
    }

    pub fn renderable(&self) -> impl Iterator<Item = &RenderStep> {
        self.steps.iter().filter(|step| step.renderability.is_renderable())
    }

    pub fn blocked(&self) -> impl Iterator<Item = &RenderStep> {
        self.steps.iter().filter(|step| !step.renderability.is_renderable())
    }

    pub fn step(&self, widget_id: &str) -> Option<&RenderStep> {
        self.steps.iter().find(|step| step.widget_id == widget_id)
    }
}
