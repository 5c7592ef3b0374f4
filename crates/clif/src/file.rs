//! The decoded file and its serializable summary.

use chrono::NaiveDate;
use clif_math::Point3;
use serde::Serialize;

use crate::header::Header;
use crate::model::{Geometry, Layer, Model};
use crate::primitives::FileType;

/// A fully decoded CLI file.
///
/// Immutable once returned from a decode call.
#[derive(Debug, Clone)]
pub struct File {
    header: Header,
    geometry: Geometry,
}

impl File {
    pub(crate) fn new(header: Header, geometry: Geometry) -> Self {
        Self { header, geometry }
    }

    /// Header declarations.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Models, layers and shapes.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Models in encounter order. Shorthand for `geometry().models()`.
    pub fn models(&self) -> &[Model] {
        self.geometry.models()
    }

    /// Flat description of the file for reports.
    pub fn summary(&self) -> FileSummary {
        let header = &self.header;
        FileSummary {
            file_type: header.file_type,
            units: header.units,
            version: header.version,
            date: header.date,
            dimension: header
                .dimension
                .map(|d| [xyz(d.point1()), xyz(d.point2())]),
            declared_layers: header.layers,
            align: header.align,
            user_data: header.user_data.as_ref().map(ToString::to_string),
            layer_count: self.geometry.layer_count(),
            models: self
                .geometry
                .models()
                .iter()
                .map(|m| ModelSummary::new(m, header.label_for(m.id())))
                .collect(),
        }
    }
}

fn xyz(p: Point3) -> [f64; 3] {
    [p.x, p.y, p.z]
}

/// Header fields and per-model statistics of a decoded file.
#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    /// Geometry encoding.
    pub file_type: FileType,
    /// Millimeters per raw unit.
    pub units: f64,
    /// Format version.
    pub version: f64,
    /// Build date.
    pub date: Option<NaiveDate>,
    /// Bounding box corners (mm).
    pub dimension: Option<[[f64; 3]; 2]>,
    /// Layer count declared in the header.
    pub declared_layers: Option<u32>,
    /// Alignment flag.
    pub align: bool,
    /// Vendor payload, rendered as text.
    pub user_data: Option<String>,
    /// Decoded layers over all models.
    pub layer_count: usize,
    /// One entry per model, in encounter order.
    pub models: Vec<ModelSummary>,
}

/// Statistics of one model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    /// Model ID.
    pub id: i32,
    /// Header label for the ID.
    pub label: Option<String>,
    /// Sum of layer areas (mm²).
    pub total_area: f64,
    /// Layers in encounter order.
    pub layers: Vec<LayerSummary>,
}

impl ModelSummary {
    fn new(model: &Model, label: Option<&str>) -> Self {
        Self {
            id: model.id(),
            label: label.map(str::to_owned),
            total_area: model.total_area(),
            layers: model.layers().iter().map(LayerSummary::from).collect(),
        }
    }
}

/// Statistics of one layer.
#[derive(Debug, Clone, Serialize)]
pub struct LayerSummary {
    /// Global layer index.
    pub index: usize,
    /// Z height (mm), at format precision.
    pub z: f64,
    /// Net contour area (mm²).
    pub area: f64,
    /// Contour length (mm).
    pub perimeter: f64,
    /// Number of polylines.
    pub polylines: usize,
    /// Number of hatches.
    pub hatches: usize,
}

impl From<&Layer> for LayerSummary {
    fn from(layer: &Layer) -> Self {
        Self {
            index: layer.index(),
            z: layer.z_rounded(),
            area: layer.area(),
            perimeter: layer.perimeter(),
            polylines: layer.polylines().len(),
            hatches: layer.hatches().len(),
        }
    }
}
