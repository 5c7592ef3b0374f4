//! Decoded geometry: models, their layers, and the aggregator that groups
//! shape records into them.
//!
//! Both geometry decoders feed shapes through [`GeometryBuilder`], which
//! resolves the target model by ID and the target layer by Z rounded to the
//! format's 3-decimal precision. Resolution is a linear scan in encounter
//! order; files keep models and layers few enough for that.

use std::sync::OnceLock;

use clif_math::{checked_precision_key, precision_key, round3};
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, Result};
use crate::shape::{Hatch, PolyLine};

/// Accept a layer Z (mm) only if it has a distinct key at the format precision.
pub(crate) fn check_layer_z(declaration: &str, z: f64) -> Result<f64> {
    match checked_precision_key(z) {
        Some(_) => Ok(z),
        None => Err(DecodeError::format(
            declaration,
            format!("layer z {z} is out of range"),
        )),
    }
}

/// Record that created a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerCommand {
    /// `$$LAYER` text record.
    Ascii,
    /// Binary opcode 128, 16-bit unsigned Z.
    LayerShort,
    /// Binary opcode 127, 32-bit float Z.
    LayerLong,
}

#[derive(Debug, Clone, Copy)]
struct LayerMetrics {
    area: f64,
    perimeter: f64,
}

/// One Z cross-section of a model.
#[derive(Debug, Clone)]
pub struct Layer {
    z: f64,
    index: usize,
    command: LayerCommand,
    polylines: Vec<PolyLine>,
    hatches: Vec<Hatch>,
    /// Cleared whenever the polyline collection changes.
    metrics: OnceLock<LayerMetrics>,
}

impl Layer {
    pub(crate) fn new(z: f64, index: usize, command: LayerCommand) -> Self {
        Self {
            z,
            index,
            command,
            polylines: Vec::new(),
            hatches: Vec::new(),
            metrics: OnceLock::new(),
        }
    }

    /// Z height (mm) of the record that created this layer.
    pub fn z(&self) -> f64 {
        self.z
    }

    /// Z height rounded to the format precision; this is the layer's identity.
    pub fn z_rounded(&self) -> f64 {
        round3(self.z)
    }

    /// Global index, in creation order across all models.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Record kind that created the layer.
    pub fn command(&self) -> LayerCommand {
        self.command
    }

    /// Contours in this layer.
    pub fn polylines(&self) -> &[PolyLine] {
        &self.polylines
    }

    /// Hatches in this layer.
    pub fn hatches(&self) -> &[Hatch] {
        &self.hatches
    }

    /// Net area of the contours (mm²). Hatches do not contribute.
    pub fn area(&self) -> f64 {
        self.metrics().area
    }

    /// Total contour length (mm). Hatches do not contribute.
    pub fn perimeter(&self) -> f64 {
        self.metrics().perimeter
    }

    /// Whether `z` (mm) identifies this layer at the format precision.
    pub fn matches_z(&self, z: f64) -> bool {
        precision_key(self.z) == precision_key(z)
    }

    fn metrics(&self) -> &LayerMetrics {
        self.metrics.get_or_init(|| LayerMetrics {
            area: self.polylines.iter().map(PolyLine::area).sum(),
            perimeter: self.polylines.iter().map(PolyLine::perimeter).sum(),
        })
    }

    pub(crate) fn add_polyline(&mut self, polyline: PolyLine) {
        self.polylines.push(polyline);
        self.metrics.take();
    }

    pub(crate) fn add_hatch(&mut self, hatch: Hatch) {
        self.hatches.push(hatch);
    }

    #[cfg(test)]
    pub(crate) fn clear_polylines(&mut self) {
        self.polylines.clear();
        self.metrics.take();
    }
}

/// A part in the file: an ID and its layers in encounter order.
#[derive(Debug, Clone)]
pub struct Model {
    id: i32,
    layers: Vec<Layer>,
}

impl Model {
    pub(crate) fn new(id: i32) -> Self {
        Self {
            id,
            layers: Vec::new(),
        }
    }

    /// Model ID as decoded (unnormalized).
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Layers in the order they were first encountered.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Find the layer at `z` (mm), compared at the format precision.
    pub fn layer_at(&self, z: f64) -> Option<&Layer> {
        self.layers.iter().find(|l| l.matches_z(z))
    }

    /// Sum of layer areas (mm²).
    pub fn total_area(&self) -> f64 {
        self.layers.iter().map(Layer::area).sum()
    }

    /// Find the layer at `z`, or create it with the next global index.
    pub(crate) fn resolve_layer(
        &mut self,
        z: f64,
        command: LayerCommand,
        next_index: &mut usize,
    ) -> &mut Layer {
        let pos = match self.layers.iter().position(|l| l.matches_z(z)) {
            Some(pos) => pos,
            None => {
                tracing::debug!(model = self.id, z, index = *next_index, "new layer");
                self.layers.push(Layer::new(z, *next_index, command));
                *next_index += 1;
                self.layers.len() - 1
            }
        };
        &mut self.layers[pos]
    }
}

/// All models of a file, in encounter order.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    models: Vec<Model>,
}

impl Geometry {
    /// Models in the order they were first encountered.
    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Look up a model by ID.
    pub fn model(&self, id: i32) -> Option<&Model> {
        self.models.iter().find(|m| m.id == id)
    }

    /// Total number of layers over all models.
    pub fn layer_count(&self) -> usize {
        self.models.iter().map(|m| m.layers.len()).sum()
    }

    /// Check if no shapes were decoded.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Groups decoded shapes into models and layers.
#[derive(Debug, Default)]
pub(crate) struct GeometryBuilder {
    models: Vec<Model>,
    next_layer_index: usize,
}

impl GeometryBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Position of the first model with `id`, created and appended if absent.
    pub(crate) fn resolve_model(&mut self, id: i32) -> usize {
        match self.models.iter().position(|m| m.id == id) {
            Some(pos) => pos,
            None => {
                tracing::debug!(model = id, "new model");
                self.models.push(Model::new(id));
                self.models.len() - 1
            }
        }
    }

    fn layer_mut(&mut self, model_id: i32, z: f64, command: LayerCommand) -> &mut Layer {
        let pos = self.resolve_model(model_id);
        let Self {
            models,
            next_layer_index,
        } = self;
        models[pos].resolve_layer(z, command, next_layer_index)
    }

    pub(crate) fn add_polyline(
        &mut self,
        model_id: i32,
        z: f64,
        command: LayerCommand,
        polyline: PolyLine,
    ) {
        self.layer_mut(model_id, z, command).add_polyline(polyline);
    }

    pub(crate) fn add_hatch(&mut self, model_id: i32, z: f64, command: LayerCommand, hatch: Hatch) {
        self.layer_mut(model_id, z, command).add_hatch(hatch);
    }

    pub(crate) fn finish(self) -> Geometry {
        Geometry {
            models: self.models,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::PointHatch;
    use crate::shape::Direction;
    use approx::assert_relative_eq;
    use clif_math::Point2;

    fn square(size: f64, direction: Direction) -> PolyLine {
        PolyLine::new(
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(size, 0.0),
                Point2::new(size, size),
                Point2::new(0.0, size),
            ],
            direction,
            1.0,
        )
    }

    #[test]
    fn test_resolve_model_reuses_id() {
        let mut builder = GeometryBuilder::new();
        assert_eq!(builder.resolve_model(3), 0);
        assert_eq!(builder.resolve_model(1), 1);
        assert_eq!(builder.resolve_model(3), 0);
        let geometry = builder.finish();
        let ids: Vec<i32> = geometry.models().iter().map(Model::id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_layers_collapse_within_precision() {
        let mut builder = GeometryBuilder::new();
        builder.add_polyline(1, 1.0001, LayerCommand::Ascii, square(1.0, Direction::CounterClockwise));
        builder.add_polyline(1, 1.0003, LayerCommand::LayerLong, square(1.0, Direction::CounterClockwise));
        builder.add_polyline(1, 1.0006, LayerCommand::Ascii, square(1.0, Direction::CounterClockwise));
        let geometry = builder.finish();
        let model = geometry.model(1).unwrap();
        assert_eq!(model.layers().len(), 2);
        assert_eq!(model.layers()[0].polylines().len(), 2);
        // First record wins the layer's command kind and raw Z
        assert_eq!(model.layers()[0].command(), LayerCommand::Ascii);
        assert_relative_eq!(model.layers()[0].z(), 1.0001);
        assert_relative_eq!(model.layers()[1].z_rounded(), 1.001);
    }

    #[test]
    fn test_global_layer_index_across_models() {
        let mut builder = GeometryBuilder::new();
        builder.add_polyline(1, 0.0, LayerCommand::Ascii, square(1.0, Direction::CounterClockwise));
        builder.add_polyline(2, 0.0, LayerCommand::Ascii, square(1.0, Direction::CounterClockwise));
        builder.add_polyline(1, 0.1, LayerCommand::Ascii, square(1.0, Direction::CounterClockwise));
        builder.add_polyline(1, 0.0, LayerCommand::Ascii, square(1.0, Direction::CounterClockwise));
        let geometry = builder.finish();

        let m1 = geometry.model(1).unwrap();
        let m2 = geometry.model(2).unwrap();
        assert_eq!(m1.layers()[0].index(), 0);
        assert_eq!(m2.layers()[0].index(), 1);
        assert_eq!(m1.layers()[1].index(), 2);
        assert_eq!(geometry.layer_count(), 3);
    }

    #[test]
    fn test_layers_keep_encounter_order() {
        let mut builder = GeometryBuilder::new();
        builder.add_polyline(1, 2.0, LayerCommand::Ascii, square(1.0, Direction::CounterClockwise));
        builder.add_polyline(1, 1.0, LayerCommand::Ascii, square(1.0, Direction::CounterClockwise));
        let geometry = builder.finish();
        let zs: Vec<f64> = geometry.models()[0].layers().iter().map(Layer::z).collect();
        assert_eq!(zs, vec![2.0, 1.0]);
    }

    #[test]
    fn test_layer_metrics_net_area() {
        let mut layer = Layer::new(0.0, 0, LayerCommand::Ascii);
        layer.add_polyline(square(10.0, Direction::CounterClockwise));
        assert_relative_eq!(layer.area(), 100.0);

        // Adding a hole invalidates the cached totals
        layer.add_polyline(square(2.0, Direction::Clockwise));
        assert_relative_eq!(layer.area(), 96.0);
        assert_relative_eq!(layer.perimeter(), 48.0);

        layer.clear_polylines();
        assert_eq!(layer.area(), 0.0);
        assert_eq!(layer.perimeter(), 0.0);
    }

    #[test]
    fn test_hatches_excluded_from_layer_metrics() {
        let mut layer = Layer::new(0.0, 0, LayerCommand::Ascii);
        layer.add_polyline(square(10.0, Direction::CounterClockwise));
        let before = layer.perimeter();
        layer.add_hatch(Hatch::new(vec![PointHatch::from_raw([0.0, 10.0, 5.0, 5.0], 1.0)]));
        assert_relative_eq!(layer.perimeter(), before);
        assert_eq!(layer.hatches().len(), 1);
    }

    #[test]
    fn test_layer_at() {
        let mut builder = GeometryBuilder::new();
        builder.add_hatch(
            7,
            0.25,
            LayerCommand::LayerShort,
            Hatch::new(vec![PointHatch::from_raw([0.0, 1.0, 0.0, 0.0], 1.0)]),
        );
        let geometry = builder.finish();
        let model = geometry.model(7).unwrap();
        assert!(model.layer_at(0.2501).is_some());
        assert!(model.layer_at(0.26).is_none());
    }

    #[test]
    fn test_check_layer_z() {
        assert_eq!(check_layer_z("$$LAYER", 12.5).unwrap(), 12.5);
        let err = check_layer_z("$$LAYER", 1e20).unwrap_err();
        assert_eq!(err.declaration(), Some("$$LAYER"));
    }

    #[test]
    fn test_geometry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Geometry>();
    }
}
