//! Text and icon sizes at the zoom levels the layout needs them.
//!
//! The layout evaluates `text-size` at up to five zoom levels and `icon-size` at up to three:
//! at the bucket zoom for data driven values, at the bucket zoom plus one for collision boxes, at
//! zoom 18 for line label spacing, and for composite functions at the two zoom stops which cover
//! the bucket zoom. The latter are packed into the vertices so that the renderer can interpolate.

use crate::{
    style::{
        property::{FeatureProperties, FunctionType, PossiblyEvaluated, PropertyValue},
        symbol_layer::SymbolLayoutProperties,
    },
    util::constants::MAX_TEXT_SIZE_ZOOM,
};

/// Sizes are stored in vertices as fixed point values with one decimal.
pub const SIZE_PACK_FACTOR: f64 = 10.0;
/// Largest packed size which fits the 16 bit vertex attribute.
pub const MAX_PACKED_SIZE: f64 = u16::MAX as f64;

pub const DEFAULT_TEXT_SIZE: f64 = 16.0;
pub const DEFAULT_ICON_SIZE: f64 = 1.0;

/// How a size property varies, as far as the renderer needs to know.
#[derive(Debug, Clone, PartialEq)]
pub enum SizeData {
    Constant {
        layout_size: f64,
    },
    /// Depends on feature properties only, the size is packed per vertex
    Source,
    Camera {
        layout_size: f64,
        zoom_range: [f64; 2],
        size_range: [f64; 2],
    },
    /// Depends on zoom and feature properties, the sizes at both ends of `zoom_range` are packed
    /// per vertex
    Composite {
        zoom_range: [f64; 2],
    },
}

impl SizeData {
    pub fn new(tile_zoom: f64, value: &PropertyValue<f64>, default: f64) -> Self {
        let layout_size = value.evaluate_at_zoom(tile_zoom + 1.0).constant_or(default);

        match value.function_type() {
            FunctionType::Constant => SizeData::Constant { layout_size },
            FunctionType::Source => SizeData::Source,
            function_type @ (FunctionType::Camera | FunctionType::Composite) => {
                let Some(zoom_range) = covering_zoom_range(&value.zoom_stops(), tile_zoom) else {
                    return SizeData::Constant { layout_size };
                };

                if function_type == FunctionType::Composite {
                    SizeData::Composite { zoom_range }
                } else {
                    let size_at = |zoom: f64| value.evaluate_at_zoom(zoom).constant_or(default);
                    SizeData::Camera {
                        layout_size,
                        zoom_range,
                        size_range: [size_at(zoom_range[0]), size_at(zoom_range[1])],
                    }
                }
            }
        }
    }

    pub fn function_type(&self) -> FunctionType {
        match self {
            SizeData::Constant { .. } => FunctionType::Constant,
            SizeData::Source => FunctionType::Source,
            SizeData::Camera { .. } => FunctionType::Camera,
            SizeData::Composite { .. } => FunctionType::Composite,
        }
    }
}

/// The greatest zoom stop at or below `tile_zoom` and the first stop at or above `tile_zoom + 1`,
/// both clamped to the available stops.
fn covering_zoom_range(levels: &[f64], tile_zoom: f64) -> Option<[f64; 2]> {
    if levels.is_empty() {
        return None;
    }

    let mut lower = 0;
    while lower < levels.len() && levels[lower] <= tile_zoom {
        lower += 1;
    }
    let lower = lower.saturating_sub(1);

    let mut upper = lower;
    while upper < levels.len() && levels[upper] < tile_zoom + 1.0 {
        upper += 1;
    }
    let upper = upper.min(levels.len() - 1);

    Some([levels[lower], levels[upper]])
}

/// Size properties evaluated once per layout pass.
#[derive(Debug, Clone)]
pub struct Sizes {
    /// `text-size` at the bucket zoom plus one, used for collision boxes
    pub layout_text_size: PossiblyEvaluated<f64>,
    pub layout_icon_size: PossiblyEvaluated<f64>,
    /// `text-size` at a fixed high zoom, keeps line label spacing stable across zoom levels
    pub text_max_size: PossiblyEvaluated<f64>,
    /// `text-size` at both ends of the composite zoom range
    pub composite_text_sizes: Option<[PossiblyEvaluated<f64>; 2]>,
    pub composite_icon_sizes: Option<[PossiblyEvaluated<f64>; 2]>,
    text_size: PossiblyEvaluated<f64>,
    icon_size: PossiblyEvaluated<f64>,
}

impl Sizes {
    pub fn new(
        layout: &SymbolLayoutProperties,
        zoom: f64,
        text_size_data: &SizeData,
        icon_size_data: &SizeData,
    ) -> Self {
        let composite_sizes = |value: &PropertyValue<f64>, data: &SizeData| match data {
            SizeData::Composite {
                zoom_range: [min, max],
            } => Some([value.evaluate_at_zoom(*min), value.evaluate_at_zoom(*max)]),
            _ => None,
        };

        Self {
            layout_text_size: layout.text_size.evaluate_at_zoom(zoom + 1.0),
            layout_icon_size: layout.icon_size.evaluate_at_zoom(zoom + 1.0),
            text_max_size: layout.text_size.evaluate_at_zoom(MAX_TEXT_SIZE_ZOOM),
            composite_text_sizes: composite_sizes(&layout.text_size, text_size_data),
            composite_icon_sizes: composite_sizes(&layout.icon_size, icon_size_data),
            text_size: layout.text_size.evaluate_at_zoom(zoom),
            icon_size: layout.icon_size.evaluate_at_zoom(zoom),
        }
    }

    pub fn layout_text_size(&self, properties: &FeatureProperties) -> f64 {
        self.layout_text_size
            .evaluate_or(properties, DEFAULT_TEXT_SIZE)
    }

    pub fn layout_icon_size(&self, properties: &FeatureProperties) -> f64 {
        self.layout_icon_size
            .evaluate_or(properties, DEFAULT_ICON_SIZE)
    }

    /// Falls back to the layout text size if the value is undefined at the high zoom.
    pub fn text_max_size(&self, properties: &FeatureProperties) -> f64 {
        self.text_max_size
            .evaluate(properties)
            .unwrap_or_else(|| self.layout_text_size(properties))
    }

    /// Packed `text-size` of a feature for the vertices, `None` if the size is the same for all
    /// features. The values are not clamped yet.
    pub fn packed_text_size(
        &self,
        data: &SizeData,
        properties: &FeatureProperties,
    ) -> Option<[f64; 2]> {
        packed_size(
            data,
            &self.text_size,
            self.composite_text_sizes.as_ref(),
            properties,
            DEFAULT_TEXT_SIZE,
        )
    }

    pub fn packed_icon_size(
        &self,
        data: &SizeData,
        properties: &FeatureProperties,
    ) -> Option<[f64; 2]> {
        packed_size(
            data,
            &self.icon_size,
            self.composite_icon_sizes.as_ref(),
            properties,
            DEFAULT_ICON_SIZE,
        )
    }
}

fn packed_size(
    data: &SizeData,
    size: &PossiblyEvaluated<f64>,
    composite: Option<&[PossiblyEvaluated<f64>; 2]>,
    properties: &FeatureProperties,
    default: f64,
) -> Option<[f64; 2]> {
    match (data, composite) {
        (SizeData::Source, _) => {
            let packed = SIZE_PACK_FACTOR * size.evaluate_or(properties, default);
            Some([packed, packed])
        }
        (SizeData::Composite { .. }, Some([min, max])) => Some([
            SIZE_PACK_FACTOR * min.evaluate_or(properties, default),
            SIZE_PACK_FACTOR * max.evaluate_or(properties, default),
        ]),
        _ => None,
    }
}

/// Whether a packed size does not fit the vertex attribute.
pub fn exceeds_packing_range(packed: &[f64; 2]) -> bool {
    packed.iter().any(|value| *value > MAX_PACKED_SIZE)
}

pub fn clamp_packed_size(packed: [f64; 2]) -> [f64; 2] {
    packed.map(|value| value.clamp(0.0, MAX_PACKED_SIZE))
}
