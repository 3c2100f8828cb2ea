//! Symbol style layers and their layout properties.

use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::StyleError,
    style::{
        property::{FeatureProperties, PropertyValue},
        style_types::{AlignmentType, SymbolAnchorType, SymbolPlacementType, TextJustifyType},
    },
};

/// A style layer of type `symbol`.
#[derive(Deserialize, Debug, Clone)]
pub struct SymbolLayer {
    pub id: String,
    #[serde(rename = "type")]
    pub typ: String,
    #[serde(rename = "source-layer")]
    #[serde(default)]
    pub source_layer: Option<String>,
    #[serde(default)]
    pub minzoom: Option<f64>,
    #[serde(default)]
    pub maxzoom: Option<f64>,
    #[serde(default)]
    pub layout: SymbolLayoutProperties,
}

impl SymbolLayer {
    /// Reads a symbol layer from its style JSON.
    pub fn from_json(json: &str) -> Result<Self, StyleError> {
        let layer: SymbolLayer = serde_json::from_str(json)?;
        if layer.typ != "symbol" {
            return Err(StyleError::NotASymbolLayer(layer.id));
        }
        Ok(layer)
    }

    /// Whether the layer is visible at `zoom`. `minzoom` is inclusive, `maxzoom` exclusive.
    pub fn is_visible_at(&self, zoom: f64) -> bool {
        self.minzoom.map_or(true, |min| zoom >= min) && self.maxzoom.map_or(true, |max| zoom < max)
    }
}

/// Layout properties of a symbol layer. Missing properties take their style-spec default.
#[derive(Deserialize, Debug, Clone)]
#[serde(default, rename_all = "kebab-case")]
pub struct SymbolLayoutProperties {
    pub symbol_placement: SymbolPlacementType,
    pub symbol_spacing: PropertyValue<f64>,

    pub text_field: Option<PropertyValue<String>>,
    pub text_font: PropertyValue<Vec<String>>,
    pub text_size: PropertyValue<f64>,
    pub text_line_height: PropertyValue<f64>,
    pub text_letter_spacing: PropertyValue<f64>,
    pub text_max_width: PropertyValue<f64>,
    pub text_offset: PropertyValue<[f64; 2]>,
    pub text_anchor: PropertyValue<SymbolAnchorType>,
    #[serde(alias = "dynamic-text-anchor")]
    pub text_variable_anchor: Option<Vec<SymbolAnchorType>>,
    pub text_justify: PropertyValue<TextJustifyType>,
    pub text_rotation_alignment: AlignmentType,
    pub text_keep_upright: bool,
    pub text_max_angle: PropertyValue<f64>,
    pub text_padding: PropertyValue<f64>,
    pub text_rotate: PropertyValue<f64>,

    pub icon_image: Option<PropertyValue<String>>,
    pub icon_size: PropertyValue<f64>,
    pub icon_offset: PropertyValue<[f64; 2]>,
    pub icon_anchor: PropertyValue<SymbolAnchorType>,
    pub icon_rotation_alignment: AlignmentType,
    pub icon_padding: PropertyValue<f64>,
    pub icon_rotate: PropertyValue<f64>,
}

impl Default for SymbolLayoutProperties {
    fn default() -> Self {
        Self {
            symbol_placement: SymbolPlacementType::Point,
            symbol_spacing: PropertyValue::Constant(250.0),
            text_field: None,
            text_font: PropertyValue::Constant(vec![
                "Open Sans Regular".to_string(),
                "Arial Unicode MS Regular".to_string(),
            ]),
            text_size: PropertyValue::Constant(16.0),
            text_line_height: PropertyValue::Constant(1.2),
            text_letter_spacing: PropertyValue::Constant(0.0),
            text_max_width: PropertyValue::Constant(10.0),
            text_offset: PropertyValue::Constant([0.0, 0.0]),
            text_anchor: PropertyValue::Constant(SymbolAnchorType::Center),
            text_variable_anchor: None,
            text_justify: PropertyValue::Constant(TextJustifyType::Center),
            text_rotation_alignment: AlignmentType::Auto,
            text_keep_upright: true,
            text_max_angle: PropertyValue::Constant(45.0),
            text_padding: PropertyValue::Constant(2.0),
            text_rotate: PropertyValue::Constant(0.0),
            icon_image: None,
            icon_size: PropertyValue::Constant(1.0),
            icon_offset: PropertyValue::Constant([0.0, 0.0]),
            icon_anchor: PropertyValue::Constant(SymbolAnchorType::Center),
            icon_rotation_alignment: AlignmentType::Auto,
            icon_padding: PropertyValue::Constant(2.0),
            icon_rotate: PropertyValue::Constant(0.0),
        }
    }
}

impl SymbolLayoutProperties {
    pub fn has_text_field(&self) -> bool {
        self.text_field.is_some()
    }

    /// Text rotation alignment with `auto` resolved against the placement.
    pub fn text_rotation_alignment(&self) -> AlignmentType {
        self.text_rotation_alignment.resolve(self.symbol_placement)
    }

    pub fn icon_rotation_alignment(&self) -> AlignmentType {
        self.icon_rotation_alignment.resolve(self.symbol_placement)
    }

    /// Text follows the direction of the line it is placed on.
    pub fn text_along_line(&self) -> bool {
        self.text_rotation_alignment() == AlignmentType::Map
            && self.symbol_placement != SymbolPlacementType::Point
    }

    pub fn icon_along_line(&self) -> bool {
        self.icon_rotation_alignment() == AlignmentType::Map
            && self.symbol_placement != SymbolPlacementType::Point
    }

    /// The label text of a feature, with `{property}` tokens replaced.
    pub fn feature_text(&self, zoom: f64, properties: &FeatureProperties) -> Option<String> {
        let field = self.text_field.as_ref()?.evaluate(zoom, properties)?;
        let text = resolve_tokens(properties, &field);
        (!text.is_empty()).then_some(text)
    }

    /// The icon name of a feature, with `{property}` tokens replaced.
    pub fn feature_icon(&self, zoom: f64, properties: &FeatureProperties) -> Option<String> {
        let image = self.icon_image.as_ref()?.evaluate(zoom, properties)?;
        let icon = resolve_tokens(properties, &image);
        (!icon.is_empty()).then_some(icon)
    }
}

/// Replaces `{name}` tokens with the feature property `name`. Missing properties resolve to an
/// empty string.
pub fn resolve_tokens(properties: &FeatureProperties, template: &str) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        result.push_str(&rest[..open]);
        let key = &rest[open + 1..open + close];
        match properties.get(key) {
            Some(Value::String(value)) => result.push_str(value),
            Some(Value::Null) | None => {}
            Some(value) => result.push_str(&value.to_string()),
        }
        rest = &rest[open + close + 1..];
    }

    result.push_str(rest);
    result
}
