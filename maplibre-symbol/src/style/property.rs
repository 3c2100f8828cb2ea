//! Zoom and data dependent style property values.
//!
//! A [`PropertyValue`] is what the style declares: a constant, a function of the zoom level
//! ("camera"), a function of a feature property ("source") or a function of both ("composite").
//! Evaluating it at a zoom level yields a [`PossiblyEvaluated`] value which can still depend on
//! the feature and is resolved per feature with [`PossiblyEvaluated::evaluate`].

use std::collections::HashMap;

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;

use crate::style::style_types::{
    AlignmentType, SymbolAnchorType, SymbolPlacementType, TextJustifyType,
};

/// Properties of a decoded feature which data-driven functions can read.
pub type FeatureProperties = HashMap<String, Value>;

/// Values which can be produced by style functions.
pub trait Interpolate: Clone {
    /// Whether values can be blended. Other values switch at stop boundaries.
    const INTERPOLATABLE: bool = false;

    fn interpolate(from: &Self, to: &Self, t: f64) -> Self {
        if t < 1.0 {
            from.clone()
        } else {
            to.clone()
        }
    }
}

impl Interpolate for f64 {
    const INTERPOLATABLE: bool = true;

    fn interpolate(from: &Self, to: &Self, t: f64) -> Self {
        from + (to - from) * t
    }
}

impl Interpolate for [f64; 2] {
    const INTERPOLATABLE: bool = true;

    fn interpolate(from: &Self, to: &Self, t: f64) -> Self {
        [
            f64::interpolate(&from[0], &to[0], t),
            f64::interpolate(&from[1], &to[1], t),
        ]
    }
}

impl Interpolate for bool {}
impl Interpolate for String {}
impl Interpolate for Vec<String> {}
impl Interpolate for SymbolAnchorType {}
impl Interpolate for TextJustifyType {}
impl Interpolate for SymbolPlacementType {}
impl Interpolate for AlignmentType {}

/// How a style function evaluates: classified by its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionType {
    Constant,
    Camera,
    Source,
    Composite,
}

/// How a curve moves between its stops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interpolation {
    Exponential { base: f64 },
    Interval,
}

impl Interpolation {
    fn factor(self, input: f64, lower: f64, upper: f64) -> f64 {
        match self {
            Interpolation::Interval => 0.0,
            Interpolation::Exponential { base } => {
                let difference = upper - lower;
                let progress = input - lower;
                if difference == 0.0 {
                    0.0
                } else if base == 1.0 {
                    progress / difference
                } else {
                    (base.powf(progress) - 1.0) / (base.powf(difference) - 1.0)
                }
            }
        }
    }
}

/// Piecewise function over a numeric input, the zoom level or a numeric feature property.
#[derive(Debug, Clone)]
pub struct Curve<T> {
    pub interpolation: Interpolation,
    pub stops: Vec<(f64, T)>,
}

impl<T> Curve<T> {
    /// Finds the stops around `input` and the interpolation factor between them.
    fn bracket(&self, input: f64) -> Option<(usize, usize, f64)> {
        let last = self.stops.len().checked_sub(1)?;
        if input <= self.stops[0].0 {
            return Some((0, 0, 0.0));
        }
        if input >= self.stops[last].0 {
            return Some((last, last, 0.0));
        }
        let upper = self.stops.iter().position(|(stop, _)| *stop > input)?;
        let lower = upper - 1;
        let t = self
            .interpolation
            .factor(input, self.stops[lower].0, self.stops[upper].0);
        Some((lower, upper, t))
    }
}

impl<T: Interpolate> Curve<T> {
    pub fn evaluate(&self, input: f64) -> Option<T> {
        let (lower, upper, t) = self.bracket(input)?;
        if lower == upper || self.interpolation == Interpolation::Interval {
            return Some(self.stops[lower].1.clone());
        }
        Some(T::interpolate(
            &self.stops[lower].1,
            &self.stops[upper].1,
            t,
        ))
    }
}

/// How a feature property is mapped to an output value.
#[derive(Debug, Clone)]
pub enum SourceMapping<T> {
    Identity,
    Curve(Curve<T>),
    Categorical(Vec<(Value, T)>),
}

impl<T: Interpolate + DeserializeOwned> SourceMapping<T> {
    /// Every value the mapping can produce except identity values.
    fn outputs(&self) -> impl Iterator<Item = T> + '_ {
        let outputs: Box<dyn Iterator<Item = &T> + '_> = match self {
            SourceMapping::Identity => Box::new(std::iter::empty()),
            SourceMapping::Curve(curve) => Box::new(curve.stops.iter().map(|(_, value)| value)),
            SourceMapping::Categorical(stops) => Box::new(stops.iter().map(|(_, value)| value)),
        };
        outputs.cloned()
    }

    fn evaluate(&self, input: &Value) -> Option<T> {
        match self {
            SourceMapping::Identity => serde_json::from_value(input.clone()).ok(),
            SourceMapping::Curve(curve) => curve.evaluate(input.as_f64()?),
            SourceMapping::Categorical(stops) => stops
                .iter()
                .find(|(stop, _)| stop == input)
                .map(|(_, value)| value.clone()),
        }
    }
}

/// Function of a single feature property.
#[derive(Debug, Clone)]
pub struct SourceFunction<T> {
    pub property: String,
    pub mapping: SourceMapping<T>,
    pub default: Option<T>,
}

impl<T: Interpolate + DeserializeOwned> SourceFunction<T> {
    pub fn outputs(&self) -> Vec<T> {
        self.mapping.outputs().chain(self.default.clone()).collect()
    }

    pub fn evaluate(&self, properties: &FeatureProperties) -> Option<T> {
        properties
            .get(&self.property)
            .and_then(|input| self.mapping.evaluate(input))
            .or_else(|| self.default.clone())
    }
}

/// Function of the zoom level and a feature property. Every zoom stop carries its own mapping
/// of the feature property.
#[derive(Debug, Clone)]
pub struct CompositeFunction<T> {
    pub property: String,
    pub interpolation: Interpolation,
    pub zoom_stops: Vec<(f64, SourceMapping<T>)>,
    pub default: Option<T>,
}

impl<T: Interpolate + DeserializeOwned> CompositeFunction<T> {
    pub fn outputs(&self) -> Vec<T> {
        self.zoom_stops
            .iter()
            .flat_map(|(_, mapping)| mapping.outputs())
            .chain(self.default.clone())
            .collect()
    }

    pub fn evaluate(&self, zoom: f64, properties: &FeatureProperties) -> Option<T> {
        let evaluated = properties.get(&self.property).and_then(|input| {
            let outputs = Curve {
                interpolation: self.interpolation,
                stops: self
                    .zoom_stops
                    .iter()
                    .map(|(stop, mapping)| (*stop, mapping.evaluate(input)))
                    .collect::<Vec<_>>(),
            };
            let (lower, upper, t) = outputs.bracket(zoom)?;
            match (&outputs.stops[lower].1, &outputs.stops[upper].1) {
                (Some(from), Some(to)) if lower != upper => Some(match self.interpolation {
                    Interpolation::Interval => from.clone(),
                    Interpolation::Exponential { .. } => T::interpolate(from, to, t),
                }),
                (Some(from), _) => Some(from.clone()),
                (None, to) => to.clone(),
            }
        });
        evaluated.or_else(|| self.default.clone())
    }
}

/// A declared style property value.
#[derive(Debug, Clone)]
pub enum PropertyValue<T> {
    Constant(T),
    Camera(Curve<T>),
    Source(SourceFunction<T>),
    Composite(CompositeFunction<T>),
}

/// A property value evaluated at a zoom level. Data driven values still need a feature.
#[derive(Debug, Clone)]
pub enum PossiblyEvaluated<T> {
    Constant(T),
    /// A camera function without stops
    Undefined,
    Source(SourceFunction<T>),
    Composite {
        function: CompositeFunction<T>,
        zoom: f64,
    },
}

impl<T: Interpolate + DeserializeOwned> PropertyValue<T> {
    pub fn function_type(&self) -> FunctionType {
        match self {
            PropertyValue::Constant(_) => FunctionType::Constant,
            PropertyValue::Camera(_) => FunctionType::Camera,
            PropertyValue::Source(_) => FunctionType::Source,
            PropertyValue::Composite(_) => FunctionType::Composite,
        }
    }

    pub fn is_data_driven(&self) -> bool {
        matches!(
            self.function_type(),
            FunctionType::Source | FunctionType::Composite
        )
    }

    pub fn evaluate_at_zoom(&self, zoom: f64) -> PossiblyEvaluated<T> {
        match self {
            PropertyValue::Constant(value) => PossiblyEvaluated::Constant(value.clone()),
            PropertyValue::Camera(curve) => curve
                .evaluate(zoom)
                .map_or(PossiblyEvaluated::Undefined, PossiblyEvaluated::Constant),
            PropertyValue::Source(function) => PossiblyEvaluated::Source(function.clone()),
            PropertyValue::Composite(function) => PossiblyEvaluated::Composite {
                function: function.clone(),
                zoom,
            },
        }
    }

    /// Evaluates the value for a feature at a zoom level.
    pub fn evaluate(&self, zoom: f64, properties: &FeatureProperties) -> Option<T> {
        self.evaluate_at_zoom(zoom).evaluate(properties)
    }

    /// Zoom levels at which the function has stops, in ascending order.
    pub fn zoom_stops(&self) -> Vec<f64> {
        match self {
            PropertyValue::Camera(curve) => curve
                .stops
                .iter()
                .map(|(zoom, _)| *zoom)
                .filter(|zoom| zoom.is_finite())
                .collect(),
            PropertyValue::Composite(function) => {
                function.zoom_stops.iter().map(|(zoom, _)| *zoom).collect()
            }
            PropertyValue::Constant(_) | PropertyValue::Source(_) => vec![],
        }
    }
}

impl<T: Interpolate + DeserializeOwned> PossiblyEvaluated<T> {
    pub fn evaluate(&self, properties: &FeatureProperties) -> Option<T> {
        match self {
            PossiblyEvaluated::Constant(value) => Some(value.clone()),
            PossiblyEvaluated::Undefined => None,
            PossiblyEvaluated::Source(function) => function.evaluate(properties),
            PossiblyEvaluated::Composite { function, zoom } => {
                function.evaluate(*zoom, properties)
            }
        }
    }

    pub fn evaluate_or(&self, properties: &FeatureProperties, default: T) -> T {
        self.evaluate(properties).unwrap_or(default)
    }

    /// The constant value, or `default` if the value depends on the feature.
    pub fn constant_or(&self, default: T) -> T {
        match self {
            PossiblyEvaluated::Constant(value) => value.clone(),
            _ => default,
        }
    }
}

impl<T: Interpolate + DeserializeOwned> PropertyValue<T> {
    /// Reads a property value from its style JSON: a constant, a legacy function object or one
    /// of the `get`, `literal`, `interpolate` and `step` expressions.
    pub fn from_json(value: Value) -> Result<Self, String> {
        match &value {
            Value::Object(object) if object.contains_key("stops") || object.contains_key("type") => {
                parse_function(object)
            }
            Value::Array(array) if is_expression(array) => parse_expression(array),
            _ => serde_json::from_value(value)
                .map(PropertyValue::Constant)
                .map_err(|e| e.to_string()),
        }
    }
}

impl<'de, T: Interpolate + DeserializeOwned> Deserialize<'de> for PropertyValue<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        PropertyValue::from_json(value).map_err(serde::de::Error::custom)
    }
}

const EXPRESSION_OPERATORS: [&str; 4] = ["get", "literal", "interpolate", "step"];

fn is_expression(array: &[Value]) -> bool {
    array
        .first()
        .and_then(Value::as_str)
        .map_or(false, |op| EXPRESSION_OPERATORS.contains(&op))
}

fn from_json<T: DeserializeOwned>(value: &Value) -> Result<T, String> {
    serde_json::from_value(value.clone()).map_err(|e| e.to_string())
}

fn parse_function<T: Interpolate + DeserializeOwned>(
    object: &serde_json::Map<String, Value>,
) -> Result<PropertyValue<T>, String> {
    let base = object.get("base").and_then(Value::as_f64).unwrap_or(1.0);
    let function_type = object.get("type").and_then(Value::as_str);
    let default = object.get("default").map(from_json::<T>).transpose()?;
    let stops = object
        .get("stops")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let stop_pairs = stops
        .iter()
        .map(|stop| match stop.as_array().map(Vec::as_slice) {
            Some([input, output]) => Ok((input, output)),
            _ => Err(format!("function stop {stop} is not an [input, output] pair")),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let interpolation = match function_type {
        Some("exponential") => Interpolation::Exponential { base },
        Some("interval") => Interpolation::Interval,
        _ if T::INTERPOLATABLE => Interpolation::Exponential { base },
        _ => Interpolation::Interval,
    };

    let Some(property) = object.get("property").and_then(Value::as_str) else {
        if stop_pairs.is_empty() {
            return Err("camera function without stops".to_string());
        }
        let stops = stop_pairs
            .iter()
            .map(|(input, output)| {
                let zoom = input.as_f64().ok_or("zoom stop input is not a number")?;
                Ok((zoom, from_json::<T>(output)?))
            })
            .collect::<Result<Vec<_>, String>>()?;
        return Ok(PropertyValue::Camera(Curve {
            interpolation,
            stops,
        }));
    };
    let property = property.to_string();

    if function_type == Some("identity") {
        return Ok(PropertyValue::Source(SourceFunction {
            property,
            mapping: SourceMapping::Identity,
            default,
        }));
    }

    let is_composite = stop_pairs
        .first()
        .map_or(false, |(input, _)| input.is_object());

    if is_composite {
        let mut zoom_stops: Vec<(f64, Vec<(Value, T)>)> = Vec::new();
        for (input, output) in &stop_pairs {
            let zoom = input
                .get("zoom")
                .and_then(Value::as_f64)
                .ok_or("composite stop without zoom")?;
            let value = input.get("value").cloned().unwrap_or(Value::Null);
            let output = from_json::<T>(output)?;
            match zoom_stops.last_mut() {
                Some((last_zoom, group)) if *last_zoom == zoom => group.push((value, output)),
                _ => zoom_stops.push((zoom, vec![(value, output)])),
            }
        }
        let zoom_stops = zoom_stops
            .into_iter()
            .map(|(zoom, group)| Ok((zoom, source_mapping(function_type, interpolation, group)?)))
            .collect::<Result<Vec<_>, String>>()?;

        return Ok(PropertyValue::Composite(CompositeFunction {
            property,
            interpolation: if T::INTERPOLATABLE {
                Interpolation::Exponential { base }
            } else {
                Interpolation::Interval
            },
            zoom_stops,
            default,
        }));
    }

    let group = stop_pairs
        .iter()
        .map(|(input, output)| Ok(((*input).clone(), from_json::<T>(output)?)))
        .collect::<Result<Vec<_>, String>>()?;

    Ok(PropertyValue::Source(SourceFunction {
        property,
        mapping: source_mapping(function_type, interpolation, group)?,
        default,
    }))
}

fn source_mapping<T: Interpolate>(
    function_type: Option<&str>,
    interpolation: Interpolation,
    stops: Vec<(Value, T)>,
) -> Result<SourceMapping<T>, String> {
    let numeric = stops.iter().all(|(input, _)| input.is_number());
    if function_type == Some("categorical") || !numeric {
        return Ok(SourceMapping::Categorical(stops));
    }
    let stops = stops
        .into_iter()
        .map(|(input, output)| (input.as_f64().unwrap_or_default(), output))
        .collect();
    Ok(SourceMapping::Curve(Curve {
        interpolation,
        stops,
    }))
}

enum CurveInput {
    Zoom,
    Property(String),
}

fn parse_curve_input(value: &Value) -> Result<CurveInput, String> {
    match value.as_array().map(Vec::as_slice) {
        Some([op]) if op.as_str() == Some("zoom") => Ok(CurveInput::Zoom),
        Some([op, name]) if op.as_str() == Some("get") => name
            .as_str()
            .map(|name| CurveInput::Property(name.to_string()))
            .ok_or_else(|| "get expects a property name".to_string()),
        _ => Err(format!("unsupported curve input {value}")),
    }
}

fn curve_expression<T: Interpolate + DeserializeOwned>(
    input: CurveInput,
    curve: Curve<T>,
) -> PropertyValue<T> {
    match input {
        CurveInput::Zoom => PropertyValue::Camera(curve),
        CurveInput::Property(property) => PropertyValue::Source(SourceFunction {
            property,
            mapping: SourceMapping::Curve(curve),
            default: None,
        }),
    }
}

fn parse_stop_list<T: DeserializeOwned>(values: &[Value]) -> Result<Vec<(f64, T)>, String> {
    values
        .chunks(2)
        .map(|pair| match pair {
            [input, output] => Ok((
                input.as_f64().ok_or("stop input is not a number")?,
                from_json::<T>(output)?,
            )),
            _ => Err("stops must come in pairs".to_string()),
        })
        .collect()
}

fn parse_expression<T: Interpolate + DeserializeOwned>(
    array: &[Value],
) -> Result<PropertyValue<T>, String> {
    match array {
        [op, name] if op.as_str() == Some("get") => {
            let property = name.as_str().ok_or("get expects a property name")?;
            Ok(PropertyValue::Source(SourceFunction {
                property: property.to_string(),
                mapping: SourceMapping::Identity,
                default: None,
            }))
        }
        [op, value] if op.as_str() == Some("literal") => {
            Ok(PropertyValue::Constant(from_json::<T>(value)?))
        }
        [op, interpolation, input, stops @ ..] if op.as_str() == Some("interpolate") => {
            let interpolation = match interpolation.as_array().map(Vec::as_slice) {
                Some([kind]) if kind.as_str() == Some("linear") => {
                    Interpolation::Exponential { base: 1.0 }
                }
                Some([kind, base]) if kind.as_str() == Some("exponential") => {
                    Interpolation::Exponential {
                        base: base.as_f64().ok_or("exponential base is not a number")?,
                    }
                }
                _ => return Err(format!("unsupported interpolation {interpolation}")),
            };
            let stops = parse_stop_list(stops)?;
            if stops.is_empty() {
                return Err("interpolate without stops".to_string());
            }
            Ok(curve_expression(
                parse_curve_input(input)?,
                Curve {
                    interpolation,
                    stops,
                },
            ))
        }
        [op, input, first, stops @ ..] if op.as_str() == Some("step") => {
            let mut curve_stops = vec![(f64::NEG_INFINITY, from_json::<T>(first)?)];
            curve_stops.extend(parse_stop_list(stops)?);
            Ok(curve_expression(
                parse_curve_input(input)?,
                Curve {
                    interpolation: Interpolation::Interval,
                    stops: curve_stops,
                },
            ))
        }
        _ => Err(format!("unsupported expression {}", Value::from(array.to_vec()))),
    }
}
