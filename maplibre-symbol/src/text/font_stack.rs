use std::collections::BTreeSet;

use crate::style::{property::PropertyValue, symbol_layer::SymbolLayer};

// An array of font names
pub type FontStack = Vec<String>;
/// Font stacks are keyed by their comma separated font names.
pub type FontStackKey = String;

pub fn font_stack_key(font_stack: &FontStack) -> FontStackKey {
    font_stack.join(",")
}

/// Statically evaluate layer properties to determine what font stacks are used.
pub fn font_stacks(layers: &[SymbolLayer]) -> BTreeSet<FontStack> {
    let mut result = BTreeSet::new();
    for layer in layers {
        populate_font_stack(layer, &mut result);
    }
    result
}

fn populate_font_stack(layer: &SymbolLayer, stack: &mut BTreeSet<FontStack>) {
    if !layer.layout.has_text_field() {
        return;
    }

    match &layer.layout.text_font {
        PropertyValue::Constant(font_stack) => {
            stack.insert(font_stack.clone());
        }
        PropertyValue::Camera(curve) => {
            stack.extend(curve.stops.iter().map(|(_, font_stack)| font_stack.clone()));
        }
        PropertyValue::Source(function) => {
            stack.extend(function.outputs());
        }
        PropertyValue::Composite(function) => {
            stack.extend(function.outputs());
        }
    }
}
