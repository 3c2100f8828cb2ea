//! Enumerations used by symbol layout properties.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolPlacementType {
    #[default]
    Point,
    Line,
    LineCenter,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolAnchorType {
    #[default]
    Center,
    Left,
    Right,
    Top,
    Bottom,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl SymbolAnchorType {
    /// Justification implied by the horizontal component of the anchor name: "top-left" and
    /// "left" justify left, "top" and "center" justify center.
    pub fn implied_justification(self) -> TextJustifyType {
        match self {
            SymbolAnchorType::Left | SymbolAnchorType::TopLeft | SymbolAnchorType::BottomLeft => {
                TextJustifyType::Left
            }
            SymbolAnchorType::Right
            | SymbolAnchorType::TopRight
            | SymbolAnchorType::BottomRight => TextJustifyType::Right,
            SymbolAnchorType::Center | SymbolAnchorType::Top | SymbolAnchorType::Bottom => {
                TextJustifyType::Center
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TextJustifyType {
    Auto,
    #[default]
    Center,
    Left,
    Right,
}

impl TextJustifyType {
    /// justify left = 0, right = 1, center = .5
    pub fn factor(self) -> f64 {
        match self {
            TextJustifyType::Right => 1.0,
            TextJustifyType::Left => 0.0,
            TextJustifyType::Center | TextJustifyType::Auto => 0.5,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AlignmentType {
    Map,
    Viewport,
    #[default]
    Auto,
}

impl AlignmentType {
    /// `auto` follows the placement: labels along lines rotate with the map.
    pub fn resolve(self, placement: SymbolPlacementType) -> AlignmentType {
        match self {
            AlignmentType::Auto if placement != SymbolPlacementType::Point => AlignmentType::Map,
            AlignmentType::Auto => AlignmentType::Viewport,
            other => other,
        }
    }
}
