//! Derives shaping requests for a feature from the layout properties of its layer.

use crate::{
    buckets::symbol_bucket::SymbolBucket,
    layout::symbol_instance::ShapedTextOrientations,
    style::{
        property::FeatureProperties,
        style_types::{SymbolAnchorType, SymbolPlacementType, TextJustifyType},
        symbol_layer::SymbolLayoutProperties,
    },
    text::{
        font_stack::font_stack_key,
        glyph::{GlyphMap, GlyphPositions, WritingModeType},
        i18n,
        image::{ImageMap, ImagePositions},
        shaping::{get_shaping, PositionedIcon, TextShapingParameters},
    },
    util::constants::ONE_EM,
};

pub const MIXED_SDF_ICONS_WARNING: &str =
    "Style sheet warning: Cannot mix SDF and non-SDF icons in one buffer";

/// Shapes `text` once per distinct justification and, for upright labels along lines in scripts
/// which allow it, once vertically.
pub fn shape_text_orientations(
    text: &str,
    layout: &SymbolLayoutProperties,
    zoom: f64,
    properties: &FeatureProperties,
    glyph_map: &GlyphMap,
    glyph_positions: &GlyphPositions,
) -> ShapedTextOrientations {
    let mut orientations = ShapedTextOrientations::default();

    let font_stack = font_stack_key(&layout.text_font.evaluate(zoom, properties).unwrap_or_default());
    let line_height = layout.text_line_height.evaluate(zoom, properties).unwrap_or(1.2) * ONE_EM;
    let text_along_line = layout.text_along_line();

    let text_offset = layout
        .text_offset
        .evaluate(zoom, properties)
        .unwrap_or_default()
        .map(|offset| offset * ONE_EM);
    let spacing = if i18n::allows_letter_spacing(text) {
        layout
            .text_letter_spacing
            .evaluate(zoom, properties)
            .unwrap_or_default()
            * ONE_EM
    } else {
        0.0
    };

    let text_anchor = text_anchors(layout, zoom, properties, text_along_line);
    let text_justify = text_justifications(layout, zoom, properties, &text_anchor);

    let max_width = if layout.symbol_placement == SymbolPlacementType::Point {
        layout.text_max_width.evaluate(zoom, properties).unwrap_or(10.0) * ONE_EM
    } else {
        0.0
    };

    let parameters = |text_anchor, text_justify, writing_mode| TextShapingParameters {
        max_width,
        line_height,
        text_anchor,
        text_justify,
        spacing,
        translate: text_offset,
        writing_mode,
    };

    for (i, justification) in text_justify.iter().enumerate() {
        if orientations.contains(*justification) {
            continue;
        }

        // With variable anchors all shapings use a top-left anchor. The offsets for the actual
        // anchor are applied at placement time.
        let anchor = if text_anchor.len() > 1 {
            SymbolAnchorType::TopLeft
        } else {
            text_anchor[i]
        };

        if let Some(shaping) = get_shaping(
            text,
            &parameters(anchor, *justification, WritingModeType::Horizontal),
            &font_stack,
            glyph_map,
            glyph_positions,
        ) {
            orientations.horizontal.push((*justification, shaping));
        }
    }

    if i18n::allows_vertical_writing_mode(text) && text_along_line && layout.text_keep_upright {
        orientations.vertical = get_shaping(
            text,
            &parameters(text_anchor[0], text_justify[0], WritingModeType::Vertical),
            &font_stack,
            glyph_map,
            glyph_positions,
        );
    }

    orientations
}

/// Variable anchors do not apply to labels along lines. Never empty.
fn text_anchors(
    layout: &SymbolLayoutProperties,
    zoom: f64,
    properties: &FeatureProperties,
    text_along_line: bool,
) -> Vec<SymbolAnchorType> {
    match &layout.text_variable_anchor {
        Some(anchors) if !text_along_line && !anchors.is_empty() => anchors.clone(),
        _ => vec![layout
            .text_anchor
            .evaluate(zoom, properties)
            .unwrap_or_default()],
    }
}

/// One justification per anchor for variable anchors, otherwise `text-justify` with `auto`
/// resolved against the anchor.
fn text_justifications(
    layout: &SymbolLayoutProperties,
    zoom: f64,
    properties: &FeatureProperties,
    text_anchor: &[SymbolAnchorType],
) -> Vec<TextJustifyType> {
    if text_anchor.len() > 1 {
        return text_anchor
            .iter()
            .map(|anchor| anchor.implied_justification())
            .collect();
    }

    let justify = layout
        .text_justify
        .evaluate(zoom, properties)
        .unwrap_or_default();
    if justify == TextJustifyType::Auto {
        vec![text_anchor[0].implied_justification()]
    } else {
        vec![justify]
    }
}

/// Positions the icon of a feature if its image is available. The first icon decides whether the
/// bucket holds SDF icons.
pub fn shape_feature_icon(
    bucket: &mut SymbolBucket,
    icon: &str,
    layout: &SymbolLayoutProperties,
    properties: &FeatureProperties,
    image_map: &ImageMap,
    image_positions: &ImagePositions,
) -> Option<PositionedIcon> {
    let image = image_map.get(icon)?;
    let Some(image_position) = image_positions.get(icon) else {
        log::debug!("image {icon} has no position in the icon atlas");
        return None;
    };
    let zoom = bucket.zoom;

    let shaped_icon = PositionedIcon::shape_icon(
        image_position.clone(),
        &layout
            .icon_offset
            .evaluate(zoom, properties)
            .unwrap_or_default(),
        layout
            .icon_anchor
            .evaluate(zoom, properties)
            .unwrap_or_default(),
    );

    match bucket.sdf_icons {
        None => bucket.sdf_icons = Some(image.sdf),
        Some(sdf) if sdf != image.sdf => bucket.warnings.warn(MIXED_SDF_ICONS_WARNING),
        Some(_) => {}
    }

    if image.pixel_ratio != bucket.pixel_ratio
        || layout.icon_rotate.evaluate_at_zoom(zoom).constant_or(1.0) != 0.0
    {
        bucket.icons_need_linear = true;
    }

    Some(shaped_icon)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::{
        buckets::symbol_bucket::SymbolBucket,
        euclid::{Point2D, Rect, Size2D},
        layout::{
            shaping_adapter::{shape_feature_icon, shape_text_orientations},
            symbol_layout::SymbolLayoutParameters,
        },
        style::{style_types::TextJustifyType, symbol_layer::SymbolLayer},
        text::{
            glyph::{
                Glyph, GlyphMap, GlyphMetrics, GlyphPosition, GlyphPositionMap, GlyphPositions,
                Glyphs,
            },
            image::{Image, ImageMap, ImagePosition, ImagePositions},
        },
    };

    const FONT: &str = "Open Sans Regular,Arial Unicode MS Regular";

    fn resources(text: &str) -> (GlyphMap, GlyphPositions) {
        let metrics = GlyphMetrics {
            width: 14,
            height: 18,
            left: 1,
            top: -6,
            advance: 16,
        };
        let glyph_map = GlyphMap::from([(
            FONT.to_string(),
            text.chars()
                .map(|id| (id, Some(Glyph { id, metrics })))
                .collect::<Glyphs>(),
        )]);
        let glyph_positions = GlyphPositions::from([(
            FONT.to_string(),
            text.chars()
                .map(|id| {
                    (
                        id,
                        GlyphPosition {
                            rect: Rect::new(Point2D::new(0, 0), Size2D::new(20, 24)),
                            metrics,
                        },
                    )
                })
                .collect::<GlyphPositionMap>(),
        )]);
        (glyph_map, glyph_positions)
    }

    #[test]
    fn one_shaping_per_justification() {
        let layer = SymbolLayer::from_json(
            r#"{"id": "l", "type": "symbol", "layout": {
                "text-field": "{name}",
                "text-variable-anchor": ["left", "top-left", "right", "top"]
            }}"#,
        )
        .unwrap();
        let (glyph_map, glyph_positions) = resources("Label");
        let orientations = shape_text_orientations(
            "Label",
            &layer.layout,
            10.0,
            &HashMap::new(),
            &glyph_map,
            &glyph_positions,
        );

        let justifications: Vec<_> = orientations.horizontal.iter().map(|(j, _)| *j).collect();
        assert_eq!(
            justifications,
            vec![
                TextJustifyType::Left,
                TextJustifyType::Right,
                TextJustifyType::Center
            ]
        );
        // all variants share the top left anchor
        for (_, shaping) in &orientations.horizontal {
            assert_eq!(shaping.left, 0.0);
            assert_eq!(shaping.top, 0.0);
        }
        assert!(orientations.vertical.is_none());
    }

    #[test]
    fn vertical_shaping_for_upright_line_labels() {
        let (glyph_map, glyph_positions) = resources("中文");
        let line_layer = SymbolLayer::from_json(
            r#"{"id": "l", "type": "symbol", "layout": {"symbol-placement": "line", "text-field": "x"}}"#,
        )
        .unwrap();
        let orientations = shape_text_orientations(
            "中文",
            &line_layer.layout,
            10.0,
            &HashMap::new(),
            &glyph_map,
            &glyph_positions,
        );
        assert_eq!(orientations.horizontal.len(), 1);
        assert!(orientations.vertical.is_some());

        let point_layer = SymbolLayer::from_json(
            r#"{"id": "l", "type": "symbol", "layout": {"text-field": "x"}}"#,
        )
        .unwrap();
        let orientations = shape_text_orientations(
            "中文",
            &point_layer.layout,
            10.0,
            &HashMap::new(),
            &glyph_map,
            &glyph_positions,
        );
        assert!(orientations.vertical.is_none());
    }

    #[test]
    fn auto_justification_follows_anchor() {
        let layer = SymbolLayer::from_json(
            r#"{"id": "l", "type": "symbol", "layout": {
                "text-field": "x", "text-justify": "auto", "text-anchor": "bottom-right"
            }}"#,
        )
        .unwrap();
        let (glyph_map, glyph_positions) = resources("ab");
        let orientations = shape_text_orientations(
            "ab",
            &layer.layout,
            10.0,
            &HashMap::new(),
            &glyph_map,
            &glyph_positions,
        );
        assert!(orientations.contains(TextJustifyType::Right));
    }

    #[test]
    fn icon_flags() {
        let layer = SymbolLayer::from_json(
            r#"{"id": "icons", "type": "symbol", "layout": {"icon-image": "{maki}"}}"#,
        )
        .unwrap();
        let mut bucket = SymbolBucket::new(&layer, &SymbolLayoutParameters::default());

        let image = |id: &str, sdf: bool, pixel_ratio: f64| {
            (
                id.to_string(),
                Image {
                    id: id.to_string(),
                    pixel_ratio,
                    sdf,
                },
            )
        };
        let image_map = ImageMap::from([
            image("sdf", true, 1.0),
            image("raster", false, 1.0),
            image("retina", true, 2.0),
        ]);
        let position = ImagePosition {
            pixel_ratio: 1.0,
            padded_rect: Rect::new(Point2D::new(0, 0), Size2D::new(22, 22)),
            sdf: true,
        };
        let image_positions: ImagePositions = ["sdf", "raster", "retina"]
            .into_iter()
            .map(|id| (id.to_string(), position.clone()))
            .collect();

        let shape = |bucket: &mut SymbolBucket, icon: &str| {
            shape_feature_icon(
                bucket,
                icon,
                &layer.layout,
                &HashMap::new(),
                &image_map,
                &image_positions,
            )
        };

        assert!(shape(&mut bucket, "missing").is_none());
        assert_eq!(bucket.sdf_icons, None);

        let icon = shape(&mut bucket, "sdf").unwrap();
        assert_eq!((icon.left, icon.right), (-10.0, 10.0));
        assert_eq!(bucket.sdf_icons, Some(true));
        assert!(!bucket.icons_need_linear);

        shape(&mut bucket, "raster");
        shape(&mut bucket, "raster");
        assert_eq!(bucket.sdf_icons, Some(true));
        assert_eq!(bucket.warnings.len(), 1);
        assert!(bucket
            .warnings
            .contains("Style sheet warning: Cannot mix SDF and non-SDF icons in one buffer"));

        shape(&mut bucket, "retina");
        assert!(bucket.icons_need_linear);
    }
}
