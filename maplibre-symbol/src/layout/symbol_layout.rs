//! The symbol layout pass: turns the features of one symbol layer on one tile into a
//! [`SymbolBucket`].

use crate::{
    buckets::symbol_bucket::{LineArray, SymbolBucket, SymbolBufferKind},
    coords::{is_within_extent, EXTENT},
    geometry::{
        anchor::Anchor,
        classify_rings::classify_rings,
        clip_line::clip_lines,
        get_anchors::{get_anchors, get_center_anchor, LabelExtent},
        polylabel::find_pole_of_inaccessibility,
        FeatureType, GeometryCollection, GeometryCoordinates,
    },
    layout::{
        dedup::CompareText,
        shaping_adapter::{shape_feature_icon, shape_text_orientations},
        sizes::{clamp_packed_size, exceeds_packing_range, Sizes},
        symbol_instance::{Justified, ShapedTextOrientations, SymbolInstance},
    },
    style::{
        property::FeatureProperties,
        style_types::SymbolPlacementType,
        symbol_layer::{SymbolLayer, SymbolLayoutProperties},
    },
    text::{
        collision_feature::{CollisionFeature, IndexedSubfeature},
        glyph::{GlyphMap, GlyphPositions, Shaping, WritingModeType},
        image::{ImageMap, ImagePositions},
        quads::{get_glyph_quads, get_icon_quads, SymbolQuad, SymbolQuads},
        shaping::PositionedIcon,
    },
    util::{
        constants::{ONE_EM, POLE_OF_INACCESSIBILITY_PRECISION},
        math::deg2radf,
        murmur::text_key,
    },
};

/// Most glyph and icon quads a bucket can hold. Symbols which do not fit any more are dropped.
pub const MAX_GLYPHS: usize = 65535;

pub const TOO_MANY_GLYPHS_WARNING: &str = "Too many glyphs being rendered in a tile.";

/// Parameters of the tile a layout pass runs for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymbolLayoutParameters {
    /// Zoom level of the tile, including overscaling
    pub zoom: f64,
    pub overscaling: f64,
    /// Device pixel ratio the icons are rendered with
    pub pixel_ratio: f64,
    pub show_collision_boxes: bool,
    /// Index of the bucket within its tile
    pub bucket_index: usize,
}

impl Default for SymbolLayoutParameters {
    fn default() -> Self {
        Self {
            zoom: 0.0,
            overscaling: 1.0,
            pixel_ratio: 1.0,
            show_collision_boxes: false,
            bucket_index: 0,
        }
    }
}

/// A decoded feature of a symbol layer.
#[derive(Debug, Clone)]
pub struct SymbolFeature {
    /// Index of the feature in its source layer
    pub index: usize,
    pub source_layer_index: usize,
    pub typ: FeatureType,
    pub geometry: GeometryCollection,
    pub properties: FeatureProperties,
    pub text: Option<String>,
    pub icon: Option<String>,
}

impl SymbolFeature {
    pub fn new(
        index: usize,
        typ: FeatureType,
        geometry: GeometryCollection,
        properties: FeatureProperties,
    ) -> Self {
        Self {
            index,
            source_layer_index: 0,
            typ,
            geometry,
            properties,
            text: None,
            icon: None,
        }
    }

    /// Evaluates `text-field` and `icon-image` for this feature.
    pub fn resolve_label(&mut self, layout: &SymbolLayoutProperties, zoom: f64) {
        self.text = layout.feature_text(zoom, &self.properties);
        self.icon = layout.feature_icon(zoom, &self.properties);
    }
}

/// Glyphs and images resolved for a tile.
#[derive(Debug, Clone, Default)]
pub struct SymbolResources {
    pub glyph_map: GlyphMap,
    pub glyph_positions: GlyphPositions,
    pub image_map: ImageMap,
    pub image_positions: ImagePositions,
}

/// Lays out the `features` of `layer`. Features are processed in order and every output array of
/// the bucket is appended to in that order. The pass never fails, features which can not be
/// placed are skipped.
pub fn perform_symbol_layout(
    layer: &SymbolLayer,
    features: &[SymbolFeature],
    resources: &SymbolResources,
    parameters: &SymbolLayoutParameters,
) -> SymbolBucket {
    let bucket = SymbolBucket::new(layer, parameters);
    let sizes = Sizes::new(
        &layer.layout,
        bucket.zoom,
        &bucket.text_size_data,
        &bucket.icon_size_data,
    );

    let mut symbol_layout = SymbolLayout {
        layout: &layer.layout,
        resources,
        sizes,
        compare_text: CompareText::default(),
        text_along_line: layer.layout.text_along_line(),
        bucket,
    };

    for feature in features {
        symbol_layout.process_feature(feature);
    }

    let mut bucket = symbol_layout.bucket;
    if parameters.show_collision_boxes {
        bucket.generate_collision_debug_buffers();
    }

    log::trace!(
        "layer {} laid out {} symbol instances",
        bucket.layer_id,
        bucket.symbol_instances.len()
    );

    bucket
}

/// Per-feature scales and paddings, in tile units.
struct FeatureScales {
    text_box_scale: f64,
    text_padding: f64,
    icon_box_scale: f64,
    icon_padding: f64,
    /// In ems
    text_offset: [f64; 2],
    icon_offset: [f64; 2],
}

/// Quads of one symbol, built before anything is added to the bucket.
struct LabelQuads {
    /// One entry per horizontal shaping, in the same order
    horizontal: Vec<SymbolQuads>,
    vertical: Option<SymbolQuads>,
    /// Icon quads and the icon rotation
    icon: Option<(SymbolQuads, f64)>,
    text_rotate: f64,
}

impl LabelQuads {
    fn len(&self) -> usize {
        self.horizontal.iter().map(Vec::len).sum::<usize>()
            + self.vertical.as_ref().map_or(0, Vec::len)
            + self.icon.as_ref().map_or(0, |(quads, _)| quads.len())
    }
}

/// State of one layout pass.
struct SymbolLayout<'a> {
    layout: &'a SymbolLayoutProperties,
    resources: &'a SymbolResources,
    sizes: Sizes,
    compare_text: CompareText,
    text_along_line: bool,
    bucket: SymbolBucket,
}

impl SymbolLayout<'_> {
    fn process_feature(&mut self, feature: &SymbolFeature) {
        let zoom = self.bucket.zoom;
        let properties = &feature.properties;

        let shaped_text_orientations = feature
            .text
            .as_deref()
            .map(|text| {
                shape_text_orientations(
                    text,
                    self.layout,
                    zoom,
                    properties,
                    &self.resources.glyph_map,
                    &self.resources.glyph_positions,
                )
            })
            .unwrap_or_default();

        let shaped_icon = feature.icon.as_deref().and_then(|icon| {
            shape_feature_icon(
                &mut self.bucket,
                icon,
                self.layout,
                properties,
                &self.resources.image_map,
                &self.resources.image_positions,
            )
        });

        if shaped_text_orientations.has_text() || shaped_icon.is_some() {
            self.add_feature(feature, &shaped_text_orientations, shaped_icon.as_ref());
        }
    }

    /// Adds a symbol instance for every anchor the feature's geometry offers.
    fn add_feature(
        &mut self,
        feature: &SymbolFeature,
        shaped_text_orientations: &ShapedTextOrientations,
        shaped_icon: Option<&PositionedIcon>,
    ) {
        let layout = self.layout;
        let zoom = self.bucket.zoom;
        let properties = &feature.properties;
        let tile_pixel_ratio = self.bucket.tile_pixel_ratio;

        let layout_text_size = self.sizes.layout_text_size(properties);
        let layout_icon_size = self.sizes.layout_icon_size(properties);
        // A text size which is the same at all zoom levels keeps labels from jumping around when
        // zooming.
        let text_max_size = self.sizes.text_max_size(properties);

        let scales = FeatureScales {
            text_box_scale: tile_pixel_ratio * layout_text_size / ONE_EM,
            text_padding: layout
                .text_padding
                .evaluate(zoom, properties)
                .unwrap_or(2.0)
                * tile_pixel_ratio,
            icon_box_scale: tile_pixel_ratio * layout_icon_size,
            icon_padding: layout
                .icon_padding
                .evaluate(zoom, properties)
                .unwrap_or(2.0)
                * tile_pixel_ratio,
            text_offset: layout
                .text_offset
                .evaluate(zoom, properties)
                .unwrap_or_default(),
            icon_offset: layout
                .icon_offset
                .evaluate(zoom, properties)
                .unwrap_or_default(),
        };

        let text_max_box_scale = tile_pixel_ratio * text_max_size / ONE_EM;
        let symbol_min_distance = tile_pixel_ratio
            * layout
                .symbol_spacing
                .evaluate(zoom, properties)
                .unwrap_or(250.0);
        let text_max_angle = deg2radf(
            layout
                .text_max_angle
                .evaluate(zoom, properties)
                .unwrap_or(45.0),
        );
        let text_repeat_distance = symbol_min_distance / 2.0;

        let default_horizontal_shaping = shaped_text_orientations.default_horizontal();
        let label = LabelExtent {
            text_width: shaped_text_orientations
                .vertical
                .as_ref()
                .or(default_horizontal_shaping)
                .map(Shaping::width),
            icon_width: shaped_icon.map(PositionedIcon::width),
        };

        let add_symbol_at_anchor = |this: &mut Self, line: &GeometryCoordinates, anchor: Anchor| {
            this.add_symbol_at_anchor(
                feature,
                line,
                anchor,
                shaped_text_orientations,
                shaped_icon,
                &scales,
            )
        };

        match layout.symbol_placement {
            SymbolPlacementType::Line => {
                for line in clip_lines(&feature.geometry, 0.0, 0.0, EXTENT, EXTENT) {
                    let anchors = get_anchors(
                        &line,
                        symbol_min_distance,
                        text_max_angle,
                        label,
                        ONE_EM,
                        text_max_box_scale,
                        self.bucket.overscaling,
                        EXTENT,
                    );
                    for anchor in anchors {
                        let too_close = default_horizontal_shaping.map_or(false, |shaping| {
                            self.compare_text.anchor_is_too_close(
                                &shaping.text,
                                text_repeat_distance,
                                &anchor,
                            )
                        });
                        if !too_close {
                            add_symbol_at_anchor(self, &line, anchor);
                        }
                    }
                }
            }
            SymbolPlacementType::LineCenter => {
                // No clipping, lines with a single point are ignored
                for line in &feature.geometry {
                    if line.len() > 1 {
                        if let Some(anchor) = get_center_anchor(
                            line,
                            text_max_angle,
                            label,
                            ONE_EM,
                            text_max_box_scale,
                        ) {
                            add_symbol_at_anchor(self, line, anchor);
                        }
                    }
                }
            }
            SymbolPlacementType::Point => match feature.typ {
                FeatureType::Polygon => {
                    for polygon in classify_rings(&feature.geometry, 0) {
                        let Some(outer_ring) = polygon.first() else {
                            continue;
                        };
                        if let Some(poi) =
                            find_pole_of_inaccessibility(&polygon, POLE_OF_INACCESSIBILITY_PRECISION)
                        {
                            add_symbol_at_anchor(
                                self,
                                outer_ring,
                                Anchor::new(poi.x, poi.y, 0.0, None),
                            );
                        }
                    }
                }
                FeatureType::LineString => {
                    for line in &feature.geometry {
                        if let Some(first) = line.first() {
                            let anchor = Anchor::new(first.x as f64, first.y as f64, 0.0, None);
                            add_symbol_at_anchor(self, line, anchor);
                        }
                    }
                }
                FeatureType::Point => {
                    for points in &feature.geometry {
                        for point in points.iter() {
                            let anchor = Anchor::new(point.x as f64, point.y as f64, 0.0, None);
                            add_symbol_at_anchor(self, &GeometryCoordinates(vec![*point]), anchor);
                        }
                    }
                }
                FeatureType::Unknown => {}
            },
        }
    }

    fn add_symbol_at_anchor(
        &mut self,
        feature: &SymbolFeature,
        line: &GeometryCoordinates,
        anchor: Anchor,
        shaped_text_orientations: &ShapedTextOrientations,
        shaped_icon: Option<&PositionedIcon>,
        scales: &FeatureScales,
    ) {
        // Features are included in the buffers of neighbouring tiles. Symbols outside of the tile
        // are left to the tile they belong to.
        if !is_within_extent(anchor.point.x, anchor.point.y) {
            return;
        }

        let quads = self.symbol_quads(
            feature,
            shaped_text_orientations,
            shaped_icon,
            scales.text_offset,
        );

        // Every quad takes one glyph offset entry
        if self.bucket.glyph_offset_array.len() + quads.len() > MAX_GLYPHS {
            self.bucket.warnings.warn(TOO_MANY_GLYPHS_WARNING);
            return;
        }

        self.add_symbol(
            feature,
            line,
            anchor,
            shaped_text_orientations,
            shaped_icon,
            scales,
            quads,
        );
    }

    /// Builds the glyph quads of every text variant and the icon quads of one symbol.
    fn symbol_quads(
        &self,
        feature: &SymbolFeature,
        shaped_text_orientations: &ShapedTextOrientations,
        shaped_icon: Option<&PositionedIcon>,
        text_offset: [f64; 2],
    ) -> LabelQuads {
        let zoom = self.bucket.zoom;
        let properties = &feature.properties;
        let text_offset = text_offset.map(|offset| offset * ONE_EM);
        let text_rotate = self
            .layout
            .text_rotate
            .evaluate(zoom, properties)
            .unwrap_or_default();
        let glyph_quads = |shaping: &Shaping| {
            get_glyph_quads(shaping, text_offset, self.text_along_line, text_rotate, false)
        };

        LabelQuads {
            horizontal: shaped_text_orientations
                .horizontal
                .iter()
                .map(|(_, shaping)| glyph_quads(shaping))
                .collect(),
            vertical: shaped_text_orientations.vertical.as_ref().map(glyph_quads),
            icon: shaped_icon.map(|shaped_icon| {
                let icon_rotate = self
                    .layout
                    .icon_rotate
                    .evaluate(zoom, properties)
                    .unwrap_or_default();
                (get_icon_quads(shaped_icon, icon_rotate), icon_rotate)
            }),
            text_rotate,
        }
    }

    /// Adds the text variants and the icon of a single label placement.
    #[allow(clippy::too_many_arguments)]
    fn add_symbol(
        &mut self,
        feature: &SymbolFeature,
        line: &GeometryCoordinates,
        anchor: Anchor,
        shaped_text_orientations: &ShapedTextOrientations,
        shaped_icon: Option<&PositionedIcon>,
        scales: &FeatureScales,
        quads: LabelQuads,
    ) {
        let properties = &feature.properties;
        let line_array = self.bucket.add_to_line_vertex_array(&anchor, line);
        let indexed_feature = IndexedSubfeature {
            index: feature.index,
            source_layer_index: feature.source_layer_index,
            bucket_index: self.bucket.index,
        };

        let mut text_collision_feature: Option<CollisionFeature> = None;
        let mut key = None;
        let mut line_count = 0;
        let mut max_line_length = 0.0;
        let mut placed_text_indices = Justified::<Option<usize>>::default();
        let mut num_glyph_vertices = Justified::<usize>::default();

        let LabelQuads {
            horizontal: horizontal_quads,
            vertical: vertical_quads,
            icon: icon_quads,
            text_rotate,
        } = quads;

        let horizontal_writing_mode = if shaped_text_orientations.vertical.is_some() {
            WritingModeType::Horizontal
        } else {
            WritingModeType::HorizontalOnly
        };

        for ((justification, shaping), glyph_quads) in
            shaped_text_orientations.horizontal.iter().zip(&horizontal_quads)
        {
            if text_collision_feature.is_none() {
                key = Some(text_key(&shaping.text));
                line_count = shaping.line_count;
                max_line_length = shaping.max_line_length;
                // All justifications have similar dimensions, so the first one approximates the
                // collision footprint of all of them.
                text_collision_feature = Some(CollisionFeature::new_from_text(
                    &mut self.bucket.collision_box_array,
                    line,
                    &anchor,
                    shaping,
                    scales.text_box_scale,
                    scales.text_padding,
                    self.text_along_line,
                    indexed_feature,
                    self.bucket.overscaling,
                    text_rotate,
                ));
            }

            let placed_index = self.add_text_vertices(
                feature,
                &anchor,
                glyph_quads,
                horizontal_writing_mode,
                line_array,
                scales.text_offset,
            );
            *placed_text_indices.get_mut(*justification) = Some(placed_index);
            *num_glyph_vertices.get_mut(*justification) = glyph_quads.len() * 4;
        }

        let mut placed_vertical_text_index = None;
        let mut num_vertical_glyph_vertices = 0;
        if let Some(glyph_quads) = &vertical_quads {
            placed_vertical_text_index = Some(self.add_text_vertices(
                feature,
                &anchor,
                glyph_quads,
                WritingModeType::Vertical,
                line_array,
                scales.text_offset,
            ));
            num_vertical_glyph_vertices = glyph_quads.len() * 4;
        }

        let text_box_range = text_collision_feature
            .map(|collision_feature| collision_feature.range())
            .unwrap_or_else(|| self.empty_box_range());

        let mut num_icon_vertices = 0;
        let mut icon_box_range = None;
        if let (Some(shaped_icon), Some((icon_quads, icon_rotate))) = (shaped_icon, &icon_quads) {
            let icon_collision_feature = CollisionFeature::new_from_icon(
                &mut self.bucket.collision_box_array,
                line,
                &anchor,
                shaped_icon,
                scales.icon_box_scale,
                scales.icon_padding,
                indexed_feature,
                *icon_rotate,
            );
            icon_box_range = Some(icon_collision_feature.range());
            num_icon_vertices = icon_quads.len() * 4;

            let icon_size = self
                .sizes
                .packed_icon_size(&self.bucket.icon_size_data, properties)
                .map(|packed| self.checked_packed_size("icon-size", packed));

            self.bucket.add_symbols(
                SymbolBufferKind::Icon,
                icon_quads,
                icon_size,
                scales.icon_offset,
                WritingModeType::None,
                &anchor,
                line_array,
            );
        }
        let icon_box_range = icon_box_range.unwrap_or_else(|| self.empty_box_range());

        self.bucket.symbol_instances.push(SymbolInstance {
            anchor,
            placed_text_indices,
            placed_vertical_text_index,
            key: key.unwrap_or_else(|| text_key("")),
            text_box_start_index: text_box_range.start,
            text_box_end_index: text_box_range.end,
            icon_box_start_index: icon_box_range.start,
            icon_box_end_index: icon_box_range.end,
            feature_index: feature.index,
            num_glyph_vertices,
            num_vertical_glyph_vertices,
            num_icon_vertices,
            cross_tile_id: 0,
            line_count,
            max_line_length,
            text_box_scale: scales.text_box_scale,
        });
    }

    /// Adds the glyph quads of one text variant. Returns the index of its placed symbol.
    fn add_text_vertices(
        &mut self,
        feature: &SymbolFeature,
        anchor: &Anchor,
        glyph_quads: &[SymbolQuad],
        writing_mode: WritingModeType,
        line_array: LineArray,
        text_offset: [f64; 2],
    ) -> usize {
        let text_size = self
            .sizes
            .packed_text_size(&self.bucket.text_size_data, &feature.properties)
            .map(|packed| self.checked_packed_size("text-size", packed));

        self.bucket.add_symbols(
            SymbolBufferKind::Text,
            glyph_quads,
            text_size,
            text_offset,
            writing_mode,
            anchor,
            line_array,
        )
    }

    /// Warns once per property if a packed size does not fit the vertex attribute and clamps it.
    fn checked_packed_size(&mut self, property: &str, packed: [f64; 2]) -> [f64; 2] {
        if exceeds_packing_range(&packed) {
            self.bucket.warnings.warn(format!(
                "{}: Value for \"{property}\" is >= 256. Reduce your \"{property}\".",
                self.bucket.layer_id
            ));
        }
        clamp_packed_size(packed)
    }

    fn empty_box_range(&self) -> std::ops::Range<usize> {
        let end = self.bucket.collision_box_array.len();
        end..end
    }
}
