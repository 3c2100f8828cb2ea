//! The buffers of one symbol layer on one tile.

use crate::{
    euclid::Point2D,
    geometry::{anchor::Anchor, GeometryCoordinate, GeometryCoordinates},
    layout::{
        sizes::{SizeData, DEFAULT_ICON_SIZE, DEFAULT_TEXT_SIZE},
        symbol_instance::SymbolInstance,
        symbol_layout::SymbolLayoutParameters,
    },
    style::symbol_layer::SymbolLayer,
    text::{collision_feature::CollisionBoxArray, glyph::WritingModeType, quads::SymbolQuad},
    util::{math::convert_point_f64, warn_once::WarnOnce},
    TileSpace,
};

const VERTICES_PER_QUAD: usize = 4;

#[derive(Clone, Debug, PartialEq)]
pub struct SymbolVertex {
    pub label_anchor: Point2D<f64, TileSpace>,
    /// Corner of the quad relative to the anchor
    pub o: Point2D<f64, TileSpace>,
    pub glyph_offset_y: f64,
    pub tx: u16,
    pub ty: u16,
    /// Packed sizes at both ends of the zoom range, zero if the size is not data driven
    pub size_data: [f64; 2],
}

/// Vertex data which is updated for every frame by the placement.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DynamicVertex {
    pub anchor_point: Point2D<f64, TileSpace>,
    pub label_angle: f64,
}

#[derive(Default, Clone, Debug)]
pub struct TriangleIndexVector {
    pub indices: Vec<u16>,
}

impl TriangleIndexVector {
    pub fn push(&mut self, a: u16, b: u16, c: u16) {
        self.indices.push(a);
        self.indices.push(b);
        self.indices.push(c);
    }

    /// Number of indices, three per triangle
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// A range of vertices which is addressable with 16 bit indices.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Segment {
    pub vertex_offset: usize,
    pub index_offset: usize,
    pub vertex_length: usize,
    pub index_length: usize,
}

/// The quads of one text variant or icon at one anchor.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedSymbol {
    pub anchor_point: Point2D<f64, TileSpace>,
    pub segment: Option<usize>,
    pub lower_size: f64,
    pub upper_size: f64,
    pub line_offset: [f64; 2],
    pub writing_modes: WritingModeType,
    /// Range of the line the symbol follows in the line vertex array
    pub line_start_index: usize,
    pub line_length: usize,
    /// Range of the glyph offsets in the glyph offset array
    pub glyph_start_index: usize,
    pub num_glyphs: usize,
    pub vertex_start_index: usize,
    pub hidden: bool,
}

#[derive(Default, Clone, Debug)]
pub struct SymbolBucketBuffer {
    pub vertices: Vec<SymbolVertex>,
    pub dynamic_vertices: Vec<DynamicVertex>,
    pub triangles: TriangleIndexVector,
    pub segments: Vec<Segment>,
    pub placed_symbols: Vec<PlacedSymbol>,
}

impl SymbolBucketBuffer {
    /// Adds the four vertices and two triangles of a quad.
    fn add_quad(&mut self, symbol: &SymbolQuad, label_anchor: &Anchor, size_data: [f64; 2]) {
        let needs_segment = self.segments.last().map_or(true, |segment| {
            segment.vertex_length + VERTICES_PER_QUAD > u16::MAX as usize
        });
        if needs_segment {
            self.segments.push(Segment {
                vertex_offset: self.vertices.len(),
                index_offset: self.triangles.len(),
                vertex_length: 0,
                index_length: 0,
            });
        }

        let index = self
            .segments
            .last()
            .map_or(0, |segment| segment.vertex_length) as u16;

        let tex = symbol.tex;
        let corners = [
            (symbol.tl, tex.origin.x, tex.origin.y),
            (symbol.tr, tex.origin.x + tex.width(), tex.origin.y),
            (symbol.bl, tex.origin.x, tex.origin.y + tex.height()),
            (symbol.br, tex.origin.x + tex.width(), tex.origin.y + tex.height()),
        ];
        for (o, tx, ty) in corners {
            self.vertices.push(SymbolVertex {
                label_anchor: label_anchor.point,
                o,
                glyph_offset_y: symbol.glyph_offset.y,
                tx,
                ty,
                size_data,
            });
        }

        // Dynamic vertices are initialized so that the vertex count always agrees with the layout
        // vertex buffer, the placement overwrites them before rendering.
        let dynamic_vertex = DynamicVertex {
            anchor_point: label_anchor.point,
            label_angle: 0.0,
        };
        self.dynamic_vertices
            .extend(std::iter::repeat(dynamic_vertex).take(VERTICES_PER_QUAD));

        // add the two triangles, referencing the four coordinates we just inserted.
        self.triangles.push(index, index + 1, index + 2);
        self.triangles.push(index + 1, index + 2, index + 3);

        if let Some(segment) = self.segments.last_mut() {
            segment.vertex_length += VERTICES_PER_QUAD;
            segment.index_length += 6;
        }
    }
}

/// A line vertex with its distance along the line from the anchor of a symbol.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineVertex {
    pub point: GeometryCoordinate,
    pub tile_unit_distance_from_anchor: f64,
}

/// Range of a symbol's line in the line vertex array.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineArray {
    pub line_start_index: usize,
    pub line_length: usize,
}

#[derive(Clone, Copy, Debug)]
pub enum SymbolBufferKind {
    Text,
    Icon,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionDebugVertex {
    pub anchor: Point2D<f64, TileSpace>,
    pub extrude: Point2D<f64, TileSpace>,
}

/// Outlines of all collision boxes, drawn when collision boxes are shown.
#[derive(Default, Clone, Debug)]
pub struct CollisionDebugBuffer {
    pub vertices: Vec<CollisionDebugVertex>,
    pub lines: Vec<[usize; 2]>,
}

/// The output of the layout of one symbol layer on one tile.
#[derive(Clone, Debug)]
pub struct SymbolBucket {
    pub layer_id: String,
    pub index: usize,
    pub zoom: f64,
    pub overscaling: f64,
    pub pixel_ratio: f64,
    pub tile_pixel_ratio: f64,

    pub text_size_data: SizeData,
    pub icon_size_data: SizeData,

    pub text: SymbolBucketBuffer,
    pub icon: SymbolBucketBuffer,

    pub collision_box_array: CollisionBoxArray,
    pub line_vertex_array: Vec<LineVertex>,
    pub glyph_offset_array: Vec<f64>,
    pub symbol_instances: Vec<SymbolInstance>,

    pub collision_debug: Option<CollisionDebugBuffer>,

    /// Whether the icons are signed distance fields, decided by the first icon
    pub sdf_icons: Option<bool>,
    pub icons_need_linear: bool,

    pub warnings: WarnOnce,
}

impl SymbolBucket {
    pub fn new(layer: &SymbolLayer, parameters: &SymbolLayoutParameters) -> Self {
        let layout = &layer.layout;
        Self {
            layer_id: layer.id.clone(),
            index: parameters.bucket_index,
            zoom: parameters.zoom,
            overscaling: parameters.overscaling,
            pixel_ratio: parameters.pixel_ratio,
            tile_pixel_ratio: crate::coords::tile_pixel_ratio(parameters.overscaling),
            text_size_data: SizeData::new(parameters.zoom, &layout.text_size, DEFAULT_TEXT_SIZE),
            icon_size_data: SizeData::new(parameters.zoom, &layout.icon_size, DEFAULT_ICON_SIZE),
            text: SymbolBucketBuffer::default(),
            icon: SymbolBucketBuffer::default(),
            collision_box_array: CollisionBoxArray::new(),
            line_vertex_array: Vec::new(),
            glyph_offset_array: Vec::new(),
            symbol_instances: Vec::new(),
            collision_debug: None,
            sdf_icons: None,
            icons_need_linear: false,
            warnings: WarnOnce::default(),
        }
    }

    pub fn has_text_data(&self) -> bool {
        !self.text.segments.is_empty()
    }

    pub fn has_icon_data(&self) -> bool {
        !self.icon.segments.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.symbol_instances.is_empty()
    }

    /// Appends the line a symbol follows with the distance of every vertex from the anchor.
    /// Symbols which are not placed on a line segment add nothing.
    pub fn add_to_line_vertex_array(
        &mut self,
        anchor: &Anchor,
        line: &GeometryCoordinates,
    ) -> LineArray {
        let line_start_index = self.line_vertex_array.len();

        if let Some(segment) = anchor.segment {
            let tile_distances = calculate_tile_distances(line, anchor, segment);
            self.line_vertex_array.extend(
                line.iter()
                    .zip(tile_distances)
                    .map(|(point, distance)| LineVertex {
                        point: *point,
                        tile_unit_distance_from_anchor: distance,
                    }),
            );
        }

        LineArray {
            line_start_index,
            line_length: self.line_vertex_array.len() - line_start_index,
        }
    }

    /// Adds the quads of one text variant or icon and returns the index of its placed symbol.
    #[allow(clippy::too_many_arguments)]
    pub fn add_symbols(
        &mut self,
        kind: SymbolBufferKind,
        quads: &[SymbolQuad],
        size_data: Option<[f64; 2]>,
        line_offset: [f64; 2],
        writing_mode: WritingModeType,
        label_anchor: &Anchor,
        line_array: LineArray,
    ) -> usize {
        let buffer = match kind {
            SymbolBufferKind::Text => &mut self.text,
            SymbolBufferKind::Icon => &mut self.icon,
        };
        let size_data = size_data.unwrap_or_default();

        let glyph_start_index = self.glyph_offset_array.len();
        let vertex_start_index = buffer.vertices.len();

        for symbol in quads {
            buffer.add_quad(symbol, label_anchor, size_data);
            self.glyph_offset_array.push(symbol.glyph_offset.x);
        }

        buffer.placed_symbols.push(PlacedSymbol {
            anchor_point: label_anchor.point,
            segment: label_anchor.segment,
            lower_size: size_data[0],
            upper_size: size_data[1],
            line_offset,
            writing_modes: writing_mode,
            line_start_index: line_array.line_start_index,
            line_length: line_array.line_length,
            glyph_start_index,
            num_glyphs: self.glyph_offset_array.len() - glyph_start_index,
            vertex_start_index,
            hidden: false,
        });

        buffer.placed_symbols.len() - 1
    }

    /// Outlines every collision box of every symbol instance with four lines.
    pub fn generate_collision_debug_buffers(&mut self) {
        let mut debug = CollisionDebugBuffer::default();

        for instance in &self.symbol_instances {
            let boxes = instance
                .text_box_range()
                .chain(instance.icon_box_range())
                .filter_map(|index| self.collision_box_array.get(index));

            for collision_box in boxes {
                let index = debug.vertices.len();
                let corners = [
                    (collision_box.x1, collision_box.y1),
                    (collision_box.x2, collision_box.y1),
                    (collision_box.x2, collision_box.y2),
                    (collision_box.x1, collision_box.y2),
                ];
                debug
                    .vertices
                    .extend(corners.into_iter().map(|(x, y)| CollisionDebugVertex {
                        anchor: collision_box.anchor,
                        extrude: Point2D::new(x.round(), y.round()),
                    }));
                debug.lines.extend([
                    [index, index + 1],
                    [index + 1, index + 2],
                    [index + 2, index + 3],
                    [index + 3, index],
                ]);
            }
        }

        self.collision_debug = Some(debug);
    }
}

/// Distance along `line` from the anchor to every vertex, measured forward for the vertices after
/// the anchor's segment and backward for the others.
fn calculate_tile_distances(line: &GeometryCoordinates, anchor: &Anchor, segment: usize) -> Vec<f64> {
    let mut tile_distances: Vec<f64> = vec![0.0; line.len()];
    if segment >= line.len() {
        return tile_distances;
    }

    let mut sum_forward_length = if segment + 1 < line.len() {
        anchor.point.distance_to(convert_point_f64(&line[segment + 1]))
    } else {
        0.0
    };
    let mut sum_backward_length = anchor.point.distance_to(convert_point_f64(&line[segment]));

    for i in segment + 1..line.len() {
        tile_distances[i] = sum_forward_length;
        if i < line.len() - 1 {
            sum_forward_length +=
                convert_point_f64(&line[i + 1]).distance_to(convert_point_f64(&line[i]));
        }
    }

    for i in (0..=segment).rev() {
        tile_distances[i] = sum_backward_length;
        if i > 0 {
            sum_backward_length +=
                convert_point_f64(&line[i - 1]).distance_to(convert_point_f64(&line[i]));
        }
    }

    tile_distances
}

#[cfg(test)]
mod tests {
    use crate::{
        buckets::symbol_bucket::{LineArray, SymbolBucket, SymbolBufferKind},
        euclid::{Point2D, Rect, Size2D},
        geometry::{anchor::Anchor, GeometryCoordinates},
        layout::{
            symbol_instance::{Justified, SymbolInstance},
            symbol_layout::SymbolLayoutParameters,
        },
        style::symbol_layer::SymbolLayer,
        text::{
            collision_feature::{CollisionBox, IndexedSubfeature},
            glyph::WritingModeType,
            quads::SymbolQuad,
        },
    };

    fn bucket() -> SymbolBucket {
        let layer = SymbolLayer::from_json(r#"{"id": "labels", "type": "symbol"}"#).unwrap();
        SymbolBucket::new(&layer, &SymbolLayoutParameters::default())
    }

    fn quad(glyph_offset_x: f64) -> SymbolQuad {
        SymbolQuad {
            tl: Point2D::new(-1.0, -1.0),
            tr: Point2D::new(1.0, -1.0),
            bl: Point2D::new(-1.0, 1.0),
            br: Point2D::new(1.0, 1.0),
            tex: Rect::new(Point2D::new(10, 20), Size2D::new(8, 6)),
            glyph_offset: Point2D::new(glyph_offset_x, 0.0),
            writing_mode: WritingModeType::Horizontal,
            is_sdf: true,
        }
    }

    #[test]
    fn line_vertices_with_distances() {
        let mut bucket = bucket();
        let line = GeometryCoordinates::from_xy(&[(0, 0), (10, 0), (10, 10), (10, 30)]);

        let point_anchor = Anchor::new(5.0, 0.0, 0.0, None);
        assert_eq!(
            bucket.add_to_line_vertex_array(&point_anchor, &line),
            LineArray {
                line_start_index: 0,
                line_length: 0
            }
        );

        let anchor = Anchor::new(10.0, 5.0, 0.0, Some(1));
        let line_array = bucket.add_to_line_vertex_array(&anchor, &line);
        assert_eq!(line_array.line_length, 4);
        let distances: Vec<f64> = bucket
            .line_vertex_array
            .iter()
            .map(|vertex| vertex.tile_unit_distance_from_anchor)
            .collect();
        assert_eq!(distances, vec![15.0, 5.0, 5.0, 25.0]);
    }

    #[test]
    fn adds_quads() {
        let mut bucket = bucket();
        let anchor = Anchor::new(100.0, 100.0, 0.0, None);

        let first = bucket.add_symbols(
            SymbolBufferKind::Text,
            &[quad(1.0), quad(2.0)],
            None,
            [0.0, 0.0],
            WritingModeType::Horizontal,
            &anchor,
            LineArray::default(),
        );
        let second = bucket.add_symbols(
            SymbolBufferKind::Text,
            &[quad(3.0)],
            Some([100.0, 200.0]),
            [0.0, 0.0],
            WritingModeType::Vertical,
            &anchor,
            LineArray::default(),
        );

        assert_eq!((first, second), (0, 1));
        assert_eq!(bucket.text.vertices.len(), 12);
        assert_eq!(bucket.text.dynamic_vertices.len(), 12);
        assert_eq!(bucket.text.triangles.len(), 18);
        assert_eq!(bucket.text.triangles.indices[6..12], [4, 5, 6, 5, 6, 7]);
        assert_eq!(bucket.glyph_offset_array, vec![1.0, 2.0, 3.0]);
        assert!(bucket.has_text_data());
        assert!(!bucket.has_icon_data());

        let placed = &bucket.text.placed_symbols[1];
        assert_eq!(placed.glyph_start_index, 2);
        assert_eq!(placed.num_glyphs, 1);
        assert_eq!(placed.vertex_start_index, 8);
        assert_eq!((placed.lower_size, placed.upper_size), (100.0, 200.0));
        assert_eq!(placed.writing_modes, WritingModeType::Vertical);

        let vertex = &bucket.text.vertices[3];
        assert_eq!((vertex.tx, vertex.ty), (18, 26));
    }

    #[test]
    fn segments_fit_16_bit_indices() {
        let mut bucket = bucket();
        let anchor = Anchor::new(0.0, 0.0, 0.0, None);
        let quads = vec![quad(0.0); 16384];
        bucket.add_symbols(
            SymbolBufferKind::Icon,
            &quads,
            None,
            [0.0, 0.0],
            WritingModeType::None,
            &anchor,
            LineArray::default(),
        );

        let segments = &bucket.icon.segments;
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].vertex_length, 65532);
        assert_eq!(segments[1].vertex_offset, 65532);
        assert_eq!(segments[1].vertex_length, 4);
        assert_eq!(bucket.icon.triangles.indices[bucket.icon.triangles.len() - 3..], [1, 2, 3]);
    }

    #[test]
    fn collision_debug_outlines() {
        let mut bucket = bucket();
        for _ in 0..3 {
            bucket.collision_box_array.push(CollisionBox {
                anchor: Point2D::new(5.0, 5.0),
                x1: -1.4,
                y1: -2.0,
                x2: 3.0,
                y2: 4.6,
                feature: IndexedSubfeature::default(),
                along_line: false,
                radius: 0.0,
                signed_distance_from_anchor: 0.0,
            });
        }
        bucket.symbol_instances.push(SymbolInstance {
            anchor: Anchor::new(5.0, 5.0, 0.0, None),
            placed_text_indices: Justified::default(),
            placed_vertical_text_index: None,
            key: 0,
            text_box_start_index: 0,
            text_box_end_index: 2,
            icon_box_start_index: 2,
            icon_box_end_index: 3,
            feature_index: 0,
            num_glyph_vertices: Justified::default(),
            num_vertical_glyph_vertices: 0,
            num_icon_vertices: 0,
            cross_tile_id: 0,
            line_count: 0,
            max_line_length: 0.0,
            text_box_scale: 1.0,
        });

        bucket.generate_collision_debug_buffers();
        let debug = bucket.collision_debug.unwrap();
        assert_eq!(debug.vertices.len(), 12);
        assert_eq!(debug.lines.len(), 12);
        assert_eq!(debug.lines[7], [7, 4]);
        assert_eq!(debug.vertices[0].extrude, Point2D::new(-1.0, -2.0));
        assert_eq!(debug.vertices[2].extrude, Point2D::new(3.0, 5.0));
    }
}
