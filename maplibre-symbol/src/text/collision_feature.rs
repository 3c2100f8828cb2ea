//! Padded collision boxes around shaped text and icons.

use std::ops::Range;

use crate::{
    euclid::{Point2D, Vector2D},
    geometry::{anchor::Anchor, GeometryCoordinates},
    text::{glyph::Shaping, shaping::PositionedIcon},
    util::math::{convert_point_f64, deg2radf, rotate, MinMax},
    TileSpace,
};

/// Identifies the feature a collision box belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexedSubfeature {
    pub index: usize,
    pub source_layer_index: usize,
    pub bucket_index: usize,
}

#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct CollisionBox {
    // the box is centered around the anchor point
    pub anchor: Point2D<f64, TileSpace>,

    // distances to the edges from the anchor
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,

    pub feature: IndexedSubfeature,
    /// Boxes of line-aligned labels follow the line
    pub along_line: bool,
    /// Radius of the collision circle of line-aligned boxes, 0 otherwise
    pub radius: f64,
    pub signed_distance_from_anchor: f64,
}

/// Append-only store of all collision boxes of a bucket.
pub type CollisionBoxArray = Vec<CollisionBox>;

/// The boxes of one text or icon, as a range into the bucket's [`CollisionBoxArray`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionFeature {
    pub box_start_index: usize,
    pub box_end_index: usize,
    pub along_line: bool,
}

impl CollisionFeature {
    #[allow(clippy::too_many_arguments)]
    fn new(
        collision_box_array: &mut CollisionBoxArray,
        line: &GeometryCoordinates,
        anchor: &Anchor,
        [top, bottom, left, right]: [f64; 4],
        box_scale: f64,
        padding: f64,
        align_line: bool,
        indexed_feature: IndexedSubfeature,
        overscaling: f64,
        rotate_: f64,
    ) -> Self {
        let box_start_index = collision_box_array.len();
        let mut builder = BoxBuilder {
            boxes: collision_box_array,
            feature: indexed_feature,
        };

        if !(top == 0. && bottom == 0. && left == 0. && right == 0.) {
            let y1 = top * box_scale - padding;
            let y2 = bottom * box_scale + padding;
            let x1 = left * box_scale - padding;
            let x2 = right * box_scale + padding;

            if align_line {
                let height = y2 - y1;
                let length = x2 - x1;

                if height > 0.0 {
                    let height = (10.0 * box_scale).max(height);
                    if let Some(segment) = anchor.segment {
                        builder.bboxify_label(
                            line,
                            &anchor.point,
                            segment,
                            length,
                            height,
                            overscaling,
                        );
                    }
                }
            } else if rotate_ != 0. {
                // Account for *-rotate in point collision boxes
                let rotate_radians = deg2radf(rotate_);

                let tl = rotate(&Vector2D::<_, TileSpace>::new(x1, y1), rotate_radians);
                let tr = rotate(&Vector2D::<_, TileSpace>::new(x2, y1), rotate_radians);
                let bl = rotate(&Vector2D::<_, TileSpace>::new(x1, y2), rotate_radians);
                let br = rotate(&Vector2D::<_, TileSpace>::new(x2, y2), rotate_radians);

                // Collision features require an "on-axis" geometry,
                // so take the envelope of the rotated geometry
                // (may be quite large for wide labels rotated 45 degrees)
                let xs = [tl.x, tr.x, bl.x, br.x];
                let ys = [tl.y, tr.y, bl.y, br.y];
                builder.push_box(
                    anchor.point,
                    [xs.min_value(), ys.min_value(), xs.max_value(), ys.max_value()],
                );
            } else {
                builder.push_box(anchor.point, [x1, y1, x2, y2]);
            }
        }

        Self {
            box_start_index,
            box_end_index: collision_box_array.len(),
            along_line: align_line,
        }
    }

    /// Boxes for shaped text. `align_line` makes the boxes follow the line the anchor sits on.
    #[allow(clippy::too_many_arguments)]
    pub fn new_from_text(
        collision_box_array: &mut CollisionBoxArray,
        line: &GeometryCoordinates,
        anchor: &Anchor,
        shaped_text: &Shaping,
        box_scale: f64,
        padding: f64,
        align_line: bool,
        indexed_feature: IndexedSubfeature,
        overscaling: f64,
        rotate: f64,
    ) -> Self {
        Self::new(
            collision_box_array,
            line,
            anchor,
            [
                shaped_text.top,
                shaped_text.bottom,
                shaped_text.left,
                shaped_text.right,
            ],
            box_scale,
            padding,
            align_line,
            indexed_feature,
            overscaling,
            rotate,
        )
    }

    // Icon collision features are always viewport aligned, even if the icon is rendered along the
    // line. Most icons are close enough to square for this not to matter.
    #[allow(clippy::too_many_arguments)]
    pub fn new_from_icon(
        collision_box_array: &mut CollisionBoxArray,
        line: &GeometryCoordinates,
        anchor: &Anchor,
        shaped_icon: &PositionedIcon,
        box_scale: f64,
        padding: f64,
        indexed_feature: IndexedSubfeature,
        rotate: f64,
    ) -> Self {
        Self::new(
            collision_box_array,
            line,
            anchor,
            [
                shaped_icon.top,
                shaped_icon.bottom,
                shaped_icon.left,
                shaped_icon.right,
            ],
            box_scale,
            padding,
            false,
            indexed_feature,
            1.,
            rotate,
        )
    }

    pub fn range(&self) -> Range<usize> {
        self.box_start_index..self.box_end_index
    }
}

struct BoxBuilder<'a> {
    boxes: &'a mut CollisionBoxArray,
    feature: IndexedSubfeature,
}

impl BoxBuilder<'_> {
    fn push_box(&mut self, anchor: Point2D<f64, TileSpace>, [x1, y1, x2, y2]: [f64; 4]) {
        self.boxes.push(CollisionBox {
            anchor,
            x1,
            y1,
            x2,
            y2,
            feature: self.feature,
            along_line: false,
            radius: 0.0,
            signed_distance_from_anchor: 0.0,
        });
    }

    fn bboxify_label(
        &mut self,
        line: &GeometryCoordinates,
        anchor_point: &Point2D<f64, TileSpace>,
        segment: usize,
        label_length: f64,
        box_size: f64,
        overscaling: f64,
    ) {
        if segment + 1 >= line.len() {
            return;
        }

        let step = box_size / 2.;
        let n_boxes = ((label_length / step).floor() as i32).max(1);

        // Boxes are added beyond both ends of the label so that labels which grow in the
        // distance of a pitched map still collide. Overscaled tiles get more of them.
        let overscaling_padding_factor = 1. + 0.4 * overscaling.log2();
        let n_pitch_padding_boxes =
            ((n_boxes as f64 * overscaling_padding_factor / 2.).floor()) as i32;

        // offset the center of the first box by half a box so that the edge of the
        // box is at the edge of the label.
        let first_box_offset = -box_size / 2.;

        let mut p = *anchor_point;
        let mut index = segment + 1;
        let mut anchor_distance = first_box_offset;
        let label_start_distance = -label_length / 2.;
        let padding_start_distance = label_start_distance - label_length / 8.;

        // move backwards along the line to the first segment the label appears on
        loop {
            if index == 0 {
                if anchor_distance > label_start_distance {
                    // there isn't enough room for the label after the beginning of the line
                    return;
                }
                // The line doesn't extend far enough back for all of our padding,
                // but we got far enough to show the label under most conditions.
                break;
            }

            index -= 1;
            let vertex = convert_point_f64(&line[index]);
            anchor_distance -= vertex.distance_to(p);
            p = vertex;

            if anchor_distance <= padding_start_distance {
                break;
            }
        }

        let mut segment_length =
            convert_point_f64(&line[index]).distance_to(convert_point_f64(&line[index + 1]));

        for i in -n_pitch_padding_boxes..n_boxes + n_pitch_padding_boxes {
            // the distance the box will be from the anchor
            let box_offset = i as f64 * step;
            let mut box_distance_to_anchor = label_start_distance + box_offset;

            // make the distance between pitch padding boxes bigger
            if box_offset < 0. {
                box_distance_to_anchor += box_offset;
            }
            if box_offset > label_length {
                box_distance_to_anchor += box_offset - label_length;
            }

            if box_distance_to_anchor < anchor_distance {
                // The line doesn't extend far enough back for this box, skip it
                continue;
            }

            // the box is not on the current segment. Move to the next segment.
            while anchor_distance + segment_length < box_distance_to_anchor {
                anchor_distance += segment_length;
                index += 1;

                // There isn't enough room before the end of the line.
                if index + 1 >= line.len() {
                    return;
                }

                segment_length = convert_point_f64(&line[index])
                    .distance_to(convert_point_f64(&line[index + 1]));
            }

            // the distance the box will be from the beginning of the segment
            let segment_box_distance = box_distance_to_anchor - anchor_distance;

            let p0 = convert_point_f64(&line[index]);
            let p1 = convert_point_f64(&line[index + 1]);
            let box_anchor = p0.lerp(p1, segment_box_distance / segment_length);

            // If the box is within boxSize of the anchor, force the box to be used
            // (so even 0-width labels use at least one box)
            // Otherwise, the .8 multiplication gives us a little bit of conservative
            // padding in choosing which boxes to use
            let padded_anchor_distance = if (box_distance_to_anchor - first_box_offset).abs() < step
            {
                0.0
            } else {
                (box_distance_to_anchor - first_box_offset) * 0.8
            };

            self.boxes.push(CollisionBox {
                anchor: box_anchor,
                x1: -box_size / 2.,
                y1: -box_size / 2.,
                x2: box_size / 2.,
                y2: box_size / 2.,
                feature: self.feature,
                along_line: true,
                radius: box_size / 2.,
                signed_distance_from_anchor: padded_anchor_distance,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::abs_diff_eq;

    use crate::{
        euclid::{Point2D, Rect, Size2D},
        geometry::{anchor::Anchor, GeometryCoordinates},
        style::style_types::SymbolAnchorType,
        text::{
            collision_feature::{CollisionBoxArray, CollisionFeature, IndexedSubfeature},
            glyph::{Shaping, WritingModeType},
            image::ImagePosition,
            shaping::PositionedIcon,
        },
    };

    fn shaping(top: f64, bottom: f64, left: f64, right: f64) -> Shaping {
        let mut shaping = Shaping::new(0.0, 0.0, WritingModeType::Horizontal);
        shaping.top = top;
        shaping.bottom = bottom;
        shaping.left = left;
        shaping.right = right;
        shaping
    }

    fn feature() -> IndexedSubfeature {
        IndexedSubfeature {
            index: 7,
            source_layer_index: 0,
            bucket_index: 3,
        }
    }

    #[test]
    fn point_label_box() {
        let mut boxes = CollisionBoxArray::new();
        let anchor = Anchor::new(100.0, 200.0, 0.0, None);
        let text = shaping(-12.0, 12.0, -21.0, 21.0);

        let collision = CollisionFeature::new_from_text(
            &mut boxes,
            &GeometryCoordinates::default(),
            &anchor,
            &text,
            2.0,
            4.0,
            false,
            feature(),
            1.0,
            0.0,
        );

        assert_eq!(collision.range(), 0..1);
        let collision_box = &boxes[0];
        assert_eq!(collision_box.anchor, anchor.point);
        assert_eq!(
            [collision_box.x1, collision_box.y1, collision_box.x2, collision_box.y2],
            [-46.0, -28.0, 46.0, 28.0]
        );
        assert_eq!(collision_box.feature, feature());
        assert!(!collision_box.along_line);

        // the next feature starts where this one ended
        let second = CollisionFeature::new_from_text(
            &mut boxes,
            &GeometryCoordinates::default(),
            &anchor,
            &text,
            2.0,
            4.0,
            false,
            feature(),
            1.0,
            90.0,
        );
        assert_eq!(second.range(), 1..2);
        let rotated = &boxes[1];
        assert!(abs_diff_eq!(rotated.x1, -28.0, epsilon = 1e-9));
        assert!(abs_diff_eq!(rotated.x2, 28.0, epsilon = 1e-9));
        assert!(abs_diff_eq!(rotated.y1, -46.0, epsilon = 1e-9));
        assert!(abs_diff_eq!(rotated.y2, 46.0, epsilon = 1e-9));
    }

    #[test]
    fn empty_footprint_has_no_boxes() {
        let mut boxes = CollisionBoxArray::new();
        let collision = CollisionFeature::new_from_text(
            &mut boxes,
            &GeometryCoordinates::default(),
            &Anchor::new(0.0, 0.0, 0.0, None),
            &shaping(0.0, 0.0, 0.0, 0.0),
            1.0,
            0.0,
            false,
            feature(),
            1.0,
            0.0,
        );
        assert_eq!(collision.range(), 0..0);
        assert!(boxes.is_empty());
    }

    #[test]
    fn line_label_boxes() {
        let mut boxes = CollisionBoxArray::new();
        let line = GeometryCoordinates::from_xy(&[(0, 0), (1000, 0)]);
        let anchor = Anchor::new(500.0, 0.0, 0.0, Some(0));

        let collision = CollisionFeature::new_from_text(
            &mut boxes,
            &line,
            &anchor,
            &shaping(-12.0, 12.0, -50.0, 50.0),
            1.0,
            0.0,
            true,
            feature(),
            1.0,
            0.0,
        );

        // 8 boxes along the label plus 4 padding boxes on each side
        assert_eq!(collision.range().len(), 16);
        assert!(collision.along_line);
        for collision_box in &boxes {
            assert!(collision_box.along_line);
            assert_eq!(collision_box.anchor.y, 0.0);
            assert_eq!(collision_box.radius, 12.0);
            assert_eq!((collision_box.x1, collision_box.x2), (-12.0, 12.0));
        }
        assert!(boxes
            .windows(2)
            .all(|pair| pair[0].anchor.x < pair[1].anchor.x));
    }

    #[test]
    fn line_too_short_for_label() {
        let mut boxes = CollisionBoxArray::new();
        let line = GeometryCoordinates::from_xy(&[(490, 0), (510, 0)]);
        let collision = CollisionFeature::new_from_text(
            &mut boxes,
            &line,
            &Anchor::new(500.0, 0.0, 0.0, Some(0)),
            &shaping(-12.0, 12.0, -50.0, 50.0),
            1.0,
            0.0,
            true,
            feature(),
            1.0,
            0.0,
        );
        assert_eq!(collision.range(), 0..0);
    }

    #[test]
    fn icon_boxes_are_viewport_aligned() {
        let mut boxes = CollisionBoxArray::new();
        let line = GeometryCoordinates::from_xy(&[(0, 0), (1000, 0)]);
        let icon = PositionedIcon::shape_icon(
            ImagePosition {
                pixel_ratio: 1.0,
                padded_rect: Rect::new(Point2D::origin(), Size2D::new(22, 22)),
                sdf: false,
            },
            &[0.0, 0.0],
            SymbolAnchorType::Center,
        );

        let collision = CollisionFeature::new_from_icon(
            &mut boxes,
            &line,
            &Anchor::new(500.0, 0.0, 0.0, Some(0)),
            &icon,
            8.0,
            16.0,
            feature(),
            0.0,
        );
        assert_eq!(collision.range(), 0..1);
        assert!(!collision.along_line);
        assert_eq!(
            [boxes[0].x1, boxes[0].y1, boxes[0].x2, boxes[0].y2],
            [-96.0, -96.0, 96.0, 96.0]
        );
    }
}
