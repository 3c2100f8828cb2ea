//! Sampling of label anchors along lines.

use std::{collections::VecDeque, f64::consts::PI};

use crate::{
    geometry::{
        anchor::{Anchor, Anchors},
        GeometryCoordinates,
    },
    util::math::{angle_to, convert_point_f64, interpolate},
};

/// Horizontal extent of the shaped label along the line, in unscaled glyph units.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelExtent {
    /// Width of the shaped text, `None` if the label has no text
    pub text_width: Option<f64>,
    /// Width of the shaped icon, `None` if the label has no icon
    pub icon_width: Option<f64>,
}

impl LabelExtent {
    fn angle_window_size(&self, glyph_size: f64, box_scale: f64) -> f64 {
        if self.text_width.is_some() {
            3.0 / 5.0 * glyph_size * box_scale
        } else {
            0.0
        }
    }

    fn label_length(&self) -> f64 {
        self.text_width
            .unwrap_or(0.0)
            .max(self.icon_width.unwrap_or(0.0))
    }
}

/// Places anchors along `line` roughly `spacing` apart. Anchors too close to the line ends for
/// the label to fit or on a part of the line which bends more than `max_angle` within the label
/// are skipped.
#[allow(clippy::too_many_arguments)]
pub fn get_anchors(
    line: &GeometryCoordinates,
    mut spacing: f64,
    max_angle: f64,
    label: LabelExtent,
    glyph_size: f64,
    box_scale: f64,
    overscaling: f64,
    tile_extent: f64,
) -> Anchors {
    if line.is_empty() {
        return Anchors::new();
    }

    let angle_window_size = label.angle_window_size(glyph_size, box_scale);
    let label_length = label.label_length();

    // Is the line continuing from a different tile?
    let first = convert_point_f64(&line[0]);
    let is_line_continued =
        first.x == 0.0 || first.x == tile_extent || first.y == 0.0 || first.y == tile_extent;

    // Spread labels out on short lines so they keep some distance to each other.
    if spacing - label_length * box_scale < spacing / 4.0 {
        spacing = label_length * box_scale + spacing / 4.0;
    }

    // Offset the first anchor by:
    // Either half the label length plus a fixed extra offset if the line is not continued
    // Or half the spacing if the line is continued.

    // For non-continued lines, add a bit of fixed extra offset to avoid collisions at T
    // intersections.
    let fixed_extra_offset = glyph_size * 2.0;

    let offset = if !is_line_continued {
        ((label_length / 2.0 + fixed_extra_offset) * box_scale * overscaling) % spacing
    } else {
        (spacing / 2.0 * overscaling) % spacing
    };

    resample(
        line,
        offset,
        spacing,
        angle_window_size,
        max_angle,
        label_length * box_scale,
        is_line_continued,
        false,
        tile_extent,
    )
}

#[allow(clippy::too_many_arguments)]
fn resample(
    line: &GeometryCoordinates,
    offset: f64,
    spacing: f64,
    angle_window_size: f64,
    max_angle: f64,
    label_length: f64,
    is_line_continued: bool,
    place_at_middle: bool,
    tile_extent: f64,
) -> Anchors {
    let half_label_length = label_length / 2.0;
    let line_length = line.line_length();

    let mut distance = 0.0;
    let mut marked_distance = offset - spacing;

    let mut anchors = Anchors::new();

    for (i, pair) in line.windows(2).enumerate() {
        let a = convert_point_f64(&pair[0]);
        let b = convert_point_f64(&pair[1]);

        let segment_dist = a.distance_to(b);
        let angle = angle_to(&b, &a);

        while marked_distance + spacing < distance + segment_dist {
            marked_distance += spacing;

            let t = (marked_distance - distance) / segment_dist;
            let x = interpolate(a.x, b.x, t);
            let y = interpolate(a.y, b.y, t);

            // Check that the point is within the tile boundaries and that
            // the label would fit before the beginning and end of the line
            // if placed at this point.
            if (0.0..tile_extent).contains(&x)
                && (0.0..tile_extent).contains(&y)
                && marked_distance - half_label_length >= 0.0
                && marked_distance + half_label_length <= line_length
            {
                let anchor = Anchor::new(x, y, angle, Some(i)).round();

                if angle_window_size == 0.0
                    || check_max_angle(line, &anchor, label_length, angle_window_size, max_angle)
                {
                    anchors.push(anchor);
                }
            }
        }

        distance += segment_dist;
    }

    if !place_at_middle && anchors.is_empty() && !is_line_continued {
        // The first attempt at finding anchors at which labels can be placed failed.
        // Try again, but this time just try placing one anchor at the middle of the line.
        // This has the most effect for short lines in overscaled tiles, since the
        // initial offset used in overscaled tiles is calculated to align labels with positions in
        // parent tiles instead of placing the label as close to the beginning as possible.
        anchors = resample(
            line,
            distance / 2.0,
            spacing,
            angle_window_size,
            max_angle,
            label_length,
            is_line_continued,
            true,
            tile_extent,
        );
    }

    anchors
}

/// Places a single anchor at the middle of `line`, or none if the line bends too much there.
pub fn get_center_anchor(
    line: &GeometryCoordinates,
    max_angle: f64,
    label: LabelExtent,
    glyph_size: f64,
    box_scale: f64,
) -> Option<Anchor> {
    let angle_window_size = label.angle_window_size(glyph_size, box_scale);
    let label_length = label.label_length() * box_scale;

    let mut prev_distance = 0.0;
    let center_distance = line.line_length() / 2.0;

    for (i, pair) in line.windows(2).enumerate() {
        let a = convert_point_f64(&pair[0]);
        let b = convert_point_f64(&pair[1]);

        let segment_distance = a.distance_to(b);
        if prev_distance + segment_distance > center_distance {
            // The center is on this segment
            let t = (center_distance - prev_distance) / segment_distance;
            let x = interpolate(a.x, b.x, t);
            let y = interpolate(a.y, b.y, t);

            let anchor = Anchor::new(x, y, angle_to(&b, &a), Some(i)).round();
            if angle_window_size == 0.0
                || check_max_angle(line, &anchor, label_length, angle_window_size, max_angle)
            {
                return Some(anchor);
            }
            return None;
        }

        prev_distance += segment_distance;
    }

    None
}

struct Corner {
    distance: f64,
    angle_delta: f64,
}

/// Checks that the summed turning angle within any `window_size` long part of the label placed
/// at `anchor` stays below `max_angle`.
pub fn check_max_angle(
    line: &GeometryCoordinates,
    anchor: &Anchor,
    label_length: f64,
    window_size: f64,
    max_angle: f64,
) -> bool {
    // Horizontal labels always pass
    let Some(segment) = anchor.segment else {
        return true;
    };

    let mut p = anchor.point;
    let mut index = segment as isize + 1;
    let mut anchor_distance = 0.0;

    // Move backwards along the line to the first segment the label appears on
    while anchor_distance > -label_length / 2.0 {
        index -= 1;

        // There isn't enough room for the label after the beginning of the line
        if index < 0 {
            return false;
        }

        let point = convert_point_f64(&line[index as usize]);
        anchor_distance -= point.distance_to(p);
        p = point;
    }

    let mut index = index as usize;
    if index + 1 >= line.len() {
        return false;
    }
    anchor_distance +=
        convert_point_f64(&line[index]).distance_to(convert_point_f64(&line[index + 1]));
    index += 1;

    // Store recent corners and their total angle difference
    let mut recent_corners: VecDeque<Corner> = VecDeque::new();
    let mut recent_angle_delta = 0.0;

    // Move forwards by the length of the label and check angles along the way
    while anchor_distance < label_length / 2.0 {
        // There isn't enough room for the label before the end of the line
        if index + 1 >= line.len() {
            return false;
        }

        let prev = convert_point_f64(&line[index - 1]);
        let current = convert_point_f64(&line[index]);
        let next = convert_point_f64(&line[index + 1]);

        let angle_delta = angle_to(&prev, &current) - angle_to(&current, &next);
        // Restrict angle to -pi..pi range
        let angle_delta = (((angle_delta + 3.0 * PI) % (PI * 2.0)) - PI).abs();

        recent_corners.push_back(Corner {
            distance: anchor_distance,
            angle_delta,
        });
        recent_angle_delta += angle_delta;

        // Remove corners that are far enough away from the list of recent anchors
        while let Some(oldest) = recent_corners.front() {
            if anchor_distance - oldest.distance <= window_size {
                break;
            }
            recent_angle_delta -= oldest.angle_delta;
            recent_corners.pop_front();
        }

        // The sum of angles within the window area exceeds the maximum allowed value. Check fails.
        if recent_angle_delta > max_angle {
            return false;
        }

        index += 1;
        anchor_distance += current.distance_to(next);
    }

    // No part of the line had an angle greater than the maximum allowed. Check passes.
    true
}
