//! Glyph and icon quads relative to the label anchor.

use std::f64::consts::PI;

use crate::{
    euclid::{Point2D, Rect, Vector2D},
    text::{
        glyph::{Glyph, Shaping, WritingModeType},
        image::ImagePosition,
        shaping::PositionedIcon,
    },
    util::{
        constants::ONE_EM,
        math::{deg2radf, rotate},
    },
    TileSpace,
};

/// Four corners of a glyph or icon image, in pixels relative to the anchor.
#[derive(Debug, Clone)]
pub struct SymbolQuad {
    pub tl: Point2D<f64, TileSpace>,
    pub tr: Point2D<f64, TileSpace>,
    pub bl: Point2D<f64, TileSpace>,
    pub br: Point2D<f64, TileSpace>,
    /// Location in the glyph or icon atlas
    pub tex: Rect<u16, TileSpace>,
    /// Offset of the glyph along the line for line-placed labels
    pub glyph_offset: Point2D<f64, TileSpace>,
    pub writing_mode: WritingModeType,
    pub is_sdf: bool,
}

pub type SymbolQuads = Vec<SymbolQuad>;

const BORDER: u16 = ImagePosition::PADDING;

fn matrix_multiply<U>(m: &[f64; 4], p: Point2D<f64, U>) -> Point2D<f64, U> {
    Point2D::new(m[0] * p.x + m[1] * p.y, m[2] * p.x + m[3] * p.y)
}

fn rotation_matrix(angle: f64) -> [f64; 4] {
    let angle_sin = angle.sin();
    let angle_cos = angle.cos();
    [angle_cos, -angle_sin, angle_sin, angle_cos]
}

/// The single quad of a shaped icon, rotated by `icon_rotate` degrees.
pub fn get_icon_quads(shaped_icon: &PositionedIcon, icon_rotate: f64) -> SymbolQuads {
    let image = &shaped_icon.image;
    let border = BORDER as f64 / image.pixel_ratio;

    // The sprite rect includes the padding, so the quad has to grow by the same amount.
    let top = shaped_icon.top - border;
    let left = shaped_icon.left - border;
    let bottom = shaped_icon.bottom + border;
    let right = shaped_icon.right + border;

    let mut tl = Point2D::new(left, top);
    let mut tr = Point2D::new(right, top);
    let mut br = Point2D::new(right, bottom);
    let mut bl = Point2D::new(left, bottom);

    let angle = deg2radf(icon_rotate);
    if angle != 0.0 {
        let matrix = rotation_matrix(angle);
        tl = matrix_multiply(&matrix, tl);
        tr = matrix_multiply(&matrix, tr);
        bl = matrix_multiply(&matrix, bl);
        br = matrix_multiply(&matrix, br);
    }

    vec![SymbolQuad {
        tl,
        tr,
        bl,
        br,
        tex: image.padded_rect,
        glyph_offset: Point2D::origin(),
        writing_mode: WritingModeType::None,
        is_sdf: image.sdf,
    }]
}

/// One quad per positioned glyph that has a bitmap in the glyph atlas.
///
/// `text_offset` is in pixels. For labels placed along a line the glyph position is kept in
/// `glyph_offset` so that glyphs can follow the line at render time.
pub fn get_glyph_quads(
    shaped_text: &Shaping,
    text_offset: [f64; 2],
    along_line: bool,
    text_rotate: f64,
    allow_vertical_placement: bool,
) -> SymbolQuads {
    let text_rotate = deg2radf(text_rotate);

    let mut quads = Vec::new();

    for positioned_glyph in shaped_text.positioned_glyphs() {
        let Some(rect) = positioned_glyph.rect else {
            continue;
        };
        if rect.is_empty() {
            continue;
        }

        // The rects have an additional buffer that is not included in their size
        let glyph_padding = 1.0;
        let rect_buffer = Glyph::BORDER_SIZE as f64 + glyph_padding;
        let rotate_vertical_glyph =
            (along_line || allow_vertical_placement) && positioned_glyph.vertical;
        let half_advance = positioned_glyph.metrics.advance as f64 / 2.0;

        let glyph_offset = if along_line {
            Point2D::new(positioned_glyph.x + half_advance, positioned_glyph.y)
        } else {
            Point2D::origin()
        };

        let mut built_in_offset = if along_line {
            Vector2D::zero()
        } else {
            Vector2D::new(
                positioned_glyph.x + half_advance + text_offset[0],
                positioned_glyph.y + text_offset[1],
            )
        };

        let mut verticalized_label_offset = Vector2D::<f64, TileSpace>::zero();
        if rotate_vertical_glyph {
            // Vertical point labels keep their glyphs upright, so the quad is rotated first and
            // then moved to the built-in offset.
            verticalized_label_offset = built_in_offset;
            built_in_offset = Vector2D::zero();
        }

        let x1 = positioned_glyph.metrics.left as f64 - rect_buffer - half_advance
            + built_in_offset.x;
        let y1 = -positioned_glyph.metrics.top as f64 - rect_buffer + built_in_offset.y;
        let x2 = x1 + rect.width() as f64;
        let y2 = y1 + rect.height() as f64;

        let mut tl: Point2D<f64, TileSpace> = Point2D::new(x1, y1);
        let mut tr: Point2D<f64, TileSpace> = Point2D::new(x2, y1);
        let mut bl: Point2D<f64, TileSpace> = Point2D::new(x1, y2);
        let mut br: Point2D<f64, TileSpace> = Point2D::new(x2, y2);

        if rotate_vertical_glyph {
            // Vertical glyphs are laid out in one em boxes below the midline. Rotating counter
            // clockwise around the center of the left edge of that box aligns the glyph center
            // with the midline, which makes the baseline y offset unnecessary.
            let center = Point2D::new(-half_advance, half_advance - Shaping::Y_OFFSET as f64);
            let vertical_rotation = -PI / 2.;

            // Zero for full-width glyphs, pulls half-width glyphs up.
            let x_half_width_offset_correction = ONE_EM / 2. - half_advance;
            let x_offset_correction = Vector2D::<f64, TileSpace>::new(
                5.0 - Shaping::Y_OFFSET as f64 - x_half_width_offset_correction,
                0.0,
            );

            let rotate_corner = |corner: Point2D<f64, TileSpace>| {
                center
                    + rotate(&(corner - center), vertical_rotation)
                    + x_offset_correction
                    + verticalized_label_offset
            };
            tl = rotate_corner(tl);
            tr = rotate_corner(tr);
            bl = rotate_corner(bl);
            br = rotate_corner(br);
        }

        if text_rotate != 0.0 {
            let matrix = rotation_matrix(text_rotate);
            tl = matrix_multiply(&matrix, tl);
            tr = matrix_multiply(&matrix, tr);
            bl = matrix_multiply(&matrix, bl);
            br = matrix_multiply(&matrix, br);
        }

        quads.push(SymbolQuad {
            tl,
            tr,
            bl,
            br,
            tex: rect,
            glyph_offset,
            writing_mode: shaped_text.writing_mode,
            is_sdf: true,
        });
    }

    quads
}

#[cfg(test)]
mod tests {
    use cgmath::{abs_diff_eq, ulps_eq};

    use crate::{
        euclid::{Point2D, Rect, Size2D},
        style::style_types::SymbolAnchorType,
        text::{
            glyph::{GlyphMetrics, PositionedGlyph, PositionedLine, Shaping, WritingModeType},
            image::ImagePosition,
            quads::{get_glyph_quads, get_icon_quads},
            shaping::PositionedIcon,
        },
    };

    fn shaping_with(glyphs: Vec<PositionedGlyph>) -> Shaping {
        let mut shaping = Shaping::new(0.0, 0.0, WritingModeType::Horizontal);
        shaping.positioned_lines.push(PositionedLine {
            positioned_glyphs: glyphs,
        });
        shaping
    }

    fn glyph(x: f64, vertical: bool, with_rect: bool) -> PositionedGlyph {
        PositionedGlyph {
            glyph: '中',
            x,
            y: -17.0,
            vertical,
            rect: with_rect.then(|| Rect::new(Point2D::new(0, 0), Size2D::new(24, 24))),
            metrics: GlyphMetrics {
                width: 18,
                height: 18,
                left: 2,
                top: -8,
                advance: 21,
            },
        }
    }

    #[test]
    fn icon_quads_normal() {
        let image = ImagePosition {
            pixel_ratio: 1.0,
            padded_rect: Rect::new(Point2D::origin(), Size2D::new(15, 11)),
            sdf: false,
        };

        let shaped_icon =
            PositionedIcon::shape_icon(image, &[-6.5, -4.5], SymbolAnchorType::Center);

        let quads = get_icon_quads(&shaped_icon, 0.);

        assert_eq!(quads.len(), 1);
        let quad = &quads[0];
        assert!(ulps_eq!(quad.tl.x, -14.));
        assert!(ulps_eq!(quad.tl.y, -10.));
        assert!(ulps_eq!(quad.tr.x, 1.));
        assert!(ulps_eq!(quad.tr.y, -10.));
        assert!(ulps_eq!(quad.bl.x, -14.));
        assert!(ulps_eq!(quad.bl.y, 1.));
        assert!(ulps_eq!(quad.br.x, 1.));
        assert!(ulps_eq!(quad.br.y, 1.));
        assert!(!quad.is_sdf);
    }

    #[test]
    fn icon_quads_rotated() {
        let image = ImagePosition {
            pixel_ratio: 1.0,
            padded_rect: Rect::new(Point2D::origin(), Size2D::new(22, 12)),
            sdf: true,
        };
        let shaped_icon = PositionedIcon::shape_icon(image, &[0.0, 0.0], SymbolAnchorType::Center);
        let quad = &get_icon_quads(&shaped_icon, 90.0)[0];
        // (-11, -6) rotated by a quarter turn
        assert!(abs_diff_eq!(quad.tl.x, 6.0, epsilon = 1e-9));
        assert!(abs_diff_eq!(quad.tl.y, -11.0, epsilon = 1e-9));
        assert!(quad.is_sdf);
    }

    #[test]
    fn glyph_quads_point_placement() {
        let shaping = shaping_with(vec![glyph(0.0, false, true), glyph(21.0, false, false)]);
        let quads = get_glyph_quads(&shaping, [0.0, 0.0], false, 0.0, false);

        // glyphs without an atlas rect have no quad
        assert_eq!(quads.len(), 1);
        let quad = &quads[0];
        assert_eq!(quad.tl, Point2D::new(-2.0, -13.0));
        assert_eq!(quad.br, Point2D::new(22.0, 11.0));
        assert_eq!(quad.glyph_offset, Point2D::origin());
        assert_eq!(quad.writing_mode, WritingModeType::Horizontal);

        let offset = get_glyph_quads(&shaping, [5.0, 7.0], false, 0.0, false);
        assert_eq!(offset[0].tl, Point2D::new(3.0, -6.0));
    }

    #[test]
    fn glyph_quads_along_line() {
        let shaping = shaping_with(vec![glyph(0.0, false, true)]);
        let quads = get_glyph_quads(&shaping, [5.0, 7.0], true, 0.0, false);
        let quad = &quads[0];
        assert_eq!(quad.glyph_offset, Point2D::new(10.5, -17.0));
        assert_eq!(quad.tl, Point2D::new(-12.5, 4.0));
        assert_eq!(quad.br, Point2D::new(11.5, 28.0));
    }

    #[test]
    fn glyph_quads_rotation() {
        let shaping = shaping_with(vec![glyph(0.0, false, true)]);
        let quad = &get_glyph_quads(&shaping, [0.0, 0.0], false, 90.0, false)[0];
        assert!(abs_diff_eq!(quad.tl.x, 13.0, epsilon = 1e-9));
        assert!(abs_diff_eq!(quad.tl.y, -2.0, epsilon = 1e-9));

        // a vertical glyph is turned counter clockwise, its quad stays 24 wide
        let shaping = shaping_with(vec![glyph(0.0, true, true)]);
        let quad = &get_glyph_quads(&shaping, [0.0, 0.0], true, 0.0, false)[0];
        assert!(abs_diff_eq!(
            (quad.tr.x - quad.tl.x).abs() + (quad.tr.y - quad.tl.y).abs(),
            24.0,
            epsilon = 1e-9
        ));
        assert!(abs_diff_eq!(quad.tl.x, quad.tr.x, epsilon = 1e-9));
    }
}
