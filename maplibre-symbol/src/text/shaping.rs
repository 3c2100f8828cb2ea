//! Text and icon shaping: positions glyphs in lines around the label anchor.

use std::collections::BTreeSet;

use crate::{
    style::style_types::{SymbolAnchorType, TextJustifyType},
    text::{
        glyph::{
            GlyphMap, GlyphPositions, Glyphs, PositionedGlyph, PositionedLine, Shaping,
            WritingModeType,
        },
        i18n,
        image::ImagePosition,
    },
    util::constants::ONE_EM,
};

struct AnchorAlignment {
    horizontal_align: f64,
    vertical_align: f64,
}

impl AnchorAlignment {
    fn get_anchor_alignment(anchor: SymbolAnchorType) -> AnchorAlignment {
        let mut result = AnchorAlignment {
            horizontal_align: 0.5,
            vertical_align: 0.5,
        };

        match anchor {
            SymbolAnchorType::Right
            | SymbolAnchorType::TopRight
            | SymbolAnchorType::BottomRight => {
                result.horizontal_align = 1.0;
            }

            SymbolAnchorType::Left | SymbolAnchorType::TopLeft | SymbolAnchorType::BottomLeft => {
                result.horizontal_align = 0.0;
            }
            _ => {}
        }

        match anchor {
            SymbolAnchorType::Bottom
            | SymbolAnchorType::BottomLeft
            | SymbolAnchorType::BottomRight => {
                result.vertical_align = 1.0;
            }

            SymbolAnchorType::Top | SymbolAnchorType::TopLeft | SymbolAnchorType::TopRight => {
                result.vertical_align = 0.0;
            }

            _ => {}
        }

        result
    }
}

/// An icon positioned around the label anchor, in pixels.
#[derive(Debug, Clone)]
pub struct PositionedIcon {
    pub image: ImagePosition,
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl PositionedIcon {
    pub fn shape_icon(
        image: ImagePosition,
        icon_offset: &[f64; 2],
        icon_anchor: SymbolAnchorType,
    ) -> PositionedIcon {
        let anchor_align = AnchorAlignment::get_anchor_alignment(icon_anchor);
        let [width, height] = image.display_size();
        let dx = icon_offset[0];
        let dy = icon_offset[1];
        let left = dx - width * anchor_align.horizontal_align;
        let right = left + width;
        let top = dy - height * anchor_align.vertical_align;
        let bottom = top + height;

        PositionedIcon {
            image,
            top,
            bottom,
            left,
            right,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }
}

/// Parameters of a text shaping request.
#[derive(Debug, Clone, Copy)]
pub struct TextShapingParameters {
    /// Maximum line width in glyph units, 0 disables line breaking
    pub max_width: f64,
    pub line_height: f64,
    pub text_anchor: SymbolAnchorType,
    pub text_justify: TextJustifyType,
    /// Extra advance between glyphs
    pub spacing: f64,
    pub translate: [f64; 2],
    pub writing_mode: WritingModeType,
}

/// Shapes `text` with the glyphs of `font_stack`. Returns `None` if no glyph could be positioned.
pub fn get_shaping(
    text: &str,
    parameters: &TextShapingParameters,
    font_stack: &str,
    glyph_map: &GlyphMap,
    glyph_positions: &GlyphPositions,
) -> Option<Shaping> {
    let trimmed = text.trim_matches(i18n::is_whitespace);
    let logical_input = if parameters.writing_mode.contains(WritingModeType::Vertical) {
        i18n::verticalize_punctuation_str(trimmed)
    } else {
        trimmed.to_string()
    };

    let glyphs = glyph_map.get(font_stack);
    let chars: Vec<char> = logical_input.chars().collect();
    let line_breaks =
        determine_line_breaks(&chars, parameters.spacing, parameters.max_width, glyphs);

    let mut lines: Vec<&[char]> = Vec::with_capacity(line_breaks.len() + 1);
    let mut start = 0;
    for line_break in line_breaks
        .into_iter()
        .chain(std::iter::once(chars.len()))
    {
        if line_break <= start {
            continue;
        }
        lines.push(&chars[start..line_break]);
        start = line_break;
    }

    let mut shaping = Shaping::new(
        parameters.translate[0],
        parameters.translate[1],
        parameters.writing_mode,
    );
    shaping.text = logical_input.clone();

    shape_lines(
        &mut shaping,
        &lines,
        parameters,
        glyphs,
        glyph_positions.get(font_stack),
    );

    if !shaping.is_any_line_not_empty() {
        return None;
    }

    Some(shaping)
}

// Zero width space that is used to suggest break points for Japanese labels.
const ZWSP: char = '\u{200b}';

fn align(
    shaping: &mut Shaping,
    justify: f64,
    horizontal_align: f64,
    vertical_align: f64,
    max_line_length: f64,
    line_height: f64,
    line_count: usize,
) {
    let shift_x = (justify - horizontal_align) * max_line_length;
    let shift_y = (-vertical_align * line_count as f64 + 0.5) * line_height;

    for line in &mut shaping.positioned_lines {
        for positioned_glyph in &mut line.positioned_glyphs {
            positioned_glyph.x += shift_x;
            positioned_glyph.y += shift_y;
        }
    }
}

// justify left = 0, right = 1, center = .5
fn justify_line(positioned_glyphs: &mut [PositionedGlyph], justify: f64) {
    if justify == 0.0 {
        return;
    }

    let Some(last_glyph) = positioned_glyphs.last() else {
        return;
    };
    let line_indent = (last_glyph.x + last_glyph.metrics.advance as f64) * justify;
    for positioned_glyph in positioned_glyphs {
        positioned_glyph.x -= line_indent;
    }
}

fn get_glyph_advance(code_point: char, glyphs: Option<&Glyphs>, spacing: f64) -> f64 {
    match glyphs.and_then(|glyphs| glyphs.get(&code_point)) {
        Some(Some(glyph)) => glyph.metrics.advance as f64 + spacing,
        _ => 0.0,
    }
}

fn determine_average_line_width(
    logical_input: &[char],
    spacing: f64,
    max_width: f64,
    glyphs: Option<&Glyphs>,
) -> f64 {
    let total_width: f64 = logical_input
        .iter()
        .map(|code_point| get_glyph_advance(*code_point, glyphs, spacing))
        .sum();

    let target_line_count = (1.0f64).max((total_width / max_width).ceil());
    total_width / target_line_count
}

fn calculate_badness(line_width: f64, target_width: f64, penalty: f64, is_last_break: bool) -> f64 {
    let raggedness = (line_width - target_width).powi(2);
    if is_last_break {
        // Favor finals lines shorter than average over longer than average
        if line_width < target_width {
            return raggedness / 2.;
        } else {
            return raggedness * 2.;
        }
    }
    if penalty < 0. {
        return raggedness - penalty * penalty;
    }
    raggedness + penalty * penalty
}

fn calculate_penalty(
    code_point: char,
    next_code_point: char,
    penalizable_ideographic_break: bool,
) -> f64 {
    let mut penalty = 0.;
    // Force break on newline
    if code_point == '\n' {
        penalty -= 10000.;
    }

    // Penalize open parenthesis at end of line
    if code_point == '(' || code_point == '\u{ff08}' {
        penalty += 50.;
    }

    // Penalize close parenthesis at beginning of line
    if next_code_point == ')' || next_code_point == '\u{ff09}' {
        penalty += 50.;
    }

    // Penalize breaks between characters that allow ideographic breaking because
    // they are less preferable than breaks at spaces (or zero width spaces)
    if penalizable_ideographic_break {
        penalty += 150.;
    }

    penalty
}

#[derive(Clone, Copy)]
struct PotentialBreak {
    index: usize,
    x: f64,
    /// Position of the best previous break in the list of potential breaks
    prior_break: Option<usize>,
    badness: f64,
}

fn evaluate_break(
    break_index: usize,
    break_x: f64,
    target_width: f64,
    potential_breaks: &[PotentialBreak],
    penalty: f64,
    is_last_break: bool,
) -> PotentialBreak {
    // We could skip evaluating breaks where the line length (breakX - priorBreak.x) > maxWidth
    //  ...but in fact we allow lines longer than maxWidth (if there's no break points)
    //  ...and when targetWidth and maxWidth are close, strictly enforcing maxWidth can give
    //     more lopsided results.

    let mut best_prior_break: Option<usize> = None;
    let mut best_break_badness: f64 =
        calculate_badness(break_x, target_width, penalty, is_last_break);

    for (position, potential_break) in potential_breaks.iter().enumerate() {
        let line_width = break_x - potential_break.x;
        let break_badness = calculate_badness(line_width, target_width, penalty, is_last_break)
            + potential_break.badness;
        if break_badness <= best_break_badness {
            best_prior_break = Some(position);
            best_break_badness = break_badness;
        }
    }

    PotentialBreak {
        index: break_index,
        x: break_x,
        prior_break: best_prior_break,
        badness: best_break_badness,
    }
}

fn least_bad_breaks(
    last_line_break: &PotentialBreak,
    potential_breaks: &[PotentialBreak],
) -> BTreeSet<usize> {
    let mut least_bad_breaks: BTreeSet<usize> = BTreeSet::from([last_line_break.index]);
    let mut prior_break = last_line_break.prior_break;

    while let Some(position) = prior_break {
        let potential_break = &potential_breaks[position];
        least_bad_breaks.insert(potential_break.index);
        prior_break = potential_break.prior_break;
    }
    least_bad_breaks
}

// We determine line breaks based on shaped text in logical order. Working in visual order would be
//  more intuitive, but we can't do that because the visual order may be changed by line breaks!
fn determine_line_breaks(
    logical_input: &[char],
    spacing: f64,
    max_width: f64,
    glyphs: Option<&Glyphs>,
) -> BTreeSet<usize> {
    if max_width == 0.0 || logical_input.is_empty() {
        return BTreeSet::default();
    }

    let target_width = determine_average_line_width(logical_input, spacing, max_width, glyphs);

    let mut potential_breaks: Vec<PotentialBreak> = Vec::new();
    let mut current_x: f64 = 0.;
    // Find first occurance of zero width space (ZWSP) character.
    let has_server_suggested_breaks = logical_input.contains(&ZWSP);

    for (i, code_point) in logical_input.iter().copied().enumerate() {
        if !i18n::is_whitespace(code_point) {
            current_x += get_glyph_advance(code_point, glyphs, spacing);
        }

        // Ideographic characters, spaces, and word-breaking punctuation that
        // often appear without surrounding spaces.
        let Some(next_code_point) = logical_input.get(i + 1).copied() else {
            continue;
        };
        let allows_ideographic_break = i18n::allows_ideographic_breaking(code_point);
        if allows_ideographic_break || i18n::allows_word_breaking(code_point) {
            let penalizable_ideographic_break =
                allows_ideographic_break && has_server_suggested_breaks;
            let potential_break = evaluate_break(
                i + 1,
                current_x,
                target_width,
                &potential_breaks,
                calculate_penalty(code_point, next_code_point, penalizable_ideographic_break),
                false,
            );
            potential_breaks.push(potential_break);
        }
    }

    let last_break = evaluate_break(
        logical_input.len(),
        current_x,
        target_width,
        &potential_breaks,
        0.,
        true,
    );
    least_bad_breaks(&last_break, &potential_breaks)
}

fn shape_lines(
    shaping: &mut Shaping,
    lines: &[&[char]],
    parameters: &TextShapingParameters,
    glyphs: Option<&Glyphs>,
    positions: Option<&crate::text::glyph::GlyphPositionMap>,
) {
    let TextShapingParameters {
        line_height,
        text_anchor,
        text_justify,
        spacing,
        writing_mode,
        ..
    } = *parameters;

    let mut x = 0.0;
    let mut y = Shaping::Y_OFFSET as f64;

    let mut max_line_length: f64 = 0.0;

    let justify = text_justify.factor();

    for line in lines {
        // Collapse whitespace so it doesn't throw off justification
        let start = line.iter().position(|c| !i18n::is_whitespace(*c));
        let end = line.iter().rposition(|c| !i18n::is_whitespace(*c));
        let line: &[char] = match (start, end) {
            (Some(start), Some(end)) => &line[start..=end],
            _ => &[],
        };

        let mut positioned_line = PositionedLine::default();

        if line.is_empty() {
            shaping.positioned_lines.push(positioned_line);
            y += line_height; // Still need a line feed after empty line
            continue;
        }

        for code_point in line.iter().copied() {
            let Some(Some(glyph)) = glyphs.and_then(|glyphs| glyphs.get(&code_point)) else {
                continue;
            };
            let rect = positions
                .and_then(|positions| positions.get(&code_point))
                .map(|position| position.rect);

            let vertical = writing_mode.contains(WritingModeType::Vertical)
                && i18n::has_upright_vertical_orientation(code_point);

            positioned_line.positioned_glyphs.push(PositionedGlyph {
                glyph: code_point,
                x,
                y,
                vertical,
                rect,
                metrics: glyph.metrics,
            });

            if vertical {
                x += ONE_EM + spacing;
                shaping.verticalizable = true;
            } else {
                x += glyph.metrics.advance as f64 + spacing;
            }
        }

        // Only justify if we placed at least one glyph
        if !positioned_line.positioned_glyphs.is_empty() {
            let line_length = x - spacing; // Don't count trailing spacing
            max_line_length = line_length.max(max_line_length);
            justify_line(&mut positioned_line.positioned_glyphs, justify);
        }

        shaping.positioned_lines.push(positioned_line);
        x = 0.0;
        y += line_height;
    }

    let anchor_align = AnchorAlignment::get_anchor_alignment(text_anchor);
    let line_count = lines.len();
    align(
        shaping,
        justify,
        anchor_align.horizontal_align,
        anchor_align.vertical_align,
        max_line_length,
        line_height,
        line_count,
    );

    // Calculate the bounding box
    let height = line_count as f64 * line_height;
    shaping.top += -anchor_align.vertical_align * height;
    shaping.bottom = shaping.top + height;
    shaping.left += -anchor_align.horizontal_align * max_line_length;
    shaping.right = shaping.left + max_line_length;
    shaping.line_count = line_count;
    shaping.max_line_length = max_line_length;
}

#[cfg(test)]
mod tests {
    use crate::{
        euclid::{Point2D, Rect, Size2D},
        style::style_types::{SymbolAnchorType, TextJustifyType},
        text::{
            glyph::{
                Glyph, GlyphMap, GlyphMetrics, GlyphPosition, GlyphPositionMap, GlyphPositions,
                Glyphs, WritingModeType,
            },
            image::ImagePosition,
            shaping::{get_shaping, PositionedIcon, TextShapingParameters},
        },
        util::constants::ONE_EM,
    };

    const FONT: &str = "font-stack";

    fn metrics(advance: u32) -> GlyphMetrics {
        GlyphMetrics {
            width: 18,
            height: 18,
            left: 2,
            top: -8,
            advance,
        }
    }

    fn resources(glyphs: &[(char, u32)]) -> (GlyphMap, GlyphPositions) {
        let glyph_map = GlyphMap::from([(
            FONT.to_string(),
            glyphs
                .iter()
                .map(|(id, advance)| {
                    (
                        *id,
                        Some(Glyph {
                            id: *id,
                            metrics: metrics(*advance),
                        }),
                    )
                })
                .collect::<Glyphs>(),
        )]);
        let glyph_positions = GlyphPositions::from([(
            FONT.to_string(),
            glyphs
                .iter()
                .enumerate()
                .map(|(i, (id, advance))| {
                    (
                        *id,
                        GlyphPosition {
                            rect: Rect::new(Point2D::new(i as u16 * 24, 0), Size2D::new(24, 24)),
                            metrics: metrics(*advance),
                        },
                    )
                })
                .collect::<GlyphPositionMap>(),
        )]);
        (glyph_map, glyph_positions)
    }

    fn parameters(max_width: f64) -> TextShapingParameters {
        TextShapingParameters {
            max_width,
            line_height: ONE_EM,
            text_anchor: SymbolAnchorType::Center,
            text_justify: TextJustifyType::Center,
            spacing: 0.0,
            translate: [0.0, 0.0],
            writing_mode: WritingModeType::Horizontal,
        }
    }

    #[test]
    fn shaping_zwsp() {
        let (glyphs, glyph_positions) = resources(&[('中', 21)]);
        let shape = |text: &str, max_width_in_chars: f64| {
            get_shaping(
                text,
                &parameters(max_width_in_chars * ONE_EM),
                FONT,
                &glyphs,
                &glyph_positions,
            )
        };

        // 3 lines
        // 中中中中中中
        // 中中中中中中
        // 中中
        {
            let shaping = shape(
                "中中\u{200b}中中\u{200b}中中\u{200b}中中中中中中\u{200b}中中",
                5.0,
            )
            .unwrap();
            assert_eq!(shaping.positioned_lines.len(), 3);
            assert_eq!(shaping.line_count, 3);
            assert_eq!(shaping.top, -36.);
            assert_eq!(shaping.bottom, 36.);
            assert_eq!(shaping.left, -63.);
            assert_eq!(shaping.right, 63.);
            assert_eq!(shaping.writing_mode, WritingModeType::Horizontal);
        }

        // 2 lines
        // 中中
        // 中
        {
            let shaping = shape("中中\u{200b}中", 1.0).unwrap();
            assert_eq!(shaping.positioned_lines.len(), 2);
            assert_eq!(shaping.top, -24.);
            assert_eq!(shaping.bottom, 24.);
            assert_eq!(shaping.left, -21.);
            assert_eq!(shaping.right, 21.);
        }

        // 1 line
        // 中中
        {
            let shaping = shape("中中\u{200b}", 2.0).unwrap();
            assert_eq!(shaping.positioned_lines.len(), 1);
            assert_eq!(shaping.top, -12.);
            assert_eq!(shaping.bottom, 12.);
            assert_eq!(shaping.left, -21.);
            assert_eq!(shaping.right, 21.);
            assert_eq!(shaping.max_line_length, 42.);
        }

        // Only zero width spaces: nothing to render
        assert!(shape("\u{200b}\u{200b}\u{200b}\u{200b}\u{200b}", 1.0).is_none());
    }

    #[test]
    fn justification_and_anchor() {
        let (glyphs, glyph_positions) = resources(&[('a', 10), ('b', 12)]);

        let centered = get_shaping("ab", &parameters(0.0), FONT, &glyphs, &glyph_positions).unwrap();
        let xs: Vec<f64> = centered.positioned_glyphs().map(|g| g.x).collect();
        assert_eq!(xs, vec![-11.0, -1.0]);
        assert!(centered.positioned_glyphs().all(|g| g.y == -17.0));
        assert_eq!((centered.left, centered.right), (-11.0, 11.0));
        assert_eq!((centered.top, centered.bottom), (-12.0, 12.0));
        assert_eq!(centered.text, "ab");

        let mut left = parameters(0.0);
        left.text_anchor = SymbolAnchorType::TopLeft;
        left.text_justify = TextJustifyType::Left;
        let left = get_shaping("ab", &left, FONT, &glyphs, &glyph_positions).unwrap();
        let xs: Vec<f64> = left.positioned_glyphs().map(|g| g.x).collect();
        assert_eq!(xs, vec![0.0, 10.0]);
        assert_eq!((left.left, left.right), (0.0, 22.0));
        assert_eq!((left.top, left.bottom), (0.0, 24.0));
    }

    #[test]
    fn letter_spacing_and_translation() {
        let (glyphs, glyph_positions) = resources(&[('a', 10), ('b', 12)]);
        let mut spaced = parameters(0.0);
        spaced.spacing = 2.0;
        spaced.translate = [5.0, -5.0];
        let shaping = get_shaping("  ab ", &spaced, FONT, &glyphs, &glyph_positions).unwrap();
        assert_eq!(shaping.text, "ab");
        assert_eq!(shaping.max_line_length, 24.0);
        assert_eq!((shaping.left, shaping.right), (-7.0, 17.0));
        assert_eq!(shaping.top, -17.0);
    }

    #[test]
    fn missing_glyphs() {
        let (glyphs, glyph_positions) = resources(&[('a', 10)]);
        assert!(get_shaping("xyz", &parameters(0.0), FONT, &glyphs, &glyph_positions).is_none());
        assert!(get_shaping("a", &parameters(0.0), "other", &glyphs, &glyph_positions).is_none());
    }

    #[test]
    fn vertical_shaping() {
        let (glyphs, glyph_positions) = resources(&[('中', 21), ('︵', 21), ('a', 10)]);
        let mut vertical = parameters(0.0);
        vertical.writing_mode = WritingModeType::Vertical;
        let shaping = get_shaping("中(中a", &vertical, FONT, &glyphs, &glyph_positions).unwrap();
        assert_eq!(shaping.text, "中︵中a");
        assert!(shaping.verticalizable);
        let vertical_flags: Vec<bool> = shaping.positioned_glyphs().map(|g| g.vertical).collect();
        // the fullwidth bracket is upright, the latin letter is rotated
        assert_eq!(vertical_flags, vec![true, true, true, false]);
        assert_eq!(shaping.max_line_length, 3.0 * ONE_EM + 10.0);
    }

    #[test]
    fn icon_shaping() {
        let image = ImagePosition {
            pixel_ratio: 1.0,
            padded_rect: Rect::new(Point2D::new(0, 0), Size2D::new(22, 12)),
            sdf: false,
        };
        let icon = PositionedIcon::shape_icon(image.clone(), &[0.0, 0.0], SymbolAnchorType::Center);
        assert_eq!((icon.left, icon.right, icon.top, icon.bottom), (-10.0, 10.0, -5.0, 5.0));

        let icon = PositionedIcon::shape_icon(image, &[2.0, 3.0], SymbolAnchorType::BottomRight);
        assert_eq!((icon.left, icon.right, icon.top, icon.bottom), (-18.0, 2.0, -7.0, 3.0));
        assert_eq!(icon.width(), 20.0);
    }
}
