//! HUD strip above the level
//!
//! The score is drawn as seven-segment digits built from solid quads, so the
//! HUD goes through the same quad pipeline as the level.

use sanic_core::{DrawList, Quad, Rect, Vec2};

const SCORE_COLOR: [f32; 4] = [1.0, 0.85, 0.1, 1.0];

/// Digit height as a share of the strip height
const DIGIT_HEIGHT: f32 = 0.6;

/// Lit segments per digit, bit 0 = top (a) through bit 6 = middle (g)
const SEGMENTS: [u8; 10] = [0x3f, 0x06, 0x5b, 0x4f, 0x66, 0x6d, 0x7d, 0x07, 0x7f, 0x6f];

/// Segment centre and size inside a digit cell of `w` x `h`, stroke `t`
fn segment(index: usize, w: f32, h: f32, t: f32) -> (Vec2, Vec2) {
    let horizontal = Vec2::new(w, t);
    let vertical = Vec2::new(t, h * 0.5);
    match index {
        0 => (Vec2::new(w * 0.5, t * 0.5), horizontal),
        1 => (Vec2::new(w - t * 0.5, h * 0.25), vertical),
        2 => (Vec2::new(w - t * 0.5, h * 0.75), vertical),
        3 => (Vec2::new(w * 0.5, h - t * 0.5), horizontal),
        4 => (Vec2::new(t * 0.5, h * 0.75), vertical),
        5 => (Vec2::new(t * 0.5, h * 0.25), vertical),
        _ => (Vec2::new(w * 0.5, h * 0.5), horizontal),
    }
}

/// Draw `score` left-aligned in the HUD strip
///
/// An empty strip yields an empty list.
pub fn score_draw_list(score: u64, area: Rect) -> DrawList {
    let mut list = DrawList {
        viewport: area,
        quads: Vec::new(),
    };
    if area.width <= 0.0 || area.height <= 0.0 {
        return list;
    }

    let h = area.height * DIGIT_HEIGHT;
    let w = h * 0.5;
    let t = (h * 0.12).max(1.0);
    let gap = w * 0.4;
    let margin = (area.height - h) * 0.5;

    for (i, digit) in score.to_string().bytes().enumerate() {
        let lit = SEGMENTS[usize::from(digit - b'0')];
        let origin = Vec2::new(area.x + margin + i as f32 * (w + gap), area.y + margin);
        for index in 0..7 {
            if lit & (1 << index) == 0 {
                continue;
            }
            let (center, size) = segment(index, w, h, t);
            list.quads.push(Quad {
                center: origin + center,
                size,
                angle: 0.0,
                color: SCORE_COLOR,
            });
        }
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip() -> Rect {
        Rect::new(0.0, 0.0, 800.0, 100.0)
    }

    #[test]
    fn test_segment_counts() {
        // 8 lights all seven, 1 two of them
        assert_eq!(score_draw_list(8, strip()).quads.len(), 7);
        assert_eq!(score_draw_list(1, strip()).quads.len(), 2);
        assert_eq!(score_draw_list(0, strip()).quads.len(), 6);
        assert_eq!(score_draw_list(1234567890, strip()).quads.len(), 2 + 5 + 5 + 4 + 5 + 6 + 3 + 7 + 6 + 6);
    }

    #[test]
    fn test_digits_stay_in_strip() {
        let area = Rect::new(0.0, 0.0, 800.0, 96.0);
        let list = score_draw_list(90210, area);
        assert_eq!(list.viewport, area);
        for quad in &list.quads {
            let half = quad.size * 0.5;
            assert!(quad.center.x - half.x >= area.x && quad.center.x + half.x <= area.x + area.width);
            assert!(quad.center.y - half.y >= area.y && quad.center.y + half.y <= area.y + area.height);
        }
    }

    #[test]
    fn test_digits_advance_left_to_right() {
        let one = score_draw_list(1, strip());
        let eleven = score_draw_list(11, strip());
        assert_eq!(eleven.quads.len(), 4);
        assert_eq!(&eleven.quads[..2], &one.quads[..]);
        assert!(eleven.quads[2].center.x > one.quads[0].center.x);
    }

    #[test]
    fn test_empty_strip_draws_nothing() {
        assert!(score_draw_list(42, Rect::new(0.0, 0.0, 800.0, 0.0)).quads.is_empty());
    }
}
