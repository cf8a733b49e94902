use glam::Vec2;

use super::{DrawPrimitive, Rgba};

/// Marker shape drawn for a blip, chosen by the detection's sound type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlipGlyph {
    /// Gem outline, used for type 1.
    Diamond,
    /// Map-pin: a triangle standing on a small base, types 2 and 3.
    Pin,
    Dot,
}

impl BlipGlyph {
    pub fn for_sound_type(sound_type: i32) -> Self {
        match sound_type {
            1 => Self::Diamond,
            2 | 3 => Self::Pin,
            _ => Self::Dot,
        }
    }

    /// Appends the glyph centred on `at`. `size` is the nominal half-extent.
    pub fn push(self, out: &mut Vec<DrawPrimitive>, at: Vec2, size: f32, fill: Rgba) {
        let p = |x: f32, y: f32| at + Vec2::new(x, y) * size;
        match self {
            Self::Diamond => out.push(DrawPrimitive::Polygon {
                points: vec![
                    p(-0.4, 0.6),
                    p(0.4, 0.6),
                    p(0.6, -0.1),
                    p(0.2, -0.6),
                    p(-0.2, -0.6),
                    p(-0.6, -0.1),
                ],
                fill,
            }),
            Self::Pin => {
                out.push(DrawPrimitive::Polygon {
                    points: vec![p(0.0, -0.8), p(-0.6, 0.6), p(0.6, 0.6)],
                    fill,
                });
                out.push(DrawPrimitive::Rect {
                    origin: p(-0.2, 0.6),
                    size: Vec2::new(0.4, 0.3) * size,
                    fill,
                });
            }
            Self::Dot => out.push(DrawPrimitive::Disc {
                center: at,
                radius: size * 0.8,
                fill,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_sound_types_to_glyphs() {
        assert_eq!(BlipGlyph::for_sound_type(1), BlipGlyph::Diamond);
        assert_eq!(BlipGlyph::for_sound_type(2), BlipGlyph::Pin);
        assert_eq!(BlipGlyph::for_sound_type(3), BlipGlyph::Pin);
        assert_eq!(BlipGlyph::for_sound_type(0), BlipGlyph::Dot);
        assert_eq!(BlipGlyph::for_sound_type(-4), BlipGlyph::Dot);
    }

    #[test]
    fn pin_is_triangle_on_a_base() {
        let mut out = Vec::new();
        BlipGlyph::Pin.push(&mut out, Vec2::new(10.0, 10.0), 10.0, Rgba::WHITE);
        assert_eq!(out.len(), 2);
        match &out[1] {
            DrawPrimitive::Rect { origin, size, .. } => {
                assert!((*origin - Vec2::new(8.0, 16.0)).length() < 1e-4);
                assert!((*size - Vec2::new(4.0, 3.0)).length() < 1e-4);
            }
            other => panic!("expected base rect, got {other:?}"),
        }
    }

    #[test]
    fn diamond_is_a_single_polygon_around_the_blip() {
        let mut out = Vec::new();
        BlipGlyph::Diamond.push(&mut out, Vec2::ZERO, 6.0, Rgba::WHITE);
        let [DrawPrimitive::Polygon { points, .. }] = out.as_slice() else {
            panic!("expected one polygon");
        };
        assert_eq!(points.len(), 6);
        assert!(points.iter().all(|point| point.length() <= 6.0));
    }
}
