//! HUD compositing: turns tracker state into an ordered list of draw
//! primitives for whatever backend paints the overlay window.

mod glyph;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    config::{OsdPosition, OverlayConfig},
    tracker::{BlipSlot, BlipTracker},
};

pub use glyph::BlipGlyph;

/// Gap between the fixed-mode radar box and the viewport edge.
pub const OSD_MARGIN: f32 = 40.0;

/// Smallest viewport edge the fixed layout will draw into. Anything smaller
/// is a window that has not been laid out yet.
pub const MIN_FIXED_VIEWPORT: f32 = 300.0;

const RIM_INSET: f32 = 15.0;
const FULLSCREEN_RADIUS_FACTOR: f32 = 0.45;
const FULLSCREEN_CROSSHAIR: f32 = 8.0;

/// Outer, middle and inner range rings as (radius fraction, max alpha, width).
const RINGS: [(f32, f32, f32); 3] = [(1.0, 255.0, 2.0), (0.66, 51.0, 1.0), (0.33, 32.0, 1.0)];

/// 8-bit RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Proximity colour: red for near sources, green for far ones.
    pub fn for_distance(distance: f32) -> Self {
        let t = distance.clamp(0.0, 1.0);
        Self::rgb((255.0 * (1.0 - t)) as u8, (255.0 * t) as u8, 20)
    }
}

/// Size of the surface the overlay is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// One backend-agnostic drawing instruction, in viewport coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawPrimitive {
    Disc {
        center: Vec2,
        radius: f32,
        fill: Rgba,
    },
    Ring {
        center: Vec2,
        radius: f32,
        stroke: Rgba,
        width: f32,
    },
    Line {
        from: Vec2,
        to: Vec2,
        stroke: Rgba,
        width: f32,
    },
    Label {
        text: String,
        position: Vec2,
        size: f32,
        color: Rgba,
    },
    Polygon {
        points: Vec<Vec2>,
        fill: Rgba,
    },
    Rect {
        origin: Vec2,
        size: Vec2,
        fill: Rgba,
    },
}

/// Placement of the radar for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HudLayout {
    pub center: Vec2,
    pub radius: f32,
    pub fullscreen: bool,
}

impl HudLayout {
    /// Resolves where the radar goes, or `None` if nothing should be drawn.
    pub fn resolve(config: &OverlayConfig, viewport: Viewport) -> Option<Self> {
        if config.fullscreen {
            return Some(Self {
                center: Vec2::new(viewport.width, viewport.height) * 0.5,
                radius: viewport.height * FULLSCREEN_RADIUS_FACTOR,
                fullscreen: true,
            });
        }

        if viewport.width < MIN_FIXED_VIEWPORT || viewport.height < MIN_FIXED_VIEWPORT {
            return None;
        }

        let size = config.radar_size;
        let centered = (viewport.width - size) / 2.0;
        let right = viewport.width - size - OSD_MARGIN;
        let bottom = viewport.height - size - OSD_MARGIN;
        let origin = match config.osd_position {
            OsdPosition::TopLeft => Vec2::new(OSD_MARGIN, OSD_MARGIN),
            OsdPosition::TopCenter => Vec2::new(centered, OSD_MARGIN),
            OsdPosition::TopRight => Vec2::new(right, OSD_MARGIN),
            OsdPosition::BottomLeft => Vec2::new(OSD_MARGIN, bottom),
            OsdPosition::BottomCenter => Vec2::new(centered, bottom),
            OsdPosition::BottomRight => Vec2::new(right, bottom),
        };
        let half = size / 2.0;
        Some(Self {
            center: origin + Vec2::splat(half),
            radius: half - RIM_INSET,
            fullscreen: false,
        })
    }

    /// Screen position of a blip at `azimuth` degrees and normalised
    /// `distance`, scaled by `zoom` and clamped to the rim.
    pub fn blip_position(&self, azimuth: f32, distance: f32, zoom: f32) -> Vec2 {
        let rim = self.radius.max(0.0);
        let reach = (distance * self.radius * zoom).clamp(0.0, rim);
        self.center + direction(azimuth) * reach
    }
}

/// Colours used by the radar chrome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HudTheme {
    pub accent: Rgba,
    pub background: Rgba,
    pub label: Rgba,
}

impl Default for HudTheme {
    fn default() -> Self {
        Self {
            accent: Rgba::rgb(0, 220, 180),
            background: Rgba::rgb(10, 15, 25),
            label: Rgba::WHITE,
        }
    }
}

/// Stateless compositor for the radar overlay.
#[derive(Debug, Clone, Default)]
pub struct HudCompositor {
    theme: HudTheme,
}

impl HudCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_theme(theme: HudTheme) -> Self {
        Self { theme }
    }

    pub fn theme(&self) -> &HudTheme {
        &self.theme
    }

    /// Produces the draw list for one frame, back to front.
    pub fn render(
        &self,
        tracker: &BlipTracker,
        config: &OverlayConfig,
        viewport: Viewport,
    ) -> Vec<DrawPrimitive> {
        let mut out = Vec::new();
        self.render_into(&mut out, tracker, config, viewport);
        out
    }

    /// Like [`render`](Self::render) but reuses `out`, which is cleared first.
    pub fn render_into(
        &self,
        out: &mut Vec<DrawPrimitive>,
        tracker: &BlipTracker,
        config: &OverlayConfig,
        viewport: Viewport,
    ) {
        out.clear();
        let Some(layout) = HudLayout::resolve(config, viewport) else {
            return;
        };

        let chrome = config.global_opacity * config.radar_opacity;
        if chrome > 0.0 {
            if layout.fullscreen {
                self.push_crosshair(out, &layout, chrome);
            } else {
                self.push_radar(out, &layout, chrome, tracker.sweep_angle());
            }
        }

        let dots = config.global_opacity * config.dot_opacity;
        if dots > 0.0 {
            for (_, slot) in tracker.visible() {
                push_blip(out, &layout, slot, dots, config.zoom);
            }
        }
    }

    fn push_radar(
        &self,
        out: &mut Vec<DrawPrimitive>,
        layout: &HudLayout,
        opacity: f32,
        sweep: f32,
    ) {
        let HudLayout { center, radius, .. } = *layout;
        let accent = self.theme.accent;

        out.push(DrawPrimitive::Disc {
            center,
            radius: radius + 5.0,
            fill: self.theme.background.with_alpha(scale(opacity, 200.0)),
        });

        for (fraction, max_alpha, width) in RINGS {
            out.push(DrawPrimitive::Ring {
                center,
                radius: radius * fraction,
                stroke: accent.with_alpha(scale(opacity, max_alpha)),
                width,
            });
        }

        let axis = accent.with_alpha(scale(opacity, 38.0));
        let (across, along) = (Vec2::X * radius, Vec2::Y * radius);
        out.push(line(center - across, center + across, axis));
        out.push(line(center - along, center + along, axis));

        let label = self.theme.label.with_alpha(scale(opacity, 128.0));
        for (text, offset) in [
            ("F", Vec2::new(-4.0, -radius - 18.0)),
            ("R", Vec2::new(radius + 6.0, -8.0)),
            ("L", Vec2::new(-radius - 16.0, -8.0)),
        ] {
            out.push(DrawPrimitive::Label {
                text: text.to_string(),
                position: center + offset,
                size: 12.0,
                color: label,
            });
        }

        out.push(line(
            center,
            center + direction(sweep) * radius,
            accent.with_alpha(scale(opacity, 76.0)),
        ));
    }

    fn push_crosshair(&self, out: &mut Vec<DrawPrimitive>, layout: &HudLayout, opacity: f32) {
        let stroke = self.theme.label.with_alpha(scale(opacity, 38.0));
        let c = layout.center;
        out.push(line(
            c - Vec2::X * FULLSCREEN_CROSSHAIR,
            c + Vec2::X * FULLSCREEN_CROSSHAIR,
            stroke,
        ));
        out.push(line(
            c - Vec2::Y * FULLSCREEN_CROSSHAIR,
            c + Vec2::Y * FULLSCREEN_CROSSHAIR,
            stroke,
        ));
    }
}

fn push_blip(
    out: &mut Vec<DrawPrimitive>,
    layout: &HudLayout,
    slot: &BlipSlot,
    opacity: f32,
    zoom: f32,
) {
    let position = layout.blip_position(slot.azimuth, slot.distance, zoom);
    let alpha = slot.alpha * opacity;
    let color = Rgba::for_distance(slot.distance);
    let (halo_radius, glyph_size) = if layout.fullscreen {
        (22.0, 12.0)
    } else {
        (12.0, 6.0)
    };

    out.push(DrawPrimitive::Disc {
        center: position,
        radius: halo_radius,
        fill: color.with_alpha(scale(alpha, 255.0 * 0.15)),
    });
    BlipGlyph::for_sound_type(slot.sound_type).push(
        out,
        position,
        glyph_size,
        color.with_alpha(scale(alpha, 255.0)),
    );
}

/// Unit vector for a compass bearing, 0 pointing up the screen.
fn direction(azimuth: f32) -> Vec2 {
    let radians = (azimuth - 90.0).to_radians();
    Vec2::new(radians.cos(), radians.sin())
}

fn line(from: Vec2, to: Vec2, stroke: Rgba) -> DrawPrimitive {
    DrawPrimitive::Line {
        from,
        to,
        stroke,
        width: 1.0,
    }
}

fn scale(factor: f32, max: f32) -> u8 {
    (factor.clamp(0.0, 1.0) * max) as u8
}
