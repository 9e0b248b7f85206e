//! World ↔ screen mapping for rendering and draw culling.
//!
//! A `Transform { center, zoom }` maps world space to normalized device
//! coordinates: `ndc = (world - center) * zoom`. At zoom 1 centered on the
//! origin the world square `[-1, 1]^2` fills the view. `Rect2` is the same
//! mapping expressed as the visible world rectangle.
//!
//! Culling here is for drawing only; physics always sees every particle.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::simulation::params::World;
use crate::simulation::states::NVec2;

/// Relative tolerance for the square check in `Rect2 -> Transform`.
const SQUARE_TOLERANCE: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub center: NVec2,
    pub zoom: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            center: NVec2::zeros(),
            zoom: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect2 {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect2 {
    pub fn center(&self) -> NVec2 {
        NVec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

impl Transform {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.zoom.is_finite() && self.zoom > 0.0) {
            return Err(ConfigError::InvalidViewport(format!("zoom must be positive, got {}", self.zoom)));
        }
        if !(self.center.x.is_finite() && self.center.y.is_finite()) {
            return Err(ConfigError::InvalidViewport("center must be finite".to_string()));
        }
        Ok(())
    }

    #[inline]
    pub fn world_to_normalized(&self, p: &NVec2) -> NVec2 {
        (p - self.center) * self.zoom
    }

    #[inline]
    pub fn normalized_to_world(&self, n: &NVec2) -> NVec2 {
        n / self.zoom + self.center
    }

    /// Visible world rectangle.
    pub fn to_rect(&self) -> Rect2 {
        let half = 1.0 / self.zoom;
        Rect2 {
            x: self.center.x - half,
            y: self.center.y - half,
            width: 2.0 * half,
            height: 2.0 * half,
        }
    }
}

impl TryFrom<Rect2> for Transform {
    type Error = ConfigError;

    /// Only square rectangles with positive size describe a transform.
    fn try_from(rect: Rect2) -> Result<Self, Self::Error> {
        if !(rect.width.is_finite() && rect.height.is_finite() && rect.width > 0.0 && rect.height > 0.0) {
            return Err(ConfigError::InvalidViewport(format!(
                "rect size must be positive, got {} x {}",
                rect.width, rect.height
            )));
        }
        if (rect.width - rect.height).abs() > SQUARE_TOLERANCE * rect.width.max(rect.height) {
            return Err(ConfigError::InvalidViewport(format!(
                "rect must be square, got {} x {}",
                rect.width, rect.height
            )));
        }
        let t = Transform {
            center: rect.center(),
            zoom: 2.0 / rect.width,
        };
        t.validate()?;
        Ok(t)
    }
}

impl From<Transform> for Rect2 {
    fn from(t: Transform) -> Self {
        t.to_rect()
    }
}

/// A transform bound to a pixel surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub transform: Transform,
    pub screen: NVec2, // width, height in pixels
}

impl Viewport {
    pub fn new(transform: Transform, screen: NVec2) -> Result<Self, ConfigError> {
        transform.validate()?;
        if !(screen.x > 0.0 && screen.y > 0.0 && screen.x.is_finite() && screen.y.is_finite()) {
            return Err(ConfigError::InvalidViewport(format!(
                "screen size must be positive, got {} x {}",
                screen.x, screen.y
            )));
        }
        Ok(Self { transform, screen })
    }

    /// Pixel coordinates with the origin top-left and y growing downward.
    pub fn world_to_pixel(&self, p: &NVec2) -> NVec2 {
        let n = self.transform.world_to_normalized(p);
        NVec2::new((n.x + 1.0) * 0.5 * self.screen.x, (1.0 - n.y) * 0.5 * self.screen.y)
    }

    pub fn pixel_to_world(&self, px: &NVec2) -> NVec2 {
        let n = NVec2::new(px.x / self.screen.x * 2.0 - 1.0, 1.0 - px.y / self.screen.y * 2.0);
        self.transform.normalized_to_world(&n)
    }

    /// Whether `p` falls inside the view grown by `margin` normalized units.
    pub fn contains(&self, p: &NVec2, margin: f32) -> bool {
        let n = self.transform.world_to_normalized(p);
        let limit = 1.0 + margin;
        n.x.abs() <= limit && n.y.abs() <= limit
    }

    /// Whether any drawn image of `p` is visible.
    pub fn any_image_visible(&self, p: &NVec2, world: &World, margin: f32) -> bool {
        tile_offsets(world).iter().any(|o| self.contains(&(p + o), margin))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            screen: NVec2::new(800.0, 800.0),
        }
    }
}

/// Offsets of the images a renderer draws so wrapped particles show on both
/// sides of a seam. A single zero offset for an open world.
pub fn tile_offsets(world: &World) -> Vec<NVec2> {
    if !world.wrap {
        return vec![NVec2::zeros()];
    }
    let span = 2.0 * world.half_extent;
    (-1..=1)
        .flat_map(|dy| (-1..=1).map(move |dx| NVec2::new(dx as f32 * span, dy as f32 * span)))
        .collect()
}
