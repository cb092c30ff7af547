use serde::Serialize;

use crate::model::Region;

pub const MIN_LENS_SIZE: u32 = 20;
pub const MAX_LENS_SIZE: u32 = 150;
pub const DEFAULT_LENS_SIZE: u32 = 50;
pub const MIN_ZOOM_FACTOR: f32 = 1.0;
pub const MAX_ZOOM_FACTOR: f32 = 10.0;

/// Below this on-screen size the crosshair and the border grip shrink.
pub const CROSSHAIR_SNAP: u32 = 30;
const SNAPPED_CROSSHAIR: u32 = 6;
const UNSNAPPED_CROSSHAIR: u32 = 8;
const SNAPPED_PICK_SIZE: u32 = 4;
const UNSNAPPED_PICK_SIZE: u32 = 8;

/// Edge or corner of the lens grabbed for resizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeDirection {
    North,
    NorthWest,
    NorthEast,
    South,
    SouthWest,
    SouthEast,
    East,
    West,
}

/// Magnifying lens over an image.
///
/// Position and size are in image pixels. Pick tests take points relative to
/// the lens as drawn on screen, that is scaled by the image zoom factor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LensModel {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    image_width: u32,
    image_height: u32,
    zoom_factor: f32,
    image_zoom_factor: f32,
}

impl LensModel {
    pub fn new(image_width: u32, image_height: u32) -> Self {
        let mut lens = Self {
            x: 0,
            y: 0,
            width: DEFAULT_LENS_SIZE,
            height: DEFAULT_LENS_SIZE,
            image_width: image_width.max(1),
            image_height: image_height.max(1),
            zoom_factor: 2.0,
            image_zoom_factor: 1.0,
        };
        lens.constrain();
        lens
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn zoom_factor(&self) -> f32 {
        self.zoom_factor
    }

    /// Area of the image under the lens.
    pub fn region(&self) -> Region {
        Region::new(self.x, self.y, self.width, self.height)
    }

    pub fn set_image_size(&mut self, image_width: u32, image_height: u32) {
        self.image_width = image_width.max(1);
        self.image_height = image_height.max(1);
        self.constrain();
    }

    /// Moves the lens, keeping it fully on the image.
    pub fn set_location(&mut self, x: i64, y: i64) {
        self.x = clamp_axis(x, self.image_width - self.width);
        self.y = clamp_axis(y, self.image_height - self.height);
    }

    /// Centres the lens on an image point.
    pub fn center_on(&mut self, x: i64, y: i64) {
        self.set_location(
            x - i64::from(self.width / 2),
            y - i64::from(self.height / 2),
        );
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.constrain();
    }

    pub fn set_zoom_factor(&mut self, zoom_factor: f32) {
        self.zoom_factor = zoom_factor.clamp(MIN_ZOOM_FACTOR, MAX_ZOOM_FACTOR);
    }

    /// One wheel tick changes the zoom by one step.
    pub fn zoom_by_ticks(&mut self, ticks: i32) {
        self.set_zoom_factor(self.zoom_factor + ticks as f32);
    }

    /// Zoom of the viewer showing the image the lens sits on.
    pub fn set_image_zoom_factor(&mut self, image_zoom_factor: f32) {
        if image_zoom_factor.is_finite() && image_zoom_factor > 0.0 {
            self.image_zoom_factor = image_zoom_factor;
        }
    }

    /// Size of the magnified image shown in the zoom window.
    pub fn zoomed_size(&self) -> (u32, u32) {
        (
            (self.width as f32 * self.zoom_factor).round() as u32,
            (self.height as f32 * self.zoom_factor).round() as u32,
        )
    }

    /// Scroll offset that centres the zoomed image in a viewport.
    pub fn zoom_view_position(&self, viewport_width: u32, viewport_height: u32) -> (u32, u32) {
        let (width, height) = self.zoomed_size();
        (
            (width / 2).saturating_sub(viewport_width / 2),
            (height / 2).saturating_sub(viewport_height / 2),
        )
    }

    /// Lens size on screen.
    pub fn scaled_size(&self) -> (u32, u32) {
        (
            (self.width as f32 * self.image_zoom_factor).round() as u32,
            (self.height as f32 * self.image_zoom_factor).round() as u32,
        )
    }

    fn is_snapped(&self) -> bool {
        let (width, height) = self.scaled_size();
        width.min(height) < CROSSHAIR_SNAP
    }

    pub fn crosshair_length(&self) -> u32 {
        if self.is_snapped() {
            SNAPPED_CROSSHAIR
        } else {
            UNSNAPPED_CROSSHAIR
        }
    }

    pub fn crosshair_tick(&self) -> u32 {
        self.crosshair_length() / 2 - 1
    }

    /// Width of the band along the border that grabs the lens for resizing.
    pub fn border_pick_size(&self) -> u32 {
        if self.is_snapped() {
            SNAPPED_PICK_SIZE
        } else {
            UNSNAPPED_PICK_SIZE
        }
    }

    /// The point falls inside the lens, away from its border band.
    pub fn lens_picked(&self, x: i64, y: i64) -> bool {
        let pick = i64::from(self.border_pick_size());
        let (width, height) = self.scaled_size();
        let (width, height) = (i64::from(width), i64::from(height));
        x >= pick && y >= pick && x < width - pick && y < height - pick
    }

    pub fn border_picked(&self, x: i64, y: i64) -> bool {
        let (width, height) = self.scaled_size();
        let inside = x >= 0 && y >= 0 && x < i64::from(width) && y < i64::from(height);
        inside && !self.lens_picked(x, y)
    }

    /// Resize handle under a point, if any. Corners only count within the
    /// border band.
    pub fn pick_direction(&self, x: i64, y: i64) -> Option<ResizeDirection> {
        let pick = i64::from(self.border_pick_size());
        let (width, height) = self.scaled_size();
        let (width, height) = (i64::from(width), i64::from(height));
        let near_top = |value: i64| value < pick;
        let near_bottom = |value: i64| value > height - pick;

        if x <= pick {
            Some(if near_top(y) {
                ResizeDirection::NorthWest
            } else if near_bottom(y) {
                ResizeDirection::SouthWest
            } else {
                ResizeDirection::West
            })
        } else if x >= width - pick {
            Some(if near_top(y) {
                ResizeDirection::NorthEast
            } else if near_bottom(y) {
                ResizeDirection::SouthEast
            } else {
                ResizeDirection::East
            })
        } else if y <= pick {
            Some(ResizeDirection::North)
        } else if y >= height - pick {
            Some(ResizeDirection::South)
        } else {
            None
        }
    }

    /// Drags one edge or corner by an offset in image pixels. The opposite
    /// edge stays put unless the size limits push it.
    pub fn resize(&mut self, direction: ResizeDirection, dx: i64, dy: i64) {
        use ResizeDirection::*;

        let mut left = i64::from(self.x);
        let mut top = i64::from(self.y);
        let mut right = left + i64::from(self.width);
        let mut bottom = top + i64::from(self.height);
        let (min, max) = (i64::from(MIN_LENS_SIZE), i64::from(MAX_LENS_SIZE));
        if matches!(direction, West | NorthWest | SouthWest) {
            left = (left + dx).clamp(right - max, right - min).max(0);
        }
        if matches!(direction, East | NorthEast | SouthEast) {
            right = (right + dx).clamp(left + min, left + max);
        }
        if matches!(direction, North | NorthWest | NorthEast) {
            top = (top + dy).clamp(bottom - max, bottom - min).max(0);
        }
        if matches!(direction, South | SouthWest | SouthEast) {
            bottom = (bottom + dy).clamp(top + min, top + max);
        }

        self.x = clamp_axis(left, self.image_width);
        self.y = clamp_axis(top, self.image_height);
        self.width = clamp_axis(right - left, u32::MAX);
        self.height = clamp_axis(bottom - top, u32::MAX);
        self.constrain();
    }

    fn constrain(&mut self) {
        let max_width = MAX_LENS_SIZE.min(self.image_width);
        let max_height = MAX_LENS_SIZE.min(self.image_height);
        self.width = self.width.clamp(MIN_LENS_SIZE.min(max_width), max_width);
        self.height = self.height.clamp(MIN_LENS_SIZE.min(max_height), max_height);
        self.x = self.x.min(self.image_width - self.width);
        self.y = self.y.min(self.image_height - self.height);
    }
}

fn clamp_axis(value: i64, max: u32) -> u32 {
    u32::try_from(value.clamp(0, i64::from(max))).unwrap_or(max)
}
