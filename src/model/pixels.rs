use serde::{Deserialize, Serialize};

use super::{CoreError, MAX_TIMEPOINT, MAX_Z_SECTION, PlaneCoordinate, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PixelType {
    Int8,
    #[default]
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float,
    Double,
}

impl PixelType {
    /// Value range used for the initial rendering window of a channel.
    pub fn default_window(&self) -> (f64, f64) {
        match self {
            PixelType::Int8 => (f64::from(i8::MIN), f64::from(i8::MAX)),
            PixelType::Uint8 => (0.0, f64::from(u8::MAX)),
            PixelType::Int16 => (f64::from(i16::MIN), f64::from(i16::MAX)),
            PixelType::Uint16 => (0.0, f64::from(u16::MAX)),
            PixelType::Int32 => (f64::from(i32::MIN), f64::from(i32::MAX)),
            PixelType::Uint32 => (0.0, f64::from(u32::MAX)),
            PixelType::Float | PixelType::Double => (0.0, 1.0),
        }
    }
}

/// Dimensions of a pixel set stored on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelsInfo {
    pub id: u64,
    pub size_x: u32,
    pub size_y: u32,
    #[serde(default = "one")]
    pub size_z: u32,
    #[serde(default = "one")]
    pub size_t: u32,
    #[serde(default = "one")]
    pub size_c: u32,
    #[serde(default)]
    pub pixel_type: PixelType,
}

fn one() -> u32 {
    1
}

impl PixelsInfo {
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("size_x", self.size_x),
            ("size_y", self.size_y),
            ("size_z", self.size_z),
            ("size_t", self.size_t),
            ("size_c", self.size_c),
        ];
        for (name, size) in sizes {
            if size == 0 {
                return Err(CoreError::InvalidMetadata(format!(
                    "pixels {}: {name} must be positive",
                    self.id
                )));
            }
        }
        if self.size_z - 1 > MAX_Z_SECTION || self.size_t - 1 > MAX_TIMEPOINT {
            return Err(CoreError::InvalidMetadata(format!(
                "pixels {}: {}x{} (z, t) planes exceed the addressable plane range",
                self.id, self.size_z, self.size_t
            )));
        }
        Ok(())
    }

    pub fn contains(&self, coordinate: &PlaneCoordinate) -> bool {
        coordinate.z_section() < self.size_z && coordinate.timepoint() < self.size_t
    }

    pub fn plane_count(&self) -> usize {
        self.size_z as usize * self.size_t as usize
    }

    /// All plane coordinates of the volume in display order.
    pub fn planes(&self) -> Vec<PlaneCoordinate> {
        let mut planes = Vec::with_capacity(self.plane_count());
        for t in 0..self.size_t {
            for z in 0..self.size_z {
                planes.push(PlaneCoordinate::from_parts(z, t));
            }
        }
        planes
    }

    /// Coordinate of the middle z-section at the first timepoint.
    pub fn default_plane(&self) -> PlaneCoordinate {
        PlaneCoordinate::from_parts(self.size_z / 2, 0)
    }
}
