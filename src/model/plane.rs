use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::{CoreError, Result};

/// Number of low bits of the packed key reserved for the timepoint.
pub const T_BITS: u32 = 18;
/// Number of high bits of the packed key reserved for the z-section.
pub const Z_BITS: u32 = 32 - T_BITS;
/// Largest representable z-section (16383).
pub const MAX_Z_SECTION: u32 = (1 << Z_BITS) - 1;
/// Largest representable timepoint (262143).
pub const MAX_TIMEPOINT: u32 = (1 << T_BITS) - 1;

const T_MASK: u32 = MAX_TIMEPOINT;

/// Address of a single 2D plane inside a (z, t) pixel volume.
///
/// Planes are ordered timepoint first, then z-section, so sorting a set of
/// coordinates walks every z-section of a timepoint before moving on to the
/// next timepoint.
///
/// The packed key stores the z-section in the high [`Z_BITS`] bits and the
/// timepoint in the low [`T_BITS`] bits of a `u32`. Values that would not fit
/// are rejected at construction, so two distinct coordinates never share a
/// key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate", into = "RawCoordinate")]
pub struct PlaneCoordinate {
    z: u32,
    t: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawCoordinate {
    z: i64,
    t: i64,
}

impl PlaneCoordinate {
    pub fn new(z: i64, t: i64) -> Result<Self> {
        if z < 0 || t < 0 {
            return Err(CoreError::InvalidCoordinate { z, t });
        }
        let z = checked_component("z", z, MAX_Z_SECTION)?;
        let t = checked_component("t", t, MAX_TIMEPOINT)?;
        Ok(Self { z, t })
    }

    /// Rebuilds a coordinate from a key produced by [`Self::packed_key`].
    pub fn from_packed(key: u32) -> Self {
        Self {
            z: key >> T_BITS,
            t: key & T_MASK,
        }
    }

    /// Callers must already have checked both components against
    /// [`MAX_Z_SECTION`] and [`MAX_TIMEPOINT`].
    pub(crate) fn from_parts(z: u32, t: u32) -> Self {
        debug_assert!(z <= MAX_Z_SECTION && t <= MAX_TIMEPOINT);
        Self { z, t }
    }

    pub fn z_section(&self) -> u32 {
        self.z
    }

    pub fn timepoint(&self) -> u32 {
        self.t
    }

    pub fn packed_key(&self) -> u32 {
        (self.z << T_BITS) | self.t
    }

    pub fn with_z_section(&self, z: i64) -> Result<Self> {
        Self::new(z, i64::from(self.t))
    }

    pub fn with_timepoint(&self, t: i64) -> Result<Self> {
        Self::new(i64::from(self.z), t)
    }
}

fn checked_component(axis: &'static str, value: i64, max: u32) -> Result<u32> {
    match u32::try_from(value) {
        Ok(value) if value <= max => Ok(value),
        _ => Err(CoreError::CoordinateOutOfRange { axis, value, max }),
    }
}

impl Ord for PlaneCoordinate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.t.cmp(&other.t).then_with(|| self.z.cmp(&other.z))
    }
}

impl PartialOrd for PlaneCoordinate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for PlaneCoordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.packed_key());
    }
}

impl fmt::Display for PlaneCoordinate {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "T: {} Z: {}", self.t, self.z)
    }
}

impl TryFrom<RawCoordinate> for PlaneCoordinate {
    type Error = CoreError;

    fn try_from(raw: RawCoordinate) -> Result<Self> {
        Self::new(raw.z, raw.t)
    }
}

impl From<PlaneCoordinate> for RawCoordinate {
    fn from(coordinate: PlaneCoordinate) -> Self {
        Self {
            z: i64::from(coordinate.z),
            t: i64::from(coordinate.t),
        }
    }
}

/// Pixel-space crop applied when rendering a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Intersects the region with a `size_x` by `size_y` image.
    pub fn clamp_to(&self, size_x: u32, size_y: u32) -> Option<Self> {
        let x = self.x.min(size_x);
        let y = self.y.min(size_y);
        let width = self.width.min(size_x - x);
        let height = self.height.min(size_y - y);
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self::new(x, y, width, height))
    }
}

/// Descriptor of the plane to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaneDef {
    pub coordinate: PlaneCoordinate,
    #[serde(default)]
    pub region: Option<Region>,
}

impl PlaneDef {
    pub fn new(coordinate: PlaneCoordinate) -> Self {
        Self {
            coordinate,
            region: None,
        }
    }

    pub fn with_region(coordinate: PlaneCoordinate, region: Region) -> Self {
        Self {
            coordinate,
            region: Some(region),
        }
    }
}
