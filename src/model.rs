mod error;
mod object;
mod pixels;
mod plane;
mod rendering;


pub use error::{CoreError, Result};
pub use object::{
    ContainerData, ContainerKind, DataObject, GroupPermissions, ImageData, ObjectKind, ObjectRef,
    Ownership,
};
pub use pixels::{PixelType, PixelsInfo};
pub use plane::{
    MAX_TIMEPOINT, MAX_Z_SECTION, PlaneCoordinate, PlaneDef, Region, T_BITS, Z_BITS,
};
pub use rendering::{ChannelWindow, ProjectionKind, RenderingSettings};
