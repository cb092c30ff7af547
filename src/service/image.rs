use std::collections::BTreeMap;

use image::GrayImage;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::model::{
    ContainerKind, PixelsInfo, PlaneCoordinate, PlaneDef, ProjectionKind, RenderingSettings,
};

use super::Result;

/// Client-side view of the server's rendering engine for one pixel set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderingControl {
    pub pixels: PixelsInfo,
    pub settings: RenderingSettings,
}

impl RenderingControl {
    pub fn default_plane(&self) -> PlaneDef {
        PlaneDef::new(self.settings.default_plane)
    }
}

/// Ids a batch rendering-settings call succeeded and failed on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsOutcome {
    pub applied: Vec<u64>,
    pub failed: Vec<u64>,
}

/// Remote image and rendering service.
pub trait ImageService: Send + Sync {
    fn load_rendering_control(&self, pixels_id: u64) -> Result<RenderingControl>;

    fn render_image(&self, pixels_id: u64, plane: &PlaneDef) -> Result<GrayImage>;

    /// Raw values of one channel of one plane, indexed `[y, x]`.
    fn get_plane(
        &self,
        pixels_id: u64,
        coordinate: PlaneCoordinate,
        channel: u32,
    ) -> Result<Array2<f64>>;

    fn get_thumbnail(
        &self,
        pixels_id: u64,
        size_x: u32,
        size_y: u32,
        user_id: u64,
        group_id: u64,
    ) -> Result<GrayImage>;

    /// Thumbnails whose longest side is `max_length`. Pixel sets that the
    /// caller cannot read, or that cannot be rendered, are left out of the
    /// map; a failure of the call itself is returned as an error.
    fn get_thumbnail_set(
        &self,
        pixels_ids: &[u64],
        max_length: u32,
        user_id: u64,
        group_id: u64,
    ) -> Result<BTreeMap<u64, GrayImage>>;

    fn render_projected(
        &self,
        pixels_id: u64,
        start_z: u32,
        end_z: u32,
        stepping: u32,
        kind: ProjectionKind,
        channels: &[u32],
    ) -> Result<GrayImage>;

    fn get_rendering_settings(&self, pixels_id: u64) -> Result<RenderingSettings>;

    fn paste_rendering_settings(
        &self,
        from_pixels_id: u64,
        kind: ContainerKind,
        node_ids: &[u64],
    ) -> Result<SettingsOutcome>;

    fn reset_rendering_settings(
        &self,
        kind: ContainerKind,
        node_ids: &[u64],
    ) -> Result<SettingsOutcome>;

    fn set_original_rendering_settings(
        &self,
        kind: ContainerKind,
        node_ids: &[u64],
    ) -> Result<SettingsOutcome>;

    /// Releases the rendering engine held for `pixels_id`.
    fn shut_down(&self, pixels_id: u64);
}
