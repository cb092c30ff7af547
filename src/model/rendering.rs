use serde::{Deserialize, Serialize};

use super::{PixelsInfo, PlaneCoordinate};

/// Linear intensity window applied to one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelWindow {
    pub start: f64,
    pub end: f64,
    #[serde(default = "active")]
    pub active: bool,
}

fn active() -> bool {
    true
}

impl ChannelWindow {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            active: true,
        }
    }

    /// Maps a raw value into `0..=255`.
    pub fn map(&self, value: f64) -> u8 {
        let span = self.end - self.start;
        if span <= 0.0 {
            return if value >= self.end { u8::MAX } else { 0 };
        }
        let scaled = (value - self.start) / span;
        (scaled.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

/// How raw pixel data of a pixel set is mapped to a displayable image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderingSettings {
    pub pixels_id: u64,
    pub default_plane: PlaneCoordinate,
    pub channels: Vec<ChannelWindow>,
}

impl RenderingSettings {
    /// Settings a pixel set starts out with before anyone edits them.
    pub fn original(info: &PixelsInfo) -> Self {
        let (start, end) = info.pixel_type.default_window();
        Self {
            pixels_id: info.id,
            default_plane: info.default_plane(),
            channels: (0..info.size_c)
                .map(|_| ChannelWindow::new(start, end))
                .collect(),
        }
    }

    pub fn active_channels(&self) -> Vec<usize> {
        self.channels
            .iter()
            .enumerate()
            .filter(|(_, window)| window.active)
            .map(|(index, _)| index)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    MaxIntensity,
    MeanIntensity,
    SumIntensity,
}
