use std::fs;
use std::path::Path;

use image::GrayImage;
use serde::Serialize;

use super::Result;

/// Writes `value` as YAML for `.yaml`/`.yml` paths and as JSON otherwise.
pub fn save_output(path: impl AsRef<Path>, value: &impl Serialize) -> Result<()> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let serialized = if matches!(extension.as_str(), "yaml" | "yml") {
        serde_yaml::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    fs::write(path, serialized)?;
    Ok(())
}

pub fn save_png(path: impl AsRef<Path>, image: &GrayImage) -> Result<()> {
    image.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}
