use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread;
use std::time::Duration;

use image::GrayImage;
use image::imageops::{self, FilterType};
use ndarray::{Array2, Array5, Axis, s};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::model::{
    ContainerKind, DataObject, ImageData, ObjectKind, Ownership, PixelsInfo, PlaneCoordinate,
    PlaneDef, ProjectionKind, Region, RenderingSettings,
};

use super::{
    Catalog, DataService, ImageService, RenderingControl, Result, ServiceError, SettingsOutcome,
};

/// Where the values of a pixel set come from.
#[derive(Debug, Clone)]
enum Voxels {
    /// Computed per plane on request, so catalogue entries of any size cost
    /// nothing until rendered.
    Gradient,
    /// Explicit values, indexed `[t, z, c, y, x]`.
    Stored(Array5<f64>),
}

#[derive(Debug, Clone)]
struct PixelVolume {
    info: PixelsInfo,
    owner: Ownership,
    voxels: Voxels,
}

impl PixelVolume {
    fn gradient(info: PixelsInfo, owner: Ownership) -> Self {
        Self {
            info,
            owner,
            voxels: Voxels::Gradient,
        }
    }

    /// Diagonal ramp across each plane, shifted per z-section, timepoint and
    /// channel so that neighbouring planes render differently. Increases
    /// along every axis.
    fn gradient_value(&self, t: usize, z: usize, c: usize, y: usize, x: usize) -> f64 {
        let info = &self.info;
        let (low, high) = info.pixel_type.default_window();
        let diagonal = f64::from((info.size_x + info.size_y).saturating_sub(2).max(1));
        let ramp = (x + y) as f64 / diagonal;
        let shift = z as f64 / f64::from(info.size_z)
            + t as f64 / f64::from(info.size_t)
            + c as f64 / f64::from(info.size_c);
        let fraction = (ramp + 0.25 * shift) / 1.75;
        low + fraction * (high - low)
    }

    fn plane(&self, coordinate: PlaneCoordinate, channel: usize) -> Array2<f64> {
        let t = coordinate.timepoint() as usize;
        let z = coordinate.z_section() as usize;
        match &self.voxels {
            Voxels::Gradient => {
                let shape = (self.info.size_y as usize, self.info.size_x as usize);
                Array2::from_shape_fn(shape, |(y, x)| self.gradient_value(t, z, channel, y, x))
            }
            Voxels::Stored(data) => data.slice(s![t, z, channel, .., ..]).to_owned(),
        }
    }

    fn min_max(&self, channel: usize) -> (f64, f64) {
        match &self.voxels {
            Voxels::Gradient => {
                let last = |size: u32| size.saturating_sub(1) as usize;
                let info = &self.info;
                (
                    self.gradient_value(0, 0, channel, 0, 0),
                    self.gradient_value(
                        last(info.size_t),
                        last(info.size_z),
                        channel,
                        last(info.size_y),
                        last(info.size_x),
                    ),
                )
            }
            Voxels::Stored(data) => data.index_axis(Axis(2), channel).iter().fold(
                (f64::MAX, f64::MIN),
                |(min, max), value| (min.min(*value), max.max(*value)),
            ),
        }
    }
}

#[derive(Debug, Default)]
struct GatewayState {
    roots: Vec<DataObject>,
    volumes: HashMap<u64, PixelVolume>,
    settings: HashMap<u64, RenderingSettings>,
    engines: BTreeSet<u64>,
}

impl GatewayState {
    fn volume(&self, pixels_id: u64) -> Result<&PixelVolume> {
        self.volumes.get(&pixels_id).ok_or(ServiceError::NotFound {
            kind: ObjectKind::Image,
            id: pixels_id,
        })
    }

    fn settings_for(&self, volume: &PixelVolume) -> RenderingSettings {
        self.settings
            .get(&volume.info.id)
            .cloned()
            .unwrap_or_else(|| RenderingSettings::original(&volume.info))
    }

    fn find_container(&self, kind: ContainerKind, id: u64) -> Option<&DataObject> {
        let mut found = None;
        for root in &self.roots {
            root.walk(&mut |object| {
                if found.is_none() && object.container_kind() == Some(kind) && object.id() == id {
                    found = Some(object);
                }
            });
            if found.is_some() {
                break;
            }
        }
        found
    }

    fn containers_of_kind(&self, kind: ContainerKind) -> Vec<&DataObject> {
        let mut found = Vec::new();
        for root in &self.roots {
            root.walk(&mut |object| {
                if object.container_kind() == Some(kind) {
                    found.push(object);
                }
            });
        }
        found
    }

    /// Pixel ids of every image held by the given containers.
    fn pixels_under(&self, kind: ContainerKind, node_ids: &[u64]) -> Result<BTreeSet<u64>> {
        let mut pixels = BTreeSet::new();
        for id in node_ids {
            let container = self.find_container(kind, *id).ok_or(ServiceError::NotFound {
                kind: ObjectKind::Container(kind),
                id: *id,
            })?;
            container.walk(&mut |object| {
                if let DataObject::Image(ImageData {
                    pixels: Some(info), ..
                }) = object
                {
                    pixels.insert(info.id);
                }
            });
        }
        Ok(pixels)
    }
}

/// Copy of `object` holding only the descendants readable by the user.
fn readable_subtree(object: &DataObject, user_id: u64, group_id: u64) -> DataObject {
    let mut copy = object.clone();
    if let Some(data) = copy.container_mut()
        && let Some(children) = data.children.as_mut()
    {
        *children = children
            .iter()
            .filter(|child| child.is_readable_by(user_id, group_id))
            .map(|child| readable_subtree(child, user_id, group_id))
            .collect();
    }
    copy
}

fn render_channels(
    volume: &PixelVolume,
    settings: &RenderingSettings,
    channels: &[usize],
    mut plane_for: impl FnMut(usize) -> Array2<f64>,
    window_scale: f64,
) -> Result<Array2<u8>> {
    if channels.is_empty() {
        return Err(ServiceError::Rendering(format!(
            "pixels {} has no active channel",
            volume.info.id
        )));
    }
    let shape = (volume.info.size_y as usize, volume.info.size_x as usize);
    let mut rendered = Array2::<u8>::zeros(shape);
    for channel in channels {
        let window = settings.channels.get(*channel).ok_or_else(|| {
            ServiceError::Rendering(format!(
                "pixels {} has no channel {channel}",
                volume.info.id
            ))
        })?;
        let mut window = *window;
        window.start *= window_scale;
        window.end *= window_scale;
        let plane = plane_for(*channel);
        rendered.zip_mut_with(&plane, |out, value| {
            *out = (*out).max(window.map(*value));
        });
    }
    Ok(rendered)
}

fn to_gray_image(values: &Array2<u8>, region: Option<Region>) -> Result<GrayImage> {
    let (height, width) = values.dim();
    let region = match region {
        Some(region) => region
            .clamp_to(width as u32, height as u32)
            .ok_or_else(|| ServiceError::Rendering("region lies outside the plane".into()))?,
        None => Region::new(0, 0, width as u32, height as u32),
    };
    Ok(GrayImage::from_fn(region.width, region.height, |x, y| {
        image::Luma([values[[(region.y + y) as usize, (region.x + x) as usize]]])
    }))
}

/// Service double holding a [`Catalog`] in memory.
///
/// Pixel sets listed in the catalogue serve a synthetic gradient computed
/// plane by plane; tests can replace them through
/// [`InMemoryGateway::insert_pixels`].
#[derive(Debug)]
pub struct InMemoryGateway {
    state: RwLock<GatewayState>,
    available: AtomicBool,
    latency_ms: AtomicU64,
    calls: AtomicUsize,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new(Catalog::default())
    }
}

impl InMemoryGateway {
    pub fn new(catalog: Catalog) -> Self {
        let mut state = GatewayState::default();
        for root in &catalog.objects {
            root.walk(&mut |object| {
                if let DataObject::Image(ImageData {
                    pixels: Some(info),
                    owner,
                    ..
                }) = object
                {
                    state
                        .volumes
                        .entry(info.id)
                        .or_insert_with(|| PixelVolume::gradient(info.clone(), *owner));
                }
            });
        }
        state.roots = catalog.objects;
        Self {
            state: RwLock::new(state),
            available: AtomicBool::new(true),
            latency_ms: AtomicU64::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Replaces the raw values of a pixel set. `data` is indexed `[t, z, c, y, x]`.
    pub fn insert_pixels(
        &self,
        info: PixelsInfo,
        owner: Ownership,
        data: Array5<f64>,
    ) -> Result<()> {
        info.validate()?;
        let expected = (
            info.size_t as usize,
            info.size_z as usize,
            info.size_c as usize,
            info.size_y as usize,
            info.size_x as usize,
        );
        if data.dim() != expected {
            return Err(ServiceError::InvalidRequest(format!(
                "pixels {} data shape {:?} does not match {:?}",
                info.id,
                data.dim(),
                expected
            )));
        }
        let mut state = self.write_state()?;
        state.settings.remove(&info.id);
        state.volumes.insert(
            info.id,
            PixelVolume {
                info,
                owner,
                voxels: Voxels::Stored(data),
            },
        );
        Ok(())
    }

    /// Simulates the server going away or coming back.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Delay added to every call.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of remote calls served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn has_rendering_engine(&self, pixels_id: u64) -> bool {
        self.read_state()
            .map(|state| state.engines.contains(&pixels_id))
            .unwrap_or(false)
    }

    fn begin_call(&self, name: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            thread::sleep(Duration::from_millis(latency));
        }
        if !self.available.load(Ordering::SeqCst) {
            warn!(call = name, "gateway offline");
            return Err(ServiceError::ServiceUnavailable(format!(
                "{name}: gateway is offline"
            )));
        }
        debug!(call = name, "serving remote call");
        Ok(())
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, GatewayState>> {
        self.state
            .read()
            .map_err(|_| ServiceError::ServiceUnavailable("gateway state poisoned".into()))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, GatewayState>> {
        self.state
            .write()
            .map_err(|_| ServiceError::ServiceUnavailable("gateway state poisoned".into()))
    }

    fn check_readable(volume: &PixelVolume, user_id: u64, group_id: u64) -> Result<()> {
        if volume.owner.is_readable_by(user_id, group_id) {
            Ok(())
        } else {
            Err(ServiceError::AccessDenied(format!(
                "user {user_id} cannot read pixels {}",
                volume.info.id
            )))
        }
    }

    fn render_default(&self, pixels_id: u64, user_id: u64, group_id: u64) -> Result<GrayImage> {
        let state = self.read_state()?;
        let volume = state.volume(pixels_id)?;
        Self::check_readable(volume, user_id, group_id)?;
        let settings = state.settings_for(volume);
        let plane = settings.default_plane;
        let rendered = render_channels(
            volume,
            &settings,
            &settings.active_channels(),
            |channel| volume.plane(plane, channel),
            1.0,
        )?;
        to_gray_image(&rendered, None)
    }

    fn apply_settings(
        &self,
        kind: ContainerKind,
        node_ids: &[u64],
        mut make: impl FnMut(&PixelVolume) -> Option<RenderingSettings>,
    ) -> Result<SettingsOutcome> {
        let mut state = self.write_state()?;
        let targets = state.pixels_under(kind, node_ids)?;
        let mut outcome = SettingsOutcome::default();
        let mut updates = Vec::new();
        for pixels_id in targets {
            match state.volumes.get(&pixels_id).and_then(&mut make) {
                Some(settings) => {
                    updates.push(settings);
                    outcome.applied.push(pixels_id);
                }
                None => outcome.failed.push(pixels_id),
            }
        }
        for settings in updates {
            state.settings.insert(settings.pixels_id, settings);
        }
        Ok(outcome)
    }
}

impl ImageService for InMemoryGateway {
    fn load_rendering_control(&self, pixels_id: u64) -> Result<RenderingControl> {
        self.begin_call("load_rendering_control")?;
        let mut state = self.write_state()?;
        let volume = state.volume(pixels_id)?;
        let control = RenderingControl {
            pixels: volume.info.clone(),
            settings: state.settings_for(volume),
        };
        state.engines.insert(pixels_id);
        Ok(control)
    }

    fn render_image(&self, pixels_id: u64, plane: &PlaneDef) -> Result<GrayImage> {
        self.begin_call("render_image")?;
        let state = self.read_state()?;
        let volume = state.volume(pixels_id)?;
        if !volume.info.contains(&plane.coordinate) {
            return Err(ServiceError::Rendering(format!(
                "plane {} is outside pixels {}",
                plane.coordinate, pixels_id
            )));
        }
        let settings = state.settings_for(volume);
        let rendered = render_channels(
            volume,
            &settings,
            &settings.active_channels(),
            |channel| volume.plane(plane.coordinate, channel),
            1.0,
        )?;
        to_gray_image(&rendered, plane.region)
    }

    fn get_plane(
        &self,
        pixels_id: u64,
        coordinate: PlaneCoordinate,
        channel: u32,
    ) -> Result<Array2<f64>> {
        self.begin_call("get_plane")?;
        let state = self.read_state()?;
        let volume = state.volume(pixels_id)?;
        if !volume.info.contains(&coordinate) || channel >= volume.info.size_c {
            return Err(ServiceError::InvalidRequest(format!(
                "plane {coordinate} channel {channel} is outside pixels {pixels_id}"
            )));
        }
        Ok(volume.plane(coordinate, channel as usize))
    }

    fn get_thumbnail(
        &self,
        pixels_id: u64,
        size_x: u32,
        size_y: u32,
        user_id: u64,
        group_id: u64,
    ) -> Result<GrayImage> {
        self.begin_call("get_thumbnail")?;
        if size_x == 0 || size_y == 0 {
            return Err(ServiceError::InvalidRequest(
                "thumbnail size must be positive".into(),
            ));
        }
        let full = self.render_default(pixels_id, user_id, group_id)?;
        Ok(imageops::resize(&full, size_x, size_y, FilterType::Triangle))
    }

    fn get_thumbnail_set(
        &self,
        pixels_ids: &[u64],
        max_length: u32,
        user_id: u64,
        group_id: u64,
    ) -> Result<BTreeMap<u64, GrayImage>> {
        self.begin_call("get_thumbnail_set")?;
        if max_length == 0 {
            return Err(ServiceError::InvalidRequest(
                "thumbnail length must be positive".into(),
            ));
        }
        Ok(pixels_ids
            .par_iter()
            .filter_map(|pixels_id| {
                let full = match self.render_default(*pixels_id, user_id, group_id) {
                    Ok(full) => full,
                    Err(error) => {
                        debug!(pixels_id = *pixels_id, %error, "thumbnail left out of the set");
                        return None;
                    }
                };
                let (width, height) = full.dimensions();
                let longest = width.max(height).max(1);
                let scale = f64::from(max_length) / f64::from(longest);
                let size_x = ((f64::from(width) * scale).round() as u32).max(1);
                let size_y = ((f64::from(height) * scale).round() as u32).max(1);
                Some((
                    *pixels_id,
                    imageops::resize(&full, size_x, size_y, FilterType::Triangle),
                ))
            })
            .collect())
    }

    fn render_projected(
        &self,
        pixels_id: u64,
        start_z: u32,
        end_z: u32,
        stepping: u32,
        kind: ProjectionKind,
        channels: &[u32],
    ) -> Result<GrayImage> {
        self.begin_call("render_projected")?;
        let state = self.read_state()?;
        let volume = state.volume(pixels_id)?;
        if start_z > end_z || end_z >= volume.info.size_z || stepping == 0 {
            return Err(ServiceError::InvalidRequest(format!(
                "projection range {start_z}..={end_z} step {stepping} is invalid for {} z-sections",
                volume.info.size_z
            )));
        }
        let settings = state.settings_for(volume);
        let channels: Vec<usize> = if channels.is_empty() {
            settings.active_channels()
        } else {
            channels.iter().map(|channel| *channel as usize).collect()
        };
        let timepoint = settings.default_plane.timepoint();
        let sections: Vec<u32> = (start_z..=end_z).step_by(stepping as usize).collect();
        let count = sections.len() as f64;
        let window_scale = match kind {
            ProjectionKind::SumIntensity => count,
            ProjectionKind::MaxIntensity | ProjectionKind::MeanIntensity => 1.0,
        };
        let rendered = render_channels(
            volume,
            &settings,
            &channels,
            |channel| {
                let shape = (volume.info.size_y as usize, volume.info.size_x as usize);
                let initial = match kind {
                    ProjectionKind::MaxIntensity => Array2::from_elem(shape, f64::MIN),
                    _ => Array2::zeros(shape),
                };
                let projected = sections.iter().fold(initial, |mut acc, z| {
                    let plane = volume.plane(PlaneCoordinate::from_parts(*z, timepoint), channel);
                    match kind {
                        ProjectionKind::MaxIntensity => {
                            acc.zip_mut_with(&plane, |a, v| *a = a.max(*v))
                        }
                        _ => acc += &plane,
                    }
                    acc
                });
                match kind {
                    ProjectionKind::MeanIntensity => projected / count,
                    _ => projected,
                }
            },
            window_scale,
        )?;
        to_gray_image(&rendered, None)
    }

    fn get_rendering_settings(&self, pixels_id: u64) -> Result<RenderingSettings> {
        self.begin_call("get_rendering_settings")?;
        let state = self.read_state()?;
        let volume = state.volume(pixels_id)?;
        Ok(state.settings_for(volume))
    }

    fn paste_rendering_settings(
        &self,
        from_pixels_id: u64,
        kind: ContainerKind,
        node_ids: &[u64],
    ) -> Result<SettingsOutcome> {
        self.begin_call("paste_rendering_settings")?;
        let source = {
            let state = self.read_state()?;
            let volume = state.volume(from_pixels_id)?;
            state.settings_for(volume)
        };
        self.apply_settings(kind, node_ids, |volume| {
            if volume.info.size_c as usize != source.channels.len()
                || !volume.info.contains(&source.default_plane)
            {
                return None;
            }
            Some(RenderingSettings {
                pixels_id: volume.info.id,
                ..source.clone()
            })
        })
    }

    fn reset_rendering_settings(
        &self,
        kind: ContainerKind,
        node_ids: &[u64],
    ) -> Result<SettingsOutcome> {
        self.begin_call("reset_rendering_settings")?;
        self.apply_settings(kind, node_ids, |volume| {
            let mut settings = RenderingSettings::original(&volume.info);
            for (channel, window) in settings.channels.iter_mut().enumerate() {
                let (min, max) = volume.min_max(channel);
                window.start = min;
                window.end = max;
            }
            Some(settings)
        })
    }

    fn set_original_rendering_settings(
        &self,
        kind: ContainerKind,
        node_ids: &[u64],
    ) -> Result<SettingsOutcome> {
        self.begin_call("set_original_rendering_settings")?;
        self.apply_settings(kind, node_ids, |volume| {
            Some(RenderingSettings::original(&volume.info))
        })
    }

    fn shut_down(&self, pixels_id: u64) {
        if let Ok(mut state) = self.write_state() {
            state.engines.remove(&pixels_id);
        }
    }
}

impl DataService for InMemoryGateway {
    fn load_hierarchy(
        &self,
        kind: ContainerKind,
        ids: &[u64],
        user_id: u64,
        group_id: u64,
    ) -> Result<Vec<DataObject>> {
        self.begin_call("load_hierarchy")?;
        let state = self.read_state()?;
        if ids.is_empty() {
            return Ok(state
                .containers_of_kind(kind)
                .into_iter()
                .filter(|object| object.is_readable_by(user_id, group_id))
                .map(|object| readable_subtree(object, user_id, group_id))
                .collect());
        }
        ids.iter()
            .map(|id| {
                let object = state.find_container(kind, *id).ok_or(ServiceError::NotFound {
                    kind: ObjectKind::Container(kind),
                    id: *id,
                })?;
                if !object.is_readable_by(user_id, group_id) {
                    return Err(ServiceError::AccessDenied(format!(
                        "user {user_id} cannot read {kind:?} {id}"
                    )));
                }
                Ok(readable_subtree(object, user_id, group_id))
            })
            .collect()
    }

    fn get_collection_count(
        &self,
        kind: ContainerKind,
        ids: &[u64],
    ) -> Result<BTreeMap<u64, usize>> {
        self.begin_call("get_collection_count")?;
        let state = self.read_state()?;
        ids.iter()
            .map(|id| {
                state
                    .find_container(kind, *id)
                    .map(|object| (*id, object.image_count()))
                    .ok_or(ServiceError::NotFound {
                        kind: ObjectKind::Container(kind),
                        id: *id,
                    })
            })
            .collect()
    }
}
