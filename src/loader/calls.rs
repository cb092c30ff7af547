use std::collections::BTreeMap;

use image::GrayImage;
use serde::Serialize;

use crate::model::{ContainerKind, DataObject, ObjectKind, ObjectRef, PlaneDef};
use crate::service::{Gateway, RenderingControl, Result as ServiceResult, SettingsOutcome};

use super::{LoadCall, LoaderError, Result};

/// Loads containers of one kind together with their children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyCall {
    pub kind: ContainerKind,
    pub ids: Vec<u64>,
    pub user_id: u64,
    pub group_id: u64,
}

impl HierarchyCall {
    /// Every readable container of `kind`.
    pub fn roots(kind: ContainerKind, user_id: u64, group_id: u64) -> Self {
        Self {
            kind,
            ids: Vec::new(),
            user_id,
            group_id,
        }
    }

    /// Reloads the container hosted by `node`.
    pub fn for_node(node: &DataObject, user_id: u64, group_id: u64) -> Result<Self> {
        let kind = node.container_kind().ok_or_else(|| {
            LoaderError::InvalidArgument(format!("image {} has no hierarchy to browse", node.id()))
        })?;
        Ok(Self {
            kind,
            ids: vec![node.id()],
            user_id,
            group_id,
        })
    }
}

impl LoadCall for HierarchyCall {
    type Output = Vec<DataObject>;

    fn description(&self) -> String {
        format!("Loading {:?} hierarchy", self.kind)
    }

    fn execute(self, gateway: &Gateway) -> ServiceResult<Self::Output> {
        gateway
            .data_service()
            .load_hierarchy(self.kind, &self.ids, self.user_id, self.group_id)
    }
}

/// Image counts per container, as returned by [`ContainerCountCall`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerCounts {
    pub kind: ContainerKind,
    pub counts: BTreeMap<u64, usize>,
}

/// Counts the images held by a set of datasets or tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerCountCall {
    kind: ContainerKind,
    ids: Vec<u64>,
}

impl ContainerCountCall {
    /// Only datasets and tags can be counted, and all roots must share a kind
    /// so the counts go out in a single call.
    pub fn new(roots: &[ObjectRef]) -> Result<Self> {
        let mut kind = None;
        let mut ids = Vec::with_capacity(roots.len());
        for root in roots {
            let root_kind = match root.kind {
                ObjectKind::Container(kind @ (ContainerKind::Dataset | ContainerKind::Tag)) => kind,
                other => {
                    return Err(LoaderError::InvalidArgument(format!(
                        "{other:?} {} has no countable items",
                        root.id
                    )));
                }
            };
            match kind {
                None => kind = Some(root_kind),
                Some(existing) if existing != root_kind => {
                    return Err(LoaderError::InvalidArgument(format!(
                        "cannot count {existing:?} and {root_kind:?} containers together"
                    )));
                }
                Some(_) => {}
            }
            if !ids.contains(&root.id) {
                ids.push(root.id);
            }
        }
        let kind =
            kind.ok_or_else(|| LoaderError::InvalidArgument("no root containers".into()))?;
        Ok(Self { kind, ids })
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }
}

impl LoadCall for ContainerCountCall {
    type Output = ContainerCounts;

    fn description(&self) -> String {
        "Counting items.".to_string()
    }

    fn execute(self, gateway: &Gateway) -> ServiceResult<Self::Output> {
        let counts = gateway
            .data_service()
            .get_collection_count(self.kind, &self.ids)?;
        Ok(ContainerCounts {
            kind: self.kind,
            counts,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderingControlCall {
    pub pixels_id: u64,
}

impl LoadCall for RenderingControlCall {
    type Output = RenderingControl;

    fn description(&self) -> String {
        format!("Loading rendering control for pixels {}", self.pixels_id)
    }

    fn execute(self, gateway: &Gateway) -> ServiceResult<Self::Output> {
        gateway.image_service().load_rendering_control(self.pixels_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPlaneCall {
    pub pixels_id: u64,
    pub plane: PlaneDef,
}

impl LoadCall for RenderPlaneCall {
    type Output = GrayImage;

    fn description(&self) -> String {
        format!(
            "Rendering plane {} of pixels {}",
            self.plane.coordinate, self.pixels_id
        )
    }

    fn execute(self, gateway: &Gateway) -> ServiceResult<Self::Output> {
        gateway
            .image_service()
            .render_image(self.pixels_id, &self.plane)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailCall {
    pub pixels_id: u64,
    pub size_x: u32,
    pub size_y: u32,
    pub user_id: u64,
    pub group_id: u64,
}

impl LoadCall for ThumbnailCall {
    type Output = GrayImage;

    fn description(&self) -> String {
        format!("Loading thumbnail for pixels {}", self.pixels_id)
    }

    fn execute(self, gateway: &Gateway) -> ServiceResult<Self::Output> {
        gateway
            .image_service()
            .get_thumbnail(
                self.pixels_id,
                self.size_x,
                self.size_y,
                self.user_id,
                self.group_id,
            )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailSetCall {
    pixels_ids: Vec<u64>,
    max_length: u32,
    user_id: u64,
    group_id: u64,
}

impl ThumbnailSetCall {
    /// Thumbnails of `pixels_ids` as seen by `user_id` in `group_id`.
    pub fn new(
        pixels_ids: Vec<u64>,
        max_length: u32,
        user_id: u64,
        group_id: u64,
    ) -> Result<Self> {
        if pixels_ids.is_empty() {
            return Err(LoaderError::InvalidArgument("no pixels to fetch".into()));
        }
        if max_length == 0 {
            return Err(LoaderError::InvalidArgument(
                "thumbnail length must be positive".into(),
            ));
        }
        Ok(Self {
            pixels_ids,
            max_length,
            user_id,
            group_id,
        })
    }
}

impl LoadCall for ThumbnailSetCall {
    type Output = BTreeMap<u64, GrayImage>;

    fn description(&self) -> String {
        format!("Loading {} thumbnails", self.pixels_ids.len())
    }

    fn execute(self, gateway: &Gateway) -> ServiceResult<Self::Output> {
        gateway.image_service().get_thumbnail_set(
            &self.pixels_ids,
            self.max_length,
            self.user_id,
            self.group_id,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsAction {
    Paste { from_pixels_id: u64 },
    Reset,
    Original,
}

/// Applies a rendering-settings action to every image under some containers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderingSettingsCall {
    action: SettingsAction,
    kind: ContainerKind,
    ids: Vec<u64>,
}

impl RenderingSettingsCall {
    pub fn new(action: SettingsAction, kind: ContainerKind, ids: Vec<u64>) -> Result<Self> {
        if ids.is_empty() {
            return Err(LoaderError::InvalidArgument(
                "no containers to apply rendering settings to".into(),
            ));
        }
        Ok(Self { action, kind, ids })
    }
}

impl LoadCall for RenderingSettingsCall {
    type Output = SettingsOutcome;

    fn description(&self) -> String {
        format!("{:?} rendering settings on {} {:?}", self.action, self.ids.len(), self.kind)
    }

    fn execute(self, gateway: &Gateway) -> ServiceResult<Self::Output> {
        let service = gateway.image_service();
        match self.action {
            SettingsAction::Paste { from_pixels_id } => {
                service.paste_rendering_settings(from_pixels_id, self.kind, &self.ids)
            }
            SettingsAction::Reset => service.reset_rendering_settings(self.kind, &self.ids),
            SettingsAction::Original => {
                service.set_original_rendering_settings(self.kind, &self.ids)
            }
        }
    }
}
