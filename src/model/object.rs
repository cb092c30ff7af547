use serde::{Deserialize, Serialize};

use super::PixelsInfo;

/// Container node kinds that can root a hierarchy load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    Project,
    Dataset,
    Screen,
    Plate,
    Well,
    Tag,
}

/// Kind of any object the browser can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Container(ContainerKind),
    Image,
}

/// Reference to a server object by kind and id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub kind: ObjectKind,
    pub id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GroupPermissions {
    #[default]
    Private,
    ReadOnly,
    ReadWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Ownership {
    pub owner_id: u64,
    pub group_id: u64,
    #[serde(default)]
    pub permissions: GroupPermissions,
}

impl Ownership {
    /// Owners always read their data. Other members of the owning group read
    /// it unless the group is private.
    pub fn is_readable_by(&self, user_id: u64, group_id: u64) -> bool {
        if self.owner_id == user_id {
            return true;
        }
        self.group_id == group_id && self.permissions != GroupPermissions::Private
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerData {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub owner: Ownership,
    /// `None` when the children were not loaded with the container.
    #[serde(default)]
    pub children: Option<Vec<DataObject>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub owner: Ownership,
    #[serde(default)]
    pub pixels: Option<PixelsInfo>,
}

/// Server object as delivered by the data service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataObject {
    Project(ContainerData),
    Dataset(ContainerData),
    Screen(ContainerData),
    Plate(ContainerData),
    Well(ContainerData),
    Tag(ContainerData),
    Image(ImageData),
}

impl DataObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            DataObject::Project(_) => ObjectKind::Container(ContainerKind::Project),
            DataObject::Dataset(_) => ObjectKind::Container(ContainerKind::Dataset),
            DataObject::Screen(_) => ObjectKind::Container(ContainerKind::Screen),
            DataObject::Plate(_) => ObjectKind::Container(ContainerKind::Plate),
            DataObject::Well(_) => ObjectKind::Container(ContainerKind::Well),
            DataObject::Tag(_) => ObjectKind::Container(ContainerKind::Tag),
            DataObject::Image(_) => ObjectKind::Image,
        }
    }

    pub fn container(&self) -> Option<&ContainerData> {
        match self {
            DataObject::Project(data)
            | DataObject::Dataset(data)
            | DataObject::Screen(data)
            | DataObject::Plate(data)
            | DataObject::Well(data)
            | DataObject::Tag(data) => Some(data),
            DataObject::Image(_) => None,
        }
    }

    pub fn container_mut(&mut self) -> Option<&mut ContainerData> {
        match self {
            DataObject::Project(data)
            | DataObject::Dataset(data)
            | DataObject::Screen(data)
            | DataObject::Plate(data)
            | DataObject::Well(data)
            | DataObject::Tag(data) => Some(data),
            DataObject::Image(_) => None,
        }
    }

    pub fn container_kind(&self) -> Option<ContainerKind> {
        match self.kind() {
            ObjectKind::Container(kind) => Some(kind),
            ObjectKind::Image => None,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            DataObject::Image(image) => image.id,
            other => other.container().map(|data| data.id).unwrap_or_default(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DataObject::Image(image) => &image.name,
            other => other
                .container()
                .map(|data| data.name.as_str())
                .unwrap_or_default(),
        }
    }

    pub fn owner(&self) -> Ownership {
        match self {
            DataObject::Image(image) => image.owner,
            other => other.container().map(|data| data.owner).unwrap_or_default(),
        }
    }

    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef {
            kind: self.kind(),
            id: self.id(),
        }
    }

    pub fn children(&self) -> Option<&[DataObject]> {
        self.container()
            .and_then(|data| data.children.as_deref())
    }

    pub fn is_readable_by(&self, user_id: u64, group_id: u64) -> bool {
        self.owner().is_readable_by(user_id, group_id)
    }

    /// Number of images directly or transitively held by this object.
    pub fn image_count(&self) -> usize {
        match self {
            DataObject::Image(_) => 1,
            other => other
                .children()
                .map(|children| children.iter().map(DataObject::image_count).sum())
                .unwrap_or_default(),
        }
    }

    /// Depth-first walk over this object and its loaded descendants.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a DataObject)) {
        visit(self);
        if let Some(children) = self.children() {
            for child in children {
                child.walk(visit);
            }
        }
    }
}
