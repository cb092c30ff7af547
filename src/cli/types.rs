use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::model::{ContainerKind, ObjectRef, PlaneCoordinate, Region};
use crate::tree::{NodeId, TreeModel};

#[derive(Debug, Parser)]
#[command(
    name = "insight",
    version,
    about = "Browse and render images served by an insight catalogue"
)]
pub(super) struct Cli {
    /// Client configuration (YAML or JSON).
    #[arg(long, global = true)]
    pub(super) config: Option<PathBuf>,

    #[command(subcommand)]
    pub(super) command: Commands,
}

#[derive(Debug, Subcommand)]
pub(super) enum Commands {
    /// Lists the planes of a z/t volume in display order with their keys.
    Planes {
        #[arg(long)]
        z_count: i64,
        #[arg(long)]
        t_count: i64,
    },
    /// Loads a container hierarchy and prints the resulting tree.
    Browse {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long, value_enum, default_value = "project")]
        kind: KindArg,
        #[arg(long)]
        id: Vec<u64>,
        /// Also count the images of every dataset shown.
        #[arg(long)]
        counts: bool,
        /// Writes the tree to a JSON or YAML file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Counts the images held by datasets or tags.
    Count {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long, value_enum, default_value = "dataset")]
        kind: KindArg,
        #[arg(long, required = true)]
        id: Vec<u64>,
    },
    /// Saves the thumbnail of a pixel set as PNG.
    Thumbnail {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long)]
        pixels: u64,
        #[arg(long)]
        output: PathBuf,
        /// Exact size; without it the longest edge is the configured size.
        #[arg(long, requires = "height")]
        width: Option<u32>,
        #[arg(long, requires = "width")]
        height: Option<u32>,
    },
    /// Renders one plane as PNG.
    Render {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long)]
        pixels: u64,
        #[arg(long, default_value_t = 0)]
        z: i64,
        #[arg(long, default_value_t = 0)]
        t: i64,
        /// Crop as `x,y,width,height`.
        #[arg(long, value_parser = parse_region)]
        region: Option<Region>,
        #[arg(long)]
        output: PathBuf,
    },
    /// Applies rendering settings to every image of some containers.
    Settings {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long, value_enum)]
        action: ActionArg,
        /// Source pixel set for `paste`.
        #[arg(long, required_if_eq("action", "paste"))]
        from: Option<u64>,
        #[arg(long, value_enum, default_value = "dataset")]
        kind: KindArg,
        #[arg(long, required = true)]
        id: Vec<u64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(super) enum KindArg {
    Project,
    Dataset,
    Screen,
    Plate,
    Well,
    Tag,
}

impl From<KindArg> for ContainerKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Project => ContainerKind::Project,
            KindArg::Dataset => ContainerKind::Dataset,
            KindArg::Screen => ContainerKind::Screen,
            KindArg::Plate => ContainerKind::Plate,
            KindArg::Well => ContainerKind::Well,
            KindArg::Tag => ContainerKind::Tag,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(super) enum ActionArg {
    Paste,
    Reset,
    Original,
}

pub(super) fn parse_region(raw: &str) -> Result<Region, String> {
    let parts = raw
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| format!("invalid region '{raw}': {error}"))?;
    match parts.as_slice() {
        [x, y, width, height] => Ok(Region::new(*x, *y, *width, *height)),
        _ => Err(format!("region '{raw}' must be x,y,width,height")),
    }
}

#[derive(Debug, Serialize)]
pub(super) struct PlaneEntry {
    pub(super) z: u32,
    pub(super) t: u32,
    pub(super) key: u32,
    pub(super) label: String,
}

impl From<PlaneCoordinate> for PlaneEntry {
    fn from(coordinate: PlaneCoordinate) -> Self {
        Self {
            z: coordinate.z_section(),
            t: coordinate.timepoint(),
            key: coordinate.packed_key(),
            label: coordinate.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct TreeEntry {
    pub(super) name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) object: Option<ObjectRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) items: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(super) children: Vec<TreeEntry>,
}

impl TreeEntry {
    pub(super) fn collect(tree: &TreeModel, ids: &[NodeId]) -> Vec<Self> {
        ids.iter()
            .filter_map(|id| tree.node(*id))
            .map(|node| Self {
                name: node.name().to_string(),
                object: node.object(),
                items: node.item_count(),
                children: Self::collect(tree, node.children()),
            })
            .collect()
    }
}
