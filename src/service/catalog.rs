use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::{DataObject, ObjectRef};

use super::{CatalogError, CatalogResult};

/// Server content served by the in-memory gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub name: Option<String>,
    #[serde(default)]
    pub objects: Vec<DataObject>,
}

impl Catalog {
    /// A container id may appear in several places, as when one dataset is
    /// linked under two projects, but every occurrence must carry the same
    /// contents. Images may be linked from several containers.
    pub fn validate(&self) -> CatalogResult<()> {
        let mut containers: BTreeMap<ObjectRef, &DataObject> = BTreeMap::new();
        let mut failure = None;
        for root in &self.objects {
            root.walk(&mut |object| {
                if failure.is_some() {
                    return;
                }
                match object {
                    DataObject::Image(image) => {
                        if let Some(Err(error)) = image.pixels.as_ref().map(|info| info.validate()) {
                            failure = Some(error.to_string());
                        }
                    }
                    container => {
                        let reference = container.object_ref();
                        match containers.get(&reference) {
                            Some(existing) if *existing != container => {
                                failure = Some(format!(
                                    "{:?} id {} is listed twice with different contents",
                                    reference.kind, reference.id
                                ));
                            }
                            Some(_) => {}
                            None => {
                                containers.insert(reference, container);
                            }
                        }
                    }
                }
            });
        }
        match failure {
            Some(message) => Err(CatalogError::Invalid(message)),
            None => Ok(()),
        }
    }
}

pub fn load_catalog(path: impl AsRef<Path>) -> CatalogResult<Catalog> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let catalog = if matches!(extension.as_str(), "yaml" | "yml") {
        serde_yaml::from_str::<Catalog>(&raw)?
    } else {
        serde_json::from_str::<Catalog>(&raw)?
    };
    catalog.validate()?;
    Ok(catalog)
}
