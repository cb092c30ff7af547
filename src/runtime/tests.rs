use std::fs;

use image::GrayImage;
use tempfile::tempdir;

use crate::loader::Delivery;
use crate::model::{ContainerData, ContainerKind, DataObject, GroupPermissions, Ownership};
use crate::service::Catalog;
use crate::ui::BrowserState;

use super::{AppContext, AppError, ClientConfig, load_config, save_output, save_png};

fn shared_project(id: u64) -> DataObject {
    DataObject::Project(ContainerData {
        id,
        name: format!("project-{id}"),
        owner: Ownership {
            owner_id: 7,
            group_id: 3,
            permissions: GroupPermissions::ReadOnly,
        },
        children: Some(Vec::new()),
    })
}

#[test]
fn missing_config_fields_use_defaults() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("client.yaml");
    fs::write(&path, "user_id: 4\ngroup_id: 3\n").expect("write");

    let config = load_config(&path).expect("config");
    assert_eq!(config.user_id, 4);
    assert_eq!(config.group_id, 3);
    assert_eq!(config.thumbnail_size, 96);
    assert_eq!(config.worker_threads, 2);
    assert_eq!(config.load_timeout().as_millis(), 5000);
}

#[test]
fn unknown_config_fields_are_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("client.json");
    fs::write(&path, r#"{"user_id": 1, "colour": "blue"}"#).expect("write");

    assert!(matches!(load_config(&path), Err(AppError::SerdeJson(_))));
}

#[test]
fn zero_sized_settings_are_invalid() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("client.json");
    fs::write(&path, r#"{"worker_threads": 0}"#).expect("write");

    assert!(matches!(load_config(&path), Err(AppError::InvalidConfig(_))));
}

#[test]
fn context_browser_sees_group_data() {
    let catalog = Catalog {
        name: None,
        objects: vec![shared_project(1), shared_project(2)],
    };
    let config = ClientConfig {
        user_id: 4,
        group_id: 3,
        ..ClientConfig::default()
    };
    let context = AppContext::with_catalog(config, catalog).expect("context");

    let mut browser = context.browser();
    browser
        .load_roots(ContainerKind::Project, Vec::new())
        .expect("load");
    let deliveries = browser.wait(context.load_timeout()).expect("wait");

    assert_eq!(deliveries, vec![Delivery::Delivered]);
    assert_eq!(browser.model().state(), BrowserState::Ready);
    assert_eq!(browser.model().tree().top_level().len(), 2);
}

#[test]
fn context_rejects_an_invalid_catalog() {
    let mut renamed = shared_project(1);
    if let Some(data) = renamed.container_mut() {
        data.name = "renamed".into();
    }
    let catalog = Catalog {
        name: None,
        objects: vec![shared_project(1), renamed],
    };
    let result = AppContext::with_catalog(ClientConfig::default(), catalog);
    assert!(matches!(result, Err(AppError::Catalog(_))));
}

#[test]
fn outputs_follow_the_file_extension() {
    let dir = tempdir().expect("tempdir");
    let config = ClientConfig::default();

    let yaml = dir.path().join("out.yml");
    save_output(&yaml, &config).expect("yaml");
    let raw = fs::read_to_string(&yaml).expect("read");
    assert!(raw.contains("thumbnail_size: 96"));

    let json = dir.path().join("out.json");
    save_output(&json, &config).expect("json");
    let parsed: ClientConfig =
        serde_json::from_str(&fs::read_to_string(&json).expect("read")).expect("parse");
    assert_eq!(parsed, config);
}

#[test]
fn png_output_can_be_read_back() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("plane.png");
    let plane = GrayImage::from_fn(4, 3, |x, y| image::Luma([(x * 10 + y) as u8]));

    save_png(&path, &plane).expect("save");
    let reloaded = image::open(&path).expect("open").into_luma8();
    assert_eq!(reloaded, plane);
}
