use std::sync::Arc;
use std::time::Duration;

use crate::loader::{CallExecutor, Delivery, LoadState, LoaderError};
use crate::model::{
    ContainerData, ContainerKind, DataObject, GroupPermissions, ImageData, ObjectKind, ObjectRef,
    Ownership, Region,
};
use crate::service::{Catalog, Gateway, InMemoryGateway, ServiceError};

use super::{Browser, BrowserState, LensModel, MAX_ZOOM_FACTOR, ResizeDirection};

const WAIT: Duration = Duration::from_secs(5);

fn owner() -> Ownership {
    Ownership {
        owner_id: 1,
        group_id: 10,
        permissions: GroupPermissions::Private,
    }
}

fn image(id: u64) -> DataObject {
    DataObject::Image(ImageData {
        id,
        name: format!("image-{id}"),
        owner: owner(),
        pixels: None,
    })
}

fn catalog() -> Catalog {
    Catalog {
        name: Some("browser".into()),
        objects: vec![DataObject::Project(ContainerData {
            id: 1,
            name: "project".into(),
            owner: owner(),
            children: Some(vec![
                DataObject::Dataset(ContainerData {
                    id: 2,
                    name: "first".into(),
                    owner: owner(),
                    children: Some(vec![image(20), image(21)]),
                }),
                DataObject::Dataset(ContainerData {
                    id: 3,
                    name: "second".into(),
                    owner: owner(),
                    children: Some(vec![image(30)]),
                }),
            ]),
        })],
    }
}

fn browser() -> (Arc<InMemoryGateway>, Browser) {
    let gateway = Arc::new(InMemoryGateway::new(catalog()));
    let executor = CallExecutor::new(Gateway::in_memory(gateway.clone()), 2).expect("executor");
    (gateway, Browser::new(executor, 1, 10))
}

fn dataset_ref(id: u64) -> ObjectRef {
    ObjectRef {
        kind: ObjectKind::Container(ContainerKind::Dataset),
        id,
    }
}

#[test]
fn load_roots_fills_the_tree() {
    let (_gateway, mut browser) = browser();
    assert_eq!(browser.model().state(), BrowserState::New);

    browser.load_roots(ContainerKind::Project, Vec::new()).expect("load");
    assert_eq!(browser.model().state(), BrowserState::Loading);
    assert_eq!(browser.wait(WAIT).expect("wait"), vec![Delivery::Delivered]);

    let model = browser.model();
    assert_eq!(model.state(), BrowserState::Ready);
    assert_eq!(model.tree().top_level().len(), 1);
    assert_eq!(model.tree().len(), 6);
    assert_eq!(browser.hierarchy_state(), LoadState::Completed);
}

#[test]
fn reloading_a_node_keeps_its_place() {
    let (_gateway, mut browser) = browser();
    browser.load_roots(ContainerKind::Project, Vec::new()).expect("load");
    browser.wait(WAIT).expect("wait");

    let node = browser.model().tree().find_nodes(&[dataset_ref(2)])[0];
    browser.load_node(node).expect("reload");
    assert_eq!(browser.wait(WAIT).expect("wait"), vec![Delivery::Delivered]);

    let model = browser.model();
    let dataset = model.tree().get(node).expect("dataset");
    assert_eq!(dataset.name(), "first");
    assert_eq!(dataset.children().len(), 2);
    assert_eq!(model.tree().len(), 6);
}

#[test]
fn images_cannot_be_reloaded() {
    let (_gateway, mut browser) = browser();
    browser.load_roots(ContainerKind::Project, Vec::new()).expect("load");
    browser.wait(WAIT).expect("wait");

    let image = browser.model().tree().find_nodes(&[ObjectRef {
        kind: ObjectKind::Image,
        id: 20,
    }])[0];
    assert!(matches!(
        browser.load_node(image),
        Err(LoaderError::InvalidArgument(_))
    ));
}

#[test]
fn counts_update_the_shown_datasets() {
    let (_gateway, mut browser) = browser();
    assert!(matches!(
        browser.count_items(ContainerKind::Dataset),
        Err(LoaderError::InvalidArgument(_))
    ));

    browser.load_roots(ContainerKind::Project, Vec::new()).expect("load");
    browser.wait(WAIT).expect("wait");
    browser.count_items(ContainerKind::Dataset).expect("count");
    assert_eq!(browser.wait(WAIT).expect("wait"), vec![Delivery::Delivered]);

    let model = browser.model();
    assert_eq!(model.count(ContainerKind::Dataset, 2), Some(2));
    assert_eq!(model.count(ContainerKind::Dataset, 3), Some(1));
    let node = model.tree().find_nodes(&[dataset_ref(3)])[0];
    assert_eq!(model.tree().get(node).expect("node").item_count(), Some(1));
}

#[test]
fn remote_failures_are_recorded() {
    let (gateway, mut browser) = browser();
    gateway.set_available(false);

    browser.load_roots(ContainerKind::Project, Vec::new()).expect("load");
    let deliveries = browser.wait(WAIT).expect("wait");
    assert!(matches!(
        deliveries.as_slice(),
        [Delivery::Failed(ServiceError::ServiceUnavailable(_))]
    ));

    let model = browser.model();
    assert_eq!(model.state(), BrowserState::Ready);
    assert!(matches!(
        model.last_error(),
        Some(ServiceError::ServiceUnavailable(_))
    ));
    assert!(model.tree().is_empty());
}

#[test]
fn discarded_browser_ignores_late_results() {
    let (gateway, mut browser) = browser();
    gateway.set_latency(Duration::from_millis(50));

    browser.load_roots(ContainerKind::Project, Vec::new()).expect("load");
    browser.discard();

    assert!(browser.wait(WAIT).expect("wait").is_empty());
    assert_eq!(browser.hierarchy_state(), LoadState::Cancelled);
    let model = browser.model();
    assert_eq!(model.state(), BrowserState::Discarded);
    assert!(model.tree().is_empty());
    drop(model);

    assert!(matches!(
        browser.load_roots(ContainerKind::Project, Vec::new()),
        Err(LoaderError::InvalidArgument(_))
    ));
}

#[test]
fn a_new_load_replaces_the_previous_one() {
    let (gateway, mut browser) = browser();
    gateway.set_latency(Duration::from_millis(30));

    browser.load_roots(ContainerKind::Project, Vec::new()).expect("first");
    browser.load_roots(ContainerKind::Project, vec![1]).expect("second");

    assert_eq!(browser.wait(WAIT).expect("wait"), vec![Delivery::Delivered]);
    assert_eq!(browser.model().tree().top_level().len(), 1);
}

#[test]
fn polling_hands_over_completed_loads() {
    let (_gateway, mut browser) = browser();
    browser.load_roots(ContainerKind::Project, Vec::new()).expect("load");

    let deadline = std::time::Instant::now() + WAIT;
    let mut deliveries = Vec::new();
    while deliveries.is_empty() && std::time::Instant::now() < deadline {
        deliveries = browser.poll();
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(deliveries, vec![Delivery::Delivered]);
    assert!(browser.poll().is_empty());
}

#[test]
fn lens_fits_small_images() {
    let lens = LensModel::new(30, 10);
    assert_eq!((lens.width(), lens.height()), (30, 10));
    assert_eq!(lens.region(), Region::new(0, 0, 30, 10));
}

#[test]
fn lens_size_and_location_are_constrained() {
    let mut lens = LensModel::new(200, 100);
    lens.set_size(5, 500);
    assert_eq!((lens.width(), lens.height()), (20, 100));

    lens.set_size(50, 50);
    lens.set_location(190, -5);
    assert_eq!((lens.x(), lens.y()), (150, 0));

    lens.center_on(100, 50);
    assert_eq!((lens.x(), lens.y()), (75, 25));
}

#[test]
fn crosshair_snaps_on_small_lenses() {
    let mut lens = LensModel::new(500, 500);
    assert_eq!(lens.crosshair_length(), 8);
    assert_eq!(lens.crosshair_tick(), 3);
    assert_eq!(lens.border_pick_size(), 8);

    lens.set_size(20, 60);
    assert_eq!(lens.crosshair_length(), 6);
    assert_eq!(lens.crosshair_tick(), 2);
    assert_eq!(lens.border_pick_size(), 4);

    lens.set_image_zoom_factor(2.0);
    assert_eq!(lens.crosshair_length(), 8);
}

#[test]
fn pick_direction_follows_the_border() {
    let lens = LensModel::new(500, 500);
    assert_eq!(lens.pick_direction(0, 0), Some(ResizeDirection::NorthWest));
    assert_eq!(lens.pick_direction(0, 25), Some(ResizeDirection::West));
    assert_eq!(lens.pick_direction(49, 0), Some(ResizeDirection::NorthEast));
    assert_eq!(lens.pick_direction(49, 49), Some(ResizeDirection::SouthEast));
    assert_eq!(lens.pick_direction(25, 0), Some(ResizeDirection::North));
    assert_eq!(lens.pick_direction(25, 49), Some(ResizeDirection::South));
    assert_eq!(lens.pick_direction(25, 25), None);

    assert!(lens.lens_picked(25, 25));
    assert!(lens.border_picked(2, 25));
    assert!(!lens.lens_picked(60, 60));
    assert!(!lens.border_picked(60, 60));
}

#[test]
fn resizing_keeps_the_opposite_edge() {
    let mut lens = LensModel::new(100, 100);
    lens.set_location(20, 20);

    lens.resize(ResizeDirection::West, -10, 0);
    assert_eq!(lens.region(), Region::new(10, 20, 60, 50));

    lens.resize(ResizeDirection::North, 0, 100);
    assert_eq!(lens.region(), Region::new(10, 50, 60, 20));

    lens.set_location(0, 0);
    lens.resize(ResizeDirection::SouthEast, 200, 200);
    assert_eq!((lens.width(), lens.height()), (100, 100));
}

#[test]
fn zoom_is_bounded() {
    let mut lens = LensModel::new(500, 500);
    assert_eq!(lens.zoomed_size(), (100, 100));

    lens.zoom_by_ticks(20);
    assert_eq!(lens.zoom_factor(), MAX_ZOOM_FACTOR);
    assert_eq!(lens.zoomed_size(), (500, 500));
    assert_eq!(lens.zoom_view_position(300, 300), (100, 100));

    lens.set_zoom_factor(0.1);
    assert_eq!(lens.zoom_factor(), 1.0);
}
