use std::fs;

use ndarray::Array5;

use crate::model::{
    ContainerData, ContainerKind, DataObject, GroupPermissions, ImageData, Ownership, PixelType,
    PixelsInfo, PlaneCoordinate, PlaneDef, ProjectionKind, Region,
};

use super::{
    Catalog, CatalogError, DataService, ImageService, InMemoryGateway, ServiceError, load_catalog,
};

const USER: u64 = 1;
const OTHER_USER: u64 = 2;
const GROUP: u64 = 10;

fn owned_by(owner_id: u64, permissions: GroupPermissions) -> Ownership {
    Ownership {
        owner_id,
        group_id: GROUP,
        permissions,
    }
}

fn pixels(id: u64, size_c: u32) -> PixelsInfo {
    PixelsInfo {
        id,
        size_x: 8,
        size_y: 6,
        size_z: 3,
        size_t: 2,
        size_c,
        pixel_type: PixelType::Uint8,
    }
}

fn image(id: u64, owner: Ownership, size_c: u32) -> DataObject {
    DataObject::Image(ImageData {
        id,
        name: format!("image-{id}"),
        owner,
        pixels: Some(pixels(100 + id, size_c)),
    })
}

fn container(
    wrap: fn(ContainerData) -> DataObject,
    id: u64,
    owner: Ownership,
    children: Vec<DataObject>,
) -> DataObject {
    wrap(ContainerData {
        id,
        name: format!("container-{id}"),
        owner,
        children: Some(children),
    })
}

fn sample_catalog() -> Catalog {
    let mine = owned_by(USER, GroupPermissions::Private);
    let theirs = owned_by(OTHER_USER, GroupPermissions::Private);
    Catalog {
        name: Some("sample".into()),
        objects: vec![
            container(
                DataObject::Project,
                1,
                mine,
                vec![
                    container(
                        DataObject::Dataset,
                        11,
                        mine,
                        vec![image(1, mine, 1), image(2, mine, 1), image(3, theirs, 1)],
                    ),
                    container(DataObject::Dataset, 12, mine, vec![image(4, mine, 2)]),
                ],
            ),
            container(DataObject::Project, 2, theirs, vec![]),
            container(DataObject::Tag, 30, mine, vec![image(1, mine, 1)]),
        ],
    }
}

fn gateway() -> InMemoryGateway {
    InMemoryGateway::new(sample_catalog())
}

#[test]
fn hierarchy_hides_unreadable_objects() {
    let gateway = gateway();
    let projects = gateway
        .load_hierarchy(ContainerKind::Project, &[], USER, GROUP)
        .expect("projects");
    assert_eq!(projects.len(), 1);
    let datasets = projects[0].children().expect("datasets loaded");
    assert_eq!(datasets.len(), 2);
    assert_eq!(datasets[0].children().map(<[DataObject]>::len), Some(2));
}

#[test]
fn explicit_unreadable_container_is_denied() {
    let gateway = gateway();
    let error = gateway
        .load_hierarchy(ContainerKind::Project, &[2], USER, GROUP)
        .expect_err("foreign project");
    assert!(matches!(error, ServiceError::AccessDenied(_)));

    let error = gateway
        .load_hierarchy(ContainerKind::Project, &[99], USER, GROUP)
        .expect_err("missing project");
    assert!(matches!(error, ServiceError::NotFound { id: 99, .. }));
}

#[test]
fn shared_group_data_is_visible_to_members() {
    let shared = owned_by(OTHER_USER, GroupPermissions::ReadOnly);
    let catalog = Catalog {
        name: None,
        objects: vec![container(DataObject::Screen, 5, shared, vec![])],
    };
    let gateway = InMemoryGateway::new(catalog);
    let screens = gateway
        .load_hierarchy(ContainerKind::Screen, &[5], USER, GROUP)
        .expect("screen");
    assert_eq!(screens[0].name(), "container-5");
}

#[test]
fn collection_counts_include_every_image() {
    let gateway = gateway();
    let counts = gateway
        .get_collection_count(ContainerKind::Dataset, &[11, 12])
        .expect("counts");
    assert_eq!(counts.get(&11), Some(&3));
    assert_eq!(counts.get(&12), Some(&1));
}

#[test]
fn offline_gateway_reports_unavailable() {
    let gateway = gateway();
    gateway.set_available(false);
    let error = gateway
        .get_collection_count(ContainerKind::Dataset, &[11])
        .expect_err("offline");
    assert!(matches!(error, ServiceError::ServiceUnavailable(_)));
    assert!(matches!(
        gateway.get_thumbnail_set(&[101], 16, USER, GROUP),
        Err(ServiceError::ServiceUnavailable(_))
    ));
    gateway.set_available(true);
    assert!(gateway.get_collection_count(ContainerKind::Dataset, &[11]).is_ok());
}

#[test]
fn rendering_control_opens_an_engine() {
    let gateway = gateway();
    let control = gateway.load_rendering_control(101).expect("control");
    assert_eq!(control.pixels.size_z, 3);
    assert_eq!(control.default_plane().coordinate, PlaneCoordinate::new(1, 0).expect("plane"));
    assert!(gateway.has_rendering_engine(101));
    gateway.shut_down(101);
    assert!(!gateway.has_rendering_engine(101));
}

#[test]
fn render_image_respects_region_and_bounds() {
    let gateway = gateway();
    let coordinate = PlaneCoordinate::new(0, 1).expect("plane");
    let full = gateway
        .render_image(101, &PlaneDef::new(coordinate))
        .expect("render");
    assert_eq!(full.dimensions(), (8, 6));

    let cropped = gateway
        .render_image(101, &PlaneDef::with_region(coordinate, Region::new(6, 4, 10, 10)))
        .expect("render region");
    assert_eq!(cropped.dimensions(), (2, 2));
    assert_eq!(cropped.get_pixel(0, 0), full.get_pixel(6, 4));

    let outside = PlaneCoordinate::new(3, 0).expect("plane");
    assert!(matches!(
        gateway.render_image(101, &PlaneDef::new(outside)),
        Err(ServiceError::Rendering(_))
    ));
}

#[test]
fn inserted_pixels_replace_the_gradient() {
    let gateway = gateway();
    let info = PixelsInfo {
        id: 500,
        size_x: 2,
        size_y: 1,
        size_z: 2,
        size_t: 1,
        size_c: 1,
        pixel_type: PixelType::Uint8,
    };
    let data = Array5::from_shape_vec((1, 2, 1, 1, 2), vec![0.0, 255.0, 100.0, 50.0])
        .expect("shape");
    gateway
        .insert_pixels(info, owned_by(USER, GroupPermissions::Private), data)
        .expect("insert");

    let plane = gateway
        .get_plane(500, PlaneCoordinate::new(1, 0).expect("plane"), 0)
        .expect("plane values");
    assert_eq!(plane[[0, 0]], 100.0);

    let max = gateway
        .render_projected(500, 0, 1, 1, ProjectionKind::MaxIntensity, &[])
        .expect("max projection");
    assert_eq!(max.get_pixel(0, 0).0[0], 100);
    assert_eq!(max.get_pixel(1, 0).0[0], 255);

    let mean = gateway
        .render_projected(500, 0, 1, 1, ProjectionKind::MeanIntensity, &[0])
        .expect("mean projection");
    assert_eq!(mean.get_pixel(0, 0).0[0], 50);

    assert!(matches!(
        gateway.render_projected(500, 1, 0, 1, ProjectionKind::SumIntensity, &[]),
        Err(ServiceError::InvalidRequest(_))
    ));
}

#[test]
fn thumbnails_check_access_and_keep_aspect() {
    let gateway = gateway();
    let thumbnail = gateway
        .get_thumbnail(101, 4, 3, USER, GROUP)
        .expect("thumbnail");
    assert_eq!(thumbnail.dimensions(), (4, 3));
    assert!(matches!(
        gateway.get_thumbnail(103, 4, 3, USER, GROUP),
        Err(ServiceError::AccessDenied(_))
    ));

    let set = gateway
        .get_thumbnail_set(&[101, 102, 103, 999], 4, USER, GROUP)
        .expect("thumbnail set");
    assert_eq!(set.keys().copied().collect::<Vec<_>>(), vec![101, 102]);
    assert_eq!(set[&101].dimensions(), (4, 3));
    assert!(matches!(
        gateway.get_thumbnail_set(&[101], 0, USER, GROUP),
        Err(ServiceError::InvalidRequest(_))
    ));
}

#[test]
fn shared_images_stay_inside_their_group() {
    let shared = owned_by(OTHER_USER, GroupPermissions::ReadOnly);
    let catalog = Catalog {
        name: None,
        objects: vec![container(
            DataObject::Dataset,
            6,
            shared,
            vec![image(7, shared, 1)],
        )],
    };
    let gateway = InMemoryGateway::new(catalog);
    let (outsider, outside_group) = (99, 555);

    assert!(matches!(
        gateway.load_hierarchy(ContainerKind::Dataset, &[6], outsider, outside_group),
        Err(ServiceError::AccessDenied(_))
    ));
    assert!(matches!(
        gateway.get_thumbnail(107, 4, 3, outsider, outside_group),
        Err(ServiceError::AccessDenied(_))
    ));
    let set = gateway
        .get_thumbnail_set(&[107], 4, outsider, outside_group)
        .expect("thumbnail set");
    assert!(set.is_empty());

    assert!(gateway.get_thumbnail(107, 4, 3, USER, GROUP).is_ok());
    let set = gateway
        .get_thumbnail_set(&[107], 4, USER, GROUP)
        .expect("thumbnail set");
    assert!(set.contains_key(&107));
}

#[test]
fn large_catalogue_volumes_are_served_plane_by_plane() {
    let mine = owned_by(USER, GroupPermissions::Private);
    let huge = PixelsInfo {
        id: 900,
        size_x: 256,
        size_y: 128,
        size_z: 4000,
        size_t: 5000,
        size_c: 3,
        pixel_type: PixelType::Uint16,
    };
    let catalog = Catalog {
        name: None,
        objects: vec![container(
            DataObject::Dataset,
            91,
            mine,
            vec![DataObject::Image(ImageData {
                id: 90,
                name: "time-lapse".into(),
                owner: mine,
                pixels: Some(huge),
            })],
        )],
    };
    assert!(catalog.validate().is_ok());
    let gateway = InMemoryGateway::new(catalog);

    let last = PlaneCoordinate::new(3999, 4999).expect("plane");
    let plane = gateway.get_plane(900, last, 2).expect("plane values");
    assert_eq!(plane.dim(), (128, 256));
    assert!(plane[[127, 255]] > plane[[0, 0]]);

    let rendered = gateway
        .render_image(900, &PlaneDef::new(last))
        .expect("render");
    assert_eq!(rendered.dimensions(), (256, 128));

    let outcome = gateway
        .reset_rendering_settings(ContainerKind::Dataset, &[91])
        .expect("reset");
    assert_eq!(outcome.applied, vec![900]);
    let settings = gateway.get_rendering_settings(900).expect("settings");
    let window = settings.channels[2];
    assert!(window.start > 0.0);
    assert!(window.start < window.end);
    assert!(window.end < f64::from(u16::MAX));
}

#[test]
fn paste_skips_incompatible_pixels() {
    let gateway = gateway();
    let outcome = gateway
        .paste_rendering_settings(101, ContainerKind::Project, &[1])
        .expect("paste");
    assert_eq!(outcome.applied, vec![101, 102, 103]);
    assert_eq!(outcome.failed, vec![104]);
}

#[test]
fn reset_uses_data_range_and_original_uses_type_range() {
    let gateway = gateway();
    let outcome = gateway
        .reset_rendering_settings(ContainerKind::Tag, &[30])
        .expect("reset");
    assert_eq!(outcome.applied, vec![101]);
    let reset = gateway.get_rendering_settings(101).expect("settings");
    assert_eq!(reset.channels[0].start, 0.0);
    assert!(reset.channels[0].end < 255.0);

    gateway
        .set_original_rendering_settings(ContainerKind::Tag, &[30])
        .expect("original");
    let original = gateway.get_rendering_settings(101).expect("settings");
    assert_eq!(original.channels[0].start, 0.0);
    assert_eq!(original.channels[0].end, 255.0);
}

#[test]
fn catalog_loads_from_yaml_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("catalog.yaml");
    fs::write(
        &path,
        r#"
name: demo
objects:
  - kind: project
    id: 1
    name: demo project
    owner: { owner_id: 1, group_id: 10 }
    children:
      - kind: dataset
        id: 2
        name: demo dataset
        owner: { owner_id: 1, group_id: 10 }
        children:
          - kind: image
            id: 3
            name: cells.tif
            owner: { owner_id: 1, group_id: 10 }
            pixels: { id: 30, size_x: 16, size_y: 16, size_z: 4 }
"#,
    )
    .expect("write catalog");
    let catalog = load_catalog(&path).expect("catalog");
    assert_eq!(catalog.name.as_deref(), Some("demo"));
    let gateway = InMemoryGateway::new(catalog);
    assert!(gateway.load_rendering_control(30).is_ok());
}

#[test]
fn catalog_accepts_a_dataset_linked_twice() {
    let mine = owned_by(USER, GroupPermissions::Private);
    let shared_dataset = container(DataObject::Dataset, 7, mine, vec![image(1, mine, 1)]);
    let catalog = Catalog {
        name: None,
        objects: vec![
            container(DataObject::Project, 1, mine, vec![shared_dataset.clone()]),
            container(DataObject::Project, 2, mine, vec![shared_dataset]),
        ],
    };
    assert!(catalog.validate().is_ok());

    let gateway = InMemoryGateway::new(catalog);
    let projects = gateway
        .load_hierarchy(ContainerKind::Project, &[], USER, GROUP)
        .expect("projects");
    assert_eq!(projects.len(), 2);
    let counts = gateway
        .get_collection_count(ContainerKind::Dataset, &[7])
        .expect("counts");
    assert_eq!(counts.get(&7), Some(&1));
}

#[test]
fn catalog_rejects_conflicting_containers() {
    let mine = owned_by(USER, GroupPermissions::Private);
    let catalog = Catalog {
        name: None,
        objects: vec![
            container(DataObject::Dataset, 7, mine, vec![]),
            container(DataObject::Dataset, 7, mine, vec![image(1, mine, 1)]),
        ],
    };
    assert!(matches!(catalog.validate(), Err(CatalogError::Invalid(_))));
}
