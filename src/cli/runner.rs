use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use clap::Parser;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::loader::{
    AsyncLoadRequest, Consumer, ContainerCountCall, Delivery, LoadCall, RenderPlaneCall,
    RenderingSettingsCall, SettingsAction, StaleReason, ThumbnailCall, ThumbnailSetCall,
};
use crate::model::{ContainerKind, ObjectKind, ObjectRef, PlaneCoordinate, PlaneDef};
use crate::runtime::{
    AppContext, AppError, ClientConfig, Result, load_config, save_output, save_png,
};
use crate::service::{ServiceError, load_catalog};
use crate::ui::Browser;

use super::types::{ActionArg, Cli, Commands, PlaneEntry, TreeEntry};

pub fn run_cli() -> std::result::Result<(), String> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path).map_err(|error| error.to_string())?,
        None => ClientConfig::default(),
    };
    execute(cli.command, config).map_err(|error| error.to_string())
}

fn execute(command: Commands, config: ClientConfig) -> Result<()> {
    match command {
        Commands::Planes { z_count, t_count } => {
            let mut planes = Vec::new();
            for t in 0..t_count {
                for z in 0..z_count {
                    planes.push(PlaneCoordinate::new(z, t)?);
                }
            }
            planes.sort();
            let planes: Vec<PlaneEntry> = planes.into_iter().map(PlaneEntry::from).collect();
            print_json(&json!({"order": "timepoint_then_z", "planes": planes}))?;
        }
        Commands::Browse {
            catalog,
            kind,
            id,
            counts,
            output,
        } => {
            let context = open(&catalog, config)?;
            let mut browser = context.browser();
            browser.load_roots(kind.into(), id)?;
            for delivery in browser.wait(context.load_timeout())? {
                settle(delivery)?;
            }
            if counts && shows_kind(&browser, ContainerKind::Dataset) {
                browser.count_items(ContainerKind::Dataset)?;
                for delivery in browser.wait(context.load_timeout())? {
                    settle(delivery)?;
                }
            }
            let model = browser.model();
            let tree = TreeEntry::collect(model.tree(), model.tree().top_level());
            match output {
                Some(path) => save_output(path, &tree)?,
                None => print_json(&tree)?,
            }
        }
        Commands::Count { catalog, kind, id } => {
            let context = open(&catalog, config)?;
            let kind = ContainerKind::from(kind);
            let roots: Vec<ObjectRef> = id
                .into_iter()
                .map(|id| ObjectRef {
                    kind: ObjectKind::Container(kind),
                    id,
                })
                .collect();
            let counts = run_call(&context, ContainerCountCall::new(&roots)?)?;
            print_json(&counts)?;
        }
        Commands::Thumbnail {
            catalog,
            pixels,
            output,
            width,
            height,
        } => {
            let context = open(&catalog, config)?;
            let thumbnail = match (width, height) {
                (Some(size_x), Some(size_y)) => {
                    let call = ThumbnailCall {
                        pixels_id: pixels,
                        size_x,
                        size_y,
                        user_id: context.config().user_id,
                        group_id: context.config().group_id,
                    };
                    run_call(&context, call)?
                }
                _ => {
                    let config = context.config();
                    let call = ThumbnailSetCall::new(
                        vec![pixels],
                        config.thumbnail_size,
                        config.user_id,
                        config.group_id,
                    )?;
                    run_call(&context, call)?
                        .remove(&pixels)
                        .ok_or(ServiceError::NotFound {
                            kind: ObjectKind::Image,
                            id: pixels,
                        })?
                }
            };
            save_png(&output, &thumbnail)?;
            print_json(&json!({
                "status": "ok",
                "output": output,
                "width": thumbnail.width(),
                "height": thumbnail.height(),
            }))?;
        }
        Commands::Render {
            catalog,
            pixels,
            z,
            t,
            region,
            output,
        } => {
            let context = open(&catalog, config)?;
            let coordinate = PlaneCoordinate::new(z, t)?;
            let plane = match region {
                Some(region) => PlaneDef::with_region(coordinate, region),
                None => PlaneDef::new(coordinate),
            };
            let rendered = run_call(
                &context,
                RenderPlaneCall {
                    pixels_id: pixels,
                    plane,
                },
            )?;
            save_png(&output, &rendered)?;
            print_json(&json!({
                "status": "ok",
                "output": output,
                "plane": coordinate.to_string(),
                "width": rendered.width(),
                "height": rendered.height(),
            }))?;
        }
        Commands::Settings {
            catalog,
            action,
            from,
            kind,
            id,
        } => {
            let context = open(&catalog, config)?;
            let action = match (action, from) {
                (ActionArg::Paste, Some(from_pixels_id)) => SettingsAction::Paste { from_pixels_id },
                (ActionArg::Paste, None) => {
                    return Err(ServiceError::InvalidRequest(
                        "paste needs a source pixel set".into(),
                    )
                    .into());
                }
                (ActionArg::Reset, _) => SettingsAction::Reset,
                (ActionArg::Original, _) => SettingsAction::Original,
            };
            let call = RenderingSettingsCall::new(action, kind.into(), id)?;
            let outcome = run_call(&context, call)?;
            print_json(&outcome)?;
        }
    }
    Ok(())
}

fn open(catalog: &Path, config: ClientConfig) -> Result<AppContext> {
    let catalog = load_catalog(catalog)?;
    info!(
        name = catalog.name.as_deref().unwrap_or("unnamed"),
        roots = catalog.objects.len(),
        "catalog loaded"
    );
    AppContext::with_catalog(config, catalog)
}

fn shows_kind(browser: &Browser, kind: ContainerKind) -> bool {
    let mut found = false;
    browser.model().tree().visit(|_, node| {
        found |= node.container_kind() == Some(kind);
    });
    found
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn settle(delivery: Delivery) -> Result<()> {
    match delivery {
        Delivery::Delivered => Ok(()),
        Delivery::Failed(error) => Err(error.into()),
        Delivery::Stale(reason) => Err(AppError::Stale(reason)),
    }
}

/// Keeps the single result of a one-shot command.
struct Collected<T> {
    value: Option<T>,
}

impl<T> Consumer<T> for Collected<T> {
    fn set_result(&mut self, value: T) {
        self.value = Some(value);
    }

    fn set_error(&mut self, _error: &ServiceError) {}

    fn is_discarded(&self) -> bool {
        false
    }
}

/// Issues `call` and blocks until its result is in.
fn run_call<L: LoadCall>(context: &AppContext, call: L) -> Result<L::Output> {
    let consumer = Rc::new(RefCell::new(Collected { value: None }));
    let mut request = AsyncLoadRequest::new();
    request.load(context.executor(), Some(call), Some(Rc::downgrade(&consumer)))?;
    settle(request.wait(context.load_timeout())?)?;
    let value = consumer.borrow_mut().value.take();
    value.ok_or(AppError::Stale(StaleReason::NotInFlight))
}
