mod browser;
mod lens;

#[cfg(test)]
mod tests;

pub use browser::{Browser, BrowserModel, BrowserState};
pub use lens::{
    CROSSHAIR_SNAP, DEFAULT_LENS_SIZE, LensModel, MAX_LENS_SIZE, MAX_ZOOM_FACTOR, MIN_LENS_SIZE,
    MIN_ZOOM_FACTOR, ResizeDirection,
};
