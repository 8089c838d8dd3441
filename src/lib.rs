//! memeframe: load a picture, drag captions over it, save or print the result.

pub mod app;
pub mod canvas;
pub mod controller;
pub mod error;
pub mod load_logic;
pub mod overlay;
pub mod print;
pub mod render;
pub mod settings;

pub use canvas::Canvas;
pub use controller::{is_valid_image_file, MemeController};
pub use error::{MemeError, Result};
pub use overlay::{Overlay, OverlayEvent, OverlayId, ViewMode};
