//! Application defaults and launch arguments.
//! Nothing here is persisted between sessions.

use clap::Parser;
use std::path::PathBuf;

/// Window size used when no image is given at launch.
pub const DEFAULT_WINDOW_SIZE: [f32; 2] = [800.0, 600.0];
pub const MIN_WINDOW_SIZE: [f32; 2] = [200.0, 150.0];

/// Font sizes offered in the "Meme Text > Font Size" menu.
pub const FONT_SIZES: &[u32] = &[30, 40, 50, 60, 70, 80, 90];
pub const DEFAULT_FONT_SIZE: u32 = 30;

/// Supported image suffixes, matched case-insensitively against a path or URL.
pub const IMAGE_SUFFIXES: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".bmp"];

/// Same list without the dot, as file dialogs want it.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];

/// The editable field never lays out narrower than this.
pub const FIELD_MIN_WIDTH: f32 = 200.0;

/// Side length of the triangular resize handle in the overlay's bottom-right corner.
pub const RESIZE_HANDLE_SIZE: f32 = 15.0;

/// Caption outline thickness in pixels.
pub const OUTLINE_WIDTH: i32 = 2;

/// memeframe - put captions on a picture
#[derive(Parser, Debug, Default)]
#[command(name = "memeframe")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Image to open at start-up
    #[arg(value_name = "IMAGE")]
    pub image_path: Option<PathBuf>,
}
