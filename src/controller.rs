//! Application-level commands: open, drop, save, print and add caption.
//!
//! Everything here runs on the UI thread. Pixel I/O is delegated to
//! [`render`](crate::render), [`print`](crate::print) and the background
//! [`LoadManager`]. Failures are logged and otherwise ignored so the app stays usable.

use std::path::{Path, PathBuf};

use crate::canvas::Canvas;
use crate::error::Result;
use crate::load_logic::{ImageSource, LoadEvent, LoadManager};
use crate::overlay::OverlayId;
use crate::print;
use crate::render::{self, CaptionFont};
use crate::settings::{DEFAULT_FONT_SIZE, IMAGE_EXTENSIONS, IMAGE_SUFFIXES};

/// Returns true if the path or URL ends in one of the supported image suffixes,
/// ignoring case. Only the name is checked, never the file contents.
pub fn is_valid_image_file(url: &str) -> bool {
    let lower = url.to_lowercase();
    IMAGE_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

/// What was dropped on the window. Either part may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dropped {
    pub files: Vec<PathBuf>,
    pub url: Option<String>,
}

/// Whether a drag hovering over the window should be accepted.
pub fn accepts_drag(dropped: &Dropped) -> bool {
    !dropped.files.is_empty() || dropped.url.as_deref().is_some_and(is_valid_image_file)
}

/// Picks the source to load from a drop, or `None` when the user should be
/// asked with a file dialog instead.
pub fn resolve_drop(dropped: &Dropped) -> Option<ImageSource> {
    if let (Some(path), None) = (dropped.files.first(), &dropped.url) {
        let name = path.to_string_lossy();
        return is_valid_image_file(&name).then(|| ImageSource::Path(path.clone()));
    }

    let url = dropped.url.as_deref()?;
    if !is_valid_image_file(url) {
        return None;
    }
    match ImageSource::from_url(url) {
        Ok(source) => Some(source),
        Err(e) => {
            log::error!("{e}");
            None
        }
    }
}

pub struct MemeController {
    canvas: Canvas,
    font: CaptionFont,
    loads: LoadManager,
    font_size: u32,
    loads_in_flight: usize,
}

impl MemeController {
    /// `notify` is called from the loader thread whenever a load finishes.
    pub fn new<F>(notify: F) -> Result<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        Ok(Self {
            canvas: Canvas::new(),
            font: CaptionFont::new()?,
            loads: LoadManager::new(notify),
            font_size: DEFAULT_FONT_SIZE,
            loads_in_flight: 0,
        })
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn font(&self) -> &CaptionFont {
        &self.font
    }

    /// Font size for captions added from now on.
    pub fn font_size(&self) -> u32 {
        self.font_size
    }

    pub fn set_font_size(&mut self, size: u32) {
        log::debug!("font size set to {size}");
        self.font_size = size;
    }

    /// True while at least one image is loading.
    pub fn is_busy(&self) -> bool {
        self.loads_in_flight > 0
    }

    pub fn add_text(&mut self) -> OverlayId {
        let id = self.canvas.add_meme_text(self.font_size, &self.font);
        log::info!("added caption {:?} at {}px", id, self.font_size);
        id
    }

    /// Replaces the caption's text and re-measures it.
    pub fn edit_text(&mut self, id: OverlayId, text: &str) {
        self.canvas.set_text(id, text, &self.font);
    }

    /// Shows an open dialog and loads the chosen picture.
    pub fn open_image_file(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file()
        else {
            return;
        };
        self.open_path(path);
    }

    /// Loads `path` if it names a supported image; anything else is logged and skipped.
    pub fn open_path(&mut self, path: PathBuf) {
        if is_valid_image_file(&path.to_string_lossy()) {
            self.load_and_display(ImageSource::Path(path));
        } else {
            log::warn!("ignoring unsupported file {}", path.display());
        }
    }

    /// Loads whatever was dropped; falls back to the open dialog when it isn't usable.
    pub fn handle_drop(&mut self, dropped: &Dropped) {
        log::debug!("dropped {:?}", dropped);
        match resolve_drop(dropped) {
            Some(source) => self.load_and_display(source),
            None => self.open_image_file(),
        }
    }

    /// Starts a background load; the busy indicator stays up until it reports back.
    pub fn load_and_display(&mut self, source: ImageSource) {
        log::info!("loading {source}");
        match self.loads.load(source) {
            Ok(()) => self.loads_in_flight += 1,
            Err(e) => log::error!("{e}"),
        }
    }

    /// Applies finished loads. Call once per frame on the UI thread.
    ///
    /// Returns true if the background changed.
    pub fn poll_loads(&mut self) -> bool {
        let mut changed = false;
        for event in self.loads.poll_events() {
            match event {
                LoadEvent::Loaded { source, image } => {
                    log::info!("loaded {source} ({}x{})", image.width(), image.height());
                    self.canvas.replace_background(image);
                    self.loads_in_flight = self.loads_in_flight.saturating_sub(1);
                    changed = true;
                }
                LoadEvent::Failed { source, error } => {
                    log::error!("failed to load {source}: {error}");
                    self.loads_in_flight = self.loads_in_flight.saturating_sub(1);
                }
                LoadEvent::Error(error) => {
                    log::error!("{error}");
                    self.loads_in_flight = 0;
                }
            }
        }
        changed
    }

    /// Shows a save dialog and writes the meme as PNG.
    pub fn save_image_as(&self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name("meme.png")
            .save_file()
        else {
            return;
        };
        if let Err(e) = self.save_png(&path) {
            log::error!("failed to save {}: {e}", path.display());
        }
    }

    /// Renders the canvas and writes it to `path` as PNG.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        let image = render::render_canvas(&self.canvas, &self.font);
        render::save_png(&image, path)?;
        log::info!("saved {}x{} meme to {}", image.width(), image.height(), path.display());
        Ok(())
    }

    /// Sends the rendered canvas to the printer.
    pub fn print_meme(&self) {
        let image = render::render_canvas(&self.canvas, &self.font);
        match print::print_image(&image) {
            Ok(path) => log::info!("printed {}", path.display()),
            Err(e) => log::error!("{e}"),
        }
    }
}
