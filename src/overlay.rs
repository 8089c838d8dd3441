//! A single caption laid over the picture.
//!
//! The caption is driven as a small state machine: the UI turns raw pointer and
//! keyboard input into [`OverlayEvent`]s, [`Overlay::handle`] applies the
//! transition and returns an [`OverlayAction`] for anything that concerns the
//! surrounding collection (raising, removal, edit exclusivity). This keeps all
//! interaction rules testable without a window.

use eframe::egui::{pos2, vec2, Pos2, Rect, Vec2};

use crate::settings::{FIELD_MIN_WIDTH, RESIZE_HANDLE_SIZE};

/// Space between the caption text and the overlay border.
pub const PADDING: f32 = 4.0;

/// Reports how much room a piece of text needs at a given font size.
pub trait TextMeasure {
    /// Width and height in canvas pixels.
    fn measure(&self, text: &str, font_size: u32) -> Vec2;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(pub u64);

/// Which sub-widget is showing: the static label or the editable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Display,
    Edit,
}

/// Whether the overlay is highlighted (border, resize handle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Off,
    On,
}

/// Part of the overlay under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Body,
    ResizeHandle,
}

/// Lives only while a pointer button is held on the overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragSession {
    /// `anchor` is the pointer's offset from the overlay's top-left corner.
    Move { anchor: Vec2 },
    /// `anchor` is where the handle was grabbed, `anchor_width` the width at that moment.
    Resize { anchor: Pos2, anchor_width: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKey {
    Enter,
    Escape,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayEvent {
    PointerEntered,
    PointerExited,
    Pressed { pos: Pos2, target: HitTarget },
    Dragged { pos: Pos2 },
    Released { pos: Pos2 },
    DoubleClicked,
    Key(OverlayKey),
    /// A click landed somewhere on the surface outside this overlay.
    ClickedElsewhere,
}

/// What the owner of the overlay has to do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayAction {
    None,
    BringToFront,
    EnteredEdit,
    Remove,
}

#[derive(Debug, Clone)]
pub struct Overlay {
    id: OverlayId,
    text: String,
    font_size: u32,
    position: Pos2,
    width: f32,
    intrinsic: Vec2,
    mode: ViewMode,
    focus: Focus,
    drag: Option<DragSession>,
    select_all_pending: bool,
}

impl Overlay {
    /// A new overlay in the Off state, sized to fit its text and the editable field.
    pub fn new(id: OverlayId, text: impl Into<String>, font_size: u32, position: Pos2, measure: &dyn TextMeasure) -> Self {
        let text = text.into();
        let intrinsic = measure.measure(&text, font_size);
        Self {
            id,
            text,
            font_size,
            position,
            width: intrinsic.x.max(FIELD_MIN_WIDTH),
            intrinsic,
            mode: ViewMode::Display,
            focus: Focus::Off,
            drag: None,
            select_all_pending: false,
        }
    }

    pub fn id(&self) -> OverlayId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn font_size(&self) -> u32 {
        self.font_size
    }

    pub fn position(&self) -> Pos2 {
        self.position
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    /// Space the label needs at the current font size.
    pub fn intrinsic_size(&self) -> Vec2 {
        self.intrinsic
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn drag_session(&self) -> Option<DragSession> {
        self.drag
    }

    /// A pointer position that reproduces the current geometry if fed to the
    /// running drag. Lets a drag end cleanly when the real position is unknown.
    pub fn drag_pointer_pos(&self) -> Option<Pos2> {
        match self.drag? {
            DragSession::Move { anchor } => Some(self.position + anchor),
            DragSession::Resize { anchor, anchor_width } => Some(pos2(anchor.x + self.width - anchor_width, anchor.y)),
        }
    }

    pub fn height(&self) -> f32 {
        self.intrinsic.y + 2.0 * PADDING
    }

    pub fn rect(&self) -> Rect {
        Rect::from_min_size(self.position, vec2(self.width, self.height()))
    }

    pub fn resize_handle_rect(&self) -> Rect {
        let max = self.rect().max;
        Rect::from_min_max(pos2(max.x - RESIZE_HANDLE_SIZE, max.y - RESIZE_HANDLE_SIZE), max)
    }

    pub fn label_visible(&self) -> bool {
        self.mode == ViewMode::Display
    }

    pub fn field_visible(&self) -> bool {
        self.mode == ViewMode::Edit
    }

    pub fn resize_handle_visible(&self) -> bool {
        self.focus == Focus::On
    }

    /// Orange border and darkened background.
    pub fn highlighted(&self) -> bool {
        self.focus == Focus::On
    }

    /// Which part of the overlay `pos` falls on, if any.
    ///
    /// The handle only counts while it is visible.
    pub fn hit_test(&self, pos: Pos2) -> Option<HitTarget> {
        if self.resize_handle_visible() && self.resize_handle_rect().contains(pos) {
            Some(HitTarget::ResizeHandle)
        } else if self.rect().contains(pos) {
            Some(HitTarget::Body)
        } else {
            None
        }
    }

    /// True once after entering Edit; the field selects its whole text when it sees this.
    pub fn take_select_all(&mut self) -> bool {
        std::mem::take(&mut self.select_all_pending)
    }

    /// Updates the text shown by both the field and the label.
    pub fn set_text(&mut self, text: impl Into<String>, measure: &dyn TextMeasure) {
        self.text = text.into();
        self.set_intrinsic_size(measure.measure(&self.text, self.font_size));
    }

    #[cfg(test)]
    fn set_font_size(&mut self, font_size: u32, measure: &dyn TextMeasure) {
        self.font_size = font_size;
        self.set_intrinsic_size(measure.measure(&self.text, self.font_size));
    }

    /// Records the label's rendered size; the overlay never stays narrower than its text.
    pub fn set_intrinsic_size(&mut self, size: Vec2) {
        self.intrinsic = size;
        if self.width < size.x {
            self.width = size.x;
        }
    }

    pub fn handle(&mut self, event: OverlayEvent) -> OverlayAction {
        match event {
            OverlayEvent::PointerEntered => {
                if self.mode != ViewMode::Edit {
                    self.focus_on();
                }
                OverlayAction::None
            }
            OverlayEvent::PointerExited => {
                if self.mode != ViewMode::Edit && self.drag.is_none() {
                    self.focus_off();
                }
                OverlayAction::None
            }
            OverlayEvent::Pressed { pos, target: HitTarget::ResizeHandle } => {
                self.drag = Some(DragSession::Resize { anchor: pos, anchor_width: self.width });
                OverlayAction::None
            }
            OverlayEvent::Pressed { pos, target: HitTarget::Body } => {
                self.drag = Some(DragSession::Move { anchor: pos - self.position });
                OverlayAction::BringToFront
            }
            OverlayEvent::Dragged { pos } => {
                self.drag_to(pos);
                OverlayAction::None
            }
            OverlayEvent::Released { pos } => {
                self.drag_to(pos);
                self.drag = None;
                OverlayAction::None
            }
            OverlayEvent::DoubleClicked => {
                self.mode = ViewMode::Edit;
                self.select_all_pending = true;
                self.focus_on();
                OverlayAction::EnteredEdit
            }
            OverlayEvent::Key(OverlayKey::Enter) | OverlayEvent::Key(OverlayKey::Escape) => {
                if self.mode == ViewMode::Edit {
                    self.focus_off();
                }
                OverlayAction::None
            }
            OverlayEvent::Key(OverlayKey::Delete) => OverlayAction::Remove,
            OverlayEvent::ClickedElsewhere => {
                self.focus_off();
                OverlayAction::None
            }
        }
    }

    fn drag_to(&mut self, pos: Pos2) {
        match self.drag {
            Some(DragSession::Move { anchor }) => {
                self.position = pos - anchor;
            }
            Some(DragSession::Resize { anchor, anchor_width }) => {
                let new_width = anchor_width + (pos.x - anchor.x);
                if new_width >= self.intrinsic.x {
                    self.width = new_width;
                }
            }
            None => {}
        }
    }

    fn focus_on(&mut self) {
        self.focus = Focus::On;
    }

    fn focus_off(&mut self) {
        self.mode = ViewMode::Display;
        self.focus = Focus::Off;
    }
}
