//! The composition surface: background picture plus an ordered stack of captions.

use eframe::egui::{vec2, Pos2, Rect, Vec2};
use image::{DynamicImage, GenericImageView};

use crate::overlay::{HitTarget, Overlay, OverlayAction, OverlayEvent, OverlayId, TextMeasure, ViewMode};

/// Where new captions appear.
pub const DEFAULT_POSITION: Pos2 = Pos2::ZERO;

/// Background image and captions. Later entries in `overlays` paint on top.
#[derive(Default)]
pub struct Canvas {
    background: Option<DynamicImage>,
    overlays: Vec<Overlay>,
    next_id: u64,
    text_count: u64,
    // Width the background is scaled to on screen; `None` shows it at native size.
    fit_width: Option<f32>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn background(&self) -> Option<&DynamicImage> {
        self.background.as_ref()
    }

    /// Swaps the picture. Captions stay where they are.
    pub fn replace_background(&mut self, image: DynamicImage) {
        log::debug!("background replaced ({}x{})", image.width(), image.height());
        self.background = Some(image);
    }

    pub fn set_fit_width(&mut self, width: Option<f32>) {
        self.fit_width = width.filter(|w| *w > 0.0);
    }

    /// On-screen size of the background, aspect ratio preserved.
    pub fn background_display_size(&self) -> Option<Vec2> {
        let (w, h) = self.background.as_ref()?.dimensions();
        if w == 0 || h == 0 {
            return Some(Vec2::ZERO);
        }
        let native = vec2(w as f32, h as f32);
        Some(match self.fit_width {
            Some(fit) => vec2(fit, fit * native.y / native.x),
            None => native,
        })
    }

    /// Overlays in paint order, back to front.
    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    pub fn overlay(&self, id: OverlayId) -> Option<&Overlay> {
        self.overlays.iter().find(|o| o.id() == id)
    }

    pub fn overlay_mut(&mut self, id: OverlayId) -> Option<&mut Overlay> {
        self.overlays.iter_mut().find(|o| o.id() == id)
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// Appends an Off-state caption at the default position, on top of the others.
    pub fn add_overlay(&mut self, text: impl Into<String>, font_size: u32, measure: &dyn TextMeasure) -> OverlayId {
        self.next_id += 1;
        let id = OverlayId(self.next_id);
        let overlay = Overlay::new(id, text, font_size, DEFAULT_POSITION, measure);
        log::debug!("added overlay {:?} {:?} at {}px", id, overlay.text(), font_size);
        self.overlays.push(overlay);
        id
    }

    /// Adds "MEME TEXT N", N counting up from 1 for the lifetime of the canvas.
    pub fn add_meme_text(&mut self, font_size: u32, measure: &dyn TextMeasure) -> OverlayId {
        self.text_count += 1;
        let text = format!("MEME TEXT {}", self.text_count);
        self.add_overlay(text, font_size, measure)
    }

    /// The caption currently being edited, if any.
    pub fn editing(&self) -> Option<OverlayId> {
        self.overlays.iter().find(|o| o.mode() == ViewMode::Edit).map(Overlay::id)
    }

    /// Feeds one event to one caption and applies what it asks of the collection.
    ///
    /// Returns the action so the caller can react (e.g. move keyboard focus).
    pub fn dispatch(&mut self, id: OverlayId, event: OverlayEvent) -> OverlayAction {
        let Some(index) = self.index_of(id) else {
            return OverlayAction::None;
        };
        let action = self.overlays[index].handle(event);
        match action {
            OverlayAction::None => {}
            OverlayAction::BringToFront => {
                let overlay = self.overlays.remove(index);
                self.overlays.push(overlay);
            }
            OverlayAction::EnteredEdit => {
                // Only one caption edits at a time.
                for other in self.overlays.iter_mut().filter(|o| o.id() != id) {
                    if other.mode() == ViewMode::Edit {
                        other.handle(OverlayEvent::ClickedElsewhere);
                    }
                }
            }
            OverlayAction::Remove => {
                let removed = self.overlays.remove(index);
                log::info!("removed overlay {:?} {:?}", removed.id(), removed.text());
            }
        }
        action
    }

    /// A click on the surface that hit no caption: every caption drops to Off.
    pub fn click_elsewhere(&mut self) {
        for overlay in &mut self.overlays {
            overlay.handle(OverlayEvent::ClickedElsewhere);
        }
    }

    pub fn set_text(&mut self, id: OverlayId, text: impl Into<String>, measure: &dyn TextMeasure) {
        if let Some(overlay) = self.overlay_mut(id) {
            overlay.set_text(text, measure);
        }
    }

    /// Topmost caption under `pos`.
    pub fn overlay_at(&self, pos: Pos2) -> Option<(OverlayId, HitTarget)> {
        self.overlays.iter().rev().find_map(|o| o.hit_test(pos).map(|target| (o.id(), target)))
    }

    /// Bounds of everything visible, measured from the canvas origin.
    pub fn content_rect(&self) -> Rect {
        let mut rect = Rect::from_min_size(Pos2::ZERO, Vec2::ZERO);
        if let Some(size) = self.background_display_size() {
            rect = rect.union(Rect::from_min_size(Pos2::ZERO, size));
        }
        for overlay in &self.overlays {
            rect = rect.union(overlay.rect());
        }
        rect
    }

    /// Width and height of the area a snapshot covers.
    pub fn content_size(&self) -> Vec2 {
        let rect = self.content_rect();
        vec2(rect.max.x.max(0.0).ceil(), rect.max.y.max(0.0).ceil())
    }

    fn index_of(&self, id: OverlayId) -> Option<usize> {
        self.overlays.iter().position(|o| o.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::tests::FixedMeasure;
    use crate::overlay::{Focus, OverlayKey};
    use eframe::egui::pos2;

    fn texts(canvas: &Canvas) -> Vec<&str> {
        canvas.overlays().iter().map(Overlay::text).collect()
    }

    fn canvas_with(n: usize) -> (Canvas, Vec<OverlayId>) {
        let mut canvas = Canvas::new();
        let ids = (0..n).map(|_| canvas.add_meme_text(30, &FixedMeasure)).collect();
        (canvas, ids)
    }

    #[test]
    fn meme_text_counter_starts_at_one_and_increases() {
        let (canvas, _) = canvas_with(3);
        assert_eq!(texts(&canvas), ["MEME TEXT 1", "MEME TEXT 2", "MEME TEXT 3"]);
    }

    #[test]
    fn counter_does_not_reuse_numbers_after_delete() {
        let (mut canvas, ids) = canvas_with(2);
        canvas.dispatch(ids[1], OverlayEvent::Key(OverlayKey::Delete));
        canvas.add_meme_text(30, &FixedMeasure);
        assert_eq!(texts(&canvas), ["MEME TEXT 1", "MEME TEXT 3"]);
    }

    #[test]
    fn new_overlay_uses_given_font_size_only() {
        let mut canvas = Canvas::new();
        let first = canvas.add_meme_text(30, &FixedMeasure);
        let second = canvas.add_meme_text(70, &FixedMeasure);
        assert_eq!(canvas.overlay(first).unwrap().font_size(), 30);
        assert_eq!(canvas.overlay(second).unwrap().font_size(), 70);
        assert_eq!(canvas.overlay(second).unwrap().position(), DEFAULT_POSITION);
        assert_eq!(canvas.overlay(second).unwrap().focus(), Focus::Off);
    }

    #[test]
    fn delete_removes_exactly_one_and_keeps_order() {
        let (mut canvas, ids) = canvas_with(4);
        let action = canvas.dispatch(ids[1], OverlayEvent::Key(OverlayKey::Delete));
        assert_eq!(action, OverlayAction::Remove);
        assert_eq!(canvas.len(), 3);
        assert_eq!(texts(&canvas), ["MEME TEXT 1", "MEME TEXT 3", "MEME TEXT 4"]);
        assert!(canvas.overlay(ids[1]).is_none());
    }

    #[test]
    fn press_brings_to_front() {
        let (mut canvas, ids) = canvas_with(3);
        canvas.dispatch(ids[0], OverlayEvent::Pressed { pos: pos2(5.0, 5.0), target: HitTarget::Body });
        assert_eq!(texts(&canvas), ["MEME TEXT 2", "MEME TEXT 3", "MEME TEXT 1"]);

        canvas.dispatch(ids[1], OverlayEvent::Pressed { pos: pos2(5.0, 5.0), target: HitTarget::Body });
        assert_eq!(texts(&canvas), ["MEME TEXT 3", "MEME TEXT 1", "MEME TEXT 2"]);
    }

    #[test]
    fn pressing_resize_handle_does_not_reorder() {
        let (mut canvas, ids) = canvas_with(2);
        canvas.dispatch(ids[0], OverlayEvent::Pressed { pos: pos2(5.0, 5.0), target: HitTarget::ResizeHandle });
        assert_eq!(texts(&canvas), ["MEME TEXT 1", "MEME TEXT 2"]);
    }

    #[test]
    fn topmost_overlay_wins_hit_test() {
        let (mut canvas, ids) = canvas_with(2);
        assert_eq!(canvas.overlay_at(pos2(5.0, 5.0)), Some((ids[1], HitTarget::Body)));

        canvas.dispatch(ids[0], OverlayEvent::Pressed { pos: pos2(5.0, 5.0), target: HitTarget::Body });
        assert_eq!(canvas.overlay_at(pos2(5.0, 5.0)), Some((ids[0], HitTarget::Body)));
        assert_eq!(canvas.overlay_at(pos2(900.0, 900.0)), None);
    }

    #[test]
    fn only_one_overlay_edits_at_a_time() {
        let (mut canvas, ids) = canvas_with(2);
        canvas.dispatch(ids[0], OverlayEvent::DoubleClicked);
        assert_eq!(canvas.editing(), Some(ids[0]));

        canvas.dispatch(ids[1], OverlayEvent::DoubleClicked);
        assert_eq!(canvas.editing(), Some(ids[1]));
        assert_eq!(canvas.overlay(ids[0]).unwrap().mode(), ViewMode::Display);
        assert_eq!(canvas.overlay(ids[0]).unwrap().focus(), Focus::Off);
    }

    #[test]
    fn click_elsewhere_commits_everything() {
        let (mut canvas, ids) = canvas_with(2);
        canvas.dispatch(ids[0], OverlayEvent::DoubleClicked);
        canvas.dispatch(ids[1], OverlayEvent::PointerEntered);
        canvas.click_elsewhere();
        assert_eq!(canvas.editing(), None);
        assert!(canvas.overlays().iter().all(|o| o.focus() == Focus::Off));
    }

    #[test]
    fn dispatch_to_unknown_overlay_is_ignored() {
        let (mut canvas, _) = canvas_with(1);
        let action = canvas.dispatch(OverlayId(99), OverlayEvent::Key(OverlayKey::Delete));
        assert_eq!(action, OverlayAction::None);
        assert_eq!(canvas.len(), 1);
    }

    #[test]
    fn background_replacement_keeps_overlays() {
        let (mut canvas, _) = canvas_with(2);
        canvas.replace_background(DynamicImage::new_rgba8(40, 20));
        canvas.replace_background(DynamicImage::new_rgba8(80, 40));
        assert_eq!(canvas.len(), 2);
        assert_eq!(canvas.background().unwrap().width(), 80);
    }

    #[test]
    fn background_scales_to_fit_width() {
        let mut canvas = Canvas::new();
        assert_eq!(canvas.background_display_size(), None);
        canvas.replace_background(DynamicImage::new_rgba8(400, 200));
        assert_eq!(canvas.background_display_size(), Some(vec2(400.0, 200.0)));
        canvas.set_fit_width(Some(800.0));
        assert_eq!(canvas.background_display_size(), Some(vec2(800.0, 400.0)));
        canvas.set_fit_width(Some(0.0));
        assert_eq!(canvas.background_display_size(), Some(vec2(400.0, 200.0)));
    }

    #[test]
    fn content_size_covers_background_and_overlays() {
        let mut canvas = Canvas::new();
        assert_eq!(canvas.content_size(), Vec2::ZERO);

        canvas.replace_background(DynamicImage::new_rgba8(100, 50));
        assert_eq!(canvas.content_size(), vec2(100.0, 50.0));

        // 200 wide (field minimum), 30 + padding tall
        let id = canvas.add_meme_text(30, &FixedMeasure);
        assert_eq!(canvas.content_size(), vec2(200.0, 50.0));

        canvas.dispatch(id, OverlayEvent::Pressed { pos: pos2(0.0, 0.0), target: HitTarget::Body });
        canvas.dispatch(id, OverlayEvent::Released { pos: pos2(10.0, 60.0) });
        assert_eq!(canvas.content_size(), vec2(210.0, 98.0));
    }
}
