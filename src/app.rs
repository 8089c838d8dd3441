//! The window: menu bar, the meme surface and its busy indicator.
//!
//! Raw egui pointer and keyboard input is translated into [`OverlayEvent`]s here;
//! the rules for what those events do live in [`crate::overlay`] and [`crate::canvas`].

use eframe::egui;
use eframe::egui::text::{CCursor, CCursorRange};
use eframe::egui::{pos2, vec2, Align2, Color32, FontId, Key, KeyboardShortcut, Modifiers, PointerButton, Pos2, Rect, Stroke, Vec2};
use std::path::PathBuf;

use crate::controller::{accepts_drag, Dropped, MemeController};
use crate::error::Result;
use crate::overlay::{HitTarget, Overlay, OverlayEvent, OverlayId, OverlayKey};
use crate::render::text_origin;
use crate::settings::{FONT_SIZES, OUTLINE_WIDTH, RESIZE_HANDLE_SIZE};

const HIGHLIGHT_BORDER: Color32 = Color32::from_rgb(255, 165, 0);
const HIGHLIGHT_FILL: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 51);
const HANDLE_FILL: Color32 = Color32::from_rgb(255, 69, 0);

const OPEN: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::O);
const SAVE_AS: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::A);
const PRINT: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::P);
const QUIT: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::Q);

pub struct MemeApp {
    controller: MemeController,
    texture: Option<egui::TextureHandle>,

    // Pointer bookkeeping
    hovered: Option<OverlayId>,
    pressed: Option<OverlayId>,
    // Caption that last took keyboard focus (hover or double-click); keeps it after the pointer leaves.
    key_target: Option<OverlayId>,

    // Editable field contents of the caption in Edit mode
    edit_buffer: String,
    edit_buffer_owner: Option<OverlayId>,
    field_rect: Option<Rect>,

    // Screen position of the canvas' top-left corner, as of the last frame
    canvas_origin: Pos2,
}

impl MemeApp {
    pub fn new(cc: &eframe::CreationContext<'_>, initial_path: Option<PathBuf>) -> Result<Self> {
        let ctx = cc.egui_ctx.clone();
        let mut controller = MemeController::new(move || ctx.request_repaint())?;

        if let Some(path) = initial_path {
            controller.open_path(path);
        }

        Ok(Self::with_controller(controller))
    }

    fn with_controller(controller: MemeController) -> Self {
        Self {
            controller,
            texture: None,
            hovered: None,
            pressed: None,
            key_target: None,
            edit_buffer: String::new(),
            edit_buffer_owner: None,
            field_rect: None,
            canvas_origin: Pos2::ZERO,
        }
    }

    fn load_texture(&mut self, ctx: &egui::Context) {
        let Some(background) = self.controller.canvas().background() else {
            self.texture = None;
            return;
        };
        let rgba = background.to_rgba8();
        let size = [rgba.width() as usize, rgba.height() as usize];
        let pixels = rgba.into_raw();
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &pixels);
        self.texture = Some(ctx.load_texture("background", color_image, egui::TextureOptions::LINEAR));
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.input_mut(|i| i.consume_shortcut(&OPEN)) {
            self.controller.open_image_file();
        }
        if ctx.input_mut(|i| i.consume_shortcut(&SAVE_AS)) {
            self.controller.save_image_as();
        }
        if ctx.input_mut(|i| i.consume_shortcut(&PRINT)) {
            self.controller.print_meme();
        }
        if ctx.input_mut(|i| i.consume_shortcut(&QUIT)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }

    fn handle_drops(&mut self, ctx: &egui::Context) {
        let dropped_files = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped_files.is_empty() {
            return;
        }
        let dropped = Dropped {
            files: dropped_files.iter().filter_map(|f| f.path.clone()).collect(),
            url: None,
        };
        self.controller.handle_drop(&dropped);
    }

    fn menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.add(egui::Button::new("Open").shortcut_text(ctx.format_shortcut(&OPEN))).clicked() {
                        ui.close_menu();
                        self.controller.open_image_file();
                    }
                    if ui.add(egui::Button::new("Save As").shortcut_text(ctx.format_shortcut(&SAVE_AS))).clicked() {
                        ui.close_menu();
                        self.controller.save_image_as();
                    }
                    if ui.add(egui::Button::new("Print").shortcut_text(ctx.format_shortcut(&PRINT))).clicked() {
                        ui.close_menu();
                        self.controller.print_meme();
                    }
                    if ui.add(egui::Button::new("Quit").shortcut_text(ctx.format_shortcut(&QUIT))).clicked() {
                        ui.close_menu();
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.menu_button("Meme Text", |ui| {
                    ui.menu_button("Font Size", |ui| {
                        let mut selected = self.controller.font_size();
                        for &size in FONT_SIZES {
                            ui.radio_value(&mut selected, size, size.to_string());
                        }
                        if selected != self.controller.font_size() {
                            self.controller.set_font_size(selected);
                        }
                    });
                    if ui.button("Add Meme Text").clicked() {
                        ui.close_menu();
                        self.controller.add_text();
                    }
                });
            });
        });
    }

    /// Turns this frame's pointer state into caption events. `origin` is the canvas' top-left on screen.
    fn handle_pointer(&mut self, ctx: &egui::Context, rect: Rect, origin: Pos2) {
        let pointer = ctx.input(|i| i.pointer.clone());
        let to_canvas = |p: Pos2| p - origin.to_vec2();
        let over_field = |p: Pos2| self.field_rect.is_some_and(|r| r.contains(p));
        let screen_pos = pointer.interact_pos().filter(|p| rect.contains(*p));
        let canvas = self.controller.canvas_mut();

        let hit = screen_pos.and_then(|p| canvas.overlay_at(to_canvas(p)));
        let hit_id = hit.map(|(id, _)| id);
        if hit_id != self.hovered {
            if let Some(old) = self.hovered {
                canvas.dispatch(old, OverlayEvent::PointerExited);
            }
            if let Some(new) = hit_id {
                canvas.dispatch(new, OverlayEvent::PointerEntered);
                self.key_target = Some(new);
            }
            self.hovered = hit_id;
        }

        let Some(screen_pos) = screen_pos else {
            if pointer.primary_released() {
                self.release(pointer.interact_pos().or(pointer.latest_pos()).map(to_canvas));
            }
            return;
        };
        let pos = to_canvas(screen_pos);

        if pointer.primary_pressed() {
            // The handle stays usable while the field is showing.
            if let Some((id, target)) = hit.filter(|(_, t)| *t == HitTarget::ResizeHandle || !over_field(screen_pos)) {
                canvas.dispatch(id, OverlayEvent::Pressed { pos, target });
                self.pressed = Some(id);
            }
        }

        if let Some(id) = self.pressed {
            if pointer.primary_down() && pointer.delta() != Vec2::ZERO {
                canvas.dispatch(id, OverlayEvent::Dragged { pos });
            }
        }

        if pointer.button_double_clicked(PointerButton::Primary) && !over_field(screen_pos) {
            if let Some((id, HitTarget::Body)) = hit {
                canvas.dispatch(id, OverlayEvent::DoubleClicked);
                self.key_target = Some(id);
            }
        } else if pointer.button_clicked(PointerButton::Primary) && hit.is_none() && !over_field(screen_pos) {
            canvas.click_elsewhere();
        }

        if pointer.primary_released() {
            self.release(Some(pos));
        }
    }

    /// Ends the drag on the pressed caption. If the pointer already left it, the
    /// exit that was ignored during the drag is delivered now.
    fn release(&mut self, pos: Option<Pos2>) {
        let Some(id) = self.pressed.take() else {
            return;
        };
        let canvas = self.controller.canvas_mut();
        let pos = pos.or_else(|| canvas.overlay(id).and_then(Overlay::drag_pointer_pos));
        if let Some(pos) = pos {
            canvas.dispatch(id, OverlayEvent::Released { pos });
        }
        if self.hovered != Some(id) {
            canvas.dispatch(id, OverlayEvent::PointerExited);
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let canvas = self.controller.canvas_mut();
        if let Some(id) = canvas.editing() {
            if ctx.input(|i| i.key_pressed(Key::Enter)) {
                canvas.dispatch(id, OverlayEvent::Key(OverlayKey::Enter));
            }
            if ctx.input(|i| i.key_pressed(Key::Escape)) {
                canvas.dispatch(id, OverlayEvent::Key(OverlayKey::Escape));
            }
        }
        if ctx.input(|i| i.key_pressed(Key::Delete)) {
            if let Some(id) = canvas.editing().or(self.key_target) {
                canvas.dispatch(id, OverlayEvent::Key(OverlayKey::Delete));
                self.key_target = None;
                if self.hovered == Some(id) {
                    self.hovered = None;
                }
                if self.pressed == Some(id) {
                    self.pressed = None;
                }
            }
        }
    }

    fn paint_overlay(painter: &egui::Painter, overlay: &Overlay, origin: Vec2) {
        let rect = overlay.rect().translate(origin);
        if overlay.highlighted() {
            painter.rect_filled(rect, 0.0, HIGHLIGHT_FILL);
            painter.rect_stroke(rect, 0.0, Stroke::new(1.0, HIGHLIGHT_BORDER));
        }

        if overlay.label_visible() {
            let text_pos = text_origin(overlay) + origin;
            let font = FontId::proportional(overlay.font_size() as f32);
            let d = OUTLINE_WIDTH as f32;
            for offset in [vec2(-d, -d), vec2(0.0, -d), vec2(d, -d), vec2(-d, 0.0), vec2(d, 0.0), vec2(-d, d), vec2(0.0, d), vec2(d, d)] {
                painter.text(text_pos + offset, Align2::LEFT_TOP, overlay.text(), font.clone(), Color32::BLACK);
            }
            painter.text(text_pos, Align2::LEFT_TOP, overlay.text(), font, Color32::WHITE);
        }

        if overlay.resize_handle_visible() {
            let handle = overlay.resize_handle_rect().translate(origin);
            let points = vec![
                pos2(handle.max.x, handle.min.y),
                handle.max,
                pos2(handle.min.x, handle.max.y),
            ];
            painter.add(egui::Shape::convex_polygon(points, HANDLE_FILL, Stroke::NONE));
        }
    }

    /// Shows the editable field over the caption being edited and feeds text changes back.
    fn edit_field(&mut self, ui: &mut egui::Ui, origin: Vec2) {
        self.field_rect = None;
        let Some(id) = self.controller.canvas().editing() else {
            self.edit_buffer_owner = None;
            return;
        };
        let Some(overlay) = self.controller.canvas_mut().overlay_mut(id) else {
            return;
        };
        if self.edit_buffer_owner != Some(id) {
            self.edit_buffer = overlay.text().to_string();
            self.edit_buffer_owner = Some(id);
        }
        let select_all = overlay.take_select_all();
        let rect = overlay.rect().translate(origin);
        // Leave the resize handle uncovered.
        let rect = Rect::from_min_max(rect.min, pos2(rect.max.x - RESIZE_HANDLE_SIZE, rect.max.y));
        let font = FontId::proportional(overlay.font_size() as f32);

        let output = ui
            .allocate_new_ui(egui::UiBuilder::new().max_rect(rect), |ui| {
                egui::TextEdit::singleline(&mut self.edit_buffer)
                    .id(egui::Id::new(("caption-field", id.0)))
                    .font(font)
                    .text_color(Color32::WHITE)
                    .frame(false)
                    .horizontal_align(egui::Align::Center)
                    .desired_width(rect.width())
                    .show(ui)
            })
            .inner;

        if select_all {
            let mut state = output.state;
            let end = CCursor::new(self.edit_buffer.chars().count());
            state.cursor.set_char_range(Some(CCursorRange::two(CCursor::new(0), end)));
            state.store(ui.ctx(), output.response.id);
            output.response.request_focus();
        }
        if output.response.changed() {
            self.controller.edit_text(id, &self.edit_buffer);
        }
        self.field_rect = Some(output.response.rect);
    }

    fn set_cursor(&self, ctx: &egui::Context, rect: Rect, origin: Vec2) {
        let Some(pos) = ctx.input(|i| i.pointer.hover_pos()).filter(|p| rect.contains(*p)) else {
            return;
        };
        match self.controller.canvas().overlay_at(pos - origin) {
            Some((_, HitTarget::ResizeHandle)) => ctx.set_cursor_icon(egui::CursorIcon::ResizeHorizontal),
            Some((_, HitTarget::Body)) => ctx.set_cursor_icon(egui::CursorIcon::PointingHand),
            None => {}
        }
    }
}

impl eframe::App for MemeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.show(ctx);
    }
}

impl MemeApp {
    /// One frame of the whole window.
    fn show(&mut self, ctx: &egui::Context) {
        if self.controller.poll_loads() {
            self.load_texture(ctx);
        }

        self.handle_shortcuts(ctx);
        self.handle_drops(ctx);
        self.menu_bar(ctx);

        egui::CentralPanel::default().frame(egui::Frame::none()).show(ctx, |ui| {
            let (rect, _response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
            let origin = rect.min.to_vec2();
            self.canvas_origin = rect.min;

            self.controller.canvas_mut().set_fit_width(Some(rect.width()));
            self.handle_pointer(ctx, rect, rect.min);
            self.handle_keys(ctx);

            let painter = ui.painter_at(rect);
            painter.rect_filled(rect, 0.0, Color32::from_gray(30));

            if let (Some(texture), Some(size)) = (&self.texture, self.controller.canvas().background_display_size()) {
                painter.image(
                    texture.id(),
                    Rect::from_min_size(rect.min, size),
                    Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                    Color32::WHITE,
                );
            } else if self.controller.canvas().is_empty() {
                painter.text(rect.center(), Align2::CENTER_CENTER, "Open an image", FontId::proportional(19.0), Color32::GRAY);
            }

            for overlay in self.controller.canvas().overlays() {
                Self::paint_overlay(&painter, overlay, origin);
            }
            self.edit_field(ui, origin);
            self.set_cursor(ctx, rect, origin);

            let hovering = ctx.input(|i| {
                let files = i.raw.hovered_files.iter().filter_map(|f| f.path.clone()).collect();
                !i.raw.hovered_files.is_empty() && accepts_drag(&Dropped { files, url: None })
            });
            if hovering {
                painter.rect_stroke(rect.shrink(2.0), 0.0, Stroke::new(2.0, HIGHLIGHT_BORDER));
                painter.text(rect.center(), Align2::CENTER_CENTER, "Drop image to open", FontId::proportional(24.0), Color32::WHITE);
            }

            if self.controller.is_busy() {
                ui.put(
                    Rect::from_center_size(rect.center(), vec2(100.0, 100.0)),
                    egui::Spinner::new().size(100.0),
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{Focus, ViewMode};

    /// Drives [`MemeApp::show`] with synthetic input, one event per frame.
    struct Harness {
        ctx: egui::Context,
        app: MemeApp,
        time: f64,
    }

    impl Harness {
        fn new() -> Self {
            let controller = MemeController::new(|| {}).unwrap();
            let mut harness = Self { ctx: egui::Context::default(), app: MemeApp::with_controller(controller), time: 0.0 };
            harness.frame(vec![]);
            harness.frame(vec![]);
            harness
        }

        fn frame(&mut self, events: Vec<egui::Event>) {
            self.time += 0.02;
            let input = egui::RawInput {
                screen_rect: Some(Rect::from_min_size(Pos2::ZERO, vec2(800.0, 600.0))),
                time: Some(self.time),
                events,
                ..Default::default()
            };
            let app = &mut self.app;
            let _ = self.ctx.run(input, |ctx| app.show(ctx));
        }

        /// Lets enough time pass that the next click is not part of a double-click.
        fn pause(&mut self) {
            self.time += 1.0;
            self.frame(vec![]);
        }

        fn screen(&self, canvas_pos: Pos2) -> Pos2 {
            canvas_pos + self.app.canvas_origin.to_vec2()
        }

        fn move_to(&mut self, canvas_pos: Pos2) {
            let pos = self.screen(canvas_pos);
            self.frame(vec![egui::Event::PointerMoved(pos)]);
        }

        fn button(&mut self, canvas_pos: Pos2, pressed: bool) {
            let pos = self.screen(canvas_pos);
            self.frame(vec![egui::Event::PointerButton {
                pos,
                button: PointerButton::Primary,
                pressed,
                modifiers: Modifiers::NONE,
            }]);
        }

        fn press(&mut self, canvas_pos: Pos2) {
            self.button(canvas_pos, true);
        }

        fn release(&mut self, canvas_pos: Pos2) {
            self.button(canvas_pos, false);
        }

        fn click(&mut self, canvas_pos: Pos2) {
            self.press(canvas_pos);
            self.release(canvas_pos);
        }

        fn double_click(&mut self, canvas_pos: Pos2) {
            self.move_to(canvas_pos);
            self.click(canvas_pos);
            self.click(canvas_pos);
        }

        fn key(&mut self, key: Key) {
            self.frame(vec![egui::Event::Key {
                key,
                physical_key: None,
                pressed: true,
                repeat: false,
                modifiers: Modifiers::NONE,
            }]);
        }

        fn add_text(&mut self) -> OverlayId {
            let id = self.app.controller.add_text();
            self.frame(vec![]);
            id
        }

        fn overlay(&self, id: OverlayId) -> &Overlay {
            self.app.controller.canvas().overlay(id).unwrap()
        }
    }

    fn assert_near(a: Pos2, b: Pos2) {
        assert!((a - b).length() < 1e-3, "{a:?} != {b:?}");
    }

    #[test]
    fn hover_highlights_and_leaving_clears() {
        let mut h = Harness::new();
        let id = h.add_text();
        assert_eq!(h.overlay(id).focus(), Focus::Off);

        h.move_to(pos2(50.0, 10.0));
        assert_eq!(h.overlay(id).focus(), Focus::On);
        assert!(h.overlay(id).resize_handle_visible());

        h.move_to(pos2(400.0, 400.0));
        assert_eq!(h.overlay(id).focus(), Focus::Off);
        assert!(!h.overlay(id).resize_handle_visible());
    }

    #[test]
    fn press_drag_release_moves_caption() {
        let mut h = Harness::new();
        let id = h.add_text();

        h.move_to(pos2(10.0, 10.0));
        h.press(pos2(10.0, 10.0));
        h.move_to(pos2(60.0, 110.0));
        assert_near(h.overlay(id).position(), pos2(50.0, 100.0));

        h.release(pos2(60.0, 110.0));
        assert_near(h.overlay(id).position(), pos2(50.0, 100.0));
        assert!(h.overlay(id).drag_session().is_none());
        assert_eq!(h.overlay(id).focus(), Focus::On);
    }

    #[test]
    fn handle_drag_resizes_in_display_mode() {
        let mut h = Harness::new();
        let id = h.add_text();
        let width = h.overlay(id).width();
        let grab = h.overlay(id).resize_handle_rect().center();

        h.move_to(grab);
        h.press(grab);
        h.move_to(grab + vec2(60.0, 0.0));
        h.release(grab + vec2(60.0, 0.0));

        assert!((h.overlay(id).width() - (width + 60.0)).abs() < 1e-3);
        assert_near(h.overlay(id).position(), Pos2::ZERO);
    }

    #[test]
    fn handle_drag_resizes_while_editing() {
        let mut h = Harness::new();
        let id = h.add_text();
        h.double_click(pos2(20.0, 10.0));
        assert_eq!(h.overlay(id).mode(), ViewMode::Edit);
        assert!(h.app.field_rect.is_some());

        let width = h.overlay(id).width();
        let grab = h.overlay(id).resize_handle_rect().center();
        h.pause();
        h.move_to(grab);
        h.press(grab);
        h.move_to(grab + vec2(60.0, 0.0));
        h.release(grab + vec2(60.0, 0.0));

        assert!((h.overlay(id).width() - (width + 60.0)).abs() < 1e-3);
        assert_eq!(h.overlay(id).mode(), ViewMode::Edit);
    }

    #[test]
    fn release_away_from_caption_clears_focus() {
        let mut h = Harness::new();
        let id = h.add_text();
        h.move_to(pos2(50.0, 10.0));
        let grab = h.overlay(id).resize_handle_rect().center();

        h.move_to(grab);
        h.press(grab);
        h.move_to(pos2(100.0, 300.0));
        assert_eq!(h.overlay(id).focus(), Focus::On);
        h.release(pos2(100.0, 300.0));
        h.move_to(pos2(120.0, 320.0));

        assert_eq!(h.overlay(id).focus(), Focus::Off);
        assert!(!h.overlay(id).resize_handle_visible());
        assert!(h.overlay(id).drag_session().is_none());
    }

    #[test]
    fn release_outside_window_ends_drag() {
        let mut h = Harness::new();
        let id = h.add_text();

        h.move_to(pos2(10.0, 10.0));
        h.press(pos2(10.0, 10.0));
        h.move_to(pos2(300.0, 200.0));
        let outside = pos2(900.0, 200.0) - h.app.canvas_origin.to_vec2();
        h.release(outside);

        assert!(h.overlay(id).drag_session().is_none());
        assert_eq!(h.overlay(id).focus(), Focus::Off);
        assert_near(h.overlay(id).position(), outside - vec2(10.0, 10.0));
    }

    #[test]
    fn double_click_opens_field_with_caption_text() {
        let mut h = Harness::new();
        let id = h.add_text();
        h.double_click(pos2(20.0, 10.0));

        let overlay = h.overlay(id);
        assert_eq!(overlay.mode(), ViewMode::Edit);
        assert!(overlay.field_visible());
        assert_eq!(h.app.edit_buffer, overlay.text());
        assert_eq!(h.app.edit_buffer_owner, Some(id));
        assert!(h.app.field_rect.is_some_and(|r| !r.contains(h.screen(overlay.resize_handle_rect().center()))));
    }

    #[test]
    fn click_on_empty_surface_commits_edit() {
        let mut h = Harness::new();
        let id = h.add_text();
        h.double_click(pos2(20.0, 10.0));
        assert_eq!(h.app.controller.canvas().editing(), Some(id));

        h.pause();
        h.move_to(pos2(400.0, 400.0));
        h.click(pos2(400.0, 400.0));

        assert_eq!(h.app.controller.canvas().editing(), None);
        assert_eq!(h.overlay(id).mode(), ViewMode::Display);
        assert_eq!(h.overlay(id).focus(), Focus::Off);
        assert!(h.app.field_rect.is_none());
    }

    #[test]
    fn enter_commits_edit() {
        let mut h = Harness::new();
        let id = h.add_text();
        h.double_click(pos2(20.0, 10.0));
        h.key(Key::Enter);

        assert_eq!(h.overlay(id).mode(), ViewMode::Display);
        assert!(h.overlay(id).label_visible());
    }

    #[test]
    fn delete_removes_hovered_caption() {
        let mut h = Harness::new();
        let id = h.add_text();
        h.move_to(pos2(20.0, 10.0));
        h.key(Key::Delete);

        assert!(h.app.controller.canvas().overlay(id).is_none());
        assert_eq!(h.app.hovered, None);
    }
}
