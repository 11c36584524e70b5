use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::Result;
use eframe::egui;

use crate::blink::BlinkCycle;
use crate::bubble::{
    BubbleContent, BubbleMode, BubbleReaction, MenuChoice, FAREWELL_HOLD, TYPEWRITER_TICK,
};
use crate::drag::{handle_pointer, DragTracker, PointerEvent};
use crate::formation::Formation;
use crate::memo::{MemoPad, MemoStore};
use crate::scheduler::Scheduler;
use crate::settings::Settings;
use crate::shell::{viewport_id, EguiShell, NullShell, ShellCtx, SurfaceCmd};
use crate::surface::{
    Delivery, Surface, SurfaceEvent, SurfaceGroup, SurfaceRole, ALPHA_HIDDEN, ALPHA_OPAQUE,
    ALPHA_TRANSLUCENT,
};

pub const CHARACTER_SIZE: (u32, u32) = (250, 320);
pub const MEMO_SIZE: (u32, u32) = (250, 230);
pub const HAND_SIZE: (u32, u32) = (110, 110);

/// Every timed activity in the process. All of them flow through the one
/// scheduler and are dispatched from the update loop, never from a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmbientTask {
    /// End of an idle wait: reconcile, sync translucency, start a blink.
    BlinkWake,
    /// Advance one frame of an in-flight blink.
    BlinkStep,
    MemoAutosave,
    TimelineRefresh,
    TypewriterTick,
    /// Final step of the goodbye script.
    FarewellExit,
}

pub struct CompanionApp {
    group: SurfaceGroup,
    formation: Formation,
    scheduler: Scheduler<AmbientTask>,
    blink: BlinkCycle,
    memo: MemoPad,
    bubble: BubbleContent,
    trackers: HashMap<SurfaceRole, DragTracker>,
    settings: Settings,
    shutting_down: bool,
}

impl CompanionApp {
    pub fn new(
        settings: Settings,
        client: Box<dyn crate::bubble::TimelineClient>,
    ) -> Result<Self> {
        let shell = NullShell;
        let bubble = BubbleContent::new(client);
        let bubble_size = bubble.current_size();

        let mut group = SurfaceGroup::new();
        group.insert(Surface::new(
            SurfaceRole::Character,
            CHARACTER_SIZE.0,
            CHARACTER_SIZE.1,
        ));
        group.insert(Surface::new(SurfaceRole::Bubble, bubble_size.0, bubble_size.1));
        group.insert(Surface::new(SurfaceRole::Memo, MEMO_SIZE.0, MEMO_SIZE.1));
        group.insert(Surface::new(SurfaceRole::Hand, HAND_SIZE.0, HAND_SIZE.1));

        let (cx, cy) = settings.character_pos;
        place(&mut group, &shell, SurfaceRole::Character, cx, cy);
        for (role, offset) in [
            (SurfaceRole::Bubble, settings.bubble_offset),
            (SurfaceRole::Memo, settings.memo_offset),
            (SurfaceRole::Hand, settings.hand_offset),
        ] {
            place(&mut group, &shell, role, cx + offset.0, cy + offset.1);
        }

        // The character is the one coordinator; everything else listens.
        for follower in [SurfaceRole::Bubble, SurfaceRole::Memo, SurfaceRole::Hand] {
            group.add_observer(SurfaceRole::Character, follower)?;
        }

        let formation = Formation::register(
            &group,
            SurfaceRole::Character,
            &[SurfaceRole::Bubble, SurfaceRole::Memo, SurfaceRole::Hand],
            settings.loose_drift_px,
        )?;

        let mut blink = BlinkCycle::new();
        let mut scheduler = Scheduler::new();
        let idle = blink.sample_idle_delay();
        scheduler.schedule(idle, AmbientTask::BlinkWake);
        scheduler.schedule(
            Duration::from_secs_f32(settings.memo_autosave_secs),
            AmbientTask::MemoAutosave,
        );
        scheduler.schedule(Duration::ZERO, AmbientTask::TimelineRefresh);

        let memo = MemoPad::load(MemoStore::new(&settings.memo_file));

        Ok(Self {
            group,
            formation,
            scheduler,
            blink,
            memo,
            bubble,
            trackers: HashMap::new(),
            settings,
            shutting_down: false,
        })
    }

    pub fn group(&self) -> &SurfaceGroup {
        &self.group
    }

    /// Sprite frame the character should show right now.
    pub fn blink_frame(&self) -> usize {
        self.blink.frame()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down
    }

    /// Earliest pending wake-up, if any.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Run every task due at `now`. This is the single timeline all timed
    /// activity is serialized onto; the update loop calls it once per frame.
    pub fn pump(&mut self, shell: &dyn ShellCtx, now: Instant) {
        for (_id, task) in self.scheduler.take_due(now) {
            if self.shutting_down && task != AmbientTask::FarewellExit {
                continue;
            }
            if let Err(e) = self.run_task(shell, task) {
                tracing::warn!(?task, "ambient task failed: {e}");
                self.recover(task);
            }
        }
    }

    fn run_task(&mut self, shell: &dyn ShellCtx, task: AmbientTask) -> Result<()> {
        match task {
            AmbientTask::BlinkWake => {
                self.formation.reconcile(&mut self.group, shell);
                self.formation.sync_translucency(&mut self.group, shell);
                if self.settings.blink_enabled {
                    let (_frame, hold) = self.blink.begin();
                    self.scheduler.schedule(hold, AmbientTask::BlinkStep);
                } else {
                    let idle = self.blink.sample_idle_delay();
                    self.scheduler.schedule(idle, AmbientTask::BlinkWake);
                }
                shell.request_repaint();
            }
            AmbientTask::BlinkStep => {
                match self.blink.advance() {
                    Some((_frame, hold)) => {
                        self.scheduler.schedule(hold, AmbientTask::BlinkStep);
                    }
                    None => {
                        let idle = self.blink.sample_idle_delay();
                        self.scheduler.schedule(idle, AmbientTask::BlinkWake);
                    }
                }
                shell.request_repaint();
            }
            AmbientTask::MemoAutosave => {
                let saved = self.memo.autosave();
                self.scheduler.schedule(
                    Duration::from_secs_f32(self.settings.memo_autosave_secs),
                    AmbientTask::MemoAutosave,
                );
                saved?;
            }
            AmbientTask::TimelineRefresh => {
                self.bubble.refresh()?;
                self.apply_bubble_size(shell);
                if self.bubble.timeline_enabled() && self.bubble.mode() == BubbleMode::Timeline {
                    self.scheduler.schedule(TYPEWRITER_TICK, AmbientTask::TypewriterTick);
                    self.scheduler.schedule(
                        Duration::from_secs_f32(self.settings.timeline_refresh_secs),
                        AmbientTask::TimelineRefresh,
                    );
                }
            }
            AmbientTask::TypewriterTick => {
                if self.bubble.typewriter_tick() {
                    self.scheduler.schedule(TYPEWRITER_TICK, AmbientTask::TypewriterTick);
                }
                shell.request_repaint();
            }
            AmbientTask::FarewellExit => {
                if let Err(e) = self.memo.save_now() {
                    tracing::warn!("final memo save failed: {e}");
                }
                for role in SurfaceRole::ALL {
                    if let Some(s) = self.group.surface_mut(role) {
                        s.teardown();
                    }
                }
                shell.send_surface_cmd(SurfaceCmd::CloseAll);
            }
        }
        Ok(())
    }

    /// A stalled blink cycle is a visible defect, so the chain restarts from
    /// the idle phase after any failure.
    fn recover(&mut self, task: AmbientTask) {
        if matches!(task, AmbientTask::BlinkWake | AmbientTask::BlinkStep) {
            self.blink.reset();
        }
        let followup = match task {
            AmbientTask::BlinkWake | AmbientTask::BlinkStep => {
                Some((self.blink.sample_idle_delay(), AmbientTask::BlinkWake))
            }
            AmbientTask::MemoAutosave | AmbientTask::FarewellExit => None,
            AmbientTask::TimelineRefresh | AmbientTask::TypewriterTick => Some((
                Duration::from_secs_f32(self.settings.timeline_refresh_secs),
                AmbientTask::TimelineRefresh,
            )),
        };
        if let Some((delay, task)) = followup {
            if !self.shutting_down {
                self.scheduler.schedule(delay, task);
            }
        }
    }

    /// Adopt the bubble's content-driven size and let the coordinator pull
    /// the formation straight afterwards.
    fn apply_bubble_size(&mut self, shell: &dyn ShellCtx) {
        let (w, h) = self.bubble.current_size();
        if let Some(surface) = self.group.surface_mut(SurfaceRole::Bubble) {
            if surface.size() != (w, h) {
                surface.set_size(w, h);
                self.formation.reconcile(&mut self.group, shell);
            }
        }
    }

    fn apply_deliveries(&mut self, shell: &dyn ShellCtx, deliveries: Vec<Delivery>) {
        for delivery in deliveries {
            match (delivery.receiver, delivery.event) {
                (SurfaceRole::Character, SurfaceEvent::PositionChanged) => {
                    self.formation.reconcile(&mut self.group, shell);
                }
                (SurfaceRole::Bubble, SurfaceEvent::EnterMenuMode) => {
                    self.enter_menu(shell);
                }
                _ => {}
            }
        }
    }

    fn enter_menu(&mut self, shell: &dyn ShellCtx) {
        self.bubble.enter_menu();
        if let Some(surface) = self.group.surface_mut(SurfaceRole::Bubble) {
            if surface.alpha() == ALPHA_HIDDEN {
                let alpha = if surface.is_translucent() {
                    ALPHA_TRANSLUCENT
                } else {
                    ALPHA_OPAQUE
                };
                surface.set_alpha(shell, alpha);
            }
        }
        self.apply_bubble_size(shell);
        self.formation.raise_group(&self.group, shell);
        // The menu floats above even the memo while it is open.
        if let Some(surface) = self.group.surface(SurfaceRole::Bubble) {
            surface.raise(shell);
        }
    }

    fn on_menu_choice(&mut self, shell: &dyn ShellCtx, choice: MenuChoice) {
        match self.bubble.select(choice) {
            BubbleReaction::ResumeTimeline => {
                self.scheduler.schedule(Duration::ZERO, AmbientTask::TimelineRefresh);
                shell.request_repaint();
            }
            BubbleReaction::BeginFarewell => {
                tracing::info!("goodbye selected; shutting down in {FAREWELL_HOLD:?}");
                self.shutting_down = true;
                self.apply_bubble_size(shell);
                self.scheduler.schedule(FAREWELL_HOLD, AmbientTask::FarewellExit);
                shell.request_repaint();
            }
            BubbleReaction::None => {}
        }
    }

    /// Translate one viewport's response into drag-machine input.
    fn route_response(&mut self, shell: &dyn ShellCtx, role: SurfaceRole, resp: &egui::Response) {
        let mut events = Vec::new();
        if resp.drag_started() {
            if let Some(pos) = resp.interact_pointer_pos() {
                events.push(PointerEvent::PrimaryDown {
                    local: (pos.x, pos.y),
                });
            }
        } else if resp.dragged() {
            if let Some(pos) = resp.interact_pointer_pos() {
                events.push(PointerEvent::Moved {
                    local: (pos.x, pos.y),
                });
            }
        }
        if resp.drag_released() {
            events.push(PointerEvent::PrimaryUp);
        }
        if resp.secondary_clicked() {
            events.push(PointerEvent::SecondaryDown);
        }
        if resp.double_clicked() {
            events.push(PointerEvent::DoubleActivate);
        }
        for event in events {
            let mut tracker = self.trackers.remove(&role).unwrap_or_default();
            let deliveries = handle_pointer(
                &mut tracker,
                &mut self.group,
                shell,
                &self.formation,
                role,
                event,
            );
            self.trackers.insert(role, tracker);
            self.apply_deliveries(shell, deliveries);
        }
    }

    fn surface_alpha(&self, role: SurfaceRole) -> f32 {
        self.group
            .surface(role)
            .map(|s| s.alpha())
            .unwrap_or(ALPHA_OPAQUE)
    }

    fn child_builder(&self, role: SurfaceRole) -> egui::ViewportBuilder {
        let (pos, size) = self
            .group
            .surface(role)
            .map(|s| (s.pos(), s.size()))
            .unwrap_or(((0, 0), (100, 100)));
        egui::ViewportBuilder::default()
            .with_title(role.as_str())
            .with_position(egui::pos2(pos.0 as f32, pos.1 as f32))
            .with_inner_size([size.0 as f32, size.1 as f32])
            .with_decorations(false)
            .with_transparent(true)
            .with_always_on_top()
            .with_taskbar(false)
    }

    fn show_character(&mut self, ctx: &egui::Context) {
        let alpha = self.surface_alpha(SurfaceRole::Character);
        let frame_index = self.blink.frame();
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                draw_character(ui, frame_index, alpha);
                let resp = ui.interact(
                    ui.max_rect(),
                    egui::Id::new("character_drag"),
                    egui::Sense::click_and_drag(),
                );
                let shell = EguiShell { ctx };
                self.route_response(&shell, SurfaceRole::Character, &resp);
            });
    }

    fn show_bubble(&mut self, ctx: &egui::Context) {
        let builder = self.child_builder(SurfaceRole::Bubble);
        let alpha = self.surface_alpha(SurfaceRole::Bubble);
        let mode = self.bubble.mode();
        let text = self.bubble.visible_text();
        let author = self.bubble.author().map(|a| a.to_string());
        let mut choice = None;
        ctx.show_viewport_immediate(
            viewport_id(SurfaceRole::Bubble),
            builder,
            |ctx, _class| {
                egui::CentralPanel::default()
                    .frame(egui::Frame::none())
                    .show(ctx, |ui| {
                        // Background interaction first so the menu buttons,
                        // added later, sit on top and win their clicks.
                        let resp = ui.interact(
                            ui.max_rect(),
                            egui::Id::new("bubble_drag"),
                            egui::Sense::click_and_drag(),
                        );
                        if alpha > ALPHA_HIDDEN {
                            draw_balloon(ui, alpha);
                            let inner = ui.max_rect().shrink(14.0);
                            let mut content = ui.child_ui(inner, egui::Layout::top_down(egui::Align::Min));
                            match mode {
                                BubbleMode::Menu => {
                                    choice = draw_menu(&mut content);
                                }
                                _ => {
                                    if let Some(author) = &author {
                                        content.label(
                                            egui::RichText::new(format!("@{author}"))
                                                .small()
                                                .color(tint(egui::Color32::DARK_GRAY, alpha)),
                                        );
                                    }
                                    content.label(
                                        egui::RichText::new(&text)
                                            .color(tint(egui::Color32::BLACK, alpha)),
                                    );
                                }
                            }
                        }
                        let shell = EguiShell { ctx };
                        self.route_response(&shell, SurfaceRole::Bubble, &resp);
                    });
            },
        );
        if let Some(choice) = choice {
            let shell = EguiShell { ctx };
            self.on_menu_choice(&shell, choice);
        }
    }

    fn show_memo(&mut self, ctx: &egui::Context) {
        let builder = self.child_builder(SurfaceRole::Memo);
        let alpha = self.surface_alpha(SurfaceRole::Memo);
        ctx.show_viewport_immediate(viewport_id(SurfaceRole::Memo), builder, |ctx, _class| {
            egui::CentralPanel::default()
                .frame(
                    egui::Frame::none()
                        .fill(tint(egui::Color32::WHITE, alpha))
                        .stroke(egui::Stroke::new(1.0, tint(egui::Color32::BLACK, alpha))),
                )
                .show(ctx, |ui| {
                    // Thin grab strip on top; the text area below keeps the
                    // pointer for editing.
                    let (strip_rect, resp) = ui.allocate_exact_size(
                        egui::vec2(ui.available_width(), 14.0),
                        egui::Sense::click_and_drag(),
                    );
                    ui.painter()
                        .rect_filled(strip_rect, 0.0, tint(egui::Color32::BLACK, alpha));
                    if alpha > ALPHA_HIDDEN {
                        egui::ScrollArea::vertical().show(ui, |ui| {
                            ui.add_sized(
                                ui.available_size(),
                                egui::TextEdit::multiline(self.memo.text_mut())
                                    .frame(false)
                                    .text_color(tint(egui::Color32::BLACK, alpha)),
                            );
                        });
                    }
                    let shell = EguiShell { ctx };
                    self.route_response(&shell, SurfaceRole::Memo, &resp);
                });
        });
    }

    fn show_hand(&mut self, ctx: &egui::Context) {
        let builder = self.child_builder(SurfaceRole::Hand);
        let alpha = self.surface_alpha(SurfaceRole::Hand);
        ctx.show_viewport_immediate(viewport_id(SurfaceRole::Hand), builder, |ctx, _class| {
            egui::CentralPanel::default()
                .frame(egui::Frame::none())
                .show(ctx, |ui| {
                    if alpha > ALPHA_HIDDEN {
                        draw_hand(ui, alpha);
                    }
                    let resp = ui.interact(
                        ui.max_rect(),
                        egui::Id::new("hand_drag"),
                        egui::Sense::click_and_drag(),
                    );
                    let shell = EguiShell { ctx };
                    self.route_response(&shell, SurfaceRole::Hand, &resp);
                });
        });
    }
}

impl eframe::App for CompanionApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        {
            let shell = EguiShell { ctx };
            self.pump(&shell, now);
        }

        self.show_character(ctx);
        self.show_bubble(ctx);
        self.show_memo(ctx);
        self.show_hand(ctx);

        if let Some(deadline) = self.scheduler.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        egui::Rgba::TRANSPARENT.to_array()
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(e) = self.memo.save_now() {
            tracing::warn!("memo save on exit failed: {e}");
        }
    }
}

fn place(group: &mut SurfaceGroup, shell: &dyn ShellCtx, role: SurfaceRole, x: i32, y: i32) {
    if let Some(surface) = group.surface_mut(role) {
        surface.set_position(shell, x, y);
    }
}

fn tint(color: egui::Color32, alpha: f32) -> egui::Color32 {
    color.gamma_multiply(alpha)
}

/// The sprite is primitive shapes; a real image pipeline stays out of the
/// engine.
fn draw_character(ui: &mut egui::Ui, frame_index: usize, alpha: f32) {
    if alpha <= ALPHA_HIDDEN {
        return;
    }
    let rect = ui.max_rect();
    let painter = ui.painter();
    let body = egui::Color32::from_rgb(0xef, 0xfb, 0xfb);
    let outline = egui::Color32::from_rgb(0x46, 0x5a, 0x64);

    let center = rect.center();
    painter.rect_filled(
        egui::Rect::from_center_size(
            egui::pos2(center.x, rect.bottom() - rect.height() * 0.28),
            egui::vec2(rect.width() * 0.62, rect.height() * 0.5),
        ),
        24.0,
        tint(body, alpha),
    );
    let head_center = egui::pos2(center.x, rect.top() + rect.height() * 0.26);
    painter.circle(
        head_center,
        rect.width() * 0.34,
        tint(body, alpha),
        egui::Stroke::new(2.0, tint(outline, alpha)),
    );

    let eye_dx = rect.width() * 0.13;
    let eye_y = head_center.y;
    for side in [-1.0, 1.0] {
        let eye = egui::pos2(head_center.x + side * eye_dx, eye_y);
        match frame_index {
            // open
            0 => {
                painter.circle_filled(eye, 7.0, tint(outline, alpha));
            }
            // half closed
            1 => {
                painter.rect_filled(
                    egui::Rect::from_center_size(eye, egui::vec2(14.0, 6.0)),
                    2.0,
                    tint(outline, alpha),
                );
            }
            // closed
            _ => {
                painter.line_segment(
                    [
                        egui::pos2(eye.x - 7.0, eye.y),
                        egui::pos2(eye.x + 7.0, eye.y),
                    ],
                    egui::Stroke::new(2.5, tint(outline, alpha)),
                );
            }
        }
    }
}

fn draw_balloon(ui: &mut egui::Ui, alpha: f32) {
    let rect = ui.max_rect();
    let fill = egui::Color32::from_rgb(0xef, 0xfb, 0xfb);
    let painter = ui.painter();
    painter.rect_filled(rect.shrink(6.0), 10.0, tint(fill, alpha));
    // Tail pointing toward the character on the left.
    let tail_y = rect.top() + 34.0;
    painter.add(egui::Shape::convex_polygon(
        vec![
            egui::pos2(rect.left() + 7.0, tail_y - 5.0),
            egui::pos2(rect.left() - 3.0, tail_y),
            egui::pos2(rect.left() + 7.0, tail_y + 5.0),
        ],
        tint(fill, alpha),
        egui::Stroke::NONE,
    ));
}

fn draw_menu(ui: &mut egui::Ui) -> Option<MenuChoice> {
    let mut choice = None;
    if ui.button("Timeline on/off").clicked() {
        choice = Some(MenuChoice::ToggleTimeline);
    }
    if ui.button("Goodbye").clicked() {
        choice = Some(MenuChoice::Goodbye);
    }
    if ui.button("Never mind").clicked() {
        choice = Some(MenuChoice::Cancel);
    }
    choice
}

fn draw_hand(ui: &mut egui::Ui, alpha: f32) {
    let rect = ui.max_rect();
    let painter = ui.painter();
    let fill = egui::Color32::from_rgb(0xef, 0xfb, 0xfb);
    let outline = egui::Color32::from_rgb(0x46, 0x5a, 0x64);
    painter.circle(
        rect.center(),
        rect.width() * 0.3,
        tint(fill, alpha),
        egui::Stroke::new(2.0, tint(outline, alpha)),
    );
    painter.add(egui::Shape::convex_polygon(
        vec![
            egui::pos2(rect.center().x, rect.top() + 6.0),
            egui::pos2(rect.center().x - 9.0, rect.center().y),
            egui::pos2(rect.center().x + 9.0, rect.center().y),
        ],
        tint(fill, alpha),
        egui::Stroke::NONE,
    ));
}
