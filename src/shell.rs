use eframe::egui;

use crate::surface::SurfaceRole;

/// Mutations the engine asks the windowing shell to perform. State lives in
/// [`crate::surface::Surface`]; these are the side effects.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCmd {
    /// Move a surface to absolute screen coordinates.
    OuterPosition(SurfaceRole, i32, i32),
    /// Set a surface's whole-window opacity.
    Alpha(SurfaceRole, f32),
    /// Place one surface above its siblings.
    Raise(SurfaceRole),
    /// Re-stack the group, bottom-most role first.
    RaiseGroup(Vec<SurfaceRole>),
    /// Show or hide a surface without destroying it.
    Visible(SurfaceRole, bool),
    /// Tear down every surface and end the run.
    CloseAll,
}

/// Narrow interface between the coordination engine and the host windowing
/// layer. Production uses [`EguiShell`]; tests substitute a recorder.
pub trait ShellCtx {
    fn send_surface_cmd(&self, cmd: SurfaceCmd);
    fn request_repaint(&self);
}

/// Shell that drops every command. Used while assembling the group, before
/// the windowing layer exists.
pub struct NullShell;

impl ShellCtx for NullShell {
    fn send_surface_cmd(&self, _cmd: SurfaceCmd) {}

    fn request_repaint(&self) {}
}

/// Viewport id for a role. The character rides the root viewport; the other
/// surfaces are immediate child viewports.
pub fn viewport_id(role: SurfaceRole) -> egui::ViewportId {
    match role {
        SurfaceRole::Character => egui::ViewportId::ROOT,
        other => egui::ViewportId::from_hash_of(other.as_str()),
    }
}

pub struct EguiShell<'a> {
    pub ctx: &'a egui::Context,
}

impl ShellCtx for EguiShell<'_> {
    fn send_surface_cmd(&self, cmd: SurfaceCmd) {
        match cmd {
            SurfaceCmd::OuterPosition(role, x, y) => {
                self.ctx.send_viewport_cmd_to(
                    viewport_id(role),
                    egui::ViewportCommand::OuterPosition(egui::pos2(x as f32, y as f32)),
                );
            }
            SurfaceCmd::Alpha(_, _) => {
                // Opacity is applied while painting; the command only needs to
                // trigger a fresh frame.
                self.ctx.request_repaint();
            }
            SurfaceCmd::Raise(role) => {
                self.ctx
                    .send_viewport_cmd_to(viewport_id(role), egui::ViewportCommand::Focus);
            }
            SurfaceCmd::RaiseGroup(order) => {
                for role in order {
                    self.ctx
                        .send_viewport_cmd_to(viewport_id(role), egui::ViewportCommand::Focus);
                }
            }
            SurfaceCmd::Visible(role, visible) => {
                self.ctx.send_viewport_cmd_to(
                    viewport_id(role),
                    egui::ViewportCommand::Visible(visible),
                );
            }
            SurfaceCmd::CloseAll => {
                self.ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }
    }

    fn request_repaint(&self) {
        self.ctx.request_repaint();
    }
}
