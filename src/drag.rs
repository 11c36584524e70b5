use crate::formation::Formation;
use crate::shell::ShellCtx;
use crate::surface::{Delivery, SurfaceEvent, SurfaceGroup, SurfaceRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging,
}

/// Raw pointer signals as seen by one surface. Coordinates are local to that
/// surface's window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    PrimaryDown { local: (f32, f32) },
    Moved { local: (f32, f32) },
    PrimaryUp,
    SecondaryDown,
    DoubleActivate,
}

/// Idle/Dragging state machine for one surface. The press point is captured
/// once and every move is measured against it, matching grab-and-move
/// semantics.
#[derive(Debug, Default)]
pub struct DragTracker {
    origin: Option<(f32, f32)>,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        if self.origin.is_some() {
            DragState::Dragging
        } else {
            DragState::Idle
        }
    }

    pub fn begin(&mut self, local: (f32, f32)) {
        self.origin = Some(local);
    }

    /// Delta of the current pointer position against the press point, or
    /// `None` while idle. The origin is never updated mid-drag.
    pub fn delta(&self, local: (f32, f32)) -> Option<(i32, i32)> {
        self.origin.map(|(ox, oy)| {
            (
                (local.0 - ox).round() as i32,
                (local.1 - oy).round() as i32,
            )
        })
    }

    pub fn end(&mut self) {
        self.origin = None;
    }
}

/// Route one pointer event on `role` through the drag machine and the event
/// bus. Dragging the formation anchor carries the whole group; dragging any
/// other surface moves it alone (drift, reconciled later). Returned
/// deliveries let the app layer run role-specific reactions.
pub fn handle_pointer(
    tracker: &mut DragTracker,
    group: &mut SurfaceGroup,
    ctx: &dyn ShellCtx,
    formation: &Formation,
    role: SurfaceRole,
    event: PointerEvent,
) -> Vec<Delivery> {
    match event {
        PointerEvent::PrimaryDown { local } => {
            formation.raise_group(group, ctx);
            tracker.begin(local);
            Vec::new()
        }
        PointerEvent::Moved { local } => {
            if let Some((dx, dy)) = tracker.delta(local) {
                if dx != 0 || dy != 0 {
                    if let Some(surface) = group.surface_mut(role) {
                        let (x, y) = surface.pos();
                        surface.set_position(ctx, x + dx, y + dy);
                    }
                    if role == formation.anchor() {
                        formation.propagate_delta(group, ctx, dx, dy);
                    }
                }
            }
            Vec::new()
        }
        PointerEvent::PrimaryUp => {
            // Offsets are left as-is; a net drag of a follower becomes drift
            // for the next reconciliation pass.
            tracker.end();
            Vec::new()
        }
        PointerEvent::SecondaryDown => {
            // Routed through the coordinator: the anchor toggles and its
            // observers follow, so the group fades exactly once no matter
            // which surface was pressed.
            let coordinator = formation.anchor();
            if let Some(surface) = group.surface_mut(coordinator) {
                surface.toggle_translucency(ctx);
            }
            group.notify(ctx, coordinator, SurfaceEvent::TranslucencyToggled)
        }
        PointerEvent::DoubleActivate => {
            if role == SurfaceRole::Character {
                group.notify(ctx, role, SurfaceEvent::EnterMenuMode)
            } else {
                Vec::new()
            }
        }
    }
}
