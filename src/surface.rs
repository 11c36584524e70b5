use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::shell::{ShellCtx, SurfaceCmd};

pub const ALPHA_OPAQUE: f32 = 1.0;
pub const ALPHA_TRANSLUCENT: f32 = 0.5;
pub const ALPHA_HIDDEN: f32 = 0.0;

/// Fixed role of an overlay surface, resolved once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceRole {
    Character,
    Bubble,
    Memo,
    Hand,
}

impl SurfaceRole {
    pub const ALL: [SurfaceRole; 4] = [
        SurfaceRole::Character,
        SurfaceRole::Bubble,
        SurfaceRole::Memo,
        SurfaceRole::Hand,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SurfaceRole::Character => "character",
            SurfaceRole::Bubble => "bubble",
            SurfaceRole::Memo => "memo",
            SurfaceRole::Hand => "hand",
        }
    }
}

impl std::fmt::Display for SurfaceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic notifications broadcast between surfaces. Receivers re-read any
/// state they need from the group; the tag carries no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    TranslucencyToggled,
    PositionChanged,
    EnterMenuMode,
}

/// One borderless, always-on-top overlay window.
#[derive(Debug)]
pub struct Surface {
    role: SurfaceRole,
    pos: (i32, i32),
    size: (u32, u32),
    alpha: f32,
    translucent: bool,
    alive: bool,
    placed: bool,
    observers: Vec<SurfaceRole>,
}

impl Surface {
    pub fn new(role: SurfaceRole, width: u32, height: u32) -> Self {
        Self {
            role,
            pos: (0, 0),
            size: (width, height),
            alpha: ALPHA_OPAQUE,
            translucent: false,
            alive: true,
            placed: false,
            observers: Vec::new(),
        }
    }

    pub fn role(&self) -> SurfaceRole {
        self.role
    }

    pub fn pos(&self) -> (i32, i32) {
        self.pos
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_translucent(&self) -> bool {
        self.translucent
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Whether the surface has been positioned at least once. Follower
    /// registration refuses to compute offsets against unplaced surfaces.
    pub fn is_placed(&self) -> bool {
        self.placed
    }

    pub fn observers(&self) -> &[SurfaceRole] {
        &self.observers
    }

    /// Move to absolute screen coordinates. No bounds validation; off-screen
    /// positions are the caller's business.
    pub fn set_position(&mut self, ctx: &dyn ShellCtx, x: i32, y: i32) {
        if !self.alive {
            tracing::debug!(role = %self.role, "set_position on torn-down surface ignored");
            return;
        }
        self.pos = (x, y);
        self.placed = true;
        ctx.send_surface_cmd(SurfaceCmd::OuterPosition(self.role, x, y));
    }

    /// Flip between opaque and translucent. A hidden surface stays hidden.
    pub fn toggle_translucency(&mut self, ctx: &dyn ShellCtx) {
        if !self.alive {
            tracing::debug!(role = %self.role, "toggle_translucency on torn-down surface ignored");
            return;
        }
        if self.alpha == ALPHA_HIDDEN {
            return;
        }
        self.translucent = !self.translucent;
        self.alpha = if self.translucent {
            ALPHA_TRANSLUCENT
        } else {
            ALPHA_OPAQUE
        };
        ctx.send_surface_cmd(SurfaceCmd::Alpha(self.role, self.alpha));
    }

    /// Set an exact alpha, used by the hide/show lifecycle.
    pub fn set_alpha(&mut self, ctx: &dyn ShellCtx, alpha: f32) {
        if !self.alive {
            tracing::debug!(role = %self.role, "set_alpha on torn-down surface ignored");
            return;
        }
        self.alpha = alpha;
        self.translucent = alpha == ALPHA_TRANSLUCENT;
        ctx.send_surface_cmd(SurfaceCmd::Alpha(self.role, alpha));
    }

    /// Ask to be placed above all sibling surfaces. Order among several
    /// raised siblings is the caller's to sequence.
    pub fn raise(&self, ctx: &dyn ShellCtx) {
        if !self.alive {
            tracing::debug!(role = %self.role, "raise on torn-down surface ignored");
            return;
        }
        ctx.send_surface_cmd(SurfaceCmd::Raise(self.role));
    }

    /// Mark the surface dead. Later operations become logged no-ops; teardown
    /// races during shutdown must not crash the run.
    pub fn teardown(&mut self) {
        self.alive = false;
    }
}

/// The fixed set of cooperating surfaces plus their observer graph. All
/// mutation flows through this coordinator so broadcasts cannot alias.
#[derive(Debug, Default)]
pub struct SurfaceGroup {
    surfaces: Vec<Surface>,
}

/// Record of one event delivery, handed back so the app layer can run
/// role-specific reactions on top of the default handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub receiver: SurfaceRole,
    pub event: SurfaceEvent,
}

impl SurfaceGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, surface: Surface) {
        self.surfaces.retain(|s| s.role() != surface.role());
        self.surfaces.push(surface);
    }

    pub fn surface(&self, role: SurfaceRole) -> Option<&Surface> {
        self.surfaces.iter().find(|s| s.role() == role)
    }

    pub fn surface_mut(&mut self, role: SurfaceRole) -> Option<&mut Surface> {
        self.surfaces.iter_mut().find(|s| s.role() == role)
    }

    pub fn roles(&self) -> Vec<SurfaceRole> {
        self.surfaces.iter().map(|s| s.role()).collect()
    }

    /// Register `observer` for events from `sender`. Duplicate registrations
    /// are legal (delivery is per registration); an edge that would close a
    /// cycle is refused so a broadcast can never loop.
    pub fn add_observer(&mut self, sender: SurfaceRole, observer: SurfaceRole) -> Result<()> {
        if sender == observer || self.observes_transitively(observer, sender) {
            bail!("observer registration {sender} -> {observer} would form a cycle");
        }
        match self.surface_mut(sender) {
            Some(s) => {
                s.observers.push(observer);
                Ok(())
            }
            None => bail!("cannot register observer on unknown surface {sender}"),
        }
    }

    fn observes_transitively(&self, from: SurfaceRole, target: SurfaceRole) -> bool {
        let mut stack = vec![from];
        let mut seen = Vec::new();
        while let Some(role) = stack.pop() {
            if role == target {
                return true;
            }
            if seen.contains(&role) {
                continue;
            }
            seen.push(role);
            if let Some(s) = self.surface(role) {
                stack.extend(s.observers.iter().copied());
            }
        }
        false
    }

    /// Deliver `event` synchronously, in registration order, to every
    /// observer of `sender`. A failing observer is logged and skipped; the
    /// rest are still notified.
    pub fn notify(
        &mut self,
        ctx: &dyn ShellCtx,
        sender: SurfaceRole,
        event: SurfaceEvent,
    ) -> Vec<Delivery> {
        let observers = match self.surface(sender) {
            Some(s) => s.observers.clone(),
            None => {
                tracing::warn!(sender = %sender, "notify from unknown surface dropped");
                return Vec::new();
            }
        };
        let mut deliveries = Vec::with_capacity(observers.len());
        for receiver in observers {
            match self.deliver(ctx, receiver, event) {
                Ok(()) => deliveries.push(Delivery { receiver, event }),
                Err(e) => {
                    tracing::warn!(sender = %sender, receiver = %receiver, ?event,
                        "observer handler failed: {e}");
                }
            }
        }
        deliveries
    }

    /// Default event handling. Role-specific reactions (drift reconciliation,
    /// menu mode) run in the app layer off the returned deliveries.
    fn deliver(
        &mut self,
        ctx: &dyn ShellCtx,
        receiver: SurfaceRole,
        event: SurfaceEvent,
    ) -> Result<()> {
        let surface = match self.surface_mut(receiver) {
            Some(s) => s,
            None => bail!("receiver {receiver} is not part of the group"),
        };
        if !surface.is_alive() {
            bail!("receiver {receiver} is already torn down");
        }
        if event == SurfaceEvent::TranslucencyToggled {
            surface.toggle_translucency(ctx);
        }
        Ok(())
    }
}
