use anyhow::{bail, Result};

use crate::shell::{ShellCtx, SurfaceCmd};
use crate::surface::{SurfaceGroup, SurfaceRole};

/// How far a loose follower may stray, per axis, before reconciliation snaps
/// it back into formation.
pub const LOOSE_DRIFT_PX: i32 = 150;

/// Stacking order of the group, bottom-most first. The sprite sits underneath
/// everything; the memo pad ends up on top.
pub const STACK_ORDER: [SurfaceRole; 4] = [
    SurfaceRole::Character,
    SurfaceRole::Bubble,
    SurfaceRole::Hand,
    SurfaceRole::Memo,
];

#[derive(Debug, Clone, Copy)]
pub struct Follower {
    pub role: SurfaceRole,
    /// `follower.pos - anchor.pos`, captured at registration. Ground truth
    /// for the rest of the run; never recomputed.
    pub offset: (i32, i32),
    /// Loose followers tolerate bounded drift (the bubble resizes with its
    /// content and would otherwise fight the anchor constantly).
    pub loose: bool,
}

/// Rigid formation of one anchor and its followers.
#[derive(Debug)]
pub struct Formation {
    anchor: SurfaceRole,
    followers: Vec<Follower>,
    drift_px: i32,
}

impl Formation {
    /// Capture the current relative offsets of `follower_roles` against
    /// `anchor`. Fails if any participant has never been positioned: baking
    /// a bogus `(0,0)` offset would corrupt the formation for the whole run.
    pub fn register(
        group: &SurfaceGroup,
        anchor: SurfaceRole,
        follower_roles: &[SurfaceRole],
        drift_px: i32,
    ) -> Result<Self> {
        let anchor_pos = match group.surface(anchor) {
            Some(s) if s.is_placed() => s.pos(),
            Some(_) => bail!("anchor {anchor} has not been placed yet"),
            None => bail!("anchor {anchor} is not part of the group"),
        };
        let mut followers = Vec::with_capacity(follower_roles.len());
        for &role in follower_roles {
            let pos = match group.surface(role) {
                Some(s) if s.is_placed() => s.pos(),
                Some(_) => bail!("follower {role} has not been placed yet"),
                None => bail!("follower {role} is not part of the group"),
            };
            followers.push(Follower {
                role,
                offset: (pos.0 - anchor_pos.0, pos.1 - anchor_pos.1),
                loose: role == SurfaceRole::Bubble,
            });
        }
        Ok(Self {
            anchor,
            followers,
            drift_px,
        })
    }

    pub fn anchor(&self) -> SurfaceRole {
        self.anchor
    }

    pub fn followers(&self) -> &[Follower] {
        &self.followers
    }

    /// Move every follower by the same delta the anchor just moved. Drift
    /// accumulated outside drags is deliberately carried along, not
    /// corrected here.
    pub fn propagate_delta(&self, group: &mut SurfaceGroup, ctx: &dyn ShellCtx, dx: i32, dy: i32) {
        for follower in &self.followers {
            if let Some(surface) = group.surface_mut(follower.role) {
                let (x, y) = surface.pos();
                surface.set_position(ctx, x + dx, y + dy);
            }
        }
    }

    /// Periodic correction pass. Strict followers snap on any deviation;
    /// loose followers only past the drift threshold. Returns how many
    /// followers snapped; the group is re-raised at most once per pass.
    pub fn reconcile(&self, group: &mut SurfaceGroup, ctx: &dyn ShellCtx) -> usize {
        let anchor_pos = match group.surface(self.anchor) {
            Some(s) => s.pos(),
            None => return 0,
        };
        let mut snapped = 0;
        for follower in &self.followers {
            let surface = match group.surface_mut(follower.role) {
                Some(s) => s,
                None => continue,
            };
            let expected = (
                anchor_pos.0 + follower.offset.0,
                anchor_pos.1 + follower.offset.1,
            );
            let current = surface.pos();
            let out_of_formation = if follower.loose {
                (current.0 - expected.0).abs() > self.drift_px
                    || (current.1 - expected.1).abs() > self.drift_px
            } else {
                current != expected
            };
            if out_of_formation {
                tracing::debug!(role = %follower.role, ?current, ?expected, "snapping follower");
                surface.set_position(ctx, expected.0, expected.1);
                snapped += 1;
            }
        }
        if snapped > 0 {
            self.raise_group(group, ctx);
        }
        snapped
    }

    /// Push the anchor's translucency onto any follower whose flag differs,
    /// e.g. one that was toggled while hidden from the drift logic.
    pub fn sync_translucency(&self, group: &mut SurfaceGroup, ctx: &dyn ShellCtx) {
        let translucent = match group.surface(self.anchor) {
            Some(s) => s.is_translucent(),
            None => return,
        };
        for follower in &self.followers {
            if let Some(surface) = group.surface_mut(follower.role) {
                if surface.is_translucent() != translucent {
                    surface.toggle_translucency(ctx);
                }
            }
        }
    }

    /// Restore the fixed stacking order, bottom-most first. Dead surfaces are
    /// left out of the request.
    pub fn raise_group(&self, group: &SurfaceGroup, ctx: &dyn ShellCtx) {
        let order: Vec<SurfaceRole> = STACK_ORDER
            .iter()
            .copied()
            .filter(|&role| group.surface(role).map(|s| s.is_alive()).unwrap_or(false))
            .collect();
        if !order.is_empty() {
            ctx.send_surface_cmd(SurfaceCmd::RaiseGroup(order));
        }
    }
}
