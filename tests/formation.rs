use desk_companion::formation::{Formation, LOOSE_DRIFT_PX};
use desk_companion::surface::{Surface, SurfaceGroup, SurfaceRole};

use rand::Rng;

#[path = "mock_shell.rs"]
mod mock_shell;
use mock_shell::MockShell;

const FOLLOWERS: [SurfaceRole; 3] = [SurfaceRole::Bubble, SurfaceRole::Memo, SurfaceRole::Hand];

/// Anchor at (100, 100); bubble at (120, 90) so its offset is the (20, -10)
/// from the drag scenario; memo and hand are strict followers.
fn placed_group() -> (SurfaceGroup, MockShell) {
    let shell = MockShell::default();
    let mut group = SurfaceGroup::new();
    group.insert(Surface::new(SurfaceRole::Character, 250, 320));
    group.insert(Surface::new(SurfaceRole::Bubble, 330, 100));
    group.insert(Surface::new(SurfaceRole::Memo, 250, 230));
    group.insert(Surface::new(SurfaceRole::Hand, 110, 110));
    for (role, x, y) in [
        (SurfaceRole::Character, 100, 100),
        (SurfaceRole::Bubble, 120, 90),
        (SurfaceRole::Memo, -170, 160),
        (SurfaceRole::Hand, 130, 280),
    ] {
        group.surface_mut(role).unwrap().set_position(&shell, x, y);
    }
    shell.clear();
    (group, shell)
}

fn formation(group: &SurfaceGroup) -> Formation {
    Formation::register(group, SurfaceRole::Character, &FOLLOWERS, LOOSE_DRIFT_PX).unwrap()
}

#[test]
fn register_captures_offsets() {
    let (group, _shell) = placed_group();
    let formation = formation(&group);
    let offsets: Vec<(i32, i32)> = formation.followers().iter().map(|f| f.offset).collect();
    assert_eq!(offsets, vec![(20, -10), (-270, 60), (30, 180)]);
    assert!(formation.followers()[0].loose, "bubble should be loose");
    assert!(!formation.followers()[1].loose);
    assert!(!formation.followers()[2].loose);
}

#[test]
fn register_fails_for_unplaced_follower() {
    let shell = MockShell::default();
    let mut group = SurfaceGroup::new();
    group.insert(Surface::new(SurfaceRole::Character, 250, 320));
    group.insert(Surface::new(SurfaceRole::Memo, 250, 230));
    group
        .surface_mut(SurfaceRole::Character)
        .unwrap()
        .set_position(&shell, 100, 100);

    let err = Formation::register(
        &group,
        SurfaceRole::Character,
        &[SurfaceRole::Memo],
        LOOSE_DRIFT_PX,
    )
    .unwrap_err();
    assert!(err.to_string().contains("memo"));
}

#[test]
fn propagate_preserves_offsets_under_random_deltas() {
    let (mut group, shell) = placed_group();
    let formation = formation(&group);
    let mut rng = rand::thread_rng();

    for _ in 0..50 {
        let dx = rng.gen_range(-60..=60);
        let dy = rng.gen_range(-60..=60);
        let (ax, ay) = group.surface(SurfaceRole::Character).unwrap().pos();
        group
            .surface_mut(SurfaceRole::Character)
            .unwrap()
            .set_position(&shell, ax + dx, ay + dy);
        formation.propagate_delta(&mut group, &shell, dx, dy);

        let anchor = group.surface(SurfaceRole::Character).unwrap().pos();
        for follower in formation.followers() {
            let pos = group.surface(follower.role).unwrap().pos();
            assert_eq!(
                (pos.0 - anchor.0, pos.1 - anchor.1),
                follower.offset,
                "offset drifted for {}",
                follower.role
            );
        }
    }
}

#[test]
fn loose_follower_within_threshold_is_left_alone() {
    let (mut group, shell) = placed_group();
    let formation = formation(&group);

    // 150 px on each axis is still inside the tolerance band.
    group
        .surface_mut(SurfaceRole::Bubble)
        .unwrap()
        .set_position(&shell, 120 + 150, 90 + 150);
    shell.clear();

    let snapped = formation.reconcile(&mut group, &shell);
    assert_eq!(snapped, 0);
    assert_eq!(group.surface(SurfaceRole::Bubble).unwrap().pos(), (270, 240));
    assert_eq!(shell.raise_count(), 0);
}

#[test]
fn loose_follower_past_threshold_snaps_exactly() {
    let (mut group, shell) = placed_group();
    let formation = formation(&group);

    group
        .surface_mut(SurfaceRole::Bubble)
        .unwrap()
        .set_position(&shell, 120, 90 + 151);

    let snapped = formation.reconcile(&mut group, &shell);
    assert_eq!(snapped, 1);
    assert_eq!(group.surface(SurfaceRole::Bubble).unwrap().pos(), (120, 90));
}

#[test]
fn strict_follower_snaps_on_any_deviation() {
    let (mut group, shell) = placed_group();
    let formation = formation(&group);

    group
        .surface_mut(SurfaceRole::Memo)
        .unwrap()
        .set_position(&shell, -169, 160);

    assert_eq!(formation.reconcile(&mut group, &shell), 1);
    assert_eq!(group.surface(SurfaceRole::Memo).unwrap().pos(), (-170, 160));
}

#[test]
fn reconcile_is_idempotent() {
    let (mut group, shell) = placed_group();
    let formation = formation(&group);

    group
        .surface_mut(SurfaceRole::Memo)
        .unwrap()
        .set_position(&shell, 0, 0);
    assert_eq!(formation.reconcile(&mut group, &shell), 1);

    shell.clear();
    assert_eq!(formation.reconcile(&mut group, &shell), 0);
    assert!(shell.commands().is_empty(), "second pass must be a no-op");
}

#[test]
fn reconcile_batches_the_group_raise() {
    let (mut group, shell) = placed_group();
    let formation = formation(&group);

    // Two strict followers out of formation at once.
    group
        .surface_mut(SurfaceRole::Memo)
        .unwrap()
        .set_position(&shell, 0, 0);
    group
        .surface_mut(SurfaceRole::Hand)
        .unwrap()
        .set_position(&shell, 500, 500);
    shell.clear();

    assert_eq!(formation.reconcile(&mut group, &shell), 2);
    assert_eq!(shell.raise_count(), 1, "one raise per pass, not per snap");
}

#[test]
fn drag_then_loose_snap_scenario() {
    let (mut group, shell) = placed_group();
    let formation = formation(&group);

    // Drag the anchor by (+30, +15).
    group
        .surface_mut(SurfaceRole::Character)
        .unwrap()
        .set_position(&shell, 130, 115);
    formation.propagate_delta(&mut group, &shell, 30, 15);
    assert_eq!(group.surface(SurfaceRole::Character).unwrap().pos(), (130, 115));
    assert_eq!(group.surface(SurfaceRole::Bubble).unwrap().pos(), (150, 105));

    // Push the bubble far out; |dx| = 250 > 150, so it snaps back.
    group
        .surface_mut(SurfaceRole::Bubble)
        .unwrap()
        .set_position(&shell, 400, 105);
    assert_eq!(formation.reconcile(&mut group, &shell), 1);
    assert_eq!(group.surface(SurfaceRole::Bubble).unwrap().pos(), (150, 105));
}

#[test]
fn sync_translucency_aligns_followers() {
    let (mut group, shell) = placed_group();
    let formation = formation(&group);

    group
        .surface_mut(SurfaceRole::Character)
        .unwrap()
        .toggle_translucency(&shell);
    formation.sync_translucency(&mut group, &shell);

    for role in FOLLOWERS {
        let surface = group.surface(role).unwrap();
        assert!(surface.is_translucent(), "{role} should be translucent");
        assert_eq!(surface.alpha(), 0.5);
    }

    // Aligned already: a second pass changes nothing.
    shell.clear();
    formation.sync_translucency(&mut group, &shell);
    assert!(shell.commands().is_empty());
}
