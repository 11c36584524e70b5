use std::time::Duration;

use desk_companion::blink::{BlinkCycle, BlinkPhase, BLINK_FRAMES, BLINK_HOLDS, IDLE_DELAY_SECS};

#[test]
fn blink_sequence_is_deterministic() {
    let mut cycle = BlinkCycle::with_seed(42);
    let _ = cycle.sample_idle_delay();

    let mut frames = Vec::new();
    let mut holds = Vec::new();

    let (frame, hold) = cycle.begin();
    frames.push(frame);
    holds.push(hold);
    while let Some((frame, hold)) = cycle.advance() {
        frames.push(frame);
        holds.push(hold);
    }

    assert_eq!(frames, BLINK_FRAMES.to_vec());
    assert_eq!(holds, BLINK_HOLDS.to_vec());
    assert_eq!(cycle.phase(), BlinkPhase::Idle);
    assert_eq!(cycle.frame(), 0, "eyes open again after the blink");
}

#[test]
fn idle_delays_come_from_the_fixed_candidates() {
    let mut cycle = BlinkCycle::with_seed(7);
    for _ in 0..200 {
        let delay = cycle.sample_idle_delay();
        assert!(IDLE_DELAY_SECS
            .iter()
            .any(|&s| delay == Duration::from_secs(s)));
    }
}

#[test]
fn short_delays_dominate() {
    let mut cycle = BlinkCycle::with_seed(1234);
    let mut counts = [0usize; 5];
    for _ in 0..2000 {
        let secs = cycle.sample_idle_delay().as_secs() as usize;
        counts[secs - 1] += 1;
    }
    assert!(counts[0] > counts[2], "1s should beat 3s: {counts:?}");
    assert!(counts[2] > counts[4], "3s should beat 5s: {counts:?}");
}

#[test]
fn same_seed_gives_the_same_delay_sequence() {
    let mut a = BlinkCycle::with_seed(99);
    let mut b = BlinkCycle::with_seed(99);
    for _ in 0..50 {
        assert_eq!(a.sample_idle_delay(), b.sample_idle_delay());
    }
}

#[test]
fn advance_outside_a_blink_is_a_noop() {
    let mut cycle = BlinkCycle::with_seed(0);
    assert_eq!(cycle.advance(), None);
    assert_eq!(cycle.phase(), BlinkPhase::Idle);
}

#[test]
fn reset_abandons_an_in_flight_blink() {
    let mut cycle = BlinkCycle::with_seed(0);
    cycle.begin();
    cycle.advance();
    assert_eq!(cycle.phase(), BlinkPhase::Blinking);

    cycle.reset();
    assert_eq!(cycle.phase(), BlinkPhase::Idle);
    assert_eq!(cycle.frame(), 0);
}
