use super::*;

#[test]
fn fake_clock_advances_monotonically() {
    let clock = FakeClock::new();
    let t0 = clock.now();
    clock.advance(Duration::from_secs(5));
    let t1 = clock.now();
    assert!(t1 > t0);
    assert_eq!(t1 - t0, Duration::from_secs(5));
}

#[test]
fn fake_clock_epoch_ms_advances_with_duration() {
    let clock = FakeClock::new();
    let start = clock.epoch_ms();
    clock.advance(Duration::from_millis(250));
    assert_eq!(clock.epoch_ms(), start + 250);
}

#[test]
fn fake_clock_set_epoch_ms_is_independent_of_instant() {
    let clock = FakeClock::new();
    clock.set_epoch_ms(42);
    assert_eq!(clock.epoch_ms(), 42);
}

#[test]
fn system_clock_epoch_ms_is_nonzero() {
    let clock = SystemClock;
    assert!(clock.epoch_ms() > 0);
}
