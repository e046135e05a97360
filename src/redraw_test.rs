use super::*;

#[test]
fn starts_idle() {
    let r = RedrawScheduler::new();
    assert!(!r.is_pending());
    assert_eq!(r.counts(), (0, 0));
}

#[test]
fn first_request_schedules() {
    let mut r = RedrawScheduler::new();
    assert!(r.request());
    assert!(r.is_pending());
}

#[test]
fn burst_of_requests_collapses_to_one_frame() {
    let mut r = RedrawScheduler::new();
    let scheduled = (0..10).filter(|_| r.request()).count();
    assert_eq!(scheduled, 1);
    assert!(r.take_frame());
    assert!(!r.take_frame());
    assert_eq!(r.counts(), (10, 1));
}

#[test]
fn request_after_frame_schedules_again() {
    let mut r = RedrawScheduler::new();
    r.request();
    r.take_frame();
    assert!(r.request());
    assert!(r.take_frame());
    assert_eq!(r.counts(), (2, 2));
}

#[test]
fn frame_without_request_is_noop() {
    let mut r = RedrawScheduler::new();
    assert!(!r.take_frame());
    assert_eq!(r.counts(), (0, 0));
}
