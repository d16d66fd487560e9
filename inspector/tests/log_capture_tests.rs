//! Global installation of the capturing logger.
//!
//! Lives in its own test binary because the logger can only be set once per process.

use collscope_inspector::log_capture::{self, CAPTURE_TARGET_PREFIX};

#[test]
fn install_captures_collscope_records_once() {
    let sink = log_capture::install(4).expect("first install succeeds");
    assert!(log_capture::capture_sink().is_some_and(|s| std::sync::Arc::ptr_eq(&s, &sink)));

    log::warn!(target: "collscope::inspector", "scene 3 has no quadtree");
    log::warn!(target: "host::streaming", "not ours");

    let captured = sink.snapshot();
    assert_eq!(captured.len(), 1);
    assert!(captured[0].target.starts_with(CAPTURE_TARGET_PREFIX));
    assert_eq!(captured[0].message, "scene 3 has no quadtree");
    assert_eq!(captured[0].level, log::Level::Warn);

    assert!(log_capture::install(4).is_err());
}
