use std::rc::Rc;

/// Time source for the session.
///
/// Latency measurement, event timestamps and stage stamps all read the same
/// clock, which keeps the runtime deterministic under test (see the manual
/// clock in tutorkit-testing).
pub trait Clock {
    /// Current time as epoch seconds.
    fn now_ts(&self) -> f64;
}

/// Wall-clock implementation backed by chrono.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ts(&self) -> f64 {
        let now = chrono::Utc::now();
        now.timestamp() as f64 + f64::from(now.timestamp_subsec_millis()) / 1000.0
    }
}

/// The session is single-threaded, so a plain `Rc` handle is enough.
pub type SharedClock = Rc<dyn Clock>;
