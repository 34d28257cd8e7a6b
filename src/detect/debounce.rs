/// Minimum-spacing filter over classifier hits.
///
/// One piece of state: the timestamp of the last accepted event. A hit is
/// accepted when nothing has been accepted yet this window, or when it
/// arrives strictly more than the configured interval after the previous
/// acceptance; a gap exactly equal to the interval is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebounceState {
    last_accepted: Option<f64>,
}

impl DebounceState {
    pub fn new() -> Self {
        Self {
            last_accepted: None,
        }
    }

    /// Decide on a hit at `timestamp` (seconds). Accepting records the
    /// timestamp; rejecting leaves the state untouched.
    pub fn accept(&mut self, timestamp: f64, min_interval_secs: f64) -> bool {
        if let Some(previous) = self.last_accepted {
            if timestamp - previous <= min_interval_secs {
                return false;
            }
        }
        self.last_accepted = Some(timestamp);
        true
    }

    /// Timestamp of the last accepted event, if any.
    pub fn last_accepted(&self) -> Option<f64> {
        self.last_accepted
    }

    /// Forget the previous event at a window boundary.
    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}
