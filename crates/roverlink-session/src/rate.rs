/// Instantaneous frame arrival rate from consecutive arrival timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateEstimator {
    last_arrival_millis: Option<u64>,
}

impl RateEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame arrival and return the rate in Hz since the previous one.
    ///
    /// The first arrival after construction or [`reset`](Self::reset) only
    /// records the timestamp. A zero or negative interval yields `None` but
    /// still moves the timestamp forward.
    pub fn on_frame_arrived(&mut self, now_millis: u64) -> Option<f64> {
        let previous = self.last_arrival_millis.replace(now_millis)?;
        match now_millis.checked_sub(previous) {
            Some(delta) if delta > 0 => Some(1000.0 / delta as f64),
            _ => None,
        }
    }

    /// Forget the previous arrival. Called whenever the link drops.
    pub fn reset(&mut self) {
        self.last_arrival_millis = None;
    }

    pub fn last_arrival_millis(&self) -> Option<u64> {
        self.last_arrival_millis
    }
}
