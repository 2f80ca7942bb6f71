/// Turns the OS idle-time reading into an idle verdict. A user is idle once
/// their last input is older than the threshold.
pub struct IdleEvaluator {
    threshold_ms: u32,
}

impl IdleEvaluator {
    pub fn from_seconds(threshold_s: u32) -> Self {
        Self {
            threshold_ms: threshold_s.saturating_mul(1000),
        }
    }

    pub fn is_idle(&self, idle_time_ms: u32) -> bool {
        self.threshold_ms < idle_time_ms
    }
}
