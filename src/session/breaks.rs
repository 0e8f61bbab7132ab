/// Break intervals for one session and which of them have been used.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakSchedule {
    /// Sorted ascending, distinct.
    intervals: Vec<f64>,
    consumed: Vec<bool>,
    last_break_minutes: f64,
}

impl BreakSchedule {
    pub fn new(intervals: &[f64]) -> Self {
        let mut intervals = intervals.to_vec();
        intervals.sort_by(f64::total_cmp);
        intervals.dedup();
        let consumed = vec![false; intervals.len()];
        Self {
            intervals,
            consumed,
            last_break_minutes: 0.0,
        }
    }

    pub fn intervals(&self) -> &[f64] {
        &self.intervals
    }

    pub fn last_break_minutes(&self) -> f64 {
        self.last_break_minutes
    }

    /// Smallest unused interval above the last break that `total_minutes` has reached.
    pub fn next_due(&self, total_minutes: f64) -> Option<usize> {
        self.intervals
            .iter()
            .zip(&self.consumed)
            .position(|(&interval, &consumed)| {
                !consumed && interval > self.last_break_minutes && interval <= total_minutes
            })
    }

    /// Mark the interval at `slot` as used. Returns its value in minutes.
    pub fn consume(&mut self, slot: usize) -> Option<f64> {
        let interval = *self.intervals.get(slot)?;
        if std::mem::replace(&mut self.consumed[slot], true) {
            return None;
        }
        self.last_break_minutes = interval;
        Some(interval)
    }

    pub fn inserted_break_times(&self) -> Vec<f64> {
        self.intervals
            .iter()
            .zip(&self.consumed)
            .filter(|&(_, &consumed)| consumed)
            .map(|(&interval, _)| interval)
            .collect()
    }
}
