/// Decides which neighbours of the current slide get their players initialized ahead of
/// activation. Initialization itself is idempotent, so re-running after every move is cheap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preloader {
    window: usize,
}

impl Preloader {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Indices within `window` of `current`, clipped to `[0, len)`, excluding `current`.
    pub fn targets(&self, current: usize, len: usize) -> impl Iterator<Item = usize> {
        let first = current.saturating_sub(self.window);
        let end = current.saturating_add(self.window).saturating_add(1).min(len);
        (first..end).filter(move |&index| index != current)
    }
}
