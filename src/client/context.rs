/// Per-request metadata carried alongside a request through the retry driver.
///
/// Immutable: moving to the replay attempt produces a new value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestContext {
    retried: bool,
}

impl RequestContext {
    /// Context for a request's first attempt.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this attempt is the single replay after a refresh.
    pub fn is_retried(&self) -> bool {
        self.retried
    }

    /// Context for the replay attempt.
    pub fn into_retried(self) -> Self {
        Self { retried: true }
    }
}
