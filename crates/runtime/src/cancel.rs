use std::cell::Cell;
use std::rc::Rc;

/// Shared cancellation flag for deferred work.
///
/// Clones observe the same flag. Once cancelled a token stays cancelled;
/// callers replace it with a fresh token instead of resetting it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// True when both handles share the same flag.
    pub fn same_as(&self, other: &CancelToken) -> bool {
        Rc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::CancelToken;

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let held = token.clone();
        assert!(!held.is_cancelled());
        token.cancel();
        assert!(held.is_cancelled());
        assert!(held.same_as(&token));
        assert!(!CancelToken::new().same_as(&token));
    }
}
