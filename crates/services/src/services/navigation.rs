/// Asks the user whether unsaved changes may be discarded.
///
/// Only consulted while a form is dirty.
pub trait NavigationGuard: Send + Sync {
    fn confirm_discard(&self) -> bool;
}

impl<F> NavigationGuard for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn confirm_discard(&self) -> bool {
        self()
    }
}

/// Returns true when navigation may proceed.
pub fn allow_navigation(dirty: bool, guard: &dyn NavigationGuard) -> bool {
    !dirty || guard.confirm_discard()
}
