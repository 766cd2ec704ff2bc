use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::reference::DocumentReference;
use crate::remote::ListenerRegistration;

/// Owns one live subscription and releases it exactly once.
///
/// `dispose` is idempotent and takes `&self`, so a disposer can be shared
/// (e.g. behind an `Arc`) and disposed from anywhere. Dropping the disposer
/// disposes it as well.
#[must_use = "dropping a Disposer ends the subscription"]
pub struct Disposer {
    registration: Box<dyn ListenerRegistration>,
    disposed: Arc<AtomicBool>,
    reference: Option<DocumentReference>,
}

impl Disposer {
    /// Wrap a registration.
    pub fn new(registration: Box<dyn ListenerRegistration>) -> Self {
        Self::with_gate(registration, Arc::new(AtomicBool::new(false)), None)
    }

    /// Wrap a registration whose callback checks `disposed` before running.
    pub(crate) fn with_gate(
        registration: Box<dyn ListenerRegistration>,
        disposed: Arc<AtomicBool>,
        reference: Option<DocumentReference>,
    ) -> Self {
        Self {
            registration,
            disposed,
            reference,
        }
    }

    /// End the subscription. Later calls do nothing.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.registration.remove();
        match &self.reference {
            Some(reference) => tracing::debug!(%reference, "subscription disposed"),
            None => tracing::debug!("subscription disposed"),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl Drop for Disposer {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposer")
            .field("reference", &self.reference)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    struct CountingRegistration {
        removals: Arc<AtomicUsize>,
    }

    impl ListenerRegistration for CountingRegistration {
        fn remove(&self) {
            self.removals.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn disposer() -> (Disposer, Arc<AtomicUsize>) {
        let removals = Arc::new(AtomicUsize::new(0));
        let registration = CountingRegistration {
            removals: Arc::clone(&removals),
        };
        (Disposer::new(Box::new(registration)), removals)
    }

    #[test]
    fn dispose_is_idempotent() {
        let (disposer, removals) = disposer();
        assert!(!disposer.is_disposed());

        disposer.dispose();
        disposer.dispose();

        assert!(disposer.is_disposed());
        assert_eq!(removals.load(Ordering::SeqCst), 1);
        drop(disposer);
        assert_eq!(removals.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_disposes() {
        let (disposer, removals) = disposer();
        drop(disposer);
        assert_eq!(removals.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn can_be_disposed_from_another_thread() {
        let (disposer, removals) = disposer();
        let shared = Arc::new(disposer);
        let remote = Arc::clone(&shared);

        thread::spawn(move || remote.dispose()).join().unwrap();

        assert!(shared.is_disposed());
        shared.dispose();
        assert_eq!(removals.load(Ordering::SeqCst), 1);
    }
}
