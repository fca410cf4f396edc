//! Thread-affinity guard for single-threaded subsystems.
//!
//! Registries such as the effect compiler or the material database are
//! owned by one thread (the render thread in practice) and carry no
//! internal locking for their own bookkeeping. [`ThreadAffinity`] records
//! the owning thread at construction and checks it in debug builds.

use std::thread::{self, ThreadId};

/// Remembers which thread owns a subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadAffinity {
    owner: ThreadId,
}

impl ThreadAffinity {
    /// Bind to the calling thread.
    pub fn current() -> Self {
        Self {
            owner: thread::current().id(),
        }
    }

    /// The owning thread.
    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    /// Whether the calling thread owns the subsystem.
    pub fn is_owner(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// Debug-assert that the calling thread owns `subsystem`.
    #[inline]
    #[track_caller]
    pub fn check(&self, subsystem: &str) {
        debug_assert!(
            self.is_owner(),
            "{subsystem} accessed from {:?}, owned by {:?}",
            thread::current().id(),
            self.owner
        );
    }
}

impl Default for ThreadAffinity {
    fn default() -> Self {
        Self::current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_is_creating_thread() {
        let affinity = ThreadAffinity::current();
        assert!(affinity.is_owner());
        affinity.check("test");
    }

    #[test]
    fn other_thread_is_not_owner() {
        let affinity = ThreadAffinity::current();
        let is_owner = std::thread::spawn(move || affinity.is_owner())
            .join()
            .unwrap();
        assert!(!is_owner);
    }
}
