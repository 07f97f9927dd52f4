// # Lazy Slot
//
// Compute-once holder for resources that are expensive to build or that
// cannot be built until configuration is fully wired.
//
// ## Resolution Policy
//
// - The first read runs the constructor and stores its value permanently.
// - Concurrent first readers block until the single running constructor
//   finishes; exactly one construction happens per slot.
// - A failed construction is NOT memoized. The error goes to the caller
//   that triggered it and the slot stays unresolved, so the next read
//   runs the constructor again.

use once_cell::sync::OnceCell;
use std::fmt;

/// A value that is resolved at most once, on first read
pub struct LazySlot<T> {
    /// Name used in log lines and errors
    name: &'static str,
    cell: OnceCell<T>,
}

impl<T> LazySlot<T> {
    /// Create an unresolved slot
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            cell: OnceCell::new(),
        }
    }

    /// Slot name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Return the resolved value, running `init` if this is the first read
    ///
    /// If `init` fails the error is returned and the slot remains
    /// unresolved.
    pub fn get_or_try_init<E, F>(&self, init: F) -> Result<&T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: fmt::Display,
    {
        if let Some(value) = self.cell.get() {
            return Ok(value);
        }

        self.cell.get_or_try_init(|| {
            tracing::debug!("Resolving lazy slot: {}", self.name);
            init().inspect_err(|e| {
                tracing::warn!("Lazy slot {} failed to resolve: {}", self.name, e);
            })
        })
    }

    /// Return the resolved value, running an infallible `init` on first read
    pub fn get_or_init<F>(&self, init: F) -> &T
    where
        F: FnOnce() -> T,
    {
        self.cell.get_or_init(|| {
            tracing::debug!("Resolving lazy slot: {}", self.name);
            init()
        })
    }

    /// The resolved value, if any, without triggering resolution
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    /// Whether the slot has been resolved
    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Resolve the slot with an externally built value
    ///
    /// Returns the value back if the slot was already resolved.
    pub fn set(&self, value: T) -> Result<(), T> {
        self.cell.set(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for LazySlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => f
                .debug_tuple("LazySlot::Resolved")
                .field(&self.name)
                .field(value)
                .finish(),
            None => f
                .debug_tuple("LazySlot::Unresolved")
                .field(&self.name)
                .finish(),
        }
    }
}
