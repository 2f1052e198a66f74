//! Single-assignment cells for values the engine resolves later.
//!
//! A [`Deferred`] is created when a resource is declared, written once by
//! the engine, and read by any number of consumers. Readers either poll with
//! [`Deferred::get`] or wait with [`Deferred::resolved`].

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde_json::Value;
use tokio::sync::Notify;

struct Inner {
    cell: OnceLock<Value>,
    notify: Notify,
}

/// A write-once, read-many output value.
///
/// Clones share the same cell.
#[derive(Clone)]
pub struct Deferred {
    inner: Arc<Inner>,
}

impl Deferred {
    /// Creates an unresolved cell.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cell: OnceLock::new(),
                notify: Notify::new(),
            }),
        }
    }

    /// Creates a cell that is already resolved.
    #[must_use]
    pub fn resolved_with(value: Value) -> Self {
        let deferred = Self::new();
        let _ = deferred.inner.cell.set(value);
        deferred
    }

    /// Resolves the cell and wakes every waiter.
    ///
    /// # Errors
    ///
    /// Returns the rejected value if the cell was already resolved; the
    /// stored value is left untouched.
    pub fn resolve(&self, value: Value) -> std::result::Result<(), Value> {
        self.inner.cell.set(value)?;
        self.inner.notify.notify_waiters();
        Ok(())
    }

    /// Returns the value if it has been resolved.
    #[must_use]
    pub fn get(&self) -> Option<&Value> {
        self.inner.cell.get()
    }

    /// Returns `true` once the engine has written the value.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.inner.cell.get().is_some()
    }

    /// Waits until the value is resolved and returns a copy of it.
    pub async fn resolved(&self) -> Value {
        loop {
            // Register interest before checking so a concurrent resolve
            // between the check and the await is not missed.
            let notified = self.inner.notify.notified();
            if let Some(value) = self.inner.cell.get() {
                return value.clone();
            }
            notified.await;
        }
    }

    /// Returns `true` if both handles point at the same cell.
    #[must_use]
    pub fn same_cell(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Deferred {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => write!(f, "Deferred({value})"),
            None => write!(f, "Deferred(<pending>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn starts_unresolved() {
        let deferred = Deferred::new();
        assert!(!deferred.is_resolved());
        assert!(deferred.get().is_none());
    }

    #[test]
    fn second_resolve_is_rejected_and_value_kept() {
        let deferred = Deferred::new();
        deferred.resolve(json!("first")).expect("first resolve");
        let rejected = deferred.resolve(json!("second")).unwrap_err();
        assert_eq!(rejected, json!("second"));
        assert_eq!(deferred.get(), Some(&json!("first")));
    }

    #[test]
    fn clones_share_the_cell() {
        let deferred = Deferred::new();
        let reader = deferred.clone();
        deferred.resolve(json!(42)).expect("resolve");
        assert_eq!(reader.get(), Some(&json!(42)));
        assert!(reader.same_cell(&deferred));
        assert!(!reader.same_cell(&Deferred::new()));
    }

    #[tokio::test]
    async fn waiter_wakes_on_resolution() {
        let deferred = Deferred::new();
        let reader = deferred.clone();
        let waiter = tokio::spawn(async move { reader.resolved().await });
        tokio::task::yield_now().await;
        deferred.resolve(json!("lb-123.elb.amazonaws.com")).expect("resolve");
        let value = waiter.await.expect("join");
        assert_eq!(value, json!("lb-123.elb.amazonaws.com"));
    }

    #[tokio::test]
    async fn already_resolved_returns_immediately() {
        let deferred = Deferred::resolved_with(json!(true));
        assert_eq!(deferred.resolved().await, json!(true));
    }
}
