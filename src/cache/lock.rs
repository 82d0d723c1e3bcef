//! Poison-tolerant access to the memory backend's entry table.
//!
//! A panic while an entry table guard is held must not take the cache down
//! with it: the table is handed back as the panicking task left it.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

pub(crate) fn read_entries<'a, T>(
    table: &'a RwLock<T>,
    source: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    table.read().unwrap_or_else(|poisoned| {
        report_poisoned(source, op, "read");
        poisoned.into_inner()
    })
}

pub(crate) fn write_entries<'a, T>(
    table: &'a RwLock<T>,
    source: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    table.write().unwrap_or_else(|poisoned| {
        report_poisoned(source, op, "write");
        poisoned.into_inner()
    })
}

fn report_poisoned(source: &'static str, op: &'static str, access: &'static str) {
    warn!(
        target: "folio::cache",
        source,
        op,
        access,
        hint = "a resource entry may hold a half-written value until its TTL lapses or the key is invalidated",
        "Memory cache entry table was poisoned; continuing"
    );
}
