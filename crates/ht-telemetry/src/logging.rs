//! Structured logging helpers.
//!
//! Sync events carry the same field names in every crate so JSON logs can
//! be filtered on them:
//! - `component`: Emitting component (backfill, poller, runtime)
//! - `head`: Chain head height observed
//! - `fetched`: Records fetched
//! - `skipped`: Heights that failed

/// Log a sync event with standard fields.
///
/// ```rust,ignore
/// log_sync_event!(info, "poller", "Tick synced", head = 1000, fetched = 3, skipped = 0);
/// ```
#[macro_export]
macro_rules! log_sync_event {
    ($level:ident, $component:expr, $msg:expr, head = $head:expr, fetched = $fetched:expr, skipped = $skipped:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            head = $head,
            fetched = $fetched,
            skipped = $skipped,
            $($($field)*,)?
            $msg
        )
    };

    ($level:ident, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}
