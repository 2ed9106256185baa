//! Process-wide structured logging.

pub mod tracing;

/// Initialize logging with the default filter (`info`).
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    tracing::init(tracing::DEFAULT_FILTER);
}
