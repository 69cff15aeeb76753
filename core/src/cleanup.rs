//! Total-effort cleanup
//!
//! Teardown must attempt every step regardless of earlier failures, and a
//! failing step must never propagate past the cleanup phase. [`run_all`]
//! is the single primitive for that contract: run every step, log each
//! failure at warning level, report only the failure count.

use futures::future::BoxFuture;

/// Boxed error carried by a cleanup step
pub type CleanupError = Box<dyn std::error::Error + Send + Sync>;

/// A named best-effort cleanup step
pub type CleanupStep<'a> = (&'static str, BoxFuture<'a, Result<(), CleanupError>>);

/// Run every step in order, swallowing and logging failures
///
/// Returns the number of failed steps, for diagnostics only.
pub async fn run_all(label: &str, steps: Vec<CleanupStep<'_>>) -> usize {
    let mut failures = 0;
    for (name, step) in steps {
        if let Err(e) = step.await {
            failures += 1;
            tracing::warn!(step = name, error = %e, "{label}: cleanup step failed");
        }
    }
    if failures > 0 {
        tracing::warn!(failures, "{label}: finished with failed cleanup steps");
    }
    failures
}
