//! Per-call runtime driver for the synchronous entry points.
//!
//! Every blocking operation builds its own current-thread runtime and shuts
//! it down before returning, so sockets and spawned connection tasks never
//! outlive the call. Shutdown does not wait for blocking-pool work (such as a
//! stuck `getaddrinfo`), which keeps every call within its timeout.

use crate::base::neterror::NetError;
use std::future::Future;

/// Drive `future` to completion on a fresh current-thread runtime.
///
/// Callers that are already inside a tokio runtime cannot nest `block_on`,
/// so the work moves to a scoped helper thread in that case.
pub fn block_on<F>(future: F) -> Result<F::Output, NetError>
where
    F: Future + Send,
    F::Output: Send,
{
    if tokio::runtime::Handle::try_current().is_ok() {
        tracing::trace!("inside a tokio runtime, driving call on helper thread");
        return std::thread::scope(|scope| {
            scope
                .spawn(move || run(future))
                .join()
                .map_err(|_| NetError::IoError("runtime helper thread panicked".into()))?
        });
    }
    run(future)
}

fn run<F: Future>(future: F) -> Result<F::Output, NetError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| NetError::IoError(format!("failed to create runtime: {e}")))?;
    let output = runtime.block_on(future);
    runtime.shutdown_background();
    Ok(output)
}
