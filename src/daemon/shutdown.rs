use tokio::select;
use tokio_util::sync::CancellationToken;

/// Waits for a termination signal and cancels the polling loop. Detached
/// daemons on Windows do not receive console signals, so `screentime stop`
/// terminates the process instead.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
    };
}
