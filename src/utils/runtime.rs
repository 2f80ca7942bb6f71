use anyhow::Result;

/// The daemon is a single poll loop and a single writer, so a current-thread
/// runtime is all it needs.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
