//! Process termination signals

use tracing::warn;

/// Resolves on Ctrl-C, or on SIGTERM where available
pub async fn termination_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler, listening for Ctrl-C only");
                wait_ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        wait_ctrl_c().await;
    }
}

async fn wait_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        // Without a signal source, only an explicit shutdown stops the process
        std::future::pending::<()>().await;
    }
}
