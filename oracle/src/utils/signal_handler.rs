use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Context as _, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[cfg(unix)]
use signal::unix::{signal, SignalKind};

/// Signal types that can trigger shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGTERM - Docker/Kubernetes graceful shutdown
    Terminate,
    /// SIGINT - Ctrl+C interactive shutdown
    Interrupt,
    /// SIGQUIT - Quit signal
    Quit,
    /// Cancellation requested from inside the process
    Internal,
}

impl std::fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownSignal::Terminate => write!(f, "SIGTERM"),
            ShutdownSignal::Interrupt => write!(f, "SIGINT"),
            ShutdownSignal::Quit => write!(f, "SIGQUIT"),
            ShutdownSignal::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Turns process signals into cancellation of a [`CancellationToken`].
///
/// A run in progress is never interrupted by the token; the scheduler only
/// observes it while waiting, so an accepted signal stops the oracle at the
/// next idle point.
pub struct SignalHandler {
    shutdown_signal: Option<ShutdownSignal>,
    token: CancellationToken,
}

impl SignalHandler {
    pub fn new(token: CancellationToken) -> Self {
        Self { shutdown_signal: None, token }
    }

    /// Token cancelled once a shutdown signal arrives
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Waits for a signal, or for the token to be cancelled elsewhere, then cancels the token
    pub async fn wait_for_shutdown(&mut self) -> Result<ShutdownSignal> {
        let signal = self.wait_for_signal().await?;
        self.shutdown_signal = Some(signal);
        info!(signal = %signal, "Received shutdown signal");
        self.token.cancel();
        Ok(signal)
    }

    pub fn shutdown_signal(&self) -> Option<ShutdownSignal> {
        self.shutdown_signal
    }

    #[cfg(unix)]
    async fn wait_for_signal(&self) -> Result<ShutdownSignal> {
        let mut sigterm = signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sigquit = signal(SignalKind::quit()).context("Failed to create SIGQUIT handler")?;

        info!("Signal handler initialized, listening for SIGTERM, SIGINT and SIGQUIT");

        let signal = tokio::select! {
            _ = sigterm.recv() => {
                info!("Docker/Kubernetes graceful shutdown initiated (SIGTERM)");
                ShutdownSignal::Terminate
            }
            _ = sigint.recv() => {
                info!("Interactive shutdown initiated (SIGINT/Ctrl+C)");
                ShutdownSignal::Interrupt
            }
            _ = sigquit.recv() => {
                warn!("Force quit signal received (SIGQUIT)");
                ShutdownSignal::Quit
            }
            _ = self.token.cancelled() => ShutdownSignal::Internal,
        };
        Ok(signal)
    }

    #[cfg(not(unix))]
    async fn wait_for_signal(&self) -> Result<ShutdownSignal> {
        info!("Signal handler initialized, listening for Ctrl+C");

        let signal = tokio::select! {
            result = signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl+C")?;
                info!("Interactive shutdown initiated (Ctrl+C)");
                ShutdownSignal::Interrupt
            }
            _ = self.token.cancelled() => ShutdownSignal::Internal,
        };
        Ok(signal)
    }

    /// Lets `in_flight` finish within `timeout`.
    ///
    /// After SIGQUIT the timeout is not waited for.
    pub async fn handle_graceful_shutdown<T, Fut>(&self, in_flight: Fut, timeout: Duration) -> Result<T>
    where
        Fut: Future<Output = T>,
    {
        let signal = self.shutdown_signal.unwrap_or(ShutdownSignal::Internal);
        if signal == ShutdownSignal::Quit {
            warn!("SIGQUIT received, not waiting for the current run");
            return Err(anyhow!("Shutdown forced by SIGQUIT"));
        }

        info!(signal = %signal, timeout_secs = timeout.as_secs(), "Waiting for the current run to finish");
        match tokio::time::timeout(timeout, in_flight).await {
            Ok(value) => {
                info!("Graceful shutdown completed");
                Ok(value)
            }
            Err(_) => {
                error!(timeout_secs = timeout.as_secs(), "Graceful shutdown timed out, the current run may be incomplete");
                Err(anyhow!("Shutdown timeout exceeded"))
            }
        }
    }
}
