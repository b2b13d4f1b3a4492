use tokio::sync::watch;

/// A token that can be checked or awaited for cancellation.
#[derive(Clone)]
pub struct CancellationToken(watch::Receiver<bool>);

impl CancellationToken {
    /// Returns true if cancellation has been signalled.
    pub fn is_cancelled(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once cancellation is signalled or the [`Shutdown`] handle is
    /// dropped.
    pub async fn cancelled(&self) {
        let mut rx = self.0.clone();
        // Err means the sender is gone, which counts as cancelled.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Owning side of a cancellation channel.
pub struct Shutdown(watch::Sender<bool>);

impl Shutdown {
    /// Signal cancellation to every token.
    /// Returns true if any token was still listening.
    pub fn cancel(&self) -> bool {
        self.0.send(true).is_ok()
    }
}

pub fn channel() -> (Shutdown, CancellationToken) {
    let (tx, rx) = watch::channel(false);
    (Shutdown(tx), CancellationToken(rx))
}
