//! Session-termination signal.

use tokio::sync::mpsc;

use super::error::AuthError;

/// Receives the signal that the authenticated session has ended.
///
/// Invoked once per terminal refresh failure, after stored credentials have
/// been cleared. Hosts use it to move the user out of the authenticated area.
pub trait SessionListener: Send + Sync {
    fn session_terminated(&self, reason: &AuthError);
}

impl<F> SessionListener for F
where
    F: Fn(&AuthError) + Send + Sync,
{
    fn session_terminated(&self, reason: &AuthError) {
        self(reason)
    }
}

/// Listener that ignores termination.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSessionListener;

impl SessionListener for NoopSessionListener {
    fn session_terminated(&self, _reason: &AuthError) {}
}

/// Forwards termination reasons into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSessionListener {
    tx: mpsc::UnboundedSender<AuthError>,
}

impl ChannelSessionListener {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AuthError>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SessionListener for ChannelSessionListener {
    fn session_terminated(&self, reason: &AuthError) {
        // Receiver gone means nobody is watching anymore.
        let _ = self.tx.send(reason.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_listener_forwards_reason() {
        let (listener, mut rx) = ChannelSessionListener::new();
        listener.session_terminated(&AuthError::RefreshUnavailable);
        assert_eq!(rx.recv().await, Some(AuthError::RefreshUnavailable));
    }

    #[test]
    fn closures_are_listeners() {
        let hits = std::sync::atomic::AtomicUsize::new(0);
        let listener = |_: &AuthError| {
            hits.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        };
        listener.session_terminated(&AuthError::RefreshAbandoned);
        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
