//! Open/closed state and the awaitable ready signal.

use tokio::sync::watch;

/// Lifecycle phase of a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Created, not yet bound.
    Starting,
    /// Bound and accepting; carries the canonical address.
    Open(String),
    /// Explicitly closed or stopped by a transport error.
    Closed,
}

/// Watchable lifecycle state.
///
/// Written only by the lifecycle manager; readers await transitions via
/// [`Lifecycle::ready`].
#[derive(Clone)]
pub struct Lifecycle {
    tx: watch::Sender<Phase>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Phase::Starting);
        Self { tx }
    }

    /// Transition to open. Refused once closed: a server never reopens.
    pub fn set_open(&self, address: String) {
        self.tx.send_if_modified(|phase| {
            if matches!(phase, Phase::Closed) {
                false
            } else {
                *phase = Phase::Open(address);
                true
            }
        });
    }

    pub fn set_closed(&self) {
        self.tx.send_replace(Phase::Closed);
    }

    pub fn is_open(&self) -> bool {
        matches!(&*self.tx.borrow(), Phase::Open(_))
    }

    /// Resolve to the canonical address once the server is open.
    ///
    /// Resolves immediately if already open. After the server closes this
    /// never resolves; callers wanting a bound wait combine it with their
    /// own timeout.
    pub async fn ready(&self) -> String {
        let mut rx = self.tx.subscribe();
        loop {
            {
                let phase = rx.borrow_and_update();
                if let Phase::Open(address) = &*phase {
                    return address.clone();
                }
            }
            if rx.changed().await.is_err() {
                // Sender gone: the server can never open again.
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
