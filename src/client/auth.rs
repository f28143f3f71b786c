use tokio::sync::watch;

/// Read side of the logged-in flag shared by client flows.
#[derive(Clone, Debug)]
pub struct AuthSignal {
    rx: watch::Receiver<bool>,
}

impl AuthSignal {
    /// Creates the signal together with the sender that flips it.
    #[must_use]
    pub fn channel(logged_in: bool) -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(logged_in);
        (tx, Self { rx })
    }

    /// A signal that stays logged out.
    #[must_use]
    pub fn logged_out() -> Self {
        Self::channel(false).1
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        *self.rx.borrow()
    }
}
