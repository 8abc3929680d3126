use tokio::sync::watch;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MastershipEvent {
    /// The pipeline may start transmitting.
    Gained,
    /// The pipeline must park its transmit loop.
    Lost,
}

pub(super) fn new() -> (MastershipNotifier, MastershipListener) {
    let (snd, rcv) = watch::channel(false);

    (MastershipNotifier { snd }, MastershipListener { rcv })
}

pub(super) struct MastershipNotifier {
    snd: watch::Sender<bool>,
}

impl MastershipNotifier {
    pub(super) fn notify(&self, event: MastershipEvent) {
        self.snd.send_replace(event == MastershipEvent::Gained);
    }
}

/// MastershipListener tells the owning pipeline when the coordinator's stateful verdict flips.
///
/// Only the latest state is kept. A gain quickly followed by a loss may be observed as a single
/// `Lost`.
#[derive(Clone)]
pub struct MastershipListener {
    rcv: watch::Receiver<bool>,
}

impl MastershipListener {
    /// Returns `None` once the coordinator has shut down and every transition has been observed.
    pub async fn next(&mut self) -> Option<MastershipEvent> {
        match self.rcv.changed().await {
            Ok(_) => Some(self.current()),
            Err(_) => None,
        }
    }

    pub fn is_master(&self) -> bool {
        *self.rcv.borrow()
    }

    fn current(&self) -> MastershipEvent {
        if self.is_master() {
            MastershipEvent::Gained
        } else {
            MastershipEvent::Lost
        }
    }
}
