use crate::coordinator::coordinator::Coordinator;
use crate::coordinator::errors::CoordinatorError;
use crate::exchange::MembershipView;
use crate::tracker::SeqNo;
use std::error::Error;
use std::fmt::Debug;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug)]
pub(super) enum Event {
    // Uninitialized: Publish own snapshot, subscribe to peers. Transition to exchanging.
    // Exchanging/Ready: no-op.
    // Shutdown: reject.
    Initialize(Callback<(), CoordinatorError>),

    // Any phase but shutdown: claim partition leadership in our snapshot and republish.
    BecomeLeader(Callback<(), CoordinatorError>),

    // Any phase but shutdown: rebuild coverage of every member with the new lower bound.
    SetInitialSequenceNumber(SeqNo, Callback<(), CoordinatorError>),

    // Re-read the pipeline's tracker, republish it, re-evaluate mastership.
    TrackerChanged,

    // From the subscription task.
    // Exchanging: rebuild snapshot. Transition to ready once every member has published.
    // Ready: rebuild snapshot, re-evaluate mastership.
    MembershipUpdated(MembershipView),

    // From the publish task. Republish if the tracker changed in the meantime.
    PublishCompleted,

    // From the settle timer. Exchanging: stop waiting for silent members.
    SettleDeadlinePassed,

    // Cancel background tasks, give up mastership, withdraw our snapshot. Idempotent.
    Shutdown(Callback<(), CoordinatorError>),
}

#[derive(Debug)]
pub(super) struct Callback<O: Debug, E: Error>(oneshot::Sender<Result<O, E>>);

impl<O: Debug, E: Error> Callback<O, E> {
    pub fn send(self, message: Result<O, E>) {
        let _ = self.0.send(message);
    }
}

#[derive(Clone)]
pub(super) struct ActorClient {
    sender: mpsc::Sender<Event>,
}

impl ActorClient {
    pub(super) fn new(buffer_size: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(buffer_size);
        (ActorClient { sender: tx }, rx)
    }

    pub(super) fn weak(&self) -> WeakActorClient {
        WeakActorClient {
            sender: self.sender.downgrade(),
        }
    }

    pub(super) async fn initialize(&self) -> Result<(), CoordinatorError> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Initialize(Callback(tx))).await?;

        rx.await.map_err(|_| CoordinatorError::ShutDown)?
    }

    pub(super) async fn become_leader(&self) -> Result<(), CoordinatorError> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::BecomeLeader(Callback(tx))).await?;

        rx.await.map_err(|_| CoordinatorError::ShutDown)?
    }

    pub(super) async fn set_initial_sequence_number(&self, seq: SeqNo) -> Result<(), CoordinatorError> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::SetInitialSequenceNumber(seq, Callback(tx))).await?;

        rx.await.map_err(|_| CoordinatorError::ShutDown)?
    }

    pub(super) async fn tracker_changed(&self) -> Result<(), CoordinatorError> {
        self.send(Event::TrackerChanged).await
    }

    pub(super) async fn shutdown(&self) -> Result<(), CoordinatorError> {
        let (tx, rx) = oneshot::channel();
        if self.send(Event::Shutdown(Callback(tx))).await.is_err() {
            // Event loop is already gone, somebody else shut it down.
            return Ok(());
        }

        rx.await.unwrap_or(Ok(()))
    }

    async fn send(&self, event: Event) -> Result<(), CoordinatorError> {
        self.sender.send(event).await.map_err(|_| CoordinatorError::ShutDown)
    }
}

/// WeakActorClient is held by the coordinator itself and by the tasks it spawns, so that dropping
/// every `ExportCoordinator` handle still stops the event loop.
#[derive(Clone)]
pub(super) struct WeakActorClient {
    sender: mpsc::WeakSender<Event>,
}

impl WeakActorClient {
    /// Returns false if the event loop is gone.
    pub(super) async fn membership_updated(&self, view: MembershipView) -> bool {
        self.send(Event::MembershipUpdated(view)).await
    }

    pub(super) async fn publish_completed(&self) -> bool {
        self.send(Event::PublishCompleted).await
    }

    pub(super) async fn settle_deadline_passed(&self) -> bool {
        self.send(Event::SettleDeadlinePassed).await
    }

    async fn send(&self, event: Event) -> bool {
        match self.sender.upgrade() {
            Some(sender) => sender.send(event).await.is_ok(),
            None => false,
        }
    }
}

/// CoordinatorActor is the export coordinator in actor model.
pub(super) struct CoordinatorActor {
    logger: slog::Logger,
    receiver: mpsc::Receiver<Event>,
    coordinator: Coordinator,
}

impl CoordinatorActor {
    pub(super) fn new(logger: slog::Logger, receiver: mpsc::Receiver<Event>, coordinator: Coordinator) -> Self {
        CoordinatorActor {
            logger,
            receiver,
            coordinator,
        }
    }

    pub(super) async fn run_event_loop(mut self) {
        while let Some(event) = self.receiver.recv().await {
            self.handle_event(event);
            if self.coordinator.is_shut_down() {
                break;
            }
        }

        if !self.coordinator.is_shut_down() {
            slog::info!(self.logger, "Every coordinator handle dropped without shutdown.");
            // Nobody is waiting on the withdrawal.
            let _ = self.coordinator.shutdown();
        }
        slog::debug!(self.logger, "Coordinator event loop exited.");
    }

    // This must NOT be async. Any long running work must be spawned on another task
    // and come back as an event to this actor.
    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Initialize(callback) => {
                callback.send(self.coordinator.initialize());
            }
            Event::BecomeLeader(callback) => {
                callback.send(self.coordinator.become_leader());
            }
            Event::SetInitialSequenceNumber(seq, callback) => {
                callback.send(self.coordinator.set_initial_sequence_number(seq));
            }
            Event::TrackerChanged => {
                self.coordinator.tracker_changed();
            }
            Event::MembershipUpdated(view) => {
                self.coordinator.membership_updated(view);
            }
            Event::PublishCompleted => {
                self.coordinator.publish_completed();
            }
            Event::SettleDeadlinePassed => {
                self.coordinator.settle_deadline_passed();
            }
            Event::Shutdown(callback) => match self.coordinator.shutdown() {
                Some(withdrawal) => {
                    tokio::spawn(async move {
                        let _ = withdrawal.await;
                        callback.send(Ok(()));
                    });
                }
                None => callback.send(Ok(())),
            },
        }
    }
}
