use crate::coordinator::actor::ActorClient;
use crate::coordinator::coordinator::{CoordinatorView, Phase};
use crate::coordinator::errors::{CoordinatorError, QueryError};
use crate::coordinator::ids::ReplicaId;
use crate::coordinator::membership::{ExportMaster, MembershipSnapshot};
use crate::tracker::SeqNo;
use std::sync::Arc;
use tokio::sync::watch;

/// ExportCoordinator decides, for one (partition, replica), which replica may export which
/// sequence numbers.
///
/// Lifecycle calls go through the coordinator's event loop. Mastership queries don't: they read
/// the latest published view and never block, so they are fine to call on every poll.
#[derive(Clone)]
pub struct ExportCoordinator {
    local_id: ReplicaId,
    actor_client: ActorClient,
    view: watch::Receiver<Arc<CoordinatorView>>,
}

impl ExportCoordinator {
    pub(super) fn new(
        local_id: ReplicaId,
        actor_client: ActorClient,
        view: watch::Receiver<Arc<CoordinatorView>>,
    ) -> Self {
        ExportCoordinator {
            local_id,
            actor_client,
            view,
        }
    }

    pub fn local_replica_id(&self) -> &ReplicaId {
        &self.local_id
    }

    /// Publishes our tracker and starts watching our peers'. Idempotent.
    pub async fn initialize(&self) -> Result<(), CoordinatorError> {
        self.actor_client.initialize().await
    }

    /// Resolves once every member of the partition has been heard from.
    pub async fn wait_ready(&self) -> Result<(), CoordinatorError> {
        let mut view = self.view.clone();
        loop {
            let phase = view.borrow_and_update().phase;
            match phase {
                Phase::Ready => return Ok(()),
                Phase::Shutdown => return Err(CoordinatorError::ShutDown),
                Phase::Uninitialized | Phase::Exchanging => {}
            }
            if view.changed().await.is_err() {
                return Err(CoordinatorError::ShutDown);
            }
        }
    }

    /// Declares this replica the partition leader. Idempotent.
    pub async fn become_leader(&self) -> Result<(), CoordinatorError> {
        self.actor_client.become_leader().await
    }

    /// Declares the first sequence number of the stream. Anything between it and a member's first
    /// tracked sequence number becomes a gap for that member.
    pub async fn set_initial_sequence_number(&self, seq: SeqNo) -> Result<(), CoordinatorError> {
        self.actor_client.set_initial_sequence_number(seq).await
    }

    /// Tells the coordinator the pipeline's tracker or release point moved.
    pub async fn tracker_changed(&self) -> Result<(), CoordinatorError> {
        self.actor_client.tracker_changed().await
    }

    /// Idempotent. Once it returns, no more mastership transitions are delivered.
    pub async fn shutdown(&self) -> Result<(), CoordinatorError> {
        self.actor_client.shutdown().await
    }

    pub fn phase(&self) -> Phase {
        self.view.borrow().phase
    }

    pub fn is_partition_leader(&self) -> bool {
        self.view.borrow().is_partition_leader
    }

    /// The stateful verdict for the next sequence number to export. Only moves at safe points.
    pub fn is_master(&self) -> Result<bool, QueryError> {
        Ok(self.ready_view()?.is_master)
    }

    pub fn is_export_master(&self, seq: SeqNo) -> Result<bool, QueryError> {
        Ok(self.ready_view()?.snapshot.is_export_master(&self.local_id, seq))
    }

    pub fn export_master(&self, seq: SeqNo) -> Result<ExportMaster, QueryError> {
        Ok(self.ready_view()?.snapshot.export_master(seq))
    }

    pub fn covers(&self, member: &ReplicaId, seq: SeqNo) -> Result<bool, QueryError> {
        Ok(self.ready_view()?.snapshot.covers(member, seq))
    }

    pub fn is_safe_point(&self, seq: SeqNo) -> Result<bool, QueryError> {
        Ok(self.ready_view()?.snapshot.is_safe_point(seq))
    }

    /// The membership snapshot mastership is currently decided on.
    pub fn membership(&self) -> Result<Arc<MembershipSnapshot>, QueryError> {
        Ok(self.ready_view()?.snapshot.clone())
    }

    fn ready_view(&self) -> Result<Arc<CoordinatorView>, QueryError> {
        let view = self.view.borrow().clone();
        match view.phase {
            Phase::Ready => Ok(view),
            Phase::Shutdown => Err(QueryError::ShutDown),
            phase => Err(QueryError::NotReady(phase)),
        }
    }
}
