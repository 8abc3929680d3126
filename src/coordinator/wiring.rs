use crate::coordinator::actor::{ActorClient, CoordinatorActor};
use crate::coordinator::coordinator::{Coordinator, CoordinatorConfig};
use crate::coordinator::handle::ExportCoordinator;
use crate::coordinator::ids::ReplicaId;
use crate::coordinator::mastership_listener::MastershipListener;
use crate::coordinator::membership::Ranking;
use crate::coordinator::options::{CoordinatorOptions, CoordinatorOptionsValidated};
use crate::exchange::MembershipExchange;
use crate::pipeline::TrackerProvider;
use std::collections::HashSet;
use std::convert::TryFrom;
use std::sync::Arc;

pub struct ExportCoordinatorConfig {
    pub local_replica_id: String,
    // Every replica of the partition, lowest rank first. Empty means just us.
    pub members: Vec<String>,
    // Partition-scoped path under which members exchange snapshots.
    pub root_path: String,
    pub exchange: Arc<dyn MembershipExchange>,
    pub tracker_provider: Arc<dyn TrackerProvider>,
    pub info_logger: slog::Logger,
    pub options: CoordinatorOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorCreationError {
    #[error("Illegal options for configuring coordinator: {0}")]
    IllegalOptions(String),
    #[error("my replica ID not in partition members")]
    MeNotInMembers,
    #[error("replica {0} listed more than once")]
    DuplicateMember(String),
    #[error("root path must not be empty")]
    EmptyRootPath,
}

pub async fn try_create_export_coordinator(
    config: ExportCoordinatorConfig,
) -> Result<(ExportCoordinator, MastershipListener), CoordinatorCreationError> {
    let options = CoordinatorOptionsValidated::try_from(config.options)
        .map_err(|e| CoordinatorCreationError::IllegalOptions(e.to_string()))?;

    if config.root_path.is_empty() {
        return Err(CoordinatorCreationError::EmptyRootPath);
    }
    let local_id = ReplicaId::new(config.local_replica_id);
    let ranking = ranking(&local_id, config.members)?;

    let provider = config.tracker_provider;
    let logger = config.info_logger.new(slog::o!(
        "Partition" => provider.partition_id().as_i32(),
        "Stream" => provider.stream_id().as_str().to_string(),
        "Replica" => local_id.to_string()
    ));

    let (actor_client, actor_queue_rx) = ActorClient::new(options.actor_queue_size);
    let (coordinator, view_receiver, mastership_listener) = Coordinator::new(CoordinatorConfig {
        logger: logger.clone(),
        local_id: local_id.clone(),
        ranking,
        root_path: config.root_path,
        exchange: config.exchange,
        provider,
        options,
        actor_client: actor_client.weak(),
    });

    let actor = CoordinatorActor::new(logger, actor_queue_rx, coordinator);
    tokio::spawn(actor.run_event_loop());

    Ok((
        ExportCoordinator::new(local_id, actor_client, view_receiver),
        mastership_listener,
    ))
}

fn ranking(local_id: &ReplicaId, members: Vec<String>) -> Result<Ranking, CoordinatorCreationError> {
    if members.is_empty() {
        return Ok(Ranking::new(vec![local_id.clone()]));
    }

    let mut seen = HashSet::new();
    for member in &members {
        if !seen.insert(member.as_str()) {
            return Err(CoordinatorCreationError::DuplicateMember(member.clone()));
        }
    }
    if !seen.contains(local_id.as_str()) {
        return Err(CoordinatorCreationError::MeNotInMembers);
    }

    Ok(Ranking::new(members.into_iter().map(ReplicaId::new).collect()))
}
