use export_coordinator::{
    create_root_logger_for_stdout, send_to_peers, spawn_ack_listener, try_create_export_coordinator, Epoch,
    ExportBuffer, ExportCoordinator, ExportCoordinatorConfig, InMemoryAckNetwork, InMemoryExchange, PartitionId,
    ReplicaId, SeqNo, SeqRange, StreamId,
};
use std::error::Error;
use std::sync::Arc;
use tokio::time::Duration;

const LAST_SEQ_NO: SeqNo = 300;

struct Replica {
    id: ReplicaId,
    buffer: Arc<ExportBuffer>,
    coordinator: ExportCoordinator,
}

/// Three replicas of one partition with nested gaps, exporting 1..=300 over the in-memory
/// exchange. Mastership goes leader -> follower-1 -> follower-2 -> follower-1 -> leader.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let logger = create_root_logger_for_stdout("export-demo".to_string());
    let exchange = Arc::new(InMemoryExchange::new());
    let network = Arc::new(InMemoryAckNetwork::new(64));

    let layouts: [(&str, &[(SeqNo, SeqNo)]); 3] = [
        ("leader", &[(1, 100), (200, 300)]),
        ("follower-1", &[(1, 130), (170, 300)]),
        ("follower-2", &[(1, 180)]),
    ];
    let members: Vec<String> = layouts.iter().map(|(id, _)| id.to_string()).collect();
    let peers: Vec<ReplicaId> = members.iter().map(|id| ReplicaId::new(id.as_str())).collect();

    let mut replicas = Vec::with_capacity(layouts.len());
    for (id, ranges) in layouts.iter() {
        let buffer = Arc::new(ExportBuffer::recovered(
            logger.clone(),
            PartitionId::new(0),
            StreamId::new("orders"),
            Epoch::new(1),
            ranges.iter().map(|&(start, end)| SeqRange::new(start, end)),
        ));
        let (coordinator, _mastership_listener) = try_create_export_coordinator(ExportCoordinatorConfig {
            local_replica_id: id.to_string(),
            members: members.clone(),
            root_path: "/export/partition-0/orders".to_string(),
            exchange: exchange.clone(),
            tracker_provider: buffer.clone(),
            info_logger: logger.clone(),
            options: Default::default(),
        })
        .await?;
        let id = ReplicaId::new(*id);
        spawn_ack_listener(logger.clone(), buffer.clone(), network.register(id.clone()), coordinator.clone());

        replicas.push(Replica { id, buffer, coordinator });
    }

    replicas[0].coordinator.become_leader().await?;
    for replica in &replicas {
        replica.coordinator.initialize().await?;
    }
    for replica in &replicas {
        replica.coordinator.wait_ready().await?;
    }

    let mut seq = 1;
    while seq <= LAST_SEQ_NO {
        let mut assignments = Vec::with_capacity(replicas.len());
        for replica in &replicas {
            assignments.push(replica.coordinator.membership()?.assignment(seq));
        }
        // Snapshots are still propagating. Nobody exports until every replica agrees.
        if assignments.windows(2).any(|pair| pair[0] != pair[1]) {
            tokio::time::sleep(Duration::from_millis(10)).await;
            continue;
        }

        let assignment = &assignments[0];
        if assignment.master.is_stalled() {
            slog::warn!(logger, "Nobody has {} yet, stopping", seq);
            break;
        }
        let master = replicas
            .iter()
            .find(|r| &r.id == assignment.master.replica())
            .ok_or("export master is not one of our replicas")?;

        let through = assignment.valid_through.min(LAST_SEQ_NO);
        slog::info!(logger, "{} exports [{}, {}]", master.id, seq, through);
        let ack = master.buffer.release(through);
        master.coordinator.tracker_changed().await?;
        send_to_peers(&logger, network.as_ref(), &master.id, &peers, &ack).await;

        seq = through + 1;
    }

    for replica in &replicas {
        replica.coordinator.shutdown().await?;
    }
    // Let the async drain flush.
    tokio::time::sleep(Duration::from_millis(100)).await;

    Ok(())
}
