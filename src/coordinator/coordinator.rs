use crate::coordinator::actor::WeakActorClient;
use crate::coordinator::errors::CoordinatorError;
use crate::coordinator::ids::ReplicaId;
use crate::coordinator::mastership_listener::{self, MastershipEvent, MastershipListener, MastershipNotifier};
use crate::coordinator::member_snapshot::MemberSnapshot;
use crate::coordinator::membership::{Assignment, MemberStatus, MembershipSnapshot, Ranking};
use crate::coordinator::options::CoordinatorOptionsValidated;
use crate::coordinator::retry::{self, Backoff};
use crate::exchange::{MembershipExchange, MembershipView};
use crate::pipeline::TrackerProvider;
use crate::tracker::SeqNo;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Uninitialized,
    /// Publishing our snapshot and waiting to hear from every member. No mastership is granted.
    Exchanging,
    Ready,
    Shutdown,
}

/// CoordinatorView is everything a mastership query needs, swapped atomically on every change so
/// queries never wait on the coordinator's event loop.
#[derive(Debug)]
pub struct CoordinatorView {
    pub phase: Phase,
    pub is_partition_leader: bool,
    pub is_master: bool,
    pub snapshot: Arc<MembershipSnapshot>,
}

pub(super) struct CoordinatorConfig {
    pub logger: slog::Logger,
    pub local_id: ReplicaId,
    pub ranking: Ranking,
    pub root_path: String,
    pub exchange: Arc<dyn MembershipExchange>,
    pub provider: Arc<dyn TrackerProvider>,
    pub options: CoordinatorOptionsValidated,
    pub actor_client: WeakActorClient,
}

pub(super) struct Coordinator {
    logger: slog::Logger,
    local_id: ReplicaId,
    ranking: Ranking,
    root_path: String,
    exchange: Arc<dyn MembershipExchange>,
    provider: Arc<dyn TrackerProvider>,
    options: CoordinatorOptionsValidated,
    actor_client: WeakActorClient,
    cancel: CancellationToken,
    view_publisher: watch::Sender<Arc<CoordinatorView>>,
    mastership_notifier: Option<MastershipNotifier>,

    phase: Phase,
    is_partition_leader: bool,
    initial_seq_no: Option<SeqNo>,
    local: MemberSnapshot,
    latest_view: MembershipView,
    // Our fresh tracker over the peers' published ones. Answers per-point queries.
    snapshot: Arc<MembershipSnapshot>,
    // Only what the exchange echoes back, our own snapshot included. Readiness and the stateful
    // verdict are decided on this, never on local changes peers haven't seen.
    published: MembershipSnapshot,
    settle_deadline_passed: bool,
    // Stateful verdict behind `is_master()`. Only replaced at a jointly published safe point, once
    // the position being exported has moved past what it was computed for, or once its master
    // stopped publishing.
    verdict: Option<Assignment>,
    is_master: bool,
    publish_in_flight: bool,
    publish_pending: bool,
}

impl Coordinator {
    pub(super) fn new(
        config: CoordinatorConfig,
    ) -> (Self, watch::Receiver<Arc<CoordinatorView>>, MastershipListener) {
        let local = MemberSnapshot {
            is_partition_leader: false,
            tracker: config.provider.tracker(),
        };
        let latest_view = MembershipView::default();
        let snapshot = Arc::new(MembershipSnapshot::build(
            &config.ranking,
            &latest_view,
            &config.local_id,
            &local,
            None,
        ));
        let published = MembershipSnapshot::published(&config.ranking, &latest_view, None);
        let (view_publisher, view_receiver) = watch::channel(Arc::new(CoordinatorView {
            phase: Phase::Uninitialized,
            is_partition_leader: false,
            is_master: false,
            snapshot: snapshot.clone(),
        }));
        let (mastership_notifier, mastership_listener) = mastership_listener::new();

        let coordinator = Coordinator {
            logger: config.logger,
            local_id: config.local_id,
            ranking: config.ranking,
            root_path: config.root_path,
            exchange: config.exchange,
            provider: config.provider,
            options: config.options,
            actor_client: config.actor_client,
            cancel: CancellationToken::new(),
            view_publisher,
            mastership_notifier: Some(mastership_notifier),
            phase: Phase::Uninitialized,
            is_partition_leader: false,
            initial_seq_no: None,
            local,
            latest_view,
            snapshot,
            published,
            settle_deadline_passed: false,
            verdict: None,
            is_master: false,
            publish_in_flight: false,
            publish_pending: false,
        };

        (coordinator, view_receiver, mastership_listener)
    }

    pub(super) fn is_shut_down(&self) -> bool {
        self.phase == Phase::Shutdown
    }

    pub(super) fn initialize(&mut self) -> Result<(), CoordinatorError> {
        match self.phase {
            Phase::Uninitialized => {}
            Phase::Exchanging | Phase::Ready => return Ok(()),
            Phase::Shutdown => return Err(CoordinatorError::ShutDown),
        }

        slog::info!(self.logger, "Initializing, exchanging membership under {}", self.root_path);
        self.phase = Phase::Exchanging;
        tokio::spawn(Self::watch_membership(
            self.logger.clone(),
            self.exchange.clone(),
            self.root_path.clone(),
            self.backoff(),
            self.cancel.clone(),
            self.actor_client.clone(),
        ));
        tokio::spawn(Self::settle_timer(
            self.options.member_settle_timeout,
            self.cancel.clone(),
            self.actor_client.clone(),
        ));
        self.local_changed();

        Ok(())
    }

    pub(super) fn become_leader(&mut self) -> Result<(), CoordinatorError> {
        self.check_not_shut_down()?;

        if !self.is_partition_leader {
            slog::info!(self.logger, "Declared partition leader");
            self.is_partition_leader = true;
            self.local_changed();
        }

        Ok(())
    }

    pub(super) fn set_initial_sequence_number(&mut self, seq: SeqNo) -> Result<(), CoordinatorError> {
        self.check_not_shut_down()?;

        if self.initial_seq_no != Some(seq) {
            slog::info!(self.logger, "Initial sequence number set to {}", seq);
            self.initial_seq_no = Some(seq);
            self.snapshot_changed();
        }

        Ok(())
    }

    pub(super) fn tracker_changed(&mut self) {
        if self.phase != Phase::Shutdown {
            self.local_changed();
        }
    }

    pub(super) fn membership_updated(&mut self, view: MembershipView) {
        if self.phase == Phase::Shutdown {
            return;
        }

        self.latest_view = view;
        self.rebuild_snapshot();
        for member in self.snapshot.members() {
            if let MemberStatus::Corrupt(e) = member.status() {
                slog::warn!(self.logger, "Snapshot of {} is corrupt, treating it as all gap: {}", member.id(), e);
            }
        }

        self.try_become_ready();
        self.refresh_mastership();
        self.publish_view();
    }

    pub(super) fn settle_deadline_passed(&mut self) {
        if self.phase != Phase::Exchanging {
            return;
        }

        self.settle_deadline_passed = true;
        let missing: Vec<String> = self.published.missing_members().map(|id| id.to_string()).collect();
        if !missing.is_empty() {
            slog::warn!(
                self.logger,
                "Members {:?} haven't published after {:?}, treating them as all gap",
                missing,
                self.options.member_settle_timeout
            );
        }
        self.try_become_ready();
        self.refresh_mastership();
        self.publish_view();
    }

    pub(super) fn publish_completed(&mut self) {
        self.publish_in_flight = false;
        if self.publish_pending {
            self.publish_pending = false;
            self.request_publish();
        }
    }

    /// Returns the withdrawal of our snapshot from the exchange, if there is one to wait for.
    pub(super) fn shutdown(&mut self) -> Option<JoinHandle<()>> {
        if self.phase == Phase::Shutdown {
            return None;
        }

        let published = self.phase != Phase::Uninitialized;
        self.phase = Phase::Shutdown;
        self.cancel.cancel();
        self.set_master(false);
        // Listeners see the loss above, then nothing more.
        self.mastership_notifier = None;
        self.publish_view();
        slog::info!(self.logger, "Shut down");

        if !published {
            return None;
        }
        Some(tokio::spawn(Self::withdraw_snapshot(
            self.logger.clone(),
            self.exchange.clone(),
            self.root_path.clone(),
            self.local_id.clone(),
            self.options.retry_max_delay,
        )))
    }

    // Ready once the exchange echoes our own snapshot back, and every configured member has
    // published or the settle deadline has passed.
    fn try_become_ready(&mut self) {
        if self.phase != Phase::Exchanging || !self.published.has_published(&self.local_id) {
            return;
        }
        if !self.published.is_complete() && !self.settle_deadline_passed {
            return;
        }

        self.phase = Phase::Ready;
        slog::info!(
            self.logger,
            "Membership exchange complete at version {}, leader is {}. Epoch: {:?}",
            self.published.version(),
            self.published.leader(),
            self.provider.epoch()
        );
    }

    fn check_not_shut_down(&self) -> Result<(), CoordinatorError> {
        match self.phase {
            Phase::Shutdown => Err(CoordinatorError::ShutDown),
            _ => Ok(()),
        }
    }

    fn local_changed(&mut self) {
        self.local = MemberSnapshot {
            is_partition_leader: self.is_partition_leader,
            tracker: self.provider.tracker(),
        };
        self.request_publish();
        self.snapshot_changed();
    }

    fn snapshot_changed(&mut self) {
        self.rebuild_snapshot();
        self.refresh_mastership();
        self.publish_view();
    }

    fn rebuild_snapshot(&mut self) {
        self.snapshot = Arc::new(MembershipSnapshot::build(
            &self.ranking,
            &self.latest_view,
            &self.local_id,
            &self.local,
            self.initial_seq_no,
        ));
        self.published = MembershipSnapshot::published(&self.ranking, &self.latest_view, self.initial_seq_no);
    }

    fn refresh_mastership(&mut self) {
        if self.phase != Phase::Ready {
            return;
        }

        let position = self.provider.last_release_seq_no().saturating_add(1);
        let reevaluate = match &self.verdict {
            None => true,
            Some(verdict) => {
                verdict.master.is_stalled()
                    || position > verdict.valid_through
                    || !self.published.has_published(verdict.master.replica())
                    || self.published.is_safe_point(position)
            }
        };
        if !reevaluate {
            return;
        }

        let assignment = self.published.assignment(position);
        if self.verdict.as_ref() != Some(&assignment) {
            slog::debug!(
                self.logger,
                "Export master from {} through {} is {:?}",
                position,
                assignment.valid_through,
                assignment.master
            );
        }
        self.set_master(assignment.master.replica() == &self.local_id);
        self.verdict = Some(assignment);
    }

    fn set_master(&mut self, is_master: bool) {
        if self.is_master == is_master {
            return;
        }

        self.is_master = is_master;
        let event = if is_master {
            MastershipEvent::Gained
        } else {
            MastershipEvent::Lost
        };
        slog::info!(self.logger, "Export mastership {:?}", event);
        if let Some(notifier) = &self.mastership_notifier {
            notifier.notify(event);
        }
    }

    fn publish_view(&self) {
        self.view_publisher.send_replace(Arc::new(CoordinatorView {
            phase: self.phase,
            is_partition_leader: self.is_partition_leader,
            is_master: self.is_master,
            snapshot: self.snapshot.clone(),
        }));
    }

    // One publish in flight at a time, so the exchange never sees our snapshots out of order.
    fn request_publish(&mut self) {
        if self.phase != Phase::Exchanging && self.phase != Phase::Ready {
            return;
        }
        if self.publish_in_flight {
            self.publish_pending = true;
            return;
        }

        self.publish_in_flight = true;
        tokio::spawn(Self::publish_snapshot(
            self.logger.clone(),
            self.exchange.clone(),
            self.root_path.clone(),
            self.local_id.clone(),
            self.local.encode(),
            self.backoff(),
            self.cancel.clone(),
            self.actor_client.clone(),
        ));
    }

    fn backoff(&self) -> Backoff {
        Backoff::new(self.options.retry_initial_delay, self.options.retry_max_delay)
    }

    #[allow(clippy::too_many_arguments)]
    async fn publish_snapshot(
        logger: slog::Logger,
        exchange: Arc<dyn MembershipExchange>,
        root_path: String,
        local_id: ReplicaId,
        snapshot: Bytes,
        mut backoff: Backoff,
        cancel: CancellationToken,
        actor_client: WeakActorClient,
    ) {
        let published = retry::retry_until_cancelled(&logger, "Publishing snapshot", &mut backoff, &cancel, || {
            exchange.publish(&root_path, &local_id, snapshot.clone())
        })
        .await;

        if published.is_some() {
            actor_client.publish_completed().await;
        }
    }

    async fn watch_membership(
        logger: slog::Logger,
        exchange: Arc<dyn MembershipExchange>,
        root_path: String,
        mut backoff: Backoff,
        cancel: CancellationToken,
        actor_client: WeakActorClient,
    ) {
        loop {
            let subscribed = retry::retry_until_cancelled(&logger, "Subscribing to membership", &mut backoff, &cancel, || {
                exchange.subscribe(&root_path)
            })
            .await;
            let mut updates = match subscribed {
                Some(updates) => updates,
                None => return,
            };

            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return,
                    next = updates.next() => next,
                };
                match next {
                    Some(view) => {
                        if !actor_client.membership_updated(view).await {
                            return;
                        }
                    }
                    None => break,
                }
            }

            let delay = backoff.next_delay();
            slog::warn!(logger, "Membership subscription closed, resubscribing in {:?}", delay);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn settle_timer(timeout: tokio::time::Duration, cancel: CancellationToken, actor_client: WeakActorClient) {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(timeout) => {
                actor_client.settle_deadline_passed().await;
            }
        }
    }

    async fn withdraw_snapshot(
        logger: slog::Logger,
        exchange: Arc<dyn MembershipExchange>,
        root_path: String,
        local_id: ReplicaId,
        timeout: tokio::time::Duration,
    ) {
        match tokio::time::timeout(timeout, exchange.withdraw(&root_path, &local_id)).await {
            Ok(Ok(())) => slog::debug!(logger, "Withdrew snapshot from {}", root_path),
            Ok(Err(e)) => slog::warn!(logger, "Failed to withdraw snapshot from {}: {}", root_path, e),
            Err(_) => slog::warn!(logger, "Timed out withdrawing snapshot from {}", root_path),
        }
    }
}
