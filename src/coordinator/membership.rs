use crate::coordinator::ids::ReplicaId;
use crate::coordinator::member_snapshot::{MemberSnapshot, SnapshotDecodeError};
use crate::exchange::MembershipView;
use crate::tracker::{SeqNo, SeqRange, SequenceNumberTracker, INFINITE_SEQNO, MIN_SEQNO};
use std::collections::BTreeSet;

/// Ranking is the fixed total order over a partition's replicas. Lower rank is preferred.
///
/// Replicas that show up in the exchange without being configured rank after every configured one,
/// ordered by id, so every coordinator derives the same order from the same view.
#[derive(Clone, Debug)]
pub struct Ranking {
    order: Vec<ReplicaId>,
}

impl Ranking {
    pub fn new(order: Vec<ReplicaId>) -> Self {
        Ranking { order }
    }

    pub fn configured(&self) -> &[ReplicaId] {
        &self.order
    }

    fn sort_key<'a>(&self, id: &'a ReplicaId) -> (usize, &'a ReplicaId) {
        let position = self.order.iter().position(|m| m == id).unwrap_or(self.order.len());
        (position, id)
    }
}

#[derive(Debug)]
pub enum MemberStatus {
    Published,
    /// Nothing published yet. Counts as all gap.
    Missing,
    /// Undecodable. Counts as all gap.
    Corrupt(SnapshotDecodeError),
}

#[derive(Debug)]
pub struct MemberEntry {
    id: ReplicaId,
    status: MemberStatus,
    claims_leadership: bool,
    tracker: SequenceNumberTracker,
    // What this member can export: its tracked ranges plus whatever below them is known to
    // exist nowhere else. Truncation point is always MIN_SEQNO.
    coverage: SequenceNumberTracker,
}

impl MemberEntry {
    fn new(
        id: ReplicaId,
        decoded: Result<Option<MemberSnapshot>, SnapshotDecodeError>,
        initial_seq_no: Option<SeqNo>,
    ) -> Self {
        match decoded {
            Ok(Some(snapshot)) => MemberEntry {
                coverage: effective_coverage(&snapshot.tracker, initial_seq_no),
                id,
                status: MemberStatus::Published,
                claims_leadership: snapshot.is_partition_leader,
                tracker: snapshot.tracker,
            },
            Ok(None) => Self::all_gap(id, MemberStatus::Missing),
            Err(e) => Self::all_gap(id, MemberStatus::Corrupt(e)),
        }
    }

    fn all_gap(id: ReplicaId, status: MemberStatus) -> Self {
        MemberEntry {
            id,
            status,
            claims_leadership: false,
            tracker: SequenceNumberTracker::new(),
            coverage: SequenceNumberTracker::new(),
        }
    }

    pub fn id(&self) -> &ReplicaId {
        &self.id
    }

    pub fn status(&self) -> &MemberStatus {
        &self.status
    }

    pub fn claims_leadership(&self) -> bool {
        self.claims_leadership
    }

    /// The member's tracker as published.
    pub fn tracker(&self) -> &SequenceNumberTracker {
        &self.tracker
    }
}

/// Released data is never a gap, and anything between the truncation point and the first tracked
/// row is. A tracker that was never truncated can't tell "nothing exists before my first row" from
/// "my first rows were lost", so it is taken to start at the beginning of the stream, unless an
/// initial sequence number says where the stream really begins.
fn effective_coverage(tracker: &SequenceNumberTracker, initial_seq_no: Option<SeqNo>) -> SequenceNumberTracker {
    let mut coverage = SequenceNumberTracker::from_ranges(tracker.ranges().iter().copied());
    let truncation_point = tracker.truncation_point();
    let covered_below = match initial_seq_no {
        Some(n) => n.max(truncation_point),
        None if truncation_point > MIN_SEQNO || tracker.is_empty() => truncation_point,
        None => tracker.first_seq_no(),
    };
    if covered_below > MIN_SEQNO {
        coverage.add_range(MIN_SEQNO, covered_below - 1);
    }
    coverage
}

/// Where `coverage` has data again at or after `seq`, if anywhere.
fn resumes_at(coverage: &SequenceNumberTracker, seq: SeqNo) -> Option<SeqNo> {
    if coverage.contains(seq) {
        return Some(seq);
    }
    coverage
        .first_gap_after(seq)
        .filter(|gap| gap.end < INFINITE_SEQNO)
        .map(|gap| gap.end + 1)
}

/// Who may export a sequence number.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExportMaster {
    /// This replica has the data.
    Covering(ReplicaId),
    /// Nobody has the data yet. The partition leader keeps mastership and its pipeline waits for
    /// the data to show up.
    Stalled(ReplicaId),
}

impl ExportMaster {
    pub fn replica(&self) -> &ReplicaId {
        match self {
            ExportMaster::Covering(id) | ExportMaster::Stalled(id) => id,
        }
    }

    pub fn is_stalled(&self) -> bool {
        matches!(self, ExportMaster::Stalled(_))
    }
}

/// The master for some sequence number, and the last sequence number the same verdict holds for
/// in the snapshot it came from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Assignment {
    pub master: ExportMaster,
    pub valid_through: SeqNo,
}

/// MembershipSnapshot is one coordinator's view of every member's published tracker, immutable
/// once built. A new one is built whenever any member's snapshot or the member set changes.
///
/// Every decision made against it is a pure function of the snapshot, so two coordinators
/// holding equal snapshots reach the same verdicts.
#[derive(Debug)]
pub struct MembershipSnapshot {
    version: u64,
    // Sorted by rank. Never empty.
    entries: Vec<MemberEntry>,
    leader: usize,
    complete: bool,
}

impl MembershipSnapshot {
    /// Combines an exchange view with the local replica's own, always current, snapshot.
    pub(crate) fn build(
        ranking: &Ranking,
        view: &MembershipView,
        local_id: &ReplicaId,
        local: &MemberSnapshot,
        initial_seq_no: Option<SeqNo>,
    ) -> Self {
        Self::assemble(ranking, view, Some((local_id, local)), initial_seq_no)
    }

    /// Only what the exchange shows, our own snapshot included. This is what every member can
    /// see, so mastership may only move on what it says.
    pub(crate) fn published(ranking: &Ranking, view: &MembershipView, initial_seq_no: Option<SeqNo>) -> Self {
        Self::assemble(ranking, view, None, initial_seq_no)
    }

    fn assemble(
        ranking: &Ranking,
        view: &MembershipView,
        local: Option<(&ReplicaId, &MemberSnapshot)>,
        initial_seq_no: Option<SeqNo>,
    ) -> Self {
        let mut ids: BTreeSet<ReplicaId> = ranking.configured().iter().cloned().collect();
        ids.extend(view.members.keys().cloned());
        if let Some((local_id, _)) = local {
            ids.insert(local_id.clone());
        }

        let mut entries: Vec<MemberEntry> = ids
            .into_iter()
            .map(|id| {
                let decoded = match local {
                    Some((local_id, snapshot)) if &id == local_id => Ok(Some(snapshot.clone())),
                    _ => match view.members.get(&id) {
                        Some(bytes) => MemberSnapshot::decode(bytes.clone()).map(Some),
                        None => Ok(None),
                    },
                };
                MemberEntry::new(id, decoded, initial_seq_no)
            })
            .collect();
        entries.sort_by(|a, b| ranking.sort_key(&a.id).cmp(&ranking.sort_key(&b.id)));

        // Lowest ranked claimant wins. With no claimant, rank alone decides.
        let leader = entries.iter().position(|e| e.claims_leadership).unwrap_or(0);
        let complete = ranking.configured().iter().all(|id| {
            entries
                .iter()
                .any(|e| &e.id == id && !matches!(e.status, MemberStatus::Missing))
        });

        MembershipSnapshot {
            version: view.version,
            entries,
            leader,
            complete,
        }
    }

    /// Exchange version this snapshot was built from.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// True once every configured member has published something, even if undecodable.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Members in rank order.
    pub fn members(&self) -> impl Iterator<Item = &MemberEntry> {
        self.entries.iter()
    }

    pub fn member(&self, id: &ReplicaId) -> Option<&MemberEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    pub fn contains_member(&self, id: &ReplicaId) -> bool {
        self.member(id).is_some()
    }

    /// Members whose snapshot was decoded. Missing and corrupt members count as all gap.
    pub fn has_published(&self, id: &ReplicaId) -> bool {
        self.member(id)
            .map_or(false, |e| matches!(e.status, MemberStatus::Published))
    }

    /// Configured members nothing has been heard from.
    pub fn missing_members(&self) -> impl Iterator<Item = &ReplicaId> {
        self.entries
            .iter()
            .filter(|e| matches!(e.status, MemberStatus::Missing))
            .map(|e| &e.id)
    }

    pub fn leader(&self) -> &ReplicaId {
        &self.entries[self.leader].id
    }

    /// True iff `member` has everything from the beginning of the stream through `seq` with no
    /// gap in between.
    pub fn covers(&self, member: &ReplicaId, seq: SeqNo) -> bool {
        self.member(member)
            .and_then(|e| e.coverage.range_containing(seq))
            .map_or(false, |run| run.start == MIN_SEQNO)
    }

    /// True iff `member` has `seq`, whatever gaps come before it.
    pub fn has(&self, member: &ReplicaId, seq: SeqNo) -> bool {
        self.member(member).map_or(false, |e| e.coverage.contains(seq))
    }

    /// True iff every member has everything through `seq` with no gap in between.
    pub fn is_safe_point(&self, seq: SeqNo) -> bool {
        self.entries.iter().all(|e| e.coverage.safe_point() >= seq)
    }

    pub fn is_export_master(&self, member: &ReplicaId, seq: SeqNo) -> bool {
        self.export_master(seq).replica() == member
    }

    pub fn export_master(&self, seq: SeqNo) -> ExportMaster {
        self.assignment(seq).master
    }

    /// The partition leader exports whatever it has. Each gap of the leader is handed out from
    /// its start: the lowest ranked follower with data at a point keeps mastership until its run
    /// ends or the gap closes, then the next point is handed out the same way. Stretches nobody
    /// has stay with the leader, stalled.
    pub fn assignment(&self, seq: SeqNo) -> Assignment {
        let leader = &self.entries[self.leader];
        if let Some(run) = leader.coverage.range_containing(seq) {
            return Assignment {
                master: ExportMaster::Covering(leader.id.clone()),
                valid_through: run.end,
            };
        }
        let gap = match leader.coverage.first_gap_after(seq) {
            Some(gap) => gap,
            None => return self.stalled(INFINITE_SEQNO),
        };

        let mut pos = gap.start;
        loop {
            match self.lowest_ranked_follower_having(pos) {
                Some((follower, run)) => {
                    let end = run.end.min(gap.end);
                    if seq <= end {
                        return Assignment {
                            master: ExportMaster::Covering(follower.id.clone()),
                            valid_through: end,
                        };
                    }
                    // end < seq <= gap.end
                    pos = end + 1;
                }
                None => match self.next_follower_data_from(pos) {
                    Some(resume) if resume <= seq => pos = resume,
                    Some(resume) => return self.stalled((resume - 1).min(gap.end)),
                    None => return self.stalled(gap.end),
                },
            }
        }
    }

    fn stalled(&self, valid_through: SeqNo) -> Assignment {
        Assignment {
            master: ExportMaster::Stalled(self.leader().clone()),
            valid_through,
        }
    }

    fn followers(&self) -> impl Iterator<Item = &MemberEntry> {
        let leader = self.leader;
        self.entries
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != leader)
            .map(|(_, e)| e)
    }

    fn lowest_ranked_follower_having(&self, seq: SeqNo) -> Option<(&MemberEntry, SeqRange)> {
        self.followers()
            .find_map(|e| e.coverage.range_containing(seq).map(|run| (e, run)))
    }

    fn next_follower_data_from(&self, seq: SeqNo) -> Option<SeqNo> {
        self.followers().filter_map(|e| resumes_at(&e.coverage, seq)).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    struct Member {
        id: &'static str,
        leader: bool,
        ranges: &'static [(SeqNo, SeqNo)],
    }

    fn leader(id: &'static str, ranges: &'static [(SeqNo, SeqNo)]) -> Member {
        Member { id, leader: true, ranges }
    }

    fn follower(id: &'static str, ranges: &'static [(SeqNo, SeqNo)]) -> Member {
        Member { id, leader: false, ranges }
    }

    fn member_snapshot(member: &Member) -> MemberSnapshot {
        MemberSnapshot {
            is_partition_leader: member.leader,
            tracker: SequenceNumberTracker::from_ranges(member.ranges.iter().map(|&(s, e)| SeqRange::new(s, e))),
        }
    }

    /// Built from the first member's point of view, ranked in the given order.
    fn snapshot_with(members: &[Member], initial_seq_no: Option<SeqNo>) -> MembershipSnapshot {
        let ranking = Ranking::new(members.iter().map(|m| ReplicaId::new(m.id)).collect());
        let view = MembershipView {
            version: 1,
            members: members
                .iter()
                .map(|m| (ReplicaId::new(m.id), member_snapshot(m).encode()))
                .collect(),
        };
        MembershipSnapshot::build(
            &ranking,
            &view,
            &ReplicaId::new(members[0].id),
            &member_snapshot(&members[0]),
            initial_seq_no,
        )
    }

    fn snapshot(members: &[Member]) -> MembershipSnapshot {
        snapshot_with(members, None)
    }

    fn master(snapshot: &MembershipSnapshot, seq: SeqNo) -> String {
        snapshot.export_master(seq).replica().as_str().to_string()
    }

    #[test]
    fn single_replica_without_gap_is_master_everywhere() {
        let s = snapshot(&[leader("a", &[(1, 100)])]);
        for seq in 1..=100 {
            assert!(s.is_export_master(&ReplicaId::new("a"), seq));
        }
        for seq in &[101, 1_000_000, INFINITE_SEQNO] {
            assert!(s.is_export_master(&ReplicaId::new("a"), *seq));
        }
        assert!(s.export_master(101).is_stalled());
    }

    #[test]
    fn single_replica_is_master_inside_its_own_gap() {
        let s = snapshot(&[leader("a", &[(1, 100), (200, 300)])]);
        assert_eq!(s.export_master(150), ExportMaster::Stalled(ReplicaId::new("a")));
        assert_eq!(s.export_master(250), ExportMaster::Covering(ReplicaId::new("a")));
        assert!(s.is_export_master(&ReplicaId::new("a"), 150));
    }

    #[test]
    fn follower_covers_leader_gap_and_hands_back() {
        let s = snapshot(&[leader("a", &[(1, 100), (200, 300)]), follower("b", &[(1, 300)])]);
        for seq in &[1, 50, 100] {
            assert_eq!(master(&s, *seq), "a");
        }
        for seq in &[101, 150, 199] {
            assert_eq!(master(&s, *seq), "b");
        }
        for seq in &[200, 250, 300, 301, 5000] {
            assert_eq!(master(&s, *seq), "a");
        }
    }

    #[test]
    fn lowest_ranked_follower_wins() {
        let s = snapshot(&[
            leader("a", &[(1, 100), (200, 300)]),
            follower("b", &[(1, 300)]),
            follower("c", &[(1, 300)]),
        ]);
        for _ in 0..3 {
            for seq in 101..=199 {
                assert_eq!(master(&s, seq), "b");
            }
        }

        // Rank is configured, not alphabetical.
        let s = snapshot(&[
            leader("a", &[(1, 100), (200, 300)]),
            follower("c", &[(1, 300)]),
            follower("b", &[(1, 300)]),
        ]);
        assert_eq!(master(&s, 150), "c");
    }

    #[test]
    fn nested_gaps_cascade_through_followers() {
        let s = snapshot(&[
            leader("leader", &[(1, 100), (200, 300)]),
            follower("f1", &[(1, 130), (170, 300)]),
            follower("f2", &[(1, 180)]),
        ]);
        let expected = [
            (100, "leader"),
            (101, "f1"),
            (130, "f1"),
            (131, "f2"),
            (150, "f2"),
            (180, "f2"),
            (181, "f1"),
            (199, "f1"),
            (200, "leader"),
        ];
        for (seq, who) in &expected {
            assert_eq!(master(&s, *seq), *who, "at {}", seq);
        }
    }

    #[test]
    fn verdicts_are_the_same_from_every_point_of_view() {
        let members = || {
            [
                leader("leader", &[(1, 100), (200, 300)]),
                follower("f1", &[(1, 130), (170, 300)]),
                follower("f2", &[(1, 180)]),
            ]
        };
        let from_leader = snapshot(&members());
        let ranking = Ranking::new(vec!["leader".into(), "f1".into(), "f2".into()]);
        let view = MembershipView {
            version: 1,
            members: members()
                .iter()
                .map(|m| (ReplicaId::new(m.id), member_snapshot(m).encode()))
                .collect(),
        };
        let from_f2 = MembershipSnapshot::build(
            &ranking,
            &view,
            &ReplicaId::new("f2"),
            &member_snapshot(&members()[2]),
            None,
        );

        for seq in 1..=320 {
            assert_eq!(from_leader.assignment(seq), from_f2.assignment(seq), "at {}", seq);
        }
    }

    #[test]
    fn assignment_reports_how_long_it_holds() {
        let s = snapshot(&[
            leader("leader", &[(1, 100), (200, 300)]),
            follower("f1", &[(1, 130), (170, 300)]),
            follower("f2", &[(1, 180)]),
        ]);
        assert_eq!(s.assignment(50).valid_through, 100);
        assert_eq!(s.assignment(101).valid_through, 130);
        assert_eq!(s.assignment(140).valid_through, 180);
        assert_eq!(s.assignment(181).valid_through, 199);
        assert_eq!(s.assignment(250).valid_through, 300);
        assert_eq!(s.assignment(301).valid_through, INFINITE_SEQNO);
    }

    #[test]
    fn gap_nobody_has_stalls_on_leader_until_data_shows_up() {
        let s = snapshot(&[leader("a", &[(1, 100), (300, 400)]), follower("b", &[(1, 100), (150, 400)])]);
        assert_eq!(
            s.assignment(120),
            Assignment {
                master: ExportMaster::Stalled(ReplicaId::new("a")),
                valid_through: 149,
            }
        );
        assert_eq!(s.assignment(150).master, ExportMaster::Covering(ReplicaId::new("b")));
        assert_eq!(s.assignment(150).valid_through, 299);
        assert_eq!(master(&s, 300), "a");
    }

    #[test]
    fn missing_and_corrupt_members_count_as_all_gap() {
        let ranking = Ranking::new(vec!["a".into(), "b".into(), "c".into()]);
        let local = member_snapshot(&leader("a", &[(1, 100), (200, 300)]));
        let mut members = BTreeMap::new();
        members.insert(ReplicaId::new("b"), bytes::Bytes::from_static(b"garbage"));
        let view = MembershipView { version: 3, members };

        let s = MembershipSnapshot::build(&ranking, &view, &ReplicaId::new("a"), &local, None);
        assert!(matches!(
            s.member(&ReplicaId::new("b")).unwrap().status(),
            MemberStatus::Corrupt(_)
        ));
        assert!(matches!(
            s.member(&ReplicaId::new("c")).unwrap().status(),
            MemberStatus::Missing
        ));
        assert!(!s.is_complete());
        assert!(!s.has(&ReplicaId::new("b"), 150));
        assert_eq!(s.export_master(150), ExportMaster::Stalled(ReplicaId::new("a")));
        assert!(!s.is_safe_point(1));
    }

    #[test]
    fn complete_once_every_configured_member_published() {
        let s = snapshot(&[leader("a", &[(1, 10)]), follower("b", &[])]);
        assert!(s.is_complete());
        assert_eq!(s.version(), 1);
    }

    #[test]
    fn unconfigured_members_rank_last() {
        let ranking = Ranking::new(vec!["b".into()]);
        let local = member_snapshot(&follower("b", &[(1, 100)]));
        let mut members = BTreeMap::new();
        members.insert(ReplicaId::new("a"), member_snapshot(&follower("a", &[(1, 100)])).encode());
        members.insert(ReplicaId::new("z"), member_snapshot(&follower("z", &[(1, 100)])).encode());
        let view = MembershipView { version: 1, members };

        let s = MembershipSnapshot::build(&ranking, &view, &ReplicaId::new("b"), &local, None);
        let order: Vec<&str> = s.members().map(|e| e.id().as_str()).collect();
        assert_eq!(order, vec!["b", "a", "z"]);
        // Nobody claimed leadership, so the lowest ranked member leads.
        assert_eq!(s.leader(), &ReplicaId::new("b"));
    }

    #[test]
    fn lowest_ranked_claimant_leads() {
        let s = snapshot(&[
            follower("a", &[(1, 100)]),
            leader("b", &[(1, 50)]),
            leader("c", &[(1, 100)]),
        ]);
        assert_eq!(s.leader(), &ReplicaId::new("b"));
        assert_eq!(master(&s, 40), "b");
        assert_eq!(master(&s, 60), "a");
    }

    #[test]
    fn initial_sequence_number_exposes_leading_gap() {
        let members = [leader("a", &[(50, 100)]), follower("b", &[(1, 100)])];

        // Without it, "a" is assumed to start at the beginning of the stream.
        let s = snapshot(&members);
        assert!(s.covers(&ReplicaId::new("a"), 10));
        assert_eq!(master(&s, 10), "a");

        let s = snapshot_with(&members, Some(1));
        assert!(!s.covers(&ReplicaId::new("a"), 10));
        assert!(s.has(&ReplicaId::new("a"), 60));
        assert!(!s.covers(&ReplicaId::new("a"), 60));
        assert_eq!(master(&s, 10), "b");
        assert_eq!(master(&s, 49), "b");
        assert_eq!(master(&s, 50), "a");
    }

    #[test]
    fn released_data_is_not_a_gap() {
        let mut tracker = SequenceNumberTracker::from_ranges(vec![SeqRange::new(1, 100), SeqRange::new(200, 300)]);
        tracker.truncate_before(250);
        let local = MemberSnapshot {
            is_partition_leader: true,
            tracker,
        };
        let ranking = Ranking::new(vec!["a".into()]);
        let s = MembershipSnapshot::build(&ranking, &MembershipView::default(), &"a".into(), &local, Some(1));

        assert!(s.covers(&"a".into(), 150));
        assert!(s.is_safe_point(300));
        assert!(!s.is_safe_point(301));
    }

    #[test]
    fn truncated_tracker_keeps_its_leading_gap() {
        // The leader released through 130 and only holds data again from 200.
        let mut tracker = SequenceNumberTracker::from_ranges(vec![SeqRange::new(200, 300)]);
        tracker.truncate_before(131);
        let local = MemberSnapshot {
            is_partition_leader: true,
            tracker,
        };
        let ranking = Ranking::new(vec!["a".into(), "b".into()]);
        let mut members = BTreeMap::new();
        members.insert(ReplicaId::new("b"), member_snapshot(&follower("b", &[(131, 300)])).encode());
        let view = MembershipView { version: 1, members };

        let s = MembershipSnapshot::build(&ranking, &view, &"a".into(), &local, None);
        assert!(s.covers(&"a".into(), 130));
        assert!(!s.has(&"a".into(), 131));
        assert_eq!(master(&s, 131), "b");
        assert_eq!(master(&s, 200), "a");
    }

    #[test]
    fn published_snapshot_ignores_unpublished_local_changes() {
        // "a" filled its gap locally, but the exchange still holds its old snapshot.
        let ranking = Ranking::new(vec!["a".into(), "b".into()]);
        let mut members = BTreeMap::new();
        members.insert(ReplicaId::new("a"), member_snapshot(&leader("a", &[(1, 100), (200, 300)])).encode());
        members.insert(ReplicaId::new("b"), member_snapshot(&follower("b", &[(1, 300)])).encode());
        let view = MembershipView { version: 4, members };
        let local = member_snapshot(&leader("a", &[(1, 300)]));

        let fresh = MembershipSnapshot::build(&ranking, &view, &"a".into(), &local, None);
        assert!(fresh.is_safe_point(150));
        assert_eq!(master(&fresh, 150), "a");

        let published = MembershipSnapshot::published(&ranking, &view, None);
        assert!(!published.is_safe_point(150));
        assert_eq!(master(&published, 150), "b");
        assert!(published.has_published(&"a".into()));
        assert!(published.is_complete());

        let with_c = Ranking::new(vec!["a".into(), "b".into(), "c".into()]);
        let published = MembershipSnapshot::published(&with_c, &view, None);
        assert!(!published.has_published(&"c".into()));
        assert_eq!(published.missing_members().collect::<Vec<_>>(), vec![&ReplicaId::new("c")]);
        assert!(!published.is_complete());
    }

    #[test]
    fn safe_point_is_joint() {
        let s = snapshot(&[leader("a", &[(1, 100), (200, 300)]), follower("b", &[(1, 300)])]);
        assert!(s.is_safe_point(100));
        assert!(!s.is_safe_point(101));

        let single = snapshot(&[leader("a", &[(1, 100), (200, 300)])]);
        let tracker = member_snapshot(&leader("a", &[(1, 100), (200, 300)])).tracker;
        assert!(single.is_safe_point(tracker.safe_point()));
        assert!(tracker.safe_point() <= tracker.last_seq_no());

        let empty = snapshot(&[leader("a", &[])]);
        assert!(empty.is_safe_point(SequenceNumberTracker::new().safe_point()));
    }
}
