use std::collections::{HashMap, HashSet};
use tape_core::domain::{CommitTally, CommitThreshold, TallyOutcome};
use tape_core::foundation::{NodeName, TxId};

fn next_u64(state: &mut u64) -> u64 {
    // LCG parameters from Numerical Recipes; fine for deterministic test coverage.
    *state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
    *state
}

fn tx(index: u64) -> TxId {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&index.to_le_bytes());
    TxId::new(bytes)
}

#[test]
fn tally_counts_each_transaction_once_at_threshold() {
    for seed in 0u64..100 {
        let mut rng = seed ^ 0xC0FF_EE00_1234_5678;
        let committers = (next_u64(&mut rng) % 4 + 1) as usize;
        let required = (next_u64(&mut rng) % committers as u64 + 1) as usize;
        let threshold = CommitThreshold::new(required, committers).expect("threshold");
        let names: Vec<NodeName> = (0..committers).map(|i| NodeName::from(format!("peer{i}"))).collect();

        let mut tally = CommitTally::new(threshold);
        let mut reporters: HashMap<u64, HashSet<usize>> = HashMap::new();
        let mut committed_events: HashMap<u64, usize> = HashMap::new();

        // Reports arrive in arbitrary order and may repeat, like duplicated blocks.
        for _ in 0..200 {
            let index = next_u64(&mut rng) % 20;
            let committer = (next_u64(&mut rng) % committers as u64) as usize;
            reporters.entry(index).or_default().insert(committer);
            if tally.record(tx(index), &names[committer]) == TallyOutcome::Committed {
                *committed_events.entry(index).or_default() += 1;
            }
        }

        let expected: HashSet<u64> = reporters.iter().filter(|(_, seen)| seen.len() >= required).map(|(index, _)| *index).collect();
        assert_eq!(tally.committed(), expected.len(), "seed {seed}");
        assert!(committed_events.values().all(|count| *count == 1), "seed {seed}: a transaction was counted twice");
        assert_eq!(committed_events.keys().copied().collect::<HashSet<_>>(), expected, "seed {seed}");
        assert_eq!(tally.below_threshold(), reporters.len() - expected.len(), "seed {seed}");
    }
}

#[test]
fn single_committer_below_higher_threshold_never_counts() {
    let mut tally = CommitTally::new(CommitThreshold::new(2, 2).expect("threshold"));
    let peer0 = NodeName::from("peer0");
    assert_eq!(tally.record(tx(1), &peer0), TallyOutcome::Pending(1));
    assert_eq!(tally.record(tx(1), &peer0), TallyOutcome::Duplicate);
    assert_eq!(tally.committed(), 0);
    assert_eq!(tally.record(tx(1), &NodeName::from("peer1")), TallyOutcome::Committed);
    assert_eq!(tally.record(tx(1), &NodeName::from("peer1")), TallyOutcome::AlreadyCounted);
    assert_eq!(tally.committed(), 1);
}

#[test]
fn threshold_must_fit_committer_count() {
    assert!(CommitThreshold::new(0, 1).is_err());
    assert!(CommitThreshold::new(3, 2).is_err());
    assert_eq!(CommitThreshold::new(2, 3).expect("threshold").required(), 2);
}

#[test]
fn reachable_matches_what_the_live_committers_can_still_commit() {
    for seed in 0u64..100 {
        let mut rng = seed ^ 0x5EED_0F_C0DE;
        let committers = (next_u64(&mut rng) % 4 + 2) as usize;
        let required = (next_u64(&mut rng) % committers as u64 + 1) as usize;
        let names: Vec<NodeName> = (0..committers).map(|i| NodeName::from(format!("peer{i}"))).collect();
        let mut tally = CommitTally::new(CommitThreshold::new(required, committers).expect("threshold"));

        let mut seen = HashSet::new();
        for _ in 0..60 {
            let index = next_u64(&mut rng) % 15;
            seen.insert(index);
            tally.record(tx(index), &names[(next_u64(&mut rng) % committers as u64) as usize]);
        }

        let lost_count = (next_u64(&mut rng) % committers as u64 + 1) as usize;
        let lost: HashSet<NodeName> = names[..lost_count].iter().cloned().collect();
        let live = committers - lost_count;
        let Some(reachable) = tally.reachable(live, &lost) else {
            assert!(live >= required, "seed {seed}");
            continue;
        };

        // Every remaining stream reports every transaction it could still see.
        for index in &seen {
            for name in &names[lost_count..] {
                tally.record(tx(*index), name);
            }
        }
        assert_eq!(tally.committed(), reachable, "seed {seed}");
    }
}
