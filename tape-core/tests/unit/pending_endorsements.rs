use std::collections::{HashMap, HashSet};
use tape_core::domain::{Endorsement, EndorsementOutcome, EndorsementResult, IntegrationOutcome, PendingEndorsements};
use tape_core::foundation::{NodeName, TxId};

fn next_u64(state: &mut u64) -> u64 {
    *state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
    *state
}

fn tx(index: u64) -> TxId {
    let mut bytes = [0u8; 32];
    bytes[24..].copy_from_slice(&index.to_be_bytes());
    TxId::new(bytes)
}

fn result(index: u64, endorser: &NodeName, rejected: bool) -> EndorsementResult {
    let outcome = if rejected {
        EndorsementOutcome::Rejected { reason: "status 500: chaincode error".to_string() }
    } else {
        EndorsementOutcome::Endorsed(Endorsement {
            endorser_identity: endorser.as_str().as_bytes().to_vec(),
            payload: index.to_le_bytes().to_vec(),
            signature: vec![1],
        })
    };
    EndorsementResult { seq: index, tx_id: tx(index), endorser: endorser.clone(), outcome }
}

#[test]
fn every_transaction_resolves_exactly_once() {
    for seed in 0u64..100 {
        let mut rng = seed.wrapping_add(0x5EED);
        let endorser_count = (next_u64(&mut rng) % 3 + 1) as usize;
        let endorsers: Vec<NodeName> = (0..endorser_count).map(|i| NodeName::from(format!("peer{i}"))).collect();
        let transactions = 30u64;

        // Each transaction is rejected by at most one endorser.
        let mut rejected_by: HashMap<u64, usize> = HashMap::new();
        for index in 0..transactions {
            if next_u64(&mut rng) % 5 == 0 {
                rejected_by.insert(index, (next_u64(&mut rng) % endorser_count as u64) as usize);
            }
        }

        let mut results = Vec::new();
        for index in 0..transactions {
            for (position, endorser) in endorsers.iter().enumerate() {
                let rejected = rejected_by.get(&index) == Some(&position);
                results.push(result(index, endorser, rejected));
                if next_u64(&mut rng) % 7 == 0 {
                    results.push(result(index, endorser, rejected));
                }
            }
        }
        // Fisher-Yates with the LCG so arrival order is arbitrary across transactions and endorsers.
        for i in (1..results.len()).rev() {
            let j = (next_u64(&mut rng) % (i as u64 + 1)) as usize;
            results.swap(i, j);
        }

        let mut pending = PendingEndorsements::new(endorsers.clone());
        let mut completed: HashSet<u64> = HashSet::new();
        let mut abandoned: HashSet<u64> = HashSet::new();
        for item in results {
            match pending.accept(item) {
                IntegrationOutcome::Complete { seq, endorsements, .. } => {
                    assert!(completed.insert(seq), "seed {seed}: envelope built twice for {seq}");
                    let names: Vec<NodeName> = endorsements.into_iter().map(|(name, _)| name).collect();
                    assert_eq!(names, endorsers, "seed {seed}");
                }
                IntegrationOutcome::Abandoned { seq, .. } => {
                    assert!(abandoned.insert(seq), "seed {seed}: abandoned twice {seq}");
                }
                IntegrationOutcome::Waiting | IntegrationOutcome::Ignored => {}
            }
        }

        let expected_abandoned: HashSet<u64> = rejected_by.keys().copied().collect();
        let expected_completed: HashSet<u64> = (0..transactions).filter(|index| !expected_abandoned.contains(index)).collect();
        assert_eq!(abandoned, expected_abandoned, "seed {seed}");
        assert_eq!(completed, expected_completed, "seed {seed}");
        assert!(completed.is_disjoint(&abandoned), "seed {seed}");
        assert_eq!(pending.in_flight(), 0, "seed {seed}: state left behind");
    }
}

#[test]
fn results_from_unknown_endorsers_are_ignored() {
    let mut pending = PendingEndorsements::new(vec![NodeName::from("peer0")]);
    assert_eq!(pending.accept(result(1, &NodeName::from("peer9"), false)), IntegrationOutcome::Ignored);
    assert_eq!(pending.in_flight(), 0);
}
