//! Racing callers against one shared engine.

use coffer_governance::{Dao, Governance, GovernanceConfig, GovernanceError, ProposalRequest};
use coffer_ledger::{BalanceLedger, MemoryLedger};
use coffer_types::{Address, Amount};
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 8;

fn addr(label: &str) -> Address {
    Address::from_seed(label)
}

fn voter(i: usize) -> Address {
    addr(&format!("voter{}", i))
}

/// Eight voters at 100k tokens, a treasury holding 10 units.
fn shared_dao() -> Arc<Dao<Arc<MemoryLedger>, Arc<MemoryLedger>>> {
    let token = Arc::new(MemoryLedger::with_balances(
        (0..THREADS).map(|i| (voter(i), Amount::from_whole(100_000))),
    ));
    let native = Arc::new(MemoryLedger::with_balances([(addr("funder"), Amount::from_whole(10))]));
    let dao = Dao::new(GovernanceConfig::default(), token, native).unwrap();
    dao.fund(&addr("funder"), Amount::from_whole(10)).unwrap();
    Arc::new(dao)
}

fn race<F, R>(dao: &Arc<Dao<Arc<MemoryLedger>, Arc<MemoryLedger>>>, op: F) -> Vec<R>
where
    F: Fn(&Dao<Arc<MemoryLedger>, Arc<MemoryLedger>>, usize) -> R + Send + Sync + 'static,
    R: Send + 'static,
{
    let barrier = Arc::new(Barrier::new(THREADS));
    let op = Arc::new(op);

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let dao = Arc::clone(dao);
            let barrier = Arc::clone(&barrier);
            let op = Arc::clone(&op);
            thread::spawn(move || {
                barrier.wait();
                op(&dao, i)
            })
        })
        .collect();

    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn test_concurrent_finalize_pays_once() {
    let dao = shared_dao();
    let request = ProposalRequest::new("Payout", Amount::from_whole(4), addr("recipient"), "race");
    let id = dao.create_proposal(&voter(0), request).unwrap();
    for i in 0..6 {
        dao.vote(&voter(i), id, true).unwrap();
    }

    let results = race(&dao, move |dao, i| dao.finalize_proposal(&voter(i), id));

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| *e == GovernanceError::AlreadyFinalized(id)));

    assert_eq!(dao.native_ledger().balance_of(&addr("recipient")), Amount::from_whole(4));
    assert_eq!(dao.treasury_balance(), Amount::from_whole(6));
}

#[test]
fn test_concurrent_votes_all_counted() {
    let dao = shared_dao();
    let request = ProposalRequest::new("Tally", Amount::from_whole(1), addr("recipient"), "race");
    let id = dao.create_proposal(&voter(0), request).unwrap();

    let results = race(&dao, move |dao, i| dao.vote(&voter(i), id, i % 2 == 0));
    assert!(results.iter().all(|r| r.is_ok()));

    let proposal = dao.proposal(id).unwrap();
    assert_eq!(proposal.votes, Amount::from_whole(400_000));
    assert_eq!(proposal.down_votes, Amount::from_whole(400_000));
    assert_eq!(dao.votes_for(id).len(), THREADS);
}

#[test]
fn test_concurrent_double_vote_counts_once() {
    let dao = shared_dao();
    let request = ProposalRequest::new("Dup", Amount::from_whole(1), addr("recipient"), "race");
    let id = dao.create_proposal(&voter(0), request).unwrap();

    let results = race(&dao, move |dao, _| dao.vote(&voter(3), id, true));

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(dao.proposal(id).unwrap().votes, Amount::from_whole(100_000));
}

#[test]
fn test_concurrent_creation_assigns_unique_ids() {
    let dao = shared_dao();

    let mut ids = race(&dao, |dao, i| {
        let request = ProposalRequest::new(format!("P{}", i), Amount::from_whole(1), addr("recipient"), "");
        dao.create_proposal(&voter(i), request).unwrap()
    });
    ids.sort_unstable();

    assert_eq!(ids, (1..=THREADS as u64).collect::<Vec<_>>());
}
