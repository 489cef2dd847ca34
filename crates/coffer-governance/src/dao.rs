//! Stake-weighted treasury DAO.
//!
//! Holders of the governance token propose payouts from the treasury,
//! vote with their token weight, and finalize proposals whose "for"
//! weight exceeds the quorum. All engine state sits behind one lock, so
//! each operation is a single serialized transaction: preconditions are
//! checked first, the one fallible ledger transfer runs next, and the
//! engine state only changes once everything (including persistence)
//! succeeded.

use crate::config::{GovernanceConfig, VoteWeighting};
use crate::engine::Governance;
use crate::error::GovernanceError;
use crate::events::{EventLog, EventRecord, GovernanceEvent};
use crate::proposal::{Proposal, ProposalRegistry, ProposalRequest, Tally};
use crate::store::{Changes, GovernanceStore};
use crate::treasury::{Treasury, TreasuryTransaction};
use crate::voting::{VoteBook, VoteRecord};
use coffer_ledger::{BalanceLedger, LedgerError};
use coffer_storage::StorageError;
use coffer_types::{Address, Amount};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use tracing::{error, info, warn};

/// Engine state guarded by the DAO lock.
#[derive(Debug)]
struct DaoState {
    registry: ProposalRegistry,
    votes: VoteBook,
    /// Holder weights captured at creation, open proposals only (snapshot weighting)
    snapshots: HashMap<u64, HashMap<Address, Amount>>,
    treasury: Treasury,
    events: EventLog,
}

impl DaoState {
    fn new(config: &GovernanceConfig) -> Self {
        Self {
            registry: ProposalRegistry::new(),
            votes: VoteBook::new(),
            snapshots: HashMap::new(),
            treasury: Treasury::new(config.treasury_address),
            events: EventLog::new(),
        }
    }
}

/// Governance engine over a token ledger `T` and a native-currency ledger `N`.
pub struct Dao<T, N> {
    config: GovernanceConfig,
    token: T,
    native: N,
    state: RwLock<DaoState>,
    store: Option<GovernanceStore>,
}

impl<T: BalanceLedger, N: BalanceLedger> Dao<T, N> {
    /// In-memory engine.
    pub fn new(config: GovernanceConfig, token: T, native: N) -> Result<Self, GovernanceError> {
        config.validate()?;
        let state = DaoState::new(&config);

        Ok(Self {
            config,
            token,
            native,
            state: RwLock::new(state),
            store: None,
        })
    }

    /// Engine persisted in `path`, restoring any existing state.
    ///
    /// A store is bound to the configuration it was first opened with.
    pub fn open(config: GovernanceConfig, token: T, native: N, path: &Path) -> Result<Self, GovernanceError> {
        config.validate()?;
        let store = GovernanceStore::open(path)?;
        let stored = store.load()?;

        match &stored.config {
            Some(existing) if *existing != config => {
                return Err(GovernanceError::InvalidConfig(format!(
                    "store at {} was deployed with a different configuration",
                    path.display()
                )));
            }
            Some(_) => {}
            None => {
                let mut changes = Changes::default();
                changes.put_config(&config)?;
                changes.put_treasury(&Treasury::new(config.treasury_address))?;
                store.commit(changes)?;
                info!("Deployed governance store at {}", path.display());
            }
        }

        let registry = ProposalRegistry::from_proposals(stored.proposals).map_err(|id| {
            StorageError::Deserialization(format!("proposal ids not sequential at {}", id))
        })?;

        let mut votes = VoteBook::new();
        for vote in stored.votes {
            votes.insert(vote);
        }

        let snapshots: HashMap<u64, HashMap<Address, Amount>> = stored
            .snapshots
            .into_iter()
            .filter(|(id, _)| registry.get(*id).is_some_and(|p| !p.finalized))
            .map(|(id, weights)| (id, weights.into_iter().collect()))
            .collect();

        let state = DaoState {
            registry,
            votes,
            snapshots,
            treasury: stored
                .treasury
                .unwrap_or_else(|| Treasury::new(config.treasury_address)),
            events: EventLog::from_records(stored.events),
        };

        info!(
            "Loaded {} proposals and {} votes from {}",
            state.registry.count(),
            state.votes.len(),
            path.display()
        );

        Ok(Self {
            config,
            token,
            native,
            state: RwLock::new(state),
            store: Some(store),
        })
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    /// Governance token ledger (vote weight, deposits)
    pub fn token_ledger(&self) -> &T {
        &self.token
    }

    /// Native-currency ledger (treasury, payouts)
    pub fn native_ledger(&self) -> &N {
        &self.native
    }

    /// All proposals in id order.
    pub fn proposals(&self) -> Vec<Proposal> {
        self.state.read().registry.all().to_vec()
    }

    /// Proposals that have not been finalized yet.
    pub fn open_proposals(&self) -> Vec<Proposal> {
        self.state.read().registry.open().cloned().collect()
    }

    pub fn tally(&self, id: u64) -> Option<Tally> {
        let state = self.state.read();
        state.registry.get(id).map(|p| p.tally(self.config.quorum))
    }

    pub fn vote_record(&self, voter: &Address, id: u64) -> Option<VoteRecord> {
        self.state.read().votes.get(voter, id).cloned()
    }

    /// Every vote cast on one proposal.
    pub fn votes_for(&self, id: u64) -> Vec<VoteRecord> {
        self.state
            .read()
            .votes
            .for_proposal(id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Treasury movement history.
    pub fn treasury(&self) -> Treasury {
        self.state.read().treasury.clone()
    }

    /// Tokens currently held in escrow for proposal deposits.
    pub fn escrow_balance(&self) -> Amount {
        self.token.balance_of(&self.config.escrow_address)
    }

    fn weight_of(&self, state: &DaoState, voter: &Address, id: u64) -> Amount {
        match self.config.weighting {
            VoteWeighting::Live => self.token.balance_of(voter),
            VoteWeighting::Snapshot => state
                .snapshots
                .get(&id)
                .and_then(|weights| weights.get(voter))
                .copied()
                .unwrap_or(Amount::ZERO),
        }
    }

    /// Persist one operation's writes. On failure `rollback` undoes the
    /// ledger side of the operation before the error is returned.
    fn commit<S, R>(&self, stage: S, rollback: R) -> Result<(), GovernanceError>
    where
        S: FnOnce(&mut Changes) -> Result<(), StorageError>,
        R: FnOnce(),
    {
        let Some(store) = &self.store else {
            return Ok(());
        };

        let mut changes = Changes::default();
        if let Err(e) = stage(&mut changes).and_then(|_| store.commit(changes)) {
            error!("Failed to persist governance state: {}", e);
            rollback();
            return Err(e.into());
        }
        Ok(())
    }

    fn create(&self, caller: &Address, request: ProposalRequest) -> Result<u64, GovernanceError> {
        let mut state = self.state.write();

        let balance = self.token.balance_of(caller);
        if balance.is_zero() {
            return Err(GovernanceError::Unauthorized(*caller));
        }
        if balance < request.deposit {
            return Err(GovernanceError::InsufficientDeposit {
                needed: request.deposit,
                available: balance,
            });
        }

        if request.recipient == self.config.treasury_address {
            return Err(GovernanceError::TreasuryCounterparty(request.recipient));
        }

        let id = state.registry.next_id();
        let proposal = Proposal::new(id, *caller, request);
        let escrow = self.config.escrow_address;

        if !proposal.deposit.is_zero() {
            self.token
                .transfer(caller, &escrow, proposal.deposit)
                .map_err(|e| match e {
                    LedgerError::InsufficientFunds { needed, available } => {
                        GovernanceError::InsufficientDeposit { needed, available }
                    }
                    other => GovernanceError::Ledger(other),
                })?;
        }

        let snapshot: Option<Vec<(Address, Amount)>> = match self.config.weighting {
            VoteWeighting::Live => None,
            VoteWeighting::Snapshot => Some(
                self.token
                    .holders()
                    .into_iter()
                    .filter(|(who, _)| *who != escrow)
                    .collect(),
            ),
        };

        let record = state.events.next_record(GovernanceEvent::ProposalCreated {
            id,
            amount: proposal.amount,
            recipient: proposal.recipient,
            proposer: *caller,
            deposit: proposal.deposit,
        });

        self.commit(
            |changes| {
                changes.put_proposal(&proposal)?;
                if let Some(weights) = &snapshot {
                    changes.put_snapshot(id, weights)?;
                }
                changes.put_event(&record)
            },
            || undo_transfer(&self.token, caller, &escrow, proposal.deposit),
        )?;

        if let Some(weights) = snapshot {
            state.snapshots.insert(id, weights.into_iter().collect());
        }
        state.registry.push(proposal);
        info!("#{} {}", record.seq, record.event);
        state.events.push(record);

        Ok(id)
    }

    fn cast_vote(&self, caller: &Address, id: u64, is_upvote: bool) -> Result<(), GovernanceError> {
        let mut state = self.state.write();

        let mut proposal = state
            .registry
            .get(id)
            .cloned()
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        if proposal.finalized {
            return Err(GovernanceError::AlreadyFinalized(id));
        }

        if state.votes.has_voted(caller, id) {
            return Err(GovernanceError::AlreadyVoted { voter: *caller, id });
        }

        let weight = self.weight_of(&state, caller, id);
        if weight.is_zero() {
            return Err(GovernanceError::Unauthorized(*caller));
        }

        let total = if is_upvote {
            &mut proposal.votes
        } else {
            &mut proposal.down_votes
        };
        *total = total
            .checked_add(&weight)
            .ok_or(GovernanceError::TallyOverflow(id))?;

        let vote = VoteRecord {
            voter: *caller,
            proposal_id: id,
            is_upvote,
            weight,
        };
        let record = state.events.next_record(GovernanceEvent::VoteCast {
            id,
            voter: *caller,
            is_upvote,
            weight,
        });

        self.commit(
            |changes| {
                changes.put_proposal(&proposal)?;
                changes.put_vote(&vote)?;
                changes.put_event(&record)
            },
            || {},
        )?;

        state.registry.replace(proposal);
        state.votes.insert(vote);
        info!("#{} {}", record.seq, record.event);
        state.events.push(record);

        Ok(())
    }

    fn finalize(&self, caller: &Address, id: u64) -> Result<(), GovernanceError> {
        let mut state = self.state.write();

        let mut proposal = state
            .registry
            .get(id)
            .cloned()
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        if proposal.finalized {
            return Err(GovernanceError::AlreadyFinalized(id));
        }

        if self.token.balance_of(caller).is_zero() {
            return Err(GovernanceError::Unauthorized(*caller));
        }

        if !proposal.quorum_reached(self.config.quorum) {
            return Err(GovernanceError::QuorumNotReached {
                votes: proposal.votes,
                quorum: self.config.quorum,
            });
        }

        let payout = state
            .treasury
            .disburse(&self.native, &proposal.recipient, proposal.amount, id)?;

        proposal.finalized = true;
        let mut treasury = state.treasury.clone();
        treasury.record(payout);
        let record = state.events.next_record(GovernanceEvent::Finalized { id });

        let treasury_address = treasury.address();
        self.commit(
            |changes| {
                changes.put_proposal(&proposal)?;
                changes.put_treasury(&treasury)?;
                // Votes are closed, the weights are never read again
                changes.delete_snapshot(id);
                changes.put_event(&record)
            },
            || undo_transfer(&self.native, &treasury_address, &proposal.recipient, proposal.amount),
        )?;

        state.snapshots.remove(&id);
        state.registry.replace(proposal);
        state.treasury = treasury;
        info!("#{} {}", record.seq, record.event);
        state.events.push(record);

        Ok(())
    }

    fn deposit_to_treasury(&self, source: &Address, amount: Amount) -> Result<(), GovernanceError> {
        let mut state = self.state.write();

        if amount.is_zero() {
            return Ok(());
        }

        let tx: TreasuryTransaction = state.treasury.deposit(&self.native, source, amount)?;
        let mut treasury = state.treasury.clone();
        treasury.record(tx);
        let record = state.events.next_record(GovernanceEvent::TreasuryFunded {
            source: *source,
            amount,
        });

        let treasury_address = treasury.address();
        self.commit(
            |changes| {
                changes.put_treasury(&treasury)?;
                changes.put_event(&record)
            },
            || undo_transfer(&self.native, source, &treasury_address, amount),
        )?;

        state.treasury = treasury;
        info!("#{} {}", record.seq, record.event);
        state.events.push(record);

        Ok(())
    }

    fn release_deposit(&self, caller: &Address, id: u64) -> Result<Amount, GovernanceError> {
        let mut state = self.state.write();

        let mut proposal = state
            .registry
            .get(id)
            .cloned()
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        if proposal.proposer != *caller {
            return Err(GovernanceError::NotProposer {
                id,
                proposer: proposal.proposer,
            });
        }
        if !proposal.finalized {
            return Err(GovernanceError::NotFinalized(id));
        }
        if proposal.deposit.is_zero() {
            return Err(GovernanceError::NoDeposit(id));
        }
        if proposal.deposit_withdrawn {
            return Err(GovernanceError::DepositAlreadyWithdrawn(id));
        }

        let escrow = self.config.escrow_address;
        let amount = proposal.deposit;
        self.token.transfer(&escrow, caller, amount)?;

        proposal.deposit_withdrawn = true;
        let record = state.events.next_record(GovernanceEvent::DepositWithdrawn {
            id,
            proposer: *caller,
            amount,
        });

        self.commit(
            |changes| {
                changes.put_proposal(&proposal)?;
                changes.put_event(&record)
            },
            || undo_transfer(&self.token, &escrow, caller, amount),
        )?;

        state.registry.replace(proposal);
        info!("#{} {}", record.seq, record.event);
        state.events.push(record);

        Ok(amount)
    }
}

/// Reverse a transfer that already moved `amount` from `from` to `to`.
fn undo_transfer<L: BalanceLedger>(ledger: &L, from: &Address, to: &Address, amount: Amount) {
    if amount.is_zero() {
        return;
    }
    if let Err(e) = ledger.transfer(to, from, amount) {
        error!("Could not reverse transfer of {} from {} to {}: {}", amount, from, to, e);
    }
}

fn rejected(op: &str, caller: &Address, err: GovernanceError) -> GovernanceError {
    warn!("{} by {} rejected: {}", op, caller, err);
    err
}

impl<T: BalanceLedger, N: BalanceLedger> Governance for Dao<T, N> {
    fn create_proposal(&self, caller: &Address, request: ProposalRequest) -> Result<u64, GovernanceError> {
        self.create(caller, request)
            .map_err(|e| rejected("create_proposal", caller, e))
    }

    fn vote(&self, caller: &Address, id: u64, is_upvote: bool) -> Result<(), GovernanceError> {
        self.cast_vote(caller, id, is_upvote)
            .map_err(|e| rejected("vote", caller, e))
    }

    fn finalize_proposal(&self, caller: &Address, id: u64) -> Result<(), GovernanceError> {
        self.finalize(caller, id)
            .map_err(|e| rejected("finalize_proposal", caller, e))
    }

    fn fund(&self, source: &Address, amount: Amount) -> Result<(), GovernanceError> {
        self.deposit_to_treasury(source, amount)
            .map_err(|e| rejected("fund", source, e))
    }

    fn withdraw_deposit(&self, caller: &Address, id: u64) -> Result<Amount, GovernanceError> {
        self.release_deposit(caller, id)
            .map_err(|e| rejected("withdraw_deposit", caller, e))
    }

    fn proposal_count(&self) -> u64 {
        self.state.read().registry.count()
    }

    fn proposal(&self, id: u64) -> Option<Proposal> {
        self.state.read().registry.get(id).cloned()
    }

    fn quorum(&self) -> Amount {
        self.config.quorum
    }

    fn has_voted(&self, voter: &Address, id: u64) -> bool {
        self.state.read().votes.has_voted(voter, id)
    }

    fn has_downvoted(&self, voter: &Address, id: u64) -> bool {
        self.state.read().votes.has_downvoted(voter, id)
    }

    fn treasury_balance(&self) -> Amount {
        self.state.read().treasury.balance(&self.native)
    }

    fn events_since(&self, seq: u64) -> Vec<EventRecord> {
        self.state.read().events.since(seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coffer_ledger::MemoryLedger;
    use std::sync::Arc;

    fn addr(label: &str) -> Address {
        Address::from_seed(label)
    }

    fn tokens(n: u64) -> Amount {
        Amount::from_whole(n)
    }

    /// Five investors at 200k tokens each, a funded 100-token treasury,
    /// quorum at 500k tokens + 1 base unit.
    fn setup(weighting: VoteWeighting) -> Dao<Arc<MemoryLedger>, Arc<MemoryLedger>> {
        let token = Arc::new(MemoryLedger::with_balances(
            (1..=5).map(|i| (addr(&format!("investor{}", i)), tokens(200_000))),
        ));
        let native = Arc::new(MemoryLedger::with_balances([(addr("funder"), tokens(1_000))]));

        let config = GovernanceConfig {
            weighting,
            ..GovernanceConfig::default()
        };
        let dao = Dao::new(config, token, native).unwrap();
        dao.fund(&addr("funder"), tokens(100)).unwrap();
        dao
    }

    fn propose(dao: &Dao<Arc<MemoryLedger>, Arc<MemoryLedger>>, deposit: Amount) -> u64 {
        let request = ProposalRequest::new("Proposal 1", tokens(100), addr("recipient"), "Description 1")
            .with_deposit(deposit);
        dao.create_proposal(&addr("investor1"), request).unwrap()
    }

    #[test]
    fn test_create_escrows_deposit() {
        let dao = setup(VoteWeighting::Live);
        let id = propose(&dao, tokens(100));

        assert_eq!(id, 1);
        assert_eq!(dao.proposal_count(), 1);
        assert_eq!(dao.escrow_balance(), tokens(100));
        assert_eq!(dao.token_ledger().balance_of(&addr("investor1")), tokens(199_900));

        let proposal = dao.proposal(1).unwrap();
        assert_eq!(proposal.amount, tokens(100));
        assert_eq!(proposal.recipient, addr("recipient"));
        assert_eq!(proposal.proposer, addr("investor1"));
    }

    #[test]
    fn test_create_rejects_non_holder() {
        let dao = setup(VoteWeighting::Live);
        let request = ProposalRequest::new("P", tokens(1), addr("recipient"), "D");

        assert_eq!(
            dao.create_proposal(&addr("user1"), request),
            Err(GovernanceError::Unauthorized(addr("user1")))
        );
        assert_eq!(dao.proposal_count(), 0);
        assert_eq!(dao.events_since(1), vec![]);
    }

    #[test]
    fn test_create_rejects_oversized_deposit() {
        let dao = setup(VoteWeighting::Live);
        let request = ProposalRequest::new("P", tokens(1), addr("recipient"), "D")
            .with_deposit(tokens(10_000_000));

        let err = dao.create_proposal(&addr("investor1"), request).unwrap_err();
        assert!(matches!(err, GovernanceError::InsufficientDeposit { .. }));
        assert_eq!(dao.escrow_balance(), Amount::ZERO);
        assert_eq!(dao.proposal_count(), 0);
    }

    #[test]
    fn test_live_weight_reflects_deposit() {
        let dao = setup(VoteWeighting::Live);
        let id = propose(&dao, tokens(100));

        dao.vote(&addr("investor1"), id, true).unwrap();
        dao.vote(&addr("investor2"), id, true).unwrap();
        dao.vote(&addr("investor3"), id, false).unwrap();

        let proposal = dao.proposal(id).unwrap();
        assert_eq!(proposal.votes, tokens(399_900));
        assert_eq!(proposal.down_votes, tokens(200_000));
        assert!(dao.has_downvoted(&addr("investor3"), id));
        assert!(!dao.has_downvoted(&addr("investor1"), id));
    }

    #[test]
    fn test_vote_rejections() {
        let dao = setup(VoteWeighting::Live);
        let id = propose(&dao, Amount::ZERO);

        assert_eq!(dao.vote(&addr("investor1"), 9, true), Err(GovernanceError::ProposalNotFound(9)));
        assert_eq!(
            dao.vote(&addr("user1"), id, true),
            Err(GovernanceError::Unauthorized(addr("user1")))
        );
        assert!(!dao.has_voted(&addr("user1"), id));

        dao.vote(&addr("investor1"), id, true).unwrap();
        assert_eq!(
            dao.vote(&addr("investor1"), id, false),
            Err(GovernanceError::AlreadyVoted { voter: addr("investor1"), id })
        );
        assert_eq!(dao.proposal(id).unwrap().down_votes, Amount::ZERO);
    }

    #[test]
    fn test_live_weight_counts_moved_tokens_twice() {
        let dao = setup(VoteWeighting::Live);
        let id = propose(&dao, Amount::ZERO);

        dao.vote(&addr("investor1"), id, true).unwrap();
        dao.token_ledger()
            .transfer(&addr("investor1"), &addr("sidekick"), tokens(200_000))
            .unwrap();
        dao.vote(&addr("sidekick"), id, true).unwrap();

        assert_eq!(dao.proposal(id).unwrap().votes, tokens(400_000));
    }

    #[test]
    fn test_snapshot_weight_ignores_moved_tokens() {
        let dao = setup(VoteWeighting::Snapshot);
        let id = propose(&dao, tokens(100));

        dao.token_ledger()
            .transfer(&addr("investor2"), &addr("sidekick"), tokens(200_000))
            .unwrap();

        // Weight recorded at creation, after the deposit left investor1
        dao.vote(&addr("investor1"), id, true).unwrap();
        assert_eq!(dao.proposal(id).unwrap().votes, tokens(199_900));

        // investor2 still votes with its creation-time weight
        dao.vote(&addr("investor2"), id, true).unwrap();
        assert_eq!(dao.proposal(id).unwrap().votes, tokens(399_900));

        // sidekick held nothing at creation
        assert_eq!(
            dao.vote(&addr("sidekick"), id, true),
            Err(GovernanceError::Unauthorized(addr("sidekick")))
        );
    }

    #[test]
    fn test_finalize_pays_recipient() {
        let dao = setup(VoteWeighting::Live);
        let id = propose(&dao, tokens(100));
        for voter in ["investor1", "investor2", "investor3"] {
            dao.vote(&addr(voter), id, true).unwrap();
        }

        dao.finalize_proposal(&addr("investor1"), id).unwrap();

        assert!(dao.proposal(id).unwrap().finalized);
        assert_eq!(dao.native_ledger().balance_of(&addr("recipient")), tokens(100));
        assert_eq!(dao.treasury_balance(), Amount::ZERO);
        assert_eq!(dao.treasury().total_disbursed(), tokens(100));
        assert_eq!(
            dao.finalize_proposal(&addr("investor1"), id),
            Err(GovernanceError::AlreadyFinalized(id))
        );
        assert_eq!(
            dao.vote(&addr("investor4"), id, true),
            Err(GovernanceError::AlreadyFinalized(id))
        );
    }

    #[test]
    fn test_finalize_requires_quorum_and_holder() {
        let dao = setup(VoteWeighting::Live);
        let id = propose(&dao, tokens(100));
        dao.vote(&addr("investor1"), id, true).unwrap();
        dao.vote(&addr("investor2"), id, false).unwrap();

        assert!(matches!(
            dao.finalize_proposal(&addr("investor1"), id),
            Err(GovernanceError::QuorumNotReached { .. })
        ));

        dao.vote(&addr("investor3"), id, true).unwrap();
        dao.vote(&addr("investor4"), id, true).unwrap();
        assert_eq!(
            dao.finalize_proposal(&addr("user1"), id),
            Err(GovernanceError::Unauthorized(addr("user1")))
        );
        assert!(!dao.proposal(id).unwrap().finalized);
    }

    #[test]
    fn test_finalize_with_empty_treasury_changes_nothing() {
        let dao = setup(VoteWeighting::Live);
        let request = ProposalRequest::new("Big", tokens(101), addr("recipient"), "too much");
        let id = dao.create_proposal(&addr("investor1"), request).unwrap();
        for voter in ["investor1", "investor2", "investor3"] {
            dao.vote(&addr(voter), id, true).unwrap();
        }

        let err = dao.finalize_proposal(&addr("investor1"), id).unwrap_err();
        assert!(matches!(err, GovernanceError::InsufficientTreasuryFunds { .. }));
        assert!(!dao.proposal(id).unwrap().finalized);
        assert_eq!(dao.treasury_balance(), tokens(100));

        // Topping up the treasury makes the same proposal payable
        dao.fund(&addr("funder"), tokens(1)).unwrap();
        dao.finalize_proposal(&addr("investor2"), id).unwrap();
        assert_eq!(dao.native_ledger().balance_of(&addr("recipient")), tokens(101));
    }

    #[test]
    fn test_withdraw_deposit_after_finalization() {
        let dao = setup(VoteWeighting::Live);
        let id = propose(&dao, tokens(100));

        assert_eq!(
            dao.withdraw_deposit(&addr("investor1"), id),
            Err(GovernanceError::NotFinalized(id))
        );

        for voter in ["investor1", "investor2", "investor3"] {
            dao.vote(&addr(voter), id, true).unwrap();
        }
        dao.finalize_proposal(&addr("investor2"), id).unwrap();

        assert!(matches!(
            dao.withdraw_deposit(&addr("investor2"), id),
            Err(GovernanceError::NotProposer { .. })
        ));
        assert_eq!(dao.withdraw_deposit(&addr("investor1"), id), Ok(tokens(100)));
        assert_eq!(dao.token_ledger().balance_of(&addr("investor1")), tokens(200_000));
        assert_eq!(dao.escrow_balance(), Amount::ZERO);
        assert_eq!(
            dao.withdraw_deposit(&addr("investor1"), id),
            Err(GovernanceError::DepositAlreadyWithdrawn(id))
        );
    }

    #[test]
    fn test_withdraw_without_deposit() {
        let dao = setup(VoteWeighting::Live);
        let id = propose(&dao, Amount::ZERO);
        for voter in ["investor1", "investor2", "investor3"] {
            dao.vote(&addr(voter), id, true).unwrap();
        }
        dao.finalize_proposal(&addr("investor1"), id).unwrap();

        assert_eq!(dao.withdraw_deposit(&addr("investor1"), id), Err(GovernanceError::NoDeposit(id)));
    }

    #[test]
    fn test_fund_rejects_broke_funder() {
        let dao = setup(VoteWeighting::Live);

        assert!(matches!(
            dao.fund(&addr("nobody"), tokens(1)),
            Err(GovernanceError::FundingFailed(_))
        ));
        assert!(dao.fund(&addr("nobody"), Amount::ZERO).is_ok());
        assert_eq!(dao.treasury_balance(), tokens(100));
    }

    #[test]
    fn test_events_in_order() {
        let dao = setup(VoteWeighting::Live);
        let id = propose(&dao, tokens(100));
        dao.vote(&addr("investor3"), id, false).unwrap();

        let events: Vec<_> = dao.events_since(0).into_iter().map(|r| r.event).collect();
        assert_eq!(
            events,
            vec![
                GovernanceEvent::TreasuryFunded { source: addr("funder"), amount: tokens(100) },
                GovernanceEvent::ProposalCreated {
                    id,
                    amount: tokens(100),
                    recipient: addr("recipient"),
                    proposer: addr("investor1"),
                    deposit: tokens(100),
                },
                GovernanceEvent::VoteCast {
                    id,
                    voter: addr("investor3"),
                    is_upvote: false,
                    weight: tokens(200_000),
                },
            ]
        );
        assert_eq!(dao.events_since(2).len(), 1);
    }

    #[test]
    fn test_tally_view() {
        let dao = setup(VoteWeighting::Live);
        let id = propose(&dao, Amount::ZERO);
        dao.vote(&addr("investor1"), id, true).unwrap();
        dao.vote(&addr("investor2"), id, false).unwrap();
        dao.vote(&addr("investor3"), id, false).unwrap();

        let tally = dao.tally(id).unwrap();
        assert_eq!(tally.total, tokens(600_000));
        assert_eq!(tally.margin.to_string(), format!("-{}", tokens(200_000)));
        assert!(!tally.quorum_reached);
        assert_eq!(dao.votes_for(id).len(), 3);
        assert!(dao.tally(99).is_none());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let token = MemoryLedger::new();
        let native = MemoryLedger::new();
        let config = GovernanceConfig {
            treasury_address: Address::ZERO,
            ..GovernanceConfig::default()
        };
        assert!(matches!(
            Dao::new(config, token, native),
            Err(GovernanceError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_fund_from_treasury_is_rejected() {
        let dao = setup(VoteWeighting::Live);
        let treasury = dao.config().treasury_address;

        assert_eq!(
            dao.fund(&treasury, tokens(100)),
            Err(GovernanceError::TreasuryCounterparty(treasury))
        );
        assert_eq!(dao.treasury_balance(), tokens(100));
        assert_eq!(dao.treasury().total_deposited(), tokens(100));
        assert_eq!(dao.events_since(0).len(), 1);
    }

    #[test]
    fn test_create_rejects_treasury_recipient() {
        let dao = setup(VoteWeighting::Live);
        let treasury = dao.config().treasury_address;
        let request = ProposalRequest::new("Loop", tokens(40), treasury, "pay ourselves")
            .with_deposit(tokens(100));

        assert_eq!(
            dao.create_proposal(&addr("investor1"), request),
            Err(GovernanceError::TreasuryCounterparty(treasury))
        );
        assert_eq!(dao.proposal_count(), 0);
        assert_eq!(dao.escrow_balance(), Amount::ZERO);
        assert_eq!(dao.events_since(1), vec![]);
    }

    #[test]
    fn test_repeat_vote_after_moving_tokens() {
        let dao = setup(VoteWeighting::Live);
        let id = propose(&dao, Amount::ZERO);

        dao.vote(&addr("investor1"), id, true).unwrap();
        dao.token_ledger()
            .transfer(&addr("investor1"), &addr("sidekick"), tokens(200_000))
            .unwrap();

        assert_eq!(
            dao.vote(&addr("investor1"), id, true),
            Err(GovernanceError::AlreadyVoted { voter: addr("investor1"), id })
        );
        assert_eq!(dao.proposal(id).unwrap().votes, tokens(200_000));
    }

    #[test]
    fn test_finalize_drops_snapshot() {
        let dao = setup(VoteWeighting::Snapshot);
        let first = propose(&dao, Amount::ZERO);
        let second = propose(&dao, Amount::ZERO);
        assert_eq!(dao.state.read().snapshots.len(), 2);

        for voter in ["investor1", "investor2", "investor3"] {
            dao.vote(&addr(voter), first, true).unwrap();
        }
        dao.finalize_proposal(&addr("investor1"), first).unwrap();

        let state = dao.state.read();
        assert!(!state.snapshots.contains_key(&first));
        assert!(state.snapshots.contains_key(&second));
    }
}
