//! Output formatting utilities.
//!
//! Pretty printing for CLI commands.

use coffer_governance::{
    EventRecord, GovernanceEvent, Margin, Proposal, Tally, TransactionType, TreasuryTransaction,
};
use coffer_types::{Address, Amount};
use colored::Colorize;
use tabled::{Table, Tabled};

/// Format an amount in whole tokens, e.g. `1.5`.
pub fn format_amount(value: &Amount) -> String {
    let (whole, frac) = value.split_units();
    if frac == 0 {
        return whole.to_string();
    }

    let digits = format!("{:0width$}", frac, width = Amount::DECIMALS);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Format a vote margin, negative when "against" leads.
pub fn format_margin(margin: &Margin) -> String {
    match margin {
        Margin::For(lead) => format_amount(lead),
        Margin::Against(lead) => format!("-{}", format_amount(lead)),
    }
}

/// Format address (short version).
pub fn format_address_short(addr: &Address) -> String {
    let s = addr.to_string();
    if s.len() > 16 {
        format!("{}...{}", &s[..10], &s[s.len() - 6..])
    } else {
        s
    }
}

/// Print success message.
pub fn print_success(msg: &str) {
    println!("{}", format!("✓ {}", msg).green());
}

/// Print warning message.
pub fn print_warning(msg: &str) {
    println!("{}", format!("⚠ {}", msg).yellow());
}

/// Print info message.
pub fn print_info(msg: &str) {
    println!("{}", format!("ℹ {}", msg).blue());
}

/// How one account voted on a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ballot {
    For,
    Against,
    NotVoted,
}

impl Ballot {
    pub fn of(has_voted: bool, has_downvoted: bool) -> Self {
        match (has_voted, has_downvoted) {
            (true, true) => Ballot::Against,
            (true, false) => Ballot::For,
            (false, _) => Ballot::NotVoted,
        }
    }
}

impl std::fmt::Display for Ballot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ballot::For => write!(f, "for"),
            Ballot::Against => write!(f, "against"),
            Ballot::NotVoted => write!(f, "-"),
        }
    }
}

/// A proposal together with the lookups the views need.
#[derive(Debug, Clone)]
pub struct ProposalListing {
    pub proposal: Proposal,
    /// Native balance of the recipient right now
    pub recipient_balance: Amount,
    /// Set when the listing is made for one account
    pub ballot: Option<Ballot>,
}

const DESCRIPTION_WIDTH: usize = 32;

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let head: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", head)
}

#[derive(Tabled)]
struct ProposalRow {
    id: u64,
    name: String,
    description: String,
    recipient: String,
    #[tabled(rename = "recipient balance")]
    recipient_balance: String,
    amount: String,
    status: String,
    total: String,
    tallied: String,
    up: String,
    down: String,
    quorum: String,
}

#[derive(Tabled)]
struct BallotRow {
    #[tabled(inline)]
    proposal: ProposalRow,
    voted: String,
}

fn proposal_row(listing: &ProposalListing, quorum: Amount) -> ProposalRow {
    let p = &listing.proposal;
    let tally = p.tally(quorum);
    ProposalRow {
        id: p.id,
        name: p.name.clone(),
        description: truncate(&p.description, DESCRIPTION_WIDTH),
        recipient: format_address_short(&p.recipient),
        recipient_balance: format_amount(&listing.recipient_balance),
        amount: format_amount(&p.amount),
        status: p.status().to_string(),
        total: format_amount(&tally.total),
        tallied: format_margin(&tally.margin),
        up: format_amount(&tally.up),
        down: format_amount(&tally.down),
        quorum: if tally.quorum_reached { "yes" } else { "no" }.to_string(),
    }
}

/// Print proposal list, with a `voted` column when listed for one account.
pub fn print_proposal_table(listings: &[ProposalListing], quorum: Amount) {
    if listings.is_empty() {
        println!("{}", "No proposals yet".yellow());
        return;
    }

    let for_account = listings.iter().any(|l| l.ballot.is_some());
    let table = if for_account {
        Table::new(listings.iter().map(|l| BallotRow {
            proposal: proposal_row(l, quorum),
            voted: l.ballot.unwrap_or(Ballot::NotVoted).to_string(),
        }))
    } else {
        Table::new(listings.iter().map(|l| proposal_row(l, quorum)))
    };

    println!("{}", table);
}

/// Print one proposal.
pub fn print_proposal(listing: &ProposalListing, tally: &Tally, quorum: Amount) {
    let proposal = &listing.proposal;
    println!("{}", format!("Proposal #{}", proposal.id).bold());
    println!("{}", "=".repeat(50));
    println!("Name:         {}", proposal.name.bright_green());
    println!("Description:  {}", proposal.description);
    println!("Proposer:     {}", proposal.proposer.to_string().bright_cyan());
    println!("Recipient:    {}", proposal.recipient.to_string().bright_cyan());
    println!("  balance:    {}", format_amount(&listing.recipient_balance));
    println!("Amount:       {}", format_amount(&proposal.amount).bright_yellow());
    println!("Deposit:      {}", format_amount(&proposal.deposit));
    println!("Status:       {}", proposal.status());
    println!("For:          {}", format_amount(&tally.up));
    println!("Against:      {}", format_amount(&tally.down));
    println!("Total:        {}", format_amount(&tally.total));
    println!("Margin:       {}", format_margin(&tally.margin));
    println!("Quorum:       {} ({})", format_amount(&quorum), if tally.quorum_reached {
        "reached".green()
    } else {
        "not reached".red()
    });
    if let Some(ballot) = listing.ballot {
        println!("Voted:        {}", ballot);
    }
    if proposal.deposit_withdrawn {
        println!("Deposit withdrawn by proposer");
    }
}

fn describe_event(event: &GovernanceEvent) -> String {
    match event {
        GovernanceEvent::ProposalCreated { id, amount, recipient, proposer, deposit } => format!(
            "proposal #{} created by {} for {} to {} (deposit {})",
            id,
            format_address_short(proposer),
            format_amount(amount),
            format_address_short(recipient),
            format_amount(deposit)
        ),
        GovernanceEvent::VoteCast { id, voter, is_upvote, weight } => format!(
            "{} voted {} on #{} with weight {}",
            format_address_short(voter),
            if *is_upvote { "for" } else { "against" },
            id,
            format_amount(weight)
        ),
        GovernanceEvent::Finalized { id } => format!("proposal #{} finalized", id),
        GovernanceEvent::TreasuryFunded { source, amount } => format!(
            "treasury funded with {} by {}",
            format_amount(amount),
            format_address_short(source)
        ),
        GovernanceEvent::DepositWithdrawn { id, proposer, amount } => format!(
            "deposit of {} for #{} returned to {}",
            format_amount(amount),
            id,
            format_address_short(proposer)
        ),
    }
}

/// Print event log entries.
pub fn print_events(records: &[EventRecord]) {
    if records.is_empty() {
        println!("{}", "No new events".yellow());
        return;
    }

    for record in records {
        println!("{:>5}  {}", record.seq.to_string().bright_magenta(), describe_event(&record.event));
    }
}

#[derive(Tabled)]
struct TreasuryRow {
    kind: String,
    amount: String,
    counterparty: String,
    proposal: String,
}

/// Print treasury summary and history.
pub fn print_treasury(address: &Address, balance: Amount, history: &[TreasuryTransaction]) {
    println!("{}", "Treasury".bold());
    println!("{}", "=".repeat(50));
    println!("Address:  {}", address.to_string().bright_cyan());
    println!("Balance:  {}", format_amount(&balance).bright_yellow());

    if history.is_empty() {
        return;
    }

    let rows: Vec<TreasuryRow> = history
        .iter()
        .map(|tx| TreasuryRow {
            kind: match tx.tx_type {
                TransactionType::Deposit => "deposit".to_string(),
                TransactionType::Disbursement => "disbursement".to_string(),
            },
            amount: format_amount(&tx.amount),
            counterparty: format_address_short(&tx.counterparty),
            proposal: tx.proposal_id.map(|id| format!("#{}", id)).unwrap_or_default(),
        })
        .collect();

    println!();
    println!("{}", Table::new(rows));
}

#[cfg(test)]
mod tests {
    use super::*;
    use coffer_governance::ProposalRequest;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(&Amount::ZERO), "0");
        assert_eq!(format_amount(&Amount::from_whole(200_000)), "200000");
        assert_eq!(format_amount(&"1.5".parse::<Amount>().unwrap()), "1.5");
        assert_eq!(format_amount(&Amount::from(1u64)), "0.000000000000000001");
    }

    #[test]
    fn test_format_margin() {
        assert_eq!(format_margin(&Margin::For(Amount::from_whole(3))), "3");
        assert_eq!(format_margin(&Margin::Against(Amount::from_whole(2))), "-2");
    }

    #[test]
    fn test_format_address_short() {
        let addr = Address::from_seed("investor1");
        let short = format_address_short(&addr);
        assert!(short.starts_with("cof1"));
        assert!(short.contains("..."));
        assert!(short.len() < addr.to_string().len());
    }

    #[test]
    fn test_ballot() {
        assert_eq!(Ballot::of(true, false), Ballot::For);
        assert_eq!(Ballot::of(true, true), Ballot::Against);
        assert_eq!(Ballot::of(false, false), Ballot::NotVoted);
        assert_eq!(Ballot::Against.to_string(), "against");
        assert_eq!(Ballot::NotVoted.to_string(), "-");
    }

    #[test]
    fn test_proposal_row() {
        let recipient = Address::from_seed("recipient");
        let request = ProposalRequest::new(
            "Proposal 1",
            Amount::from_whole(40),
            recipient,
            "A description long enough to be cut short in the table",
        );
        let listing = ProposalListing {
            proposal: Proposal::new(1, Address::from_seed("investor1"), request),
            recipient_balance: Amount::from_whole(3),
            ballot: Some(Ballot::For),
        };

        let row = proposal_row(&listing, Amount::from_whole(10));
        assert_eq!(row.recipient_balance, "3");
        assert_eq!(row.description.chars().count(), DESCRIPTION_WIDTH);
        assert!(row.description.ends_with("..."));
        assert_eq!(row.quorum, "no");
        assert_eq!(truncate("short", DESCRIPTION_WIDTH), "short");
    }

    #[test]
    fn test_describe_event() {
        let event = GovernanceEvent::VoteCast {
            id: 3,
            voter: Address::from_seed("investor1"),
            is_upvote: false,
            weight: Amount::from_whole(10),
        };
        let text = describe_event(&event);
        assert!(text.contains("against"));
        assert!(text.contains("#3"));
        assert!(text.ends_with("weight 10"));
    }
}
