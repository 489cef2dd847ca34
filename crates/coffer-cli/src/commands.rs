//! CLI command implementations.
//!
//! Every command opens the ledgers and the governance store in the data
//! directory, runs one operation, and exits.

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use coffer_governance::{
    Dao, Governance, GovernanceConfig, GovernanceError, Proposal, ProposalRequest, VoteWeighting,
};
use coffer_ledger::{BalanceLedger, LedgerDb};
use coffer_types::{Address, Amount};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{CliConfig, LoggingConfig, CONFIG_FILE};
use crate::output::*;

/// Engine over the on-disk ledgers.
pub type CliDao = Dao<Arc<LedgerDb>, Arc<LedgerDb>>;

/// Main CLI.
#[derive(Parser)]
#[command(name = "coffer")]
#[command(about = "Coffer - stake-weighted treasury DAO")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Data directory (defaults to ~/.coffer)
    #[arg(long, global = true, env = "COFFER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Config file (defaults to <data-dir>/coffer.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter, overrides the config file
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(CliConfig::default_data_dir)
    }

    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| self.data_dir().join(CONFIG_FILE))
    }

    /// Logging settings from the config file with flag overrides applied.
    pub fn logging(&self, config: Option<&CliConfig>) -> LoggingConfig {
        let mut logging = config.map(|c| c.logging.clone()).unwrap_or_default();
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if self.json_logs {
            logging.json = true;
        }
        logging
    }
}

/// Available commands.
///
/// Amounts are base units, or whole tokens when written with a decimal
/// point (`100.0`). Addresses are bech32m, `0x` hex, or `@label`.
#[derive(Subcommand)]
pub enum Commands {
    /// Deploy the DAO in the data directory
    Init {
        /// "For" weight a proposal must exceed to be finalized
        #[arg(long)]
        quorum: Amount,
        /// Weigh votes by balances at proposal creation
        #[arg(long)]
        snapshot: bool,
    },

    /// Credit an account (genesis and testing)
    Mint {
        #[arg(value_parser = parse_address)]
        address: Address,
        amount: Amount,
        /// Native currency instead of governance tokens
        #[arg(long)]
        native: bool,
    },

    /// Move balance between accounts
    Transfer {
        #[arg(value_parser = parse_address)]
        from: Address,
        #[arg(value_parser = parse_address)]
        to: Address,
        amount: Amount,
        /// Native currency instead of governance tokens
        #[arg(long)]
        native: bool,
    },

    /// Send native currency to the treasury
    Fund {
        #[arg(long, value_parser = parse_address)]
        from: Address,
        amount: Amount,
    },

    /// Create a proposal
    Propose {
        #[arg(long, value_parser = parse_address)]
        from: Address,
        #[arg(long)]
        name: String,
        /// Native-currency payout
        #[arg(long)]
        amount: Amount,
        #[arg(long, value_parser = parse_address)]
        recipient: Address,
        #[arg(long, default_value = "")]
        description: String,
        /// Tokens escrowed until the proposal is finalized
        #[arg(long, default_value = "0")]
        deposit: Amount,
    },

    /// Vote on a proposal (for, unless --down)
    Vote {
        #[arg(long, value_parser = parse_address)]
        from: Address,
        id: u64,
        #[arg(long)]
        down: bool,
    },

    /// Finalize a proposal and pay its recipient
    Finalize {
        #[arg(long, value_parser = parse_address)]
        from: Address,
        id: u64,
    },

    /// Reclaim the deposit of a finalized proposal
    WithdrawDeposit {
        #[arg(long, value_parser = parse_address)]
        from: Address,
        id: u64,
    },

    /// Show one proposal
    Show {
        id: u64,

        /// Also show how this account voted
        #[arg(long = "as", value_parser = parse_address)]
        viewer: Option<Address>,
    },

    /// List proposals
    List {
        /// Only proposals that are not finalized
        #[arg(long)]
        open: bool,

        /// Add a column with this account's vote on each proposal
        #[arg(long = "as", value_parser = parse_address)]
        viewer: Option<Address>,
    },

    /// Print the event log
    Events {
        /// Only events after this sequence number
        #[arg(long, default_value = "0")]
        since: u64,
    },

    /// Show treasury balance and history
    Treasury,

    /// Show an account balance
    Balance {
        #[arg(value_parser = parse_address)]
        address: Address,
        /// Native currency instead of governance tokens
        #[arg(long)]
        native: bool,
    },
}

/// Parse bech32m, hex, or `@label` (named identity).
pub fn parse_address(s: &str) -> Result<Address, String> {
    match s.strip_prefix('@') {
        Some("") => Err("empty address label".to_string()),
        Some(label) => Ok(Address::from_seed(label)),
        None => s
            .parse()
            .map_err(|e| format!("invalid address '{}': {}", s, e)),
    }
}

/// Open the ledgers and governance store under `data_dir`.
pub fn open_dao(data_dir: &Path, governance: &GovernanceConfig) -> anyhow::Result<CliDao> {
    let token = LedgerDb::open(&data_dir.join("token")).context("Failed to open token ledger")?;
    let native = LedgerDb::open(&data_dir.join("native")).context("Failed to open native ledger")?;

    let dao = Dao::open(
        governance.clone(),
        Arc::new(token),
        Arc::new(native),
        &data_dir.join("governance"),
    )
    .context("Failed to open governance store")?;
    Ok(dao)
}

/// Execute a CLI command.
pub fn execute(
    cmd: Commands,
    data_dir: &Path,
    config_path: &Path,
    config: Option<CliConfig>,
) -> anyhow::Result<()> {
    if let Commands::Init { quorum, snapshot } = cmd {
        if config.is_some() {
            bail!("{} already exists", config_path.display());
        }
        return execute_init(data_dir, config_path, quorum, snapshot);
    }

    let config = config.ok_or_else(|| {
        anyhow!(
            "{} is not initialized; run `coffer init` first",
            data_dir.display()
        )
    })?;
    let dao = open_dao(data_dir, &config.governance)?;
    execute_with(cmd, &dao)
}

fn execute_init(data_dir: &Path, config_path: &Path, quorum: Amount, snapshot: bool) -> anyhow::Result<()> {
    let governance = GovernanceConfig {
        quorum,
        weighting: if snapshot {
            VoteWeighting::Snapshot
        } else {
            VoteWeighting::Live
        },
        ..GovernanceConfig::default()
    };
    governance.validate()?;

    let config = CliConfig {
        governance,
        logging: LoggingConfig::default(),
    };
    open_dao(data_dir, &config.governance)?;
    config.save(config_path)?;

    print_success(&format!("Initialized DAO in {}", data_dir.display()));
    println!("Quorum:    {}", format_amount(&config.governance.quorum));
    println!("Escrow:    {}", config.governance.escrow_address);
    println!("Treasury:  {}", config.governance.treasury_address);
    if snapshot {
        print_warning("Snapshot weighting: only balances held when a proposal is created can vote on it");
    }
    Ok(())
}

fn execute_with(cmd: Commands, dao: &CliDao) -> anyhow::Result<()> {
    match cmd {
        Commands::Init { .. } => bail!("DAO already initialized"),

        Commands::Mint { address, amount, native } => {
            if native {
                dao.native_ledger().mint(&address, amount)?;
            } else {
                dao.token_ledger().mint(&address, amount)?;
            }
            print_success(&format!(
                "Minted {} {} to {}",
                format_amount(&amount),
                ledger_name(native),
                address
            ));
        }

        Commands::Transfer { from, to, amount, native } => {
            if native {
                dao.native_ledger().transfer(&from, &to, amount)?;
            } else {
                dao.token_ledger().transfer(&from, &to, amount)?;
            }
            print_success(&format!(
                "Transferred {} {} from {} to {}",
                format_amount(&amount),
                ledger_name(native),
                from,
                to
            ));
        }

        Commands::Fund { from, amount } => {
            dao.fund(&from, amount)?;
            print_success(&format!("Treasury funded with {}", format_amount(&amount)));
            print_info(&format!("Treasury balance: {}", format_amount(&dao.treasury_balance())));
        }

        Commands::Propose { from, name, amount, recipient, description, deposit } => {
            let request = ProposalRequest::new(name, amount, recipient, description).with_deposit(deposit);
            let id = dao.create_proposal(&from, request)?;
            print_success(&format!("Created proposal #{}", id));
            if !deposit.is_zero() {
                print_info(&format!("{} tokens held in escrow", format_amount(&deposit)));
            }
        }

        Commands::Vote { from, id, down } => {
            dao.vote(&from, id, !down)?;
            let weight = dao
                .vote_record(&from, id)
                .map(|v| v.weight)
                .unwrap_or(Amount::ZERO);
            print_success(&format!(
                "Voted {} proposal #{} with weight {}",
                if down { "against" } else { "for" },
                id,
                format_amount(&weight)
            ));
            if dao.tally(id).is_some_and(|t| t.quorum_reached) {
                print_info("Quorum reached; the proposal can be finalized");
            }
        }

        Commands::Finalize { from, id } => {
            dao.finalize_proposal(&from, id)?;
            let proposal = dao.proposal(id).ok_or(GovernanceError::ProposalNotFound(id))?;
            print_success(&format!(
                "Proposal #{} finalized; paid {} to {}",
                id,
                format_amount(&proposal.amount),
                proposal.recipient
            ));
        }

        Commands::WithdrawDeposit { from, id } => {
            let amount = dao.withdraw_deposit(&from, id)?;
            print_success(&format!(
                "Returned deposit of {} for proposal #{}",
                format_amount(&amount),
                id
            ));
        }

        Commands::Show { id, viewer } => {
            let proposal = dao.proposal(id).ok_or(GovernanceError::ProposalNotFound(id))?;
            let tally = proposal.tally(dao.quorum());
            print_proposal(&listing(dao, proposal, viewer.as_ref()), &tally, dao.quorum());
        }

        Commands::List { open, viewer } => {
            let proposals = if open {
                dao.open_proposals()
            } else {
                dao.proposals()
            };
            let listings: Vec<ProposalListing> = proposals
                .into_iter()
                .map(|p| listing(dao, p, viewer.as_ref()))
                .collect();
            print_proposal_table(&listings, dao.quorum());
        }

        Commands::Events { since } => {
            print_events(&dao.events_since(since));
        }

        Commands::Treasury => {
            let treasury = dao.treasury();
            print_treasury(&treasury.address(), dao.treasury_balance(), treasury.transactions());
        }

        Commands::Balance { address, native } => {
            let balance = if native {
                dao.native_ledger().balance_of(&address)
            } else {
                dao.token_ledger().balance_of(&address)
            };
            println!("{}: {} {}", address, format_amount(&balance), ledger_name(native));
        }
    }

    Ok(())
}

fn ledger_name(native: bool) -> &'static str {
    if native {
        "native"
    } else {
        "tokens"
    }
}

/// Attach the recipient's native balance and, when asked, `viewer`'s vote.
fn listing(dao: &CliDao, proposal: Proposal, viewer: Option<&Address>) -> ProposalListing {
    let recipient_balance = dao.native_ledger().balance_of(&proposal.recipient);
    let ballot = viewer.map(|who| {
        Ballot::of(dao.has_voted(who, proposal.id), dao.has_downvoted(who, proposal.id))
    });
    ProposalListing {
        proposal,
        recipient_balance,
        ballot,
    }
}
