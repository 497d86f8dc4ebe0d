use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use ledgersim_consensus::{
    select_proposer, ConsensusEngine, Resolution, ValidatorRegistry, VoteChoice,
};
use ledgersim_core::{Block, HashChainLedger, Transaction};

#[derive(Parser)]
#[command(name = "ledgersim")]
#[command(about = "Stake-weighted blockchain simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full consensus lifecycle: propose, vote, finalize
    Demo,

    /// Tamper with a signed chain and watch validity cascade
    Tamper {
        /// Number of blocks to build before tampering
        #[arg(long, default_value_t = 4)]
        blocks: usize,

        /// 1-based block number to edit
        #[arg(long, default_value_t = 2)]
        edit: usize,
    },

    /// Finalize a block through a malicious-stake majority
    Capture,

    /// Preview stake-weighted proposer selection over upcoming slots
    Preview {
        /// Number of slots to preview
        #[arg(long, default_value_t = 10)]
        slots: u64,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Demo => run_demo()?,
        Commands::Tamper { blocks, edit } => run_tamper(blocks, edit)?,
        Commands::Capture => run_capture()?,
        Commands::Preview { slots } => run_preview(slots)?,
    }

    Ok(())
}

fn seeded_registry() -> Result<ValidatorRegistry> {
    let mut registry = ValidatorRegistry::new();
    for name in ["alice", "bob", "carol"] {
        registry.register(name)?;
    }
    Ok(registry)
}

fn transfer_batch() -> Vec<Transaction> {
    vec![
        Transaction::new("alice", "bob", 1.5),
        Transaction::new("bob", "carol", 0.25),
    ]
}

fn run_demo() -> Result<()> {
    let mut registry = seeded_registry()?;
    let mut engine = ConsensusEngine::new();

    let next = engine.proposer_preview(&registry)?;
    println!("next slot proposer: {next}");

    let proposal = engine.propose(transfer_batch(), None, &registry)?;
    let proposer = proposal.proposer.clone();
    println!(
        "proposal opened: block {} by {} (prev hash {})",
        proposal.block_number, proposer, proposal.prev_hash
    );

    let mut resolution = None;
    for name in ["alice", "bob", "carol"] {
        let outcome = engine.cast_vote(name, VoteChoice::Approve, &registry)?;
        resolution = outcome.resolution;
    }

    match resolution {
        Some(Resolution::Finalized(summary)) => {
            println!(
                "finalized: block {} with {:.1}% approving stake",
                summary.block_number, summary.consensus_percentage
            );
            registry.credit_reward(&proposer, 0.1)?;
            info!("proposer {} credited 0.1 reward", proposer);
        }
        Some(Resolution::Rejected(summary)) => {
            println!(
                "rejected: {:.1} of {:.1} required stake approved",
                summary.yes_stake, summary.required_stake
            );
        }
        None => println!("voting still open"),
    }

    println!("{}", serde_json::to_string_pretty(&engine.chain_snapshot())?);
    Ok(())
}

fn run_tamper(blocks: usize, edit: usize) -> Result<()> {
    let mut ledger = HashChainLedger::new();
    for i in 0..blocks {
        let number = i as u64 + 1;
        let prev = ledger.tail_hash();
        let mut block = Block::new(number, format!("batch {number}"), prev, "alice");
        block.sign();
        ledger.append_finalized(block)?;
    }

    println!("before tampering:");
    print_validity(&ledger);

    let index = edit.saturating_sub(1);
    ledger.edit_block_data(index, "tampered payload")?;
    println!("\nafter editing block {edit}:");
    print_validity(&ledger);

    ledger.sign_block(index)?;
    println!("\nafter re-signing block {edit} (descendants stay broken):");
    print_validity(&ledger);

    println!(
        "\nchain report: {}",
        serde_json::to_string_pretty(&ledger.verify_chain())?
    );
    Ok(())
}

fn run_capture() -> Result<()> {
    let mut registry = ValidatorRegistry::new();
    registry.register("mallory")?;
    registry.register("alice")?;
    registry.register("bob")?;
    registry.add_stake("mallory", 64.0)?;
    registry.set_malicious("mallory", true)?;

    let mut engine = ConsensusEngine::new();
    engine.propose(transfer_batch(), Some("mallory"), &registry)?;

    let mut resolution = None;
    for name in ["mallory", "alice", "bob"] {
        let outcome = engine.cast_vote(name, VoteChoice::Approve, &registry)?;
        resolution = outcome.resolution;
    }

    if let Some(Resolution::Finalized(summary)) = resolution {
        println!(
            "block {} finalized, malicious capture: {}",
            summary.block_number, summary.malicious_capture
        );
    }

    println!("{}", serde_json::to_string_pretty(&engine.chain_snapshot())?);
    Ok(())
}

fn run_preview(slots: u64) -> Result<()> {
    let mut registry = seeded_registry()?;
    registry.add_stake("bob", 32.0)?; // bob carries double weight

    for slot in 1..=slots {
        let proposer = select_proposer(slot, &registry)?;
        println!("slot {slot}: {} (stake {})", proposer.name, proposer.stake);
    }
    Ok(())
}

fn print_validity(ledger: &HashChainLedger) {
    for view in ledger.snapshot() {
        println!(
            "  block {} [{}] hash {}..",
            view.number,
            view.validity,
            &view.hash[..12]
        );
    }
}
