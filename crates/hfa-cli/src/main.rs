//! `hfa` — sizing tool for HashFast USB hashing accelerators.
//!
//! ```text
//! USAGE:
//!   hfa plan --chips N --cores M [--variant V] [--baud B]
//!                                    Print the resources a board would get
//!   hfa simulate --devices D --chips N --cores M [--variant V]
//!                [--cycles K] [--fail ID]...
//!                                    Attach simulated boards and cycle jobs
//! ```
//!
//! Logging is controlled with `RUST_LOG` (default `warn`).

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hfa_chip::{DeviceVariant, Topology};
use hfa_driver::{
    attach, AttachConfig, Backpressure, Device, DeviceRegistry, SimulatedTransport, WorkItem,
};

#[derive(Parser)]
#[command(name = "hfa", about = "HashFast accelerator sizing CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the sizing plan for a board topology.
    Plan {
        #[command(flatten)]
        board: BoardArgs,
    },
    /// Attach simulated boards and run acquire/release cycles.
    Simulate {
        #[command(flatten)]
        board: BoardArgs,
        /// Number of boards to attach.
        #[arg(long, default_value_t = 1)]
        devices: usize,
        /// Fill/drain rounds per board.
        #[arg(long, default_value_t = 4)]
        cycles: u32,
        /// Device id whose reset should fail (repeatable).
        #[arg(long)]
        fail: Vec<usize>,
    },
}

#[derive(Args)]
struct BoardArgs {
    /// Hashing chips on the board.
    #[arg(long)]
    chips: u32,
    /// Cores per chip.
    #[arg(long)]
    cores: u32,
    /// Board variant: generic (g1), express-agx, virtex7 (vc709).
    #[arg(long, default_value = "generic", value_parser = parse_variant)]
    variant: DeviceVariant,
    /// Control link baud rate (overrides HFA_BAUD_RATE).
    #[arg(long)]
    baud: Option<u32>,
}

impl BoardArgs {
    fn topology(&self) -> Topology {
        Topology::new(self.chips, self.cores, self.variant)
    }

    fn config(&self) -> AttachConfig {
        let config = AttachConfig::from_env();
        match self.baud {
            Some(baud) => config.with_baud_rate(baud),
            None => config,
        }
    }
}

fn parse_variant(s: &str) -> std::result::Result<DeviceVariant, String> {
    DeviceVariant::from_name(s).ok_or_else(|| format!("unknown variant '{s}'"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Cmd::Plan { board } => cmd_plan(&board)?,
        Cmd::Simulate {
            board,
            devices,
            cycles,
            fail,
        } => cmd_simulate(&board, devices, cycles, &fail)?,
    }

    Ok(())
}

fn cmd_plan(board: &BoardArgs) -> Result<()> {
    let topology = board.topology();
    let config = board.config();
    let bp = Backpressure::from_topology(&topology)
        .with_context(|| format!("cannot size {topology}"))?;

    println!("Board        : {topology}");
    println!("Baud rate    : {}", config.baud_rate);
    match topology.hash_loops() {
        0 => println!("Hash loops   : full nonce range"),
        n => println!("Hash loops   : {n} (2^{})", n.trailing_zeros()),
    }
    println!("Cores        : {}", topology.total_cores().unwrap_or(0));
    println!("Inflight     : {}", bp.inflight_target());
    println!("Job entries  : {}", bp.job_count());
    println!("Work entries : {}", bp.max_work());
    println!("Sequences    : {}", hfa_chip::tuning::NUM_SEQUENCE);
    println!("Search diff  : {}", config.max_search_difficulty);

    if topology.is_empty() {
        println!();
        println!("Note: board has no cores and will never accept work.");
    }

    Ok(())
}

fn cmd_simulate(board: &BoardArgs, devices: usize, cycles: u32, fail: &[usize]) -> Result<()> {
    let topology = board.topology();
    let config = board.config();
    let mut registry = DeviceRegistry::new();
    tracing::debug!("Simulating {devices} board(s): {topology}, {cycles} cycle(s)");

    for id in 0..devices {
        let mut transport = SimulatedTransport::new(topology);
        if fail.contains(&id) {
            transport = transport.failing("simulated handshake failure");
        }

        match attach(&mut registry, id, &mut transport, &config) {
            Ok(dev) => println!("[{id}] attached: {topology}, inflight {}", dev.inflight_target()),
            Err(e) if e.is_fatal() => bail!("attach aborted at device {id}: {e}"),
            Err(e) => println!("[{id}] skipped: {e}"),
        }
    }
    println!();

    for dev in registry.iter() {
        let completed = run_cycles(dev, cycles)?;
        println!("{}", dev.summary()?);
        println!("     completed {completed} work unit(s) over {cycles} cycle(s)");
    }

    if registry.is_empty() {
        bail!("no devices attached");
    }

    Ok(())
}

/// Fill a device up to its inflight target, then complete everything.
fn run_cycles(dev: &Device, cycles: u32) -> Result<u64> {
    let cores_per_chip = dev.topology().cores_per_chip().max(1);
    let total_cores = dev.topology().total_cores().unwrap_or(0).max(1);
    let mut counter: u64 = 0;

    for _ in 0..cycles {
        let mut jobs = dev.jobs()?;
        let mut work = dev.work()?;

        let mut claimed = Vec::new();
        while dev.backpressure().admits(jobs.active_count()) {
            let Some(job) = jobs.acquire() else { break };
            let Some(slot) = work.first_free() else {
                jobs.release(job)?;
                break;
            };

            let sequence = work.wrap_sequence(counter);
            let target = u32::try_from(counter % u64::from(total_cores))?;

            work.store(slot, WorkItem::new(sequence, counter.to_le_bytes().to_vec()))?;
            let j = jobs.job_mut(job).context("acquired job missing from arena")?;
            j.chip = target / cores_per_chip;
            j.core = target % cores_per_chip;
            j.sequence = sequence;
            j.work_slot = Some(slot);

            claimed.push(job);
            counter += 1;
        }

        for job in claimed {
            if let Some(slot) = jobs.job(job).and_then(|j| j.work_slot) {
                work.take(slot)?;
            }
            jobs.release(job)?;
        }
    }

    Ok(counter)
}
