use std::path::PathBuf;

use arbitrator::arb::cycle_quote::CycleQuote;
use arbitrator::arb::market::MarketConfig;
use arbitrator::arb::{Arbitrator, Cycle, Optimizer, ProfitOptimum};
use arbitrator::config::{parse_sizes, Config};
use arbitrator::utils::logger::setup_logger;
use clap::{Parser, Subcommand};
use eyre::{bail, eyre, Result};
use log::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON market description, overrides ARB_MARKET_FILE
    #[arg(short, long)]
    market: Option<PathBuf>,
    /// Comma separated loop sizes, overrides ARB_LOOP_SIZES
    #[arg(short, long)]
    sizes: Option<String>,
    /// Simulate without pool fees
    #[arg(long)]
    no_fees: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List loops, best unit return first
    Loops {
        /// Number of loops shown
        #[arg(short, long)]
        top: Option<usize>,
    },
    /// Find the most profitable investment of the best loops
    Optimize {
        /// Number of loops optimized
        #[arg(short, long, default_value_t = 5)]
        top: usize,
    },
    /// Trade the best loop for real, pool state persisting between runs
    Execute {
        /// Number of consecutive trades
        #[arg(short, long, default_value_t = 1)]
        runs: usize,
        /// Amount traded each run, the optimum of the first run by default.
        /// The optimum is searched with fees, so --no-fees needs an explicit amount.
        #[arg(short, long)]
        amount: Option<f64>,
    },
}

fn load_arbitrator(config: &Config) -> Result<Arbitrator> {
    let Some(path) = &config.market_file else {
        bail!("No market given, use --market or ARB_MARKET_FILE");
    };
    let arbitrator = MarketConfig::load(path)?.into_arbitrator()?;
    Ok(arbitrator)
}

fn list_loops(loops: &[Cycle], top: Option<usize>, with_fees: bool) {
    let shown = top.unwrap_or(loops.len());
    println!("\nFound {} loops", loops.len());
    for (rank, cycle) in loops.iter().take(shown).enumerate() {
        match cycle.unit_return(with_fees) {
            Ok(unit_return) => println!("{:>4}. {unit_return:>12.6}  {cycle}", rank + 1),
            Err(e) => println!("{:>4}. {:>12}  {cycle} ({e})", rank + 1, "-"),
        }
    }
}

fn optimize_loops(loops: &[Cycle], top: usize, optimizer: &Optimizer) {
    for cycle in loops.iter().take(top) {
        match optimizer.optimize(cycle) {
            Ok(ProfitOptimum::Interior { amount_in, profit }) => {
                println!("{cycle}\n    invest {amount_in:.6} for a profit of {profit:.6}");
            }
            Ok(ProfitOptimum::Linear { profit_per_unit }) if profit_per_unit > 0.0 => {
                println!("{cycle}\n    fixed rates only, unbounded profit of {profit_per_unit:.6} per unit");
            }
            Ok(ProfitOptimum::Linear { profit_per_unit }) => {
                println!("{cycle}\n    fixed rates only, loses {:.6} per unit", -profit_per_unit);
            }
            Err(e) => warn!("Could not optimize {cycle}: {e}"),
        }
    }
}

/// Optimal investment of `best`, searched with fees
fn default_amount(best: &Cycle, config: &Config) -> Result<f64> {
    if !config.with_fees {
        bail!("The optimum is searched with fees, pass --amount to trade without them");
    }
    match config.optimizer.optimize(best)? {
        ProfitOptimum::Interior { amount_in, .. } => Ok(amount_in),
        ProfitOptimum::Linear { .. } => {
            bail!("{best} only goes through fixed rates, pass --amount")
        }
    }
}

fn execute_best(
    arbitrator: &Arbitrator,
    loops: &[Cycle],
    runs: usize,
    amount: Option<f64>,
    config: &Config,
) -> Result<()> {
    let best = loops.first().ok_or_else(|| eyre!("No loop to execute"))?;
    let amount = match amount {
        Some(amount) => amount,
        None => default_amount(best, config)?,
    };

    println!("Executing {best} with {amount:.6}");
    for run in 1..=runs {
        let quote = CycleQuote::new(best, amount, config.with_fees)?;
        for leg in quote.swap_quotes() {
            println!(
                "    {}: {:.6} -> {:.6}",
                leg.swap(),
                leg.amount_in(),
                leg.amount_out()
            );
        }
        let amount_out = best.convert_with(amount, config.with_fees, false)?;
        println!("Run {run}: {amount:.6} -> {amount_out:.6} (profit {:.6})", amount_out - amount);
        for pool in arbitrator.pools().iter().filter(|pool| pool.is_stateful()) {
            println!("    {pool}: {:?}", pool.reserves());
        }
    }
    arbitrator.reset_pools();
    info!("Pools reset after {runs} runs");
    Ok(())
}

fn main() -> Result<()> {
    setup_logger()?;

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(market) = cli.market {
        config.market_file = Some(market);
    }
    if let Some(sizes) = &cli.sizes {
        config.loop_sizes = parse_sizes(sizes)?;
    }
    if cli.no_fees {
        config.with_fees = false;
    }

    let arbitrator = load_arbitrator(&config)?;
    let loops = arbitrator.get_loops_with(&config.loop_sizes, config.with_fees);

    match cli.command {
        Some(Commands::Loops { top }) => list_loops(&loops, top, config.with_fees),
        Some(Commands::Optimize { top }) => optimize_loops(&loops, top, &config.optimizer),
        Some(Commands::Execute { runs, amount }) => {
            execute_best(&arbitrator, &loops, runs, amount, &config)?;
        }
        None => list_loops(&loops, None, config.with_fees),
    }

    Ok(())
}
