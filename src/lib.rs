/*!
 * # Arbitrator - Arbitrage Loop Simulator
 *
 * Arbitrator discovers closed trading loops across fixed exchange rates and
 * automated-market-maker pools, simulates them against shared pool state and
 * finds the investment maximizing profit under slippage.
 *
 * ## Core Features
 *
 * - **Loop Discovery**: Enumerates every loop of the requested sizes from the chosen assets
 * - **Pluggable Pricing**: Fixed rates, constant product, constant sum or custom formulas
 * - **Stateful Simulation**: Probes loops without side effects or executes them for real
 * - **Profit Optimization**: Bounded search for the best investment of a loop
 *
 * ## Module Structure
 *
 * - `arb`: Pools, loops, simulation and optimization
 * - `config`: Configuration management for the simulator
 * - `utils`: Utility functions and helpers
 */

/// Arbitrage loop discovery and simulation
pub mod arb;
/// Configuration management for the simulator
pub mod config;
/// Utility functions and helpers
pub mod utils;
