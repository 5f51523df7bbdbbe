//! A small command-line front-end exercising [`wcsp_core::search::Solver`]
//! end to end: a random graph-colouring WCSP (soft version — colour clashes
//! cost 1 instead of being forbidden outright, so the problem is always
//! feasible and the interesting question is how many clashes the configured
//! search mode manages to avoid) driven by a `clap`-parsed [`SearchConfig`].

use std::sync::{atomic::AtomicBool, Arc};

use clap::Parser;
use rand::prelude::*;
use tracing::info;

use wcsp_core::config::SearchConfig;
use wcsp_core::cost::Cost;
use wcsp_core::search::stats::render_stats_table;
use wcsp_core::wcsp::table::TableWcsp;
use wcsp_core::wcsp::WcspStore;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of regions to colour.
    #[arg(long, default_value_t = 12)]
    num_regions: u32,

    /// Number of colours available per region.
    #[arg(long, default_value_t = 3)]
    num_colours: u32,

    /// Probability that any two regions are adjacent.
    #[arg(long, default_value_t = 0.25)]
    edge_density: f64,

    /// Enable HBFS with the given initial backtrack budget.
    #[arg(long)]
    hbfs: Option<u64>,

    /// Enable Limited Discrepancy Search up to this bound.
    #[arg(long)]
    lds: Option<i32>,

    /// Node-count threshold that activates Luby-sequence restarts.
    #[arg(long)]
    restart: Option<u64>,

    /// Use min-domain/max-weighted-degree variable ordering.
    #[arg(long, default_value_t = false)]
    weighted_degree: bool,

    /// Override the base heuristic with last-conflict.
    #[arg(long, default_value_t = false)]
    last_conflict: bool,

    /// Random seed for graph generation.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn generate_graph(num_regions: u32, edge_density: f64, seed: u64) -> Vec<(u32, u32)> {
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
    let mut edges = Vec::new();
    for a in 0..num_regions {
        for b in (a + 1)..num_regions {
            if rng.gen::<f64>() < edge_density {
                edges.push((a, b));
            }
        }
    }
    edges
}

fn main() -> Result<(), wcsp_core::error::Error> {
    let _ = tracing_subscriber::fmt::try_init();
    let args = Args::parse();

    let edges = generate_graph(args.num_regions, args.edge_density, args.seed);
    info!(regions = args.num_regions, edges = edges.len(), "built map");

    let mut wcsp = TableWcsp::new(
        (0..args.num_regions)
            .map(|_| (0, args.num_colours as i32 - 1, vec![Cost::MIN_COST; args.num_colours as usize]))
            .collect(),
    );
    let clash_table: Vec<Vec<Cost>> = (0..args.num_colours)
        .map(|i| {
            (0..args.num_colours)
                .map(|j| if i == j { Cost::new(1) } else { Cost::MIN_COST })
                .collect()
        })
        .collect();
    for (a, b) in &edges {
        wcsp.add_binary(*a, *b, clash_table.clone());
    }
    wcsp.set_ub(Cost::new(edges.len() as i64 + 1));

    let mut builder = SearchConfig::builder()
        .weighted_degree(args.weighted_degree)
        .last_conflict(args.last_conflict);
    if let Some(budget) = args.hbfs {
        builder = builder.hbfs_init(budget);
    }
    if let Some(bound) = args.lds {
        builder = builder.lds(bound);
    }
    if let Some(threshold) = args.restart {
        builder = builder.restart(threshold);
    }
    let config = builder.build()?;

    let mut solver = wcsp_core::search::Solver::new(wcsp, config, Arc::new(AtomicBool::new(false)));
    let outcome = solver.solve()?;

    match outcome.best_cost {
        Some(cost) => {
            println!("best cost: {cost} ({} clashes)", cost.value());
            println!("{}", render_stats_table(&outcome.stats, cost));
        }
        None => println!("problem is infeasible"),
    }
    if !outcome.proved_optimal {
        println!("(search was cut short; this may not be optimal)");
    }

    Ok(())
}
