//! famfair CLI - run allocation protocols and search for counterexamples.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use famfair::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "famfair")]
#[command(version)]
#[command(about = "Democratic fair division of indivisible items among families")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (debug events; RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run protocols on every canonical instance up to a size
    Search {
        /// Number of families (2 or 3)
        #[arg(short, long, default_value = "2")]
        families: usize,

        /// Largest number of items
        #[arg(short, long, default_value = "4")]
        max_items: usize,

        /// Protocols to run
        #[arg(short, long = "protocol", value_delimiter = ',', default_value = "exhaustive")]
        protocols: Vec<ProtocolKind>,

        /// Items desired by every agent type (defaults to the number of families)
        #[arg(short, long)]
        approvals: Option<usize>,

        /// Fairness criterion, e.g. 1-of-best-2 or proportional
        #[arg(short, long)]
        criterion: Option<Criterion>,

        /// Base seed for randomized protocols
        #[arg(short, long)]
        seed: Option<u64>,

        /// Ratios below this bound are counterexamples, e.g. 2/3
        #[arg(short, long, default_value = "2/3")]
        bound: Share,

        /// Stop at the first counterexample
        #[arg(long)]
        stop_at_first: bool,
    },

    /// Count canonical instances without running protocols
    Count {
        #[arg(short, long, default_value = "2")]
        families: usize,

        #[arg(short, long, default_value = "4")]
        max_items: usize,

        #[arg(short, long)]
        approvals: Option<usize>,
    },

    /// Run one protocol on a worked example and print the audit trail
    Demo {
        #[arg(short, long, default_value = "rwav")]
        protocol: ProtocolKind,

        #[arg(short, long, value_enum, default_value_t = Example::Groups)]
        example: Example,

        #[arg(short, long)]
        seed: Option<u64>,
    },
}

#[derive(Copy, Clone, ValueEnum)]
enum Example {
    /// Two groups of binary agents with weighted memberships
    Groups,
    /// Two families ranking two items in opposite orders
    Boundary,
    /// Two groups where 3/5 of the first one desire the same item
    Threshold,
}

fn setup_logging(verbose: bool) {
    let default = if verbose { "famfair=debug" } else { "famfair=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn approval(members: &[(&[Item], u64)]) -> Vec<AgentSpec> {
    members.iter().map(|&(items, card)| AgentSpec::approval(items, card)).collect()
}

fn example_instance(example: Example) -> Result<Instance> {
    let (item_count, families) = match example {
        Example::Groups => (
            4,
            vec![
                FamilySpec::new(
                    "Group 1",
                    Criterion::OneOfBestC(2),
                    approval(&[(&[0, 1], 1), (&[1, 2], 2), (&[2, 3], 3), (&[3, 0], 4)]),
                ),
                FamilySpec::new("Group 2", Criterion::OneOfBestC(2), approval(&[(&[0, 3], 2), (&[3, 2], 3)])),
            ],
        ),
        Example::Boundary => {
            let ranked = |name: &str, ranking: Vec<Item>| {
                FamilySpec::new(
                    name,
                    Criterion::Proportional,
                    vec![AgentSpec::new(Valuation::Ordinal(ranking), 2)],
                )
            };
            (2, vec![ranked("A", vec![0, 1]), ranked("B", vec![1, 0])])
        }
        Example::Threshold => (
            5,
            vec![
                FamilySpec::new(
                    "Group 1",
                    Criterion::OneOfBestC(2),
                    approval(&[(&[1, 2], 1), (&[2, 3], 3), (&[3, 4], 3), (&[1, 0], 3)]),
                ),
                FamilySpec::new("Group 2", Criterion::OneOfBestC(2), approval(&[(&[1, 2], 5), (&[3, 4], 5)])),
            ],
        ),
    };
    Instance::new(item_count, families).context("Invalid example instance")
}

fn print_witness(label: &str, witness: &Witness) {
    println!("{label}: {} by {} (seed {:?})", witness.ratio, witness.protocol, witness.seed);
    for family in witness.instance.families() {
        let members: Vec<Bundle> = family.members().map(|m| family.desired_items(m)).collect();
        println!("  {} desires {:?}", family.name, members);
    }
    println!("  allocation {:?}", witness.allocation.to_list());
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    let now = Instant::now();

    match cli.command {
        Commands::Search {
            families,
            max_items,
            protocols,
            approvals,
            criterion,
            seed,
            bound,
            stop_at_first,
        } => {
            let config = SearchConfig {
                num_families: families,
                max_items,
                approvals,
                criterion,
                protocols,
                bound,
                seed,
                stop_at_first_counterexample: stop_at_first,
            };
            let report = search(&config).context("Search failed")?;

            println!("\n=== Search {:?} ===", report.outcome);
            println!("Instances:   {}", report.instances_checked);
            for (protocol, worst) in &report.worst_by_protocol {
                match worst {
                    Some(w) => println!("{:<14} worst {}", protocol.to_string(), w.ratio),
                    None => println!("{:<14} no instance", protocol.to_string()),
                }
            }
            if let Some(worst) = &report.worst {
                print_witness("Worst", worst);
            }
        }

        Commands::Count {
            families,
            max_items,
            approvals,
        } => {
            let config = SearchConfig {
                approvals,
                ..SearchConfig::new(families, max_items)
            };
            let counts = count_instances(&config)?;
            for (i, count) in counts.iter().enumerate() {
                println!("items: {} instances: {}", i + 1, count);
            }
            println!("total: {}", counts.iter().sum::<usize>());
        }

        Commands::Demo {
            protocol,
            example,
            seed,
        } => {
            let instance = example_instance(example)?;
            let outcome = protocol
                .protocol()
                .run(&instance, seed)
                .with_context(|| format!("{protocol} failed"))?;
            for decision in outcome.audit.iter() {
                println!("{:?}", decision);
            }
            println!("Allocation:  {:?}", outcome.allocation.to_list());
            println!("Ratio:       {}", outcome.ratio);
        }
    }

    println!("Time: {:.3} seconds", now.elapsed().as_secs_f64());
    Ok(())
}
