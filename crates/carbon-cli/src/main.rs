//! # carbon: Command-Line Driver for the Cascades Optimizer
//!
//! Reads a logical operator tree from JSON, optimizes it against a JSON catalog
//! and prints the memo and the chosen physical plan.
//!
//! ```text
//! carbon explain --plan plan.json --catalog catalog.json [--config config.json]
//! carbon rules
//! ```
//!
//! Logging is controlled by the `RUST_LOG` environment variable (defaults to
//! `info` for the carbon crates). `RUST_LOG=carbon_core=trace` prints every task.

mod error;
mod input;

use carbon_core::memo::PlanNode;
use carbon_core::scheduler::SchedulerStats;
use carbon_core::Optimizer;
use clap::{Parser, Subcommand, ValueEnum};
use error::CliError;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "carbon")]
#[command(about = "Cascades query optimizer driver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize an operator tree and print the chosen plan
    Explain {
        /// Path to the operator tree JSON file
        #[arg(short, long)]
        plan: PathBuf,

        /// Path to the catalog JSON file
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Path to an optimizer config JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output cardinality assumed for every limit (overrides config)
        #[arg(long)]
        limit_rows: Option<f64>,

        /// Fraction of rows a filter keeps (overrides config)
        #[arg(long)]
        filter_selectivity: Option<f64>,

        /// Also print every group of the memo
        #[arg(long)]
        memo: bool,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// List the built-in rules in registration order
    Rules,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Serialize)]
struct ExplainOutput<'a> {
    plan: &'a PlanNode,
    targets: Vec<String>,
    tasks_executed: usize,
    rule_applications: usize,
    groups: usize,
    exprs: usize,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("carbon=info,carbon_core=info,carbon_rules=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Explain {
            plan,
            catalog,
            config,
            limit_rows,
            filter_selectivity,
            memo,
            format,
        } => explain(ExplainArgs {
            plan,
            catalog,
            config,
            limit_rows,
            filter_selectivity,
            show_memo: memo,
            format,
        }),
        Commands::Rules => {
            list_rules();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

struct ExplainArgs {
    plan: PathBuf,
    catalog: Option<PathBuf>,
    config: Option<PathBuf>,
    limit_rows: Option<f64>,
    filter_selectivity: Option<f64>,
    show_memo: bool,
    format: Format,
}

fn explain(args: ExplainArgs) -> Result<(), CliError> {
    let tree = input::load_plan(&args.plan)?;
    let mut config = input::load_config(args.config.as_deref())?;
    if let Some(rows) = args.limit_rows {
        config.limit_rows = rows;
    }
    if let Some(sel) = args.filter_selectivity {
        config.filter_selectivity = sel;
    }
    let catalog = input::load_catalog(args.catalog.as_deref())?.into_catalog(config.default_table_rows);

    info!("Optimizing {} operator(s) from {}", tree.size(), args.plan.display());

    let mut optimizer = Optimizer::new(
        Arc::new(carbon_rules::default_rule_set()),
        Arc::new(catalog),
        config,
    );
    let result = optimizer.try_optimize(Some(&tree));
    if args.show_memo {
        println!("Memo:\n{}", optimizer.memo());
    }
    let plan = result?;

    let memo = optimizer.memo();
    let targets: Vec<String> = memo
        .target_list(plan.group)
        .unwrap_or_default()
        .into_iter()
        .map(|(id, column)| format!("#{id} {column}"))
        .collect();
    let stats: &SchedulerStats = optimizer.stats();

    match args.format {
        Format::Text => {
            println!("Plan:\n{}", plan.display(1));
            println!("Output columns:");
            for t in &targets {
                println!("  {t}");
            }
            println!(
                "Search: {} tasks, {} rule applications, {} groups, {} expressions",
                stats.tasks_executed,
                stats.rule_applications,
                memo.num_groups(),
                memo.num_exprs()
            );
        }
        Format::Json => {
            let out = ExplainOutput {
                plan: &plan,
                targets,
                tasks_executed: stats.tasks_executed,
                rule_applications: stats.rule_applications,
                groups: memo.num_groups(),
                exprs: memo.num_exprs(),
            };
            let json = serde_json::to_string_pretty(&out).map_err(CliError::Encode)?;
            println!("{json}");
        }
    }
    Ok(())
}

fn list_rules() {
    for rule in carbon_rules::default_rule_set().iter() {
        println!("{:<20} {:?}", rule.name(), rule.rule_type());
    }
}
