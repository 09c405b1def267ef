//! lakebench CLI

use clap::{Parser, Subcommand};
use lakebench::config::{DEFAULT_TABLE, DEFAULT_WAREHOUSE};
use lakebench::{
    run_suite, run_table_smoke, BenchConfig, ComputeSession, OutputFormat, Result,
    TableIdent, TableSmokeConfig, TpcdsGenerator, WarehouseCatalog, WriteMode,
};
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "lakebench")]
#[command(about = "SQL micro-benchmark driver and table-format smoke test")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the SQL micro-benchmark suite over the TPC-DS views
    Bench {
        /// Directory containing tpcds/<table> Parquet datasets
        #[arg(long, env = "LAKEBENCH_DATA_ROOT", default_value = "data")]
        data_root: PathBuf,

        /// Timed executions per query
        #[arg(short, long, default_value = "2")]
        retries: usize,

        /// Rows shown from each execution
        #[arg(long, default_value = "5")]
        preview_rows: usize,

        /// Preview format (table, csv, json, vertical)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,

        /// Engine target partitions (defaults to the CPU count)
        #[arg(short, long)]
        partitions: Option<usize>,

        /// Run only the named cases (repeatable)
        #[arg(long)]
        only: Vec<String>,
    },

    /// Write synthetic rows to a managed table and count them back
    TableSmoke {
        /// Number of rows to write
        #[arg(short = 'n', long = "num_rows", alias = "num-rows")]
        num_rows: usize,

        /// Warehouse root of the table catalog
        #[arg(long, env = "LAKEBENCH_WAREHOUSE", default_value = DEFAULT_WAREHOUSE)]
        warehouse: PathBuf,

        /// Dotted table identifier
        #[arg(short, long, default_value = DEFAULT_TABLE)]
        table: TableIdent,

        /// create, append or replace
        #[arg(short, long, default_value = "create")]
        mode: WriteMode,

        /// Seed for the row values
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Generate the TPC-DS subset as Parquet files
    Generate {
        /// Directory that receives tpcds/<table>
        #[arg(long, env = "LAKEBENCH_DATA_ROOT", default_value = "data")]
        data_root: PathBuf,

        /// Scale factor (1.0 = 1,000 customers, 20,000 store sales)
        #[arg(short, long, default_value = "1.0")]
        scale: f64,
    },

    /// Describe a managed table
    Inspect {
        /// Dotted table identifier
        #[arg(short, long)]
        table: TableIdent,

        /// Warehouse root of the table catalog
        #[arg(long, env = "LAKEBENCH_WAREHOUSE", default_value = DEFAULT_WAREHOUSE)]
        warehouse: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Bench {
            data_root,
            retries,
            preview_rows,
            format,
            partitions,
            only,
        } => {
            let mut config = BenchConfig::new()
                .with_data_root(data_root)
                .with_retries(retries)
                .with_preview_rows(preview_rows)
                .with_format(format)
                .with_only(only);
            if let Some(n) = partitions {
                config = config.with_target_partitions(n);
            }
            let session = match config.target_partitions {
                Some(n) => ComputeSession::with_target_partitions(n),
                None => ComputeSession::new(),
            };

            let report = run_suite(&session, &config, &mut out).await?;
            writeln!(out)?;
            report.write_summary(&mut out)?;
        }

        Commands::TableSmoke {
            num_rows,
            warehouse,
            table,
            mode,
            seed,
        } => {
            let mut config = TableSmokeConfig::new(num_rows)
                .with_warehouse(warehouse)
                .with_table(table.to_string())
                .with_mode(mode);
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }
            let catalog = WarehouseCatalog::new(&config.warehouse);
            run_table_smoke(&ComputeSession::new(), &catalog, &config, &mut out).await?;
        }

        Commands::Generate { data_root, scale } => {
            let start = Instant::now();
            let tpcds_dir = BenchConfig::new().with_data_root(data_root).tpcds_dir();
            let tables = TpcdsGenerator::new(scale).generate_to_parquet(&tpcds_dir)?;
            for table in &tables {
                writeln!(
                    out,
                    "{:<14} {:>10} rows  {}",
                    table.name,
                    table.rows,
                    table.path.display()
                )?;
            }
            writeln!(out, "Generated {} tables in {:?}", tables.len(), start.elapsed())?;
        }

        Commands::Inspect { table, warehouse } => {
            let catalog = WarehouseCatalog::new(warehouse);
            catalog.load_table(&table)?.write_description(&mut out)?;
        }
    }

    Ok(())
}
