//! `nnaccel`: command-line front end for the simulated lane accelerator.
//!
//! ```text
//! USAGE:
//!   nnaccel info                                 Geometry, config and stored matrices
//!   nnaccel vector <op> <values..>               Direct vector op (add|mul|square|relu|tanh|sigmoid)
//!   nnaccel convert <kind> <values..>            full | trinary | fixed_point_1s31
//!   nnaccel matvec --name N --rows R --cols C    Stored matrix × constant vector
//!   nnaccel identity --name N --size S           Store an S×S identity matrix
//! ```
//!
//! `NNACCEL_STORE_DIR` and `NNACCEL_TERNARY_THRESHOLD` override the defaults;
//! `--store` overrides the environment.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use nnaccel_driver::geometry::{BLOCK_DIM, LANE_WIDTH, UNIT_COUNT};
use nnaccel_driver::{
    Accelerator, AcceleratorConfig, ConversionKind, Matrix, MatrixStore, Vector, VectorOp,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nnaccel", about = "Simulated lane accelerator CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print accelerator geometry, configuration and stored matrices.
    Info {
        /// Matrix store directory.
        #[arg(long)]
        store: Option<PathBuf>,
    },
    /// Apply a direct vector operation and print the result.
    Vector {
        /// Operation tag (add, mul, square, relu, tanh, sigmoid).
        op: String,
        #[command(flatten)]
        input: VectorInput,
    },
    /// Convert values to another numeric format and print the read-back.
    Convert {
        /// Conversion kind (full, trinary, fixed_point_1s31).
        kind: String,
        #[command(flatten)]
        input: VectorInput,
    },
    /// Multiply a stored matrix by a constant vector.
    Matvec {
        /// Stored matrix name.
        #[arg(long)]
        name: String,
        /// Row count.
        #[arg(long)]
        rows: usize,
        /// Column count (multiple of 16).
        #[arg(long)]
        cols: usize,
        /// Value of every vector element.
        #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
        value: f32,
        /// Matrix store directory.
        #[arg(long)]
        store: Option<PathBuf>,
    },
    /// Save an identity matrix to the store.
    Identity {
        /// Name to store under.
        #[arg(long)]
        name: String,
        /// Side length.
        #[arg(long)]
        size: usize,
        /// Matrix store directory.
        #[arg(long)]
        store: Option<PathBuf>,
    },
}

#[derive(Args)]
struct VectorInput {
    /// Input values; length must be a multiple of 16 unless --pad is given.
    #[arg(required = true, allow_hyphen_values = true)]
    values: Vec<f32>,
    /// Zero-pad the input up to the next multiple of 16.
    #[arg(long)]
    pad: bool,
}

impl VectorInput {
    fn into_vector(self) -> Result<Vector> {
        let mut values = self.values;
        if self.pad {
            let padded = values.len().div_ceil(LANE_WIDTH) * LANE_WIDTH;
            values.resize(padded, 0.0);
        }
        Vector::from_slice(&values).context("Invalid input vector")
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Cmd::Info { store } => cmd_info(store)?,
        Cmd::Vector { op, input } => cmd_vector(&op, input)?,
        Cmd::Convert { kind, input } => cmd_convert(&kind, input)?,
        Cmd::Matvec {
            name,
            rows,
            cols,
            value,
            store,
        } => cmd_matvec(&name, rows, cols, value, store)?,
        Cmd::Identity { name, size, store } => cmd_identity(&name, size, store)?,
    }

    Ok(())
}

fn load_config(store: Option<PathBuf>) -> Result<AcceleratorConfig> {
    let config = AcceleratorConfig::from_env()?;
    Ok(match store {
        Some(dir) => config.with_store_dir(dir),
        None => config,
    })
}

fn print_values(values: &[f32]) {
    for chunk in values.chunks(LANE_WIDTH) {
        let line: Vec<String> = chunk.iter().map(|v| format!("{v:>9.4}")).collect();
        println!("  {}", line.join(" "));
    }
}

fn cmd_info(store: Option<PathBuf>) -> Result<()> {
    let config = load_config(store)?;
    let acc = Accelerator::with_config(config)?;
    let status = acc.status();

    println!("Compute units  : {UNIT_COUNT} ({} idle)", status.idle_count());
    println!("Lane width     : {LANE_WIDTH}");
    println!("Block          : {BLOCK_DIM}×{BLOCK_DIM}");
    println!("Ternary thresh : {}", acc.config().ternary_threshold);
    println!("Store          : {}", acc.config().store_dir.display());

    if acc.config().store_dir.is_dir() {
        let names = acc.store()?.list()?;
        if names.is_empty() {
            println!("Stored         : (none)");
        } else {
            println!("Stored         : {}", names.join(", "));
        }
    }

    Ok(())
}

fn cmd_vector(op: &str, input: VectorInput) -> Result<()> {
    let op: VectorOp = op.parse()?;
    let v = input.into_vector()?;
    let acc = Accelerator::new();
    let out = acc.compute_vector(&v, op);
    println!("{op} on {v}:");
    print_values(out.as_slice());
    Ok(())
}

fn cmd_convert(kind: &str, input: VectorInput) -> Result<()> {
    let kind: ConversionKind = kind.parse()?;
    let v = input.into_vector()?;
    let config = AcceleratorConfig::from_env()?;
    let acc = Accelerator::with_config(config)?;

    let encoded = acc.quantizer().encode(v.as_slice(), kind);
    let out = acc.convert_vector(&v, kind);
    println!(
        "{kind}: {} values in {} bytes (f32: {} bytes)",
        encoded.len(),
        encoded.storage_bytes(),
        v.len() * std::mem::size_of::<f32>()
    );
    print_values(out.as_slice());
    Ok(())
}

fn cmd_matvec(name: &str, rows: usize, cols: usize, value: f32, store: Option<PathBuf>) -> Result<()> {
    let config = load_config(store)?;
    let acc = Accelerator::with_config(config)?;
    let store = acc.store()?;

    let m = store
        .load(name, rows, cols)
        .with_context(|| format!("Cannot load '{name}' as {rows}×{cols}"))?;
    let x = Vector::from_slice(&vec![value; cols])
        .with_context(|| format!("Column count {cols} is not a multiple of {LANE_WIDTH}"))?;

    let handle = acc.prepare(&m);
    let y = acc.compute_with_prepared(handle, &x)?;
    acc.release(handle);

    println!("{name} ({rows}×{cols}) · [{value}; {cols}]:");
    print_values(&y);
    if let Some(latency) = acc.status().stats.average_latency() {
        println!("avg op latency: {latency:?}");
    }
    Ok(())
}

fn cmd_identity(name: &str, size: usize, store: Option<PathBuf>) -> Result<()> {
    let config = load_config(store)?;
    config.validate()?;
    let store = MatrixStore::from_config(&config)?;
    let path = store.save(name, &Matrix::identity(size)?)?;
    println!("Saved {size}×{size} identity to {}", path.display());
    Ok(())
}
