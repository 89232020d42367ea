use clap::{Parser, Subcommand};
use lb_core::{Value, Variable};
use lb_engine::TaoProcess;
use lb_model::{
    LatticeModel, ModelError, StationStatus, export_output_file, load_config, open_model,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lb")]
#[command(
    about = "Lattice bridge - control-system variables over a Bmad/Tao lattice model",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a model file and its variable definitions
    Validate {
        /// Path to the model YAML file
        config: PathBuf,
    },
    /// List supported variables
    Variables {
        /// Path to the model YAML file
        config: PathBuf,
        /// List read-only outputs instead of controls
        #[arg(long)]
        outputs: bool,
    },
    /// Read cached values
    Get {
        /// Path to the model YAML file
        config: PathBuf,
        /// Variable names
        #[arg(required = true)]
        names: Vec<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Write control values and recompute the lattice
    Set {
        /// Path to the model YAML file
        config: PathBuf,
        /// Assignments as NAME=VALUE
        #[arg(required = true, value_parser = parse_assignment)]
        values: Vec<(String, f64)>,
        /// Variables to print after the write
        #[arg(long, num_args = 1..)]
        show: Vec<String>,
        /// Station status flags as PV=VALUE
        #[arg(long, value_parser = parse_assignment)]
        status: Vec<(String, f64)>,
    },
    /// Print the engine commands a write would issue, without evaluating them
    Commands {
        /// Path to the model YAML file
        config: PathBuf,
        /// Assignments as NAME=VALUE
        #[arg(required = true, value_parser = parse_assignment)]
        values: Vec<(String, f64)>,
        /// Station status flags as PV=VALUE
        #[arg(long, value_parser = parse_assignment)]
        status: Vec<(String, f64)>,
    },
    /// Regenerate an output definition file from the live lattice
    ExportOutputs {
        /// Path to the model YAML file
        config: PathBuf,
        /// Output YAML file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

type CliResult<T> = Result<T, CliError>;

fn parse_assignment(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing name in '{s}'"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("bad value in '{s}': {e}"))?;
    Ok((name.to_string(), value))
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config } => cmd_validate(&config),
        Commands::Variables { config, outputs } => cmd_variables(&config, outputs),
        Commands::Get {
            config,
            names,
            json,
        } => cmd_get(&config, &names, json),
        Commands::Set {
            config,
            values,
            show,
            status,
        } => cmd_set(&config, values, &show, status),
        Commands::Commands {
            config,
            values,
            status,
        } => cmd_commands(&config, values, status),
        Commands::ExportOutputs { config, output } => cmd_export_outputs(&config, &output),
    }
}

fn cmd_validate(config_path: &Path) -> CliResult<()> {
    println!("Validating model: {}", config_path.display());
    let config = load_config(config_path)?;
    let catalog = config.load_catalog()?;
    println!("✓ Model '{}' is valid", config.name);
    println!("  Facility: {:?}", config.facility);
    println!("  Beam path: {}", config.beam_path);
    println!("  Controls: {}", catalog.controls.len());
    println!("  Outputs: {}", catalog.outputs.len());
    if let Some(policy) = &config.status_override {
        println!(
            "  Status override: beam paths '{}*', beam code {}",
            policy.beam_path_prefix, policy.beam_code
        );
    }
    Ok(())
}

fn cmd_variables(config_path: &Path, outputs: bool) -> CliResult<()> {
    let config = load_config(config_path)?;
    let catalog = config.load_catalog()?;
    let variables = if outputs {
        &catalog.outputs
    } else {
        &catalog.controls
    };
    for variable in variables.values() {
        println!("{}", describe(variable));
    }
    Ok(())
}

fn describe(variable: &Variable) -> String {
    let mut line = variable.name.clone();
    if !variable.unit.is_empty() {
        line.push_str(&format!(" [{}]", variable.unit));
    }
    if let Some((min, max)) = variable.value_range {
        line.push_str(&format!(" range=[{min}, {max}]"));
    }
    if variable.read_only {
        line.push_str(" (read-only)");
    }
    line
}

fn cmd_get(config_path: &Path, names: &[String], json: bool) -> CliResult<()> {
    let model = open_model(config_path)?;
    let values = model.get(names)?;
    print_values(&values, json)
}

fn cmd_set(
    config_path: &Path,
    values: Vec<(String, f64)>,
    show: &[String],
    status: Vec<(String, f64)>,
) -> CliResult<()> {
    let mut model = open_model(config_path)?;
    apply_status(&mut model, status);
    let count = values.len();
    model.set(values)?;
    println!("✓ Applied {count} value(s)");
    if !show.is_empty() {
        print_values(&model.get(show)?, false)?;
    }
    Ok(())
}

fn cmd_commands(
    config_path: &Path,
    values: Vec<(String, f64)>,
    status: Vec<(String, f64)>,
) -> CliResult<()> {
    let mut model = open_model(config_path)?;
    apply_status(&mut model, status);
    for command in model.commands(values)? {
        println!("{command}");
    }
    Ok(())
}

fn cmd_export_outputs(config_path: &Path, output: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let base = config_path.parent().unwrap_or_else(|| Path::new("."));
    let options = config.tao_options(base)?;
    let mut engine = TaoProcess::spawn(&options).map_err(ModelError::from)?;
    let elements = export_output_file(&mut engine, output)?;
    println!("✓ Wrote {elements} elements to {}", output.display());
    Ok(())
}

fn apply_status(model: &mut LatticeModel<TaoProcess>, status: Vec<(String, f64)>) {
    if !status.is_empty() {
        model.set_station_status(status.into_iter().collect::<StationStatus>());
    }
}

fn print_values(values: &BTreeMap<String, Value>, json: bool) -> CliResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(values)?);
    } else {
        for (name, value) in values {
            println!("{name} = {value}");
        }
    }
    Ok(())
}
