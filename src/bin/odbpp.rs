use clap::Parser;
use env_logger::Env;
use odbpp::project::project;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "odbpp")]
#[command(about = "ODB++ PCB fabrication archive parser and JSON projector", long_about = None)]
#[command(version)]
struct Cli {
    /// ODB++ archive (.tgz/.tar.gz/.zip) or extracted directory
    #[arg(value_hint = clap::ValueHint::FilePath)]
    input: PathBuf,

    /// Step name to parse (default: first step in the archive)
    #[arg(short, long)]
    step: Option<String>,

    /// List available steps and exit
    #[arg(long)]
    list_steps: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(if cli.verbose { "debug" } else { "warn" })).init();

    if !cli.input.exists() {
        eprintln!("Error: {} not found", cli.input.display());
        return ExitCode::FAILURE;
    }

    if cli.list_steps {
        return match odbpp::list_steps(&cli.input) {
            Ok(steps) if steps.is_empty() => {
                println!("No steps found in {}", cli.input.display());
                ExitCode::SUCCESS
            }
            Ok(steps) => {
                println!("Steps in {}:", cli.input.display());
                for s in steps {
                    println!("  {s}");
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let model = match odbpp::parse(&cli.input, cli.step.as_deref()) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Error parsing ODB++: {e}");
            if cli.verbose {
                let mut source = std::error::Error::source(&e);
                while let Some(s) = source {
                    eprintln!("  caused by: {s}");
                    source = s.source();
                }
            }
            return ExitCode::FAILURE;
        }
    };

    log::info!("layers: {}", model.layers.len());
    log::info!("nets: {}", model.nets.len());
    log::info!("components: {}", model.components.len());
    log::info!("traces: {}", model.traces.len());
    log::info!("arcs: {}", model.arcs.len());
    log::info!("vias: {}", model.vias.len());
    log::info!("zones: {}", model.zones.len());

    let projected = project(&model);
    match serde_json::to_writer(std::io::stdout(), &projected) {
        Ok(()) => {
            println!();
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error writing JSON: {e}");
            ExitCode::FAILURE
        }
    }
}
