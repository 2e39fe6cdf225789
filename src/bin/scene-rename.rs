use std::env;
use std::io;
use std::process;
use clap::error::ErrorKind;
use tracing::info;
use tracing_subscriber::EnvFilter;
use scene_rename::cli::{self, Cli};
use scene_rename::scene::{Format, Scene};

/// Exit status for argument, import and export failures.
const FAILURE: i32 = -1;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn run(cli: &Cli) -> Result<(), String> {
    let mut scene = Scene::import(&cli.input)
        .map_err(|e| format!("Error importing '{}': {}", cli.input.display(), e))?;

    for report in scene.rename(&cli.operations, cli.mode) {
        for line in report.messages() {
            println!("{}", line);
        }
    }

    if cli.binary && scene.format() == Format::Binary {
        info!("{} is already binary", cli.input.display());
    }
    let format = cli.output_format(scene.format());
    scene.export(&cli.output, format)
        .map_err(|e| format!("Error exporting '{}': {}", cli.output.display(), e))?;

    println!("Modified file saved as '{}'.", cli.output.display());
    Ok(())
}

fn main() {
    init_tracing();

    let cli = match cli::parse_from(env::args_os()) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => process::exit(0),
                _ => process::exit(FAILURE),
            }
        },
    };

    if let Err(msg) = run(&cli) {
        eprintln!("{}", msg);
        process::exit(FAILURE);
    }
}
