use anyhow::Result;
use std::{env, path::PathBuf, process};
use surface_relay_config::Config;

mod scenario;

use scenario::{Replay, Scenario};

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} replay <scenario.json> [--config <path>]");
    eprintln!("       {program} init-config [path]");
    process::exit(1);
}

/// Resolve the config: an explicit `--config` must exist, the default
/// location may be absent.
fn load_config(explicit: Option<PathBuf>) -> Config {
    match explicit {
        Some(path) => match Config::load_from_path(&path) {
            Ok(Some(config)) => config,
            Ok(None) => {
                eprintln!("Error: Config file '{}' does not exist", path.display());
                process::exit(1);
            }
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        },
        None => match Config::load() {
            Ok(Some(config)) => config,
            Ok(None) => Config::default(),
            Err(e) => {
                eprintln!("Error: Failed to load config file: {e}");
                eprintln!("Fix or remove {}", Config::config_path().display());
                process::exit(1);
            }
        },
    }
}

fn init_logging(config: &Config) {
    // RUST_LOG still wins over the configured level
    let level = config.level_filter().unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn print_replay(replay: &Replay) {
    for message in &replay.outbound {
        println!("{message}");
    }
    println!("value: {}", describe(replay.value.as_deref()));
    println!("text: {}", describe(replay.text.as_deref()));
    println!("clipboard: {}", describe(replay.clipboard.as_deref()));
}

fn describe(content: Option<&str>) -> String {
    match content {
        Some(content) => format!("{content:?}"),
        None => "(none)".to_string(),
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("surface-relay-cli");

    match args.get(1).map(String::as_str) {
        Some("replay") => {
            let mut scenario_path = None;
            let mut config_path = None;
            let mut rest = args[2..].iter();
            while let Some(arg) = rest.next() {
                match arg.as_str() {
                    "--config" => match rest.next() {
                        Some(path) => config_path = Some(PathBuf::from(path)),
                        None => usage(program),
                    },
                    _ if scenario_path.is_none() => scenario_path = Some(PathBuf::from(arg)),
                    _ => usage(program),
                }
            }
            let Some(scenario_path) = scenario_path else {
                usage(program);
            };

            let config = load_config(config_path);
            init_logging(&config);

            let scenario = Scenario::load(&scenario_path)?;
            log::info!(
                "Replaying {} command(s) from {}",
                scenario.commands.len(),
                scenario_path.display()
            );
            let replay = scenario.replay(&config)?;
            print_replay(&replay);
        }
        Some("init-config") => {
            let path = match args.len() {
                2 => Config::config_path(),
                3 => PathBuf::from(&args[2]),
                _ => usage(program),
            };
            if path.exists() {
                eprintln!("Error: '{}' already exists", path.display());
                process::exit(1);
            }
            Config::default().save_to_path(&path)?;
            println!("Wrote default config to {}", path.display());
        }
        _ => usage(program),
    }

    Ok(())
}
