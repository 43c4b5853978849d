use std::env;
use std::fs;
use std::path::PathBuf;

use chrono::Utc;

use obi_core::actions::Action;
use obi_core::actions::Effect;
use obi_core::actions::RuntimeAction;
use obi_core::config::Config;
use obi_core::persistence::StateStore;
use obi_core::reducer::reduce;
use obi_core::state::AppState;
use obi_core::state::StudyState;

mod ui;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let Some(command) = args.next() else {
        print_help();
        return Ok(());
    };

    match command.as_str() {
        "--help" | "-h" | "help" => {
            print_help();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("obi {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "run" => {
            let options = parse_run_args(args.collect::<Vec<_>>())?;
            run_app(options)
        }
        "reset" => {
            let options = parse_run_args(args.collect::<Vec<_>>())?;
            let store = StateStore::open(resolve_data_dir(options.data_dir))?;
            store.wipe()?;
            println!("study state cleared");
            Ok(())
        }
        _ => {
            print_help();
            Err(format!("unknown command: {command}").into())
        }
    }
}

struct RunOptions {
    data_dir: Option<PathBuf>,
    /// Administrative study-day override; the counter never advances on
    /// its own.
    day: Option<u32>,
}

fn parse_run_args(args: Vec<String>) -> Result<RunOptions, Box<dyn std::error::Error>> {
    let mut options = RunOptions {
        data_dir: None,
        day: None,
    };
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--data-dir" => {
                let Some(value) = args.get(i + 1) else {
                    return Err("--data-dir requires a path".into());
                };
                options.data_dir = Some(PathBuf::from(value));
                i += 2;
            }
            "--day" => {
                let Some(value) = args.get(i + 1) else {
                    return Err("--day requires a number".into());
                };
                options.day = Some(value.parse()?);
                i += 2;
            }
            other => {
                return Err(format!("unsupported argument: {other}").into());
            }
        }
    }
    Ok(options)
}

fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| dirs::data_dir().map(|dir| dir.join("obi")))
        .unwrap_or_else(|| PathBuf::from(".obi"))
}

fn load_config() -> Config {
    let mut config = dirs::config_dir()
        .map(|dir| dir.join("obi").join("config.toml"))
        .filter(|path| path.exists())
        .and_then(|path| fs::read_to_string(path).ok())
        .and_then(|raw| match toml::from_str::<Config>(&raw) {
            Ok(config) => Some(config),
            Err(err) => {
                log::warn!("config unreadable, using defaults: {err}");
                None
            }
        })
        .unwrap_or_default();
    if let Ok(key) = env::var("OBI_API_KEY") {
        if !key.is_empty() {
            config.insight.api_key = Some(key);
        }
    }
    config
}

fn run_app(options: RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let store = StateStore::open(resolve_data_dir(options.data_dir))?;
    let study = match store.load() {
        Ok(Some(study)) => study,
        Ok(None) => StudyState::new(Utc::now()),
        Err(err) => {
            log::warn!("persisted state unreadable, starting fresh: {err}");
            StudyState::new(Utc::now())
        }
    };

    let mut state = AppState::new(study);
    if let Some(day) = options.day {
        let effects = reduce(&mut state, Action::Runtime(RuntimeAction::SetDay(day)));
        if effects.contains(&Effect::SaveState) {
            store.save(&state.study)?;
        }
    }

    let config = load_config();
    let insight = obi_insight::InsightClient::new(config.insight);
    ui::run(state, store, insight)
}

fn print_help() {
    println!(
        "obi - guided data collection for an obesity intervention study\n\
         \n\
         USAGE:\n\
         \x20 obi run [--data-dir <path>] [--day <n>]\n\
         \x20 obi reset [--data-dir <path>]\n\
         \x20 obi help | version\n\
         \n\
         COMMANDS:\n\
         \x20 run     Start the participant client\n\
         \x20 reset   Wipe all persisted study state\n\
         \n\
         OPTIONS:\n\
         \x20 --data-dir <path>  Where study state is stored\n\
         \x20 --day <n>          Administrative override of the study day"
    );
}
