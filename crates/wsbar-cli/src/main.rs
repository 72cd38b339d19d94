mod host;
mod ui;

use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::runtime::Runtime;
use wsbar_core::effective_worksheet_name;
use wsbar_core::new_worksheet_command;
use wsbar_core::ActionId;
use wsbar_core::SessionState;
use wsbar_core::ShellConfig;
use wsbar_core::UserAction;
use wsbar_exec::ShellDriver;

use crate::host::StatusNavigator;

const SESSION_ENV: &str = "WSBAR_SESSION";

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
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
            println!("wsbar {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "run" => {
            let options = parse_options(args.collect::<Vec<_>>())?;
            if !options.positional.is_empty() {
                return Err(format!("unsupported argument: {}", options.positional[0]).into());
            }
            let _log_guard = host::init_file_logging();
            run_tui(options)
        }
        "whoami" => {
            let options = parse_options(args.collect::<Vec<_>>())?;
            host::init_stderr_logging();
            whoami(options)
        }
        "new" => {
            let options = parse_options(args.collect::<Vec<_>>())?;
            host::init_stderr_logging();
            new_worksheet(options)
        }
        _ => {
            print_help();
            Err(format!("unknown command: {command}").into())
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    config: Option<PathBuf>,
    base_url: Option<String>,
    session: Option<String>,
    positional: Vec<String>,
}

fn parse_options(args: Vec<String>) -> Result<Options, Box<dyn Error>> {
    let mut options = Options::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                let Some(value) = args.get(i + 1) else {
                    return Err("--config requires a path".into());
                };
                options.config = Some(PathBuf::from(value));
                i += 2;
            }
            "--base-url" => {
                let Some(value) = args.get(i + 1) else {
                    return Err("--base-url requires a URL".into());
                };
                options.base_url = Some(value.clone());
                i += 2;
            }
            "--session" => {
                let Some(value) = args.get(i + 1) else {
                    return Err("--session requires a token".into());
                };
                options.session = Some(value.clone());
                i += 2;
            }
            flag if flag.starts_with("--") => {
                return Err(format!("unsupported argument: {flag}").into());
            }
            value => {
                options.positional.push(value.to_string());
                i += 1;
            }
        }
    }
    Ok(options)
}

fn load_config(options: &Options) -> Result<ShellConfig, Box<dyn Error>> {
    let mut config = match &options.config {
        Some(path) => ShellConfig::load(path)?,
        None => match dirs::config_dir() {
            Some(dir) => ShellConfig::load_or_default(&dir.join("wsbar").join("config.toml"))?,
            None => ShellConfig::default(),
        },
    };
    if let Some(base_url) = &options.base_url {
        config.api.base_url = base_url.clone();
    }
    Ok(config)
}

fn session_token(options: &Options) -> Option<String> {
    options
        .session
        .clone()
        .or_else(|| env::var(SESSION_ENV).ok())
        .filter(|token| !token.trim().is_empty())
}

fn build_runtime() -> std::io::Result<Runtime> {
    // One worker keeps requests moving while the UI thread blocks on input.
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
}

fn build_driver(
    options: &Options,
    runtime: &Runtime,
) -> Result<(ShellDriver, Arc<StatusNavigator>), Box<dyn Error>> {
    let config = load_config(options)?;
    let navigator = Arc::new(StatusNavigator::default());
    let session = session_token(options);
    let ports = host::build_ports(&config, session.as_deref(), Arc::clone(&navigator));
    let driver = ShellDriver::new(config, ports, runtime.handle().clone());
    Ok((driver, navigator))
}

fn run_tui(options: Options) -> Result<(), Box<dyn Error>> {
    let runtime = build_runtime()?;
    let (driver, navigator) = build_driver(&options, &runtime)?;
    ui::run(driver, navigator)
}

fn whoami(options: Options) -> Result<(), Box<dyn Error>> {
    let runtime = build_runtime()?;
    let (mut driver, _navigator) = build_driver(&options, &runtime)?;

    driver.mount();
    runtime.block_on(driver.settle());

    let state = driver.state();
    match state.session() {
        SessionState::Loaded(profile) => println!("{}", profile.user_name),
        _ if !state.is_authenticated() => println!("not signed in"),
        _ => println!("profile unavailable"),
    }
    driver.unmount();
    Ok(())
}

fn new_worksheet(options: Options) -> Result<(), Box<dyn Error>> {
    let runtime = build_runtime()?;
    let (mut driver, _navigator) = build_driver(&options, &runtime)?;
    let name = options.positional.join(" ");

    driver.mount();
    driver.handle(UserAction::Activate(ActionId::NewWorksheet));
    if !driver.state().dialog().is_open() {
        return Err(format!("not signed in: pass --session or set {SESSION_ENV}").into());
    }
    driver.handle(UserAction::EditWorksheetName(name.clone()));
    driver.handle(UserAction::ConfirmDialog);
    runtime.block_on(driver.settle());
    driver.unmount();

    println!(
        "sent: {}",
        new_worksheet_command(&effective_worksheet_name(&name))
    );
    Ok(())
}

fn print_help() {
    println!("wsbar {}", env!("CARGO_PKG_VERSION"));
    println!("Usage:");
    println!("  wsbar run [--config PATH] [--base-url URL] [--session TOKEN]");
    println!("  wsbar whoami [--config PATH] [--base-url URL] [--session TOKEN]");
    println!("  wsbar new [NAME] [--config PATH] [--base-url URL] [--session TOKEN]");
    println!("  wsbar --help");
    println!("  wsbar --version");
    println!();
    println!("The session token may also come from ${SESSION_ENV}.");
}
