use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use sideline::{agents, frame_error, invoke, AppConfig, EngineRuntime, Rendered};

const CONFIG_FILE: &str = "sideline.toml";

const USAGE: &str = "Usage: sideline invoke <message> [context_json]\n       sideline agents";

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout is reserved for the sentinel protocol.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("invoke") => run_invoke(&args[1..]).await,
        Some("agents") => list_agents(),
        _ => usage(),
    }
}

fn load_config() -> sideline::Result<AppConfig> {
    if Path::new(CONFIG_FILE).exists() {
        AppConfig::from_env_or_file(CONFIG_FILE)
    } else {
        Ok(AppConfig::from_env())
    }
}

async fn run_invoke(args: &[String]) -> ExitCode {
    let Some(message) = args.first() else {
        return usage();
    };
    let context_json = args.get(1).map(String::as_str);

    let rendered = match prepare() {
        Ok((agent, runtime)) => invoke(&runtime, &agent, message, context_json).await,
        Err(err) => Rendered {
            stdout: frame_error(&format!("Error: {err}")),
            exit_code: 1,
        },
    };
    emit(rendered)
}

fn prepare() -> sideline::Result<(sideline::AgentDescriptor, EngineRuntime)> {
    let config = load_config()?;
    let agent = agents::by_name(&config.agent, &config)?;
    let runtime = EngineRuntime::new(&config.engine)?;
    Ok((agent, runtime))
}

fn list_agents() -> ExitCode {
    match load_config().and_then(|config| agents::catalog(&config)) {
        Ok(catalog) => {
            for agent in catalog {
                println!("{}", agent.name);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn usage() -> ExitCode {
    emit(Rendered {
        stdout: frame_error(USAGE),
        exit_code: 1,
    })
}

fn emit(rendered: Rendered) -> ExitCode {
    print!("{}", rendered.stdout);
    let _ = std::io::stdout().flush();
    ExitCode::from(rendered.exit_code as u8)
}
