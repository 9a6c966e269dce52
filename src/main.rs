//! QueryGenie chat service entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Parse CLI flags
//!   3. Load config
//!   4. Resolve effective log level (CLI `-v` flags > env > config)
//!   5. Init logger once
//!   6. Build the chat router (classifier, resolvers, generative backend)
//!   7. Spawn Ctrl-C → shutdown signal watcher
//!   8. Serve HTTP (and the console with `-i`) until shutdown

use std::sync::Arc;

use querygenie::chat::ChatRouter;
use querygenie::{comms, config, error, logger};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), error::AppError> {
    // Optional file.
    let _ = dotenvy::dotenv();

    let args = parse_cli_args();

    let config = config::load(args.config_path.as_deref())?;

    let effective_log_level = args.log_level.unwrap_or(config.server.log_level.as_str());
    let force_cli_level = args.log_level.is_some();
    if !force_cli_level {
        logger::parse_level(effective_log_level)?;
    }

    logger::init(effective_log_level, force_cli_level, config.server.log_file.as_deref())?;

    info!(
        bind = %config.server.bind,
        configured_log_level = %config.server.log_level,
        effective_log_level = %effective_log_level,
        interactive = %args.interactive,
        "config loaded"
    );

    let chat = Arc::new(ChatRouter::from_config(&config)?);

    // Shared shutdown token: Ctrl-C cancels it, every channel watches it.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, shutting down");
            ctrlc_token.cancel();
        }
    });

    print_startup_summary(&config, &chat, args.interactive);

    comms::run(&config.server.bind, chat, args.interactive, shutdown.clone()).await?;
    shutdown.cancel();

    if args.interactive {
        use std::io::Write as _;
        println!("\nBye :) ...");
        let _ = std::io::stdout().flush();
    }

    Ok(())
}

fn print_startup_summary(config: &config::Config, chat: &ChatRouter, interactive: bool) {
    let fit = |text: String| -> String {
        const WIDTH: usize = 58;
        if text.chars().count() >= WIDTH {
            let mut out = text.chars().take(WIDTH - 1).collect::<String>();
            out.push('…');
            out
        } else {
            format!("{text:<WIDTH$}")
        }
    };

    let mode_text = if interactive { "interactive" } else { "daemon" };

    let llm_line = match chat.provider_name() {
        "cohere" => format!(
            "provider=cohere model={} timeout={}s",
            config.llm.cohere.model, config.llm.cohere.timeout_seconds
        ),
        "openai" => format!(
            "provider=openai model={} temp={} timeout={}s",
            config.llm.openai.model, config.llm.openai.temperature, config.llm.openai.timeout_seconds
        ),
        other => format!("provider={other}"),
    };
    let key_line = format!(
        "llm key: {}  alphavantage key: {}",
        if config.llm_api_key.is_some() { "set" } else { "unset" },
        if config.alphavantage_api_key == "demo" { "demo" } else { "set" },
    );
    let resolver_line = format!(
        "backend={} timeout={}s summary={} chars",
        chat.resolver_backend(),
        config.resolvers.timeout_seconds,
        config.resolvers.summary_limit
    );
    let nlp_line = match &config.nlp.endpoint {
        Some(endpoint) if config.nlp.recognizer == "remote" => format!("recognizer=remote {endpoint}"),
        _ => format!("recognizer={}", config.nlp.recognizer),
    };

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ 🔎 QueryGenie Status                                         ║");
    println!("╟──────────────────────────────────────────────────────────────╢");
    println!("║ 🧠 PID: {:<52}║", std::process::id());
    println!("║ 🛰️  Mode: {:<51}║", mode_text);
    println!("║ 🌐 HTTP: {:<51}║", config.server.bind);
    println!("╟──────────────────────────────────────────────────────────────╢");
    println!("║ 🤖 LLM                                                       ║");
    println!("║   {}║", fit(llm_line));
    println!("║   {}║", fit(key_line));
    println!("╟──────────────────────────────────────────────────────────────╢");
    println!("║ 📚 Resolvers                                                 ║");
    println!("║   {}║", fit(resolver_line));
    println!("╟──────────────────────────────────────────────────────────────╢");
    println!("║ 🏷️  NLP                                                       ║");
    println!("║   {}║", fit(nlp_line));
    println!("║   {}║", fit(format!("history tail={}", config.chat.tail_len)));
    println!("╚══════════════════════════════════════════════════════════════╝");

    if interactive {
        println!("💡 Type /help for help");
    }
}

struct CliArgs {
    log_level: Option<&'static str>,
    interactive: bool,
    config_path: Option<String>,
}

fn parse_cli_args() -> CliArgs {
    let mut verbosity = 0u8;
    let mut interactive = false;
    let mut config_path = None;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: querygenie [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -i, --interactive          Also run a console channel on stdin/stdout");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("  -v, -vv, -vvv, -vvvv       Increase logging verbosity");
                std::process::exit(0);
            }
            "-i" | "--interactive" => interactive = true,
            "-f" | "--config" => {
                if let Some(path) = iter.next() {
                    config_path = Some(path);
                } else {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a if a.starts_with('-') && a.len() > 1 && a.chars().skip(1).all(|c| c == 'v') => {
                verbosity = verbosity.saturating_add((a.len() - 1) as u8);
            }
            _ => {}
        }
    }

    //   -v      → warn
    //   -vv     → info
    //   -vvv    → debug  (routing decisions, resolver queries)
    //   -vvvv+  → trace  (full outbound payloads)
    let log_level = match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    };

    CliArgs { log_level, interactive, config_path }
}
