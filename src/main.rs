use std::process::ExitCode;

use tracing::{error, info};

use hntldr::app::{parse_args, Command, USAGE};
use hntldr::{Application, Config};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    // Load configuration
    let config = match Config::load_with_env(&args.config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", args.config_path.display());
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = hntldr::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        hntldr::logging::init_console_only(&config.logging.level);
    }

    // Only the web server needs the signing and captcha secrets
    if matches!(args.command, Command::Serve) {
        if let Err(e) = config.validate() {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    }

    info!("HNTLDR - Hacker News TL;DR ({:?})", args.command);

    let app = match Application::open(config).await {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to open database: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = app.execute(args.command).await;
    app.db().close().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Command failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
