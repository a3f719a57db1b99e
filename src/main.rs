//! SQLFlow - conversational text-to-SQL in the terminal.

use sqlflow::cli::Cli;
use sqlflow::config::{Config, Configuration};
use sqlflow::error::{Result, SqlFlowError};
use sqlflow::llm::{key_from_env, LlmProvider};
use sqlflow::logging;
use sqlflow::session::SessionContext;
use sqlflow::tui::Tui;
use std::io::IsTerminal;
use tracing::{error, info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();

    let interactive = std::io::stdout().is_terminal();
    if interactive {
        logging::init_file_logging();
    } else {
        logging::init_stderr_logging();
    }

    if let Err(e) = run(interactive).await {
        error!("{}: {}", e.category(), e);
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn run(interactive: bool) -> Result<()> {
    let cli = Cli::parse_args();

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let file = Config::load_from_file(&config_path)?;

    let mut llm_config = file.llm.clone();
    cli.apply_llm(&mut llm_config);

    // Precedence: form defaults < environment < config file < CLI.
    let mut config = Configuration::default();
    config.apply_env_defaults();
    config.apply_section(&file.connection);
    cli.apply_to(&mut config)?;

    match llm_config.provider.parse::<LlmProvider>() {
        Ok(provider) => {
            if let Some(key) = key_from_env(provider) {
                config.api_key = key;
            }
        }
        Err(e) => warn!("{e}"),
    }

    info!(
        "Starting with provider {} and {}",
        llm_config.provider,
        config.display_string()
    );

    if !interactive {
        return Err(SqlFlowError::internal(
            "sqlflow needs an interactive terminal.",
        ));
    }

    let session = SessionContext::new(config, llm_config);
    let mut tui = Tui::new(session)?;
    tui.run().await
}
