use clap::{Arg, Command};
use colored::Colorize;
use shellhit::command_router::CommandRouter;
use shellhit::config::Config;
use shellhit::elevation::{self, ElevationStatus, SystemPrivileges};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("shellhit")
        .about("Interactive shell that turns plain-language requests into Windows commands")
        .long_about(
            "Runs cd, pwd, ls, mkdir, rm and exit directly; any other input is translated \
             into a Windows command by a generative model and executed",
        )
        .arg(Arg::new("set-api-key")
            .long("set-api-key")
            .help("Save the Gemini API key to the config file")
            .value_name("API_KEY")
            .num_args(1))
        .arg(Arg::new("config")
            .long("config")
            .help("Show configuration information")
            .action(clap::ArgAction::SetTrue))
        .arg(Arg::new("no-elevate")
            .long("no-elevate")
            .help("Do not request administrator privileges")
            .action(clap::ArgAction::SetTrue))
        .get_matches();

    let mut config = Config::load()?;

    // Handle configuration commands
    if let Some(api_key) = matches.get_one::<String>("set-api-key") {
        config.set_api_key(api_key.clone())?;
        println!("{}", "API key saved successfully".green());
        return Ok(());
    }

    if matches.get_flag("config") {
        config.show_config_info()?;
        return Ok(());
    }

    let require_elevation = config.require_elevation && !matches.get_flag("no-elevate");
    let announce = || println!("{}", "Requesting admin privileges...".yellow());
    match elevation::ensure_elevated(&SystemPrivileges, require_elevation, announce) {
        Ok(ElevationStatus::Relaunched) => {
            info!("Elevated instance started, exiting");
            return Ok(());
        }
        Ok(_) => {}
        Err(e) => {
            eprintln!("{} {:#}", "Failed to restart with admin privileges:".red(), e);
            eprintln!("{}", "Continuing without administrator rights.".yellow());
        }
    }

    if config.get_api_key().is_none() && !config.is_mock_mode() {
        eprintln!(
            "{}",
            "No API_KEY found (.env or config file); AI translation is disabled, built-ins still work."
                .yellow()
        );
    }

    let mut router = CommandRouter::from_config(&config)?;
    let stdin = std::io::stdin();
    router
        .run(&mut stdin.lock(), &mut std::io::stdout(), &mut std::io::stderr())
        .await
}
