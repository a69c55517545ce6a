use puresign::cli::commands::{CliArgs, Commands};
use puresign::cli::handlers::{
    handle_health, handle_history, handle_login, handle_profile, handle_verify,
};
use puresign::util::logging::{init_logging, level_from_flags, LoggingConfig};
use puresign::VERSION;

use clap::Parser;
use tracing::debug;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging(LoggingConfig::from_env(level_from_flags(
        args.log_level.as_deref(),
        args.verbose,
        args.quiet,
    )));

    debug!("puresign v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let user = args.user.as_deref();
    let exit_code = match &args.command {
        Commands::Verify(verify_args) => handle_verify(verify_args, user).await,
        Commands::History(format_args) => handle_history(format_args, user).await,
        Commands::Profile(format_args) => handle_profile(format_args, user).await,
        Commands::Login(login_args) => handle_login(login_args),
        Commands::Health(format_args) => handle_health(format_args).await,
    };

    std::process::exit(exit_code);
}
