use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Staged signature verification client
#[derive(Parser, Debug)]
#[command(
    name = "puresign",
    about = "Staged signature verification: detection, purification and scoring",
    version,
    author,
    long_about = "puresign submits a document image to the PureSign verification service, \
                  following it through signature detection, purification and scoring, and \
                  classifies the resulting confidence score as Verified, Uncertain or Failed. \
                  Detection can run on-device when an engine is available."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,

    #[arg(
        short = 'u',
        long,
        global = true,
        value_name = "USER_ID",
        help = "User identifier (overrides PURESIGN_USER_ID and the saved identity)"
    )]
    pub user: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Verify the signature in a document image",
        long_about = "Validates a PNG or JPEG document, submits it for verification and \
                      reports each stage with the final confidence score.\n\n\
                      Examples:\n  \
                      puresign verify contract.png\n  \
                      puresign verify scan.jpg --local\n  \
                      puresign verify scan.jpg --format json"
    )]
    Verify(VerifyArgs),

    #[command(about = "List past verifications")]
    History(FormatArgs),

    #[command(about = "Show the user profile")]
    Profile(FormatArgs),

    #[command(
        about = "Save the user identity",
        long_about = "Persists USER_ID so later commands run as that user.\n\n\
                      Example:\n  \
                      puresign login 3f8e2c1a-0000-4000-8000-000000000000"
    )]
    Login(LoginArgs),

    #[command(about = "Check verification service availability")]
    Health(FormatArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct VerifyArgs {
    #[arg(value_name = "FILE", help = "Document image (PNG or JPEG)")]
    pub file: PathBuf,

    #[arg(
        long,
        help = "Prefer on-device detection (falls back to the service when unavailable)"
    )]
    pub local: bool,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct FormatArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct LoginArgs {
    #[arg(value_name = "USER_ID", help = "Identifier of the user profile")]
    pub user_id: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args_verify() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_default_verify_args() {
        let args = CliArgs::parse_from(["puresign", "verify", "doc.png"]);
        match args.command {
            Commands::Verify(verify_args) => {
                assert_eq!(verify_args.file, PathBuf::from("doc.png"));
                assert_eq!(verify_args.format, OutputFormatArg::Human);
                assert!(!verify_args.local);
            }
            _ => panic!("Expected Verify command"),
        }
    }

    #[test]
    fn test_verify_with_options() {
        let args = CliArgs::parse_from([
            "puresign", "verify", "scan.jpg", "--local", "--format", "json",
        ]);
        match args.command {
            Commands::Verify(verify_args) => {
                assert!(verify_args.local);
                assert_eq!(verify_args.format, OutputFormatArg::Json);
            }
            _ => panic!("Expected Verify command"),
        }
    }

    #[test]
    fn test_verify_requires_file() {
        assert!(CliArgs::try_parse_from(["puresign", "verify"]).is_err());
    }

    #[test]
    fn test_login_command() {
        let args = CliArgs::parse_from(["puresign", "login", "alice"]);
        match args.command {
            Commands::Login(login_args) => assert_eq!(login_args.user_id, "alice"),
            _ => panic!("Expected Login command"),
        }
    }

    #[test]
    fn test_history_format() {
        let args = CliArgs::parse_from(["puresign", "history", "-f", "yaml"]);
        match args.command {
            Commands::History(format_args) => {
                assert_eq!(format_args.format, OutputFormatArg::Yaml)
            }
            _ => panic!("Expected History command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let args = CliArgs::parse_from(["puresign", "-v", "--user", "bob", "profile"]);
        assert!(args.verbose);
        assert!(!args.quiet);
        assert_eq!(args.user.as_deref(), Some("bob"));

        let args = CliArgs::parse_from(["puresign", "health", "-q"]);
        assert!(args.quiet);

        assert!(CliArgs::try_parse_from(["puresign", "-v", "-q", "health"]).is_err());
    }

    #[test]
    fn test_log_level_flag() {
        let args = CliArgs::parse_from(["puresign", "--log-level", "debug", "health"]);
        assert_eq!(args.log_level, Some("debug".to_string()));
    }
}
