pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, Commands, FormatArgs, LoginArgs, OutputFormatArg, VerifyArgs};
pub use output::{OutputFormat, OutputFormatter};
