//! Command-line interface.
//!
//! `--help` exits with status 1, as does any usage error. clap reports both
//! as errors from `try_parse_from`, and [`parse_args`] picks the exit code.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::Parser;

use crate::config::ConfigSource;

#[derive(Parser, Debug)]
#[command(name = "relayd")]
#[command(version, about = "Supervised TCP relay daemon", long_about = None)]
pub struct Cli {
    /// Config file path (JSON, or TOML with a .toml extension)
    #[arg(long = "configFile", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Config JSON string (ignored when --configFile is given)
    #[arg(long = "configJson", value_name = "JSON")]
    pub config_json: Option<String>,
}

impl Cli {
    pub fn config_source(&self) -> ConfigSource {
        ConfigSource::select(self.config_file.as_deref(), self.config_json.as_deref())
    }
}

/// What `main` should do after parsing the command line.
#[derive(Debug)]
pub enum CliAction {
    Run(Cli),
    /// Print `error` (help, version or usage error) and exit with `code`.
    Exit { error: clap::Error, code: u8 },
}

pub fn parse_args<I, T>(args: I) -> CliAction
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => CliAction::Run(cli),
        Err(error) => {
            let code = match error.kind() {
                ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            CliAction::Exit { error, code }
        }
    }
}
