use std::process::ExitCode;
use std::sync::Arc;

use relayd::cli::{self, CliAction};
use relayd::lifecycle::RunSummary;
use relayd::observability::{init_logging, LogHandle};
use relayd::{
    RelayFactory, ServiceHandle, SignalBridge, SignalCapabilities, Supervisor, SupervisorError,
};

fn main() -> ExitCode {
    let cli = match cli::parse_args(std::env::args_os()) {
        CliAction::Run(cli) => cli,
        CliAction::Exit { error, code } => {
            let _ = error.print();
            return ExitCode::from(code);
        }
    };

    let logs = init_logging("info");
    tracing::info!("Welcome to relayd {}", relayd::VERSION);

    let capabilities = SignalCapabilities::detect();
    let bridge = SignalBridge::new(Arc::new(ServiceHandle::new()), capabilities);
    if let Err(e) = bridge.install() {
        tracing::error!(error = %e, "fatal: failed to install signal handlers");
        tracing::error!("exiting...");
        return ExitCode::from(1);
    }
    tracing::debug!(reload = capabilities.reload, "Signal handlers installed");

    match run(&cli, bridge, logs.as_ref()) {
        Ok(summary) => {
            tracing::info!(generations = summary.generations, "Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(kind = e.as_label(), "fatal: {}", e);
            tracing::error!("exiting...");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(
    cli: &cli::Cli,
    bridge: SignalBridge,
    logs: Option<&LogHandle>,
) -> Result<RunSummary, SupervisorError> {
    let supervisor = Supervisor::bootstrap(&cli.config_source(), RelayFactory, bridge)?;
    if let Some(logs) = logs {
        logs.apply_level(&supervisor.config().log_level);
    }
    supervisor.run()
}
