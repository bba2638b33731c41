use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use logtally_daemon::cli::DaemonCli;
use logtally_daemon::error::DaemonError;

fn main() -> ExitCode {
    let cli = DaemonCli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let daemon_err = e.downcast_ref::<DaemonError>();
            // A refused start has already told the terminal why.
            if !matches!(daemon_err, Some(DaemonError::AlreadyRunning { .. })) {
                eprintln!("logtally-daemon: {e:#}");
            }
            tracing::error!(error = %e, "logtally-daemon exiting with error");
            let code = daemon_err.map_or(1, DaemonError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

#[cfg(unix)]
fn run(cli: &DaemonCli) -> Result<()> {
    use logtally_daemon::detach::{Daemonizer, Foreground};
    use logtally_daemon::lifecycle::{Lifecycle, LifecycleConfig};
    use logtally_daemon::logging;

    let config = cli.resolve_config()?;
    logging::init_tracing(&config.general)?;
    tracing::info!(level = %config.general.log_level, "logger initialized");

    let lifecycle_config = LifecycleConfig::new(&config.general.pid_file);
    if cli.foreground {
        unix::dispatch(
            cli.action,
            &config,
            Lifecycle::new(lifecycle_config, Foreground::new()),
        )
    } else {
        let daemonizer = Daemonizer::new(&config.general.output_file, &config.general.error_file);
        unix::dispatch(
            cli.action,
            &config,
            Lifecycle::new(lifecycle_config, daemonizer),
        )
    }
}

#[cfg(not(unix))]
fn run(_cli: &DaemonCli) -> Result<()> {
    Err(anyhow::anyhow!("logtally-daemon requires a Unix platform"))
}

#[cfg(unix)]
mod unix {
    use anyhow::Result;

    use logtally_core::config::LogtallyConfig;
    use logtally_core::error::LogtallyError;
    use logtally_core::pipeline::Runnable;
    use logtally_daemon::cli::Action;
    use logtally_daemon::detach::Detach;
    use logtally_daemon::error::DaemonError;
    use logtally_daemon::lifecycle::{Lifecycle, StopOutcome};
    use logtally_daemon::metrics_server;
    use logtally_log_pipeline::{TallyConfig, TallyPipelineBuilder};

    pub(crate) fn dispatch<D: Detach>(
        action: Action,
        config: &LogtallyConfig,
        lifecycle: Lifecycle<D>,
    ) -> Result<()> {
        match action {
            Action::Start => {
                tracing::info!(log_file = %config.tail.log_file, "starting daemon");
                let mut task = tally_task(config)?;
                lifecycle.start(&mut task)?;
            }
            Action::Stop => {
                tracing::info!(log_file = %config.tail.log_file, "stopping daemon");
                if let StopOutcome::Stopped { pid } = lifecycle.stop()? {
                    tracing::info!(pid, "stop complete");
                }
            }
            Action::Restart => {
                tracing::info!(log_file = %config.tail.log_file, "restarting daemon");
                let mut task = tally_task(config)?;
                lifecycle.restart(&mut task)?;
            }
        }
        Ok(())
    }

    /// Build the tally loop that runs once the process has detached.
    ///
    /// The pipeline is built up front so configuration errors reach the
    /// invoking terminal; the metrics exporter starts its thread only
    /// inside the task.
    fn tally_task(config: &LogtallyConfig) -> Result<impl Runnable, DaemonError> {
        let mut pipeline = TallyPipelineBuilder::new()
            .config(TallyConfig::from_core(config))
            .build()?;
        let metrics = config.metrics.clone();

        Ok(move || -> Result<(), LogtallyError> {
            if metrics.enabled {
                if let Err(e) = metrics_server::install_metrics_recorder(&metrics) {
                    tracing::error!(error = %e, "metrics endpoint unavailable, continuing without it");
                }
            }
            pipeline.run()
        })
    }
}
