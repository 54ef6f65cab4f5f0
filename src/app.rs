//! Main application orchestration and execution

use crate::{
    config::display_config_summary,
    dns::Resolver,
    error::{AppError, Result},
    executor::{random_identifier, Pinger},
    logging::LoggerFactory,
    models::{Config, RunConfig, RunReport},
    output::{OutputCoordinator, OutputFormatterFactory},
    stats::RunStatistics,
    transport::{IcmpSocket, PacketTransport},
};
use std::io::Write;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// What a finished run leaves behind
pub struct RunOutcome<W> {
    pub report: RunReport,
    /// `None` when no probe was sent
    pub statistics: Option<RunStatistics>,
    /// The sink the run was printed to
    pub output: W,
}

/// Main application struct that coordinates all components
pub struct App {
    config: Config,
    identifier: u16,
    coordinator: Arc<OutputCoordinator>,
    loggers: LoggerFactory,
}

impl App {
    /// Create a new application instance from a validated configuration
    pub fn new(config: Config) -> Self {
        let identifier = random_identifier();
        let formatter = OutputFormatterFactory::create_formatter(config.enable_color, config.verbose);
        let loggers = LoggerFactory::new(config.clone(), format!("{:04x}", identifier));
        Self {
            config,
            identifier,
            coordinator: Arc::new(OutputCoordinator::new(formatter)),
            loggers,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve, open the raw socket and probe until the run ends, printing
    /// to stdout
    pub async fn run(self) -> Result<RunOutcome<std::io::Stdout>> {
        let logger = self.loggers.create_logger("APP");
        logger
            .debug("Configuration loaded")
            .field("summary", display_config_summary(&self.config))
            .log();

        let resolver = Resolver::from_config(&self.config)?;
        let address = resolver.resolve(&self.config.destination).await?;
        logger
            .info("Destination resolved")
            .field("destination", &self.config.destination)
            .field("address", address.to_string())
            .log();

        let run_config = RunConfig::from_config(&self.config, address);
        let socket = IcmpSocket::open(run_config.ip_version(), run_config.ttl, run_config.payload_size)?;

        self.execute(run_config, Arc::new(socket), std::io::stdout()).await
    }

    /// Run against an already resolved destination over `transport`,
    /// writing every line to `out`
    ///
    /// Ctrl-C cancels the run; the statistics are still printed.
    pub async fn execute<T, W>(&self, run_config: RunConfig, transport: Arc<T>, mut out: W) -> Result<RunOutcome<W>>
    where
        T: PacketTransport + 'static,
        W: Write + Send + 'static,
    {
        let header = self.coordinator.display_header(
            &self.config.destination,
            run_config.destination,
            run_config.payload_size,
        );
        write_line(&mut out, &header)?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let engine_logger = Arc::new(self.loggers.create_logger("ENGINE"));
        let pinger = Pinger::new(run_config, transport, events_tx)
            .with_identifier(self.identifier)
            .with_logger(engine_logger);

        let token = pinger.shutdown_token();
        let interrupt = tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if result.is_ok() {
                        token.cancel();
                    }
                }
                _ = token.cancelled() => {}
            }
        });

        let coordinator = self.coordinator.clone();
        let printer = tokio::spawn(async move {
            let result = coordinator.drain_events(events_rx, &mut out).await;
            (result, out)
        });

        let report = pinger.run().await?;
        let reduced_at = Instant::now();
        interrupt.abort();

        let (printed, mut out) = printer
            .await
            .map_err(|e| AppError::internal(format!("Output task failed: {}", e)))?;
        printed?;

        let statistics = RunStatistics::reduce(&report, reduced_at);
        if let Some(ref stats) = statistics {
            write_line(&mut out, "")?;
            for line in self.coordinator.display_statistics(stats) {
                write_line(&mut out, &line)?;
            }
        }

        Ok(RunOutcome {
            report,
            statistics,
            output: out,
        })
    }

    /// Run parameters for an already resolved destination
    pub fn destination_config(&self, address: IpAddr) -> RunConfig {
        RunConfig::from_config(&self.config, address)
    }
}

fn write_line<W: Write>(out: &mut W, line: &str) -> Result<()> {
    writeln!(out, "{}", line)
        .and_then(|_| out.flush())
        .map_err(|e| AppError::io(format!("Failed to write output: {}", e)))
}
