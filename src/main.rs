//! ping-probe - Main CLI Application
//!
//! Probes a destination with ICMP echo requests and prints per-reply
//! round-trip times followed by loss and latency statistics.

use clap::Parser;
use ping_probe::{
    app::App,
    cli::Cli,
    config::load_config,
    error::{AppError, ErrorReporter, Result},
    PKG_NAME, VERSION,
};
use std::process;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(99);
    }));

    let cli = Cli::parse();
    let reporter = ErrorReporter::new(cli.use_colors(), cli.verbose || cli.debug);

    if let Err(e) = run_application(cli).await {
        reporter.report_error(&e);
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run_application(cli: Cli) -> Result<()> {
    if cli.debug {
        eprintln!("{} v{}", PKG_NAME, VERSION);
        eprintln!("Debug mode enabled");
    }

    let config = load_config(cli)?;

    // A receiver failure is printed as it happens and the run still ends
    // with statistics, so only setup errors reach the caller
    App::new(config).run().await?;
    Ok(())
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) | AppError::Validation(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Check your .env file and PING_* environment variables");
            eprintln!("  - Intervals and deadlines are seconds, e.g. 0.2");
            eprintln!("  - Run with --help for the accepted ranges");
        }
        AppError::Transport(_) => {
            eprintln!();
            eprintln!("Socket help:");
            eprintln!("  - Raw ICMP sockets need root or the CAP_NET_RAW capability");
            eprintln!("  - Try: sudo setcap cap_net_raw+ep $(which {})", PKG_NAME);
        }
        AppError::DnsResolution(_) => {
            eprintln!();
            eprintln!("DNS resolution help:");
            eprintln!("  - Check if the host name exists");
            eprintln!("  - Try a public DNS server with --dns-server 1.1.1.1");
            eprintln!("  - Use -4 or -6 only if the host has such an address");
        }
        _ => {}
    }
}
