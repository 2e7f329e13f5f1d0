//! portsweep - command-line entry point.

use clap::Parser;
use portsweep::cli::Args;
use portsweep::config::AppSettings;
use portsweep::error::{CliError, CliResult};
use portsweep::output;
use portsweep::scanner::{ScanEngine, ScanMode, SYN_SCAN_SUPPORTED};
use portsweep::types::{resolve_ipv4, PortSpec, ScanTarget};
use std::process::ExitCode;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version land here too, with a zero exit code.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter())),
        )
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&e.to_string());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(args: Args) -> CliResult<()> {
    let settings = match &args.config {
        Some(path) => AppSettings::load_from(path)?,
        None => AppSettings::load()?,
    };

    let ports: PortSpec = args.ports.parse()?;
    let ip = resolve_ipv4(&args.target).await?;
    let target = ScanTarget::new(args.target.as_str(), ip, ports.to_ports());
    let config = args.scan_configuration(&settings);
    let total = target.ports().len();
    debug!(%target, ports = %ports, ?config, "resolved scan parameters");

    if config.grab_banners && config.mode == ScanMode::Syn {
        output::print_info("banners are only grabbed in connect mode");
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing in-flight probes");
            on_interrupt.cancel();
        }
    });

    let mut engine = ScanEngine::new(target, config).with_cancellation(cancel);
    let progress = if args.quiet {
        None
    } else {
        let pb = output::progress_bar(total);
        engine = engine.with_progress(pb.clone());
        Some(pb)
    };

    let scanner = engine.build_scanner();
    if args.mode() == ScanMode::Syn && scanner.scan_type() != ScanMode::Syn {
        let reason = if !SYN_SCAN_SUPPORTED {
            "raw sockets are not supported on this platform"
        } else if !is_root() {
            "raw sockets require root or CAP_NET_RAW"
        } else {
            "the raw socket could not be opened"
        };
        output::print_warning(&format!(
            "SYN scan unavailable ({}); falling back to TCP connect scan",
            reason
        ));
    }
    if !args.quiet {
        output::print_scan_header(
            engine.target(),
            scanner.scan_type().label(),
            engine.config().worker_count(total),
        );
    }

    let started = Instant::now();
    let outcome = tokio::task::spawn_blocking(move || engine.run_with(scanner))
        .await
        .map_err(|e| CliError::Other(format!("scan task failed: {}", e)))?;
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let report = outcome?;

    if !args.quiet {
        if let Err(e) = output::print_summary(&report, started.elapsed()) {
            debug!(error = %e, "could not print summary");
        }
    }

    // A report that cannot be saved is still a completed scan.
    let path = args.output_path(&settings);
    match output::write_report(&report, &path) {
        Ok(()) if !args.quiet => {
            output::print_info(&format!("Results written to {}", path.display()))
        }
        Ok(()) => {}
        Err(e) => output::print_error(&e.to_string()),
    }

    Ok(())
}

#[cfg(unix)]
fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}
