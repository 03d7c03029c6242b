// # ddnsd - Route 53 dynamic DNS agent
//
// A thin integration layer over ddns-core. All reconciliation logic lives in
// the library; this binary only:
// 1. Parses the command line
// 2. Initializes logging
// 3. Builds the trace IP source and the Route 53 provider
// 4. Runs one reconciliation and maps the outcome to an exit code
//
// `ddnsd run` is meant to be fired by a systemd timer (see `ddnsd install`);
// it performs exactly one pass and exits.
//
// ## Configuration
//
// Reconciliation settings come from the environment only:
// - `ROUTE53_HOSTED_ZONE_DNS_NAME`: zone to search
// - `ROUTE53_MY_DNS_NAMES`: comma-separated host names (`ROUTE53_MY_DNS_NAME` as fallback)
// - `ROUTE53_TTL`: TTL for upserted records
// - `DDNS_TRACE_URL`, `DDNS_HTTP_TIMEOUT_SECS`, `DDNS_MODE`: optional
// - `DDNS_LOG_LEVEL`: trace, debug, info (default), warn, error
// - `AWS_*`: standard AWS credential and region chain
//
// ## Example
//
// ```bash
// export ROUTE53_HOSTED_ZONE_DNS_NAME=example.net
// export ROUTE53_MY_DNS_NAMES=unifi.example.net,camera.example.net
// export ROUTE53_TTL=300
//
// ddnsd run
// ```

mod cli;
mod install;

use clap::Parser;
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use ddns_core::{Error, ReconcileConfig, ReconcileReport, Reconciler, RunMode};
use ddns_ip_trace::TraceIpSource;
use ddns_provider_route53::Route53Provider;

use cli::{Cli, Commands, InstallArgs, RunArgs};

/// Exit codes for the possible run outcomes
///
/// - 0: every host current or updated
/// - 1: configuration error
/// - 2: fatal runtime error (IP or zone resolution, client setup, I/O)
/// - 3: run completed but at least one host failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
    HostFailures = 3,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl DdnsExitCode {
    fn for_error(err: &Error) -> Self {
        match err {
            Error::Config(_) => DdnsExitCode::ConfigError,
            _ => DdnsExitCode::RuntimeError,
        }
    }

    fn for_report(report: &ReconcileReport) -> Self {
        if report.has_failures() {
            DdnsExitCode::HostFailures
        } else {
            DdnsExitCode::Success
        }
    }
}

fn parse_log_level(raw: Option<&str>) -> anyhow::Result<Level> {
    match raw.map(|s| s.trim().to_lowercase()).as_deref() {
        None | Some("") | Some("info") => Ok(Level::INFO),
        Some("trace") => Ok(Level::TRACE),
        Some("debug") => Ok(Level::DEBUG),
        Some("warn") => Ok(Level::WARN),
        Some("error") => Ok(Level::ERROR),
        Some(other) => anyhow::bail!(
            "DDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            other
        ),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match parse_log_level(env::var("DDNS_LOG_LEVEL").ok().as_deref()) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // stdout is reserved for the JSON report
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let code = match cli.command {
        Commands::Run(args) => run(args),
        Commands::Install(args) => run_install(args),
    };

    code.into()
}

fn run(args: RunArgs) -> DdnsExitCode {
    let mut config = match ReconcileConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError;
        }
    };
    if args.dry_run {
        config = config.with_mode(RunMode::DryRun);
    }

    info!(
        "Reconciling {} host(s) in zone {} (ttl {}, mode {:?})",
        config.host_names.len(),
        config.zone_dns_name,
        config.ttl,
        config.mode
    );

    // Every call is awaited in order; one thread is all a run needs
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError;
        }
    };

    rt.block_on(run_once(config, args.json))
}

async fn run_once(config: ReconcileConfig, json: bool) -> DdnsExitCode {
    let ip_source = match TraceIpSource::from_config(&config) {
        Ok(source) => source,
        Err(e) => {
            error!("Failed to build IP source: {}", e);
            return DdnsExitCode::RuntimeError;
        }
    };
    let provider = Route53Provider::from_env(config.http_timeout()).await;

    let reconciler = match Reconciler::new(Box::new(ip_source), Box::new(provider), config) {
        Ok(reconciler) => reconciler,
        Err(e) => {
            error!("Configuration error: {}", e);
            return DdnsExitCode::for_error(&e);
        }
    };

    let report = match reconciler.reconcile().await {
        Ok(report) => report,
        Err(e) => {
            error!("Run aborted: {}", e);
            return DdnsExitCode::for_error(&e);
        }
    };

    for host in &report.hosts {
        info!("{}: {}", host.host, host.outcome);
    }

    if json {
        match report.to_json() {
            Ok(body) => println!("{body}"),
            Err(e) => {
                error!("Failed to serialize run report: {}", e);
                return DdnsExitCode::RuntimeError;
            }
        }
    }

    if report.has_failures() {
        warn!(
            "{} of {} host(s) failed",
            report.failed_count(),
            report.hosts.len()
        );
    }

    DdnsExitCode::for_report(&report)
}

fn run_install(args: InstallArgs) -> DdnsExitCode {
    let exe = match env::current_exe() {
        Ok(path) => path,
        Err(e) => {
            error!("Unable to resolve the location of ddnsd: {}", e);
            return DdnsExitCode::RuntimeError;
        }
    };

    match install::install(&args, &exe) {
        Ok(units) => {
            info!("Done");
            println!("Installed {}", units.service.display());
            println!("Installed {}", units.timer.display());
            println!("Installed {}", units.env_conf.display());
            println!("Activate the timer with:");
            for command in units.activation_commands() {
                println!("  {command}");
            }
            DdnsExitCode::Success
        }
        Err(e) => {
            error!("Install failed: {:#}", e);
            match e.downcast_ref::<Error>() {
                Some(core) => DdnsExitCode::for_error(core),
                None => DdnsExitCode::RuntimeError,
            }
        }
    }
}
