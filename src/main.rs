//! hems-sim entry point: CLI wiring and config-driven scenario runs.

use std::process;

use tracing::info;
use tracing_subscriber::EnvFilter;

use hems_sim::cli::{self, CliCommand, CliOptions};
use hems_sim::config::ScenarioConfig;
use hems_sim::io::export::{export_csv, export_energy_csv};
use hems_sim::reporting::print_energy_report;
use hems_sim::runner::{RunReport, run_scenario};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hems_sim=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_scenario(cli: &CliOptions) -> Result<ScenarioConfig, String> {
    // --scenario takes priority; the parser already defaults to the demo preset.
    let cfg = match (&cli.scenario, &cli.preset) {
        (Some(path), _) => ScenarioConfig::from_toml_file(path),
        (None, Some(name)) => ScenarioConfig::from_preset(name),
        (None, None) => Ok(ScenarioConfig::demo()),
    };
    cfg.map_err(|e| e.to_string())
}

fn export(report: &RunReport, cli: &CliOptions) -> Result<(), String> {
    if let Some(ref path) = cli.telemetry_out {
        export_csv(report.engine.history(), path)
            .map_err(|e| format!("failed to write telemetry CSV: {e}"))?;
        info!("telemetry written to {}", path.display());
    }
    if let Some(ref path) = cli.energy_out {
        export_energy_csv(report.engine.controller().devices(), path)
            .map_err(|e| format!("failed to write energy CSV: {e}"))?;
        info!("energy report written to {}", path.display());
    }
    Ok(())
}

fn main() {
    init_tracing();

    let cli = match cli::parse_args() {
        Ok(CliCommand::Run(opts)) => opts,
        Ok(CliCommand::Help) => {
            cli::print_usage();
            process::exit(0);
        }
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(1);
        }
    };

    let scenario = match load_scenario(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let report = match run_scenario(&scenario) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    // Print ticks that changed something, then every rendered report
    for tick in report.engine.history().iter().filter(|t| t.has_transitions()) {
        println!("{tick}");
    }
    for text in &report.reports {
        println!("\n{text}");
    }
    print_energy_report(&report.engine);

    if let Err(e) = export(&report, &cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }

    if let Some(ref e) = report.aborted {
        eprintln!("error: scenario stopped early: {e}");
        process::exit(1);
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(hems_sim::api::AppState {
            engine: report.engine,
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(hems_sim::api::serve(state, addr)) {
            eprintln!("error: API server failed: {e}");
            process::exit(1);
        }
    }
}
