use anyhow::Result;
use clap::Parser;
use fleetcheck::checks::{Analysis, RampUp};
use fleetcheck::cli::Cli;
use fleetcheck::config::AnalysisConfig;
use fleetcheck::facts::FactSet;
use fleetcheck::report::{GnuplotDir, Reporter};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = match &args.config {
        Some(path) => AnalysisConfig::from_toml(path)?,
        None => AnalysisConfig::default(),
    };

    let facts = FactSet::load_dir(&args.input_dir, &args.unique_id)?;
    tracing::debug!(machines = facts.len(), dir = %args.input_dir.display(), "facts loaded");

    let reporter = Reporter::stdout(args.log_level);
    let plots = args
        .rampup_target()
        .map(|(value, dir)| (value, GnuplotDir::new(dir)));

    let mut analysis = Analysis::new(&config, &reporter).with_detail(args.detail_filter());
    if let Some((value, sink)) = &plots {
        analysis = analysis.with_rampup(RampUp { value: *value, sink });
    }

    let outcome = analysis.run(&facts)?;
    tracing::debug!(
        hardware_checks = outcome.hardware.len(),
        system_groups = outcome.performance.len(),
        "analysis complete"
    );

    Ok(())
}
