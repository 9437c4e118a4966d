use anyhow::Result;
use swarmctrnn::params::Parameters;
use swarmctrnn::{replay, Experiment, Settings};
use tracing::{info, warn};

fn main() -> Result<()> {
    init_tracing();

    let settings = Settings {
        population_size: 40,
        generations: 20,
        trials_per_genome: 5,
        include_top: 8,
        parameters: Parameters {
            iterations: 500,
            ..Parameters::default()
        },
        ..Settings::default()
    };
    info!(?settings, "starting experiment");

    let mut experiment = Experiment::new(settings, 0xFACA_DEAF_0123_4567_u64)?;
    for report in experiment.run()? {
        if report.shortfall > 0 {
            warn!(
                generation = report.generation,
                shortfall = report.shortfall,
                "population shrank"
            );
        }
    }

    let Some(best) = experiment.best() else {
        warn!("experiment finished without evaluating any generation");
        return Ok(());
    };
    info!(
        fitness = best.fitness,
        loci = ?best.genome.loci(),
        "best genome"
    );

    let outcome = replay(experiment.settings(), &best.genome, 1)?;
    let in_zone = outcome.step_fitness.iter().filter(|&&f| f > 0.0).count();
    info!(
        fitness = outcome.fitness,
        rewarded_steps = in_zone,
        geometry_issues = outcome.diagnostics.total(),
        "replayed best genome"
    );

    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
