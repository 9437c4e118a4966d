//! The generation loop: evaluate every genome over several trials, then
//! breed the next generation from the best.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::ctrnn::Ctrnn;
use crate::error::{Error, Result};
use crate::genome::Genome;
use crate::params::Settings;
use crate::population::Population;
use crate::sensors::GeometryDiagnostics;
use crate::trial::{Trial, TrialOutcome};

/// Fitness of one genome averaged over its trials.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub genome: Genome,
    pub fitness: f64,
    pub trial_fitness: Vec<f64>,
    pub diagnostics: GeometryDiagnostics,
}

#[derive(Clone, Debug)]
pub struct GenerationReport {
    pub generation: usize,
    /// One per member, in population order.
    pub evaluations: Vec<Evaluation>,
    /// Selected parents, best first.
    pub top: Vec<Genome>,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    /// Members the next generation lacks because of a non-whole
    /// replication ratio.
    pub shortfall: usize,
}

/// Runs `trials_per_genome` independent trials of `genome` from `seed`.
pub fn evaluate_genome(settings: &Settings, genome: &Genome, seed: u64) -> Result<Evaluation> {
    settings.validate()?;
    let ctrnn = Ctrnn::decode(genome, settings.self_feedback)?;
    let mut rng = SmallRng::seed_from_u64(seed);

    let mut trial_fitness = Vec::with_capacity(settings.trials_per_genome);
    let mut diagnostics = GeometryDiagnostics::default();
    for _ in 0..settings.trials_per_genome {
        let outcome = Trial::new(&settings.parameters, &ctrnn, &mut rng)?.run(&mut rng)?;
        trial_fitness.push(outcome.fitness);
        diagnostics += outcome.diagnostics;
    }

    let fitness = trial_fitness.iter().sum::<f64>() / trial_fitness.len().max(1) as f64;
    debug!(
        fitness,
        trials = trial_fitness.len(),
        geometry_issues = diagnostics.total(),
        "evaluated genome"
    );

    Ok(Evaluation {
        genome: genome.clone(),
        fitness,
        trial_fitness,
        diagnostics,
    })
}

/// Runs a single recorded trial of `genome`, for inspection or playback.
pub fn replay(settings: &Settings, genome: &Genome, seed: u64) -> Result<TrialOutcome> {
    settings.validate()?;
    let ctrnn = Ctrnn::decode(genome, settings.self_feedback)?;
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut params = settings.parameters.clone();
    params.record = true;
    Trial::new(&params, &ctrnn, &mut rng)?.run(&mut rng)
}

pub struct Experiment {
    settings: Settings,
    population: Population,
    generation: usize,
    rng: SmallRng,
    best: Option<Evaluation>,
}

impl Experiment {
    pub fn new(settings: Settings, seed: u64) -> Result<Experiment> {
        settings.validate()?;
        let mut rng = SmallRng::seed_from_u64(seed);
        let population = Population::new(&settings, &mut rng);
        Ok(Experiment::assemble(settings, population, rng))
    }

    /// Starts from the given genomes, e.g. a generation saved earlier.
    pub fn with_population(
        settings: Settings,
        genomes: Vec<Genome>,
        seed: u64,
    ) -> Result<Experiment> {
        settings.validate()?;
        if genomes.len() != settings.population_size {
            return Err(Error::InvalidSettings(format!(
                "{} genomes given for a population of {}",
                genomes.len(),
                settings.population_size
            )));
        }
        for genome in &genomes {
            Ctrnn::decode(genome, settings.self_feedback)?;
        }
        let population = Population::from_genomes(&settings, genomes);
        Ok(Experiment::assemble(
            settings,
            population,
            SmallRng::seed_from_u64(seed),
        ))
    }

    fn assemble(settings: Settings, population: Population, rng: SmallRng) -> Experiment {
        let shortfall = settings.replication_shortfall();
        if shortfall > 0 {
            warn!(
                population_size = settings.population_size,
                include_top = settings.include_top,
                shortfall,
                "population_size is not a multiple of include_top"
            );
        }
        Experiment {
            settings,
            population,
            generation: 0,
            rng,
            best: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Highest scoring genome of the most recently evaluated generation.
    pub fn best(&self) -> Option<&Evaluation> {
        self.best.as_ref()
    }

    /// Evaluates the current population in parallel, then replaces it
    /// with the next generation.
    pub fn run_generation(&mut self) -> Result<GenerationReport> {
        let seeds: Vec<u64> = self.population.members.iter().map(|_| self.rng.gen()).collect();

        let settings = &self.settings;
        let evaluations = self
            .population
            .members
            .par_iter()
            .zip(seeds.par_iter())
            .map(|(member, &seed)| evaluate_genome(settings, &member.genome, seed))
            .collect::<Result<Vec<Evaluation>>>()?;

        for (member, evaluation) in self.population.members.iter_mut().zip(&evaluations) {
            member.fitness = evaluation.fitness;
        }

        let ranked = self.population.ranked();
        let top: Vec<Genome> = ranked
            .iter()
            .map(|&i| self.population.members[i].genome.clone())
            .collect();
        self.best = ranked.first().map(|&i| evaluations[i].clone());

        let best_fitness = self.best.as_ref().map_or(f64::NEG_INFINITY, |e| e.fitness);
        let mean_fitness =
            evaluations.iter().map(|e| e.fitness).sum::<f64>() / evaluations.len().max(1) as f64;

        let shortfall = self.population.evolve(&mut self.rng);

        info!(
            generation = self.generation,
            best_fitness,
            mean_fitness,
            selected = top.len(),
            next_size = self.population.len(),
            "generation complete"
        );

        let report = GenerationReport {
            generation: self.generation,
            evaluations,
            top,
            best_fitness,
            mean_fitness,
            shortfall,
        };
        self.generation += 1;
        Ok(report)
    }

    pub fn run(&mut self) -> Result<Vec<GenerationReport>> {
        let mut reports = Vec::new();
        while self.generation < self.settings.generations {
            reports.push(self.run_generation()?);
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Parameters;

    fn small() -> Settings {
        Settings {
            population_size: 6,
            generations: 2,
            trials_per_genome: 2,
            include_top: 2,
            parameters: Parameters {
                iterations: 20,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn evaluation_averages_trials() {
        let settings = small();
        let mut rng = SmallRng::seed_from_u64(8);
        let genome = Genome::random(69, &mut rng);
        let evaluation = evaluate_genome(&settings, &genome, 99).unwrap();
        assert_eq!(evaluation.trial_fitness.len(), 2);
        let mean = evaluation.trial_fitness.iter().sum::<f64>() / 2.0;
        assert!((evaluation.fitness - mean).abs() < 1e-12);
        assert_eq!(evaluation, evaluate_genome(&settings, &genome, 99).unwrap());
    }

    #[test]
    fn evaluation_rejects_wrong_length() {
        let err = evaluate_genome(&small(), &Genome::new(vec![0; 12]), 1).unwrap_err();
        assert_eq!(err.code(), "decode.length");
    }

    #[test]
    fn experiment_runs_every_generation() {
        let mut experiment = Experiment::new(small(), 42).unwrap();
        assert!(experiment.best().is_none());
        let reports = experiment.run().unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(experiment.generation(), 2);
        for (g, report) in reports.iter().enumerate() {
            assert_eq!(report.generation, g);
            assert_eq!(report.evaluations.len(), 6);
            assert_eq!(report.top.len(), 2);
            assert_eq!(report.shortfall, 0);
            assert!(report.best_fitness >= report.mean_fitness);
        }
        assert_eq!(experiment.population().len(), 6);
        let best = experiment.best().unwrap();
        assert_eq!(best.fitness, reports[1].best_fitness);
    }

    #[test]
    fn same_seed_same_history() {
        let a = Experiment::new(small(), 7).unwrap().run().unwrap();
        let b = Experiment::new(small(), 7).unwrap().run().unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.evaluations, y.evaluations);
        }
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let settings = Settings {
            include_top: 0,
            ..small()
        };
        assert_eq!(
            Experiment::new(settings, 0).err().map(|e| e.code()),
            Some("settings.invalid")
        );
    }

    #[test]
    fn bad_world_is_an_error_not_a_panic() {
        let settings = Settings {
            parameters: Parameters {
                arena_width: 4.0,
                ..small().parameters
            },
            ..small()
        };
        let genome = Genome::new(vec![128; 69]);
        let err = evaluate_genome(&settings, &genome, 1).unwrap_err();
        assert_eq!(err.code(), "settings.invalid");
        let err = replay(&settings, &genome, 1).unwrap_err();
        assert_eq!(err.code(), "settings.invalid");
    }

    #[test]
    fn seed_population_must_match_population_size() {
        let err = Experiment::with_population(small(), Vec::new(), 0)
            .err()
            .map(|e| e.code());
        assert_eq!(err, Some("settings.invalid"));

        let genomes = vec![Genome::new(vec![7; 69]); 6];
        let mut experiment = Experiment::with_population(small(), genomes, 0).unwrap();
        let report = experiment.run_generation().unwrap();
        assert_eq!(report.evaluations.len(), 6);
    }

    #[test]
    fn replay_records_every_step() {
        let settings = small();
        let mut rng = SmallRng::seed_from_u64(13);
        let genome = Genome::random(69, &mut rng);
        let outcome = replay(&settings, &genome, 5).unwrap();
        let traces = outcome.traces.unwrap();
        assert_eq!(traces.len(), 4);
        assert!(traces.iter().all(|t| t.positions.len() == 20));
    }
}
