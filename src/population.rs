use rand::Rng;
use tracing::warn;

use crate::genome::Genome;
use crate::params::Settings;
use crate::topology::Topology;

#[derive(Clone, Debug, PartialEq)]
pub struct Member {
    pub genome: Genome,
    pub fitness: f64,
}

impl Member {
    pub fn new(genome: Genome) -> Member {
        Member {
            genome,
            fitness: 0.0,
        }
    }
}

pub struct Population {
    settings: Settings,
    pub members: Vec<Member>,
}

impl Population {
    pub fn new<R: Rng>(settings: &Settings, rng: &mut R) -> Population {
        let len = Topology::variant(settings.self_feedback).genome_len();
        let members = (0..settings.population_size)
            .map(|_| Member::new(Genome::random(len, rng)))
            .collect();

        Population {
            settings: settings.clone(),
            members,
        }
    }

    pub fn from_genomes(settings: &Settings, genomes: Vec<Genome>) -> Population {
        Population {
            settings: settings.clone(),
            members: genomes.into_iter().map(Member::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Indices of the `include_top` fittest members, best first. Equal
    /// fitness keeps population order.
    pub fn ranked(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.members.len()).collect();
        order.sort_by(|&a, &b| self.members[b].fitness.total_cmp(&self.members[a].fitness));
        order.truncate(self.settings.include_top);
        order
    }

    /// Replaces the population with mutated replicas of its top members.
    ///
    /// Every selected genome is copied `population_size / include_top`
    /// times. Returns how many members the new population is short of
    /// `population_size` when that ratio is not whole.
    pub fn evolve<R: Rng>(&mut self, rng: &mut R) -> usize {
        let top = self.ranked();
        let copies = self.settings.population_size / self.settings.include_top;

        let mut next = Vec::with_capacity(top.len() * copies);
        for &parent in &top {
            for _ in 0..copies {
                let child = self.members[parent]
                    .genome
                    .mutated(self.settings.mutation_rate, rng);
                next.push(Member::new(child));
            }
        }

        let shortfall = self.settings.population_size.saturating_sub(next.len());
        if shortfall > 0 {
            warn!(
                population_size = self.settings.population_size,
                include_top = self.settings.include_top,
                produced = next.len(),
                "replication ratio is not whole, next generation is short"
            );
        }

        self.members = next;
        shortfall
    }

    pub fn get_winner(&self) -> Option<&Member> {
        self.members
            .iter()
            .max_by(|lhs, rhs| lhs.fitness.total_cmp(&rhs.fitness))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn settings(population_size: usize, include_top: usize, mutation_rate: f64) -> Settings {
        Settings {
            population_size,
            include_top,
            mutation_rate,
            ..Default::default()
        }
    }

    fn scored(settings: &Settings, rng: &mut SmallRng) -> Population {
        let mut population = Population::new(settings, rng);
        for (i, member) in population.members.iter_mut().enumerate() {
            member.fitness = (i % 7) as f64;
        }
        population
    }

    #[test]
    fn random_population_matches_topology() {
        let mut rng = SmallRng::seed_from_u64(1);
        let population = Population::new(&Settings::default(), &mut rng);
        assert_eq!(population.len(), 100);
        assert!(population.members.iter().all(|m| m.genome.len() == 69));

        let reduced = Settings {
            self_feedback: false,
            ..Default::default()
        };
        let population = Population::new(&reduced, &mut rng);
        assert!(population.members.iter().all(|m| m.genome.len() == 65));
    }

    #[test]
    fn ranking_is_descending_and_stable() {
        let s = settings(10, 4, 0.0);
        let mut rng = SmallRng::seed_from_u64(2);
        let mut population = Population::new(&s, &mut rng);
        let fitness = [1.0, 3.0, 2.0, 3.0, 0.5, 2.0, -1.0, 3.0, 0.0, 0.0];
        for (member, &f) in population.members.iter_mut().zip(&fitness) {
            member.fitness = f;
        }
        assert_eq!(population.ranked(), vec![1, 3, 7, 2]);
        assert_eq!(population.get_winner().unwrap().fitness, 3.0);
    }

    #[test]
    fn zero_mutation_replicates_the_top_exactly() {
        let s = settings(20, 5, 0.0);
        let mut rng = SmallRng::seed_from_u64(3);
        let mut population = scored(&s, &mut rng);
        let parents: Vec<Genome> = population
            .ranked()
            .into_iter()
            .map(|i| population.members[i].genome.clone())
            .collect();

        assert_eq!(population.evolve(&mut rng), 0);
        assert_eq!(population.len(), 20);
        for (i, member) in population.members.iter().enumerate() {
            assert_eq!(member.genome, parents[i / 4]);
            assert_eq!(member.fitness, 0.0);
        }
    }

    #[test]
    fn full_mutation_redraws_loci() {
        let s = settings(10, 2, 1.0);
        let mut rng = SmallRng::seed_from_u64(4);
        let mut population = scored(&s, &mut rng);
        let parent = population.members[population.ranked()[0]].genome.clone();
        population.evolve(&mut rng);
        assert_ne!(population.members[0].genome, parent);
        assert_eq!(population.members[0].genome.len(), parent.len());
    }

    #[test]
    fn uneven_ratio_leaves_the_population_short() {
        let s = settings(10, 3, 0.02);
        let mut rng = SmallRng::seed_from_u64(5);
        let mut population = scored(&s, &mut rng);
        assert_eq!(population.evolve(&mut rng), 1);
        assert_eq!(population.len(), 9);
    }
}
