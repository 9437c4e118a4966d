use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::params::{LOCUS_MAX, LOCUS_MIN};
use crate::topology::SELF_FEEDBACK_LOCI;

/// Fixed-length integer encoding of every controller parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Genome {
    loci: Vec<u8>,
}

impl Genome {
    pub fn new(loci: Vec<u8>) -> Genome {
        Genome { loci }
    }

    /// Builds a genome from wider integers, e.g. ones read back from a file.
    pub fn from_values(values: &[i64]) -> Result<Genome> {
        let loci = values
            .iter()
            .enumerate()
            .map(|(index, &value)| {
                u8::try_from(value).map_err(|_| Error::LocusOutOfRange { index, value })
            })
            .collect::<Result<Vec<u8>>>()?;
        Ok(Genome { loci })
    }

    pub fn random<R: Rng>(len: usize, rng: &mut R) -> Genome {
        Genome {
            loci: (0..len)
                .map(|_| rng.gen_range(LOCUS_MIN..=LOCUS_MAX))
                .collect(),
        }
    }

    pub fn loci(&self) -> &[u8] {
        &self.loci
    }

    pub fn len(&self) -> usize {
        self.loci.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loci.is_empty()
    }

    /// Copy of this genome where each locus is independently redrawn with
    /// probability `rate`.
    pub fn mutated<R: Rng>(&self, rate: f64, rng: &mut R) -> Genome {
        Genome {
            loci: self
                .loci
                .iter()
                .map(|&locus| {
                    if rng.gen::<f64>() < rate {
                        rng.gen_range(LOCUS_MIN..=LOCUS_MAX)
                    } else {
                        locus
                    }
                })
                .collect(),
        }
    }

    /// Drops the loci that only exist in the self-feedback topology.
    pub fn without_self_feedback(&self) -> Result<Genome> {
        let full = crate::topology::Topology::with_self_feedback().genome_len();
        if self.loci.len() != full {
            return Err(Error::GenomeLength {
                expected: full,
                actual: self.loci.len(),
            });
        }
        Ok(Genome {
            loci: self
                .loci
                .iter()
                .enumerate()
                .filter(|(i, _)| !SELF_FEEDBACK_LOCI.contains(i))
                .map(|(_, &locus)| locus)
                .collect(),
        })
    }
}
