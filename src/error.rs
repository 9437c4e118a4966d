use thiserror::Error;

/// Errors raised while decoding genomes, running trials or evolving populations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("genome has {actual} loci, topology expects {expected}")]
    GenomeLength { expected: usize, actual: usize },
    #[error("locus {index} holds {value}, which is outside 0..=255")]
    LocusOutOfRange { index: usize, value: i64 },
    #[error("value {value} is outside the input range [{min}, {max}]")]
    Range { value: f64, min: f64, max: f64 },
    #[error("bearing between two coincident points is undefined")]
    CoincidentPoints,
    #[error("controller expects {expected} inputs, got {actual}")]
    InputShape { expected: usize, actual: usize },
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error("could not place agent {agent} after {attempts} attempts")]
    Placement { agent: usize, attempts: usize },
}

impl Error {
    /// Stable identifier for the kind of failure.
    pub fn code(&self) -> &'static str {
        match self {
            Error::GenomeLength { .. } => "decode.length",
            Error::LocusOutOfRange { .. } => "genome.locus",
            Error::Range { .. } => "rescale.range",
            Error::CoincidentPoints => "geometry.coincident",
            Error::InputShape { .. } => "ctrnn.shape",
            Error::InvalidSettings(_) => "settings.invalid",
            Error::Placement { .. } => "trial.placement",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
