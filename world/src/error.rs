use std::io;

/// Failure classes of the simulator.
///
/// `Config` covers anything wrong with input files and parameters and is
/// only produced while building a world. The remaining variants are fatal
/// once a simulation runs: the model is ill-defined past an `Invariant`,
/// and an `OutOfRange` place lookup means the population data and the
/// place tables disagree.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config: {0}")]
    Config(String),
    #[error("invariant violated: {0}")]
    Invariant(String),
    #[error("{kind} ID {id} out of range (1..={max})")]
    OutOfRange {
        kind: &'static str,
        id: usize,
        max: usize,
    },
    #[error("numeric: {0}")]
    Numeric(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Error::Invariant(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
