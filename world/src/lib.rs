//! Discrete-time stochastic simulator of COVID-19 spread over a fixed
//! population of agents tied to households, schools, workplaces, and
//! hospitals. Infectious agents feed per-place pressure accumulators;
//! susceptible agents draw infection against the finalized pressure; a
//! per-agent state machine drives latency, symptoms, testing, isolation,
//! hospitalization, and removal.

pub mod error;
pub mod io;
pub mod stat;
pub mod util;
pub mod world;

pub use error::{Error, Result};
