use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Gamma, LogNormal, Weibull};

use crate::error::{Error, Result};
use crate::world::commons::InfectionParams;

/// Age-banded probability lookup. Bands are inclusive integer ranges and
/// must tile their span without overlap or gap. Ages above the highest
/// band use the highest band's probability.
#[derive(Debug, Clone)]
pub struct AgeBands {
    bands: Vec<(u32, u32, f64)>,
}

impl AgeBands {
    pub fn new(mut bands: Vec<(u32, u32, f64)>) -> Result<Self> {
        if bands.is_empty() {
            return Err(Error::config("age table has no bands"));
        }
        bands.sort_by_key(|&(lo, _, _)| lo);
        for &(lo, hi, p) in &bands {
            if lo > hi {
                return Err(Error::config(format!("age band {lo}-{hi} is inverted")));
            }
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::config(format!(
                    "age band {lo}-{hi} probability {p} outside [0, 1]"
                )));
            }
        }
        for pair in bands.windows(2) {
            let (_, hi, _) = pair[0];
            let (lo, _, _) = pair[1];
            if lo <= hi {
                return Err(Error::config(format!(
                    "age bands overlap at {lo} (previous band ends at {hi})"
                )));
            }
            if lo > hi + 1 {
                return Err(Error::config(format!(
                    "age bands leave a gap between {hi} and {lo}"
                )));
            }
        }
        Ok(Self { bands })
    }

    pub fn prob_for(&self, age: u32) -> f64 {
        for &(lo, hi, p) in &self.bands {
            if age >= lo && age <= hi {
                return p;
            }
        }
        let &(lo_first, ..) = self.bands.first().unwrap();
        if age < lo_first {
            return 0.0;
        }
        self.bands.last().unwrap().2
    }
}

/// The three age-conditioned tables consumed by the sampler.
#[derive(Debug, Clone)]
pub struct AgeTables {
    pub mortality: AgeBands,
    pub hospitalization: AgeBands,
    pub icu: AgeBands,
}

/// Source of every stochastic decision in the model. Owns the one RNG
/// stream; seed it for reproducible runs.
#[derive(Debug)]
pub struct Infection {
    rng: StdRng,
    dt: f64,
    latency: LogNormal<f64>,
    variability: Gamma<f64>,
    onset_to_death: LogNormal<f64>,
    onset_to_hospitalization: Gamma<f64>,
    hospitalization_to_death: Weibull<f64>,
    prob_recovering_exposed: f64,
    prob_death_icu: f64,
    tables: AgeTables,
}

fn numeric(what: &str, err: impl std::fmt::Debug) -> Error {
    Error::Numeric(format!("{what}: {err:?}"))
}

impl Infection {
    pub fn new(dt: f64, ip: &InfectionParams, tables: AgeTables, rng: StdRng) -> Result<Self> {
        if dt <= 0.0 {
            return Err(Error::Numeric(format!("time step {dt} must be positive")));
        }
        Ok(Self {
            rng,
            dt,
            latency: LogNormal::new(ip.latency_mean, ip.latency_std)
                .map_err(|e| numeric("latency log-normal", e))?,
            variability: Gamma::new(ip.variability_shape, ip.variability_scale)
                .map_err(|e| numeric("variability gamma", e))?,
            onset_to_death: LogNormal::new(ip.otd_mean, ip.otd_std)
                .map_err(|e| numeric("onset-to-death log-normal", e))?,
            onset_to_hospitalization: Gamma::new(ip.oth_shape, ip.oth_scale)
                .map_err(|e| numeric("onset-to-hospitalization gamma", e))?,
            hospitalization_to_death: Weibull::new(ip.htd_scale, ip.htd_shape)
                .map_err(|e| numeric("hospitalization-to-death weibull", e))?,
            prob_recovering_exposed: ip.frac_never_symptomatic,
            prob_death_icu: ip.prob_death_icu,
            tables,
        })
    }

    fn uniform(&mut self) -> f64 {
        self.rng.gen()
    }

    /// Infection draw against pressure λ over one step: p = 1 − e^(−λ·Δt).
    /// λ ≤ 0 never infects.
    pub fn infected(&mut self, lambda: f64) -> bool {
        if lambda <= 0.0 {
            return false;
        }
        let prob = 1.0 - (-self.dt * lambda).exp();
        self.uniform() <= prob
    }

    pub fn latency(&mut self) -> f64 {
        self.latency.sample(&mut self.rng)
    }

    pub fn inf_variability(&mut self) -> f64 {
        self.variability.sample(&mut self.rng)
    }

    pub fn time_to_death(&mut self) -> f64 {
        self.onset_to_death.sample(&mut self.rng)
    }

    pub fn get_onset_to_hospitalization(&mut self) -> f64 {
        self.onset_to_hospitalization.sample(&mut self.rng)
    }

    pub fn get_hospitalization_to_death(&mut self) -> f64 {
        self.hospitalization_to_death.sample(&mut self.rng)
    }

    pub fn recovering_exposed(&mut self) -> bool {
        let p = self.prob_recovering_exposed;
        self.uniform() <= p
    }

    /// Death outside the ICU: the age-band mortality scaled down by the
    /// ICU-conditional death fraction.
    pub fn will_die_non_icu(&mut self, age: u32) -> bool {
        let p = self.tables.mortality.prob_for(age) * (1.0 - self.prob_death_icu);
        self.uniform() <= p
    }

    pub fn agent_hospitalized(&mut self, age: u32) -> bool {
        let p = self.tables.hospitalization.prob_for(age);
        self.uniform() <= p
    }

    pub fn agent_hospitalized_icu(&mut self, age: u32) -> bool {
        let p = self.tables.icu.prob_for(age);
        self.uniform() <= p
    }

    pub fn will_die_icu(&mut self) -> bool {
        let p = self.prob_death_icu;
        self.uniform() <= p
    }

    pub fn will_be_tested(&mut self, prob: f64) -> bool {
        self.uniform() <= prob
    }

    pub fn tested_in_hospital(&mut self, prob: f64) -> bool {
        self.uniform() <= prob
    }

    pub fn false_negative_test_result(&mut self, prob: f64) -> bool {
        self.uniform() <= prob
    }

    pub fn false_positive_test_result(&mut self, prob: f64) -> bool {
        self.uniform() <= prob
    }

    pub fn get_random_hospital_id(&mut self, n_hospitals: usize) -> Result<usize> {
        if n_hospitals == 0 {
            return Err(Error::invariant("hospital draw requested with no hospitals"));
        }
        Ok(self.rng.gen_range(1..=n_hospitals))
    }

    pub fn get_random_household_id(&mut self, n_households: usize) -> Result<usize> {
        if n_households == 0 {
            return Err(Error::invariant("household draw requested with no households"));
        }
        Ok(self.rng.gen_range(1..=n_households))
    }

    /// Uniform index into a collection of length `n`; used by the ILI pool.
    pub(crate) fn random_index(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }
}
