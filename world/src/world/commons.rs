use std::collections::HashMap;

use crate::error::{Error, Result};

/// The closed set of named model parameters, typed.
///
/// Loaded from the key-value parameter file; every field is required.
/// Rates are per day, times in days, fractions in [0, 1].
#[derive(Debug, Clone)]
pub struct InfectionParams {
    // Transmission rates and their corrections
    pub household_rate: f64,
    pub household_alpha: f64,
    pub home_isolated_rate: f64,
    pub school_rate: f64,
    pub school_employee_rate: f64,
    pub workplace_rate: f64,
    pub severity_correction: f64,
    pub work_absenteeism: f64,
    pub school_employee_absenteeism: f64,
    pub daycare_absenteeism: f64,
    pub primary_middle_absenteeism: f64,
    pub high_school_absenteeism: f64,
    pub college_absenteeism: f64,
    pub hospital_employee_rate: f64,
    pub hospital_patient_rate: f64,
    pub hospital_testee_rate: f64,
    pub hospitalized_rate: f64,
    pub hospitalized_icu_rate: f64,

    // Distribution parameters
    pub latency_mean: f64,
    pub latency_std: f64,
    pub variability_shape: f64,
    pub variability_scale: f64,
    pub otd_mean: f64,
    pub otd_std: f64,
    pub oth_shape: f64,
    pub oth_scale: f64,
    pub htd_shape: f64,
    pub htd_scale: f64,

    // Single-number probabilities
    pub frac_never_symptomatic: f64,
    pub frac_sy_tested: f64,
    pub frac_exposed_tested: f64,
    pub frac_tested_in_hospitals: f64,
    pub frac_false_negative: f64,
    pub frac_false_positive: f64,
    pub prob_death_icu: f64,
    pub frac_with_flu: f64,

    // Scheduling constants, days
    pub infectiousness_delay: f64,
    pub test_delay: f64,
    pub results_delay: f64,
    pub recovery_time: f64,
    pub time_in_icu: f64,
    pub time_in_hospital: f64,
    pub time_in_hospital_after_icu: f64,
    pub death_to_icu_delay: f64,
}

fn fetch(map: &HashMap<String, f64>, name: &str) -> Result<f64> {
    map.get(name)
        .copied()
        .ok_or_else(|| Error::config(format!("missing parameter \"{name}\"")))
}

impl InfectionParams {
    pub fn from_map(map: &HashMap<String, f64>) -> Result<Self> {
        Ok(Self {
            household_rate: fetch(map, "household transmission rate")?,
            household_alpha: fetch(map, "household scaling parameter")?,
            home_isolated_rate: fetch(map, "transmission rate of home isolated")?,
            school_rate: fetch(map, "school transmission rate")?,
            school_employee_rate: fetch(map, "school employee transmission rate")?,
            workplace_rate: fetch(map, "workplace transmission rate")?,
            severity_correction: fetch(map, "severity correction")?,
            work_absenteeism: fetch(map, "work absenteeism correction")?,
            school_employee_absenteeism: fetch(map, "school employee absenteeism correction")?,
            daycare_absenteeism: fetch(map, "daycare absenteeism correction")?,
            primary_middle_absenteeism: fetch(
                map,
                "primary and middle school absenteeism correction",
            )?,
            high_school_absenteeism: fetch(map, "high school absenteeism correction")?,
            college_absenteeism: fetch(map, "college absenteeism correction")?,
            hospital_employee_rate: fetch(map, "hospital employee transmission rate")?,
            hospital_patient_rate: fetch(map, "hospital patient transmission rate")?,
            hospital_testee_rate: fetch(map, "hospital testee transmission rate")?,
            hospitalized_rate: fetch(map, "hospitalized transmission rate")?,
            hospitalized_icu_rate: fetch(map, "hospitalized ICU transmission rate")?,
            latency_mean: fetch(map, "latency log-normal mean")?,
            latency_std: fetch(map, "latency log-normal standard deviation")?,
            variability_shape: fetch(map, "agent variability gamma shape")?,
            variability_scale: fetch(map, "agent variability gamma scale")?,
            otd_mean: fetch(map, "otd logn mean")?,
            otd_std: fetch(map, "otd logn std")?,
            oth_shape: fetch(map, "oth gamma shape")?,
            oth_scale: fetch(map, "oth gamma scale")?,
            htd_shape: fetch(map, "htd wbl shape")?,
            htd_scale: fetch(map, "htd wbl scale")?,
            frac_never_symptomatic: fetch(map, "fraction exposed never symptomatic")?,
            frac_sy_tested: fetch(map, "fraction to get tested")?,
            frac_exposed_tested: fetch(map, "exposed fraction to get tested")?,
            frac_tested_in_hospitals: fetch(map, "fraction tested in hospitals")?,
            frac_false_negative: fetch(map, "fraction false negative")?,
            frac_false_positive: fetch(map, "fraction false positive")?,
            prob_death_icu: fetch(map, "probability of death in ICU")?,
            frac_with_flu: fetch(map, "fraction with flu")?,
            infectiousness_delay: fetch(map, "time from exposed to infectiousness")?,
            test_delay: fetch(map, "time from decision to test")?,
            results_delay: fetch(map, "time from test to results")?,
            recovery_time: fetch(map, "recovery time")?,
            time_in_icu: fetch(map, "time in ICU")?,
            time_in_hospital: fetch(map, "time in hospital")?,
            time_in_hospital_after_icu: fetch(map, "time in hospital after ICU")?,
            death_to_icu_delay: fetch(map, "time before death to ICU")?,
        })
    }
}

/// Every parameter name the loader understands, in file order.
pub const PARAMETER_NAMES: &[&str] = &[
    "household transmission rate",
    "household scaling parameter",
    "transmission rate of home isolated",
    "school transmission rate",
    "school employee transmission rate",
    "workplace transmission rate",
    "severity correction",
    "work absenteeism correction",
    "school employee absenteeism correction",
    "daycare absenteeism correction",
    "primary and middle school absenteeism correction",
    "high school absenteeism correction",
    "college absenteeism correction",
    "hospital employee transmission rate",
    "hospital patient transmission rate",
    "hospital testee transmission rate",
    "hospitalized transmission rate",
    "hospitalized ICU transmission rate",
    "latency log-normal mean",
    "latency log-normal standard deviation",
    "agent variability gamma shape",
    "agent variability gamma scale",
    "otd logn mean",
    "otd logn std",
    "oth gamma shape",
    "oth gamma scale",
    "htd wbl shape",
    "htd wbl scale",
    "fraction exposed never symptomatic",
    "fraction to get tested",
    "exposed fraction to get tested",
    "fraction tested in hospitals",
    "fraction false negative",
    "fraction false positive",
    "probability of death in ICU",
    "fraction with flu",
    "time from exposed to infectiousness",
    "time from decision to test",
    "time from test to results",
    "recovery time",
    "time in ICU",
    "time in hospital",
    "time in hospital after ICU",
    "time before death to ICU",
];

#[cfg(test)]
pub(crate) fn test_params(overrides: &[(&str, f64)]) -> InfectionParams {
    let mut map: HashMap<String, f64> = PARAMETER_NAMES
        .iter()
        .map(|name| (name.to_string(), 1.0))
        .collect();
    for (name, value) in overrides {
        map.insert(name.to_string(), *value);
    }
    InfectionParams::from_map(&map).unwrap()
}
