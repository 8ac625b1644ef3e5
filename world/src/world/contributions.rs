//! Per-step contribution pass: translate "who is infectious" into place
//! accumulator increments, then finalize every place's λ.

use crate::error::{Error, Result};
use crate::world::agent::Agent;
use crate::world::place::{Places, Site};

/// Walks all agents in ID order, dispatches infectious ones to their
/// places, then finalizes every λ. Infected agents must be exposed or
/// symptomatic; anything else is a corrupted state.
pub fn compute_place_contributions(
    agents: &[Agent],
    places: &mut Places,
    time: f64,
) -> Result<()> {
    for agent in agents {
        if agent.removed() {
            continue;
        }
        if !agent.infected() {
            // ILI carriers shed nothing but still occupy a test slot at
            // their hospital visit.
            if agent.symptomatic_non_covid()
                && agent.tested_awaiting_test()
                && agent.tested_in_hospital()
                && time >= agent.time_of_test()
            {
                places.hospital_mut(agent.hospital_id()?)?.count_tested();
            }
            continue;
        }
        if agent.exposed() {
            compute_exposed_contributions(agent, places, time)?;
        } else if agent.symptomatic() {
            compute_symptomatic_contributions(agent, places, time)?;
        } else {
            return Err(Error::invariant(format!(
                "infected agent {} is neither exposed nor symptomatic",
                agent.id()
            )));
        }
    }
    places.for_each_site_mut(|site| site.finalize());
    Ok(())
}

pub fn reset_sums(places: &mut Places) {
    places.for_each_site_mut(|site| site.reset());
}

/// Exposed agents contribute only once infectious. Testing and isolation
/// narrow the set of places they touch; otherwise they shed wherever they
/// are registered.
fn compute_exposed_contributions(agent: &Agent, places: &mut Places, time: f64) -> Result<()> {
    if time < agent.infectiousness_start_time() {
        return Ok(());
    }
    let inf_var = agent.inf_variability_factor();

    if agent.tested_awaiting_test() || agent.tested_awaiting_results() {
        if agent.tested_awaiting_test() && time >= agent.time_of_test() {
            // At the test site; a car visit touches nobody.
            if agent.tested_in_hospital() {
                places
                    .hospital_mut(agent.hospital_id()?)?
                    .add_exposed_testee(inf_var);
            }
        } else if agent.hospital_non_covid_patient() {
            places
                .hospital_mut(agent.hospital_id()?)?
                .add_exposed_patient(inf_var);
        } else if agent.hospital_employee() {
            // Staff are not isolated until symptoms: they keep shedding
            // at home and on the ward while waiting.
            places
                .household_mut(agent.household_id()?)?
                .add_exposed(inf_var);
            places
                .hospital_mut(agent.hospital_id()?)?
                .add_exposed_employee(inf_var);
        } else {
            places
                .household_mut(agent.household_id()?)?
                .add_exposed_home_isolated(inf_var);
        }
        return Ok(());
    }

    // A confirmed-positive patient still sheds as a patient of its ward,
    // so the patient check comes first.
    if agent.hospital_non_covid_patient() {
        places
            .hospital_mut(agent.hospital_id()?)?
            .add_exposed_patient(inf_var);
        return Ok(());
    }

    if agent.tested_covid_positive() {
        places
            .household_mut(agent.household_id()?)?
            .add_exposed_home_isolated(inf_var);
        return Ok(());
    }

    places
        .household_mut(agent.household_id()?)?
        .add_exposed(inf_var);
    if agent.student() {
        places.school_mut(agent.school_id()?)?.add_exposed(inf_var);
    }
    if agent.works() {
        if agent.school_employee() {
            places
                .school_mut(agent.work_id()?)?
                .add_exposed_employee(inf_var);
        } else if agent.hospital_employee() {
            places
                .hospital_mut(agent.hospital_id()?)?
                .add_exposed_employee(inf_var);
        } else {
            places
                .workplace_mut(agent.work_id()?)?
                .add_exposed(inf_var);
        }
    }
    Ok(())
}

/// Symptomatic dispatch adds the treatment branches on top of the testing
/// ones. Order matters: a treated agent may still carry stale testing
/// flags from the episode that confirmed it.
fn compute_symptomatic_contributions(agent: &Agent, places: &mut Places, time: f64) -> Result<()> {
    let inf_var = agent.inf_variability_factor();

    if agent.being_treated() {
        if agent.hospitalized_icu() {
            places
                .hospital_mut(agent.hospital_id()?)?
                .add_hospitalized_icu(inf_var);
        } else if agent.hospitalized() {
            places
                .hospital_mut(agent.hospital_id()?)?
                .add_hospitalized(inf_var);
        } else if agent.home_isolated() {
            places
                .household_mut(agent.household_id()?)?
                .add_symptomatic_home_isolated(inf_var);
        } else {
            return Err(Error::invariant(format!(
                "treated agent {} has no care setting",
                agent.id()
            )));
        }
        return Ok(());
    }

    if agent.tested_awaiting_test() || agent.tested_awaiting_results() {
        if agent.tested_awaiting_test() && time >= agent.time_of_test() {
            if agent.tested_in_hospital() {
                places
                    .hospital_mut(agent.hospital_id()?)?
                    .add_symptomatic_testee(inf_var);
            }
        } else if agent.hospital_non_covid_patient() {
            places
                .hospital_mut(agent.hospital_id()?)?
                .add_symptomatic_patient(inf_var);
        } else {
            places
                .household_mut(agent.household_id()?)?
                .add_symptomatic_home_isolated(inf_var);
        }
        return Ok(());
    }

    if agent.hospital_non_covid_patient() {
        places
            .hospital_mut(agent.hospital_id()?)?
            .add_symptomatic_patient(inf_var);
        return Ok(());
    }

    // Symptomatic in public: either never tested, or released by a false
    // negative. Hospital staff are isolated at onset, so only a false
    // negative puts one back on the ward.
    if agent.hospital_employee() && !agent.tested_false_negative() {
        return Err(Error::invariant(format!(
            "symptomatic hospital employee {} is neither isolated nor treated",
            agent.id()
        )));
    }
    places
        .household_mut(agent.household_id()?)?
        .add_symptomatic(inf_var);
    if agent.student() {
        places
            .school_mut(agent.school_id()?)?
            .add_symptomatic_student(inf_var);
    }
    if agent.works() {
        if agent.school_employee() {
            places
                .school_mut(agent.work_id()?)?
                .add_symptomatic_employee(inf_var);
        } else if agent.hospital_employee() {
            places
                .hospital_mut(agent.hospital_id()?)?
                .add_symptomatic_employee(inf_var);
        } else {
            places
                .workplace_mut(agent.work_id()?)?
                .add_symptomatic(inf_var);
        }
    }
    Ok(())
}
