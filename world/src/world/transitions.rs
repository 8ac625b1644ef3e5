//! Per-step state machine. One of `susceptible_transitions`,
//! `exposed_transitions`, or `symptomatic_transitions` runs for every
//! non-removed agent, dispatched on the agent kind: ILI carrier, hospital
//! employee, hospital non-COVID patient, or regular. The kinds share the
//! same shape and differ in which places isolation touches and in whether
//! testing at onset is a draw or a certainty.

pub(crate) mod flu;
pub(crate) mod hsp_employee;
pub(crate) mod hsp_patient;
pub(crate) mod regular;

use crate::error::{Error, Result};
use crate::world::agent::Agent;
use crate::world::commons::InfectionParams;
use crate::world::flu::Flu;
use crate::world::infection::Infection;
use crate::world::place::{Places, Site};
use crate::world::states;

/// Mutable slice of the world a transition may touch, plus the clock.
pub(crate) struct Ctx<'a> {
    pub time: f64,
    pub dt: f64,
    pub ip: &'a InfectionParams,
    pub places: &'a mut Places,
    pub infection: &'a mut Infection,
    pub flu: &'a mut Flu,
}

#[derive(Default, Debug, PartialEq, Eq)]
pub(crate) struct Removal {
    pub recovered: u32,
    pub dead: u32,
}

pub(crate) fn susceptible_transitions(
    agent: &mut Agent,
    agents: &mut [Agent],
    ctx: &mut Ctx,
) -> Result<u32> {
    if agent.symptomatic_non_covid() {
        flu::susceptible_transitions(agent, agents, ctx)
    } else if agent.hospital_employee() {
        hsp_employee::susceptible_transitions(agent, ctx)
    } else if agent.hospital_non_covid_patient() {
        hsp_patient::susceptible_transitions(agent, ctx)
    } else {
        regular::susceptible_transitions(agent, ctx)
    }
}

pub(crate) fn exposed_transitions(agent: &mut Agent, ctx: &mut Ctx) -> Result<u32> {
    if agent.hospital_employee() {
        hsp_employee::exposed_transitions(agent, ctx)
    } else if agent.hospital_non_covid_patient() {
        hsp_patient::exposed_transitions(agent, ctx)
    } else {
        regular::exposed_transitions(agent, ctx)
    }
}

pub(crate) fn symptomatic_transitions(agent: &mut Agent, ctx: &mut Ctx) -> Result<Removal> {
    if agent.hospital_employee() {
        hsp_employee::symptomatic_transitions(agent, ctx)
    } else if agent.hospital_non_covid_patient() {
        hsp_patient::symptomatic_transitions(agent, ctx)
    } else {
        regular::symptomatic_transitions(agent, ctx)
    }
}

/// Exposure setup shared by every kind: infectiousness variability is
/// assigned by the caller, this draws the never-symptomatic branch and the
/// latency clock. Never-symptomatic agents stay exposed for latency plus
/// the recovery period.
pub(crate) fn recovery_and_incubation(
    agent: &mut Agent,
    infection: &mut Infection,
    ip: &InfectionParams,
    time: f64,
) {
    let never_symptomatic = infection.recovering_exposed();
    let latency = infection.latency();
    let non_infectious = ip.infectiousness_delay.min(latency);

    if never_symptomatic {
        states::set_susceptible_to_exposed_never_symptomatic(agent);
        agent.set_latency_duration(latency + ip.recovery_time);
    } else {
        states::set_susceptible_to_exposed(agent);
        agent.set_latency_duration(latency);
    }
    agent.set_latency_end_time(time);
    agent.set_infectiousness_start_time(time, non_infectious);
}

/// Symptom-onset removal draw: marks the agent dying with a sampled
/// onset-to-death time, or recovering after the fixed recovery period.
pub(crate) fn removal_settings(agent: &mut Agent, ctx: &mut Ctx) {
    if ctx.infection.will_die_non_icu(agent.age()) {
        states::set_dying_symptomatic(agent);
        let otd = ctx.infection.time_to_death();
        agent.set_time_to_death(otd);
        agent.set_death_time(ctx.time);
    } else {
        states::set_recovering_symptomatic(agent);
        agent.set_recovery_duration(ctx.ip.recovery_time);
        agent.set_recovery_time(ctx.time);
    }
}

/// Onset draw for agents already on a ward: same dying/recovering split,
/// but death times come from the hospitalization-to-death distribution.
pub(crate) fn removal_settings_in_hospital(agent: &mut Agent, ctx: &mut Ctx) {
    if ctx.infection.will_die_non_icu(agent.age()) {
        states::set_dying_symptomatic(agent);
        let htd = ctx.infection.get_hospitalization_to_death();
        agent.set_time_to_death(htd);
        agent.set_death_time(ctx.time);
    } else {
        states::set_recovering_symptomatic(agent);
        agent.set_recovery_duration(ctx.ip.recovery_time);
        agent.set_recovery_time(ctx.time);
    }
}

/// The test visit happened; results arrive after the processing delay.
pub(crate) fn testing_transitions(agent: &mut Agent, ctx: &Ctx) {
    agent.schedule_results(ctx.time, ctx.ip.results_delay);
    states::set_tested_to_awaiting_results(agent);
}

pub(crate) fn remove_from_workplaces_and_schools(agent: &Agent, places: &mut Places) -> Result<()> {
    if agent.student() {
        places.school_mut(agent.school_id()?)?.remove(agent.id());
    }
    if agent.works() {
        if agent.school_employee() {
            places.school_mut(agent.work_id()?)?.remove(agent.id());
        } else if agent.hospital_employee() {
            places.hospital_mut(agent.hospital_id()?)?.remove(agent.id());
        } else {
            places.workplace_mut(agent.work_id()?)?.remove(agent.id());
        }
    }
    Ok(())
}

pub(crate) fn add_to_workplaces_and_schools(agent: &Agent, places: &mut Places) -> Result<()> {
    if agent.student() {
        places.school_mut(agent.school_id()?)?.add(agent.id());
    }
    if agent.works() {
        if agent.school_employee() {
            places.school_mut(agent.work_id()?)?.add(agent.id());
        } else if agent.hospital_employee() {
            places.hospital_mut(agent.hospital_id()?)?.add(agent.id());
        } else {
            places.workplace_mut(agent.work_id()?)?.add(agent.id());
        }
    }
    Ok(())
}

/// Death removes the agent from everything it is registered in.
pub(crate) fn remove_agent_from_all_places(agent: &Agent, places: &mut Places) -> Result<()> {
    if agent.hospital_non_covid_patient() {
        places.hospital_mut(agent.hospital_id()?)?.remove(agent.id());
        if let Some(house) = agent.household() {
            places.household_mut(house)?.remove(agent.id());
        }
        return Ok(());
    }
    places
        .household_mut(agent.household_id()?)?
        .remove(agent.id());
    remove_from_workplaces_and_schools(agent, places)?;
    if agent.hospitalized() || agent.hospitalized_icu() {
        places.hospital_mut(agent.hospital_id()?)?.remove(agent.id());
    }
    Ok(())
}

/// Recovery hands the agent its public life back. Hospitalized agents move
/// from the ward to their household; the ICU never discharges directly.
pub(crate) fn add_agent_to_all_places(agent: &Agent, places: &mut Places) -> Result<()> {
    if agent.hospitalized_icu() {
        return Err(Error::invariant(format!(
            "agent {} attempting recovery directly from ICU",
            agent.id()
        )));
    }
    if agent.hospital_non_covid_patient() {
        // Still a patient of the same hospital; nothing moved.
        return Ok(());
    }
    add_to_workplaces_and_schools(agent, places)?;
    if agent.hospitalized() {
        places
            .household_mut(agent.household_id()?)?
            .add(agent.id());
        places.hospital_mut(agent.hospital_id()?)?.remove(agent.id());
    }
    Ok(())
}

/// Shared removal check run first for every symptomatic agent.
pub(crate) fn check_agent_removal(agent: &mut Agent, ctx: &mut Ctx) -> Result<Removal> {
    let mut removed = Removal::default();
    if agent.dying() && agent.time_of_death() <= ctx.time {
        removed.dead = 1;
        remove_agent_from_all_places(agent, ctx.places)?;
        states::set_any_to_removed(agent);
    } else if agent.recovering() && agent.recovery_time() <= ctx.time {
        removed.recovered = 1;
        if !agent.tested_false_negative() {
            add_agent_to_all_places(agent, ctx.places)?;
        }
        states::set_any_to_removed(agent);
    }
    Ok(removed)
}

/// Where a COVID admission goes: hospital staff and patients stay in
/// their own hospital, everyone else is assigned a random one.
fn admission_hospital(agent: &Agent, ctx: &mut Ctx) -> Result<usize> {
    if agent.hospital_employee() || agent.hospital_non_covid_patient() {
        agent.hospital_id()
    } else {
        ctx.infection.get_random_hospital_id(ctx.places.hospitals.len())
    }
}

/// Chooses the initial care setting for a confirmed symptomatic agent and
/// schedules the treatment clock.
pub(crate) fn select_initial_treatment(agent: &mut Agent, ctx: &mut Ctx) -> Result<()> {
    if ctx.infection.agent_hospitalized(agent.age()) {
        remove_agent_from_all_places(agent, ctx.places)?;
        let hospital = admission_hospital(agent, ctx)?;
        agent.hospital_id = Some(hospital);
        ctx.places.hospital_mut(hospital)?.add(agent.id());

        if ctx.infection.agent_hospitalized_icu(agent.age()) {
            if ctx.infection.will_die_icu() {
                states::set_icu_dying(agent);
                let otd = ctx.infection.time_to_death();
                agent.set_time_to_death(otd);
                agent.set_death_time(ctx.time);
            } else {
                states::set_icu_recovering(agent);
                let t_icu = ctx.ip.time_in_icu;
                let t_ward = ctx.ip.time_in_hospital_after_icu;
                agent.time_icu_to_hsp = ctx.time + t_icu;
                agent.time_hsp_to_ih = ctx.time + t_icu + t_ward;
                agent.set_recovery_duration(t_icu + t_ward);
                agent.set_recovery_time(ctx.time);
            }
        } else {
            states::set_hospitalized(agent);
            if agent.dying() {
                let margin = ctx.ip.death_to_icu_delay;
                agent.time_hsp_to_icu =
                    (agent.time_of_death() - margin).max(ctx.time + margin);
            } else {
                let t_out = ctx.time + ctx.ip.time_in_hospital;
                agent.time_hsp_to_ih = t_out;
                if agent.recovery_time() <= t_out {
                    agent.set_recovery_duration(ctx.ip.time_in_hospital);
                    agent.set_recovery_time(ctx.time);
                }
            }
        }
    } else {
        states::set_home_isolation(agent);
        if agent.dying() {
            let margin = ctx.ip.death_to_icu_delay;
            agent.time_ih_to_icu = (agent.time_of_death() - margin).max(ctx.time + margin);
        } else {
            let t_recovery = agent.recovery_time();
            let t_hsp = ctx.time + ctx.infection.get_onset_to_hospitalization();
            // Worth a ward only if it lands before recovery and further
            // out than one step; otherwise parked past recovery.
            if t_recovery > t_hsp && t_hsp > ctx.time + ctx.dt {
                agent.time_ih_to_hsp = t_hsp;
            } else {
                agent.time_ih_to_hsp = 2.0 * t_recovery;
            }
        }
    }
    Ok(())
}

/// At most one treatment move per step: ICU→HSP, HSP→ICU, HSP→IH,
/// IH→ICU, or IH→HSP, each at its scheduled time.
pub(crate) fn treatment_transitions(agent: &mut Agent, ctx: &mut Ctx) -> Result<()> {
    if agent.recovering() && agent.hospitalized_icu() {
        if agent.time_icu_to_hsp <= ctx.time {
            states::set_hospitalized(agent);
        }
    } else if agent.hospitalized() {
        if agent.dying() {
            if agent.time_hsp_to_icu <= ctx.time {
                states::set_icu_dying(agent);
            }
        } else if agent.time_hsp_to_ih <= ctx.time {
            states::set_home_isolation(agent);
            ctx.places
                .household_mut(agent.household_id()?)?
                .add(agent.id());
            ctx.places
                .hospital_mut(agent.hospital_id()?)?
                .remove(agent.id());
        }
    } else if agent.home_isolated() {
        if agent.dying() {
            if agent.time_ih_to_icu <= ctx.time {
                let hospital = admission_hospital(agent, ctx)?;
                agent.hospital_id = Some(hospital);
                ctx.places.hospital_mut(hospital)?.add(agent.id());
                ctx.places
                    .household_mut(agent.household_id()?)?
                    .remove(agent.id());
                states::set_icu_dying(agent);
            }
        } else {
            let t_hsp = agent.time_ih_to_hsp;
            if t_hsp >= ctx.dt && t_hsp <= ctx.time {
                let hospital = admission_hospital(agent, ctx)?;
                agent.hospital_id = Some(hospital);
                ctx.places.hospital_mut(hospital)?.add(agent.id());
                ctx.places
                    .household_mut(agent.household_id()?)?
                    .remove(agent.id());
                states::set_hospitalized(agent);
                let t_out = ctx.time + ctx.ip.time_in_hospital;
                agent.time_hsp_to_ih = t_out;
                if agent.recovery_time() <= t_out {
                    agent.set_recovery_duration(ctx.ip.time_in_hospital);
                    agent.set_recovery_time(ctx.time);
                }
            }
        }
    }
    Ok(())
}
