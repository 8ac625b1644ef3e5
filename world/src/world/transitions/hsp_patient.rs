//! Transitions for agents hospitalized with a non-COVID condition. Their
//! whole exposure comes from their hospital; testing happens on the ward,
//! and a confirmed case is treated in place, skipping the hospitalization
//! draw. Dying patients sample the hospitalization-to-death distribution.

use crate::error::Result;
use crate::world::agent::Agent;
use crate::world::place::Site;
use crate::world::states;
use crate::world::transitions::{
    check_agent_removal, recovery_and_incubation, removal_settings_in_hospital,
    testing_transitions, treatment_transitions, Ctx, Removal,
};

pub(crate) fn susceptible_transitions(agent: &mut Agent, ctx: &mut Ctx) -> Result<u32> {
    let lambda = ctx.places.hospital(agent.hospital_id()?)?.lambda();
    if !ctx.infection.infected(lambda) {
        return Ok(0);
    }
    agent.inf_var = ctx.infection.inf_variability();
    recovery_and_incubation(agent, ctx.infection, ctx.ip, ctx.time);
    if ctx.infection.will_be_tested(ctx.ip.frac_exposed_tested) {
        states::set_exposed_waiting_for_test_in_hospital(agent);
        agent.schedule_test(ctx.time, ctx.ip.test_delay);
    }
    Ok(1)
}

pub(crate) fn exposed_transitions(agent: &mut Agent, ctx: &mut Ctx) -> Result<u32> {
    if agent.tested_awaiting_test() && agent.time_of_test() <= ctx.time {
        testing_transitions(agent, ctx);
    }
    if agent.tested_awaiting_results() && agent.time_of_results() <= ctx.time {
        testing_results_transitions(agent, ctx)?;
    }

    let mut recovered = 0;
    if agent.latency_end_time() <= ctx.time {
        if agent.recovering_exposed() {
            states::set_exposed_never_symptomatic_to_removed(agent);
            recovered = 1;
        } else {
            states::set_exposed_to_symptomatic(agent);
            removal_settings_in_hospital(agent, ctx);
            if agent.tested_covid_positive() {
                select_initial_treatment(agent, ctx)?;
            } else {
                states::set_waiting_for_test_in_hospital(agent);
                agent.schedule_test(ctx.time, ctx.ip.test_delay);
            }
        }
    }
    Ok(recovered)
}

fn testing_results_transitions(agent: &mut Agent, ctx: &mut Ctx) -> Result<()> {
    if ctx
        .infection
        .false_negative_test_result(ctx.ip.frac_false_negative)
    {
        states::set_tested_false_negative(agent);
    } else if agent.exposed() {
        // Confirmed while exposed; treatment is selected at onset. The
        // contribution pass keeps routing them as a patient of their ward.
        states::set_home_isolation(agent);
        agent.covid_positive = true;
    } else {
        agent.covid_positive = true;
        select_initial_treatment(agent, ctx)?;
    }
    Ok(())
}

/// Patients are already in a hospital: the ward is the initial care
/// setting, only the ICU draw remains.
fn select_initial_treatment(agent: &mut Agent, ctx: &mut Ctx) -> Result<()> {
    if ctx.infection.agent_hospitalized_icu(agent.age()) {
        if ctx.infection.will_die_icu() {
            states::set_icu_dying(agent);
            let htd = ctx.infection.get_hospitalization_to_death();
            agent.set_time_to_death(htd);
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
            agent.time_hsp_to_icu = (agent.time_of_death() - margin).max(ctx.time + margin);
        } else {
            let t_out = ctx.time + ctx.ip.time_in_hospital;
            agent.time_hsp_to_ih = t_out;
            if agent.recovery_time() <= t_out {
                agent.set_recovery_duration(ctx.ip.time_in_hospital);
                agent.set_recovery_time(ctx.time);
            }
        }
    }
    Ok(())
}

pub(crate) fn symptomatic_transitions(agent: &mut Agent, ctx: &mut Ctx) -> Result<Removal> {
    let removed = check_agent_removal(agent, ctx)?;
    if agent.removed() || agent.tested_false_negative() {
        return Ok(removed);
    }
    if agent.tested_awaiting_test() && agent.time_of_test() <= ctx.time {
        testing_transitions(agent, ctx);
        return Ok(removed);
    }
    if agent.tested_awaiting_results() && agent.time_of_results() <= ctx.time {
        testing_results_transitions(agent, ctx)?;
        return Ok(removed);
    }
    if agent.being_treated() {
        treatment_transitions(agent, ctx)?;
    }
    Ok(removed)
}
