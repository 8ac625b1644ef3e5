//! Transitions for hospital staff. Their workplace pressure comes from
//! their hospital, they always test there, and symptom onset pulls them
//! out of circulation immediately.

use crate::error::{Error, Result};
use crate::world::agent::Agent;
use crate::world::place::Site;
use crate::world::states;
use crate::world::transitions::{
    add_to_workplaces_and_schools, check_agent_removal, recovery_and_incubation,
    remove_from_workplaces_and_schools, removal_settings, select_initial_treatment,
    testing_transitions, treatment_transitions, Ctx, Removal,
};

pub(crate) fn susceptible_transitions(agent: &mut Agent, ctx: &mut Ctx) -> Result<u32> {
    let lambda = susceptible_lambda(agent, ctx)?;
    if !ctx.infection.infected(lambda) {
        return Ok(0);
    }
    agent.inf_var = ctx.infection.inf_variability();
    recovery_and_incubation(agent, ctx.infection, ctx.ip, ctx.time);
    set_testing_status(agent, ctx);
    Ok(1)
}

fn susceptible_lambda(agent: &Agent, ctx: &Ctx) -> Result<f64> {
    let mut lambda = ctx.places.household(agent.household_id()?)?.lambda();
    lambda += ctx.places.hospital(agent.hospital_id()?)?.lambda();
    if agent.student() {
        lambda += ctx.places.school(agent.school_id()?)?.lambda();
    }
    Ok(lambda)
}

/// Staff test in their own hospital. Exposure testing is a draw with no
/// isolation until symptoms; onset testing is certain.
fn set_testing_status(agent: &mut Agent, ctx: &mut Ctx) {
    if agent.exposed() {
        if ctx.infection.will_be_tested(ctx.ip.frac_exposed_tested) {
            states::set_exposed_waiting_for_test_in_hospital(agent);
            agent.schedule_test(ctx.time, ctx.ip.test_delay);
        }
    } else if agent.symptomatic() {
        states::set_waiting_for_test_in_hospital(agent);
        agent.schedule_test(ctx.time, ctx.ip.test_delay);
    }
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
            // Out of the ward and the classroom from the first symptom.
            remove_from_workplaces_and_schools(agent, ctx.places)?;
            removal_settings(agent, ctx);
            if agent.tested_covid_positive() {
                select_initial_treatment(agent, ctx)?;
            } else {
                set_testing_status(agent, ctx);
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
        if agent.symptomatic() {
            add_to_workplaces_and_schools(agent, ctx.places)?;
        }
    } else if agent.exposed() {
        states::set_home_isolation(agent);
        remove_from_workplaces_and_schools(agent, ctx.places)?;
        agent.covid_positive = true;
    } else {
        agent.covid_positive = true;
        select_initial_treatment(agent, ctx)?;
    }
    Ok(())
}

pub(crate) fn symptomatic_transitions(agent: &mut Agent, ctx: &mut Ctx) -> Result<Removal> {
    if !(agent.tested_false_negative() || agent.home_isolated() || agent.being_treated()) {
        return Err(Error::invariant(format!(
            "symptomatic hospital employee {} neither isolated, treated, nor false negative",
            agent.id()
        )));
    }
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
