//! Transitions for the general agent: household plus optional school and
//! workplace, testing by draw at exposure and at onset.

use crate::error::Result;
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
    ctx.flu.remove_susceptible(agent.id());
    agent.inf_var = ctx.infection.inf_variability();
    recovery_and_incubation(agent, ctx.infection, ctx.ip, ctx.time);
    set_testing_status_exposed(agent, ctx)?;
    Ok(1)
}

fn susceptible_lambda(agent: &Agent, ctx: &Ctx) -> Result<f64> {
    let mut lambda = ctx.places.household(agent.household_id()?)?.lambda();
    if agent.student() {
        lambda += ctx.places.school(agent.school_id()?)?.lambda();
    }
    if agent.works() {
        if agent.school_employee() {
            lambda += ctx.places.school(agent.work_id()?)?.lambda();
        } else {
            lambda += ctx.places.workplace(agent.work_id()?)?.lambda();
        }
    }
    Ok(lambda)
}

/// Exposed testing is a draw; chosen agents leave schools and workplaces
/// (never their household) and are booked into a hospital or a car queue.
pub(crate) fn set_testing_status_exposed(agent: &mut Agent, ctx: &mut Ctx) -> Result<()> {
    if !ctx.infection.will_be_tested(ctx.ip.frac_exposed_tested) {
        return Ok(());
    }
    if !ctx.places.hospitals.is_empty()
        && ctx
            .infection
            .tested_in_hospital(ctx.ip.frac_tested_in_hospitals)
    {
        states::set_exposed_waiting_for_test_in_hospital(agent);
        let hospital = ctx
            .infection
            .get_random_hospital_id(ctx.places.hospitals.len())?;
        agent.hospital_id = Some(hospital);
    } else {
        states::set_exposed_waiting_for_test_in_car(agent);
    }
    remove_from_workplaces_and_schools(agent, ctx.places)?;
    agent.schedule_test(ctx.time, ctx.ip.test_delay);
    Ok(())
}

fn set_testing_status_symptomatic(agent: &mut Agent, ctx: &mut Ctx) -> Result<()> {
    if !ctx.infection.will_be_tested(ctx.ip.frac_sy_tested) {
        return Ok(());
    }
    if !ctx.places.hospitals.is_empty()
        && ctx
            .infection
            .tested_in_hospital(ctx.ip.frac_tested_in_hospitals)
    {
        states::set_waiting_for_test_in_hospital(agent);
        let hospital = ctx
            .infection
            .get_random_hospital_id(ctx.places.hospitals.len())?;
        agent.hospital_id = Some(hospital);
    } else {
        states::set_waiting_for_test_in_car(agent);
    }
    remove_from_workplaces_and_schools(agent, ctx.places)?;
    agent.schedule_test(ctx.time, ctx.ip.test_delay);
    Ok(())
}

pub(crate) fn exposed_transitions(agent: &mut Agent, ctx: &mut Ctx) -> Result<u32> {
    if agent.tested_awaiting_test() && agent.time_of_test() <= ctx.time {
        testing_transitions(agent, ctx);
    }
    // Results can land in the same step the visit happened.
    if agent.tested_awaiting_results() && agent.time_of_results() <= ctx.time {
        testing_results_exposed(agent, ctx)?;
    }

    let mut recovered = 0;
    if agent.latency_end_time() <= ctx.time {
        if agent.recovering_exposed() {
            states::set_exposed_never_symptomatic_to_removed(agent);
            recovered = 1;
        } else {
            states::set_exposed_to_symptomatic(agent);
            if !agent.tested_exposed() || agent.tested_false_negative() {
                set_testing_status_symptomatic(agent, ctx)?;
            }
            removal_settings(agent, ctx);
            if agent.tested_covid_positive() {
                select_initial_treatment(agent, ctx)?;
            }
        }
    }
    Ok(recovered)
}

fn testing_results_exposed(agent: &mut Agent, ctx: &mut Ctx) -> Result<()> {
    if ctx
        .infection
        .false_negative_test_result(ctx.ip.frac_false_negative)
    {
        states::set_tested_false_negative(agent);
        add_to_workplaces_and_schools(agent, ctx.places)?;
    } else {
        // Confirmed while exposed: isolated at home until onset.
        states::set_home_isolation(agent);
        agent.covid_positive = true;
    }
    Ok(())
}

fn testing_results_symptomatic(agent: &mut Agent, ctx: &mut Ctx) -> Result<()> {
    if ctx
        .infection
        .false_negative_test_result(ctx.ip.frac_false_negative)
    {
        states::set_tested_false_negative(agent);
        add_to_workplaces_and_schools(agent, ctx.places)?;
    } else {
        agent.covid_positive = true;
        select_initial_treatment(agent, ctx)?;
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
        testing_results_symptomatic(agent, ctx)?;
        return Ok(removed);
    }
    if agent.being_treated() {
        treatment_transitions(agent, ctx)?;
    }
    Ok(removed)
}
