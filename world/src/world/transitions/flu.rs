//! Transitions for ILI carriers: symptomatic without COVID, still
//! susceptible, competing for tests. A carrier who catches COVID is
//! swapped out of the pool and a fresh susceptible takes its place so ILI
//! prevalence stays level.

use crate::error::Result;
use crate::world::agent::Agent;
use crate::world::place::Site;
use crate::world::states;
use crate::world::transitions::{
    add_to_workplaces_and_schools, recovery_and_incubation, regular,
    remove_from_workplaces_and_schools, testing_transitions, Ctx,
};

pub(crate) fn susceptible_transitions(
    agent: &mut Agent,
    agents: &mut [Agent],
    ctx: &mut Ctx,
) -> Result<u32> {
    let lambda = susceptible_lambda(agent, ctx)?;
    if ctx.infection.infected(lambda) {
        if let Some(new_id) = ctx.flu.swap_flu_agent(agent.id(), ctx.infection) {
            process_new_flu(&mut agents[new_id - 1], ctx)?;
        }
        states::set_former_flu(agent);
        agent.inf_var = ctx.infection.inf_variability();
        recovery_and_incubation(agent, ctx.infection, ctx.ip, ctx.time);
        regular::set_testing_status_exposed(agent, ctx)?;
        return Ok(1);
    }

    if agent.tested_awaiting_test() && agent.time_of_test() <= ctx.time {
        testing_transitions(agent, ctx);
    }
    if agent.tested_awaiting_results() && agent.time_of_results() <= ctx.time {
        testing_results_transitions(agent, ctx)?;
    }
    // A false positive sat out its isolation; back to normal life and out
    // of the flu pool, replacement drawn.
    if agent.tested_false_positive() && agent.home_isolated() && agent.recovery_time() <= ctx.time
    {
        states::reset_returning_flu(agent);
        add_to_workplaces_and_schools(agent, ctx.places)?;
        if let Some(new_id) = ctx.flu.swap_flu_agent(agent.id(), ctx.infection) {
            process_new_flu(&mut agents[new_id - 1], ctx)?;
        }
    }
    Ok(0)
}

fn susceptible_lambda(agent: &Agent, ctx: &Ctx) -> Result<f64> {
    let house = ctx.places.household(agent.household_id()?)?.lambda();
    if agent.tested_awaiting_test() && agent.tested_in_hospital() && agent.time_of_test() <= ctx.time
    {
        return Ok(ctx.places.hospital(agent.hospital_id()?)?.lambda());
    }
    if agent.tested_awaiting_test() || agent.tested_awaiting_results() || agent.tested_false_positive()
    {
        return Ok(house);
    }
    let mut lambda = house;
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

/// Marks a fresh ILI carrier and runs its testing draw: chosen carriers
/// isolate from public places and queue for a hospital or car test.
pub(crate) fn process_new_flu(agent: &mut Agent, ctx: &mut Ctx) -> Result<()> {
    agent.is_symptomatic_non_covid = true;
    if !ctx.infection.will_be_tested(ctx.ip.frac_sy_tested) {
        return Ok(());
    }
    remove_from_workplaces_and_schools(agent, ctx.places)?;
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
    agent.schedule_test(ctx.time, ctx.ip.test_delay);
    Ok(())
}

fn testing_results_transitions(agent: &mut Agent, ctx: &mut Ctx) -> Result<()> {
    if ctx
        .infection
        .false_positive_test_result(ctx.ip.frac_false_positive)
    {
        states::set_tested_false_positive(agent);
        agent.set_recovery_duration(ctx.ip.recovery_time);
        agent.set_recovery_time(ctx.time);
    } else {
        states::set_tested_negative(agent);
        add_to_workplaces_and_schools(agent, ctx.places)?;
    }
    Ok(())
}
