//! Named flag-cluster transitions.
//!
//! Every state change in the model goes through one of these functions so
//! each named transition always reaches the same flag configuration.
//! Callers never flip individual flags.

use crate::world::agent::Agent;

fn clear_testing_wait(agent: &mut Agent) {
    agent.is_tested = false;
    agent.awaiting_test = false;
    agent.awaiting_results = false;
    agent.test_in_car = false;
    agent.test_in_hospital = false;
}

pub fn set_susceptible_to_exposed(agent: &mut Agent) {
    agent.is_infected = true;
    agent.is_exposed = true;

    agent.is_recovering_exposed = false;
    agent.is_symptomatic = false;
    agent.will_die = false;
    agent.will_recover = false;
    agent.is_removed = false;
}

pub fn set_susceptible_to_exposed_never_symptomatic(agent: &mut Agent) {
    agent.is_infected = true;
    agent.is_exposed = true;
    agent.is_recovering_exposed = true;
    agent.will_recover = true;

    agent.is_symptomatic = false;
    agent.will_die = false;
    agent.is_removed = false;
}

pub fn set_exposed_never_symptomatic_to_removed(agent: &mut Agent) {
    set_any_to_removed(agent);
}

pub fn set_exposed_to_symptomatic(agent: &mut Agent) {
    agent.is_infected = true;
    agent.is_symptomatic = true;

    agent.is_exposed = false;
    agent.is_recovering_exposed = false;
    agent.will_die = false;
    agent.will_recover = false;
    agent.is_removed = false;
}

pub fn set_dying_symptomatic(agent: &mut Agent) {
    agent.will_die = true;
    agent.will_recover = false;
}

pub fn set_recovering_symptomatic(agent: &mut Agent) {
    agent.will_die = false;
    agent.will_recover = true;
}

/// Symptomatic (or ILI) agent booked for a hospital test; isolated at
/// home until the visit. A fresh episode supersedes an earlier false
/// negative.
pub fn set_waiting_for_test_in_hospital(agent: &mut Agent) {
    agent.is_tested = true;
    agent.awaiting_test = true;
    agent.awaiting_results = false;
    agent.test_in_hospital = true;
    agent.test_in_car = false;
    agent.is_home_isolated = true;
    agent.false_negative = false;
}

pub fn set_waiting_for_test_in_car(agent: &mut Agent) {
    agent.is_tested = true;
    agent.awaiting_test = true;
    agent.awaiting_results = false;
    agent.test_in_car = true;
    agent.test_in_hospital = false;
    agent.is_home_isolated = true;
    agent.false_negative = false;
}

/// Exposed agents are not home-isolated until symptoms; they only leave
/// schools and workplaces.
pub fn set_exposed_waiting_for_test_in_hospital(agent: &mut Agent) {
    agent.exposed_tested = true;
    agent.is_tested = true;
    agent.awaiting_test = true;
    agent.awaiting_results = false;
    agent.test_in_hospital = true;
    agent.test_in_car = false;
    agent.is_home_isolated = false;
}

pub fn set_exposed_waiting_for_test_in_car(agent: &mut Agent) {
    agent.exposed_tested = true;
    agent.is_tested = true;
    agent.awaiting_test = true;
    agent.awaiting_results = false;
    agent.test_in_car = true;
    agent.test_in_hospital = false;
    agent.is_home_isolated = false;
}

pub fn set_tested_to_awaiting_results(agent: &mut Agent) {
    agent.awaiting_test = false;
    agent.awaiting_results = true;
}

/// A false negative ends the testing episode and lifts the isolation.
pub fn set_tested_false_negative(agent: &mut Agent) {
    clear_testing_wait(agent);
    agent.false_negative = true;
    agent.is_home_isolated = false;
}

/// ILI false positive: isolated at home as if infected.
pub fn set_tested_false_positive(agent: &mut Agent) {
    clear_testing_wait(agent);
    agent.false_positive = true;
    agent.is_home_isolated = true;
}

/// ILI true negative: released back to normal life.
pub fn set_tested_negative(agent: &mut Agent) {
    clear_testing_wait(agent);
    agent.is_home_isolated = false;
}

/// Home isolation as the care setting, either an exposed agent confirmed
/// positive or a symptomatic agent whose treatment stays at home.
pub fn set_home_isolation(agent: &mut Agent) {
    clear_testing_wait(agent);
    agent.is_treated = true;
    agent.is_home_isolated = true;
    agent.is_hospitalized = false;
    agent.is_hospitalized_icu = false;
}

pub fn set_hospitalized(agent: &mut Agent) {
    clear_testing_wait(agent);
    agent.is_treated = true;
    agent.is_hospitalized = true;
    agent.is_home_isolated = false;
    agent.is_hospitalized_icu = false;
}

pub fn set_icu_recovering(agent: &mut Agent) {
    clear_testing_wait(agent);
    agent.is_treated = true;
    agent.is_hospitalized_icu = true;
    agent.is_hospitalized = false;
    agent.is_home_isolated = false;
    agent.will_die = false;
    agent.will_recover = true;
}

pub fn set_icu_dying(agent: &mut Agent) {
    clear_testing_wait(agent);
    agent.is_treated = true;
    agent.is_hospitalized_icu = true;
    agent.is_hospitalized = false;
    agent.is_home_isolated = false;
    agent.will_die = true;
    agent.will_recover = false;
}

pub fn set_any_to_removed(agent: &mut Agent) {
    agent.is_removed = true;

    agent.is_infected = false;
    agent.is_exposed = false;
    agent.is_recovering_exposed = false;
    agent.is_symptomatic = false;
    agent.will_die = false;
    agent.will_recover = false;

    agent.is_treated = false;
    agent.is_home_isolated = false;
    agent.is_hospitalized = false;
    agent.is_hospitalized_icu = false;
    clear_testing_wait(agent);
}

/// An ILI carrier caught COVID: shed the flu markers, the regular
/// exposure path takes over.
pub fn set_former_flu(agent: &mut Agent) {
    agent.is_symptomatic_non_covid = false;
    agent.false_positive = false;
    agent.is_home_isolated = false;
    clear_testing_wait(agent);
}

/// An ILI false positive finished its isolation: back to plain
/// susceptible; a replacement carrier is drawn separately.
pub fn reset_returning_flu(agent: &mut Agent) {
    agent.is_symptomatic_non_covid = false;
    agent.false_positive = false;
    agent.is_home_isolated = false;
    clear_testing_wait(agent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposed_and_symptomatic_stay_exclusive() {
        let mut agent = Agent::default();
        set_susceptible_to_exposed(&mut agent);
        assert!(agent.is_infected && agent.is_exposed && !agent.is_symptomatic);
        set_exposed_to_symptomatic(&mut agent);
        assert!(agent.is_infected && !agent.is_exposed && agent.is_symptomatic);
        set_any_to_removed(&mut agent);
        assert!(agent.is_removed && !agent.is_infected);
        assert!(!agent.is_exposed && !agent.is_symptomatic);
    }

    #[test]
    fn never_symptomatic_is_marked_recovering() {
        let mut agent = Agent::default();
        set_susceptible_to_exposed_never_symptomatic(&mut agent);
        assert!(agent.is_exposed && agent.is_recovering_exposed && agent.will_recover);
        set_exposed_never_symptomatic_to_removed(&mut agent);
        assert!(agent.is_removed && !agent.is_recovering_exposed);
    }

    #[test]
    fn dying_and_recovering_are_exclusive() {
        let mut agent = Agent::default();
        set_exposed_to_symptomatic(&mut agent);
        set_dying_symptomatic(&mut agent);
        assert!(agent.will_die && !agent.will_recover);
        set_recovering_symptomatic(&mut agent);
        assert!(!agent.will_die && agent.will_recover);
    }

    #[test]
    fn care_settings_are_exclusive() {
        let mut agent = Agent::default();
        set_exposed_to_symptomatic(&mut agent);
        set_recovering_symptomatic(&mut agent);
        set_icu_recovering(&mut agent);
        assert!(agent.is_hospitalized_icu && !agent.is_hospitalized && !agent.is_home_isolated);
        set_hospitalized(&mut agent);
        assert!(!agent.is_hospitalized_icu && agent.is_hospitalized && !agent.is_home_isolated);
        set_home_isolation(&mut agent);
        assert!(!agent.is_hospitalized_icu && !agent.is_hospitalized && agent.is_home_isolated);
        assert!(agent.is_treated);
    }

    #[test]
    fn testing_episode_flags_are_consistent() {
        let mut agent = Agent::default();
        set_susceptible_to_exposed(&mut agent);
        set_exposed_waiting_for_test_in_hospital(&mut agent);
        assert!(agent.is_tested && agent.awaiting_test && agent.test_in_hospital);
        assert!(agent.exposed_tested && !agent.is_home_isolated);
        set_tested_to_awaiting_results(&mut agent);
        assert!(!agent.awaiting_test && agent.awaiting_results);
        set_tested_false_negative(&mut agent);
        assert!(agent.false_negative && !agent.is_tested && !agent.awaiting_results);
    }

    #[test]
    fn symptomatic_testees_are_isolated_at_home() {
        let mut agent = Agent::default();
        set_exposed_to_symptomatic(&mut agent);
        set_waiting_for_test_in_car(&mut agent);
        assert!(agent.is_home_isolated && agent.test_in_car && !agent.test_in_hospital);
    }

    #[test]
    fn flu_markers_reset_cleanly() {
        let mut agent = Agent::default();
        agent.is_symptomatic_non_covid = true;
        set_waiting_for_test_in_hospital(&mut agent);
        set_tested_to_awaiting_results(&mut agent);
        set_tested_false_positive(&mut agent);
        assert!(agent.false_positive && agent.is_home_isolated);
        reset_returning_flu(&mut agent);
        assert!(!agent.is_symptomatic_non_covid && !agent.false_positive);
        assert!(!agent.is_home_isolated && !agent.is_tested);
    }
}
