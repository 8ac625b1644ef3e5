//! End-to-end scenarios over the public API, seed-fixed.

use math::Point;
use world::util::random::seeded_rng;
use world::world::agent::Agent;
use world::world::commons::InfectionParams;
use world::world::infection::{AgeBands, AgeTables};
use world::world::place::{Household, Hospital, Places, School, SchoolKind, Workplace};
use world::world::World;

const DT: f64 = 0.25;

fn base_params() -> InfectionParams {
    InfectionParams {
        household_rate: 0.0,
        household_alpha: 0.8,
        home_isolated_rate: 0.0,
        school_rate: 0.0,
        school_employee_rate: 0.0,
        workplace_rate: 0.0,
        severity_correction: 2.0,
        work_absenteeism: 0.1,
        school_employee_absenteeism: 0.1,
        daycare_absenteeism: 0.1,
        primary_middle_absenteeism: 0.1,
        high_school_absenteeism: 0.1,
        college_absenteeism: 0.1,
        hospital_employee_rate: 0.0,
        hospital_patient_rate: 0.0,
        hospital_testee_rate: 0.0,
        hospitalized_rate: 0.0,
        hospitalized_icu_rate: 0.0,
        latency_mean: 1.0,
        latency_std: 0.1,
        variability_shape: 16.0,
        variability_scale: 0.0625,
        otd_mean: 1.0,
        otd_std: 0.3,
        oth_shape: 2.0,
        oth_scale: 2.0,
        htd_shape: 1.5,
        htd_scale: 2.0,
        frac_never_symptomatic: 0.0,
        frac_sy_tested: 0.0,
        frac_exposed_tested: 0.0,
        frac_tested_in_hospitals: 0.0,
        frac_false_negative: 0.0,
        frac_false_positive: 0.0,
        prob_death_icu: 0.0,
        frac_with_flu: 0.0,
        infectiousness_delay: 0.5,
        test_delay: 1.0,
        results_delay: 1.5,
        recovery_time: 10.0,
        time_in_icu: 4.0,
        time_in_hospital: 5.0,
        time_in_hospital_after_icu: 3.0,
        death_to_icu_delay: 1.0,
    }
}

fn flat_tables(mortality: f64, hospitalization: f64, icu: f64) -> AgeTables {
    AgeTables {
        mortality: AgeBands::new(vec![(0, 120, mortality)]).unwrap(),
        hospitalization: AgeBands::new(vec![(0, 120, hospitalization)]).unwrap(),
        icu: AgeBands::new(vec![(0, 120, icu)]).unwrap(),
    }
}

fn resident(age: u32, house: usize, infected: bool) -> Agent {
    Agent::new(
        false,
        false,
        age,
        Point::default(),
        Some(house),
        false,
        None,
        false,
        None,
        false,
        None,
        infected,
    )
}

fn assert_counter_identity(world: &World) {
    assert_eq!(
        world.total_infected() - world.total_recovered() - world.total_dead(),
        world.num_infected(),
        "counter identity broken at t={}",
        world.time()
    );
}

fn assert_exclusivity(world: &World) {
    for agent in world.agents() {
        assert!(!(agent.exposed() && agent.symptomatic()));
        assert!(!(agent.removed() && agent.infected()));
    }
}

/// 100 agents, 10 households, every rate zero, nobody infected: nothing
/// may ever happen.
#[test]
fn empty_world_stays_empty() {
    let params = base_params();
    let mut places = Places::default();
    for id in 1..=10 {
        places
            .households
            .push(Household::new(id, Point::default(), &params));
    }
    let agents: Vec<Agent> = (0..100).map(|i| resident(30, i % 10 + 1, false)).collect();
    let mut world = World::new(
        DT,
        params,
        flat_tables(0.0, 0.0, 0.0),
        places,
        agents,
        seeded_rng(Some(1)),
    )
    .unwrap();

    for _ in 0..400 {
        world.step().unwrap();
        assert_eq!(world.num_infected(), 0);
        assert_eq!(world.total_infected(), 0);
        assert_eq!(world.total_dead(), 0);
        assert_eq!(world.total_recovered(), 0);
        assert_counter_identity(&world);
    }
    assert_eq!(world.num_susceptible(), 100);
}

/// Four agents in one household with a hot β: the outbreak sweeps the
/// household and burns out.
#[test]
fn single_household_outbreak_burns_out() {
    let mut params = base_params();
    params.household_rate = 0.9;
    params.household_alpha = 0.8;
    let mut places = Places::default();
    places
        .households
        .push(Household::new(1, Point::default(), &params));
    let agents: Vec<Agent> = (0..4).map(|i| resident(30, 1, i == 0)).collect();
    let mut world = World::new(
        DT,
        params,
        flat_tables(0.0, 0.0, 0.0),
        places,
        agents,
        seeded_rng(Some(7)),
    )
    .unwrap();

    let mut was_exposed = [false; 4];
    for _ in 0..200 {
        world.step().unwrap();
        for (i, agent) in world.agents().iter().enumerate() {
            if agent.exposed() {
                was_exposed[i] = true;
            }
        }
        assert_counter_identity(&world);
        assert_exclusivity(&world);
    }

    assert!(was_exposed.iter().all(|&e| e), "not every agent was exposed");
    assert_eq!(world.total_infected(), 4);
    assert_eq!(world.num_removed(), 4);
    assert_eq!(
        world.total_dead() + world.total_recovered(),
        world.total_infected()
    );
}

/// 1000 isolated agents aged 85 under a 0.9 mortality band: the dead
/// fraction lands on the band probability.
#[test]
fn mortality_band_drives_the_death_fraction() {
    let mut params = base_params();
    // Latency short enough that everyone is symptomatic within a step.
    params.latency_mean = -5.0;
    params.latency_std = 0.01;
    let mut places = Places::default();
    for id in 1..=1000 {
        places
            .households
            .push(Household::new(id, Point::default(), &params));
    }
    let agents: Vec<Agent> = (0..1000).map(|i| resident(85, i + 1, true)).collect();
    let tables = AgeTables {
        mortality: AgeBands::new(vec![(0, 79, 0.0), (80, 120, 0.9)]).unwrap(),
        hospitalization: AgeBands::new(vec![(0, 120, 0.0)]).unwrap(),
        icu: AgeBands::new(vec![(0, 120, 0.0)]).unwrap(),
    };
    let mut world = World::new(DT, params, tables, places, agents, seeded_rng(Some(3))).unwrap();

    for _ in 0..200 {
        world.step().unwrap();
        assert_counter_identity(&world);
    }
    assert_eq!(world.total_infected(), 1000);
    assert_eq!(
        world.total_dead() + world.total_recovered(),
        world.total_infected()
    );
    let dead_fraction = world.total_dead() as f64 / world.total_infected() as f64;
    assert!(
        (0.88..=0.92).contains(&dead_fraction),
        "dead fraction {dead_fraction} outside [0.88, 0.92]"
    );
}

/// A freshly exposed agent who tests must get its test exactly one
/// decision delay after exposure and the results one processing delay
/// after the visit.
#[test]
fn testing_times_follow_exposure() {
    let mut params = base_params();
    params.household_rate = 20.0;
    params.household_alpha = 0.0;
    params.frac_exposed_tested = 1.0;
    params.frac_tested_in_hospitals = 0.0;
    let mut places = Places::default();
    places
        .households
        .push(Household::new(1, Point::default(), &params));
    let agents = vec![resident(30, 1, true), resident(30, 1, false)];
    let mut world = World::new(
        DT,
        params,
        flat_tables(0.0, 0.0, 0.0),
        places,
        agents,
        seeded_rng(Some(11)),
    )
    .unwrap();

    let mut exposure_time = None;
    for _ in 0..200 {
        let before = world.time();
        world.step().unwrap();
        let agent = &world.agents()[1];
        if exposure_time.is_none() && agent.exposed() {
            exposure_time = Some(before);
            assert!(agent.tested_awaiting_test());
            assert!((agent.time_of_test() - (before + 1.0)).abs() < 1e-9);
        }
        if let Some(t_exp) = exposure_time {
            if agent.tested_awaiting_results() {
                assert!((agent.time_of_results() - (t_exp + 1.0 + 1.5)).abs() < 1e-9);
                return;
            }
        }
    }
    panic!("the second agent was never exposed and tested");
}

/// 10% of the susceptible population carries ILI; infected carriers are
/// swapped out one-for-one while replacements remain.
#[test]
fn ili_pool_stays_level_through_swaps() {
    let mut params = base_params();
    params.household_rate = 5.0;
    params.household_alpha = 0.0;
    params.frac_with_flu = 0.1;
    let mut places = Places::default();
    places
        .households
        .push(Household::new(1, Point::default(), &params));
    // One seed infection plus 200 susceptibles in one big household.
    let mut agents = vec![resident(30, 1, true)];
    agents.extend((0..200).map(|_| resident(30, 1, false)));
    let mut world = World::new(
        DT,
        params,
        flat_tables(0.0, 0.0, 0.0),
        places,
        agents,
        seeded_rng(Some(23)),
    )
    .unwrap();

    assert_eq!(world.flu().flu_ids().len(), 20);
    let flagged = world
        .agents()
        .iter()
        .filter(|a| a.symptomatic_non_covid())
        .count();
    assert_eq!(flagged, 20);

    for _ in 0..200 {
        world.step().unwrap();
        let flagged: Vec<usize> = world
            .agents()
            .iter()
            .filter(|a| a.symptomatic_non_covid())
            .map(Agent::id)
            .collect();
        // The pool and the flags describe the same set, and no carrier
        // is simultaneously COVID-infected.
        assert_eq!(flagged.len(), world.flu().flu_ids().len());
        for id in &flagged {
            let agent = &world.agents()[id - 1];
            assert!(!agent.infected());
        }
        if !world.flu().susceptible_ids().is_empty() {
            assert_eq!(flagged.len(), 20, "pool shrank while replacements remained");
        }
        assert_counter_identity(&world);
    }
}

/// Full-surface run: schools, workplaces, a hospital with staff and
/// patients, testing, ILI, and nonzero severity paths. The run must stay
/// free of invariant violations with the bookkeeping identities intact.
#[test]
fn mixed_world_long_run_keeps_its_invariants() {
    let mut params = base_params();
    params.household_rate = 1.2;
    params.home_isolated_rate = 0.4;
    params.school_rate = 0.8;
    params.school_employee_rate = 0.6;
    params.workplace_rate = 0.7;
    params.hospital_employee_rate = 0.6;
    params.hospital_patient_rate = 0.8;
    params.hospital_testee_rate = 1.0;
    params.hospitalized_rate = 0.3;
    params.hospitalized_icu_rate = 0.3;
    params.frac_never_symptomatic = 0.2;
    params.frac_sy_tested = 0.7;
    params.frac_exposed_tested = 0.4;
    params.frac_tested_in_hospitals = 0.5;
    params.frac_false_negative = 0.1;
    params.frac_false_positive = 0.1;
    params.prob_death_icu = 0.5;
    params.frac_with_flu = 0.05;

    let mut places = Places::default();
    for id in 1..=20 {
        places
            .households
            .push(Household::new(id, Point::default(), &params));
    }
    places
        .schools
        .push(School::new(1, Point::default(), SchoolKind::Primary, &params));
    places
        .workplaces
        .push(Workplace::new(1, Point::default(), &params));
    places
        .hospitals
        .push(Hospital::new(1, Point::default(), &params));

    let mut agents = Vec::new();
    for i in 0..100usize {
        let house = i % 20 + 1;
        let agent = match i % 10 {
            // students
            0 | 1 => Agent::new(
                true,
                false,
                12,
                Point::default(),
                Some(house),
                false,
                Some(1),
                false,
                None,
                false,
                None,
                i == 0,
            ),
            // a school employee
            2 => Agent::new(
                false,
                true,
                40,
                Point::default(),
                Some(house),
                false,
                None,
                true,
                Some(1),
                false,
                None,
                false,
            ),
            // hospital staff
            3 => Agent::new(
                false,
                true,
                35,
                Point::default(),
                Some(house),
                false,
                None,
                false,
                None,
                true,
                Some(1),
                false,
            ),
            // a non-COVID patient
            4 => Agent::new(
                false,
                false,
                70,
                Point::default(),
                Some(house),
                true,
                None,
                false,
                None,
                false,
                Some(1),
                false,
            ),
            // office workers
            5 | 6 => Agent::new(
                false,
                true,
                45,
                Point::default(),
                Some(house),
                false,
                None,
                false,
                Some(1),
                false,
                None,
                false,
            ),
            // the elderly and unemployed
            _ => resident(65 + (i % 3) as u32 * 10, house, false),
        };
        agents.push(agent);
    }

    let mut world = World::new(
        DT,
        params,
        flat_tables(0.4, 0.3, 0.5),
        places,
        agents,
        seeded_rng(Some(1234)),
    )
    .unwrap();

    for _ in 0..400 {
        world.step().unwrap();
        assert_counter_identity(&world);
        assert_exclusivity(&world);
        for agent in world.agents() {
            if agent.removed() {
                assert!(!agent.infected());
            }
            if agent.hospitalized_icu() {
                assert!(agent.being_treated());
            }
        }
    }
    assert!(world.total_infected() >= 1);
    assert_eq!(
        world.total_infected() - world.total_recovered() - world.total_dead(),
        world.num_infected()
    );
}
