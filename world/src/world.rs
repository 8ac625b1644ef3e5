//! The simulation world: agents, places, the sampler, and the clock.
//!
//! One [`World::step`] runs the cycle from the model definition:
//! contribution accumulation and finalization, state transitions in agent
//! ID order, accumulator reset, time advance. Everything is
//! single-threaded; transitions observe the λ values produced earlier in
//! the same step and never each other.

pub mod agent;
pub mod commons;
pub mod contributions;
pub mod flu;
pub mod infection;
pub mod place;
pub mod states;
pub(crate) mod transitions;

use rand::rngs::StdRng;

use crate::error::{Error, Result};
use crate::stat::{HealthCount, HealthType, Stat};
use self::agent::Agent;
use self::commons::InfectionParams;
use self::flu::Flu;
use self::infection::{AgeTables, Infection};
use self::place::{Places, Site};

pub struct World {
    agents: Vec<Agent>,
    places: Places,
    infection: Infection,
    flu: Flu,
    params: InfectionParams,
    time: f64,
    dt: f64,
    n_infected_tot: u32,
    n_recovered_tot: u32,
    n_dead_tot: u32,
    stat: Stat,
}

enum Outcome {
    Infected(u32),
    Recovered(u32),
    Removed(transitions::Removal),
}

impl World {
    /// Builds the world: assigns IDs by position, registers every agent
    /// in its places, sets up the initially infected as exposed, and
    /// seeds the ILI pool.
    pub fn new(
        dt: f64,
        params: InfectionParams,
        tables: AgeTables,
        mut places: Places,
        mut agents: Vec<Agent>,
        rng: StdRng,
    ) -> Result<Self> {
        let mut infection = Infection::new(dt, &params, tables, rng)?;
        let mut flu = Flu::default();
        let mut n_infected_tot = 0;

        for (i, agent) in agents.iter_mut().enumerate() {
            agent.set_id(i + 1);
            register_agent(agent, &mut places)?;
            if agent.infected() {
                n_infected_tot += 1;
                agent.inf_var = infection.inf_variability();
                transitions::recovery_and_incubation(agent, &mut infection, &params, 0.0);
            } else if !agent.hospital_employee() && !agent.hospital_non_covid_patient() {
                flu.add_susceptible(agent.id());
            }
        }

        let carriers = flu.generate(params.frac_with_flu, &mut infection);
        {
            let mut ctx = transitions::Ctx {
                time: 0.0,
                dt,
                ip: &params,
                places: &mut places,
                infection: &mut infection,
                flu: &mut flu,
            };
            for id in carriers {
                transitions::flu::process_new_flu(&mut agents[id - 1], &mut ctx)?;
            }
        }

        let mut world = Self {
            agents,
            places,
            infection,
            flu,
            params,
            time: 0.0,
            dt,
            n_infected_tot,
            n_recovered_tot: 0,
            n_dead_tot: 0,
            stat: Stat::default(),
        };
        world.record_counts();
        Ok(world)
    }

    /// One indivisible step: contribute, transition, reset, advance.
    pub fn step(&mut self) -> Result<()> {
        contributions::compute_place_contributions(&self.agents, &mut self.places, self.time)?;
        self.compute_state_transitions()?;
        contributions::reset_sums(&mut self.places);
        self.time += self.dt;
        self.record_counts();
        Ok(())
    }

    fn compute_state_transitions(&mut self) -> Result<()> {
        for i in 0..self.agents.len() {
            if self.agents[i].removed() {
                continue;
            }
            // The agent is moved out for the duration of its transition so
            // the ILI swap may touch any other agent in the vector.
            let mut agent = std::mem::take(&mut self.agents[i]);
            let outcome = {
                let mut ctx = transitions::Ctx {
                    time: self.time,
                    dt: self.dt,
                    ip: &self.params,
                    places: &mut self.places,
                    infection: &mut self.infection,
                    flu: &mut self.flu,
                };
                if !agent.infected() {
                    transitions::susceptible_transitions(&mut agent, &mut self.agents, &mut ctx)
                        .map(Outcome::Infected)
                } else if agent.exposed() {
                    transitions::exposed_transitions(&mut agent, &mut ctx).map(Outcome::Recovered)
                } else if agent.symptomatic() {
                    transitions::symptomatic_transitions(&mut agent, &mut ctx)
                        .map(Outcome::Removed)
                } else {
                    Err(Error::invariant(format!(
                        "agent {} has no infection-related state",
                        agent.id()
                    )))
                }
            };
            self.agents[i] = agent;
            match outcome? {
                Outcome::Infected(n) => self.n_infected_tot += n,
                Outcome::Recovered(n) => self.n_recovered_tot += n,
                Outcome::Removed(removal) => {
                    self.n_recovered_tot += removal.recovered;
                    self.n_dead_tot += removal.dead;
                }
            }
        }
        Ok(())
    }

    fn record_counts(&mut self) {
        let mut counts = HealthCount::default();
        for agent in &self.agents {
            if agent.exposed() {
                counts[HealthType::Exposed] += 1;
            } else if agent.symptomatic() {
                counts[HealthType::Symptomatic] += 1;
            } else if !agent.removed() {
                counts[HealthType::Susceptible] += 1;
            }
        }
        counts[HealthType::Recovered] = self.n_recovered_tot;
        counts[HealthType::Dead] = self.n_dead_tot;
        self.stat.push(counts);
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn places(&self) -> &Places {
        &self.places
    }

    pub fn flu(&self) -> &Flu {
        &self.flu
    }

    pub fn stat(&self) -> &Stat {
        &self.stat
    }

    pub fn num_infected(&self) -> u32 {
        self.agents.iter().filter(|a| a.infected()).count() as u32
    }

    pub fn num_exposed(&self) -> u32 {
        self.agents.iter().filter(|a| a.exposed()).count() as u32
    }

    pub fn num_susceptible(&self) -> u32 {
        self.agents
            .iter()
            .filter(|a| !a.infected() && !a.removed())
            .count() as u32
    }

    pub fn num_removed(&self) -> u32 {
        self.agents.iter().filter(|a| a.removed()).count() as u32
    }

    pub fn total_infected(&self) -> u32 {
        self.n_infected_tot
    }

    pub fn total_dead(&self) -> u32 {
        self.n_dead_tot
    }

    pub fn total_recovered(&self) -> u32 {
        self.n_recovered_tot
    }
}

/// Registration at build time. Non-COVID patients live in their hospital;
/// everyone else needs a household, plus school and work memberships.
fn register_agent(agent: &Agent, places: &mut Places) -> Result<()> {
    let infected = agent.infected();
    if agent.hospital_non_covid_patient() {
        places
            .hospital_mut(agent.hospital_id()?)?
            .register(agent.id(), infected);
        return Ok(());
    }
    places
        .household_mut(agent.household_id()?)?
        .register(agent.id(), infected);
    if agent.student() {
        places
            .school_mut(agent.school_id()?)?
            .register(agent.id(), infected);
    }
    if agent.works() {
        if agent.school_employee() {
            places
                .school_mut(agent.work_id()?)?
                .register(agent.id(), infected);
        } else if agent.hospital_employee() {
            places
                .hospital_mut(agent.hospital_id()?)?
                .register(agent.id(), infected);
        } else {
            places
                .workplace_mut(agent.work_id()?)?
                .register(agent.id(), infected);
        }
    }
    Ok(())
}
