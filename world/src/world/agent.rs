use std::fmt;

use math::Point;

use crate::error::{Error, Result};

/// One individual. IDs are 1-based and equal the agent's position in the
/// world's agent vector. Memberships are held as IDs only; places hold the
/// reverse references in their rosters.
///
/// The infection state is a flag cluster: exactly one of
/// {susceptible, exposed, symptomatic, removed} is the main state and the
/// remaining flags refine it. All cluster updates go through
/// [`crate::world::states`] so that every named transition lands on the
/// same configuration.
#[derive(Default, Debug, Clone)]
pub struct Agent {
    pub(crate) id: usize,
    pub(crate) is_student: bool,
    pub(crate) is_working: bool,
    pub(crate) age: u32,
    pub(crate) loc: Point,

    pub(crate) house_id: Option<usize>,
    pub(crate) school_id: Option<usize>,
    pub(crate) work_id: Option<usize>,
    pub(crate) hospital_id: Option<usize>,
    pub(crate) works_at_school: bool,
    pub(crate) works_at_hospital: bool,
    pub(crate) is_non_covid_patient: bool,

    // Infection state cluster
    pub(crate) is_infected: bool,
    pub(crate) is_exposed: bool,
    pub(crate) is_recovering_exposed: bool,
    pub(crate) is_symptomatic: bool,
    pub(crate) is_symptomatic_non_covid: bool,
    pub(crate) will_die: bool,
    pub(crate) will_recover: bool,
    pub(crate) is_removed: bool,

    // Care path
    pub(crate) is_home_isolated: bool,
    pub(crate) is_hospitalized: bool,
    pub(crate) is_hospitalized_icu: bool,
    pub(crate) is_treated: bool,

    // Testing
    pub(crate) is_tested: bool,
    pub(crate) awaiting_test: bool,
    pub(crate) awaiting_results: bool,
    pub(crate) test_in_car: bool,
    pub(crate) test_in_hospital: bool,
    pub(crate) covid_positive: bool,
    pub(crate) false_negative: bool,
    pub(crate) false_positive: bool,
    pub(crate) exposed_tested: bool,

    // Durations, days
    pub(crate) latency_duration: f64,
    pub(crate) otd_duration: f64,
    pub(crate) recovery_duration: f64,

    // Scheduled times, absolute simulation time
    pub(crate) latency_end_time: f64,
    pub(crate) infectiousness_start: f64,
    pub(crate) death_time: f64,
    pub(crate) recovery_time: f64,
    pub(crate) time_of_test: f64,
    pub(crate) time_of_results: f64,
    pub(crate) time_ih_to_icu: f64,
    pub(crate) time_ih_to_hsp: f64,
    pub(crate) time_hsp_to_ih: f64,
    pub(crate) time_hsp_to_icu: f64,
    pub(crate) time_icu_to_hsp: f64,

    pub(crate) inf_var: f64,
}

impl Agent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        is_student: bool,
        is_working: bool,
        age: u32,
        loc: Point,
        house_id: Option<usize>,
        is_non_covid_patient: bool,
        school_id: Option<usize>,
        works_at_school: bool,
        work_id: Option<usize>,
        works_at_hospital: bool,
        hospital_id: Option<usize>,
        infected: bool,
    ) -> Self {
        Self {
            is_student,
            is_working,
            age,
            loc,
            house_id,
            is_non_covid_patient,
            school_id,
            works_at_school,
            work_id,
            works_at_hospital,
            hospital_id,
            is_infected: infected,
            inf_var: 1.0,
            ..Self::default()
        }
    }

    pub fn set_id(&mut self, id: usize) {
        self.id = id;
    }

    // Identity and demographics
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn loc(&self) -> Point {
        self.loc
    }

    pub fn student(&self) -> bool {
        self.is_student
    }

    pub fn works(&self) -> bool {
        self.is_working
    }

    pub fn school_employee(&self) -> bool {
        self.works_at_school
    }

    pub fn hospital_employee(&self) -> bool {
        self.works_at_hospital
    }

    pub fn hospital_non_covid_patient(&self) -> bool {
        self.is_non_covid_patient
    }

    // Memberships
    pub fn household(&self) -> Option<usize> {
        self.house_id
    }

    pub fn school(&self) -> Option<usize> {
        self.school_id
    }

    pub fn workplace(&self) -> Option<usize> {
        self.work_id
    }

    pub fn hospital(&self) -> Option<usize> {
        self.hospital_id
    }

    pub(crate) fn household_id(&self) -> Result<usize> {
        self.house_id
            .ok_or_else(|| Error::invariant(format!("agent {} has no household", self.id)))
    }

    pub(crate) fn hospital_id(&self) -> Result<usize> {
        self.hospital_id
            .ok_or_else(|| Error::invariant(format!("agent {} has no hospital", self.id)))
    }

    pub(crate) fn school_id(&self) -> Result<usize> {
        self.school_id
            .ok_or_else(|| Error::invariant(format!("agent {} has no school", self.id)))
    }

    pub(crate) fn work_id(&self) -> Result<usize> {
        self.work_id
            .ok_or_else(|| Error::invariant(format!("agent {} has no workplace", self.id)))
    }

    // State queries
    pub fn infected(&self) -> bool {
        self.is_infected
    }

    pub fn exposed(&self) -> bool {
        self.is_exposed
    }

    pub fn recovering_exposed(&self) -> bool {
        self.is_recovering_exposed
    }

    pub fn symptomatic(&self) -> bool {
        self.is_symptomatic
    }

    pub fn symptomatic_non_covid(&self) -> bool {
        self.is_symptomatic_non_covid
    }

    pub fn dying(&self) -> bool {
        self.will_die
    }

    pub fn recovering(&self) -> bool {
        self.will_recover
    }

    pub fn removed(&self) -> bool {
        self.is_removed
    }

    pub fn home_isolated(&self) -> bool {
        self.is_home_isolated
    }

    pub fn hospitalized(&self) -> bool {
        self.is_hospitalized
    }

    pub fn hospitalized_icu(&self) -> bool {
        self.is_hospitalized_icu
    }

    pub fn being_treated(&self) -> bool {
        self.is_treated
    }

    pub fn tested(&self) -> bool {
        self.is_tested
    }

    pub fn tested_awaiting_test(&self) -> bool {
        self.awaiting_test
    }

    pub fn tested_awaiting_results(&self) -> bool {
        self.awaiting_results
    }

    pub fn tested_in_car(&self) -> bool {
        self.test_in_car
    }

    pub fn tested_in_hospital(&self) -> bool {
        self.test_in_hospital
    }

    pub fn tested_covid_positive(&self) -> bool {
        self.covid_positive
    }

    pub fn tested_false_negative(&self) -> bool {
        self.false_negative
    }

    pub fn tested_false_positive(&self) -> bool {
        self.false_positive
    }

    pub fn tested_exposed(&self) -> bool {
        self.exposed_tested
    }

    // Scheduled times
    pub fn latency_end_time(&self) -> f64 {
        self.latency_end_time
    }

    pub fn infectiousness_start_time(&self) -> f64 {
        self.infectiousness_start
    }

    pub fn time_of_death(&self) -> f64 {
        self.death_time
    }

    pub fn recovery_time(&self) -> f64 {
        self.recovery_time
    }

    pub fn time_of_test(&self) -> f64 {
        self.time_of_test
    }

    pub fn time_of_results(&self) -> f64 {
        self.time_of_results
    }

    pub fn inf_variability_factor(&self) -> f64 {
        self.inf_var
    }

    // Duration-then-time setters; the absolute times are always strictly
    // ahead of the time they are computed from.
    pub(crate) fn set_latency_duration(&mut self, days: f64) {
        self.latency_duration = days;
    }

    pub(crate) fn set_latency_end_time(&mut self, cur_time: f64) {
        self.latency_end_time = cur_time + self.latency_duration;
    }

    pub(crate) fn set_infectiousness_start_time(&mut self, cur_time: f64, delay: f64) {
        self.infectiousness_start = cur_time + delay;
    }

    pub(crate) fn set_time_to_death(&mut self, days: f64) {
        self.otd_duration = days;
    }

    pub(crate) fn set_death_time(&mut self, cur_time: f64) {
        self.death_time = cur_time + self.otd_duration;
    }

    pub(crate) fn set_recovery_duration(&mut self, days: f64) {
        self.recovery_duration = days;
    }

    pub(crate) fn set_recovery_time(&mut self, cur_time: f64) {
        self.recovery_time = cur_time + self.recovery_duration;
    }

    pub(crate) fn schedule_test(&mut self, cur_time: f64, delay: f64) {
        self.time_of_test = cur_time + delay;
    }

    pub(crate) fn schedule_results(&mut self, cur_time: f64, delay: f64) {
        self.time_of_results = cur_time + delay;
    }
}

/// One line per agent: the ID followed by the loader's column layout.
impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id_or_zero = |v: Option<usize>| v.unwrap_or(0);
        write!(
            f,
            "{} {} {} {} {} {} {} {} {} {} {} {} {}",
            self.id,
            u8::from(self.is_student),
            u8::from(self.is_working),
            self.age,
            self.loc,
            id_or_zero(self.house_id),
            u8::from(self.is_non_covid_patient),
            id_or_zero(self.school_id),
            u8::from(self.works_at_school),
            id_or_zero(self.work_id),
            u8::from(self.works_at_hospital),
            id_or_zero(self.hospital_id),
            u8::from(self.is_infected),
        )
    }
}
