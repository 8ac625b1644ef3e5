use std::fmt;
use std::str::FromStr;

use math::Point;

use crate::error::{Error, Result};
use crate::world::commons::InfectionParams;

/// Roster of agent IDs present at a place, plus the count of agents that
/// were already infected when they were registered (kept for snapshots).
#[derive(Default, Debug, Clone)]
pub struct Roster {
    ids: Vec<usize>,
    n_infected: u32,
}

impl Roster {
    /// Adds at most once; bumps the infected counter if `was_infected`.
    fn register(&mut self, agent_id: usize, was_infected: bool) {
        if !self.ids.contains(&agent_id) {
            self.ids.push(agent_id);
            if was_infected {
                self.n_infected += 1;
            }
        }
    }

    // Re-adds happen on recovery for agents that never left; keep the
    // roster duplicate-free.
    fn add(&mut self, agent_id: usize) {
        if !self.ids.contains(&agent_id) {
            self.ids.push(agent_id);
        }
    }

    fn remove(&mut self, agent_id: usize) {
        self.ids.retain(|&id| id != agent_id);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    pub fn n_infected(&self) -> u32 {
        self.n_infected
    }
}

/// State shared by every place kind: identity, location, the severity
/// correction, and the per-step accumulator.
#[derive(Debug, Clone)]
struct PlaceCore {
    id: usize,
    loc: Point,
    ck: f64,
    lambda_sum: f64,
    lambda: f64,
    roster: Roster,
}

impl PlaceCore {
    fn new(id: usize, loc: Point, ck: f64) -> Self {
        Self {
            id,
            loc,
            ck,
            lambda_sum: 0.0,
            lambda: 0.0,
            roster: Roster::default(),
        }
    }

    fn reset(&mut self) {
        self.lambda_sum = 0.0;
        self.lambda = 0.0;
    }
}

/// Member management and the finalize/reset half of the contribution
/// protocol, common to all place kinds. The `add_*` entry points stay on
/// the concrete types since callers always know the kind.
pub trait Site {
    fn id(&self) -> usize;
    fn loc(&self) -> Point;
    fn register(&mut self, agent_id: usize, was_infected: bool);
    fn add(&mut self, agent_id: usize);
    fn remove(&mut self, agent_id: usize);
    fn roster(&self) -> &Roster;
    fn lambda(&self) -> f64;
    fn finalize(&mut self);
    fn reset(&mut self);
}

macro_rules! impl_site_common {
    () => {
        fn id(&self) -> usize {
            self.core.id
        }

        fn loc(&self) -> Point {
            self.core.loc
        }

        fn register(&mut self, agent_id: usize, was_infected: bool) {
            self.core.roster.register(agent_id, was_infected);
        }

        fn add(&mut self, agent_id: usize) {
            self.core.roster.add(agent_id);
        }

        fn remove(&mut self, agent_id: usize) {
            self.core.roster.remove(agent_id);
        }

        fn roster(&self) -> &Roster {
            &self.core.roster
        }

        fn lambda(&self) -> f64 {
            self.core.lambda
        }
    };
}

#[derive(Debug, Clone)]
pub struct Household {
    core: PlaceCore,
    alpha: f64,
    beta: f64,
    beta_ih: f64,
}

impl Household {
    pub fn new(id: usize, loc: Point, ip: &InfectionParams) -> Self {
        Self {
            core: PlaceCore::new(id, loc, ip.severity_correction),
            alpha: ip.household_alpha,
            beta: ip.household_rate,
            beta_ih: ip.home_isolated_rate,
        }
    }

    pub fn add_exposed(&mut self, inf_var: f64) {
        self.core.lambda_sum += inf_var * self.beta;
    }

    pub fn add_symptomatic(&mut self, inf_var: f64) {
        self.core.lambda_sum += inf_var * self.core.ck * self.beta;
    }

    pub fn add_exposed_home_isolated(&mut self, inf_var: f64) {
        self.core.lambda_sum += inf_var * self.beta_ih;
    }

    pub fn add_symptomatic_home_isolated(&mut self, inf_var: f64) {
        self.core.lambda_sum += inf_var * self.core.ck * self.beta_ih;
    }
}

impl Site for Household {
    impl_site_common!();

    /// λ = sum / max(1, members)^α; the floor keeps emptied households
    /// from dividing by zero.
    fn finalize(&mut self) {
        let n = self.core.roster.len().max(1) as f64;
        self.core.lambda = self.core.lambda_sum / n.powf(self.alpha);
    }

    fn reset(&mut self) {
        self.core.reset();
    }
}

impl fmt::Display for Household {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {} {}",
            self.core.id,
            self.core.loc,
            self.core.roster.len(),
            self.core.roster.n_infected(),
            self.core.ck,
            self.beta,
            self.alpha,
            self.beta_ih
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchoolKind {
    Daycare,
    Primary,
    Middle,
    High,
    College,
}

impl SchoolKind {
    fn absenteeism(self, ip: &InfectionParams) -> f64 {
        match self {
            SchoolKind::Daycare => ip.daycare_absenteeism,
            SchoolKind::Primary | SchoolKind::Middle => ip.primary_middle_absenteeism,
            SchoolKind::High => ip.high_school_absenteeism,
            SchoolKind::College => ip.college_absenteeism,
        }
    }
}

impl FromStr for SchoolKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "daycare" => Ok(SchoolKind::Daycare),
            "primary" => Ok(SchoolKind::Primary),
            "middle" => Ok(SchoolKind::Middle),
            "high" => Ok(SchoolKind::High),
            "college" => Ok(SchoolKind::College),
            other => Err(Error::config(format!("unknown school type \"{other}\""))),
        }
    }
}

impl fmt::Display for SchoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SchoolKind::Daycare => "daycare",
            SchoolKind::Primary => "primary",
            SchoolKind::Middle => "middle",
            SchoolKind::High => "high",
            SchoolKind::College => "college",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct School {
    core: PlaceCore,
    kind: SchoolKind,
    beta: f64,
    beta_employee: f64,
    psi: f64,
    psi_employee: f64,
}

impl School {
    pub fn new(id: usize, loc: Point, kind: SchoolKind, ip: &InfectionParams) -> Self {
        Self {
            core: PlaceCore::new(id, loc, ip.severity_correction),
            kind,
            beta: ip.school_rate,
            beta_employee: ip.school_employee_rate,
            psi: kind.absenteeism(ip),
            psi_employee: ip.school_employee_absenteeism,
        }
    }

    pub fn kind(&self) -> SchoolKind {
        self.kind
    }

    pub fn add_exposed(&mut self, inf_var: f64) {
        self.core.lambda_sum += inf_var * self.beta;
    }

    pub fn add_exposed_employee(&mut self, inf_var: f64) {
        self.core.lambda_sum += inf_var * self.beta_employee;
    }

    pub fn add_symptomatic_student(&mut self, inf_var: f64) {
        self.core.lambda_sum += inf_var * self.core.ck * self.beta * self.psi;
    }

    pub fn add_symptomatic_employee(&mut self, inf_var: f64) {
        self.core.lambda_sum += inf_var * self.core.ck * self.beta_employee * self.psi_employee;
    }
}

impl Site for School {
    impl_site_common!();

    fn finalize(&mut self) {
        self.core.lambda = self.core.lambda_sum;
    }

    fn reset(&mut self) {
        self.core.reset();
    }
}

impl fmt::Display for School {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {} {} {} {}",
            self.core.id,
            self.core.loc,
            self.kind,
            self.core.roster.len(),
            self.core.roster.n_infected(),
            self.core.ck,
            self.beta,
            self.beta_employee,
            self.psi,
            self.psi_employee
        )
    }
}

#[derive(Debug, Clone)]
pub struct Workplace {
    core: PlaceCore,
    beta: f64,
    psi: f64,
}

impl Workplace {
    pub fn new(id: usize, loc: Point, ip: &InfectionParams) -> Self {
        Self {
            core: PlaceCore::new(id, loc, ip.severity_correction),
            beta: ip.workplace_rate,
            psi: ip.work_absenteeism,
        }
    }

    pub fn add_exposed(&mut self, inf_var: f64) {
        self.core.lambda_sum += inf_var * self.beta;
    }

    pub fn add_symptomatic(&mut self, inf_var: f64) {
        self.core.lambda_sum += inf_var * self.core.ck * self.beta * self.psi;
    }
}

impl Site for Workplace {
    impl_site_common!();

    fn finalize(&mut self) {
        self.core.lambda = self.core.lambda_sum;
    }

    fn reset(&mut self) {
        self.core.reset();
    }
}

impl fmt::Display for Workplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {}",
            self.core.id,
            self.core.loc,
            self.core.roster.len(),
            self.core.roster.n_infected(),
            self.core.ck,
            self.beta,
            self.psi
        )
    }
}

/// Hospitals carry one rate per occupant category and count how many
/// testee contributions they received this step.
#[derive(Debug, Clone)]
pub struct Hospital {
    core: PlaceCore,
    beta_employee: f64,
    beta_patient: f64,
    beta_testee: f64,
    beta_hospitalized: f64,
    beta_icu: f64,
    n_tested: u32,
}

impl Hospital {
    pub fn new(id: usize, loc: Point, ip: &InfectionParams) -> Self {
        Self {
            core: PlaceCore::new(id, loc, ip.severity_correction),
            beta_employee: ip.hospital_employee_rate,
            beta_patient: ip.hospital_patient_rate,
            beta_testee: ip.hospital_testee_rate,
            beta_hospitalized: ip.hospitalized_rate,
            beta_icu: ip.hospitalized_icu_rate,
            n_tested: 0,
        }
    }

    pub fn n_tested(&self) -> u32 {
        self.n_tested
    }

    pub fn add_exposed_employee(&mut self, inf_var: f64) {
        self.core.lambda_sum += inf_var * self.beta_employee;
    }

    pub fn add_symptomatic_employee(&mut self, inf_var: f64) {
        self.core.lambda_sum += inf_var * self.core.ck * self.beta_employee;
    }

    pub fn add_exposed_patient(&mut self, inf_var: f64) {
        self.core.lambda_sum += inf_var * self.beta_patient;
    }

    pub fn add_symptomatic_patient(&mut self, inf_var: f64) {
        self.core.lambda_sum += inf_var * self.core.ck * self.beta_patient;
    }

    /// A non-COVID visitor taking a test slot: counted, no pressure added.
    pub fn count_tested(&mut self) {
        self.n_tested += 1;
    }

    pub fn add_exposed_testee(&mut self, inf_var: f64) {
        self.n_tested += 1;
        self.core.lambda_sum += inf_var * self.beta_testee;
    }

    pub fn add_symptomatic_testee(&mut self, inf_var: f64) {
        self.n_tested += 1;
        self.core.lambda_sum += inf_var * self.core.ck * self.beta_testee;
    }

    pub fn add_hospitalized(&mut self, inf_var: f64) {
        self.core.lambda_sum += inf_var * self.core.ck * self.beta_hospitalized;
    }

    pub fn add_hospitalized_icu(&mut self, inf_var: f64) {
        self.core.lambda_sum += inf_var * self.core.ck * self.beta_icu;
    }
}

impl Site for Hospital {
    impl_site_common!();

    fn finalize(&mut self) {
        self.core.lambda = self.core.lambda_sum;
    }

    fn reset(&mut self) {
        self.core.reset();
        self.n_tested = 0;
    }
}

impl fmt::Display for Hospital {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {} {} {} {}",
            self.core.id,
            self.core.loc,
            self.core.roster.len(),
            self.core.roster.n_infected(),
            self.core.ck,
            self.beta_employee,
            self.beta_patient,
            self.beta_testee,
            self.beta_hospitalized,
            self.beta_icu
        )
    }
}

/// All places of the world, one vector per kind, indexed by ID − 1.
#[derive(Default)]
pub struct Places {
    pub households: Vec<Household>,
    pub schools: Vec<School>,
    pub workplaces: Vec<Workplace>,
    pub hospitals: Vec<Hospital>,
}

macro_rules! checked_lookup {
    ($get:ident, $get_mut:ident, $field:ident, $ty:ty, $kind:literal) => {
        pub fn $get(&self, id: usize) -> Result<&$ty> {
            if id == 0 || id > self.$field.len() {
                return Err(Error::OutOfRange {
                    kind: $kind,
                    id,
                    max: self.$field.len(),
                });
            }
            Ok(&self.$field[id - 1])
        }

        pub fn $get_mut(&mut self, id: usize) -> Result<&mut $ty> {
            if id == 0 || id > self.$field.len() {
                return Err(Error::OutOfRange {
                    kind: $kind,
                    id,
                    max: self.$field.len(),
                });
            }
            Ok(&mut self.$field[id - 1])
        }
    };
}

impl Places {
    checked_lookup!(household, household_mut, households, Household, "household");
    checked_lookup!(school, school_mut, schools, School, "school");
    checked_lookup!(workplace, workplace_mut, workplaces, Workplace, "workplace");
    checked_lookup!(hospital, hospital_mut, hospitals, Hospital, "hospital");

    pub fn for_each_site_mut(&mut self, mut f: impl FnMut(&mut dyn Site)) {
        for h in &mut self.households {
            f(h);
        }
        for s in &mut self.schools {
            f(s);
        }
        for w in &mut self.workplaces {
            f(w);
        }
        for h in &mut self.hospitals {
            f(h);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> InfectionParams {
        InfectionParams {
            household_rate: 0.9,
            household_alpha: 0.7,
            home_isolated_rate: 0.4,
            school_rate: 0.4,
            school_employee_rate: 0.1,
            workplace_rate: 0.49,
            severity_correction: 2.0,
            work_absenteeism: 0.2,
            school_employee_absenteeism: 0.3,
            daycare_absenteeism: 0.1,
            primary_middle_absenteeism: 0.25,
            high_school_absenteeism: 0.25,
            college_absenteeism: 0.25,
            hospital_employee_rate: 0.5,
            hospital_patient_rate: 0.6,
            hospital_testee_rate: 0.7,
            hospitalized_rate: 0.8,
            hospitalized_icu_rate: 0.9,
            latency_mean: 1.0,
            latency_std: 0.1,
            variability_shape: 1.0,
            variability_scale: 1.0,
            otd_mean: 2.0,
            otd_std: 0.2,
            oth_shape: 1.0,
            oth_scale: 1.0,
            htd_shape: 1.0,
            htd_scale: 1.0,
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
            results_delay: 1.0,
            recovery_time: 10.0,
            time_in_icu: 4.0,
            time_in_hospital: 5.0,
            time_in_hospital_after_icu: 3.0,
            death_to_icu_delay: 1.0,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn household_lambda_scales_with_roster_size() {
        let mut ip = params();
        ip.severity_correction = 3.5;
        let mut house = Household::new(176, Point::new(5.95671, 11.00675), &ip);
        for i in 0..5 {
            house.add(i + 1);
        }
        for _ in 0..2 {
            house.add_exposed(0.5);
        }
        house.add_symptomatic(0.5);
        house.add_symptomatic_home_isolated(0.5);
        house.finalize();
        // (2·0.5·0.9 + 0.5·3.5·0.9 + 0.5·3.5·0.4) / 5^0.7
        assert!(close(house.lambda(), 1.0291));
    }

    #[test]
    fn empty_household_divides_by_one() {
        let ip = params();
        let mut house = Household::new(1, Point::default(), &ip);
        house.add_exposed(1.0);
        house.finalize();
        assert!(close(house.lambda(), 0.9));
    }

    #[test]
    fn school_lambda_is_the_raw_sum() {
        let ip = params();
        let mut school = School::new(130, Point::new(0.05, 0.134), SchoolKind::Middle, &ip);
        for i in 0..20 {
            school.add(i + 1);
        }
        for _ in 0..3 {
            school.add_exposed(0.9);
        }
        for _ in 0..6 {
            school.add_symptomatic_student(0.9);
        }
        for _ in 0..2 {
            school.add_exposed_employee(0.9);
        }
        for _ in 0..3 {
            school.add_symptomatic_employee(0.9);
        }
        school.finalize();
        // 3·0.9·0.4 + 6·0.9·2·0.4·0.25 + 2·0.9·0.1 + 3·0.9·2·0.1·0.3
        assert!(close(school.lambda(), 2.502));
    }

    #[test]
    fn workplace_lambda_applies_ck_and_psi_to_symptomatic_only() {
        let mut ip = params();
        ip.severity_correction = 2.5;
        let mut work = Workplace::new(130, Point::new(0.05, 0.134), &ip);
        for i in 0..10 {
            work.add(i + 1);
        }
        for _ in 0..3 {
            work.add_exposed(1.3);
        }
        for _ in 0..6 {
            work.add_symptomatic(1.3);
        }
        work.finalize();
        // 3·1.3·0.49 + 6·1.3·2.5·0.49·0.2
        assert!(close(work.lambda(), 3.822));
    }

    #[test]
    fn reset_returns_place_to_zero() {
        let ip = params();
        let mut house = Household::new(1, Point::default(), &ip);
        house.add(1);
        house.add_exposed(1.0);
        house.add_symptomatic(2.0);
        house.finalize();
        assert!(house.lambda() > 0.0);
        house.reset();
        assert_eq!(house.lambda(), 0.0);
        house.finalize();
        assert_eq!(house.lambda(), 0.0);
    }

    #[test]
    fn finalize_is_deterministic_for_equal_sums() {
        let ip = params();
        let mut a = Workplace::new(1, Point::default(), &ip);
        let mut b = Workplace::new(2, Point::default(), &ip);
        for place in [&mut a, &mut b] {
            place.add_exposed(0.7);
            place.add_symptomatic(1.1);
            place.finalize();
        }
        assert_eq!(a.lambda(), b.lambda());
    }

    #[test]
    fn hospital_counts_testees() {
        let ip = params();
        let mut hospital = Hospital::new(1, Point::default(), &ip);
        hospital.add_exposed_testee(1.0);
        hospital.add_symptomatic_testee(1.0);
        hospital.add_hospitalized(1.0);
        assert_eq!(hospital.n_tested(), 2);
        hospital.reset();
        assert_eq!(hospital.n_tested(), 0);
    }

    #[test]
    fn register_is_idempotent() {
        let ip = params();
        let mut work = Workplace::new(1, Point::default(), &ip);
        work.register(909, true);
        work.register(909, true);
        work.register(1, false);
        assert_eq!(work.roster().ids(), &[909, 1]);
        assert_eq!(work.roster().n_infected(), 1);
        work.remove(909);
        assert_eq!(work.roster().ids(), &[1]);
    }

    #[test]
    fn unknown_school_type_is_rejected() {
        assert!("college".parse::<SchoolKind>().is_ok());
        assert!(matches!(
            "univercity".parse::<SchoolKind>(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn lookup_checks_bounds() {
        let ip = params();
        let mut places = Places::default();
        places.households.push(Household::new(1, Point::default(), &ip));
        assert!(places.household(1).is_ok());
        assert!(matches!(
            places.household(2),
            Err(Error::OutOfRange { kind: "household", .. })
        ));
        assert!(matches!(places.household(0), Err(Error::OutOfRange { .. })));
    }
}
