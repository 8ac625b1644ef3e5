//! Loaders and writers for the whitespace-delimited model files: places,
//! agents, parameters, age-band tables, snapshots, and the per-step
//! infected series. One record per line, positional fields, no headers.

use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::io::Write;
use std::path::Path;

use math::Point;

use crate::error::{Error, Result};
use crate::world::agent::Agent;
use crate::world::commons::InfectionParams;
use crate::world::infection::AgeBands;
use crate::world::place::{Household, Hospital, School, SchoolKind, Workplace};

fn read_rows(path: &Path) -> Result<Vec<(usize, Vec<String>)>> {
    let text = fs::read_to_string(path)
        .map_err(|e| Error::config(format!("{}: {e}", path.display())))?;
    Ok(text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            (
                i + 1,
                line.split_whitespace().map(str::to_string).collect(),
            )
        })
        .collect())
}

fn field<'a>(path: &Path, line: usize, row: &'a [String], idx: usize) -> Result<&'a str> {
    row.get(idx).map(String::as_str).ok_or_else(|| {
        Error::config(format!(
            "{}:{line}: expected at least {} fields, found {}",
            path.display(),
            idx + 1,
            row.len()
        ))
    })
}

fn parse<T: std::str::FromStr>(path: &Path, line: usize, raw: &str, what: &str) -> Result<T> {
    raw.parse().map_err(|_| {
        Error::config(format!(
            "{}:{line}: cannot parse {what} from \"{raw}\"",
            path.display()
        ))
    })
}

fn parse_flag(path: &Path, line: usize, raw: &str, what: &str) -> Result<bool> {
    match raw {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(Error::config(format!(
            "{}:{line}: {what} must be 0 or 1, found \"{raw}\"",
            path.display()
        ))),
    }
}

fn check_id(path: &Path, line: usize, id: usize, expected: usize) -> Result<()> {
    if id != expected {
        return Err(Error::config(format!(
            "{}:{line}: ID {id} out of order, expected {expected}",
            path.display()
        )));
    }
    Ok(())
}

/// Key-value parameter file: the last token is the value, everything
/// before it is the (possibly multi-word) parameter name.
pub fn load_parameter_map(path: &Path) -> Result<HashMap<String, f64>> {
    let mut map = HashMap::new();
    for (line, row) in read_rows(path)? {
        if row.len() < 2 {
            return Err(Error::config(format!(
                "{}:{line}: expected \"<name> <value>\"",
                path.display()
            )));
        }
        let value: f64 = parse(path, line, &row[row.len() - 1], "parameter value")?;
        let name = row[..row.len() - 1].join(" ");
        map.insert(name, value);
    }
    Ok(map)
}

pub fn load_parameters(path: &Path) -> Result<InfectionParams> {
    InfectionParams::from_map(&load_parameter_map(path)?)
}

/// Age-band file: `<lo>-<hi> <probability>` per line.
pub fn load_age_bands(path: &Path) -> Result<AgeBands> {
    let mut bands = Vec::new();
    for (line, row) in read_rows(path)? {
        let range = field(path, line, &row, 0)?;
        let prob: f64 = parse(path, line, field(path, line, &row, 1)?, "probability")?;
        let (lo, hi) = range.split_once('-').ok_or_else(|| {
            Error::config(format!(
                "{}:{line}: age range \"{range}\" is not of the form lo-hi",
                path.display()
            ))
        })?;
        bands.push((
            parse(path, line, lo, "age lower bound")?,
            parse(path, line, hi, "age upper bound")?,
            prob,
        ));
    }
    AgeBands::new(bands)
}

pub fn load_households(path: &Path, ip: &InfectionParams) -> Result<Vec<Household>> {
    let mut households = Vec::new();
    for (line, row) in read_rows(path)? {
        let id: usize = parse(path, line, field(path, line, &row, 0)?, "household ID")?;
        check_id(path, line, id, households.len() + 1)?;
        let x: f64 = parse(path, line, field(path, line, &row, 1)?, "x coordinate")?;
        let y: f64 = parse(path, line, field(path, line, &row, 2)?, "y coordinate")?;
        households.push(Household::new(id, Point::new(x, y), ip));
    }
    Ok(households)
}

pub fn load_schools(path: &Path, ip: &InfectionParams) -> Result<Vec<School>> {
    let mut schools = Vec::new();
    for (line, row) in read_rows(path)? {
        let id: usize = parse(path, line, field(path, line, &row, 0)?, "school ID")?;
        check_id(path, line, id, schools.len() + 1)?;
        let x: f64 = parse(path, line, field(path, line, &row, 1)?, "x coordinate")?;
        let y: f64 = parse(path, line, field(path, line, &row, 2)?, "y coordinate")?;
        let kind: SchoolKind = field(path, line, &row, 3)?
            .parse()
            .map_err(|e| Error::config(format!("{}:{line}: {e}", path.display())))?;
        schools.push(School::new(id, Point::new(x, y), kind, ip));
    }
    Ok(schools)
}

pub fn load_workplaces(path: &Path, ip: &InfectionParams) -> Result<Vec<Workplace>> {
    let mut workplaces = Vec::new();
    for (line, row) in read_rows(path)? {
        let id: usize = parse(path, line, field(path, line, &row, 0)?, "workplace ID")?;
        check_id(path, line, id, workplaces.len() + 1)?;
        let x: f64 = parse(path, line, field(path, line, &row, 1)?, "x coordinate")?;
        let y: f64 = parse(path, line, field(path, line, &row, 2)?, "y coordinate")?;
        workplaces.push(Workplace::new(id, Point::new(x, y), ip));
    }
    Ok(workplaces)
}

pub fn load_hospitals(path: &Path, ip: &InfectionParams) -> Result<Vec<Hospital>> {
    let mut hospitals = Vec::new();
    for (line, row) in read_rows(path)? {
        let id: usize = parse(path, line, field(path, line, &row, 0)?, "hospital ID")?;
        check_id(path, line, id, hospitals.len() + 1)?;
        let x: f64 = parse(path, line, field(path, line, &row, 1)?, "x coordinate")?;
        let y: f64 = parse(path, line, field(path, line, &row, 2)?, "y coordinate")?;
        hospitals.push(Hospital::new(id, Point::new(x, y), ip));
    }
    Ok(hospitals)
}

/// Agent file, 13 columns per line:
/// `is_student is_working age x y household_id is_non_covid_patient
/// school_id works_at_school work_id works_at_hospital hospital_id
/// is_infected`. Memberships use 0 for "none"; IDs are assigned by
/// position when the world is built.
pub fn load_agents(path: &Path) -> Result<Vec<Agent>> {
    let mut agents = Vec::new();
    for (line, row) in read_rows(path)? {
        let opt = |v: usize| if v == 0 { None } else { Some(v) };
        let is_student = parse_flag(path, line, field(path, line, &row, 0)?, "is_student")?;
        let is_working = parse_flag(path, line, field(path, line, &row, 1)?, "is_working")?;
        let age: u32 = parse(path, line, field(path, line, &row, 2)?, "age")?;
        let x: f64 = parse(path, line, field(path, line, &row, 3)?, "x coordinate")?;
        let y: f64 = parse(path, line, field(path, line, &row, 4)?, "y coordinate")?;
        let house: usize = parse(path, line, field(path, line, &row, 5)?, "household ID")?;
        let patient = parse_flag(
            path,
            line,
            field(path, line, &row, 6)?,
            "is_non_covid_patient",
        )?;
        let school: usize = parse(path, line, field(path, line, &row, 7)?, "school ID")?;
        let works_at_school =
            parse_flag(path, line, field(path, line, &row, 8)?, "works_at_school")?;
        let work: usize = parse(path, line, field(path, line, &row, 9)?, "work ID")?;
        let works_at_hospital =
            parse_flag(path, line, field(path, line, &row, 10)?, "works_at_hospital")?;
        let hospital: usize = parse(path, line, field(path, line, &row, 11)?, "hospital ID")?;
        let infected = parse_flag(path, line, field(path, line, &row, 12)?, "is_infected")?;
        agents.push(Agent::new(
            is_student,
            is_working,
            age,
            Point::new(x, y),
            opt(house),
            patient,
            opt(school),
            works_at_school,
            opt(work),
            works_at_hospital,
            opt(hospital),
            infected,
        ));
    }
    Ok(agents)
}

/// Line-per-entity snapshot via each entity's `Display`.
pub fn write_entities<T: Display>(path: &Path, items: &[T]) -> Result<()> {
    let mut out = fs::File::create(path)?;
    for item in items {
        writeln!(out, "{item}")?;
    }
    Ok(())
}

/// Whitespace-separated integer sequence on a single line.
pub fn write_series(path: &Path, series: &[u32]) -> Result<()> {
    let mut out = fs::File::create(path)?;
    let line = series
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(out, "{line}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::commons::test_params;
    use crate::world::place::Site;
    use std::io::Write as _;

    fn tmp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("covid_abm_io_{name}_{}", std::process::id()));
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn parameter_names_keep_their_spaces() {
        let path = tmp(
            "params",
            "household transmission rate 0.9\nseverity correction 2\n",
        );
        let map = load_parameter_map(&path).unwrap();
        assert_eq!(map["household transmission rate"], 0.9);
        assert_eq!(map["severity correction"], 2.0);
        fs::remove_file(path).ok();
    }

    #[test]
    fn age_band_file_round_trips() {
        let path = tmp("bands", "0-19 0.001\n20-59 0.01\n60-120 0.2\n");
        let bands = load_age_bands(&path).unwrap();
        assert_eq!(bands.prob_for(45), 0.01);
        assert_eq!(bands.prob_for(200), 0.2);
        fs::remove_file(path).ok();
    }

    #[test]
    fn school_loader_rejects_unknown_type() {
        let ip = test_params(&[]);
        let path = tmp("schools", "1 0.5 0.5 primary\n2 1.0 1.0 univercity\n");
        let err = load_schools(&path, &ip).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("univercity"));
        fs::remove_file(path).ok();
    }

    #[test]
    fn place_ids_must_match_their_position() {
        let ip = test_params(&[]);
        let path = tmp("households", "1 0 0\n3 1 1\n");
        assert!(matches!(
            load_households(&path, &ip),
            Err(Error::Config(_))
        ));
        fs::remove_file(path).ok();
    }

    #[test]
    fn agent_loader_maps_zero_ids_to_none() {
        let path = tmp("agents", "1 0 12 0.5 0.5 4 0 2 0 0 0 0 0\n0 1 40 1 1 1 0 0 0 3 0 0 1\n");
        let agents = load_agents(&path).unwrap();
        assert_eq!(agents.len(), 2);
        assert_eq!(agents[0].household(), Some(4));
        assert_eq!(agents[0].school(), Some(2));
        assert_eq!(agents[0].workplace(), None);
        assert!(!agents[0].infected());
        assert!(agents[1].infected());
        assert_eq!(agents[1].workplace(), Some(3));
        fs::remove_file(path).ok();
    }

    #[test]
    fn series_is_one_whitespace_line() {
        let path = std::env::temp_dir().join(format!("covid_abm_series_{}", std::process::id()));
        write_series(&path, &[0, 1, 4, 9]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim(), "0 1 4 9");
        fs::remove_file(path).ok();
    }

    #[test]
    fn household_snapshot_has_the_documented_fields() {
        let ip = test_params(&[("household scaling parameter", 0.8)]);
        let mut house = Household::new(1, Point::new(2.0, 3.0), &ip);
        house.register(5, true);
        let line = house.to_string();
        let fields: Vec<&str> = line.split_whitespace().collect();
        // id x y members infected ck beta alpha beta_ih
        assert_eq!(fields.len(), 9);
        assert_eq!(fields[0], "1");
        assert_eq!(fields[3], "1");
        assert_eq!(fields[4], "1");
    }
}
