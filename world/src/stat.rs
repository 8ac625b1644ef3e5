//! Per-step health accounting and its CSV export.

use std::ops::{Index, IndexMut};
use std::path::Path;

use enum_map::{Enum, EnumMap};

use crate::error::Result;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HealthType {
    Susceptible,
    Exposed,
    Symptomatic,
    Recovered,
    Dead,
}

impl Enum for HealthType {
    const LEN: usize = 5;

    fn from_index(idx: usize) -> Self {
        match idx {
            0 => HealthType::Susceptible,
            1 => HealthType::Exposed,
            2 => HealthType::Symptomatic,
            3 => HealthType::Recovered,
            _ => HealthType::Dead,
        }
    }

    fn to_index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Default, Debug)]
pub struct HealthCount(EnumMap<HealthType, u32>);

impl HealthCount {
    pub fn n_infected(&self) -> u32 {
        self.0[HealthType::Exposed] + self.0[HealthType::Symptomatic]
    }
}

impl Index<HealthType> for HealthCount {
    type Output = u32;

    fn index(&self, index: HealthType) -> &Self::Output {
        &self.0[index]
    }
}

impl IndexMut<HealthType> for HealthCount {
    fn index_mut(&mut self, index: HealthType) -> &mut Self::Output {
        &mut self.0[index]
    }
}

/// One `HealthCount` per recorded step, oldest first.
#[derive(Default)]
pub struct Stat {
    history: Vec<HealthCount>,
}

impl Stat {
    pub fn push(&mut self, counts: HealthCount) {
        self.history.push(counts);
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn latest(&self) -> Option<&HealthCount> {
        self.history.last()
    }

    pub fn history(&self) -> &[HealthCount] {
        &self.history
    }

    /// Writes `<name>_log.csv` into `dir`: one header of state names,
    /// one row per step.
    pub fn write(&self, name: &str, dir: &Path) -> Result<()> {
        let path = dir.join(format!("{name}_log.csv"));
        let mut wtr = csv::Writer::from_path(path)?;
        for ht in HealthType::all() {
            wtr.write_field(format!("{ht:?}"))?;
        }
        wtr.write_record(None::<&[u8]>)?;
        for counts in &self.history {
            for v in counts.0.values() {
                wtr.write_field(format!("{v}"))?;
            }
            wtr.write_record(None::<&[u8]>)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_indexable_by_state() {
        let mut counts = HealthCount::default();
        counts[HealthType::Exposed] = 3;
        counts[HealthType::Symptomatic] = 2;
        assert_eq!(counts.n_infected(), 5);
        assert_eq!(counts[HealthType::Dead], 0);
    }

    #[test]
    fn history_accumulates_in_order() {
        let mut stat = Stat::default();
        let mut first = HealthCount::default();
        first[HealthType::Susceptible] = 10;
        stat.push(first);
        let mut second = HealthCount::default();
        second[HealthType::Susceptible] = 9;
        second[HealthType::Exposed] = 1;
        stat.push(second);
        assert_eq!(stat.len(), 2);
        assert_eq!(stat.latest().unwrap()[HealthType::Exposed], 1);
        assert_eq!(stat.history()[0][HealthType::Susceptible], 10);
    }
}
