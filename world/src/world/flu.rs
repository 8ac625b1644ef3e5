use crate::world::infection::Infection;

/// Book-keeping for agents with influenza-like illness: symptomatic
/// without COVID, competing for the same tests. Holds two ID pools and
/// keeps their sizes consistent through swaps. Flags on the agents
/// themselves are maintained by the transition code.
#[derive(Default, Debug)]
pub struct Flu {
    susceptible: Vec<usize>,
    with_flu: Vec<usize>,
}

impl Flu {
    pub fn add_susceptible(&mut self, agent_id: usize) {
        self.susceptible.push(agent_id);
    }

    pub fn remove_susceptible(&mut self, agent_id: usize) {
        self.susceptible.retain(|&id| id != agent_id);
    }

    pub fn remove_flu_agent(&mut self, agent_id: usize) {
        self.with_flu.retain(|&id| id != agent_id);
    }

    /// Initial ILI seeding: moves ⌊frac · susceptible⌋ randomly chosen
    /// agents into the flu pool and returns their IDs.
    pub fn generate(&mut self, frac: f64, infection: &mut Infection) -> Vec<usize> {
        let n = (frac * self.susceptible.len() as f64) as usize;
        let mut chosen = Vec::with_capacity(n);
        for _ in 0..n {
            let idx = infection.random_index(self.susceptible.len());
            let id = self.susceptible.swap_remove(idx);
            self.with_flu.push(id);
            chosen.push(id);
        }
        chosen
    }

    /// Retires `agent_id` from the flu pool and promotes a random
    /// susceptible in its place. `None` when the susceptible pool is
    /// exhausted.
    pub fn swap_flu_agent(&mut self, agent_id: usize, infection: &mut Infection) -> Option<usize> {
        self.remove_flu_agent(agent_id);
        if self.susceptible.is_empty() {
            return None;
        }
        let idx = infection.random_index(self.susceptible.len());
        let id = self.susceptible.swap_remove(idx);
        self.with_flu.push(id);
        Some(id)
    }

    pub fn susceptible_ids(&self) -> &[usize] {
        &self.susceptible
    }

    pub fn flu_ids(&self) -> &[usize] {
        &self.with_flu
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::infection::tests::flat_tables;
    use crate::world::infection::Infection;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn infection() -> Infection {
        let ip = crate::world::commons::test_params(&[]);
        Infection::new(0.25, &ip, flat_tables(0.0), StdRng::seed_from_u64(5)).unwrap()
    }

    #[test]
    fn generate_takes_the_requested_fraction() {
        let mut infection = infection();
        let mut flu = Flu::default();
        for id in 1..=100 {
            flu.add_susceptible(id);
        }
        let chosen = flu.generate(0.1, &mut infection);
        assert_eq!(chosen.len(), 10);
        assert_eq!(flu.flu_ids().len(), 10);
        assert_eq!(flu.susceptible_ids().len(), 90);
    }

    #[test]
    fn swap_replaces_one_for_one_until_exhausted() {
        let mut infection = infection();
        let mut flu = Flu::default();
        flu.add_susceptible(1);
        flu.add_susceptible(2);
        let chosen = flu.generate(0.5, &mut infection);
        assert_eq!(chosen.len(), 1);
        let first = chosen[0];
        let swapped = flu.swap_flu_agent(first, &mut infection).unwrap();
        assert_ne!(swapped, first);
        assert_eq!(flu.flu_ids(), &[swapped]);
        // Pool is now empty; the next swap retires without replacement.
        assert_eq!(flu.swap_flu_agent(swapped, &mut infection), None);
        assert!(flu.flu_ids().is_empty());
    }
}
