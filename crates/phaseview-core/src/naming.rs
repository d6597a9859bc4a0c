//! Unique name generation

use std::collections::HashMap;

/// Hands out `<base>_<n>` names, counting separately per base
#[derive(Debug, Clone, Default)]
pub struct NameGenerator {
    counters: HashMap<String, usize>,
}

impl NameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next name for `base`, numbering from 1
    pub fn next(&mut self, base: &str) -> String {
        let counter = self.counters.entry(base.to_string()).or_insert(0);
        *counter += 1;
        format!("{}_{}", base, counter)
    }

    /// Next name for `base` that `taken` does not already claim
    pub fn next_free(&mut self, base: &str, taken: impl Fn(&str) -> bool) -> String {
        loop {
            let name = self.next(base);
            if !taken(&name) {
                return name;
            }
        }
    }

    pub fn reset(&mut self) {
        self.counters.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_per_base() {
        let mut names = NameGenerator::new();
        assert_eq!(names.next("master_traj"), "master_traj_1");
        assert_eq!(names.next("master_traj"), "master_traj_2");
        assert_eq!(names.next("master"), "master_1");
    }

    #[test]
    fn test_next_free_skips_taken() {
        let mut names = NameGenerator::new();
        let name = names.next_free("f_l", |n| n == "f_l_1");
        assert_eq!(name, "f_l_2");
    }

    #[test]
    fn test_reset() {
        let mut names = NameGenerator::new();
        names.next("a");
        names.reset();
        assert_eq!(names.next("a"), "a_1");
    }
}
