use hashbrown::HashSet;

/// Players opted into the live performance HUD
#[derive(Debug, Default)]
pub struct PerformanceViewers {
    names: HashSet<String>,
}

impl PerformanceViewers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or remove `name`. Returns true if the player is now viewing.
    pub fn toggle(&mut self, name: &str) -> bool {
        if self.names.remove(name) {
            false
        } else {
            self.names.insert(name.to_string());
            true
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.names.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Viewer names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.names.iter().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        let mut viewers = PerformanceViewers::new();
        assert!(viewers.toggle("Alex"));
        assert!(viewers.contains("Alex"));
        assert!(!viewers.toggle("Alex"));
        assert!(viewers.is_empty());
    }

    #[test]
    fn test_names_sorted() {
        let mut viewers = PerformanceViewers::new();
        viewers.toggle("Steve");
        viewers.toggle("Alex");
        assert_eq!(viewers.names(), vec!["Alex".to_string(), "Steve".to_string()]);

        assert!(viewers.remove("Steve"));
        assert!(!viewers.remove("Steve"));
        assert_eq!(viewers.len(), 1);
    }
}
