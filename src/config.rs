use super::*;

/// Parameters of an exhaustive search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    /// 2 or 3.
    pub num_families: usize,
    /// Instances with `1..=max_items` items are searched.
    pub max_items: usize,
    /// Items every agent type desires. `None` means `num_families`.
    pub approvals: Option<usize>,
    /// `None` means 1-of-best-`num_families`.
    pub criterion: Option<Criterion>,
    pub protocols: Vec<ProtocolKind>,
    /// A guarantee ratio below this is a counterexample.
    pub bound: Share,
    /// Base seed; instance `i` is run with `seed + i`. `None` runs every
    /// protocol unseeded.
    pub seed: Option<u64>,
    pub stop_at_first_counterexample: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            num_families: 2,
            max_items: 4,
            approvals: None,
            criterion: None,
            protocols: vec![ProtocolKind::Exhaustive],
            bound: Share::new(2, 3),
            seed: None,
            stop_at_first_counterexample: false,
        }
    }
}

impl SearchConfig {
    pub fn new(num_families: usize, max_items: usize) -> Self {
        SearchConfig {
            num_families,
            max_items,
            ..Default::default()
        }
    }

    pub fn with_approvals(mut self, approvals: usize) -> Self {
        self.approvals = Some(approvals);
        self
    }

    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = Some(criterion);
        self
    }

    pub fn with_protocols(mut self, protocols: Vec<ProtocolKind>) -> Self {
        self.protocols = protocols;
        self
    }

    pub fn with_bound(mut self, bound: Share) -> Self {
        self.bound = bound;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn stop_at_first(mut self, stop: bool) -> Self {
        self.stop_at_first_counterexample = stop;
        self
    }

    pub fn approvals(&self) -> usize {
        self.approvals.unwrap_or(self.num_families)
    }

    pub fn criterion(&self) -> Criterion {
        self.criterion.unwrap_or(Criterion::OneOfBestC(self.num_families))
    }

    /// The seed for the instance at position `index` in enumeration order.
    pub fn instance_seed(&self, index: usize) -> Option<u64> {
        self.seed.map(|seed| seed.wrapping_add(index as u64))
    }

    pub fn validate(&self) -> Result<(), FairError> {
        if !(2..=3).contains(&self.num_families) {
            return Err(FairError::InvalidConfig(format!(
                "the search supports 2 or 3 families, not {}",
                self.num_families
            )));
        }
        if self.max_items == 0 || self.max_items > MAX_ITEMS {
            return Err(FairError::InvalidConfig(format!(
                "max_items must be in 1..={}, got {}",
                MAX_ITEMS, self.max_items
            )));
        }
        if self.approvals() == 0 {
            return Err(FairError::InvalidConfig("agents must approve at least one item".into()));
        }
        if self.protocols.is_empty() {
            return Err(FairError::InvalidConfig("no protocol to run".into()));
        }
        if let Some(&protocol) = self.protocols.iter().find(|p| !p.protocol().supports(self.num_families)) {
            return Err(FairError::UnsupportedFamilyCount {
                protocol,
                count: self.num_families,
            });
        }
        if self.bound == Share::from_integer(0) || self.bound > Share::from_integer(1) {
            return Err(FairError::InvalidConfig(format!("bound {} is outside (0, 1]", self.bound)));
        }
        let widest = instance_enumerator::agent_types(self.max_items, self.approvals()).len();
        if widest > 63 {
            return Err(FairError::InvalidConfig(format!(
                "{} agent types with {} items cannot be encoded",
                widest, self.max_items
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.approvals(), 2);
        assert_eq!(config.criterion(), Criterion::OneOfBestC(2));
        assert!(config.validate().is_ok());

        let config = SearchConfig::new(3, 4);
        assert_eq!(config.approvals(), 3);
        assert_eq!(config.criterion(), Criterion::OneOfBestC(3));
        assert_eq!(config.instance_seed(5), None);
        assert_eq!(config.with_seed(10).instance_seed(5), Some(15));
    }

    #[test]
    fn test_invalid() {
        let invalid = [
            SearchConfig::new(1, 4),
            SearchConfig::new(4, 4),
            SearchConfig::new(2, 0),
            SearchConfig::new(2, MAX_ITEMS + 1),
            SearchConfig::new(2, 4).with_approvals(0),
            SearchConfig::new(2, 4).with_protocols(vec![]),
            SearchConfig::new(2, 4).with_bound(Share::from_integer(0)),
            SearchConfig::new(2, 4).with_bound(Share::new(3, 2)),
            SearchConfig::new(2, 9).with_approvals(3),
        ];
        for config in invalid {
            assert!(
                matches!(config.validate(), Err(FairError::InvalidConfig(_))),
                "{:?} should be rejected",
                config
            );
        }
    }

    #[test]
    fn test_unsupported_protocol() {
        let config = SearchConfig::new(3, 4).with_protocols(vec![ProtocolKind::Rwav, ProtocolKind::TwoThirds]);
        assert!(matches!(
            config.validate(),
            Err(FairError::UnsupportedFamilyCount {
                protocol: ProtocolKind::TwoThirds,
                count: 3
            })
        ));
    }
}
