use super::*;

/// Binary agent types desiring exactly `approvals` of `item_count` items, in
/// lexicographic order of their item lists.
pub(crate) fn agent_types(item_count: usize, approvals: usize) -> Vec<Bundle> {
    let mut types = Vec::new();
    if approvals == 0 || approvals > item_count {
        return types;
    }
    let mut items: Vec<Item> = (0..approvals).collect();
    loop {
        types.push(Bundle::from_items(items.iter().copied()));
        // Rightmost position that can still move right.
        let Some(pos) = (0..approvals).rev().find(|&i| items[i] < item_count - approvals + i) else {
            return types;
        };
        items[pos] += 1;
        for i in pos + 1..approvals {
            items[i] = items[i - 1] + 1;
        }
    }
}

/// Advances a combination with repetition of family codes. Codes are
/// non-decreasing, so each multiset of families appears once.
#[derive(Debug, Clone)]
pub(crate) struct InstanceEnumeratorState {
    codes: Vec<u64>,
    code_count: u64,
    started: bool,
}

impl InstanceEnumeratorState {
    pub(crate) fn new(family_count: usize, code_count: u64) -> Self {
        Self {
            codes: vec![0; family_count],
            code_count,
            started: false,
        }
    }

    pub(crate) fn next_codes(&mut self) -> Option<&[u64]> {
        if self.code_count == 0 || self.codes.is_empty() {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(&self.codes);
        }
        let pos = (0..self.codes.len()).rev().find(|&i| self.codes[i] + 1 < self.code_count)?;
        let code = self.codes[pos] + 1;
        for c in &mut self.codes[pos..] {
            *c = code;
        }
        Some(&self.codes)
    }
}

/// Lazily enumerates the instances of the search space for one item count,
/// skipping those equivalent to an earlier one up to item relabeling.
///
/// A family is a non-empty set of distinct agent types, each type a single
/// binary agent desiring exactly `approvals` items. Families are encoded as
/// bit masks over the type list. An instance is a multiset of
/// `family_count` families, and it is produced only if its sorted encoding
/// under the identity is not larger than under any permutation of the items.
/// Permutations are generated one at a time while checking an instance.
pub struct CanonicalInstances {
    item_count: usize,
    criterion: Criterion,
    types: Vec<Bundle>,
    state: InstanceEnumeratorState,
}

impl CanonicalInstances {
    pub fn new(item_count: usize, family_count: usize, approvals: usize, criterion: Criterion) -> Result<Self, FairError> {
        if item_count == 0 || item_count > MAX_ITEMS {
            return Err(FairError::InvalidConfig(format!(
                "item count {} outside 1..={}",
                item_count, MAX_ITEMS
            )));
        }
        let types = agent_types(item_count, approvals);
        if types.len() > 63 {
            return Err(FairError::InvalidConfig(format!(
                "{} agent types for {} items cannot be encoded",
                types.len(),
                item_count
            )));
        }
        let code_count = (1u64 << types.len()) - 1;
        Ok(CanonicalInstances {
            item_count,
            criterion,
            types,
            state: InstanceEnumeratorState::new(family_count, code_count),
        })
    }

    /// Families of the instance as sorted lists of their types' item masks,
    /// after mapping types through `image`.
    fn encode(codes: &[u64], image: &[u32]) -> Vec<Vec<u32>> {
        let mut encoding: Vec<Vec<u32>> = codes
            .iter()
            .map(|&code| {
                let mask = code + 1;
                let mut family: Vec<u32> = (0..image.len())
                    .filter(|&t| (mask >> t) & 1 == 1)
                    .map(|t| image[t])
                    .collect();
                family.sort_unstable();
                family
            })
            .collect();
        encoding.sort();
        encoding
    }

    fn is_canonical(&self, codes: &[u64]) -> bool {
        let identity: Vec<u32> = self.types.iter().map(Bundle::bits).collect();
        let own = Self::encode(codes, &identity);
        let mut image = identity;
        let mut perms = Permutations::new(self.item_count);
        while let Some(perm) = perms.next_lending() {
            for (slot, t) in image.iter_mut().zip(&self.types) {
                *slot = Bundle::from_items(t.iter().map(|item| perm[item])).bits();
            }
            if Self::encode(codes, &image) < own {
                return false;
            }
        }
        true
    }

    fn build(&self, codes: &[u64]) -> Result<Instance, FairError> {
        let families = codes
            .iter()
            .enumerate()
            .map(|(i, &code)| {
                let mask = code + 1;
                let members = (0..self.types.len())
                    .filter(|&t| (mask >> t) & 1 == 1)
                    .map(|t| AgentSpec::approval(&self.types[t].iter().collect::<Vec<_>>(), 1))
                    .collect();
                FamilySpec::new(format!("Family {}", i + 1), self.criterion, members)
            })
            .collect();
        Instance::new(self.item_count, families)
    }
}

impl Iterator for CanonicalInstances {
    type Item = Result<Instance, FairError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let codes = self.state.next_codes()?.to_vec();
            if self.is_canonical(&codes) {
                return Some(self.build(&codes));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(item_count: usize, family_count: usize, approvals: usize) -> usize {
        CanonicalInstances::new(item_count, family_count, approvals, Criterion::OneOfBestC(family_count))
            .unwrap()
            .count()
    }

    #[test]
    fn test_agent_types() {
        let types: Vec<u32> = agent_types(4, 2).iter().map(Bundle::bits).collect();
        assert_eq!(types, [0b0011, 0b0101, 0b1001, 0b0110, 0b1010, 0b1100]);
        assert_eq!(agent_types(3, 3).len(), 1);
        assert!(agent_types(1, 2).is_empty());
        assert!(agent_types(3, 0).is_empty());
    }

    #[test]
    fn test_state() {
        // Multisets of size 2 over 3 codes.
        let mut state = InstanceEnumeratorState::new(2, 3);
        let mut all = Vec::new();
        while let Some(codes) = state.next_codes() {
            all.push(codes.to_vec());
        }
        assert_eq!(all, [[0, 0], [0, 1], [0, 2], [1, 1], [1, 2], [2, 2]]);
    }

    #[test]
    fn test_counts_two_families() {
        assert_eq!(count(1, 2, 2), 0);
        assert_eq!(count(2, 2, 2), 1);
        assert_eq!(count(3, 2, 2), 9);
        assert_eq!(count(4, 2, 2), 143);
    }

    #[test]
    fn test_counts_three_families() {
        assert_eq!(count(2, 3, 3), 0);
        assert_eq!(count(3, 3, 3), 1);
        assert_eq!(count(4, 3, 3), 65);
    }

    #[test]
    fn test_instances() {
        let instances: Vec<Instance> = CanonicalInstances::new(2, 2, 2, Criterion::OneOfBestC(2))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(instances.len(), 1);
        let instance = &instances[0];
        assert_eq!(instance.family_count(), 2);
        assert_eq!(instance.family(0).desired_items(0), Bundle::from_items([0, 1]));
        assert_eq!(instance.family(1).member_count(), 1);
    }

    #[test]
    fn test_too_many_types() {
        assert!(matches!(
            CanonicalInstances::new(9, 2, 3, Criterion::Proportional),
            Err(FairError::InvalidConfig(_))
        ));
        assert!(CanonicalInstances::new(0, 2, 2, Criterion::Proportional).is_err());
    }

    #[test]
    fn test_large_item_count_starts_empty() {
        // 55 types and 11! permutations; nothing is enumerated up front.
        let instances = CanonicalInstances::new(11, 2, 2, Criterion::OneOfBestC(2)).unwrap();
        assert_eq!(instances.types.len(), 55);
        assert!(!instances.state.started);
    }

    #[test]
    fn test_canonical_forms() {
        let instances = CanonicalInstances::new(3, 2, 2, Criterion::OneOfBestC(2)).unwrap();
        // {0,1} alone is canonical, {0,2} alone is a relabeling of it.
        assert!(instances.is_canonical(&[0, 0]));
        assert!(!instances.is_canonical(&[1, 1]));
    }
}
