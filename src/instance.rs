use grid::*;

use super::*;

/// How a caller describes one agent's preferences over the items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Valuation {
    /// One non-negative value per item.
    Cardinal(Vec<i64>),
    /// A ranking of all items, best first. Scored by rank: the item at
    /// position `r` is worth `item_count - r`.
    Ordinal(Vec<Item>),
    /// A binary agent that values each listed item at 1 and the rest at 0.
    Approval(Vec<Item>),
}

/// One member entry of a family: a valuation shared by `cardinality` agents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentSpec {
    pub valuation: Valuation,
    pub cardinality: u64,
}

impl AgentSpec {
    pub fn new(valuation: Valuation, cardinality: u64) -> Self {
        AgentSpec { valuation, cardinality }
    }

    /// A single agent.
    pub fn single(valuation: Valuation) -> Self {
        Self::new(valuation, 1)
    }

    /// `cardinality` binary agents desiring `items`.
    pub fn approval(items: &[Item], cardinality: u64) -> Self {
        Self::new(Valuation::Approval(items.to_vec()), cardinality)
    }
}

/// Unvalidated description of a family.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FamilySpec {
    pub name: String,
    pub criterion: Criterion,
    pub members: Vec<AgentSpec>,
}

impl FamilySpec {
    pub fn new(name: impl Into<String>, criterion: Criterion, members: Vec<AgentSpec>) -> Self {
        FamilySpec {
            name: name.into(),
            criterion,
            members,
        }
    }
}

/// A validated family: one valuation row per member entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Family {
    pub name: String,
    pub criterion: Criterion,
    /// Normalized valuations, `values[(member, item)]`.
    pub values: Grid<Weight>,
    cardinalities: Vec<u64>,
    /// Each member's share under `criterion`, fixed once the family count is known.
    shares: Vec<Option<Share>>,
}

impl Family {
    fn from_spec(spec: FamilySpec, item_count: usize, family_count: usize) -> Result<Self, FairError> {
        if spec.members.is_empty() {
            return Err(FairError::InvalidInstance(format!("family `{}` has no members", spec.name)));
        }
        let mut flat = Vec::with_capacity(spec.members.len() * item_count);
        let mut cardinalities = Vec::with_capacity(spec.members.len());
        let mut shares = Vec::with_capacity(spec.members.len());
        let mut weight: u64 = 0;
        for (i, member) in spec.members.into_iter().enumerate() {
            let invalid = |msg: String| FairError::InvalidInstance(format!("member {} of family `{}`: {}", i, spec.name, msg));
            if member.cardinality == 0 {
                return Err(invalid("cardinality 0".into()));
            }
            weight = weight
                .checked_add(member.cardinality)
                .filter(|&w| w <= MAX_FAMILY_WEIGHT)
                .ok_or_else(|| invalid(format!("the family has more than {} agents", MAX_FAMILY_WEIGHT)))?;
            let row = normalize(&member.valuation, item_count).map_err(invalid)?;
            row.iter()
                .try_fold(0u64, |total, &v| total.checked_add(v))
                .and_then(|total| total.checked_mul(family_count as u64))
                .ok_or_else(|| invalid(format!("total value times {} families overflows", family_count)))?;
            shares.push(spec.criterion.share(&row, family_count));
            flat.extend(row);
            cardinalities.push(member.cardinality);
        }
        Ok(Family {
            name: spec.name,
            criterion: spec.criterion,
            values: Grid::from_vec(flat, item_count),
            cardinalities,
            shares,
        })
    }

    /// Number of member entries (rows).
    pub fn member_count(&self) -> usize {
        self.values.rows()
    }

    /// Iterator over member entries.
    pub fn members(&self) -> impl Iterator<Item = usize> {
        0..self.values.rows()
    }

    /// How many agents the member entry stands for.
    pub fn cardinality(&self, member: usize) -> u64 {
        debug_assert!(member < self.member_count(), "Member number out of range.");
        self.cardinalities[member]
    }

    /// Total number of agents in the family, counting cardinalities.
    pub fn member_weight(&self) -> u64 {
        self.cardinalities.iter().sum()
    }

    /// The normalized valuation row of a member.
    pub fn valuation(&self, member: usize) -> Vec<Weight> {
        self.values.iter_row(member).copied().collect()
    }

    /// The member's utility for a bundle: the sum of its item values.
    pub fn utility_of(&self, member: usize, bundle: Bundle) -> Weight {
        debug_assert!(member < self.member_count(), "Member number out of range.");
        bundle.iter().map(|item| self.values[(member, item)]).sum()
    }

    /// The member's share under the family's criterion. `None` for envy-based
    /// criteria.
    pub fn share(&self, member: usize) -> Option<Share> {
        self.shares[member]
    }

    /// Whether the member is satisfied with `own` when the families hold
    /// `bundles`.
    pub fn is_satisfied(&self, member: usize, own: Bundle, bundles: &[Bundle]) -> bool {
        self.criterion
            .is_satisfied_with(self.shares[member], &self.valuation(member), own, bundles)
    }

    /// Items the member values positively.
    pub fn desired_items(&self, member: usize) -> Bundle {
        Bundle::from_items(
            self.values
                .iter_row(member)
                .enumerate()
                .filter(|&(_, &v)| v > 0)
                .map(|(item, _)| item),
        )
    }

    /// Number of agents (with cardinality) whose member entry satisfies `pred`.
    pub fn count_members_with(&self, mut pred: impl FnMut(usize) -> bool) -> u64 {
        self.members().filter(|&m| pred(m)).map(|m| self.cardinalities[m]).sum()
    }
}

fn normalize(valuation: &Valuation, item_count: usize) -> Result<Vec<Weight>, String> {
    match valuation {
        Valuation::Cardinal(values) => {
            if values.len() != item_count {
                return Err(format!("expected {} values, got {}", item_count, values.len()));
            }
            values
                .iter()
                .enumerate()
                .map(|(item, &v)| {
                    Weight::try_from(v).map_err(|_| format!("negative value {} for item {}", v, item))
                })
                .collect()
        }
        Valuation::Ordinal(ranking) => {
            if ranking.len() != item_count {
                return Err(format!("ranking lists {} of {} items", ranking.len(), item_count));
            }
            let mut row = vec![0; item_count];
            for (rank, &item) in ranking.iter().enumerate() {
                if item >= item_count {
                    return Err(format!("item {} out of range", item));
                }
                if row[item] != 0 {
                    return Err(format!("item {} ranked twice", item));
                }
                row[item] = (item_count - rank) as Weight;
            }
            Ok(row)
        }
        Valuation::Approval(items) => {
            let mut row = vec![0; item_count];
            for &item in items {
                if item >= item_count {
                    return Err(format!("item {} out of range", item));
                }
                if row[item] != 0 {
                    return Err(format!("item {} approved twice", item));
                }
                row[item] = 1;
            }
            Ok(row)
        }
    }
}

/// An immutable preference profile: items `0..item_count` and an ordered
/// list of families.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instance {
    item_count: usize,
    families: Vec<Family>,
}

impl Instance {
    /// Validates the specs and builds the instance.
    pub fn new(item_count: usize, families: Vec<FamilySpec>) -> Result<Self, FairError> {
        if item_count == 0 {
            return Err(FairError::InvalidInstance("there are no items".into()));
        }
        if item_count > MAX_ITEMS {
            return Err(FairError::InvalidInstance(format!(
                "{} items exceed the limit of {}",
                item_count, MAX_ITEMS
            )));
        }
        if families.is_empty() {
            return Err(FairError::InvalidInstance("there are no families".into()));
        }
        let family_count = families.len();
        let families = families
            .into_iter()
            .map(|spec| Family::from_spec(spec, item_count, family_count))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Instance { item_count, families })
    }

    /// The same instance with families listed in `family_order` and item `i`
    /// renamed `item_image[i]`.
    pub fn relabeled(&self, family_order: &[FamilyId], item_image: &[Item]) -> Instance {
        debug_assert_eq!(family_order.len(), self.family_count(), "One position per family.");
        debug_assert_eq!(item_image.len(), self.item_count, "One image per item.");
        let families = family_order
            .iter()
            .map(|&id| {
                let fam = &self.families[id];
                let mut flat = vec![0; fam.member_count() * self.item_count];
                for member in fam.members() {
                    for (item, &image) in item_image.iter().enumerate() {
                        flat[member * self.item_count + image] = fam.values[(member, item)];
                    }
                }
                Family {
                    name: fam.name.clone(),
                    criterion: fam.criterion,
                    values: Grid::from_vec(flat, self.item_count),
                    cardinalities: fam.cardinalities.clone(),
                    shares: fam.shares.clone(),
                }
            })
            .collect();
        Instance {
            item_count: self.item_count,
            families,
        }
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn items(&self) -> impl Iterator<Item = Item> {
        0..self.item_count
    }

    /// The bundle holding every item.
    pub fn all_items(&self) -> Bundle {
        Bundle::full(self.item_count)
    }

    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    pub fn family_ids(&self) -> impl Iterator<Item = FamilyId> {
        0..self.families.len()
    }

    pub fn families(&self) -> &[Family] {
        &self.families
    }

    pub fn family(&self, id: FamilyId) -> &Family {
        debug_assert!(id < self.family_count(), "Family number out of range.");
        &self.families[id]
    }

    /// The share a member of `family` is entitled to under its family's
    /// criterion. `None` for envy-based criteria, which compare bundles
    /// instead of using a fixed share.
    pub fn proportional_share(&self, family: FamilyId, member: usize) -> Option<Share> {
        self.family(family).share(member)
    }
}
