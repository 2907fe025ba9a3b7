use num_rational::Ratio;

/// Normalized valuation entry: what one member gets from one item.
pub type Weight = u64;
/// Item identifier, `0..item_count`.
pub type Item = usize;
/// Family identifier, the position of the family in the instance.
pub type FamilyId = usize;
/// Exact rational used for shares, fractions of members and voting weights.
pub type Share = Ratio<u64>;

/// Largest number of items an instance may have.
pub const MAX_ITEMS: usize = 32;

/// Largest total cardinality of one family. Keeps vote tallies, whose
/// denominators reach `2^MAX_ITEMS`, exact in `u64`.
pub const MAX_FAMILY_WEIGHT: u64 = 1 << 24;
