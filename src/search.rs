//! Exhaustive search for instances where a protocol falls below a bound.

use tracing::{debug, info};

use super::*;

/// An allocation reaching the worst ratio seen so far.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Witness {
    pub ratio: Share,
    pub protocol: ProtocolKind,
    pub seed: Option<u64>,
    pub instance: Instance,
    pub allocation: Allocation,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Every instance was checked and none fell below the bound.
    BoundHolds,
    /// Some protocol produced a ratio below the bound.
    Counterexample,
    /// The caller stopped the search; the report holds what was seen.
    Aborted,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    pub instances_checked: usize,
    /// Worst witness over all protocols. On ties the first one found is kept.
    pub worst: Option<Witness>,
    /// Worst witness of each configured protocol, in configuration order.
    pub worst_by_protocol: Vec<(ProtocolKind, Option<Witness>)>,
}

impl SearchReport {
    fn new(protocols: &[ProtocolKind]) -> Self {
        SearchReport {
            outcome: SearchOutcome::BoundHolds,
            instances_checked: 0,
            worst: None,
            worst_by_protocol: protocols.iter().map(|&p| (p, None)).collect(),
        }
    }

    pub fn worst_ratio(&self) -> Option<Share> {
        self.worst.as_ref().map(|w| w.ratio)
    }

    /// Worst ratio reached by `protocol`.
    pub fn worst_ratio_of(&self, protocol: ProtocolKind) -> Option<Share> {
        self.worst_by_protocol
            .iter()
            .find(|(p, _)| *p == protocol)
            .and_then(|(_, w)| w.as_ref().map(|w| w.ratio))
    }

    fn is_below(&self, bound: Share) -> bool {
        self.worst_ratio().is_some_and(|r| r < bound)
    }

    fn record(&mut self, slot: usize, instance: &Instance, outcome: Outcome, protocol: ProtocolKind, seed: Option<u64>) {
        let beats = |current: &Option<Witness>| current.as_ref().is_none_or(|w| outcome.ratio < w.ratio);
        let overall = beats(&self.worst);
        let own = beats(&self.worst_by_protocol[slot].1);
        if !overall && !own {
            return;
        }
        let witness = Witness {
            ratio: outcome.ratio,
            protocol,
            seed,
            instance: instance.clone(),
            allocation: outcome.allocation,
        };
        if overall {
            debug!(%protocol, ratio = %witness.ratio, bundles = ?witness.allocation.bundles, "new worst ratio");
            self.worst = Some(witness.clone());
        }
        if own {
            self.worst_by_protocol[slot].1 = Some(witness);
        }
    }
}

/// Number of canonical instances for each item count `1..=max_items`.
pub fn count_instances(config: &SearchConfig) -> Result<Vec<usize>, FairError> {
    config.validate()?;
    (1..=config.max_items)
        .map(|item_count| {
            let instances =
                CanonicalInstances::new(item_count, config.num_families, config.approvals(), config.criterion())?;
            let mut count = 0;
            for instance in instances {
                instance?;
                count += 1;
            }
            Ok(count)
        })
        .collect()
}

/// Calls `visit` on every relabeling of `instance`: each order of its families
/// combined with each renaming of its items. The instance itself comes first.
fn for_each_relabeling(
    instance: &Instance,
    mut visit: impl FnMut(&Instance) -> Result<(), FairError>,
) -> Result<(), FairError> {
    let mut family_orders = Permutations::new(instance.family_count());
    while let Some(order) = family_orders.next_lending() {
        let mut images = Permutations::new(instance.item_count());
        while let Some(image) = images.next_lending() {
            visit(&instance.relabeled(order, image))?;
        }
    }
    Ok(())
}

/// Runs every configured protocol on every canonical instance. Protocols that
/// are not symmetric run on every relabeling of it.
pub fn search(config: &SearchConfig) -> Result<SearchReport, FairError> {
    search_with_abort(config, || false)
}

/// Like [`search`], polling `abort` before each instance.
pub fn search_with_abort(config: &SearchConfig, mut abort: impl FnMut() -> bool) -> Result<SearchReport, FairError> {
    config.validate()?;
    let protocols: Vec<Box<dyn Protocol>> = config.protocols.iter().map(|kind| kind.protocol()).collect();
    info!(
        families = config.num_families,
        max_items = config.max_items,
        approvals = config.approvals(),
        criterion = %config.criterion(),
        protocols = ?config.protocols,
        bound = %config.bound,
        "search started"
    );
    let mut report = SearchReport::new(&config.protocols);
    'sizes: for item_count in 1..=config.max_items {
        let instances = CanonicalInstances::new(item_count, config.num_families, config.approvals(), config.criterion())?;
        let mut checked = 0;
        for instance in instances {
            let instance = instance?;
            if abort() {
                report.outcome = SearchOutcome::Aborted;
                break 'sizes;
            }
            let seed = config.instance_seed(report.instances_checked);
            for (slot, protocol) in protocols.iter().enumerate() {
                let kind = protocol.kind();
                if protocol.is_symmetric() {
                    let outcome = protocol.run(&instance, seed)?;
                    report.record(slot, &instance, outcome, kind, seed);
                    continue;
                }
                for_each_relabeling(&instance, |variant| {
                    let outcome = protocol.run(variant, seed)?;
                    report.record(slot, variant, outcome, kind, seed);
                    Ok(())
                })?;
            }
            report.instances_checked += 1;
            checked += 1;
            if config.stop_at_first_counterexample && report.is_below(config.bound) {
                report.outcome = SearchOutcome::Counterexample;
                break 'sizes;
            }
        }
        debug!(item_count, instances = checked, worst = ?report.worst_ratio(), "item count done");
    }
    if report.outcome == SearchOutcome::BoundHolds && report.is_below(config.bound) {
        report.outcome = SearchOutcome::Counterexample;
    }
    info!(
        outcome = ?report.outcome,
        instances = report.instances_checked,
        worst = ?report.worst_ratio(),
        "search finished"
    );
    Ok(report)
}
