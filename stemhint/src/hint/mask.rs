//! Hint replacement.
//!
//! Walks the outline deciding which stems are active at each element.
//! Stems that overlap can't be active at the same time, so when an element
//! wants a stem that conflicts with the active set a new hintmask is
//! attached to it.

use std::collections::{BTreeSet, HashMap};

use super::{segments::SegmentKind, select::BAND_MARGIN, HintState};
use crate::{
    diag::Diagnostics,
    path::{AxisView, Dimension, ElementHandle, HintMask, HintStop, Path, Stem},
};

/// Elements shorter than this are batched into a single mask change.
const SHORT_LENGTH: f64 = 4.0;
/// Substitute candidates need at least this score.
const MIN_SUBST_VALUE: f64 = 1.0 / 16.0;
/// A segment this close to a main stem's edge uses that stem.
const SHARED_EDGE: f64 = 2.0;

/// Active stem ids per dimension.
type Active = [BTreeSet<usize>; 2];

/// Distinct stems of one dimension and how candidates map onto them.
struct Catalog {
    stems: Vec<Stem>,
    main: BTreeSet<usize>,
    by_value: Vec<Option<usize>>,
}

impl Catalog {
    fn new(state: &HintState) -> Self {
        let mut stems: Vec<Stem> = Vec::new();
        let mut by_value = vec![None; state.values.len()];
        let mut id_of = |stem: Stem| match stems.iter().position(|s| *s == stem) {
            Some(id) => id,
            None => {
                stems.push(stem);
                stems.len() - 1
            }
        };
        // main stems first so that ids are stable for them
        for &ix in &state.main {
            by_value[ix] = Some(id_of(state.values[ix].stem()));
        }
        for (ix, value) in state.values.iter().enumerate() {
            if !value.pruned && by_value[ix].is_none() {
                by_value[ix] = Some(id_of(value.stem()));
            }
        }
        let main = state
            .main
            .iter()
            .filter_map(|ix| by_value[*ix])
            .collect();
        Self {
            stems,
            main,
            by_value,
        }
    }

    /// The stem an element on `seg_loc` should use, given the segment's
    /// best candidate.
    fn resolve(&self, state: &HintState, value: usize, seg_loc: f64, substitution: bool) -> Option<usize> {
        let id = self.by_value.get(value).copied().flatten()?;
        if self.main.contains(&id) {
            return Some(id);
        }
        let candidate = &state.values[value];
        if let Some(main) = self.main.iter().copied().find(|m| {
            let stem = &self.stems[*m];
            stem.is_ghost() == candidate.is_ghost() && stem.has_edge(seg_loc, SHARED_EDGE)
        }) {
            return Some(main);
        }
        (substitution && candidate.score() >= MIN_SUBST_VALUE).then_some(id)
    }

    /// Returns true if `ghost` can be dropped in favour of the `others`,
    /// which all hint its edge.
    fn substitutable(&self, ghost: usize, others: &[usize]) -> bool {
        let Some(edge) = self.stems[ghost].ghost_edge() else {
            return false;
        };
        !others.is_empty()
            && others.iter().all(|other| {
                let stem = &self.stems[*other];
                !stem.is_ghost() && stem.has_edge(edge, SHARED_EDGE)
            })
    }

    fn conflicts(&self, id: usize, set: &BTreeSet<usize>) -> Vec<usize> {
        set.iter()
            .copied()
            .filter(|other| *other != id && self.stems[id].conflicts_with(&self.stems[*other]))
            .collect()
    }
}

/// Computes stem lists and hintmasks for `path` from the per-dimension
/// hinting results.
pub(crate) fn distribute(path: &mut Path, states: &[HintState; 2], substitution: bool, diag: &Diagnostics) {
    let catalogs = [Catalog::new(&states[0]), Catalog::new(&states[1])];
    let desires = desired_stems(path, states, &catalogs, substitution);
    let walker = Walker {
        path: &*path,
        catalogs: &catalogs,
        diag,
    };
    let changes = walker.walk(&desires);
    write_hints(path, states, &catalogs, changes);
}

/// Stems each element asks for, from the segments it produced.
fn desired_stems(
    path: &Path,
    states: &[HintState; 2],
    catalogs: &[Catalog; 2],
    substitution: bool,
) -> HashMap<ElementHandle, Active> {
    let mut desires: HashMap<ElementHandle, Active> = HashMap::new();
    for (dim, (state, catalog)) in states.iter().zip(catalogs).enumerate() {
        for seg in &state.segments {
            let Some(best) = seg.best else {
                continue;
            };
            // bounding box edges only matter for the main set
            if seg.kind == SegmentKind::BBox && !catalog.main.iter().any(|m| catalog.by_value[best] == Some(*m)) {
                continue;
            }
            let Some(id) = catalog.resolve(state, best, seg.loc, substitution) else {
                continue;
            };
            for handle in &seg.elements {
                if path.current(*handle, seg.generation).is_some() {
                    desires.entry(*handle).or_default()[dim].insert(id);
                }
            }
        }
    }
    desires
}

struct Walker<'a, 'b> {
    path: &'a Path,
    catalogs: &'a [Catalog; 2],
    diag: &'a Diagnostics<'b>,
}

/// A mask and the element it takes effect at. `None` is the start of the
/// outline.
type Change = (Option<ElementHandle>, Active);

impl Walker<'_, '_> {
    fn walk(&self, desires: &HashMap<ElementHandle, Active>) -> Vec<Change> {
        let mut current: Active = [self.catalogs[0].main.clone(), self.catalogs[1].main.clone()];
        let mut anchor: Option<ElementHandle> = None;
        let mut changes: Vec<Change> = Vec::new();
        // mask changes deferred over a run of short elements
        let mut pending: Option<(ElementHandle, Active)> = None;
        let stops = self.path.hint_order();
        let first_anchor = stops.first().map(|stop| stop.anchor);
        let mut switch = |current: &mut Active, anchor: &mut Option<ElementHandle>, at: ElementHandle, wanted: Active| {
            let next = self.carry_forward(current, at, wanted);
            if next.iter().all(BTreeSet::is_empty) {
                return;
            }
            if anchor.is_none() && Some(at) == first_anchor {
                // nothing has been hinted yet: replace the initial mask
                *current = next;
                return;
            }
            changes.push((*anchor, std::mem::replace(current, next)));
            *anchor = Some(at);
        };
        for stop in &stops {
            let wanted = self.clean(self.wanted(stop, desires));
            if self.is_short(stop) {
                if let Some((_, set)) = &mut pending {
                    for dim in 0..2 {
                        set[dim].extend(wanted[dim].iter().copied());
                    }
                    *set = self.clean(std::mem::take(set));
                } else if let Some(merged) = self.merge(&current, &wanted) {
                    current = merged;
                } else {
                    pending = Some((stop.anchor, wanted));
                }
                continue;
            }
            if let Some((at, set)) = pending.take() {
                switch(&mut current, &mut anchor, at, set);
            }
            if let Some(merged) = self.merge(&current, &wanted) {
                current = merged;
            } else {
                switch(&mut current, &mut anchor, stop.anchor, wanted);
            }
        }
        if let Some((at, set)) = pending.take() {
            switch(&mut current, &mut anchor, at, set);
        }
        changes.push((anchor, current));
        changes
    }

    fn wanted(&self, stop: &HintStop, desires: &HashMap<ElementHandle, Active>) -> Active {
        let mut wanted = Active::default();
        for desire in stop.elements.iter().filter_map(|h| desires.get(h)) {
            for dim in 0..2 {
                wanted[dim].extend(desire[dim].iter().copied());
            }
        }
        wanted
    }

    fn is_short(&self, stop: &HintStop) -> bool {
        stop.elements.iter().all(|h| {
            self.path
                .element(*h)
                .is_none_or(|el| el.chord_len() < SHORT_LENGTH)
        })
    }

    /// Drops stems an element wants that can't coexist.
    fn clean(&self, mut wanted: Active) -> Active {
        for (dim, catalog) in self.catalogs.iter().enumerate() {
            let mut drop = BTreeSet::new();
            for &id in &wanted[dim] {
                let conflicts = catalog.conflicts(id, &wanted[dim]);
                if conflicts.is_empty() {
                    continue;
                }
                if catalog.substitutable(id, &conflicts) {
                    drop.insert(id);
                } else if !conflicts.iter().all(|other| catalog.substitutable(*other, &[id])) {
                    drop.insert(id);
                    self.diag.with_dim(Dimension::ALL[dim]).debug(format!(
                        "dropping conflicting stem {:?}",
                        catalog.stems[id]
                    ));
                }
            }
            wanted[dim].retain(|id| !drop.contains(id));
        }
        wanted
    }

    /// Merges `wanted` into the active set, or returns `None` on conflict.
    fn merge(&self, current: &Active, wanted: &Active) -> Option<Active> {
        let mut merged = current.clone();
        for (dim, catalog) in self.catalogs.iter().enumerate() {
            for &id in &wanted[dim] {
                if merged[dim].contains(&id) {
                    continue;
                }
                let conflicts = catalog.conflicts(id, &merged[dim]);
                if conflicts.is_empty() {
                    merged[dim].insert(id);
                } else if catalog.substitutable(id, &conflicts) {
                    // the active stems already hint this ghost's edge
                } else if conflicts.iter().all(|other| catalog.substitutable(*other, &[id])) {
                    for other in conflicts {
                        merged[dim].remove(&other);
                    }
                    merged[dim].insert(id);
                } else {
                    return None;
                }
            }
        }
        Some(merged)
    }

    /// Builds the mask for a change at `at`: the wanted stems plus active
    /// stems near the change point that don't conflict.
    fn carry_forward(&self, current: &Active, at: ElementHandle, mut next: Active) -> Active {
        let Some(point) = self.path.element(at).map(|el| el.s) else {
            return next;
        };
        for (dim, catalog) in self.catalogs.iter().enumerate() {
            let loc = point.a(Dimension::ALL[dim]);
            for &id in &current[dim] {
                if next[dim].contains(&id) {
                    continue;
                }
                let (lo, hi) = catalog.stems[id].span();
                let near = loc >= lo - BAND_MARGIN && loc <= hi + BAND_MARGIN;
                if near && catalog.conflicts(id, &next[dim]).is_empty() {
                    next[dim].insert(id);
                }
            }
        }
        next
    }
}

/// Writes the stem lists and masks, renumbering stems in position order.
fn write_hints(path: &mut Path, states: &[HintState; 2], catalogs: &[Catalog; 2], changes: Vec<Change>) {
    let mut remap: [HashMap<usize, usize>; 2] = Default::default();
    for (dim, catalog) in catalogs.iter().enumerate() {
        let mut used = changes
            .iter()
            .flat_map(|(_, active)| active[dim].iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        used.sort_by(|a, b| catalog.stems[*a].cmp_position(&catalog.stems[*b]));
        remap[dim] = used.iter().enumerate().map(|(new, old)| (*old, new)).collect();
        path.set_stems(
            Dimension::ALL[dim],
            used.iter().map(|id| catalog.stems[*id]).collect(),
        );
    }
    let (h_count, v_count) = (path.hstems.len(), path.vstems.len());
    let to_mask = |active: &Active| {
        HintMask::from_indices(
            h_count,
            v_count,
            active[0].iter().filter_map(|id| remap[0].get(id).copied()),
            active[1].iter().filter_map(|id| remap[1].get(id).copied()),
        )
    };
    path.start_mask = None;
    if changes.len() > 1 {
        for (anchor, active) in &changes {
            let mask = to_mask(active);
            match anchor {
                None => path.start_mask = Some(mask),
                Some(handle) => {
                    if let Some(el) = path.element_mut(*handle) {
                        el.mask = Some(mask);
                    }
                }
            }
        }
    }
    path.counter_masks.clear();
    for (dim, (state, catalog)) in states.iter().zip(catalogs).enumerate() {
        let Some(group) = state.counter else {
            continue;
        };
        let ids = group
            .iter()
            .filter_map(|ix| catalog.by_value[*ix])
            .filter_map(|id| remap[dim].get(&id).copied());
        let mask = if dim == 0 {
            HintMask::from_indices(h_count, v_count, ids, [])
        } else {
            HintMask::from_indices(h_count, v_count, [], ids)
        };
        path.counter_masks.push(mask);
    }
}
