//! Refinery families: pluggable partition policies that carve a "done"
//! subregion out of a "maybe" cell, driven by the analysis an external
//! solver hands back for each automaton state `q`.
//!
//! Purpose
//! - A `Refinery` exposes `partition(state, q, rest) -> (done, rest')`.
//!   Running a list of refineries on one state composes their `done`
//!   pieces per `q`; running that across every relevant `q` and
//!   precisely-partitioning by "which `q`s marked this point done" is what
//!   turns per-`q` analysis results into the single per-state partition
//!   `AbstractedLss::refine` consumes.
//!
//! References
//! - No direct teacher analogue; the `LayerGenerator` default-method ->
//!   `Error::NotImplemented` pattern follows this crate's own
//!   `Error::NotImplemented` contract (§7 of the spec this crate
//!   implements): an unimplemented extension point must fail loudly, never
//!   silently no-op, and must never be reachable from a complete,
//!   correctly configured build.

use std::collections::HashMap;
use std::hash::Hash;

use crate::abstraction::partition::precise_partition;
use crate::abstraction::{AbstractedLss, StateLabel};
use crate::dynamics::Lss;
use crate::error::{Error, Result};
use crate::polytope::union::PolytopeUnion;
use crate::polytope::Polytope;

/// Per-automaton-state labeling handed back by the external game solver:
/// which abstraction states are decided `yes`/`no` for `q`, and which
/// remain `maybe` (the ones a refinery pass actually operates on).
#[derive(Clone, Debug, Default)]
pub struct Analysis<Q> {
    pub yes: HashMap<Q, Vec<StateLabel>>,
    pub no: HashMap<Q, Vec<StateLabel>>,
    pub maybe: HashMap<Q, Vec<StateLabel>>,
}

impl<Q: Eq + Hash> Analysis<Q> {
    fn states(&self, which: &HashMap<Q, Vec<StateLabel>>, q: &Q) -> Vec<StateLabel> {
        which.get(q).cloned().unwrap_or_default()
    }

    pub fn yes_states(&self, q: &Q) -> Vec<StateLabel> {
        self.states(&self.yes, q)
    }

    pub fn no_states(&self, q: &Q) -> Vec<StateLabel> {
        self.states(&self.no, q)
    }
}

fn union_of(abs: &AbstractedLss, labels: &[StateLabel]) -> PolytopeUnion {
    PolytopeUnion::from_pieces(
        labels
            .iter()
            .filter_map(|l| abs.state(*l))
            .map(|s| s.polytope().clone())
            .collect(),
    )
}

/// `postProcessing` knob from the refinement settings surface (§6): whether
/// a refinery's `done` output is left as the raw disjunctified sweep, or
/// further coalesced via `simplify` (hull-covered pieces collapse to one).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostProcessing {
    None,
    Suppress,
}

fn post_process(settings: &RefinerySettings, region: PolytopeUnion) -> Result<PolytopeUnion> {
    match settings.post_processing {
        PostProcessing::None => Ok(region),
        PostProcessing::Suppress => region.simplify(),
    }
}

/// Shared per-refinery settings surface: `expandTarget`/`dontRefineSmall`
/// toggles, `postProcessing` enum, exactly as named in §6 of the spec this
/// crate implements.
#[derive(Clone, Debug)]
pub struct RefinerySettings {
    /// Grow the `yes`/`no` target union by one extra robust-predecessor
    /// layer before computing the attractor/predecessor against it.
    pub expand_target: bool,
    /// Skip marking a `done` region whose total volume is below a small
    /// fraction of the cell's own volume, to avoid needless micro-splits.
    pub dont_refine_small: bool,
    pub post_processing: PostProcessing,
}

impl Default for RefinerySettings {
    fn default() -> Self {
        RefinerySettings {
            expand_target: false,
            dont_refine_small: false,
            post_processing: PostProcessing::None,
        }
    }
}

const SMALL_VOLUME_FRACTION: f64 = 1e-3;

fn is_negligible(settings: &RefinerySettings, cell_volume: f64, done: &PolytopeUnion) -> bool {
    if !settings.dont_refine_small {
        return false;
    }
    let done_volume: f64 = done.pieces().iter().map(|p| p.volume()).sum();
    done_volume < cell_volume * SMALL_VOLUME_FRACTION
}

fn expand(abs: &AbstractedLss, settings: &RefinerySettings, target: PolytopeUnion) -> Result<PolytopeUnion> {
    if !settings.expand_target || target.is_empty() {
        return Ok(target);
    }
    let grown = abs.lss().pre_r(abs.lss().x(), abs.lss().u(), &target)?;
    PolytopeUnion::from_pieces([target.into_pieces(), grown.into_pieces()].concat()).disjunctify()
}

/// A pluggable partition policy: given the cell's still-unallocated
/// subregion `rest` for automaton state `q`, returns the `done` piece this
/// refinery claims and the `rest'` left over (`done ⊎ rest' = rest`).
pub trait Refinery<Q> {
    fn partition(
        &self,
        abs: &AbstractedLss,
        state: StateLabel,
        q: &Q,
        analysis: &Analysis<Q>,
        rest: &PolytopeUnion,
    ) -> Result<(PolytopeUnion, PolytopeUnion)>;
}

/// `Attr(X, U, no-states-for-q)`, intersected with `rest`: the part of the
/// cell that can never escape the `no` region robustly, hence is itself
/// decidable as `no`.
pub struct NegativeAttractor {
    pub settings: RefinerySettings,
}

impl<Q: Eq + Hash> Refinery<Q> for NegativeAttractor {
    fn partition(
        &self,
        abs: &AbstractedLss,
        state: StateLabel,
        q: &Q,
        analysis: &Analysis<Q>,
        rest: &PolytopeUnion,
    ) -> Result<(PolytopeUnion, PolytopeUnion)> {
        let cell = abs.state(state).ok_or_else(|| Error::ValueError {
            message: format!("NegativeAttractor: unknown state {state}"),
        })?;
        let no = expand(abs, &self.settings, union_of(abs, &analysis.no_states(q)))?;
        let attr = abs.lss().attr(cell.polytope(), abs.lss().u(), &no)?;
        let mut done = rest.intersect(&attr)?;
        if is_negligible(&self.settings, cell.polytope().volume(), &done) {
            return Ok((PolytopeUnion::empty(), rest.clone()));
        }
        done = post_process(&self.settings, done)?;
        let new_rest = PolytopeUnion::remove(rest, &done)?;
        Ok((done, new_rest))
    }
}

/// `PreR(X, U, yes-states-for-q)`, intersected with `rest`: the part of the
/// cell from which the `yes` region is robustly reachable.
pub struct PositiveRobustPredecessor {
    pub settings: RefinerySettings,
}

impl<Q: Eq + Hash> Refinery<Q> for PositiveRobustPredecessor {
    fn partition(
        &self,
        abs: &AbstractedLss,
        state: StateLabel,
        q: &Q,
        analysis: &Analysis<Q>,
        rest: &PolytopeUnion,
    ) -> Result<(PolytopeUnion, PolytopeUnion)> {
        let cell = abs.state(state).ok_or_else(|| Error::ValueError {
            message: format!("PositiveRobustPredecessor: unknown state {state}"),
        })?;
        let yes = expand(abs, &self.settings, union_of(abs, &analysis.yes_states(q)))?;
        let prer = abs.lss().pre_r(cell.polytope(), abs.lss().u(), &yes)?;
        let mut done = rest.intersect(&prer)?;
        if is_negligible(&self.settings, cell.polytope().volume(), &done) {
            return Ok((PolytopeUnion::empty(), rest.clone()));
        }
        done = post_process(&self.settings, done)?;
        let new_rest = PolytopeUnion::remove(rest, &done)?;
        Ok((done, new_rest))
    }
}

/// `Attr(X, U, {X})`: the part of the cell guaranteed to stay inside it
/// under some robust control, regardless of `q` (a self-loop is a property
/// of the cell and the dynamics, not of the objective automaton).
pub struct SafetySelfLoop {
    pub settings: RefinerySettings,
}

impl<Q> Refinery<Q> for SafetySelfLoop {
    fn partition(
        &self,
        abs: &AbstractedLss,
        state: StateLabel,
        _q: &Q,
        _analysis: &Analysis<Q>,
        rest: &PolytopeUnion,
    ) -> Result<(PolytopeUnion, PolytopeUnion)> {
        let cell = abs.state(state).ok_or_else(|| Error::ValueError {
            message: format!("SafetySelfLoop: unknown state {state}"),
        })?;
        let own = PolytopeUnion::single(cell.polytope().clone());
        let attr = abs.lss().attr(cell.polytope(), abs.lss().u(), &own)?;
        let mut done = rest.intersect(&attr)?;
        if is_negligible(&self.settings, cell.polytope().volume(), &done) {
            return Ok((PolytopeUnion::empty(), rest.clone()));
        }
        done = post_process(&self.settings, done)?;
        let new_rest = PolytopeUnion::remove(rest, &done)?;
        Ok((done, new_rest))
    }
}

/// A named one-step predecessor operator usable by `Layered`. The default
/// method is the extension point named in §6's layering descriptor
/// (`generator ∈ {"PreR"}`): a future generator kind that hasn't been
/// wired up yet fails loudly via `Error::NotImplemented` rather than
/// silently producing an empty layer.
pub trait LayerGenerator {
    fn name(&self) -> &'static str;

    #[allow(unused_variables)]
    fn step(&self, lss: &Lss, origin: &Polytope, target: &PolytopeUnion) -> Result<PolytopeUnion> {
        Err(Error::NotImplemented { what: self.name() })
    }
}

/// The one concrete generator named in the spec's layering descriptor.
pub struct PreRGenerator;

impl LayerGenerator for PreRGenerator {
    fn name(&self) -> &'static str {
        "PreR"
    }

    fn step(&self, lss: &Lss, origin: &Polytope, target: &PolytopeUnion) -> Result<PolytopeUnion> {
        lss.pre_r(origin, lss.u(), target)
    }
}

/// Iterate a generator (with an optional disturbance scaling in `[0, 1]`) a
/// configurable number of times to produce nested target rings: each
/// iteration's ring is the generator's one-step image of the
/// still-accumulating target, intersected with what is left of `rest`.
pub struct Layered {
    pub generator: Box<dyn LayerGenerator>,
    /// Scales `W` by this factor (about the origin) before running the
    /// generator; `1.0` is the unscaled disturbance.
    pub scaling: f64,
    pub iterations: usize,
    pub settings: RefinerySettings,
}

impl Layered {
    pub fn pre_r(scaling: f64, iterations: usize, settings: RefinerySettings) -> Self {
        Layered {
            generator: Box::new(PreRGenerator),
            scaling: scaling.clamp(0.0, 1.0),
            iterations,
            settings,
        }
    }

    fn scaled_lss(&self, lss: &Lss) -> Result<Lss> {
        if (self.scaling - 1.0).abs() < crate::tol::DEFAULT_TAU {
            return Ok(lss.clone());
        }
        let d = lss.w().dim();
        let mut data = vec![0.0; d * d];
        for i in 0..d {
            data[i * d + i] = self.scaling;
        }
        let scale = crate::linalg::matrix(d, d, &data)?;
        let w = lss.w().apply(&scale)?;
        Lss::new(lss.a().clone(), lss.b().clone(), lss.x().clone(), w, lss.u().clone())
    }
}

impl<Q: Eq + Hash> Refinery<Q> for Layered {
    fn partition(
        &self,
        abs: &AbstractedLss,
        state: StateLabel,
        q: &Q,
        analysis: &Analysis<Q>,
        rest: &PolytopeUnion,
    ) -> Result<(PolytopeUnion, PolytopeUnion)> {
        let cell = abs.state(state).ok_or_else(|| Error::ValueError {
            message: format!("Layered: unknown state {state}"),
        })?;
        let layered_lss = self.scaled_lss(abs.lss())?;

        let mut target = union_of(abs, &analysis.yes_states(q));
        let mut done = PolytopeUnion::empty();
        let mut remaining_rest = rest.clone();

        for _ in 0..self.iterations.max(1) {
            if remaining_rest.is_empty() || target.is_empty() {
                break;
            }
            let layer = self.generator.step(&layered_lss, cell.polytope(), &target)?;
            let ring = remaining_rest.intersect(&layer)?;
            if ring.is_empty() {
                break;
            }
            done = PolytopeUnion::from_pieces([done.into_pieces(), ring.clone().into_pieces()].concat())
                .disjunctify()?;
            remaining_rest = PolytopeUnion::remove(&remaining_rest, &ring)?;
            target = PolytopeUnion::from_pieces([target.into_pieces(), ring.into_pieces()].concat()).disjunctify()?;
        }

        if is_negligible(&self.settings, cell.polytope().volume(), &done) {
            return Ok((PolytopeUnion::empty(), rest.clone()));
        }
        done = post_process(&self.settings, done)?;
        let new_rest = PolytopeUnion::remove(rest, &done)?;
        Ok((done, new_rest))
    }
}

/// Run `refineries` in sequence for each `q` (each `q` starts fresh from
/// the cell's whole polytope, so a region marked done for one `q` remains
/// independently subject to refinement for another), then precisely
/// partition by "which `q`s marked this point done" so every maximal
/// subregion lands in exactly one piece of the output. Any point marked
/// done for no `q` stays as one final catch-all piece. The result is a
/// disjoint cover of the cell's polytope, ready for `AbstractedLss::refine`.
pub fn compose_partition<Q: Clone + Eq + Hash>(
    abs: &AbstractedLss,
    state: StateLabel,
    qs: &[Q],
    analysis: &Analysis<Q>,
    refineries: &[&dyn Refinery<Q>],
) -> Result<Vec<Polytope>> {
    let cell = abs.state(state).ok_or_else(|| Error::ValueError {
        message: format!("compose_partition: unknown state {state}"),
    })?;
    let whole = PolytopeUnion::single(cell.polytope().clone());

    let mut done_per_q: Vec<(Q, PolytopeUnion)> = Vec::with_capacity(qs.len());
    for q in qs {
        let mut done = PolytopeUnion::empty();
        let mut rest = whole.clone();
        for refinery in refineries {
            let (new_done, new_rest) = refinery.partition(abs, state, q, analysis, &rest)?;
            done = PolytopeUnion::from_pieces([done.into_pieces(), new_done.into_pieces()].concat()).disjunctify()?;
            rest = new_rest;
        }
        done_per_q.push((q.clone(), done));
    }

    let parts = precise_partition(done_per_q.into_iter(), |(_, done)| Ok(done.clone()))?;

    let mut pieces: Vec<Polytope> = Vec::new();
    let mut covered = PolytopeUnion::empty();
    for part in parts {
        let simplified = part.region.simplify()?;
        covered = PolytopeUnion::from_pieces([covered.into_pieces(), simplified.clone().into_pieces()].concat())
            .disjunctify()?;
        pieces.extend(simplified.into_pieces());
    }

    let leftover = PolytopeUnion::remove(&whole, &covered)?.simplify()?;
    pieces.extend(leftover.into_pieces());

    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::halfspace::Halfspace;
    use crate::linalg::{matrix, vector};

    fn square(lo: f64, hi: f64) -> Polytope {
        Polytope::hull(&[
            vector(&[lo, lo]),
            vector(&[hi, lo]),
            vector(&[hi, hi]),
            vector(&[lo, hi]),
        ])
        .unwrap()
    }

    fn small_abstraction() -> AbstractedLss {
        let a = matrix(2, 2, &[1.0, 0.0, 0.0, 1.0]).unwrap();
        let b = matrix(2, 2, &[1.0, 0.0, 0.0, 1.0]).unwrap();
        let x = square(-5.0, 5.0);
        let w = square(-0.1, 0.1);
        let u = PolytopeUnion::single(square(-1.0, 1.0));
        let lss = Lss::new(a, b, x, w, u).unwrap();
        let predicate = Halfspace::normalize(vector(&[-1.0, 0.0]), 0.0); // x > 0
        AbstractedLss::new(lss, vec![("x_gt_0".to_string(), predicate)]).unwrap()
    }

    #[test]
    fn negative_attractor_composes_into_a_cover_of_the_cell() {
        let abs = small_abstraction();
        let undecided: Vec<StateLabel> = abs
            .states()
            .filter(|s| s.kind() == super::super::Kind::Undecided)
            .map(|s| s.label())
            .collect();
        assert!(undecided.len() >= 2);
        let outer: Vec<StateLabel> = abs
            .states()
            .filter(|s| s.kind() == super::super::Kind::Outer)
            .map(|s| s.label())
            .collect();

        let mut analysis: Analysis<&str> = Analysis::default();
        analysis.no.insert("q0", outer.clone());

        let refinery = NegativeAttractor {
            settings: RefinerySettings::default(),
        };
        let refineries: Vec<&dyn Refinery<&str>> = vec![&refinery];
        let target = undecided[0];
        let pieces = compose_partition(&abs, target, &["q0"], &analysis, &refineries).unwrap();
        let cover = PolytopeUnion::from_pieces(pieces);
        let cell_poly = abs.state(target).unwrap().polytope().clone();
        assert!(cover.is_same_as(&PolytopeUnion::single(cell_poly)).unwrap());
    }

    #[test]
    fn safety_self_loop_is_subset_of_cell() {
        let abs = small_abstraction();
        let target = abs
            .states()
            .find(|s| s.kind() == super::super::Kind::Undecided)
            .unwrap()
            .label();
        let refinery = SafetySelfLoop {
            settings: RefinerySettings::default(),
        };
        let analysis: Analysis<&str> = Analysis::default();
        let whole = PolytopeUnion::single(abs.state(target).unwrap().polytope().clone());
        let (done, rest) = refinery.partition(&abs, target, &"q0", &analysis, &whole).unwrap();
        assert!(whole.covers(&done).unwrap());
        assert!(whole.is_same_as(&PolytopeUnion::from_pieces(
            [done.into_pieces(), rest.into_pieces()].concat()
        )).unwrap());
    }

    #[test]
    fn layered_with_no_yes_states_does_nothing() {
        let abs = small_abstraction();
        let target = abs
            .states()
            .find(|s| s.kind() == super::super::Kind::Undecided)
            .unwrap()
            .label();
        let layered = Layered::pre_r(1.0, 3, RefinerySettings::default());
        let analysis: Analysis<&str> = Analysis::default();
        let whole = PolytopeUnion::single(abs.state(target).unwrap().polytope().clone());
        let (done, rest) = layered.partition(&abs, target, &"q0", &analysis, &whole).unwrap();
        assert!(done.is_empty());
        assert!(rest.is_same_as(&whole).unwrap());
    }

    #[test]
    fn unwired_layer_generator_fails_loudly() {
        struct Unimplemented;
        impl LayerGenerator for Unimplemented {
            fn name(&self) -> &'static str {
                "future-generator"
            }
        }
        let lss = {
            let a = matrix(2, 2, &[1.0, 0.0, 0.0, 1.0]).unwrap();
            let b = matrix(2, 2, &[1.0, 0.0, 0.0, 1.0]).unwrap();
            let x = square(-5.0, 5.0);
            let w = square(-0.1, 0.1);
            let u = PolytopeUnion::single(square(-1.0, 1.0));
            Lss::new(a, b, x, w, u).unwrap()
        };
        let gen = Unimplemented;
        let target = PolytopeUnion::single(square(-1.0, 1.0));
        let err = gen.step(&lss, lss.x(), &target).unwrap_err();
        assert!(matches!(err, Error::NotImplemented { .. }));
    }
}
