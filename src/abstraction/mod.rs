//! Labeled finite cells over an `Lss`: predicate-driven initial
//! decomposition, lazy per-cell game-action construction, and the
//! `GameGraph` read view consumed by an external two-player-game solver.
//!
//! Purpose
//! - Bridges the continuous `Lss`/`Polytope` layers below to a finite-state
//!   probabilistic game above: every `State` is a convex cell, every
//!   `Action` is a maximal control region sharing one reachable target set,
//!   and every `ActionSupport` further narrows that to the sub-region from
//!   which one specific subset of targets is robustly reachable.
//!
//! References
//! - No direct teacher analogue (the teacher has no owned, mutable
//!   graph-of-cells structure); the lazy dual-representation `OnceCell`
//!   pattern is carried over from `polytope::polygon::Polygon`. Weak
//!   back-references (targets stored as `StateLabel`s, not pointers) follow
//!   the index-based adjacency style of `oriented_edge::types::Graph`
//!   (`RidgeId`/`FacetId`), reference material only.

pub mod partition;
pub mod refine;

use std::cell::OnceCell;
use std::collections::HashMap;

use rand::Rng;

use crate::dynamics::Lss;
use crate::error::{Error, Result};
use crate::halfspace::Halfspace;
use crate::linalg::{self, Vector};
use crate::polytope::union::PolytopeUnion;
use crate::polytope::Polytope;
use crate::tol::DEFAULT_TAU;

/// Monotonically generated identifier for a `State`. Actions and supports
/// reference targets by label, not by pointer, so refinement's
/// delete-and-replace can never leave a dangling reference.
pub type StateLabel = u64;

/// User-facing (or auto-generated) name for a decomposition predicate.
pub type PredicateLabel = String;

/// Classification of a cell against the (externally owned) temporal
/// objective. `Outer` cells lie in `Post(X, U) \ X` and never have actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Outer,
    Nonsatisfying,
    Undecided,
    Satisfying,
}

/// A further refinement of an `Action` by one non-empty subset of its
/// targets: the sub-region of the origin from which that subset is
/// robustly reachable under the action's controls.
#[derive(Clone, Debug)]
pub struct ActionSupport {
    targets: Vec<StateLabel>,
    origin_region: PolytopeUnion,
}

impl ActionSupport {
    pub fn targets(&self) -> &[StateLabel] {
        &self.targets
    }

    pub fn origin_region(&self) -> &PolytopeUnion {
        &self.origin_region
    }
}

/// A maximal control region from which the origin's successors are exactly
/// one given target set (for some disturbance, and nowhere else).
#[derive(Clone, Debug)]
pub struct Action {
    origin: StateLabel,
    targets: Vec<StateLabel>,
    controls: PolytopeUnion,
    supports: OnceCell<Vec<ActionSupport>>,
}

impl Action {
    pub fn origin(&self) -> StateLabel {
        self.origin
    }

    pub fn targets(&self) -> &[StateLabel] {
        &self.targets
    }

    pub fn controls(&self) -> &PolytopeUnion {
        &self.controls
    }
}

/// A labeled convex cell of the abstraction.
#[derive(Clone, Debug)]
pub struct State {
    label: StateLabel,
    polytope: Polytope,
    kind: Kind,
    predicate_labels: Vec<PredicateLabel>,
    actions: OnceCell<Vec<Action>>,
    reachable_witness: OnceCell<Vec<StateLabel>>,
}

impl State {
    pub fn label(&self) -> StateLabel {
        self.label
    }

    pub fn polytope(&self) -> &Polytope {
        &self.polytope
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn predicate_labels(&self) -> &[PredicateLabel] {
        &self.predicate_labels
    }

    fn fresh(label: StateLabel, polytope: Polytope, kind: Kind, predicate_labels: Vec<PredicateLabel>) -> Self {
        State {
            label,
            polytope,
            kind,
            predicate_labels,
            actions: OnceCell::new(),
            reachable_witness: OnceCell::new(),
        }
    }
}

/// Read-only view consumed by an external two-player probabilistic-game
/// solver; see the distilled spec's `GameGraph` interface (§4.5/§6).
pub trait GameGraph {
    fn state_labels(&self) -> Vec<StateLabel>;
    fn predicate_labels_of(&self, state: StateLabel) -> Vec<PredicateLabel>;
    fn action_count(&self, state: StateLabel) -> Result<usize>;
    fn support_count(&self, state: StateLabel, action: usize) -> Result<usize>;
    fn target_labels(&self, state: StateLabel, action: usize, support: usize) -> Result<Vec<StateLabel>>;
}

/// The `Lss` plus its finite, labeled, lazily-actioned cell decomposition.
pub struct AbstractedLss {
    lss: Lss,
    states: HashMap<StateLabel, State>,
    predicates: HashMap<PredicateLabel, Halfspace>,
    next_label: StateLabel,
}

impl AbstractedLss {
    /// Build the initial decomposition: one `Outer` cell per piece of
    /// `Post(X, U) \ X`, one `Undecided` cell per maximal region of `X`
    /// defined by a unique subset of `predicates` (via the precise-operator
    /// partition on `p -> X ∩ p`), plus a final `Undecided` cell for
    /// `X ∩ ⋀ flip(p_i)` if non-empty.
    pub fn new(lss: Lss, predicates: Vec<(String, Halfspace)>) -> Result<Self> {
        let d = lss.state_dim();
        let mut named: Vec<(PredicateLabel, Halfspace)> = Vec::with_capacity(predicates.len());
        for (i, (label, hs)) in predicates.into_iter().enumerate() {
            if hs.dim() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: hs.dim(),
                    context: "AbstractedLss::new (predicate dim)",
                });
            }
            let label = if label.is_empty() { format!("p{i}") } else { label };
            named.push((label, hs));
        }

        let mut abs = AbstractedLss {
            lss,
            states: HashMap::new(),
            predicates: HashMap::new(),
            next_label: 0,
        };
        for (label, hs) in &named {
            abs.predicates.insert(label.clone(), hs.clone());
        }

        let post = abs.lss.post_full()?;
        let outer = PolytopeUnion::remove(&post, &PolytopeUnion::single(abs.lss.x().clone()))?;
        for piece in outer.into_pieces() {
            abs.new_state(piece, Kind::Outer, Vec::new());
        }

        let x = abs.lss.x().clone();
        let parts = partition::precise_partition(named.clone().into_iter(), |(_, hs)| {
            Ok(PolytopeUnion::single(x.cut(std::slice::from_ref(hs))?))
        })?;
        for part in parts {
            let labels: Vec<PredicateLabel> = part.items.iter().map(|(l, _)| l.clone()).collect();
            for piece in part.region.simplify()?.into_pieces() {
                abs.new_state(piece, Kind::Undecided, labels.clone());
            }
        }

        let flips: Vec<Halfspace> = named.iter().map(|(_, hs)| hs.flip()).collect();
        let remainder = x.cut(&flips)?;
        if !remainder.is_empty() {
            abs.new_state(remainder, Kind::Undecided, Vec::new());
        }

        Ok(abs)
    }

    fn fresh_label(&mut self) -> StateLabel {
        let label = self.next_label;
        self.next_label += 1;
        label
    }

    fn new_state(&mut self, polytope: Polytope, kind: Kind, predicate_labels: Vec<PredicateLabel>) -> StateLabel {
        let label = self.fresh_label();
        let state = State::fresh(label, polytope, kind, predicate_labels);
        self.states.insert(label, state);
        label
    }

    pub fn lss(&self) -> &Lss {
        &self.lss
    }

    pub fn state(&self, label: StateLabel) -> Option<&State> {
        self.states.get(&label)
    }

    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.values()
    }

    pub fn predicate(&self, label: &str) -> Option<&Halfspace> {
        self.predicates.get(label)
    }

    pub fn predicates(&self) -> &HashMap<PredicateLabel, Halfspace> {
        &self.predicates
    }

    /// Lazily construct (and memoize) the `State`'s actions: the reachable
    /// set `{ s : Post(x.poly, U) ∩ s.poly != empty }` is memoized as the
    /// reachable witness, then precisely partitioned by
    /// `s -> ActionPolytope(x.poly, s.poly)`; each part becomes one Action.
    pub fn actions(&self, label: StateLabel) -> Result<&[Action]> {
        let state = self
            .states
            .get(&label)
            .ok_or_else(|| Error::ValueError {
                message: format!("actions: unknown state label {label}"),
            })?;
        if let Some(actions) = state.actions.get() {
            return Ok(actions.as_slice());
        }
        let computed = self.compute_actions(state)?;
        let _ = state.actions.set(computed);
        Ok(state
            .actions
            .get()
            .expect("actions were just populated")
            .as_slice())
    }

    fn compute_actions(&self, state: &State) -> Result<Vec<Action>> {
        if state.kind == Kind::Outer {
            let _ = state.reachable_witness.set(Vec::new());
            return Ok(Vec::new());
        }
        let post = self.lss.post(&state.polytope, self.lss.u())?;
        let mut reachable: Vec<StateLabel> = Vec::new();
        for other in self.states.values() {
            if post.do_intersect(&PolytopeUnion::single(other.polytope.clone()))? {
                reachable.push(other.label);
            }
        }
        reachable.sort_unstable();
        let _ = state.reachable_witness.set(reachable.clone());

        let parts = partition::precise_partition(reachable.into_iter(), |&target| {
            let target_poly = &self
                .states
                .get(&target)
                .ok_or_else(|| Error::ValueError {
                    message: format!("compute_actions: unknown target state {target}"),
                })?
                .polytope;
            self.lss.action_polytope(&state.polytope, target_poly)
        })?;

        let mut actions = Vec::with_capacity(parts.len());
        for part in parts {
            let controls = part.region.simplify()?;
            if controls.is_empty() {
                continue;
            }
            let mut targets = part.items;
            targets.sort_unstable();
            actions.push(Action {
                origin: state.label,
                targets,
                controls,
                supports: OnceCell::new(),
            });
        }
        Ok(actions)
    }

    /// Lazily construct (and memoize) the `ActionSupport`s of the action at
    /// `action_idx` on `state`: `prer = simplify(PreR(x, a.controls,
    /// a.targets))`, then partition `a.targets` precisely by
    /// `t -> Pre(x, a.controls, {t})`, intersecting each part's region with
    /// `prer` and dropping empty results.
    pub fn supports(&self, state: StateLabel, action_idx: usize) -> Result<&[ActionSupport]> {
        let actions = self.actions(state)?;
        let action = actions.get(action_idx).ok_or_else(|| Error::ValueError {
            message: format!("supports: state {state} has no action {action_idx}"),
        })?;
        if let Some(supports) = action.supports.get() {
            return Ok(supports.as_slice());
        }
        let computed = self.compute_supports(state, action)?;
        let _ = action.supports.set(computed);
        Ok(action
            .supports
            .get()
            .expect("supports were just populated")
            .as_slice())
    }

    fn compute_supports(&self, origin_label: StateLabel, action: &Action) -> Result<Vec<ActionSupport>> {
        let origin = self
            .states
            .get(&origin_label)
            .ok_or_else(|| Error::ValueError {
                message: format!("compute_supports: unknown origin state {origin_label}"),
            })?;
        let target_polys: Result<Vec<Polytope>> = action
            .targets
            .iter()
            .map(|t| {
                self.states
                    .get(t)
                    .map(|s| s.polytope.clone())
                    .ok_or_else(|| Error::ValueError {
                        message: format!("compute_supports: unknown target state {t}"),
                    })
            })
            .collect();
        let targets_union = PolytopeUnion::from_pieces(target_polys?);
        let prer = self
            .lss
            .pre_r(&origin.polytope, &action.controls, &targets_union)?
            .simplify()?;

        let parts = partition::precise_partition(action.targets.iter().copied(), |&t| {
            let target_poly = &self
                .states
                .get(&t)
                .ok_or_else(|| Error::ValueError {
                    message: format!("compute_supports: unknown target state {t}"),
                })?
                .polytope;
            self.lss
                .pre(&origin.polytope, &action.controls, &PolytopeUnion::single(target_poly.clone()))
        })?;

        let mut supports = Vec::with_capacity(parts.len());
        for part in parts {
            let region = part.region.intersect(&prer)?.simplify()?;
            if region.is_empty() {
                continue;
            }
            let mut targets = part.items;
            targets.sort_unstable();
            supports.push(ActionSupport {
                targets,
                origin_region: region,
            });
        }
        Ok(supports)
    }

    /// Replace each `state` named in `partitions` (whose pieces number at
    /// least 2 and whose union equals `state.polytope`) with one fresh
    /// `State` per piece, inheriting kind and predicate labels. After every
    /// split, invalidates (drops) the cached actions of any surviving state
    /// whose memoized reachable witness intersects the set of refined
    /// states (`Outer` states have permanently empty actions, so there is
    /// nothing to invalidate for them). Returns the labels of freshly
    /// created states.
    pub fn refine(&mut self, partitions: HashMap<StateLabel, Vec<Polytope>>) -> Result<Vec<StateLabel>> {
        let mut refined_set: Vec<StateLabel> = Vec::new();
        let mut to_create: Vec<(Kind, Vec<PredicateLabel>, Polytope)> = Vec::new();

        for (label, pieces) in &partitions {
            if pieces.len() < 2 {
                continue;
            }
            let old = self.states.get(label).ok_or_else(|| Error::ValueError {
                message: format!("refine: unknown state label {label}"),
            })?;
            let union = PolytopeUnion::from_pieces(pieces.clone());
            if !union.is_same_as(&PolytopeUnion::single(old.polytope.clone()))? {
                return Err(Error::ValueError {
                    message: format!("refine: partition for state {label} does not cover it"),
                });
            }
            for piece in pieces {
                to_create.push((old.kind, old.predicate_labels.clone(), piece.clone()));
            }
            refined_set.push(*label);
        }

        for label in &refined_set {
            self.states.remove(label);
        }

        let mut new_labels = Vec::with_capacity(to_create.len());
        for (kind, predicate_labels, polytope) in to_create {
            new_labels.push(self.new_state(polytope, kind, predicate_labels));
        }

        for state in self.states.values_mut() {
            let stale = match state.reachable_witness.get() {
                Some(witness) => witness.iter().any(|l| refined_set.contains(l)),
                None => false,
            };
            if stale {
                state.actions.take();
                state.reachable_witness.take();
            }
        }

        Ok(new_labels)
    }

    /// Mark `yes` states `Satisfying` and `no` states `Nonsatisfying` (an
    /// `Outer` state in `no` stays `Outer`; it is an invariant violation for
    /// a decided state to be reassigned to the opposite class, or for an
    /// `Outer` state to be marked `Satisfying`).
    pub fn update_kinds(&mut self, yes: &[StateLabel], no: &[StateLabel]) -> Result<()> {
        for &label in yes {
            let state = self.states.get_mut(&label).ok_or_else(|| Error::ValueError {
                message: format!("update_kinds: unknown state {label}"),
            })?;
            match state.kind {
                Kind::Undecided => state.kind = Kind::Satisfying,
                Kind::Satisfying => {}
                Kind::Outer => {
                    return Err(Error::ValueError {
                        message: format!("update_kinds: state {label} is Outer, cannot mark satisfying"),
                    })
                }
                Kind::Nonsatisfying => {
                    return Err(Error::ValueError {
                        message: format!(
                            "update_kinds: state {label} is already Nonsatisfying, cannot mark satisfying"
                        ),
                    })
                }
            }
        }
        for &label in no {
            let state = self.states.get_mut(&label).ok_or_else(|| Error::ValueError {
                message: format!("update_kinds: unknown state {label}"),
            })?;
            match state.kind {
                Kind::Undecided => state.kind = Kind::Nonsatisfying,
                Kind::Nonsatisfying | Kind::Outer => {}
                Kind::Satisfying => {
                    return Err(Error::ValueError {
                        message: format!(
                            "update_kinds: state {label} is already Satisfying, cannot mark nonsatisfying"
                        ),
                    })
                }
            }
        }
        Ok(())
    }

    /// Draw a finite run of the concrete system, using the abstraction only
    /// to decide actions. From `start`, look up its containing cell; at
    /// each step, ask `policy` for an action index among that cell's
    /// (lazily constructed) actions, sample a control point from the
    /// action's control region and a disturbance point from `W` (both via
    /// bounded rejection sampling against the region's bounding box), apply
    /// the LSS step, and locate the successor's containing cell. Stops
    /// early if the current cell has no actions or the successor point
    /// falls outside every cell.
    pub fn sample_trace<R: Rng>(
        &self,
        start: Vector,
        mut policy: impl FnMut(StateLabel, &[Action]) -> usize,
        steps: usize,
        rng: &mut R,
    ) -> Result<Vec<StateLabel>> {
        let mut point = start;
        let mut current = self.locate(&point).ok_or_else(|| Error::ValueError {
            message: "sample_trace: start point is outside every cell".to_string(),
        })?;
        let mut trace = vec![current];

        for _ in 0..steps {
            let actions = self.actions(current)?;
            if actions.is_empty() {
                break;
            }
            let idx = policy(current, actions).min(actions.len() - 1);
            let action = &actions[idx];
            let u = sample_uniform(action.controls(), rng)?;
            let w = sample_uniform(&PolytopeUnion::single(self.lss.w().clone()), rng)?;
            let next = self.lss.a() * &point + self.lss.b() * &u + w;
            let Some(next_state) = self.locate(&next) else {
                break;
            };
            point = next;
            current = next_state;
            trace.push(current);
        }
        Ok(trace)
    }

    fn locate(&self, p: &Vector) -> Option<StateLabel> {
        let mut labels: Vec<StateLabel> = self.states.keys().copied().collect();
        labels.sort_unstable();
        labels
            .into_iter()
            .find(|l| self.states[l].polytope.contains(p))
    }
}

/// Rejection-sample a point uniformly from `region`'s bounding box,
/// accepting the first draw that lands inside any of its pieces.
/// Grounded in `geom2::rand::draw_polygon_radial`'s bounded-rejection
/// style, generalized from polygon generation to membership sampling.
fn sample_uniform<R: Rng>(region: &PolytopeUnion, rng: &mut R) -> Result<Vector> {
    let (lo, hi) = region.bounding_box().ok_or_else(|| Error::ValueError {
        message: "sample_uniform: empty region".to_string(),
    })?;
    let dim = lo.len();
    for _ in 0..10_000 {
        let mut coords = Vec::with_capacity(dim);
        for d in 0..dim {
            coords.push(rng.gen_range(lo[d]..=hi[d]));
        }
        let p = linalg::vector(&coords);
        if region.pieces().iter().any(|piece| piece.contains(&p)) {
            return Ok(p);
        }
    }
    // Degenerate (near-zero-volume) region: fall back to an interior point.
    region
        .pieces()
        .first()
        .and_then(|p| p.centroid())
        .ok_or_else(|| Error::ValueError {
            message: "sample_uniform: rejection sampling exhausted".to_string(),
        })
}

impl GameGraph for AbstractedLss {
    fn state_labels(&self) -> Vec<StateLabel> {
        let mut labels: Vec<StateLabel> = self.states.keys().copied().collect();
        labels.sort_unstable();
        labels
    }

    fn predicate_labels_of(&self, state: StateLabel) -> Vec<PredicateLabel> {
        self.states
            .get(&state)
            .map(|s| s.predicate_labels.clone())
            .unwrap_or_default()
    }

    fn action_count(&self, state: StateLabel) -> Result<usize> {
        Ok(self.actions(state)?.len())
    }

    fn support_count(&self, state: StateLabel, action: usize) -> Result<usize> {
        Ok(self.supports(state, action)?.len())
    }

    fn target_labels(&self, state: StateLabel, action: usize, support: usize) -> Result<Vec<StateLabel>> {
        let supports = self.supports(state, action)?;
        let support = supports.get(support).ok_or_else(|| Error::ValueError {
            message: format!("target_labels: state {state} action {action} has no support {support}"),
        })?;
        Ok(support.targets.clone())
    }
}

pub(crate) fn eps() -> f64 {
    DEFAULT_TAU
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::{matrix, vector};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn square(lo_x: f64, hi_x: f64, lo_y: f64, hi_y: f64) -> Polytope {
        Polytope::hull(&[
            vector(&[lo_x, lo_y]),
            vector(&[hi_x, lo_y]),
            vector(&[hi_x, hi_y]),
            vector(&[lo_x, hi_y]),
        ])
        .unwrap()
    }

    /// Svoreňová et al. (2017)'s illustrative example: A = B = I2,
    /// X = [0,4]x[0,2], W = [-0.1,0.1]^2, U = [-1,1]^2, predicate x > 2.
    fn illustrative_example() -> AbstractedLss {
        let a = matrix(2, 2, &[1.0, 0.0, 0.0, 1.0]).unwrap();
        let b = matrix(2, 2, &[1.0, 0.0, 0.0, 1.0]).unwrap();
        let x = square(0.0, 4.0, 0.0, 2.0);
        let w = square(-0.1, 0.1, -0.1, 0.1);
        let u = PolytopeUnion::single(square(-1.0, 1.0, -1.0, 1.0));
        let lss = Lss::new(a, b, x, w, u).unwrap();
        let predicate = Halfspace::normalize(vector(&[-1.0, 0.0]), -2.0); // x > 2  <=>  -x < -2
        AbstractedLss::new(lss, vec![("x_gt_2".to_string(), predicate)]).unwrap()
    }

    #[test]
    fn illustrative_example_has_six_states_two_undecided() {
        let abs = illustrative_example();
        let states: Vec<&State> = abs.states().collect();
        assert_eq!(states.len(), 6);
        let outer = states.iter().filter(|s| s.kind == Kind::Outer).count();
        let undecided = states.iter().filter(|s| s.kind == Kind::Undecided).count();
        let satisfying = states.iter().filter(|s| s.kind == Kind::Satisfying).count();
        assert_eq!(outer, 4);
        assert_eq!(undecided, 2);
        assert_eq!(satisfying, 0);
    }

    #[test]
    fn illustrative_example_outer_states_have_no_actions() {
        let abs = illustrative_example();
        for state in abs.states() {
            if state.kind() == Kind::Outer {
                assert!(abs.actions(state.label()).unwrap().is_empty());
            }
        }
    }

    #[test]
    fn illustrative_example_has_eighteen_actions_total() {
        let abs = illustrative_example();
        let labels: Vec<StateLabel> = abs.states().map(|s| s.label()).collect();
        let total: usize = labels.iter().map(|&l| abs.actions(l).unwrap().len()).sum();
        assert_eq!(total, 18);
    }

    #[test]
    fn illustrative_example_action_controls_are_pairwise_disjoint_and_cover_u() {
        let abs = illustrative_example();
        for state in abs.states() {
            if state.kind() == Kind::Outer {
                continue;
            }
            let actions = abs.actions(state.label()).unwrap();
            let mut union = PolytopeUnion::empty();
            for (i, a) in actions.iter().enumerate() {
                for b in &actions[i + 1..] {
                    assert!(!a.controls().do_intersect(b.controls()).unwrap());
                }
                union = PolytopeUnion::from_pieces([union.into_pieces(), a.controls().clone().into_pieces()].concat())
                    .disjunctify()
                    .unwrap();
            }
            assert!(union.is_same_as(abs.lss().u()).unwrap());
        }
    }

    /// Double integrator: A = [[1,1],[0,1]], B = [[0.5],[1]],
    /// X = [-5,5]x[-3,3], W = [-0.1,0.1]^2, U = [-1,1] (scalar control),
    /// predicates {-1<x, x<1, -1<y, y<1}.
    fn double_integrator_example() -> AbstractedLss {
        use crate::polytope::interval::Interval;
        let a = matrix(2, 2, &[1.0, 1.0, 0.0, 1.0]).unwrap();
        let b = matrix(2, 1, &[0.5, 1.0]).unwrap();
        let x = square(-5.0, 5.0, -3.0, 3.0);
        let w = square(-0.1, 0.1, -0.1, 0.1);
        let u = PolytopeUnion::single(Polytope::Interval(Interval::from_bounds(-1.0, 1.0)));
        let lss = Lss::new(a, b, x, w, u).unwrap();
        let predicates = vec![
            ("x_gt_neg1".to_string(), Halfspace::normalize(vector(&[-1.0, 0.0]), 1.0)),
            ("x_lt_1".to_string(), Halfspace::normalize(vector(&[1.0, 0.0]), 1.0)),
            ("y_gt_neg1".to_string(), Halfspace::normalize(vector(&[0.0, -1.0]), 1.0)),
            ("y_lt_1".to_string(), Halfspace::normalize(vector(&[0.0, 1.0]), 1.0)),
        ];
        AbstractedLss::new(lss, predicates).unwrap()
    }

    #[test]
    fn double_integrator_has_thirteen_states_nine_undecided() {
        let abs = double_integrator_example();
        let states: Vec<&State> = abs.states().collect();
        assert_eq!(states.len(), 13);
        let undecided = states.iter().filter(|s| s.kind == Kind::Undecided).count();
        assert_eq!(undecided, 9);
    }

    #[test]
    fn double_integrator_has_twenty_seven_actions_total() {
        let abs = double_integrator_example();
        let labels: Vec<StateLabel> = abs.states().map(|s| s.label()).collect();
        let total: usize = labels.iter().map(|&l| abs.actions(l).unwrap().len()).sum();
        assert_eq!(total, 27);
    }

    #[test]
    fn refine_idempotent_under_trivial_partition() {
        let mut abs = illustrative_example();
        let before: Vec<StateLabel> = {
            let mut v: Vec<StateLabel> = abs.states().map(|s| s.label()).collect();
            v.sort_unstable();
            v
        };
        let partitions: HashMap<StateLabel, Vec<Polytope>> = abs
            .states()
            .map(|s| (s.label(), vec![s.polytope().clone()]))
            .collect();
        let created = abs.refine(partitions).unwrap();
        assert!(created.is_empty());
        let after: Vec<StateLabel> = {
            let mut v: Vec<StateLabel> = abs.states().map(|s| s.label()).collect();
            v.sort_unstable();
            v
        };
        assert_eq!(before, after);
    }

    #[test]
    fn refine_splits_a_state_and_invalidates_dependent_caches() {
        let mut abs = illustrative_example();
        let labels: Vec<StateLabel> = {
            let mut v: Vec<StateLabel> = abs.states().map(|s| s.label()).collect();
            v.sort_unstable();
            v
        };

        // Force every state's actions to be computed & cached first.
        for &l in &labels {
            let _ = abs.actions(l).unwrap();
        }

        // Find an Undecided cell and split it in half along x.
        let target_label = abs
            .states()
            .find(|s| s.kind() == Kind::Undecided)
            .unwrap()
            .label();
        let poly = abs.state(target_label).unwrap().polytope().clone();
        let cut = Halfspace::normalize(vector(&[1.0, 0.0]), poly.centroid().unwrap()[0]);
        let halves = poly.split(&[cut]).unwrap();
        assert_eq!(halves.len(), 2);

        // A state whose reachable set includes target_label must have its
        // cached actions invalidated after the split.
        let dependents: Vec<StateLabel> = labels
            .iter()
            .copied()
            .filter(|&l| l != target_label)
            .filter(|&l| abs.actions(l).unwrap().iter().any(|a| a.targets().contains(&target_label)))
            .collect();
        assert!(!dependents.is_empty(), "expected at least one dependent state");

        let mut partitions = HashMap::new();
        partitions.insert(target_label, halves.into_pieces());
        let created = abs.refine(partitions).unwrap();
        assert_eq!(created.len(), 2);

        assert!(abs.state(target_label).is_none());
        for &dep in &dependents {
            // The old target no longer exists as a possible cached target.
            let acts = abs.actions(dep).unwrap();
            assert!(acts.iter().all(|a| !a.targets().contains(&target_label)));
        }
    }

    #[test]
    fn update_kinds_rejects_reassigning_decided_state() {
        let mut abs = illustrative_example();
        let label = abs.states().find(|s| s.kind() == Kind::Undecided).unwrap().label();
        abs.update_kinds(&[label], &[]).unwrap();
        assert!(abs.update_kinds(&[], &[label]).is_err());
    }

    #[test]
    fn update_kinds_keeps_outer_on_no_list() {
        let mut abs = illustrative_example();
        let label = abs.states().find(|s| s.kind() == Kind::Outer).unwrap().label();
        abs.update_kinds(&[], &[label]).unwrap();
        assert_eq!(abs.state(label).unwrap().kind(), Kind::Outer);
    }

    #[test]
    fn sample_trace_stays_within_state_space_bounds() {
        let abs = illustrative_example();
        let mut rng = StdRng::seed_from_u64(7);
        let trace = abs
            .sample_trace(vector(&[1.0, 1.0]), |_, _| 0, 5, &mut rng)
            .unwrap();
        assert!(!trace.is_empty());
        for &label in &trace {
            assert!(abs.state(label).is_some());
        }
    }
}
