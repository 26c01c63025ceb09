use hashbrown::HashSet;
use sparse_grid_hash::debug_invariants::DebugInvariants;
use sparse_grid_hash::generation::HashGenerator;
use sparse_grid_hash::grid_error::GridError;
use sparse_grid_hash::refinement::{
    CoarseningFunctor, HashCoarsening, HashRefinement, RefinementFunctor,
    SurplusCoarseningFunctor, SurplusRefinementFunctor,
};
use sparse_grid_hash::storage::{GridPoint, GridStorage, LevelIndex};

fn regular(d: usize, n: u32) -> GridStorage {
    let mut s = GridStorage::new(d);
    HashGenerator.regular(&mut s, n).unwrap();
    s
}

/// Scores a point by how close it sits to `x0` in the first coordinate.
struct Peak {
    x0: f64,
    budget: usize,
}

impl RefinementFunctor for Peak {
    fn value(&self, storage: &GridStorage, seq: usize) -> f64 {
        1.0 / (1.0 + 100.0 * (storage[seq].coordinate(0) - self.x0).abs())
    }
    fn refinements_num(&self) -> usize {
        self.budget
    }
    fn threshold(&self) -> f64 {
        0.0
    }
}

/// Marks every point missing from `keep` as removable.
struct Foreign {
    keep: HashSet<GridPoint>,
}

impl CoarseningFunctor for Foreign {
    fn value(&self, storage: &GridStorage, seq: usize) -> f64 {
        if self.keep.contains(&storage[seq]) { 1.0 } else { 0.0 }
    }
    fn removements_num(&self) -> usize {
        usize::MAX
    }
    fn threshold(&self) -> f64 {
        0.5
    }
}

#[test]
fn repeated_refinement_concentrates_points_near_the_peak() {
    let mut s = regular(1, 2);
    let refinement = HashRefinement::new();
    let functor = Peak { x0: 0.3, budget: 1 };
    for _ in 0..6 {
        let before = s.len();
        let summary = refinement.free_refine(&mut s, &functor).unwrap();
        assert_eq!(summary.inserted, s.len() - before);
        assert!(s.len() >= before);
        s.validate_invariants().unwrap();
    }
    let closest = s
        .points()
        .iter()
        .map(|p| (p.coordinate(0) - 0.3).abs())
        .fold(f64::INFINITY, f64::min);
    assert!(closest < 1.0 / 64.0);
    assert_eq!(s.max_level(), 8);
}

#[test]
fn refined_points_gain_children_they_lacked() {
    let mut s = regular(2, 3);
    let mut alpha = vec![0.0; s.len()];
    for (seq, p) in s.iter() {
        if p.is_leaf() {
            alpha[seq] = 1.0 + seq as f64;
        }
    }
    let before: Vec<GridPoint> = s.points().to_vec();
    let f = SurplusRefinementFunctor::new(&alpha, 3, 0.0);
    let summary = HashRefinement::new().free_refine(&mut s, &f).unwrap();
    assert_eq!(summary.refined_points.len(), 3);
    for &seq in &summary.refined_points {
        assert!(!s.is_leaf(seq).unwrap(), "{} is still a leaf", before[seq]);
    }
    // the three largest surpluses sit on the last three leaves
    let leaves: Vec<usize> = (0..before.len()).filter(|&q| before[q].is_leaf()).collect();
    assert_eq!(summary.refined_points, leaves[leaves.len() - 3..].to_vec());
}

#[test]
fn max_level_caps_refinement() {
    let mut s = regular(2, 3);
    let alpha = vec![1.0; s.len()];
    let refinement = HashRefinement::new();
    // only the (1,3) and (3,1) points miss a level-2 child
    assert_eq!(
        refinement
            .number_of_refinable_points_to_max_level(&s, 2)
            .unwrap(),
        8
    );
    assert_eq!(refinement.number_of_refinable_points(&s), 12);
    let f = SurplusRefinementFunctor::new(&alpha, usize::MAX, 0.0);
    // one pass adds the (2,3) and (3,2) subspaces, the next one (3,3)
    let mut passes = 0;
    while !refinement.refine_max_level(&mut s, &f, 3).unwrap().is_empty() {
        passes += 1;
    }
    assert_eq!(passes, 2);
    assert_eq!(s.max_level(), 3);
    assert_eq!(s.len(), 49);
    assert_eq!(
        refinement
            .number_of_refinable_points_to_max_level(&s, 3)
            .unwrap(),
        0
    );
    assert!(matches!(
        refinement.refine_max_level(&mut s, &f, 99),
        Err(GridError::InvalidLevel { level: 99, .. })
    ));
}

#[test]
fn subspace_refinement_creates_whole_subspaces() {
    let mut s = regular(2, 2);
    // (1,1)x(1,1), (1,1)x(2,1), (1,1)x(2,3), (2,1)x(1,1), (2,3)x(1,1)
    let alpha = vec![0.0, 0.0, 0.0, 1.0, 2.0];
    let f = SurplusRefinementFunctor::new(&alpha, 1, 0.0);
    let summary = HashRefinement::new().free_refine_subspace(&mut s, &f).unwrap();
    assert_eq!(summary.refined_points, vec![3, 4]);
    assert_eq!(summary.inserted, 4);
    let levels: Vec<Vec<u32>> = s.points()[5..].iter().map(|p| p.levels().collect()).collect();
    assert!(levels.iter().all(|l| l == &vec![3, 1]));
    s.validate_invariants().unwrap();
}

#[test]
fn coarsening_removes_only_leaves_and_restores_the_grid() {
    let baseline = regular(2, 3);
    let mut s = baseline.clone();
    let alpha = vec![1.0; s.len()];
    let f = SurplusRefinementFunctor::new(&alpha, 4, 0.0);
    HashRefinement::new().free_refine(&mut s, &f).unwrap();
    assert!(s.len() > baseline.len());

    let mut coefficients: Vec<f64> = (0..s.len()).map(|q| q as f64).collect();
    let functor = Foreign {
        keep: baseline.points().iter().cloned().collect(),
    };
    let mut coarsening = HashCoarsening::new();
    loop {
        let leaves: Vec<bool> = (0..s.len()).map(|q| s.is_leaf(q).unwrap()).collect();
        let summary = coarsening
            .free_coarsen(&mut s, &functor, &mut coefficients)
            .unwrap();
        if summary.is_empty() {
            break;
        }
        assert!(summary.removed.iter().all(|&q| leaves[q]));
        assert_eq!(coefficients.len(), s.len());
        s.validate_invariants().unwrap();
    }
    assert_eq!(s.points(), baseline.points());
    // surviving coefficients still carry their old sequence numbers
    let expected: Vec<f64> = (0..baseline.len()).map(|q| q as f64).collect();
    assert_eq!(coefficients, expected);
}

#[test]
fn coarsening_budget_and_threshold() {
    let mut s = regular(1, 3);
    let mut alpha = vec![5.0, 4.0, 3.0, 0.4, 0.3, 0.2, 0.1];
    let snapshot = alpha.clone();
    let f = SurplusCoarseningFunctor::new(&snapshot, 10, 0.25);
    let mut c = HashCoarsening::new();
    let summary = c.free_coarsen(&mut s, &f, &mut alpha).unwrap();
    assert_eq!(summary.removed, vec![5, 6]);
    assert_eq!(alpha, vec![5.0, 4.0, 3.0, 0.4, 0.3]);
    assert_eq!(c.number_of_removable_points(&s), 3);
}

#[test]
fn refine_point_fills_missing_ancestors() {
    let mut s = GridStorage::new(2);
    s.insert(GridPoint::try_from_pairs(&[(1, 1), (1, 1)]).unwrap()).unwrap();
    let inserted = HashRefinement::new().refine_point(&mut s, 0).unwrap();
    assert_eq!(inserted, 4);
    assert!(HashRefinement::new().refine_point(&mut s, 10).is_err());
    s.validate_invariants().unwrap();
}

#[test]
fn boundary_refinement_adds_level_zero_anchors() {
    let mut s = GridStorage::new(2);
    HashGenerator.regular_with_boundaries(&mut s, 1, 1).unwrap();
    let anchors_before = s.len() - s.num_inner_points();
    let alpha = vec![1.0; s.len()];
    let f = SurplusRefinementFunctor::new(&alpha, usize::MAX, 0.0);
    let refinement = HashRefinement::with_boundaries();
    assert!(refinement.has_boundaries());
    refinement.free_refine(&mut s, &f).unwrap();
    assert!(s.len() - s.num_inner_points() >= anchors_before);
    for p in &s {
        for d in 0..2 {
            if p.level(d) == 1 {
                for i in [0, 1] {
                    let anchor = p.with(d, LevelIndex::new_unchecked(0, i));
                    assert!(s.contains(&anchor), "{p} lacks anchor {anchor}");
                }
            }
        }
    }
}

/// Signed error indicator read from a table.
struct Signed(Vec<f64>);

impl RefinementFunctor for Signed {
    fn value(&self, _storage: &GridStorage, seq: usize) -> f64 {
        self.0[seq]
    }
    fn refinements_num(&self) -> usize {
        1
    }
    fn threshold(&self) -> f64 {
        0.5
    }
}

#[test]
fn signed_indicators_refine_the_largest_magnitude() {
    let mut s = regular(1, 2);
    let f = Signed(vec![0.0, 0.1, -5.0]);
    let summary = HashRefinement::new().free_refine(&mut s, &f).unwrap();
    assert_eq!(summary.refined_points, vec![2]);
    assert_eq!(summary.inserted, 2);

    // magnitudes below the threshold are skipped whatever their sign
    let mut s = regular(1, 2);
    let f = Signed(vec![0.0, -0.4, 0.3]);
    assert!(HashRefinement::new().free_refine(&mut s, &f).unwrap().is_empty());
}

#[test]
fn boundary_refinement_keeps_opposite_faces_in_step() {
    let mut s = GridStorage::new(2);
    HashGenerator.regular_with_boundaries(&mut s, 1, 1).unwrap();
    let left = GridPoint::try_from_pairs(&[(0, 0), (1, 1)]).unwrap();
    let seq = s.find(&left).unwrap();
    let inserted = HashRefinement::with_boundaries().refine_point(&mut s, seq).unwrap();
    assert_eq!(inserted, 4);
    for p in &s {
        for d in 0..2 {
            if p.get(d).is_boundary() {
                let mirror = p.with(d, LevelIndex::new_unchecked(0, 1 - p.index(d)));
                assert!(s.contains(&mirror), "{p} has no mirror {mirror}");
            }
        }
    }
    s.validate_invariants().unwrap();
}
