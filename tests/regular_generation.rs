use sparse_grid_hash::debug_invariants::DebugInvariants;
use sparse_grid_hash::generation::HashGenerator;
use sparse_grid_hash::grid_error::GridError;
use sparse_grid_hash::storage::{GridStorage, Level, MAX_LEVEL};

fn binomial(n: u64, k: u64) -> u64 {
    (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
}

/// Σ_{k=0}^{n-1} 2^k C(d-1+k, d-1)
fn regular_size(d: usize, n: Level) -> usize {
    let d = d as u64;
    (0..u64::from(n))
        .map(|k| (1u64 << k) * binomial(d - 1 + k, d - 1))
        .sum::<u64>() as usize
}

fn generate(d: usize, f: impl FnOnce(&mut GridStorage) -> Result<usize, GridError>) -> GridStorage {
    let mut s = GridStorage::new(d);
    let inserted = f(&mut s).unwrap();
    assert_eq!(inserted, s.len());
    s
}

#[test]
fn regular_sizes_match_closed_form() {
    for d in 1..=4 {
        for n in 1..=5 {
            let s = generate(d, |s| HashGenerator.regular(s, n));
            assert_eq!(s.len(), regular_size(d, n), "d = {d}, n = {n}");
            s.validate_invariants().unwrap();
        }
    }
}

#[test]
fn regular_points_respect_level_sum() {
    let (d, n) = (3, 4);
    let s = generate(d, |s| HashGenerator.regular(s, n));
    for p in &s {
        assert!(p.level_sum() <= u64::from(n) + d as u64 - 1);
        assert!(p.level_min() >= 1);
    }
    assert!(!s.has_boundary_points());
    assert_eq!(s.max_level(), n);
}

#[test]
fn regular_is_deterministic() {
    let a = generate(3, |s| HashGenerator.regular(s, 4));
    let b = generate(3, |s| HashGenerator.regular(s, 4));
    assert_eq!(a.points(), b.points());
}

#[test]
fn full_grid_sizes() {
    let s = generate(2, |s| HashGenerator.full(s, 3));
    assert_eq!(s.len(), 49);
    let s = generate(2, |s| HashGenerator.full_with_boundary(s, 2));
    assert_eq!(s.len(), 25);
    let s = generate(2, |s| HashGenerator.anisotropic_full(s, &[3, 1]));
    assert_eq!(s.len(), 7);
    s.validate_invariants().unwrap();
}

#[test]
fn boundary_grid_contains_every_corner() {
    let s = generate(3, |s| HashGenerator.regular_with_boundaries(s, 2, 1));
    let corners = s
        .points()
        .iter()
        .filter(|p| p.levels().all(|l| l == 0))
        .count();
    assert_eq!(corners, 8);
    assert!(s.has_boundary_points());
    assert!(s.num_inner_points() < s.len());
    s.validate_invariants().unwrap();
}

#[test]
fn boundary_level_thins_the_boundary() {
    let sizes: Vec<usize> = [0, 1, 2]
        .into_iter()
        .map(|b| generate(3, |s| HashGenerator.regular_with_boundaries(s, 2, b)).len())
        .collect();
    assert!(sizes[2] < sizes[1]);
    assert!(sizes[1] < sizes[0]);
}

#[test]
fn granularity_orders_grid_sizes() {
    let sparse = generate(2, |s| HashGenerator.regular_with_granularity(s, 4, 0.5)).len();
    let regular = generate(2, |s| HashGenerator.regular_with_granularity(s, 4, 0.0)).len();
    let dense = generate(2, |s| HashGenerator.regular_with_granularity(s, 4, -2.0)).len();
    let full = generate(2, |s| HashGenerator.full(s, 4)).len();
    assert_eq!(regular, regular_size(2, 4));
    assert!(sparse < regular);
    assert!(regular < dense);
    assert!(dense < full);
}

#[test]
fn generation_requires_an_empty_storage() {
    let mut s = GridStorage::new(2);
    HashGenerator.regular(&mut s, 2).unwrap();
    let err = HashGenerator.full(&mut s, 2).unwrap_err();
    assert_eq!(err, GridError::StorageNotEmpty { size: 5 });
    assert_eq!(s.len(), 5);
}

#[test]
fn invalid_levels_are_rejected() {
    let mut s = GridStorage::new(2);
    assert!(matches!(
        HashGenerator.regular(&mut s, 0),
        Err(GridError::InvalidLevel { level: 0, .. })
    ));
    assert!(matches!(
        HashGenerator.regular(&mut s, MAX_LEVEL + 1),
        Err(GridError::InvalidLevel { .. })
    ));
    assert!(matches!(
        HashGenerator.regular_with_granularity(&mut s, 3, 1.5),
        Err(GridError::InvalidGranularity(_))
    ));
    assert!(matches!(
        HashGenerator.anisotropic_full(&mut s, &[2]),
        Err(GridError::DimensionMismatch { expected: 2, found: 1 })
    ));
    assert!(s.is_empty());
}

#[test]
fn zero_dimensional_storage_stays_empty() {
    let s = generate(0, |s| HashGenerator.regular(s, 3));
    assert!(s.is_empty());
}

#[test]
fn granularity_carries_over_to_boundary_grids() {
    let g = HashGenerator;
    let standard = generate(3, |s| g.regular_with_boundaries(s, 3, 1));
    let same = generate(3, |s| g.regular_with_boundaries_and_granularity(s, 3, 1, 0.0));
    assert_eq!(standard.points(), same.points());
    let sparse = generate(3, |s| g.regular_with_boundaries_and_granularity(s, 3, 1, 0.5));
    let dense = generate(3, |s| g.regular_with_boundaries_and_granularity(s, 3, 1, -1.0));
    assert!(sparse.len() < standard.len());
    assert!(standard.len() < dense.len());
    sparse.validate_invariants().unwrap();
    dense.validate_invariants().unwrap();
    // the corners survive any granularity
    assert_eq!(sparse.points().iter().filter(|p| p.level_max() == 0).count(), 8);
}

#[test]
fn periodic_square_root_and_truncated_sizes() {
    let g = HashGenerator;
    assert_eq!(generate(1, |s| g.regular_with_periodic_boundaries(s, 4, 0.0)).len(), 16);
    assert_eq!(generate(2, |s| g.regular_with_periodic_boundaries(s, 2, 0.0)).len(), 12);
    assert_eq!(generate(2, |s| g.square_root(s, 3)).len(), 45);
    assert_eq!(generate(2, |s| g.truncated(s, 3, 1)).len(), 49);
    // a truncation of 1 in 1-d keeps the whole boundary hierarchy
    assert_eq!(generate(1, |s| g.truncated(s, 3, 1)).len(), 9);
    assert!(matches!(
        g.regular_with_periodic_boundaries(&mut GridStorage::new(2), 2, 2.0),
        Err(GridError::InvalidGranularity(_))
    ));
}
