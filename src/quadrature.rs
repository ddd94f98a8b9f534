//! Fixed-order Gauss–Legendre quadrature.
//!
//! The expectation over the offer distribution must be smooth and reproducible
//! in the eyes of the outer optimizer, so integration uses a fixed
//! deterministic rule rather than Monte Carlo draws. Eight points integrate
//! polynomials up to degree 15 exactly, far more accuracy than the
//! piecewise-linear value approximation it is paired with.

/// Nodes and weights of the 8-point Gauss–Legendre rule on `[-1, 1]`.
const GAUSS_LEGENDRE_8: [(f64, f64); 8] = [
    (-0.960_289_856_497_536_2, 0.101_228_536_290_376_26),
    (-0.796_666_477_413_626_7, 0.222_381_034_453_374_47),
    (-0.525_532_409_916_329_0, 0.313_706_645_877_887_3),
    (-0.183_434_642_495_649_8, 0.362_683_783_378_362_0),
    (0.183_434_642_495_649_8, 0.362_683_783_378_362_0),
    (0.525_532_409_916_329_0, 0.313_706_645_877_887_3),
    (0.796_666_477_413_626_7, 0.222_381_034_453_374_47),
    (0.960_289_856_497_536_2, 0.101_228_536_290_376_26),
];

/// Integrates `f` over `[a, b]` with the fixed 8-point Gauss–Legendre rule.
pub fn fixed_quad<F>(f: F, a: f64, b: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    let half_width = 0.5 * (b - a);
    let midpoint = 0.5 * (a + b);
    let sum: f64 = GAUSS_LEGENDRE_8
        .iter()
        .map(|&(node, weight)| weight * f(midpoint + half_width * node))
        .sum();
    half_width * sum
}
