//! Normal distribution helpers - sampling, CDF and interval probability
//!
//! These are the numeric primitives the measurement generator is built from.
//! All of them are pure functions; randomness comes from the caller's `Rng`.

use rand::Rng;

/// Draw a uniform value in (0, 1), re-drawing exact zeros so `ln` stays finite
fn open_unit<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    loop {
        let u: f64 = rng.random();
        if u != 0.0 {
            return u;
        }
    }
}

/// Sample from N(mean, std_dev²) using the Box-Muller transform
///
/// Each call consumes two uniform draws and returns a single value; the
/// second Box-Muller output is discarded. `std_dev = 0` returns `mean`.
pub fn sample_normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    let u = open_unit(rng);
    let v = open_unit(rng);
    let z = (-2.0_f64 * u.ln()).sqrt() * (2.0_f64 * std::f64::consts::PI * v).cos();
    mean + std_dev * z
}

/// Standard normal cumulative distribution function (CDF)
/// Φ(z) = probability that a standard normal random variable is ≤ z
///
/// Rational polynomial approximation in the Abramowitz & Stegun style.
/// Defined on the whole real line; saturates to 0/1 for large |z|.
pub fn normal_cdf(z: f64) -> f64 {
    if z.is_nan() {
        return 0.5;
    }

    const B0: f64 = 0.2315419;
    const B1: f64 = 0.3193815;
    const B2: f64 = -0.3565638;
    const B3: f64 = 1.781478;
    const B4: f64 = -1.821256;
    const B5: f64 = 1.330274;
    const INV_SQRT_2PI: f64 = 0.3989423;

    let t = 1.0 / (1.0 + B0 * z.abs());
    let d = INV_SQRT_2PI * (-z * z / 2.0).exp();
    let p = d * t * (B1 + t * (B2 + t * (B3 + t * (B4 + B5 * t))));

    if z > 0.0 {
        1.0 - p
    } else {
        p
    }
}

/// Probability that Y ~ N(mean, std²) lies in the closed interval [lower, upper]
///
/// A zero `std` is not an error: the z-scores become ±∞ and the result is
/// exactly 0 or 1 depending on whether `mean` is inside the interval.
pub fn prob_in_range(mean: f64, std: f64, lower: f64, upper: f64) -> f64 {
    let z_lower = (lower - mean) / std;
    let z_upper = (upper - mean) / std;
    (normal_cdf(z_upper) - normal_cdf(z_lower)).clamp(0.0, 1.0)
}
