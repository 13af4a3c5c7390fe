//! One-sample Student t-test.
//!
//! Tests whether a sample (e.g. homophily ratios of a null ensemble) could
//! have mean `μ0` (the observed value):
//!
//! ```text
//! t = (x̄ - μ0) / (s / √n),   df = n - 1
//! p = I_{df / (df + t²)}(df/2, 1/2)          (two-sided)
//! ```
//!
//! where `s` is the sample standard deviation and `I_x(a, b)` the regularized
//! incomplete beta function, evaluated with the Lentz continued fraction.

use serde::Serialize;

/// Outcome of [`one_sample_t_test`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TTest {
    /// t statistic; infinite when the sample has zero variance.
    pub statistic: f64,
    /// Degrees of freedom.
    pub df: usize,
    /// Two-sided p-value.
    pub p_value: f64,
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Sample standard deviation (n - 1 denominator), `None` below two samples.
pub fn sample_std(samples: &[f64]) -> Option<f64> {
    if samples.len() < 2 {
        return None;
    }
    let m = mean(samples)?;
    let ss: f64 = samples.iter().map(|x| (x - m).powi(2)).sum();
    Some((ss / (samples.len() - 1) as f64).sqrt())
}

fn same_value(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-12 * a.abs().max(b.abs()).max(1.0)
}

/// Two-sided one-sample t-test of `samples` against population mean `popmean`.
///
/// `None` when the test is undefined: fewer than two samples, or a constant
/// sample whose value equals `popmean`. A constant sample with a different
/// value is infinitely significant (`p = 0`).
///
/// Constancy is checked on the samples themselves, not on the computed
/// standard deviation, which rounding leaves slightly above zero for values
/// such as 1/3.
pub fn one_sample_t_test(samples: &[f64], popmean: f64) -> Option<TTest> {
    let n = samples.len();
    if n < 2 {
        return None;
    }
    let df = n - 1;
    let first = samples[0];

    if samples.iter().all(|&x| x == first) {
        if same_value(first, popmean) {
            return None;
        }
        return Some(TTest {
            statistic: (first - popmean).signum() * f64::INFINITY,
            df,
            p_value: 0.0,
        });
    }

    let m = mean(samples)?;
    let s = sample_std(samples)?;
    let t = (m - popmean) / (s / (n as f64).sqrt());
    Some(TTest {
        statistic: t,
        df,
        p_value: student_t_two_sided(t, df as f64),
    })
}

/// Two-sided tail probability `P(|T| >= |t|)` of Student's t with `df` degrees of freedom.
pub fn student_t_two_sided(t: f64, df: f64) -> f64 {
    if !t.is_finite() {
        return 0.0;
    }
    let x = df / (df + t * t);
    regularized_beta(x, df / 2.0, 0.5).clamp(0.0, 1.0)
}

/// Natural log of the gamma function (Lanczos, g = 7).
fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];
    if x < 0.5 {
        // Reflection.
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut acc = COEFFS[0];
    for (i, &c) in COEFFS.iter().enumerate().skip(1) {
        acc += c / (x + i as f64);
    }
    let t = x + 7.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + acc.ln()
}

/// Regularized incomplete beta `I_x(a, b)`.
fn regularized_beta(x: f64, a: f64, b: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();
    // The continued fraction converges fast for x < (a + 1) / (a + b + 2).
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(x, a, b) / a
    } else {
        1.0 - front * beta_continued_fraction(1.0 - x, b, a) / b
    }
}

fn beta_continued_fraction(x: f64, a: f64, b: f64) -> f64 {
    const MAX_ITER: usize = 300;
    const EPS: f64 = 1e-15;
    const TINY: f64 = 1e-300;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ln_gamma_known_values() {
        assert!(ln_gamma(1.0).abs() < 1e-12);
        assert!((ln_gamma(5.0) - 24.0f64.ln()).abs() < 1e-12);
        assert!((ln_gamma(0.5) - std::f64::consts::PI.sqrt().ln()).abs() < 1e-12);
    }

    #[test]
    fn test_t_test_reference_value() {
        // mean 3, s = sqrt(2.5), t = sqrt(2), df = 4
        let res = one_sample_t_test(&[1.0, 2.0, 3.0, 4.0, 5.0], 2.0).unwrap();
        assert!((res.statistic - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(res.df, 4);
        assert!((res.p_value - 0.230_199_6).abs() < 1e-6);
    }

    #[test]
    fn test_t_test_is_symmetric_in_sign() {
        let up = one_sample_t_test(&[1.0, 2.0, 3.0, 4.0, 5.0], 2.0).unwrap();
        let down = one_sample_t_test(&[1.0, 2.0, 3.0, 4.0, 5.0], 4.0).unwrap();
        assert!((up.statistic + down.statistic).abs() < 1e-12);
        assert!((up.p_value - down.p_value).abs() < 1e-12);
    }

    #[test]
    fn test_cauchy_case() {
        // df = 1: p = 1 - 2 atan(|t|) / π; t = 1 gives 0.5
        assert!((student_t_two_sided(1.0, 1.0) - 0.5).abs() < 1e-10);
        assert!((student_t_two_sided(0.0, 7.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_far_observation_is_significant() {
        let samples: Vec<f64> = (0..100).map(|i| 0.3 + (i % 5) as f64 * 0.01).collect();
        let res = one_sample_t_test(&samples, 0.9).unwrap();
        assert!(res.p_value < 1e-10);
        assert!(res.statistic < 0.0);
    }

    #[test]
    fn test_degenerate_samples() {
        assert!(one_sample_t_test(&[], 0.5).is_none());
        assert!(one_sample_t_test(&[0.4], 0.5).is_none());
        assert!(one_sample_t_test(&[0.5, 0.5, 0.5], 0.5).is_none());
        let res = one_sample_t_test(&[0.4, 0.4], 0.5).unwrap();
        assert_eq!(res.p_value, 0.0);
        assert!(res.statistic.is_infinite() && res.statistic < 0.0);
    }

    #[test]
    fn test_constant_inexact_sample_is_undefined() {
        // 1/3 and 0.1 are not representable; their mean and std pick up rounding.
        assert!(one_sample_t_test(&vec![1.0 / 3.0; 100], 1.0 / 3.0).is_none());
        assert!(one_sample_t_test(&vec![0.1; 7], 0.1).is_none());
        assert!(one_sample_t_test(&vec![2.0 / 6.0; 50], 1.0 / 3.0).is_none());

        let res = one_sample_t_test(&vec![0.1; 7], 0.3).unwrap();
        assert_eq!(res.p_value, 0.0);
        assert!(res.statistic.is_infinite() && res.statistic < 0.0);
    }
}
