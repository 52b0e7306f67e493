//! Stationarity testing and stabilizing transforms for the daily series.
//!
//! Implements the augmented Dickey-Fuller unit-root test (regression with a
//! constant, no trend): OLS on lagged differences, lag order chosen by AIC
//! over a common sample, finite-sample critical values from the MacKinnon
//! response surface. The reported p-value is a monotone interpolation
//! through known quantiles of the Dickey-Fuller distribution; it is
//! approximate, and the stationarity decision rests on the critical-value
//! comparison.

use tracing::{debug, info, warn};

// ── Public types ──────────────────────────────────────────────────────────────

/// Finite-sample critical values for the test statistic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalValues {
    pub one_pct: f64,
    pub five_pct: f64,
    pub ten_pct: f64,
}

/// Result of one augmented Dickey-Fuller test.
#[derive(Debug, Clone, PartialEq)]
pub struct AdfTest {
    /// The tau statistic of the unit-root coefficient.
    pub statistic: f64,
    /// Approximate p-value (interpolated, see module docs).
    pub p_value: f64,
    /// Lag order selected by AIC.
    pub lags: usize,
    /// Observations used in the final regression.
    pub n_obs: usize,
    /// Critical-value table at `n_obs`.
    pub critical_values: CriticalValues,
}

/// What [`stabilize`] had to do to the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilizeOutcome {
    /// The input was already stationary; returned unchanged.
    AlreadyStationary,
    /// First-order differencing was enough.
    DifferencedStationary,
    /// Log transform plus differencing was enough.
    LogDifferencedStationary,
    /// No transform produced a stationary series; the last attempt is
    /// returned anyway for inspection.
    StillNonStationary,
}

/// A (possibly) transformed series plus the outcome of the attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct StabilizedSeries {
    pub values: Vec<f64>,
    pub outcome: StabilizeOutcome,
}

/// Default p-value threshold for the stationarity decision.
pub const DEFAULT_P_THRESHOLD: f64 = 0.05;

// ── Public API ────────────────────────────────────────────────────────────────

/// Run the augmented Dickey-Fuller test on `series`.
///
/// Returns `None` when the series is too short or too degenerate (constant,
/// perfectly predictable) for the regression to be meaningful.
pub fn adf_test(series: &[f64]) -> Option<AdfTest> {
    let n = series.len();
    if n < 8 {
        return None;
    }

    // Schwert's rule for the largest candidate lag, capped so the regression
    // keeps more observations than parameters.
    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize;
    let max_lag = schwert.min(n.saturating_sub(4) / 2);

    // Select the lag by AIC over a common sample (all candidates start at
    // max_lag so their likelihoods are comparable).
    let mut best: Option<(f64, usize)> = None;
    for lag in 0..=max_lag {
        if let Some(fit) = ols_adf(series, lag, max_lag) {
            let aic = fit.aic();
            if best.map_or(true, |(b, _)| aic < b) {
                best = Some((aic, lag));
            }
        }
    }
    let (_, lags) = best?;

    // Refit with the chosen lag on the full available sample.
    let fit = ols_adf(series, lags, lags)?;
    let statistic = fit.t_stat?;
    let critical_values = critical_values(fit.n_obs);
    let p_value = approx_p_value(statistic, &critical_values);

    debug!(
        "ADF: statistic {:.4}, p-value {:.4}, {} lags, {} obs",
        statistic, p_value, lags, fit.n_obs
    );

    Some(AdfTest {
        statistic,
        p_value,
        lags,
        n_obs: fit.n_obs,
        critical_values,
    })
}

/// Decide stationarity of a series.
///
/// True when the ADF statistic falls below the 5% critical value and the
/// p-value is at or below `threshold`. The 1% and 10% rows of the table are
/// reported on [`AdfTest`] for context but take no part in the decision.
pub fn is_stationary(series: &[f64], threshold: f64) -> bool {
    match adf_test(series) {
        Some(test) => {
            test.statistic < test.critical_values.five_pct && test.p_value <= threshold
        }
        None => {
            warn!("Series too short or degenerate for the ADF test; treating as non-stationary");
            false
        }
    }
}

/// First-order difference: `out[i] = series[i + 1] - series[i]`.
pub fn difference(series: &[f64]) -> Vec<f64> {
    series.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Try to make `series` stationary.
///
/// Already-stationary input is returned unchanged. Otherwise first-order
/// differencing is applied, then (when every original value is positive) a
/// log transform followed by differencing. Stationarity is re-checked after
/// each step; the final series is returned regardless of success, with the
/// outcome reported.
pub fn stabilize(series: &[f64]) -> StabilizedSeries {
    if is_stationary(series, DEFAULT_P_THRESHOLD) {
        info!("The series is already stationary");
        return StabilizedSeries {
            values: series.to_vec(),
            outcome: StabilizeOutcome::AlreadyStationary,
        };
    }

    info!("The series is not stationary; applying first-order differencing");
    let diffed = difference(series);
    if is_stationary(&diffed, DEFAULT_P_THRESHOLD) {
        return StabilizedSeries {
            values: diffed,
            outcome: StabilizeOutcome::DifferencedStationary,
        };
    }

    if series.iter().all(|v| *v > 0.0) {
        info!("Differencing was not enough; applying a log transform first");
        let logged: Vec<f64> = series.iter().map(|v| v.ln()).collect();
        let log_diffed = difference(&logged);
        if is_stationary(&log_diffed, DEFAULT_P_THRESHOLD) {
            return StabilizedSeries {
                values: log_diffed,
                outcome: StabilizeOutcome::LogDifferencedStationary,
            };
        }
        warn!("Transformations were not enough; a detailed analysis is required");
        return StabilizedSeries {
            values: log_diffed,
            outcome: StabilizeOutcome::StillNonStationary,
        };
    }

    warn!("Transformations were not enough; a detailed analysis is required");
    StabilizedSeries {
        values: diffed,
        outcome: StabilizeOutcome::StillNonStationary,
    }
}

// ── Critical values and p-value approximation ─────────────────────────────────

/// MacKinnon response-surface critical values (constant, no trend) at a
/// given regression sample size.
fn critical_values(n_obs: usize) -> CriticalValues {
    let t = n_obs as f64;
    let surface = |b_inf: f64, b1: f64, b2: f64, b3: f64| {
        b_inf + b1 / t + b2 / (t * t) + b3 / (t * t * t)
    };
    CriticalValues {
        one_pct: surface(-3.43035, -6.5393, -16.786, -79.433),
        five_pct: surface(-2.86154, -2.8903, -4.234, -40.040),
        ten_pct: surface(-2.56677, -1.5384, -2.809, 0.0),
    }
}

/// Monotone piecewise-linear p-value through known Dickey-Fuller quantiles.
///
/// The three left anchors use the finite-sample critical values; the right
/// tail uses asymptotic quantiles of the tau distribution with a constant.
fn approx_p_value(statistic: f64, crit: &CriticalValues) -> f64 {
    let anchors = [
        (-8.0, 0.0001),
        (crit.one_pct, 0.01),
        (crit.five_pct, 0.05),
        (crit.ten_pct, 0.10),
        (-1.57, 0.50),
        (-0.44, 0.90),
        (-0.07, 0.95),
        (0.60, 0.99),
    ];

    if statistic <= anchors[0].0 {
        return anchors[0].1;
    }
    for pair in anchors.windows(2) {
        let (x0, p0) = pair[0];
        let (x1, p1) = pair[1];
        if statistic <= x1 {
            let frac = (statistic - x0) / (x1 - x0);
            return p0 + frac * (p1 - p0);
        }
    }
    0.99
}

// ── OLS machinery ─────────────────────────────────────────────────────────────

/// One fitted ADF regression.
struct AdfFit {
    /// Tau statistic of the level coefficient; `None` when the fit is
    /// degenerate (zero residual variance).
    t_stat: Option<f64>,
    ssr: f64,
    n_obs: usize,
    n_params: usize,
}

impl AdfFit {
    fn aic(&self) -> f64 {
        let m = self.n_obs as f64;
        m * (self.ssr / m).ln() + 2.0 * self.n_params as f64
    }
}

/// Fit `Δy[t] = c + ρ·y[t-1] + Σ φ_i·Δy[t-i]` with `lag` lagged differences,
/// using observations from `start` onward (`start >= lag`).
fn ols_adf(series: &[f64], lag: usize, start: usize) -> Option<AdfFit> {
    let dy: Vec<f64> = difference(series);
    if start < lag || dy.len() <= start {
        return None;
    }

    let n_obs = dy.len() - start;
    let n_params = lag + 2;
    if n_obs <= n_params {
        return None;
    }

    // Row i predicts dy[i] from [1, y[i], dy[i-1], ..., dy[i-lag]].
    let row = |i: usize| -> Vec<f64> {
        let mut x = Vec::with_capacity(n_params);
        x.push(1.0);
        x.push(series[i]);
        for j in 1..=lag {
            x.push(dy[i - j]);
        }
        x
    };

    // Normal equations: X'X β = X'y.
    let mut xtx = vec![vec![0.0f64; n_params]; n_params];
    let mut xty = vec![0.0f64; n_params];
    for i in start..dy.len() {
        let x = row(i);
        for a in 0..n_params {
            xty[a] += x[a] * dy[i];
            for b in 0..n_params {
                xtx[a][b] += x[a] * x[b];
            }
        }
    }

    let beta = solve(xtx.clone(), xty)?;

    // Diagonal element (X'X)^{-1}[1][1] via a unit right-hand side, for the
    // standard error of the level coefficient.
    let mut unit = vec![0.0f64; n_params];
    unit[1] = 1.0;
    let inv_col = solve(xtx, unit)?;

    let mut ssr = 0.0f64;
    for i in start..dy.len() {
        let x = row(i);
        let fitted: f64 = x.iter().zip(&beta).map(|(a, b)| a * b).sum();
        let resid = dy[i] - fitted;
        ssr += resid * resid;
    }

    let dof = (n_obs - n_params) as f64;
    let s2 = ssr / dof;
    let var = s2 * inv_col[1];
    let t_stat = if var > 0.0 && var.is_finite() {
        Some(beta[1] / var.sqrt())
    } else {
        None
    };

    Some(AdfFit {
        t_stat,
        ssr,
        n_obs,
        n_params,
    })
}

/// Solve `A·x = b` by Gaussian elimination with partial pivoting.
///
/// Returns `None` for a (numerically) singular system.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();

    for col in 0..n {
        // Pivot.
        let mut pivot = col;
        for r in (col + 1)..n {
            if a[r][col].abs() > a[pivot][col].abs() {
                pivot = r;
            }
        }
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        // Eliminate below.
        for r in (col + 1)..n {
            let factor = a[r][col] / a[col][col];
            for c in col..n {
                a[r][c] -= factor * a[col][c];
            }
            b[r] -= factor * b[col];
        }
    }

    // Back substitution.
    let mut x = vec![0.0f64; n];
    for col in (0..n).rev() {
        let mut sum = b[col];
        for c in (col + 1)..n {
            sum -= a[col][c] * x[c];
        }
        x[col] = sum / a[col][col];
    }
    Some(x)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic pseudo-noise in [-0.5, 0.5), glibc LCG constants.
    fn lcg_noise(n: usize) -> Vec<f64> {
        let mut state: u64 = 42;
        (0..n)
            .map(|_| {
                state = (state.wrapping_mul(1_103_515_245).wrapping_add(12_345)) % (1 << 31);
                state as f64 / (1u64 << 31) as f64 - 0.5
            })
            .collect()
    }

    /// A trending (drifting) series: decidedly non-stationary.
    fn drift_walk(n: usize) -> Vec<f64> {
        let noise = lcg_noise(n);
        let mut level = 10.0;
        noise
            .iter()
            .map(|e| {
                level += 0.5 + e;
                level
            })
            .collect()
    }

    // ── adf_test ──────────────────────────────────────────────────────────────

    #[test]
    fn test_white_noise_is_stationary() {
        let series = lcg_noise(150);
        let test = adf_test(&series).expect("test runs");
        assert!(test.statistic < test.critical_values.five_pct);
        assert!(is_stationary(&series, 0.05));
    }

    #[test]
    fn test_drifting_series_is_not_stationary() {
        let series = drift_walk(150);
        assert!(!is_stationary(&series, 0.05));
    }

    #[test]
    fn test_adf_too_short_series() {
        assert!(adf_test(&[1.0, 2.0, 3.0]).is_none());
        assert!(!is_stationary(&[1.0, 2.0, 3.0], 0.05));
    }

    #[test]
    fn test_adf_constant_series_is_degenerate() {
        let series = vec![5.0; 60];
        assert!(adf_test(&series).is_none());
    }

    #[test]
    fn test_critical_values_ordered() {
        let crit = critical_values(100);
        assert!(crit.one_pct < crit.five_pct);
        assert!(crit.five_pct < crit.ten_pct);
        assert!(crit.ten_pct < 0.0);
    }

    #[test]
    fn test_critical_values_approach_asymptotic_table() {
        let crit = critical_values(1_000_000);
        assert!((crit.one_pct - -3.43035).abs() < 1e-3);
        assert!((crit.five_pct - -2.86154).abs() < 1e-3);
        assert!((crit.ten_pct - -2.56677).abs() < 1e-3);
    }

    #[test]
    fn test_p_value_monotone_in_statistic() {
        let crit = critical_values(100);
        let p1 = approx_p_value(-4.0, &crit);
        let p2 = approx_p_value(-2.8, &crit);
        let p3 = approx_p_value(-1.0, &crit);
        assert!(p1 < p2);
        assert!(p2 < p3);
    }

    #[test]
    fn test_p_value_at_critical_values() {
        let crit = critical_values(100);
        assert!((approx_p_value(crit.five_pct, &crit) - 0.05).abs() < 1e-9);
        assert!((approx_p_value(crit.one_pct, &crit) - 0.01).abs() < 1e-9);
    }

    // ── difference ────────────────────────────────────────────────────────────

    #[test]
    fn test_difference() {
        assert_eq!(difference(&[1.0, 4.0, 9.0]), vec![3.0, 5.0]);
        assert!(difference(&[1.0]).is_empty());
        assert!(difference(&[]).is_empty());
    }

    // ── stabilize ─────────────────────────────────────────────────────────────

    #[test]
    fn test_stabilize_keeps_stationary_series() {
        let series = lcg_noise(150);
        let result = stabilize(&series);
        assert_eq!(result.outcome, StabilizeOutcome::AlreadyStationary);
        assert_eq!(result.values, series);
    }

    #[test]
    fn test_stabilize_differences_a_drifting_series() {
        let series = drift_walk(150);
        let result = stabilize(&series);
        assert_eq!(result.outcome, StabilizeOutcome::DifferencedStationary);
        assert_eq!(result.values.len(), series.len() - 1);
        // The differenced series is drift plus noise.
        let mean: f64 = result.values.iter().sum::<f64>() / result.values.len() as f64;
        assert!((mean - 0.5).abs() < 0.2);
    }

    #[test]
    fn test_stabilize_returns_series_even_when_unsuccessful() {
        // Too short for the test at any stage, so nothing can be shown
        // stationary; the differenced series must still come back.
        let series = vec![1.0, 2.0, 4.0, 8.0, 16.0];
        let result = stabilize(&series);
        assert_eq!(result.outcome, StabilizeOutcome::StillNonStationary);
        assert_eq!(result.values.len(), series.len() - 1);
    }
}
