//! Fitted SARIMAX model artifacts
//!
//! A [`FittedSarimax`] is the deserialized output of the offline training
//! step: lag-polynomial coefficients, the innovation variance, and the tail
//! of the fitted state needed to continue the recursions forward. The struct
//! is read-only after load; forecasting never mutates it.
//!
//! The model follows the regression-with-SARIMA-errors formulation: the
//! observed series is `y_t = x_t' * beta + u_t`, where `u_t` after
//! differencing follows an ARMA process built from the multiplied seasonal
//! and non-seasonal lag polynomials.

use crate::error::{ForecastError, Result};
use crate::models::{FittedForecastModel, ForecastResult};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::fs;
use std::path::Path;

/// Confidence level of the interval band attached to every forecast
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// A fitted SARIMAX model loaded from a serialized artifact.
///
/// `recent_*` vectors hold the newest values last. They must be long enough
/// to seed the recursions: `recent_diffed` covers the expanded AR order,
/// `recent_residuals` the expanded MA order, and `recent_levels` the
/// differencing window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedSarimax {
    /// Display name of the model
    pub name: String,
    /// Non-seasonal AR coefficients (phi)
    pub ar: Vec<f64>,
    /// Non-seasonal MA coefficients (theta)
    pub ma: Vec<f64>,
    /// Seasonal AR coefficients, at lags that are multiples of `seasonal_period`
    #[serde(default)]
    pub seasonal_ar: Vec<f64>,
    /// Seasonal MA coefficients
    #[serde(default)]
    pub seasonal_ma: Vec<f64>,
    /// Season length in steps; required when any seasonal term is present
    #[serde(default)]
    pub seasonal_period: usize,
    /// Non-seasonal differencing order (d)
    #[serde(default)]
    pub diff: usize,
    /// Seasonal differencing order (D)
    #[serde(default)]
    pub seasonal_diff: usize,
    /// Trend constant on the differenced series
    #[serde(default)]
    pub intercept: f64,
    /// Exogenous regression coefficients; empty for a purely univariate model
    #[serde(default)]
    pub exog_coef: Vec<f64>,
    /// Innovation variance
    pub sigma2: f64,
    /// Tail of the differenced, regression-adjusted series (newest last)
    pub recent_diffed: Vec<f64>,
    /// Tail of the fitted residuals (newest last)
    pub recent_residuals: Vec<f64>,
    /// Tail of the regression-adjusted levels, for un-differencing (newest last)
    pub recent_levels: Vec<f64>,
}

impl FittedSarimax {
    /// Load a fitted model from a JSON artifact.
    ///
    /// A missing or corrupt artifact is a startup-fatal condition and is
    /// reported as [`ForecastError::StartupResource`].
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            ForecastError::StartupResource(format!(
                "model artifact '{}' cannot be read: {}",
                path.display(),
                e
            ))
        })?;

        let model: Self = serde_json::from_str(&raw).map_err(|e| {
            ForecastError::StartupResource(format!(
                "model artifact '{}' is corrupt: {}",
                path.display(),
                e
            ))
        })?;

        model.validate().map_err(|e| {
            ForecastError::StartupResource(format!(
                "model artifact '{}' failed validation: {}",
                path.display(),
                e
            ))
        })?;
        Ok(model)
    }

    /// Write the fitted model to a JSON artifact
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), raw)?;
        Ok(())
    }

    /// Number of exogenous regressors the model was fitted with
    pub fn exog_count(&self) -> usize {
        self.exog_coef.len()
    }

    /// Check internal consistency of the fitted state.
    pub fn validate(&self) -> Result<()> {
        if !self.sigma2.is_finite() || self.sigma2 < 0.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "model '{}': sigma2 must be finite and non-negative, got {}",
                self.name, self.sigma2
            )));
        }

        let seasonal = !self.seasonal_ar.is_empty()
            || !self.seasonal_ma.is_empty()
            || self.seasonal_diff > 0;
        if seasonal && self.seasonal_period < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "model '{}': seasonal terms require a seasonal period of at least 2",
                self.name
            )));
        }

        if self.exog_coef.len() > 1 {
            return Err(ForecastError::InvalidParameter(format!(
                "model '{}': at most one exogenous regressor is supported, got {}",
                self.name,
                self.exog_coef.len()
            )));
        }

        let phi = self.expanded_ar();
        let theta = self.expanded_ma();
        let delta = self.differencing_poly();

        if self.recent_diffed.len() < phi.len() - 1 {
            return Err(ForecastError::InvalidParameter(format!(
                "model '{}': needs {} recent differenced values, artifact has {}",
                self.name,
                phi.len() - 1,
                self.recent_diffed.len()
            )));
        }
        if self.recent_residuals.len() < theta.len() - 1 {
            return Err(ForecastError::InvalidParameter(format!(
                "model '{}': needs {} recent residuals, artifact has {}",
                self.name,
                theta.len() - 1,
                self.recent_residuals.len()
            )));
        }
        if self.recent_levels.len() < delta.len() - 1 {
            return Err(ForecastError::InvalidParameter(format!(
                "model '{}': needs {} recent levels, artifact has {}",
                self.name,
                delta.len() - 1,
                self.recent_levels.len()
            )));
        }

        Ok(())
    }

    /// Expanded AR lag polynomial `phi(B) * Phi(B^s)`, leading 1 included
    fn expanded_ar(&self) -> Vec<f64> {
        poly_mul(
            &ar_poly(&self.ar, 1),
            &ar_poly(&self.seasonal_ar, self.seasonal_period.max(1)),
        )
    }

    /// Expanded MA lag polynomial `theta(B) * Theta(B^s)`, leading 1 included
    fn expanded_ma(&self) -> Vec<f64> {
        poly_mul(
            &ma_poly(&self.ma, 1),
            &ma_poly(&self.seasonal_ma, self.seasonal_period.max(1)),
        )
    }

    /// Differencing operator `(1 - B)^d * (1 - B^s)^D`
    fn differencing_poly(&self) -> Vec<f64> {
        diff_poly(
            self.diff,
            self.seasonal_diff,
            self.seasonal_period.max(1),
        )
    }

    fn check_exog_shape(&self, steps: usize, exog: Option<&[f64]>) -> Result<()> {
        match (self.exog_coef.is_empty(), exog) {
            (true, None) => Ok(()),
            (true, Some(_)) => Err(ForecastError::InvalidParameter(format!(
                "model '{}' was fitted without exogenous regressors but exogenous input was supplied",
                self.name
            ))),
            (false, None) => Err(ForecastError::InvalidParameter(format!(
                "model '{}' requires {} exogenous values, got none",
                self.name, steps
            ))),
            (false, Some(values)) if values.len() != steps => {
                Err(ForecastError::InvalidParameter(format!(
                    "model '{}' requires {} exogenous values, got {}",
                    self.name,
                    steps,
                    values.len()
                )))
            }
            (false, Some(_)) => Ok(()),
        }
    }
}

impl FittedForecastModel for FittedSarimax {
    /// Forecast `steps` daily periods ahead with a 95% interval band.
    ///
    /// Means come from the ARMA recursion on the differenced series (future
    /// innovations zero) integrated back through the differencing operator;
    /// variances from the psi-weight recursion of the full lag polynomial.
    fn forecast(&self, steps: usize, exog: Option<&[f64]>) -> Result<ForecastResult> {
        if steps == 0 {
            return Err(ForecastError::InvalidParameter(
                "steps must be greater than zero".to_string(),
            ));
        }
        self.validate()?;
        self.check_exog_shape(steps, exog)?;

        let phi = self.expanded_ar();
        let theta = self.expanded_ma();
        let delta = self.differencing_poly();

        let mut diffed = self.recent_diffed.clone();
        let mut residuals = self.recent_residuals.clone();
        let mut levels = self.recent_levels.clone();

        let mut means = Vec::with_capacity(steps);
        for step in 0..steps {
            // ARMA recursion on the differenced series; future innovations
            // are zero, so residuals only contribute from the observed tail.
            let mut w = self.intercept;
            for (lag, &coef) in phi.iter().enumerate().skip(1) {
                w -= coef * diffed[diffed.len() - lag];
            }
            for (lag, &coef) in theta.iter().enumerate().skip(1) {
                w += coef * residuals[residuals.len() - lag];
            }

            // Invert the differencing operator to return to levels.
            let mut level = w;
            for (lag, &coef) in delta.iter().enumerate().skip(1) {
                level -= coef * levels[levels.len() - lag];
            }

            diffed.push(w);
            residuals.push(0.0);
            levels.push(level);

            let regression = match (self.exog_coef.first(), exog) {
                (Some(beta), Some(values)) => beta * values[step],
                _ => 0.0,
            };
            means.push(level + regression);
        }

        // Interval band from the psi weights of the full (differenced)
        // lag polynomial.
        let phi_star = poly_mul(&phi, &delta);
        let psi = psi_weights(&phi_star, &theta, steps);
        let z = normal_quantile(0.5 + CONFIDENCE_LEVEL / 2.0)?;

        let mut cumulative = 0.0;
        let mut intervals = Vec::with_capacity(steps);
        for (step, &mean) in means.iter().enumerate() {
            cumulative += psi[step] * psi[step];
            let se = (self.sigma2 * cumulative).sqrt();
            intervals.push((mean - z * se, mean + z * se));
        }

        ForecastResult::new_with_intervals(means, steps, intervals)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Multiply two lag polynomials given as coefficient vectors indexed by lag
fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &ai) in a.iter().enumerate() {
        for (j, &bj) in b.iter().enumerate() {
            out[i + j] += ai * bj;
        }
    }
    out
}

/// AR polynomial `1 - c_1 B^stride - c_2 B^(2*stride) - ...`
fn ar_poly(coefs: &[f64], stride: usize) -> Vec<f64> {
    let mut poly = vec![0.0; coefs.len() * stride + 1];
    poly[0] = 1.0;
    for (j, &c) in coefs.iter().enumerate() {
        poly[(j + 1) * stride] = -c;
    }
    poly
}

/// MA polynomial `1 + c_1 B^stride + c_2 B^(2*stride) + ...`
fn ma_poly(coefs: &[f64], stride: usize) -> Vec<f64> {
    let mut poly = vec![0.0; coefs.len() * stride + 1];
    poly[0] = 1.0;
    for (j, &c) in coefs.iter().enumerate() {
        poly[(j + 1) * stride] = c;
    }
    poly
}

/// Differencing polynomial `(1 - B)^d * (1 - B^s)^D`
fn diff_poly(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = poly_mul(&poly, &[1.0, -1.0]);
    }
    if seasonal_d > 0 {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        for _ in 0..seasonal_d {
            poly = poly_mul(&poly, &seasonal);
        }
    }
    poly
}

/// Psi weights of the process `phi_star(B) y_t = theta(B) eps_t`.
///
/// `psi_0 = 1`; the h-step forecast variance is `sigma2 * sum(psi_j^2)` over
/// `j < h`.
fn psi_weights(phi_star: &[f64], theta: &[f64], count: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(count);
    psi.push(1.0);
    for j in 1..count {
        let mut value = theta.get(j).copied().unwrap_or(0.0);
        for i in 1..phi_star.len().min(j + 1) {
            value -= phi_star[i] * psi[j - i];
        }
        psi.push(value);
    }
    psi
}

fn normal_quantile(p: f64) -> Result<f64> {
    let standard = Normal::new(0.0, 1.0)
        .map_err(|e| ForecastError::Math(format!("standard normal: {}", e)))?;
    Ok(standard.inverse_cdf(p))
}
