use crate::data::{Histogram, Sample};
use crate::density::{Density, DensityTrait};
use crate::fit::{FitOptions, FitResult, FitStatus, FittedParameter};
use crate::minimizer::{
    Covariance, CovarianceStatus, MinimizerTrait, MinimumOutput, covariance, minos,
};
use crate::parameter::{ParameterId, ParameterSet};

use std::cell::RefCell;
use std::collections::HashMap;

/// Data a density model can be compared to
pub trait ObjectiveTerm {
    /// Objective increase defining one standard deviation
    const ERROR_DEF: f64;

    fn term(model: &Density, data: &Self, params: &ParameterSet) -> f64;
}

/// Unbinned negative log-likelihood `-Σ w ln density` over positive densities
impl ObjectiveTerm for Sample {
    const ERROR_DEF: f64 = 0.5;

    fn term(model: &Density, data: &Self, params: &ParameterSet) -> f64 {
        -model.log_sum(data, params)
    }
}

/// Chi-square of the model projection scaled to the histogram total, bins without error are
/// skipped
impl ObjectiveTerm for Histogram {
    const ERROR_DEF: f64 = 1.0;

    fn term(model: &Density, data: &Self, params: &ParameterSet) -> f64 {
        let prediction = model.project(data.binning(), data.dim(), params);
        let predicted_total: f64 = prediction.iter().sum();
        let scale = if predicted_total > 0.0 {
            data.total() / predicted_total
        } else {
            1.0
        };
        prediction
            .iter()
            .zip(data.contents().iter())
            .zip(data.errors().iter())
            .filter(|(_, err)| **err > 0.0)
            .map(|((&pred, &obs), &err)| {
                let residual = (scale * pred - obs) / err;
                residual * residual
            })
            .sum()
    }
}

/// Objective function over any number of (model, data) pairs
///
/// Free parameters of all attached models are merged in first-seen order, a parameter shared
/// by several models is a single free parameter. Constant parameters are not free.
#[derive(Clone, Debug)]
pub struct Objective<'a, D: ObjectiveTerm> {
    pairs: Vec<(&'a Density, &'a D)>,
    free: Vec<ParameterId>,
    references: HashMap<ParameterId, usize>,
}

pub type NllObjective<'a> = Objective<'a, Sample>;
pub type Chi2Objective<'a> = Objective<'a, Histogram>;

impl<'a, D: ObjectiveTerm> Objective<'a, D> {
    pub fn new() -> Self {
        Self {
            pairs: vec![],
            free: vec![],
            references: HashMap::new(),
        }
    }

    /// Add a model compared to `data`, `params` decides which parameters are constant
    pub fn attach(&mut self, model: &'a Density, data: &'a D, params: &ParameterSet) {
        self.pairs.push((model, data));
        for &id in model.parameters() {
            if params[id].is_constant() {
                continue;
            }
            let count = self.references.entry(id).or_insert(0);
            if *count == 0 {
                self.free.push(id);
            }
            *count += 1;
        }
    }

    pub fn free_parameters(&self) -> &[ParameterId] {
        &self.free
    }

    /// Number of parameter references among attached models
    pub fn references(&self, id: ParameterId) -> usize {
        self.references.get(&id).copied().unwrap_or(0)
    }

    pub fn error_def(&self) -> f64 {
        D::ERROR_DEF
    }

    /// Objective at current parameter values
    pub fn value(&self, params: &ParameterSet) -> f64 {
        self.pairs
            .iter()
            .map(|&(model, data)| D::term(model, data, params))
            .sum()
    }

    /// Write `x` into the free parameters and evaluate the objective
    pub fn evaluate(&self, x: &[f64], params: &mut ParameterSet) -> f64 {
        debug_assert_eq!(x.len(), self.free.len());
        for (&id, &value) in self.free.iter().zip(x.iter()) {
            params.set_value(id, value);
        }
        self.value(params)
    }

    /// Minimize over the free parameters starting from their current values
    ///
    /// Parameter errors are the initial step sizes of the minimizer, a zero or non-finite error
    /// falls back to the minimizer's own default.
    /// The best values found are always written back, together with the symmetric errors when
    /// the Hessian is requested and the asymmetric errors when the profile scan is requested.
    pub fn minimize(&self, params: &mut ParameterSet, options: &FitOptions) -> FitResult {
        let up = D::ERROR_DEF;
        let x0 = params.values(&self.free);
        let steps: Vec<_> = self.free.iter().map(|&id| params[id].error()).collect();
        let bounds: Vec<_> = self.free.iter().map(|&id| params[id].bounds()).collect();

        let params = RefCell::new(params);
        let f = |x: &[f64]| {
            let mut params = params.borrow_mut();
            self.evaluate(x, &mut params)
        };

        let output = if self.free.is_empty() {
            MinimumOutput {
                x: vec![],
                fval: f(&[]),
                nfev: 1,
                converged: true,
                message: "no free parameters".to_owned(),
            }
        } else {
            options.minimizer.minimize(&f, &x0, &steps, &bounds)
        };

        let covariance = if options.hesse {
            covariance(&f, &output.x, up)
        } else {
            Covariance::not_available(self.free.len())
        };
        let errors = covariance.errors();
        let intervals = options
            .minos
            .then(|| minos(&f, &options.minimizer, &output.x, output.fval, &bounds, &errors, up));

        let params = params.into_inner();
        self.evaluate(&output.x, params);
        let mut fitted = Vec::with_capacity(self.free.len());
        for (i, &id) in self.free.iter().enumerate() {
            let parameter = &mut params[id];
            if errors[i].is_finite() {
                parameter.set_error(errors[i]);
            }
            if let Some(intervals) = &intervals {
                parameter.set_asymmetric_errors(intervals[i].lower, intervals[i].upper);
            }
            fitted.push(FittedParameter {
                id,
                name: parameter.name().to_owned(),
                value: parameter.value(),
                error: parameter.error(),
                error_down: parameter.error_down(),
                error_up: parameter.error_up(),
            });
        }

        let status = if output.converged {
            log::info!(
                "fit converged: objective {} after {} evaluations",
                output.fval,
                output.nfev
            );
            FitStatus::Converged
        } else {
            log::warn!(
                "fit did not converge after {} evaluations, keeping the best values found: {}",
                output.nfev,
                output.message
            );
            FitStatus::NotConverged
        };

        FitResult {
            status,
            fval: output.fval,
            nfev: output.nfev,
            message: output.message,
            error_def: up,
            parameters: fitted,
            covariance: match covariance.status {
                CovarianceStatus::NotAvailable => None,
                _ => Some(
                    covariance
                        .matrix
                        .row_iter()
                        .map(|row| row.iter().copied().collect())
                        .collect(),
                ),
            },
            covariance_status: covariance.status,
            minos_valid: intervals.map(|intervals| intervals.iter().all(|i| i.valid)),
        }
    }
}

impl<D: ObjectiveTerm> Default for Objective<'_, D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Binning;
    use crate::density::{CompositeDensity, KernelDensity, ProjectionDensity};
    use crate::minimizer::Minimizer;
    use crate::parameter::Parameter;
    use crate::tests::*;

    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn gaussian_kernel(params: &mut ParameterSet, prefix: &str, normset: Rc<Sample>) -> Density {
        let mean = params
            .add(Parameter::new(format!("{prefix}mean"), 0.0, -10.0, 10.0))
            .unwrap();
        let sigma = params
            .add(Parameter::new(format!("{prefix}sigma"), 3.0, 0.1, 20.0))
            .unwrap();
        KernelDensity::new(Shape::gaussian(), vec![mean, sigma], 0, 1)
            .unwrap()
            .with_normalization_sample(normset)
            .into()
    }

    #[test]
    fn shared_parameters_counted_once() {
        let mut params = ParameterSet::new();
        let normset = uniform_sample_1d(100, -10.0, 10.0);
        let first = gaussian_kernel(&mut params, "", normset.clone());
        let sigma2 = params.add(Parameter::new("sigma2", 1.0, 0.1, 20.0)).unwrap();
        let mean = params.find("mean").unwrap();
        let second: Density = KernelDensity::new(Shape::gaussian(), vec![mean, sigma2], 0, 1)
            .unwrap()
            .with_normalization_sample(normset)
            .into();
        let data = gaussian_sample(0, 10, 0.0, 1.0);

        let mut objective = NllObjective::new();
        objective.attach(&first, &data, &params);
        objective.attach(&second, &data, &params);
        let names: Vec<_> = objective
            .free_parameters()
            .iter()
            .map(|&id| params[id].name())
            .collect();
        assert_eq!(names, ["mean", "sigma", "sigma2"]);
        assert_eq!(objective.references(mean), 2);
        assert_eq!(objective.references(sigma2), 1);
    }

    #[test]
    fn constant_parameters_are_not_free() {
        let mut params = ParameterSet::new();
        let model = gaussian_kernel(&mut params, "", uniform_sample_1d(100, -10.0, 10.0));
        let sigma = params.find("sigma").unwrap();
        params[sigma].set_constant(true);
        let data = gaussian_sample(0, 10, 0.0, 1.0);
        let mut objective = NllObjective::new();
        objective.attach(&model, &data, &params);
        assert_eq!(objective.free_parameters(), &[params.find("mean").unwrap()]);
        assert_eq!(objective.error_def(), 0.5);
    }

    #[test]
    fn evaluate_writes_parameters() {
        let mut params = ParameterSet::new();
        let model = gaussian_kernel(&mut params, "", uniform_sample_1d(100, -10.0, 10.0));
        let data = gaussian_sample(0, 100, 0.0, 1.0);
        let mut objective = NllObjective::new();
        objective.attach(&model, &data, &params);
        let value = objective.evaluate(&[0.5, 2.0], &mut params);
        assert_eq!(params.value(params.find("mean").unwrap()), 0.5);
        assert_eq!(params.value(params.find("sigma").unwrap()), 2.0);
        assert_eq!(value, -model.log_sum(&data, &params));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn evaluate_rejects_short_point() {
        let mut params = ParameterSet::new();
        let model = gaussian_kernel(&mut params, "", uniform_sample_1d(100, -10.0, 10.0));
        let data = gaussian_sample(0, 10, 0.0, 1.0);
        let mut objective = NllObjective::new();
        objective.attach(&model, &data, &params);
        objective.evaluate(&[0.5], &mut params);
    }

    #[test]
    fn chi2_skips_bins_without_error() {
        let mut params = ParameterSet::new();
        let c1 = params.add(Parameter::unbounded("c1", 0.0)).unwrap();
        let binning = Binning::uniform(2, 0.0, 2.0).unwrap();
        let model: Density = ProjectionDensity::new(
            Shape::polynomial(1),
            vec![c1],
            uniform_sample_1d(10, 0.0, 2.0),
            0,
            binning.clone(),
        )
        .unwrap()
        .into();
        // flat prediction scaled to total 12: [6, 6]
        let hist = Histogram::new(0, binning, vec![4.0, 8.0], vec![2.0, 0.0]).unwrap();
        let mut objective = Chi2Objective::new();
        objective.attach(&model, &hist, &params);
        assert_relative_eq!(objective.value(&params), 1.0);
        assert_eq!(objective.error_def(), 1.0);
    }

    fn gaussian_projection(
        mean: ParameterId,
        sigma: ParameterId,
        binning: &Binning,
    ) -> Density {
        ProjectionDensity::new(
            Shape::gaussian(),
            vec![mean, sigma],
            uniform_sample_1d(1000, -10.0, 10.0),
            0,
            binning.clone(),
        )
        .unwrap()
        .into()
    }

    #[test]
    fn chi2_sums_pairs_and_counts_shared_parameter_once() {
        let mut params = ParameterSet::new();
        let mean = params.add(Parameter::new("mean", 0.5, -10.0, 10.0)).unwrap();
        let sigma1 = params.add(Parameter::new("sigma1", 2.0, 0.1, 20.0)).unwrap();
        let sigma2 = params.add(Parameter::new("sigma2", 3.0, 0.1, 20.0)).unwrap();
        let binning = Binning::uniform(10, -10.0, 10.0).unwrap();
        let first = gaussian_projection(mean, sigma1, &binning);
        let second = gaussian_projection(mean, sigma2, &binning);
        let hist1 =
            Histogram::from_sample(&gaussian_sample(4, 1000, 1.0, 2.0), 0, binning.clone())
                .unwrap();
        let hist2 =
            Histogram::from_sample(&gaussian_sample(5, 2000, 0.0, 3.0), 0, binning).unwrap();

        let mut objective = Chi2Objective::new();
        objective.attach(&first, &hist1, &params);
        objective.attach(&second, &hist2, &params);
        assert_eq!(objective.free_parameters(), &[mean, sigma1, sigma2]);
        assert_eq!(objective.references(mean), 2);

        let mut single1 = Chi2Objective::new();
        single1.attach(&first, &hist1, &params);
        let mut single2 = Chi2Objective::new();
        single2.attach(&second, &hist2, &params);
        let separate = single1.value(&params) + single2.value(&params);
        assert!(separate > 0.0);
        assert_relative_eq!(objective.value(&params), separate, max_relative = 1e-12);
    }

    #[test]
    fn parameter_error_is_initial_step() {
        let data = gaussian_sample(6, 500, 3.0, 3.0);
        let visited_means = |error: f64| {
            let visited = Rc::new(RefCell::new(vec![]));
            let shape = {
                let visited = visited.clone();
                Shape::custom("recording_gaussian", 2, move |x, p| {
                    visited.borrow_mut().push(p[0]);
                    f64::exp(-0.5 * ((x - p[0]) / p[1]).powi(2))
                })
            };
            let mut params = ParameterSet::new();
            let mean = params.add(Parameter::new("mean", 0.0, -10.0, 10.0)).unwrap();
            let sigma = params.add(Parameter::constant("sigma", 3.0)).unwrap();
            params[mean].set_error(error);
            let model: Density = KernelDensity::new(shape, vec![mean, sigma], 0, 1)
                .unwrap()
                .with_normalization_sample(uniform_sample_1d(400, -20.0, 20.0))
                .into();
            let result = model.fit_unbinned(&data, &mut params, &FitOptions::default());
            assert!(result.is_success(), "{}", result.message);
            visited.take()
        };
        let contains = |means: &[f64], value: f64| means.iter().any(|&m| (m - value).abs() < 1e-12);

        let small = visited_means(0.01);
        assert!(contains(&small, 0.01));
        assert!(!contains(&small, 0.5));
        let large = visited_means(2.0);
        assert!(contains(&large, 2.0));
        // a zero error falls back to the minimizer default
        let fallback = visited_means(0.0);
        assert!(contains(&fallback, 0.5));
    }

    #[test]
    fn gaussian_projection_chi2_fit() {
        let mut params = ParameterSet::new();
        let mean = params.add(Parameter::new("mean", 0.0, -10.0, 10.0)).unwrap();
        let sigma = params.add(Parameter::new("sigma", 3.0, 0.1, 20.0)).unwrap();
        let binning = Binning::uniform(20, -10.0, 10.0).unwrap();
        let model: Density = ProjectionDensity::new(
            Shape::gaussian(),
            vec![mean, sigma],
            uniform_sample_1d(10_000, -10.0, 10.0),
            0,
            binning.clone(),
        )
        .unwrap()
        .into();
        let data = gaussian_sample(0, 10_000, 1.0, 4.0);
        let hist = Histogram::from_sample(&data, 0, binning).unwrap();

        let result = model.fit_binned(&hist, &mut params, &FitOptions::default());
        assert!(result.is_success(), "{}", result.message);
        assert_eq!(result.error_def, 1.0);
        assert_relative_eq!(params.value(mean), 1.0, max_relative = 0.05);
        assert_relative_eq!(params.value(sigma), 4.0, max_relative = 0.05);
        assert!(params[sigma].error() > 0.0 && params[sigma].error() < 0.2);
    }

    #[test]
    fn gaussian_likelihood_fit() {
        let mut params = ParameterSet::new();
        let model = gaussian_kernel(&mut params, "", uniform_sample_1d(4000, -20.0, 20.0));
        let data = gaussian_sample(1, 2000, 1.0, 2.0);
        let options = FitOptions::default().with_minos(true);
        let result = model.fit_unbinned(&data, &mut params, &options);
        assert!(result.is_success(), "{}", result.message);
        assert_eq!(result.covariance_status, CovarianceStatus::Accurate);
        assert_eq!(result.minos_valid, Some(true));

        let mean = &params[params.find("mean").unwrap()];
        let sigma = &params[params.find("sigma").unwrap()];
        let n = data.len() as f64;
        assert_relative_eq!(mean.value(), 1.0, epsilon = 0.15);
        assert_relative_eq!(sigma.value(), 2.0, epsilon = 0.1);
        // σ/√n and σ/√(2n)
        assert_relative_eq!(mean.error(), 2.0 / n.sqrt(), max_relative = 0.1);
        assert_relative_eq!(sigma.error(), 2.0 / (2.0 * n).sqrt(), max_relative = 0.1);
        for parameter in [mean, sigma] {
            let down = parameter.error_down().unwrap();
            let up = parameter.error_up().unwrap();
            assert!(down < 0.0 && up > 0.0);
            assert_relative_eq!(-down, parameter.error(), max_relative = 0.15);
            assert_relative_eq!(up, parameter.error(), max_relative = 0.15);
        }
        assert_eq!(result.parameter(params.find("mean").unwrap()).unwrap().value, mean.value());
    }

    #[test]
    fn mixture_fraction_fit() {
        let mut params = ParameterSet::new();
        let normset = uniform_sample_1d(2000, -10.0, 10.0);
        let signal = gaussian_kernel(&mut params, "", normset.clone());
        let mean = params.find("mean").unwrap();
        let sigma = params.find("sigma").unwrap();
        params[mean].set_constant(true);
        params.set_value(mean, 2.0);
        params[sigma].set_constant(true);
        params.set_value(sigma, 1.0);
        let slope = params.add(Parameter::constant("slope", 0.0)).unwrap();
        let background: Density = KernelDensity::new(Shape::exponential(), vec![slope], 0, 1)
            .unwrap()
            .into();
        let fraction = params.add(Parameter::new("fraction", 0.5, 0.0, 1.0)).unwrap();
        let model: Density =
            CompositeDensity::new(vec![signal, background], vec![fraction], normset)
                .unwrap()
                .into();

        // 30% Gaussian peak over a flat background
        let mut rng = rng(2);
        let mut values = gaussian_draws(&mut rng, 600, 2.0, 1.0).to_vec();
        values.extend(uniform_draws(&mut rng, 1400, -10.0, 10.0));
        let data = Sample::from_values(values, None).unwrap();

        let result = model.fit_unbinned(&data, &mut params, &FitOptions::default());
        assert!(result.is_success(), "{}", result.message);
        assert_eq!(result.parameters.len(), 1);
        assert_relative_eq!(params.value(fraction), 0.3, epsilon = 0.05);
    }

    #[test]
    fn non_convergence_keeps_best_values() {
        let mut params = ParameterSet::new();
        let model = gaussian_kernel(&mut params, "", uniform_sample_1d(400, -20.0, 20.0));
        let data = gaussian_sample(3, 500, 1.0, 2.0);
        let options = FitOptions::new(
            Minimizer::Cobyla(crate::minimizer::CobylaMinimizer::new(3, 0.5, 1e-8, None)),
            false,
            false,
        );
        let mut objective = NllObjective::new();
        objective.attach(&model, &data, &params);
        let result = objective.minimize(&mut params, &options);
        assert_eq!(result.status, FitStatus::NotConverged);
        assert!(result.covariance.is_none());
        // values of the best point are written back
        assert_relative_eq!(objective.value(&params), result.fval, max_relative = 1e-9);
        assert!(result.into_result().is_err());
    }
}
