use crate::decoding::domain::gender::Gender;
use crate::shared::constants::{AGE_TOP_K, GENDER_THRESHOLD};
use crate::shared::error::FaceAttributeError;

/// Turns the age and gender heads into final labels.
///
/// Both calibration values are tied to the trained network; the defaults
/// match the bundled model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistributionDecoder {
    top_k: usize,
    gender_threshold: f32,
}

impl Default for DistributionDecoder {
    fn default() -> Self {
        Self::new(AGE_TOP_K, GENDER_THRESHOLD)
    }
}

impl DistributionDecoder {
    pub fn new(top_k: usize, gender_threshold: f32) -> Self {
        Self {
            top_k,
            gender_threshold,
        }
    }

    /// Expected age over the `top_k` most probable one-year bins.
    ///
    /// Each bin `i` covers `[i, i + 1)` and contributes its midpoint. The
    /// selected probabilities are renormalized to sum to one, and the result
    /// is rounded half away from zero.
    pub fn decode_age(&self, distribution: &[f32]) -> Result<u32, FaceAttributeError> {
        if self.top_k == 0 || distribution.len() < self.top_k {
            return Err(FaceAttributeError::DegenerateDistribution(format!(
                "need at least {} bins, got {}",
                self.top_k.max(1),
                distribution.len()
            )));
        }

        if let Some(bin) = distribution.iter().position(|p| !p.is_finite()) {
            return Err(FaceAttributeError::DegenerateDistribution(format!(
                "bin {bin} is {}",
                distribution[bin]
            )));
        }

        let top = top_indices(distribution, self.top_k);
        let mass: f64 = top.iter().map(|&i| distribution[i] as f64).sum();
        if !mass.is_finite() || mass <= 0.0 {
            return Err(FaceAttributeError::DegenerateDistribution(format!(
                "top-{} probability mass is {mass}",
                self.top_k
            )));
        }

        let estimate: f64 = top
            .iter()
            .map(|&i| (i as f64 + 0.5) * distribution[i] as f64 / mass)
            .sum();
        if !estimate.is_finite() || estimate < 0.0 {
            return Err(FaceAttributeError::DegenerateDistribution(format!(
                "age estimate is {estimate}"
            )));
        }
        Ok(estimate.round() as u32)
    }

    /// `Male` iff `score >= threshold`. NaN scores fall through to `Female`.
    pub fn decode_gender(&self, score: f32) -> Gender {
        if score >= self.gender_threshold {
            Gender::Male
        } else {
            Gender::Female
        }
    }
}

/// Indices of the `k` largest values, highest first. Equal values keep
/// ascending index order.
fn top_indices(values: &[f32], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
    indices.truncate(k);
    indices
}
