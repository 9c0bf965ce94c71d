// Group statistics over one metric label
//
// Uses trueno::Vector for SIMD-optimized mean/sum/min/max. The variance is
// taken over the centered samples: trueno's own variance() is E[X²] - μ², which
// cancels catastrophically in f32 for large, nearly equal benchmark values.

use trueno::Vector;

/// Relative spread of a group, in percent of its mean
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Deviance {
    Percent(f32),
    /// Zero mean with a non-zero spread: the ratio is unrepresentable
    Undefined,
}

/// Rounding slack when comparing a deviance against a tolerance bound.
/// `[0.85, 1.15]` yields 15.000012% in f32.
const DEVIANCE_EPSILON: f32 = 1e-4;

impl Deviance {
    /// Greater than `limit` by more than f32 rounding; an undefined deviance
    /// exceeds every limit
    pub fn exceeds(self, limit: f32) -> bool {
        match self {
            Deviance::Percent(percent) => percent - limit > DEVIANCE_EPSILON,
            Deviance::Undefined => true,
        }
    }

    pub fn percent(self) -> Option<f32> {
        match self {
            Deviance::Percent(percent) => Some(percent),
            Deviance::Undefined => None,
        }
    }
}

/// Snapshot of one label across every machine holding it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupStatistics {
    pub count: usize,
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    /// Population standard deviation
    pub stddev: f32,
    pub sum: f32,
    pub deviance: Deviance,
}

impl GroupStatistics {
    /// Compute statistics; `None` for an empty group
    pub fn from_samples(samples: &[f32]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let v = Vector::from_slice(samples);
        let sum = v.sum().unwrap_or(0.0);
        let min = v.min().unwrap_or(0.0);
        let max = v.max().unwrap_or(0.0);

        // identical samples: exact mean, no spread
        if min == max {
            return Some(Self {
                count: samples.len(),
                min,
                max,
                mean: min,
                stddev: 0.0,
                sum,
                deviance: Deviance::Percent(0.0),
            });
        }

        let mean = v.mean().unwrap_or(0.0);
        let stddev = population_stddev(samples, mean);

        Some(Self {
            count: samples.len(),
            min,
            max,
            mean,
            stddev,
            sum,
            deviance: deviance_percentage(samples.len(), mean, stddev),
        })
    }

    /// Band `[mean - 2σ, mean + 2σ]` outside which a machine is curious
    pub fn allowed_range(&self) -> (f32, f32) {
        (self.mean - 2.0 * self.stddev, self.mean + 2.0 * self.stddev)
    }
}

/// Two-pass population standard deviation
fn population_stddev(samples: &[f32], mean: f32) -> f32 {
    let centered: Vec<f32> = samples.iter().map(|x| x - mean).collect();
    let variance = Vector::from_slice(&centered).sum_of_squares().unwrap_or(0.0)
        / samples.len() as f32;
    variance.max(0.0).sqrt()
}

/// `stddev / mean * 100`, computed as `stddev * 100 / mean` to keep exact
/// percentages exact
fn deviance_percentage(count: usize, mean: f32, stddev: f32) -> Deviance {
    if count == 1 {
        return Deviance::Percent(0.0);
    }
    if mean == 0.0 {
        return if stddev == 0.0 {
            Deviance::Percent(0.0)
        } else {
            Deviance::Undefined
        };
    }
    Deviance::Percent(stddev * 100.0 / mean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_samples_have_zero_deviance() {
        let stats = GroupStatistics::from_samples(&[10.0, 10.0, 10.0]).unwrap();
        assert_eq!(stats.mean, 10.0);
        assert_eq!(stats.stddev, 0.0);
        assert_eq!(stats.sum, 30.0);
        assert_eq!(stats.deviance, Deviance::Percent(0.0));
    }

    #[test]
    fn test_population_stddev() {
        // mean=5, variance = (9 + 1 + 1 + 9) / 4 = 5
        let stats = GroupStatistics::from_samples(&[2.0, 4.0, 6.0, 8.0]).unwrap();
        assert!((stats.stddev - 5.0f32.sqrt()).abs() < 1e-4);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 8.0);
    }

    #[test]
    fn test_single_sample_deviance_is_zero() {
        let stats = GroupStatistics::from_samples(&[42.0]).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.deviance, Deviance::Percent(0.0));
    }

    #[test]
    fn test_zero_mean_with_spread_is_undefined() {
        let stats = GroupStatistics::from_samples(&[-5.0, 5.0]).unwrap();
        assert_eq!(stats.deviance, Deviance::Undefined);
        assert!(stats.deviance.exceeds(1_000.0));
        assert_eq!(stats.deviance.percent(), None);
    }

    #[test]
    fn test_all_zero_is_defined() {
        let stats = GroupStatistics::from_samples(&[0.0, 0.0]).unwrap();
        assert_eq!(stats.deviance, Deviance::Percent(0.0));
    }

    #[test]
    fn test_exact_boundary_percentage() {
        let stats = GroupStatistics::from_samples(&[85.0, 115.0]).unwrap();
        assert_eq!(stats.deviance, Deviance::Percent(15.0));
        assert!(!stats.deviance.exceeds(15.0));
    }

    #[test]
    fn test_large_identical_values_have_zero_spread() {
        let stats = GroupStatistics::from_samples(&[98765.43; 7]).unwrap();
        assert_eq!(stats.mean, 98765.43);
        assert_eq!(stats.stddev, 0.0);
        assert_eq!(stats.deviance, Deviance::Percent(0.0));
    }

    #[test]
    fn test_nearly_identical_values_have_finite_spread() {
        let samples = [98765.43, 98765.44, 98765.43, 98765.42, 98765.43, 98765.43, 98765.44];
        let stats = GroupStatistics::from_samples(&samples).unwrap();
        assert!(stats.stddev.is_finite());
        assert!(stats.stddev >= 0.0);
        assert!(stats.stddev < 0.1);
        assert!(matches!(stats.deviance, Deviance::Percent(p) if p.is_finite() && p < 0.001));
    }

    #[test]
    fn test_rounded_boundary_percentage_is_not_exceeded() {
        // 0.15 / 1.0 comes out as 15.000012% in f32
        let stats = GroupStatistics::from_samples(&[0.85, 1.15]).unwrap();
        assert!((stats.deviance.percent().unwrap() - 15.0).abs() < 1e-3);
        assert!(!stats.deviance.exceeds(15.0));
        assert!(Deviance::Percent(15.01).exceeds(15.0));
    }

    #[test]
    fn test_allowed_range() {
        let stats = GroupStatistics::from_samples(&[85.0, 115.0]).unwrap();
        assert_eq!(stats.allowed_range(), (70.0, 130.0));
    }

    #[test]
    fn test_empty_has_no_statistics() {
        assert!(GroupStatistics::from_samples(&[]).is_none());
    }
}
