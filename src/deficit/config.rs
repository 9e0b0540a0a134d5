//! Optimizer configuration of a deficit session.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::measurement::MeasuredFamily;
use crate::optim::Algorithm;
use crate::precision::Precision;

/// Two-stage search settings.
///
/// `angle_range[i]` and `initial_angle[i]` are multiples of π: angle `i` is
/// searched in `[0, angle_range[i] π]` starting from `initial_angle[i] π`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeficitConfig {
    /// Algorithm of the global phase.
    pub global_algorithm: Algorithm,
    /// Relative x tolerance of the global phase.
    pub global_xtol: f64,
    /// Relative f tolerance of the global phase; 0 disables.
    pub global_ftol: f64,
    /// Whether the global phase runs before the local refinement.
    pub global_enabled: bool,
    /// Algorithm of the local refinement.
    pub local_algorithm: Algorithm,
    /// Relative x tolerance of the local refinement.
    pub local_xtol: f64,
    /// Relative f tolerance of the local refinement; 0 disables.
    pub local_ftol: f64,
    /// Points the local refinement starts from: the global optimum, then
    /// the best basin candidates the global phase reported. Values below 1
    /// act as 1.
    #[serde(default = "default_local_starts")]
    pub local_starts: usize,
    /// Upper bound of each angle, as a multiple of π.
    pub angle_range: Vec<f64>,
    /// Starting angles, as multiples of π.
    pub initial_angle: Vec<f64>,
}

fn default_local_starts() -> usize {
    LOCAL_STARTS
}

/// Default number of local refinement starts.
pub const LOCAL_STARTS: usize = 8;

impl DeficitConfig {
    /// Defaults for a measured party of the given family.
    pub fn for_family(family: MeasuredFamily) -> Self {
        let local_xtol = 10.0 * <f64 as Precision>::eps();
        match family {
            MeasuredFamily::Qubit => DeficitConfig {
                global_algorithm: Algorithm::DirectL,
                global_xtol: 4.0e-2,
                global_ftol: 0.0,
                global_enabled: true,
                local_algorithm: Algorithm::NelderMead,
                local_xtol,
                local_ftol: 0.0,
                local_starts: LOCAL_STARTS,
                angle_range: vec![1.0, 2.0],
                initial_angle: vec![0.1, 0.1],
            },
            MeasuredFamily::Qutrit => DeficitConfig {
                global_algorithm: Algorithm::DirectL,
                global_xtol: 0.25,
                global_ftol: 0.0,
                global_enabled: true,
                local_algorithm: Algorithm::NelderMead,
                local_xtol,
                local_ftol: 0.0,
                local_starts: LOCAL_STARTS,
                angle_range: vec![2.0; 5],
                initial_angle: vec![2.0; 5],
            },
        }
    }

    /// Checks the angle vectors against the family's parameter count.
    pub fn validate(&self, family: MeasuredFamily) -> Result<()> {
        family.check_len(self.angle_range.len())?;
        family.check_len(self.initial_angle.len())
    }

    /// Search box `[0, bᵢπ]`.
    pub(crate) fn bounds(&self) -> (Vec<f64>, Vec<f64>) {
        let pi = std::f64::consts::PI;
        let upper = self.angle_range.iter().map(|b| b * pi).collect::<Vec<_>>();
        (vec![0.0; upper.len()], upper)
    }

    /// Starting point `seedᵢπ`.
    pub(crate) fn start(&self) -> Vec<f64> {
        self.initial_angle
            .iter()
            .map(|s| s * std::f64::consts::PI)
            .collect()
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_family_defaults() {
        let qubit = DeficitConfig::for_family(MeasuredFamily::Qubit);
        assert_eq!(qubit.global_xtol, 4.0e-2);
        assert_eq!(qubit.angle_range, vec![1.0, 2.0]);
        assert_eq!(qubit.initial_angle, vec![0.1, 0.1]);
        assert!(qubit.global_enabled);
        assert_eq!(qubit.local_ftol, 0.0);

        let qutrit = DeficitConfig::for_family(MeasuredFamily::Qutrit);
        assert_eq!(qutrit.global_xtol, 0.25);
        assert_eq!(qutrit.angle_range, vec![2.0; 5]);
        assert_eq!(qutrit.initial_angle, vec![2.0; 5]);
        assert_eq!(qutrit.local_xtol, qubit.local_xtol);
        assert_eq!(qutrit.local_starts, LOCAL_STARTS);
        assert_eq!(qubit.local_algorithm, Algorithm::NelderMead);
    }

    #[test]
    fn test_validate_rejects_wrong_lengths() {
        let mut config = DeficitConfig::for_family(MeasuredFamily::Qubit);
        assert!(config.validate(MeasuredFamily::Qubit).is_ok());
        assert_eq!(
            config.validate(MeasuredFamily::Qutrit),
            Err(Error::InvalidParameterVectorLength {
                expected: 5,
                found: 2
            })
        );
        config.initial_angle = vec![0.1];
        assert!(config.validate(MeasuredFamily::Qubit).is_err());
    }

    #[test]
    fn test_bounds_and_start_scale_by_pi() {
        let config = DeficitConfig::for_family(MeasuredFamily::Qubit);
        let (lower, upper) = config.bounds();
        assert_eq!(lower, vec![0.0, 0.0]);
        assert_eq!(upper, vec![std::f64::consts::PI, 2.0 * std::f64::consts::PI]);
        assert!((config.start()[1] - 0.1 * std::f64::consts::PI).abs() < 1e-15);
    }

    #[test]
    fn test_json_round_trip() {
        let config = DeficitConfig::for_family(MeasuredFamily::Qutrit);
        let text = serde_json::to_string(&config).unwrap();
        assert!(text.contains("\"DirectL\""));
        let back: DeficitConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_missing_local_starts_takes_default() {
        let config = DeficitConfig::for_family(MeasuredFamily::Qubit);
        let mut value = serde_json::to_value(&config).unwrap();
        value.as_object_mut().unwrap().remove("local_starts");
        let back: DeficitConfig = serde_json::from_value(value).unwrap();
        assert_eq!(back.local_starts, LOCAL_STARTS);
        assert_eq!(back, config);
    }
}
