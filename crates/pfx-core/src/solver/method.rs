use crate::error::PfxError;
use serde::{Deserialize, Serialize};

/// Power-flow calculation method of the canonical engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    Linear,
    NewtonRaphson,
    IterativeLinear,
    IterativeCurrent,
    LinearCurrent,
}

impl Default for CalculationMethod {
    fn default() -> Self {
        CalculationMethod::NewtonRaphson
    }
}

impl CalculationMethod {
    pub fn from_str(input: &str) -> Result<Self, PfxError> {
        match input.to_ascii_lowercase().as_str() {
            "linear" => Ok(CalculationMethod::Linear),
            "newton_raphson" | "nr" | "default" => Ok(CalculationMethod::NewtonRaphson),
            "iterative_linear" => Ok(CalculationMethod::IterativeLinear),
            "iterative_current" => Ok(CalculationMethod::IterativeCurrent),
            "linear_current" => Ok(CalculationMethod::LinearCurrent),
            other => Err(PfxError::Config(format!(
                "unknown calculation method '{}'; supported values: {}",
                other,
                Self::available().join(", ")
            ))),
        }
    }

    pub fn available() -> &'static [&'static str] {
        &[
            "linear",
            "newton_raphson",
            "iterative_linear",
            "iterative_current",
            "linear_current",
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CalculationMethod::Linear => "linear",
            CalculationMethod::NewtonRaphson => "newton_raphson",
            CalculationMethod::IterativeLinear => "iterative_linear",
            CalculationMethod::IterativeCurrent => "iterative_current",
            CalculationMethod::LinearCurrent => "linear_current",
        }
    }

    pub fn is_iterative(&self) -> bool {
        matches!(
            self,
            CalculationMethod::NewtonRaphson
                | CalculationMethod::IterativeLinear
                | CalculationMethod::IterativeCurrent
        )
    }

    /// Algorithm name of the alternate engine for the same method, if it has one.
    pub fn alternate_algorithm(&self) -> Option<&'static str> {
        match self {
            CalculationMethod::NewtonRaphson => Some("nr"),
            CalculationMethod::IterativeCurrent => Some("bfsw"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parsing_supports_all_methods() {
        for name in CalculationMethod::available() {
            assert_eq!(CalculationMethod::from_str(name).unwrap().as_str(), *name);
        }
        assert_eq!(
            CalculationMethod::from_str("NR").unwrap(),
            CalculationMethod::NewtonRaphson
        );
        assert!(matches!(CalculationMethod::from_str("gauss_seidel"), Err(_)));
    }

    #[test]
    fn alternate_algorithm_mapping() {
        assert_eq!(CalculationMethod::NewtonRaphson.alternate_algorithm(), Some("nr"));
        assert_eq!(CalculationMethod::Linear.alternate_algorithm(), None);
        assert!(!CalculationMethod::LinearCurrent.is_iterative());
    }
}
