//! Unit-safe quantities for the two model conventions.
//!
//! The canonical model works in SI base units (W, var, V, A, F, S) while the
//! alternate table model uses engineering units (MW, Mvar, kV, kA, nF, µS,
//! percent, degrees). Each pair gets a newtype on both sides and one explicit
//! conversion in each direction, so translation and reconciliation can only
//! combine quantities that share a unit.
//!
//! All types are `#[repr(transparent)]` over `f64`.
//!
//! ```
//! use pfx_core::units::{Degrees, Megawatts, Radians, Watts};
//!
//! let p = Watts(1.5e6).to_megawatts();
//! assert_eq!(p, Megawatts(1.5));
//! assert_eq!(p.to_watts(), Watts(1.5e6));
//!
//! let angle = Degrees(180.0).to_radians();
//! assert!((angle.value() - std::f64::consts::PI).abs() < 1e-12);
//! assert!((Radians(std::f64::consts::PI).to_degrees().value() - 180.0).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Macro to implement common arithmetic operations for unit types
macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Neg for $type {
            type Output = Self;
            fn neg(self) -> Self::Output {
                Self(-self.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl Div<$type> for $type {
            type Output = f64;
            fn div(self, rhs: $type) -> Self::Output {
                self.0 / rhs.0
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.6} {}", self.0, $unit_name)
            }
        }

        impl $type {
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            #[inline]
            pub fn abs(self) -> Self {
                Self(self.0.abs())
            }

            #[inline]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }

        impl std::iter::Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }
    };
}

/// Declares a conversion pair between a base unit and a scaled unit.
///
/// `down` means the scaled unit is larger (`scaled = base / factor`), `up`
/// means it is smaller (`scaled = base * factor`). Both keep the exact
/// factor so conversions of round values stay exact.
macro_rules! impl_scaled_pair {
    ($base:ty, $to_scaled:ident, $scaled:ty, $to_base:ident, down $factor:expr) => {
        impl $base {
            #[inline]
            pub fn $to_scaled(self) -> $scaled {
                <$scaled>::new(self.0 / $factor)
            }
        }

        impl $scaled {
            #[inline]
            pub fn $to_base(self) -> $base {
                <$base>::new(self.0 * $factor)
            }
        }
    };
    ($base:ty, $to_scaled:ident, $scaled:ty, $to_base:ident, up $factor:expr) => {
        impl $base {
            #[inline]
            pub fn $to_scaled(self) -> $scaled {
                <$scaled>::new(self.0 * $factor)
            }
        }

        impl $scaled {
            #[inline]
            pub fn $to_base(self) -> $base {
                <$base>::new(self.0 / $factor)
            }
        }
    };
}

// =============================================================================
// Power
// =============================================================================

/// Active power in watts (W)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Watts(pub f64);
impl_unit_ops!(Watts, "W");

/// Active power in megawatts (MW)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Megawatts(pub f64);
impl_unit_ops!(Megawatts, "MW");

/// Active power in kilowatts (kW), used for transformer iron losses
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Kilowatts(pub f64);
impl_unit_ops!(Kilowatts, "kW");

/// Reactive power in volt-amperes reactive (var)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Vars(pub f64);
impl_unit_ops!(Vars, "var");

/// Reactive power in megavars (Mvar)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Megavars(pub f64);
impl_unit_ops!(Megavars, "Mvar");

/// Apparent power in volt-amperes (VA)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct VoltAmperes(pub f64);
impl_unit_ops!(VoltAmperes, "VA");

/// Apparent power in megavolt-amperes (MVA)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct MegavoltAmperes(pub f64);
impl_unit_ops!(MegavoltAmperes, "MVA");

impl_scaled_pair!(Watts, to_megawatts, Megawatts, to_watts, down 1e6);
impl_scaled_pair!(Watts, to_kilowatts, Kilowatts, to_watts, down 1e3);
impl_scaled_pair!(Vars, to_megavars, Megavars, to_vars, down 1e6);
impl_scaled_pair!(VoltAmperes, to_megavolt_amperes, MegavoltAmperes, to_volt_amperes, down 1e6);

impl VoltAmperes {
    /// Apparent power magnitude from its active and reactive parts.
    pub fn from_components(p: Watts, q: Vars) -> Self {
        Self(p.0.hypot(q.0))
    }
}

// =============================================================================
// Voltage and Current
// =============================================================================

/// Voltage in volts (V)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Volts(pub f64);
impl_unit_ops!(Volts, "V");

/// Voltage in kilovolts (kV)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Kilovolts(pub f64);
impl_unit_ops!(Kilovolts, "kV");

/// Current in amperes (A)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Amperes(pub f64);
impl_unit_ops!(Amperes, "A");

/// Current in kiloamperes (kA)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Kiloamperes(pub f64);
impl_unit_ops!(Kiloamperes, "kA");

/// Per-unit value relative to a base
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PerUnit(pub f64);
impl_unit_ops!(PerUnit, "pu");

impl_scaled_pair!(Volts, to_kilovolts, Kilovolts, to_volts, down 1e3);
impl_scaled_pair!(Amperes, to_kiloamperes, Kiloamperes, to_amperes, down 1e3);

impl PerUnit {
    /// Absolute voltage for a per-unit magnitude on a line-to-line base.
    #[inline]
    pub fn to_volts(self, base: Volts) -> Volts {
        Volts(self.0 * base.0)
    }
}

impl Volts {
    /// Line-to-neutral magnitude of a line-to-line voltage.
    #[inline]
    pub fn line_to_neutral(self) -> Volts {
        Volts(self.0 / 3f64.sqrt())
    }
}

// =============================================================================
// Angles and ratios
// =============================================================================

/// Angle in radians
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Radians(pub f64);
impl_unit_ops!(Radians, "rad");

/// Angle in degrees
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Degrees(pub f64);
impl_unit_ops!(Degrees, "deg");

impl Radians {
    #[inline]
    pub fn to_degrees(self) -> Degrees {
        Degrees(self.0.to_degrees())
    }
}

impl Degrees {
    #[inline]
    pub fn to_radians(self) -> Radians {
        Radians(self.0.to_radians())
    }
}

/// Dimensionless ratio (1.0 = 100 %)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Fraction(pub f64);
impl_unit_ops!(Fraction, "");

/// Ratio in percent
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Percent(pub f64);
impl_unit_ops!(Percent, "%");

impl_scaled_pair!(Fraction, to_percent, Percent, to_fraction, up 100.0);

// =============================================================================
// Line parameters
// =============================================================================

/// Capacitance in farads (F)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Farads(pub f64);
impl_unit_ops!(Farads, "F");

/// Capacitance in nanofarads (nF)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Nanofarads(pub f64);
impl_unit_ops!(Nanofarads, "nF");

/// Conductance in siemens (S)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Siemens(pub f64);
impl_unit_ops!(Siemens, "S");

/// Conductance in microsiemens (µS)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Microsiemens(pub f64);
impl_unit_ops!(Microsiemens, "uS");

impl_scaled_pair!(Farads, to_nanofarads, Nanofarads, to_farads, up 1e9);
impl_scaled_pair!(Siemens, to_microsiemens, Microsiemens, to_siemens, up 1e6);

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn power_conversions_are_inverse() {
        let p = Watts(2.5e6);
        assert_eq!(p.to_megawatts(), Megawatts(2.5));
        assert!(approx(p.to_megawatts().to_watts().value(), 2.5e6));
        assert_eq!(Watts(1500.0).to_kilowatts(), Kilowatts(1.5));
        assert!(approx(Megavars(-0.3).to_vars().value(), -3e5));
        assert!(approx(
            VoltAmperes(4e5).to_megavolt_amperes().value(),
            0.4
        ));
    }

    #[test]
    fn voltage_and_current_conversions() {
        assert!(approx(Volts(10_500.0).to_kilovolts().value(), 10.5));
        assert!(approx(Kiloamperes(0.25).to_amperes().value(), 250.0));
        assert!(approx(PerUnit(1.02).to_volts(Volts(400.0)).value(), 408.0));
        assert!(approx(
            Volts(400.0).line_to_neutral().value(),
            400.0 / 3f64.sqrt()
        ));
    }

    #[test]
    fn line_parameter_conversions() {
        assert!(approx(Farads(1e-6).to_nanofarads().value(), 1000.0));
        assert!(approx(Siemens(2e-6).to_microsiemens().value(), 2.0));
        assert!(approx(Nanofarads(250.0).to_farads().value(), 2.5e-7));
    }

    #[test]
    fn ratio_and_angle_conversions() {
        assert!(approx(Fraction(0.04).to_percent().value(), 4.0));
        assert!(approx(Percent(55.0).to_fraction().value(), 0.55));
        assert!(approx(Degrees(-30.0).to_radians().value(), -std::f64::consts::FRAC_PI_6));
    }

    #[test]
    fn apparent_power_from_components() {
        let s = VoltAmperes::from_components(Watts(3.0), Vars(-4.0));
        assert!(approx(s.value(), 5.0));
    }

    #[test]
    fn arithmetic_stays_in_unit() {
        let total: Megawatts = [Megawatts(1.0), Megawatts(2.0)].into_iter().sum();
        assert_eq!(total, Megawatts(3.0));
        assert_eq!(-Watts(2.0), Watts(-2.0));
        assert!(approx(Watts(6.0) / Watts(3.0), 2.0));
    }
}
