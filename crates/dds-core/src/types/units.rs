//! Unit markers and the concrete value types built on them

use super::{Unit, ValueType};

/// Electrical potential, in volts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Volts;

impl Unit for Volts {
    const NAME: &'static str = "voltage";
    const SYMBOL: &'static str = "V";
}

/// Electrical current, in amperes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Amperes;

impl Unit for Amperes {
    const NAME: &'static str = "current";
    const SYMBOL: &'static str = "A";
}

/// Unitless 32-bit integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Plain;

impl Unit for Plain {
    const NAME: &'static str = "int32";
    const SYMBOL: &'static str = "";
}

/// Voltage reading
pub type Voltage = ValueType<Volts>;

/// Current reading
pub type Current = ValueType<Amperes>;

/// Plain integer value
pub type Int32 = ValueType<Plain>;
