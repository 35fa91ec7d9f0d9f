//! Typed scalar holders
//!
//! Every value a node owns is a [`ValueType`]: a single `i32` with a unit
//! marker attached at the type level. The marker never exists at runtime; it
//! only keeps a `Voltage` from being handed where a `Current` is expected and
//! gives log output a readable suffix.
//!
//! ```rust
//! use dds_core::{Voltage, Current};
//!
//! let mut voltage = Voltage::default();
//! voltage.set(5);
//! assert_eq!(voltage.get(), 5);
//! assert_eq!(voltage.to_string(), "5 V");
//!
//! let current = Current::new(-3);
//! assert_eq!(current.get(), -3);
//! ```

pub mod units;

use std::fmt;
use std::marker::PhantomData;

pub use units::{Amperes, Current, Int32, Plain, Voltage, Volts};

/// Unit marker for a [`ValueType`]
pub trait Unit:
    fmt::Debug + Clone + Copy + PartialEq + Eq + std::hash::Hash + Default + Send + Sync + 'static
{
    /// Human-readable quantity name (e.g. "voltage")
    const NAME: &'static str;

    /// Display suffix; empty for unitless values
    const SYMBOL: &'static str;
}

/// A named `i32` holder with a getter and a setter
///
/// There is no validation: every `i32` is a valid value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueType<U: Unit> {
    value: i32,
    unit: PhantomData<U>,
}

impl<U: Unit> ValueType<U> {
    /// Create a value holding `value`
    pub const fn new(value: i32) -> Self {
        Self {
            value,
            unit: PhantomData,
        }
    }

    /// Current stored value
    pub fn get(&self) -> i32 {
        self.value
    }

    /// Overwrite the stored value
    pub fn set(&mut self, value: i32) {
        self.value = value;
    }

    /// Quantity name of this value's unit
    pub fn quantity(&self) -> &'static str {
        U::NAME
    }
}

impl<U: Unit> Default for ValueType<U> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<U: Unit> From<i32> for ValueType<U> {
    fn from(value: i32) -> Self {
        Self::new(value)
    }
}

impl<U: Unit> fmt::Display for ValueType<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if U::SYMBOL.is_empty() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.value, U::SYMBOL)
        }
    }
}
