//! Demo node mixing a fixed voltage with a seed value

use crate::types::{Int32, Voltage};

use super::DdsNode;

/// Name every funny node reports
pub const FUNNY_NODE_NAME: &str = "chochacho";

/// Age every funny node reports
pub const FUNNY_NODE_AGE: i32 = 11;

/// Voltage every funny node is wired to
pub const FUNNY_NODE_VOLTAGE: i32 = 5;

/// Scale applied to the voltage before it joins the sum
const VOLTAGE_SCALE: i32 = 10;

/// Composite node owning a voltage and a seed value
///
/// Holds its [`DdsNode`] identity as a field and delegates the identity
/// accessors to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunnyNode {
    base: DdsNode,
    voltage: Voltage,
    funny_number: Int32,
}

impl FunnyNode {
    /// Create a funny node seeded with `funny_number`
    pub fn new(funny_number: i32) -> Self {
        let mut voltage = Voltage::default();
        voltage.set(FUNNY_NODE_VOLTAGE);

        let mut seed = Int32::default();
        seed.set(funny_number);

        Self {
            base: DdsNode::new(FUNNY_NODE_NAME, FUNNY_NODE_AGE),
            voltage,
            funny_number: seed,
        }
    }

    /// Combine `input` with the node's owned values
    ///
    /// `input + voltage * 10 + funny_number`, every step wrapping at 32 bits.
    pub fn compute(&self, input: i32) -> i32 {
        let voltage_component = self.voltage.get().wrapping_mul(VOLTAGE_SCALE);
        let funny_component = self.funny_number.get();
        input
            .wrapping_add(voltage_component)
            .wrapping_add(funny_component)
    }

    /// Embedded identity
    pub fn base(&self) -> &DdsNode {
        &self.base
    }

    /// Node name
    pub fn name(&self) -> &str {
        self.base.name()
    }

    /// Node age
    pub fn age(&self) -> i32 {
        self.base.age()
    }

    /// Print the identification line to stdout
    pub fn display(&self) {
        self.base.display();
    }

    /// Owned voltage
    pub fn voltage(&self) -> Voltage {
        self.voltage
    }

    /// Owned seed value
    pub fn funny_number(&self) -> Int32 {
        self.funny_number
    }
}
