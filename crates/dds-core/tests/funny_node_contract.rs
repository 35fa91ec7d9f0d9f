//! Contract tests for node composition
//!
//! Constraints verified:
//! - compute(0) is 50 + seed with 32-bit wraparound
//! - compute is deterministic and its offset is constant per instance
//! - the identity fields never change
//! - behaviour reviewers may want to revisit (negative age, overflow) is pinned

use dds_core::config::NodeConfig;
use dds_core::{DdsNode, FunnyNode, NodeKind, Voltage};

const SEEDS: [i32; 8] = [0, 1, -1, 42, 1_000_000, -1_000_000, i32::MAX, i32::MIN];
const INPUTS: [i32; 7] = [0, 1, -1, 17, -99_999, i32::MAX, i32::MIN];

#[test]
fn compute_zero_is_fifty_plus_seed() {
    for seed in SEEDS {
        assert_eq!(FunnyNode::new(seed).compute(0), 50i32.wrapping_add(seed));
    }
}

#[test]
fn end_to_end_seed_42() {
    let node = FunnyNode::new(42);
    assert_eq!(node.compute(0), 92);
    assert_eq!(node.compute(1), 93);
    assert_eq!(node.compute(-1), 91);
}

#[test]
fn compute_differences_track_inputs() {
    for seed in SEEDS {
        let node = FunnyNode::new(seed);
        for a in INPUTS {
            assert_eq!(node.compute(a), node.compute(a), "deterministic");
            for b in INPUTS {
                assert_eq!(
                    node.compute(a).wrapping_sub(node.compute(b)),
                    a.wrapping_sub(b)
                );
            }
        }
    }
}

#[test]
fn overflow_wraps_instead_of_saturating() {
    let node = FunnyNode::new(i32::MAX);
    let result = node.compute(i32::MAX);
    assert_eq!(result, i32::MAX.wrapping_add(50).wrapping_add(i32::MAX));
    assert_ne!(result, i32::MAX, "must not saturate");
}

#[test]
fn voltage_scale_wraps_at_32_bits() {
    // The voltage component is voltage * 10 in 32-bit arithmetic; pinned so a
    // change to wider arithmetic is noticed.
    let big = Voltage::new(i32::MAX);
    assert_eq!(big.get().wrapping_mul(10), -10);
}

#[test]
fn identity_is_fixed() {
    let node = FunnyNode::new(42);
    let before = node.base().clone();
    for input in INPUTS {
        node.compute(input);
    }
    assert_eq!(node.base(), &before);
    assert_eq!(node.base(), &DdsNode::new("chochacho", 11));
}

#[test]
fn negative_age_is_stored_verbatim() {
    let node = DdsNode::new("backwards", i32::MIN);
    assert_eq!(node.age(), i32::MIN);
}

#[test]
fn configured_node_matches_direct_construction() {
    let kind = NodeConfig::Funny { seed: 42 }.build();
    assert_eq!(kind, NodeKind::Funny(FunnyNode::new(42)));
}
