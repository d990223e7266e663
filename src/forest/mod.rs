//! Isolation forest: randomized partition trees and ensemble path-length scoring.

mod ensemble;
mod tree;

pub use ensemble::IsolationForest;
pub use tree::{Node, NodeId, PartitionTree};

/// Euler-Mascheroni constant used by the harmonic-number approximation.
pub const EULER_GAMMA: f64 = 0.5772156649;

/// `c(k)`: expected path length of an unsuccessful search in a binary search
/// tree of `k` items. Corrects leaves that still hold more than one record.
pub fn average_path_length(k: usize) -> f64 {
    if k <= 1 {
        return 0.0;
    }
    let k = k as f64;
    2.0 * harmonic(k - 1.0) - 2.0 * (k - 1.0) / k
}

fn harmonic(i: f64) -> f64 {
    i.ln() + EULER_GAMMA
}
