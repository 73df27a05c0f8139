//! Dependency resolution for work orders.
//!
//! Orders a work order set so that every prerequisite appears strictly
//! before its dependents. Depth-first traversal with three-color marking
//! (unvisited / in-progress / done) over an explicit frame stack. Roots and
//! prerequisite lists are walked in input order, so orders with no mutual
//! constraint keep their relative input order.

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::models::WorkOrder;

/// Errors raised while resolving the dependency graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToposortError {
    #[error("invalid dependency: work order \"{0}\" is referenced as a dependency but does not exist")]
    InvalidDependency(String),
    /// The prerequisite chain closed on itself; the payload is the full
    /// cycle path in traversal order, e.g. `A -> B -> C -> A`.
    #[error("circular dependency detected: {0}")]
    CircularDependency(String),
}

/// Topologically sort work orders by their `depends_on` edges.
///
/// All-or-nothing: any unknown prerequisite or cycle fails the whole call
/// with no partial output.
pub fn sort_work_orders(orders: &[WorkOrder]) -> Result<Vec<WorkOrder>, ToposortError> {
    let by_id: FxHashMap<&str, &WorkOrder> = orders.iter().map(|o| (o.id.as_str(), o)).collect();

    let mut done: FxHashSet<&str> = FxHashSet::default();
    let mut in_progress: FxHashSet<&str> = FxHashSet::default();
    // Current DFS chain, kept alongside `in_progress` for cycle reporting.
    let mut chain: Vec<&str> = Vec::new();
    let mut sorted: Vec<WorkOrder> = Vec::with_capacity(orders.len());

    for root in orders {
        if done.contains(root.id.as_str()) {
            continue;
        }

        // Frame: the order plus the index of its next prerequisite to visit.
        let mut stack: Vec<(&WorkOrder, usize)> = vec![(root, 0)];
        in_progress.insert(root.id.as_str());
        chain.push(root.id.as_str());

        while let Some(frame) = stack.last_mut() {
            let (order, next) = (frame.0, frame.1);

            if let Some(dep_id) = order.depends_on.get(next) {
                frame.1 += 1;

                let dep = *by_id
                    .get(dep_id.as_str())
                    .ok_or_else(|| ToposortError::InvalidDependency(dep_id.clone()))?;

                if in_progress.contains(dep_id.as_str()) {
                    let path = format!("{} -> {}", chain.join(" -> "), dep_id);
                    return Err(ToposortError::CircularDependency(path));
                }
                if !done.contains(dep_id.as_str()) {
                    in_progress.insert(dep_id.as_str());
                    chain.push(dep_id.as_str());
                    stack.push((dep, 0));
                }
            } else {
                // All prerequisites emitted; emit the order itself.
                in_progress.remove(order.id.as_str());
                chain.pop();
                done.insert(order.id.as_str());
                sorted.push(order.clone());
                stack.pop();
            }
        }
    }

    Ok(sorted)
}
