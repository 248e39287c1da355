//! Bill-of-materials costing.
//!
//! Products are composed of other products through rated edges. Everything in
//! this module is pure and works on a [`ComponentGraph`] snapshot; [`store`]
//! is the only part that talks to the database.

pub mod aggregator;
pub mod error;
pub mod graph;
pub mod resolver;
pub mod store;
pub mod valuation;

use rust_decimal::Decimal;

pub use error::BomError;
pub use graph::ComponentGraph;
pub use resolver::{ResolvedComponentNode, TreeResolver};
pub use valuation::{flatten_cost_breakdown, value_order_lines, CostBreakdownRow, OrderValuation};

/// Resolves `product_id` at `quantity` and annotates the whole tree with costs.
pub fn cost_tree(
    graph: &ComponentGraph,
    product_id: i64,
    quantity: Decimal,
    max_depth: usize,
) -> Result<ResolvedComponentNode, BomError> {
    let mut root = TreeResolver::new(graph, max_depth).resolve(product_id, quantity)?;
    aggregator::annotate(&mut root)?;
    Ok(root)
}
