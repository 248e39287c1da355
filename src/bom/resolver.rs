use rust_decimal::Decimal;
use serde::Serialize;

use super::{BomError, ComponentGraph};

/// A product expanded at a given quantity, with its components resolved beneath it.
///
/// `total_cost` and `total_revenue` are zero until the tree goes through
/// [`super::aggregator::annotate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedComponentNode {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub quantity_on_hand: i32,
    pub sell_price: Decimal,
    pub buy_price: Decimal,
    /// Rate of the edge leading to this node; 1 for the root.
    pub rate: Decimal,
    /// Cumulative quantity: the root quantity times every rate on the path.
    pub quantity: Decimal,
    pub total_cost: Decimal,
    pub total_revenue: Decimal,
    pub components: Vec<ResolvedComponentNode>,
}

impl ResolvedComponentNode {
    pub fn is_leaf(&self) -> bool {
        self.components.is_empty()
    }
}

pub struct TreeResolver<'g> {
    graph: &'g ComponentGraph,
    max_depth: usize,
}

impl<'g> TreeResolver<'g> {
    pub fn new(graph: &'g ComponentGraph, max_depth: usize) -> Self {
        Self { graph, max_depth }
    }

    pub fn resolve(&self, product_id: i64, quantity: Decimal) -> Result<ResolvedComponentNode, BomError> {
        if quantity <= Decimal::ZERO {
            return Err(BomError::InvalidQuantity(quantity));
        }

        let mut path = Vec::new();
        self.expand(product_id, Decimal::ONE, quantity, &mut path)
    }

    fn expand(
        &self,
        product_id: i64,
        rate: Decimal,
        quantity: Decimal,
        path: &mut Vec<i64>,
    ) -> Result<ResolvedComponentNode, BomError> {
        if let Some(pos) = path.iter().position(|&id| id == product_id) {
            let mut cycle = path[pos..].to_vec();
            cycle.push(product_id);
            return Err(BomError::CycleDetected { path: cycle });
        }
        if path.len() >= self.max_depth {
            return Err(BomError::DepthExceeded {
                product_id: path.first().copied().unwrap_or(product_id),
                max_depth: self.max_depth,
            });
        }

        let product = self
            .graph
            .product(product_id)
            .ok_or(BomError::ProductNotFound(product_id))?;

        path.push(product_id);
        let components = self
            .graph
            .outgoing_edges(product_id)
            .iter()
            .map(|edge| {
                let child_quantity = quantity
                    .checked_mul(edge.rate)
                    .ok_or(BomError::Overflow(edge.final_product_id))?;
                self.expand(edge.final_product_id, edge.rate, child_quantity, path)
            })
            .collect::<Result<Vec<_>, _>>()?;
        path.pop();

        Ok(ResolvedComponentNode {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            quantity_on_hand: product.quantity,
            sell_price: product.sell_price,
            buy_price: product.buy_price,
            rate,
            quantity,
            total_cost: Decimal::ZERO,
            total_revenue: Decimal::ZERO,
            components,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bom::graph::fixtures::{edge, product};
    use rust_decimal_macros::dec;

    #[test]
    fn leaf_resolves_to_single_node() {
        let graph = ComponentGraph::new(vec![product(1, "Wood Plank", dec!(4.50), dec!(2.99))], vec![]);
        let node = TreeResolver::new(&graph, 8).resolve(1, dec!(3)).unwrap();

        assert!(node.is_leaf());
        assert_eq!(node.rate, Decimal::ONE);
        assert_eq!(node.quantity, dec!(3));
        assert_eq!(node.name, "Wood Plank");
    }

    #[test]
    fn quantities_compose_multiplicatively() {
        let graph = ComponentGraph::new(
            vec![
                product(1, "A", dec!(0), dec!(0)),
                product(2, "B", dec!(0), dec!(0)),
                product(3, "C", dec!(0), dec!(0)),
            ],
            vec![edge(1, 2, dec!(0.5)), edge(2, 3, dec!(4))],
        );
        let root = TreeResolver::new(&graph, 8).resolve(1, dec!(3)).unwrap();

        let b = &root.components[0];
        let c = &b.components[0];
        assert_eq!(b.rate, dec!(0.5));
        assert_eq!(b.quantity, dec!(1.5));
        assert_eq!(c.rate, dec!(4));
        assert_eq!(c.quantity, dec!(6));
    }

    #[test]
    fn shared_component_appears_under_each_parent() {
        let graph = ComponentGraph::new(
            vec![
                product(1, "Table", dec!(0), dec!(0)),
                product(2, "Leg", dec!(0), dec!(0)),
                product(3, "Screw", dec!(0), dec!(0)),
            ],
            vec![edge(1, 2, dec!(4)), edge(1, 3, dec!(8)), edge(2, 3, dec!(2))],
        );
        let root = TreeResolver::new(&graph, 8).resolve(1, dec!(1)).unwrap();

        assert_eq!(root.components.len(), 2);
        assert_eq!(root.components[0].components[0].id, 3);
        assert_eq!(root.components[0].components[0].quantity, dec!(8));
        assert_eq!(root.components[1].quantity, dec!(8));
    }

    #[test]
    fn missing_root_is_not_found() {
        let graph = ComponentGraph::default();
        let err = TreeResolver::new(&graph, 8).resolve(5, dec!(1)).unwrap_err();
        assert_eq!(err, BomError::ProductNotFound(5));
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let graph = ComponentGraph::new(vec![product(1, "A", dec!(1), dec!(1))], vec![]);
        let resolver = TreeResolver::new(&graph, 8);
        assert_eq!(resolver.resolve(1, dec!(0)), Err(BomError::InvalidQuantity(dec!(0))));
        assert!(resolver.resolve(1, dec!(-2)).is_err());
    }

    #[test]
    fn cycle_fails_fast() {
        let graph = ComponentGraph::new(
            vec![
                product(1, "A", dec!(0), dec!(0)),
                product(2, "B", dec!(0), dec!(0)),
                product(3, "C", dec!(0), dec!(0)),
            ],
            vec![edge(1, 2, dec!(1)), edge(2, 3, dec!(1)), edge(3, 2, dec!(1))],
        );
        let err = TreeResolver::new(&graph, 64).resolve(1, dec!(1)).unwrap_err();
        assert_eq!(err, BomError::CycleDetected { path: vec![2, 3, 2] });
    }

    #[test]
    fn depth_guard_stops_long_chains() {
        let products = (1..=5).map(|id| product(id, "P", dec!(0), dec!(1))).collect();
        let edges = (1..5).map(|id| edge(id, id + 1, dec!(1))).collect();
        let graph = ComponentGraph::new(products, edges);

        assert!(TreeResolver::new(&graph, 5).resolve(1, dec!(1)).is_ok());
        assert_eq!(
            TreeResolver::new(&graph, 4).resolve(1, dec!(1)),
            Err(BomError::DepthExceeded { product_id: 1, max_depth: 4 })
        );
    }

    #[test]
    fn resolution_is_idempotent() {
        let graph = ComponentGraph::new(
            vec![
                product(1, "A", dec!(9), dec!(0)),
                product(2, "B", dec!(1), dec!(0.3)),
                product(3, "C", dec!(1), dec!(0.7)),
            ],
            vec![edge(1, 3, dec!(2)), edge(1, 2, dec!(1))],
        );
        let resolver = TreeResolver::new(&graph, 8);
        assert_eq!(resolver.resolve(1, dec!(2)), resolver.resolve(1, dec!(2)));
    }
}
