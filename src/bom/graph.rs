use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;

use super::BomError;
use crate::models::product::{ComponentEdge, Product};

/// In-memory snapshot of products and their composition edges.
///
/// Built from one bulk fetch per request so that resolving a tree never goes
/// back to the database node by node.
#[derive(Debug, Default, Clone)]
pub struct ComponentGraph {
    products: HashMap<i64, Product>,
    edges: HashMap<i64, Vec<ComponentEdge>>,
}

impl ComponentGraph {
    pub fn new(products: Vec<Product>, edges: Vec<ComponentEdge>) -> Self {
        let products = products.into_iter().map(|p| (p.id, p)).collect();

        let mut by_initial: HashMap<i64, Vec<ComponentEdge>> = HashMap::new();
        for edge in edges {
            by_initial.entry(edge.initial_product_id).or_default().push(edge);
        }
        // Stable child order keeps repeated resolutions identical.
        for list in by_initial.values_mut() {
            list.sort_by_key(|e| e.final_product_id);
        }

        Self { products, edges: by_initial }
    }

    pub fn product(&self, id: i64) -> Option<&Product> {
        self.products.get(&id)
    }

    pub fn outgoing_edges(&self, product_id: i64) -> &[ComponentEdge] {
        self.edges.get(&product_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the product path `from -> ... -> to` if `to` is reachable from `from`.
    pub fn path_between(&self, from: i64, to: i64) -> Option<Vec<i64>> {
        if from == to {
            return Some(vec![from]);
        }

        let mut parent: HashMap<i64, i64> = HashMap::new();
        let mut seen: HashSet<i64> = HashSet::from([from]);
        let mut stack = vec![from];

        while let Some(current) = stack.pop() {
            for edge in self.outgoing_edges(current) {
                let next = edge.final_product_id;
                if !seen.insert(next) {
                    continue;
                }
                parent.insert(next, current);
                if next == to {
                    let mut path = vec![to];
                    let mut cursor = to;
                    while let Some(&p) = parent.get(&cursor) {
                        path.push(p);
                        cursor = p;
                    }
                    path.reverse();
                    return Some(path);
                }
                stack.push(next);
            }
        }

        None
    }

    /// Checks that adding (or re-rating) `initial -> final` keeps the graph a valid DAG.
    pub fn validate_new_edge(
        &self,
        initial_product_id: i64,
        final_product_id: i64,
        rate: Decimal,
    ) -> Result<(), BomError> {
        let malformed = |reason: &str| BomError::MalformedEdge {
            initial_product_id,
            final_product_id,
            reason: reason.to_string(),
        };

        if rate <= Decimal::ZERO {
            return Err(malformed("rate must be greater than zero"));
        }
        if initial_product_id == final_product_id {
            return Err(malformed("a product cannot be a component of itself"));
        }
        if self.product(initial_product_id).is_none() {
            return Err(BomError::ProductNotFound(initial_product_id));
        }
        if self.product(final_product_id).is_none() {
            return Err(BomError::ProductNotFound(final_product_id));
        }

        // The new edge closes a cycle iff `initial` is already reachable from `final`.
        if let Some(back) = self.path_between(final_product_id, initial_product_id) {
            let mut path = vec![initial_product_id];
            path.extend(back);
            return Err(BomError::CycleDetected { path });
        }

        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{edge, product};
    use super::*;
    use rust_decimal_macros::dec;

    fn chain() -> ComponentGraph {
        ComponentGraph::new(
            vec![
                product(1, "A", dec!(10), dec!(0)),
                product(2, "B", dec!(5), dec!(0)),
                product(3, "C", dec!(1), dec!(0.5)),
            ],
            vec![edge(1, 2, dec!(2)), edge(2, 3, dec!(3))],
        )
    }

    #[test]
    fn outgoing_edges_of_leaf_is_empty() {
        let graph = chain();
        assert!(graph.outgoing_edges(3).is_empty());
        assert!(graph.outgoing_edges(99).is_empty());
        assert_eq!(graph.outgoing_edges(1).len(), 1);
    }

    #[test]
    fn path_between_follows_edges() {
        let graph = chain();
        assert_eq!(graph.path_between(1, 3), Some(vec![1, 2, 3]));
        assert_eq!(graph.path_between(3, 1), None);
        assert_eq!(graph.path_between(2, 2), Some(vec![2]));
    }

    #[test]
    fn rejects_non_positive_rates() {
        let graph = chain();
        let err = graph.validate_new_edge(1, 3, dec!(0)).unwrap_err();
        assert!(matches!(err, BomError::MalformedEdge { .. }));

        let err = graph.validate_new_edge(1, 3, dec!(-0.5)).unwrap_err();
        assert!(matches!(err, BomError::MalformedEdge { .. }));
    }

    #[test]
    fn rejects_self_edges_and_unknown_products() {
        let graph = chain();
        assert!(matches!(
            graph.validate_new_edge(2, 2, dec!(1)),
            Err(BomError::MalformedEdge { .. })
        ));
        assert_eq!(
            graph.validate_new_edge(1, 42, dec!(1)),
            Err(BomError::ProductNotFound(42))
        );
    }

    #[test]
    fn rejects_edges_that_close_a_cycle() {
        let graph = chain();
        let err = graph.validate_new_edge(3, 1, dec!(1)).unwrap_err();
        assert_eq!(err, BomError::CycleDetected { path: vec![3, 1, 2, 3] });
    }

    #[test]
    fn accepts_rerating_and_shortcut_edges() {
        let graph = chain();
        assert!(graph.validate_new_edge(1, 2, dec!(4)).is_ok());
        assert!(graph.validate_new_edge(1, 3, dec!(1)).is_ok());
    }
}
