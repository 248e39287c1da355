use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use super::{cost_tree, BomError, ComponentGraph, ResolvedComponentNode};
use crate::models::order::OrderLine;

#[derive(Debug, Clone, Serialize)]
pub struct LineValuation {
    pub product_id: i64,
    pub product_name: Option<String>,
    pub quantity: i32,
    pub cost: Decimal,
    pub revenue: Decimal,
    pub profit: Decimal,
    /// False when the product could not be resolved and the line was zeroed.
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub tree: Option<ResolvedComponentNode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderValuation {
    pub order_id: i64,
    pub lines: Vec<LineValuation>,
    pub total_cost: Decimal,
    pub total_revenue: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdownRow {
    pub component_id: i64,
    pub name: String,
    pub unit_cost: Decimal,
    pub quantity: Decimal,
    pub total_cost: Decimal,
}

/// Values every line of an order against one graph snapshot.
///
/// A line that cannot be costed (stale product, bad graph) stays in the result
/// with zero financials instead of failing the whole order. Only totals that
/// no longer fit in a `Decimal` fail, with [`BomError::TotalsOverflow`].
pub fn value_order_lines(
    graph: &ComponentGraph,
    order_id: i64,
    lines: &[OrderLine],
    max_depth: usize,
) -> Result<OrderValuation, BomError> {
    let lines: Vec<LineValuation> = lines
        .iter()
        .map(|line| value_line(graph, line, max_depth))
        .collect();

    let overflow = || BomError::TotalsOverflow(order_id);
    let sum = |field: fn(&LineValuation) -> Decimal| {
        lines
            .iter()
            .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(field(line)))
            .ok_or_else(overflow)
    };

    let total_cost = sum(|l| l.cost)?;
    let total_revenue = sum(|l| l.revenue)?;
    let profit = total_revenue.checked_sub(total_cost).ok_or_else(overflow)?;

    Ok(OrderValuation {
        order_id,
        lines,
        total_cost,
        total_revenue,
        profit,
    })
}

fn value_line(graph: &ComponentGraph, line: &OrderLine, max_depth: usize) -> LineValuation {
    let product_name = graph.product(line.product_id).map(|p| p.name.clone());

    match cost_tree(graph, line.product_id, Decimal::from(line.quantity), max_depth) {
        Ok(tree) => LineValuation {
            product_id: line.product_id,
            product_name,
            quantity: line.quantity,
            cost: tree.total_cost,
            revenue: tree.total_revenue,
            profit: tree.total_revenue - tree.total_cost,
            resolved: true,
            error: None,
            tree: Some(tree),
        },
        Err(e) => {
            warn!(order_id = line.order_id, product_id = line.product_id, error = %e, "Order line valued at zero");
            LineValuation {
                product_id: line.product_id,
                product_name,
                quantity: line.quantity,
                cost: Decimal::ZERO,
                revenue: Decimal::ZERO,
                profit: Decimal::ZERO,
                resolved: false,
                error: Some(e.to_string()),
                tree: None,
            }
        }
    }
}

/// Flattens every line's tree into its leaf components, merged by product and
/// sorted by descending total cost.
pub fn flatten_cost_breakdown(valuation: &OrderValuation) -> Result<Vec<CostBreakdownRow>, BomError> {
    let mut rows: BTreeMap<i64, CostBreakdownRow> = BTreeMap::new();

    let mut stack: Vec<&ResolvedComponentNode> = valuation
        .lines
        .iter()
        .filter_map(|line| line.tree.as_ref())
        .collect();

    while let Some(node) = stack.pop() {
        if !node.is_leaf() {
            stack.extend(node.components.iter());
            continue;
        }

        let row = rows.entry(node.id).or_insert_with(|| CostBreakdownRow {
            component_id: node.id,
            name: node.name.clone(),
            unit_cost: node.buy_price,
            quantity: Decimal::ZERO,
            total_cost: Decimal::ZERO,
        });
        row.quantity = row
            .quantity
            .checked_add(node.quantity)
            .ok_or(BomError::Overflow(node.id))?;
        row.total_cost = row
            .total_cost
            .checked_add(node.total_cost)
            .ok_or(BomError::Overflow(node.id))?;
    }

    let mut rows: Vec<CostBreakdownRow> = rows.into_values().collect();
    rows.sort_by(|a, b| {
        b.total_cost
            .cmp(&a.total_cost)
            .then_with(|| a.component_id.cmp(&b.component_id))
    });
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bom::graph::fixtures::{edge, product};
    use rust_decimal_macros::dec;

    fn workshop() -> ComponentGraph {
        ComponentGraph::new(
            vec![
                product(1, "Wooden Chair", dec!(59.99), dec!(35.00)),
                product(2, "Wood Plank", dec!(4.50), dec!(2.99)),
                product(3, "Wood Screws", dec!(5.99), dec!(3.49)),
                product(4, "Wood Glue", dec!(7.99), dec!(4.99)),
                product(5, "Bookshelf", dec!(129.00), dec!(0)),
            ],
            vec![
                edge(1, 2, dec!(0.25)),
                edge(1, 3, dec!(0.0625)),
                edge(1, 4, dec!(0.01)),
                edge(5, 2, dec!(3)),
                edge(5, 3, dec!(0.125)),
            ],
        )
    }

    fn line(product_id: i64, quantity: i32) -> OrderLine {
        OrderLine { order_id: 10, product_id, quantity }
    }

    #[test]
    fn single_line_order_matches_chair_example() {
        let valuation = value_order_lines(&workshop(), 10, &[line(1, 2)], 16).unwrap();

        assert_eq!(valuation.total_cost, dec!(2.03085));
        assert_eq!(valuation.total_revenue, dec!(119.98));
        assert_eq!(valuation.profit, dec!(117.94915));
        assert_eq!(valuation.lines[0].product_name.as_deref(), Some("Wooden Chair"));
    }

    #[test]
    fn order_totals_equal_sum_of_independent_lines() {
        let graph = workshop();
        let lines = [line(1, 2), line(5, 1), line(4, 7)];
        let valuation = value_order_lines(&graph, 10, &lines, 16).unwrap();

        let mut expected_cost = Decimal::ZERO;
        let mut expected_revenue = Decimal::ZERO;
        for l in &lines {
            let tree = cost_tree(&graph, l.product_id, Decimal::from(l.quantity), 16).unwrap();
            expected_cost += tree.total_cost;
            expected_revenue += tree.total_revenue;
        }

        assert_eq!(valuation.total_cost, expected_cost);
        assert_eq!(valuation.total_revenue, expected_revenue);
        assert_eq!(valuation.profit, expected_revenue - expected_cost);
    }

    #[test]
    fn missing_product_yields_zero_line() {
        let valuation = value_order_lines(&workshop(), 10, &[line(1, 1), line(404, 3)], 16).unwrap();

        let stale = &valuation.lines[1];
        assert!(!stale.resolved);
        assert_eq!(stale.cost, Decimal::ZERO);
        assert_eq!(stale.revenue, Decimal::ZERO);
        assert!(stale.product_name.is_none());
        assert!(stale.error.is_some());
        assert_eq!(valuation.total_cost, dec!(1.015425));
        assert_eq!(valuation.total_revenue, dec!(59.99));
    }

    #[test]
    fn empty_order_values_to_zero() {
        let valuation = value_order_lines(&workshop(), 10, &[], 16).unwrap();
        assert!(valuation.lines.is_empty());
        assert_eq!(valuation.total_cost, Decimal::ZERO);
        assert_eq!(valuation.profit, Decimal::ZERO);
    }

    #[test]
    fn breakdown_merges_shared_leaves_across_lines() {
        let valuation = value_order_lines(&workshop(), 10, &[line(1, 2), line(5, 1)], 16).unwrap();
        let rows = flatten_cost_breakdown(&valuation).unwrap();

        assert_eq!(rows.len(), 3);
        let plank = rows.iter().find(|r| r.name == "Wood Plank").unwrap();
        assert_eq!(plank.quantity, dec!(3.5));
        assert_eq!(plank.unit_cost, dec!(2.99));
        assert_eq!(plank.total_cost, dec!(10.465));

        let screws = rows.iter().find(|r| r.component_id == 3).unwrap();
        assert_eq!(screws.quantity, dec!(0.25));
    }

    #[test]
    fn breakdown_is_sorted_by_descending_cost() {
        let valuation = value_order_lines(&workshop(), 10, &[line(1, 2), line(5, 1), line(4, 1)], 16).unwrap();
        let rows = flatten_cost_breakdown(&valuation).unwrap();

        assert!(rows.windows(2).all(|w| w[0].total_cost >= w[1].total_cost));
        assert_eq!(rows[0].name, "Wood Plank");
    }

    #[test]
    fn breakdown_total_matches_order_cost() {
        let valuation = value_order_lines(&workshop(), 10, &[line(1, 3), line(5, 2), line(404, 1)], 16).unwrap();
        let rows = flatten_cost_breakdown(&valuation).unwrap();

        let sum: Decimal = rows.iter().map(|r| r.total_cost).sum();
        assert_eq!(sum, valuation.total_cost);
    }

    // Two assemblies sharing a sub-assembly at the largest storable rate, over
    // a leaf at the largest storable price. Each line fits; their sum does not.
    fn extreme_graph() -> ComponentGraph {
        let rate = dec!(99999999.999999);
        ComponentGraph::new(
            vec![
                product(1, "Press", dec!(0), dec!(0)),
                product(2, "Frame", dec!(0), dec!(0)),
                product(3, "Alloy", dec!(0), dec!(9999999999.99)),
                product(4, "Crane", dec!(0), dec!(0)),
            ],
            vec![edge(1, 2, rate), edge(4, 2, rate), edge(2, 3, rate)],
        )
    }

    #[test]
    fn order_totals_overflow_is_an_error() {
        let graph = extreme_graph();
        assert!(cost_tree(&graph, 1, dec!(450), 16).is_ok());

        let err = value_order_lines(&graph, 10, &[line(1, 450), line(4, 450)], 16).unwrap_err();
        assert_eq!(err, BomError::TotalsOverflow(10));
    }

    #[test]
    fn breakdown_overflow_is_an_error() {
        let graph = extreme_graph();
        let lines = [line(1, 450), line(4, 450)];
        let valued: Vec<LineValuation> = lines.iter().map(|l| value_line(&graph, l, 16)).collect();
        assert!(valued.iter().all(|l| l.resolved));

        let valuation = OrderValuation {
            order_id: 10,
            lines: valued,
            total_cost: Decimal::ZERO,
            total_revenue: Decimal::ZERO,
            profit: Decimal::ZERO,
        };
        assert_eq!(flatten_cost_breakdown(&valuation), Err(BomError::Overflow(3)));
    }
}
