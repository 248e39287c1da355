use rust_decimal::Decimal;

use super::{BomError, ResolvedComponentNode};

/// Fills `total_cost` and `total_revenue` on every node of a resolved tree.
///
/// An assembled product costs the sum of its components and its own
/// `buy_price` is ignored; a leaf costs `buy_price * quantity`. Revenue never
/// rolls up: every node uses its own `sell_price * quantity`. No intermediate
/// rounding happens here.
pub fn annotate(node: &mut ResolvedComponentNode) -> Result<(), BomError> {
    for child in &mut node.components {
        annotate(child)?;
    }

    let id = node.id;
    let overflow = || BomError::Overflow(id);

    node.total_cost = if node.is_leaf() {
        node.buy_price.checked_mul(node.quantity).ok_or_else(overflow)?
    } else {
        node.components
            .iter()
            .try_fold(Decimal::ZERO, |acc, child| acc.checked_add(child.total_cost))
            .ok_or_else(overflow)?
    };
    node.total_revenue = node.sell_price.checked_mul(node.quantity).ok_or_else(overflow)?;

    Ok(())
}
