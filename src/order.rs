//! Ordering keys and the primary-order injector (C5).

/// A single ordering key: field name plus direction.
///
/// Equality for the purpose of "is this field already ordered on" is by
/// `field` alone — a request that already sorts by `ID` ascending still
/// counts as "has ID" even if a primary ordering wants `ID` descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub field: String,
    pub desc: bool,
}

impl Order {
    pub fn asc(field: impl Into<String>) -> Self {
        Order {
            field: field.into(),
            desc: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Order {
            field: field.into(),
            desc: true,
        }
    }
}

/// Appends configured tie-break orderings to a request's `OrderBy`,
/// guaranteeing a total order for keyset cursor correctness.
///
/// Orderings already present (by field name) are left untouched and not
/// duplicated; the injector only appends what's missing, preserving the
/// caller's original ordering and direction for shared fields.
#[derive(Debug, Clone, Default)]
pub struct PrimaryOrderInjector {
    primary: Vec<Order>,
}

impl PrimaryOrderInjector {
    pub fn new(primary: Vec<Order>) -> Self {
        PrimaryOrderInjector { primary }
    }

    /// Returns `order_by` with any missing primary orderings appended.
    pub fn inject(&self, order_by: &[Order]) -> Vec<Order> {
        let mut result = order_by.to_vec();
        for candidate in &self.primary {
            if !result.iter().any(|o| o.field == candidate.field) {
                result.push(candidate.clone());
            }
        }
        result
    }
}
