//! Complexity analyzer (C7): walks a filter map once to compute
//! structural metrics, and checks them against a configured limits
//! profile.

use serde_json::Value as JsonValue;

use super::keys::{is_operator_group, logical_kind, LogicalKind};
use super::map::FilterMap;
use crate::error::{RelayError, RelayResult};

/// Structural metrics for a filter map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComplexityResult {
    /// Relationship nesting; the root counts as 1.
    pub depth: u32,
    /// Number of terminal field predicates anywhere in the tree.
    pub total_fields: u32,
    /// Number of `And`/`Or`/`Not` occurrences anywhere in the tree.
    pub logical_operators: u32,
    /// Maximum nesting of logical operators (`And`/`Or`/`Not` only).
    pub logical_depth: u32,
    /// The largest number of children seen under any single `Or`.
    pub or_branches: u32,
}

#[derive(Default)]
struct Accumulator {
    depth_max: u32,
    total_fields: u32,
    logical_operators: u32,
    logical_depth_max: u32,
    or_branches_max: u32,
}

/// Computes [`ComplexityResult`] for `map` in a single walk.
pub fn calculate_complexity(map: &FilterMap) -> RelayResult<ComplexityResult> {
    let mut acc = Accumulator::default();
    walk(map, 1, 0, &mut acc)?;
    Ok(ComplexityResult {
        depth: acc.depth_max,
        total_fields: acc.total_fields,
        logical_operators: acc.logical_operators,
        logical_depth: acc.logical_depth_max,
        or_branches: acc.or_branches_max,
    })
}

/// Alias matching the spec's `CalculateComplexity` naming for callers
/// that prefer the PascalCase-style entry point name.
#[allow(non_snake_case)]
pub fn CalculateComplexity(map: &FilterMap) -> RelayResult<ComplexityResult> {
    calculate_complexity(map)
}

fn walk(map: &FilterMap, depth: u32, logical_depth: u32, acc: &mut Accumulator) -> RelayResult<()> {
    acc.depth_max = acc.depth_max.max(depth);

    for (key, value) in map {
        match logical_kind(key) {
            Some(LogicalKind::And) | Some(LogicalKind::Or) => {
                let is_or = logical_kind(key) == Some(LogicalKind::Or);
                acc.logical_operators += 1;
                let next_logical_depth = logical_depth + 1;
                acc.logical_depth_max = acc.logical_depth_max.max(next_logical_depth);

                let branches = value.as_array().ok_or_else(|| {
                    let err = RelayError::InternalInvariant(format!("{key} value must be a list"));
                    tracing::error!(error = %err, "structural assertion failed while walking filter map");
                    err
                })?;
                if is_or {
                    acc.or_branches_max = acc.or_branches_max.max(branches.len() as u32);
                }
                for branch in branches {
                    let sub = as_object(branch, key)?;
                    walk(sub, depth, next_logical_depth, acc)?;
                }
            }
            Some(LogicalKind::Not) => {
                acc.logical_operators += 1;
                let next_logical_depth = logical_depth + 1;
                acc.logical_depth_max = acc.logical_depth_max.max(next_logical_depth);
                let sub = as_object(value, key)?;
                walk(sub, depth, next_logical_depth, acc)?;
            }
            None => {
                let sub = as_object(value, key)?;
                if is_operator_group(sub) {
                    acc.total_fields += 1;
                } else {
                    walk(sub, depth + 1, logical_depth, acc)?;
                }
            }
        }
    }
    Ok(())
}

fn as_object<'a>(value: &'a JsonValue, key: &str) -> RelayResult<&'a FilterMap> {
    value.as_object().ok_or_else(|| {
        let err = RelayError::InternalInvariant(format!("{key} value must be a map"));
        tracing::error!(error = %err, "structural assertion failed while walking filter map");
        err
    })
}

/// Per-metric limits; zero means unlimited. `None` passed to
/// [`check_complexity`] disables checking entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComplexityLimits {
    pub max_depth: u32,
    pub max_total_fields: u32,
    pub max_logical_operators: u32,
    pub max_logical_depth: u32,
    pub max_or_branches: u32,
}

impl ComplexityLimits {
    pub const fn default_limits() -> Self {
        ComplexityLimits {
            max_depth: 5,
            max_total_fields: 50,
            max_logical_operators: 20,
            max_logical_depth: 5,
            max_or_branches: 10,
        }
    }

    pub const fn strict_limits() -> Self {
        ComplexityLimits {
            max_depth: 3,
            max_total_fields: 20,
            max_logical_operators: 8,
            max_logical_depth: 3,
            max_or_branches: 3,
        }
    }

    pub const fn relaxed_limits() -> Self {
        ComplexityLimits {
            max_depth: 10,
            max_total_fields: 200,
            max_logical_operators: 100,
            max_logical_depth: 10,
            max_or_branches: 50,
        }
    }
}

pub const DEFAULT_LIMITS: ComplexityLimits = ComplexityLimits::default_limits();
pub const STRICT_LIMITS: ComplexityLimits = ComplexityLimits::strict_limits();
pub const RELAXED_LIMITS: ComplexityLimits = ComplexityLimits::relaxed_limits();

fn check_one(value: u32, limit: u32, name: &str) -> RelayResult<()> {
    if limit != 0 && value > limit {
        let err = RelayError::ComplexityLimit(format!("{name} {value} exceeds limit {limit}"));
        tracing::warn!(metric = name, value, limit, "filter exceeded complexity limit");
        Err(err)
    } else {
        Ok(())
    }
}

/// Checks `result` against `limits`. `None` disables all checks.
pub fn check_complexity(result: &ComplexityResult, limits: Option<&ComplexityLimits>) -> RelayResult<()> {
    let Some(limits) = limits else {
        return Ok(());
    };
    check_one(result.depth, limits.max_depth, "depth")?;
    check_one(result.total_fields, limits.max_total_fields, "total fields")?;
    check_one(
        result.logical_operators,
        limits.max_logical_operators,
        "logical operators",
    )?;
    check_one(result.logical_depth, limits.max_logical_depth, "logical depth")?;
    check_one(result.or_branches, limits.max_or_branches, "Or branches")?;
    Ok(())
}

#[allow(non_snake_case)]
pub fn CheckComplexity(
    result: &ComplexityResult,
    limits: Option<&ComplexityLimits>,
) -> RelayResult<()> {
    check_complexity(result, limits)
}
