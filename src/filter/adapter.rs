//! External-adapter shim (C9): the contract an external schema adapter
//! (e.g. a protobuf or GraphQL input-object mapper) is expected to
//! satisfy when producing a [`FilterMap`], plus a composable
//! operator-handler chain for per-`(FilterName, OperatorName)` value
//! coercions (timestamp wrappers to absolute time, enum symbols to
//! canonical strings, and the like).
//!
//! The shim itself never inspects schema objects; it only defines the
//! handler-chain shape adapters compose their own coercions against.

use serde_json::Value as JsonValue;

use crate::error::RelayResult;

/// One value to be coerced: the field it belongs to, the operator it's
/// keyed under, and the raw value an adapter extracted from the
/// foreign schema object.
#[derive(Debug, Clone)]
pub struct OperatorInput {
    pub filter_name: String,
    pub operator_name: String,
    pub value: JsonValue,
}

/// A single coercion step. Implementations call `next` to continue the
/// chain, or return their own value to short-circuit it.
pub trait OperatorHandler: Send + Sync {
    fn handle(&self, input: OperatorInput, next: &dyn Fn(OperatorInput) -> RelayResult<JsonValue>) -> RelayResult<JsonValue>;
}

impl<F> OperatorHandler for F
where
    F: Fn(OperatorInput, &dyn Fn(OperatorInput) -> RelayResult<JsonValue>) -> RelayResult<JsonValue> + Send + Sync,
{
    fn handle(&self, input: OperatorInput, next: &dyn Fn(OperatorInput) -> RelayResult<JsonValue>) -> RelayResult<JsonValue> {
        self(input, next)
    }
}

/// A chain of [`OperatorHandler`]s, applied outermost-first. The
/// terminal handler (the chain's tail) receives the value unchanged if
/// no handler short-circuits.
pub struct OperatorChain {
    handlers: Vec<Box<dyn OperatorHandler>>,
}

impl OperatorChain {
    pub fn new() -> Self {
        OperatorChain { handlers: Vec::new() }
    }

    pub fn with(mut self, handler: impl OperatorHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Runs `input` through every registered handler in order, each
    /// wrapping the next, terminating in an identity pass-through.
    pub fn apply(&self, input: OperatorInput) -> RelayResult<JsonValue> {
        fn run(handlers: &[Box<dyn OperatorHandler>], input: OperatorInput) -> RelayResult<JsonValue> {
            match handlers.split_first() {
                Some((head, rest)) => {
                    let next = move |input: OperatorInput| run(rest, input);
                    head.handle(input, &next)
                }
                None => Ok(input.value),
            }
        }
        run(&self.handlers, input)
    }
}

impl Default for OperatorChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Contract an external adapter implements: take a typed filter value
/// native to the foreign schema and produce a pruned [`FilterMap`]
/// whose keys match the domain field/operator vocabulary.
pub trait ExternalFilterAdapter<In> {
    fn adapt(&self, input: In) -> RelayResult<super::map::FilterMap>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_chain_is_identity() {
        let chain = OperatorChain::new();
        let input = OperatorInput {
            filter_name: "CreatedAt".into(),
            operator_name: "Eq".into(),
            value: json!("2026-01-01T00:00:00Z"),
        };
        let out = chain.apply(input).unwrap();
        assert_eq!(out, json!("2026-01-01T00:00:00Z"));
    }

    #[test]
    fn handler_can_coerce_and_call_next() {
        let chain = OperatorChain::new().with(
            |input: OperatorInput, next: &dyn Fn(OperatorInput) -> RelayResult<JsonValue>| {
                if input.operator_name == "Eq" && input.value.is_string() {
                    let upper = input.value.as_str().unwrap().to_uppercase();
                    next(OperatorInput {
                        value: json!(upper),
                        ..input
                    })
                } else {
                    next(input)
                }
            },
        );
        let input = OperatorInput {
            filter_name: "Status".into(),
            operator_name: "Eq".into(),
            value: json!("active"),
        };
        let out = chain.apply(input).unwrap();
        assert_eq!(out, json!("ACTIVE"));
    }

    #[test]
    fn handler_can_short_circuit_without_calling_next() {
        let chain = OperatorChain::new().with(
            |_input: OperatorInput, _next: &dyn Fn(OperatorInput) -> RelayResult<JsonValue>| {
                Ok(json!(null))
            },
        );
        let input = OperatorInput {
            filter_name: "Status".into(),
            operator_name: "Eq".into(),
            value: json!("active"),
        };
        let out = chain.apply(input).unwrap();
        assert!(out.is_null());
    }

    #[test]
    fn handlers_compose_outermost_first() {
        let chain = OperatorChain::new()
            .with(
                |input: OperatorInput, next: &dyn Fn(OperatorInput) -> RelayResult<JsonValue>| {
                    let v = next(input)?;
                    Ok(json!(format!("[{}]", v.as_str().unwrap())))
                },
            )
            .with(
                |input: OperatorInput, next: &dyn Fn(OperatorInput) -> RelayResult<JsonValue>| {
                    next(OperatorInput {
                        value: json!(format!("<{}>", input.value.as_str().unwrap())),
                        ..input
                    })
                },
            );
        let input = OperatorInput {
            filter_name: "Name".into(),
            operator_name: "Eq".into(),
            value: json!("x"),
        };
        let out = chain.apply(input).unwrap();
        assert_eq!(out, json!("[<x>]"));
    }
}
