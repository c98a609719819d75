//! The filter engine: a language-agnostic tree of logical and field
//! predicates serialized as a nested JSON mapping (the "filter map"),
//! plus pruning, complexity analysis, and key-rewriting transforms.

pub mod adapter;
pub mod complexity;
mod keys;
pub mod map;
pub mod transform;

pub use adapter::{ExternalFilterAdapter, OperatorChain, OperatorHandler, OperatorInput};
pub use complexity::{
    calculate_complexity, check_complexity, CalculateComplexity, CheckComplexity, ComplexityLimits,
    ComplexityResult,
};
pub use map::{prune_map, to_map, FilterMap};
pub use transform::{
    capitalize, smart_pascal_case, transform, with_smart_pascal_case, Capitalize, KeyPath, KeyType,
    SmartPascalCase, Transform, TransformInput, TransformOutput,
};
