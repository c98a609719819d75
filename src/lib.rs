//! Cursor-based Relay Connections pagination, plus a storage-agnostic
//! filter-tree engine for building the `filter` argument those
//! connections accept.
//!
//! The pagination side is a small middleware stack: a [`pagination::Dispatcher`]
//! normalizes `(first, last, after, before)` into an [`pagination::ApplyCursorsRequest`]
//! and hands it to a composed [`pagination::PageSource`] chain — an optional
//! [`cursor::Base64Codec`] or [`cursor::GcmCodec`] wrapping a [`keyset::KeysetAdapter`]
//! or [`offset::OffsetAdapter`], which in turn calls into caller-supplied
//! [`keyset::KeysetFinder`]/[`offset::OffsetFinder`] storage code.
//!
//! The filter side walks a nested JSON mapping (a [`filter::FilterMap`]),
//! with [`filter::prune_map`] for cleanup, [`filter::CalculateComplexity`]/
//! [`filter::CheckComplexity`] for abuse limits, and [`filter::Transform`]
//! for key rewriting (e.g. [`filter::SmartPascalCase`]).
//!
//! Neither side performs I/O itself; storage access is entirely the
//! caller's [`keyset::KeysetFinder`]/[`offset::OffsetFinder`] implementation.

pub mod cursor;
pub mod error;
pub mod filter;
pub mod keyset;
pub mod node;
pub mod offset;
pub mod order;
pub mod pagination;

pub use error::{RelayError, RelayErrorKind, RelayResult};
pub use node::Node;
pub use order::{Order, PrimaryOrderInjector};
pub use pagination::{
    CancellationToken, Connection, ConnectionArgs, Dispatcher, MaterializedEdge, NeverCancelled,
    PageInfo, PageSource, RequestContext, SkipFlags,
};
