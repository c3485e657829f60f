#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

/// Tile compositing: the per-request orchestrator and its codec pipeline.
pub mod compose;
/// Tileset metadata: model, row parser, merger and JSON serializer.
pub mod metadata;
/// Request path decoding.
pub mod request;
/// The [`TileStore`](store::TileStore) seam and the tileset registry.
pub mod store;
