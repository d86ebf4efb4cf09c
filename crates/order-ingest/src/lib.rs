//! # Order Ingest Library
//!
//! The order domain on top of [`ingest_framework`]: the [`Order`](model::Order) payload, its
//! storage contract, the deduplicating [`OrderService`](service::OrderService), the read API
//! and the [`OrderSystem`](lifecycle::OrderSystem) that wires them together.
//!
//! Exposed as a library so integration tests can drive each layer directly.

pub mod api;
pub mod config;
pub mod generator;
pub mod lifecycle;
pub mod model;
pub mod service;
pub mod storage;
