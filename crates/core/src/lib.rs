//! Bazaar Core - domain types and rules.
//!
//! This crate holds the pieces of the shop that do not touch I/O:
//! - `api` - HTTP service that persists and exposes these types
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types, aggregates and pure functions - no
//! database access, no HTTP. Aggregates mutate in place and hand back the
//! domain events their mutation produced; callers decide where events go.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, usernames, grades and addresses
//! - [`catalog`] - Products and categories
//! - [`member`] - Members and their orderer reference
//! - [`cart`] - Cart line quantity rules
//! - [`coupon`] - Per-member coupon instances and discount shapes
//! - [`order`] - Order aggregate, order lines and the order state machine
//! - [`discount`] - Payment calculation from lines, grade and coupons

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod coupon;
pub mod discount;
pub mod member;
pub mod order;
pub mod types;

pub use types::*;
