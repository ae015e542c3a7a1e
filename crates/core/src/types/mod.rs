//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod grade;
pub mod id;
pub mod money;
pub mod username;

pub use address::{Address, Orderer, Receiver, ShippingInfo};
pub use grade::MemberGrade;
pub use id::*;
pub use money::Money;
pub use username::{Username, UsernameError};
