//! Application layer containing the business logic orchestration.
//!
//! Engines own boxed store ports and run each mutating request inside a single
//! unit of work. Authorization decisions live in [`guard`] and never touch a store.

pub mod deposit;
pub mod guard;
pub mod identity;
pub mod payment;
pub mod queries;
pub mod reports;
