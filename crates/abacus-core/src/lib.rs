//! Core types and the unlock / feature-access engine for Abacus.
//!
//! Everything in here is pure logic over immutable inputs, apart from the
//! [`policy::PolicyCache`], which holds the one asynchronously loaded piece of
//! state (the tier-feature table). This crate is free of HTTP and database
//! dependencies; storage backends implement [`store::LearningStore`].

pub mod badge;
pub mod category;
pub mod child;
pub mod delta;
pub mod error;
pub mod feature;
pub mod level;
pub mod policy;
pub mod present;
pub mod store;
pub mod subscription;
pub mod tier;
pub mod unlock;

pub use error::{Error, Result};
