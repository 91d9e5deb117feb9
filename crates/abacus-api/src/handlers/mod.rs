//! Route handlers, one module per resource.

pub mod categories;
pub mod children;
pub mod features;
pub mod policy;
pub mod subscriptions;
pub mod unlocks;
