//! # Storage backend contracts
//!
//! This module defines the behaviour a database backend must expose in order to serve the storefront engine. The
//! public APIs in [`crate::sf_api`] are generic over these traits, so a backend only needs to implement the traits
//! for the APIs it is going to serve.
//!
//! * [`OrderManagement`] stores and queries orders.
//! * [`MembershipManagement`] stores memberships and the subscriptions users hold to them.
//! * [`PageManagement`] stores membership-only content pages.
//! * [`FunnelManagement`] stores marketing funnels.
//! * [`CourseManagement`] stores courses and per-user course progress.
//! * [`ProductManagement`] stores the product catalogue.
//! * [`StorefrontDatabase`] ties all of the above together.
mod course_management;
mod funnel_management;
mod membership_management;
mod order_management;
mod page_management;
mod product_management;
mod storefront_database;

pub use course_management::CourseManagement;
pub use funnel_management::FunnelManagement;
pub use membership_management::MembershipManagement;
pub use order_management::OrderManagement;
pub use page_management::PageManagement;
pub use product_management::ProductManagement;
pub use storefront_database::{StoreError, StorefrontDatabase};
