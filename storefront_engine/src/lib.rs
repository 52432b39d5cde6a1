//! Storefront Engine
//!
//! The storefront engine holds the business logic of the shop back office: orders and their lifecycle, sales funnels
//! with optional countdown windows, memberships and the pages they unlock, and online courses. It does not know how
//! it is served or which payment gateways are in use.
//!
//! The library is divided into three main sections:
//! 1. Storage ([`traits`] and the SQLite backend, [`SqliteDatabase`]). You should never need to touch the database
//!    directly. Use the public API instead. The exception is the data types stored in the database, which are defined
//!    in [`db_types`] and are public.
//! 2. The public API ([`mod@sf_api`]): [`OrderApi`], [`FunnelApi`], [`MembershipApi`], [`CourseApi`], [`ProductApi`]
//!    and [`CheckoutApi`].
//! 3. Payment processing ([`processors`]). Gateways implement [`processors::PaymentProcessor`] and are looked up
//!    through a [`processors::ProcessorRegistry`].
//!
//! The engine also emits events when orders are created, paid, change status or are refunded, and when a
//! subscription is activated. See [`events`] for how to hook into them.
pub mod cache;
pub mod countdown;
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod processors;
pub mod sf_api;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use sf_api::{
    checkout_objects,
    errors::{CheckoutError, CourseError, FunnelAction, FunnelError, MembershipError, OrderError, ProductError},
    order_objects,
    CheckoutApi,
    CourseApi,
    FunnelApi,
    MembershipApi,
    OrderApi,
    ProductApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    CourseManagement,
    FunnelManagement,
    MembershipManagement,
    OrderManagement,
    PageManagement,
    ProductManagement,
    StoreError,
    StorefrontDatabase,
};
