//! The storefront engine's public API.
//!
//! Each API is generic over a storage backend `B`, which must implement the relevant traits from [`crate::traits`].
//! The APIs are cheap to clone whenever the backend is, so a server can hand a copy to every worker.
mod checkout_api;
mod course_api;
mod funnel_api;
mod membership_api;
mod order_api;
mod product_api;

pub mod checkout_objects;
pub mod errors;
pub mod order_objects;

pub use checkout_api::CheckoutApi;
pub use course_api::{score_quiz, CourseApi, ProgressSummary, QuizResult};
pub use funnel_api::FunnelApi;
pub use membership_api::MembershipApi;
pub use order_api::OrderApi;
pub use product_api::ProductApi;
