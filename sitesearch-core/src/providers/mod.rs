//! Provider adapters.
//!
//! Each module maps a [`crate::provider::ProviderQuery`] to the provider's
//! request parameters and its JSON payload to a
//! [`crate::provider::ProviderResponse`], implementing
//! [`crate::provider::ResponseAdapter`].

pub mod local_index;
pub mod web_api;

pub use local_index::LocalIndexAdapter;
pub use web_api::WebApiAdapter;
