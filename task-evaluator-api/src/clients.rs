//! Outbound HTTP clients for the model and payment APIs.

pub mod model;
pub mod stripe;

pub use model::{ModelClient, ModelError, ResponsesClient};
pub use stripe::{CheckoutError, CheckoutGateway, CheckoutSession, CheckoutSessionRequest, StripeClient};
