pub mod webhook_signature;

pub use webhook_signature::{signature_header, verify_signature, SignatureError, DEFAULT_TOLERANCE};
