//! Outbound HTTP adapters: the transactional email provider and the hosted
//! image bucket.

mod resend;
mod storage;

pub use resend::{ResendConfig, ResendMailer};
pub use storage::{BucketConfig, DEFAULT_UPLOAD_TIMEOUT, HttpObjectStore};
