//! Subscriber module for HNTLDR.
//!
//! Newsletter subscriptions move between `active` and `inactive`; rows are
//! never deleted so an address keeps its unsubscribe ID.

mod captcha;
mod repository;
mod types;

pub use captcha::{CaptchaVerifier, DisabledCaptcha, TurnstileVerifier};
pub use repository::SubscriberRepository;
pub use types::{normalize_email, SubscribeOutcome, Subscriber, SubscriberStatus};
