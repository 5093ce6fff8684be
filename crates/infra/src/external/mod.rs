//! External service clients/adapters.

pub mod sms;

pub use sms::{LogSmsSender, RecordingSmsSender, SentSms, SmsError, SmsSender, TwilioOptions, TwilioSmsSender};
