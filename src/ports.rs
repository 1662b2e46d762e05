pub mod push;
pub mod sms;
pub mod time;

pub use push::PushSender;
pub use sms::SmsSender;
pub use time::TimeProvider;
