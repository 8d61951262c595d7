pub mod dispatcher;
pub mod email;
pub mod notifier;
pub mod sms;
pub mod trigger;

pub use dispatcher::*;
pub use email::*;
pub use notifier::*;
pub use sms::*;
pub use trigger::*;
