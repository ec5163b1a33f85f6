//! Notification Module
//!
//! Push fan-out decision logic and the delivery client. The decision of
//! *who* gets a push lives in [`dispatcher`]; the wire delivery lives in
//! [`push`].

pub mod dispatcher;
pub mod push;

pub use dispatcher::dispatch_message_push;
pub use push::PushClient;
