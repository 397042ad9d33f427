pub mod completion;
pub mod dispatch;
pub mod project;
pub mod ranking;
pub mod subscriber;
pub mod template;
