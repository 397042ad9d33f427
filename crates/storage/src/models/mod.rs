mod channel_credential;
mod completion;
mod day_template;
mod dispatch;
mod legacy_task;
mod organization;
mod project;
mod ranking;
mod subscription;
mod user;

pub use channel_credential::ChannelCredential;
pub use completion::{CompletionRecord, CompletionStatus};
pub use day_template::DayTemplate;
pub use dispatch::{
    DispatchLog, DispatchOutcome, DispatchTask, DispatchTaskStatus, NewDispatchLog,
};
pub use legacy_task::LegacyProjectTask;
pub use organization::Organization;
pub use project::{DEFAULT_TOTAL_DAYS, Project};
pub use ranking::RankingAggregate;
pub use subscription::{ActiveSubscriber, ProjectSubscription, SubscriberContext};
pub use user::User;
