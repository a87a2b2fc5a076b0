//! Run event streaming: the [`RunBackend`] service interface, the [`RunActivity`] state it
//! feeds, and the [`StreamConsumer`] / [`Subscription`] that bridge the two.

mod activity;
mod backend;
mod consumer;
mod http;
mod mock;

pub use activity::RunActivity;
pub use backend::{EventStream, RunBackend};
pub use consumer::{StreamConsumer, StreamEnd, Subscription, SubscriptionHandle};
pub use http::HttpRunBackend;
pub use mock::{FeedSender, MockRunBackend};
