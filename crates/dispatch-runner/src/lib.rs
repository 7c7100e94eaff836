pub mod config;
pub mod dispatcher;
pub mod error;
pub mod invoker;
pub mod moderation;
pub mod sink;
pub mod stream;

pub use config::DispatcherConfig;
pub use dispatcher::{ChatDispatcher, DispatchRequest, DispatchResponse};
pub use error::DispatchError;
pub use invoker::{build_completion_request, normalize_temperature, CompletionInvoker};
pub use moderation::{KeywordEntry, KeywordModerator, MatchType, ModerationRejected, Moderator};
pub use sink::{ChannelSink, LiveChannel, LiveEvent, NullChannel};
pub use stream::{StreamAggregator, StreamState, StreamedAnswer};
