use bytes::Bytes;
use dispatch_llm::{parse_stream_event, ByteStream, LLMError, StreamEvent};
use eventsource_stream::Eventsource;
use futures::{future, stream, StreamExt};

use crate::error::DispatchError;
use crate::sink::{LiveChannel, LiveEvent};

/// Finish reason reported when the live client went away mid-stream.
pub const CLIENT_CLOSED_REASON: &str = "client_closed";

const DEFAULT_FINISH_REASON: &str = "stop";

/// Appended to the body so an event left open at end of stream is dispatched.
const EVENT_TERMINATOR: &[u8] = b"\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Open,
    Reading,
    Done,
    Errored,
    ClientClosed,
}

impl StreamState {
    fn is_terminal(self) -> bool {
        matches!(
            self,
            StreamState::Done | StreamState::Errored | StreamState::ClientClosed
        )
    }
}

/// What a successfully aggregated stream produced.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamedAnswer {
    pub answer: String,
    pub finish_reason: String,
    /// `Done` or `ClientClosed`
    pub state: StreamState,
}

/// Consumes one streaming completion, forwarding every increment to `channel`.
pub struct StreamAggregator<'a> {
    channel: &'a dyn LiveChannel,
    detail: bool,
    state: StreamState,
    answer: String,
    finish_reason: Option<String>,
    error: Option<String>,
}

impl<'a> StreamAggregator<'a> {
    pub fn new(channel: &'a dyn LiveChannel, detail: bool) -> Self {
        Self {
            channel,
            detail,
            state: StreamState::Open,
            answer: String::new(),
            finish_reason: None,
            error: None,
        }
    }

    pub async fn run(mut self, body: ByteStream) -> Result<StreamedAnswer, DispatchError> {
        self.state = StreamState::Reading;

        let terminator = stream::once(future::ready(Ok::<_, LLMError>(Bytes::from_static(
            EVENT_TERMINATOR,
        ))));
        let mut events = body.chain(terminator).eventsource();

        while !self.state.is_terminal() {
            if self.channel.is_closed() {
                log::info!(
                    "Live channel closed, stopping stream after {} chars",
                    self.answer.len()
                );
                self.state = StreamState::ClientClosed;
                break;
            }

            match events.next().await {
                Some(Ok(event)) => self.handle_event(&event.data),
                Some(Err(e)) => {
                    log::warn!("Stream transport error, keeping partial answer: {}", e);
                    self.end();
                }
                None => self.end(),
            }
        }

        self.into_result()
    }

    /// A recorded error keeps the stream draining; the first one is reported.
    fn handle_event(&mut self, data: &str) {
        match parse_stream_event(data) {
            StreamEvent::Done => self.end(),
            StreamEvent::Error(message) => {
                log::error!("Provider reported a stream error: {}", message);
                if self.error.is_none() {
                    self.error = Some(message);
                }
            }
            StreamEvent::Delta {
                content,
                finish_reason,
            } => {
                if finish_reason.is_some() {
                    self.finish_reason = finish_reason;
                }
                self.channel.push(LiveEvent::answer(&content, self.detail));
                self.answer.push_str(&content);
            }
        }
    }

    fn end(&mut self) {
        self.state = if self.error.is_some() {
            StreamState::Errored
        } else {
            StreamState::Done
        };
    }

    fn into_result(self) -> Result<StreamedAnswer, DispatchError> {
        if let Some(error) = self.error {
            return Err(DispatchError::Upstream(error));
        }

        let finish_reason = match self.state {
            StreamState::ClientClosed => CLIENT_CLOSED_REASON.to_string(),
            _ => self
                .finish_reason
                .unwrap_or_else(|| DEFAULT_FINISH_REASON.to_string()),
        };

        Ok(StreamedAnswer {
            answer: self.answer,
            finish_reason,
            state: self.state,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Records every push; reports closed once `close_after` events were pushed.
    #[derive(Default)]
    struct RecordingChannel {
        events: Mutex<Vec<LiveEvent>>,
        close_after: Option<usize>,
    }

    impl RecordingChannel {
        fn closing_after(pushes: usize) -> Self {
            Self {
                close_after: Some(pushes),
                ..Default::default()
            }
        }

        fn increments(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.delta_text().unwrap_or_default())
                .collect()
        }
    }

    impl LiveChannel for RecordingChannel {
        fn push(&self, event: LiveEvent) {
            self.events.lock().unwrap().push(event);
        }

        fn is_closed(&self) -> bool {
            match self.close_after {
                Some(limit) => self.events.lock().unwrap().len() >= limit,
                None => false,
            }
        }
    }

    fn delta(text: &str) -> String {
        format!(
            "data: {{\"choices\":[{{\"delta\":{{\"content\":{}}},\"finish_reason\":null}}]}}\n\n",
            serde_json::to_string(text).unwrap()
        )
    }

    fn chunks(parts: &[&str]) -> ByteStream {
        let items: Vec<dispatch_llm::Result<Bytes>> = parts
            .iter()
            .map(|p| Ok(Bytes::from(p.to_string())))
            .collect();
        Box::pin(stream::iter(items))
    }

    #[tokio::test]
    async fn forwards_each_increment_and_concatenates() {
        let channel = RecordingChannel::default();
        let first = delta("Hel");
        let second = format!("{}data: [DONE]\n\n", delta("lo"));

        let result = StreamAggregator::new(&channel, false)
            .run(chunks(&[&first, &second]))
            .await
            .unwrap();

        assert_eq!(result.answer, "Hello");
        assert_eq!(result.state, StreamState::Done);
        assert_eq!(result.finish_reason, "stop");
        assert_eq!(channel.increments(), vec!["Hel", "lo"]);
    }

    #[tokio::test]
    async fn answer_is_invariant_under_chunk_boundaries() {
        let body = format!(
            "{}: keep-alive\n\n{}{}data: [DONE]\n\n",
            delta("你好"),
            delta(", wor"),
            delta("ld")
        );
        let bytes = body.as_bytes();

        for split in 0..=bytes.len() {
            let channel = RecordingChannel::default();
            let items: Vec<dispatch_llm::Result<Bytes>> = vec![
                Ok(Bytes::copy_from_slice(&bytes[..split])),
                Ok(Bytes::copy_from_slice(&bytes[split..])),
            ];

            let result = StreamAggregator::new(&channel, false)
                .run(Box::pin(stream::iter(items)))
                .await
                .unwrap();

            assert_eq!(result.answer, "你好, world", "split at {split}");
            assert_eq!(channel.increments().concat(), result.answer);
        }
    }

    #[tokio::test]
    async fn done_stops_forwarding() {
        let channel = RecordingChannel::default();
        let body = format!("{}data: [DONE]\n\n{}", delta("a"), delta("ignored"));

        let result = StreamAggregator::new(&channel, false)
            .run(chunks(&[&body, &delta("also ignored")]))
            .await
            .unwrap();

        assert_eq!(result.answer, "a");
        assert_eq!(channel.increments(), vec!["a"]);
    }

    #[tokio::test]
    async fn empty_deltas_are_still_forwarded() {
        let channel = RecordingChannel::default();
        let role_only = "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n";

        let result = StreamAggregator::new(&channel, false)
            .run(chunks(&[role_only, &delta("x")]))
            .await
            .unwrap();

        assert_eq!(result.answer, "x");
        assert_eq!(channel.increments(), vec!["", "x"]);
    }

    #[tokio::test]
    async fn error_event_rejects_despite_partial_text() {
        let channel = RecordingChannel::default();
        let error = "data: {\"error\":{\"message\":\"quota exceeded\"}}\n\n";
        let second = "data: {\"error\":\"second\"}\n\n";
        let body = format!("{}{}{}", delta("partial"), error, delta("tail"));

        let err = StreamAggregator::new(&channel, false)
            .run(chunks(&[&body, second, &delta("drained")]))
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Upstream(ref m) if m == "quota exceeded"));
        assert_eq!(channel.increments(), vec!["partial", "tail", "drained"]);
    }

    #[tokio::test]
    async fn lone_carriage_return_separates_events() {
        let channel = RecordingChannel::default();
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\r\r\
                    data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\r\r";

        let result = StreamAggregator::new(&channel, false)
            .run(chunks(&[body]))
            .await
            .unwrap();

        assert_eq!(result.answer, "ab");
        assert_eq!(channel.increments(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn byte_by_byte_delivery_matches_whole_body() {
        let body = format!(
            "{}\r\n: ping\r\n\r\n{}data: [DONE]\n\n",
            delta("你好").trim_end(),
            delta("世界")
        );
        let channel = RecordingChannel::default();
        let items: Vec<dispatch_llm::Result<Bytes>> = body
            .as_bytes()
            .iter()
            .map(|byte| Ok(Bytes::copy_from_slice(std::slice::from_ref(byte))))
            .collect();

        let result = StreamAggregator::new(&channel, false)
            .run(Box::pin(stream::iter(items)))
            .await
            .unwrap();

        assert_eq!(result.answer, "你好世界");
        assert_eq!(channel.increments(), vec!["你好", "世界"]);
    }

    #[tokio::test]
    async fn transport_error_keeps_partial_answer() {
        let channel = RecordingChannel::default();
        let items: Vec<dispatch_llm::Result<Bytes>> = vec![
            Ok(Bytes::from(delta("most of it"))),
            Err(LLMError::Stream("connection reset".to_string())),
            Ok(Bytes::from(delta("unreachable"))),
        ];

        let result = StreamAggregator::new(&channel, false)
            .run(Box::pin(stream::iter(items)))
            .await
            .unwrap();

        assert_eq!(result.answer, "most of it");
        assert_eq!(result.state, StreamState::Done);
    }

    #[tokio::test]
    async fn closed_channel_returns_partial_answer() {
        let channel = RecordingChannel::closing_after(1);

        let result = StreamAggregator::new(&channel, false)
            .run(chunks(&[&delta("first"), &delta("second"), &delta("third")]))
            .await
            .unwrap();

        assert_eq!(result.answer, "first");
        assert_eq!(result.state, StreamState::ClientClosed);
        assert_eq!(result.finish_reason, CLIENT_CLOSED_REASON);
        assert_eq!(channel.increments(), vec!["first"]);
    }

    #[tokio::test]
    async fn unterminated_final_event_is_flushed() {
        let channel = RecordingChannel::default();
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"end\"},\"finish_reason\":\"length\"}]}";

        let result = StreamAggregator::new(&channel, true)
            .run(chunks(&[body]))
            .await
            .unwrap();

        assert_eq!(result.answer, "end");
        assert_eq!(result.finish_reason, "length");
        let events = channel.events.lock().unwrap();
        assert_eq!(events[0].event.as_deref(), Some("answer"));
    }
}
