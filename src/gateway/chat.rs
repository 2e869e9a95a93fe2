//! Chat service
//!
//! Streams one answer into the renderer. If the stream cannot be opened,
//! or dies before its first chunk, the same question is asked once through
//! the non-streaming endpoint; if that fails too the turn ends with an
//! apology instead of an error bubble.

use async_trait::async_trait;

use crate::gateway::GatewayError;
use crate::stream::assembler::{ChunkAssembler, StreamEvent};
use crate::stream::driver::{drive, ChunkSource, DriveOutcome, StopSignal};
use crate::types::message::Message;

pub const APOLOGY: &str = "Sorry, I encountered an error. Please try again.";
pub const EMPTY_ANSWER: &str = "No response received";

/// The two ways of asking the gateway a question
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn open_stream(&self, question: &str) -> Result<Box<dyn ChunkSource>, GatewayError>;
    async fn ask_once(&self, question: &str) -> Result<String, GatewayError>;
}

/// How a turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOutcome {
    /// Stream ran to its end
    Streamed,
    /// User pressed stop; partial content kept
    Cancelled,
    /// Stream broke mid-answer; partial content kept
    Interrupted,
    /// Answer came from the non-streaming endpoint
    Fallback,
    /// Both requests failed; the apology was shown
    Apology,
}

/// Ask `question` and publish the answer into `target` (an empty
/// assistant message already shown by the caller).
///
/// Only an authorization failure is returned as `Err`; every other failure
/// ends up as content of the turn.
pub async fn ask<T, F>(
    transport: &T,
    question: &str,
    target: Message,
    sentinel: char,
    stop: &StopSignal,
    mut on_event: F,
) -> Result<ChatOutcome, GatewayError>
where
    T: ChatTransport + ?Sized,
    F: FnMut(StreamEvent),
{
    let mut assembler = ChunkAssembler::new(sentinel, target);

    let opened = tokio::select! {
        biased;
        _ = stop.raised() => None,
        opened = transport.open_stream(question) => Some(opened),
    };
    let Some(opened) = opened else {
        publish(&mut assembler, None, &mut on_event);
        return Ok(ChatOutcome::Cancelled);
    };

    match opened {
        Ok(mut source) => {
            match drive(source.as_mut(), &mut assembler, stop, &mut on_event).await {
                DriveOutcome::Completed => return Ok(ChatOutcome::Streamed),
                DriveOutcome::Cancelled => return Ok(ChatOutcome::Cancelled),
                DriveOutcome::Failed(e) if e.is_unauthorized() => return Err(e),
                DriveOutcome::Failed(_) => return Ok(ChatOutcome::Interrupted),
                DriveOutcome::FailedEarly(e) if e.is_unauthorized() => return Err(e),
                DriveOutcome::FailedEarly(e) => {
                    tracing::warn!("Stream produced nothing, falling back: {}", e);
                }
            }
        }
        Err(e) if e.is_unauthorized() => return Err(e),
        Err(e) => tracing::warn!("Could not open stream, falling back: {}", e),
    }

    let reply = tokio::select! {
        biased;
        _ = stop.raised() => None,
        reply = transport.ask_once(question) => Some(reply),
    };
    // A reply that lands after stop belongs to a turn the user already ended
    let reply = match reply {
        Some(reply) if !stop.is_raised() => reply,
        _ => {
            tracing::info!("Fallback answer discarded after stop");
            publish(&mut assembler, None, &mut on_event);
            return Ok(ChatOutcome::Cancelled);
        }
    };

    match reply {
        Ok(answer) => {
            let answer = if answer.trim().is_empty() {
                EMPTY_ANSWER.to_string()
            } else {
                answer
            };
            // Same assembler, so a sentinel in the reply still splits it
            publish(&mut assembler, Some(&answer), &mut on_event);
            Ok(ChatOutcome::Fallback)
        }
        Err(e) if e.is_unauthorized() => Err(e),
        Err(e) => {
            tracing::error!("Fallback request failed: {}", e);
            publish(&mut assembler, Some(APOLOGY), &mut on_event);
            Ok(ChatOutcome::Apology)
        }
    }
}

fn publish<F: FnMut(StreamEvent)>(
    assembler: &mut ChunkAssembler,
    content: Option<&str>,
    on_event: &mut F,
) {
    let mut events = content.map(|c| assembler.push(c)).unwrap_or_default();
    events.extend(assembler.finish());
    events.into_iter().for_each(on_event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::assembler::DEFAULT_SENTINEL;
    use crate::stream::driver::tests::ScriptedSource;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    enum StreamScript {
        Refused(u16),
        Chunks(Vec<&'static str>),
        DiesEarly,
        DiesLate(&'static str),
    }

    /// How the non-streaming endpoint behaves once called
    enum FallbackMode {
        Answers,
        Hangs,
        /// Stop is pressed while the reply is on the wire
        StoppedInFlight(Arc<StopSignal>),
    }

    struct FakeTransport {
        stream: StreamScript,
        fallback: Result<String, u16>,
        fallback_mode: FallbackMode,
        fallback_calls: Mutex<usize>,
    }

    impl FakeTransport {
        fn new(stream: StreamScript, fallback: Result<&str, u16>) -> Self {
            Self {
                stream,
                fallback: fallback.map(str::to_string),
                fallback_mode: FallbackMode::Answers,
                fallback_calls: Mutex::new(0),
            }
        }

        fn with_fallback_mode(mut self, mode: FallbackMode) -> Self {
            self.fallback_mode = mode;
            self
        }

        fn fallback_calls(&self) -> usize {
            *self.fallback_calls.lock().unwrap()
        }
    }

    fn http_error(status: u16) -> GatewayError {
        if status == 401 || status == 403 {
            GatewayError::Unauthorized(status)
        } else {
            GatewayError::Status {
                status,
                body: String::new(),
            }
        }
    }

    #[async_trait]
    impl ChatTransport for FakeTransport {
        async fn open_stream(&self, _question: &str) -> Result<Box<dyn ChunkSource>, GatewayError> {
            let source = match &self.stream {
                StreamScript::Refused(status) => return Err(http_error(*status)),
                StreamScript::Chunks(chunks) => {
                    let bytes: Vec<&[u8]> = chunks.iter().map(|c| c.as_bytes()).collect();
                    ScriptedSource::chunks(&bytes)
                }
                StreamScript::DiesEarly => ScriptedSource {
                    steps: VecDeque::from(vec![Err(GatewayError::Stream("reset".into()))]),
                    stop_after: None,
                    served: 0,
                },
                StreamScript::DiesLate(first) => ScriptedSource {
                    steps: VecDeque::from(vec![
                        Ok(Some(first.as_bytes().to_vec())),
                        Err(GatewayError::Stream("reset".into())),
                    ]),
                    stop_after: None,
                    served: 0,
                },
            };
            Ok(Box::new(source))
        }

        async fn ask_once(&self, _question: &str) -> Result<String, GatewayError> {
            *self.fallback_calls.lock().unwrap() += 1;
            match &self.fallback_mode {
                FallbackMode::Answers => {}
                FallbackMode::Hangs => std::future::pending::<()>().await,
                FallbackMode::StoppedInFlight(stop) => stop.raise(),
            }
            self.fallback.clone().map_err(http_error)
        }
    }

    async fn run(transport: &FakeTransport) -> (Result<ChatOutcome, GatewayError>, Vec<String>) {
        run_with(transport, &StopSignal::new()).await
    }

    async fn run_with(
        transport: &FakeTransport,
        stop: &StopSignal,
    ) -> (Result<ChatOutcome, GatewayError>, Vec<String>) {
        let mut shown: Vec<(uuid::Uuid, String)> = Vec::new();
        let target = Message::assistant("");
        shown.push((target.id, String::new()));

        let outcome = ask(transport, "q", target, DEFAULT_SENTINEL, stop, |event| match event {
            StreamEvent::Started(msg) => shown.push((msg.id, msg.content)),
            StreamEvent::Content { id, content } => {
                if let Some(entry) = shown.iter_mut().find(|(mid, _)| *mid == id) {
                    entry.1 = content;
                }
            }
            _ => {}
        })
        .await;

        (outcome, shown.into_iter().map(|(_, c)| c).collect())
    }

    #[tokio::test]
    async fn test_streamed_answer_splits_on_sentinel() {
        let transport = FakeTransport::new(
            StreamScript::Chunks(vec!["Loading data ✓", "Trained model"]),
            Ok("unused"),
        );
        let (outcome, shown) = run(&transport).await;

        assert_eq!(outcome.unwrap(), ChatOutcome::Streamed);
        assert_eq!(shown, vec!["Loading data ✓", "Trained model"]);
        assert_eq!(transport.fallback_calls(), 0);
    }

    #[tokio::test]
    async fn test_refused_stream_uses_fallback() {
        let transport = FakeTransport::new(StreamScript::Refused(502), Ok("step one✓step two"));
        let (outcome, shown) = run(&transport).await;

        assert_eq!(outcome.unwrap(), ChatOutcome::Fallback);
        assert_eq!(shown, vec!["step one✓", "step two"]);
        assert_eq!(transport.fallback_calls(), 1);
    }

    #[tokio::test]
    async fn test_stream_dying_before_first_chunk_uses_fallback() {
        let transport = FakeTransport::new(StreamScript::DiesEarly, Ok("answer"));
        let (outcome, shown) = run(&transport).await;

        assert_eq!(outcome.unwrap(), ChatOutcome::Fallback);
        assert_eq!(shown, vec!["answer"]);
    }

    #[tokio::test]
    async fn test_empty_fallback_answer() {
        let transport = FakeTransport::new(StreamScript::Refused(500), Ok("  "));
        let (_, shown) = run(&transport).await;
        assert_eq!(shown, vec![EMPTY_ANSWER]);
    }

    #[tokio::test]
    async fn test_both_failing_shows_apology() {
        let transport = FakeTransport::new(StreamScript::Refused(500), Err(500));
        let (outcome, shown) = run(&transport).await;

        assert_eq!(outcome.unwrap(), ChatOutcome::Apology);
        assert_eq!(shown, vec![APOLOGY]);
    }

    #[tokio::test]
    async fn test_late_failure_keeps_partial_without_fallback() {
        let transport = FakeTransport::new(StreamScript::DiesLate("half an ans"), Ok("unused"));
        let (outcome, shown) = run(&transport).await;

        assert_eq!(outcome.unwrap(), ChatOutcome::Interrupted);
        assert_eq!(shown, vec!["half an ans"]);
        assert_eq!(transport.fallback_calls(), 0);
    }

    #[tokio::test]
    async fn test_unauthorized_is_an_error() {
        let transport = FakeTransport::new(StreamScript::Refused(401), Ok("unused"));
        let (outcome, _) = run(&transport).await;
        assert!(outcome.unwrap_err().is_unauthorized());
        assert_eq!(transport.fallback_calls(), 0);

        let transport = FakeTransport::new(StreamScript::Refused(500), Err(403));
        let (outcome, _) = run(&transport).await;
        assert!(outcome.unwrap_err().is_unauthorized());
    }

    #[tokio::test]
    async fn test_stop_before_fallback() {
        let transport = FakeTransport::new(StreamScript::Refused(500), Ok("unused"));
        let stop = StopSignal::new();
        stop.raise();
        let (outcome, shown) = run_with(&transport, &stop).await;

        assert_eq!(outcome.unwrap(), ChatOutcome::Cancelled);
        assert_eq!(shown, vec![""]);
        assert_eq!(transport.fallback_calls(), 0);
    }

    #[tokio::test]
    async fn test_stop_interrupts_hanging_fallback() {
        let transport = FakeTransport::new(StreamScript::Refused(500), Ok("late answer"))
            .with_fallback_mode(FallbackMode::Hangs);
        let stop = Arc::new(StopSignal::new());

        let trigger = stop.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.raise();
        });

        let (outcome, shown) = tokio::time::timeout(Duration::from_secs(5), run_with(&transport, &stop))
            .await
            .expect("stop should end the turn");

        assert_eq!(outcome.unwrap(), ChatOutcome::Cancelled);
        assert_eq!(shown, vec![""]);
        assert_eq!(transport.fallback_calls(), 1);
    }

    #[tokio::test]
    async fn test_fallback_reply_after_stop_is_discarded() {
        let stop = Arc::new(StopSignal::new());
        let transport = FakeTransport::new(StreamScript::Refused(500), Ok("late answer"))
            .with_fallback_mode(FallbackMode::StoppedInFlight(stop.clone()));
        let (outcome, shown) = run_with(&transport, &stop).await;

        assert_eq!(outcome.unwrap(), ChatOutcome::Cancelled);
        assert_eq!(shown, vec![""]);
        assert_eq!(transport.fallback_calls(), 1);
    }
}
