//! Stream driver
//!
//! The only asynchronous loop of the renderer: awaits the next chunk,
//! decodes it, hands it to the assembler and publishes the resulting
//! events before awaiting again.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::gateway::GatewayError;
use crate::stream::assembler::{ChunkAssembler, StreamEvent};
use crate::stream::decoder::Utf8Decoder;

/// A source of raw body chunks, in arrival order.
#[async_trait]
pub trait ChunkSource: Send {
    /// `Ok(None)` signals end of stream.
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, GatewayError>;
}

/// Stop request shared between the UI and a running turn.
///
/// The flag answers "was stop pressed"; the notifier wakes whatever the
/// turn is currently awaiting.
#[derive(Debug, Default)]
pub struct StopSignal {
    raised: AtomicBool,
    notify: Notify,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Resolves once `raise` has been called, immediately if it already was.
    pub async fn raised(&self) {
        loop {
            // Registered before the check so a concurrent raise is not missed
            let notified = self.notify.notified();
            if self.is_raised() {
                return;
            }
            notified.await;
        }
    }
}

/// How a driven stream ended
#[derive(Debug)]
pub enum DriveOutcome {
    /// Transport signalled end of stream
    Completed,
    /// Stop flag was raised; content so far is kept
    Cancelled,
    /// Read error before any chunk arrived; nothing was published
    FailedEarly(GatewayError),
    /// Read error after content was published; content is kept
    Failed(GatewayError),
}

/// Pump `source` into `assembler` until the stream ends, fails or is
/// stopped. The active message is always finalized on return, except on
/// `FailedEarly` where the caller may still fall back to another request.
pub async fn drive<S, F>(
    source: &mut S,
    assembler: &mut ChunkAssembler,
    stop: &StopSignal,
    mut on_event: F,
) -> DriveOutcome
where
    S: ChunkSource + ?Sized,
    F: FnMut(StreamEvent),
{
    let mut decoder = Utf8Decoder::new();

    loop {
        // A stalled read must not outlive the stop request
        let next = tokio::select! {
            biased;
            _ = stop.raised() => None,
            next = source.next_chunk() => Some(next),
        };
        // Whatever lands after the stop request is discarded
        let Some(next) = next.filter(|_| !stop.is_raised()) else {
            return cancel(assembler, &mut decoder, &mut on_event);
        };

        let chunk = match next {
            Ok(Some(chunk)) => chunk,
            Ok(None) => {
                let tail = decoder.finish();
                if !tail.is_empty() {
                    emit(assembler.push(&tail), &mut on_event);
                }
                emit(assembler.finish(), &mut on_event);
                tracing::debug!("Stream completed after {} chunks", assembler.chunks_processed());
                return DriveOutcome::Completed;
            }
            Err(e) if assembler.chunks_processed() == 0 => {
                tracing::warn!("Stream failed before first chunk: {}", e);
                return DriveOutcome::FailedEarly(e);
            }
            Err(e) => {
                tracing::error!("Stream read failed: {}", e);
                emit(assembler.fail(&e), &mut on_event);
                return DriveOutcome::Failed(e);
            }
        };

        let text = decoder.decode(&chunk);
        emit(assembler.push(&text), &mut on_event);
    }
}

fn cancel<F: FnMut(StreamEvent)>(
    assembler: &mut ChunkAssembler,
    decoder: &mut Utf8Decoder,
    on_event: &mut F,
) -> DriveOutcome {
    // Drop a half-received character rather than inventing a replacement glyph
    let _ = decoder.finish();
    tracing::info!("Stream stopped by user after {} chunks", assembler.chunks_processed());
    emit(assembler.finish(), on_event);
    DriveOutcome::Cancelled
}

fn emit<F: FnMut(StreamEvent)>(events: Vec<StreamEvent>, on_event: &mut F) {
    for event in events {
        on_event(event);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::stream::assembler::DEFAULT_SENTINEL;
    use crate::types::message::Message;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;

    /// Scripted source used by driver and chat-service tests
    pub(crate) struct ScriptedSource {
        pub steps: VecDeque<Result<Option<Vec<u8>>, GatewayError>>,
        pub stop_after: Option<(usize, Arc<StopSignal>)>,
        pub served: usize,
    }

    impl ScriptedSource {
        pub(crate) fn chunks(chunks: &[&[u8]]) -> Self {
            let mut steps: VecDeque<_> = chunks.iter().map(|c| Ok(Some(c.to_vec()))).collect();
            steps.push_back(Ok(None));
            Self {
                steps,
                stop_after: None,
                served: 0,
            }
        }
    }

    #[async_trait]
    impl ChunkSource for ScriptedSource {
        async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, GatewayError> {
            self.served += 1;
            if let Some((n, flag)) = &self.stop_after {
                if self.served > *n {
                    flag.raise();
                }
            }
            self.steps.pop_front().unwrap_or(Ok(None))
        }
    }

    fn new_assembler() -> ChunkAssembler {
        ChunkAssembler::new(DEFAULT_SENTINEL, Message::assistant(""))
    }

    #[tokio::test]
    async fn test_drive_to_completion() {
        let bytes = "Hi ✓there".as_bytes();
        // Split inside the three-byte sentinel
        let mut source = ScriptedSource::chunks(&[&bytes[..4], &bytes[4..]]);
        let mut asm = new_assembler();
        let stop = StopSignal::new();
        let mut events = Vec::new();

        let outcome = drive(&mut source, &mut asm, &stop, |e| events.push(e)).await;

        assert!(matches!(outcome, DriveOutcome::Completed));
        let contents: Vec<_> = asm.messages().map(|m| m.content.clone()).collect();
        assert_eq!(contents, vec!["Hi ✓", "there"]);
        assert!(asm.is_finished());
        assert!(matches!(events.last(), Some(StreamEvent::Finalized { .. })));
    }

    #[tokio::test]
    async fn test_early_failure_publishes_nothing() {
        let mut source = ScriptedSource {
            steps: VecDeque::from(vec![Err(GatewayError::Stream("reset".into()))]),
            stop_after: None,
            served: 0,
        };
        let mut asm = new_assembler();
        let stop = StopSignal::new();
        let mut events = Vec::new();

        let outcome = drive(&mut source, &mut asm, &stop, |e| events.push(e)).await;

        assert!(matches!(outcome, DriveOutcome::FailedEarly(_)));
        assert!(events.is_empty());
        assert!(!asm.is_finished());
    }

    #[tokio::test]
    async fn test_late_failure_keeps_partial_content() {
        let mut source = ScriptedSource {
            steps: VecDeque::from(vec![
                Ok(Some(b"partial".to_vec())),
                Err(GatewayError::Stream("reset".into())),
            ]),
            stop_after: None,
            served: 0,
        };
        let mut asm = new_assembler();
        let stop = StopSignal::new();
        let mut events = Vec::new();

        let outcome = drive(&mut source, &mut asm, &stop, |e| events.push(e)).await;

        assert!(matches!(outcome, DriveOutcome::Failed(_)));
        assert_eq!(asm.active().content, "partial");
        assert!(asm.is_finished());
        assert!(matches!(events.last(), Some(StreamEvent::Failed { .. })));
    }

    #[tokio::test]
    async fn test_stop_keeps_content_and_discards_late_chunk() {
        let stop = Arc::new(StopSignal::new());
        let mut source = ScriptedSource::chunks(&[b"one ", b"two ", b"three"]);
        source.stop_after = Some((2, stop.clone()));
        let mut asm = new_assembler();

        let outcome = drive(&mut source, &mut asm, &stop, |_| {}).await;

        assert!(matches!(outcome, DriveOutcome::Cancelled));
        assert_eq!(asm.active().content, "one two ");
        assert!(asm.is_finished());
    }

    /// Serves its chunks, then never answers again
    struct StalledSource {
        chunks: VecDeque<Vec<u8>>,
    }

    #[async_trait]
    impl ChunkSource for StalledSource {
        async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, GatewayError> {
            match self.chunks.pop_front() {
                Some(chunk) => Ok(Some(chunk)),
                None => std::future::pending().await,
            }
        }
    }

    #[tokio::test]
    async fn test_stop_interrupts_stalled_read() {
        let stop = Arc::new(StopSignal::new());
        let mut source = StalledSource {
            chunks: VecDeque::from(vec![b"partial".to_vec()]),
        };
        let mut asm = new_assembler();
        let mut events = Vec::new();

        let raiser = stop.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            raiser.raise();
        });

        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            drive(&mut source, &mut asm, &stop, |e| events.push(e)),
        )
        .await
        .expect("drive returns once stop is raised");

        assert!(matches!(outcome, DriveOutcome::Cancelled));
        assert_eq!(asm.active().content, "partial");
        assert!(asm.is_finished());
        assert!(matches!(events.last(), Some(StreamEvent::Finalized { .. })));
    }

    #[tokio::test]
    async fn test_stop_raised_before_start() {
        let stop = StopSignal::new();
        stop.raise();
        let mut source = ScriptedSource::chunks(&[b"never read"]);
        let mut asm = new_assembler();

        let outcome = drive(&mut source, &mut asm, &stop, |_| {}).await;

        assert!(matches!(outcome, DriveOutcome::Cancelled));
        assert_eq!(source.served, 0);
        assert!(asm.is_finished());
    }
}
