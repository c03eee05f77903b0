use super::dispatch_answers::DispatchAnswersUseCase;
use crate::ports::ResponseWriter;
use ferrous_nftset_domain::answer::has_address_records;
use ferrous_nftset_domain::{AnswerRecord, DispatchMode, DomainError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorOutcome {
    /// No A/AAAA answers; the response went straight to the client.
    PassedThrough,
    /// Rules were applied before the response was written.
    Dispatched,
    /// The response was written; rules are applied in the background.
    Deferred,
}

/// Entry point between a finished DNS response and the packet filter.
///
/// In async mode the dispatch pass runs on a detached task that does not
/// share the request's lifetime: once started it runs to completion even if
/// the client goes away or the request handler is cancelled.
pub struct MirrorResponseUseCase {
    dispatcher: Arc<DispatchAnswersUseCase>,
    async_mode: AtomicBool,
    background: TaskTracker,
}

impl MirrorResponseUseCase {
    pub fn new(dispatcher: Arc<DispatchAnswersUseCase>, mode: DispatchMode) -> Self {
        Self {
            dispatcher,
            async_mode: AtomicBool::new(mode == DispatchMode::Async),
            background: TaskTracker::new(),
        }
    }

    pub fn mode(&self) -> DispatchMode {
        if self.async_mode.load(Ordering::Relaxed) {
            DispatchMode::Async
        } else {
            DispatchMode::Sync
        }
    }

    pub fn set_mode(&self, mode: DispatchMode) {
        self.async_mode
            .store(mode == DispatchMode::Async, Ordering::Relaxed);
    }

    pub async fn execute<W: ResponseWriter>(
        &self,
        answers: Vec<AnswerRecord>,
        server: Arc<str>,
        mut writer: W,
    ) -> Result<MirrorOutcome, DomainError> {
        if !has_address_records(&answers) {
            debug!("Response didn't contain any A/AAAA record");
            writer.write_response().await?;
            return Ok(MirrorOutcome::PassedThrough);
        }

        let start = Instant::now();
        match self.mode() {
            DispatchMode::Sync => {
                if let Err(e) = self.dispatcher.execute(&answers, &server).await {
                    error!(error = %e, "Nftables dispatch failed");
                }
                let dispatch_us = start.elapsed().as_micros() as u64;
                writer.write_response().await?;
                info!(answers = answers.len(), dispatch_us, "Processed DNS answers");
                Ok(MirrorOutcome::Dispatched)
            }
            DispatchMode::Async => {
                let written = writer.write_response().await;

                let dispatcher = Arc::clone(&self.dispatcher);
                self.background.spawn(async move {
                    match dispatcher.execute(&answers, &server).await {
                        Ok(summary) => debug!(
                            dispatched = summary.dispatched,
                            ignored = summary.ignored,
                            failed = summary.failed,
                            dispatch_us = start.elapsed().as_micros() as u64,
                            "Background nftables dispatch finished"
                        ),
                        Err(e) => error!(error = %e, "Background nftables dispatch failed"),
                    }
                });

                written?;
                Ok(MirrorOutcome::Deferred)
            }
        }
    }

    /// Wait for every background dispatch started so far. Never cancels them.
    pub async fn wait_background(&self) {
        self.background.close();
        self.background.wait().await;
        self.background.reopen();
    }

    pub fn background_len(&self) -> usize {
        self.background.len()
    }
}
