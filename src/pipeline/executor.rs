use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{FuturesUnordered, StreamExt};
use once_cell::sync::OnceCell;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace, Instrument};

use super::conduit::{conduit, ConduitWriter, CONDUIT_CHUNK_SIZE};
use crate::error::{Error, Result};

pub type StageInput = Box<dyn AsyncRead + Send + Unpin>;
pub type StageOutput = Box<dyn AsyncWrite + Send + Unpin>;

/// Conduit depth used when none is configured
pub const DEFAULT_CONDUIT_CAPACITY: usize = 16;

/// One step of a streaming pipeline.
///
/// A stage reads its input to the end and writes its result to `output`,
/// which is `None` only for the last stage. The pipeline finishes and closes
/// both ends afterwards; a stage never has to.
#[async_trait]
pub trait StreamStage: Send + Sync {
    fn name(&self) -> &str;

    async fn process(&self, input: &mut StageInput, output: Option<&mut StageOutput>) -> Result<()>;
}

/// How the driver's copy from the source ended
enum Feed {
    Complete(u64),
    SourceFailed(io::Error),
    DownstreamClosed,
}

/// Chains stages with bounded conduits and runs them concurrently.
///
/// Stages are spawned onto the injected executor before any data flows; the
/// calling task copies the source into the first conduit. When several
/// stages fail, the one that failed first is reported and the rest, which
/// are usually consequences of the first closing its conduits, are logged.
#[derive(Clone)]
pub struct StreamPipeline {
    executor: Handle,
    conduit_capacity: usize,
}

impl StreamPipeline {
    pub fn new(executor: Handle) -> Self {
        Self {
            executor,
            conduit_capacity: DEFAULT_CONDUIT_CAPACITY,
        }
    }

    pub fn with_conduit_capacity(mut self, capacity: usize) -> Self {
        self.conduit_capacity = capacity.max(1);
        self
    }

    #[tracing::instrument(skip_all, fields(stages = stages.len()))]
    pub async fn run(&self, mut source: StageInput, stages: Vec<Arc<dyn StreamStage>>) -> Result<()> {
        match stages.len() {
            0 => Err(Error::Pipeline("pipeline has no stages".to_string())),
            1 => {
                // Nothing to overlap with, run on the calling task
                let result = stages[0].process(&mut source, None).await;
                drop(source);
                result
            }
            _ => self.run_concurrent(source, stages).await,
        }
    }

    async fn run_concurrent(&self, mut source: StageInput, stages: Vec<Arc<dyn StreamStage>>) -> Result<()> {
        let last = stages.len() - 1;
        let (feed, first_input) = conduit(self.conduit_capacity);

        let root_cause = Arc::new(OnceCell::new());
        let mut handles = Vec::with_capacity(stages.len());
        let mut input: StageInput = Box::new(first_input);
        for (index, stage) in stages.into_iter().enumerate() {
            if index == last {
                handles.push((index, self.spawn_stage(index, stage, input, None, root_cause.clone())));
                break;
            }
            let (writer, reader) = conduit(self.conduit_capacity);
            let stage_input = std::mem::replace(&mut input, Box::new(reader));
            handles.push((
                index,
                self.spawn_stage(index, stage, stage_input, Some(Box::new(writer)), root_cause.clone()),
            ));
        }

        let (fed, failure) = tokio::join!(
            feed_source(&mut source, feed),
            first_failure(handles, &root_cause)
        );
        drop(source);

        match fed {
            Feed::SourceFailed(err) => {
                if let Some(stage_err) = failure {
                    debug!(error = %stage_err, "stage failure after source failure");
                }
                Err(Error::Io(err))
            }
            Feed::Complete(bytes) => {
                trace!(bytes, "source copied");
                failure.map_or(Ok(()), Err)
            }
            Feed::DownstreamClosed => failure.map_or(Ok(()), Err),
        }
    }

    fn spawn_stage(
        &self,
        index: usize,
        stage: Arc<dyn StreamStage>,
        mut input: StageInput,
        mut output: Option<StageOutput>,
        root_cause: Arc<OnceCell<usize>>,
    ) -> JoinHandle<Result<()>> {
        let span = tracing::debug_span!("stage", index, name = stage.name());
        self.executor.spawn(
            async move {
                let mut result = stage.process(&mut input, output.as_mut()).await;
                if result.is_ok() {
                    if let Some(out) = output.as_mut() {
                        result = out.shutdown().await.map_err(Error::from);
                    }
                }
                // Claimed before the conduits close, so a neighbour failing on
                // the closure can never claim it first
                if result.is_err() {
                    let _ = root_cause.set(index);
                }
                // Dropping both ends is what releases the neighbouring stages
                drop(input);
                drop(output);
                result
            }
            .instrument(span),
        )
    }
}

/// Copy the source into the first conduit, finishing it only on a clean EOF.
async fn feed_source(source: &mut StageInput, mut writer: ConduitWriter) -> Feed {
    let mut buf = vec![0u8; CONDUIT_CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = match source.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            // Dropping the writer unfinished aborts the first stage
            Err(err) => return Feed::SourceFailed(err),
        };
        if let Err(err) = writer.write_all(&buf[..n]).await {
            trace!(error = %err, "first stage stopped reading");
            return Feed::DownstreamClosed;
        }
        total += n as u64;
    }
    match writer.shutdown().await {
        Ok(()) => Feed::Complete(total),
        Err(err) => {
            trace!(error = %err, "first stage stopped reading");
            Feed::DownstreamClosed
        }
    }
}

/// Wait for every stage and pick the failure to report.
///
/// The stage that claimed `root_cause` wins regardless of completion order;
/// every other failure is a consequence of it closing its conduits.
async fn first_failure(
    handles: Vec<(usize, JoinHandle<Result<()>>)>,
    root_cause: &OnceCell<usize>,
) -> Option<Error> {
    let mut pending: FuturesUnordered<_> = handles
        .into_iter()
        .map(|(index, handle)| async move { (index, handle.await) })
        .collect();

    let mut failures = Vec::new();
    while let Some((index, joined)) = pending.next().await {
        let outcome = joined.unwrap_or_else(|e| {
            Err(Error::Pipeline(format!("stage {} did not complete: {}", index, e)))
        });
        if let Err(err) = outcome {
            failures.push((index, err));
        }
    }
    if failures.is_empty() {
        return None;
    }

    // A panicked stage never claims, so fall back to completion order
    let chosen = root_cause
        .get()
        .and_then(|root| failures.iter().position(|(index, _)| index == root))
        .unwrap_or(0);
    let (index, err) = failures.swap_remove(chosen);
    debug!(stage = index, error = %err, "stage failed");
    for (other, suppressed) in &failures {
        debug!(stage = other, error = %suppressed, "suppressed secondary stage failure");
    }
    Some(err)
}
