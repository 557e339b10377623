//! Ordered channel carrying samples from transformers to the renderer.

use tokio::sync::mpsc;
use tracing::trace;

use crate::sample::Sample;

/// Create a connected sink/stream pair for one scrape.
pub fn channel() -> (SampleSink, SampleStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SampleSink { tx }, SampleStream { rx })
}

/// Producer side. Cloneable; the stream ends when every clone is dropped.
#[derive(Debug, Clone)]
pub struct SampleSink {
    tx: mpsc::UnboundedSender<Sample>,
}

impl SampleSink {
    /// Push samples in order. Returns how many were accepted.
    pub fn emit<I>(&self, samples: I) -> usize
    where
        I: IntoIterator<Item = Sample>,
    {
        let mut sent = 0;
        for sample in samples {
            if self.tx.send(sample).is_err() {
                trace!("Sample stream closed, dropping remaining samples");
                break;
            }
            sent += 1;
        }
        sent
    }
}

/// Consumer side.
#[derive(Debug)]
pub struct SampleStream {
    rx: mpsc::UnboundedReceiver<Sample>,
}

impl SampleStream {
    /// Receive the next sample, or `None` once all producers are gone.
    pub async fn recv(&mut self) -> Option<Sample> {
        self.rx.recv().await
    }

    /// Collect everything until all producers are dropped.
    pub async fn drain(mut self) -> Vec<Sample> {
        let mut samples = Vec::new();
        while let Some(sample) = self.rx.recv().await {
            samples.push(sample);
        }
        samples
    }
}
