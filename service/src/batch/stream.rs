//! Chunked stream validation

use crate::dispatch::HybridDispatcher;
use crate::schema::Schema;
use crate::validator::ReferenceEngine;
use fastschema_core::error::Result;
use fastschema_core::issue::Outcome;
use serde_json::Value;
use tracing::{debug, warn};

/// Outcomes of one flushed chunk
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkResult {
    /// Global index of the first item in the chunk
    pub start_index: usize,
    /// Outcomes with global `[i]` path prefixes
    pub outcomes: Vec<Outcome>,
}

impl ChunkResult {
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of invalid outcomes in the chunk
    #[must_use]
    pub fn invalid_count(&self) -> usize {
        self.outcomes.iter().filter(|outcome| !outcome.is_valid()).count()
    }
}

enum Runner<'a> {
    Reference,
    Dispatcher(&'a HybridDispatcher),
}

/// Incremental validator that buffers items and validates them in chunks
pub struct StreamValidator<'a> {
    schema: Schema,
    runner: Runner<'a>,
    chunk_size: usize,
    buffer: Vec<Value>,
    next_index: usize,
}

impl StreamValidator<'static> {
    /// Stream on the reference engine
    #[must_use]
    pub fn new(schema: Schema, chunk_size: usize) -> Self {
        Self::with_runner(schema, chunk_size, Runner::Reference)
    }
}

impl<'a> StreamValidator<'a> {
    /// Stream whose chunks go through a dispatcher
    #[must_use]
    pub fn with_dispatcher(
        schema: Schema,
        chunk_size: usize,
        dispatcher: &'a HybridDispatcher,
    ) -> Self {
        Self::with_runner(schema, chunk_size, Runner::Dispatcher(dispatcher))
    }

    fn with_runner(schema: Schema, chunk_size: usize, runner: Runner<'a>) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            schema,
            runner,
            chunk_size,
            buffer: Vec::with_capacity(chunk_size),
            next_index: 0,
        }
    }

    /// Items buffered and not yet validated
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Total items accepted so far
    #[must_use]
    pub fn seen(&self) -> usize {
        self.next_index + self.buffer.len()
    }

    /// Buffer one item; returns the chunk once it fills.
    ///
    /// # Errors
    ///
    /// Only a dispatcher-backed stream can fail, under the same conditions
    /// as [`HybridDispatcher::validate_many`].
    pub fn push(&mut self, value: Value) -> Result<Option<ChunkResult>> {
        self.buffer.push(value);
        if self.buffer.len() >= self.chunk_size {
            self.flush()
        } else {
            Ok(None)
        }
    }

    /// Push several items, collecting every chunk that fills
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::push`].
    pub fn extend<I>(&mut self, values: I) -> Result<Vec<ChunkResult>>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut chunks = Vec::new();
        for value in values {
            if let Some(chunk) = self.push(value)? {
                chunks.push(chunk);
            }
        }
        Ok(chunks)
    }

    /// Validate whatever is buffered now
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::push`]. On error the buffered items are
    /// dropped and the global index still advances past them.
    pub fn flush(&mut self) -> Result<Option<ChunkResult>> {
        if self.buffer.is_empty() {
            return Ok(None);
        }
        let items = std::mem::take(&mut self.buffer);
        let start_index = self.next_index;
        self.next_index += items.len();
        debug!(start_index, items = items.len(), "Flushing stream chunk");

        let outcomes = match self.runner {
            Runner::Reference => {
                crate::batch::run_reference(ReferenceEngine::global(), &self.schema, &items, start_index)
            }
            Runner::Dispatcher(dispatcher) => {
                dispatcher.validate_batch_at(&self.schema, &items, start_index)?
            }
        };
        Ok(Some(ChunkResult {
            start_index,
            outcomes,
        }))
    }

    /// Flush the final partial chunk and close the stream
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::push`].
    pub fn finish(mut self) -> Result<Option<ChunkResult>> {
        self.flush()
    }
}

impl Drop for StreamValidator<'_> {
    fn drop(&mut self) {
        if !self.buffer.is_empty() {
            warn!(
                pending = self.buffer.len(),
                "Stream dropped with unvalidated items; call finish()"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::number;
    use fastschema_core::config::DispatcherConfig;
    use fastschema_core::issue::PathSegment;
    use serde_json::json;

    #[test]
    fn test_chunks_carry_global_indices() -> anyhow::Result<()> {
        let mut stream = StreamValidator::new(number().build(), 3);
        let chunks = stream.extend((0..7).map(|i| if i == 4 { json!("x") } else { json!(i) }))?;

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].start_index, 0);
        assert_eq!(chunks[1].start_index, 3);
        assert_eq!(chunks[1].invalid_count(), 1);
        assert_eq!(chunks[1].outcomes[1].issues()[0].path, vec![PathSegment::Index(4)]);
        assert_eq!(stream.pending(), 1);
        assert_eq!(stream.seen(), 7);

        let last = stream.finish()?.expect("partial chunk");
        assert_eq!(last.start_index, 6);
        assert_eq!(last.len(), 1);
        Ok(())
    }

    #[test]
    fn test_flush_empty_and_finish_empty() -> anyhow::Result<()> {
        let mut stream = StreamValidator::new(number().build(), 2);
        assert!(stream.flush()?.is_none());
        assert!(stream.push(json!(1))?.is_none());
        assert_eq!(stream.flush()?.map(|chunk| chunk.len()), Some(1));
        assert!(stream.finish()?.is_none());
        Ok(())
    }

    #[test]
    fn test_dispatcher_stream() -> anyhow::Result<()> {
        let dispatcher = HybridDispatcher::new(DispatcherConfig::default());
        let mut stream = StreamValidator::with_dispatcher(number().build(), 2, &dispatcher);
        let chunk = stream.extend([json!(1), json!(false)])?.remove(0);
        assert_eq!(chunk.outcomes[1].issues()[0].path, vec![PathSegment::Index(1)]);
        assert_eq!(dispatcher.metrics().reference_calls, 1);
        Ok(())
    }
}
