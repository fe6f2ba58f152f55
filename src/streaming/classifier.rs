//! Streaming WebP Classifier
//!
//! Accumulates body chunks for one stream and re-classifies after each
//! arrival. The result is emitted exactly once: as soon as it is final, or
//! as a best-effort fallback when the stream ends first.

use crate::webp::{classify, ClassificationResult};

/// Lifecycle of one classified stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Waiting for more bytes
    Accumulating,
    /// Result emitted, further chunks are ignored
    Finalized,
}

/// Decision after handing a chunk to the classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamDecision {
    /// Keep feeding - the result may still change
    Continue,
    /// The result is now known; stop fetching
    Finalized(ClassificationResult),
    /// Already finalized by an earlier call
    Done,
}

impl StreamDecision {
    /// Check if more chunks are wanted
    pub fn should_continue(&self) -> bool {
        matches!(self, StreamDecision::Continue)
    }

    /// Get the result if this decision carries one
    pub fn result(&self) -> Option<&ClassificationResult> {
        match self {
            StreamDecision::Finalized(result) => Some(result),
            _ => None,
        }
    }
}

/// Per-stream accumulate-and-classify loop
pub struct StreamingClassifier {
    /// All bytes received so far; dropped once finalized
    buffer: Vec<u8>,
    state: StreamState,
    /// Last result computed from `buffer`
    latest: ClassificationResult,
    /// Total bytes fed while accumulating
    total_bytes_seen: usize,
    chunks_seen: usize,
}

impl StreamingClassifier {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            state: StreamState::Accumulating,
            latest: ClassificationResult::UNKNOWN,
            total_bytes_seen: 0,
            chunks_seen: 0,
        }
    }

    /// Append a chunk and classify everything received so far
    pub fn feed(&mut self, chunk: &[u8]) -> StreamDecision {
        if self.state == StreamState::Finalized {
            return StreamDecision::Done;
        }

        self.buffer.extend_from_slice(chunk);
        self.total_bytes_seen += chunk.len();
        self.chunks_seen += 1;

        self.latest = classify(&self.buffer);
        if self.latest.is_final() {
            self.finalize();
            StreamDecision::Finalized(self.latest)
        } else {
            StreamDecision::Continue
        }
    }

    /// Close the stream, yielding the current partial result if none was
    /// emitted yet
    pub fn end_of_stream(&mut self) -> StreamDecision {
        if self.state == StreamState::Finalized {
            return StreamDecision::Done;
        }

        self.latest = classify(&self.buffer);
        self.finalize();
        StreamDecision::Finalized(self.latest)
    }

    fn finalize(&mut self) {
        self.state = StreamState::Finalized;
        self.buffer = Vec::new();
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn is_finalized(&self) -> bool {
        self.state == StreamState::Finalized
    }

    /// Latest classification, final or not
    pub fn latest(&self) -> ClassificationResult {
        self.latest
    }

    /// Bytes currently held for re-classification
    pub fn buffered_bytes(&self) -> usize {
        self.buffer.len()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes_seen
    }

    pub fn chunks_seen(&self) -> usize {
        self.chunks_seen
    }
}

impl Default for StreamingClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::webp::test_support::{extended_file, lossy_file, riff_prefix, FrameHeader};
    use crate::webp::{Quality, Subtype};
    use tokio::sync::mpsc;

    /// Feed `data` split by `sizes` (cycled), then end the stream
    fn run_chunked(data: &[u8], sizes: &[usize]) -> ClassificationResult {
        let mut classifier = StreamingClassifier::new();
        let mut offset = 0;
        let mut i = 0;
        while offset < data.len() {
            let end = offset.saturating_add(sizes[i % sizes.len()]).min(data.len());
            if let StreamDecision::Finalized(result) = classifier.feed(&data[offset..end]) {
                return result;
            }
            offset = end;
            i += 1;
        }
        match classifier.end_of_stream() {
            StreamDecision::Finalized(result) => result,
            other => panic!("expected a result, got {:?}", other),
        }
    }

    #[test]
    fn test_finalizes_on_lossy_quality() {
        let data = lossy_file(&FrameHeader::new(42));
        let mut classifier = StreamingClassifier::new();

        let decision = classifier.feed(&data);
        assert_eq!(
            decision.result(),
            Some(&ClassificationResult::new(Subtype::Lossy, Quality::Estimated(40)))
        );
        assert!(classifier.is_finalized());
        assert_eq!(classifier.buffered_bytes(), 0);
    }

    #[test]
    fn test_emits_once() {
        let data = riff_prefix(b"VP8L");
        let mut classifier = StreamingClassifier::new();

        assert!(classifier.feed(&data).result().is_some());
        assert_eq!(classifier.feed(b"more"), StreamDecision::Done);
        assert_eq!(classifier.end_of_stream(), StreamDecision::Done);
        assert_eq!(classifier.total_bytes(), 16);
    }

    #[test]
    fn test_waits_for_prefix() {
        let mut classifier = StreamingClassifier::new();

        // Not RIFF, but only 4 bytes so far
        assert!(classifier.feed(b"GIF8").should_continue());
        assert_eq!(classifier.state(), StreamState::Accumulating);

        let decision = classifier.feed(b"9a\x01\x00\x01\x00\x80\x00\x00\x00\x00\x00");
        assert_eq!(decision.result(), Some(&ClassificationResult::NOT_WEBP));
    }

    #[test]
    fn test_end_of_stream_fallback() {
        // Only the prefix arrives: lossy, quality unknown
        let mut classifier = StreamingClassifier::new();
        assert!(classifier.feed(&riff_prefix(b"VP8 ")).should_continue());
        assert_eq!(
            classifier.end_of_stream().result(),
            Some(&ClassificationResult::new(Subtype::Lossy, Quality::Indeterminate))
        );

        // Stream ends before 16 bytes
        let mut short = StreamingClassifier::new();
        short.feed(b"RIFF");
        assert_eq!(short.end_of_stream().result(), Some(&ClassificationResult::UNKNOWN));

        // Empty stream
        let mut empty = StreamingClassifier::new();
        assert_eq!(empty.end_of_stream().result(), Some(&ClassificationResult::UNKNOWN));
    }

    #[test]
    fn test_chunking_does_not_change_result() {
        let mut lossless = riff_prefix(b"VP8L");
        lossless.extend_from_slice(&[0x2F; 40]);
        let inputs = vec![
            lossy_file(&FrameHeader::new(42)),
            lossy_file(&FrameHeader::new(5).with_lf_deltas()),
            extended_file(&FrameHeader::new(60)),
            lossless,
            b"<html><body>not an image</body></html>".to_vec(),
            riff_prefix(b"VP8 "),
        ];
        let chunkings: [&[usize]; 5] = [&[usize::MAX], &[1], &[3, 7, 2], &[16, 1, 5], &[2, 11]];

        for data in &inputs {
            let whole = run_chunked(data, chunkings[0]);
            for sizes in &chunkings[1..] {
                assert_eq!(run_chunked(data, sizes), whole, "chunking {:?}", sizes);
            }
        }
    }

    #[test]
    fn test_stops_before_body_ends() {
        let mut data = lossy_file(&FrameHeader::new(20));
        let header_len = data.len();
        data.extend_from_slice(&vec![0u8; 4096]);

        let mut classifier = StreamingClassifier::new();
        let mut consumed = 0;
        for chunk in data.chunks(8) {
            consumed += chunk.len();
            if !classifier.feed(chunk).should_continue() {
                break;
            }
        }
        assert!(classifier.is_finalized());
        assert!(consumed < header_len + 8);
        assert_eq!(classifier.latest().quality, Quality::Estimated(80));
    }

    async fn classify_channel(mut rx: mpsc::Receiver<Vec<u8>>) -> (ClassificationResult, usize) {
        let mut classifier = StreamingClassifier::new();
        while let Some(chunk) = rx.recv().await {
            if let StreamDecision::Finalized(result) = classifier.feed(&chunk) {
                return (result, classifier.chunks_seen());
            }
        }
        match classifier.end_of_stream() {
            StreamDecision::Finalized(result) => (result, classifier.chunks_seen()),
            other => panic!("expected a result, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_async_delivery_stops_early() {
        let data = lossy_file(&FrameHeader::new(42));
        let (tx, rx) = mpsc::channel(4);

        let producer = tokio::spawn(async move {
            let filler = [0u8; 4];
            let mut sent = 0;
            for chunk in data.chunks(4).chain(std::iter::repeat(&filler[..]).take(100)) {
                if tx.send(chunk.to_vec()).await.is_err() {
                    break;
                }
                sent += 1;
            }
            sent
        });

        let (result, chunks) = classify_channel(rx).await;
        let sent = producer.await.expect("producer panicked");

        assert_eq!(result, ClassificationResult::new(Subtype::Lossy, Quality::Estimated(40)));
        // The receiver was dropped after finalizing, so the producer gave up
        assert!(sent < 100);
        assert!(chunks <= sent);
    }

    #[tokio::test]
    async fn test_concurrent_streams_are_independent() {
        let inputs: Vec<(Vec<u8>, ClassificationResult)> = vec![
            (
                lossy_file(&FrameHeader::new(0)),
                ClassificationResult::new(Subtype::Lossy, Quality::Estimated(100)),
            ),
            (
                extended_file(&FrameHeader::new(42)),
                ClassificationResult::new(Subtype::Extended, Quality::Estimated(40)),
            ),
            (
                riff_prefix(b"VP8L"),
                ClassificationResult::new(Subtype::Lossless, Quality::NotApplicable),
            ),
            (b"\xFF\xD8\xFF\xE0\x00\x10JFIF\x00\x01\x01\x00\x00\x00".to_vec(), ClassificationResult::NOT_WEBP),
        ];

        let mut handles = Vec::new();
        for (data, expected) in inputs {
            let (tx, rx) = mpsc::channel(1);
            let consumer = tokio::spawn(classify_channel(rx));
            tokio::spawn(async move {
                for chunk in data.chunks(3) {
                    if tx.send(chunk.to_vec()).await.is_err() {
                        break;
                    }
                }
            });
            handles.push((consumer, expected));
        }

        for (consumer, expected) in handles {
            let (result, _) = consumer.await.expect("consumer panicked");
            assert_eq!(result, expected);
        }
    }
}
