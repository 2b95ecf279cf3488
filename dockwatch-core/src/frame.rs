//! Decoder for the runtime's multiplexed log stream.
//!
//! Each frame is an 8-byte header followed by a payload:
//!
//! ```text
//! [tag: u8][reserved: 3 bytes][len: u32 big-endian][payload: len bytes]
//! ```
//!
//! Reads may split frames (and headers) at any byte, so the demuxer keeps
//! unconsumed bytes in a carry-over buffer until the rest arrives. Output is
//! identical however the input was chunked.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::error::{FetchFailure, FrameError};
use crate::model::{ContainerLogs, LogLine, StreamKind};

pub const HEADER_LEN: usize = 8;

/// Payloads larger than this can only come from a corrupt header.
pub const MAX_PAYLOAD_LEN: usize = 16 * 1024 * 1024;

fn stream_kind(tag: u8) -> Result<StreamKind, FrameError> {
    match tag {
        // stdin is echoed on stdout
        0 | 1 => Ok(StreamKind::Stdout),
        // 3 is the daemon's own error channel
        2 | 3 => Ok(StreamKind::Stderr),
        tag => Err(FrameError::UnknownStream { tag }),
    }
}

fn stream_tag(kind: StreamKind) -> u8 {
    match kind {
        StreamKind::Stdout => 1,
        StreamKind::Stderr => 2,
    }
}

/// Encodes one frame. Used to re-frame already split output and in tests.
pub fn encode_frame(kind: StreamKind, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
    buf.put_u8(stream_tag(kind));
    buf.put_bytes(0, 3);
    buf.put_u32(payload.len() as u32);
    buf.put_slice(payload);
    buf.freeze()
}

/// Result of decoding a complete stream.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodedLogs {
    pub lines: Vec<LogLine>,
    /// Bytes of an incomplete or malformed tail that were dropped.
    pub discarded: usize,
}

impl DecodedLogs {
    pub fn into_logs(self) -> ContainerLogs {
        ContainerLogs::from_lines(self.lines)
    }
}

#[derive(Debug, Default)]
pub struct FrameDemuxer {
    carry: BytesMut,
    lines: Vec<LogLine>,
    discarded: usize,
    poisoned: bool,
}

impl FrameDemuxer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one read's worth of bytes and returns the lines completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<LogLine> {
        if self.poisoned {
            self.discarded += chunk.len();
            return Vec::new();
        }
        self.carry.extend_from_slice(chunk);

        let mut out = Vec::new();
        loop {
            match self.next_frame() {
                Ok(Some(line)) => out.extend(line),
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, buffered = self.carry.len(), "malformed log frame, dropping rest of stream");
                    self.discarded += self.carry.len();
                    self.carry.clear();
                    self.poisoned = true;
                    break;
                }
            }
        }
        self.lines.extend(out.iter().cloned());
        out
    }

    /// Consumes one frame from the front of the buffer.
    ///
    /// `Ok(None)` means more input is needed; `Ok(Some(None))` means a frame
    /// was consumed but its payload was blank.
    fn next_frame(&mut self) -> Result<Option<Option<LogLine>>, FrameError> {
        if self.carry.len() < HEADER_LEN {
            return Ok(None);
        }
        let header = &self.carry[..HEADER_LEN];
        let kind = stream_kind(header[0])?;
        let len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;
        if len > MAX_PAYLOAD_LEN {
            return Err(FrameError::Oversized { len });
        }
        if self.carry.len() < HEADER_LEN + len {
            return Ok(None);
        }

        self.carry.advance(HEADER_LEN);
        let payload = self.carry.split_to(len);
        Ok(Some(LogLine::from_payload(
            kind,
            &String::from_utf8_lossy(&payload),
        )))
    }

    /// Number of bytes waiting for the rest of a frame.
    pub fn pending(&self) -> usize {
        self.carry.len()
    }

    pub fn emitted(&self) -> usize {
        self.lines.len()
    }

    /// Ends the stream. Any partial frame still buffered can never complete
    /// and is dropped.
    pub fn finish(self) -> DecodedLogs {
        let tail = self.carry.len();
        if tail > 0 {
            debug!(bytes = tail, "discarding incomplete log frame at end of stream");
        }
        DecodedLogs {
            lines: self.lines,
            discarded: self.discarded + tail,
        }
    }
}

/// Drives a demuxer over a chunked byte stream until it ends.
///
/// A read error aborts decoding; lines decoded so far are discarded.
pub async fn decode_stream<S>(stream: S) -> Result<DecodedLogs, FetchFailure>
where
    S: Stream<Item = Result<Bytes, FetchFailure>>,
{
    let mut demuxer = FrameDemuxer::new();
    futures_util::pin_mut!(stream);
    while let Some(chunk) = stream.next().await {
        demuxer.push(&chunk?);
    }
    Ok(demuxer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NO_LOGS_TEXT;

    fn texts(lines: &[LogLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    fn sample_stream() -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&encode_frame(StreamKind::Stdout, b"2024-01-01T00:00:00Z starting\n"));
        raw.extend_from_slice(&encode_frame(StreamKind::Stderr, b"  warning: low disk  \n"));
        raw.extend_from_slice(&encode_frame(StreamKind::Stdout, b"\n"));
        raw.extend_from_slice(&encode_frame(StreamKind::Stdout, b""));
        raw.extend_from_slice(&encode_frame(StreamKind::Stdout, "listening on :8080 ✓\n".as_bytes()));
        raw
    }

    fn decode_in_chunks(raw: &[u8], cuts: &[usize]) -> DecodedLogs {
        let mut demuxer = FrameDemuxer::new();
        let mut start = 0;
        for &cut in cuts {
            demuxer.push(&raw[start..cut]);
            start = cut;
        }
        demuxer.push(&raw[start..]);
        demuxer.finish()
    }

    #[test]
    fn test_decodes_whole_stream() {
        let mut demuxer = FrameDemuxer::new();
        let lines = demuxer.push(&sample_stream());
        assert_eq!(
            texts(&lines),
            vec![
                "2024-01-01T00:00:00Z starting",
                "warning: low disk",
                "listening on :8080 ✓"
            ]
        );
        assert_eq!(lines[1].stream, StreamKind::Stderr);
        let decoded = demuxer.finish();
        assert_eq!(decoded.lines.len(), 3);
        assert_eq!(decoded.discarded, 0);
    }

    #[test]
    fn test_every_single_split_point_gives_same_output() {
        let raw = sample_stream();
        let expected = decode_in_chunks(&raw, &[]);
        for cut in 0..=raw.len() {
            assert_eq!(decode_in_chunks(&raw, &[cut]), expected, "split at {}", cut);
        }
    }

    #[test]
    fn test_byte_at_a_time_and_uneven_chunks() {
        let raw = sample_stream();
        let expected = decode_in_chunks(&raw, &[]);

        let every_byte: Vec<usize> = (1..raw.len()).collect();
        assert_eq!(decode_in_chunks(&raw, &every_byte), expected);

        // Cuts inside headers, between header and payload, mid-payload.
        let cuts = [3, 8, 9, 40, 45, 46, 47, 70];
        let cuts: Vec<usize> = cuts.into_iter().filter(|&c| c <= raw.len()).collect();
        assert_eq!(decode_in_chunks(&raw, &cuts), expected);
    }

    #[test]
    fn test_partial_header_is_kept_until_completed() {
        let frame = encode_frame(StreamKind::Stdout, b"hello");
        let mut demuxer = FrameDemuxer::new();
        assert!(demuxer.push(&frame[..5]).is_empty());
        assert_eq!(demuxer.pending(), 5);
        assert!(demuxer.push(&frame[5..10]).is_empty());
        assert_eq!(texts(&demuxer.push(&frame[10..])), vec!["hello"]);
        assert_eq!(demuxer.pending(), 0);
    }

    #[test]
    fn test_empty_stream_yields_sentinel() {
        let decoded = FrameDemuxer::new().finish();
        assert_eq!(decoded.lines.len(), 0);
        let logs = decoded.into_logs();
        assert!(logs.is_placeholder());
        assert_eq!(logs.display_lines(), vec![NO_LOGS_TEXT]);
    }

    #[test]
    fn test_only_blank_frames_yields_sentinel() {
        let mut demuxer = FrameDemuxer::new();
        demuxer.push(&encode_frame(StreamKind::Stdout, b"   \n"));
        demuxer.push(&encode_frame(StreamKind::Stderr, b""));
        assert_eq!(demuxer.finish().into_logs(), ContainerLogs::NoLogs);
    }

    #[test]
    fn test_trailing_partial_frame_is_discarded() {
        let mut raw = encode_frame(StreamKind::Stdout, b"first").to_vec();
        raw.extend_from_slice(&encode_frame(StreamKind::Stdout, b"second"));
        raw.extend_from_slice(&[1, 0, 0, 0, 0]);

        let mut demuxer = FrameDemuxer::new();
        demuxer.push(&raw);
        let decoded = demuxer.finish();
        assert_eq!(texts(&decoded.lines), vec!["first", "second"]);
        assert_eq!(decoded.discarded, 5);
    }

    #[test]
    fn test_truncated_payload_is_discarded() {
        let frame = encode_frame(StreamKind::Stdout, b"never finished");
        let mut demuxer = FrameDemuxer::new();
        demuxer.push(&encode_frame(StreamKind::Stdout, b"ok"));
        demuxer.push(&frame[..frame.len() - 3]);
        let decoded = demuxer.finish();
        assert_eq!(texts(&decoded.lines), vec!["ok"]);
        assert_eq!(decoded.discarded, frame.len() - 3);
    }

    #[test]
    fn test_unknown_tag_poisons_rest_of_stream() {
        let mut raw = encode_frame(StreamKind::Stdout, b"good").to_vec();
        raw.extend_from_slice(&[9, 0, 0, 0, 0, 0, 0, 2, b'x', b'y']);
        let mut demuxer = FrameDemuxer::new();
        assert_eq!(texts(&demuxer.push(&raw)), vec!["good"]);
        assert!(demuxer.push(&encode_frame(StreamKind::Stdout, b"late")).is_empty());
        let decoded = demuxer.finish();
        assert_eq!(texts(&decoded.lines), vec!["good"]);
        assert!(decoded.discarded > 0);
    }

    #[test]
    fn test_oversized_length_is_malformed() {
        let mut header = vec![1, 0, 0, 0];
        header.extend_from_slice(&((MAX_PAYLOAD_LEN as u32) + 1).to_be_bytes());
        let mut demuxer = FrameDemuxer::new();
        demuxer.push(&header);
        assert_eq!(demuxer.pending(), 0);
        assert_eq!(demuxer.finish().discarded, HEADER_LEN);
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let mut demuxer = FrameDemuxer::new();
        let lines = demuxer.push(&encode_frame(StreamKind::Stdout, b"bad \xff byte"));
        assert_eq!(lines[0].text, "bad \u{fffd} byte");
    }

    #[tokio::test]
    async fn test_decode_stream_over_chunks() {
        let raw = Bytes::from(sample_stream());
        let chunks: Vec<Result<Bytes, FetchFailure>> = raw
            .chunks(7)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        let decoded = decode_stream(futures_util::stream::iter(chunks)).await.unwrap();
        assert_eq!(decoded, decode_in_chunks(&raw, &[]));
    }

    #[tokio::test]
    async fn test_decode_stream_read_error_discards_partial_output() {
        let chunks = vec![
            Ok(encode_frame(StreamKind::Stdout, b"kept?")),
            Err(FetchFailure::new("abc", "connection reset")),
        ];
        let err = decode_stream(futures_util::stream::iter(chunks))
            .await
            .unwrap_err();
        assert_eq!(err.reason, "connection reset");
    }
}
