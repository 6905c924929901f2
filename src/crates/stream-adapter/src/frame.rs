//! SSE wire framing (spec §4.2 "SSE framing").

use bytes::Bytes;
use serde_json::Value;

/// Response headers every `/chat/stream` response must carry, so a
/// reverse-proxy or load balancer never buffers the stream.
pub const RESPONSE_HEADERS: &[(&str, &str)] = &[
    ("Cache-Control", "no-cache"),
    ("Connection", "keep-alive"),
    ("X-Accel-Buffering", "no"),
];

/// One AG-UI event, ready to encode as an SSE frame.
pub struct SseFrame {
    pub event: &'static str,
    pub data: Value,
}

impl SseFrame {
    pub fn new(event: &'static str, data: Value) -> Self {
        Self { event, data }
    }

    /// `event: <kind>\ndata: <json>\n\n`, flushed whole after every event.
    pub fn encode(&self) -> Bytes {
        let data = serde_json::to_string(&self.data).unwrap_or_else(|_| "null".to_string());
        Bytes::from(format!("event: {}\ndata: {}\n\n", self.event, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_event_and_data_lines_with_trailing_blank_line() {
        let frame = SseFrame::new("message_chunk", serde_json::json!({"delta": "hi"}));
        let encoded = String::from_utf8(frame.encode().to_vec()).unwrap();
        assert_eq!(encoded, "event: message_chunk\ndata: {\"delta\":\"hi\"}\n\n");
    }
}
