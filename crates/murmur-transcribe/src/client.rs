use std::io::{BufRead, BufReader};
use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;

use murmur_core::config::TranscriptionConfig;
use murmur_core::error::{MurmurError, Result};

use crate::sse::{parse_line, SseLine};

/// Streaming transcription client for one utterance per call.
///
/// Issues a blocking multipart POST and reads the server-sent event stream
/// line by line, forwarding each text delta to `on_delta` as it arrives.
/// Blocking is intentional: each call runs on its own short-lived worker
/// thread for the duration of the round-trip. No retries; a failed request
/// surfaces to the caller.
pub struct StreamingTranscriber {
    config: TranscriptionConfig,
    api_key: String,
    client: Client,
}

impl StreamingTranscriber {
    pub fn new(config: TranscriptionConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| MurmurError::Transcription(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    /// Transcribe a WAV payload, returning the concatenation of all text
    /// deltas in arrival order.
    ///
    /// The caller guarantees a non-empty payload (the empty-capture
    /// short-circuit happens upstream). An empty `language` means
    /// auto-detect and is omitted from the request entirely.
    pub fn transcribe(&self, wav: &[u8], on_delta: &dyn Fn(&str)) -> Result<String> {
        let url = format!(
            "{}/audio/transcriptions",
            self.config.base_url.trim_end_matches('/')
        );

        let audio_part = Part::bytes(wav.to_vec())
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| MurmurError::Transcription(format!("Failed to build audio part: {}", e)))?;

        let mut form = Form::new()
            .part("file", audio_part)
            .text("model", self.config.model.clone())
            .text("response_format", "text")
            .text("stream", "true");

        if !self.config.language.is_empty() {
            form = form.text("language", self.config.language.clone());
        }

        tracing::debug!(
            url = %url,
            model = %self.config.model,
            payload_bytes = wav.len(),
            "Sending transcription request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .map_err(|e| MurmurError::Transcription(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(MurmurError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let mut text = String::new();
        let reader = BufReader::new(response);
        for line in reader.lines() {
            let line =
                line.map_err(|e| MurmurError::Transcription(format!("Stream read failed: {}", e)))?;
            match parse_line(&line) {
                SseLine::Done => break,
                SseLine::Delta(delta) => {
                    on_delta(&delta);
                    text.push_str(&delta);
                }
                SseLine::Skip => {}
            }
        }

        tracing::debug!(text_len = text.len(), "Transcription stream complete");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{Shutdown, TcpListener};
    use std::sync::{Arc, Mutex};

    /// Minimal one-shot HTTP server: captures the request (headers + body)
    /// and replies with a canned response, then closes the connection.
    fn spawn_server(response: &'static str) -> (String, Arc<Mutex<Vec<u8>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let captured = Arc::new(Mutex::new(Vec::new()));
        let capture = Arc::clone(&captured);

        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request = Vec::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 {
                    break;
                }
                let lower = line.to_ascii_lowercase();
                if let Some(value) = lower.strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
                request.extend_from_slice(line.as_bytes());
                if line == "\r\n" {
                    break;
                }
            }
            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).unwrap();
            request.extend_from_slice(&body);
            *capture.lock().unwrap() = request;

            stream.write_all(response.as_bytes()).unwrap();
            let _ = stream.shutdown(Shutdown::Both);
        });

        (format!("http://{}", addr), captured)
    }

    fn transcriber(base_url: String, language: &str) -> StreamingTranscriber {
        let config = TranscriptionConfig {
            base_url,
            language: language.to_string(),
            ..TranscriptionConfig::default()
        };
        StreamingTranscriber::new(config, "sk-test".to_string()).unwrap()
    }

    const STREAM_OK: &str = "HTTP/1.1 200 OK\r\n\
        Content-Type: text/event-stream\r\n\
        Connection: close\r\n\
        \r\n\
        data: {\"text\":\"Hello \"}\n\
        \n\
        data: {\"text\":\"world!\"}\n\
        \n\
        data: [DONE]\n";

    #[test]
    fn test_streaming_deltas_concatenated_in_order() {
        let (base_url, _) = spawn_server(STREAM_OK);
        let t = transcriber(base_url, "");

        let deltas = Arc::new(Mutex::new(Vec::new()));
        let deltas_clone = Arc::clone(&deltas);
        let text = t
            .transcribe(b"RIFFfake", &move |d: &str| {
                deltas_clone.lock().unwrap().push(d.to_string())
            })
            .unwrap();

        assert_eq!(text, "Hello world!");
        assert_eq!(*deltas.lock().unwrap(), vec!["Hello ", "world!"]);
    }

    #[test]
    fn test_noise_lines_do_not_affect_transcript() {
        const NOISY: &str = "HTTP/1.1 200 OK\r\n\
            Content-Type: text/event-stream\r\n\
            Connection: close\r\n\
            \r\n\
            : keep-alive\n\
            event: transcript.text.delta\n\
            data: {\"text\":\"Hello \"}\n\
            data: {broken json\n\
            \n\
            data: {\"other\":\"field\"}\n\
            data: {\"text\":\"world!\"}\n\
            data: [DONE]\n\
            data: {\"text\":\"after done, never read\"}\n";
        let (base_url, _) = spawn_server(NOISY);
        let t = transcriber(base_url, "");

        let text = t.transcribe(b"RIFFfake", &|_| {}).unwrap();
        assert_eq!(text, "Hello world!");
    }

    #[test]
    fn test_connection_close_without_done_terminates() {
        const NO_DONE: &str = "HTTP/1.1 200 OK\r\n\
            Content-Type: text/event-stream\r\n\
            Connection: close\r\n\
            \r\n\
            data: {\"text\":\"partial\"}\n";
        let (base_url, _) = spawn_server(NO_DONE);
        let t = transcriber(base_url, "");

        let text = t.transcribe(b"RIFFfake", &|_| {}).unwrap();
        assert_eq!(text, "partial");
    }

    #[test]
    fn test_non_success_status_is_request_failed() {
        const UNAUTHORIZED: &str = "HTTP/1.1 401 Unauthorized\r\n\
            Content-Type: text/plain\r\n\
            Content-Length: 11\r\n\
            Connection: close\r\n\
            \r\n\
            bad api key";
        let (base_url, _) = spawn_server(UNAUTHORIZED);
        let t = transcriber(base_url, "");

        let err = t.transcribe(b"RIFFfake", &|_| {}).unwrap_err();
        match err {
            MurmurError::RequestFailed { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad api key");
            }
            other => panic!("Expected RequestFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_request_carries_model_stream_and_auth() {
        let (base_url, captured) = spawn_server(STREAM_OK);
        let t = transcriber(base_url, "");
        t.transcribe(b"RIFFfake", &|_| {}).unwrap();

        let request = String::from_utf8_lossy(&captured.lock().unwrap()).to_string();
        assert!(request.contains("POST /audio/transcriptions"));
        assert!(request.contains("authorization: Bearer sk-test")
            || request.contains("Authorization: Bearer sk-test"));
        assert!(request.contains("name=\"file\""));
        assert!(request.contains("filename=\"audio.wav\""));
        assert!(request.contains("name=\"model\""));
        assert!(request.contains("name=\"stream\""));
    }

    #[test]
    fn test_empty_language_is_omitted() {
        let (base_url, captured) = spawn_server(STREAM_OK);
        let t = transcriber(base_url, "");
        t.transcribe(b"RIFFfake", &|_| {}).unwrap();

        let request = String::from_utf8_lossy(&captured.lock().unwrap()).to_string();
        assert!(!request.contains("name=\"language\""));
    }

    #[test]
    fn test_language_hint_is_sent_when_set() {
        let (base_url, captured) = spawn_server(STREAM_OK);
        let t = transcriber(base_url, "de");
        t.transcribe(b"RIFFfake", &|_| {}).unwrap();

        let request = String::from_utf8_lossy(&captured.lock().unwrap()).to_string();
        assert!(request.contains("name=\"language\""));
        assert!(request.contains("de"));
    }
}
