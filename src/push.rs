use std::{
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
use futures::{
    channel::mpsc,
    stream::{FusedStream, Stream, StreamExt},
    SinkExt,
};
use log::{
    debug, info, warn
};
use tokio::task::{
    self,
    JoinHandle,
};

use crate::{
    error::SourceError,
    record::EvidenceRecord,
};

pub const LOG_UPDATE_EVENT: &str = "logUpdate";

const CHANNEL_CAPACITY: usize = 64;

// longest event-stream line kept, in bytes
const MAX_LINE_LEN: usize = 1 << 20;

// one dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,

    pub data: String,
}

/// Incremental `text/event-stream` decoder, fed with arbitrary body chunks.
///
/// Lines longer than the limit are dropped together with the event they belong to.
#[derive(Debug)]
pub struct SseDecoder {
    // bytes after the last complete line
    buffer: Vec<u8>,

    event: Option<String>,

    data: Vec<String>,

    max_line_len: usize,

    // skipping the rest of an oversized line
    discarding: bool,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_max_line_len(MAX_LINE_LEN)
    }
}

impl SseDecoder {
    pub fn with_max_line_len(max_line_len: usize) -> Self {
        SseDecoder {
            buffer: Vec::new(),
            event: None,
            data: Vec::new(),
            max_line_len: max_line_len,
            discarding: false,
        }
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if self.discarding {
                self.discarding = false;
                continue;
            }
            line.pop();
            if line.len() > self.max_line_len {
                self.drop_oversized();
                continue;
            }
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        if self.buffer.len() > self.max_line_len {
            self.buffer.clear();
            self.drop_oversized();
            self.discarding = true;
        }
        events
    }

    fn drop_oversized(&mut self) {
        debug!("Dropped an event-stream line longer than `{}` bytes.", self.max_line_len);
        self.event = None;
        self.data.clear();
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        // comment, usually a keep-alive
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),

            None => (line, ""),
        };
        match field {
            // an empty name means the default one
            "event" => self.event = Some(value.to_string()).filter(|name| !name.is_empty()),

            "data" => self.data.push(value.to_string()),

            // `id` and `retry` carry nothing the engine uses
            _ => {},
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = self.data.join("\n");
        self.data.clear();
        Some(SseEvent {
            event: event.unwrap_or_else(|| "message".to_string()),
            data: data,
        })
    }
}

// None for other event names and for payloads that are not records
pub fn decode_log_update(event: &SseEvent) -> Option<EvidenceRecord> {
    if event.event != LOG_UPDATE_EVENT {
        debug!("Ignored push event `{}`.", event.event);
        return None;
    }
    match serde_json::from_str::<EvidenceRecord>(&event.data) {
        Ok(record) => Some(record),

        Err(e) => {
            debug!("Dropped malformed `{LOG_UPDATE_EVENT}` payload: `{e}`");
            None
        },
    }
}

/// Live feed of pushed records.
///
/// Dropping the subscription (or calling [`Subscription::unsubscribe`]) stops the
/// background reader and closes the channel, nothing is delivered afterwards.
pub struct Subscription {
    records: mpsc::Receiver<EvidenceRecord>,

    task: Option<JoinHandle<()>>,
}

impl Subscription {
    // read `url` as an event stream, re-opening it after `reconnect_delay` when it drops
    pub fn connect(
        client: reqwest::Client,
        url: impl Into<String>,
        reconnect_delay: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let task = task::spawn(run_channel(client, url.into(), reconnect_delay, tx));
        Subscription {
            records: rx,
            task: Some(task),
        }
    }

    // a subscription fed by the returned sender instead of the network
    pub fn pair(buffer: usize) -> (mpsc::Sender<EvidenceRecord>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (
            tx,
            Subscription {
                records: rx,
                task: None,
            },
        )
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.records.close();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Stream for Subscription {
    type Item = EvidenceRecord;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.records.poll_next_unpin(cx)
    }
}

impl FusedStream for Subscription {
    fn is_terminated(&self) -> bool {
        self.records.is_terminated()
    }
}

async fn run_channel(
    client: reqwest::Client,
    url: String,
    reconnect_delay: Duration,
    mut tx: mpsc::Sender<EvidenceRecord>,
) {
    loop {
        match read_stream(&client, &url, &mut tx).await {
            Ok(()) => info!("Push channel `{url}` was closed."),

            Err(e) => warn!("Push channel `{url}` failed: `{e}`"),
        }
        if tx.is_closed() {
            break;
        }
        tokio::time::sleep(reconnect_delay).await;
    }
}

async fn read_stream(
    client: &reqwest::Client,
    url: &str,
    tx: &mut mpsc::Sender<EvidenceRecord>,
) -> Result<(), SourceError> {
    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status(status.as_u16()));
    }
    info!("Subscribed to push channel `{url}`.");
    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::default();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        for event in decoder.feed(&chunk) {
            let Some(record) = decode_log_update(&event) else {
                continue;
            };
            if tx.send(record).await.is_err() {
                // unsubscribed
                return Ok(());
            }
        }
    }
    Ok(())
}
