//! Shared test transports.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use wapiti_lib::api::params::RequestFrame;
use wapiti_lib::error::TransportError;
use wapiti_lib::transport::Transport;

/// A transport that answers from a closure and records every frame sent.
///
/// The closure gets the zero-based call index and the frame.
pub struct MockTransport<F> {
    handler: F,
    delay: Option<Box<dyn Fn(&RequestFrame) -> Duration + Send + Sync>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    frames: Mutex<Vec<RequestFrame>>,
}

impl<F> MockTransport<F>
where
    F: Fn(usize, &RequestFrame) -> Result<String, TransportError> + Send + Sync,
{
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            frames: Mutex::new(Vec::new()),
        }
    }

    /// Sleeps before answering, for as long as `delay` says.
    pub fn with_delay(
        mut self,
        delay: impl Fn(&RequestFrame) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.delay = Some(Box::new(delay));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of sends that were in progress at the same time.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn frames(&self) -> Vec<RequestFrame> {
        self.frames.lock().unwrap().clone()
    }
}

#[async_trait]
impl<F> Transport for MockTransport<F>
where
    F: Fn(usize, &RequestFrame) -> Result<String, TransportError> + Send + Sync,
{
    async fn send(&self, frame: &RequestFrame) -> Result<String, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.frames.lock().unwrap().push(frame.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = &self.delay {
            tokio::time::sleep(delay(frame)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        (self.handler)(call, frame)
    }
}

/// Serializes a JSON value into a response body.
pub fn body(value: Value) -> Result<String, TransportError> {
    Ok(value.to_string())
}
