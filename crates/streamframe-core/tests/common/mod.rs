//! Test doubles for the engine and the display element

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use streamframe_core::{
    DrmProfile, ElementAttributes, EventSink, ListenerId, LoadFailure, MediaEngine, MediaEvent, MediaEventTarget,
    NetworkFilter, OverlayConfig, TextTrack,
};
use tokio::sync::oneshot;

/// Engine call log entries
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ConfigureDrm(&'static str),
    ConfigureOverlay,
    Attributes(ElementAttributes),
    RegisterFilter,
    Load(String),
    Unload,
    SelectTextTrack(u64),
    TextTrackVisibility(bool),
    Play,
    SetCurrentTime(f64),
    Destroy,
}

#[derive(Default)]
struct Shared {
    calls: Mutex<Vec<Call>>,
    outcomes: Mutex<HashMap<String, Result<(), LoadFailure>>>,
    gated: Mutex<HashSet<String>>,
    pending: Mutex<HashMap<String, oneshot::Sender<Result<(), LoadFailure>>>>,
    text_tracks: Mutex<Vec<TextTrack>>,
    position: Mutex<f64>,
    filters: Mutex<Vec<Arc<dyn NetworkFilter>>>,
    fail_drm: Mutex<bool>,
}

/// Scriptable engine; clones share state
#[derive(Clone, Default)]
pub struct FakeEngine {
    shared: Arc<Shared>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text_tracks(self, tracks: Vec<TextTrack>) -> Self {
        *self.shared.text_tracks.lock().unwrap() = tracks;
        self
    }

    /// Resolve loads of `url` with `outcome` from now on
    pub fn set_outcome(&self, url: &str, outcome: Result<(), LoadFailure>) {
        self.shared.outcomes.lock().unwrap().insert(url.to_string(), outcome);
    }

    /// Hold the next load of `url` until [`release`](Self::release)
    pub fn gate(&self, url: &str) {
        self.shared.gated.lock().unwrap().insert(url.to_string());
    }

    pub fn release(&self, url: &str, outcome: Result<(), LoadFailure>) {
        let tx = self.shared.pending.lock().unwrap().remove(url);
        if let Some(tx) = tx {
            let _ = tx.send(outcome);
        }
    }

    /// Wait until a gated load of `url` is parked in the engine
    pub async fn wait_for_pending(&self, url: &str) {
        loop {
            if self.shared.pending.lock().unwrap().contains_key(url) {
                return;
            }
            tokio::task::yield_now().await;
        }
    }

    pub fn fail_drm_configuration(&self) {
        *self.shared.fail_drm.lock().unwrap() = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.shared.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    /// Only load/unload calls, in order
    pub fn load_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Load(_) | Call::Unload))
            .collect()
    }

    pub fn filters(&self) -> Vec<Arc<dyn NetworkFilter>> {
        self.shared.filters.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.shared.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MediaEngine for FakeEngine {
    fn configure_drm(&self, profile: &DrmProfile) -> streamframe_core::Result<()> {
        if *self.shared.fail_drm.lock().unwrap() {
            return Err(streamframe_core::Error::Engine("key system not available".into()));
        }
        self.record(Call::ConfigureDrm(profile.key_system()));
        Ok(())
    }

    fn configure_overlay(&self, _overlay: &OverlayConfig) -> streamframe_core::Result<()> {
        self.record(Call::ConfigureOverlay);
        Ok(())
    }

    fn apply_element_attributes(&self, attributes: &ElementAttributes) {
        self.record(Call::Attributes(attributes.clone()));
    }

    fn register_network_filter(&self, filter: Arc<dyn NetworkFilter>) {
        self.record(Call::RegisterFilter);
        self.shared.filters.lock().unwrap().push(filter);
    }

    async fn load(&self, manifest_url: &str) -> Result<(), LoadFailure> {
        self.record(Call::Load(manifest_url.to_string()));

        let gate = if self.shared.gated.lock().unwrap().remove(manifest_url) {
            let (tx, rx) = oneshot::channel();
            self.shared.pending.lock().unwrap().insert(manifest_url.to_string(), tx);
            Some(rx)
        } else {
            None
        };

        match gate {
            Some(rx) => rx.await.unwrap_or_else(|_| Err(LoadFailure::new("load cancelled"))),
            None => {
                let outcome = self.shared.outcomes.lock().unwrap().get(manifest_url).cloned();
                outcome.unwrap_or(Ok(()))
            }
        }
    }

    fn unload(&self) {
        self.record(Call::Unload);
        *self.shared.position.lock().unwrap() = 0.0;
    }

    fn text_tracks(&self) -> Vec<TextTrack> {
        self.shared.text_tracks.lock().unwrap().clone()
    }

    fn select_text_track(&self, track: &TextTrack) {
        self.record(Call::SelectTextTrack(track.id));
    }

    fn set_text_track_visibility(&self, visible: bool) {
        self.record(Call::TextTrackVisibility(visible));
    }

    fn play(&self) {
        self.record(Call::Play);
    }

    fn current_time(&self) -> f64 {
        *self.shared.position.lock().unwrap()
    }

    fn set_current_time(&self, seconds: f64) {
        self.record(Call::SetCurrentTime(seconds));
        *self.shared.position.lock().unwrap() = seconds;
    }

    fn destroy(&self) {
        self.record(Call::Destroy);
    }
}

/// Display element dispatching events to registered listeners
#[derive(Default)]
pub struct FakeVideoElement {
    next_listener: Mutex<u64>,
    next_event: Mutex<u64>,
    listeners: Mutex<HashMap<ListenerId, (String, EventSink)>>,
}

impl FakeVideoElement {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Dispatch a fresh native event
    pub fn fire(&self, name: &str) -> MediaEvent {
        let id = {
            let mut next = self.next_event.lock().unwrap();
            *next += 1;
            *next
        };
        let event = MediaEvent::new(name, id, 0.0);
        self.dispatch(&event);
        event
    }

    /// Deliver an already dispatched event again
    pub fn dispatch(&self, event: &MediaEvent) {
        for (name, sink) in self.listeners.lock().unwrap().values() {
            if *name == event.name {
                let _ = sink.send(event.clone());
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }
}

impl MediaEventTarget for FakeVideoElement {
    fn add_listener(&self, name: &str, sink: EventSink) -> ListenerId {
        let mut next = self.next_listener.lock().unwrap();
        *next += 1;
        let id = ListenerId(*next);
        self.listeners.lock().unwrap().insert(id, (name.to_string(), sink));
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners.lock().unwrap().remove(&id);
    }
}
