//! Player lifecycle controller - owns the engine for one display element
//!
//! Coordinates:
//! - Capability gating before any engine resource exists
//! - DRM profile resolution and license filter registration
//! - Manifest load/unload, with stale completions discarded
//! - Position updates from the host
//! - Load and media event notifications
//!
//! ```text
//! Uninitialized ──▶ Ready ──load──▶ Loading ──ok──▶ Loaded
//!                     ▲               │  ▲            │
//!                     └────failed─────┘  └────load────┘
//! ```

use crate::{
    capability::{ensure_supported, MediaEnvironment},
    config::{parse_position, ElementAttributes, PlayerConfig},
    drm::{DrmProfile, DrmResolver},
    engine::{LoadFailure, MediaEngine},
    events::{event_names, EventStreamAdapter, EventSubscription, MediaEventTarget},
    notify::{HandleId, HostEvent, NotificationReceiver, Notifier},
    types::{ControllerState, LoadOutcome, PlaybackSource},
    Error, Result,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, instrument, warn};

struct Inner {
    state: ControllerState,
    /// Incremented for every load attempt and on shutdown
    generation: u64,
    source: Option<PlaybackSource>,
    /// Position to apply once the current load completes
    pending_position: Option<Duration>,
    events: Option<EventSubscription>,
}

/// Player handle managing one engine instance
pub struct PlayerController<E: MediaEngine> {
    id: HandleId,
    engine: E,
    config: PlayerConfig,
    profile: DrmProfile,
    key_id: String,
    inner: RwLock<Inner>,
    state_tx: watch::Sender<ControllerState>,
    notifier: Notifier,
}

impl<E: MediaEngine> PlayerController<E> {
    /// Check the environment, build the engine and configure DRM
    ///
    /// `create_engine` is only called once the environment is known to be
    /// supported. Must be called from within a tokio runtime.
    pub fn initialize<F>(
        env: &dyn MediaEnvironment,
        element: Arc<dyn MediaEventTarget>,
        key_id: impl Into<String>,
        config: PlayerConfig,
        create_engine: F,
    ) -> Result<(Self, NotificationReceiver)>
    where
        F: FnOnce() -> Result<E>,
    {
        ensure_supported(env)?;
        config.validate()?;

        let key_id = key_id.into();
        let id = HandleId::new();
        let (notifier, notifications) = Notifier::channel(id);

        // Dropped on every early return below, which detaches the listeners
        let events = EventStreamAdapter::subscribe(element, &event_names(&config.extra_events), notifier.clone());

        let profile = DrmResolver::new(config.drm.clone()).resolve(env.platform(), &key_id)?;

        let engine = create_engine()?;
        if let Err(e) = configure_engine(&engine, &config, &profile) {
            engine.destroy();
            return Err(e);
        }

        let (state_tx, _) = watch::channel(ControllerState::Uninitialized);
        let controller = Self {
            id,
            engine,
            config,
            profile,
            key_id,
            inner: RwLock::new(Inner {
                state: ControllerState::Ready,
                generation: 0,
                source: None,
                pending_position: None,
                events: Some(events),
            }),
            state_tx,
            notifier,
        };

        controller.state_tx.send_replace(ControllerState::Ready);
        info!(
            handle = %id,
            key_system = controller.profile.key_system(),
            from = %ControllerState::Uninitialized,
            to = %ControllerState::Ready,
            "Player initialized"
        );

        Ok((controller, notifications))
    }

    /// Get handle ID
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Get current state
    pub fn state(&self) -> ControllerState {
        *self.state_tx.borrow()
    }

    /// Subscribe to state changes
    pub fn subscribe_state(&self) -> watch::Receiver<ControllerState> {
        self.state_tx.subscribe()
    }

    /// DRM profile fixed at initialization
    pub fn profile(&self) -> &DrmProfile {
        &self.profile
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Source of the current or last load attempt
    pub async fn source(&self) -> Option<PlaybackSource> {
        self.inner.read().await.source.clone()
    }

    /// Media position in seconds
    pub fn position(&self) -> f64 {
        self.engine.current_time()
    }

    /// Load a manifest, unloading whatever is loaded or loading
    ///
    /// A failure is also published as [`HostEvent::LoadFailed`]; the handle
    /// stays usable for another attempt.
    #[instrument(skip(self, source), fields(handle = %self.id, url = %source.manifest_url))]
    pub async fn load(&self, source: PlaybackSource) -> Result<LoadOutcome> {
        let generation = self.begin_load(&source).await?;
        let result = self.engine.load(&source.manifest_url).await;
        self.complete_load(generation, &source, result).await
    }

    /// Replace the whole playback source
    ///
    /// Reloads unless the source is identical to the active one.
    pub async fn set_source(&self, source: PlaybackSource) -> Result<LoadOutcome> {
        {
            let inner = self.inner.read().await;
            let active = matches!(inner.state, ControllerState::Loading | ControllerState::Loaded);
            if active && inner.source.as_ref() == Some(&source) {
                debug!(handle = %self.id, "Source unchanged, not reloading");
                return Ok(LoadOutcome::Unchanged);
            }
        }

        self.load(source).await
    }

    /// Move the playback position without reloading
    pub async fn set_position(&self, position: Duration) {
        let mut inner = self.inner.write().await;
        match inner.state {
            ControllerState::Loaded => {
                debug!(handle = %self.id, to = position.as_secs_f64(), "Seeking");
                self.engine.set_current_time(position.as_secs_f64());
            }
            ControllerState::Loading => {
                debug!(handle = %self.id, to = position.as_secs_f64(), "Deferring position until load completes");
                inner.pending_position = Some(position);
            }
            state => {
                debug!(handle = %self.id, %state, "Nothing loaded, position ignored");
            }
        }
    }

    /// Like [`set_position`](Self::set_position), from a host string such as `"42"`
    pub async fn set_position_str(&self, position: &str) -> Result<()> {
        let position = parse_position(position)?;
        self.set_position(position).await;
        Ok(())
    }

    /// Unload, destroy the engine and detach event listeners
    pub async fn shutdown(&self) {
        let mut inner = self.inner.write().await;
        if inner.state == ControllerState::Uninitialized {
            return;
        }

        self.engine.unload();
        self.engine.destroy();
        inner.generation += 1;
        inner.source = None;
        inner.pending_position = None;
        inner.events.take();

        let from = inner.state;
        inner.state = ControllerState::Uninitialized;
        self.state_tx.send_replace(ControllerState::Uninitialized);
        info!(handle = %self.id, %from, to = %ControllerState::Uninitialized, "Player shut down");
    }

    async fn begin_load(&self, source: &PlaybackSource) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let current = inner.state;

        if !current.can_transition_to(ControllerState::Loading) {
            return Err(Error::InvalidStateTransition {
                from: current.to_string(),
                to: ControllerState::Loading.to_string(),
            });
        }

        if source.key_id != self.key_id {
            warn!(
                handle = %self.id,
                initial = %self.key_id,
                requested = %source.key_id,
                "Key id changed; DRM profile stays fixed for this handle"
            );
        }

        if matches!(current, ControllerState::Loaded | ControllerState::Loading) {
            info!(handle = %self.id, %current, "Unloading previous content");
            self.engine.unload();
        }

        inner.generation += 1;
        inner.source = Some(source.clone());
        inner.pending_position = source.initial_position;

        self.engine.apply_element_attributes(&ElementAttributes {
            poster_url: source.poster_url.clone(),
            autoplay: self.config.autoplay,
            muted: self.config.muted,
        });

        self.set_state(&mut inner, ControllerState::Loading);
        info!(handle = %self.id, generation = inner.generation, "Loading content");

        Ok(inner.generation)
    }

    async fn complete_load(
        &self,
        generation: u64,
        source: &PlaybackSource,
        result: std::result::Result<(), LoadFailure>,
    ) -> Result<LoadOutcome> {
        let mut inner = self.inner.write().await;

        if inner.generation != generation || inner.state != ControllerState::Loading {
            debug!(
                handle = %self.id,
                generation,
                current = inner.generation,
                "Discarding superseded load completion"
            );
            return Ok(LoadOutcome::Superseded);
        }

        match result {
            Ok(()) => {
                let tracks = self.engine.text_tracks();
                if let Some(track) = tracks.first() {
                    self.engine.set_text_track_visibility(true);
                    self.engine.select_text_track(track);
                    debug!(handle = %self.id, track = track.id, language = %track.language, "Text track selected");
                }

                if let Some(position) = inner.pending_position.take() {
                    self.engine.set_current_time(position.as_secs_f64());
                }

                self.engine.play();
                self.set_state(&mut inner, ControllerState::Loaded);
                drop(inner);

                info!(handle = %self.id, text_tracks = tracks.len(), "Content loaded");
                self.notifier.notify(HostEvent::Loaded {
                    manifest_url: source.manifest_url.clone(),
                });

                Ok(LoadOutcome::Loaded)
            }
            Err(failure) => {
                inner.pending_position = None;
                self.set_state(&mut inner, ControllerState::Ready);
                drop(inner);

                warn!(handle = %self.id, cause = %failure, "Manifest load failed");
                self.notifier.notify(HostEvent::LoadFailed {
                    manifest_url: source.manifest_url.clone(),
                    cause: failure.cause.clone(),
                });

                Err(Error::ManifestLoad {
                    url: source.manifest_url.clone(),
                    cause: failure.cause,
                })
            }
        }
    }

    /// Transition to new state
    fn set_state(&self, inner: &mut Inner, new_state: ControllerState) {
        let current = inner.state;
        debug_assert!(current.can_transition_to(new_state), "{current} -> {new_state}");

        inner.state = new_state;
        self.state_tx.send_replace(new_state);

        info!(handle = %self.id, from = %current, to = %new_state, "State transition");
    }
}

impl<E: MediaEngine> Drop for PlayerController<E> {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        if inner.state != ControllerState::Uninitialized {
            self.engine.unload();
            self.engine.destroy();
        }
        inner.events.take();
    }
}

fn configure_engine<E: MediaEngine>(engine: &E, config: &PlayerConfig, profile: &DrmProfile) -> Result<()> {
    engine.configure_overlay(&config.overlay)?;
    engine.configure_drm(profile)?;

    if let Some(filter) = profile.license_filter() {
        debug!(key_system = profile.key_system(), "Registering license protocol filter");
        engine.register_network_filter(filter);
    }

    Ok(())
}
