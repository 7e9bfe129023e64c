//! Screen resolution: auth gating plus on-demand materialization of
//! screen implementations with a preload cache.
//!
//! Every screen except welcome is materialized lazily through a
//! registered async loader. Slots move `absent -> loading -> ready`;
//! the loading marker is written before the load future runs, so two
//! overlapping preloads of the same screen can never trigger a
//! duplicate load. The cache only grows — with a six-screen universe
//! there is nothing to evict.

use crate::application::state::App;
use crate::domain::{ScreenId, User};
use futures::future::{BoxFuture, join_all};
use ratatui::{Frame, layout::Rect};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::warn;

/// A materialized screen implementation: something that can draw
/// itself into the kiosk's screen area from the current app state.
pub trait ScreenView: Send + Sync {
    fn render(&self, frame: &mut Frame<'_>, area: Rect, app: &App);
}

/// A shared, immutable renderable screen unit.
pub type ScreenUnit = Arc<dyn ScreenView>;

/// Deferred constructor for a screen unit. Loaders are registered per
/// screen id and invoked at most once per process on the happy path.
pub type ScreenLoader =
    Arc<dyn Fn() -> BoxFuture<'static, Result<ScreenUnit, String>> + Send + Sync>;

/// What the caller gets back for one render request.
#[derive(Clone)]
pub enum Rendered {
    /// The screen's module is still materializing; show the
    /// loading placeholder.
    Pending,
    /// Final unit; subsequent renders of this screen stay final.
    Ready(ScreenUnit),
}

/// Callbacks the resolver may invoke while resolving.
pub struct ScreenHandlers<'a> {
    pub on_screen_change: &'a mut dyn FnMut(ScreenId),
}

/// Authentication/session snapshot a render request is resolved
/// against.
pub struct ScreenContext<'a> {
    pub is_authenticated: bool,
    pub user: Option<&'a User>,
    pub handlers: ScreenHandlers<'a>,
}

enum Slot {
    Loading,
    Ready(ScreenUnit),
}

/// Maps a screen id plus session context to a renderable unit.
///
/// The welcome screen is eagerly resident and never suspends; it also
/// serves as the fallback for unauthenticated access to gated screens
/// and for ids with no registered loader.
pub struct ScreenResolver {
    welcome: ScreenUnit,
    loaders: HashMap<ScreenId, ScreenLoader>,
    slots: Arc<Mutex<HashMap<ScreenId, Slot>>>,
}

impl ScreenResolver {
    pub fn new(welcome: ScreenUnit, loaders: HashMap<ScreenId, ScreenLoader>) -> Self {
        Self {
            welcome,
            loaders,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<ScreenId, Slot>> {
        // A poisoned lock only means a load task panicked mid-insert;
        // the map itself is still usable.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The always-resident welcome unit.
    pub fn welcome_unit(&self) -> ScreenUnit {
        Arc::clone(&self.welcome)
    }

    /// Whether a screen's module is fully materialized.
    pub fn is_cached(&self, screen: ScreenId) -> bool {
        screen == ScreenId::Welcome
            || matches!(self.slots().get(&screen), Some(Slot::Ready(_)))
    }

    /// Resolves one render request.
    ///
    /// Gated screens viewed without an authenticated session redirect:
    /// the screen-change handler is invoked with `Welcome` and the
    /// welcome unit is returned in place of the requested one. This is
    /// a safety net independent of the navigation engine's own guards.
    ///
    /// A screen with no registered loader falls back to welcome with a
    /// logged warning; it never panics and never redirects.
    ///
    /// For an uncached screen the load is kicked off in the background
    /// and `Pending` is returned until it completes; a screen preloaded
    /// beforehand goes straight to `Ready` with no loading flash.
    pub fn render(&self, screen: ScreenId, ctx: &mut ScreenContext<'_>) -> Rendered {
        if screen.requires_auth() && !(ctx.is_authenticated && ctx.user.is_some()) {
            warn!(%screen, "unauthenticated render, redirecting to welcome");
            (ctx.handlers.on_screen_change)(ScreenId::Welcome);
            return Rendered::Ready(self.welcome_unit());
        }

        if screen == ScreenId::Welcome {
            return Rendered::Ready(self.welcome_unit());
        }

        match self.slots().get(&screen) {
            Some(Slot::Ready(unit)) => return Rendered::Ready(Arc::clone(unit)),
            Some(Slot::Loading) => return Rendered::Pending,
            None => {}
        }

        let Some(loader) = self.loaders.get(&screen) else {
            warn!(%screen, "no loader registered, falling back to welcome");
            return Rendered::Ready(self.welcome_unit());
        };

        self.slots().insert(screen, Slot::Loading);
        let load = loader();
        let slots = Arc::clone(&self.slots);
        tokio::spawn(async move {
            let outcome = load.await;
            let mut guard = slots.lock().unwrap_or_else(PoisonError::into_inner);
            match outcome {
                Ok(unit) => {
                    guard.insert(screen, Slot::Ready(unit));
                }
                Err(err) => {
                    warn!(%screen, error = %err, "screen load failed");
                    guard.remove(&screen);
                }
            }
        });
        Rendered::Pending
    }

    /// Best-effort concurrent materialization ahead of first render.
    ///
    /// Screens already cached or mid-load are skipped; a second caller
    /// observes the first's in-flight or completed load instead of
    /// triggering a duplicate. Load failures are logged, never
    /// propagated.
    pub async fn preload(&self, screens: &[ScreenId]) {
        let mut pending = Vec::new();
        {
            let mut slots = self.slots();
            for &screen in screens {
                if screen == ScreenId::Welcome || slots.contains_key(&screen) {
                    continue;
                }
                let Some(loader) = self.loaders.get(&screen) else {
                    warn!(%screen, "cannot preload screen without a loader");
                    continue;
                };
                slots.insert(screen, Slot::Loading);
                pending.push((screen, loader()));
            }
        }

        let loads = pending
            .into_iter()
            .map(|(screen, load)| async move { (screen, load.await) });
        for (screen, outcome) in join_all(loads).await {
            let mut slots = self.slots();
            match outcome {
                Ok(unit) => {
                    slots.insert(screen, Slot::Ready(unit));
                }
                Err(err) => {
                    warn!(%screen, error = %err, "screen preload failed");
                    slots.remove(&screen);
                }
            }
        }
    }
}
