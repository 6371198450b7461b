//! Coordination du cycle de vie hôte ↔ surface navigateur.
//!
//! L'hôte envoie ses signaux de cycle de vie (premier plan, arrière-plan,
//! destruction, mémoire basse, bouton retour) ; ce module les traduit en
//! opérations sur la surface embarquée. Les événements émis par la surface
//! elle-même (page démarrée, page terminée, erreur de chargement, progression)
//! arrivent sous forme de variantes [`SurfaceEvent`].
//!
//! ## Règles
//!
//! - Toute opération est un no-op si la surface est absente (journalisée en
//!   warning) ou déjà détruite (silencieux).
//! - Après `on_destroy`, plus aucune opération n'atteint la surface, y compris
//!   les rechargements différés encore en attente dans la file.
//! - Une erreur de chargement transitoire (timeout, résolution DNS) programme
//!   un rechargement unique après [`RELOAD_DELAY`](crate::navigation::RELOAD_DELAY).

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, error, info, warn};

use crate::dispatch::Dispatcher;
use crate::navigation::{LoadErrorKind, NavigationDecision, NavigationPolicy, RELOAD_DELAY};
use crate::surface::{BrowserSurface, SurfaceProvider};

/// Phase courante de l'hôte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Créé mais pas encore repris au premier plan.
    Initializing,
    /// Au premier plan.
    Running,
    /// En arrière-plan.
    Paused,
    /// Détruit. État terminal.
    Destroyed,
}

/// Événements remontés par la surface embarquée.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    PageStarted { url: String },
    PageFinished { url: String },
    LoadFailed {
        kind: LoadErrorKind,
        description: String,
        url: String,
    },
    Progress { percent: u8 },
}

/// Traduit les signaux de cycle de vie en opérations sur la surface.
pub struct LifecycleCoordinator {
    provider: Rc<dyn SurfaceProvider>,
    dispatcher: Rc<dyn Dispatcher>,
    state: Rc<Cell<LifecycleState>>,
    policy: NavigationPolicy,
}

impl LifecycleCoordinator {
    pub fn new(
        provider: Rc<dyn SurfaceProvider>,
        dispatcher: Rc<dyn Dispatcher>,
        state: Rc<Cell<LifecycleState>>,
        policy: NavigationPolicy,
    ) -> Self {
        Self {
            provider,
            dispatcher,
            state,
            policy,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state.get()
    }

    /// Retour au premier plan : reprise de la surface et de ses timers.
    pub fn on_resume(&self) {
        self.with_surface(|surface| {
            surface.resume();
            surface.resume_timers();
        });
        if self.state.get() != LifecycleState::Destroyed {
            self.state.set(LifecycleState::Running);
        }
    }

    /// Passage en arrière-plan : pause de la surface et de ses timers.
    pub fn on_pause(&self) {
        self.with_surface(|surface| {
            surface.pause();
            surface.pause_timers();
        });
        if self.state.get() != LifecycleState::Destroyed {
            self.state.set(LifecycleState::Paused);
        }
    }

    /// Démontage : purge complète puis destruction de la surface.
    pub fn on_destroy(&self) {
        self.with_surface(|surface| {
            surface.clear_cache(true);
            surface.clear_history();
            surface.remove_child_views();
            surface.destroy();
        });
        self.state.set(LifecycleState::Destroyed);
        info!(target: "WebView", "surface destroyed");
    }

    /// Pression mémoire : la surface libère ce qu'elle peut, cache mémoire
    /// seulement (le cache disque survit pour le prochain démarrage).
    pub fn on_low_memory(&self) {
        self.with_surface(|surface| {
            surface.free_memory();
            surface.clear_cache(false);
        });
    }

    /// Bouton retour. Consomme l'événement si la surface a un historique,
    /// sinon laisse l'hôte appliquer son comportement par défaut.
    pub fn on_back_pressed(&self) -> bool {
        if self.state.get() == LifecycleState::Destroyed {
            return false;
        }
        let Some(surface) = self.provider.surface() else {
            warn!(target: "WebView", "surface is null, back press falls through");
            return false;
        };
        let mut surface = surface.borrow_mut();
        if surface.can_go_back() {
            surface.go_back();
            true
        } else {
            false
        }
    }

    /// Politique de navigation pour une URL candidate.
    pub fn decide_navigation(&self, url: &str) -> NavigationDecision {
        let decision = self.policy.decide(url);
        if decision == NavigationDecision::DeferToHost {
            info!(target: "WebView", url, "deferring navigation to the host");
        }
        decision
    }

    /// Événements émis par la surface pendant le chargement.
    pub fn on_surface_event(&self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::PageStarted { url } => {
                info!(target: "WebView", %url, "started loading");
            }
            SurfaceEvent::PageFinished { url } => {
                info!(target: "WebView", %url, "finished loading");
            }
            SurfaceEvent::Progress { percent } => {
                debug!(target: "WebView", percent, "loading progress");
            }
            SurfaceEvent::LoadFailed {
                kind,
                description,
                url,
            } => {
                error!(
                    target: "WebView",
                    %url,
                    ?kind,
                    %description,
                    "error loading page"
                );
                if kind.is_transient() {
                    self.schedule_reload();
                }
            }
        }
    }

    /// Programme le rechargement post-erreur. Le délai peut survivre à la
    /// destruction ; le rechargement vérifie donc l'état au moment de tirer.
    fn schedule_reload(&self) {
        let provider = Rc::clone(&self.provider);
        let state = Rc::clone(&self.state);
        self.dispatcher.post_delayed(
            RELOAD_DELAY,
            Box::new(move || {
                if state.get() == LifecycleState::Destroyed {
                    return;
                }
                match provider.surface() {
                    Some(surface) => {
                        info!(target: "WebView", "reloading after transient error");
                        surface.borrow_mut().reload();
                    }
                    None => warn!(target: "WebView", "surface is null, skipping reload"),
                }
            }),
        );
    }

    fn with_surface(&self, op: impl FnOnce(&mut dyn BrowserSurface)) {
        if self.state.get() == LifecycleState::Destroyed {
            debug!(target: "WebView", "surface already destroyed, ignoring signal");
            return;
        }
        match self.provider.surface() {
            Some(surface) => op(&mut *surface.borrow_mut()),
            None => warn!(target: "WebView", "surface is null, ignoring signal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::dispatch::MainQueue;
    use crate::headless::{HeadlessProvider, HeadlessSurface, SurfaceOp};

    struct Fixture {
        queue: Rc<MainQueue>,
        surface: Rc<std::cell::RefCell<HeadlessSurface>>,
        coordinator: LifecycleCoordinator,
    }

    fn fixture() -> Fixture {
        let queue = Rc::new(MainQueue::new());
        let surface = HeadlessSurface::shared();
        let provider = Rc::new(HeadlessProvider::with_surface(surface.clone()));
        let coordinator = LifecycleCoordinator::new(
            provider,
            queue.clone(),
            Rc::new(Cell::new(LifecycleState::Initializing)),
            NavigationPolicy::default(),
        );
        Fixture {
            queue,
            surface,
            coordinator,
        }
    }

    #[test]
    fn test_resume_resumes_surface_and_timers() {
        let f = fixture();
        f.coordinator.on_resume();
        assert_eq!(
            f.surface.borrow().ops(),
            vec![SurfaceOp::Resume, SurfaceOp::ResumeTimers]
        );
        assert_eq!(f.coordinator.state(), LifecycleState::Running);
    }

    #[test]
    fn test_pause_pauses_surface_and_timers() {
        let f = fixture();
        f.coordinator.on_pause();
        assert_eq!(
            f.surface.borrow().ops(),
            vec![SurfaceOp::Pause, SurfaceOp::PauseTimers]
        );
        assert_eq!(f.coordinator.state(), LifecycleState::Paused);
    }

    #[test]
    fn test_destroy_tears_down_in_order() {
        let f = fixture();
        f.coordinator.on_destroy();
        assert_eq!(
            f.surface.borrow().ops(),
            vec![
                SurfaceOp::ClearCache { include_disk: true },
                SurfaceOp::ClearHistory,
                SurfaceOp::RemoveChildViews,
                SurfaceOp::Destroy,
            ]
        );
        assert_eq!(f.coordinator.state(), LifecycleState::Destroyed);
    }

    #[test]
    fn test_no_operation_reaches_surface_after_destroy() {
        let f = fixture();
        f.coordinator.on_destroy();
        let ops_after_destroy = f.surface.borrow().ops().len();

        f.coordinator.on_resume();
        f.coordinator.on_pause();
        f.coordinator.on_low_memory();
        assert!(!f.coordinator.on_back_pressed());
        assert_eq!(f.surface.borrow().ops().len(), ops_after_destroy);
        assert_eq!(f.coordinator.state(), LifecycleState::Destroyed);
    }

    #[test]
    fn test_low_memory_frees_and_clears_memory_cache_only() {
        let f = fixture();
        f.coordinator.on_low_memory();
        assert_eq!(
            f.surface.borrow().ops(),
            vec![
                SurfaceOp::FreeMemory,
                SurfaceOp::ClearCache {
                    include_disk: false
                },
            ]
        );
    }

    #[test]
    fn test_back_press_consumed_with_history() {
        let f = fixture();
        f.surface.borrow_mut().set_can_go_back(true);
        assert!(f.coordinator.on_back_pressed());
        assert_eq!(f.surface.borrow().ops(), vec![SurfaceOp::GoBack]);
    }

    #[test]
    fn test_back_press_falls_through_without_history() {
        let f = fixture();
        assert!(!f.coordinator.on_back_pressed());
        assert!(f.surface.borrow().ops().is_empty());
    }

    #[test]
    fn test_signals_are_no_ops_without_surface() {
        let queue = Rc::new(MainQueue::new());
        let coordinator = LifecycleCoordinator::new(
            Rc::new(HeadlessProvider::empty()),
            queue.clone(),
            Rc::new(Cell::new(LifecycleState::Initializing)),
            NavigationPolicy::default(),
        );
        coordinator.on_resume();
        coordinator.on_pause();
        coordinator.on_low_memory();
        assert!(!coordinator.on_back_pressed());
    }

    #[test]
    fn test_transient_error_reloads_after_delay() {
        let f = fixture();
        f.coordinator.on_surface_event(SurfaceEvent::LoadFailed {
            kind: LoadErrorKind::Timeout,
            description: "net::ERR_TIMED_OUT".into(),
            url: "https://avsec-it.vercel.app".into(),
        });

        f.queue.advance(Duration::from_millis(2999));
        assert!(f.surface.borrow().ops().is_empty());

        f.queue.advance(Duration::from_millis(1));
        assert_eq!(f.surface.borrow().ops(), vec![SurfaceOp::Reload]);
    }

    #[test]
    fn test_host_lookup_error_also_reloads() {
        let f = fixture();
        f.coordinator.on_surface_event(SurfaceEvent::LoadFailed {
            kind: LoadErrorKind::HostLookup,
            description: "net::ERR_NAME_NOT_RESOLVED".into(),
            url: "https://avsec-it.vercel.app".into(),
        });
        f.queue.run_until_idle();
        assert_eq!(f.surface.borrow().ops(), vec![SurfaceOp::Reload]);
    }

    #[test]
    fn test_non_transient_error_does_not_reload() {
        let f = fixture();
        f.coordinator.on_surface_event(SurfaceEvent::LoadFailed {
            kind: LoadErrorKind::Other,
            description: "net::ERR_BLOCKED_BY_RESPONSE".into(),
            url: "https://avsec-it.vercel.app".into(),
        });
        f.queue.run_until_idle();
        assert!(f.surface.borrow().ops().is_empty());
        assert!(f.queue.is_idle());
    }

    #[test]
    fn test_pending_reload_is_no_op_after_destroy() {
        let f = fixture();
        f.coordinator.on_surface_event(SurfaceEvent::LoadFailed {
            kind: LoadErrorKind::Timeout,
            description: "net::ERR_TIMED_OUT".into(),
            url: "https://avsec-it.vercel.app".into(),
        });
        f.coordinator.on_destroy();
        let ops_after_destroy = f.surface.borrow().ops();

        f.queue.run_until_idle();
        assert_eq!(f.surface.borrow().ops(), ops_after_destroy);
    }

    #[test]
    fn test_page_events_do_not_touch_surface() {
        let f = fixture();
        f.coordinator.on_surface_event(SurfaceEvent::PageStarted {
            url: "https://avsec-it.vercel.app".into(),
        });
        f.coordinator.on_surface_event(SurfaceEvent::Progress { percent: 60 });
        f.coordinator.on_surface_event(SurfaceEvent::PageFinished {
            url: "https://avsec-it.vercel.app".into(),
        });
        assert!(f.surface.borrow().ops().is_empty());
    }

    #[test]
    fn test_navigation_decisions_flow_through_policy() {
        let f = fixture();
        assert_eq!(
            f.coordinator.decide_navigation("https://dynamit-learn.vercel.app/x"),
            NavigationDecision::InSurface
        );
        assert_eq!(
            f.coordinator.decide_navigation("https://other.example.com"),
            NavigationDecision::DeferToHost
        );
    }
}
