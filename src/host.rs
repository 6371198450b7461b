//! Racine de composition du shell.
//!
//! Le contrôleur hôte possède l'unique surface navigateur (via son provider)
//! et câble les autres morceaux : enregistrement des fournisseurs de
//! capacités exposés au contenu web, décoration de l'affichage (orientation,
//! encoche, barre d'état), sollicitation du stockage via le
//! [`PermissionBroker`], et application du profil de configuration à travers
//! l'échelle de reprise [`CONFIGURE_LADDER`].
//!
//! ## Contrat d'intégration
//!
//! Le framework hôte invoque `on_create` pendant sa phase de création, avant
//! de finaliser sa propre initialisation (l'enregistrement des capacités doit
//! la précéder), et `on_destroy` avant son propre démontage ; tous les autres
//! signaux sont relayés tels quels. Tout s'exécute sur la file principale —
//! aucun thread n'est créé ici.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{info, warn};

use crate::dispatch::Dispatcher;
use crate::lifecycle::{LifecycleCoordinator, LifecycleState, SurfaceEvent};
use crate::navigation::{NavigationDecision, NavigationPolicy};
use crate::permissions::{PermissionBroker, PermissionRequest, PermissionsHost};
use crate::platform::ApiLevel;
use crate::retry::{self, CONFIGURE_LADDER};
use crate::settings::{self, SettingsProfile, REMOTE_APP_PROFILE};
use crate::surface::SurfaceProvider;

/// Fournisseurs de capacités exposés au contenu embarqué, dans l'ordre
/// d'enregistrement.
pub const CAPABILITY_PROVIDERS: [&str; 10] = [
    "push-notifications",
    "local-notifications",
    "filesystem",
    "camera",
    "preferences",
    "network-status",
    "app",
    "in-app-browser",
    "splash-screen",
    "status-bar",
];

/// Fond de la barre d'état, assorti au thème clair de l'application web.
pub const STATUS_BAR_COLOR: &str = "#FAFAFF";

/// Façade du cadre d'affichage hôte : registre de capacités, décoration de
/// la fenêtre et indications au runtime.
pub trait HostFrame {
    /// Expose un fournisseur de capacité nommé au pont web.
    fn register_capability(&mut self, name: &'static str);

    /// Verrouille l'orientation en portrait.
    fn lock_portrait(&mut self);

    /// Étend le rendu sous l'encoche sur les bords courts.
    fn layout_into_cutout_short_edges(&mut self);

    /// Couleur de fond de la barre d'état (hex `#RRGGBB`).
    fn set_status_bar_color(&mut self, color: &str);

    /// Icônes sombres sur barre d'état claire.
    fn set_status_bar_dark_icons(&mut self, dark: bool);

    /// Suggère au runtime de récupérer de la mémoire.
    fn advise_memory_trim(&mut self);
}

/// Le contrôleur hôte. Une instance par surface.
pub struct HostController {
    frame: Rc<RefCell<dyn HostFrame>>,
    provider: Rc<dyn SurfaceProvider>,
    permissions_host: Rc<dyn PermissionsHost>,
    dispatcher: Rc<dyn Dispatcher>,
    api: ApiLevel,
    profile: SettingsProfile,
    broker: PermissionBroker,
    lifecycle: LifecycleCoordinator,
    state: Rc<Cell<LifecycleState>>,
    configured: Rc<Cell<bool>>,
}

impl HostController {
    pub fn new(
        provider: Rc<dyn SurfaceProvider>,
        frame: Rc<RefCell<dyn HostFrame>>,
        permissions_host: Rc<dyn PermissionsHost>,
        dispatcher: Rc<dyn Dispatcher>,
        api: ApiLevel,
    ) -> Self {
        let state = Rc::new(Cell::new(LifecycleState::Initializing));
        let lifecycle = LifecycleCoordinator::new(
            Rc::clone(&provider),
            Rc::clone(&dispatcher),
            Rc::clone(&state),
            NavigationPolicy::default(),
        );
        Self {
            frame,
            provider,
            permissions_host,
            dispatcher,
            api,
            profile: REMOTE_APP_PROFILE,
            broker: PermissionBroker::new(api),
            lifecycle,
            state,
            configured: Rc::new(Cell::new(false)),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state.get()
    }

    /// Le profil a-t-il été appliqué avec succès ?
    pub fn is_configured(&self) -> bool {
        self.configured.get()
    }

    /// Sollicitation de stockage en cours ou résolue.
    pub fn permission_request(&self) -> Option<PermissionRequest> {
        self.broker.request()
    }

    /// Phase de création.
    pub fn on_create(&mut self) {
        // ── 1. Fournisseurs de capacités ───────────────────────────────
        {
            let mut frame = self.frame.borrow_mut();
            for name in CAPABILITY_PROVIDERS {
                frame.register_capability(name);
            }
        }
        info!(capabilities = CAPABILITY_PROVIDERS.len(), "capability providers registered");

        // ── 2. Accès au stockage ───────────────────────────────────────
        self.broker.elicit_storage_access(self.permissions_host.as_ref());

        // ── 3. Décoration de l'affichage ───────────────────────────────
        self.decorate_display();

        // ── 4. Configuration de la surface via l'échelle de reprise ────
        self.schedule_configuration();
    }

    pub fn on_resume(&self) {
        self.lifecycle.on_resume();
    }

    pub fn on_pause(&self) {
        self.lifecycle.on_pause();
    }

    pub fn on_destroy(&self) {
        self.lifecycle.on_destroy();
    }

    pub fn on_low_memory(&self) {
        self.lifecycle.on_low_memory();
        if self.state.get() != LifecycleState::Destroyed {
            self.frame.borrow_mut().advise_memory_trim();
        }
    }

    /// `true` si l'événement retour a été consommé par la surface.
    pub fn on_back_pressed(&self) -> bool {
        self.lifecycle.on_back_pressed()
    }

    pub fn on_surface_event(&self, event: SurfaceEvent) {
        self.lifecycle.on_surface_event(event);
    }

    pub fn decide_navigation(&self, url: &str) -> NavigationDecision {
        self.lifecycle.decide_navigation(url)
    }

    /// Réponse du dialogue de permissions runtime.
    pub fn on_permissions_result(&mut self, request_code: i32, grants: &[bool]) {
        self.broker.on_permissions_result(request_code, grants);
    }

    /// Retour du panneau de réglages tous-fichiers.
    pub fn on_panel_result(&mut self, request_code: i32) {
        self.broker
            .on_panel_result(request_code, self.permissions_host.as_ref());
    }

    fn decorate_display(&self) {
        let mut frame = self.frame.borrow_mut();
        frame.lock_portrait();
        if self.api.at_least(ApiLevel::P) {
            frame.layout_into_cutout_short_edges();
        }
        if self.api.at_least(ApiLevel::LOLLIPOP) {
            frame.set_status_bar_color(STATUS_BAR_COLOR);
            if self.api.at_least(ApiLevel::M) {
                frame.set_status_bar_dark_icons(true);
            }
        }
    }

    fn schedule_configuration(&self) {
        let provider = Rc::clone(&self.provider);
        let configured = Rc::clone(&self.configured);
        let state = Rc::clone(&self.state);
        let profile = self.profile.clone();
        let api = self.api;

        retry::schedule(
            Rc::clone(&self.dispatcher),
            CONFIGURE_LADDER,
            move || {
                // Succès déjà acquis ou hôte détruit : plus rien à tenter.
                if configured.get() || state.get() == LifecycleState::Destroyed {
                    return true;
                }
                if settings::configure_surface(provider.as_ref(), &profile, api) {
                    configured.set(true);
                    true
                } else {
                    false
                }
            },
            || {
                warn!(
                    target: "WebView",
                    "surface configuration failed on every attempt, continuing unconfigured"
                );
            },
        );
    }
}
