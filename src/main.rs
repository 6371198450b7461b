//! Point d'entrée du dynamIT Shell.
//!
//! Usage :
//!   dynamit-shell [URL]
//!
//! Exemples :
//!   cargo run                                      → charge https://avsec-it.vercel.app
//!   cargo run -- https://dynamit-learn.vercel.app  → charge l'application learn
//!   cargo run -- dynamit-learn.vercel.app          → ajoute https:// automatiquement
//!
//! Sans périphérique, le binaire déroule une session hôte scriptée contre le
//! backend headless : création, configuration par échelle de reprise,
//! chargement de la page, premier plan/arrière-plan, pression mémoire,
//! bouton retour, destruction. Le journal (RUST_LOG) montre chaque étape.

use std::cell::RefCell;
use std::env;
use std::error::Error;
use std::rc::Rc;

use tracing::info;
use url::Url;

use dynamit_shell::config::ShellConfig;
use dynamit_shell::dispatch::MainQueue;
use dynamit_shell::headless::{
    HeadlessFrame, HeadlessPermissions, HeadlessProvider, HeadlessSurface,
};
use dynamit_shell::host::HostController;
use dynamit_shell::lifecycle::SurfaceEvent;
use dynamit_shell::surface::BrowserSurface;

fn main() -> Result<(), Box<dyn Error>> {
    // ── 1. Logging / Tracing ───────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // ── 2. Configuration ───────────────────────────────────────────────
    let config = ShellConfig::load();
    let api = config.api_level();
    let start_url = match parse_url_from_args() {
        Some(url) => url,
        None => config.start_url()?,
    };

    // ── 3. Backend headless + file principale ──────────────────────────
    let queue = Rc::new(MainQueue::new());
    let surface = HeadlessSurface::shared();
    let provider = Rc::new(HeadlessProvider::with_surface(surface.clone()));
    let frame = Rc::new(RefCell::new(HeadlessFrame::new()));
    let permissions = Rc::new(HeadlessPermissions::new());

    let mut controller =
        HostController::new(provider, frame, permissions, queue.clone(), api);

    // ── 4. Session scriptée ────────────────────────────────────────────
    controller.on_create();
    queue.run_until_idle();
    info!(
        %api,
        configured = controller.is_configured(),
        "create phase complete"
    );

    surface.borrow_mut().load(start_url.as_str());
    controller.on_surface_event(SurfaceEvent::PageStarted {
        url: start_url.to_string(),
    });
    controller.on_surface_event(SurfaceEvent::Progress { percent: 100 });
    controller.on_surface_event(SurfaceEvent::PageFinished {
        url: start_url.to_string(),
    });
    controller.on_resume();

    // Décisions de navigation sur quelques URLs candidates.
    for candidate in [
        "https://dynamit-learn.vercel.app/courses",
        "https://other.example.com",
    ] {
        let decision = controller.decide_navigation(candidate);
        info!(candidate, ?decision, "navigation decision");
    }

    controller.on_low_memory();
    let back_consumed = controller.on_back_pressed();
    info!(back_consumed, "back press");

    controller.on_pause();
    controller.on_destroy();
    queue.run_until_idle();
    info!(state = ?controller.state(), "session complete");

    Ok(())
}

/// Parse le premier argument CLI comme URL.
/// Si l'argument ne contient pas de schéma (http/https), on ajoute "https://".
fn parse_url_from_args() -> Option<Url> {
    let input = env::args()
        .skip(1) // Skip binary name
        .find(|arg| !arg.starts_with("--"))?;

    // Essaie de parser directement (fonctionne si l'utilisateur a mis le schéma)
    if let Ok(url) = Url::parse(&input) {
        return Some(url);
    }

    // Sinon, ajoute https:// et réessaie
    Some(
        Url::parse(&format!("https://{input}"))
            .unwrap_or_else(|e| panic!("URL invalide '{input}': {e}")),
    )
}
