//! # dynamIT Shell — Hôte mobile pour l'application web dynamIT
//!
//! Coquille native minimale : une surface navigateur embarquée présente
//! l'application web hébergée à distance comme si elle était une application
//! native. Toute la valeur est dans l'intégration hôte — cycle de vie,
//! liste d'autorisation de navigation, décoration de l'affichage,
//! permissions de stockage, reprise sur erreurs réseau transitoires.
//!
//! ## Architecture des modules
//!
//! - [`host`] : Racine de composition. Enregistre les fournisseurs de
//!   capacités, décore l'affichage et possède l'unique surface.
//!
//! - [`lifecycle`] : Traduction des signaux de cycle de vie hôte en
//!   opérations sur la surface, et réception des événements de chargement.
//!
//! - [`settings`] : Profil statique de configuration de la surface, avec
//!   résolution selon la version de plateforme.
//!
//! - [`navigation`] : Liste d'autorisation des applications sœurs et
//!   classification des erreurs de chargement.
//!
//! - [`permissions`] : Sollicitation asynchrone de l'accès au stockage
//!   externe selon le régime de la plateforme.
//!
//! - [`retry`] / [`dispatch`] : Échelle de reprise à délais fixes sur la
//!   file principale coopérative (horloge virtuelle, testable hors
//!   périphérique).
//!
//! - [`surface`] / [`platform`] : Les coutures vers la plateforme — trait de
//!   la surface navigateur et modèle de niveau d'API.
//!
//! - [`headless`] : Backend d'enregistrement pour le binaire de test et les
//!   suites de tests.
//!
//! ## Modules futurs (non implémentés)
//!
//! - `jni` : Liaison vers la surface WebView Android réelle
//! - `ios` : Variante WKWebView

pub mod config;
pub mod dispatch;
pub mod headless;
pub mod host;
pub mod lifecycle;
pub mod navigation;
pub mod permissions;
pub mod platform;
pub mod retry;
pub mod settings;
pub mod surface;
