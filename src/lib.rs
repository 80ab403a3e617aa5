//! Launchdesk - backend services for a startup portfolio platform
//!
//! Launchdesk connects startups with mentors and investors: connect
//! requests with fee/equity negotiation, mentor assignments gated on
//! payment and a signed agreement, plan-tier subscriptions with
//! country-aware gateway selection, and Google Meet scheduling.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use launchdesk::ConfigBuilder;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Initialize logging
//!     launchdesk::init_tracing();
//!
//!     let config = ConfigBuilder::new().from_env().build().unwrap();
//!
//!     // Wire stores and gateway clients, then serve:
//!     // let state = AppState { .. };
//!     // axum::serve(listener, launchdesk::http::api_router(state)).await.unwrap();
//!     let _ = config;
//! }
//! ```

pub mod billing;
mod config;
mod error;
pub mod http;
pub mod identity;
pub mod meet;
pub mod mentorship;
pub mod payments;

// Re-exports for public API
pub use billing::{
    EffectiveSubscription, EntitlementsManager, PaymentGateway, PlanInterval, PlanTier,
    StoredSubscription, SubscriptionManager, SubscriptionStatus, select_payment_gateway,
};
pub use config::{
    Config, ConfigBuilder, LoggingConfig, PayPalConfig, RazorpayConfig, ServerConfig,
};
pub use error::{LaunchdeskError, Result};
pub use http::AppState;
pub use identity::{AuthUserId, IdentityResolver, ProfileId};
pub use meet::{CalendarClient, GoogleCalendarClient, MeetLinkGenerator, ServiceAccountKey};
pub use mentorship::{
    ConnectRequestInput, EngagementTerms, MentorAssignment, MentorRequest, MentorshipManager,
    RequestStatus,
};
pub use payments::{PaymentConfirmation, PaymentEvents, PaymentManager};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// This should be called early in your application, typically in main().
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "launchdesk=debug")
/// - `LAUNCHDESK_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("LAUNCHDESK_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Initialize tracing with a custom configuration
pub fn init_tracing_with_config(config: &Config) {
    let env_filter = EnvFilter::new(&config.logging.level);

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
