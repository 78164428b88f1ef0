pub mod alerts;
pub mod android_jni;
pub mod config;
pub mod error;
pub mod events;
pub mod geo;
pub mod gpx;
pub mod route;
pub mod route_nav;
pub mod session;
pub mod simulator;
pub mod timer;

pub use config::NavConfig;
pub use error::NavError;
pub use events::{Announcer, NavEvent};
pub use geo::{Coordinate, Path};
pub use route::{Location, Route, RouteProvider};
pub use route_nav::{generate_steps, Maneuver, NavigationStep};
pub use session::{NavigationSession, Navigator, Phase};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging for Android.
#[cfg(target_os = "android")]
pub fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("routeguide"),
    );
}

/// No-op off Android; the host installs its own `log` backend.
#[cfg(not(target_os = "android"))]
pub fn init_logging() {}
