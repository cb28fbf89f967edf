mod cdp_client;
mod collector;
mod driver;
mod readiness;
mod session;

pub use cdp_client::{CdpDriver, ChromeLauncher};
pub use collector::{ReviewCollector, ScrollState};
pub use driver::{BrowserDriver, BrowserLauncher, ElementHandle};
pub use readiness::wait_until;
pub use session::BrowserSession;
