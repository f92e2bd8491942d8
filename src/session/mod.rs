pub mod driver;
pub mod effects;
pub mod registry;
pub mod state;

pub use driver::SessionDriver;
pub use effects::{Effect, RouteOutcome};
pub use registry::SessionRegistry;
pub use state::{Session, SessionStatus};
