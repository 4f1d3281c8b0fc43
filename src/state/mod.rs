pub mod app;
pub mod context;

pub use app::AppState;
pub use context::{Clock, EngineContext};
