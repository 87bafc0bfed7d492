//! Request handlers.

pub mod admin;
pub mod health;
pub mod history;
pub mod project;
pub mod proxy;
pub mod render;
pub mod scripts;
pub mod settings;
pub mod tts;
pub mod uploads;

pub use admin::*;
pub use health::*;
pub use history::*;
pub use project::*;
pub use proxy::*;
pub use render::*;
pub use scripts::*;
pub use settings::*;
pub use tts::*;
pub use uploads::*;
