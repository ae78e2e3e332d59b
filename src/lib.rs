mod credential;
mod error;
pub mod prompt;
pub mod providers;
pub mod server;
mod settings;

pub use credential::ApiCredential;
pub use error::{GatewayError, Result};
pub use providers::{ImageProvider, ProviderImage, StableImage, TextToImage};
pub use server::{AppState, router};
pub use settings::Settings;
