pub mod audio;
pub mod events;
pub mod model;
pub mod setup;
pub mod tools;
mod content;

pub use content::parts::{Blob, Content, Part};
pub use events::{ClientMessage, ServerMessage};
pub use model::{Modality, SupportedModel};
pub use setup::{Setup, SetupConfigurator};
