//! Model types for the SoundTouch protocol

mod content_item;
mod now_playing;
mod operation_mode;
mod play_status;
mod preset;
mod remote_key;

pub use content_item::ContentItem;
pub use now_playing::{Art, NowPlaying};
pub use operation_mode::OperationMode;
pub use play_status::PlayStatus;
pub use preset::Preset;
pub use remote_key::RemoteKey;
