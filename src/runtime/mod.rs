pub mod fallback;
pub mod ffmpeg;
pub mod http_client;
pub mod inspector;
pub mod playback;
