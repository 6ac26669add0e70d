//! Pure domain logic shared by every other crate in the workspace.
//!
//! Nothing in here touches the database or the network; the only I/O is
//! the ffmpeg/ffprobe subprocess wrapper in [`ffmpeg`].

pub mod alert;
pub mod bbox;
pub mod confidence;
pub mod error;
pub mod ffmpeg;
pub mod query_parser;
pub mod sampling;
pub mod search;
pub mod types;
