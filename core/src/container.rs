//! Container metadata and `.prot`/`.mka` parsing.

pub mod info;
pub mod play_settings;
pub mod prot;
