pub mod lightbox;
pub mod loading;
pub mod showcase;
pub mod texture_cache;
pub mod window;
