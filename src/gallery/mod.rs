pub mod images;
pub mod lifecycle;
pub mod session;
pub mod swipe;

pub use images::unit_image_paths;
pub use lifecycle::LightboxLifecycle;
pub use session::{Direction, GallerySession};
pub use swipe::{SwipeOutcome, SwipeTracker};
