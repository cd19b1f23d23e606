// Full-screen lightbox for the showcase.
// Features:
// - One session per open: unit image list + wrapped cursor + direction hint
// - Three input paths (thumbnail/button clicks, arrow keys, pointer swipe)
//   all funnel through the same cursor mutations
// - Every render replaces the main picture wholesale, so in-flight drag
//   transforms and entrance animations die with the old widget
// - Full-size decodes run off-thread behind a generation counter; neighbors
//   are prefetched into a byte-capped LRU texture cache

use gdk4::{Key, Texture};
use gtk4::prelude::*;
use gtk4::subclass::prelude::*;
use gtk4::{
    glib, graphene, gsk, Align, Box as GtkBox, Button, Fixed, GestureClick, GestureDrag, Label,
    Orientation, Overlay, Picture, PolicyType, ScrolledWindow, TickCallbackId, Widget,
};
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::gallery::swipe::SwipeOutcome;
use crate::gallery::{GallerySession, LightboxLifecycle, SwipeTracker};
use crate::ui::loading::{
    decode_downscaled, decode_full, texture_from_rgba, LoadedImage, PrefetchPool, PrefetchResult,
};
use crate::ui::texture_cache::{CacheEntry, ImageCache, ImageKind};

/// Length of the closing transition before teardown runs.
const CLOSE_TRANSITION_MS: u64 = 200;
/// Length of the snap-back / slide-in easing.
const EASE_MS: f64 = 200.0;
/// Horizontal offset a directional slide-in starts from.
const SLIDE_IN_OFFSET_PX: f64 = 40.0;
/// Opacity a directional slide-in starts from.
const SLIDE_IN_OPACITY: f64 = 0.55;
/// Longest side for thumbnail-strip decodes.
const THUMB_DECODE_SIZE: u32 = 160;
/// Displayed thumbnail cell size.
const THUMB_W: i32 = 96;
const THUMB_H: i32 = 64;
const DEFAULT_CACHE_MB: usize = 128;

fn cache_bytes() -> usize {
    std::env::var("HAUSBLICK_CACHE_MB")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .map(|mb| mb * 1024 * 1024)
        .unwrap_or(DEFAULT_CACHE_MB * 1024 * 1024)
}

type ScrollLockCallback = Rc<dyn Fn(bool)>;

struct LoadDone {
    path: PathBuf,
    image: LoadedImage,
}

/// Generation counter that lets a new drag or render cancel a running
/// easing animation without holding on to its tick callback id.
#[derive(Debug, Default)]
struct EaseGate {
    generation: Cell<u64>,
}

impl EaseGate {
    /// Start a new animation, superseding any running one.
    fn begin(&self) -> u64 {
        let generation = self.generation.get().wrapping_add(1);
        self.generation.set(generation);
        generation
    }

    /// Cancel whatever animation is running.
    fn cancel(&self) {
        self.generation.set(self.generation.get().wrapping_add(1));
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.get() == generation
    }
}

/// Aspect-fit rectangle `(x, y, w, h)` of displayed content inside an area.
fn contain_rect(area_w: f64, area_h: f64, content_w: f64, content_h: f64) -> (f64, f64, f64, f64) {
    if area_w <= 0.0 || area_h <= 0.0 || content_w <= 0.0 || content_h <= 0.0 {
        return (0.0, 0.0, area_w.max(0.0), area_h.max(0.0));
    }
    let scale = (area_w / content_w).min(area_h / content_h);
    let w = content_w * scale;
    let h = content_h * scale;
    ((area_w - w) / 2.0, (area_h - h) / 2.0, w, h)
}

/// Whether a click at `(x, y)` inside the picture widget landed on the
/// letterbox gutters around the displayed image rather than the image.
fn point_on_letterbox(
    area_w: f64,
    area_h: f64,
    content_w: f64,
    content_h: f64,
    x: f64,
    y: f64,
) -> bool {
    let (rx, ry, rw, rh) = contain_rect(area_w, area_h, content_w, content_h);
    x < rx || y < ry || x >= rx + rw || y >= ry + rh
}

/// Keys the page scroller would react to; swallowed while the lightbox is
/// open so the page underneath cannot move.
fn is_page_scroll_key(key: Key) -> bool {
    matches!(
        key,
        Key::Up | Key::Down | Key::Page_Up | Key::Page_Down | Key::Home | Key::End | Key::space
    )
}

// GObject subclass for the lightbox overlay
mod imp {
    use super::*;

    pub struct LightboxInner {
        // Root overlay covering the page while open
        pub root: RefCell<Option<Overlay>>,
        // Image area between top bar and thumbnail strip
        pub stage: RefCell<Option<Overlay>>,
        // Fixed container hosting the current picture (drag translation)
        pub image_slot: RefCell<Option<Fixed>>,
        // The current main picture; replaced wholesale on every render
        pub picture: RefCell<Option<Picture>>,
        pub counter_label: RefCell<Option<Label>>,
        pub thumbs_scroller: RefCell<Option<ScrolledWindow>>,
        pub thumbs_box: RefCell<Option<GtkBox>>,
        pub thumbs: RefCell<Vec<Button>>,
        // Thumbnail textures double as fast previews for the main picture
        pub thumb_textures: RefCell<Vec<Option<Texture>>>,
        // The one session; empty while closed
        pub session: RefCell<GallerySession>,
        pub tracker: Cell<SwipeTracker>,
        // Last applied drag offset/opacity, the starting point for snap-back
        pub drag_offset: Cell<f64>,
        pub drag_opacity: Cell<f64>,
        pub cache: RefCell<ImageCache<Texture>>,
        pub(super) load_sender: RefCell<Option<async_channel::Sender<(u64, LoadDone)>>>,
        pub load_generation: Cell<u64>,
        pub load_generation_atomic: Arc<AtomicU64>,
        pub(super) prefetch: RefCell<Option<PrefetchPool>>,
        // One-shot close teardown; taken exactly once
        pub close_timer: RefCell<Option<glib::SourceId>>,
        // Per-frame stage layout watcher, alive only while open
        pub stage_tick: RefCell<Option<TickCallbackId>>,
        pub last_stage_size: Cell<(i32, i32)>,
        // Invalidates older thumb-centering animations
        pub thumb_scroll_generation: Cell<u64>,
        // A new drag or render cancels a running slide-in/snap-back easing
        pub(super) ease_gate: EaseGate,
        // Scroll-lock balance and one-shot close teardown
        pub lifecycle: RefCell<LightboxLifecycle>,
        pub on_scroll_lock: RefCell<Option<ScrollLockCallback>>,
    }

    impl Default for LightboxInner {
        fn default() -> Self {
            Self {
                root: RefCell::new(None),
                stage: RefCell::new(None),
                image_slot: RefCell::new(None),
                picture: RefCell::new(None),
                counter_label: RefCell::new(None),
                thumbs_scroller: RefCell::new(None),
                thumbs_box: RefCell::new(None),
                thumbs: RefCell::new(Vec::new()),
                thumb_textures: RefCell::new(Vec::new()),
                session: RefCell::new(GallerySession::new()),
                tracker: Cell::new(SwipeTracker::new()),
                drag_offset: Cell::new(0.0),
                drag_opacity: Cell::new(1.0),
                cache: RefCell::new(ImageCache::new(cache_bytes())),
                load_sender: RefCell::new(None),
                load_generation: Cell::new(0),
                load_generation_atomic: Arc::new(AtomicU64::new(0)),
                prefetch: RefCell::new(None),
                close_timer: RefCell::new(None),
                stage_tick: RefCell::new(None),
                last_stage_size: Cell::new((0, 0)),
                thumb_scroll_generation: Cell::new(0),
                ease_gate: EaseGate::default(),
                lifecycle: RefCell::new(LightboxLifecycle::new()),
                on_scroll_lock: RefCell::new(None),
            }
        }
    }

    #[glib::object_subclass]
    impl ObjectSubclass for LightboxInner {
        const NAME: &'static str = "HausblickLightbox";
        type Type = super::Lightbox;
        type ParentType = glib::Object;
    }

    impl ObjectImpl for LightboxInner {}
}

glib::wrapper! {
    pub struct Lightbox(ObjectSubclass<imp::LightboxInner>);
}

impl Lightbox {
    pub fn new() -> Self {
        let obj: Self = glib::Object::builder().build();
        obj.setup_channels();
        obj.setup_widgets();
        obj
    }

    /// The widget to overlay above the page.
    pub fn widget(&self) -> Widget {
        self.imp().root.borrow().as_ref().unwrap().clone().upcast()
    }

    pub fn is_open(&self) -> bool {
        self.imp().session.borrow().is_open()
    }

    /// Host window hook: suspend (true) / restore (false) page scrolling.
    pub fn connect_scroll_lock<F: Fn(bool) + 'static>(&self, callback: F) {
        *self.imp().on_scroll_lock.borrow_mut() = Some(Rc::new(callback));
    }

    fn emit_scroll_lock(&self, locked: bool) {
        if let Some(ref callback) = *self.imp().on_scroll_lock.borrow() {
            callback(locked);
        }
    }

    /// Set up the channels that bring decoded images back to the main loop.
    fn setup_channels(&self) {
        let imp = self.imp();

        let (load_tx, load_rx) = async_channel::unbounded::<(u64, LoadDone)>();
        *imp.load_sender.borrow_mut() = Some(load_tx);

        let lightbox_weak = self.downgrade();
        glib::spawn_future_local(async move {
            while let Ok((generation, done)) = load_rx.recv().await {
                let Some(lightbox) = lightbox_weak.upgrade() else {
                    break;
                };
                lightbox.apply_loaded(generation, done);
            }
        });

        let (prefetch_tx, prefetch_rx) = async_channel::unbounded::<PrefetchResult>();
        *imp.prefetch.borrow_mut() = Some(PrefetchPool::spawn(prefetch_tx));

        let lightbox_weak = self.downgrade();
        glib::spawn_future_local(async move {
            while let Ok(result) = prefetch_rx.recv().await {
                let Some(lightbox) = lightbox_weak.upgrade() else {
                    break;
                };
                lightbox.store_texture(result.path, &result.image, ImageKind::Full);
            }
        });
    }

    fn setup_widgets(&self) {
        let imp = self.imp();

        let root = Overlay::new();
        root.set_hexpand(true);
        root.set_vexpand(true);
        root.add_css_class("lightbox");
        root.set_visible(false);

        let content = GtkBox::new(Orientation::Vertical, 0);
        content.set_hexpand(true);
        content.set_vexpand(true);

        // Top bar: counter on the left, close on the right
        let top_bar = GtkBox::new(Orientation::Horizontal, 8);
        top_bar.add_css_class("lightbox-bar");
        top_bar.set_margin_start(12);
        top_bar.set_margin_end(12);
        top_bar.set_margin_top(8);
        top_bar.set_margin_bottom(8);

        let counter_label = Label::new(None);
        counter_label.add_css_class("lightbox-counter");
        counter_label.set_halign(Align::Start);
        counter_label.set_hexpand(true);

        let close_btn = Button::from_icon_name("window-close-symbolic");
        close_btn.add_css_class("lightbox-close");
        close_btn.set_tooltip_text(Some("Close (Escape)"));

        top_bar.append(&counter_label);
        top_bar.append(&close_btn);

        // Stage: image slot with prev/next overlaid
        let stage = Overlay::new();
        stage.set_hexpand(true);
        stage.set_vexpand(true);
        stage.add_css_class("lightbox-stage");

        let image_slot = Fixed::new();
        image_slot.set_hexpand(true);
        image_slot.set_vexpand(true);
        stage.set_child(Some(&image_slot));

        let prev_btn = Button::from_icon_name("go-previous-symbolic");
        prev_btn.add_css_class("lightbox-nav");
        prev_btn.set_halign(Align::Start);
        prev_btn.set_valign(Align::Center);
        prev_btn.set_margin_start(12);
        prev_btn.set_tooltip_text(Some("Previous (Left)"));

        let next_btn = Button::from_icon_name("go-next-symbolic");
        next_btn.add_css_class("lightbox-nav");
        next_btn.set_halign(Align::End);
        next_btn.set_valign(Align::Center);
        next_btn.set_margin_end(12);
        next_btn.set_tooltip_text(Some("Next (Right)"));

        stage.add_overlay(&prev_btn);
        stage.add_overlay(&next_btn);

        // Thumbnail strip
        let thumbs_box = GtkBox::new(Orientation::Horizontal, 6);
        thumbs_box.add_css_class("lightbox-thumbs");
        thumbs_box.set_margin_start(12);
        thumbs_box.set_margin_end(12);
        thumbs_box.set_margin_top(8);
        thumbs_box.set_margin_bottom(8);

        let thumbs_scroller = ScrolledWindow::builder()
            .hscrollbar_policy(PolicyType::Automatic)
            .vscrollbar_policy(PolicyType::Never)
            .child(&thumbs_box)
            .build();
        thumbs_scroller.add_css_class("lightbox-thumb-strip");

        content.append(&top_bar);
        content.append(&stage);
        content.append(&thumbs_scroller);
        root.set_child(Some(&content));

        *imp.root.borrow_mut() = Some(root.clone());
        *imp.stage.borrow_mut() = Some(stage.clone());
        *imp.image_slot.borrow_mut() = Some(image_slot.clone());
        *imp.counter_label.borrow_mut() = Some(counter_label);
        *imp.thumbs_scroller.borrow_mut() = Some(thumbs_scroller);
        *imp.thumbs_box.borrow_mut() = Some(thumbs_box);

        let lightbox_weak = self.downgrade();
        close_btn.connect_clicked(move |_| {
            if let Some(lightbox) = lightbox_weak.upgrade() {
                lightbox.close();
            }
        });

        let lightbox_weak = self.downgrade();
        prev_btn.connect_clicked(move |_| {
            if let Some(lightbox) = lightbox_weak.upgrade() {
                lightbox.navigate_previous();
            }
        });

        let lightbox_weak = self.downgrade();
        next_btn.connect_clicked(move |_| {
            if let Some(lightbox) = lightbox_weak.upgrade() {
                lightbox.navigate_next();
            }
        });

        // Clicking the dark backdrop closes: the stage background, the image
        // slot beside the picture, or the picture's own letterbox gutters.
        // Clicks on the displayed image, the buttons or the thumbs do not.
        let backdrop_click = GestureClick::new();
        backdrop_click.set_button(1);
        let lightbox_weak = self.downgrade();
        let content_for_pick: Widget = content.clone().upcast();
        let stage_for_pick: Widget = stage.clone().upcast();
        let slot_for_pick: Widget = image_slot.clone().upcast();
        backdrop_click.connect_released(move |gesture, _n, x, y| {
            let Some(lightbox) = lightbox_weak.upgrade() else {
                return;
            };
            let Some(widget) = gesture.widget() else {
                return;
            };
            let Some(target) = widget.pick(x, y, gtk4::PickFlags::DEFAULT) else {
                return;
            };
            if target == content_for_pick || target == stage_for_pick || target == slot_for_pick {
                lightbox.close();
                return;
            }

            let picture = lightbox.imp().picture.borrow().as_ref().cloned();
            if let Some(picture) = picture {
                if target != picture.clone().upcast::<Widget>() {
                    return;
                }
                let Some(point) =
                    widget.compute_point(&picture, &graphene::Point::new(x as f32, y as f32))
                else {
                    return;
                };
                let (content_w, content_h) = picture
                    .paintable()
                    .map(|p| (p.intrinsic_width() as f64, p.intrinsic_height() as f64))
                    .unwrap_or((0.0, 0.0));
                if point_on_letterbox(
                    picture.width() as f64,
                    picture.height() as f64,
                    content_w,
                    content_h,
                    point.x() as f64,
                    point.y() as f64,
                ) {
                    lightbox.close();
                }
            }
        });
        root.add_controller(backdrop_click);

        self.setup_drag(&image_slot);
    }

    /// Wire the pointer swipe to the tracker state machine.
    fn setup_drag(&self, image_slot: &Fixed) {
        let drag = GestureDrag::new();
        drag.set_button(1);

        let lightbox_weak = self.downgrade();
        drag.connect_drag_begin(move |_, x, y| {
            let Some(lightbox) = lightbox_weak.upgrade() else {
                return;
            };
            let imp = lightbox.imp();
            if !imp.session.borrow().is_open() {
                return;
            }
            // A running slide-in or snap-back must not fight the drag.
            imp.ease_gate.cancel();
            let mut tracker = imp.tracker.get();
            tracker.begin(x, y);
            imp.tracker.set(tracker);
        });

        let lightbox_weak = self.downgrade();
        drag.connect_drag_update(move |gesture, offset_x, offset_y| {
            let Some(lightbox) = lightbox_weak.upgrade() else {
                return;
            };
            let imp = lightbox.imp();
            let Some((start_x, start_y)) = gesture.start_point() else {
                return;
            };
            let mut tracker = imp.tracker.get();
            let frame = tracker.move_to(start_x + offset_x, start_y + offset_y);
            imp.tracker.set(tracker);
            if let Some(frame) = frame {
                lightbox.apply_drag_frame(frame.offset_px, frame.opacity);
            }
        });

        let lightbox_weak = self.downgrade();
        drag.connect_drag_end(move |_, _, _| {
            let Some(lightbox) = lightbox_weak.upgrade() else {
                return;
            };
            let imp = lightbox.imp();
            let mut tracker = imp.tracker.get();
            let outcome = tracker.finish();
            imp.tracker.set(tracker);
            match outcome {
                // The commit renders a fresh picture; the dragged one is
                // discarded along with its transform, no reset needed.
                SwipeOutcome::Next => lightbox.navigate_next(),
                SwipeOutcome::Previous => lightbox.navigate_previous(),
                SwipeOutcome::SnapBack => lightbox.snap_back(),
                SwipeOutcome::Inactive => {}
            }
        });

        image_slot.add_controller(drag);
    }

    /// Keyboard adapter. Consumes Left/Right/Escape only while a session is
    /// open; everything else propagates to the page.
    pub fn handle_key(&self, key: Key) -> bool {
        if !self.imp().session.borrow().is_open() {
            return false;
        }
        match key {
            Key::Left => {
                self.navigate_previous();
                true
            }
            Key::Right => {
                self.navigate_next();
                true
            }
            Key::Escape => {
                self.close();
                true
            }
            // The original locks page scrolling outright; swallow the keys
            // the scroller underneath would act on.
            key if is_page_scroll_key(key) => true,
            _ => false,
        }
    }

    /// Open a session over a unit's image list. Empty lists are a no-op: the
    /// lightbox never becomes visible for a unit with nothing to show.
    pub fn open(&self, items: Vec<PathBuf>, start: usize) {
        let imp = self.imp();
        if items.is_empty() {
            tracing::debug!("Lightbox open skipped: empty image list");
            return;
        }

        // A re-open during the closing transition supersedes the teardown.
        if let Some(timer) = imp.close_timer.borrow_mut().take() {
            timer.remove();
        }

        if !imp.session.borrow_mut().open(items, start) {
            return;
        }
        tracing::info!(start, count = imp.session.borrow().len(), "Lightbox open");

        self.bump_generation();
        self.rebuild_thumbnails();

        let root = imp.root.borrow().as_ref().unwrap().clone();
        root.remove_css_class("closing");
        root.set_visible(true);
        root.add_css_class("open");

        self.start_stage_watcher();
        self.render();

        if imp.lifecycle.borrow_mut().on_open() {
            self.emit_scroll_lock(true);
        }
    }

    /// Begin the closing transition. Safe to call while already closed or
    /// already closing; teardown runs at most once per open.
    pub fn close(&self) {
        let imp = self.imp();
        if !imp.session.borrow().is_open() {
            return;
        }
        if !imp.lifecycle.borrow_mut().begin_close() {
            return;
        }

        if let Some(root) = imp.root.borrow().as_ref() {
            root.add_css_class("closing");
        }

        let lightbox_weak = self.downgrade();
        let timer = glib::timeout_add_local_once(
            Duration::from_millis(CLOSE_TRANSITION_MS),
            move || {
                if let Some(lightbox) = lightbox_weak.upgrade() {
                    lightbox.finish_close();
                }
            },
        );
        *imp.close_timer.borrow_mut() = Some(timer);
    }

    /// Teardown half of `close`. The lifecycle's one-shot decision keeps a
    /// second completion from re-running any of this.
    fn finish_close(&self) {
        let imp = self.imp();
        imp.close_timer.borrow_mut().take();
        if !imp.lifecycle.borrow_mut().finish_close() {
            return;
        }
        tracing::info!("Lightbox closed");

        imp.session.borrow_mut().close();
        self.bump_generation();

        if let Some(tick) = imp.stage_tick.borrow_mut().take() {
            tick.remove();
        }
        if let Some(picture) = imp.picture.borrow_mut().take() {
            if let Some(slot) = imp.image_slot.borrow().as_ref() {
                slot.remove(&picture);
            }
        }
        if let Some(root) = imp.root.borrow().as_ref() {
            root.remove_css_class("open");
            root.remove_css_class("closing");
            root.set_visible(false);
        }

        if imp.lifecycle.borrow_mut().release_lock() {
            self.emit_scroll_lock(false);
        }
    }

    fn navigate_next(&self) {
        if self.imp().session.borrow_mut().next() {
            self.render();
        }
    }

    fn navigate_previous(&self) {
        if self.imp().session.borrow_mut().previous() {
            self.render();
        }
    }

    fn navigate_to(&self, index: usize) {
        if self.imp().session.borrow_mut().jump_to(index) {
            self.render();
        }
    }

    /// View synchronizer: fresh picture, counter, active thumbnail, centered
    /// strip — in that order, immediately after every cursor mutation.
    fn render(&self) {
        let imp = self.imp();
        let (path, direction, counter, current) = {
            let session = imp.session.borrow();
            let Some(path) = session.current_item().cloned() else {
                return;
            };
            (
                path,
                session.direction(),
                session.counter_text(),
                session.current(),
            )
        };

        let generation = self.bump_generation();

        // (1) Replace the main picture wholesale.
        let picture = Picture::new();
        picture.set_can_shrink(true);
        picture.set_content_fit(gtk4::ContentFit::Contain);
        picture.add_css_class("lightbox-image");

        let cached = imp.cache.borrow_mut().get(&path);
        let mut need_full = true;
        if let Some(entry) = cached {
            picture.set_paintable(Some(&entry.value));
            need_full = entry.kind != ImageKind::Full;
        } else if let Some(Some(thumb)) = imp.thumb_textures.borrow().get(current) {
            // Thumbnail as fast preview until the full decode lands; cached
            // as Preview so a finished full decode takes precedence and a
            // repeat render keeps asking for the full image.
            picture.set_paintable(Some(thumb));
            let bytes = (thumb.width().max(0) as usize) * (thumb.height().max(0) as usize) * 4;
            imp.cache.borrow_mut().insert(
                path.clone(),
                CacheEntry {
                    value: thumb.clone(),
                    bytes,
                    kind: ImageKind::Preview,
                },
            );
        }
        if need_full {
            self.request_full(path, generation);
        }

        if let Some(slot) = imp.image_slot.borrow().as_ref() {
            if let Some(old) = imp.picture.borrow_mut().take() {
                slot.remove(&old);
            }
            slot.put(&picture, 0.0, 0.0);
            let (w, h) = imp.last_stage_size.get();
            if w > 0 && h > 0 {
                picture.set_size_request(w, h);
            }
        }
        *imp.picture.borrow_mut() = Some(picture.clone());
        imp.drag_offset.set(0.0);
        imp.drag_opacity.set(1.0);

        use crate::gallery::Direction;
        match direction {
            Direction::Forward => self.animate_to_rest(&picture, SLIDE_IN_OFFSET_PX, SLIDE_IN_OPACITY),
            Direction::Backward => {
                self.animate_to_rest(&picture, -SLIDE_IN_OFFSET_PX, SLIDE_IN_OPACITY)
            }
            Direction::None => {}
        }

        // (2) Counter text.
        if let Some(label) = imp.counter_label.borrow().as_ref() {
            label.set_text(&counter);
        }

        // (3) Exactly one active thumbnail.
        for (i, thumb) in imp.thumbs.borrow().iter().enumerate() {
            if i == current {
                thumb.add_css_class("active");
            } else {
                thumb.remove_css_class("active");
            }
        }

        // (4) Center the active thumbnail once layout has settled.
        let lightbox_weak = self.downgrade();
        glib::idle_add_local_once(move || {
            if let Some(lightbox) = lightbox_weak.upgrade() {
                lightbox.center_active_thumb(current);
            }
        });

        self.prefetch_neighbors();
    }

    fn prefetch_neighbors(&self) {
        let imp = self.imp();
        let mut wanted = Vec::new();
        {
            let session = imp.session.borrow();
            let mut cache = imp.cache.borrow_mut();
            // A Preview-only entry still wants its full-size decode.
            for offset in [1isize, -1] {
                if let Some(path) = session.item_at_offset(offset) {
                    if !cache.contains_full(path) {
                        wanted.push(path.clone());
                    }
                }
            }
        }
        if let Some(pool) = imp.prefetch.borrow().as_ref() {
            pool.request(wanted);
        }
    }

    /// Invalidate all pending decode results.
    fn bump_generation(&self) -> u64 {
        let imp = self.imp();
        let generation = imp.load_generation.get().wrapping_add(1);
        imp.load_generation.set(generation);
        imp.load_generation_atomic
            .store(generation, Ordering::SeqCst);
        generation
    }

    /// Decode the full-size image for `path` on a worker thread.
    fn request_full(&self, path: PathBuf, generation: u64) {
        let imp = self.imp();
        let Some(sender) = imp.load_sender.borrow().as_ref().cloned() else {
            return;
        };
        let guard = imp.load_generation_atomic.clone();

        std::thread::spawn(move || {
            if generation != guard.load(Ordering::SeqCst) {
                return;
            }
            match decode_full(&path) {
                Ok(image) => {
                    if generation != guard.load(Ordering::SeqCst) {
                        return;
                    }
                    let _ = sender.send_blocking((generation, LoadDone { path, image }));
                }
                Err(err) => {
                    tracing::warn!(error = ?err, "Lightbox decode failed");
                }
            }
        });
    }

    /// A full decode arrived from the worker thread.
    fn apply_loaded(&self, generation: u64, done: LoadDone) {
        let imp = self.imp();
        let texture = self.store_texture(done.path.clone(), &done.image, ImageKind::Full);

        // Stale results still warm the cache above, they just don't render.
        if generation != imp.load_generation.get() {
            return;
        }
        let current = imp.session.borrow().current_item().cloned();
        if current.as_deref() != Some(done.path.as_path()) {
            return;
        }
        if let (Some(texture), Some(picture)) = (texture, imp.picture.borrow().as_ref()) {
            picture.set_paintable(Some(&texture));
        }
    }

    /// Upload RGBA to a texture and cache it. Main-thread only.
    fn store_texture(
        &self,
        path: PathBuf,
        image: &LoadedImage,
        kind: ImageKind,
    ) -> Option<Texture> {
        let texture = texture_from_rgba(image)?;
        let bytes = (image.width as u64)
            .saturating_mul(image.height as u64)
            .saturating_mul(4) as usize;
        self.imp().cache.borrow_mut().insert(
            path,
            CacheEntry {
                value: texture.clone(),
                bytes,
                kind,
            },
        );
        Some(texture)
    }

    /// Rebuild the thumbnail strip from the current session. A re-entrant
    /// open leaves no residue from the previous unit.
    fn rebuild_thumbnails(&self) {
        let imp = self.imp();
        let Some(thumbs_box) = imp.thumbs_box.borrow().as_ref().cloned() else {
            return;
        };

        while let Some(child) = thumbs_box.first_child() {
            thumbs_box.remove(&child);
        }
        imp.thumbs.borrow_mut().clear();
        imp.thumb_textures.borrow_mut().clear();

        let items: Vec<PathBuf> = imp.session.borrow().items().to_vec();
        for (i, path) in items.iter().enumerate() {
            let texture = match decode_downscaled(path, THUMB_DECODE_SIZE) {
                Ok(image) => texture_from_rgba(&image),
                Err(err) => {
                    tracing::warn!(error = ?err, "Thumbnail decode failed");
                    None
                }
            };

            let thumb_picture = Picture::new();
            thumb_picture.set_can_shrink(true);
            thumb_picture.set_content_fit(gtk4::ContentFit::Cover);
            thumb_picture.set_size_request(THUMB_W, THUMB_H);
            if let Some(texture) = texture.as_ref() {
                thumb_picture.set_paintable(Some(texture));
            }

            let thumb = Button::new();
            thumb.set_child(Some(&thumb_picture));
            thumb.add_css_class("lightbox-thumb");

            let lightbox_weak = self.downgrade();
            thumb.connect_clicked(move |_| {
                if let Some(lightbox) = lightbox_weak.upgrade() {
                    lightbox.navigate_to(i);
                }
            });

            thumbs_box.append(&thumb);
            imp.thumbs.borrow_mut().push(thumb);
            imp.thumb_textures.borrow_mut().push(texture);
        }
    }

    /// Ease the thumbnail strip so the active thumb sits centered. Newer
    /// renders supersede a still-running centering animation.
    fn center_active_thumb(&self, index: usize) {
        let imp = self.imp();
        let Some(scroller) = imp.thumbs_scroller.borrow().as_ref().cloned() else {
            return;
        };
        let Some(thumb) = imp.thumbs.borrow().get(index).cloned() else {
            return;
        };

        let allocation = thumb.allocation();
        if allocation.width() <= 0 {
            return;
        }

        let adjustment = scroller.hadjustment();
        let target = (allocation.x() as f64 + allocation.width() as f64 / 2.0
            - adjustment.page_size() / 2.0)
            .clamp(
                adjustment.lower(),
                (adjustment.upper() - adjustment.page_size()).max(adjustment.lower()),
            );

        let generation = imp.thumb_scroll_generation.get().wrapping_add(1);
        imp.thumb_scroll_generation.set(generation);

        let from = adjustment.value();
        if (target - from).abs() < 1.0 {
            return;
        }

        let lightbox_weak = self.downgrade();
        let start = Cell::new(None::<i64>);
        scroller.add_tick_callback(move |_, clock| {
            let Some(lightbox) = lightbox_weak.upgrade() else {
                return glib::ControlFlow::Break;
            };
            if lightbox.imp().thumb_scroll_generation.get() != generation {
                return glib::ControlFlow::Break;
            }

            let now = clock.frame_time();
            let begin = start.get().unwrap_or_else(|| {
                start.set(Some(now));
                now
            });
            let t = ((now - begin) as f64 / (EASE_MS * 1000.0)).clamp(0.0, 1.0);
            let eased = 1.0 - (1.0 - t).powi(3);
            adjustment.set_value(from + (target - from) * eased);

            if t >= 1.0 {
                glib::ControlFlow::Break
            } else {
                glib::ControlFlow::Continue
            }
        });
    }

    /// Apply a live drag frame to the current picture.
    fn apply_drag_frame(&self, offset_px: f64, opacity: f64) {
        let imp = self.imp();
        imp.drag_offset.set(offset_px);
        imp.drag_opacity.set(opacity);
        let slot = imp.image_slot.borrow();
        let picture = imp.picture.borrow();
        if let (Some(slot), Some(picture)) = (slot.as_ref(), picture.as_ref()) {
            let transform =
                gsk::Transform::new().translate(&graphene::Point::new(offset_px as f32, 0.0));
            slot.set_child_transform(picture, Some(&transform));
            picture.set_opacity(opacity);
        }
    }

    /// Below-threshold release: ease the picture back to rest.
    fn snap_back(&self) {
        let imp = self.imp();
        let picture = imp.picture.borrow().as_ref().cloned();
        if let Some(picture) = picture {
            self.animate_to_rest(&picture, imp.drag_offset.get(), imp.drag_opacity.get());
        }
        imp.drag_offset.set(0.0);
        imp.drag_opacity.set(1.0);
    }

    /// Ease `picture` from an offset/opacity to rest. Drives both the
    /// directional slide-in and the swipe snap-back. The tick dies with the
    /// picture when a render replaces it, and yields through the ease gate
    /// the moment a new drag begins.
    fn animate_to_rest(&self, picture: &Picture, from_offset: f64, from_opacity: f64) {
        let lightbox_weak = self.downgrade();
        let target = picture.clone();
        let start = Cell::new(None::<i64>);
        let generation = self.imp().ease_gate.begin();

        self.apply_ease_frame(&target, from_offset, from_opacity);
        picture.add_tick_callback(move |_, clock| {
            let Some(lightbox) = lightbox_weak.upgrade() else {
                return glib::ControlFlow::Break;
            };
            // Stop if a newer render swapped the picture out from under us,
            // or a drag (or newer animation) superseded this easing.
            if lightbox.imp().picture.borrow().as_ref() != Some(&target) {
                return glib::ControlFlow::Break;
            }
            if !lightbox.imp().ease_gate.is_current(generation) {
                return glib::ControlFlow::Break;
            }

            let now = clock.frame_time();
            let begin = start.get().unwrap_or_else(|| {
                start.set(Some(now));
                now
            });
            let t = ((now - begin) as f64 / (EASE_MS * 1000.0)).clamp(0.0, 1.0);
            let eased = 1.0 - (1.0 - t).powi(3);

            let offset = from_offset * (1.0 - eased);
            let opacity = from_opacity + (1.0 - from_opacity) * eased;
            lightbox.apply_ease_frame(&target, offset, opacity);

            if t >= 1.0 {
                glib::ControlFlow::Break
            } else {
                glib::ControlFlow::Continue
            }
        });
    }

    fn apply_ease_frame(&self, picture: &Picture, offset_px: f64, opacity: f64) {
        if let Some(slot) = self.imp().image_slot.borrow().as_ref() {
            let transform = if offset_px.abs() < 0.01 {
                None
            } else {
                Some(
                    gsk::Transform::new()
                        .translate(&graphene::Point::new(offset_px as f32, 0.0)),
                )
            };
            slot.set_child_transform(picture, transform.as_ref());
        }
        picture.set_opacity(opacity);
    }

    /// Keep the picture sized to the stage while open. The stage has no
    /// allocation yet on first open, so this runs per frame and re-requests
    /// the size whenever the stage allocation changes.
    fn start_stage_watcher(&self) {
        let imp = self.imp();
        if imp.stage_tick.borrow().is_some() {
            return;
        }
        let Some(stage) = imp.stage.borrow().as_ref().cloned() else {
            return;
        };

        let lightbox_weak = self.downgrade();
        let tick = stage.add_tick_callback(move |stage, _clock| {
            let Some(lightbox) = lightbox_weak.upgrade() else {
                return glib::ControlFlow::Break;
            };
            let imp = lightbox.imp();

            let size = (stage.width(), stage.height());
            if size.0 > 0 && size.1 > 0 && size != imp.last_stage_size.get() {
                imp.last_stage_size.set(size);
                if let Some(picture) = imp.picture.borrow().as_ref() {
                    picture.set_size_request(size.0, size.1);
                }
            }
            glib::ControlFlow::Continue
        });
        *imp.stage_tick.borrow_mut() = Some(tick);
    }
}

impl Default for Lightbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_begin_cancels_running_ease() {
        let gate = EaseGate::default();
        let running = gate.begin();
        assert!(gate.is_current(running));

        gate.cancel();
        assert!(!gate.is_current(running));
    }

    #[test]
    fn test_newer_ease_supersedes_older() {
        let gate = EaseGate::default();
        let first = gate.begin();
        let second = gate.begin();

        assert!(!gate.is_current(first));
        assert!(gate.is_current(second));
    }

    #[test]
    fn test_contain_rect_centers_content() {
        // 4:3 content in a 16:9 area leaves side gutters.
        let (x, y, w, h) = contain_rect(1600.0, 900.0, 400.0, 300.0);
        assert_eq!((x, y), (200.0, 0.0));
        assert_eq!((w, h), (1200.0, 900.0));
    }

    #[test]
    fn test_letterbox_gutters_count_as_backdrop() {
        assert!(point_on_letterbox(1600.0, 900.0, 400.0, 300.0, 100.0, 450.0));
        assert!(point_on_letterbox(1600.0, 900.0, 400.0, 300.0, 1500.0, 450.0));
        assert!(!point_on_letterbox(1600.0, 900.0, 400.0, 300.0, 800.0, 450.0));
    }

    #[test]
    fn test_degenerate_content_has_no_letterbox() {
        assert!(!point_on_letterbox(1600.0, 900.0, 0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_page_scroll_keys_are_swallowed() {
        for key in [
            Key::Up,
            Key::Down,
            Key::Page_Up,
            Key::Page_Down,
            Key::Home,
            Key::End,
            Key::space,
        ] {
            assert!(is_page_scroll_key(key));
        }
        assert!(!is_page_scroll_key(Key::a));
        assert!(!is_page_scroll_key(Key::Tab));
    }
}
