// Main application window: the scrollable showcase page with the lightbox
// overlaid on top. Owns the page scroll lock and routes keyboard input to
// the lightbox before the page sees it.

use gtk4::prelude::*;
use gtk4::{
    glib, Align, ApplicationWindow, Box as GtkBox, EventControllerKey, EventControllerScroll,
    EventControllerScrollFlags, Label, Orientation, Overlay, PolicyType, PropagationPhase,
    ScrolledWindow,
};
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

use crate::data::{load_showcase, DataError};
use crate::ui::lightbox::Lightbox;
use crate::ui::showcase::ShowcasePage;

const DEFAULT_WIDTH: i32 = 1280;
const DEFAULT_HEIGHT: i32 = 860;

const APP_CSS: &str = "
.showcase {
    background-color: #faf7f2;
}
picture.hero {
    margin-bottom: 8px;
}
picture.about-photo {
    border-radius: 6px;
}
picture.missing {
    background-color: alpha(#000, 0.08);
}
.tab-bar button.tab {
    padding: 6px 18px;
    border-radius: 999px;
    background: none;
}
.tab-bar button.tab.active {
    background-color: #2d4a3e;
    color: #ffffff;
}
.unit-name {
    font-size: 20px;
    font-weight: bold;
}
.unit-meta {
    color: alpha(currentColor, 0.6);
}
.unit-tags label.tag {
    padding: 2px 10px;
    border-radius: 999px;
    background-color: alpha(#2d4a3e, 0.12);
    font-size: 12px;
}
.unit-tags button.tag-toggle {
    padding: 2px 10px;
    border-radius: 999px;
    font-size: 12px;
}
button.photo-cell {
    padding: 0;
    border-radius: 6px;
}
.photo-more {
    padding: 8px 14px;
    border-radius: 6px;
    background-color: alpha(#000, 0.55);
    color: #ffffff;
    font-weight: bold;
}
.status {
    font-size: 16px;
    color: alpha(currentColor, 0.7);
}

.lightbox {
    background-color: alpha(#000, 0.92);
    opacity: 1;
    transition: opacity 200ms ease;
}
.lightbox.closing {
    opacity: 0;
}
.lightbox-counter {
    color: alpha(#fff, 0.85);
    font-size: 14px;
}
button.lightbox-close,
button.lightbox-nav {
    background-color: alpha(#fff, 0.12);
    color: #ffffff;
    border-radius: 6px;
}
button.lightbox-nav {
    padding: 14px 10px;
}
button.lightbox-thumb {
    padding: 0;
    border: 2px solid transparent;
    border-radius: 4px;
    opacity: 0.6;
}
button.lightbox-thumb.active {
    border-color: #ffffff;
    opacity: 1;
}
";

pub fn load_css() {
    let provider = gtk4::CssProvider::new();
    provider.load_from_string(APP_CSS);
    if let Some(display) = gdk4::Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}

pub struct MainWindow {
    window: ApplicationWindow,
    scroller: ScrolledWindow,
    lightbox: Lightbox,
    page: RefCell<Option<Rc<ShowcasePage>>>,
    saved_scroll: Cell<f64>,
    self_weak: RefCell<std::rc::Weak<Self>>,
}

impl MainWindow {
    pub fn new(app: &gtk4::Application, base_dir: PathBuf) -> Rc<Self> {
        let window = ApplicationWindow::builder()
            .application(app)
            .title("Hausblick")
            .default_width(DEFAULT_WIDTH)
            .default_height(DEFAULT_HEIGHT)
            .build();

        let scroller = ScrolledWindow::builder()
            .hscrollbar_policy(PolicyType::Never)
            .vscrollbar_policy(PolicyType::Automatic)
            .hexpand(true)
            .vexpand(true)
            .build();

        let lightbox = Lightbox::new();

        let overlay = Overlay::new();
        overlay.set_child(Some(&scroller));
        overlay.add_overlay(&lightbox.widget());
        window.set_child(Some(&overlay));

        let main = Rc::new(Self {
            window,
            scroller,
            lightbox,
            page: RefCell::new(None),
            saved_scroll: Cell::new(0.0),
            self_weak: RefCell::new(std::rc::Weak::new()),
        });
        *main.self_weak.borrow_mut() = Rc::downgrade(&main);

        main.setup_scroll_lock();
        main.setup_keybindings();
        main.load_page(base_dir);
        main
    }

    pub fn present(&self) {
        self.window.present();
    }

    fn load_page(&self, base_dir: PathBuf) {
        match load_showcase(&base_dir) {
            Ok(data) => {
                tracing::info!(
                    dir = %base_dir.display(),
                    units = data.units.len(),
                    "Loaded showcase data"
                );
                let page = ShowcasePage::new(base_dir, &data, self.lightbox.clone());
                self.scroller.set_child(Some(&page.widget()));
                *self.page.borrow_mut() = Some(page);
            }
            Err(err) => {
                tracing::error!(dir = %base_dir.display(), error = %err, "No showcase data");
                self.scroller.set_child(Some(&Self::status_page(&err)));
            }
        }
    }

    /// Shown instead of the page when units.json is absent or broken.
    fn status_page(err: &DataError) -> GtkBox {
        let status = GtkBox::new(Orientation::Vertical, 8);
        status.set_valign(Align::Center);
        status.set_halign(Align::Center);

        let title = Label::new(Some("No showcase to display"));
        title.add_css_class("unit-name");

        let detail = Label::new(Some(&err.to_string()));
        detail.add_css_class("status");
        detail.set_wrap(true);

        status.append(&title);
        status.append(&detail);
        status
    }

    /// While the lightbox is open the page must not scroll; on close the
    /// previous scroll position is restored exactly once.
    fn setup_scroll_lock(&self) {
        let main_weak = self.self_weak.borrow().clone();
        self.lightbox.connect_scroll_lock(move |locked| {
            let Some(main) = main_weak.upgrade() else {
                return;
            };
            let adjustment = main.scroller.vadjustment();
            if locked {
                main.saved_scroll.set(adjustment.value());
                main.scroller.set_vscrollbar_policy(PolicyType::External);
            } else {
                main.scroller.set_vscrollbar_policy(PolicyType::Automatic);
                let value = main.saved_scroll.get();
                adjustment.set_value(value);
                // Layout may still be settling; re-assert once it has.
                let scroller = main.scroller.clone();
                glib::idle_add_local_once(move || {
                    scroller.vadjustment().set_value(value);
                });
            }
        });

        // Wheel input over the open lightbox must not reach the page.
        let scroll_guard = EventControllerScroll::new(EventControllerScrollFlags::BOTH_AXES);
        scroll_guard.set_propagation_phase(PropagationPhase::Capture);
        scroll_guard.connect_scroll(|_, _, _| glib::Propagation::Stop);
        self.lightbox.widget().add_controller(scroll_guard);
    }

    /// Capture-phase key routing: the lightbox gets first refusal on every
    /// key press while it is open.
    fn setup_keybindings(&self) {
        let controller = EventControllerKey::new();
        controller.set_propagation_phase(PropagationPhase::Capture);

        let main_weak = self.self_weak.borrow().clone();
        controller.connect_key_pressed(move |_, key, _, _| {
            let Some(main) = main_weak.upgrade() else {
                return glib::Propagation::Proceed;
            };
            if main.lightbox.handle_key(key) {
                glib::Propagation::Stop
            } else {
                glib::Propagation::Proceed
            }
        });
        self.window.add_controller(controller);
    }
}
