use gtk4::prelude::*;
use gtk4::{gio, glib};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use crate::data::DATA_FILE;
use crate::ui::window::{load_css, MainWindow};

pub const APP_ID: &str = "io.github.hausblick.Hausblick";

thread_local! {
    // Keeps the window's Rc (and with it every weak-backed signal handler)
    // alive for the lifetime of the application.
    static MAIN_WINDOW: RefCell<Option<Rc<MainWindow>>> = const { RefCell::new(None) };
}

/// Pick the showcase directory: explicit argument wins, otherwise the
/// current directory if it carries a data file, otherwise home.
fn resolve_base_dir(arg: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = arg {
        return dir;
    }
    if let Ok(cwd) = std::env::current_dir() {
        if cwd.join(DATA_FILE).is_file() {
            return cwd;
        }
    }
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn run() -> glib::ExitCode {
    let app = gtk4::Application::builder()
        .application_id(APP_ID)
        .flags(gio::ApplicationFlags::HANDLES_COMMAND_LINE | gio::ApplicationFlags::NON_UNIQUE)
        .build();

    app.connect_startup(|_| {
        // GTK resets the process locale; keep float formatting stable for
        // CSS and GL drivers.
        unsafe {
            libc::setlocale(libc::LC_NUMERIC, c"C".as_ptr());
        }
        load_css();
    });

    app.connect_command_line(|app, cmdline| {
        let arg = cmdline
            .arguments()
            .get(1)
            .map(|os| PathBuf::from(os.clone()));
        let base_dir = resolve_base_dir(arg);
        tracing::info!(dir = %base_dir.display(), "Starting showcase");

        let main = MainWindow::new(app, base_dir);
        main.present();
        MAIN_WINDOW.with(|slot| *slot.borrow_mut() = Some(main));
        0
    });

    app.run()
}
