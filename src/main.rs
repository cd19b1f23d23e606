mod app;
mod data;
mod gallery;
mod models;
mod ui;

use tracing_subscriber::EnvFilter;

fn main() -> gtk4::glib::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hausblick=info")),
        )
        .init();

    app::run()
}
