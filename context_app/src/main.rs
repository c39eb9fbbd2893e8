//! Render context demo application
//!
//! Opens a window, brings up the full Vulkan render context for it and keeps
//! the window alive until it is closed or Escape is pressed. Nothing is drawn.
//!
//! Usage: `context_app [config.toml|config.ron]`

use glfw::{Action, Key, WindowEvent};
use render_core::foundation::logging;
use render_core::prelude::*;

fn load_config() -> Result<RenderCoreConfig, ConfigError> {
    let config = match std::env::args().nth(1) {
        Some(path) => RenderCoreConfig::load_from_file(&path)?,
        None => RenderCoreConfig::new("Render Core Context"),
    };
    config.validate()?;
    Ok(config)
}

fn run(config: &RenderCoreConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut window = Window::new(&config.window.title, config.window.width, config.window.height)?;
    log::info!("Window created");

    let context = RenderContext::new(config, &mut window)?;

    let queues = context.queue_selection();
    log::info!(
        "Adapter {}: graphics family {}, present family {}, {} swapchain images, depth {:?}",
        context.adapter().name(),
        queues.graphics,
        queues.present,
        context.swapchain().images().len(),
        context.depth().format()
    );

    while !window.should_close() {
        window.poll_events();

        let mut close = false;
        for (_, event) in window.flush_events() {
            match event {
                WindowEvent::Key(Key::Escape, _, Action::Press, _) | WindowEvent::Close => close = true,
                _ => {}
            }
        }
        if close {
            window.set_should_close(true);
        }
    }

    log::info!("Shutting down");
    // Context holds the surface, so it must go before the window
    drop(context);
    Ok(())
}

fn main() {
    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(1);
        }
    };

    logging::init_with_level(&config.log_level);
    log::info!("Starting {}", config.application_name);

    if let Err(err) = run(&config) {
        log::error!("{err}");
        eprintln!("fatal: {err}");
        std::process::exit(1);
    }
}
