//! Interactive demo: a spinning mesh drawn by the software pipeline.
//!
//! ```text
//! scanraster [--config render.toml] [--capture frame.png] [model.obj]
//! ```
//!
//! Keys: `1` wireframe, `2` filled, `P` capture, `Esc` quit.
//! Set `RUST_LOG=debug` for per-frame statistics.

use std::cell::RefCell;
use std::error::Error;
use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use scanraster::prelude::*;

/// scanraster - CPU software rasterizer demo
#[derive(Parser, Debug)]
#[command(name = "scanraster", version, about = "Spinning mesh drawn by a CPU rasterizer")]
struct Args {
    /// Path to a TOML render configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the first frame (and each `P` press) to this PNG file
    #[arg(long)]
    capture: Option<PathBuf>,

    /// OBJ model to show instead of the built-in cube
    model: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RenderConfig::load_from_file(path)?,
        None => RenderConfig::default(),
    };
    let mut meshes = match &args.model {
        Some(path) => Mesh::load_all_from_obj(path)?,
        None => vec![Mesh::cube()],
    };

    let mut camera = Camera::from_config(&config);
    let mut window = Window::new("scanraster", config.width, config.height)?;
    let mut limiter = FrameLimiter::new(&window);

    // Captures happen in the frame listener, on the finished foreground.
    let capture_path = args.capture.clone().unwrap_or_else(|| PathBuf::from("frame.png"));
    let pending_capture = Rc::new(RefCell::new(args.capture.clone()));
    let listener_capture = Rc::clone(&pending_capture);
    camera.set_frame_listener(move |frame: &Canvas| {
        if let Some(path) = listener_capture.borrow_mut().take() {
            match frame.save_png(&path) {
                Ok(()) => log::info!("Captured frame to {}", path.display()),
                Err(e) => log::error!("Failed to capture frame to {}: {}", path.display(), e),
            }
        }
    });

    let mut transform = Transform::new();
    transform.set_position_xyz(0.0, 0.0, 5.0);

    loop {
        match window.poll_events() {
            WindowEvent::Quit => break,
            WindowEvent::SetRenderMode(mode) => camera.set_render_mode(mode),
            WindowEvent::Capture => *pending_capture.borrow_mut() = Some(capture_path.clone()),
            WindowEvent::None => {}
        }

        let delta = limiter.wait_and_get_delta(&window) as f32 / 1000.0;
        transform.rotate_x(0.5 * delta).rotate_y(0.8 * delta);
        for mesh in &mut meshes {
            mesh.set_transform(&transform);
        }

        camera.render_frame(&meshes, &mut window)?;
    }

    Ok(())
}
