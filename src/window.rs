//! SDL2 presentation surface.
//!
//! SDL is only used to put finished frames on screen and to read input; all
//! drawing happens on the CPU in [`Camera`](crate::camera::Camera).

use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Texture, TextureCreator};
use sdl2::video::WindowContext;

use crate::render::{Canvas, Present, RenderMode};

pub const FPS: u64 = 60;
pub const FRAME_TARGET_TIME: f64 = 1000.0 / FPS as f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    None,
    Quit,
    SetRenderMode(RenderMode),
    /// Request to write the next frame to disk.
    Capture,
}

pub struct FrameLimiter {
    previous_frame_time: u64,
}

impl FrameLimiter {
    pub fn new(window: &Window) -> Self {
        Self {
            previous_frame_time: window.timer().ticks64(),
        }
    }

    /// Waits if necessary to maintain frame rate and returns the delta time in milliseconds.
    pub fn wait_and_get_delta(&mut self, window: &Window) -> u64 {
        let mut current_time = window.timer().ticks64();
        let mut delta_time = current_time - self.previous_frame_time;

        if delta_time < FRAME_TARGET_TIME as u64 {
            let time_to_wait = (FRAME_TARGET_TIME as u64) - delta_time;
            std::thread::sleep(std::time::Duration::from_millis(time_to_wait));
            current_time = window.timer().ticks64();
            delta_time = current_time - self.previous_frame_time;
        }

        self.previous_frame_time = current_time;
        delta_time
    }
}

/// A fixed-size window showing frames through a streaming texture.
pub struct Window {
    // Fields drop in declaration order: the texture must go before its creator.
    texture: Texture<'static>,
    #[allow(dead_code)] // owns what `texture` borrows
    texture_creator: Box<TextureCreator<WindowContext>>,
    canvas: sdl2::render::Canvas<sdl2::video::Window>,
    event_pump: sdl2::EventPump,
    timer_subsystem: sdl2::TimerSubsystem,
    width: u32,
    height: u32,
}

impl Window {
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self, String> {
        let sdl_context = sdl2::init()?;
        let video_subsystem = sdl_context.video()?;
        let timer_subsystem = sdl_context.timer()?;

        let window = video_subsystem
            .window(title, width, height)
            .position_centered()
            .build()
            .map_err(|e| e.to_string())?;

        let canvas = window.into_canvas().build().map_err(|e| e.to_string())?;
        let texture_creator = Box::new(canvas.texture_creator());
        let event_pump = sdl_context.event_pump()?;

        // SAFETY: texture_creator is boxed, so its address is stable, and it is
        // owned by the Window. The texture field is declared first and so is
        // dropped before the creator it borrows from.
        let texture_creator_ref: &'static TextureCreator<WindowContext> =
            unsafe { &*(texture_creator.as_ref() as *const _) };
        let texture = texture_creator_ref
            .create_texture_streaming(PixelFormatEnum::ARGB8888, width, height)
            .map_err(|e| e.to_string())?;

        log::info!("Opened {}x{} window '{}'", width, height, title);

        Ok(Self {
            texture,
            texture_creator,
            canvas,
            event_pump,
            timer_subsystem,
            width,
            height,
        })
    }

    /// Drains pending events, returning the first one the demo acts on.
    ///
    /// Escape or closing the window quits, `1` and `2` select wireframe and
    /// filled drawing, `P` captures a frame.
    pub fn poll_events(&mut self) -> WindowEvent {
        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => return WindowEvent::Quit,
                Event::KeyDown {
                    keycode: Some(Keycode::Num1),
                    ..
                } => return WindowEvent::SetRenderMode(RenderMode::Wireframe),
                Event::KeyDown {
                    keycode: Some(Keycode::Num2),
                    ..
                } => return WindowEvent::SetRenderMode(RenderMode::Filled),
                Event::KeyDown {
                    keycode: Some(Keycode::P),
                    ..
                } => return WindowEvent::Capture,
                _ => {}
            }
        }
        WindowEvent::None
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn timer(&self) -> &sdl2::TimerSubsystem {
        &self.timer_subsystem
    }
}

impl Present for Window {
    fn present(&mut self, frame: &Canvas) -> Result<(), String> {
        if (frame.width(), frame.height()) != (self.width, self.height) {
            return Err(format!(
                "frame is {}x{} but window is {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            ));
        }

        self.texture
            .update(None, frame.as_bytes(), (self.width * 4) as usize)
            .map_err(|e| e.to_string())?;

        self.canvas.clear();
        self.canvas.copy(&self.texture, None, None)?;
        self.canvas.present();
        Ok(())
    }
}
