use std::{path::PathBuf, sync::Arc, time::Instant};

use anyhow::Context;
use clap::Parser;
use pixels::{Pixels, SurfaceTexture};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, KeyCode, NamedKey, PhysicalKey},
    window::{Window, WindowId},
};

use chip8_interp::{
    emu::{Chip8, Chip8Runner, DEFAULT_INSTRUCTIONS_PER_FRAME, DISPLAY_X, DISPLAY_Y, read_rom},
    u4,
};

const PIXEL_ON: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];
const PIXEL_OFF: [u8; 4] = [0x00, 0x00, 0x00, 0xFF];

/// Physical keys for each keypad layout position, row by row.
const KEY_MAP: [KeyCode; 16] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::KeyQ,
    KeyCode::KeyW,
    KeyCode::KeyE,
    KeyCode::KeyR,
    KeyCode::KeyA,
    KeyCode::KeyS,
    KeyCode::KeyD,
    KeyCode::KeyF,
    KeyCode::KeyZ,
    KeyCode::KeyX,
    KeyCode::KeyC,
    KeyCode::KeyV,
];

struct App {
    pixels: Option<Pixels<'static>>,
    window: Option<Arc<Window>>,
    scale: u32,

    runner: Chip8Runner,
    /// Used for delta time calculation.
    last_frame_instant: Instant,

    /// Stores the result of the application to be returned from main.
    exit_result: anyhow::Result<()>,
}

impl App {
    fn new(args: &Args) -> anyhow::Result<Self> {
        let chip8 = match args.seed {
            Some(seed) => Chip8::with_seed(seed),
            None => Chip8::new(),
        };
        let mut runner = Chip8Runner::new(chip8, args.ipf);

        if let Some(path) = &args.rom_path {
            let rom = read_rom(path)?;
            runner
                .load_program(&rom)
                .context("Failed to load ROM into CHIP-8 memory")?;
        } else {
            log::info!("No ROM given, drop a ROM file on the window to start");
        }

        Ok(Self {
            pixels: None,
            window: None,
            scale: args.scale,
            runner,
            last_frame_instant: Instant::now(),
            exit_result: Ok(()),
        })
    }

    fn draw_display(&mut self) {
        let Some(pixels) = self.pixels.as_mut() else {
            return;
        };

        for (i, pxl) in pixels.frame_mut().chunks_exact_mut(4).enumerate() {
            let lit = self.runner.get_display_pixel(i / DISPLAY_X, i % DISPLAY_X);
            pxl.copy_from_slice(if lit { &PIXEL_ON } else { &PIXEL_OFF });
        }
    }

    /// Drop-to-load, a rejected ROM leaves the interpreter idle rather than quitting.
    fn load_dropped(&mut self, path: PathBuf) {
        let loaded = read_rom(&path).and_then(|rom| self.runner.load_program(&rom));
        match loaded {
            Ok(()) => log::info!("Loaded {}", path.display()),
            Err(e) => log::error!("{e}"),
        }
    }

    fn try_resumed(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window = {
            let size = LogicalSize::new(
                DISPLAY_X as u32 * self.scale,
                DISPLAY_Y as u32 * self.scale,
            );
            let min_size = LogicalSize::new(DISPLAY_X as u32, DISPLAY_Y as u32);

            Arc::new(
                event_loop
                    .create_window(
                        Window::default_attributes()
                            .with_title("chip8-interp")
                            .with_inner_size(size)
                            .with_min_inner_size(min_size),
                    )
                    .context("Failed to create window")?,
            )
        };

        self.window = Some(window.clone());
        self.pixels = {
            let window_size = window.inner_size();
            let surface_texture =
                SurfaceTexture::new(window_size.width, window_size.height, window.clone());

            let pixels = Pixels::new(DISPLAY_X as u32, DISPLAY_Y as u32, surface_texture)
                .context("Failed to create pixels surface")?;

            window.request_redraw();
            Some(pixels)
        };

        // Avoid large dt on first frame
        self.last_frame_instant = Instant::now();
        Ok(())
    }

    fn try_window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        event: WindowEvent,
    ) -> anyhow::Result<()> {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }

            WindowEvent::DroppedFile(path) => self.load_dropped(path),

            WindowEvent::Resized(size) => {
                if let Some(pixels) = self.pixels.as_mut() {
                    pixels
                        .resize_surface(size.width, size.height)
                        .context("Failed to resize pixels surface")?;
                }
            }

            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.last_frame_instant).as_secs_f32();
                self.last_frame_instant = now;

                self.runner.update(dt).context("Chip8 Execution error")?;

                if self.runner.take_redraw() {
                    self.draw_display();
                }

                if let Some(pixels) = self.pixels.as_ref() {
                    pixels.render().context("Pixels render error")?;
                }
                if let Some(window) = self.window.as_ref() {
                    window.request_redraw();
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key
                    && let Some(position) = KEY_MAP.iter().position(|&k| k == code)
                {
                    let pressed = event.state == ElementState::Pressed;
                    self.runner.set_key(u4::new(position as u8), pressed);
                }
            }

            _ => (),
        }
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(e) = self.try_resumed(event_loop) {
            self.exit_result = Err(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Err(e) = self.try_window_event(event_loop, event) {
            self.exit_result = Err(e);
            event_loop.exit();
        }
    }
}

/// CHIP-8 interpreter.
///
/// Keys 1-4, Q-R, A-F, Z-V map to the CHIP-8 keypad rows.
/// Escape is used to exit. A ROM file can also be dropped on the window.
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    /// Path to the CHIP-8 ROM file
    rom_path: Option<PathBuf>,

    /// Instructions executed per 60Hz frame
    #[arg(long, default_value_t = DEFAULT_INSTRUCTIONS_PER_FRAME)]
    ipf: u32,

    /// Seed for the random number instruction
    #[arg(long)]
    seed: Option<u64>,

    /// Window scale factor
    #[arg(long, default_value_t = 10)]
    scale: u32,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(&args).context("Failed to initialize application")?;
    event_loop
        .run_app(&mut app)
        .context("Error occurred during event loop execution")?;

    // Return the result captured during the event loop
    app.exit_result
}
