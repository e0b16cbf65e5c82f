use crate::config::MonitorConfig;
use crate::error::DisplayError;
use crate::font::TextFont;
use crate::render::{Line, Page};
use crossterm::{queue, style::Print};
use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};
use linux_embedded_hal::I2cdev;
use ssd1306::{I2CDisplayInterface, Ssd1306, mode::BufferedGraphicsMode, prelude::*};
use std::fmt::Debug;
use std::io::{self, Stdout, Write};
use std::path::Path;
use tracing::{error, info, warn};

/// A bitmap panel: a monochrome drawing surface plus a way to push it to the
/// hardware.
pub trait Panel {
    type Surface: DrawTarget<Color = BinaryColor, Error: Debug>;

    fn surface(&mut self) -> &mut Self::Surface;

    fn flush(&mut self) -> Result<(), DisplayError>;
}

type Oled = Ssd1306<I2CInterface<I2cdev>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

/// SSD1306 128x64 on a Linux I2C bus, buffered graphics mode.
pub struct Ssd1306Panel {
    display: Oled,
}

impl Ssd1306Panel {
    pub fn open(bus: &Path, address: u8) -> Result<Self, DisplayError> {
        let i2c = I2cdev::new(bus).map_err(|e| DisplayError::Bus {
            path: bus.display().to_string(),
            detail: e.to_string(),
        })?;
        let interface = I2CDisplayInterface::new_custom_address(i2c, address);
        let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        display
            .init()
            .map_err(|e| DisplayError::Init(format!("{e:?}")))?;

        Ok(Ssd1306Panel { display })
    }
}

impl Panel for Ssd1306Panel {
    type Surface = Oled;

    fn surface(&mut self) -> &mut Oled {
        &mut self.display
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        self.display
            .flush()
            .map_err(|e| DisplayError::Flush(format!("{e:?}")))
    }
}

// Blank and power down the panel so it does not keep showing a stale page.
impl Drop for Ssd1306Panel {
    fn drop(&mut self) {
        self.display.clear_buffer();
        if let Err(err) = self.flush() {
            warn!(%err, "failed to blank display on shutdown");
        }
        if let Err(err) = self.display.set_display_on(false) {
            warn!(error = ?err, "failed to switch display off");
        }
    }
}

/// Exclusive access to a panel's surface for one frame. The surface is
/// cleared on acquire and flushed when the canvas is presented or dropped,
/// so a frame that fails halfway is still pushed out.
pub struct Canvas<'a, P: Panel> {
    panel: &'a mut P,
    presented: bool,
}

impl<'a, P: Panel> Canvas<'a, P> {
    pub fn acquire(panel: &'a mut P) -> Result<Self, DisplayError> {
        panel
            .surface()
            .clear(BinaryColor::Off)
            .map_err(|e| DisplayError::Draw(format!("{e:?}")))?;
        Ok(Canvas {
            panel,
            presented: false,
        })
    }

    pub fn draw_text(&mut self, font: &TextFont, text: &str, origin: Point) -> Result<(), DisplayError> {
        font.draw_text(self.panel.surface(), text, origin)
            .map_err(|e| DisplayError::Draw(format!("{e:?}")))
    }

    pub fn present(mut self) -> Result<(), DisplayError> {
        self.presented = true;
        self.panel.flush()
    }
}

impl<P: Panel> Drop for Canvas<'_, P> {
    fn drop(&mut self) {
        if !self.presented {
            if let Err(err) = self.panel.flush() {
                warn!(%err, "failed to flush partial frame");
            }
        }
    }
}

/// Shows pages on the panel when one was opened, otherwise prints them.
/// Availability is decided once at construction.
pub struct DisplayAdapter<P: Panel, W: Write> {
    panel: Option<P>,
    font: TextFont,
    console: W,
    line_offsets: [i32; 3],
}

impl DisplayAdapter<Ssd1306Panel, Stdout> {
    /// Open the panel and font. Never fails: a panel that cannot be opened
    /// leaves the adapter in console mode, a missing font selects the
    /// built-in one.
    pub fn initialize(config: &MonitorConfig) -> Self {
        let font = TextFont::load_or_builtin(&config.font_path, config.font_size);
        let panel = match Ssd1306Panel::open(&config.i2c_bus, config.i2c_address) {
            Ok(panel) => Some(panel),
            Err(err) => {
                error!(error = ?err, "failed to initialize display");
                None
            }
        };
        info!(
            available = panel.is_some(),
            builtin_font = font.is_builtin(),
            "display initialized"
        );
        DisplayAdapter::new(panel, font, io::stdout(), config.line_offsets)
    }
}

impl<P: Panel, W: Write> DisplayAdapter<P, W> {
    pub fn new(panel: Option<P>, font: TextFont, console: W, line_offsets: [i32; 3]) -> Self {
        DisplayAdapter {
            panel,
            font,
            console,
            line_offsets,
        }
    }

    pub fn available(&self) -> bool {
        self.panel.is_some()
    }

    /// Device errors are returned to the caller as-is.
    pub fn render_page(&mut self, page: Page, lines: &[Line; 3]) -> Result<(), DisplayError> {
        if let Some(panel) = self.panel.as_mut() {
            let mut canvas = Canvas::acquire(panel)?;
            for (line, y) in lines.iter().zip(self.line_offsets) {
                canvas.draw_text(&self.font, &line.to_string(), Point::new(0, y))?;
            }
            return canvas.present();
        }
        self.print_page(page, lines)
    }

    fn print_page(&mut self, page: Page, lines: &[Line; 3]) -> Result<(), DisplayError> {
        queue!(self.console, Print(format!("[Page {}]\n", page.index())))?;
        for line in lines {
            queue!(self.console, Print(format!("{line}\n")))?;
        }
        queue!(self.console, Print(format!("{}\n", "-".repeat(30))))?;
        self.console.flush()?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn console(&self) -> &W {
        &self.console
    }

    #[cfg(test)]
    pub(crate) fn panel(&self) -> Option<&P> {
        self.panel.as_ref()
    }
}
