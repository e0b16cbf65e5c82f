use crate::error::DisplayError;
use ab_glyph::{Font as _, FontVec, GlyphId, PxScale, ScaleFont, point};
use embedded_graphics::{
    mono_font::{MonoTextStyle, iso_8859_1::FONT_6X10},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use std::path::Path;
use tracing::warn;

/// Minimum antialiasing coverage for a pixel to be lit on a monochrome panel.
const COVERAGE_THRESHOLD: f32 = 0.5;

pub enum TextFont {
    /// A TrueType face rasterized at a fixed scale.
    Truetype { face: FontVec, scale: PxScale },
    /// The embedded-graphics 6x10 glyph set.
    Builtin,
}

impl TextFont {
    /// Load a TrueType font at `size` pixels per em.
    pub fn load(path: &Path, size: f32) -> Result<Self, DisplayError> {
        let font_error = |detail: String| DisplayError::Font {
            path: path.display().to_string(),
            detail,
        };
        let data = std::fs::read(path).map_err(|e| font_error(e.to_string()))?;
        let face = FontVec::try_from_vec(data).map_err(|e| font_error(e.to_string()))?;

        // ab_glyph scales by line height; convert from em size.
        let scale = match face.units_per_em() {
            Some(units) => PxScale::from(size * face.height_unscaled() / units),
            None => PxScale::from(size),
        };
        Ok(TextFont::Truetype { face, scale })
    }

    pub fn load_or_builtin(path: &Path, size: f32) -> Self {
        match Self::load(path, size) {
            Ok(font) => font,
            Err(err) => {
                warn!(%err, "failed to load monospace font, falling back to default");
                TextFont::Builtin
            }
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, TextFont::Builtin)
    }

    /// Draw `text` with its top-left corner at `origin`.
    pub fn draw_text<D>(&self, target: &mut D, text: &str, origin: Point) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        match self {
            TextFont::Builtin => {
                let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
                Text::with_baseline(text, origin, style, Baseline::Top).draw(target)?;
                Ok(())
            }
            TextFont::Truetype { face, scale } => {
                target.draw_iter(rasterize(face, *scale, text, origin))
            }
        }
    }
}

fn rasterize(face: &FontVec, scale: PxScale, text: &str, origin: Point) -> Vec<Pixel<BinaryColor>> {
    let scaled = face.as_scaled(scale);
    let mut caret = point(origin.x as f32, origin.y as f32 + scaled.ascent());
    let mut previous: Option<GlyphId> = None;
    let mut pixels = Vec::new();

    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = previous {
            caret.x += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(scale, caret);
        caret.x += scaled.h_advance(id);
        previous = Some(id);

        let Some(outlined) = face.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|x, y, coverage| {
            if coverage >= COVERAGE_THRESHOLD {
                let at = Point::new(bounds.min.x as i32 + x as i32, bounds.min.y as i32 + y as i32);
                pixels.push(Pixel(at, BinaryColor::On));
            }
        });
    }

    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::fake::RecordingSurface;
    use std::io::Write;

    const DEJAVU_MONO: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSansMono-Bold.ttf";

    #[test]
    fn test_builtin_draws_pixels() {
        let mut surface = RecordingSurface::default();
        TextFont::Builtin
            .draw_text(&mut surface, "Temp:  41.2°C", Point::zero())
            .unwrap();
        assert!(surface.lit > 0);
        assert!(surface.max_y < 10);
    }

    #[test]
    fn test_missing_font_file() {
        let result = TextFont::load(Path::new("/nonexistent/font.ttf"), 12.0);
        assert!(matches!(result, Err(DisplayError::Font { .. })));
    }

    #[test]
    fn test_invalid_font_file() {
        let dir = std::env::temp_dir().join("oledmon_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("not_a_font.ttf");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"definitely not truetype")
            .unwrap();

        let result = TextFont::load(&path, 12.0);
        assert!(matches!(result, Err(DisplayError::Font { .. })));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_fallback_to_builtin() {
        let font = TextFont::load_or_builtin(Path::new("/nonexistent/font.ttf"), 12.0);
        assert!(font.is_builtin());
    }

    #[test]
    fn test_truetype_draws_within_line() {
        // Only meaningful where DejaVu is installed.
        let path = Path::new(DEJAVU_MONO);
        if !path.exists() {
            return;
        }
        let font = TextFont::load(path, 12.0).unwrap();
        let mut surface = RecordingSurface::default();
        font.draw_text(&mut surface, "Up:   01:02:05", Point::new(0, 18))
            .unwrap();
        assert!(surface.lit > 0);
        assert!(surface.min_y >= 18);
        assert!(surface.max_y < 36);
    }
}
