//! # Forecast Panel Rendering
//!
//! This module renders the merged forecast both to a 1-bit panel image and to
//! plain text for terminal output. The panel layout targets small e-ink screens:
//!
//! ```text
//! +-----------------------------------------------------------+
//! | DEVONPORT                          Updated 2024-06-01 14:05|
//! |-----------------------------------------------------------|
//! | Sat       | Sun       | Mon       | ...                    |
//! | [01d]     | [51d]     | [04d]     |                        |
//! | 18/11°C   | ...       |           |                        |
//! | -> 9 (18) |           |           |                        |
//! | sea, rain, visibility, tides ...                            |
//! +-----------------------------------------------------------+
//! ```
//!
//! Drawing goes through `embedded-graphics`, so [`draw_panel`] works on any
//! `DrawTarget<Color = BinaryColor>`; [`render`] draws into an in-memory
//! [`FrameBuffer`] that can be written out as a binary PBM image.

use crate::{Forecast, ForecastDay};
use embedded_graphics::{
    mono_font::{
        iso_8859_1::{FONT_10X20, FONT_6X10},
        MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Line, PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};
use std::convert::Infallible;
use std::path::Path;
use std::{fs, io};
use thiserror::Error;

const MARGIN: i32 = 6;
const LINE_HEIGHT: i32 = 12;
const SMALL_CHAR_WIDTH: i32 = 6;
const TITLE_HEIGHT: i32 = 20;
const ARROW_HALF_LENGTH: i32 = 4;

/// Errors that can occur while producing the panel image.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Width or height is zero, nothing can be drawn
    #[error("cannot render onto a {width}x{height} canvas")]
    EmptyCanvas { width: u32, height: u32 },

    /// Writing the image file failed
    #[error("image IO: {0}")]
    Io(#[from] io::Error),
}

/// In-memory 1-bit image, one bit per pixel, rows padded to whole bytes.
///
/// A set bit is ink (`BinaryColor::On`), matching the PBM convention where
/// `1` is black.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    bits: Vec<u8>,
}

impl FrameBuffer {
    /// Blank (all paper) buffer of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        let bytes_per_row = width.div_ceil(8);
        Self {
            width,
            height,
            bits: vec![0x00; (bytes_per_row * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn locate(&self, x: u32, y: u32) -> Option<(usize, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bytes_per_row = self.width.div_ceil(8);
        let byte_index = (y * bytes_per_row + x / 8) as usize;
        Some((byte_index, 0x80 >> (x % 8)))
    }

    /// Set one pixel; coordinates outside the buffer are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: BinaryColor) {
        let Some((byte_index, bit_mask)) = self.locate(x, y) else {
            return;
        };
        match color {
            BinaryColor::On => self.bits[byte_index] |= bit_mask,
            BinaryColor::Off => self.bits[byte_index] &= !bit_mask,
        }
    }

    /// Colour of one pixel, `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<BinaryColor> {
        let (byte_index, bit_mask) = self.locate(x, y)?;
        Some(BinaryColor::from(self.bits[byte_index] & bit_mask != 0))
    }

    /// Number of inked pixels.
    pub fn ink_count(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Encode as a binary PBM (`P4`) image.
    pub fn to_pbm(&self) -> Vec<u8> {
        let mut image = format!("P4\n{} {}\n", self.width, self.height).into_bytes();
        image.extend_from_slice(&self.bits);
        image
    }

    /// Write the image to `path` as PBM.
    pub fn save_pbm<P: AsRef<Path>>(&self, path: P) -> Result<(), RenderError> {
        fs::write(path, self.to_pbm())?;
        Ok(())
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) {
                self.set_pixel(x, y, color);
            }
        }
        Ok(())
    }
}

/// Render the forecast onto a fresh `width` x `height` image.
pub fn render(forecast: &Forecast, width: u32, height: u32) -> Result<FrameBuffer, RenderError> {
    if width == 0 || height == 0 {
        return Err(RenderError::EmptyCanvas { width, height });
    }

    let mut frame = FrameBuffer::new(width, height);
    draw_panel(forecast, &mut frame).unwrap_or_else(|never| match never {});
    log::debug!(
        "Rendered {} days onto {}x{} panel ({} inked pixels)",
        forecast.days.len(),
        width,
        height,
        frame.ink_count()
    );
    Ok(frame)
}

/// Draw the forecast onto any binary display.
pub fn draw_panel<D>(forecast: &Forecast, display: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let width = display.bounding_box().size.width as i32;
    let height = display.bounding_box().size.height as i32;
    let title_style = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);
    let text_style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
    let stroke = PrimitiveStyle::with_stroke(BinaryColor::On, 1);

    // Header: station name on the left, refresh time on the right
    Text::with_baseline(
        &forecast.title,
        Point::new(MARGIN, MARGIN),
        title_style,
        Baseline::Top,
    )
    .draw(display)?;

    let refresh = format!("Updated {}", forecast.last_refresh);
    let refresh_x = (width - MARGIN - refresh.len() as i32 * SMALL_CHAR_WIDTH).max(MARGIN);
    Text::with_baseline(
        &refresh,
        Point::new(refresh_x, MARGIN + 6),
        text_style,
        Baseline::Top,
    )
    .draw(display)?;

    let top = MARGIN + TITLE_HEIGHT + MARGIN;
    Line::new(Point::new(0, top - 3), Point::new(width - 1, top - 3))
        .into_styled(stroke)
        .draw(display)?;

    if forecast.days.is_empty() {
        Text::with_baseline(
            "No forecast data",
            Point::new(MARGIN, top + MARGIN),
            text_style,
            Baseline::Top,
        )
        .draw(display)?;
        return Ok(());
    }

    let column_width = width / forecast.days.len() as i32;
    for (index, day) in forecast.days.iter().enumerate() {
        let x = index as i32 * column_width;
        if index > 0 {
            Line::new(Point::new(x, top), Point::new(x, height - 1))
                .into_styled(stroke)
                .draw(display)?;
        }
        draw_day_column(display, day, Point::new(x + MARGIN, top + 2))?;
    }

    Ok(())
}

/// Draw one day's column with its top-left corner at `origin`.
fn draw_day_column<D>(display: &mut D, day: &ForecastDay, origin: Point) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let day_style = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);
    let text_style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
    let weather = &day.weather;
    let marine = &day.marine;

    Text::with_baseline(&day.day, origin, day_style, Baseline::Top).draw(display)?;
    let mut y = origin.y + TITLE_HEIGHT + 2;

    // Pictogram placeholder: the icon id in a frame
    let icon_label = weather.daily.weather_icon.as_str();
    let icon_width = icon_label.len() as u32 * SMALL_CHAR_WIDTH as u32 + 4;
    Rectangle::new(Point::new(origin.x, y), Size::new(icon_width, LINE_HEIGHT as u32 + 2))
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
        .draw(display)?;
    Text::with_baseline(icon_label, Point::new(origin.x + 2, y + 2), text_style, Baseline::Top)
        .draw(display)?;
    y += LINE_HEIGHT + 6;

    let arrow_center = Point::new(origin.x + ARROW_HALF_LENGTH, y + LINE_HEIGHT / 2 - 1);
    draw_wind_arrow(display, arrow_center, &weather.daily.wind_arrow)?;
    let wind = format!(
        "{:.0} ({:.0}) mph",
        weather.daily.wind_speed_10m_max, weather.daily.wind_gusts_10m_max
    );
    Text::with_baseline(
        &wind,
        Point::new(origin.x + 2 * ARROW_HALF_LENGTH + 4, y),
        text_style,
        Baseline::Top,
    )
    .draw(display)?;
    y += LINE_HEIGHT;

    let mut lines = vec![
        format!(
            "{:.0}/{:.0}°C",
            weather.daily.temperature_2m_max, weather.daily.temperature_2m_min
        ),
        format!(
            "Sun {}-{}",
            weather.daily.sunrise.format("%H:%M"),
            weather.daily.sunset.format("%H:%M")
        ),
        format!(
            "Rain {:.1}/{:.1}mm",
            weather.am_precipitation, weather.pm_precipitation
        ),
        format!(
            "Vis {:.0}/{:.0}km",
            weather.am_visibility / 1000.0,
            weather.pm_visibility / 1000.0
        ),
        format!("AM {}", marine.am_sea_state),
        format!("PM {}", marine.pm_sea_state),
        format!(
            "Wave {:.1}/{:.1}m",
            marine.am_mean_wave_height, marine.pm_mean_wave_height
        ),
        String::new(),
    ];
    lines.extend(day.tides.iter().map(|tide| {
        format!(
            "{} {} {:.1}m",
            tide.event_type,
            tide.time.format("%H:%M"),
            tide.height
        )
    }));

    for line in lines {
        Text::with_baseline(&line, Point::new(origin.x, y), text_style, Baseline::Top)
            .draw(display)?;
        y += LINE_HEIGHT;
    }

    Ok(())
}

/// Unit step for each wind arrow glyph, screen coordinates (y grows down).
fn arrow_vector(arrow: &str) -> Option<(i32, i32)> {
    match arrow {
        "↓" => Some((0, 1)),
        "↙" => Some((-1, 1)),
        "←" => Some((-1, 0)),
        "↖" => Some((-1, -1)),
        "↑" => Some((0, -1)),
        "↗" => Some((1, -1)),
        "→" => Some((1, 0)),
        "↘" => Some((1, 1)),
        _ => None,
    }
}

/// Draw a wind arrow glyph as a line with a two-barb head.
///
/// The mono fonts only cover Latin-1, so the arrow is drawn with primitives.
fn draw_wind_arrow<D>(display: &mut D, center: Point, arrow: &str) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let Some((dx, dy)) = arrow_vector(arrow) else {
        return Ok(());
    };
    let stroke = PrimitiveStyle::with_stroke(BinaryColor::On, 1);
    let step = Point::new(dx * ARROW_HALF_LENGTH, dy * ARROW_HALF_LENGTH);
    let tail = center - step;
    let head = center + step;

    Line::new(tail, head).into_styled(stroke).draw(display)?;

    // Barbs: the reversed direction rotated by +/-45 degrees
    for (bx, by) in [(-dx - dy, -dy + dx), (-dx + dy, -dy - dx)] {
        let barb = Point::new(bx.signum() * 2, by.signum() * 2);
        Line::new(head, head + barb).into_styled(stroke).draw(display)?;
    }

    Ok(())
}

/// Render the forecast as a plain text table.
pub fn draw_ascii(forecast: &Forecast) -> String {
    let mut lines = vec![
        format!("{}  (updated {})", forecast.title, forecast.last_refresh),
        "─".repeat(72),
    ];

    if forecast.days.is_empty() {
        lines.push("No forecast data".to_string());
    }

    for day in &forecast.days {
        let weather = &day.weather;
        let marine = &day.marine;
        lines.push(format!(
            "{} {}  {:<5} {:>3.0}/{:<3.0}°C  {} {:.0} ({:.0}) mph  sun {}-{}",
            day.day,
            day.date,
            weather.daily.weather_icon,
            weather.daily.temperature_2m_max,
            weather.daily.temperature_2m_min,
            weather.daily.wind_arrow,
            weather.daily.wind_speed_10m_max,
            weather.daily.wind_gusts_10m_max,
            weather.daily.sunrise.format("%H:%M"),
            weather.daily.sunset.format("%H:%M"),
        ));
        lines.push(format!(
            "    rain {:.2}/{:.2} mm  visibility {:.0}/{:.0} m",
            weather.am_precipitation,
            weather.pm_precipitation,
            weather.am_visibility,
            weather.pm_visibility,
        ));
        lines.push(format!(
            "    sea AM {} {:.2} m  PM {} {:.2} m",
            marine.am_sea_state,
            marine.am_mean_wave_height,
            marine.pm_sea_state,
            marine.pm_mean_wave_height,
        ));
        let tides: Vec<String> = day
            .tides
            .iter()
            .map(|t| format!("{} {} {:.2}m", t.event_type, t.time.format("%H:%M"), t.height))
            .collect();
        lines.push(format!("    tides {}", tides.join("  ")));
    }

    let mut output = lines.join("\n");
    output.push('\n');
    output
}
