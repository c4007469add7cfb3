//! Screen renderer for the 320x240 RGB565 panel.
//!
//! Draws `wordly-core` view models onto any `DrawTarget`, so the same code
//! runs against the ST7789 on the device and an emulated framebuffer.

use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_8X13, FONT_10X20};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::Text;

use wordly_core::view::{LinkBadge, LookupView, Screen, StatusBarView, WifiSetupView};

pub const SCREEN_WIDTH: u32 = 320;
pub const SCREEN_HEIGHT: u32 = 240;

const STATUS_BAR_HEIGHT: u32 = 16;
const MARGIN: i32 = 8;

const BG: Rgb565 = Rgb565::BLACK;
const FG: Rgb565 = Rgb565::WHITE;
const ACCENT: Rgb565 = Rgb565::CSS_DEEP_SKY_BLUE;
const MUTED: Rgb565 = Rgb565::CSS_GRAY;
const ERROR: Rgb565 = Rgb565::CSS_ORANGE_RED;
const OK: Rgb565 = Rgb565::CSS_LIME_GREEN;

pub struct ScreenRenderer;

impl ScreenRenderer {
    pub const fn new() -> Self {
        Self
    }

    pub fn render<D>(&self, screen: Screen<'_>, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        display.clear(BG)?;

        match screen {
            Screen::Splash {
                title,
                progress_pct,
                status,
            } => {
                self.draw_status_bar(display, status)?;
                self.draw_splash(display, title, progress_pct)
            }
            Screen::Main {
                entry,
                lookup,
                status,
            } => {
                self.draw_status_bar(display, status)?;
                self.draw_main(display, entry, lookup)
            }
            Screen::WifiSettings {
                ssid,
                setup,
                status,
            } => {
                self.draw_status_bar(display, status)?;
                self.draw_wifi_settings(display, ssid, setup)
            }
            Screen::KeyboardSettings {
                paired_addr,
                scanning,
                message,
                status,
            } => {
                self.draw_status_bar(display, status)?;
                self.draw_settings(display, "Keyboard", paired_addr, scanning, message)
            }
        }
    }

    fn draw_status_bar<D>(&self, display: &mut D, status: StatusBarView) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        Rectangle::new(Point::zero(), Size::new(SCREEN_WIDTH, STATUS_BAR_HEIGHT))
            .into_styled(PrimitiveStyle::with_fill(Rgb565::CSS_DARK_SLATE_GRAY))
            .draw(display)?;

        let y = 11;
        Text::new(
            "WiFi",
            Point::new(MARGIN, y),
            MonoTextStyle::new(&FONT_6X10, badge_color(status.wifi)),
        )
        .draw(display)?;
        Text::new(
            "KB",
            Point::new(MARGIN + 40, y),
            MonoTextStyle::new(&FONT_6X10, badge_color(status.keyboard)),
        )
        .draw(display)?;

        let mut volume: heapless::String<12> = heapless::String::new();
        let _ = write_volume(&mut volume, status.volume_pct);
        Text::new(
            &volume,
            Point::new(SCREEN_WIDTH as i32 - 60, y),
            MonoTextStyle::new(&FONT_6X10, FG),
        )
        .draw(display)?;
        Ok(())
    }

    fn draw_splash<D>(&self, display: &mut D, title: &str, progress_pct: u8) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let style = MonoTextStyle::new(&FONT_10X20, ACCENT);
        let x = centered_x(title, &FONT_10X20);
        Text::new(title, Point::new(x, 110), style).draw(display)?;

        let bar_width = SCREEN_WIDTH - 2 * 40;
        let filled = bar_width * progress_pct.min(100) as u32 / 100;
        Rectangle::new(Point::new(40, 150), Size::new(bar_width, 8))
            .into_styled(PrimitiveStyle::with_stroke(MUTED, 1))
            .draw(display)?;
        Rectangle::new(Point::new(40, 150), Size::new(filled, 8))
            .into_styled(PrimitiveStyle::with_fill(ACCENT))
            .draw(display)?;
        Ok(())
    }

    fn draw_main<D>(
        &self,
        display: &mut D,
        entry: &str,
        lookup: LookupView<'_>,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let mut prompt: heapless::String<{ 2 + wordly_core::dictionary::WORD_BYTES }> =
            heapless::String::new();
        let _ = prompt.push_str("> ");
        let _ = prompt.push_str(entry);
        Text::new(
            &prompt,
            Point::new(MARGIN, 34),
            MonoTextStyle::new(&FONT_8X13, FG),
        )
        .draw(display)?;

        let body_top = 56;
        match lookup {
            LookupView::Idle => {
                Text::new(
                    "Type a word and press Enter",
                    Point::new(MARGIN, body_top),
                    MonoTextStyle::new(&FONT_6X10, MUTED),
                )
                .draw(display)?;
            }
            LookupView::Pending { word } => {
                let mut line: heapless::String<{ 12 + wordly_core::dictionary::WORD_BYTES }> =
                    heapless::String::new();
                let _ = line.push_str("Looking up ");
                let _ = line.push_str(word);
                Text::new(
                    &line,
                    Point::new(MARGIN, body_top),
                    MonoTextStyle::new(&FONT_6X10, MUTED),
                )
                .draw(display)?;
            }
            LookupView::Entry {
                word,
                explanation,
                sample_sentence,
            } => {
                Text::new(
                    word,
                    Point::new(MARGIN, body_top + 8),
                    MonoTextStyle::new(&FONT_10X20, ACCENT),
                )
                .draw(display)?;
                let mut y = body_top + 30;
                y = self.draw_wrapped(display, explanation, y, FG, 8)?;
                self.draw_wrapped(display, sample_sentence, y + 6, MUTED, 6)?;
            }
            LookupView::Failed { message } => {
                Text::new(
                    message,
                    Point::new(MARGIN, body_top),
                    MonoTextStyle::new(&FONT_8X13, ERROR),
                )
                .draw(display)?;
            }
        }
        Ok(())
    }

    fn draw_wifi_settings<D>(
        &self,
        display: &mut D,
        ssid: &str,
        setup: WifiSetupView<'_>,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        Text::new(
            "WiFi",
            Point::new(MARGIN, 44),
            MonoTextStyle::new(&FONT_10X20, ACCENT),
        )
        .draw(display)?;

        match setup {
            WifiSetupView::Status {
                connecting,
                message,
            } => {
                if !ssid.is_empty() {
                    Text::new(
                        ssid,
                        Point::new(MARGIN, 74),
                        MonoTextStyle::new(&FONT_8X13, FG),
                    )
                    .draw(display)?;
                }
                if connecting {
                    if !message.is_empty() {
                        Text::new(
                            message,
                            Point::new(MARGIN, 100),
                            MonoTextStyle::new(&FONT_8X13, ERROR),
                        )
                        .draw(display)?;
                    }
                } else {
                    Text::new(
                        "Connected",
                        Point::new(MARGIN, 100),
                        MonoTextStyle::new(&FONT_8X13, OK),
                    )
                    .draw(display)?;
                }
                Text::new(
                    "Type to enter a new network",
                    Point::new(MARGIN, 126),
                    MonoTextStyle::new(&FONT_6X10, MUTED),
                )
                .draw(display)?;
            }
            WifiSetupView::EnterSsid { ssid } => {
                self.draw_entry_field(display, "SSID:", ssid, 74)?;
                Text::new(
                    "Enter: set password",
                    Point::new(MARGIN, 126),
                    MonoTextStyle::new(&FONT_6X10, MUTED),
                )
                .draw(display)?;
            }
            WifiSetupView::EnterPassword { ssid, password_len } => {
                self.draw_entry_field(display, "SSID:", ssid, 74)?;
                let mut masked: heapless::String<{ wordly_core::config::PASSWORD_BYTES }> =
                    heapless::String::new();
                for _ in 0..password_len {
                    let _ = masked.push('*');
                }
                self.draw_entry_field(display, "Pass:", &masked, 100)?;
                Text::new(
                    "Enter: connect",
                    Point::new(MARGIN, 126),
                    MonoTextStyle::new(&FONT_6X10, MUTED),
                )
                .draw(display)?;
            }
        }

        Text::new(
            "Esc: back",
            Point::new(MARGIN, SCREEN_HEIGHT as i32 - 12),
            MonoTextStyle::new(&FONT_6X10, MUTED),
        )
        .draw(display)?;
        Ok(())
    }

    fn draw_entry_field<D>(
        &self,
        display: &mut D,
        label: &str,
        value: &str,
        y: i32,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        Text::new(
            label,
            Point::new(MARGIN, y),
            MonoTextStyle::new(&FONT_8X13, MUTED),
        )
        .draw(display)?;
        if !value.is_empty() {
            Text::new(
                value,
                Point::new(MARGIN + 48, y),
                MonoTextStyle::new(&FONT_8X13, FG),
            )
            .draw(display)?;
        }
        Ok(())
    }

    fn draw_settings<D>(
        &self,
        display: &mut D,
        title: &str,
        detail: &str,
        busy: bool,
        message: &str,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        Text::new(
            title,
            Point::new(MARGIN, 44),
            MonoTextStyle::new(&FONT_10X20, ACCENT),
        )
        .draw(display)?;

        if !detail.is_empty() {
            Text::new(
                detail,
                Point::new(MARGIN, 74),
                MonoTextStyle::new(&FONT_8X13, FG),
            )
            .draw(display)?;
        }

        if busy {
            if !message.is_empty() {
                Text::new(
                    message,
                    Point::new(MARGIN, 100),
                    MonoTextStyle::new(&FONT_8X13, ERROR),
                )
                .draw(display)?;
            }
        } else {
            Text::new(
                "Connected",
                Point::new(MARGIN, 100),
                MonoTextStyle::new(&FONT_8X13, OK),
            )
            .draw(display)?;
        }

        Text::new(
            "Esc: back",
            Point::new(MARGIN, SCREEN_HEIGHT as i32 - 12),
            MonoTextStyle::new(&FONT_6X10, MUTED),
        )
        .draw(display)?;
        Ok(())
    }

    /// Greedy word wrap at the 6x10 body font. Returns the y coordinate of
    /// the line after the last one drawn.
    fn draw_wrapped<D>(
        &self,
        display: &mut D,
        text: &str,
        top: i32,
        color: Rgb565,
        max_lines: usize,
    ) -> Result<i32, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        const COLS: usize = ((SCREEN_WIDTH as usize) - 2 * MARGIN as usize) / 6;
        const LINE_HEIGHT: i32 = 12;

        let style = MonoTextStyle::new(&FONT_6X10, color);
        let mut y = top;
        let mut lines = 0usize;
        let mut line: heapless::String<COLS> = heapless::String::new();

        for word in text.split_whitespace() {
            let needed = if line.is_empty() {
                word.len()
            } else {
                line.len() + 1 + word.len()
            };
            if needed > COLS && !line.is_empty() {
                Text::new(&line, Point::new(MARGIN, y), style).draw(display)?;
                y += LINE_HEIGHT;
                lines += 1;
                line.clear();
                if lines >= max_lines {
                    return Ok(y);
                }
            }
            if !line.is_empty() {
                let _ = line.push(' ');
            }
            // Words longer than a line are cut rather than hyphenated.
            for ch in word.chars().take(COLS.saturating_sub(line.len())) {
                let _ = line.push(ch);
            }
        }
        if !line.is_empty() {
            Text::new(&line, Point::new(MARGIN, y), style).draw(display)?;
            y += LINE_HEIGHT;
        }
        Ok(y)
    }
}

impl Default for ScreenRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn badge_color(badge: LinkBadge) -> Rgb565 {
    match badge {
        LinkBadge::Connected => OK,
        LinkBadge::Disconnected => ERROR,
        LinkBadge::Unavailable => MUTED,
    }
}

fn centered_x(text: &str, font: &MonoFont<'_>) -> i32 {
    let width = text.len() as i32 * font.character_size.width as i32;
    ((SCREEN_WIDTH as i32 - width) / 2).max(0)
}

fn write_volume(out: &mut heapless::String<12>, pct: u8) -> core::fmt::Result {
    use core::fmt::Write;
    write!(out, "Vol {pct:>3}%")
}
