//! Pixel helpers for dialog overlays. Glyphs come from the host's text
//! primitive; everything else is plain rectangle work on an RGBA buffer.

use image::RgbaImage;

use crate::app::bitmap::Color;
use crate::app::host::{FontMetrics, Host};

pub fn fill_rect(target: &mut RgbaImage, x: i32, y: i32, width: u32, height: u32, color: Color) {
    let rgba = color.rgba();
    let x0 = x.max(0) as u32;
    let y0 = y.max(0) as u32;
    let x1 = (x + width as i32).clamp(0, target.width() as i32) as u32;
    let y1 = (y + height as i32).clamp(0, target.height() as i32) as u32;
    for py in y0..y1 {
        for px in x0..x1 {
            target.put_pixel(px, py, rgba);
        }
    }
}

/// One-pixel outline.
pub fn draw_rect(target: &mut RgbaImage, x: i32, y: i32, width: u32, height: u32, color: Color) {
    if width == 0 || height == 0 {
        return;
    }
    fill_rect(target, x, y, width, 1, color);
    fill_rect(target, x, y + height as i32 - 1, width, 1, color);
    fill_rect(target, x, y, 1, height, color);
    fill_rect(target, x + width as i32 - 1, y, 1, height, color);
}

/// Splits on the two-character `\n` escape as well as real newlines.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split("\\n").flat_map(|part| part.split('\n')).collect()
}

/// Prints `text` line by line starting at `(x, y)`.
pub fn draw_text(
    host: &mut dyn Host,
    target: &mut RgbaImage,
    text: &str,
    x: i32,
    y: i32,
    color: Color,
    scale: u32,
) {
    let font = host.font().scaled(scale);
    let mut dy = y;
    for line in split_lines(text) {
        host.print(target, line, x, dy, color, font);
        dy += font.char_height as i32;
    }
}

/// Prints `text` centred on `target`. The shadow is drawn first, offset by a
/// tenth of the glyph height.
pub fn draw_text_centered(
    host: &mut dyn Host,
    target: &mut RgbaImage,
    text: &str,
    color: Color,
    scale: u32,
    shadowed: bool,
) {
    let font = host.font().scaled(scale);
    let lines = split_lines(text);
    let text_height = (font.char_height as usize * lines.len()) as i32;
    let mut dy = target.height() as i32 / 2 - text_height / 2;
    let shadow_offset = (font.char_height as f32 * 0.1) as i32;
    for line in lines {
        let dx = centered_x(target, line, font);
        if shadowed {
            host.print(
                target,
                line,
                dx + shadow_offset,
                dy + shadow_offset,
                Color::BLACK,
                font,
            );
        }
        host.print(target, line, dx, dy, color, font);
        dy += font.char_height as i32;
    }
}

fn centered_x(target: &RgbaImage, line: &str, font: FontMetrics) -> i32 {
    let text_width = (font.char_width as usize * line.chars().count()) as i32;
    target.width() as i32 / 2 - text_width / 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::host::HeadlessHost;

    #[test]
    fn fill_rect_clips_to_the_buffer() {
        let mut target = RgbaImage::new(4, 4);
        fill_rect(&mut target, -2, 2, 10, 10, Color::RED);
        assert_eq!(*target.get_pixel(0, 3), Color::RED.rgba());
        assert_eq!(*target.get_pixel(3, 1), Color::TRANSPARENT.rgba());
    }

    #[test]
    fn draw_rect_leaves_the_inside_untouched() {
        let mut target = RgbaImage::new(5, 5);
        draw_rect(&mut target, 0, 0, 5, 5, Color::WHITE);
        assert_eq!(*target.get_pixel(4, 4), Color::WHITE.rgba());
        assert_eq!(*target.get_pixel(2, 2), Color::TRANSPARENT.rgba());
    }

    #[test]
    fn escaped_newlines_split_lines() {
        assert_eq!(split_lines("one\\ntwo\nthree"), ["one", "two", "three"]);
        assert_eq!(split_lines("single"), ["single"]);
    }

    #[test]
    fn shadowed_text_prints_each_line_twice() {
        let mut host = HeadlessHost::new();
        let mut target = RgbaImage::new(64, 32);
        draw_text_centered(&mut host, &mut target, "hi\\nyo", Color::WHITE, 1, true);
        assert_eq!(host.printed(), ["hi", "hi", "yo", "yo"]);
    }
}
