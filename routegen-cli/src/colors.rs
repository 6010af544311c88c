//! Terminal palette, named by what each color marks.

use colored::CustomColor;

// Catppuccin Mocha.
const MAUVE: (u8, u8, u8) = (203, 166, 247);
const LAVENDER: (u8, u8, u8) = (180, 190, 254);
const SKY: (u8, u8, u8) = (137, 220, 235);
const SUBTEXT: (u8, u8, u8) = (166, 173, 200);
const GREEN: (u8, u8, u8) = (166, 227, 161);
const YELLOW: (u8, u8, u8) = (249, 226, 175);
const RED: (u8, u8, u8) = (243, 139, 168);
const BLUE: (u8, u8, u8) = (137, 180, 250);

fn custom((r, g, b): (u8, u8, u8)) -> CustomColor {
    CustomColor::new(r, g, b)
}

/// Color for an HTTP method column; `None` leaves the text plain.
pub fn method(name: &str) -> Option<CustomColor> {
    let rgb = match name {
        "GET" => GREEN,
        "POST" => BLUE,
        "PUT" => YELLOW,
        "PATCH" => SKY,
        "DELETE" => RED,
        _ => return None,
    };
    Some(custom(rgb))
}

pub fn pattern() -> CustomColor {
    custom(MAUVE)
}

pub fn middleware() -> CustomColor {
    custom(LAVENDER)
}

pub fn muted() -> CustomColor {
    custom(SUBTEXT)
}

pub fn ok() -> CustomColor {
    custom(GREEN)
}

pub fn warning() -> CustomColor {
    custom(YELLOW)
}

pub fn error() -> CustomColor {
    custom(RED)
}

pub fn info() -> CustomColor {
    custom(BLUE)
}

pub fn note() -> CustomColor {
    custom(SKY)
}
