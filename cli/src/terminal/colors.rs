use colored::Color;

pub const PRIMARY: Color = Color::BrightGreen;
pub const ACCENT: Color = Color::BrightCyan;
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;

pub const STATUS_OK: Color = Color::Green;
pub const STATUS_REDIRECT: Color = Color::Cyan;
pub const STATUS_CLIENT_ERR: Color = Color::Yellow;
pub const STATUS_SERVER_ERR: Color = Color::Red;
pub const UNREACHABLE: Color = Color::BrightBlack;

/// Color of an HTTP status code, or of a host that never answered.
pub fn for_status(status: Option<u16>) -> Color {
    match status {
        Some(200..=299) => STATUS_OK,
        Some(300..=399) => STATUS_REDIRECT,
        Some(400..=499) => STATUS_CLIENT_ERR,
        Some(_) => STATUS_SERVER_ERR,
        None => UNREACHABLE,
    }
}
