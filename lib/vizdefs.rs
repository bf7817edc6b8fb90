use tabbycat::attributes::Color;

pub const FONT: &str = "DejaVu Sans";
pub const FONTSIZE: f64 = 10.0; // pt
pub const CIRCLE_HEIGHT: f64 = 0.20; // in
pub const NODE_MARGIN: f64 = 0.025; // in

pub const NODE_COLOR : Color = Color::Rgb(115, 150, 250); // blue
pub const COSET_COLOR: Color = Color::Rgb(230, 115, 125); // red
pub const SELF_WIRE  : Color = Color::Rgb(255, 136, 68 ); // orange
