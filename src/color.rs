/*!
 # Color conversion

 LEDnetWF controllers take colors as hue/saturation/value instead of raw RGB.
 Hue is sent at half scale (`0..180`) so it fits into a single byte, saturation
 and value are percentages.
*/

/// A color in the half-scale HSV representation used on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Hsv {
    /// Hue in degrees divided by two (0-179)
    pub hue: u8,
    /// Saturation (0-100)
    pub saturation: u8,
    /// Value (0-100)
    pub value: u8,
}

/// Converts an RGB color to half-scale HSV
///
/// # Arguments
///
/// * `red` - Red component (0-255)
/// * `green` - Green component (0-255)
/// * `blue` - Blue component (0-255)
pub fn rgb_to_hsv(red: u8, green: u8, blue: u8) -> Hsv {
    let r = f32::from(red) / 255.0;
    let g = f32::from(green) / 255.0;
    let b = f32::from(blue) / 255.0;

    let value = r.max(g).max(b);
    let chroma = value - r.min(g).min(b);

    let mut hue = if chroma == 0.0 {
        0.0
    } else if value == r {
        60.0 * ((g - b) / chroma)
    } else if value == g {
        60.0 * ((b - r) / chroma + 2.0)
    } else {
        60.0 * ((r - g) / chroma + 4.0)
    };
    if hue < 0.0 {
        hue += 360.0;
    }

    let saturation = if value == 0.0 {
        0.0
    } else {
        chroma / value * 100.0
    };

    Hsv {
        hue: ((hue / 2.0).round() as u8) % 180,
        saturation: saturation.round() as u8,
        value: (value * 100.0).round() as u8,
    }
}

/// Converts an RGB color to the HSV triple a LEDnetWF controller expects.
///
/// These controllers have their red and green channels swapped, so the
/// channels are exchanged before conversion.
pub fn lednetwf_hsv(red: u8, green: u8, blue: u8) -> Hsv {
    rgb_to_hsv(green, red, blue)
}

/// Converts a half-scale HSV color back to RGB
///
/// # Arguments
///
/// * `hue` - Hue divided by two (0-179, larger values wrap)
/// * `saturation` - Saturation (0-100, larger values are limited to 100)
/// * `value` - Value (0-100, larger values are limited to 100)
pub fn hsv_to_rgb(hue: u8, saturation: u8, value: u8) -> (u8, u8, u8) {
    let h = f32::from(hue % 180) * 2.0;
    let s = f32::from(saturation.min(100)) / 100.0;
    let v = f32::from(value.min(100)) / 100.0;

    let chroma = v * s;
    let x = chroma * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - chroma;

    let (r, g, b) = match (h / 60.0) as u8 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };

    let to_byte = |channel: f32| ((channel + m) * 255.0).round() as u8;
    (to_byte(r), to_byte(g), to_byte(b))
}
