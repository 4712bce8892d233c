//! Typed command parameters
//!
//! Every field is optional: `None` means the parameter was not given on the
//! command line, which is different from a given value of zero.

use core::fmt::{self, Write};

use heapless::String;

/// Maximum stored length of a z-hop style name
pub const MAX_STYLE_NAME_LEN: usize = 64;

/// Marks a style name that did not fit
const ELLIPSIS: &str = "...";

/// Raw z-hop style name as given on the command line
///
/// Kept as text until the core validates it against the known styles.
pub type StyleName = String<MAX_STYLE_NAME_LEN>;

/// Fixed-precision number for G-code output
///
/// Rounds to five decimals (the precision the host firmware accepts) and
/// drops trailing zeros, so `1200.0` renders as `1200` and `0.4` as `0.4`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decimal(pub f64);

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf: String<48> = String::new();
        if write!(buf, "{:.5}", self.0).is_err() {
            // Out of range for the buffer, let core format it
            return write!(f, "{}", self.0);
        }

        let mut text = buf.as_str();
        if text.contains('.') {
            text = text.trim_end_matches('0').trim_end_matches('.');
        }
        if text == "-0" {
            text = "0";
        }
        f.write_str(text)
    }
}

/// Axis parameters of a G0/G1 move
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveParams {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub e: Option<f64>,
    /// Feedrate in mm/min
    pub f: Option<f64>,
}

impl MoveParams {
    /// Create a move with no parameters
    pub const fn new() -> Self {
        Self {
            x: None,
            y: None,
            z: None,
            e: None,
            f: None,
        }
    }

    pub fn with_x(mut self, x: f64) -> Self {
        self.x = Some(x);
        self
    }

    pub fn with_y(mut self, y: f64) -> Self {
        self.y = Some(y);
        self
    }

    pub fn with_z(mut self, z: f64) -> Self {
        self.z = Some(z);
        self
    }

    pub fn with_e(mut self, e: f64) -> Self {
        self.e = Some(e);
        self
    }

    pub fn with_f(mut self, f: f64) -> Self {
        self.f = Some(f);
        self
    }

    /// Set a parameter by its axis letter, returns false for unknown letters
    pub fn set_axis(&mut self, letter: char, value: f64) -> bool {
        match letter.to_ascii_uppercase() {
            'X' => self.x = Some(value),
            'Y' => self.y = Some(value),
            'Z' => self.z = Some(value),
            'E' => self.e = Some(value),
            'F' => self.f = Some(value),
            _ => return false,
        }
        true
    }
}

/// Renders the parameter list with a leading space per parameter
impl fmt::Display for MoveParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axes = [
            ('X', self.x),
            ('Y', self.y),
            ('Z', self.z),
            ('E', self.e),
            ('F', self.f),
        ];
        for (letter, value) in axes {
            if let Some(value) = value {
                write!(f, " {}{}", letter, Decimal(value))?;
            }
        }
        Ok(())
    }
}

/// A `SET_RETRACTION` request
///
/// Fields that are `None` leave the corresponding setting untouched.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetRetraction {
    pub retract_length: Option<f64>,
    pub retract_speed: Option<f64>,
    pub unretract_extra_length: Option<f64>,
    pub unretract_speed: Option<f64>,
    pub z_hop_height: Option<f64>,
    pub z_hop_style: Option<StyleName>,
}

impl SetRetraction {
    /// Fold a later request into this one, the later value winning per field
    pub fn merge(&mut self, later: &SetRetraction) {
        if later.retract_length.is_some() {
            self.retract_length = later.retract_length;
        }
        if later.retract_speed.is_some() {
            self.retract_speed = later.retract_speed;
        }
        if later.unretract_extra_length.is_some() {
            self.unretract_extra_length = later.unretract_extra_length;
        }
        if later.unretract_speed.is_some() {
            self.unretract_speed = later.unretract_speed;
        }
        if later.z_hop_height.is_some() {
            self.z_hop_height = later.z_hop_height;
        }
        if later.z_hop_style.is_some() {
            self.z_hop_style = later.z_hop_style.clone();
        }
    }

    /// Store a style name as written, minus surrounding whitespace
    ///
    /// Names longer than [`MAX_STYLE_NAME_LEN`] are cut short and end in
    /// `...`; no valid style is that long, so the result still fails
    /// validation.
    pub fn set_style(&mut self, raw: &str) {
        let raw = raw.trim();
        let mut name = StyleName::new();
        if name.push_str(raw).is_err() {
            let limit = MAX_STYLE_NAME_LEN - ELLIPSIS.len();
            for c in raw.chars() {
                if name.len() + c.len_utf8() > limit {
                    break;
                }
                let _ = name.push(c);
            }
            let _ = name.push_str(ELLIPSIS);
        }
        self.z_hop_style = Some(name);
    }
}

/// Renders `KEY=value` pairs separated by spaces, in a fixed key order
impl fmt::Display for SetRetraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let numbers = [
            ("RETRACT_LENGTH", self.retract_length),
            ("RETRACT_SPEED", self.retract_speed),
            ("UNRETRACT_EXTRA_LENGTH", self.unretract_extra_length),
            ("UNRETRACT_SPEED", self.unretract_speed),
            ("Z_HOP_HEIGHT", self.z_hop_height),
        ];

        let mut first = true;
        for (key, value) in numbers {
            if let Some(value) = value {
                if !first {
                    f.write_char(' ')?;
                }
                write!(f, "{}={}", key, Decimal(value))?;
                first = false;
            }
        }
        if let Some(style) = &self.z_hop_style {
            if !first {
                f.write_char(' ')?;
            }
            write!(f, "Z_HOP_STYLE={}", style)?;
        }
        Ok(())
    }
}
