//! G-code line parser
//!
//! Turns one line of G-code into a typed [`Request`]. Only the commands the
//! retraction host acts on are decoded; everything else is handed back as
//! [`Request::Other`] so it can be passed through untouched.
//!
//! Two parameter forms are understood:
//! - classic axis words: `G1 X10 Y5.5 E-0.2`, spaces optional (`G1X10Y5.5`)
//! - extended key/value pairs: `SET_RETRACTION RETRACT_LENGTH=0.8`
//!
//! Comments start at `;` and run to the end of the line. A leading line
//! number (`N12`) and its trailing `*checksum` are dropped.

use core::fmt;

use crate::params::{MoveParams, SetRetraction};

/// Line parsing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Nothing but whitespace or a comment
    Empty,
    /// Parameter value is not a number
    InvalidNumber,
    /// Parameter is not in `KEY=value` form
    InvalidParameter,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineError::Empty => f.write_str("empty line"),
            LineError::InvalidNumber => f.write_str("invalid number"),
            LineError::InvalidParameter => f.write_str("malformed parameter"),
        }
    }
}

/// A decoded G-code line
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request<'a> {
    /// G10 / M103
    Retract,
    /// G11 / M101
    Unretract,
    /// SET_RETRACTION
    SetRetraction(SetRetraction),
    /// GET_RETRACTION
    GetRetraction,
    /// CLEAR_RETRACTION
    ClearRetraction,
    /// G0 / G1
    Move(MoveParams),
    /// G90
    AbsoluteCoordinates,
    /// G91
    RelativeCoordinates,
    /// G28
    Home,
    /// M84 / M18
    MotorsOff,
    /// M104 / M109
    SetExtruderTemp { target: f64, wait: bool },
    /// Any other command, by name (as written)
    Other(&'a str),
}

/// Command word of a line
enum Word<'a> {
    /// Letter + number, e.g. `G1`, `M103`, with any words glued on after it
    Code(char, u16, &'a str),
    /// Extended command name, e.g. `SET_RETRACTION`
    Name(&'a str),
}

fn classify(token: &str) -> Word<'_> {
    let mut chars = token.chars();
    if let Some(letter) = chars.next().filter(char::is_ascii_alphabetic) {
        let rest = chars.as_str();
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (number, glued) = rest.split_at(digits);
        let glued_ok = glued.chars().next().map_or(true, |c| c.is_ascii_alphabetic());
        if glued_ok {
            if let Ok(number) = number.parse::<u16>() {
                return Word::Code(letter.to_ascii_uppercase(), number, glued);
            }
        }
    }
    Word::Name(token)
}

/// Splits classic parameters into single words, `X10Y5` into `X10`, `Y5`
struct Words<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Words<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let end = self
            .rest
            .char_indices()
            .skip(1)
            .find(|(_, c)| c.is_ascii_alphabetic())
            .map_or(self.rest.len(), |(idx, _)| idx);
        let (word, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(word)
    }
}

fn words<'a>(
    glued: &'a str,
    tokens: impl Iterator<Item = &'a str>,
) -> impl Iterator<Item = &'a str> {
    core::iter::once(glued)
        .chain(tokens)
        .flat_map(|token| Words { rest: token })
}

/// Check for a leading `N<digits>` line number
fn has_line_number(code: &str) -> bool {
    let mut chars = code.trim_start().chars();
    matches!(chars.next(), Some('N' | 'n')) && chars.next().is_some_and(|c| c.is_ascii_digit())
}

/// Parse one line of G-code
pub fn parse_line(line: &str) -> Result<Request<'_>, LineError> {
    let mut code = match line.find(';') {
        Some(idx) => &line[..idx],
        None => line,
    };
    if has_line_number(code) {
        if let Some(idx) = code.find('*') {
            code = &code[..idx];
        }
    }

    let mut tokens = code.split_whitespace();
    let mut command = tokens.next().ok_or(LineError::Empty)?;
    let mut word = classify(command);
    if let Word::Code('N', _, glued) = word {
        command = if glued.is_empty() {
            tokens.next().ok_or(LineError::Empty)?
        } else {
            glued
        };
        word = classify(command);
    }

    let request = match word {
        Word::Code('G', 0 | 1, glued) => Request::Move(parse_axes(words(glued, tokens))?),
        Word::Code('G', 10, _) | Word::Code('M', 103, _) => Request::Retract,
        Word::Code('G', 11, _) | Word::Code('M', 101, _) => Request::Unretract,
        Word::Code('G', 28, _) => Request::Home,
        Word::Code('G', 90, _) => Request::AbsoluteCoordinates,
        Word::Code('G', 91, _) => Request::RelativeCoordinates,
        Word::Code('M', 18 | 84, _) => Request::MotorsOff,
        Word::Code('M', 104, glued) => Request::SetExtruderTemp {
            target: parse_axes_word(words(glued, tokens), 'S')?.unwrap_or(0.0),
            wait: false,
        },
        Word::Code('M', 109, glued) => Request::SetExtruderTemp {
            target: parse_axes_word(words(glued, tokens), 'S')?.unwrap_or(0.0),
            wait: true,
        },
        Word::Name(name) if name.eq_ignore_ascii_case("SET_RETRACTION") => {
            Request::SetRetraction(parse_set_retraction(tokens)?)
        }
        Word::Name(name) if name.eq_ignore_ascii_case("GET_RETRACTION") => Request::GetRetraction,
        Word::Name(name) if name.eq_ignore_ascii_case("CLEAR_RETRACTION") => {
            Request::ClearRetraction
        }
        _ => Request::Other(command),
    };
    Ok(request)
}

fn parse_number(text: &str) -> Result<f64, LineError> {
    text.parse::<f64>().map_err(|_| LineError::InvalidNumber)
}

/// Parse classic axis words into move parameters
///
/// Unknown letters are skipped, so vendor extensions do not break a move.
fn parse_axes<'a>(tokens: impl Iterator<Item = &'a str>) -> Result<MoveParams, LineError> {
    let mut params = MoveParams::new();
    for token in tokens {
        let mut chars = token.chars();
        let Some(letter) = chars.next() else {
            continue;
        };
        if !matches!(letter.to_ascii_uppercase(), 'X' | 'Y' | 'Z' | 'E' | 'F') {
            continue;
        }
        let value = parse_number(chars.as_str())?;
        params.set_axis(letter, value);
    }
    Ok(params)
}

/// Find a single classic word, e.g. the `S` of `M104 S210`
fn parse_axes_word<'a>(
    tokens: impl Iterator<Item = &'a str>,
    wanted: char,
) -> Result<Option<f64>, LineError> {
    let mut found = None;
    for token in tokens {
        let mut chars = token.chars();
        if chars.next().map(|c| c.to_ascii_uppercase()) == Some(wanted) {
            found = Some(parse_number(chars.as_str())?);
        }
    }
    Ok(found)
}

fn parse_set_retraction<'a>(
    tokens: impl Iterator<Item = &'a str>,
) -> Result<SetRetraction, LineError> {
    let mut req = SetRetraction::default();
    for token in tokens {
        let (key, value) = token.split_once('=').ok_or(LineError::InvalidParameter)?;
        if key.eq_ignore_ascii_case("RETRACT_LENGTH") {
            req.retract_length = Some(parse_number(value)?);
        } else if key.eq_ignore_ascii_case("RETRACT_SPEED") {
            req.retract_speed = Some(parse_number(value)?);
        } else if key.eq_ignore_ascii_case("UNRETRACT_EXTRA_LENGTH") {
            req.unretract_extra_length = Some(parse_number(value)?);
        } else if key.eq_ignore_ascii_case("UNRETRACT_SPEED") {
            req.unretract_speed = Some(parse_number(value)?);
        } else if key.eq_ignore_ascii_case("Z_HOP_HEIGHT") {
            req.z_hop_height = Some(parse_number(value)?);
        } else if key.eq_ignore_ascii_case("Z_HOP_STYLE") {
            req.set_style(value);
        }
    }
    Ok(req)
}
