use crate::foundation::core::Rgba8;
use crate::foundation::error::{PuffsError, PuffsResult};
use serde::{Deserialize, Serialize};

/// Parse `#RRGGBB` / `#RRGGBBAA` (the `#` is optional, case-insensitive).
pub fn parse_hex_color(s: &str) -> PuffsResult<Rgba8> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);

    fn hex_byte(s: &str, at: usize) -> PuffsResult<u8> {
        let pair = s
            .get(at..at + 2)
            .ok_or_else(|| PuffsError::validation("hex color is truncated"))?;
        u8::from_str_radix(pair, 16)
            .map_err(|_| PuffsError::validation(format!("invalid hex byte \"{pair}\"")))
    }

    match s.len() {
        6 => Ok(Rgba8::new(
            hex_byte(s, 0)?,
            hex_byte(s, 2)?,
            hex_byte(s, 4)?,
            255,
        )),
        8 => Ok(Rgba8::new(
            hex_byte(s, 0)?,
            hex_byte(s, 2)?,
            hex_byte(s, 4)?,
            hex_byte(s, 6)?,
        )),
        _ => Err(PuffsError::validation(
            "hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)",
        )),
    }
}

/// Standard HSL -> RGB conversion; `h` in degrees, `s`/`l` in `0..=1`.
pub fn hsl_to_rgba8(h: f64, s: f64, l: f64) -> Rgba8 {
    fn to_u8(x: f64) -> u8 {
        (x.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    let h = (h % 360.0 + 360.0) % 360.0 / 360.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        let v = to_u8(l);
        return Rgba8::new(v, v, v, 255);
    }

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    Rgba8::new(
        to_u8(hue_to_rgb(p, q, h + 1.0 / 3.0)),
        to_u8(hue_to_rgb(p, q, h)),
        to_u8(hue_to_rgb(p, q, h - 1.0 / 3.0)),
        255,
    )
}

impl Serialize for Rgba8 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgba8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            Arr(Vec<u8>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => parse_hex_color(&s).map_err(serde::de::Error::custom),
            Repr::Arr(v) => match v.as_slice() {
                [r, g, b] => Ok(Rgba8::new(*r, *g, *b, 255)),
                [r, g, b, a] => Ok(Rgba8::new(*r, *g, *b, *a)),
                _ => Err(serde::de::Error::custom(
                    "rgba array must have len 3 ([r,g,b]) or 4 ([r,g,b,a])",
                )),
            },
        }
    }
}
