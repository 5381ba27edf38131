use std::convert::TryFrom;
use std::fmt;

use tracing::warn;

use crate::data::BlockStatus;
use crate::totals::RescueTotals;

const OPAQUE: u8 = 0xff;
const UNCERTAIN: u8 = 0x7f;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct SquareColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl SquareColor {
    /// Light gray, fully transparent: nothing is known about the square.
    pub const NO_DATA: SquareColor = SquareColor::rgba(0xd3, 0xd3, 0xd3, 0);
    pub const ACTIVE: SquareColor = SquareColor::rgba(0xff, 0xff, 0x00, OPAQUE);

    pub const fn rgba(red: u8, green: u8, blue: u8, alpha: u8) -> SquareColor {
        SquareColor {
            red,
            green,
            blue,
            alpha,
        }
    }

    pub const fn with_alpha(self, alpha: u8) -> SquareColor {
        SquareColor { alpha, ..self }
    }

    pub fn is_transparent(&self) -> bool {
        self.alpha == 0
    }

    pub fn to_hex(&self) -> String {
        format!(
            "#{:02x}{:02x}{:02x}{:02x}",
            self.red, self.green, self.blue, self.alpha
        )
    }
}

impl Default for SquareColor {
    fn default() -> SquareColor {
        SquareColor::NO_DATA
    }
}

fn clamp_channel(name: &str, value: u32) -> u8 {
    u8::try_from(value).unwrap_or_else(|_| {
        warn!(channel = name, value, "color channel out of range");
        u8::MAX
    })
}

/// Weighted blend of the colors of every status present in `totals`.
impl<'a> From<&'a RescueTotals> for SquareColor {
    fn from(totals: &RescueTotals) -> SquareColor {
        let mut weights = 0u32;
        let mut sums = [0u32; 3];
        for &status in BlockStatus::ALL.iter() {
            if totals.get(status).is_zero() {
                continue;
            }
            let weight = status.weight();
            for (sum, &channel) in sums.iter_mut().zip(status.rgb().iter()) {
                *sum += weight * u32::from(channel);
            }
            weights += weight;
        }

        if weights == 0 {
            if totals.unknown().is_zero() {
                return SquareColor::NO_DATA;
            }
            return SquareColor::NO_DATA.with_alpha(UNCERTAIN);
        }

        SquareColor {
            red: clamp_channel("red", sums[0] / weights),
            green: clamp_channel("green", sums[1] / weights),
            blue: clamp_channel("blue", sums[2] / weights),
            alpha: OPAQUE,
        }
    }
}

impl From<RescueTotals> for SquareColor {
    fn from(totals: RescueTotals) -> SquareColor {
        SquareColor::from(&totals)
    }
}

impl fmt::Display for SquareColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
