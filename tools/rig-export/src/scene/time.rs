//! Host time units and their frame rates

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Frame rate used when the host reports a unit outside the table
pub const DEFAULT_FRAME_RATE: f32 = 30.0;

/// Playback unit of the host timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimeUnit {
    Fps2,
    Fps3,
    Fps4,
    Fps5,
    Fps6,
    Fps8,
    Fps10,
    Fps12,
    /// 15 fps
    Games,
    Fps16,
    Fps20,
    Fps23_976,
    /// 24 fps
    Film,
    /// 25 fps
    Pal,
    Fps29_97,
    Fps29_97DropFrame,
    /// 30 fps
    #[default]
    Ntsc,
    Fps40,
    Fps47_952,
    /// 48 fps
    ShowScan,
    /// 50 fps
    PalField,
    Fps59_94,
    /// 60 fps
    NtscField,
    Fps75,
    Fps80,
    Fps90,
    Fps100,
    Fps119_88,
    Fps120,
    Fps125,
    Fps150,
    Fps200,
    Fps240,
    Fps250,
    Fps300,
    Fps375,
    Fps400,
    Fps500,
    Fps600,
    Fps750,
    Fps1200,
    Fps1500,
    Fps2000,
    Fps3000,
    Fps6000,
    Fps44100,
    Fps48000,
    /// Any unit the table does not know
    Unknown,
}

/// (unit, fps, canonical name)
const UNIT_TABLE: &[(TimeUnit, f32, &str)] = &[
    (TimeUnit::Fps2, 2.0, "2fps"),
    (TimeUnit::Fps3, 3.0, "3fps"),
    (TimeUnit::Fps4, 4.0, "4fps"),
    (TimeUnit::Fps5, 5.0, "5fps"),
    (TimeUnit::Fps6, 6.0, "6fps"),
    (TimeUnit::Fps8, 8.0, "8fps"),
    (TimeUnit::Fps10, 10.0, "10fps"),
    (TimeUnit::Fps12, 12.0, "12fps"),
    (TimeUnit::Games, 15.0, "games"),
    (TimeUnit::Fps16, 16.0, "16fps"),
    (TimeUnit::Fps20, 20.0, "20fps"),
    (TimeUnit::Fps23_976, 23.976, "23.976fps"),
    (TimeUnit::Film, 24.0, "film"),
    (TimeUnit::Pal, 25.0, "pal"),
    (TimeUnit::Fps29_97, 29.97, "29.97fps"),
    (TimeUnit::Fps29_97DropFrame, 29.97, "29.97df"),
    (TimeUnit::Ntsc, 30.0, "ntsc"),
    (TimeUnit::Fps40, 40.0, "40fps"),
    (TimeUnit::Fps47_952, 47.952, "47.952fps"),
    (TimeUnit::ShowScan, 48.0, "showscan"),
    (TimeUnit::PalField, 50.0, "palf"),
    (TimeUnit::Fps59_94, 59.94, "59.94fps"),
    (TimeUnit::NtscField, 60.0, "ntscf"),
    (TimeUnit::Fps75, 75.0, "75fps"),
    (TimeUnit::Fps80, 80.0, "80fps"),
    (TimeUnit::Fps90, 90.0, "90fps"),
    (TimeUnit::Fps100, 100.0, "100fps"),
    (TimeUnit::Fps119_88, 119.88, "119.88fps"),
    (TimeUnit::Fps120, 120.0, "120fps"),
    (TimeUnit::Fps125, 125.0, "125fps"),
    (TimeUnit::Fps150, 150.0, "150fps"),
    (TimeUnit::Fps200, 200.0, "200fps"),
    (TimeUnit::Fps240, 240.0, "240fps"),
    (TimeUnit::Fps250, 250.0, "250fps"),
    (TimeUnit::Fps300, 300.0, "300fps"),
    (TimeUnit::Fps375, 375.0, "375fps"),
    (TimeUnit::Fps400, 400.0, "400fps"),
    (TimeUnit::Fps500, 500.0, "500fps"),
    (TimeUnit::Fps600, 600.0, "600fps"),
    (TimeUnit::Fps750, 750.0, "750fps"),
    (TimeUnit::Fps1200, 1200.0, "1200fps"),
    (TimeUnit::Fps1500, 1500.0, "1500fps"),
    (TimeUnit::Fps2000, 2000.0, "2000fps"),
    (TimeUnit::Fps3000, 3000.0, "3000fps"),
    (TimeUnit::Fps6000, 6000.0, "6000fps"),
    (TimeUnit::Fps44100, 44100.0, "44100fps"),
    (TimeUnit::Fps48000, 48000.0, "48000fps"),
];

impl TimeUnit {
    /// Frames per second; [`DEFAULT_FRAME_RATE`] for [`TimeUnit::Unknown`]
    pub fn fps(self) -> f32 {
        UNIT_TABLE
            .iter()
            .find(|(unit, _, _)| *unit == self)
            .map(|&(_, fps, _)| fps)
            .unwrap_or(DEFAULT_FRAME_RATE)
    }

    /// Unit whose rate matches `fps` exactly (within 1e-3), `Unknown` otherwise
    pub fn from_fps(fps: f32) -> Self {
        UNIT_TABLE
            .iter()
            .find(|(_, rate, _)| (rate - fps).abs() < 1e-3)
            .map(|&(unit, _, _)| unit)
            .unwrap_or(TimeUnit::Unknown)
    }

    pub fn name(self) -> &'static str {
        UNIT_TABLE
            .iter()
            .find(|(unit, _, _)| *unit == self)
            .map(|&(_, _, name)| name)
            .unwrap_or("unknown")
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    /// Accepts canonical names (`film`, `ntsc`, `29.97df`, `120fps`) and bare rates (`24`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "unknown" {
            return Ok(TimeUnit::Unknown);
        }
        if let Some(&(unit, _, _)) = UNIT_TABLE.iter().find(|(_, _, name)| *name == s) {
            return Ok(unit);
        }
        let rate = s.strip_suffix("fps").unwrap_or(&s);
        match rate.parse::<f32>().map(TimeUnit::from_fps) {
            Ok(TimeUnit::Unknown) | Err(_) => Err(format!("unrecognized time unit '{s}'")),
            Ok(unit) => Ok(unit),
        }
    }
}

impl TryFrom<String> for TimeUnit {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeUnit> for String {
    fn from(unit: TimeUnit) -> Self {
        unit.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_units() {
        assert_eq!(TimeUnit::Film.fps(), 24.0);
        assert_eq!(TimeUnit::Games.fps(), 15.0);
        assert_eq!(TimeUnit::NtscField.fps(), 60.0);
        assert_eq!(TimeUnit::Fps23_976.fps(), 23.976);
    }

    #[test]
    fn test_unknown_defaults_to_30() {
        assert_eq!(TimeUnit::Unknown.fps(), 30.0);
        assert_eq!(TimeUnit::from_fps(33.0), TimeUnit::Unknown);
    }

    #[test]
    fn test_parse() {
        assert_eq!("film".parse::<TimeUnit>(), Ok(TimeUnit::Film));
        assert_eq!("24".parse::<TimeUnit>(), Ok(TimeUnit::Film));
        assert_eq!("120fps".parse::<TimeUnit>(), Ok(TimeUnit::Fps120));
        assert_eq!("29.97DF".parse::<TimeUnit>(), Ok(TimeUnit::Fps29_97DropFrame));
        assert_eq!("29.97".parse::<TimeUnit>(), Ok(TimeUnit::Fps29_97));
        assert!("33".parse::<TimeUnit>().is_err());
        assert!("fast".parse::<TimeUnit>().is_err());
    }

    #[test]
    fn test_serde_uses_names() {
        let json = serde_json::to_string(&TimeUnit::Pal).unwrap();
        assert_eq!(json, "\"pal\"");
        let unit: TimeUnit = serde_json::from_str("\"48\"").unwrap();
        assert_eq!(unit, TimeUnit::ShowScan);
    }
}
