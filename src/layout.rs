//! Compositor layouts: where each input stream lands on the mixer canvas.
//!
//! Layouts are plain data so they can be kept in JSON files next to the
//! pipelines that use them. The built-in presets reproduce the arrangements
//! used for the yanked RTMP shows: a single relayed stream, picture in
//! picture, a side-by-side split, a 2x2 grid and a main stream flanked by
//! three judges.

use crate::error::{Error, Result};
use gstreamer as gst;
use gstreamer_video as gst_video;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// First element a decoded stream goes through before the mixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// `videoconvert`, the stream keeps its size.
    Convert,
    /// `videoscale` followed by `videoconvert`, resized to the tile caps.
    Scale,
}

/// Pixels removed from each edge with `videobox`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crop {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl Crop {
    pub fn horizontal(pixels: i32) -> Self {
        Self {
            left: pixels,
            right: pixels,
            top: 0,
            bottom: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub label: String,
    pub stage: Stage,
    #[serde(default)]
    pub xpos: i32,
    #[serde(default)]
    pub ypos: i32,
    #[serde(default)]
    pub zorder: Option<u32>,
    #[serde(default)]
    pub alpha: Option<f64>,
    #[serde(default)]
    pub width: Option<i32>,
    #[serde(default)]
    pub height: Option<i32>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub crop: Option<Crop>,
}

impl Tile {
    fn new(label: &str, stage: Stage, xpos: i32, ypos: i32) -> Self {
        Self {
            label: label.to_string(),
            stage,
            xpos,
            ypos,
            zorder: None,
            alpha: None,
            width: None,
            height: None,
            format: None,
            crop: None,
        }
    }

    fn sized(mut self, width: i32, height: i32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    fn ayuv(mut self) -> Self {
        self.format = Some("AYUV".to_string());
        self
    }

    /// Caps the stream is forced into before reaching the mixer, if any.
    pub fn caps(&self) -> Option<gst::Caps> {
        if self.width.is_none() && self.height.is_none() && self.format.is_none() {
            return None;
        }

        Some(
            gst::Caps::builder("video/x-raw")
                .field_if_some("format", self.format.as_deref())
                .field_if_some("width", self.width)
                .field_if_some("height", self.height)
                .build(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixerLayout {
    pub name: String,
    pub tiles: Vec<Tile>,
}

impl MixerLayout {
    pub const PRESETS: [&'static str; 5] = ["single", "pip", "split", "quad", "judge"];

    pub fn preset(name: &str) -> Option<Self> {
        let tiles = match name {
            "single" => vec![Tile::new("main", Stage::Convert, 0, 0).ayuv()],
            "pip" => {
                let mut inset = Tile::new("inset", Stage::Scale, 438, 210).sized(200, 150);
                inset.zorder = Some(100);
                vec![Tile::new("main", Stage::Convert, 0, 0), inset]
            }
            "split" => {
                let mut left = Tile::new("left", Stage::Convert, 0, 0).ayuv();
                left.crop = Some(Crop::horizontal(160));
                let mut right = Tile::new("right", Stage::Convert, 320, 0).ayuv();
                right.crop = Some(Crop::horizontal(160));
                right.alpha = Some(1.0);
                vec![left, right]
            }
            "quad" => [
                ("top-left", 0, 0),
                ("top-right", 320, 0),
                ("bottom-left", 0, 180),
                ("bottom-right", 320, 180),
            ]
            .iter()
            .map(|(label, x, y)| Tile::new(label, Stage::Scale, *x, *y).sized(320, 180).ayuv())
            .collect(),
            "judge" => {
                let mut main = Tile::new("main", Stage::Convert, 0, 0).ayuv();
                main.crop = Some(Crop::horizontal(160));
                let mut tiles = vec![main];
                for (i, ypos) in [0, 120, 240].iter().enumerate() {
                    tiles.push(
                        Tile::new(&format!("judge{}", i + 1), Stage::Scale, 320, *ypos)
                            .sized(213, 120)
                            .ayuv(),
                    );
                }
                tiles
            }
            _ => return None,
        };

        Some(Self {
            name: name.to_string(),
            tiles,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let layout: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidLayout(e.to_string()))?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::InvalidLayout(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.tiles.is_empty() {
            return Err(Error::InvalidLayout(format!(
                "layout '{}' has no tiles",
                self.name
            )));
        }

        let mut labels = HashSet::new();
        for tile in &self.tiles {
            if !labels.insert(tile.label.as_str()) {
                return Err(Error::InvalidLayout(format!(
                    "duplicate tile label '{}'",
                    tile.label
                )));
            }
            if tile.xpos < 0 || tile.ypos < 0 {
                return Err(Error::InvalidLayout(format!(
                    "tile '{}' is placed off canvas",
                    tile.label
                )));
            }
            if let Some(alpha) = tile.alpha {
                if !(0.0..=1.0).contains(&alpha) {
                    return Err(Error::InvalidLayout(format!(
                        "tile '{}' alpha {} is outside 0..1",
                        tile.label, alpha
                    )));
                }
            }
            if matches!(tile.width, Some(w) if w <= 0) || matches!(tile.height, Some(h) if h <= 0)
            {
                return Err(Error::InvalidLayout(format!(
                    "tile '{}' has an empty size",
                    tile.label
                )));
            }
            if let Some(format) = &tile.format {
                if gst_video::VideoFormat::from_string(format) == gst_video::VideoFormat::Unknown {
                    return Err(Error::InvalidLayout(format!(
                        "tile '{}' uses unknown video format '{}'",
                        tile.label, format
                    )));
                }
            }
            if let Some(crop) = tile.crop {
                if crop.left < 0 || crop.right < 0 || crop.top < 0 || crop.bottom < 0 {
                    return Err(Error::InvalidLayout(format!(
                        "tile '{}' has a negative crop",
                        tile.label
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::init_for_tests;

    #[test]
    fn every_preset_is_valid() {
        init_for_tests();
        for name in MixerLayout::PRESETS {
            let layout = MixerLayout::preset(name).unwrap();
            assert_eq!(layout.name, name);
            layout.validate().unwrap();
        }
        assert!(MixerLayout::preset("hexagon").is_none());
    }

    #[test]
    fn quad_tiles_cover_a_640x360_canvas() {
        let layout = MixerLayout::preset("quad").unwrap();
        let mut area = 0;
        for tile in &layout.tiles {
            assert_eq!((tile.width, tile.height), (Some(320), Some(180)));
            assert!(tile.xpos + 320 <= 640 && tile.ypos + 180 <= 360);
            area += 320 * 180;
        }
        assert_eq!(area, 640 * 360);
    }

    #[test]
    fn pip_inset_sits_on_top() {
        let layout = MixerLayout::preset("pip").unwrap();
        let inset = &layout.tiles[1];
        assert_eq!(inset.stage, Stage::Scale);
        assert_eq!((inset.xpos, inset.ypos), (438, 210));
        assert_eq!(inset.zorder, Some(100));
        assert!(layout.tiles[0].caps().is_none());
    }

    #[test]
    fn judge_column_is_stacked() {
        let layout = MixerLayout::preset("judge").unwrap();
        let ys: Vec<_> = layout.tiles[1..].iter().map(|t| t.ypos).collect();
        assert_eq!(ys, vec![0, 120, 240]);
        assert_eq!(layout.tiles[0].crop, Some(Crop::horizontal(160)));
    }

    #[test]
    fn tile_caps_carry_format_and_size() {
        init_for_tests();
        let layout = MixerLayout::preset("judge").unwrap();
        let caps = layout.tiles[1].caps().unwrap();
        let s = caps.structure(0).unwrap();
        assert_eq!(s.name(), "video/x-raw");
        assert_eq!(s.get::<&str>("format").unwrap(), "AYUV");
        assert_eq!(s.get::<i32>("width").unwrap(), 213);
        assert_eq!(s.get::<i32>("height").unwrap(), 120);

        let pip = MixerLayout::preset("pip").unwrap();
        let caps = pip.tiles[1].caps().unwrap();
        let s = caps.structure(0).unwrap();
        assert!(!s.has_field("format"));
        assert_eq!(s.get::<i32>("width").unwrap(), 200);
    }

    #[test]
    fn json_layouts_are_validated() {
        init_for_tests();
        let json = r#"{
            "name": "corner",
            "tiles": [
                { "label": "main", "stage": "convert" },
                { "label": "logo", "stage": "scale", "xpos": 600, "ypos": 20,
                  "width": 64, "height": 64, "zorder": 10, "alpha": 0.5 }
            ]
        }"#;
        let layout = MixerLayout::from_json(json).unwrap();
        assert_eq!(layout.tiles.len(), 2);
        assert_eq!(layout.tiles[1].alpha, Some(0.5));

        let dup = r#"{ "name": "dup", "tiles": [
            { "label": "a", "stage": "convert" }, { "label": "a", "stage": "convert" } ] }"#;
        assert!(matches!(MixerLayout::from_json(dup), Err(Error::InvalidLayout(_))));

        let empty = r#"{ "name": "empty", "tiles": [] }"#;
        assert!(matches!(MixerLayout::from_json(empty), Err(Error::InvalidLayout(_))));

        let bogus = r#"{ "name": "bogus", "tiles": [
            { "label": "a", "stage": "convert", "format": "NOPE" } ] }"#;
        assert!(matches!(MixerLayout::from_json(bogus), Err(Error::InvalidLayout(_))));
    }

    #[test]
    fn preset_survives_json() {
        init_for_tests();
        let split = MixerLayout::preset("split").unwrap();
        let again = MixerLayout::from_json(&split.to_json().unwrap()).unwrap();
        assert_eq!(split, again);
    }
}
