/// Label measurement
///
/// Layout geometry only depends on this trait, so the canvas font and the
/// tests can agree on widths without a real font rasterizer.
use unicode_width::UnicodeWidthChar;

use crate::config::LayoutConfig;
use crate::error::{GalleryError, Result};

/// Rendered size of a single line of text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextSize {
    pub width: f32,
    pub height: f32,
}

pub trait TextMeasurer {
    fn measure(&self, text: &str) -> Result<TextSize>;
}

/// Fixed advance per display column, fixed line height.
///
/// Wide (CJK) characters count as two columns, combining marks as zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasurer {
    pub font_size: f32,
    pub char_width_factor: f32,
    pub line_height_factor: f32,
}

impl MonospaceMeasurer {
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            font_size: config.font_size,
            char_width_factor: config.char_width_factor,
            line_height_factor: config.line_height_factor,
        }
    }
}

impl Default for MonospaceMeasurer {
    fn default() -> Self {
        Self::from_config(&LayoutConfig::default())
    }
}

impl TextMeasurer for MonospaceMeasurer {
    fn measure(&self, text: &str) -> Result<TextSize> {
        let mut columns = 0usize;
        for c in text.chars() {
            if c.is_control() {
                return Err(GalleryError::Measurement {
                    label: text.to_string(),
                    reason: format!("control character U+{:04X}", c as u32),
                });
            }
            columns += c.width().unwrap_or(0);
        }

        Ok(TextSize {
            width: columns as f32 * self.font_size * self.char_width_factor,
            height: self.font_size * self.line_height_factor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurer() -> MonospaceMeasurer {
        MonospaceMeasurer {
            font_size: 10.0,
            char_width_factor: 0.5,
            line_height_factor: 1.5,
        }
    }

    #[test]
    fn test_width_scales_with_columns() {
        let size = measurer().measure("genus: Apis").unwrap();
        assert_eq!(size.width, 11.0 * 5.0);
        assert_eq!(size.height, 15.0);
    }

    #[test]
    fn test_wide_characters_take_two_columns() {
        assert_eq!(measurer().measure("蜂").unwrap().width, 10.0);
    }

    #[test]
    fn test_empty_text_is_zero_width() {
        assert_eq!(measurer().measure("").unwrap().width, 0.0);
    }

    #[test]
    fn test_control_characters_fail() {
        assert!(matches!(
            measurer().measure("genus:\tApis"),
            Err(GalleryError::Measurement { .. })
        ));
    }
}
