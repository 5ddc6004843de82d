// Copyright 2025 the Scrapbook Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tunables shared by drawing sessions, grouping, and editing.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{Color, LineStyle};

/// Canvas configuration.
///
/// Every field has a default, so a partial JSON document is accepted.
///
/// ```rust
/// use scrapbook_model::CanvasConfig;
///
/// let config = CanvasConfig::from_json(r#"{ "ink_width": 5.0 }"#).unwrap();
/// assert_eq!(config.ink_width, 5.0);
/// assert_eq!(config.border_width, CanvasConfig::default().border_width);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Drawing samples closer than this on both axes to the last accepted
    /// point are dropped.
    pub min_point_distance: f64,
    /// Pen width for new ink.
    pub ink_width: f64,
    /// Pen color for new ink.
    pub ink_color: Color,
    /// Dash pattern for new ink.
    pub ink_style: LineStyle,
    /// Border width of new scraps at view scale 1; divided by the view scale.
    pub border_width: f64,
    /// Border color of new scraps.
    pub border_color: Color,
    /// Pen color for lasso gestures.
    pub lasso_color: Color,
    /// Pen width for lasso gestures.
    pub lasso_width: f64,
    /// Dash pattern for lasso gestures.
    pub lasso_style: LineStyle,
    /// Scale gestures whose handle is nearer than this to the pivot are ignored.
    pub min_scale_distance: f64,
    /// Extra slack, in canvas units, when picking ink under a point.
    pub hit_tolerance: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_point_distance: 2.0,
            ink_width: 3.0,
            ink_color: Color::BLACK,
            ink_style: LineStyle::Solid,
            border_width: 2.0,
            border_color: Color::SELECTION,
            lasso_color: Color::SELECTION,
            lasso_width: 1.0,
            lasso_style: LineStyle::Dashed,
            min_scale_distance: 8.0,
            hit_tolerance: 4.0,
        }
    }
}

impl CanvasConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("ink_width", self.ink_width),
            ("border_width", self.border_width),
            ("lasso_width", self.lasso_width),
        ];
        for (key, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "must be a positive finite number",
                });
            }
        }
        let non_negative = [
            ("min_point_distance", self.min_point_distance),
            ("min_scale_distance", self.min_scale_distance),
            ("hit_tolerance", self.hit_tolerance),
        ];
        for (key, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "must be a non-negative finite number",
                });
            }
        }
        Ok(())
    }
}
