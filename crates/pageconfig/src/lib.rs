use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read page description {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse page description: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid page description: {0}")]
    Invalid(String),
}

pub const DEFAULT_GRID: usize = 34;
pub const DEFAULT_MOUSE: f32 = 0.25;
pub const DEFAULT_STRENGTH: f32 = 1.0;
pub const DEFAULT_RELAXATION: f32 = 0.9;
/// Largest accepted grid side. Every wgpu adapter supports 2D textures at
/// least this wide, so the displacement texture always fits.
pub const MAX_GRID: usize = 2048;

/// A container attribute as written in the page description.
///
/// Pages carry attributes as strings; TOML authors tend to write bare
/// numbers, so both shapes are accepted.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
}

impl AttributeValue {
    /// Reads the value the way the page reads numeric attributes: the leading
    /// numeric prefix of a string counts, anything else is `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(value) => Some(*value),
            AttributeValue::Text(raw) => parse_float_prefix(raw),
        }
    }
}

/// The `data-*` attributes of the canvas container.
///
/// Keys may be written bare (`grid`) or with the `data-` prefix (`data-grid`);
/// the prefixed spelling wins when both are present.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ContainerAttributes {
    values: BTreeMap<String, AttributeValue>,
}

impl ContainerAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: AttributeValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.values
            .get(&format!("data-{name}"))
            .or_else(|| self.values.get(name))
    }

    /// Numeric value of an attribute, or `None` when it is missing, does not
    /// parse, or is zero. Callers substitute their default in that case.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name)
            .and_then(AttributeValue::as_number)
            .filter(|value| !value.is_nan() && *value != 0.0)
    }
}

/// Settings that shape the distortion effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PreviewSettings {
    /// Side length of the displacement grid.
    pub grid: usize,
    /// Pointer influence radius. Carried for completeness; the effect does
    /// not consume it.
    pub mouse: f32,
    /// Multiplier applied to the displacement offset in the shader.
    pub strength: f32,
    /// Per-tick decay factor for the displacement field.
    pub relaxation: f32,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            grid: DEFAULT_GRID,
            mouse: DEFAULT_MOUSE,
            strength: DEFAULT_STRENGTH,
            relaxation: DEFAULT_RELAXATION,
        }
    }
}

impl PreviewSettings {
    pub fn from_attributes(attributes: &ContainerAttributes) -> Self {
        let grid = attributes
            .number("grid")
            .filter(|value| value.is_finite() && *value >= 1.0)
            .map(|value| value.trunc())
            .filter(|value| *value <= MAX_GRID as f64)
            .map(|value| value as usize)
            .unwrap_or(DEFAULT_GRID);

        Self {
            grid,
            mouse: finite_or(attributes.number("mouse"), DEFAULT_MOUSE),
            strength: finite_or(attributes.number("strength"), DEFAULT_STRENGTH),
            relaxation: finite_or(attributes.number("relaxation"), DEFAULT_RELAXATION),
        }
    }
}

fn finite_or(value: Option<f64>, default: f32) -> f32 {
    value
        .map(|value| value as f32)
        .filter(|value| value.is_finite())
        .unwrap_or(default)
}

/// Parses the longest leading float literal in `raw`, ignoring leading
/// whitespace. `"34px"` yields `34.0`; `"px34"` yields `None`.
pub fn parse_float_prefix(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    if s[end..].starts_with("Infinity") {
        return Some(if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let integer_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - integer_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let fraction_start = end + 1;
        let mut fraction_end = fraction_start;
        while fraction_end < bytes.len() && bytes[fraction_end].is_ascii_digit() {
            fraction_end += 1;
        }
        mantissa_digits += fraction_end - fraction_start;
        if mantissa_digits > 0 {
            end = fraction_end;
        }
    }

    if mantissa_digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exponent_end = end + 1;
        if exponent_end < bytes.len() && matches!(bytes[exponent_end], b'+' | b'-') {
            exponent_end += 1;
        }
        let exponent_digits = exponent_end;
        while exponent_end < bytes.len() && bytes[exponent_end].is_ascii_digit() {
            exponent_end += 1;
        }
        if exponent_end > exponent_digits {
            end = exponent_end;
        }
    }

    s[..end].parse().ok()
}

/// One anchor inside the projects scope.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AnchorSpec {
    /// Preview image URL (`data-img`). Anchors without it are not tracked.
    #[serde(default)]
    pub img: Option<String>,
    /// Navigation target.
    #[serde(default)]
    pub href: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ProjectsScope {
    #[serde(default)]
    pub links: Vec<AnchorSpec>,
}

/// A tracked project link: an anchor in the projects scope carrying an image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProjectLink {
    pub image: String,
    pub href: Option<String>,
}

/// Everything the preview needs to initialise: resolved settings plus the
/// tracked links, in page order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewTarget {
    pub settings: PreviewSettings,
    pub links: Vec<ProjectLink>,
}

impl PreviewTarget {
    /// Distinct image URLs across all links.
    pub fn image_urls(&self) -> BTreeSet<String> {
        self.links.iter().map(|link| link.image.clone()).collect()
    }
}

/// Page description standing in for the container element and the project
/// anchors of the portfolio page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PageDescription {
    #[serde(default)]
    pub container: Option<ContainerAttributes>,
    #[serde(default)]
    pub projects: Option<ProjectsScope>,
}

impl PageDescription {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: PageDescription = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let Some(projects) = &self.projects else {
            return Ok(());
        };

        for (index, anchor) in projects.links.iter().enumerate() {
            if let Some(img) = &anchor.img {
                if img.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "projects.links[{index}] has an empty img"
                    )));
                }
            }
            if let Some(href) = &anchor.href {
                if href.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "projects.links[{index}] has an empty href; omit it instead"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Anchors in the projects scope that carry an image, in page order.
    pub fn tracked_links(&self) -> Vec<ProjectLink> {
        self.projects
            .iter()
            .flat_map(|projects| projects.links.iter())
            .filter_map(|anchor| {
                anchor.img.as_ref().map(|image| ProjectLink {
                    image: image.clone(),
                    href: anchor.href.clone(),
                })
            })
            .collect()
    }

    /// Resolves the preview target, or `None` when the container or every
    /// tracked link is missing. Callers skip initialisation in that case.
    pub fn preview_target(&self) -> Option<PreviewTarget> {
        let container = self.container.as_ref()?;
        let links = self.tracked_links();
        if links.is_empty() {
            return None;
        }
        Some(PreviewTarget {
            settings: PreviewSettings::from_attributes(container),
            links,
        })
    }
}
