//! Asset descriptors supplied by the project-introspection layer.

use serde::Deserialize;

/// One asset to resolve: a filename-like name plus optional clip metadata.
///
/// Descriptors are ephemeral inputs; the engine never owns or mutates the
/// caller's asset list.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetDescriptor {
    pub name: String,
    /// Clip resolution formatted `"<width>x<height>"`, when known.
    #[serde(default)]
    pub resolution: Option<String>,
    /// Metadata keys hinting at transforms applied to the clip.
    #[serde(default)]
    pub transform_flags: Vec<String>,
}

const TRANSFORM_MARKERS: &[&str] = &["zoom", "pan", "position", "rotation"];

impl AssetDescriptor {
    pub fn new(name: impl Into<String>) -> AssetDescriptor {
        AssetDescriptor {
            name: name.into(),
            resolution: None,
            transform_flags: Vec::new(),
        }
    }

    /// Whether any metadata key suggests the clip has been reframed; such
    /// clips need a manual framing check after relink.
    pub fn has_transform(&self) -> bool {
        self.transform_flags.iter().any(|flag| {
            let lowered = flag.to_ascii_lowercase();
            TRANSFORM_MARKERS
                .iter()
                .any(|marker| lowered.contains(marker))
        })
    }

    pub fn aspect_ratio(&self) -> Option<f64> {
        let (width, height) = parse_resolution(self.resolution.as_deref()?)?;
        Some(f64::from(width) / f64::from(height))
    }
}

/// Parse a `"<width>x<height>"` string. Malformed input is `None`, never an
/// error; resolution metadata is best-effort.
pub fn parse_resolution(resolution: &str) -> Option<(u32, u32)> {
    let (width, height) = resolution.to_ascii_lowercase().split_once('x').map(
        |(width, height)| (width.trim().to_string(), height.trim().to_string()),
    )?;
    let width: u32 = width.parse().ok()?;
    let height: u32 = height.parse().ok()?;
    if height == 0 {
        return None;
    }
    Some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_resolutions() {
        assert_eq!(parse_resolution("1920x1080"), Some((1920, 1080)));
        assert_eq!(parse_resolution("3840X2160"), Some((3840, 2160)));
        assert_eq!(parse_resolution(" 1280 x 720 "), Some((1280, 720)));
    }

    #[test]
    fn rejects_malformed_resolutions() {
        for raw in ["", "1920", "x1080", "1920x", "wxh", "1920x0"] {
            assert_eq!(parse_resolution(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn aspect_ratio_from_resolution_string() {
        let mut asset = AssetDescriptor::new("clip.mov");
        assert_eq!(asset.aspect_ratio(), None);
        asset.resolution = Some("1920x1080".to_string());
        let aspect = asset.aspect_ratio().expect("parsable resolution");
        assert!((aspect - 16.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn transform_markers_are_case_insensitive_substrings() {
        let mut asset = AssetDescriptor::new("clip.mov");
        assert!(!asset.has_transform());
        asset.transform_flags = vec!["Dynamic Zoom Ease".to_string()];
        assert!(asset.has_transform());
        asset.transform_flags = vec!["Opacity".to_string()];
        assert!(!asset.has_transform());
    }
}
