use crate::algorithms::geodesy::great_circle_distance;
use crate::algorithms::{CompressionMode, CompressionPolicy, ScreenScalePolicy};
use crate::core::{
    Location, LocationAnchor, PointOfInterest, BEARING_MEASUREMENT_UNCERTAINTY_DEG,
    LABEL_DP_PER_METER, MAX_SCALED_DISTANCE_M, MIN_SCALED_DISTANCE_M,
};
use crate::processing::MarkerMounting;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Beyond this the flat local tangent plane visibly distorts (meters)
const LOCAL_PLANE_WARNING_DISTANCE_M: f64 = 50_000.0;

/// Distance compression settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Distances up to this value are shown unchanged (meters)
    pub min_scaled_m: f64,
    /// Compressed distances stay at or below this value (meters)
    pub max_scaled_m: f64,
    pub mode: CompressionMode,
}

/// Label screen-scale settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenScaleConfig {
    /// Label texture density at 1 m depth (dp per meter)
    pub label_dp_per_meter: f64,
}

/// Anchor bearing smoothing settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationConfig {
    /// Variance assigned to every bearing measurement (degrees)
    pub measurement_uncertainty_deg: f64,
    pub marker_mounting: MarkerMounting,
    /// Keep successive measurements within half a turn of the estimate
    pub unwrap_bearing: bool,
}

/// System-wide configuration parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub compression: CompressionConfig,
    pub screen_scale: ScreenScaleConfig,
    pub orientation: OrientationConfig,
    /// Enable debug logging
    pub debug_logging: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            min_scaled_m: MIN_SCALED_DISTANCE_M,
            max_scaled_m: MAX_SCALED_DISTANCE_M,
            mode: CompressionMode::Literal,
        }
    }
}

impl CompressionConfig {
    pub fn to_policy(&self) -> CompressionPolicy {
        CompressionPolicy::new(self.min_scaled_m, self.max_scaled_m, self.mode)
    }
}

impl Default for ScreenScaleConfig {
    fn default() -> Self {
        Self {
            label_dp_per_meter: LABEL_DP_PER_METER,
        }
    }
}

impl ScreenScaleConfig {
    pub fn to_policy(&self) -> ScreenScalePolicy {
        ScreenScalePolicy::new(self.label_dp_per_meter)
    }
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            measurement_uncertainty_deg: BEARING_MEASUREMENT_UNCERTAINTY_DEG,
            marker_mounting: MarkerMounting::Vertical,
            unwrap_bearing: true,
        }
    }
}

impl OrientationConfig {
    pub fn measurement_uncertainty_rad(&self) -> f64 {
        self.measurement_uncertainty_deg.to_radians()
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            compression: CompressionConfig::default(),
            screen_scale: ScreenScaleConfig::default(),
            orientation: OrientationConfig::default(),
            debug_logging: false,
        }
    }
}

/// The Split harbour marker and the points shown around it
pub fn builtin_anchors() -> Vec<LocationAnchor> {
    vec![LocationAnchor {
        identifier: "marker.jpg".to_string(),
        physical_width_m: 1.20,
        location: Location::new(43.5035324, 16.5324973, 6.0),
        bearing_degrees: 215.0,
        points_of_interest: vec![
            PointOfInterest::new(
                "1. Camping Stobreč Split",
                Location::new(43.50410664214121, 16.526312129899896, 7.0),
            ),
            PointOfInterest::new(
                "2. Via Ferata Perunika",
                Location::new(43.5072469523574, 16.554977474388586, 420.0),
            ),
            PointOfInterest::new(
                "3. Podstrana Yacht Club",
                Location::new(43.50146104645278, 16.532175575189505, 7.0),
            ),
        ],
    }]
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid parameter value
    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
    /// Missing required parameter
    #[error("missing parameter {parameter}")]
    MissingParameter { parameter: String },
    /// Configuration file I/O error
    #[error("config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// JSON serialization/deserialization error
    #[error("{context}: {source}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    /// Two anchors share a marker identifier
    #[error("duplicate anchor identifier '{identifier}'")]
    DuplicateAnchor { identifier: String },
    /// Two points of interest of one anchor share a name
    #[error("anchor '{anchor}' lists point of interest '{name}' more than once")]
    DuplicatePoi { anchor: String, name: String },
}

/// Configuration validation result
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Whether configuration is valid
    pub is_valid: bool,
    /// Validation errors
    pub errors: Vec<ConfigError>,
    /// Validation warnings
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn new() -> Self {
        Self {
            is_valid: true,
            ..Self::default()
        }
    }

    fn error(&mut self, error: ConfigError) {
        self.is_valid = false;
        self.errors.push(error);
    }

    fn invalid(&mut self, parameter: impl Into<String>, value: impl ToString, reason: &str) {
        self.error(ConfigError::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
            reason: reason.to_string(),
        });
    }

    fn merge(&mut self, other: ValidationResult) {
        self.is_valid &= other.is_valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// First error, if any; warnings are logged
    pub fn into_first_error(self) -> Option<ConfigError> {
        for warning in &self.warnings {
            warn!("Configuration warning: {}", warning);
        }
        self.errors.into_iter().next()
    }
}

/// On-disk configuration layout
#[derive(Debug, Serialize, Deserialize)]
struct ConfigFileData {
    #[serde(default)]
    system: SystemConfig,
    #[serde(default = "builtin_anchors")]
    anchors: Vec<LocationAnchor>,
}

/// Main configuration manager
pub struct ConfigurationManager {
    /// Current system configuration
    system_config: SystemConfig,
    /// Anchor dataset in display order
    anchors: Vec<LocationAnchor>,
    /// Configuration file path
    config_file_path: Option<PathBuf>,
    /// Whether configuration has been modified
    is_modified: bool,
}

impl Default for ConfigurationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationManager {
    /// Default settings with the built-in anchor dataset
    pub fn new() -> Self {
        Self {
            system_config: SystemConfig::default(),
            anchors: builtin_anchors(),
            config_file_path: None,
            is_modified: false,
        }
    }

    /// Create configuration manager and load from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    /// Get current system configuration
    pub fn get_system_config(&self) -> &SystemConfig {
        &self.system_config
    }

    /// Replace the system configuration after validation
    pub fn update_system_config(&mut self, config: SystemConfig) -> Result<(), ConfigError> {
        if let Some(error) = self.validate_system_config(&config).into_first_error() {
            return Err(error);
        }

        self.system_config = config;
        self.is_modified = true;
        Ok(())
    }

    pub fn get_anchors(&self) -> &[LocationAnchor] {
        &self.anchors
    }

    /// Get anchor by marker identifier
    pub fn get_anchor(&self, identifier: &str) -> Option<&LocationAnchor> {
        self.anchors
            .iter()
            .find(|anchor| anchor.identifier == identifier)
    }

    /// Add an anchor, or replace the one with the same identifier
    pub fn set_anchor(&mut self, anchor: LocationAnchor) -> Result<Option<LocationAnchor>, ConfigError> {
        if let Some(error) = self.validate_anchor(&anchor).into_first_error() {
            return Err(error);
        }

        self.is_modified = true;
        match self
            .anchors
            .iter_mut()
            .find(|existing| existing.identifier == anchor.identifier)
        {
            Some(existing) => Ok(Some(std::mem::replace(existing, anchor))),
            None => {
                self.anchors.push(anchor);
                Ok(None)
            }
        }
    }

    /// Remove anchor by marker identifier
    pub fn remove_anchor(&mut self, identifier: &str) -> Option<LocationAnchor> {
        let index = self
            .anchors
            .iter()
            .position(|anchor| anchor.identifier == identifier)?;
        self.is_modified = true;
        Some(self.anchors.remove(index))
    }

    /// Hand the anchor dataset over, e.g. to a session
    pub fn anchors_cloned(&self) -> Vec<LocationAnchor> {
        self.anchors.clone()
    }

    /// Load configuration from JSON file
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config_data: ConfigFileData =
            serde_json::from_str(&content).map_err(|source| ConfigError::Serialization {
                context: format!("failed to parse config file '{}'", path.display()),
                source,
            })?;

        // Validate before applying
        let mut validation = self.validate_system_config(&config_data.system);
        validation.merge(self.validate_anchor_set(&config_data.anchors));
        if let Some(error) = validation.into_first_error() {
            return Err(error);
        }

        self.system_config = config_data.system;
        self.anchors = config_data.anchors;
        self.config_file_path = Some(path.to_path_buf());
        self.is_modified = false;
        Ok(())
    }

    /// Save configuration to JSON file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        let config_data = ConfigFileData {
            system: self.system_config,
            anchors: self.anchors.clone(),
        };

        let content = serde_json::to_string_pretty(&config_data).map_err(|source| {
            ConfigError::Serialization {
                context: "failed to serialize config".to_string(),
                source,
            }
        })?;

        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        self.config_file_path = Some(path.to_path_buf());
        self.is_modified = false;
        Ok(())
    }

    /// Save to the currently loaded file path
    pub fn save(&mut self) -> Result<(), ConfigError> {
        match self.config_file_path.clone() {
            Some(path) => self.save_to_file(path),
            None => Err(ConfigError::MissingParameter {
                parameter: "config_file_path".to_string(),
            }),
        }
    }

    /// Check if configuration has been modified since last save
    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    // Runtime parameter adjustment

    /// Switch the compression curve, returning the previous one
    pub fn set_compression_mode(&mut self, mode: CompressionMode) -> CompressionMode {
        let old_value = self.system_config.compression.mode;
        self.system_config.compression.mode = mode;
        self.is_modified = true;
        old_value
    }

    /// Update both compression thresholds, returning the previous pair
    pub fn set_scaled_range(&mut self, min_scaled_m: f64, max_scaled_m: f64) -> Result<(f64, f64), ConfigError> {
        let candidate = CompressionConfig {
            min_scaled_m,
            max_scaled_m,
            ..self.system_config.compression
        };
        let mut validation = ValidationResult::new();
        validate_compression(&candidate, &mut validation);
        if let Some(error) = validation.into_first_error() {
            return Err(error);
        }

        let old = &mut self.system_config.compression;
        let old_value = (old.min_scaled_m, old.max_scaled_m);
        old.min_scaled_m = min_scaled_m;
        old.max_scaled_m = max_scaled_m;
        self.is_modified = true;
        Ok(old_value)
    }

    /// Update the bearing measurement uncertainty (degrees)
    pub fn set_measurement_uncertainty(&mut self, uncertainty_deg: f64) -> Result<f64, ConfigError> {
        if !(uncertainty_deg.is_finite() && uncertainty_deg > 0.0) {
            return Err(ConfigError::InvalidParameter {
                parameter: "orientation.measurement_uncertainty_deg".to_string(),
                value: uncertainty_deg.to_string(),
                reason: "Measurement uncertainty must be positive".to_string(),
            });
        }

        let old_value = self.system_config.orientation.measurement_uncertainty_deg;
        self.system_config.orientation.measurement_uncertainty_deg = uncertainty_deg;
        self.is_modified = true;
        Ok(old_value)
    }

    pub fn set_marker_mounting(&mut self, mounting: MarkerMounting) -> MarkerMounting {
        let old_value = self.system_config.orientation.marker_mounting;
        self.system_config.orientation.marker_mounting = mounting;
        self.is_modified = true;
        old_value
    }

    /// Update the label texture density (dp per meter)
    pub fn set_label_density(&mut self, dp_per_meter: f64) -> Result<f64, ConfigError> {
        if !(dp_per_meter.is_finite() && dp_per_meter > 0.0) {
            return Err(ConfigError::InvalidParameter {
                parameter: "screen_scale.label_dp_per_meter".to_string(),
                value: dp_per_meter.to_string(),
                reason: "Label density must be positive".to_string(),
            });
        }

        let old_value = self.system_config.screen_scale.label_dp_per_meter;
        self.system_config.screen_scale.label_dp_per_meter = dp_per_meter;
        self.is_modified = true;
        Ok(old_value)
    }

    pub fn set_debug_logging(&mut self, enabled: bool) -> bool {
        let old_value = self.system_config.debug_logging;
        self.system_config.debug_logging = enabled;
        self.is_modified = true;
        old_value
    }

    /// Validate system configuration
    pub fn validate_system_config(&self, config: &SystemConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        validate_compression(&config.compression, &mut result);

        let density = config.screen_scale.label_dp_per_meter;
        if !(density.is_finite() && density > 0.0) {
            result.invalid(
                "screen_scale.label_dp_per_meter",
                density,
                "Label density must be positive",
            );
        }

        let uncertainty = config.orientation.measurement_uncertainty_deg;
        if !(uncertainty.is_finite() && uncertainty > 0.0) {
            result.invalid(
                "orientation.measurement_uncertainty_deg",
                uncertainty,
                "Measurement uncertainty must be positive",
            );
        } else if uncertainty > 45.0 {
            result
                .warnings
                .push("Very large measurement uncertainty makes every frame count the same".to_string());
        }

        if !config.orientation.unwrap_bearing {
            result
                .warnings
                .push("Bearing unwrapping is disabled; estimates will jump near the +/-180 degree seam".to_string());
        }

        result
    }

    /// Validate a single anchor and its points of interest
    pub fn validate_anchor(&self, anchor: &LocationAnchor) -> ValidationResult {
        let mut result = ValidationResult::new();

        if anchor.identifier.trim().is_empty() {
            result.error(ConfigError::MissingParameter {
                parameter: "anchor.identifier".to_string(),
            });
        }

        let width = anchor.physical_width_m;
        if !(width.is_finite() && width > 0.0) {
            result.invalid(
                format!("{}.physical_width_m", anchor.identifier),
                width,
                "Marker width must be positive",
            );
        }

        if !anchor.bearing_degrees.is_finite() {
            result.invalid(
                format!("{}.bearing_degrees", anchor.identifier),
                anchor.bearing_degrees,
                "Bearing must be finite",
            );
        } else if !(0.0..360.0).contains(&anchor.bearing_degrees) {
            result.warnings.push(format!(
                "Anchor '{}' bearing {} is outside [0, 360) degrees",
                anchor.identifier, anchor.bearing_degrees
            ));
        }

        validate_location(&anchor.identifier, &anchor.location, &mut result);

        if anchor.points_of_interest.is_empty() {
            result
                .warnings
                .push(format!("Anchor '{}' has no points of interest", anchor.identifier));
        }

        let mut names = HashSet::new();
        for poi in &anchor.points_of_interest {
            if poi.name.trim().is_empty() {
                result.error(ConfigError::MissingParameter {
                    parameter: format!("{}.points_of_interest.name", anchor.identifier),
                });
            }
            if !names.insert(poi.name.as_str()) {
                result.error(ConfigError::DuplicatePoi {
                    anchor: anchor.identifier.clone(),
                    name: poi.name.clone(),
                });
            }

            let parameter = format!("{}.{}", anchor.identifier, poi.name);
            let before = result.errors.len();
            validate_location(&parameter, &poi.location, &mut result);

            if result.errors.len() == before {
                let distance =
                    great_circle_distance(&anchor.location.coordinate, &poi.location.coordinate);
                if distance > LOCAL_PLANE_WARNING_DISTANCE_M {
                    result.warnings.push(format!(
                        "'{}' is {:.1} km from anchor '{}'; the local plane approximation degrades",
                        poi.name,
                        distance / 1000.0,
                        anchor.identifier
                    ));
                }
            }
        }

        result
    }

    /// Validate a whole anchor dataset
    pub fn validate_anchor_set(&self, anchors: &[LocationAnchor]) -> ValidationResult {
        let mut result = ValidationResult::new();
        let mut identifiers = HashSet::new();

        for anchor in anchors {
            if !identifiers.insert(anchor.identifier.as_str()) {
                result.error(ConfigError::DuplicateAnchor {
                    identifier: anchor.identifier.clone(),
                });
            }
            result.merge(self.validate_anchor(anchor));
        }

        if anchors.is_empty() {
            result
                .warnings
                .push("No anchors configured; no marker will ever bind".to_string());
        }

        result
    }
}

fn validate_compression(config: &CompressionConfig, result: &mut ValidationResult) {
    let min = config.min_scaled_m;
    let max = config.max_scaled_m;

    if !(min.is_finite() && min >= 0.0) {
        result.invalid(
            "compression.min_scaled_m",
            min,
            "Near threshold must be a non-negative distance",
        );
    }
    if !max.is_finite() {
        result.invalid("compression.max_scaled_m", max, "Far threshold must be finite");
    } else if max <= min {
        result.invalid(
            "compression.max_scaled_m",
            max,
            "Far threshold must be greater than the near threshold",
        );
    }
}

fn validate_location(prefix: &str, location: &Location, result: &mut ValidationResult) {
    let latitude = location.coordinate.latitude;
    let longitude = location.coordinate.longitude;

    if !(latitude.is_finite() && latitude.abs() <= 90.0) {
        result.invalid(
            format!("{}.latitude", prefix),
            latitude,
            "Latitude must be between -90 and 90 degrees",
        );
    }
    if !(longitude.is_finite() && longitude.abs() <= 180.0) {
        result.invalid(
            format!("{}.longitude", prefix),
            longitude,
            "Longitude must be between -180 and 180 degrees",
        );
    }
    if !location.altitude.is_finite() {
        result.invalid(
            format!("{}.altitude", prefix),
            location.altitude,
            "Altitude must be finite",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_system_config() {
        let config = SystemConfig::default();
        assert_eq!(config.compression.min_scaled_m, 250.0);
        assert_eq!(config.compression.max_scaled_m, 500.0);
        assert_eq!(config.compression.mode, CompressionMode::Literal);
        assert_eq!(config.screen_scale.label_dp_per_meter, 250.0);
        assert_eq!(config.orientation.measurement_uncertainty_deg, 1.0);
        assert_eq!(config.orientation.marker_mounting, MarkerMounting::Vertical);
        assert!(!config.debug_logging);
    }

    #[test]
    fn test_configuration_manager_creation() {
        let manager = ConfigurationManager::new();
        assert_eq!(manager.get_anchors().len(), 1);
        assert!(!manager.is_modified());

        let anchor = manager.get_anchor("marker.jpg").unwrap();
        assert_eq!(anchor.bearing_degrees, 215.0);
        assert_eq!(anchor.points_of_interest.len(), 3);
        assert!(anchor.point_of_interest("2. Via Ferata Perunika").is_some());
    }

    #[test]
    fn test_builtin_dataset_is_valid() {
        let manager = ConfigurationManager::new();

        let result = manager.validate_anchor_set(manager.get_anchors());
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());

        assert!(manager.validate_system_config(&SystemConfig::default()).is_valid);
    }

    #[test]
    fn test_invalid_anchor() {
        let manager = ConfigurationManager::new();
        let invalid = LocationAnchor {
            identifier: "broken.jpg".to_string(),
            physical_width_m: 0.0,
            location: Location::new(95.0, -200.0, f64::NAN),
            bearing_degrees: 10.0,
            points_of_interest: vec![
                PointOfInterest::new("Tower", Location::new(43.5, 16.5, 0.0)),
                PointOfInterest::new("Tower", Location::new(43.6, 16.5, 0.0)),
            ],
        };

        let result = manager.validate_anchor(&invalid);
        assert!(!result.is_valid);
        // width, latitude, longitude, altitude, duplicate name
        assert_eq!(result.errors.len(), 5);
        assert!(result
            .errors
            .iter()
            .any(|e| matches!(e, ConfigError::DuplicatePoi { name, .. } if name == "Tower")));
    }

    #[test]
    fn test_far_poi_warns() {
        let manager = ConfigurationManager::new();
        let mut anchor = builtin_anchors().remove(0);
        anchor.points_of_interest.push(PointOfInterest::new(
            "Zagreb",
            Location::new(45.8150, 15.9819, 158.0),
        ));

        let result = manager.validate_anchor(&anchor);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("Zagreb"));
    }

    #[test]
    fn test_duplicate_anchor_identifier() {
        let manager = ConfigurationManager::new();
        let mut anchors = builtin_anchors();
        anchors.extend(builtin_anchors());

        let result = manager.validate_anchor_set(&anchors);
        assert!(!result.is_valid);
        assert!(matches!(
            result.errors[0],
            ConfigError::DuplicateAnchor { ref identifier } if identifier == "marker.jpg"
        ));
    }

    #[test]
    fn test_config_serialization() {
        let mut manager = ConfigurationManager::new();
        manager.set_compression_mode(CompressionMode::Asymptotic);
        manager
            .set_anchor(LocationAnchor {
                identifier: "riva.jpg".to_string(),
                physical_width_m: 0.8,
                location: Location::new(43.5081, 16.4402, 2.0),
                bearing_degrees: 90.0,
                points_of_interest: vec![PointOfInterest::new(
                    "Marjan",
                    Location::new(43.5085, 16.4200, 178.0),
                )],
            })
            .unwrap();
        assert!(manager.is_modified());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ardiscover.json");

        manager.save_to_file(&path).unwrap();
        assert!(!manager.is_modified());

        let loaded = ConfigurationManager::from_file(&path).unwrap();
        assert_eq!(loaded.get_anchors(), manager.get_anchors());
        assert_eq!(loaded.get_system_config(), manager.get_system_config());
        assert_eq!(
            loaded.get_system_config().compression.mode,
            CompressionMode::Asymptotic
        );
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"system": {{"compression": {{"mode": "asymptotic"}}}}}}"#).unwrap();

        let manager = ConfigurationManager::from_file(file.path()).unwrap();
        let config = manager.get_system_config();
        assert_eq!(config.compression.mode, CompressionMode::Asymptotic);
        assert_eq!(config.compression.max_scaled_m, 500.0);
        assert_eq!(manager.get_anchors(), builtin_anchors().as_slice());
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"system": {{"compression": {{"min_scaled_m": 600.0, "max_scaled_m": 500.0}}}}}}"#
        )
        .unwrap();

        let result = ConfigurationManager::from_file(file.path());
        assert!(matches!(result, Err(ConfigError::InvalidParameter { .. })));

        let mut garbage = tempfile::NamedTempFile::new().unwrap();
        write!(garbage, "not json").unwrap();
        assert!(matches!(
            ConfigurationManager::from_file(garbage.path()),
            Err(ConfigError::Serialization { .. })
        ));

        assert!(matches!(
            ConfigurationManager::from_file("/nonexistent/ardiscover.json"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_runtime_scaled_range_adjustment() {
        let mut manager = ConfigurationManager::new();

        let old = manager.set_scaled_range(100.0, 300.0).unwrap();
        assert_eq!(old, (250.0, 500.0));
        assert!(manager.is_modified());

        // Far threshold must stay above near threshold
        assert!(manager.set_scaled_range(300.0, 300.0).is_err());
        assert_eq!(manager.get_system_config().compression.min_scaled_m, 100.0);
        assert_eq!(manager.get_system_config().compression.max_scaled_m, 300.0);
    }

    #[test]
    fn test_runtime_orientation_adjustment() {
        let mut manager = ConfigurationManager::new();

        assert_eq!(manager.set_measurement_uncertainty(2.5).unwrap(), 1.0);
        assert!(manager.set_measurement_uncertainty(0.0).is_err());
        assert!(manager.set_measurement_uncertainty(f64::NAN).is_err());
        assert_eq!(
            manager.get_system_config().orientation.measurement_uncertainty_deg,
            2.5
        );

        let old = manager.set_marker_mounting(MarkerMounting::Horizontal);
        assert_eq!(old, MarkerMounting::Vertical);

        assert_eq!(manager.set_label_density(300.0).unwrap(), 250.0);
        assert!(manager.set_label_density(-1.0).is_err());
    }

    #[test]
    fn test_replace_and_remove_anchor() {
        let mut manager = ConfigurationManager::new();

        let mut moved = builtin_anchors().remove(0);
        moved.bearing_degrees = 200.0;
        let previous = manager.set_anchor(moved).unwrap();
        assert_eq!(previous.map(|a| a.bearing_degrees), Some(215.0));
        assert_eq!(manager.get_anchors().len(), 1);

        assert!(manager.remove_anchor("marker.jpg").is_some());
        assert!(manager.remove_anchor("marker.jpg").is_none());
        assert!(manager.get_anchors().is_empty());
    }

    #[test]
    fn test_save_without_path_fails() {
        let mut manager = ConfigurationManager::new();
        assert!(matches!(
            manager.save(),
            Err(ConfigError::MissingParameter { .. })
        ));
    }
}
