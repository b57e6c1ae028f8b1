//! Construction-time engine configuration.

use crate::{
    ConfigError, DEFAULT_HEIGHT, DEFAULT_TILE_KINDS, DEFAULT_WIDTH, MAX_GRID_DIM, MAX_TILE_KINDS,
};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub width: u8,
    pub height: u8,
    /// Size K of the tile alphabet; kinds are `0..K`.
    pub tile_kinds: u8,
    /// Seed for the default tile source. `None` seeds from the clock.
    pub seed: Option<u32>,
    /// Upper bound on matching detection passes per cascade.
    /// `None` uses the grid area.
    pub max_cascade_passes: Option<u32>,
    /// Run one cascade right after generation to clear any match the
    /// permissive generation fallback let through (only possible for K <= 2).
    pub settle_initial_matches: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            tile_kinds: DEFAULT_TILE_KINDS,
            seed: None,
            max_cascade_passes: None,
            settle_initial_matches: true,
        }
    }
}

impl EngineConfig {
    /// Square or rectangular grid with an explicit seed; everything else default.
    pub fn seeded(width: u8, height: u8, tile_kinds: u8, seed: u32) -> Self {
        Self {
            width,
            height,
            tile_kinds,
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Create from environment variables
    ///
    /// - `MATCH3_WIDTH`, `MATCH3_HEIGHT`, `MATCH3_TILE_KINDS`
    /// - `MATCH3_SEED`
    /// - `MATCH3_MAX_CASCADE_PASSES`
    /// - `MATCH3_SETTLE_INITIAL` ("0"/"false" disables)
    ///
    /// Unparseable values fall back to the defaults; range checks happen in
    /// [`validate`](Self::validate).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string());
        let parsed = |key: &str| value(key).and_then(|v| v.parse().ok());

        let defaults = Self::default();
        let settle_initial_matches = value("MATCH3_SETTLE_INITIAL")
            .map(|v| !(v == "0" || v.eq_ignore_ascii_case("false")))
            .unwrap_or(defaults.settle_initial_matches);

        Self {
            width: parsed("MATCH3_WIDTH").unwrap_or(defaults.width),
            height: parsed("MATCH3_HEIGHT").unwrap_or(defaults.height),
            tile_kinds: parsed("MATCH3_TILE_KINDS").unwrap_or(defaults.tile_kinds),
            seed: value("MATCH3_SEED").and_then(|v| v.parse().ok()),
            max_cascade_passes: value("MATCH3_MAX_CASCADE_PASSES").and_then(|v| v.parse().ok()),
            settle_initial_matches,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0
            || self.height == 0
            || self.width > MAX_GRID_DIM
            || self.height > MAX_GRID_DIM
        {
            return Err(ConfigError::Dimensions {
                width: self.width,
                height: self.height,
                max: MAX_GRID_DIM,
            });
        }
        if self.tile_kinds == 0 || self.tile_kinds as usize > MAX_TILE_KINDS {
            return Err(ConfigError::TileKinds(self.tile_kinds));
        }
        if self.max_cascade_passes == Some(0) {
            return Err(ConfigError::ZeroCascadeBound);
        }
        Ok(())
    }

    /// Effective cascade bound: the configured value, or the grid area.
    pub fn cascade_limit(&self) -> u32 {
        self.max_cascade_passes
            .unwrap_or(self.width as u32 * self.height as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.cascade_limit(), 64);
        assert!(config.settle_initial_matches);
    }

    #[test]
    fn test_validate_rejects_bad_dimensions() {
        let mut config = EngineConfig::default();
        config.width = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Dimensions { .. })
        ));

        config.width = MAX_GRID_DIM + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Dimensions { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_kinds_and_bound() {
        let mut config = EngineConfig::default();
        config.tile_kinds = 0;
        assert_eq!(config.validate(), Err(ConfigError::TileKinds(0)));

        config.tile_kinds = (MAX_TILE_KINDS + 1) as u8;
        assert!(config.validate().is_err());

        let config = EngineConfig {
            max_cascade_passes: Some(0),
            ..EngineConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroCascadeBound));
    }

    #[test]
    fn test_explicit_cascade_limit_wins() {
        let config = EngineConfig {
            max_cascade_passes: Some(7),
            ..EngineConfig::seeded(10, 12, 6, 99)
        };
        assert_eq!(config.cascade_limit(), 7);
        assert_eq!(config.seed, Some(99));
    }

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key: &str| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_config_from_lookup_reads_values() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("MATCH3_WIDTH", "10"),
            ("MATCH3_HEIGHT", " 6 "),
            ("MATCH3_TILE_KINDS", "4"),
            ("MATCH3_SEED", "777"),
            ("MATCH3_MAX_CASCADE_PASSES", "12"),
            ("MATCH3_SETTLE_INITIAL", " false "),
        ]));
        assert_eq!(config.width, 10);
        assert_eq!(config.height, 6);
        assert_eq!(config.tile_kinds, 4);
        assert_eq!(config.seed, Some(777));
        assert_eq!(config.max_cascade_passes, Some(12));
        assert!(!config.settle_initial_matches);
    }

    #[test]
    fn test_config_from_lookup_falls_back_on_garbage() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("MATCH3_WIDTH", "wide"),
            ("MATCH3_HEIGHT", "-3"),
            ("MATCH3_TILE_KINDS", "300"),
            ("MATCH3_SEED", "abc"),
            ("MATCH3_MAX_CASCADE_PASSES", ""),
            ("MATCH3_SETTLE_INITIAL", "yes"),
        ]));
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_settle_initial_switch() {
        for (raw, expected) in [("0", false), ("FALSE", false), ("1", true), ("true", true)] {
            let config = EngineConfig::from_lookup(lookup(&[("MATCH3_SETTLE_INITIAL", raw)]));
            assert_eq!(config.settle_initial_matches, expected, "{raw:?}");
        }
        assert_eq!(EngineConfig::from_lookup(|_| None), EngineConfig::default());
    }
}
