use std::time::Duration;

use super::order::DrawPoolType;

/// Per-pool settings applied when the manager creates its pools.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    /// Render into an offscreen framebuffer and composite it.
    pub framed: bool,

    /// Merge every equal-state draw in a bucket, even without a grouping buffer.
    pub always_group: bool,

    /// Forced repaint period for time-driven content (e.g. flickering light).
    ///
    /// `None` repaints only on explicit `repaint()`.
    pub refresh_interval: Option<Duration>,

    pub enabled: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            framed: false,
            always_group: false,
            refresh_interval: None,
            enabled: true,
        }
    }
}

/// Settings for every pool type.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawPoolConfig {
    pub map: PoolConfig,
    pub creature_information: PoolConfig,
    pub light: PoolConfig,
    pub text: PoolConfig,
    pub foreground: PoolConfig,
}

impl DrawPoolConfig {
    pub fn get(&self, pool_type: DrawPoolType) -> &PoolConfig {
        match pool_type {
            DrawPoolType::Map => &self.map,
            DrawPoolType::CreatureInformation => &self.creature_information,
            DrawPoolType::Light => &self.light,
            DrawPoolType::Text => &self.text,
            DrawPoolType::Foreground => &self.foreground,
        }
    }
}

impl Default for DrawPoolConfig {
    fn default() -> Self {
        let grouped = PoolConfig { always_group: true, ..PoolConfig::default() };
        Self {
            map: PoolConfig { framed: true, ..PoolConfig::default() },
            creature_information: grouped.clone(),
            light: PoolConfig {
                framed: true,
                always_group: true,
                refresh_interval: Some(Duration::from_millis(100)),
                enabled: true,
            },
            text: grouped.clone(),
            foreground: PoolConfig { framed: true, ..grouped },
        }
    }
}
