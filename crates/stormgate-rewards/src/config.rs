//! The `rewards` configuration section for a dungeon kind.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Reward parameters for one dungeon kind.
///
/// Mirrors the `dungeons.<kind>.rewards` YAML section. The payout is
/// `essence_base` plus a uniform random variance in
/// `[-essence_variance, +essence_variance]`, floored at zero; a player's
/// first completion of the kind is additionally multiplied by
/// `1 + first_completion_bonus`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardsConfig {
    /// Base essence payout per completion.
    #[serde(default = "default_essence_base")]
    pub essence_base: Decimal,

    /// Half-width of the uniform payout variance.
    #[serde(default = "default_essence_variance")]
    pub essence_variance: Decimal,

    /// Extra multiplier applied on a player's first completion of the
    /// kind. `0.5` means the first run pays 150%.
    #[serde(default = "default_first_completion_bonus")]
    pub first_completion_bonus: Decimal,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            essence_base: default_essence_base(),
            essence_variance: default_essence_variance(),
            first_completion_bonus: default_first_completion_bonus(),
        }
    }
}

fn default_essence_base() -> Decimal {
    Decimal::from(100)
}

fn default_essence_variance() -> Decimal {
    Decimal::from(25)
}

fn default_first_completion_bonus() -> Decimal {
    Decimal::new(5, 1) // 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_empty_section() {
        let cfg: RewardsConfig = serde_yml::from_str("{}").unwrap_or_default();
        assert_eq!(cfg.essence_base, Decimal::from(100));
        assert_eq!(cfg.essence_variance, Decimal::from(25));
        assert_eq!(cfg.first_completion_bonus, Decimal::new(5, 1));
    }

    #[test]
    fn parse_full_section() {
        let yaml = "
essence_base: 500
essence_variance: 100
first_completion_bonus: 1.0
";
        let cfg: RewardsConfig = serde_yml::from_str(yaml).unwrap_or_default();
        assert_eq!(cfg.essence_base, Decimal::from(500));
        assert_eq!(cfg.essence_variance, Decimal::from(100));
        assert_eq!(cfg.first_completion_bonus, Decimal::from(1));
    }
}
