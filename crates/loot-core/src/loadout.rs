//! Weapon loadouts and their per-shot cost.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ammo units per PED.
const AMMO_PER_PED: Decimal = dec!(10000);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadoutError {
    #[error("unknown weapon {0:?}; add it to the catalog")]
    UnknownWeapon(String),

    #[error("no loadout named {0:?}")]
    UnknownLoadout(String),
}

/// Number of enhancers of one kind, in `[0, 10]`.
///
/// Out-of-range values are clamped on construction and deserialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct EnhancerCount(u8);

impl EnhancerCount {
    pub const MAX: Self = Self(10);

    #[expect(clippy::cast_possible_truncation, reason = "count is at most 10 after the check")]
    pub const fn clamped(count: u32) -> Self {
        if count > Self::MAX.0 as u32 {
            Self::MAX
        } else {
            Self(count as u8)
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    fn as_decimal(self) -> Decimal {
        Decimal::from(self.0)
    }
}

impl From<u32> for EnhancerCount {
    fn from(count: u32) -> Self {
        Self::clamped(count)
    }
}

impl From<EnhancerCount> for u32 {
    fn from(count: EnhancerCount) -> Self {
        Self::from(count.0)
    }
}

impl fmt::Display for EnhancerCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ammo burn (in ammo units) and decay (in PED) of one tool per use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolStats {
    pub ammo: Decimal,
    pub decay: Decimal,
}

/// Known tools by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolCatalog {
    pub weapons: BTreeMap<String, ToolStats>,
    pub amplifiers: BTreeMap<String, ToolStats>,
    pub scopes: BTreeMap<String, ToolStats>,
    pub sights: BTreeMap<String, ToolStats>,
}

/// A named weapon configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Loadout {
    pub name: String,
    pub weapon: String,
    pub amplifier: Option<String>,
    pub scope: Option<String>,
    pub sight_1: Option<String>,
    pub sight_2: Option<String>,
    pub damage_enhancers: EnhancerCount,
    pub accuracy_enhancers: EnhancerCount,
    pub economy_enhancers: EnhancerCount,
}

impl Loadout {
    /// Total ammo burn and decay of one shot with this loadout.
    ///
    /// Damage enhancers add 10% each to the weapon's ammo and decay, economy
    /// enhancers remove 1% each. Attachments are added unscaled; attachments
    /// missing from the catalog are skipped.
    pub fn shot_cost(&self, catalog: &ToolCatalog) -> Result<ToolStats, LoadoutError> {
        let weapon = catalog
            .weapons
            .get(&self.weapon)
            .ok_or_else(|| LoadoutError::UnknownWeapon(self.weapon.clone()))?;

        let factor = (Decimal::ONE + dec!(0.1) * self.damage_enhancers.as_decimal())
            * (Decimal::ONE - dec!(0.01) * self.economy_enhancers.as_decimal());
        let mut total = ToolStats {
            ammo: weapon.ammo * factor,
            decay: weapon.decay * factor,
        };

        let attachments = [
            (&catalog.amplifiers, &self.amplifier),
            (&catalog.scopes, &self.scope),
            (&catalog.sights, &self.sight_1),
            (&catalog.sights, &self.sight_2),
        ];
        for (table, name) in attachments {
            let Some(name) = name else { continue };
            match table.get(name) {
                Some(stats) => {
                    total.ammo += stats.ammo;
                    total.decay += stats.decay;
                }
                None => tracing::debug!(attachment = %name, "attachment not in catalog, skipping"),
            }
        }
        Ok(total)
    }

    /// Cost of one shot in PED: `ammo / 10000 + decay`.
    pub fn cost_per_shot(&self, catalog: &ToolCatalog) -> Result<Decimal, LoadoutError> {
        let cost = self.shot_cost(catalog)?;
        Ok(cost.ammo / AMMO_PER_PED + cost.decay)
    }
}

/// Finds a loadout by name.
pub fn find_loadout<'a>(loadouts: &'a [Loadout], name: &str) -> Result<&'a Loadout, LoadoutError> {
    loadouts
        .iter()
        .find(|l| l.name == name)
        .ok_or_else(|| LoadoutError::UnknownLoadout(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ToolCatalog {
        let mut catalog = ToolCatalog::default();
        catalog.weapons.insert(
            "Sollomate Opalo".to_string(),
            ToolStats {
                ammo: dec!(1000),
                decay: dec!(0.1),
            },
        );
        catalog.amplifiers.insert(
            "A101".to_string(),
            ToolStats {
                ammo: dec!(500),
                decay: dec!(0.05),
            },
        );
        catalog.sights.insert(
            "Omegaton Sight".to_string(),
            ToolStats {
                ammo: dec!(0),
                decay: dec!(0.01),
            },
        );
        catalog
    }

    fn loadout() -> Loadout {
        Loadout {
            name: "main".to_string(),
            weapon: "Sollomate Opalo".to_string(),
            ..Loadout::default()
        }
    }

    #[test]
    fn bare_weapon_cost() {
        assert_eq!(loadout().cost_per_shot(&catalog()).unwrap(), dec!(0.2));
    }

    #[test]
    fn enhancers_scale_weapon_only() {
        let loadout = Loadout {
            amplifier: Some("A101".to_string()),
            damage_enhancers: EnhancerCount::clamped(2),
            economy_enhancers: EnhancerCount::clamped(10),
            ..loadout()
        };
        let cost = loadout.shot_cost(&catalog()).unwrap();
        // 1000 * 1.2 * 0.9 + 500
        assert_eq!(cost.ammo, dec!(1580));
        // 0.1 * 1.2 * 0.9 + 0.05
        assert_eq!(cost.decay, dec!(0.158));
        assert_eq!(loadout.cost_per_shot(&catalog()).unwrap(), dec!(0.316));
    }

    #[test]
    fn sights_add_and_unknown_attachments_are_skipped() {
        let loadout = Loadout {
            scope: Some("Missing Scope".to_string()),
            sight_1: Some("Omegaton Sight".to_string()),
            sight_2: Some("Omegaton Sight".to_string()),
            ..loadout()
        };
        assert_eq!(loadout.cost_per_shot(&catalog()).unwrap(), dec!(0.22));
    }

    #[test]
    fn unknown_weapon_is_an_error() {
        let loadout = Loadout {
            weapon: "Nope".to_string(),
            ..loadout()
        };
        assert_eq!(
            loadout.cost_per_shot(&catalog()),
            Err(LoadoutError::UnknownWeapon("Nope".to_string()))
        );
    }

    #[test]
    fn enhancer_counts_are_clamped() {
        assert_eq!(EnhancerCount::clamped(42), EnhancerCount::MAX);
        let parsed: Loadout =
            serde_json::from_str(r#"{"name":"x","weapon":"y","damage_enhancers":15}"#).unwrap();
        assert_eq!(parsed.damage_enhancers.get(), 10);
    }

    #[test]
    fn finds_loadout_by_name() {
        let loadouts = vec![loadout()];
        assert!(find_loadout(&loadouts, "main").is_ok());
        assert!(find_loadout(&loadouts, "other").is_err());
    }
}
