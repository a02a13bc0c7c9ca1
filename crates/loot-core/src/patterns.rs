//! Ordered message patterns for the `System` and `Globals` channels.
//!
//! Rules are tried in registry order and the first match wins. Several
//! patterns overlap (a critical hit line also matches the plain damage
//! pattern, a hall of fame line also matches the plain global pattern), so
//! more specific rules must come before general ones.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::envelope::Channel;
use crate::error::ParseError;
use crate::event::{EventKind, Marker};

/// Item name of shrapnel loot.
pub const SHRAPNEL: &str = "Shrapnel";

/// Per-unit value used for shrapnel instead of the value printed in the log.
pub const SHRAPNEL_UNIT_VALUE: Decimal = dec!(0.0001);

/// What a rule builds from its captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// `(amount)`
    Damage { critical: bool },
    /// No captures; a combat event with `miss = true`.
    Miss,
    /// `(amount)`
    Heal,
    /// No captures.
    Marker(Marker),
    /// `(amount, skill)` or `(skill, amount)`, see [`skill_event`].
    Skill,
    /// `(enhancer)`
    EnhancerBreak,
    /// `(item, quantity, value)`
    Loot,
    /// `(actor, subject, value[, location])`
    Global { hall_of_fame: bool },
}

impl RuleKind {
    /// Builds the event payload from a successful match.
    pub fn build(self, caps: &Captures<'_>) -> Result<EventKind, ParseError> {
        match self {
            Self::Damage { critical } => Ok(EventKind::Combat {
                amount: parse_number(capture(caps, 1)?, "damage")?,
                critical,
                miss: false,
            }),
            Self::Miss => Ok(EventKind::Combat {
                amount: 0.0,
                critical: false,
                miss: true,
            }),
            Self::Heal => Ok(EventKind::Heal {
                amount: parse_number(capture(caps, 1)?, "heal")?,
            }),
            Self::Marker(marker) => Ok(EventKind::Marker { marker }),
            Self::Skill => skill_event(capture(caps, 1)?, capture(caps, 2)?),
            Self::EnhancerBreak => Ok(EventKind::EnhancerBreak {
                enhancer: capture(caps, 1)?.to_string(),
            }),
            Self::Loot => loot_event(capture(caps, 1)?, capture(caps, 2)?, capture(caps, 3)?),
            Self::Global { hall_of_fame } => Ok(EventKind::Global {
                actor: capture(caps, 1)?.trim().to_string(),
                subject: capture(caps, 2)?.to_string(),
                value: parse_number(capture(caps, 3)?, "global value")?,
                location: caps.get(4).map(|m| m.as_str().to_string()),
                hall_of_fame,
            }),
        }
    }
}

/// One (pattern, constructor) pair.
#[derive(Debug)]
pub struct Rule {
    regex: Regex,
    kind: RuleKind,
}

impl Rule {
    fn new(pattern: &str, kind: RuleKind) -> Self {
        Self {
            regex: Regex::new(pattern).unwrap(),
            kind,
        }
    }

    pub const fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Returns `None` if the message does not match this rule.
    pub fn apply(&self, message: &str) -> Option<Result<EventKind, ParseError>> {
        self.regex
            .captures(message)
            .map(|caps| self.kind.build(&caps))
    }
}

/// An ordered list of rules for one channel.
#[derive(Debug)]
pub struct PatternRegistry {
    rules: Vec<Rule>,
}

static SYSTEM_RULES: LazyLock<PatternRegistry> = LazyLock::new(|| PatternRegistry {
    rules: vec![
        Rule::new(
            r"Critical hit - Additional damage! You inflicted (\d+\.\d+) points of damage",
            RuleKind::Damage { critical: true },
        ),
        Rule::new(
            r"You inflicted (\d+\.\d+) points of damage",
            RuleKind::Damage { critical: false },
        ),
        Rule::new(r"You healed yourself (\d+\.\d+) points", RuleKind::Heal),
        Rule::new(r"Damage deflected!", RuleKind::Marker(Marker::Deflect)),
        Rule::new(r"You Evaded the attack", RuleKind::Marker(Marker::Evade)),
        Rule::new(r"You missed", RuleKind::Miss),
        Rule::new(r"The target Dodged your attack", RuleKind::Miss),
        Rule::new(r"The target Evaded your attack", RuleKind::Miss),
        Rule::new(r"The target Jammed your attack", RuleKind::Miss),
        Rule::new(
            r"You took (\d+\.\d+) points of damage",
            RuleKind::Marker(Marker::DamageTaken),
        ),
        Rule::new(
            r"You have gained (\d+\.\d+) experience in your ([a-zA-Z ]+) skill",
            RuleKind::Skill,
        ),
        Rule::new(r"You have gained (\d+\.\d+) ([a-zA-Z ]+)", RuleKind::Skill),
        Rule::new(r"Your ([a-zA-Z ]+) has improved by (\d+\.\d+)", RuleKind::Skill),
        Rule::new(
            r"Your enhancer ([a-zA-Z0-9 ]+) on your .* broke.",
            RuleKind::EnhancerBreak,
        ),
        Rule::new(
            r"You received (.*) x \((\d+)\) Value: (\d+\.\d+) PED",
            RuleKind::Loot,
        ),
    ],
});

const HOF: RuleKind = RuleKind::Global { hall_of_fame: true };
const GLOBAL: RuleKind = RuleKind::Global {
    hall_of_fame: false,
};

static GLOBAL_RULES: LazyLock<PatternRegistry> = LazyLock::new(|| PatternRegistry {
    rules: vec![
        Rule::new(
            r"([\w\s'\(\)]+) killed a creature \(([\w\s\(\),]+)\) with a value of (\d+) PED! A record has been added to the Hall of Fame!",
            HOF,
        ),
        Rule::new(
            r"([\w\s'\(\)]+) killed a creature \(([\w\s\(\),]+)\) with a value of (\d+) PED!",
            GLOBAL,
        ),
        Rule::new(
            r"([\w\s'\(\)]+) constructed an item \(([\w\s\(\),]+)\) worth (\d+) PED! A record has been added to the Hall of Fame!",
            HOF,
        ),
        Rule::new(
            r"([\w\s'\(\)]+) constructed an item \(([\w\s\(\),]+)\) worth (\d+) PED!",
            GLOBAL,
        ),
        Rule::new(
            r"([\w\s'\(\)]+) found a deposit \(([\w\s\(\)]+)\) with a value of (\d+) PED! A record has been added to the Hall of Fame!",
            HOF,
        ),
        Rule::new(
            r"([\w\s'\(\)]+) found a deposit \(([\w\s\(\)]+)\) with a value of (\d+) PED!",
            GLOBAL,
        ),
        Rule::new(
            r"([\w\s'\(\)]+) killed a creature \(([\w\s\(\),]+)\) with a value of (\d+) PED at ([\s\w\W]+)!",
            GLOBAL,
        ),
    ],
});

impl PatternRegistry {
    /// Rules for the `System` channel.
    pub fn system() -> &'static Self {
        &SYSTEM_RULES
    }

    /// Rules for the `Globals` channel.
    pub fn globals() -> &'static Self {
        &GLOBAL_RULES
    }

    /// The registry consulted for a channel, if any.
    pub fn for_channel(channel: Channel) -> Option<&'static Self> {
        match channel {
            Channel::System => Some(Self::system()),
            Channel::Globals => Some(Self::globals()),
            Channel::Other => None,
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Applies the first rule that matches `message`.
    pub fn first_match(&self, message: &str) -> Option<Result<EventKind, ParseError>> {
        self.rules.iter().find_map(|rule| rule.apply(message))
    }
}

fn capture<'a>(caps: &Captures<'a>, index: usize) -> Result<&'a str, ParseError> {
    caps.get(index)
        .map(|m| m.as_str())
        .ok_or(ParseError::MissingCapture(index))
}

fn parse_number<T: FromStr>(raw: &str, field: &'static str) -> Result<T, ParseError> {
    raw.trim().parse().map_err(|_| ParseError::Number {
        field,
        value: raw.to_string(),
    })
}

/// Builds a skill event from two captures whose order depends on the phrasing.
///
/// "You have gained 0.5 Aim" puts the amount first, "Your Agility has improved
/// by 0.5" puts it second. The first capture is tried as the amount and the
/// pair is swapped if it is not numeric.
fn skill_event(first: &str, second: &str) -> Result<EventKind, ParseError> {
    let (amount, skill) = match Decimal::from_str(first.trim()) {
        Ok(amount) => (amount, second),
        Err(_) => (parse_number(second, "skill amount")?, first),
    };
    Ok(EventKind::Skill {
        amount,
        skill: skill.to_string(),
    })
}

fn loot_event(item: &str, quantity: &str, value: &str) -> Result<EventKind, ParseError> {
    let quantity: u64 = parse_number(quantity, "loot quantity")?;
    let value = if item == SHRAPNEL {
        Decimal::from(quantity) * SHRAPNEL_UNIT_VALUE
    } else {
        parse_number(value, "loot value")?
    };
    Ok(EventKind::Loot {
        item: item.to_string(),
        quantity,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system(message: &str) -> EventKind {
        PatternRegistry::system()
            .first_match(message)
            .expect("should match")
            .expect("should build")
    }

    fn global(message: &str) -> EventKind {
        PatternRegistry::globals()
            .first_match(message)
            .expect("should match")
            .expect("should build")
    }

    #[test]
    fn critical_hit_wins_over_plain_damage() {
        let kind = system("Critical hit - Additional damage! You inflicted 519.1 points of damage");
        assert_eq!(
            kind,
            EventKind::Combat {
                amount: 519.1,
                critical: true,
                miss: false
            }
        );
    }

    #[test]
    fn plain_damage() {
        assert_eq!(
            system("You inflicted 100.0 points of damage"),
            EventKind::Combat {
                amount: 100.0,
                critical: false,
                miss: false
            }
        );
    }

    #[test]
    fn every_miss_phrasing_is_a_miss() {
        for message in [
            "You missed",
            "The target Dodged your attack",
            "The target Evaded your attack",
            "The target Jammed your attack",
        ] {
            assert_eq!(
                system(message),
                EventKind::Combat {
                    amount: 0.0,
                    critical: false,
                    miss: true
                },
                "{message}"
            );
        }
    }

    #[test]
    fn markers_and_heal() {
        assert_eq!(
            system("Damage deflected!"),
            EventKind::Marker {
                marker: Marker::Deflect
            }
        );
        assert_eq!(
            system("You Evaded the attack"),
            EventKind::Marker {
                marker: Marker::Evade
            }
        );
        assert_eq!(
            system("You took 12.5 points of damage"),
            EventKind::Marker {
                marker: Marker::DamageTaken
            }
        );
        assert_eq!(
            system("You healed yourself 31.2 points"),
            EventKind::Heal { amount: 31.2 }
        );
    }

    #[test]
    fn skill_amount_first() {
        assert_eq!(
            system("You have gained 0.4520 experience in your Rifle skill"),
            EventKind::Skill {
                amount: dec!(0.4520),
                skill: "Rifle".to_string()
            }
        );
        assert_eq!(
            system("You have gained 0.0123 Aim"),
            EventKind::Skill {
                amount: dec!(0.0123),
                skill: "Aim".to_string()
            }
        );
    }

    #[test]
    fn skill_amount_second_is_swapped() {
        assert_eq!(
            system("Your Agility has improved by 0.0051"),
            EventKind::Skill {
                amount: dec!(0.0051),
                skill: "Agility".to_string()
            }
        );
    }

    #[test]
    fn skill_swap_fails_when_neither_is_numeric() {
        assert!(matches!(
            skill_event("Agility", "lots"),
            Err(ParseError::Number { .. })
        ));
    }

    #[test]
    fn enhancer_break() {
        assert_eq!(
            system("Your enhancer Weapon Damage Enhancer 1 on your Sollomate Opalo broke. You have 4 enhancers remaining on the item. You received 0.8000 PED Shrapnel."),
            EventKind::EnhancerBreak {
                enhancer: "Weapon Damage Enhancer 1".to_string()
            }
        );
    }

    #[test]
    fn loot_uses_logged_value() {
        assert_eq!(
            system("You received Animal Oil Residue x (35) Value: 0.35 PED"),
            EventKind::Loot {
                item: "Animal Oil Residue".to_string(),
                quantity: 35,
                value: dec!(0.35)
            }
        );
    }

    #[test]
    fn shrapnel_value_is_overridden() {
        assert_eq!(
            system("You received Shrapnel x (100) Value: 5.00 PED"),
            EventKind::Loot {
                item: SHRAPNEL.to_string(),
                quantity: 100,
                value: dec!(0.0100)
            }
        );
    }

    #[test]
    fn unknown_system_message_does_not_match() {
        assert!(PatternRegistry::system()
            .first_match("You are now away from keyboard")
            .is_none());
    }

    #[test]
    fn hall_of_fame_wins_over_plain_global() {
        assert_eq!(
            global("Nanashana Nana Itsanai killed a creature (Atrox Young) with a value of 1200 PED! A record has been added to the Hall of Fame!"),
            EventKind::Global {
                actor: "Nanashana Nana Itsanai".to_string(),
                subject: "Atrox Young".to_string(),
                value: dec!(1200),
                location: None,
                hall_of_fame: true
            }
        );
    }

    #[test]
    fn plain_kill_global_with_brood_name() {
        assert_eq!(
            global("Nanashana Nana Itsanai killed a creature (Disecter, Brood of Bram) with a value of 91 PED!"),
            EventKind::Global {
                actor: "Nanashana Nana Itsanai".to_string(),
                subject: "Disecter, Brood of Bram".to_string(),
                value: dec!(91),
                location: None,
                hall_of_fame: false
            }
        );
    }

    #[test]
    fn craft_and_deposit_globals() {
        let craft = global("Na'na Smith constructed an item (Explosive Projectiles) worth 150 PED!");
        assert!(matches!(
            craft,
            EventKind::Global { ref actor, hall_of_fame: false, .. } if actor == "Na'na Smith"
        ));

        let deposit = global("Digger Dan found a deposit (Lysterium Stone) with a value of 600 PED! A record has been added to the Hall of Fame!");
        assert!(matches!(
            deposit,
            EventKind::Global { ref subject, hall_of_fame: true, .. } if subject == "Lysterium Stone"
        ));
    }

    #[test]
    fn kill_global_with_location() {
        assert_eq!(
            global("Some Hunter killed a creature (Kerberos Stalker) with a value of 52 PED at Nymphtown Outpost!"),
            EventKind::Global {
                actor: "Some Hunter".to_string(),
                subject: "Kerberos Stalker".to_string(),
                value: dec!(52),
                location: Some("Nymphtown Outpost".to_string()),
                hall_of_fame: false
            }
        );
    }

    #[test]
    fn registries_are_ordered_specific_first() {
        let kinds: Vec<RuleKind> = PatternRegistry::system()
            .rules()
            .iter()
            .map(Rule::kind)
            .collect();
        assert_eq!(kinds[0], RuleKind::Damage { critical: true });
        assert_eq!(kinds[1], RuleKind::Damage { critical: false });
        assert_eq!(PatternRegistry::globals().rules()[0].kind(), HOF);
        assert!(PatternRegistry::for_channel(Channel::Other).is_none());
    }
}
