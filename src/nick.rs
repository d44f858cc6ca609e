//! Gamer nickname suggestions shown next to the player lookup.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NickStyle {
    Pro,
    Cool,
    Brazil,
    Fire,
    Legend,
    #[default]
    Random,
}

impl NickStyle {
    pub const ALL: [NickStyle; 6] = [
        NickStyle::Pro,
        NickStyle::Cool,
        NickStyle::Brazil,
        NickStyle::Fire,
        NickStyle::Legend,
        NickStyle::Random,
    ];

    fn stems(self) -> &'static [&'static str] {
        match self {
            NickStyle::Pro => &[
                "ProKiller", "EliteSniper", "MasterShot", "TopFragger", "AcePlayer",
                "ProGamer", "EliteWarrior", "MasterTactics", "TopRank", "AceLegend",
                "ProHunter", "EliteForce", "MasterPro", "TopGun", "AceWinner",
            ],
            NickStyle::Cool => &[
                "CoolShadow", "DarkKnight", "IceCold", "FireStorm", "ThunderBolt",
                "NightWolf", "DarkPhoenix", "IceDragon", "FireBlade", "ThunderStrike",
                "ShadowHunter", "DarkLegend", "IceKing", "FireLord", "ThunderGod",
            ],
            NickStyle::Brazil => &[
                "BRPro", "BrasilElite", "BRMaster", "BrasilTop", "BRAce",
                "BRKiller", "BrasilWarrior", "BRHunter", "BrasilForce", "BRWinner",
                "BRLegend", "BrasilPro", "BRChampion", "BrasilKing", "BRHero",
            ],
            NickStyle::Fire => &[
                "FireKiller", "FlameMaster", "BlazePro", "InfernoElite", "PhoenixRise",
                "FireStorm", "FlameWarrior", "BlazeHunter", "InfernoForce", "PhoenixKing",
                "FireLord", "FlameLegend", "BlazeAce", "InfernoPro", "PhoenixElite",
            ],
            NickStyle::Legend => &[
                "LegendKiller", "MythicPro", "EpicMaster", "DivineElite", "ImmortalAce",
                "LegendWarrior", "MythicHunter", "EpicForce", "DivinePro", "ImmortalKing",
                "LegendLord", "MythicLegend", "EpicAce", "DivineMaster", "ImmortalElite",
            ],
            NickStyle::Random => &[
                "XxKillerxX", "ProGamer2024", "EliteShot", "MasterTactics", "TopRank",
                "AcePlayer", "ShadowHunter", "DarkKnight", "FireBlade", "IceDragon",
                "ThunderBolt", "NightWolf", "PhoenixRise", "BlazePro", "InfernoElite",
            ],
        }
    }
}

/// Unknown style names fall back to `Random`.
impl FromStr for NickStyle {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "pro" => NickStyle::Pro,
            "cool" => NickStyle::Cool,
            "brazil" => NickStyle::Brazil,
            "fire" => NickStyle::Fire,
            "legend" => NickStyle::Legend,
            _ => NickStyle::Random,
        })
    }
}

/// A stem from the style's list followed by a number in `0..9999`.
pub fn generate_nick<R: Rng + ?Sized>(style: NickStyle, rng: &mut R) -> String {
    let stems = style.stems();
    let stem = stems.choose(rng).copied().unwrap_or("Player");
    format!("{}{}", stem, rng.gen_range(0..9999))
}
