use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::AppError;

/// Who currently owns the radio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModuleState {
    #[default]
    Idle,
    Scanning,
    Sniffing,
    Spamming,
    DetectingAttack,
    Error,
}

impl ModuleState {
    /// The radio mode this state represents, if any
    pub fn mode(&self) -> Option<RadioMode> {
        match self {
            ModuleState::Scanning => Some(RadioMode::Scanning),
            ModuleState::Sniffing => Some(RadioMode::Sniffing),
            ModuleState::Spamming => Some(RadioMode::Spamming),
            ModuleState::DetectingAttack => Some(RadioMode::DetectingAttack),
            ModuleState::Idle | ModuleState::Error => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.mode().is_some()
    }
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModuleState::Idle => "idle",
            ModuleState::Scanning => "scanning",
            ModuleState::Sniffing => "sniffing",
            ModuleState::Spamming => "spamming",
            ModuleState::DetectingAttack => "detecting_attack",
            ModuleState::Error => "error",
        };
        f.write_str(name)
    }
}

/// A mode that takes exclusive ownership of the radio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadioMode {
    /// Periodic network listing
    Scanning,
    /// Promiscuous capture feeding signal statistics
    Sniffing,
    /// Forged beacon transmission
    Spamming,
    /// Deauth/disassoc capture feeding the attack detector
    DetectingAttack,
}

impl RadioMode {
    pub const ALL: [RadioMode; 4] = [
        RadioMode::Scanning,
        RadioMode::Sniffing,
        RadioMode::Spamming,
        RadioMode::DetectingAttack,
    ];

    /// Whether the mode receives frames from the radio
    pub fn captures(&self) -> bool {
        matches!(self, RadioMode::Sniffing | RadioMode::DetectingAttack)
    }
}

impl From<RadioMode> for ModuleState {
    fn from(mode: RadioMode) -> Self {
        match mode {
            RadioMode::Scanning => ModuleState::Scanning,
            RadioMode::Sniffing => ModuleState::Sniffing,
            RadioMode::Spamming => ModuleState::Spamming,
            RadioMode::DetectingAttack => ModuleState::DetectingAttack,
        }
    }
}

impl fmt::Display for RadioMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ModuleState::from(*self).fmt(f)
    }
}

impl FromStr for RadioMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scan" | "scanning" => Ok(RadioMode::Scanning),
            "sniff" | "sniffing" => Ok(RadioMode::Sniffing),
            "spam" | "spamming" => Ok(RadioMode::Spamming),
            "detect" | "detecting" | "detecting_attack" | "deauth" => {
                Ok(RadioMode::DetectingAttack)
            }
            _ => Err(AppError::UnknownMode(s.to_string())),
        }
    }
}
