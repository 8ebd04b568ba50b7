use serde::{Deserialize, Serialize};

/// Why a command was rejected. Rejected commands have zero side effects;
/// the reason is surfaced to the player verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandError {
    OutOfBounds,
    Occupied,
    EmptyTile,
    NeedsRoadAccess,
    InsufficientFunds,
    NotUpgradeable,
    RoadsDontRotate,
    UnknownTech,
    WrongBuildingForTech,
    NotAtMaxLevel,
    AlreadyResearched,
    PrerequisiteMissing,
    LevelLocked,
    UnknownLevel,
    CannotShrinkMap,
    // Defense-side rejections.
    CellNotBuildable,
    TowerAlreadyThere,
    NoTowerThere,
    TowerAtMaxLevel,
    RouteUnavailable,
    WaveAlreadyActive,
    SkillOnCooldown,
}

impl CommandError {
    pub fn message(self) -> &'static str {
        match self {
            CommandError::OutOfBounds => "That tile is outside the map",
            CommandError::Occupied => "That tile is already occupied",
            CommandError::EmptyTile => "There is no building on that tile",
            CommandError::NeedsRoadAccess => {
                "Buildings need an adjacent road (parks and wind power excepted)"
            }
            CommandError::InsufficientFunds => "Not enough credits",
            CommandError::NotUpgradeable => "The building is already at its highest level",
            CommandError::RoadsDontRotate => "Roads cannot be rotated",
            CommandError::UnknownTech => "Unknown technology",
            CommandError::WrongBuildingForTech => {
                "That technology belongs to a different building type"
            }
            CommandError::NotAtMaxLevel => {
                "The building must reach its maximum level before researching"
            }
            CommandError::AlreadyResearched => "That technology is already researched here",
            CommandError::PrerequisiteMissing => "A prerequisite technology is missing",
            CommandError::LevelLocked => "That district is still locked",
            CommandError::UnknownLevel => "No such district",
            CommandError::CannotShrinkMap => "The map can only grow",
            CommandError::CellNotBuildable => "Towers only fit on open ground",
            CommandError::TowerAlreadyThere => "A tower already stands there",
            CommandError::NoTowerThere => "There is no tower on that cell",
            CommandError::TowerAtMaxLevel => "The tower is already fully upgraded",
            CommandError::RouteUnavailable => "No route crosses this map; waves are disabled",
            CommandError::WaveAlreadyActive => "A wave is already underway",
            CommandError::SkillOnCooldown => "That skill is still recharging",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CommandResult {
    Success,
    Error(CommandError),
}

impl CommandResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandResult::Success)
    }
}

impl From<Result<(), CommandError>> for CommandResult {
    fn from(value: Result<(), CommandError>) -> Self {
        match value {
            Ok(()) => CommandResult::Success,
            Err(e) => CommandResult::Error(e),
        }
    }
}
