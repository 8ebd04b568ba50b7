use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Every placeable building type, roads included.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode,
)]
pub enum BuildingType {
    House,
    House2,
    Factory,
    ChemistryFactory,
    NukeFactory,
    Shop,
    Office,
    Park,
    GarbageStation,
    SunPower,
    WaterTower,
    WindPower,
    HeroPark,
    Road,
    Hospital,
    Police,
    FireStation,
    School,
    ThemePark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingCategory {
    Residential,
    Commercial,
    Industrial,
    Infrastructure,
    Environment,
    Social,
    Governance,
}

/// One level's worth of building stats, snapshotted onto the tile at
/// placement/upgrade time and mutated in place by researched techs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    pub cost: i64,
    pub power_usage: f32,
    pub power_output: f32,
    /// Negative pollution means the building is a net reducer.
    pub pollution: f32,
    pub coin_output: f32,
    /// Housing capacity (residential buildings only).
    pub max_population: f32,
    /// Jobs provided.
    pub jobs: f32,
    pub upgrade_cost: Option<i64>,
    pub next_level: Option<u8>,
}

impl StatBlock {
    const fn new(cost: i64) -> Self {
        Self {
            cost,
            power_usage: 0.0,
            power_output: 0.0,
            pollution: 0.0,
            coin_output: 0.0,
            max_population: 0.0,
            jobs: 0.0,
            upgrade_cost: None,
            next_level: None,
        }
    }
}

macro_rules! stats {
    ($cost:expr $(, $field:ident : $value:expr)* $(,)?) => {{
        #[allow(unused_mut)]
        let mut s = StatBlock::new($cost);
        $(s.$field = $value;)*
        s
    }};
}

impl BuildingType {
    pub const ALL: &'static [BuildingType] = &[
        BuildingType::House,
        BuildingType::House2,
        BuildingType::Factory,
        BuildingType::ChemistryFactory,
        BuildingType::NukeFactory,
        BuildingType::Shop,
        BuildingType::Office,
        BuildingType::Park,
        BuildingType::GarbageStation,
        BuildingType::SunPower,
        BuildingType::WaterTower,
        BuildingType::WindPower,
        BuildingType::HeroPark,
        BuildingType::Road,
        BuildingType::Hospital,
        BuildingType::Police,
        BuildingType::FireStation,
        BuildingType::School,
        BuildingType::ThemePark,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BuildingType::House => "Residential",
            BuildingType::House2 => "House",
            BuildingType::Factory => "Factory",
            BuildingType::ChemistryFactory => "Chemistry Factory",
            BuildingType::NukeFactory => "Nuclear Power Plant",
            BuildingType::Shop => "Shop",
            BuildingType::Office => "Office",
            BuildingType::Park => "Park",
            BuildingType::GarbageStation => "Garbage Station",
            BuildingType::SunPower => "Solar Panel",
            BuildingType::WaterTower => "Water Tower",
            BuildingType::WindPower => "Wind Power",
            BuildingType::HeroPark => "Hero Monument",
            BuildingType::Road => "Road",
            BuildingType::Hospital => "Hospital",
            BuildingType::Police => "Police Station",
            BuildingType::FireStation => "Fire Station",
            BuildingType::School => "School",
            BuildingType::ThemePark => "Theme Park",
        }
    }

    pub fn category(self) -> BuildingCategory {
        match self {
            BuildingType::House | BuildingType::House2 => BuildingCategory::Residential,
            BuildingType::Shop | BuildingType::Office => BuildingCategory::Commercial,
            BuildingType::Factory
            | BuildingType::ChemistryFactory
            | BuildingType::NukeFactory => BuildingCategory::Industrial,
            BuildingType::Road => BuildingCategory::Infrastructure,
            BuildingType::GarbageStation
            | BuildingType::SunPower
            | BuildingType::WaterTower
            | BuildingType::WindPower => BuildingCategory::Environment,
            BuildingType::Park
            | BuildingType::HeroPark
            | BuildingType::School
            | BuildingType::ThemePark => BuildingCategory::Social,
            BuildingType::Hospital | BuildingType::Police | BuildingType::FireStation => {
                BuildingCategory::Governance
            }
        }
    }

    pub fn is_residential(self) -> bool {
        self.category() == BuildingCategory::Residential
    }

    /// Public-service buildings that feed the stability rate.
    pub fn is_service(self) -> bool {
        matches!(
            self,
            BuildingType::Hospital | BuildingType::Police | BuildingType::FireStation
        )
    }

    /// Types that may be placed without a road neighbor.
    pub fn exempt_from_road_rule(self) -> bool {
        matches!(
            self,
            BuildingType::Road | BuildingType::WindPower | BuildingType::Park
        )
    }

    /// Per-level stat table. Levels are 1-based; `None` for levels the type
    /// does not define.
    pub fn stats(self, level: u8) -> Option<StatBlock> {
        let block = match (self, level) {
            (BuildingType::House, 1) => stats!(300,
                max_population: 30.0, power_usage: 10.0, pollution: 2.0,
                coin_output: 5.0, upgrade_cost: Some(600), next_level: Some(2)),
            (BuildingType::House, 2) => stats!(600,
                max_population: 72.0, power_usage: 15.0, pollution: 3.0,
                coin_output: 11.0, upgrade_cost: Some(1200), next_level: Some(3)),
            (BuildingType::House, 3) => stats!(1200,
                max_population: 120.0, power_usage: 20.0, pollution: 5.0,
                coin_output: 24.0),

            (BuildingType::House2, 1) => stats!(400,
                max_population: 39.0, power_usage: 8.0, pollution: 1.0,
                coin_output: 7.0, upgrade_cost: Some(800), next_level: Some(2)),
            (BuildingType::House2, 2) => stats!(800,
                max_population: 98.0, power_usage: 12.0, pollution: 2.0,
                coin_output: 14.0, upgrade_cost: Some(1600), next_level: Some(3)),
            (BuildingType::House2, 3) => stats!(1600,
                max_population: 156.0, power_usage: 18.0, pollution: 3.0,
                coin_output: 32.0),

            (BuildingType::Factory, 1) => stats!(500,
                power_usage: 40.0, pollution: 22.0, coin_output: 70.0, jobs: 20.0),

            (BuildingType::ChemistryFactory, 1) => stats!(1000,
                power_usage: 60.0, pollution: 45.0, coin_output: 140.0, jobs: 35.0,
                upgrade_cost: Some(1500), next_level: Some(2)),
            (BuildingType::ChemistryFactory, 2) => stats!(1500,
                power_usage: 80.0, pollution: 65.0, coin_output: 240.0, jobs: 55.0,
                upgrade_cost: Some(2000), next_level: Some(3)),
            (BuildingType::ChemistryFactory, 3) => stats!(2000,
                power_usage: 100.0, pollution: 90.0, coin_output: 350.0, jobs: 80.0),

            (BuildingType::NukeFactory, 1) => stats!(5000,
                power_output: 300.0, pollution: 40.0, jobs: 50.0),

            (BuildingType::Shop, 1) => stats!(400,
                power_usage: 15.0, pollution: 6.0, coin_output: 24.0, jobs: 10.0,
                upgrade_cost: Some(800), next_level: Some(2)),
            (BuildingType::Shop, 2) => stats!(800,
                power_usage: 25.0, pollution: 8.0, coin_output: 60.0, jobs: 20.0,
                upgrade_cost: Some(1600), next_level: Some(3)),
            (BuildingType::Shop, 3) => stats!(1600,
                power_usage: 40.0, pollution: 12.0, coin_output: 140.0, jobs: 40.0),

            (BuildingType::Office, 1) => stats!(500,
                power_usage: 30.0, pollution: 7.0, coin_output: 30.0, jobs: 15.0,
                upgrade_cost: Some(1000), next_level: Some(2)),
            (BuildingType::Office, 2) => stats!(1000,
                power_usage: 45.0, pollution: 12.0, coin_output: 80.0, jobs: 30.0,
                upgrade_cost: Some(2000), next_level: Some(3)),
            (BuildingType::Office, 3) => stats!(2000,
                power_usage: 65.0, pollution: 18.0, coin_output: 180.0, jobs: 60.0),

            (BuildingType::Park, 1) => stats!(200,
                power_usage: 5.0, pollution: -10.0,
                upgrade_cost: Some(400), next_level: Some(2)),
            (BuildingType::Park, 2) => stats!(400,
                power_usage: 8.0, pollution: -20.0,
                upgrade_cost: Some(800), next_level: Some(3)),
            (BuildingType::Park, 3) => stats!(800,
                power_usage: 12.0, pollution: -40.0),

            (BuildingType::GarbageStation, 1) => stats!(500,
                power_usage: 20.0, pollution: -15.0, jobs: 10.0),

            (BuildingType::SunPower, 1) => stats!(800,
                power_output: 50.0, pollution: -10.0, jobs: 5.0),

            (BuildingType::WaterTower, 1) => stats!(700,
                power_usage: 15.0, jobs: 3.0),

            (BuildingType::WindPower, 1) => stats!(900,
                power_output: 70.0, pollution: -15.0, jobs: 5.0),

            (BuildingType::HeroPark, 1) => stats!(1200,
                power_usage: 10.0, pollution: -5.0),

            (BuildingType::Road, 1) => stats!(0),

            (BuildingType::Hospital, 1) => stats!(1000, power_usage: 40.0, jobs: 40.0),
            (BuildingType::Police, 1) => stats!(1200, power_usage: 30.0, jobs: 25.0),
            (BuildingType::FireStation, 1) => stats!(900, power_usage: 35.0, jobs: 20.0),

            (BuildingType::School, 1) => stats!(1500,
                power_usage: 25.0, jobs: 30.0,
                upgrade_cost: Some(2500), next_level: Some(2)),
            (BuildingType::School, 2) => stats!(2500,
                power_usage: 40.0, jobs: 50.0,
                upgrade_cost: Some(4000), next_level: Some(3)),
            (BuildingType::School, 3) => stats!(4000, power_usage: 60.0, jobs: 80.0),

            (BuildingType::ThemePark, 1) => stats!(12000,
                power_usage: 120.0, pollution: 10.0, coin_output: 400.0, jobs: 200.0,
                upgrade_cost: Some(18000), next_level: Some(2)),
            (BuildingType::ThemePark, 2) => stats!(18000,
                power_usage: 180.0, pollution: 12.0, coin_output: 600.0, jobs: 300.0,
                upgrade_cost: Some(25000), next_level: Some(3)),
            (BuildingType::ThemePark, 3) => stats!(25000,
                power_usage: 250.0, pollution: 15.0, coin_output: 900.0, jobs: 450.0),

            _ => return None,
        };
        Some(block)
    }

    /// Highest defined level for this type.
    pub fn max_level(self) -> u8 {
        let mut level = 1;
        while let Some(block) = self.stats(level) {
            match block.next_level {
                Some(next) => level = next,
                None => return level,
            }
        }
        level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_type_has_a_level_one() {
        for &b in BuildingType::ALL {
            assert!(b.stats(1).is_some(), "{:?} missing level 1", b);
        }
    }

    #[test]
    fn level_chains_terminate() {
        assert_eq!(BuildingType::House.max_level(), 3);
        assert_eq!(BuildingType::Factory.max_level(), 1);
        assert_eq!(BuildingType::ChemistryFactory.max_level(), 3);
        assert_eq!(BuildingType::Road.max_level(), 1);
    }

    #[test]
    fn upgrade_cost_matches_next_level_presence() {
        for &b in BuildingType::ALL {
            for level in 1..=b.max_level() {
                let block = b.stats(level).unwrap();
                assert_eq!(block.upgrade_cost.is_some(), block.next_level.is_some());
            }
        }
    }

    #[test]
    fn road_rule_exemptions() {
        assert!(BuildingType::Road.exempt_from_road_rule());
        assert!(BuildingType::Park.exempt_from_road_rule());
        assert!(BuildingType::WindPower.exempt_from_road_rule());
        assert!(!BuildingType::House.exempt_from_road_rule());
        assert!(!BuildingType::HeroPark.exempt_from_road_rule());
    }

    #[test]
    fn residential_capacity_present() {
        let house = BuildingType::House.stats(1).unwrap();
        assert!(house.max_population > 0.0);
        let factory = BuildingType::Factory.stats(1).unwrap();
        assert_eq!(factory.max_population, 0.0);
        assert!(factory.jobs > 0.0);
    }
}
