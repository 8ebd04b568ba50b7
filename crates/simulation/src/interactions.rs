//! Proximity interactions between buildings.
//!
//! The rule table is keyed by the building being modified; each rule lists
//! the neighbor types that trigger it and the signed fraction applied to
//! that building's own base stat. Neighborhoods are Chebyshev (square,
//! corner-inclusive): `range 1` is the surrounding 8 tiles.

use crate::buildings::{BuildingType, StatBlock};
use crate::grid::CityGrid;

/// Stats the proximity system can modify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    Pollution,
    CoinOutput,
    MaxPopulation,
    PowerOutput,
    PowerUsage,
}

/// One modifier entry: neighbors of any listed type within `range` adjust
/// the owning building's stat by `effect`. Non-stackable rules fire at most
/// once no matter how many neighbors qualify; stackable rules fire once per
/// qualifying neighbor, capped at `max_stacks`.
#[derive(Debug, Clone, Copy)]
pub struct ProximityRule {
    pub neighbors: &'static [BuildingType],
    pub range: i32,
    pub effect: f32,
    pub stackable: bool,
    pub max_stacks: u32,
}

const UNCAPPED: u32 = u32::MAX;

const fn once(neighbors: &'static [BuildingType], range: i32, effect: f32) -> ProximityRule {
    ProximityRule {
        neighbors,
        range,
        effect,
        stackable: false,
        max_stacks: 1,
    }
}

const fn stacking(
    neighbors: &'static [BuildingType],
    range: i32,
    effect: f32,
    max_stacks: u32,
) -> ProximityRule {
    ProximityRule {
        neighbors,
        range,
        effect,
        stackable: true,
        max_stacks,
    }
}

use BuildingType as B;

const PARKS: &[BuildingType] = &[B::Park, B::HeroPark];
const GREENERY: &[BuildingType] = &[B::Park, B::HeroPark, B::SunPower, B::WindPower];
const HOUSING: &[BuildingType] = &[B::House, B::House2];
const HEAVY_INDUSTRY: &[BuildingType] = &[B::Factory, B::ChemistryFactory];
const COMMERCE: &[BuildingType] = &[B::Shop, B::Office];

static CHEMISTRY_POLLUTION: [ProximityRule; 2] = [
    once(&[B::Factory], 3, 0.2),
    once(&[B::GarbageStation], 2, -0.3),
];
// Either a garbage station or a park within 3 counts for the second entry.
static CHEMISTRY_COIN: [ProximityRule; 2] = [
    once(&[B::Factory], 2, 0.2),
    once(&[B::GarbageStation, B::Park], 3, 0.15),
];
static FACTORY_POLLUTION: [ProximityRule; 2] = [
    stacking(GREENERY, 1, -0.25, UNCAPPED),
    once(&[B::ChemistryFactory], 1, -0.25),
];
static FACTORY_COIN: [ProximityRule; 1] = [stacking(&[B::WaterTower], 1, 0.25, 4)];
static SHOP_COIN: [ProximityRule; 1] = [stacking(PARKS, 1, 0.1, 4)];
static OFFICE_COIN: [ProximityRule; 1] = [stacking(PARKS, 1, 0.12, 4)];
static HOUSING_CAPACITY: [ProximityRule; 2] = [
    stacking(PARKS, 1, 0.1, 4),
    stacking(HEAVY_INDUSTRY, 1, -0.15, 4),
];
static SOLAR_OUTPUT: [ProximityRule; 2] = [
    stacking(HOUSING, 1, 0.05, 4),
    stacking(&[B::SunPower, B::WindPower], 1, 0.05, 4),
];
static WIND_OUTPUT: [ProximityRule; 1] = [stacking(PARKS, 1, 0.08, 4)];
static SCHOOL_COIN: [ProximityRule; 2] = [
    stacking(COMMERCE, 2, 0.1, 2),
    stacking(HEAVY_INDUSTRY, 2, 0.08, 2),
];
static THEME_PARK_COIN: [ProximityRule; 1] = [stacking(COMMERCE, 2, 0.2, 4)];

/// Modifier rules for `recipient`'s `stat`. Empty slice means the fast path
/// applies (no neighborhood scan).
pub fn rules_for(recipient: BuildingType, stat: StatKind) -> &'static [ProximityRule] {
    match (recipient, stat) {
        (B::ChemistryFactory, StatKind::Pollution) => &CHEMISTRY_POLLUTION,
        (B::ChemistryFactory, StatKind::CoinOutput) => &CHEMISTRY_COIN,
        (B::Factory, StatKind::Pollution) => &FACTORY_POLLUTION,
        (B::Factory, StatKind::CoinOutput) => &FACTORY_COIN,
        (B::Shop, StatKind::CoinOutput) => &SHOP_COIN,
        (B::Office, StatKind::CoinOutput) => &OFFICE_COIN,
        (B::House | B::House2, StatKind::MaxPopulation) => &HOUSING_CAPACITY,
        (B::SunPower, StatKind::PowerOutput) => &SOLAR_OUTPUT,
        (B::WindPower, StatKind::PowerOutput) => &WIND_OUTPUT,
        (B::School, StatKind::CoinOutput) => &SCHOOL_COIN,
        (B::ThemePark, StatKind::CoinOutput) => &THEME_PARK_COIN,
        _ => &[],
    }
}

fn stat_of(stats: &StatBlock, stat: StatKind) -> f32 {
    match stat {
        StatKind::Pollution => stats.pollution,
        StatKind::CoinOutput => stats.coin_output,
        StatKind::MaxPopulation => stats.max_population,
        StatKind::PowerOutput => stats.power_output,
        StatKind::PowerUsage => stats.power_usage,
    }
}

/// Count occupied tiles of any type in `neighbors` within Chebyshev `range`
/// of `(x, y)`, the center excluded.
fn count_neighbors(
    grid: &CityGrid,
    x: usize,
    y: usize,
    neighbors: &[BuildingType],
    range: i32,
) -> u32 {
    let mut count = 0;
    for dy in -range..=range {
        for dx in -range..=range {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            if nx < 0 || ny < 0 {
                continue;
            }
            let (nx, ny) = (nx as usize, ny as usize);
            if !grid.in_bounds(nx, ny) {
                continue;
            }
            if let Some(b) = grid.get(nx, ny).building {
                if neighbors.contains(&b) {
                    count += 1;
                }
            }
        }
    }
    count
}

/// Effective per-tile stat: base value from the tile's snapshot, adjusted by
/// every matching proximity rule, then scaled by the tech output factor.
///
/// The accumulated fraction sum is deliberately not floored; heavily
/// negative stacking can push a stat below zero (net reducers rely on it).
pub fn effective_value(grid: &CityGrid, x: usize, y: usize, stat: StatKind) -> f32 {
    let tile = grid.get(x, y);
    let Some(building) = tile.building else {
        return 0.0;
    };
    let Some(stats) = tile.stats else {
        return 0.0;
    };
    let base = stat_of(&stats, stat);

    let rules = rules_for(building, stat);
    if rules.is_empty() {
        // Fast path: nothing can modify this stat, skip the scan entirely.
        return base * tile.output_factor;
    }

    let mut fraction = 0.0;
    for rule in rules {
        let found = count_neighbors(grid, x, y, rule.neighbors, rule.range);
        if found == 0 {
            continue;
        }
        if rule.stackable {
            fraction += rule.effect * found.min(rule.max_stacks) as f32;
        } else {
            fraction += rule.effect;
        }
    }

    base * (1.0 + fraction) * tile.output_factor
}

// ---------------------------------------------------------------------------
// Visual status flags
// ---------------------------------------------------------------------------

/// Observational badges shown over tiles. Purely visual: never read back
/// into the numeric stat computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFlag {
    PollutionWarning,
    MissingFactorySupport,
    MissingCleanup,
    GettingCleanup,
    EconomicBoost,
    CustomerBoost,
    EnvironmentBoost,
    Unhappy,
    EfficiencyBoost,
    WindBoost,
    HumanBoost,
    CoinBoost,
    EducationBoost,
    TourismBoost,
    EntertainmentBoost,
}

/// `inverse: false` flags when at least one qualifying neighbor is present
/// (a boost badge); `inverse: true` flags when none is (a warning badge).
#[derive(Debug, Clone, Copy)]
pub struct StatusRule {
    pub flag: StatusFlag,
    pub neighbors: &'static [BuildingType],
    pub range: i32,
    pub inverse: bool,
}

const fn present(flag: StatusFlag, neighbors: &'static [BuildingType], range: i32) -> StatusRule {
    StatusRule {
        flag,
        neighbors,
        range,
        inverse: false,
    }
}

const fn absent(flag: StatusFlag, neighbors: &'static [BuildingType], range: i32) -> StatusRule {
    StatusRule {
        flag,
        neighbors,
        range,
        inverse: true,
    }
}

static CHEMISTRY_BADGES: [StatusRule; 3] = [
    absent(StatusFlag::MissingFactorySupport, &[B::Factory], 3),
    absent(StatusFlag::MissingCleanup, &[B::GarbageStation], 3),
    present(StatusFlag::GettingCleanup, &[B::GarbageStation], 3),
];
static GARBAGE_BADGES: [StatusRule; 1] = [present(StatusFlag::GettingCleanup, HEAVY_INDUSTRY, 3)];
static FACTORY_BADGES: [StatusRule; 1] = [absent(StatusFlag::PollutionWarning, GREENERY, 1)];
static WATER_TOWER_BADGES: [StatusRule; 1] = [present(StatusFlag::EconomicBoost, &[B::Shop], 1)];
static SHOP_BADGES: [StatusRule; 1] = [present(StatusFlag::CustomerBoost, PARKS, 1)];
static OFFICE_BADGES: [StatusRule; 1] = [present(StatusFlag::EnvironmentBoost, PARKS, 1)];
static HOUSING_BADGES: [StatusRule; 2] = [
    present(StatusFlag::EnvironmentBoost, PARKS, 1),
    present(StatusFlag::Unhappy, HEAVY_INDUSTRY, 1),
];
static SOLAR_BADGES: [StatusRule; 2] = [
    present(
        StatusFlag::EfficiencyBoost,
        &[B::House, B::House2, B::WindPower, B::SunPower],
        1,
    ),
    present(StatusFlag::GettingCleanup, HEAVY_INDUSTRY, 1),
];
static WIND_BADGES: [StatusRule; 1] = [present(StatusFlag::WindBoost, PARKS, 1)];
static PARK_BADGES: [StatusRule; 3] = [
    present(StatusFlag::HumanBoost, HOUSING, 1),
    present(StatusFlag::CoinBoost, COMMERCE, 1),
    present(StatusFlag::GettingCleanup, HEAVY_INDUSTRY, 1),
];
static SCHOOL_BADGES: [StatusRule; 2] = [
    present(StatusFlag::EducationBoost, HOUSING, 2),
    present(StatusFlag::CoinBoost, COMMERCE, 2),
];
static THEME_PARK_BADGES: [StatusRule; 2] = [
    present(StatusFlag::TourismBoost, COMMERCE, 2),
    present(StatusFlag::EntertainmentBoost, HOUSING, 3),
];

pub fn status_rules_for(building: BuildingType) -> &'static [StatusRule] {
    match building {
        B::ChemistryFactory => &CHEMISTRY_BADGES,
        B::GarbageStation => &GARBAGE_BADGES,
        B::Factory => &FACTORY_BADGES,
        B::WaterTower => &WATER_TOWER_BADGES,
        B::Shop => &SHOP_BADGES,
        B::Office => &OFFICE_BADGES,
        B::House | B::House2 => &HOUSING_BADGES,
        B::SunPower => &SOLAR_BADGES,
        B::WindPower => &WIND_BADGES,
        B::Park => &PARK_BADGES,
        B::School => &SCHOOL_BADGES,
        B::ThemePark => &THEME_PARK_BADGES,
        _ => &[],
    }
}

/// Evaluate every status rule for the building at `(x, y)`.
pub fn status_flags(grid: &CityGrid, x: usize, y: usize) -> Vec<StatusFlag> {
    let Some(building) = grid.get(x, y).building else {
        return Vec::new();
    };
    status_rules_for(building)
        .iter()
        .filter(|rule| {
            let found = count_neighbors(grid, x, y, rule.neighbors, rule.range) > 0;
            found != rule.inverse
        })
        .map(|rule| rule.flag)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(grid: &mut CityGrid, x: usize, y: usize, building: BuildingType) {
        let tile = grid.get_mut(x, y);
        tile.building = Some(building);
        tile.level = 1;
        tile.stats = building.stats(1);
    }

    #[test]
    fn fast_path_matches_base_exactly() {
        let mut grid = CityGrid::new(8);
        place(&mut grid, 4, 4, B::Hospital);
        // Hospitals have no proximity rules for any stat.
        assert_eq!(
            effective_value(&grid, 4, 4, StatKind::PowerUsage),
            B::Hospital.stats(1).unwrap().power_usage
        );
        assert_eq!(effective_value(&grid, 4, 4, StatKind::CoinOutput), 0.0);
    }

    #[test]
    fn no_neighbors_equals_base_on_slow_path() {
        let mut grid = CityGrid::new(8);
        place(&mut grid, 4, 4, B::Factory);
        assert_eq!(effective_value(&grid, 4, 4, StatKind::Pollution), 22.0);
    }

    #[test]
    fn factory_next_to_one_park() {
        let mut grid = CityGrid::new(8);
        place(&mut grid, 4, 4, B::Factory);
        place(&mut grid, 4, 5, B::Park);
        // 22 * (1 - 0.25) = 16.5, regardless of the park's level.
        assert_eq!(effective_value(&grid, 4, 4, StatKind::Pollution), 16.5);
    }

    #[test]
    fn diagonal_neighbors_count() {
        let mut grid = CityGrid::new(8);
        place(&mut grid, 4, 4, B::Factory);
        place(&mut grid, 5, 5, B::Park);
        assert_eq!(effective_value(&grid, 4, 4, StatKind::Pollution), 16.5);
    }

    #[test]
    fn stacking_caps_at_max_stacks() {
        let mut grid = CityGrid::new(8);
        place(&mut grid, 4, 4, B::Factory);
        // Six water towers in range 1, rule caps at 4 stacks.
        for &(x, y) in &[(3, 3), (4, 3), (5, 3), (3, 4), (5, 4), (3, 5)] {
            place(&mut grid, x, y, B::WaterTower);
        }
        let six = effective_value(&grid, 4, 4, StatKind::CoinOutput);
        let mut four = CityGrid::new(8);
        place(&mut four, 4, 4, B::Factory);
        for &(x, y) in &[(3, 3), (4, 3), (5, 3), (3, 4)] {
            place(&mut four, x, y, B::WaterTower);
        }
        assert_eq!(six, effective_value(&four, 4, 4, StatKind::CoinOutput));
        assert_eq!(six, 70.0 * 2.0); // +25% x4
    }

    #[test]
    fn non_stackable_applies_once() {
        let mut one = CityGrid::new(8);
        place(&mut one, 4, 4, B::ChemistryFactory);
        place(&mut one, 4, 5, B::GarbageStation);
        let mut five = one.clone();
        for &(x, y) in &[(3, 4), (5, 4), (4, 3), (3, 3)] {
            place(&mut five, x, y, B::GarbageStation);
        }
        assert_eq!(
            effective_value(&one, 4, 4, StatKind::Pollution),
            effective_value(&five, 4, 4, StatKind::Pollution)
        );
        assert_eq!(effective_value(&one, 4, 4, StatKind::Pollution), 45.0 * 0.7);
    }

    #[test]
    fn either_of_two_neighbor_types_fires_once() {
        // Chemistry coin rule: garbage station OR park within 3 gives +15%.
        let mut grid = CityGrid::new(8);
        place(&mut grid, 4, 4, B::ChemistryFactory);
        place(&mut grid, 2, 4, B::Park);
        place(&mut grid, 6, 4, B::GarbageStation);
        assert_eq!(
            effective_value(&grid, 4, 4, StatKind::CoinOutput),
            140.0 * 1.15
        );
    }

    #[test]
    fn unbounded_stacking_can_cross_zero() {
        let mut grid = CityGrid::new(8);
        place(&mut grid, 4, 4, B::Factory);
        // Five greenery neighbors at -25% each: 22 * (1 - 1.25) < 0.
        for &(x, y) in &[(3, 3), (4, 3), (5, 3), (3, 4), (5, 4)] {
            place(&mut grid, x, y, B::Park);
        }
        let value = effective_value(&grid, 4, 4, StatKind::Pollution);
        assert!(value < 0.0);
        assert!((value - 22.0 * -0.25).abs() < 1e-4);
    }

    #[test]
    fn output_factor_multiplies_both_paths() {
        let mut grid = CityGrid::new(8);
        place(&mut grid, 4, 4, B::Factory);
        grid.get_mut(4, 4).output_factor = 1.2;
        assert!((effective_value(&grid, 4, 4, StatKind::Pollution) - 22.0 * 1.2).abs() < 1e-4);
        place(&mut grid, 4, 5, B::Park);
        assert!((effective_value(&grid, 4, 4, StatKind::Pollution) - 16.5 * 1.2).abs() < 1e-4);
    }

    #[test]
    fn warning_flag_uses_inverse_condition() {
        let mut grid = CityGrid::new(8);
        place(&mut grid, 4, 4, B::Factory);
        assert!(status_flags(&grid, 4, 4).contains(&StatusFlag::PollutionWarning));
        place(&mut grid, 4, 5, B::Park);
        assert!(!status_flags(&grid, 4, 4).contains(&StatusFlag::PollutionWarning));
    }

    #[test]
    fn boost_flag_requires_presence() {
        let mut grid = CityGrid::new(8);
        place(&mut grid, 4, 4, B::Shop);
        assert!(status_flags(&grid, 4, 4).is_empty());
        place(&mut grid, 5, 4, B::HeroPark);
        assert_eq!(status_flags(&grid, 4, 4), vec![StatusFlag::CustomerBoost]);
    }
}
