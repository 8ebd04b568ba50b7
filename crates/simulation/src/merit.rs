//! Merit points and the civic title ladder.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy)]
pub struct TitleDef {
    pub id: &'static str,
    pub name: &'static str,
    pub min_merit: i64,
}

/// Ascending ladder; the highest entry at or below the player's merit wins.
pub const TITLES: &[TitleDef] = &[
    TitleDef { id: "village_staff", name: "Village Staffer", min_merit: 0 },
    TitleDef { id: "village_director", name: "Village Director", min_merit: 100 },
    TitleDef { id: "township_staff", name: "Township Staffer", min_merit: 300 },
    TitleDef { id: "township_director", name: "Township Director", min_merit: 600 },
    TitleDef { id: "county_staff", name: "County Staffer", min_merit: 1_000 },
    TitleDef { id: "county_director", name: "County Director", min_merit: 2_000 },
    TitleDef { id: "city_staff", name: "City Staffer", min_merit: 3_500 },
    TitleDef { id: "city_director", name: "City Director", min_merit: 6_000 },
    TitleDef { id: "province_staff", name: "Provincial Staffer", min_merit: 10_000 },
    TitleDef { id: "province_director", name: "Provincial Director", min_merit: 20_000 },
    TitleDef { id: "national_staff", name: "National Staffer", min_merit: 35_000 },
    TitleDef { id: "national_director", name: "National Director", min_merit: 60_000 },
];

pub fn title_for(merit: i64) -> &'static TitleDef {
    TITLES
        .iter()
        .rev()
        .find(|t| merit >= t.min_merit)
        .unwrap_or(&TITLES[0])
}

#[derive(Resource, Debug, Clone, Default)]
pub struct MeritState {
    pub points: i64,
}

impl MeritState {
    pub fn add(&mut self, points: i64) {
        self.points += points;
    }

    pub fn title(&self) -> &'static TitleDef {
        title_for(self.points)
    }
}

pub struct MeritPlugin;

impl Plugin for MeritPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MeritState>();
    }
}
