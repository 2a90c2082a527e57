//! Buildings and plants placed on the campus map

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::rng::RngExt;
use crate::spatial::{MapBounds, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
    Legendary,
}

/// Symbolic icon names, mapped to real artwork by whoever renders them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconId {
    Compass,
    Church,
    Library,
    School,
}

impl IconId {
    pub fn as_str(self) -> &'static str {
        match self {
            IconId::Compass => "compass",
            IconId::Church => "church",
            IconId::Library => "library",
            IconId::School => "school",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    Glyph(String),
    Icon(IconId),
}

impl Marker {
    pub fn glyph(glyph: &str) -> Self {
        Marker::Glyph(glyph.to_string())
    }

    /// Renderable form: the glyph itself, or `icon:<name>`
    pub fn resolve(&self) -> String {
        match self {
            Marker::Glyph(glyph) => glyph.clone(),
            Marker::Icon(icon) => format!("icon:{}", icon.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    pub id: String,
    pub name: String,
    pub position: Position,
    pub marker: Marker,
    pub rarity: Rarity,
    #[serde(default)]
    pub scientific_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    discovered: bool,
}

impl Plant {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        position: Position,
        marker: Marker,
        rarity: Rarity,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position,
            marker,
            rarity,
            scientific_name: None,
            description: None,
            discovered: false,
        }
    }

    /// Seed-data constructor for plants that start out cataloged
    pub fn already_discovered(mut self) -> Self {
        self.discovered = true;
        self
    }

    pub fn is_discovered(&self) -> bool {
        self.discovered
    }

    /// One-way transition. Returns `true` only on the call that flipped it.
    pub fn discover(&mut self) -> bool {
        let newly = !self.discovered;
        self.discovered = true;
        newly
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: String,
    pub name: String,
    pub description: String,
    pub position: Position,
    pub marker: Marker,
    #[serde(default)]
    pub notable_flora: Vec<String>,
}

/// Draw parameters for randomly placed plants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantGeneration {
    pub count: usize,
    pub margin: f64,
    pub rare_probability: f64,
}

impl Default for PlantGeneration {
    fn default() -> Self {
        Self {
            count: 40,
            margin: 200.0,
            rare_probability: 0.1,
        }
    }
}

pub const GENERATED_NAMES: [&str; 6] = [
    "靜宜小芽",
    "校園野草",
    "幸運草",
    "探險蘑菇",
    "朝氣小花",
    "刺刺君",
];

pub const GENERATED_GLYPHS: [&str; 12] = [
    "🌿", "🌱", "🍃", "☘️", "🍀", "🌵", "🌻", "🌼", "🌷", "🌹", "🌾", "🍄",
];

/// Scatter `params.count` plants inside the map, away from its edges
pub fn generate_plants<R: Rng>(
    rng: &mut R,
    bounds: &MapBounds,
    params: &PlantGeneration,
) -> Vec<Plant> {
    let (low, high) = bounds.inset(params.margin);
    (0..params.count)
        .map(|i| {
            let x = rng.random_f64(low, high);
            let y = rng.random_f64(low, high);
            let name = rng.pick(&GENERATED_NAMES).copied().unwrap_or_default();
            let glyph = rng.pick(&GENERATED_GLYPHS).copied().unwrap_or_default();
            let rarity = if rng.random_bool(params.rare_probability) {
                Rarity::Rare
            } else {
                Rarity::Common
            };
            Plant::new(
                format!("random-{i}"),
                name,
                Position::new(x, y),
                Marker::glyph(glyph),
                rarity,
            )
        })
        .collect()
}

pub fn seed_buildings() -> Vec<Building> {
    vec![
        Building {
            id: "1".into(),
            name: "靜宜校門".into(),
            description: "冒險的入口。這道宏偉的校門見證了無數靜宜人的啟航。".into(),
            position: Position::new(1500.0, 2850.0),
            marker: Marker::Icon(IconId::Compass),
            notable_flora: vec!["校園榕樹".into(), "金黃葛".into()],
        },
        Building {
            id: "2".into(),
            name: "主顧聖母堂".into(),
            description: "最具指標性的建築，象徵魚與生命。".into(),
            position: Position::new(1200.0, 2000.0),
            marker: Marker::Icon(IconId::Church),
            notable_flora: vec!["聖母百合".into(), "鳳凰木".into()],
        },
        Building {
            id: "3".into(),
            name: "蓋夏圖書館".into(),
            description: "中部地區規模數一數二的大學圖書館。".into(),
            position: Position::new(2300.0, 1200.0),
            marker: Marker::Icon(IconId::Library),
            notable_flora: vec!["智慧蕨".into(), "書香桂花".into()],
        },
        Building {
            id: "4".into(),
            name: "至善樓".into(),
            description: "教學與行政的核心建築。".into(),
            position: Position::new(1800.0, 1500.0),
            marker: Marker::Icon(IconId::School),
            notable_flora: vec!["矮牽牛".into(), "變葉木".into()],
        },
    ]
}

pub fn seed_plants() -> Vec<Plant> {
    vec![
        Plant::new(
            "p1",
            "靜宜百合",
            Position::new(1150.0, 2050.0),
            Marker::glyph("🌸"),
            Rarity::Rare,
        ),
        Plant::new(
            "p2",
            "校門古榕",
            Position::new(1580.0, 2780.0),
            Marker::glyph("🌳"),
            Rarity::Common,
        )
        .already_discovered(),
    ]
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityRegistry {
    buildings: Vec<Building>,
    plants: Vec<Plant>,
}

impl EntityRegistry {
    pub fn new(buildings: Vec<Building>, plants: Vec<Plant>) -> Self {
        Self { buildings, plants }
    }

    /// Campus seed data followed by freshly generated plants
    pub fn campus<R: Rng>(rng: &mut R, bounds: &MapBounds, params: &PlantGeneration) -> Self {
        let mut plants = seed_plants();
        plants.extend(generate_plants(rng, bounds, params));
        Self::new(seed_buildings(), plants)
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn plants(&self) -> &[Plant] {
        &self.plants
    }

    pub fn building(&self, id: &str) -> Option<&Building> {
        self.buildings.iter().find(|building| building.id == id)
    }

    pub fn plant(&self, id: &str) -> Option<&Plant> {
        self.plants.iter().find(|plant| plant.id == id)
    }

    /// Mark a plant discovered. `None` for unknown ids, otherwise whether
    /// this call was the first discovery.
    pub fn discover(&mut self, id: &str) -> Option<bool> {
        self.plants
            .iter_mut()
            .find(|plant| plant.id == id)
            .map(Plant::discover)
    }

    pub fn discovered(&self) -> impl Iterator<Item = &Plant> {
        self.plants.iter().filter(|plant| plant.is_discovered())
    }

    pub fn undiscovered(&self) -> impl Iterator<Item = &Plant> {
        self.plants.iter().filter(|plant| !plant.is_discovered())
    }
}
