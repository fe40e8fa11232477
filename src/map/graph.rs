use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of territories on the board. Fixed by the ruleset.
pub const TERRITORY_COUNT: usize = 42;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Continent {
    NorthAmerica,
    SouthAmerica,
    Europe,
    Africa,
    Asia,
    Australia,
}

impl Continent {
    pub const ALL: [Continent; 6] = [
        Continent::NorthAmerica,
        Continent::SouthAmerica,
        Continent::Europe,
        Continent::Africa,
        Continent::Asia,
        Continent::Australia,
    ];

    /// Reinforcement bonus granted for owning every territory of the continent.
    pub fn bonus(self) -> u32 {
        match self {
            Continent::NorthAmerica => 5,
            Continent::SouthAmerica => 2,
            Continent::Europe => 5,
            Continent::Africa => 3,
            Continent::Asia => 7,
            Continent::Australia => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Continent::NorthAmerica => "north_america",
            Continent::SouthAmerica => "south_america",
            Continent::Europe => "europe",
            Continent::Africa => "africa",
            Continent::Asia => "asia",
            Continent::Australia => "australia",
        }
    }
}

impl fmt::Display for Continent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every territory with its continent. Order is the canonical board order.
pub const TERRITORIES: [(&str, Continent); TERRITORY_COUNT] = [
    ("alaska", Continent::NorthAmerica),
    ("northwest_territory", Continent::NorthAmerica),
    ("greenland", Continent::NorthAmerica),
    ("alberta", Continent::NorthAmerica),
    ("ontario", Continent::NorthAmerica),
    ("quebec", Continent::NorthAmerica),
    ("western_united_states", Continent::NorthAmerica),
    ("eastern_united_states", Continent::NorthAmerica),
    ("central_america", Continent::NorthAmerica),
    ("venezuela", Continent::SouthAmerica),
    ("peru", Continent::SouthAmerica),
    ("brazil", Continent::SouthAmerica),
    ("argentina", Continent::SouthAmerica),
    ("iceland", Continent::Europe),
    ("scandinavia", Continent::Europe),
    ("ukraine", Continent::Europe),
    ("great_britain", Continent::Europe),
    ("northern_europe", Continent::Europe),
    ("western_europe", Continent::Europe),
    ("southern_europe", Continent::Europe),
    ("north_africa", Continent::Africa),
    ("egypt", Continent::Africa),
    ("east_africa", Continent::Africa),
    ("congo", Continent::Africa),
    ("south_africa", Continent::Africa),
    ("madagascar", Continent::Africa),
    ("ural", Continent::Asia),
    ("siberia", Continent::Asia),
    ("yakutsk", Continent::Asia),
    ("kamchatka", Continent::Asia),
    ("irkutsk", Continent::Asia),
    ("mongolia", Continent::Asia),
    ("japan", Continent::Asia),
    ("afghanistan", Continent::Asia),
    ("china", Continent::Asia),
    ("middle_east", Continent::Asia),
    ("india", Continent::Asia),
    ("siam", Continent::Asia),
    ("indonesia", Continent::Australia),
    ("new_guinea", Continent::Australia),
    ("western_australia", Continent::Australia),
    ("eastern_australia", Continent::Australia),
];

/// Undirected adjacency, each edge declared once. Traversal helpers expand
/// both directions, so symmetry holds by construction.
const EDGES: [(&str, &str); 83] = [
    ("alaska", "northwest_territory"),
    ("alaska", "alberta"),
    ("alaska", "kamchatka"),
    ("northwest_territory", "alberta"),
    ("northwest_territory", "ontario"),
    ("northwest_territory", "greenland"),
    ("greenland", "ontario"),
    ("greenland", "quebec"),
    ("greenland", "iceland"),
    ("alberta", "ontario"),
    ("alberta", "western_united_states"),
    ("ontario", "quebec"),
    ("ontario", "western_united_states"),
    ("ontario", "eastern_united_states"),
    ("quebec", "eastern_united_states"),
    ("western_united_states", "eastern_united_states"),
    ("western_united_states", "central_america"),
    ("eastern_united_states", "central_america"),
    ("central_america", "venezuela"),
    ("venezuela", "peru"),
    ("venezuela", "brazil"),
    ("peru", "brazil"),
    ("peru", "argentina"),
    ("brazil", "argentina"),
    ("brazil", "north_africa"),
    ("iceland", "great_britain"),
    ("iceland", "scandinavia"),
    ("scandinavia", "great_britain"),
    ("scandinavia", "northern_europe"),
    ("scandinavia", "ukraine"),
    ("ukraine", "northern_europe"),
    ("ukraine", "southern_europe"),
    ("ukraine", "ural"),
    ("ukraine", "afghanistan"),
    ("ukraine", "middle_east"),
    ("great_britain", "northern_europe"),
    ("great_britain", "western_europe"),
    ("northern_europe", "southern_europe"),
    ("northern_europe", "western_europe"),
    ("western_europe", "southern_europe"),
    ("western_europe", "north_africa"),
    ("southern_europe", "middle_east"),
    ("southern_europe", "egypt"),
    ("southern_europe", "north_africa"),
    ("north_africa", "egypt"),
    ("north_africa", "east_africa"),
    ("north_africa", "congo"),
    ("egypt", "east_africa"),
    ("egypt", "middle_east"),
    ("east_africa", "congo"),
    ("east_africa", "south_africa"),
    ("east_africa", "madagascar"),
    ("east_africa", "middle_east"),
    ("congo", "south_africa"),
    ("south_africa", "madagascar"),
    ("ural", "siberia"),
    ("ural", "china"),
    ("ural", "afghanistan"),
    ("siberia", "yakutsk"),
    ("siberia", "irkutsk"),
    ("siberia", "mongolia"),
    ("siberia", "china"),
    ("yakutsk", "kamchatka"),
    ("yakutsk", "irkutsk"),
    ("kamchatka", "irkutsk"),
    ("kamchatka", "mongolia"),
    ("kamchatka", "japan"),
    ("irkutsk", "mongolia"),
    ("mongolia", "japan"),
    ("mongolia", "china"),
    ("afghanistan", "china"),
    ("afghanistan", "india"),
    ("afghanistan", "middle_east"),
    ("china", "india"),
    ("china", "siam"),
    ("middle_east", "india"),
    ("india", "siam"),
    ("siam", "indonesia"),
    ("indonesia", "new_guinea"),
    ("indonesia", "western_australia"),
    ("new_guinea", "western_australia"),
    ("new_guinea", "eastern_australia"),
    ("western_australia", "eastern_australia"),
];

/// Whether `name` is a territory on the board.
pub fn contains(name: &str) -> bool {
    TERRITORIES.iter().any(|(t, _)| *t == name)
}

pub fn continent_of(name: &str) -> Option<Continent> {
    TERRITORIES
        .iter()
        .find(|(t, _)| *t == name)
        .map(|(_, c)| *c)
}

/// Neighbors of a territory. Empty iterator for unknown names.
pub fn neighbors(name: &str) -> impl Iterator<Item = &'static str> + '_ {
    EDGES.iter().filter_map(move |(a, b)| {
        if *a == name {
            Some(*b)
        } else if *b == name {
            Some(*a)
        } else {
            None
        }
    })
}

pub fn adjacent(a: &str, b: &str) -> bool {
    EDGES
        .iter()
        .any(|(x, y)| (*x == a && *y == b) || (*x == b && *y == a))
}
