mod connectivity;
mod graph;

pub use connectivity::connected;
pub use graph::{adjacent, contains, continent_of, neighbors, Continent, TERRITORIES, TERRITORY_COUNT};
