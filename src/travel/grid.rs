//! Map cells, the 8×8 grid they are laid out on, and where the player stands.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

pub const GRID_SIDE: u8 = 8;
pub const GRID_SLOTS: u8 = GRID_SIDE * GRID_SIDE;

/// Slug suffix shared by every walkable cell ("29cell").
pub const CELL_SUFFIX: &str = "cell";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cell {
    pub id: String,
    pub slug: String,
    pub name: String,
    /// Image file name under the locations art directory; empty when the cell has none.
    pub image: String,
    pub inactive: bool,
}

impl Cell {
    pub fn image(&self) -> Option<&str> {
        if self.image.is_empty() {
            None
        } else {
            Some(&self.image)
        }
    }
}

/// Grid position (1-based) encoded in a cell slug, if it is one of the 64 slots.
pub fn grid_index(slug: &str) -> Option<u8> {
    let digits = slug.strip_suffix(CELL_SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index: u8 = digits.parse().ok()?;
    (1..=GRID_SLOTS).contains(&index).then_some(index)
}

/// Sparse layout of a location's cells keyed by grid position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellGrid {
    cells: BTreeMap<u8, Cell>,
}

impl CellGrid {
    /// Cells whose slug does not name a grid slot are left out. A later duplicate wins.
    pub fn from_cells(cells: impl IntoIterator<Item = Cell>) -> Self {
        let cells = cells
            .into_iter()
            .filter_map(|cell| grid_index(&cell.slug).map(|i| (i, cell)))
            .collect();
        Self { cells }
    }

    pub fn get(&self, index: u8) -> Option<&Cell> {
        self.cells.get(&index)
    }

    pub fn find(&self, slug: &str) -> Option<&Cell> {
        grid_index(slug).and_then(|i| self.cells.get(&i))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All 64 slots in row-major order, `None` where the location has no cell.
    pub fn slots(&self) -> impl Iterator<Item = (u8, Option<&Cell>)> + '_ {
        (1..=GRID_SLOTS).map(move |i| (i, self.cells.get(&i)))
    }

    pub fn image_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.cells.values().filter_map(Cell::image)
    }
}

/// The slice of the user record that locates the player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserLocation {
    pub location_slug: Option<String>,
    pub location: Option<LocationRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationRef {
    pub slug: String,
}

impl UserLocation {
    /// `locationSlug` when non-empty, else `location.slug`, else empty.
    pub fn current_slug(&self) -> &str {
        self.location_slug
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.location.as_ref().map(|l| l.slug.as_str()))
            .unwrap_or("")
    }
}

/// Resolve which cell the player occupies on `location_slug`'s map.
///
/// Locations with a configured default cell report the location itself (not a cell) while the
/// player stands at its entrance; that case maps to the default cell.
pub fn resolve_player_cell(
    location_slug: &str,
    user: &UserLocation,
    default_cells: &HashMap<String, String>,
) -> String {
    let current = user.current_slug();
    match default_cells.get(location_slug) {
        Some(fallback) if !current.ends_with(CELL_SUFFIX) => fallback.clone(),
        _ => current.to_string(),
    }
}

/// Name shown while travelling: the server's target name or the clicked slug, minus a
/// trailing `cell`.
pub fn target_display_name(target_cell: Option<&str>, clicked_slug: &str) -> String {
    let raw = target_cell.filter(|t| !t.is_empty()).unwrap_or(clicked_slug);
    raw.strip_suffix(CELL_SUFFIX).unwrap_or(raw).to_string()
}
