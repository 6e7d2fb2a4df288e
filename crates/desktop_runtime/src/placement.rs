//! Desktop icon grid geometry, free-cell search, and auto layout.
//!
//! Positions are pixel offsets; cells are `(column, row)` indices on a grid whose origin sits at
//! the desktop padding. A search is bounded by [`DesktopExtents`] and a ring radius, and reports
//! through [`CellSearch`] whether it actually found a free cell or had to fall back to the
//! snapped (possibly occupied) target.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{DesktopIcon, IconKind, IconPosition, Viewport};

/// Grid index `(column, row)`.
pub type GridCell = (i32, i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridMetrics {
    pub cell_width: i32,
    pub cell_height: i32,
    pub padding: i32,
}

impl GridMetrics {
    /// Rounds a raw position to the nearest cell origin, never above/left of the padding.
    pub fn snap_to_grid(&self, x: i32, y: i32) -> IconPosition {
        let (column, row) = self.cell_of(IconPosition { x, y });
        let snapped = self.position_of((column, row));
        IconPosition {
            x: snapped.x.max(self.padding),
            y: snapped.y.max(self.padding),
        }
    }

    /// Nearest cell index for a position.
    pub fn cell_of(&self, position: IconPosition) -> GridCell {
        (
            round_div(position.x - self.padding, self.cell_width),
            round_div(position.y - self.padding, self.cell_height),
        )
    }

    pub fn position_of(&self, (column, row): GridCell) -> IconPosition {
        IconPosition {
            x: column * self.cell_width + self.padding,
            y: row * self.cell_height + self.padding,
        }
    }
}

/// `round(value / divisor)` with halves rounded away from zero.
fn round_div(value: i32, divisor: i32) -> i32 {
    if divisor <= 0 {
        return 0;
    }
    let quotient = value as f64 / divisor as f64;
    quotient.round() as i32
}

/// Number of icon columns that fit in `viewport_width`; a single column below `narrow_breakpoint`.
pub fn icons_per_row(metrics: &GridMetrics, viewport_width: i32, narrow_breakpoint: i32) -> i32 {
    if viewport_width < narrow_breakpoint || metrics.cell_width <= 0 {
        return 1;
    }
    ((viewport_width - 2 * metrics.padding) / metrics.cell_width).max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Cell-space bounds of the desktop.
pub struct DesktopExtents {
    pub columns: i32,
    pub rows: i32,
}

impl DesktopExtents {
    /// Extents for a viewport, excluding the taskbar strip.
    pub fn for_viewport(
        metrics: &GridMetrics,
        viewport: Viewport,
        taskbar_height: i32,
        narrow_breakpoint: i32,
    ) -> Self {
        let usable_height = viewport.height - taskbar_height - 2 * metrics.padding;
        let rows = if metrics.cell_height > 0 {
            (usable_height / metrics.cell_height).max(1)
        } else {
            1
        };
        Self {
            columns: icons_per_row(metrics, viewport.width, narrow_breakpoint),
            rows,
        }
    }

    pub fn contains(&self, (column, row): GridCell) -> bool {
        column >= 0 && row >= 0 && column < self.columns && row < self.rows
    }

    fn clamp(&self, (column, row): GridCell) -> GridCell {
        (
            column.clamp(0, (self.columns - 1).max(0)),
            row.clamp(0, (self.rows - 1).max(0)),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Outcome of [`find_next_available_cell`].
pub enum CellSearch {
    /// A cell no other icon uses.
    Free(IconPosition),
    /// Nothing free within the bound; the snapped target is returned and may collide.
    Fallback(IconPosition),
}

impl CellSearch {
    pub fn position(self) -> IconPosition {
        match self {
            Self::Free(position) | Self::Fallback(position) => position,
        }
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Everything a free-cell search needs besides the target.
pub struct PlacementContext<'a> {
    pub metrics: GridMetrics,
    pub extents: DesktopExtents,
    /// Ring bound; ring 0 is the target cell itself.
    pub max_search_radius: i32,
    /// Persisted positions keyed by icon id.
    pub persisted: &'a BTreeMap<String, IconPosition>,
}

/// Finds the free cell closest to `target`, walking rings outward in grid-index space.
///
/// A cell is taken when another icon's persisted position falls in it (`exclude_id` is ignored)
/// or when it appears in `occupied_this_pass`. Within a ring, candidates are ordered by distance
/// and then row-major so the result is deterministic.
pub fn find_next_available_cell(
    context: &PlacementContext<'_>,
    target: IconPosition,
    exclude_id: &str,
    occupied_this_pass: &BTreeSet<GridCell>,
) -> CellSearch {
    let metrics = &context.metrics;
    let snapped = metrics.snap_to_grid(target.x, target.y);
    let origin = context.extents.clamp(metrics.cell_of(snapped));

    let taken: BTreeSet<GridCell> = context
        .persisted
        .iter()
        .filter(|(id, _)| id.as_str() != exclude_id)
        .map(|(_, position)| metrics.cell_of(*position))
        .chain(occupied_this_pass.iter().copied())
        .collect();

    for radius in 0..=context.max_search_radius.max(0) {
        let mut ring = ring_cells(origin, radius);
        ring.sort_by_key(|&(column, row)| {
            let dc = column - origin.0;
            let dr = row - origin.1;
            (dc * dc + dr * dr, row, column)
        });
        if let Some(cell) = ring
            .into_iter()
            .find(|cell| context.extents.contains(*cell) && !taken.contains(cell))
        {
            return CellSearch::Free(metrics.position_of(cell));
        }
    }
    CellSearch::Fallback(snapped)
}

fn ring_cells((column, row): GridCell, radius: i32) -> Vec<GridCell> {
    if radius == 0 {
        return vec![(column, row)];
    }
    let mut cells = Vec::with_capacity((8 * radius) as usize);
    for dr in -radius..=radius {
        for dc in -radius..=radius {
            if dr.abs() == radius || dc.abs() == radius {
                cells.push((column + dc, row + dr));
            }
        }
    }
    cells
}

/// Orders icons the way the desktop shows them: app icons first, then by label.
pub fn sort_icons(icons: &mut [DesktopIcon]) {
    icons.sort_by(|a, b| {
        let a_app = a.kind == IconKind::App;
        let b_app = b.kind == IconKind::App;
        b_app
            .cmp(&a_app)
            .then_with(|| a.label.to_lowercase().cmp(&b.label.to_lowercase()))
            .then_with(|| a.label.cmp(&b.label))
    });
}

/// Assigns a position to every icon.
///
/// Icons with a persisted position keep it. The rest are placed in row-major order from an
/// auto-layout cursor, each through [`find_next_available_cell`]. Persisted entries for icons
/// that are not in `icons` are ignored.
pub fn layout_pass(
    icons: &[DesktopIcon],
    persisted: &BTreeMap<String, IconPosition>,
    metrics: GridMetrics,
    extents: DesktopExtents,
    max_search_radius: i32,
) -> BTreeMap<String, IconPosition> {
    let live: BTreeMap<String, IconPosition> = persisted
        .iter()
        .filter(|(id, _)| icons.iter().any(|icon| &icon.id == *id))
        .map(|(id, position)| (id.clone(), *position))
        .collect();
    let context = PlacementContext {
        metrics,
        extents,
        max_search_radius,
        persisted: &live,
    };

    let mut placed = live.clone();
    let mut claimed = BTreeSet::new();
    let mut cursor: GridCell = (0, 0);
    for icon in icons.iter().filter(|icon| !live.contains_key(&icon.id)) {
        let search = find_next_available_cell(
            &context,
            metrics.position_of(cursor),
            &icon.id,
            &claimed,
        );
        let position = search.position();
        let cell = metrics.cell_of(position);
        claimed.insert(cell);
        placed.insert(icon.id.clone(), position);
        cursor = next_row_major(cell, extents);
    }
    placed
}

fn next_row_major((column, row): GridCell, extents: DesktopExtents) -> GridCell {
    if column + 1 >= extents.columns {
        (0, row + 1)
    } else {
        (column + 1, row)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::ShellConfig;

    fn metrics() -> GridMetrics {
        ShellConfig::default().grid()
    }

    fn icon(id: &str, kind: IconKind, label: &str) -> DesktopIcon {
        DesktopIcon {
            id: id.to_string(),
            kind,
            label: label.to_string(),
            glyph: String::new(),
            position: IconPosition { x: 0, y: 0 },
            backing_path: None,
            app_id: None,
        }
    }

    fn context<'a>(
        persisted: &'a BTreeMap<String, IconPosition>,
        extents: DesktopExtents,
        radius: i32,
    ) -> PlacementContext<'a> {
        PlacementContext {
            metrics: metrics(),
            extents,
            max_search_radius: radius,
            persisted,
        }
    }

    #[test]
    fn snap_rounds_to_nearest_cell_and_respects_padding() {
        let grid = metrics();
        assert_eq!(grid.snap_to_grid(10, 10), IconPosition { x: 10, y: 10 });
        assert_eq!(grid.snap_to_grid(60, 70), IconPosition { x: 92, y: 122 });
        assert_eq!(grid.snap_to_grid(40, 40), IconPosition { x: 10, y: 10 });
        assert_eq!(grid.snap_to_grid(-200, -5), IconPosition { x: 10, y: 10 });
    }

    #[test]
    fn icons_per_row_floors_and_collapses_on_narrow_viewports() {
        let grid = metrics();
        assert_eq!(icons_per_row(&grid, 1280, 360), 15);
        assert_eq!(icons_per_row(&grid, 100, 0), 1);
        assert_eq!(icons_per_row(&grid, 359, 360), 1);
    }

    #[test]
    fn search_returns_target_when_free() {
        let persisted = BTreeMap::new();
        let extents = DesktopExtents { columns: 5, rows: 5 };
        let search = find_next_available_cell(
            &context(&persisted, extents, 4),
            IconPosition { x: 96, y: 120 },
            "a",
            &BTreeSet::new(),
        );
        assert_eq!(search, CellSearch::Free(IconPosition { x: 92, y: 122 }));
    }

    #[test]
    fn search_skips_other_icons_but_not_the_excluded_one() {
        let persisted = BTreeMap::from([
            ("a".to_string(), IconPosition { x: 10, y: 10 }),
            ("b".to_string(), IconPosition { x: 92, y: 10 }),
        ]);
        let extents = DesktopExtents { columns: 5, rows: 5 };
        let ctx = context(&persisted, extents, 4);

        let own_cell =
            find_next_available_cell(&ctx, IconPosition { x: 10, y: 10 }, "a", &BTreeSet::new());
        assert_eq!(own_cell, CellSearch::Free(IconPosition { x: 10, y: 10 }));

        let displaced =
            find_next_available_cell(&ctx, IconPosition { x: 10, y: 10 }, "c", &BTreeSet::new());
        assert_eq!(displaced, CellSearch::Free(IconPosition { x: 10, y: 122 }));
    }

    #[test]
    fn search_honours_cells_claimed_earlier_in_the_pass() {
        let persisted = BTreeMap::new();
        let extents = DesktopExtents { columns: 1, rows: 3 };
        let claimed = BTreeSet::from([(0, 0), (0, 1)]);
        let search = find_next_available_cell(
            &context(&persisted, extents, 4),
            IconPosition { x: 10, y: 10 },
            "x",
            &claimed,
        );
        assert_eq!(search, CellSearch::Free(IconPosition { x: 10, y: 234 }));
    }

    #[test]
    fn full_desktop_falls_back_to_snapped_target() {
        let persisted = BTreeMap::from([
            ("a".to_string(), IconPosition { x: 10, y: 10 }),
            ("b".to_string(), IconPosition { x: 92, y: 10 }),
        ]);
        let extents = DesktopExtents { columns: 2, rows: 1 };
        let search = find_next_available_cell(
            &context(&persisted, extents, 24),
            IconPosition { x: 95, y: 14 },
            "c",
            &BTreeSet::new(),
        );
        assert!(search.is_fallback());
        assert_eq!(search.position(), IconPosition { x: 92, y: 10 });
    }

    #[test]
    fn search_bound_limits_how_far_it_looks() {
        let persisted = BTreeMap::from([("a".to_string(), IconPosition { x: 10, y: 10 })]);
        let extents = DesktopExtents { columns: 10, rows: 10 };
        let search = find_next_available_cell(
            &context(&persisted, extents, 0),
            IconPosition { x: 10, y: 10 },
            "b",
            &BTreeSet::new(),
        );
        assert_eq!(search, CellSearch::Fallback(IconPosition { x: 10, y: 10 }));
    }

    #[test]
    fn sort_puts_apps_first_then_labels() {
        let mut icons = vec![
            icon("f1", IconKind::File, "alpha.txt"),
            icon("a2", IconKind::App, "Notepad"),
            icon("d1", IconKind::Folder, "Beta"),
            icon("a1", IconKind::App, "Calculator"),
        ];
        sort_icons(&mut icons);
        let ids: Vec<&str> = icons.iter().map(|icon| icon.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2", "f1", "d1"]);
    }

    #[test]
    fn layout_pass_keeps_persisted_and_never_stacks_auto_placed_icons() {
        let icons = vec![
            icon("a", IconKind::App, "A"),
            icon("b", IconKind::App, "B"),
            icon("c", IconKind::App, "C"),
            icon("d", IconKind::File, "d.txt"),
        ];
        let persisted = BTreeMap::from([
            ("b".to_string(), IconPosition { x: 10, y: 10 }),
            ("ghost".to_string(), IconPosition { x: 92, y: 10 }),
        ]);
        let extents = DesktopExtents { columns: 3, rows: 4 };

        let placed = layout_pass(&icons, &persisted, metrics(), extents, 24);

        assert_eq!(placed.len(), 4);
        assert_eq!(placed["b"], IconPosition { x: 10, y: 10 });
        assert_eq!(placed["a"], IconPosition { x: 92, y: 10 });
        assert_eq!(placed["c"], IconPosition { x: 174, y: 10 });
        assert_eq!(placed["d"], IconPosition { x: 10, y: 122 });
        let cells: BTreeSet<GridCell> = placed.values().map(|p| metrics().cell_of(*p)).collect();
        assert_eq!(cells.len(), placed.len());
    }
}
