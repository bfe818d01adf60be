/// Dense display grid projected from a sparse snapshot.
///
/// The grid is rebuilt from scratch every frame. Track items are painted
/// first, players second, each list in input order, so later writes win and
/// a player always covers whatever item shares its cell. Entities outside
/// the grid are dropped without a diagnostic.

use crate::domain::snapshot::Snapshot;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayCell {
    label: String,
}

impl DisplayCell {
    pub const BLANK: DisplayCell = DisplayCell { label: String::new() };

    fn labelled(label: String) -> Self {
        DisplayCell { label }
    }

    /// Palette token for this cell (empty when blank).
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_blank(&self) -> bool {
        self.label.is_empty()
    }

    /// The label centred in a field exactly `width` columns wide.
    /// Labels wider than the field are cut.
    pub fn padded(&self, width: usize) -> String {
        let clipped: String = self.label.chars().take(width).collect();
        format!("{:^width$}", clipped, width = width)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayGrid {
    width: usize,
    height: usize,
    cells: Vec<DisplayCell>,
}

impl DisplayGrid {
    pub fn new(width: usize, height: usize) -> Self {
        DisplayGrid {
            width,
            height,
            cells: vec![DisplayCell::BLANK; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[cfg(test)]
    pub fn get(&self, x: usize, y: usize) -> Option<&DisplayCell> {
        if x < self.width && y < self.height {
            self.cells.get(y * self.width + x)
        } else {
            None
        }
    }

    /// Rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[DisplayCell]> {
        // chunks() panics on 0; an empty grid has no rows anyway
        self.cells.chunks(self.width.max(1))
    }

    /// Overwrite the cell at wire coordinates (x, y). Out of range is a no-op.
    fn paint(&mut self, x: i64, y: i64, label: String) {
        if let Some(idx) = self.index_of(x, y) {
            self.cells[idx] = DisplayCell::labelled(label);
        }
    }

    fn index_of(&self, x: i64, y: i64) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }
}

/// Project `snap` onto a fresh `width` x `height` grid.
pub fn project(snap: &Snapshot, width: usize, height: usize) -> DisplayGrid {
    let mut grid = DisplayGrid::new(width, height);

    for item in &snap.track {
        grid.paint(item.x, item.y, item.name.clone());
    }

    // Players last: a car always covers the obstacle it sits on.
    for player in &snap.players {
        grid.paint(player.x, player.y, player.car_token());
    }

    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::{Player, TrackItem};

    const W: usize = 6;
    const H: usize = 9;

    fn item(name: &str, x: i64, y: i64) -> TrackItem {
        TrackItem { name: name.into(), x, y }
    }

    fn car(car: i64, x: i64, y: i64) -> Player {
        Player { name: Some(format!("p{car}")), car, score: Some(0), x, y }
    }

    fn snap(players: Vec<Player>, track: Vec<TrackItem>) -> Snapshot {
        Snapshot { time_left: Some(42), players, track }
    }

    fn label_at(g: &DisplayGrid, x: usize, y: usize) -> &str {
        g.get(x, y).map(|c| c.label()).unwrap_or("<oob>")
    }

    // ── shape ──

    #[test]
    fn grid_has_exact_dimensions() {
        let g = project(&Snapshot::default(), W, H);
        assert_eq!(g.width(), W);
        assert_eq!(g.height(), H);
        assert_eq!(g.rows().count(), H);
        assert!(g.rows().all(|r| r.len() == W));
        assert!(g.rows().flatten().all(DisplayCell::is_blank));
    }

    #[test]
    fn every_cell_blank_or_labelled() {
        let s = snap(
            vec![car(0, 0, 0), car(1, 5, 8)],
            vec![item("crack", 2, 2), item("water", 3, 7), item("bike", 40, 40)],
        );
        let g = project(&s, W, H);
        let labelled = g.rows().flatten().filter(|c| !c.is_blank()).count();
        assert_eq!(labelled, 4);
        assert_eq!(g.rows().flatten().count(), W * H);
    }

    // ── bounds ──

    #[test]
    fn out_of_bounds_item_is_dropped() {
        let with = project(&snap(vec![], vec![item("trash", 10, 0)]), W, H);
        let without = project(&snap(vec![], vec![]), W, H);
        assert_eq!(with, without);
    }

    #[test]
    fn negative_and_edge_coordinates_are_dropped() {
        let stray = vec![
            item("crack", -1, 0),
            item("crack", 0, -1),
            item("crack", W as i64, 0),
            item("crack", 0, H as i64),
            item("crack", i64::MIN, i64::MAX),
        ];
        let stray_cars = vec![car(0, -3, 2), car(1, 6, 9)];
        let g = project(&snap(stray_cars, stray), W, H);
        assert_eq!(g, DisplayGrid::new(W, H));
    }

    #[test]
    fn out_of_bounds_does_not_disturb_neighbours() {
        let base = vec![item("penguin", 5, 0), item("barrier", 0, 1)];
        let mut noisy = base.clone();
        noisy.push(item("trash", 6, 0)); // would wrap into (0, 1) on a naive index
        assert_eq!(project(&snap(vec![], noisy), W, H), project(&snap(vec![], base), W, H));
    }

    #[test]
    fn corners_are_in_bounds() {
        let g = project(&snap(vec![], vec![item("crack", 0, 0), item("water", 5, 8)]), W, H);
        assert_eq!(label_at(&g, 0, 0), "crack");
        assert_eq!(label_at(&g, 5, 8), "water");
    }

    // ── draw order ──

    #[test]
    fn later_track_item_wins() {
        let g = project(&snap(vec![], vec![item("crack", 2, 3), item("bike", 2, 3)]), W, H);
        assert_eq!(label_at(&g, 2, 3), "bike");
    }

    #[test]
    fn later_player_wins() {
        let g = project(&snap(vec![car(0, 4, 4), car(1, 4, 4)], vec![]), W, H);
        assert_eq!(label_at(&g, 4, 4), "car-1");
    }

    #[test]
    fn player_overrides_track_item() {
        let s = snap(
            vec![car(0, 1, 1)],
            vec![item("trash", 1, 1)],
        );
        let g = project(&s, W, H);
        assert_eq!(label_at(&g, 1, 1), "car-0");
    }

    #[test]
    fn player_overrides_items_listed_after_it() {
        // Lists are independent: track always paints before players.
        let s = snap(
            vec![car(3, 2, 5)],
            vec![item("water", 1, 5), item("barrier", 2, 5), item("crack", 2, 5)],
        );
        let g = project(&s, W, H);
        assert_eq!(label_at(&g, 2, 5), "car-3");
        assert_eq!(label_at(&g, 1, 5), "water");
    }

    // ── cell formatting ──

    #[test]
    fn padded_centres_label() {
        let cell = DisplayCell::labelled("car-0".into());
        let out = cell.padded(10);
        assert_eq!(out.chars().count(), 10);
        assert_eq!(out.trim(), "car-0");
        assert!(out.starts_with("  "));
    }

    #[test]
    fn padded_blank_is_spaces() {
        assert_eq!(DisplayCell::BLANK.padded(4), "    ");
    }

    #[test]
    fn padded_truncates_wide_labels() {
        let cell = DisplayCell::labelled("a-very-long-obstacle".into());
        assert_eq!(cell.padded(10), "a-very-lon");
    }
}
