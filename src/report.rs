use serde::{Deserialize, Serialize};

const NAME_WIDTH: usize = 40;
const STATUS_WIDTH: usize = 10;
const RULE_WIDTH: usize = 80;

/// Compatibility layers tracked by the database, in the canonical
/// column order the report always uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatLayer {
    Native,
    Rosetta2,
    Crossover,
    Wine,
    Parallels,
    LinuxArm,
}

impl CompatLayer {
    pub const ALL: [CompatLayer; 6] = [
        CompatLayer::Native,
        CompatLayer::Rosetta2,
        CompatLayer::Crossover,
        CompatLayer::Wine,
        CompatLayer::Parallels,
        CompatLayer::LinuxArm,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CompatLayer::Native => "Native",
            CompatLayer::Rosetta2 => "Rosetta 2",
            CompatLayer::Crossover => "CrossOver",
            CompatLayer::Wine => "Wine",
            CompatLayer::Parallels => "Parallels",
            CompatLayer::LinuxArm => "Linux ARM",
        }
    }
}

/// One game from the backend's matched results. Field names follow the
/// backend's JSON exactly; a missing rating renders as "Unknown".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub name: String,
    pub native: Option<String>,
    pub rosetta_2: Option<String>,
    pub crossover: Option<String>,
    pub wine: Option<String>,
    pub parallels: Option<String>,
    pub linux_arm: Option<String>,
}

impl GameRecord {
    fn status(&self, layer: CompatLayer) -> &str {
        let value = match layer {
            CompatLayer::Native => &self.native,
            CompatLayer::Rosetta2 => &self.rosetta_2,
            CompatLayer::Crossover => &self.crossover,
            CompatLayer::Wine => &self.wine,
            CompatLayer::Parallels => &self.parallels,
            CompatLayer::LinuxArm => &self.linux_arm,
        };
        value.as_deref().unwrap_or("Unknown")
    }
}

/// Which columns the report includes. Toggles only filter the canonical
/// order, they never reorder it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnSelection {
    pub native: bool,
    pub rosetta_2: bool,
    pub crossover: bool,
    pub wine: bool,
    pub parallels: bool,
    pub linux_arm: bool,
}

impl Default for ColumnSelection {
    fn default() -> Self {
        Self {
            native: true,
            rosetta_2: true,
            crossover: true,
            wine: true,
            parallels: true,
            linux_arm: true,
        }
    }
}

impl ColumnSelection {
    fn is_active(&self, layer: CompatLayer) -> bool {
        match layer {
            CompatLayer::Native => self.native,
            CompatLayer::Rosetta2 => self.rosetta_2,
            CompatLayer::Crossover => self.crossover,
            CompatLayer::Wine => self.wine,
            CompatLayer::Parallels => self.parallels,
            CompatLayer::LinuxArm => self.linux_arm,
        }
    }

    fn active_layers(&self) -> impl Iterator<Item = CompatLayer> + '_ {
        CompatLayer::ALL
            .into_iter()
            .filter(|layer| self.is_active(*layer))
    }
}

/// Render the fixed-width compatibility report. Pure: identical inputs
/// produce byte-identical output.
pub fn render(username: &str, games: &[GameRecord], selection: ColumnSelection) -> String {
    let rule = "-".repeat(RULE_WIDTH);

    let mut out = format!("Compatibility information for {username}'s Steam games:\n");
    out.push_str(&rule);
    out.push('\n');

    let mut header = pad("Game Name", NAME_WIDTH);
    for layer in selection.active_layers() {
        header.push_str(&pad(layer.label(), STATUS_WIDTH));
    }
    out.push_str(&header);
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');

    for game in games {
        let name: String = game.name.chars().take(NAME_WIDTH - 1).collect();
        let mut row = pad(&name, NAME_WIDTH);
        for layer in selection.active_layers() {
            row.push_str(&pad(game.status(layer), STATUS_WIDTH));
        }
        out.push_str(&row);
        out.push('\n');
    }

    out
}

fn pad(value: &str, width: usize) -> String {
    // Pads but never truncates, matching the header/status columns.
    format!("{value:<width$}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(name: &str, native: Option<&str>, wine: Option<&str>) -> GameRecord {
        GameRecord {
            name: name.to_string(),
            native: native.map(String::from),
            rosetta_2: None,
            crossover: None,
            wine: wine.map(String::from),
            parallels: None,
            linux_arm: None,
        }
    }

    fn only_native() -> ColumnSelection {
        ColumnSelection {
            native: true,
            rosetta_2: false,
            crossover: false,
            wine: false,
            parallels: false,
            linux_arm: false,
        }
    }

    #[test]
    fn empty_list_renders_header_only() {
        let out = render("alice", &[], ColumnSelection::default());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Compatibility information for alice's Steam games:");
        assert_eq!(lines[1], "-".repeat(80));
        assert!(lines[2].starts_with("Game Name"));
        assert_eq!(lines[3], "-".repeat(80));
    }

    #[test]
    fn header_follows_canonical_order_not_toggle_order() {
        let selection = ColumnSelection {
            native: false,
            rosetta_2: true,
            crossover: false,
            wine: true,
            parallels: false,
            linux_arm: true,
        };
        let out = render("bob", &[], selection);
        let header = out.lines().nth(2).unwrap();
        assert_eq!(
            header,
            format!("{:<40}{:<10}{:<10}{:<10}", "Game Name", "Rosetta 2", "Wine", "Linux ARM")
        );
    }

    #[test]
    fn one_row_per_game_in_input_order() {
        let games = vec![
            game("Zeta", Some("Yes"), None),
            game("Alpha", None, Some("Gold")),
            game("Mid", None, None),
        ];
        let out = render("carol", &games, ColumnSelection::default());
        let rows: Vec<&str> = out.lines().skip(4).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with("Zeta"));
        assert!(rows[1].starts_with("Alpha"));
        assert!(rows[2].starts_with("Mid"));
    }

    #[test]
    fn missing_rating_renders_unknown() {
        let games = vec![game("Portal", None, None)];
        let out = render("dave", &games, only_native());
        let row = out.lines().nth(4).unwrap();
        assert_eq!(row, format!("{:<40}{:<10}", "Portal", "Unknown"));
    }

    #[test]
    fn single_native_column_example() {
        let games = vec![game("Half-Life", Some("Platinum"), None)];
        let out = render("alice", &games, only_native());
        let header = out.lines().nth(2).unwrap();
        assert_eq!(header, format!("{:<40}{:<10}", "Game Name", "Native"));
        assert!(!header.contains("Rosetta"));
        let row = out.lines().nth(4).unwrap();
        assert_eq!(row, format!("{:<40}{:<10}", "Half-Life", "Platinum"));
    }

    #[test]
    fn long_names_truncate_to_39_then_pad_to_40() {
        let long = "A".repeat(60);
        let games = vec![game(&long, Some("Yes"), None)];
        let out = render("erin", &games, only_native());
        let row = out.lines().nth(4).unwrap();
        assert!(row.starts_with(&"A".repeat(39)));
        assert_eq!(&row[39..40], " ");
        assert_eq!(row.len(), 50);
    }

    #[test]
    fn render_is_deterministic() {
        let games = vec![game("Hades", Some("Native"), Some("Gold"))];
        let selection = ColumnSelection::default();
        assert_eq!(
            render("frank", &games, selection),
            render("frank", &games, selection)
        );
    }
}
