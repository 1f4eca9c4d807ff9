use console::{Alignment, Style, measure_text_width, pad_str};

use cftrack_core::history::HistoricalPoint;
use cftrack_core::rank::title_case;
use cftrack_core::{DiffResult, RankTransition};

/// Terminal styles, built once at startup and passed to every renderer.
pub struct Theme {
    newbie: Style,
    pupil: Style,
    specialist: Style,
    expert: Style,
    candidate_master: Style,
    master: Style,
    grandmaster: Style,
    unknown: Style,
    positive: Style,
    negative: Style,
    pub heading: Style,
}

impl Theme {
    pub fn colored() -> Self {
        Self {
            newbie: Style::new().black().bright(),
            pupil: Style::new().green().bright(),
            specialist: Style::new().cyan().bright(),
            expert: Style::new().blue().bright(),
            candidate_master: Style::new().magenta().bright(),
            master: Style::new().yellow().bright(),
            grandmaster: Style::new().red().bright(),
            unknown: Style::new(),
            positive: Style::new().green().bright(),
            negative: Style::new().red().bright(),
            heading: Style::new().bold(),
        }
    }

    pub fn plain() -> Self {
        Self {
            newbie: Style::new(),
            pupil: Style::new(),
            specialist: Style::new(),
            expert: Style::new(),
            candidate_master: Style::new(),
            master: Style::new(),
            grandmaster: Style::new(),
            unknown: Style::new(),
            positive: Style::new(),
            negative: Style::new(),
            heading: Style::new(),
        }
    }

    fn rank_style(&self, rank: &str) -> &Style {
        match rank.to_lowercase().as_str() {
            "newbie" => &self.newbie,
            "pupil" => &self.pupil,
            "specialist" => &self.specialist,
            "expert" => &self.expert,
            "candidate master" => &self.candidate_master,
            "master" | "international master" => &self.master,
            "grandmaster" | "international grandmaster" | "legendary grandmaster" => {
                &self.grandmaster
            }
            _ => &self.unknown,
        }
    }

    pub fn rank(&self, rank: &str) -> String {
        self.rank_style(rank).apply_to(rank).to_string()
    }

    pub fn change(&self, delta: i64) -> String {
        if delta > 0 {
            self.positive.apply_to(format!("+{delta}")).to_string()
        } else if delta < 0 {
            self.negative.apply_to(delta).to_string()
        } else {
            "0".to_string()
        }
    }

    pub fn transition(&self, transition: RankTransition) -> String {
        match transition {
            RankTransition::Up => format!(" {}", self.positive.apply_to("↑")),
            RankTransition::Down => format!(" {}", self.negative.apply_to("↓")),
            RankTransition::Unchanged => String::new(),
        }
    }
}

/// Left-aligned columns sized to the widest cell, ANSI codes excluded.
pub fn table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| measure_text_width(h)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(measure_text_width(cell));
            }
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| pad_str(cell, *w, Alignment::Left, None).into_owned())
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    let mut out = vec![line(headers), "-".repeat(total)];
    out.extend(rows.iter().map(|r| line(r.as_slice())));
    out.join("\n")
}

pub fn diff_table(theme: &Theme, results: &[DiffResult]) -> String {
    let headers = ["Handle", "Rating", "Change", "Rank", "Max Rating", "Last Updated"]
        .map(String::from);
    let rows: Vec<Vec<String>> = results
        .iter()
        .map(|r| {
            vec![
                r.handle.clone(),
                r.rating.to_string(),
                theme.change(r.rating_change),
                format!("{}{}", theme.rank(&r.rank), theme.transition(r.rank_transition)),
                r.max_rating.to_string(),
                r.last_updated.format("%Y-%m-%d %H:%M").to_string(),
            ]
        })
        .collect();
    table(&headers, &rows)
}

pub fn history_table(
    theme: &Theme,
    years: &[i32],
    rows: &[(String, Vec<HistoricalPoint>)],
) -> String {
    let mut headers = vec!["Handle".to_string()];
    for year in years {
        headers.push(year.to_string());
        headers.push("Contest Date".to_string());
    }

    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|(handle, points)| {
            let mut row = vec![handle.clone()];
            for year in years {
                match points
                    .iter()
                    .find(|p| p.year == *year)
                    .and_then(|p| p.entry.as_ref())
                {
                    Some(entry) => {
                        let rank = title_case(entry.rank());
                        row.push(format!("{} ({})", entry.new_rating, theme.rank(&rank)));
                        row.push(entry.contest_date());
                    }
                    None => row.extend(["N/A".to_string(), "N/A".to_string()]),
                }
            }
            row
        })
        .collect();
    table(&headers, &rows)
}
