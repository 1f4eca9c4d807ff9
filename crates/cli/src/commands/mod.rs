pub mod export;
pub mod handles;
pub mod history;
pub mod track;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Command {
    /// Fetch current ratings and show changes since the last run
    Track(track::TrackArgs),
    /// Export the stored snapshot to CSV
    Export(export::ExportArgs),
    /// Show ratings nearest to a calendar date in past years
    History(history::HistoryArgs),
    /// Manage the handles file
    Handles(handles::HandlesArgs),
}
