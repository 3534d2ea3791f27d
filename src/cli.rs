use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "mocap_viewer")]
#[command(about = "Plays back motion capture recordings and edits per-sensor calibration")]
pub struct Args {
    /// Directory holding `setting.json`, `datasets/` and `calibration/`
    #[arg(short = 'd', long, default_value = "./data")]
    pub data_dir: PathBuf,

    /// Dataset to load on startup (file name without `.json`)
    #[arg(long)]
    pub dataset: Option<String>,

    /// Start with playback paused
    #[arg(long)]
    pub paused: bool,
}

impl From<Args> for app::RunArgs {
    fn from(args: Args) -> Self {
        Self {
            data_dir: args.data_dir,
            dataset: args.dataset,
            paused: args.paused,
        }
    }
}
