//! Command line: `prism <model.fbx> [--frames N] [--verbose]`

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "prism")]
#[command(about = "Import an FBX model and spin it through the component lifecycle")]
#[command(version)]
pub struct Args {
    /// FBX model to import (overrides `model_path` in settings.toml)
    pub model: Option<PathBuf>,

    /// Frames to simulate before exiting
    #[arg(short = 'n', long)]
    pub frames: Option<u32>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_and_flags_in_any_order() {
        let args = Args::try_parse_from(["prism", "--frames", "5", "cube.fbx", "-v"]).unwrap();
        assert_eq!(args.model, Some(PathBuf::from("cube.fbx")));
        assert_eq!(args.frames, Some(5));
        assert!(args.verbose);
    }

    #[test]
    fn no_arguments_is_valid() {
        assert_eq!(Args::try_parse_from(["prism"]).unwrap(), Args::default());
    }

    #[test]
    fn bad_input_is_reported() {
        assert!(Args::try_parse_from(["prism", "--frames"]).is_err());
        assert!(Args::try_parse_from(["prism", "--frames", "lots"]).is_err());
        assert!(Args::try_parse_from(["prism", "--fast"]).is_err());
        assert!(Args::try_parse_from(["prism", "a.fbx", "b.fbx"]).is_err());
    }

    #[test]
    fn definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
