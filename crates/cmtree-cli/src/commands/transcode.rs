//! Formula transcoding command

use clap::Args;
use cmtree_core::formula::transcode;
use cmtree_core::TranscodeMode;

#[derive(Debug, Args)]
pub struct TranscodeArgs {
    /// Formula of the form "(UI_VALUE + 140) * 2 / 1"
    #[arg(long)]
    pub formula: String,

    /// Direction: once, twice or reverse
    #[arg(long, default_value = "once")]
    pub mode: TranscodeMode,

    /// Fail instead of echoing values that cannot be transcoded
    #[arg(long)]
    pub strict: bool,

    /// Values to transcode
    #[arg(required = true, allow_hyphen_values = true)]
    pub values: Vec<String>,
}

pub fn execute(args: TranscodeArgs) -> Result<(), Box<dyn std::error::Error>> {
    for value in &args.values {
        let result = transcode(value, &args.formula, args.mode);
        if let Some(err) = &result.diagnostic {
            if args.strict {
                return Err(format!("cannot transcode '{}': {}", value, err).into());
            }
            eprintln!("warning: '{}' left unchanged: {}", value, err);
        }
        println!("{}", result.value);
    }
    Ok(())
}
