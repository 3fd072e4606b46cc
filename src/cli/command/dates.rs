//! Group search results by calendar date.

use std::fs;

use anyhow::Result;

use crate::cli::DatesArgs;
use crate::dates::{extract_dates, mean};

pub fn dates(args: &DatesArgs) -> Result<String> {
    let all_dates = extract_dates(&args.results)?;

    for (date, clouds) in &all_dates {
        println!(
            "{}: {} scenes, {:.2}% mean cloud cover",
            date,
            clouds.len(),
            mean(clouds)
        );
    }

    if let Some(output) = &args.output {
        fs::write(output, serde_json::to_string_pretty(&all_dates)?)?;
        println!("wrote {}", output.display());
    }

    Ok(format!("{} dates with imagery", all_dates.len()))
}
