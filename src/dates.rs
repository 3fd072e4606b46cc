//! Grouping search results by calendar date.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Result};
use chrono::DateTime;
use serde_json::Value;

/// Date (YYYY-MM-DD) to the cloud cover of every scene acquired that day.
pub type DateClouds = BTreeMap<String, Vec<f64>>;

/// Get the dates and cloud cover(s) for each item in the results obtained
/// via the `search` command.
pub fn extract_dates(result_file: &Path) -> Result<DateClouds> {
    let data: Value = serde_json::from_str(&fs::read_to_string(result_file)?)?;
    let features = data["features"]
        .as_array()
        .ok_or_else(|| anyhow!("`{}` has no features", result_file.display()))?;

    group_by_date(features)
}

/// Group scene features by the calendar date of their acquisition.
pub fn group_by_date(features: &[Value]) -> Result<DateClouds> {
    let mut all_dates = DateClouds::new();

    for feature in features {
        let props = &feature["properties"];
        let datetime = props["datetime"]
            .as_str()
            .ok_or_else(|| anyhow!("feature without a datetime"))?;
        let day = DateTime::parse_from_rfc3339(datetime)?.date_naive().to_string();
        let cloud = props["eo:cloud_cover"]
            .as_f64()
            .ok_or_else(|| anyhow!("feature without eo:cloud_cover"))?;

        all_dates.entry(day).or_default().push(cloud);
    }

    Ok(all_dates)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    values.iter().sum::<f64>() / values.len() as f64
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn feature(datetime: &str, cloud: f64) -> Value {
        json!({ "properties": { "datetime": datetime, "eo:cloud_cover": cloud } })
    }

    #[test]
    fn should_group_scenes_by_day() {
        let features = vec![
            feature("2017-11-24T19:01:22Z", 43.1),
            feature("2017-11-24T19:01:22Z", 12.0),
            feature("2017-12-04T19:02:10Z", 88.5),
        ];

        let grouped = group_by_date(&features).unwrap();

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["2017-11-24"], vec![43.1, 12.0]);
        assert_eq!(grouped["2017-12-04"], vec![88.5]);
    }

    #[test]
    fn should_sort_dates_ascending() {
        let features = vec![
            feature("2018-01-01T19:00:00Z", 1.0),
            feature("2017-01-01T19:00:00Z", 2.0),
        ];

        let grouped = group_by_date(&features).unwrap();
        let dates: Vec<_> = grouped.keys().collect();

        assert_eq!(dates, vec!["2017-01-01", "2018-01-01"]);
    }

    #[test]
    fn should_fail_on_feature_without_datetime() {
        let features = vec![json!({ "properties": { "eo:cloud_cover": 1.0 } })];

        assert!(group_by_date(&features).is_err());
    }

    #[test]
    fn should_average_cloud_cover() {
        assert_eq!(mean(&[10.0, 20.0, 30.0]), 20.0);
        assert_eq!(mean(&[]), 0.0);
    }
}
