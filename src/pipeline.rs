use std::path::Path;

use crate::data::aggregate::{group_means, AggregatedTable};
use crate::data::loader::load_file;
use crate::data::schema::Schema;
use crate::error::{PipelineError, Result};

/// Load `path`, tag its columns, and average every numeric column per value
/// of `key`.
///
/// The grouping column is checked against the header before any row is
/// aggregated. An aggregation without rows or without numeric columns fails
/// with [`PipelineError::EmptyResult`] since there is nothing to plot.
pub fn aggregate_file(path: &Path, key: &str, delimiter: Option<u8>) -> Result<AggregatedTable> {
    let table = load_file(path, delimiter)?;
    if table.is_empty() {
        log::warn!("{} has a header but no rows", path.display());
    }
    let schema = Schema::infer(&table);
    schema.require(key)?;

    for col in &schema.columns {
        log::debug!("column '{}': {}", col.name, col.kind);
    }

    let numeric = schema.numeric_columns(key);
    if numeric.is_empty() {
        return Err(PipelineError::EmptyResult {
            column: key.to_string(),
            reason: "the table has no numeric columns".to_string(),
        });
    }

    let aggregated = group_means(&table, &schema, &numeric, key)?;
    log::info!("Mean values by '{key}':\n{}", aggregated.pretty());
    Ok(aggregated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv(contents: &str) -> NamedTempFile {
        let mut tmp = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(tmp, "{contents}").unwrap();
        tmp
    }

    const SAMPLE: &str = "\
Species,Continent,Model,Current,SSP245_2050,Native
A. alba,Asia,maxent,0.8,0.7,true
B. nigra,Asia,maxent,0.6,,false
C. rubra,Europe,gbm,0.4,0.2,true
D. alba,Africa,gbm,,,false
";

    #[test]
    fn continent_means() {
        let tmp = csv(SAMPLE);
        let agg = aggregate_file(tmp.path(), "Continent", None).unwrap();

        assert_eq!(agg.key_column, "Continent");
        assert_eq!(agg.groups, ["Africa", "Asia", "Europe"]);
        assert_eq!(agg.columns, ["Current", "SSP245_2050"]);

        assert_abs_diff_eq!(agg.get("Asia", "Current").unwrap(), 0.7, epsilon = 1e-9);
        assert_abs_diff_eq!(agg.get("Asia", "SSP245_2050").unwrap(), 0.7, epsilon = 1e-9);
        assert_abs_diff_eq!(agg.get("Europe", "SSP245_2050").unwrap(), 0.2, epsilon = 1e-9);
        assert!(agg.get("Africa", "Current").unwrap().is_nan());
        assert!(agg.get("Africa", "SSP245_2050").unwrap().is_nan());
    }

    #[test]
    fn running_twice_gives_identical_tables() {
        let tmp = csv(SAMPLE);
        let first = aggregate_file(tmp.path(), "Continent", None).unwrap();
        let second = aggregate_file(tmp.path(), "Continent", None).unwrap();
        // NaN != NaN, so compare the printed form as well as the labels.
        assert_eq!(first.groups, second.groups);
        assert_eq!(first.columns, second.columns);
        assert_eq!(first.pretty(), second.pretty());
    }

    #[test]
    fn nan_spellings_count_as_missing() {
        let tmp = csv("Continent,Current\nAsia,0.8\nAsia,NAN\nAsia,0.6\nEurope,+nan\n");
        let agg = aggregate_file(tmp.path(), "Continent", None).unwrap();
        assert_abs_diff_eq!(agg.get("Asia", "Current").unwrap(), 0.7, epsilon = 1e-9);
        assert!(agg.get("Europe", "Current").unwrap().is_nan());
    }

    #[test]
    fn short_rows_are_padded() {
        let tmp = csv("Continent,Current,Future\nAsia,0.8,0.4\nAsia,0.6\n");
        let agg = aggregate_file(tmp.path(), "Continent", None).unwrap();
        assert_abs_diff_eq!(agg.get("Asia", "Current").unwrap(), 0.7, epsilon = 1e-9);
        assert_abs_diff_eq!(agg.get("Asia", "Future").unwrap(), 0.4, epsilon = 1e-9);
    }

    #[test]
    fn missing_file() {
        let err = aggregate_file(Path::new("/nonexistent/suitability.csv"), "Continent", None)
            .unwrap_err();
        assert!(matches!(err, PipelineError::FileAccess { .. }), "{err:?}");
    }

    #[test]
    fn missing_key_column() {
        let tmp = csv("Species,Current\nA. alba,0.5\n");
        let err = aggregate_file(tmp.path(), "Continent", None).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { .. }), "{err:?}");
    }

    #[test]
    fn no_numeric_columns() {
        let tmp = csv("Species,Continent\nA. alba,Asia\n");
        let err = aggregate_file(tmp.path(), "Continent", None).unwrap_err();
        assert!(err.to_string().contains("no numeric columns"), "{err}");
    }

    #[test]
    fn header_only_file_is_empty_result() {
        let tmp = csv("Continent,Current\n");
        let err = aggregate_file(tmp.path(), "Continent", None).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyResult { .. }), "{err:?}");
    }
}
