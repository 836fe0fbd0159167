use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::industry::{Activity, LocationId, MarketPrice, PriceSnapshot, TypeId};

/// One line of a price snapshot file
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceRecord {
    type_id: TypeId,
    buy: Option<f64>,
    sell: Option<f64>,
    adjusted: Option<f64>,
}

/// Parse one JSONL price line into the snapshot
pub fn parse_price_line(line: &str, snapshot: &mut PriceSnapshot) -> Result<()> {
    let record: PriceRecord = serde_json::from_str(line).context("Failed to parse JSON")?;

    if record.buy.is_some() || record.sell.is_some() {
        snapshot.market.insert(
            record.type_id,
            MarketPrice {
                buy: record.buy,
                sell: record.sell,
            },
        );
    }
    if let Some(adjusted) = record.adjusted {
        snapshot.adjusted.insert(record.type_id, adjusted);
    }
    Ok(())
}

/// Load a JSONL price snapshot, one type per line
pub fn load_prices(path: &Path) -> Result<PriceSnapshot> {
    let file = File::open(path).with_context(|| format!("Failed to open: {:?}", path))?;
    let reader = BufReader::new(file);
    let mut snapshot = PriceSnapshot::default();

    for (number, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read line")?;
        if line.trim().is_empty() {
            continue;
        }
        parse_price_line(&line, &mut snapshot)
            .with_context(|| format!("Bad price record at {:?}:{}", path, number + 1))?;
    }

    Ok(snapshot)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CostIndexRecord {
    location_id: LocationId,
    activity: Activity,
    cost_index: f64,
}

/// Load facility cost indices from a JSON array
pub fn load_cost_indices(path: &Path) -> Result<HashMap<(LocationId, Activity), f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read: {:?}", path))?;
    let records: Vec<CostIndexRecord> =
        serde_json::from_str(&text).with_context(|| format!("Failed to parse: {:?}", path))?;

    Ok(records
        .into_iter()
        .map(|r| ((r.location_id, r.activity), r.cost_index))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::industry::PriceBasis;
    use std::io::Write;

    #[test]
    fn test_parse_price_line() {
        let mut snapshot = PriceSnapshot::default();
        let line = r#"{"typeId": 34, "buy": 4.1, "sell": 4.9, "adjusted": 4.4}"#;
        parse_price_line(line, &mut snapshot).unwrap();
        parse_price_line(r#"{"typeId": 35, "adjusted": 9.0}"#, &mut snapshot).unwrap();

        assert_eq!(snapshot.unit_price(34, PriceBasis::Sell), Some(4.9));
        assert_eq!(snapshot.unit_price(35, PriceBasis::Sell), None);
        assert_eq!(snapshot.adjusted_price(35), 9.0);
    }

    #[test]
    fn test_one_sided_record_leaves_other_side_unpriced() {
        let mut snapshot = PriceSnapshot::default();
        parse_price_line(r#"{"typeId": 34, "sell": 5.0}"#, &mut snapshot).unwrap();

        assert_eq!(snapshot.unit_price(34, PriceBasis::Sell), Some(5.0));
        assert_eq!(snapshot.unit_price(34, PriceBasis::Buy), None);
    }

    #[test]
    fn test_load_prices_reports_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"typeId": 34, "sell": 5.0}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "not json").unwrap();

        let err = load_prices(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains(":3"));
    }

    #[test]
    fn test_load_cost_indices() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"locationId": 30000142, "activity": "manufacturing", "costIndex": 0.0712}}]"#
        )
        .unwrap();
        let indices = load_cost_indices(file.path()).unwrap();
        assert_eq!(indices[&(30000142, Activity::Manufacturing)], 0.0712);
    }
}
