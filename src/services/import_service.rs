//! Import Service
//!
//! Parses holdings exported as CSV by brokers or spreadsheets.

use crate::brokers::types::Holding;
use crate::error::{AppError, Result};
use serde::Serialize;

/// Result of parsing a holdings CSV
#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub holdings: Vec<Holding>,
    pub skipped: usize,
    pub errors: Vec<String>,
}

struct Columns {
    symbol: usize,
    exchange: Option<usize>,
    quantity: usize,
    average_price: usize,
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let h = h.trim().to_lowercase().replace([' ', '-'], "_");
        names.contains(&h.as_str())
    })
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let required = |names: &[&str], label: &str| {
            find_column(headers, names)
                .ok_or_else(|| AppError::Validation(format!("Missing '{}' column", label)))
        };

        Ok(Self {
            symbol: required(&["symbol", "ticker", "instrument"], "symbol")?,
            exchange: find_column(headers, &["exchange", "exch"]),
            quantity: required(&["quantity", "qty", "shares"], "quantity")?,
            average_price: required(
                &["average_price", "avg_price", "avg_cost", "price"],
                "average_price",
            )?,
        })
    }
}

/// Holdings CSV import
pub struct ImportService;

impl ImportService {
    /// Parse holdings CSV. A header row is required; columns are matched by
    /// name. Invalid rows are skipped and described in `errors`.
    pub fn parse_holdings_csv(csv_data: &str) -> Result<ImportResult> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(csv_data.as_bytes());

        let columns = Columns::from_headers(reader.headers()?)?;

        let mut holdings = Vec::new();
        let mut skipped = 0;
        let mut errors = Vec::new();

        for (index, result) in reader.records().enumerate() {
            // Header is line 1
            let line = index + 2;
            let record = result?;

            let symbol = record.get(columns.symbol).unwrap_or("");
            if symbol.is_empty() {
                errors.push(format!("Line {}: missing symbol", line));
                skipped += 1;
                continue;
            }

            let exchange = columns
                .exchange
                .and_then(|i| record.get(i))
                .unwrap_or("");

            let quantity: Option<f64> = record.get(columns.quantity).and_then(|s| s.parse().ok());
            let quantity = match quantity {
                Some(q) if q > 0.0 => q,
                _ => {
                    errors.push(format!("Line {}: invalid quantity for {}", line, symbol));
                    skipped += 1;
                    continue;
                }
            };

            let average_price: Option<f64> = record
                .get(columns.average_price)
                .map(|s| s.trim_start_matches(['$', '₹']).replace(',', ""))
                .and_then(|s| s.parse().ok());
            let average_price = match average_price {
                Some(p) if p >= 0.0 => p,
                _ => {
                    errors.push(format!("Line {}: invalid average price for {}", line, symbol));
                    skipped += 1;
                    continue;
                }
            };

            holdings.push(Holding::new(exchange, symbol, quantity, average_price));
        }

        tracing::info!(
            "Parsed holdings CSV: {} imported, {} skipped",
            holdings.len(),
            skipped
        );

        Ok(ImportResult {
            holdings,
            skipped,
            errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_holdings_csv() {
        let data = "Symbol,Exchange,Qty,Avg Price\n\
                    reliance,NSE,10,2450.5\n\
                    infy,,5,\"1,500\"\n\
                    ,NSE,1,100\n\
                    TCS,NSE,0,3500\n\
                    ITC,BSE,3,abc\n";

        let result = ImportService::parse_holdings_csv(data).unwrap();

        assert_eq!(result.holdings.len(), 2);
        assert_eq!(result.holdings[0].symbol, "RELIANCE");
        assert_eq!(result.holdings[0].quantity, 10.0);
        assert_eq!(result.holdings[0].average_price, 2450.5);
        assert_eq!(result.holdings[1].exchange, "NSE");
        assert_eq!(result.holdings[1].average_price, 1500.0);

        assert_eq!(result.skipped, 3);
        assert_eq!(
            result.errors,
            vec![
                "Line 4: missing symbol",
                "Line 5: invalid quantity for TCS",
                "Line 6: invalid average price for ITC",
            ]
        );
    }

    #[test]
    fn test_missing_required_column() {
        let err = ImportService::parse_holdings_csv("symbol,price\nSBIN,600\n").unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("quantity")));
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let result = ImportService::parse_holdings_csv("symbol,quantity,price\nSBIN,4\n").unwrap();
        assert!(result.holdings.is_empty());
        assert_eq!(result.skipped, 1);
    }
}
