use analytics::{Numeraire, PerformanceRow, Quote, RoundingPolicy};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use core_types::Asset;
use engine::{ComparisonOutcome, ExcludedAsset};
use rust_decimal::Decimal;

const NOT_AVAILABLE: &str = "n/a";

/// Renders the comparison as one row per asset, three column groups per row.
pub fn performance_table(outcome: &ComparisonOutcome, policy: &RoundingPolicy) -> Table {
    let groups = [
        (Numeraire::Native, outcome.vs_currency.to_uppercase()),
        (Numeraire::PivotA, outcome.table.pivot_a.symbol.clone()),
        (Numeraire::PivotB, outcome.table.pivot_b.symbol.clone()),
    ];

    let mut header = vec![Cell::new("Asset")];
    for (_, unit) in &groups {
        header.push(Cell::new(format!("Start ({unit})")));
        header.push(Cell::new(format!("End ({unit})")));
        header.push(Cell::new(format!("% ({unit})")));
    }

    let mut table = new_table();
    table.set_header(header);
    for row in outcome.table.rounded_rows(policy) {
        table.add_row(row_cells(&row, &groups));
    }
    table
}

fn row_cells(row: &PerformanceRow, groups: &[(Numeraire, String)]) -> Vec<Cell> {
    let mut cells = vec![Cell::new(&row.symbol)];
    for (numeraire, _) in groups {
        let quote: &Quote = row.quote(*numeraire);
        cells.push(number(quote.start));
        cells.push(number(quote.end));
        cells.push(Cell::new(change(quote.change_pct)).set_alignment(CellAlignment::Right));
    }
    cells
}

/// Lists the assets dropped from the comparison and why.
pub fn excluded_assets(excluded: &[ExcludedAsset]) -> String {
    let mut lines = vec![format!("Excluded ({}):", excluded.len())];
    for entry in excluded {
        let reasons: Vec<String> = entry
            .failures
            .iter()
            .map(|f| format!("{}: {}", f.side, f.reason))
            .collect();
        let reasons = if reasons.is_empty() {
            "missing price".to_string()
        } else {
            reasons.join("; ")
        };
        lines.push(format!("  {} ({}) - {}", entry.asset.symbol, entry.asset.id, reasons));
    }
    lines.join("\n")
}

/// The ranked listing, in provider order.
pub fn listing(assets: &[Asset]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["#", "Symbol", "Id"]);
    for (rank, asset) in assets.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1).set_alignment(CellAlignment::Right),
            Cell::new(&asset.symbol),
            Cell::new(asset.id.as_str()),
        ]);
    }
    table
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn number(value: Decimal) -> Cell {
    Cell::new(value.normalize()).set_alignment(CellAlignment::Right)
}

fn change(change_pct: Option<Decimal>) -> String {
    match change_pct {
        Some(pct) if pct > Decimal::ZERO => format!("+{pct:.2}"),
        Some(pct) => format!("{pct:.2}"),
        None => NOT_AVAILABLE.to_string(),
    }
}
