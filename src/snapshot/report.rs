//! Rendering snapshots in display units and writing them out as CSV.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use super::units::{to_display, to_display_signed};
use crate::error::SnapshotError;
use crate::models::{BalanceKind, DailySnapshot, SnapshotRow};

pub fn render_row(snapshot: &DailySnapshot, decimals: u8) -> Result<SnapshotRow, SnapshotError> {
    let components = snapshot
        .components
        .iter()
        .map(|(kind, balance)| -> Result<(String, String), SnapshotError> {
            Ok((kind.label().to_string(), to_display(*balance, decimals)?))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SnapshotRow {
        date: snapshot.date.format("%Y-%m-%d").to_string(),
        block_number: snapshot.block_number,
        components,
        user_balance: to_display_signed(snapshot.user_balance, decimals)?,
        own_balance: to_display(snapshot.own_balance, decimals)?,
        total: to_display(snapshot.total, decimals)?,
    })
}

pub fn render_rows(snapshots: &[DailySnapshot], decimals: u8) -> Result<Vec<SnapshotRow>, SnapshotError> {
    snapshots
        .iter()
        .map(|snapshot| render_row(snapshot, decimals))
        .collect()
}

pub fn header(components: &[BalanceKind]) -> Vec<&'static str> {
    let mut columns = vec!["Date", "Block Number"];
    columns.extend(components.iter().map(BalanceKind::label));
    columns.extend(["Users Balance", "Our Balance", "Total Balance"]);
    columns
}

pub fn write_csv<W: Write>(
    out: &mut W,
    components: &[BalanceKind],
    rows: &[SnapshotRow],
) -> std::io::Result<()> {
    writeln!(out, "{}", header(components).join(","))?;

    for row in rows {
        let mut fields = vec![row.date.clone(), row.block_number.to_string()];
        fields.extend(row.components.iter().map(|(_, value)| value.clone()));
        fields.extend([
            row.user_balance.clone(),
            row.own_balance.clone(),
            row.total.clone(),
        ]);
        writeln!(out, "{}", fields.join(","))?;
    }

    out.flush()
}

pub fn write_csv_file(
    path: &Path,
    components: &[BalanceKind],
    rows: &[SnapshotRow],
) -> Result<(), SnapshotError> {
    let mut out = BufWriter::new(File::create(path)?);
    write_csv(&mut out, components, rows)?;
    info!("Wrote {} rows to {:?}", rows.len(), path);
    Ok(())
}
