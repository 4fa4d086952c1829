//! SQLite persistence for derived feature rows and tendency tables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};

use crate::error::FeatureWarning;
use crate::features::{FEATURE_SCHEMA, FeatureRow, FeatureTable};
use crate::tendency::TeamTendencies;

pub fn default_db_path() -> Option<PathBuf> {
    std::env::var("PBP_DB")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    let feature_columns = FEATURE_SCHEMA
        .iter()
        .map(|name| format!("            {} REAL NULL,", quote_ident(name)))
        .collect::<Vec<_>>()
        .join("\n");

    conn.execute_batch(&format!(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS play_features (
            game_id TEXT NOT NULL,
            play_id INTEGER NOT NULL,
            season INTEGER NOT NULL,
{feature_columns}
            PRIMARY KEY (game_id, play_id)
        );
        CREATE INDEX IF NOT EXISTS idx_play_features_season ON play_features(season);
        CREATE TABLE IF NOT EXISTS team_tendencies (
            team TEXT NOT NULL,
            season INTEGER NOT NULL,
            statistic TEXT NOT NULL,
            value REAL NULL,
            PRIMARY KEY (team, season, statistic)
        );
        CREATE TABLE IF NOT EXISTS feature_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            finished_at TEXT NOT NULL,
            rows_written INTEGER NOT NULL,
            digest TEXT NOT NULL,
            warnings_json TEXT NOT NULL
        );
        "#
    ))
    .context("init sqlite schema")?;
    Ok(())
}

fn real_or_null(v: f64) -> Value {
    if v.is_finite() {
        Value::Real(v)
    } else {
        Value::Null
    }
}

/// Upserts every row in one transaction. Non-finite values are stored as NULL.
pub fn write_feature_table(conn: &mut Connection, table: &FeatureTable) -> Result<usize> {
    let columns = table.schema();
    let quoted: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
    let placeholders = (1..=columns.len() + 3)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let updates = quoted
        .iter()
        .map(|c| format!("{c} = excluded.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO play_features (game_id, play_id, season, {})
         VALUES ({placeholders})
         ON CONFLICT(game_id, play_id) DO UPDATE SET season = excluded.season, {updates}",
        quoted.join(", ")
    );

    let tx = conn.transaction().context("begin feature transaction")?;
    let mut written = 0usize;
    {
        let mut stmt = tx.prepare(&sql).context("prepare feature upsert")?;
        for row in table.rows() {
            let mut values = Vec::with_capacity(row.values.len() + 3);
            values.push(Value::Text(row.game_id.clone()));
            values.push(Value::Integer(row.play_id));
            values.push(Value::Integer(i64::from(row.season)));
            values.extend(row.values.iter().copied().map(real_or_null));
            stmt.execute(params_from_iter(values))
                .with_context(|| format!("upsert play {} {}", row.game_id, row.play_id))?;
            written += 1;
        }
    }
    tx.commit().context("commit feature transaction")?;
    Ok(written)
}

pub fn write_tendencies(conn: &mut Connection, tendencies: &TeamTendencies) -> Result<usize> {
    let tx = conn.transaction().context("begin tendency transaction")?;
    let mut written = 0usize;
    {
        let mut stmt = tx
            .prepare(
                r#"
                INSERT INTO team_tendencies (team, season, statistic, value)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(team, season, statistic) DO UPDATE SET value = excluded.value
                "#,
            )
            .context("prepare tendency upsert")?;
        for table in tendencies.tables() {
            for entry in table.entries() {
                stmt.execute(params![
                    entry.team,
                    entry.season,
                    table.statistic(),
                    real_or_null(entry.value),
                ])
                .context("upsert tendency")?;
                written += 1;
            }
        }
    }
    tx.commit().context("commit tendency transaction")?;
    Ok(written)
}

pub fn record_run(
    conn: &Connection,
    rows_written: usize,
    digest: &str,
    warnings: &[FeatureWarning],
) -> Result<i64> {
    let warnings_json = serde_json::to_string(warnings).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "INSERT INTO feature_runs (finished_at, rows_written, digest, warnings_json)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            Utc::now().to_rfc3339(),
            rows_written as i64,
            digest,
            warnings_json
        ],
    )
    .context("insert feature run")?;
    Ok(conn.last_insert_rowid())
}

/// Loads stored rows for one game, NULL read back as NaN.
pub fn load_game_features(conn: &Connection, game_id: &str) -> Result<Vec<FeatureRow>> {
    let quoted: Vec<String> = FEATURE_SCHEMA.iter().map(|c| quote_ident(c)).collect();
    let sql = format!(
        "SELECT game_id, play_id, season, {} FROM play_features WHERE game_id = ?1 ORDER BY play_id ASC",
        quoted.join(", ")
    );
    let mut stmt = conn.prepare(&sql).context("prepare feature load")?;
    let width = FEATURE_SCHEMA.len();
    let rows = stmt
        .query_map(params![game_id], |row| {
            let mut values = Vec::with_capacity(width);
            for idx in 0..width {
                values.push(row.get::<_, Option<f64>>(idx + 3)?.unwrap_or(f64::NAN));
            }
            Ok(FeatureRow {
                game_id: row.get(0)?,
                play_id: row.get(1)?,
                season: row.get(2)?,
                values,
            })
        })
        .context("query play features")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("read play features")?;
    Ok(rows)
}

pub fn load_tendency_value(
    conn: &Connection,
    team: &str,
    season: i32,
    statistic: &str,
) -> Result<Option<f64>> {
    let mut stmt = conn
        .prepare(
            "SELECT value FROM team_tendencies WHERE team = ?1 AND season = ?2 AND statistic = ?3",
        )
        .context("prepare tendency load")?;
    let mut rows = stmt
        .query(params![team, season, statistic])
        .context("query tendency")?;
    let value = match rows.next().context("read tendency row")? {
        Some(row) => row.get::<_, Option<f64>>(0)?,
        None => None,
    };
    Ok(value)
}
