use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use super::tables::REQUIRED_TABLES;
use crate::industry::{Activity, Blueprint, BlueprintMaterial, BlueprintResolver, TypeId};
use crate::transport::SystemLocator;

/// Read-only view over an SDE database built by `eve-sde-to-sqlite`
pub struct SdeDatabase {
    conn: Connection,
}

impl SdeDatabase {
    pub fn open(db_path: &Path) -> Result<Self> {
        if !db_path.exists() {
            bail!("SDE database not found: {:?}", db_path);
        }
        let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("Failed to open SDE database: {:?}", db_path))?;
        Self::from_connection(conn)
    }

    /// Wrap an open connection after checking its schema
    pub fn from_connection(conn: Connection) -> Result<Self> {
        let db = Self { conn };
        db.check_schema()?;
        Ok(db)
    }

    /// Fail unless every table and column the planner queries exists
    fn check_schema(&self) -> Result<()> {
        for table in REQUIRED_TABLES {
            let mut stmt = self
                .conn
                .prepare("SELECT name FROM pragma_table_info(?1)")?;
            let present: HashSet<String> = stmt
                .query_map([table.name], |row| row.get(0))?
                .collect::<rusqlite::Result<_>>()?;

            if present.is_empty() {
                bail!("SDE database is missing table: {}", table.name);
            }
            for col in table.columns {
                if !present.contains(col.name) {
                    bail!("SDE table {} is missing column: {}", table.name, col.name);
                }
            }
        }
        debug!(tables = REQUIRED_TABLES.len(), "SDE schema verified");
        Ok(())
    }

    fn materials(
        &self,
        blueprint_id: TypeId,
        activity: Activity,
    ) -> Result<Vec<BlueprintMaterial>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT type_id, quantity FROM blueprint_materials
             WHERE blueprint_id = ?1 AND activity = ?2
             ORDER BY type_id",
        )?;
        let rows = stmt.query_map(params![blueprint_id, activity.sde_name()], |row| {
            Ok(BlueprintMaterial {
                type_id: row.get(0)?,
                quantity: row.get::<_, i64>(1)?.max(0) as u64,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read blueprint materials")
    }
}

impl BlueprintResolver for SdeDatabase {
    fn blueprint(&self, blueprint_id: TypeId, activity: Activity) -> Result<Option<Blueprint>> {
        let time_column = match activity {
            Activity::Manufacturing => "manufacturing_time",
            Activity::Reaction => "reaction_time",
        };
        let header = self
            .conn
            .query_row(
                &format!(
                    "SELECT {}, max_production_limit FROM blueprints WHERE id = ?1",
                    time_column
                ),
                [blueprint_id],
                |row| Ok((row.get::<_, Option<i64>>(0)?, row.get::<_, Option<i64>>(1)?)),
            )
            .optional()
            .with_context(|| format!("Failed to query blueprint {}", blueprint_id))?;
        let Some((Some(time), max_runs)) = header else {
            return Ok(None);
        };

        let product = self
            .conn
            .query_row(
                "SELECT type_id, quantity FROM blueprint_products
                 WHERE blueprint_id = ?1 AND activity = ?2
                 ORDER BY type_id LIMIT 1",
                params![blueprint_id, activity.sde_name()],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()
            .with_context(|| format!("Failed to query products of blueprint {}", blueprint_id))?;
        let Some((product_type_id, output)) = product else {
            return Ok(None);
        };

        Ok(Some(Blueprint {
            blueprint_id,
            activity,
            product_type_id,
            output_per_run: output.max(1) as u64,
            base_time_secs: time.max(0) as u64,
            max_runs_per_job: max_runs.filter(|&m| m > 0).map(|m| m as u64),
            materials: self.materials(blueprint_id, activity)?,
        }))
    }

    fn blueprint_for_product(&self, product_type_id: TypeId) -> Result<Option<Blueprint>> {
        let found = self
            .conn
            .query_row(
                "SELECT blueprint_id, activity FROM blueprint_products
                 WHERE type_id = ?1 AND activity IN ('manufacturing', 'reaction')
                 ORDER BY blueprint_id LIMIT 1",
                [product_type_id],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
            .with_context(|| format!("Failed to find blueprint for type {}", product_type_id))?;

        match found {
            Some((blueprint_id, activity)) => {
                let activity = if activity == Activity::Reaction.sde_name() {
                    Activity::Reaction
                } else {
                    Activity::Manufacturing
                };
                self.blueprint(blueprint_id, activity)
            }
            None => Ok(None),
        }
    }

    fn type_volume(&self, type_id: TypeId) -> Result<f64> {
        let volume = self
            .conn
            .query_row(
                "SELECT COALESCE(packaged_volume, volume, 0.0) FROM types WHERE id = ?1",
                [type_id],
                |row| row.get::<_, f64>(0),
            )
            .optional()
            .with_context(|| format!("Failed to query volume of type {}", type_id))?;
        Ok(volume.unwrap_or(0.0))
    }
}

impl SystemLocator for SdeDatabase {
    fn system_position(&self, system_id: i64) -> Result<Option<[f64; 3]>> {
        let position = self
            .conn
            .query_row(
                "SELECT position_x, position_y, position_z FROM map_solar_systems WHERE id = ?1",
                [system_id],
                |row| {
                    Ok((
                        row.get::<_, Option<f64>>(0)?,
                        row.get::<_, Option<f64>>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                    ))
                },
            )
            .optional()
            .with_context(|| format!("Failed to query solar system {}", system_id))?;

        Ok(match position {
            Some((Some(x), Some(y), Some(z))) => Some([x, y, z]),
            _ => None,
        })
    }
}
