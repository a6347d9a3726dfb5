use rusqlite::Connection;

use super::Migration;
use crate::error::Result;

pub struct V2MergeTracking;

impl Migration for V2MergeTracking {
    fn version(&self) -> u32 {
        2
    }

    fn description(&self) -> &'static str {
        "Add contributions.merged_into and an index for modified-since scans"
    }

    fn up(&self, conn: &Connection) -> Result<()> {
        let has_merged_into: bool = conn
            .prepare("SELECT 1 FROM pragma_table_info('contributions') WHERE name='merged_into'")?
            .exists([])?;

        if !has_merged_into {
            conn.execute_batch(
                "
                ALTER TABLE contributions ADD COLUMN merged_into INTEGER;
                CREATE INDEX IF NOT EXISTS idx_contributions_merged_into ON contributions(merged_into);
                ",
            )?;
        }
        conn.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_sentences_modified ON sentences(modified);",
        )?;
        Ok(())
    }
}
