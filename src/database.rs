use color_eyre::{Result, eyre::Context};
use migration::MigratorTrait;
use sea_orm::{
    ColumnTrait, Condition, ConnectOptions, ConnectionTrait, Database as SeaDatabase,
    DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use std::path::Path;
use std::time::Duration;

use crate::entities::library_item;
use crate::library::{Category, LibraryItem};
use crate::ports::snapshot::SnapshotStore;

// Keeps a single multi-row statement well below SQLite's bound parameter limit.
const WRITE_CHUNK_SIZE: usize = 100;

pub struct Database {
    pub conn: DatabaseConnection,
}

impl Database {
    /// Open or create a database at the given path
    pub async fn open(path: &Path) -> Result<Self> {
        log::debug!("Opening database at: {}", path.display());

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context(format!(
                "Failed to create database directory: {}",
                parent.display()
            ))?;
        }

        let url = format!("sqlite://{}?mode=rwc", path.display());

        let mut opt = ConnectOptions::new(url);
        opt.max_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .acquire_timeout(Duration::from_secs(8))
            .sqlx_logging(false);

        let conn = SeaDatabase::connect(opt)
            .await
            .context(format!("Failed to open database: {}", path.display()))?;

        log::debug!("Running database migrations");
        migration::Migrator::up(&conn, None)
            .await
            .context("Failed to run database migrations")?;

        log::info!("Database ready at: {}", path.display());
        Ok(Database { conn })
    }
}

async fn insert_items(conn: &impl ConnectionTrait, items: &[LibraryItem]) -> Result<u64> {
    let mut inserted = 0;
    for chunk in items.chunks(WRITE_CHUNK_SIZE) {
        let models = chunk.iter().map(library_item::ActiveModel::from_item);
        inserted += library_item::Entity::insert_many(models)
            .exec_without_returning(conn)
            .await
            .wrap_err("Failed to insert library items")?;
    }
    Ok(inserted)
}

async fn delete_items(conn: &impl ConnectionTrait, items: &[LibraryItem]) -> Result<u64> {
    let mut deleted = 0;
    for chunk in items.chunks(WRITE_CHUNK_SIZE) {
        let condition = chunk.iter().fold(Condition::any(), |condition, item| {
            condition.add(
                Condition::all()
                    .add(library_item::Column::SpotifyId.eq(item.id()))
                    .add(library_item::Column::Category.eq(item.category())),
            )
        });
        let result = library_item::Entity::delete_many()
            .filter(condition)
            .exec(conn)
            .await
            .wrap_err("Failed to delete library items")?;
        deleted += result.rows_affected;
    }
    Ok(deleted)
}

#[async_trait::async_trait]
impl SnapshotStore for Database {
    async fn read_all(&self, category: Category) -> Result<Vec<LibraryItem>> {
        let rows = library_item::Entity::find()
            .filter(library_item::Column::Category.eq(category))
            .order_by_asc(library_item::Column::CreatedAt)
            .order_by_asc(library_item::Column::SpotifyId)
            .all(&self.conn)
            .await
            .wrap_err_with(|| format!("Failed to read {} snapshot", category))?;

        log::debug!("Read {} {} item(s) from snapshot", rows.len(), category);
        Ok(rows.into_iter().map(LibraryItem::from).collect())
    }

    async fn insert_many(&self, items: &[LibraryItem]) -> Result<u64> {
        let inserted = insert_items(&self.conn, items).await?;
        log::debug!("Inserted {} snapshot item(s)", inserted);
        Ok(inserted)
    }

    async fn delete_many(&self, items: &[LibraryItem]) -> Result<()> {
        let deleted = delete_items(&self.conn, items).await?;
        log::debug!("Deleted {} snapshot item(s)", deleted);
        Ok(())
    }

    async fn commit_changes(
        &self,
        inserts: &[LibraryItem],
        removals: &[LibraryItem],
    ) -> Result<u64> {
        let txn = self
            .conn
            .begin()
            .await
            .wrap_err("Failed to begin transaction")?;

        let inserted = insert_items(&txn, inserts).await?;
        let deleted = delete_items(&txn, removals).await?;

        txn.commit()
            .await
            .wrap_err("Failed to commit transaction")?;

        log::debug!(
            "Snapshot updated: {} inserted, {} deleted",
            inserted,
            deleted
        );
        Ok(inserted)
    }
}
