use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Snapshot of the items both accounts agreed on after the last sync
        manager
            .create_table(
                Table::create()
                    .table(LibraryItem::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(LibraryItem::SpotifyId).string().not_null())
                    .col(
                        ColumnDef::new(LibraryItem::Category)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(LibraryItem::Name).string().not_null())
                    .col(
                        ColumnDef::new(LibraryItem::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LibraryItem::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LibraryItem::SyncedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(LibraryItem::SpotifyId)
                            .col(LibraryItem::Category),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_library_item_category")
                    .table(LibraryItem::Table)
                    .col(LibraryItem::Category)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_library_item_category")
                    .table(LibraryItem::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(LibraryItem::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum LibraryItem {
    Table,
    SpotifyId,
    Category,
    Name,
    CreatedAt,
    UpdatedAt,
    SyncedAt,
}
