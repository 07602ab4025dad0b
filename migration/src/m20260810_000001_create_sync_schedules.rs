use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create sync_schedules table holding the configuration and run-state
        // of every recurring sync job
        manager
            .create_table(
                Table::create()
                    .table(SyncSchedules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SyncSchedules::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SyncSchedules::Name)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SyncSchedules::SyncType)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SyncSchedules::IsEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(SyncSchedules::Frequency)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SyncSchedules::NextRun)
                            .timestamp()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SyncSchedules::LastRun)
                            .timestamp()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SyncSchedules::LastResult)
                            .string_len(20)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SyncSchedules::LastError)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(SyncSchedules::RunCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        // The scheduler polls for enabled schedules that are due
        manager
            .create_index(
                Index::create()
                    .name("idx_sync_schedules_enabled_next_run")
                    .table(SyncSchedules::Table)
                    .col(SyncSchedules::IsEnabled)
                    .col(SyncSchedules::NextRun)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SyncSchedules::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SyncSchedules {
    Table,
    Id,
    Name,
    SyncType,
    IsEnabled,
    Frequency,
    NextRun,
    LastRun,
    LastResult,
    LastError,
    RunCount,
}
