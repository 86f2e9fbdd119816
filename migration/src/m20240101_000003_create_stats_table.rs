use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Stats::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Stats::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Stats::Username)
                            .string_len(80)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Stats::Points).integer().not_null())
                    .col(ColumnDef::new(Stats::Matches).integer().not_null().default(0))
                    .col(ColumnDef::new(Stats::Wins).integer().not_null().default(0))
                    .col(ColumnDef::new(Stats::AvgTime).double().not_null().default(0.0))
                    .col(ColumnDef::new(Stats::WordFreq).json().not_null())
                    .col(
                        ColumnDef::new(Stats::RegisteredOn)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Leaderboard queries
        manager
            .create_index(
                Index::create()
                    .name("idx_stats_points")
                    .table(Stats::Table)
                    .col(Stats::Points)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stats_wins")
                    .table(Stats::Table)
                    .col(Stats::Wins)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Stats::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Stats {
    Table,
    Id,
    Username,
    Points,
    Matches,
    Wins,
    AvgTime,
    WordFreq,
    RegisteredOn,
}
