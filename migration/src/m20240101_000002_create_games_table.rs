use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Games::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Games::GameId)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Games::Username).string_len(80).not_null())
                    .col(ColumnDef::new(Games::Language).string_len(80).not_null())
                    .col(
                        ColumnDef::new(Games::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Games::Word).string().not_null())
                    .col(ColumnDef::new(Games::Guesses).json().not_null())
                    .col(ColumnDef::new(Games::FormattedGuesses).json().not_null())
                    .col(ColumnDef::new(Games::Letters).json().not_null())
                    .col(
                        ColumnDef::new(Games::GuessNumber)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Games::MaxTries)
                            .integer()
                            .not_null()
                            .default(6),
                    )
                    .col(ColumnDef::new(Games::Time).double().not_null().default(0.0))
                    .col(ColumnDef::new(Games::Status).integer().not_null().default(1))
                    .to_owned(),
            )
            .await?;

        // Current game lookup is "latest game_id for a username"
        manager
            .create_index(
                Index::create()
                    .name("idx_games_username")
                    .table(Games::Table)
                    .col(Games::Username)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Games::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Games {
    Table,
    GameId,
    Username,
    Language,
    StartTime,
    Word,
    Guesses,
    FormattedGuesses,
    Letters,
    GuessNumber,
    MaxTries,
    Time,
    Status,
}
