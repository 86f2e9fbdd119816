use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "games")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub game_id: i32,
    pub username: String,
    pub language: String,
    pub start_time: DateTimeWithTimeZone,
    pub word: String,
    pub guesses: Json,
    pub formatted_guesses: Json,
    pub letters: Json,
    pub guess_number: i32,
    pub max_tries: i32,
    #[sea_orm(column_type = "Double")]
    pub time: f64,
    pub status: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
