use sea_orm_migration::prelude::*;

use crate::m20251001_000001_create_users::Users;

#[derive(DeriveIden)]
pub(crate) enum Consultants {
    Table,
    Id,
    UserId,
    Type,
    Domain,
    Bio,
    Languages,
    HourlyPrice,
    ProfilePic,
    IsVerified,
    Rating,
    TotalReviews,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Consultants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Consultants::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    // one profile per user; the register upsert conflicts on this key
                    .col(
                        ColumnDef::new(Consultants::UserId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Consultants::Type)
                            .string_len(16)
                            .not_null()
                            .default("Individual"),
                    )
                    .col(ColumnDef::new(Consultants::Domain).string().not_null())
                    .col(ColumnDef::new(Consultants::Bio).text().null())
                    .col(ColumnDef::new(Consultants::Languages).string().null())
                    .col(ColumnDef::new(Consultants::HourlyPrice).double().not_null())
                    .col(ColumnDef::new(Consultants::ProfilePic).string().null())
                    .col(
                        ColumnDef::new(Consultants::IsVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Consultants::Rating)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Consultants::TotalReviews)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Consultants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Consultants::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_consultants_user_id")
                            .from(Consultants::Table, Consultants::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_consultants_is_verified")
                    .table(Consultants::Table)
                    .col(Consultants::IsVerified)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Consultants::Table).to_owned())
            .await
    }
}
