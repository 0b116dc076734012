use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn id_column<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn created_at_column<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .string()
        .not_null()
        .extra("DEFAULT CURRENT_TIMESTAMP".to_owned())
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(&mut id_column(Users::Id))
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string()
                            .not_null()
                            .default("user"),
                    )
                    .col(&mut created_at_column(Users::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CyberIncidents::Table)
                    .if_not_exists()
                    .col(&mut id_column(CyberIncidents::Id))
                    .col(ColumnDef::new(CyberIncidents::Title).string().not_null())
                    .col(ColumnDef::new(CyberIncidents::Severity).string().not_null())
                    .col(
                        ColumnDef::new(CyberIncidents::Status)
                            .string()
                            .not_null()
                            .default("Open"),
                    )
                    .col(ColumnDef::new(CyberIncidents::Description).text().null())
                    .col(ColumnDef::new(CyberIncidents::ReportedBy).string().null())
                    .col(ColumnDef::new(CyberIncidents::Date).string().null())
                    .col(&mut created_at_column(CyberIncidents::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DatasetsMetadata::Table)
                    .if_not_exists()
                    .col(&mut id_column(DatasetsMetadata::Id))
                    .col(ColumnDef::new(DatasetsMetadata::Name).string().not_null())
                    .col(ColumnDef::new(DatasetsMetadata::Source).string().null())
                    .col(ColumnDef::new(DatasetsMetadata::Category).string().null())
                    .col(ColumnDef::new(DatasetsMetadata::Size).big_integer().null())
                    .col(ColumnDef::new(DatasetsMetadata::Description).text().null())
                    .col(&mut created_at_column(DatasetsMetadata::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ItTickets::Table)
                    .if_not_exists()
                    .col(&mut id_column(ItTickets::Id))
                    .col(ColumnDef::new(ItTickets::Title).string().not_null())
                    .col(ColumnDef::new(ItTickets::Priority).string().not_null())
                    .col(
                        ColumnDef::new(ItTickets::Status)
                            .string()
                            .not_null()
                            .default("Open"),
                    )
                    .col(ColumnDef::new(ItTickets::AssignedTo).string().null())
                    .col(ColumnDef::new(ItTickets::Description).text().null())
                    .col(ColumnDef::new(ItTickets::CreatedDate).string().null())
                    .col(&mut created_at_column(ItTickets::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // Dashboard breakdowns group by these
        manager
            .create_index(
                Index::create()
                    .name("idx_cyber_incidents_status")
                    .table(CyberIncidents::Table)
                    .col(CyberIncidents::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_it_tickets_status")
                    .table(ItTickets::Table)
                    .col(ItTickets::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ItTickets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DatasetsMetadata::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CyberIncidents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Username,
    PasswordHash,
    Role,
    CreatedAt,
}

#[derive(Iden)]
enum CyberIncidents {
    Table,
    Id,
    Title,
    Severity,
    Status,
    Description,
    ReportedBy,
    Date,
    CreatedAt,
}

#[derive(Iden)]
enum DatasetsMetadata {
    Table,
    Id,
    Name,
    Source,
    Category,
    Size,
    Description,
    CreatedAt,
}

#[derive(Iden)]
enum ItTickets {
    Table,
    Id,
    Title,
    Priority,
    Status,
    AssignedTo,
    Description,
    CreatedDate,
    CreatedAt,
}
