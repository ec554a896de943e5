use sea_orm::{EntityTrait, Schema};
use sea_orm_migration::prelude::*;

use crate::entity::{
    CartItems, Feedbacks, ModelAttachments, Notifications, OrderItems, Orders, Posts,
    ProductModels, Products, UserRoles, Users, cart_items, feedbacks,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        // Parents before children so foreign keys resolve on Postgres.
        create_table(manager, &schema, Users).await?;
        create_table(manager, &schema, UserRoles).await?;
        create_table(manager, &schema, Products).await?;
        create_table(manager, &schema, ProductModels).await?;
        create_table(manager, &schema, ModelAttachments).await?;
        create_table(manager, &schema, CartItems).await?;
        create_table(manager, &schema, Orders).await?;
        create_table(manager, &schema, OrderItems).await?;
        create_table(manager, &schema, Feedbacks).await?;
        create_table(manager, &schema, Posts).await?;
        create_table(manager, &schema, Notifications).await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_cart_items_user_model")
                    .table(CartItems)
                    .col(cart_items::Column::UserId)
                    .col(cart_items::Column::ModelId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_feedbacks_order_product")
                    .table(Feedbacks)
                    .col(feedbacks::Column::OrderId)
                    .col(feedbacks::Column::ProductId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_table(manager, Notifications).await?;
        drop_table(manager, Posts).await?;
        drop_table(manager, Feedbacks).await?;
        drop_table(manager, OrderItems).await?;
        drop_table(manager, Orders).await?;
        drop_table(manager, CartItems).await?;
        drop_table(manager, ModelAttachments).await?;
        drop_table(manager, ProductModels).await?;
        drop_table(manager, Products).await?;
        drop_table(manager, UserRoles).await?;
        drop_table(manager, Users).await?;
        Ok(())
    }
}

async fn create_table<E: EntityTrait>(
    manager: &SchemaManager<'_>,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr> {
    manager
        .create_table(schema.create_table_from_entity(entity))
        .await
}

async fn drop_table<E: EntityTrait + 'static>(
    manager: &SchemaManager<'_>,
    entity: E,
) -> Result<(), DbErr> {
    manager
        .drop_table(Table::drop().table(entity).if_exists().to_owned())
        .await
}
