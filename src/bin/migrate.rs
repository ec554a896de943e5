use glass_ecommerce_api::{db::create_orm_conn, migration::Migrator};
use sea_orm_migration::MigratorTrait;

/// `migrate [up|down|fresh|status]`, defaulting to `up`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_target(false).init();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL is not set"))?;
    let orm = create_orm_conn(&database_url).await?;

    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());
    match command.as_str() {
        "up" => Migrator::up(&orm, None).await?,
        "down" => Migrator::down(&orm, Some(1)).await?,
        "fresh" => Migrator::fresh(&orm).await?,
        "status" => Migrator::status(&orm).await?,
        other => anyhow::bail!("unknown migrate command: {other}"),
    }

    tracing::info!(command = %command, "migrations done");
    Ok(())
}
