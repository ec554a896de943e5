use chrono::Utc;
use glass_ecommerce_api::{
    db::{OrmConn, create_orm_conn, run_migrations},
    entity::{
        model_attachments::ActiveModel as AttachmentActive,
        product_models::ActiveModel as ModelActive,
        products::{ActiveModel as ProductActive, Column as ProductCol, Entity as Products},
        user_roles::{ActiveModel as RoleActive, Column as RoleCol, Entity as UserRoles, Role},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    services::user_service::hash_password,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

struct SeedModel {
    name: &'static str,
    unit: &'static str,
    color: &'static str,
    specification: &'static str,
    price: i64,
    available: i32,
    image: &'static str,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_target(false).init();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL is not set"))?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "admin@glass.local", "admin123", "Store", "Admin", Role::Admin).await?;
    let customer_id =
        ensure_user(&orm, "customer@glass.local", "customer123", "Lan", "Tran", Role::Customer).await?;
    seed_catalogue(&orm).await?;

    tracing::info!(%admin_id, %customer_id, "seed completed");
    Ok(())
}

async fn ensure_user(
    orm: &OrmConn,
    email: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(orm)
        .await?
    {
        tracing::info!(email, "user already present");
        return Ok(existing.id);
    }

    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        first_name: Set(first_name.to_string()),
        last_name: Set(last_name.to_string()),
        phone_number: Set(None),
        gender: Set(None),
        dob: Set(None),
        avatar: Set(None),
        address: Set(None),
        is_activated: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;

    UserRoles::delete_many()
        .filter(RoleCol::UserId.eq(user.id))
        .exec(orm)
        .await?;
    RoleActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        role: Set(role),
    }
    .insert(orm)
    .await?;

    tracing::info!(email, role = role.as_str(), "user created");
    Ok(user.id)
}

async fn seed_catalogue(orm: &OrmConn) -> anyhow::Result<()> {
    let catalogue = [
        (
            "Tempered Glass Panel",
            "Safety glass for doors and shower screens",
            vec![
                SeedModel {
                    name: "Clear 8mm",
                    unit: "m2",
                    color: "clear",
                    specification: "8mm tempered",
                    price: 650_000,
                    available: 40,
                    image: "/images/tempered-clear-8.jpg",
                },
                SeedModel {
                    name: "Frosted 10mm",
                    unit: "m2",
                    color: "frosted",
                    specification: "10mm tempered, acid etched",
                    price: 820_000,
                    available: 25,
                    image: "/images/tempered-frosted-10.jpg",
                },
            ],
        ),
        (
            "Laminated Glass",
            "Two panes bonded with PVB interlayer",
            vec![SeedModel {
                name: "6.38mm Clear",
                unit: "m2",
                color: "clear",
                specification: "3+0.38+3",
                price: 540_000,
                available: 60,
                image: "/images/laminated-638.jpg",
            }],
        ),
        (
            "Glass Mirror",
            "Silvered float glass mirror",
            vec![SeedModel {
                name: "5mm Silver",
                unit: "m2",
                color: "silver",
                specification: "5mm copper-free",
                price: 480_000,
                available: 35,
                image: "/images/mirror-silver-5.jpg",
            }],
        ),
    ];

    for (name, description, models) in catalogue {
        let exists = Products::find()
            .filter(ProductCol::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let product = ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            vote_star: Set(None),
            created_at: Set(Utc::now().into()),
        }
        .insert(orm)
        .await?;

        for seed in models {
            let model = ModelActive {
                id: Set(Uuid::new_v4()),
                product_id: Set(product.id),
                name: Set(seed.name.to_string()),
                unit: Set(seed.unit.to_string()),
                color: Set(Some(seed.color.to_string())),
                specification: Set(Some(seed.specification.to_string())),
                price: Set(seed.price),
                available: Set(seed.available),
                description: Set(None),
            }
            .insert(orm)
            .await?;

            AttachmentActive {
                id: Set(Uuid::new_v4()),
                model_id: Set(model.id),
                path: Set(seed.image.to_string()),
                kind: Set("image".to_string()),
                created_at: Set(Utc::now().into()),
            }
            .insert(orm)
            .await?;
        }
        tracing::info!(product = name, "product seeded");
    }

    Ok(())
}
