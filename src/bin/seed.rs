use rust_decimal::Decimal;
use garagemap_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let customer_id = ensure_user(
        &pool,
        "seed-customer-uid",
        "customer@example.com",
        "Asha",
        "Rao",
        "customer",
    )
    .await?;
    let mechanic_id = ensure_user(
        &pool,
        "seed-mechanic-uid",
        "mechanic@example.com",
        "Ravi",
        "Kumar",
        "mechanic",
    )
    .await?;

    ensure_profile(&pool, mechanic_id, "seed-mechanic-uid", Some((dec("12.971600"), dec("77.594600")))).await?;
    ensure_profile(&pool, customer_id, "seed-customer-uid", None).await?;

    let workshop_id = ensure_workshop(&pool, mechanic_id).await?;
    seed_review(&pool, customer_id, workshop_id).await?;

    println!("Seed completed. Customer ID: {customer_id}, Mechanic ID: {mechanic_id}, Workshop ID: {workshop_id}");
    Ok(())
}

fn dec(s: &str) -> Decimal {
    s.parse().expect("literal decimal")
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    first_name: &str,
    last_name: &str,
    user_type: &str,
) -> anyhow::Result<Uuid> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, first_name, last_name, user_type)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (username) DO UPDATE SET user_type = EXCLUDED.user_type
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(first_name)
    .bind(last_name)
    .bind(user_type)
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE username = $1")
                .bind(username)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} ({user_type})");
    Ok(user_id)
}

async fn ensure_profile(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    provider_uid: &str,
    coords: Option<(Decimal, Decimal)>,
) -> anyhow::Result<()> {
    let (latitude, longitude) = match coords {
        Some((lat, lon)) => (Some(lat), Some(lon)),
        None => (None, None),
    };
    sqlx::query(
        r#"
        INSERT INTO profiles (id, user_id, provider_uid, phone, latitude, longitude)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(provider_uid)
    .bind("9876543210")
    .bind(latitude)
    .bind(longitude)
    .execute(pool)
    .await?;
    Ok(())
}

async fn ensure_workshop(pool: &sqlx::PgPool, owner_id: Uuid) -> anyhow::Result<Uuid> {
    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM workshops WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_optional(pool)
            .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO workshops (
            id, owner_id, mechanic_name, workshop_name, description, phone, email,
            address, city, state, pincode, latitude, longitude, services
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .bind("Ravi Kumar")
    .bind("Ravi Auto Garage")
    .bind("General repairs and emergency breakdown service")
    .bind("9876543210")
    .bind("garage@example.com")
    .bind("12 MG Road")
    .bind("Bengaluru")
    .bind("Karnataka")
    .bind("560001")
    .bind(dec("12.971600"))
    .bind(dec("77.594600"))
    .bind(serde_json::json!(["car", "bike", "towing"]))
    .execute(pool)
    .await?;

    println!("Seeded workshop");
    Ok(id)
}

async fn seed_review(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    workshop_id: Uuid,
) -> anyhow::Result<()> {
    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM reviews WHERE user_id = $1 AND workshop_id = $2")
            .bind(user_id)
            .bind(workshop_id)
            .fetch_optional(pool)
            .await?;
    if existing.is_some() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO reviews (id, user_id, workshop_id, rating, comment)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(workshop_id)
    .bind(4)
    .bind("Quick turnaround, fair price")
    .execute(pool)
    .await?;

    // Keep the derived pair consistent with the review set.
    sqlx::query(
        r#"
        UPDATE workshops
        SET rating = sub.avg_rating, reviews_count = sub.review_count
        FROM (
            SELECT COALESCE(ROUND(AVG(rating), 2), 0) AS avg_rating, COUNT(*) AS review_count
            FROM reviews WHERE workshop_id = $1
        ) AS sub
        WHERE id = $1
        "#,
    )
    .bind(workshop_id)
    .execute(pool)
    .await?;

    println!("Seeded review");
    Ok(())
}
