use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use bozor_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@bozor.uz", "admin123", "Admin", true, false).await?;
    let seller_id = ensure_user(
        &pool,
        "seller@bozor.uz",
        "seller123",
        "Dilshod Karimov",
        false,
        true,
    )
    .await?;
    ensure_user(
        &pool,
        "buyer@bozor.uz",
        "buyer123",
        "Nodira Azimova",
        false,
        false,
    )
    .await?;
    seed_products(&pool, seller_id).await?;

    println!("Seed completed. Admin ID: {admin_id}, Seller ID: {seller_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    full_name: &str,
    is_admin: bool,
    is_verified_seller: bool,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, full_name, is_admin, is_seller, is_verified_seller)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (email) DO UPDATE
            SET is_admin = EXCLUDED.is_admin,
                is_seller = EXCLUDED.is_seller,
                is_verified_seller = EXCLUDED.is_verified_seller
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(full_name)
    .bind(is_admin)
    .bind(is_verified_seller)
    .bind(is_verified_seller)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email}");
    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool, seller_id: Uuid) -> anyhow::Result<()> {
    let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE seller_id = $1")
        .bind(seller_id)
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        println!("Products already seeded");
        return Ok(());
    }

    // One listing stays unapproved so the moderation queue is not empty.
    let products = vec![
        (
            "Atlas ko'ylak",
            "Marg'ilon atlasidan tikilgan ayollar ko'ylagi",
            "Kiyim",
            450_000_i64,
            12,
            true,
        ),
        (
            "Milliy do'ppi",
            "Qo'lda tikilgan chust do'ppisi",
            "Kiyim",
            85_000,
            40,
            true,
        ),
        (
            "O'tkan kunlar",
            "Abdulla Qodiriy romani, qattiq muqova",
            "Kitoblar",
            65_000,
            25,
            true,
        ),
        (
            "Samarqand ko'k choyi",
            "95-raqamli ko'k choy, 400 g",
            "Oziq-ovqat",
            38_000,
            60,
            true,
        ),
        (
            "Simsiz quloqchin",
            "Bluetooth 5.3, shovqinni pasaytirish",
            "Elektronika",
            320_000,
            18,
            false,
        ),
    ];

    for (name, description, category, price, stock, is_approved) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, seller_id, name, description, category, price, stock, is_approved)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(seller_id)
        .bind(name)
        .bind(description)
        .bind(category)
        .bind(price)
        .bind(stock)
        .bind(is_approved)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
