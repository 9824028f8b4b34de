use bozor_api::{
    db::{create_orm_conn, create_pool},
    dto::applications::{
        ApplicationDecisionRequest, ComplaintRequest, ContactMessageRequest,
        SellerApplicationRequest,
    },
    entity::users::{ActiveModel as UserActive, Entity as Users},
    error::AppError,
    middleware::auth::AuthUser,
    notify::Notifier,
    routes::params::{ApplicationQuery, Pagination},
    services::application_service,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

// Seller onboarding: application -> admin approval flips the verified flag;
// contact messages and complaints go through the same review queue shape.
#[tokio::test]
async fn application_review_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(());
            }
        };

    let state = setup_state(&database_url).await?;

    let applicant_id = create_user(&state, "applicant@test.uz", false).await?;
    let admin_id = create_user(&state, "admin@test.uz", true).await?;

    let applicant = AuthUser {
        user_id: applicant_id,
    };
    let admin = AuthUser { user_id: admin_id };

    // Applying marks the user as a seller candidate, not yet verified.
    let application = application_service::submit_seller_application(
        &state,
        &applicant,
        seller_application(),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(application.status, "pending");

    let row = Users::find_by_id(applicant_id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert!(row.is_seller);
    assert!(!row.is_verified_seller);

    // Only one application may be in flight.
    let err = application_service::submit_seller_application(
        &state,
        &applicant,
        seller_application(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // The queue is admin-only.
    let err =
        application_service::list_seller_applications(&state, &applicant, application_query())
            .await
            .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let queue = application_service::list_seller_applications(&state, &admin, application_query())
        .await?
        .data
        .unwrap();
    assert_eq!(queue.items.len(), 1);

    // Decisions must be terminal states.
    let err = application_service::decide_seller_application(
        &state,
        &admin,
        application.id,
        decision("maybe"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Approval flips the verified flag in the same transaction.
    let decided = application_service::decide_seller_application(
        &state,
        &admin,
        application.id,
        decision("approved"),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(decided.status, "approved");

    let row = Users::find_by_id(applicant_id)
        .one(&state.orm)
        .await?
        .unwrap();
    assert!(row.is_verified_seller);

    // A decided application stays decided.
    let err = application_service::decide_seller_application(
        &state,
        &admin,
        application.id,
        decision("rejected"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Verified sellers have nothing left to apply for.
    let err = application_service::submit_seller_application(
        &state,
        &applicant,
        seller_application(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Public contact form: no auth on submission, admin review after.
    let contact = application_service::submit_contact_message(
        &state,
        ContactMessageRequest {
            name: "Jasur".into(),
            phone: "+998901112233".into(),
            subject: Some("Hamkorlik".into()),
            body: "Savolim bor edi.".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(contact.status, "pending");

    let handled = application_service::decide_contact_message(
        &state,
        &admin,
        contact.id,
        decision("responded"),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(handled.status, "responded");

    let err = application_service::decide_contact_message(
        &state,
        &admin,
        contact.id,
        decision("responded"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Complaints keep the submitting account when one is present.
    let complaint = application_service::submit_complaint(
        &state,
        Some(&applicant),
        ComplaintRequest {
            phone: "+998901112233".into(),
            subject: "Yetkazib berish".into(),
            body: "Buyurtma kechikdi.".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(complaint.user_id, Some(applicant_id));

    let resolved = application_service::decide_complaint(
        &state,
        &admin,
        complaint.id,
        decision("rejected"),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(resolved.status, "rejected");

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Clean tables between runs.
    sqlx::query(
        "TRUNCATE TABLE messages, conversations, reviews, favorites, orders, products, \
         seller_applications, contact_messages, contact_requests, ads, audit_logs, users CASCADE",
    )
    .execute(&pool)
    .await?;

    let orm = create_orm_conn(database_url).await?;
    Ok(AppState {
        pool,
        orm,
        notifier: Notifier::disabled(),
    })
}

async fn create_user(state: &AppState, email: &str, is_admin: bool) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(Some(email.to_string())),
        password_hash: Set(Some("dummy".into())),
        full_name: Set("Test User".into()),
        phone: Set(None),
        address: Set(None),
        telegram_id: Set(None),
        is_admin: Set(is_admin),
        is_seller: Set(false),
        is_verified_seller: Set(false),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(user.id)
}

fn seller_application() -> SellerApplicationRequest {
    SellerApplicationRequest {
        store_name: "Hunarmand do'koni".into(),
        description: Some("Milliy buyumlar".into()),
        phone: "+998901112233".into(),
    }
}

fn application_query() -> ApplicationQuery {
    ApplicationQuery {
        pagination: Pagination {
            page: None,
            per_page: None,
        },
        status: None,
    }
}

fn decision(status: &str) -> ApplicationDecisionRequest {
    ApplicationDecisionRequest {
        status: status.into(),
        admin_notes: Some("Ko'rib chiqildi".into()),
    }
}
