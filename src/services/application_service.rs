use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::applications::{
        ApplicationDecisionRequest, ComplaintRequest, ContactMessageList, ContactMessageRequest,
        ContactRequestList, SellerApplicationList, SellerApplicationRequest,
    },
    entity::{
        contact_messages::{
            ActiveModel as ContactMessageActive, Column as ContactMessageCol,
            Entity as ContactMessages, Model as ContactMessageModel,
        },
        contact_requests::{
            ActiveModel as ContactRequestActive, Column as ContactRequestCol,
            Entity as ContactRequests, Model as ContactRequestModel,
        },
        seller_applications::{
            ActiveModel as ApplicationActive, Column as ApplicationCol,
            Entity as SellerApplications, Model as ApplicationModel,
        },
        users::{ActiveModel as UserActive, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, require_admin, require_user},
    models::{ContactMessage, ContactRequest, SellerApplication},
    response::{ApiResponse, Meta},
    routes::params::ApplicationQuery,
    state::AppState,
};

pub async fn submit_seller_application(
    state: &AppState,
    user: &AuthUser,
    payload: SellerApplicationRequest,
) -> AppResult<ApiResponse<SellerApplication>> {
    if payload.store_name.trim().is_empty() || payload.phone.trim().is_empty() {
        return Err(AppError::BadRequest("Store name and phone are required".into()));
    }

    let row = require_user(state, user).await?;
    if row.is_verified_seller {
        return Err(AppError::BadRequest("Already a verified seller".into()));
    }

    let pending = SellerApplications::find()
        .filter(
            Condition::all()
                .add(ApplicationCol::UserId.eq(user.user_id))
                .add(ApplicationCol::Status.eq("pending")),
        )
        .one(&state.orm)
        .await?;
    if pending.is_some() {
        return Err(AppError::BadRequest("Application already pending".into()));
    }

    let txn = state.orm.begin().await?;

    let application = ApplicationActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        store_name: Set(payload.store_name),
        description: Set(payload.description),
        phone: Set(payload.phone),
        status: Set("pending".into()),
        admin_notes: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    // is_seller marks "has applied"; verification comes with approval.
    if !row.is_seller {
        let mut active: UserActive = row.into();
        active.is_seller = Set(true);
        active.update(&txn).await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "seller_application_submit",
        "seller_applications",
        Some(serde_json::json!({ "application_id": application.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Application submitted",
        seller_application_from_entity(application),
        Some(Meta::empty()),
    ))
}

pub async fn submit_contact_message(
    state: &AppState,
    payload: ContactMessageRequest,
) -> AppResult<ApiResponse<ContactMessage>> {
    if payload.name.trim().is_empty()
        || payload.phone.trim().is_empty()
        || payload.body.trim().is_empty()
    {
        return Err(AppError::BadRequest("Name, phone and message are required".into()));
    }

    let message = ContactMessageActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        phone: Set(payload.phone),
        subject: Set(payload.subject),
        body: Set(payload.body),
        status: Set("pending".into()),
        admin_notes: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Message received",
        contact_message_from_entity(message),
        Some(Meta::empty()),
    ))
}

pub async fn submit_complaint(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: ComplaintRequest,
) -> AppResult<ApiResponse<ContactRequest>> {
    if payload.phone.trim().is_empty()
        || payload.subject.trim().is_empty()
        || payload.body.trim().is_empty()
    {
        return Err(AppError::BadRequest("Phone, subject and message are required".into()));
    }

    let user_id = match user {
        Some(u) => Some(require_user(state, u).await?.id),
        None => None,
    };

    let complaint = ContactRequestActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        phone: Set(payload.phone),
        subject: Set(payload.subject),
        body: Set(payload.body),
        status: Set("pending".into()),
        admin_notes: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        user_id,
        "complaint_submit",
        "contact_requests",
        Some(serde_json::json!({ "complaint_id": complaint.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Complaint received",
        contact_request_from_entity(complaint),
        Some(Meta::empty()),
    ))
}

pub async fn list_seller_applications(
    state: &AppState,
    user: &AuthUser,
    query: ApplicationQuery,
) -> AppResult<ApiResponse<SellerApplicationList>> {
    require_admin(state, user).await?;

    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(ApplicationCol::Status.eq(status.clone()));
    }

    let finder = SellerApplications::find()
        .filter(condition)
        .order_by_desc(ApplicationCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(seller_application_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Applications",
        SellerApplicationList { items },
        Some(meta),
    ))
}

pub async fn decide_seller_application(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ApplicationDecisionRequest,
) -> AppResult<ApiResponse<SellerApplication>> {
    require_admin(state, user).await?;

    if payload.status != "approved" && payload.status != "rejected" {
        return Err(AppError::BadRequest("Status must be approved or rejected".into()));
    }

    let txn = state.orm.begin().await?;

    let application = SellerApplications::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let application = match application {
        Some(a) => a,
        None => return Err(AppError::NotFound),
    };

    if application.status != "pending" {
        return Err(AppError::BadRequest("Application already decided".into()));
    }

    let applicant_id = application.user_id;
    let approved = payload.status == "approved";

    let mut active: ApplicationActive = application.into();
    active.status = Set(payload.status.clone());
    active.admin_notes = Set(payload.admin_notes);
    active.updated_at = Set(Utc::now().into());
    let application = active.update(&txn).await?;

    // The flag flips in the same transaction as the decision; a crash
    // cannot leave an approved application without a verified seller.
    if approved {
        let applicant = Users::find_by_id(applicant_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?;
        let applicant = match applicant {
            Some(u) => u,
            None => return Err(AppError::NotFound),
        };
        let mut active: UserActive = applicant.into();
        active.is_verified_seller = Set(true);
        active.update(&txn).await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "seller_application_decide",
        "seller_applications",
        Some(serde_json::json!({
            "application_id": application.id,
            "status": application.status,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Application decided",
        seller_application_from_entity(application),
        Some(Meta::empty()),
    ))
}

pub async fn list_contact_messages(
    state: &AppState,
    user: &AuthUser,
    query: ApplicationQuery,
) -> AppResult<ApiResponse<ContactMessageList>> {
    require_admin(state, user).await?;

    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(ContactMessageCol::Status.eq(status.clone()));
    }

    let finder = ContactMessages::find()
        .filter(condition)
        .order_by_desc(ContactMessageCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(contact_message_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Contact messages",
        ContactMessageList { items },
        Some(meta),
    ))
}

pub async fn decide_contact_message(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ApplicationDecisionRequest,
) -> AppResult<ApiResponse<ContactMessage>> {
    require_admin(state, user).await?;

    if payload.status != "responded" {
        return Err(AppError::BadRequest("Status must be responded".into()));
    }

    let message = ContactMessages::find_by_id(id).one(&state.orm).await?;
    let message = match message {
        Some(m) => m,
        None => return Err(AppError::NotFound),
    };
    if message.status != "pending" {
        return Err(AppError::BadRequest("Message already handled".into()));
    }

    let mut active: ContactMessageActive = message.into();
    active.status = Set(payload.status);
    active.admin_notes = Set(payload.admin_notes);
    let message = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "contact_message_decide",
        "contact_messages",
        Some(serde_json::json!({ "message_id": message.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Message handled",
        contact_message_from_entity(message),
        Some(Meta::empty()),
    ))
}

pub async fn list_complaints(
    state: &AppState,
    user: &AuthUser,
    query: ApplicationQuery,
) -> AppResult<ApiResponse<ContactRequestList>> {
    require_admin(state, user).await?;

    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(ContactRequestCol::Status.eq(status.clone()));
    }

    let finder = ContactRequests::find()
        .filter(condition)
        .order_by_desc(ContactRequestCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(contact_request_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Complaints",
        ContactRequestList { items },
        Some(meta),
    ))
}

pub async fn decide_complaint(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ApplicationDecisionRequest,
) -> AppResult<ApiResponse<ContactRequest>> {
    require_admin(state, user).await?;

    if payload.status != "responded" && payload.status != "rejected" {
        return Err(AppError::BadRequest("Status must be responded or rejected".into()));
    }

    let complaint = ContactRequests::find_by_id(id).one(&state.orm).await?;
    let complaint = match complaint {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };
    if complaint.status != "pending" {
        return Err(AppError::BadRequest("Complaint already handled".into()));
    }

    let mut active: ContactRequestActive = complaint.into();
    active.status = Set(payload.status);
    active.admin_notes = Set(payload.admin_notes);
    let complaint = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "complaint_decide",
        "contact_requests",
        Some(serde_json::json!({ "complaint_id": complaint.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Complaint handled",
        contact_request_from_entity(complaint),
        Some(Meta::empty()),
    ))
}

fn seller_application_from_entity(model: ApplicationModel) -> SellerApplication {
    SellerApplication {
        id: model.id,
        user_id: model.user_id,
        store_name: model.store_name,
        description: model.description,
        phone: model.phone,
        status: model.status,
        admin_notes: model.admin_notes,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn contact_message_from_entity(model: ContactMessageModel) -> ContactMessage {
    ContactMessage {
        id: model.id,
        name: model.name,
        phone: model.phone,
        subject: model.subject,
        body: model.body,
        status: model.status,
        admin_notes: model.admin_notes,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn contact_request_from_entity(model: ContactRequestModel) -> ContactRequest {
    ContactRequest {
        id: model.id,
        user_id: model.user_id,
        phone: model.phone,
        subject: model.subject,
        body: model.body,
        status: model.status,
        admin_notes: model.admin_notes,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
