/// Admin email endpoints: send, queue, schedule, cancel, list, stats
use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use vowmail_core::error::VowmailError;
use vowmail_core::models::{
    CancelResult, DeliveryStats, EmailOutboxRecord, EmailType, QueuedReport, ScheduledEmailJob,
    SendReport,
};

use crate::{context::ApiContext, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    pub guest_ids: Vec<String>,
    pub email_type: EmailType,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleEmailRequest {
    pub guest_ids: Vec<String>,
    pub email_type: EmailType,
    /// RFC 3339 timestamp; must be in the future
    pub send_at: String,
}

#[derive(Debug, Serialize)]
pub struct OutboxListResponse {
    pub emails: Vec<EmailOutboxRecord>,
}

#[derive(Debug, Serialize)]
pub struct ScheduledListResponse {
    pub scheduled: Vec<ScheduledEmailJob>,
}

pub async fn send(
    State(ctx): State<Arc<ApiContext>>,
    Path(wedding_id): Path<String>,
    Json(req): Json<SendEmailRequest>,
) -> Result<Json<SendReport>, ApiError> {
    let report = ctx
        .pipeline
        .send_batch(&wedding_id, &req.guest_ids, req.email_type)
        .await?;
    Ok(Json(report))
}

pub async fn queue(
    State(ctx): State<Arc<ApiContext>>,
    Path(wedding_id): Path<String>,
    Json(req): Json<SendEmailRequest>,
) -> Result<Json<QueuedReport>, ApiError> {
    let report = ctx
        .pipeline
        .queue_batch(&wedding_id, &req.guest_ids, req.email_type)
        .await?;
    Ok(Json(report))
}

pub async fn schedule(
    State(ctx): State<Arc<ApiContext>>,
    Path(wedding_id): Path<String>,
    Json(req): Json<ScheduleEmailRequest>,
) -> Result<Json<ScheduledEmailJob>, ApiError> {
    let send_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&req.send_at)
        .map_err(|e| {
            VowmailError::InvalidScheduleTime(format!("unparseable send_at: {}", e))
        })?
        .with_timezone(&Utc);

    let job = ctx
        .pipeline
        .schedule_email(&wedding_id, req.guest_ids, req.email_type, send_at)
        .await?;
    Ok(Json(job))
}

pub async fn list(
    State(ctx): State<Arc<ApiContext>>,
    Path(wedding_id): Path<String>,
) -> Result<Json<OutboxListResponse>, ApiError> {
    let emails = ctx.outbox.list_for_wedding(&wedding_id).await?;
    Ok(Json(OutboxListResponse { emails }))
}

pub async fn stats(
    State(ctx): State<Arc<ApiContext>>,
    Path(wedding_id): Path<String>,
) -> Result<Json<DeliveryStats>, ApiError> {
    let stats = ctx.outbox.stats_for_wedding(&wedding_id).await?;
    Ok(Json(stats))
}

pub async fn scheduled(
    State(ctx): State<Arc<ApiContext>>,
    Path(wedding_id): Path<String>,
) -> Result<Json<ScheduledListResponse>, ApiError> {
    let scheduled = ctx.pipeline.list_scheduled(&wedding_id).await?;
    Ok(Json(ScheduledListResponse { scheduled }))
}

pub async fn cancel(
    State(ctx): State<Arc<ApiContext>>,
    Path(scheduled_email_id): Path<String>,
) -> Result<Json<CancelResult>, ApiError> {
    let result = ctx
        .pipeline
        .cancel_scheduled_email(&scheduled_email_id)
        .await?;
    Ok(Json(result))
}
