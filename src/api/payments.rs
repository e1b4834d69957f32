//! Subscription lifecycle against the payment gateway: create, verify the
//! first charge's signature, cancel (with refund inside the window).

use axum::{extract::State, Json};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{Payment, Role, SUBSCRIPTION_ACTIVE};
use crate::payments::verify_charge;

pub async fn payment_key(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "key": state.config.gateway_key }))
}

pub async fn subscribe(
    State(state): State<AppState>,
    AuthUser(mut user): AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    if user.role == Role::Admin {
        return Err(ApiError::BadRequest("Admin can't buy subscription".to_string()));
    }

    let subscription = state
        .gateway
        .create_subscription(&state.config.gateway_plan_id)
        .await?;

    user.subscription.id = Some(subscription.id.clone());
    user.subscription.status = Some(subscription.status.clone());
    state.store.update_user(user)?;

    Ok(Json(json!({
        "success": true,
        "message": "Subscription created successfully",
        "subscription": { "id": subscription.id, "status": subscription.status },
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyReq {
    #[serde(default)]
    payment_id: String,
    #[serde(default)]
    signature: String,
}

pub async fn verify_payment(
    State(state): State<AppState>,
    AuthUser(mut user): AuthUser,
    Json(body): Json<VerifyReq>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if body.payment_id.is_empty() || body.signature.is_empty() {
        return Err(ApiError::BadRequest("Please provide all fields".to_string()));
    }
    let subscription_id = user
        .subscription
        .id
        .clone()
        .ok_or_else(|| ApiError::BadRequest("No pending subscription".to_string()))?;

    // The signature covers the user's stored subscription id, not whatever
    // the client claims it paid for.
    if !verify_charge(
        &state.config.gateway_secret,
        &body.payment_id,
        &subscription_id,
        &body.signature,
    ) {
        return Err(ApiError::BadRequest("Payment verification failed".to_string()));
    }

    state.store.insert_payment(Payment {
        id: Uuid::new_v4(),
        gateway_payment_id: body.payment_id.clone(),
        gateway_subscription_id: subscription_id,
        gateway_signature: body.signature,
        created_at: Utc::now(),
    })?;
    user.subscription.status = Some(SUBSCRIPTION_ACTIVE.to_string());
    state.store.update_user(user)?;

    Ok(Json(json!({
        "success": true,
        "message": "Payment verified",
        "reference": body.payment_id,
    })))
}

pub async fn cancel(
    State(state): State<AppState>,
    AuthUser(mut user): AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let subscription_id = user
        .subscription
        .id
        .clone()
        .ok_or_else(|| ApiError::BadRequest("No subscription to cancel".to_string()))?;

    state.gateway.cancel_subscription(&subscription_id).await?;

    let mut refund = false;
    if let Some(payment) = state.store.payment_by_subscription(&subscription_id)? {
        let refund_window = Duration::days(state.config.refund_days);
        if Utc::now() - payment.created_at < refund_window {
            state.gateway.refund_payment(&payment.gateway_payment_id).await?;
            refund = true;
        }
        state.store.delete_payment(payment.id)?;
    }

    user.subscription.id = None;
    user.subscription.status = None;
    state.store.update_user(user)?;

    let message = if refund {
        format!(
            "Subscription cancelled, you will receive a full refund within {} days",
            state.config.refund_days
        )
    } else {
        "Subscription cancelled, no refund initiated as the refund window has passed".to_string()
    };
    Ok(Json(json!({ "success": true, "message": message })))
}
