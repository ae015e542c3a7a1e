//! Member route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use bazaar_core::Address;
use bazaar_core::member::Member;

use crate::db::Database;
use crate::error::Result;
use crate::extract::JsonBody;
use crate::middleware::CurrentMember;
use crate::services::auth::{JoinRequest, MemberService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinBody {
    pub username: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Debug, Deserialize)]
pub struct SignInBody {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub member: Member,
}

/// Register a new member.
pub async fn join<D: Database>(
    State(state): State<AppState<D>>,
    JsonBody(body): JsonBody<JoinBody>,
) -> Result<(StatusCode, Json<Member>)> {
    let member = MemberService::new(state.db(), state.tokens())
        .join(JoinRequest {
            username: body.username,
            password: body.password,
            name: body.name,
            address: body.address,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(member)))
}

/// Exchange username and password for an access token.
pub async fn sign_in<D: Database>(
    State(state): State<AppState<D>>,
    JsonBody(body): JsonBody<SignInBody>,
) -> Result<Json<SignInResponse>> {
    let (member, token) = MemberService::new(state.db(), state.tokens())
        .sign_in(&body.username, &body.password)
        .await?;

    Ok(Json(SignInResponse {
        access_token: token.into_inner(),
        token_type: "Bearer",
        expires_in: state.config().jwt.ttl_secs,
        member,
    }))
}

/// The authenticated member's profile.
pub async fn me(CurrentMember(member): CurrentMember) -> Json<Member> {
    Json(member)
}
