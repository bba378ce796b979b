// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use tracing::info;

use crate::{
    auth::{DeleteDrinks, GetDrinksDetail, PatchDrinks, PostDrinks, RequirePermission},
    error::ApiError,
    models::{CreateDrinkRequest, DeletedDrink, DrinkList, DrinkSummaryList, UpdateDrinkRequest},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/drinks",
    tag = "Drinks",
    responses((status = 200, body = DrinkSummaryList))
)]
pub async fn list_drinks(State(state): State<AppState>) -> Json<DrinkSummaryList> {
    let store = state.store.read().await;
    Json(DrinkSummaryList {
        success: true,
        drinks: store.list_drinks().iter().map(|d| d.short()).collect(),
    })
}

#[utoipa::path(
    get,
    path = "/drinks-detail",
    tag = "Drinks",
    security(("bearer" = ["get:drinks-detail"])),
    responses(
        (status = 200, body = DrinkList),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Missing get:drinks-detail permission")
    )
)]
pub async fn list_drinks_detail(
    State(state): State<AppState>,
    _auth: RequirePermission<GetDrinksDetail>,
) -> Json<DrinkList> {
    let store = state.store.read().await;
    Json(DrinkList {
        success: true,
        drinks: store.list_drinks().iter().map(|d| d.long()).collect(),
    })
}

#[utoipa::path(
    post,
    path = "/drinks",
    request_body = CreateDrinkRequest,
    tag = "Drinks",
    security(("bearer" = ["post:drinks"])),
    responses(
        (status = 200, body = DrinkList),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Missing post:drinks permission"),
        (status = 422, description = "Invalid drink")
    )
)]
pub async fn create_drink(
    State(state): State<AppState>,
    RequirePermission { claims, .. }: RequirePermission<PostDrinks>,
    payload: Result<Json<CreateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinkList>, ApiError> {
    let Json(request) = payload?;
    let drink = state.store.write().await.create_drink(request)?;

    info!(
        drink_id = drink.id,
        subject = claims.subject().unwrap_or("unknown"),
        "Drink created"
    );

    Ok(Json(DrinkList {
        success: true,
        drinks: vec![drink.long()],
    }))
}

#[utoipa::path(
    patch,
    path = "/drinks/{drink_id}",
    params(
        ("drink_id" = u64, Path, description = "Identifier of the drink to update")
    ),
    request_body = UpdateDrinkRequest,
    tag = "Drinks",
    security(("bearer" = ["patch:drinks"])),
    responses(
        (status = 200, body = DrinkList),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Missing patch:drinks permission"),
        (status = 404, description = "Drink not found"),
        (status = 422, description = "Invalid drink")
    )
)]
pub async fn update_drink(
    State(state): State<AppState>,
    RequirePermission { claims, .. }: RequirePermission<PatchDrinks>,
    drink_id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<UpdateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinkList>, ApiError> {
    let Path(drink_id) = drink_id?;
    let Json(request) = payload?;
    let drink = state.store.write().await.update_drink(drink_id, request)?;

    info!(
        drink_id,
        subject = claims.subject().unwrap_or("unknown"),
        "Drink updated"
    );

    Ok(Json(DrinkList {
        success: true,
        drinks: vec![drink.long()],
    }))
}

#[utoipa::path(
    delete,
    path = "/drinks/{drink_id}",
    params(
        ("drink_id" = u64, Path, description = "Identifier of the drink to delete")
    ),
    tag = "Drinks",
    security(("bearer" = ["delete:drinks"])),
    responses(
        (status = 200, body = DeletedDrink),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Missing delete:drinks permission"),
        (status = 404, description = "Drink not found")
    )
)]
pub async fn delete_drink(
    State(state): State<AppState>,
    RequirePermission { claims, .. }: RequirePermission<DeleteDrinks>,
    drink_id: Result<Path<u64>, PathRejection>,
) -> Result<Json<DeletedDrink>, ApiError> {
    let Path(drink_id) = drink_id?;
    let deleted = state.store.write().await.delete_drink(drink_id)?;

    info!(
        drink_id = deleted,
        subject = claims.subject().unwrap_or("unknown"),
        "Drink deleted"
    );

    Ok(Json(DeletedDrink {
        success: true,
        delete: deleted,
    }))
}

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::not_found("resource not found")
}
