// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, patch},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        CreateDrinkRequest, DeletedDrink, Drink, DrinkList, DrinkSummary, DrinkSummaryList,
        Ingredient, IngredientSummary, RecipeInput, UpdateDrinkRequest,
    },
    state::AppState,
};

pub mod drinks;
pub mod health;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/drinks", get(drinks::list_drinks).post(drinks::create_drink))
        .route("/drinks-detail", get(drinks::list_drinks_detail))
        .route(
            "/drinks/{drink_id}",
            patch(drinks::update_drink).delete(drinks::delete_drink),
        )
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .fallback(drinks::not_found)
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

/// Registers the bearer scheme referenced by the protected endpoints.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        drinks::list_drinks,
        drinks::list_drinks_detail,
        drinks::create_drink,
        drinks::update_drink,
        drinks::delete_drink,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            Drink,
            DrinkSummary,
            Ingredient,
            IngredientSummary,
            RecipeInput,
            CreateDrinkRequest,
            UpdateDrinkRequest,
            DrinkList,
            DrinkSummaryList,
            DeletedDrink,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Drinks", description = "Drink menu management"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
