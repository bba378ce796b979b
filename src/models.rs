// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures used by the REST API. All types derive
//! `Serialize`/`Deserialize` and `ToSchema` for JSON handling and OpenAPI
//! documentation.
//!
//! A drink has two public representations:
//!
//! - **short**: each ingredient's color and parts only (public menu)
//! - **long**: the full recipe including ingredient names (baristas)

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Drink Models
// =============================================================================

/// One ingredient of a drink recipe.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Ingredient {
    /// Ingredient name, hidden from the public menu.
    pub name: String,
    /// Display color of the ingredient layer.
    pub color: String,
    /// Relative amount of this ingredient.
    pub parts: u32,
}

/// Ingredient as shown on the public menu.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct IngredientSummary {
    pub color: String,
    pub parts: u32,
}

/// A drink with its full recipe.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Drink {
    pub id: u64,
    /// Unique drink title.
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// A drink as shown on the public menu.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct DrinkSummary {
    pub id: u64,
    pub title: String,
    pub recipe: Vec<IngredientSummary>,
}

impl Drink {
    /// Public representation without ingredient names.
    pub fn short(&self) -> DrinkSummary {
        DrinkSummary {
            id: self.id,
            title: self.title.clone(),
            recipe: self
                .recipe
                .iter()
                .map(|i| IngredientSummary {
                    color: i.color.clone(),
                    parts: i.parts,
                })
                .collect(),
        }
    }

    /// Full representation.
    pub fn long(&self) -> Drink {
        self.clone()
    }
}

/// Recipe as submitted by clients: a single ingredient or a list.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum RecipeInput {
    Many(Vec<Ingredient>),
    One(Ingredient),
}

impl RecipeInput {
    pub fn into_vec(self) -> Vec<Ingredient> {
        match self {
            RecipeInput::Many(ingredients) => ingredients,
            RecipeInput::One(ingredient) => vec![ingredient],
        }
    }
}

/// Request to add a drink to the menu.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CreateDrinkRequest {
    pub title: String,
    pub recipe: RecipeInput,
}

/// Partial update of a drink; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UpdateDrinkRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub recipe: Option<RecipeInput>,
}

// =============================================================================
// Response Envelopes
// =============================================================================

/// Public menu listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct DrinkSummaryList {
    pub success: bool,
    pub drinks: Vec<DrinkSummary>,
}

/// Listing with full recipes; also returned by create and update.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct DrinkList {
    pub success: bool,
    pub drinks: Vec<Drink>,
}

/// Result of deleting a drink.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct DeletedDrink {
    pub success: bool,
    /// Id of the deleted drink.
    pub delete: u64,
}
