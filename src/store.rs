// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory drink store.
//!
//! Drinks are kept in id order; ids are assigned sequentially from 1 and
//! never reused. Titles are unique.

use std::collections::BTreeMap;

use crate::error::ApiError;
use crate::models::{CreateDrinkRequest, Drink, Ingredient, UpdateDrinkRequest};

pub struct InMemoryStore {
    drinks: BTreeMap<u64, Drink>,
    next_id: u64,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self {
            drinks: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding a single starter drink, as on a fresh deployment.
    pub fn seeded() -> Self {
        let mut store = Self::new();
        store.insert(
            "water",
            vec![Ingredient {
                name: "water".to_string(),
                color: "blue".to_string(),
                parts: 1,
            }],
        );
        store
    }

    pub fn list_drinks(&self) -> Vec<Drink> {
        self.drinks.values().cloned().collect()
    }

    pub fn get_drink(&self, drink_id: u64) -> Result<Drink, ApiError> {
        self.drinks
            .get(&drink_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("resource not found"))
    }

    pub fn create_drink(&mut self, request: CreateDrinkRequest) -> Result<Drink, ApiError> {
        let title = validate_title(&request.title)?;
        let recipe = validate_recipe(request.recipe.into_vec())?;
        self.ensure_title_free(&title, None)?;

        Ok(self.insert(&title, recipe))
    }

    pub fn update_drink(
        &mut self,
        drink_id: u64,
        request: UpdateDrinkRequest,
    ) -> Result<Drink, ApiError> {
        if !self.drinks.contains_key(&drink_id) {
            return Err(ApiError::not_found("resource not found"));
        }

        let title = request.title.as_deref().map(validate_title).transpose()?;
        let recipe = request
            .recipe
            .map(|r| validate_recipe(r.into_vec()))
            .transpose()?;
        if let Some(title) = &title {
            self.ensure_title_free(title, Some(drink_id))?;
        }

        let Some(drink) = self.drinks.get_mut(&drink_id) else {
            return Err(ApiError::not_found("resource not found"));
        };
        if let Some(title) = title {
            drink.title = title;
        }
        if let Some(recipe) = recipe {
            drink.recipe = recipe;
        }

        Ok(drink.clone())
    }

    pub fn delete_drink(&mut self, drink_id: u64) -> Result<u64, ApiError> {
        if self.drinks.remove(&drink_id).is_some() {
            Ok(drink_id)
        } else {
            Err(ApiError::not_found("resource not found"))
        }
    }

    fn insert(&mut self, title: &str, recipe: Vec<Ingredient>) -> Drink {
        let id = self.next_id;
        self.next_id += 1;
        let drink = Drink {
            id,
            title: title.to_string(),
            recipe,
        };
        self.drinks.insert(id, drink.clone());
        drink
    }

    fn ensure_title_free(&self, title: &str, except: Option<u64>) -> Result<(), ApiError> {
        let taken = self
            .drinks
            .values()
            .any(|d| d.title == title && Some(d.id) != except);
        if taken {
            Err(ApiError::unprocessable(format!(
                "A drink titled '{title}' already exists."
            )))
        } else {
            Ok(())
        }
    }
}

fn validate_title(title: &str) -> Result<String, ApiError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ApiError::unprocessable("title must not be empty"));
    }
    Ok(title.to_string())
}

fn validate_recipe(recipe: Vec<Ingredient>) -> Result<Vec<Ingredient>, ApiError> {
    if recipe.is_empty() {
        return Err(ApiError::unprocessable(
            "recipe must contain at least one ingredient",
        ));
    }
    if recipe.iter().any(|i| i.parts == 0) {
        return Err(ApiError::unprocessable(
            "ingredient parts must be a positive number",
        ));
    }
    Ok(recipe)
}
