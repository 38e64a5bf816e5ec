use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::{get, post},
    Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{FoodView, PredictedFood},
    repo_types::Food,
};
use crate::{
    error::{AppError, ModelError},
    images::{read_image_form, MAX_IMAGE_BYTES},
    response::ApiResponse,
    state::AppState,
};

pub fn food_routes() -> Router<AppState> {
    Router::new()
        .route("/foods/:id", get(get_food))
        .route(
            "/predict",
            post(predict).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024)),
        )
}

#[instrument(skip(state))]
pub async fn get_food(
    State(state): State<AppState>,
    Path(food_id): Path<String>,
) -> Result<ApiResponse<FoodView>, AppError> {
    let food = Food::find_by_id(state.store(), &food_id)
        .await?
        .ok_or_else(|| ModelError::not_found("food", &food_id))?;
    Ok(ApiResponse::ok(food.into()))
}

/// Classify an uploaded image and attach catalog nutrition to each label.
/// Labels missing from the catalog are dropped.
#[instrument(skip(state, mp))]
pub async fn predict(
    State(state): State<AppState>,
    mp: Multipart,
) -> Result<ApiResponse<Vec<PredictedFood>>, AppError> {
    let mut form = read_image_form(mp).await?;
    let image = form.require_image()?;

    let predictions = state
        .classifier
        .classify(image.body, &image.filename, &image.content_type)
        .await
        .map_err(AppError::Upstream)?;

    let mut out = Vec::with_capacity(predictions.len());
    for prediction in predictions {
        match Food::find_by_id(state.store(), &prediction.label).await? {
            Some(food) => out.push(PredictedFood {
                nutrition: food.nutrition(),
                prediction,
            }),
            None => warn!(label = %prediction.label, "predicted label not in catalog"),
        }
    }
    info!(results = out.len(), "prediction served");
    Ok(ApiResponse::ok(out))
}
