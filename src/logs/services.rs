use std::collections::HashMap;

use serde_json::json;
use time::{format_description::well_known::Rfc3339, Date, OffsetDateTime, UtcOffset};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::dto::{DailyNutrition, LogEntry, LogView};
use super::repo_types::{UserLog, IMAGE_PREFIX};
use crate::error::{AppError, ModelError};
use crate::foods::Food;
use crate::images::UploadItem;
use crate::state::AppState;
use crate::store::{Direction, DocumentStore};

fn render(ts: OffsetDateTime, offset: UtcOffset) -> Result<String, ModelError> {
    ts.to_offset(offset)
        .format(&Rfc3339)
        .map_err(|e| ModelError::Internal(e.into()))
}

/// Memoised food lookups for one request.
struct FoodCache<'a> {
    store: &'a dyn DocumentStore,
    seen: HashMap<String, Option<Food>>,
}

impl<'a> FoodCache<'a> {
    fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            seen: HashMap::new(),
        }
    }

    async fn get(&mut self, food_id: &str) -> Result<Option<&Food>, ModelError> {
        if !self.seen.contains_key(food_id) {
            let food = Food::find_by_id(self.store, food_id).await?;
            self.seen.insert(food_id.to_string(), food);
        }
        Ok(self.seen.get(food_id).and_then(Option::as_ref))
    }
}

/// Upload the image and store a new log for `user_id`. The food must exist.
pub async fn record_log(
    st: &AppState,
    user_id: &str,
    food_id: &str,
    image: UploadItem,
) -> Result<UserLog, AppError> {
    if Food::find_by_id(st.store(), food_id).await?.is_none() {
        return Err(ModelError::not_found("food", food_id).into());
    }

    let user_log_id = Uuid::now_v7().to_string();
    let key = image.key(&format!("{IMAGE_PREFIX}/{user_id}"), &user_log_id);
    let mut log = UserLog::create(&json!({
        "userLogId": user_log_id,
        "userId": user_id,
        "foodId": food_id,
        "imageUrl": key,
    }))?;

    log.image_url = st
        .storage
        .put_object(&key, image.body, &image.content_type)
        .await
        .map_err(AppError::Upstream)?;

    if let Err(e) = log.save(st.store()).await {
        if let Err(cleanup) = st.storage.delete_object(&key).await {
            error!(error = %cleanup, %key, "orphaned log image");
        }
        return Err(e.into());
    }
    Ok(log)
}

/// Owner-checked read. Soft-deleted logs read as not found.
pub async fn get_user_log(
    store: &dyn DocumentStore,
    user_id: &str,
    user_log_id: &str,
    offset: UtcOffset,
) -> Result<LogView, ModelError> {
    let log = UserLog::find_by_id(store, user_log_id)
        .await?
        .ok_or_else(|| ModelError::not_found("user log", user_log_id))?;
    if log.user_id != user_id {
        warn!(%user_id, %user_log_id, "log read by non-owner");
        return Err(ModelError::Unauthorized("user not authorized".into()));
    }
    if log.is_deleted {
        return Err(ModelError::not_found("user log", user_log_id));
    }
    view(log, offset)
}

/// Client-facing form of a log, times rendered in `offset`.
pub fn view(log: UserLog, offset: UtcOffset) -> Result<LogView, ModelError> {
    Ok(LogView {
        created_at: render(log.created_at, offset)?,
        updated_at: render(log.updated_at, offset)?,
        user_log_id: log.user_log_id,
        user_id: log.user_id,
        food_id: log.food_id,
        image_url: log.image_url,
    })
}

/// Active logs of `user_id`, newest first, with nutrition attached.
pub async fn get_user_logs(
    store: &dyn DocumentStore,
    user_id: &str,
    offset: UtcOffset,
) -> Result<Vec<LogEntry>, ModelError> {
    let logs = UserLog::find(store, "userId", json!(user_id), Some("createdAt"), Direction::Desc).await?;
    let mut foods = FoodCache::new(store);
    let mut out = Vec::with_capacity(logs.len());
    for log in logs.into_iter().filter(|l| !l.is_deleted) {
        let food = foods.get(&log.food_id).await?;
        if food.is_none() {
            warn!(user_log_id = %log.user_log_id, food_id = %log.food_id, "log references unknown food");
        }
        out.push(LogEntry {
            name: food.map(|f| f.name.clone()),
            gula: food.map(|f| f.gula),
            karbohidrat: food.map(|f| f.karbohidrat),
            lemak: food.map(|f| f.lemak),
            protein: food.map(|f| f.protein),
            created_at: render(log.created_at, offset)?,
            updated_at: render(log.updated_at, offset)?,
            user_log_id: log.user_log_id,
            user_id: log.user_id,
            food_id: log.food_id,
            image_url: log.image_url,
        });
    }
    Ok(out)
}

/// Soft delete. Only the owner may delete; the record stays readable by id.
pub async fn delete_user_log(
    store: &dyn DocumentStore,
    user_id: &str,
    user_log_id: &str,
) -> Result<UserLog, ModelError> {
    let log = UserLog::find_by_id(store, user_log_id)
        .await?
        .ok_or_else(|| ModelError::not_found("user log", user_log_id))?;
    if log.user_id != user_id {
        warn!(%user_id, %user_log_id, "log delete by non-owner");
        return Err(ModelError::Unauthorized("user not authorized".into()));
    }
    let log = UserLog::update(store, user_log_id, &json!({ "isDeleted": true })).await?;
    info!(%user_id, %user_log_id, "user log soft-deleted");
    Ok(log)
}

/// Sum nutrition over the active logs whose creation date, seen from
/// `offset`, is `today`.
pub async fn daily_nutrition(
    store: &dyn DocumentStore,
    user_id: &str,
    today: Date,
    offset: UtcOffset,
) -> Result<DailyNutrition, ModelError> {
    let logs = UserLog::find(store, "userId", json!(user_id), None, Direction::Asc).await?;
    let mut foods = FoodCache::new(store);
    let mut totals = DailyNutrition {
        date: today.to_string(),
        ..DailyNutrition::default()
    };

    for log in logs
        .iter()
        .filter(|l| !l.is_deleted && l.created_at.to_offset(offset).date() == today)
    {
        match foods.get(&log.food_id).await? {
            Some(food) => {
                totals.gula += food.gula;
                totals.karbohidrat += food.karbohidrat;
                totals.protein += food.protein;
                totals.lemak += food.lemak;
                totals.log_count += 1;
            }
            None => {
                warn!(user_log_id = %log.user_log_id, food_id = %log.food_id, "skipping log with unknown food");
                if !totals.skipped_food_ids.contains(&log.food_id) {
                    totals.skipped_food_ids.push(log.food_id.clone());
                }
            }
        }
    }
    Ok(totals)
}
