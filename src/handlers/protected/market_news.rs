// handlers/protected/market_news.rs - /api/market-news/*

use axum::Extension;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::database::models::news::{NewsNote, ProductPick};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::services::news_service::{NewNewsNote, NewProductPick, NewsNoteChanges, ProductPickChanges};
use crate::services::NewsService;

#[derive(Debug, Serialize)]
pub struct PicksResponse {
    pub picks: Vec<ProductPick>,
}

#[derive(Debug, Serialize)]
pub struct NewsNotesResponse {
    pub notes: Vec<NewsNote>,
}

#[derive(Debug, Deserialize)]
pub struct PickQuery {
    pub pick_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct NewsNoteQuery {
    pub news_id: Option<i32>,
}

/// GET /api/market-news/product-picks?pick_date= - today's picks when no date is given
pub async fn get_product_picks(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<PickQuery>,
) -> ApiResult<PicksResponse> {
    let picks = NewsService::new()
        .await?
        .product_picks(&user.rm_number, query.pick_date)
        .await?;
    Ok(ApiResponse::success(PicksResponse { picks }))
}

/// POST /api/market-news/product-picks
pub async fn create_product_pick(
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<NewProductPick>,
) -> ApiResult<ProductPick> {
    let ticker = body.ticker.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let (Some(ticker), Some(pick_date)) = (ticker, body.pick_date) else {
        return Err(ApiError::bad_request("Ticker and pick_date are required"));
    };

    let pick = NewsService::new()
        .await?
        .create_product_pick(
            &user.rm_number,
            ticker,
            pick_date,
            body.reason.as_deref(),
            body.priority,
        )
        .await?;

    tracing::info!("{} picked {} for {}", user.rm_number, pick.ticker, pick.pick_date);
    Ok(ApiResponse::created(pick))
}

/// PUT /api/market-news/product-picks/:id
pub async fn update_product_pick(
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(changes): ApiJson<ProductPickChanges>,
) -> ApiResult<ProductPick> {
    let pick = NewsService::new()
        .await?
        .update_product_pick(&user.rm_number, id, &changes)
        .await?;
    Ok(ApiResponse::success(pick))
}

/// DELETE /api/market-news/product-picks/:id
pub async fn delete_product_pick(
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<ProductPick> {
    let pick = NewsService::new()
        .await?
        .delete_product_pick(&user.rm_number, id)
        .await?;
    Ok(ApiResponse::success(pick))
}

/// GET /api/market-news/news-notes?news_id=
pub async fn get_news_notes(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<NewsNoteQuery>,
) -> ApiResult<NewsNotesResponse> {
    let notes = NewsService::new()
        .await?
        .news_notes(&user.rm_number, query.news_id)
        .await?;
    Ok(ApiResponse::success(NewsNotesResponse { notes }))
}

/// POST /api/market-news/news-notes
pub async fn create_news_note(
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<NewNewsNote>,
) -> ApiResult<NewsNote> {
    let title = body.note_title.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let content = body.note_content.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let (Some(title), Some(content)) = (title, content) else {
        return Err(ApiError::bad_request("Note title and content are required"));
    };

    let note = NewsService::new()
        .await?
        .create_news_note(
            &user.rm_number,
            title,
            content,
            body.news_id,
            body.relevance_tags.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(ApiResponse::created(note))
}

/// PUT /api/market-news/news-notes/:id
pub async fn update_news_note(
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(changes): ApiJson<NewsNoteChanges>,
) -> ApiResult<NewsNote> {
    let note = NewsService::new()
        .await?
        .update_news_note(&user.rm_number, id, &changes)
        .await?;
    Ok(ApiResponse::success(note))
}

/// DELETE /api/market-news/news-notes/:id
pub async fn delete_news_note(
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<NewsNote> {
    let note = NewsService::new()
        .await?
        .delete_news_note(&user.rm_number, id)
        .await?;
    Ok(ApiResponse::success(note))
}
