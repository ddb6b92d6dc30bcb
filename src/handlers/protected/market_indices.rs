// handlers/protected/market_indices.rs - /api/market-indices/*
//
// Watchlists and per-index notes. Rows belong to the caller's rm_number; ids
// owned by someone else read as missing.

use axum::Extension;
use serde::{Deserialize, Serialize};

use crate::database::models::market::{MarketNote, Watchlist};
use crate::error::ApiError;
use crate::handlers::IdQuery;
use crate::middleware::{ApiJson, ApiQuery, ApiResponse, ApiResult, AuthUser};
use crate::services::MarketService;

#[derive(Debug, Serialize)]
pub struct WatchlistsResponse {
    pub watchlists: Vec<Watchlist>,
}

#[derive(Debug, Serialize)]
pub struct NotesResponse {
    pub notes: Vec<MarketNote>,
}

#[derive(Debug, Deserialize)]
pub struct WatchlistBody {
    pub id: Option<i32>,
    pub watchlist_name: Option<String>,
    pub indices: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct NoteQuery {
    pub index_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NoteBody {
    pub id: Option<i32>,
    pub index_name: Option<String>,
    pub note_title: Option<String>,
    pub note_content: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// GET /api/market-indices/watchlists
pub async fn get_watchlists(
    Extension(user): Extension<AuthUser>,
) -> ApiResult<WatchlistsResponse> {
    let watchlists = MarketService::new().await?.watchlists(&user.rm_number).await?;
    Ok(ApiResponse::success(WatchlistsResponse { watchlists }))
}

/// POST /api/market-indices/watchlists
pub async fn create_watchlist(
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<WatchlistBody>,
) -> ApiResult<WatchlistsResponse> {
    let (Some(name), Some(indices)) = (non_blank(body.watchlist_name.as_deref()), &body.indices)
    else {
        return Err(ApiError::bad_request(
            "watchlist_name and indices array are required",
        ));
    };

    let watchlist = MarketService::new()
        .await?
        .create_watchlist(&user.rm_number, name, indices)
        .await?;

    tracing::info!("{} created watchlist {}", user.rm_number, watchlist.id);
    Ok(ApiResponse::created(WatchlistsResponse {
        watchlists: vec![watchlist],
    }))
}

/// PUT /api/market-indices/watchlists - replaces name and indices
pub async fn update_watchlist(
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<WatchlistBody>,
) -> ApiResult<WatchlistsResponse> {
    let (Some(id), Some(name), Some(indices)) = (
        body.id,
        non_blank(body.watchlist_name.as_deref()),
        &body.indices,
    ) else {
        return Err(ApiError::bad_request(
            "id, watchlist_name, and indices array are required",
        ));
    };

    let watchlist = MarketService::new()
        .await?
        .update_watchlist(&user.rm_number, id, name, indices)
        .await?;
    Ok(ApiResponse::success(WatchlistsResponse {
        watchlists: vec![watchlist],
    }))
}

/// DELETE /api/market-indices/watchlists?id=
pub async fn delete_watchlist(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> ApiResult<WatchlistsResponse> {
    let id = query.id.ok_or_else(|| ApiError::bad_request("id is required"))?;
    let watchlist = MarketService::new()
        .await?
        .delete_watchlist(&user.rm_number, id)
        .await?;
    Ok(ApiResponse::success(WatchlistsResponse {
        watchlists: vec![watchlist],
    }))
}

/// GET /api/market-indices/notes?index_name=
pub async fn get_notes(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<NoteQuery>,
) -> ApiResult<NotesResponse> {
    let notes = MarketService::new()
        .await?
        .notes(&user.rm_number, non_blank(query.index_name.as_deref()))
        .await?;
    Ok(ApiResponse::success(NotesResponse { notes }))
}

/// POST /api/market-indices/notes
pub async fn create_note(
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<NoteBody>,
) -> ApiResult<NotesResponse> {
    let (Some(index_name), Some(title), Some(content)) = (
        non_blank(body.index_name.as_deref()),
        non_blank(body.note_title.as_deref()),
        non_blank(body.note_content.as_deref()),
    ) else {
        return Err(ApiError::bad_request(
            "index_name, note_title, and note_content are required",
        ));
    };

    let note = MarketService::new()
        .await?
        .create_note(&user.rm_number, index_name, title, content)
        .await?;
    Ok(ApiResponse::created(NotesResponse { notes: vec![note] }))
}

/// PUT /api/market-indices/notes
pub async fn update_note(
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<NoteBody>,
) -> ApiResult<NotesResponse> {
    let id = body.id.ok_or_else(|| ApiError::bad_request("id is required"))?;
    let (Some(title), Some(content)) = (
        non_blank(body.note_title.as_deref()),
        non_blank(body.note_content.as_deref()),
    ) else {
        return Err(ApiError::bad_request("Note title and content are required"));
    };

    let note = MarketService::new()
        .await?
        .update_note(&user.rm_number, id, title, content)
        .await?;
    Ok(ApiResponse::success(NotesResponse { notes: vec![note] }))
}

/// DELETE /api/market-indices/notes?id=
pub async fn delete_note(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> ApiResult<NotesResponse> {
    let id = query.id.ok_or_else(|| ApiError::bad_request("id is required"))?;
    let note = MarketService::new().await?.delete_note(&user.rm_number, id).await?;
    Ok(ApiResponse::success(NotesResponse { notes: vec![note] }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_count_as_missing() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some(" IHSG ")), Some("IHSG"));
    }

    #[test]
    fn watchlist_body_requires_an_array_of_indices() {
        let body: WatchlistBody =
            serde_json::from_str(r#"{"watchlist_name": "Asia", "indices": ["N225", "HSI"]}"#)
                .unwrap();
        assert_eq!(body.indices.unwrap(), vec!["N225", "HSI"]);

        let err = serde_json::from_str::<WatchlistBody>(r#"{"watchlist_name": "Asia", "indices": "HSI"}"#);
        assert!(err.is_err());
    }
}
