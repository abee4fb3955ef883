//! Homepage slides, static pages, site settings and HB Productions posts.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use hembit_core::{ContentKey, PostId, ProductId, SlideId, SlideKind};

use super::MessageResponse;
use crate::error::{ApiJson, AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{ContentPage, Post, Settings, Slide};
use crate::routes::{all_present, non_blank};
use crate::state::AppState;

/// Call-to-action label for slides created without one.
pub const DEFAULT_CTA_LABEL: &str = "Discover";
/// Call-to-action link for slides created without one.
pub const DEFAULT_CTA_LINK: &str = "/shop";

// =============================================================================
// Slides
// =============================================================================

#[derive(Debug, Serialize)]
pub struct SlidesResponse {
    pub slides: Vec<Slide>,
}

#[instrument(skip(state, _admin))]
pub async fn list_slides(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<SlidesResponse> {
    let slides = state.store().read(|doc| doc.sorted_slides());
    Json(SlidesResponse { slides })
}

/// Slide fields accepted on create and update.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideInput {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub url: Option<String>,
    pub cta_label: Option<String>,
    pub cta_link: Option<String>,
    pub order: Option<i64>,
    pub product_ids: Option<Vec<ProductId>>,
}

fn parse_kind(kind: &str) -> Result<SlideKind> {
    kind.parse()
        .map_err(|_| AppError::bad_request("type must be image, video, or products"))
}

#[derive(Debug, Serialize)]
pub struct SlideResponse {
    pub slide: Slide,
}

/// Create a slide at the end of the carousel.
#[instrument(skip(state, _admin, input))]
pub async fn create_slide(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiJson(input): ApiJson<SlideInput>,
) -> Result<(StatusCode, Json<SlideResponse>)> {
    let [title, kind, url] = all_present([
        input.title.as_ref(),
        input.kind.as_ref(),
        input.url.as_ref(),
    ])
    .ok_or_else(|| AppError::bad_request("title, type, and url are required"))?;
    let kind = parse_kind(kind)?;

    let slide = state.store().write(|doc| {
        let slide = Slide {
            id: SlideId::generate(),
            title: title.to_owned(),
            subtitle: input.subtitle.clone().unwrap_or_default(),
            kind,
            url: url.to_owned(),
            cta_label: non_blank(input.cta_label.as_ref())
                .unwrap_or(DEFAULT_CTA_LABEL)
                .to_owned(),
            cta_link: non_blank(input.cta_link.as_ref())
                .unwrap_or(DEFAULT_CTA_LINK)
                .to_owned(),
            order: i64::try_from(doc.slides.len() + 1).unwrap_or(i64::MAX),
            product_ids: input.product_ids.clone().unwrap_or_default(),
        };
        doc.slides.push(slide.clone());
        slide
    })?;

    Ok((StatusCode::CREATED, Json(SlideResponse { slide })))
}

/// Update any subset of a slide's fields.
#[instrument(skip(state, _admin, input))]
pub async fn update_slide(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<SlideId>,
    ApiJson(input): ApiJson<SlideInput>,
) -> Result<Json<SlideResponse>> {
    let kind = input.kind.as_deref().map(parse_kind).transpose()?;

    let slide = state.store().try_write(|doc| {
        let slide = doc
            .slides
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::not_found("Slide not found"))?;

        for (field, value) in [
            (&mut slide.title, input.title),
            (&mut slide.subtitle, input.subtitle),
            (&mut slide.url, input.url),
            (&mut slide.cta_label, input.cta_label),
            (&mut slide.cta_link, input.cta_link),
        ] {
            if let Some(value) = value {
                *field = value;
            }
        }
        if let Some(kind) = kind {
            slide.kind = kind;
        }
        if let Some(order) = input.order {
            slide.order = order;
        }
        if let Some(product_ids) = input.product_ids {
            slide.product_ids = product_ids;
        }
        Ok::<_, AppError>(slide.clone())
    })?;

    Ok(Json(SlideResponse { slide }))
}

#[instrument(skip(state, _admin))]
pub async fn delete_slide(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<SlideId>,
) -> Result<Json<MessageResponse>> {
    state.store().write(|doc| doc.slides.retain(|s| s.id != id))?;
    Ok(MessageResponse::new("Slide deleted"))
}

// =============================================================================
// Static Pages
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ContentResponse {
    pub content: BTreeMap<String, ContentPage>,
}

#[instrument(skip(state, _admin))]
pub async fn list_content(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<ContentResponse> {
    let content = state.store().read(|doc| doc.content.clone());
    Json(ContentResponse { content })
}

#[derive(Debug, Deserialize)]
pub struct ContentInput {
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ContentUpdatedResponse {
    pub message: String,
    pub content: ContentPage,
}

/// Edit the title and/or body of a static page.
#[instrument(skip(state, _admin, input))]
pub async fn update_content(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(key): Path<String>,
    ApiJson(input): ApiJson<ContentInput>,
) -> Result<Json<ContentUpdatedResponse>> {
    let key: ContentKey = key
        .parse()
        .map_err(|_| AppError::not_found("Invalid content key"))?;

    let content = state.store().write(|doc| {
        let page = doc.content.entry(key.as_str().to_owned()).or_default();
        if let Some(title) = input.title {
            page.title = title;
        }
        if let Some(body) = input.body {
            page.body = body;
        }
        page.clone()
    })?;

    Ok(Json(ContentUpdatedResponse {
        message: "Content updated".to_string(),
        content,
    }))
}

// =============================================================================
// Settings
// =============================================================================

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub settings: Settings,
}

#[instrument(skip(state, _admin))]
pub async fn get_settings(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<SettingsResponse> {
    let settings = state.store().read(|doc| doc.settings.clone());
    Json(SettingsResponse {
        message: None,
        settings,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceContactInput {
    pub support_email: Option<String>,
    pub contact_number: Option<String>,
    pub contact_hours: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsInput {
    #[serde(default)]
    pub service_contact: ServiceContactInput,
}

/// Edit service contact details. Blank values fall back to the defaults.
#[instrument(skip(state, _admin, input))]
pub async fn update_settings(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiJson(input): ApiJson<SettingsInput>,
) -> Result<Json<SettingsResponse>> {
    let incoming = input.service_contact;
    state.store().write(|doc| {
        let contact = &mut doc.settings.service_contact;
        for (field, value) in [
            (&mut contact.support_email, incoming.support_email),
            (&mut contact.contact_number, incoming.contact_number),
            (&mut contact.contact_hours, incoming.contact_hours),
        ] {
            if let Some(value) = value {
                *field = value;
            }
        }
    })?;

    // Read back after normalization filled any blanks.
    let settings = state.store().read(|doc| doc.settings.clone());
    Ok(Json(SettingsResponse {
        message: Some("Settings updated".to_string()),
        settings,
    }))
}

// =============================================================================
// HB Productions
// =============================================================================

#[derive(Debug, Serialize)]
pub struct PostsResponse {
    pub posts: Vec<Post>,
}

#[instrument(skip(state, _admin))]
pub async fn list_posts(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<PostsResponse> {
    let posts = state.store().read(|doc| doc.hb_productions.clone());
    Json(PostsResponse { posts })
}

#[derive(Debug, Deserialize)]
pub struct PostInput {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub image: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub post: Post,
}

/// Publish a post at the top of the list.
#[instrument(skip(state, _admin, input))]
pub async fn create_post(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiJson(input): ApiJson<PostInput>,
) -> Result<(StatusCode, Json<PostResponse>)> {
    let [title, body] = all_present([input.title.as_ref(), input.body.as_ref()])
        .ok_or_else(|| AppError::bad_request("title and body are required"))?;

    let post = Post {
        id: PostId::generate(),
        title: title.to_owned(),
        excerpt: input.excerpt.clone().unwrap_or_default(),
        image: input.image.clone().unwrap_or_default(),
        body: body.to_owned(),
        created_at: Some(Utc::now()),
    };
    state
        .store()
        .write(|doc| doc.hb_productions.insert(0, post.clone()))?;
    tracing::info!(post_id = %post.id, "hb productions post created");

    Ok((StatusCode::CREATED, Json(PostResponse { post })))
}

#[instrument(skip(state, _admin))]
pub async fn delete_post(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<PostId>,
) -> Result<Json<MessageResponse>> {
    state
        .store()
        .write(|doc| doc.hb_productions.retain(|p| p.id != id))?;
    Ok(MessageResponse::new("HB production post deleted"))
}
