use std::collections::HashMap;
use std::sync::Arc;
use actix_web::{web, web::Bytes, HttpRequest, HttpResponse};
use actix_web::error::{JsonPayloadError, PayloadError};
use actix_web::http::header;
use actix_multipart::{Multipart, MultipartError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures_util::{Stream, StreamExt as _, TryStreamExt as _};

use crate::auth;
use crate::config::MAX_BODY_BYTES;
use crate::error::ApiError;
use crate::models::*;
use crate::repo::{Repo, RepoError, RepoResult};
use crate::storage::{Bucket, ImageStore};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_BODY_BYTES))
        .app_data(
            web::JsonConfig::default()
                .limit(MAX_BODY_BYTES)
                .error_handler(json_error_handler),
        );
    cfg.service(
        web::scope("/api")
            .service(web::resource("/register").route(web::post().to(register)))
            .service(web::resource("/login").route(web::post().to(login)))
            .service(
                web::resource("/lost-found")
                    .route(web::get().to(list_lost_found))
                    .route(web::post().to(create_lost_found)),
            )
            .service(
                web::resource("/complaints")
                    .route(web::get().to(list_complaints))
                    .route(web::post().to(create_complaint)),
            )
            .service(
                web::resource("/menu")
                    .route(web::get().to(get_menu))
                    .route(web::post().to(update_menu)),
            )
            .service(web::resource("/menu/update-text").route(web::put().to(update_menu_text))),
    );
}

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repo>,
    pub image_store: Arc<dyn ImageStore>,
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let api_err = match err {
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => ApiError::PayloadTooLarge,
        other => ApiError::BadRequest(format!("Invalid JSON body: {other}")),
    };
    api_err.into()
}

// ---------------- auth -----------------------------------------------

#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Missing required fields"),
        (status = 409, description = "Username already exists")
    )
)]
pub async fn register(
    data: web::Data<AppState>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = auth::register(data.repo.as_ref(), payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(AuthResponse { message: "User registered successfully".into(), user }))
}

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing credentials"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    data: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = auth::login(data.repo.as_ref(), payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(AuthResponse { message: "Login successful".into(), user }))
}

// ---------------- multipart helpers ----------------------------------

const IMAGE_FIELD: &str = "image";

struct UploadedFile {
    filename: String,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct UploadForm {
    fields: HashMap<String, String>,
    image: Option<UploadedFile>,
}

impl UploadForm {
    /// Non-empty text field.
    fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Image part carrying at least one byte.
    fn take_image(&mut self) -> Option<UploadedFile> {
        self.image.take().filter(|f| !f.bytes.is_empty())
    }
}

/// Count every byte of the raw body, boundaries and part headers included.
fn capped_body(payload: web::Payload) -> impl Stream<Item = Result<Bytes, PayloadError>> {
    let mut seen = 0usize;
    payload.map(move |chunk| {
        let chunk = chunk?;
        seen += chunk.len();
        if seen > MAX_BODY_BYTES {
            return Err(PayloadError::Overflow);
        }
        Ok(chunk)
    })
}

fn multipart_error(e: MultipartError) -> ApiError {
    match e {
        MultipartError::Payload(PayloadError::Overflow) => ApiError::PayloadTooLarge,
        other => {
            tracing::warn!("multipart error: {other}");
            ApiError::BadRequest("Malformed multipart body".into())
        }
    }
}

/// Buffer a multipart body, enforcing the body limit on the raw stream.
/// Nothing is persisted until the whole body has been read.
async fn read_upload_form(
    req: &HttpRequest,
    payload: web::Payload,
) -> Result<UploadForm, ApiError> {
    let declared = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > MAX_BODY_BYTES) {
        return Err(ApiError::PayloadTooLarge);
    }

    let mut multipart = Multipart::new(req.headers(), capped_body(payload));
    let mut form = UploadForm::default();
    while let Some(mut field) = multipart.try_next().await.map_err(multipart_error)? {
        let disposition = field.content_disposition().clone();
        let name = disposition.get_name().unwrap_or_default().to_string();
        let mut buf: Vec<u8> = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
            buf.extend_from_slice(&chunk);
        }
        if name == IMAGE_FIELD {
            let filename = disposition.get_filename().unwrap_or_default().to_string();
            form.image = Some(UploadedFile { filename, bytes: buf });
        } else if !name.is_empty() {
            let text = String::from_utf8(buf)
                .map_err(|_| ApiError::BadRequest(format!("Field '{name}' is not valid UTF-8")))?;
            form.fields.insert(name, text);
        }
    }
    Ok(form)
}

/// Fields shared by lost-found posts and complaints.
fn post_fields(mut form: UploadForm) -> Result<(Id, String, UploadedFile), ApiError> {
    let missing = || ApiError::BadRequest("Missing required fields".into());
    let user_id = form.field("user_id").ok_or_else(missing)?;
    let user_id: Id = user_id
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest("user_id must be an integer".into()))?;
    let caption = form.field("caption").ok_or_else(missing)?.to_string();
    let image = form.take_image().ok_or_else(missing)?;
    Ok((user_id, caption, image))
}

/// Row insert following a blob save: on failure the blob is removed so no orphan remains.
async fn keep_or_discard<T>(
    store: &dyn ImageStore,
    path: &str,
    inserted: RepoResult<T>,
) -> Result<T, ApiError> {
    match inserted {
        Ok(v) => Ok(v),
        Err(e) => {
            if let Err(del) = store.delete(path).await {
                tracing::error!("failed to remove orphaned image {path}: {del}");
            }
            Err(e.into())
        }
    }
}

fn encode_image(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

// ---------------- lost & found ---------------------------------------

#[utoipa::path(
    post,
    path = "/api/lost-found",
    responses(
        (status = 201, description = "Posted", body = MessageResponse),
        (status = 400, description = "Missing required fields"),
        (status = 413, description = "Payload too large")
    )
)]
pub async fn create_lost_found(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Payload,
) -> Result<HttpResponse, ApiError> {
    let form = read_upload_form(&req, payload).await?;
    let (user_id, caption, image) = post_fields(form)?;
    let image_path = data.image_store.save(Bucket::LostFound, &image.filename, &image.bytes).await?;
    let inserted = data.repo
        .create_lost_found(NewPost { user_id, caption, image_path: image_path.clone() })
        .await;
    let id = keep_or_discard(data.image_store.as_ref(), &image_path, inserted).await?;
    tracing::info!(post_id = id, user_id, "lost & found post created");
    Ok(HttpResponse::Created().json(MessageResponse::new("Posted successfully")))
}

#[utoipa::path(
    get,
    path = "/api/lost-found",
    responses(
        (status = 200, description = "All posts, newest first, images inline", body = [LostFoundItem])
    )
)]
pub async fn list_lost_found(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let posts = data.repo.list_lost_found().await?;
    let mut items = Vec::with_capacity(posts.len());
    for p in posts {
        let bytes = data.image_store.load(&p.image_path).await?;
        items.push(LostFoundItem {
            id: p.id,
            user_name: p.user_name,
            caption: p.caption,
            image: encode_image(&bytes),
            created_at: p.created_at,
        });
    }
    Ok(HttpResponse::Ok().json(items))
}

// ---------------- complaints -----------------------------------------

#[utoipa::path(
    post,
    path = "/api/complaints",
    responses(
        (status = 201, description = "Complaint submitted", body = MessageResponse),
        (status = 400, description = "Missing required fields"),
        (status = 413, description = "Payload too large")
    )
)]
pub async fn create_complaint(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Payload,
) -> Result<HttpResponse, ApiError> {
    let form = read_upload_form(&req, payload).await?;
    let (user_id, caption, image) = post_fields(form)?;
    let image_path = data.image_store.save(Bucket::Complaints, &image.filename, &image.bytes).await?;
    let inserted = data.repo
        .create_complaint(NewPost { user_id, caption, image_path: image_path.clone() })
        .await;
    let id = keep_or_discard(data.image_store.as_ref(), &image_path, inserted).await?;
    tracing::info!(complaint_id = id, user_id, "complaint submitted");
    Ok(HttpResponse::Created().json(MessageResponse::new("Complaint submitted successfully")))
}

#[utoipa::path(
    get,
    path = "/api/complaints",
    responses(
        (status = 200, description = "All complaints, newest first, images inline", body = [ComplaintItem])
    )
)]
pub async fn list_complaints(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let complaints = data.repo.list_complaints().await?;
    let mut items = Vec::with_capacity(complaints.len());
    for c in complaints {
        let bytes = data.image_store.load(&c.image_path).await?;
        items.push(ComplaintItem {
            id: c.id,
            user_name: c.user_name,
            username: c.username,
            caption: c.caption,
            image: encode_image(&bytes),
            status: c.status,
            created_at: c.created_at,
        });
    }
    Ok(HttpResponse::Ok().json(items))
}

// ---------------- menu -----------------------------------------------

#[utoipa::path(
    post,
    path = "/api/menu",
    responses(
        (status = 201, description = "New menu entry appended", body = MessageResponse),
        (status = 400, description = "Image is required"),
        (status = 413, description = "Payload too large")
    )
)]
pub async fn update_menu(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Payload,
) -> Result<HttpResponse, ApiError> {
    let mut form = read_upload_form(&req, payload).await?;
    let image = form
        .take_image()
        .ok_or_else(|| ApiError::BadRequest("Image is required".into()))?;
    let today_update = form.fields.remove("today_update").unwrap_or_default();
    let image_path = data.image_store.save(Bucket::Menu, &image.filename, &image.bytes).await?;
    let inserted = data.repo
        .create_menu_entry(NewMenuEntry { image_path: image_path.clone(), today_update })
        .await;
    let id = keep_or_discard(data.image_store.as_ref(), &image_path, inserted).await?;
    tracing::info!(menu_id = id, "menu updated");
    Ok(HttpResponse::Created().json(MessageResponse::new("Menu updated successfully")))
}

#[utoipa::path(
    get,
    path = "/api/menu",
    responses(
        (status = 200, description = "Current menu", body = MenuItem),
        (status = 404, description = "No menu available")
    )
)]
pub async fn get_menu(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let entry = data.repo
        .current_menu()
        .await?
        .ok_or(ApiError::NotFound("No menu available"))?;
    let bytes = data.image_store.load(&entry.image_path).await?;
    Ok(HttpResponse::Ok().json(MenuItem {
        id: entry.id,
        image: encode_image(&bytes),
        today_update: entry.today_update,
        updated_at: entry.updated_at,
    }))
}

#[utoipa::path(
    put,
    path = "/api/menu/update-text",
    request_body = MenuTextRequest,
    responses(
        (status = 200, description = "Text of the current menu replaced", body = MessageResponse),
        (status = 404, description = "No menu exists")
    )
)]
pub async fn update_menu_text(
    data: web::Data<AppState>,
    payload: web::Json<MenuTextRequest>,
) -> Result<HttpResponse, ApiError> {
    let text = payload.into_inner().today_update.unwrap_or_default();
    let entry = data.repo.update_current_menu_text(&text).await.map_err(|e| match e {
        RepoError::NotFound => ApiError::NotFound("No menu exists"),
        other => other.into(),
    })?;
    tracing::info!(menu_id = entry.id, "menu text updated");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Today's update modified successfully")))
}
