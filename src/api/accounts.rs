use axum::{
    extract::{Multipart, OriginalUri, State},
    http::StatusCode,
    response::Response,
};
use grid_wars_domain::{ServiceError, ServiceResult, password::PasswordService, upload::UploadedImage};
use serde::Deserialize;
use validator::Validate;

use crate::{
    api::response::{ApiError, first_validation_message, success},
    app::AppState,
    jwt::AuthUser,
};

const SPECIAL_CHARS: &str = "@$!%*?&#";

const PASSWORD_RULES_MESSAGE: &str = "Password must be at least 8 characters with an uppercase letter, a lowercase letter, a number, and a special character";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDto {
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))]
    pub username: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginDto {
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUsernameDto {
    #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))]
    pub username: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordDto {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
    #[validate(length(min = 1, message = "Password confirmation is required"))]
    pub confirm_password: String,
}

fn validate_dto<T: Validate>(dto: &T) -> ServiceResult<()> {
    dto.validate()
        .map_err(|e| ServiceError::BadRequest(first_validation_message(&e)))
}

fn validate_username_rules(username: &str) -> ServiceResult<()> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(())
    } else {
        ServiceError::bad_request("Username may only contain letters, numbers, and underscores")
    }
}

fn validate_password_rules(password: &str) -> ServiceResult<()> {
    let strong = PasswordService::is_strong_password(password)
        && password.chars().any(|c| SPECIAL_CHARS.contains(c));
    if strong {
        Ok(())
    } else {
        ServiceError::bad_request(PASSWORD_RULES_MESSAGE)
    }
}

pub async fn register(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    axum::Json(dto): axum::Json<RegisterDto>,
) -> Result<Response, ApiError> {
    let path = uri.path().to_string();
    let result = async {
        validate_dto(&dto)?;
        validate_username_rules(&dto.username)?;
        validate_password_rules(&dto.password)?;
        state
            .account_service
            .register(&dto.email, &dto.username, &dto.password)
            .await
    }
    .await
    .map_err(|e| ApiError::new(e, path.clone()))?;
    Ok(success(
        StatusCode::CREATED,
        Some(result),
        "Account registered successfully",
        &path,
    ))
}

pub async fn login(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    axum::Json(dto): axum::Json<LoginDto>,
) -> Result<Response, ApiError> {
    let path = uri.path().to_string();
    let result = async {
        validate_dto(&dto)?;
        state.account_service.login(&dto.email, &dto.password).await
    }
    .await
    .map_err(|e| ApiError::new(e, path.clone()))?;
    Ok(success(StatusCode::OK, Some(result), "Login successful", &path))
}

pub async fn profile(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    AuthUser(claims): AuthUser,
) -> Result<Response, ApiError> {
    let path = uri.path().to_string();
    let profile = state
        .account_service
        .get_profile(claims.sub)
        .await
        .map_err(|e| ApiError::new(e, path.clone()))?;
    Ok(success(
        StatusCode::OK,
        Some(profile),
        "Profile retrieved successfully",
        &path,
    ))
}

pub async fn update_username(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    AuthUser(claims): AuthUser,
    axum::Json(dto): axum::Json<UpdateUsernameDto>,
) -> Result<Response, ApiError> {
    let path = uri.path().to_string();
    let message = async {
        validate_dto(&dto)?;
        validate_username_rules(&dto.username)?;
        state
            .account_service
            .update_username(claims.sub, &dto.username)
            .await
    }
    .await
    .map_err(|e| ApiError::new(e, path.clone()))?;
    Ok(success::<()>(StatusCode::OK, None, &message, &path))
}

pub async fn update_password(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    AuthUser(claims): AuthUser,
    axum::Json(dto): axum::Json<UpdatePasswordDto>,
) -> Result<Response, ApiError> {
    let path = uri.path().to_string();
    let message = async {
        validate_dto(&dto)?;
        validate_password_rules(&dto.new_password)?;
        state
            .account_service
            .update_password(
                claims.sub,
                &dto.current_password,
                &dto.new_password,
                &dto.confirm_password,
            )
            .await
    }
    .await
    .map_err(|e| ApiError::new(e, path.clone()))?;
    Ok(success::<()>(StatusCode::OK, None, &message, &path))
}

pub async fn upload_image(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    AuthUser(claims): AuthUser,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let path = uri.path().to_string();
    let message = async {
        let image = read_image_field(multipart).await?;
        state
            .account_service
            .upload_profile_image(claims.sub, image)
            .await
    }
    .await
    .map_err(|e| ApiError::new(e, path.clone()))?;
    Ok(success::<()>(StatusCode::OK, None, &message, &path))
}

async fn read_image_field(mut multipart: Multipart) -> ServiceResult<UploadedImage> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let filename = field.file_name().unwrap_or("image.jpg").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServiceError::BadRequest(format!("Failed to read image field: {e}")))?;
        return Ok(UploadedImage {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    ServiceError::bad_request("Image file is required")
}
